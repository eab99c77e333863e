//! # towerlens-render
//!
//! Rendering backends for towerlens reports.
//!
//! - Formatted Excel workbooks (title band, styled header, auto-sized columns)
//! - Aligned plain text for the terminal
//!
//! ## Example
//!
//! ```rust,ignore
//! use towerlens_core::{Renderer, Report, ReportTable};
//! use towerlens_render::{ExcelReportWriter, TextRenderer};
//!
//! let report = Report::single(ReportTable::from_report_rows("Overall Project Report", &rows));
//!
//! println!("{}", TextRenderer::new().render(&report)?);
//!
//! let xlsx_bytes = ExcelReportWriter::new().render(&report)?;
//! std::fs::write("overall.xlsx", xlsx_bytes)?;
//! ```

pub mod excel;
pub mod text;

pub use excel::{sheet_names, ExcelReportWriter};
pub use text::TextRenderer;

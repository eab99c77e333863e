//! # towerlens-sheet
//!
//! Reader for tracker workbooks (.xlsx).
//!
//! This crate provides:
//! - `TrackerWorkbook`: opens a workbook from bytes and resolves named sheets
//! - `TrackerSheet`: cell values (via calamine) plus fill and bold font per
//!   cell (parsed from the package's `styles.xml` and sheet parts)
//! - Header-addressed activity and task-progress tables
//!
//! ## Example
//!
//! ```rust,no_run
//! use towerlens_core::{CellRef, CellSource};
//! use towerlens_sheet::TrackerWorkbook;
//!
//! let bytes = std::fs::read("Structure Work Tracker (31-05-2025).xlsx").unwrap();
//! let mut workbook = TrackerWorkbook::from_bytes(bytes).unwrap();
//! let sheet = workbook.sheet("Revised Baselines").unwrap();
//! println!("{}", sheet.fill(CellRef::parse("B4").unwrap()));
//! ```

pub mod activities;
mod package;
pub mod styles;
pub mod workbook;

pub use activities::{read_activities, read_task_progress};
pub use styles::StyleTable;
pub use workbook::{TrackerSheet, TrackerWorkbook};

use chrono::{Duration, NaiveDate, NaiveDateTime};
use thiserror::Error;
use towerlens_core::ReportError;

/// Workbook reading error
#[derive(Debug, Error)]
pub enum SheetError {
    #[error("not an xlsx package: {0}")]
    Package(String),

    #[error("missing package part: {0}")]
    MissingPart(String),

    #[error("malformed {part}: {message}")]
    Xml { part: String, message: String },

    #[error("cell data: {0}")]
    Cells(String),

    #[error("sheet not found: {0}")]
    SheetNotFound(String),

    #[error("none of the sheets {0:?} exist")]
    NoMatchingSheet(Vec<String>),

    #[error("sheet {sheet}: column '{column}' not found in header row {row}")]
    MissingColumn {
        sheet: String,
        column: String,
        row: u32,
    },
}

impl SheetError {
    /// Attach the blob key of the workbook that failed
    pub fn for_key(self, key: &str) -> ReportError {
        ReportError::Workbook {
            key: key.to_string(),
            message: self.to_string(),
        }
    }
}

/// Excel serial day number to a timestamp (1900 date system)
pub fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    // 2958465 is 9999-12-31
    if !serial.is_finite() || serial < 1.0 || serial > 2_958_465.999 {
        return None;
    }
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let days = serial.trunc() as i64;
    let seconds = (serial.fract() * 86_400.0).round() as i64;
    base.checked_add_signed(Duration::days(days))?
        .checked_add_signed(Duration::seconds(seconds))
}

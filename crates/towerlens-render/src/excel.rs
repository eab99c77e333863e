//! Excel report writer
//!
//! Every table becomes a block on its worksheet:
//!
//! ```text
//! | Overall Project Report (2025-06-02)          |   <- merged, bold, yellow
//! | Project | Tower Name | Structure | Finishing |   <- bold, blue, white font
//! | VERIDIA | TOWER 2    | 75%       | 0%        |
//! ```
//!
//! Several tables on one sheet are stacked with a blank row between them.
//! Column widths fit the longest header or cell text of any block, capped at
//! `max_column_width`, and the first block's header stays frozen.

use std::collections::HashSet;

use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook, Worksheet};
use towerlens_core::{RenderError, Renderer, Report, ReportSheet, ReportTable, TableCell};
use tracing::debug;

/// Longest sheet name Excel accepts
const MAX_SHEET_NAME: usize = 31;

/// Characters Excel rejects in sheet names
const FORBIDDEN: [char; 7] = ['[', ']', ':', '*', '?', '/', '\\'];

/// Formatted workbook writer
#[derive(Clone, Debug)]
pub struct ExcelReportWriter {
    /// Background of the merged title row
    pub title_fill: u32,
    /// Background of the header row
    pub header_fill: u32,
    /// Font color of the header row
    pub header_font: u32,
    /// Upper bound for auto-sized columns, in characters
    pub max_column_width: f64,
    /// Write percentages as numbers with a `0%` format instead of text
    pub percent_as_number: bool,
}

impl Default for ExcelReportWriter {
    fn default() -> Self {
        Self {
            title_fill: 0xFFFF00,
            header_fill: 0x4472C4,
            header_font: 0xFFFFFF,
            max_column_width: 50.0,
            percent_as_number: false,
        }
    }
}

impl ExcelReportWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title_fill(mut self, rgb: u32) -> Self {
        self.title_fill = rgb;
        self
    }

    pub fn header_fill(mut self, rgb: u32) -> Self {
        self.header_fill = rgb;
        self
    }

    pub fn max_column_width(mut self, width: f64) -> Self {
        self.max_column_width = width;
        self
    }

    pub fn percent_as_number(mut self) -> Self {
        self.percent_as_number = true;
        self
    }

    /// One table on one sheet
    pub fn render_table(&self, table: &ReportTable) -> Result<Vec<u8>, RenderError> {
        self.render_workbook(&Report::single(table.clone()))
    }

    /// One worksheet per report sheet
    pub fn render_workbook(&self, report: &Report) -> Result<Vec<u8>, RenderError> {
        let mut workbook = Workbook::new();
        let formats = self.create_formats();

        let names = sheet_names(report.sheets.iter().map(|s| s.name.as_str()));
        for (sheet, name) in report.sheets.iter().zip(&names) {
            let worksheet = workbook.add_worksheet();
            worksheet
                .set_name(name)
                .map_err(|e| RenderError::Format(e.to_string()))?;
            self.write_sheet(worksheet, sheet, &formats)?;
        }

        let buffer = workbook
            .save_to_buffer()
            .map_err(|e| RenderError::Format(format!("Failed to create Excel: {e}")))?;
        debug!(sheets = names.len(), bytes = buffer.len(), "workbook written");
        Ok(buffer)
    }

    fn write_sheet(
        &self,
        worksheet: &mut Worksheet,
        sheet: &ReportSheet,
        formats: &ExcelFormats,
    ) -> Result<(), RenderError> {
        let mut row = 0u32;
        let mut widths: Vec<usize> = Vec::new();

        for (index, table) in sheet.tables.iter().enumerate() {
            if index > 0 {
                // blank separator row
                row += 1;
            }
            if index == 0 && table.column_count() > 0 {
                worksheet.set_freeze_panes(row + 2, 0).ok();
            }
            row = self.write_table(worksheet, row, table, formats)?;

            for (col, header) in table.columns.iter().enumerate() {
                let longest = table
                    .rows
                    .iter()
                    .filter_map(|r| r.get(col))
                    .map(|cell| cell.to_string().chars().count())
                    .chain(std::iter::once(header.chars().count()))
                    .max()
                    .unwrap_or(0);
                if widths.len() <= col {
                    widths.resize(col + 1, 0);
                }
                widths[col] = widths[col].max(longest);
            }
        }

        for (col, longest) in widths.iter().enumerate() {
            let width = ((longest + 2) as f64).min(self.max_column_width);
            worksheet.set_column_width(col as u16, width).ok();
        }
        Ok(())
    }

    /// Write one block at `start`; returns the row after its last data row
    fn write_table(
        &self,
        worksheet: &mut Worksheet,
        start: u32,
        table: &ReportTable,
        formats: &ExcelFormats,
    ) -> Result<u32, RenderError> {
        let columns = table.column_count();
        if columns == 0 {
            return Err(RenderError::InvalidData(format!(
                "table '{}' has no columns",
                table.title
            )));
        }
        let xlsx = |e: rust_xlsxwriter::XlsxError| RenderError::Format(e.to_string());

        if columns > 1 {
            worksheet
                .merge_range(start, 0, start, (columns - 1) as u16, &table.title, &formats.title)
                .map_err(xlsx)?;
        } else {
            worksheet
                .write_string_with_format(start, 0, &table.title, &formats.title)
                .map_err(xlsx)?;
        }

        for (col, header) in table.columns.iter().enumerate() {
            worksheet
                .write_string_with_format(start + 1, col as u16, header, &formats.header)
                .map_err(xlsx)?;
        }

        let mut row = start + 2;
        for cells in &table.rows {
            if cells.len() != columns {
                return Err(RenderError::InvalidData(format!(
                    "table '{}': row has {} cells, header has {}",
                    table.title,
                    cells.len(),
                    columns
                )));
            }
            for (col, cell) in cells.iter().enumerate() {
                self.write_cell(worksheet, row, col as u16, cell, formats)
                    .map_err(xlsx)?;
            }
            row += 1;
        }
        Ok(row)
    }

    fn write_cell(
        &self,
        worksheet: &mut Worksheet,
        row: u32,
        col: u16,
        cell: &TableCell,
        formats: &ExcelFormats,
    ) -> Result<(), rust_xlsxwriter::XlsxError> {
        match cell {
            TableCell::Text(s) => worksheet.write_string_with_format(row, col, s, &formats.text)?,
            TableCell::Integer(n) => {
                worksheet.write_number_with_format(row, col, *n as f64, &formats.integer)?
            }
            TableCell::Number(n) => worksheet.write_number_with_format(row, col, *n, &formats.number)?,
            TableCell::Percent(p) if self.percent_as_number => {
                worksheet.write_number_with_format(row, col, p.as_f64() / 100.0, &formats.percent)?
            }
            TableCell::Percent(p) => {
                worksheet.write_string_with_format(row, col, p.to_string(), &formats.text)?
            }
            TableCell::Empty => worksheet.write_blank(row, col, &formats.text)?,
        };
        Ok(())
    }

    fn create_formats(&self) -> ExcelFormats {
        let title = Format::new()
            .set_bold()
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter)
            .set_background_color(self.title_fill);

        let header = Format::new()
            .set_bold()
            .set_align(FormatAlign::Center)
            .set_background_color(self.header_fill)
            .set_font_color(self.header_font)
            .set_border(FormatBorder::Thin);

        let text = Format::new().set_border(FormatBorder::Thin);

        let integer = Format::new()
            .set_num_format("0")
            .set_border(FormatBorder::Thin);

        let number = Format::new()
            .set_num_format("0.00")
            .set_border(FormatBorder::Thin);

        let percent = Format::new()
            .set_num_format("0%")
            .set_border(FormatBorder::Thin);

        ExcelFormats {
            title,
            header,
            text,
            integer,
            number,
            percent,
        }
    }
}

/// Reusable Excel formats
struct ExcelFormats {
    title: Format,
    header: Format,
    text: Format,
    integer: Format,
    number: Format,
    percent: Format,
}

impl Renderer for ExcelReportWriter {
    type Output = Vec<u8>;

    fn render(&self, report: &Report) -> Result<Vec<u8>, RenderError> {
        if report.sheets.is_empty() {
            return Err(RenderError::InvalidData("No sheets to render".into()));
        }
        self.render_workbook(report)
    }
}

/// Worksheet names Excel accepts: forbidden characters removed, at most 31
/// characters, unique ignoring case. Blank names become `Sheet`.
pub fn sheet_names<'a>(requested: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut taken: HashSet<String> = HashSet::new();
    requested
        .into_iter()
        .map(|raw| {
            let cleaned: String = raw.chars().filter(|c| !FORBIDDEN.contains(c)).collect();
            let cleaned = cleaned.trim().trim_matches('\'');
            let base = if cleaned.is_empty() { "Sheet" } else { cleaned };

            let mut name = truncate(base, MAX_SHEET_NAME);
            let mut n = 2;
            while !taken.insert(name.to_lowercase()) {
                let suffix = format!(" ({n})");
                name = format!("{}{suffix}", truncate(base, MAX_SHEET_NAME - suffix.len()));
                n += 1;
            }
            name
        })
        .collect()
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect::<String>().trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use towerlens_core::{Percentage, ReportRow};

    #[test]
    fn sheet_names_are_sanitized() {
        assert_eq!(
            sheet_names(["Tower 2 [Structure]", "a/b\\c:d*e?f", "", "  "]),
            ["Tower 2 Structure", "abcdef", "Sheet", "Sheet (2)"]
        );
    }

    #[test]
    fn sheet_names_are_truncated_and_unique() {
        let long = "Structure Work Tracker Tower G & Tower H";
        let names = sheet_names([long, long, "tower g", "Tower G"]);
        assert_eq!(names[0], "Structure Work Tracker Tower G");
        assert_eq!(names[1], "Structure Work Tracker Towe (2)");
        assert_eq!(names[2], "tower g");
        assert_eq!(names[3], "Tower G (2)");
        assert!(names.iter().all(|n| n.chars().count() <= MAX_SHEET_NAME));
    }

    #[test]
    fn renders_zip_package() {
        let rows = [ReportRow::new(
            "VERIDIA",
            "TOWER 2",
            Percentage::parse("75").unwrap(),
            Percentage::ZERO,
        )];
        let bytes = ExcelReportWriter::new()
            .render_table(&ReportTable::from_report_rows("Overall", &rows))
            .unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn empty_report_is_rejected() {
        assert!(matches!(
            ExcelReportWriter::new().render(&Report::new()),
            Err(RenderError::InvalidData(_))
        ));
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let mut table = ReportTable::new("t", ["a", "b"]);
        table.rows.push(vec!["only one".into()]);
        assert!(matches!(
            ExcelReportWriter::new().render_table(&table),
            Err(RenderError::InvalidData(_))
        ));
    }

    #[test]
    fn tables_need_columns() {
        let table = ReportTable::new("t", Vec::<String>::new());
        assert!(ExcelReportWriter::new().render_table(&table).is_err());
    }
}

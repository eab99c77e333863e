//! `towerlens combine`: gather previously written reports into one workbook
//!
//! Every sheet of every input becomes a sheet of the output. Stacked
//! blocks (title row, header row, data rows, separated by blank rows) are
//! read back as separate tables.

use std::path::PathBuf;

use clap::Args;
use tracing::{debug, info};
use towerlens_core::{CellValue, Diagnostic, DiagnosticCode, Percentage, Report, ReportSheet, ReportTable, TableCell};
use towerlens_sheet::TrackerWorkbook;

use super::Context;

#[derive(Args, Debug, Default)]
pub struct CombineArgs {
    /// Report workbooks, as `PATH` or `NAME=PATH` to rename their sheets
    #[arg(value_name = "[NAME=]PATH", required = true)]
    pub inputs: Vec<String>,
}

/// `NAME=PATH` or a bare path
fn split_input(input: &str) -> (Option<&str>, PathBuf) {
    match input.split_once('=') {
        Some((name, path)) if !name.trim().is_empty() => (Some(name.trim()), PathBuf::from(path)),
        _ => (None, PathBuf::from(input)),
    }
}

fn table_cell(value: &CellValue) -> TableCell {
    match value {
        CellValue::Empty => TableCell::Empty,
        CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => TableCell::Integer(*n as i64),
        CellValue::Number(n) => TableCell::Number(*n),
        CellValue::Text(s) if s.trim().ends_with('%') => {
            Percentage::parse(s).map_or_else(|| TableCell::text(s), TableCell::Percent)
        }
        other => TableCell::text(other.display()),
    }
}

fn is_blank(row: &[CellValue]) -> bool {
    row.iter().all(CellValue::is_empty)
}

/// Cells up to the last non-empty one
fn trimmed(row: &[CellValue]) -> &[CellValue] {
    let len = row.iter().rposition(|v| !v.is_empty()).map_or(0, |i| i + 1);
    &row[..len]
}

/// Stacked tables of one sheet's rows
pub fn tables_from_rows(rows: &[Vec<CellValue>]) -> Vec<ReportTable> {
    let mut tables = Vec::new();
    for block in rows.split(|row| is_blank(row)).filter(|block| !block.is_empty()) {
        let title = trimmed(&block[0])
            .iter()
            .find(|v| !v.is_empty())
            .map(CellValue::display)
            .unwrap_or_default();
        let columns: Vec<String> = match block.get(1) {
            Some(header) => trimmed(header).iter().map(CellValue::display).collect(),
            None => vec![title.clone()],
        };
        let width = columns.len();
        let mut table = ReportTable::new(title, columns);
        for row in block.iter().skip(2) {
            let mut cells: Vec<TableCell> = row.iter().take(width).map(table_cell).collect();
            cells.resize(width, TableCell::Empty);
            table.rows.push(cells);
        }
        tables.push(table);
    }
    tables
}

pub fn run(ctx: &mut Context, args: &CombineArgs) -> Report {
    let mut report = Report::new();
    for input in &args.inputs {
        let (name, path) = split_input(input);
        let file = path.display().to_string();
        let workbook = std::fs::read(&path)
            .map_err(|e| e.to_string())
            .and_then(|bytes| TrackerWorkbook::from_bytes(bytes).map_err(|e| e.to_string()));
        let mut workbook = match workbook {
            Ok(workbook) => workbook,
            Err(message) => {
                ctx.emit(
                    Diagnostic::new(
                        DiagnosticCode::E002WorkbookUnreadable,
                        format!("cannot read report: {message}"),
                    )
                    .with_file(file),
                );
                continue;
            }
        };

        let sheet_names: Vec<String> = workbook.sheet_names().iter().map(|s| s.to_string()).collect();
        let several = sheet_names.len() > 1;
        for sheet_name in &sheet_names {
            let sheet = match workbook.sheet(sheet_name) {
                Ok(sheet) => sheet,
                Err(e) => {
                    ctx.emit(
                        Diagnostic::new(DiagnosticCode::E002WorkbookUnreadable, e.to_string())
                            .with_file(file.clone()),
                    );
                    continue;
                }
            };
            let tables = tables_from_rows(&sheet.rows());
            debug!(%file, sheet = %sheet_name, tables = tables.len(), "read report sheet");
            let output_name = match name {
                Some(name) if several => format!("{name} - {sheet_name}"),
                Some(name) => name.to_string(),
                None => sheet_name.clone(),
            };
            let mut combined = ReportSheet::new(output_name);
            combined.tables = tables;
            report = report.sheet(combined);
        }
    }
    info!(sheets = report.sheets.len(), "combined reports");
    report
}

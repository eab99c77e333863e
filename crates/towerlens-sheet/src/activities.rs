//! Header-addressed activity tables

use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::debug;
use towerlens_core::layout::ActivityColumns;
use towerlens_core::{Activity, CellRef, CellSource, CellValue, TaskProgress};

use crate::{excel_serial_to_datetime, SheetError};

/// Normalized header text → 1-based column
fn header_map(sheet: &dyn CellSource, header_row: u32) -> HashMap<String, u32> {
    let mut headers = HashMap::new();
    let mut blank_run = 0;
    for col in 1..=16_384 {
        let text = sheet.value(CellRef::new(header_row, col)).display();
        let key = normalize(&text);
        if key.is_empty() {
            blank_run += 1;
            // trackers leave a few spacer columns, never dozens
            if blank_run > 32 {
                break;
            }
            continue;
        }
        blank_run = 0;
        headers.entry(key).or_insert(col);
    }
    headers
}

fn normalize(header: &str) -> String {
    header.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

fn find_column(
    headers: &HashMap<String, u32>,
    sheet: &dyn CellSource,
    header_row: u32,
    name: &str,
) -> Result<u32, SheetError> {
    headers
        .get(&normalize(name))
        .copied()
        .ok_or_else(|| SheetError::MissingColumn {
            sheet: sheet.name().to_string(),
            column: name.to_string(),
            row: header_row,
        })
}

/// Date from a date cell, date text, or a bare serial number
fn cell_date(value: &CellValue) -> Option<NaiveDate> {
    match value {
        CellValue::Number(n) => excel_serial_to_datetime(*n).map(|dt| dt.date()),
        other => other.as_date(),
    }
}

/// `% Complete` as a 0..1 fraction. Text like `"45%"` is divided by 100, as
/// is bare text above 1 (`"45"`); `"0.45"` is already a fraction.
fn cell_fraction(value: &CellValue) -> Option<f64> {
    match value {
        CellValue::Number(n) => Some(*n),
        CellValue::Text(s) => {
            let s = s.trim();
            match s.strip_suffix('%') {
                Some(percent) => percent.trim().parse::<f64>().ok().map(|p| p / 100.0),
                None => s
                    .parse::<f64>()
                    .ok()
                    .map(|v| if v > 1.0 { v / 100.0 } else { v }),
            }
        }
        _ => None,
    }
}

/// Activity rows below `header_row`. The name, id and finish headers are
/// required; `% Complete` and start are read when present. Rows without an
/// activity name are skipped.
pub fn read_activities(
    sheet: &dyn CellSource,
    header_row: u32,
    columns: &ActivityColumns,
) -> Result<Vec<Activity>, SheetError> {
    let headers = header_map(sheet, header_row);
    let id_col = find_column(&headers, sheet, header_row, &columns.id)?;
    let name_col = find_column(&headers, sheet, header_row, &columns.name)?;
    let finish_col = find_column(&headers, sheet, header_row, &columns.finish)?;
    let percent_col = headers.get(&normalize(&columns.percent_complete)).copied();
    let start_col = headers.get(&normalize(&columns.start)).copied();

    let mut activities = Vec::new();
    for row in header_row + 1..=sheet.max_row() {
        let at = |col| CellRef::new(row, col);
        let name = sheet.value(at(name_col)).display().trim().to_string();
        if name.is_empty() {
            continue;
        }
        activities.push(Activity {
            id: sheet.value(at(id_col)).display().trim().to_string(),
            name,
            percent_complete: percent_col.and_then(|c| cell_fraction(&sheet.value(at(c)))),
            start: start_col.and_then(|c| cell_date(&sheet.value(at(c)))),
            finish: cell_date(&sheet.value(at(finish_col))),
            bold: sheet.is_bold(at(name_col)),
            row,
        });
    }
    debug!(sheet = sheet.name(), count = activities.len(), "read activities");
    Ok(activities)
}

/// `(task name, % Complete)` rows below `header_row`
pub fn read_task_progress(
    sheet: &dyn CellSource,
    header_row: u32,
    name_header: &str,
    progress_header: &str,
) -> Result<Vec<TaskProgress>, SheetError> {
    let headers = header_map(sheet, header_row);
    let name_col = find_column(&headers, sheet, header_row, name_header)?;
    let progress_col = find_column(&headers, sheet, header_row, progress_header)?;

    let tasks: Vec<TaskProgress> = (header_row + 1..=sheet.max_row())
        .filter_map(|row| {
            let name = sheet.value(CellRef::new(row, name_col)).display();
            if name.trim().is_empty() {
                return None;
            }
            let progress = cell_fraction(&sheet.value(CellRef::new(row, progress_col)));
            Some(TaskProgress::new(name, progress))
        })
        .collect();
    debug!(sheet = sheet.name(), count = tasks.len(), "read task progress");
    Ok(tasks)
}

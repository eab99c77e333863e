//! `towerlens schedule`: finishing activities counted per name and month
//!
//! Each finishing layout gives one `Activity Name | months… | Total` table.
//! The totals go through the post-processor and are checked against the row
//! sums. With `--store-back` the counted activities are also written into a
//! store folder as their own workbook.

use clap::Args;
use tracing::info;
use towerlens_core::files::upload_key;
use towerlens_core::{
    Activity, Diagnostic, DiagnosticCode, FinishingLayout, Report, ReportError, ReportSheet,
    ReportTable, TableCell,
};
use towerlens_render::ExcelReportWriter;
use towerlens_rollup::{activity_counts, filter_by_period};

use super::{finishing_activities, parse_month_arg, Context};

#[derive(Args, Debug)]
pub struct ScheduleArgs {
    /// Year the counted activities finish in
    #[arg(long)]
    pub year: i32,

    /// Only these months (comma separated); every month when omitted
    #[arg(long, value_delimiter = ',', value_parser = parse_month_arg)]
    pub months: Vec<u32>,

    /// Only these projects (repeatable)
    #[arg(long)]
    pub project: Vec<String>,

    /// Also store the counted activities in this store folder
    #[arg(long, value_name = "FOLDER")]
    pub store_back: Option<String>,
}

pub fn run(ctx: &mut Context, args: &ScheduleArgs) -> Report {
    let folder = match args.store_back.as_deref().map(store_folder).transpose() {
        Ok(folder) => folder,
        Err(e) => {
            ctx.report_failed(None, &e);
            return Report::new();
        }
    };

    let keys = ctx.keys();
    let layouts: Vec<FinishingLayout> = ctx
        .layouts
        .finishing
        .iter()
        .filter(|l| args.project.is_empty() || args.project.iter().any(|p| p.eq_ignore_ascii_case(&l.project)))
        .cloned()
        .collect();

    let mut sheet = ReportSheet::new("Activity Counts");
    for layout in &layouts {
        let what = format!("{} {} schedule", layout.project, layout.tower);
        let Some(key) = ctx.select(&keys, &layout.source, &what) else {
            continue;
        };
        let activities = match finishing_activities(ctx.store.as_ref(), &key, layout) {
            Ok(activities) => activities,
            Err(e) => {
                ctx.report_failed(Some(&key), &e);
                continue;
            }
        };
        let tasks: Vec<Activity> = activities
            .into_iter()
            .filter(|a| !a.bold && layout.counts_activity(&a.name))
            .collect();
        let counted = filter_by_period(&tasks, Some(args.year), &args.months);
        if counted.is_empty() {
            ctx.emit(
                Diagnostic::new(
                    DiagnosticCode::H001EmptyPeriod,
                    format!("{what}: no activities finish in {}", args.year),
                )
                .with_file(&key),
            );
        }

        let table = activity_counts(&counted, &layout.tower, args.year, &args.months);
        let totals = ctx.post_processor().activity_totals(&table);
        ctx.note_source(&what, &totals.source);
        info!(tower = %layout.tower, activities = counted.len(), names = table.rows.len(), "activity counts");
        sheet = sheet.table(table);

        if let Some(folder) = folder {
            store_activities(ctx, folder, &layout.tower, args.year, &counted);
        }
    }
    Report::new().sheet(sheet)
}

/// One path segment; keys are `Folder/Name (DD-MM-YYYY).xlsx`
fn store_folder(folder: &str) -> Result<&str, ReportError> {
    let trimmed = folder.trim().trim_matches('/');
    if trimmed.is_empty() || trimmed.contains('/') {
        return Err(ReportError::InvalidInput(format!(
            "--store-back needs a single folder name, got '{folder}'"
        )));
    }
    Ok(trimmed)
}

/// `Activity ID | Activity Name | Finish` of the counted rows
fn activity_list(tower: &str, year: i32, activities: &[Activity]) -> ReportTable {
    let mut table = ReportTable::new(
        format!("{tower} Activity Names {year}"),
        ["Activity ID", "Activity Name", "Finish"],
    );
    for activity in activities {
        table.rows.push(vec![
            TableCell::text(&activity.id),
            TableCell::text(&activity.name),
            activity
                .finish
                .map_or(TableCell::Empty, |f| TableCell::text(f.format("%d-%m-%Y").to_string())),
        ]);
    }
    table
}

fn store_activities(ctx: &mut Context, folder: &str, tower: &str, year: i32, activities: &[Activity]) {
    let name = format!(
        "{tower} Activity Names {year} ({}).xlsx",
        ctx.today.format("%d-%m-%Y")
    );
    let key = upload_key(folder, &name);
    let stored = ExcelReportWriter::new()
        .render_table(&activity_list(tower, year, activities))
        .map_err(ReportError::from)
        .and_then(|bytes| ctx.store.put(&key, &bytes).map_err(ReportError::from));
    match stored {
        Ok(()) => {
            info!(%key, rows = activities.len(), "activity list stored");
            ctx.emit(
                Diagnostic::new(DiagnosticCode::I003ReportWritten, format!("stored {key}"))
                    .with_file(&key),
            );
        }
        Err(e) => ctx.report_failed(Some(&key), &e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::fixtures::{self, date};
    use pretty_assertions::assert_eq;
    use towerlens_core::{CellValue, Layouts, MemoryStore};
    use towerlens_sheet::TrackerWorkbook;

    fn context(layout: FinishingLayout) -> Context {
        let tracker = fixtures::activity_tracker(
            "TOWER A FINISHING.",
            &[
                ("A-000", "Flat Works", None, Some(date(2025, 5, 30)), true),
                ("A-010", "Wall Putty", None, Some(date(2025, 5, 3)), false),
                ("A-011", "Wall Putty", None, Some(date(2025, 5, 28)), false),
                ("A-012", "Wall Putty", None, Some(date(2025, 6, 2)), false),
                ("A-020", "Flooring", None, Some(date(2025, 6, 9)), false),
                ("A-030", "Painting", None, None, false),
                ("A-040", "Flooring", None, Some(date(2024, 6, 1)), false),
                ("A-050", "Handrails", None, Some(date(2025, 6, 11)), false),
            ],
        );
        let store = MemoryStore::new()
            .with_object("North/Tower A Finishing Tracker (13-06-2025).xlsx", tracker);
        let layouts = Layouts {
            finishing: vec![layout],
            ..Layouts::default()
        };
        fixtures::context(store, layouts)
    }

    fn args(months: Vec<u32>, store_back: Option<&str>) -> ScheduleArgs {
        ScheduleArgs {
            year: 2025,
            months,
            project: Vec::new(),
            store_back: store_back.map(str::to_string),
        }
    }

    fn cells(table: &ReportTable) -> Vec<Vec<String>> {
        table
            .rows
            .iter()
            .map(|r| r.iter().map(ToString::to_string).collect())
            .collect()
    }

    #[test]
    fn counts_with_row_sum_totals() {
        let layout = FinishingLayout::new("NORTH", "North", "A")
            .with_activities(["Wall Putty", "Flooring", "Painting"]);
        let mut ctx = context(layout);
        let report = run(&mut ctx, &args(Vec::new(), None));

        let table = &report.sheets[0].tables[0];
        assert_eq!(report.sheets[0].name, "Activity Counts");
        assert_eq!(table.title, "Activity Counts For TOWER A Report:(2025)");
        assert_eq!(table.columns, ["Activity Name", "MAY", "JUN", "Total"]);
        assert_eq!(
            cells(table),
            [
                ["Flooring", "0", "1", "1"],
                ["Wall Putty", "2", "1", "3"],
            ]
        );
        // no endpoint configured: the row sums stand without a fallback notice
        let diagnostics = ctx.take_diagnostics();
        assert!(diagnostics.iter().all(|d| !d.is_error()));
        assert!(diagnostics
            .iter()
            .all(|d| d.code != DiagnosticCode::I002LocalFallback));
    }

    #[test]
    fn month_selection_and_empty_period() {
        let mut ctx = context(FinishingLayout::new("NORTH", "North", "A"));
        let report = run(&mut ctx, &args(vec![6], None));
        let table = &report.sheets[0].tables[0];
        assert_eq!(
            cells(table),
            [
                ["Flooring", "1", "1"],
                ["Handrails", "1", "1"],
                ["Wall Putty", "1", "1"],
            ]
        );

        let report = run(&mut ctx, &args(vec![1], None));
        assert!(report.sheets[0].tables[0].rows.is_empty());
        assert!(ctx
            .take_diagnostics()
            .iter()
            .any(|d| d.code == DiagnosticCode::H001EmptyPeriod));
    }

    #[test]
    fn store_back_writes_counted_activities() {
        let layout = FinishingLayout::new("NORTH", "North", "A").with_activities(["Wall Putty"]);
        let mut ctx = context(layout);
        run(&mut ctx, &args(vec![5], Some("Schedule/")));

        let key = "Schedule/TOWER A Activity Names 2025 (20-06-2025).xlsx";
        let stored = ctx
            .take_diagnostics()
            .into_iter()
            .find(|d| d.code == DiagnosticCode::I003ReportWritten)
            .unwrap();
        assert_eq!(stored.file.as_deref(), Some(key));

        let bytes = ctx.store.get(key).unwrap();
        let mut workbook = TrackerWorkbook::from_bytes(bytes).unwrap();
        let name = workbook.sheet_names()[0].to_string();
        let text: Vec<String> = workbook
            .sheet(&name)
            .unwrap()
            .rows()
            .iter()
            .flatten()
            .map(CellValue::display)
            .collect();
        assert!(text.iter().any(|t| t == "A-010"));
        assert!(text.iter().any(|t| t == "28-05-2025"));
        assert!(!text.iter().any(|t| t == "A-012"));
        assert!(!text.iter().any(|t| t == "Flooring"));
    }

    #[test]
    fn nested_store_back_folder_is_rejected() {
        let mut ctx = context(FinishingLayout::new("NORTH", "North", "A"));
        let report = run(&mut ctx, &args(Vec::new(), Some("Schedule/2025")));
        assert!(report.sheets.is_empty());

        let diagnostics = ctx.take_diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code, DiagnosticCode::E006InvalidInput);
        assert!(ctx.store.list("Schedule").unwrap().is_empty());
    }
}

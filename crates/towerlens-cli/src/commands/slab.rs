//! `towerlens slab`: completed and non-completed slab-cycle cells per month

use chrono::Datelike;
use clap::Args;
use tracing::info;
use towerlens_core::{
    month_abbreviation, Diagnostic, DiagnosticCode, MonthlyCounts, PeriodFilter, Report,
    ReportError, ReportSheet, ReportTable, TableCell, TrackerLayout,
};
use towerlens_rollup::{classify_layout, pivot, tower_month_tables, years_in_cells, ClassifiedRegion};

use super::{open_workbook, parse_month_arg, Context};

#[derive(Args, Debug, Default)]
pub struct SlabArgs {
    /// Year to count; defaults to the latest year found in the tracker
    #[arg(long)]
    pub year: Option<i32>,

    /// Months to count (numbers or names, comma separated); all by default
    #[arg(long, value_delimiter = ',', value_parser = parse_month_arg)]
    pub months: Vec<u32>,

    /// Also emit the per-tower `Category | months | Total` pivots
    #[arg(long)]
    pub pivots: bool,
}

impl SlabArgs {
    fn months(&self) -> Vec<u32> {
        if self.months.is_empty() {
            (1..=12).collect()
        } else {
            let mut months = self.months.clone();
            months.sort_unstable();
            months.dedup();
            months
        }
    }
}

fn classified(ctx: &Context, key: &str, layout: &TrackerLayout) -> Result<Vec<ClassifiedRegion>, ReportError> {
    let mut workbook = open_workbook(ctx.store.as_ref(), key)?;
    let sheet = workbook.sheet(&layout.sheet).map_err(|e| e.for_key(key))?;
    Ok(classify_layout(
        &sheet,
        layout,
        &ctx.config.policy.slab.colors,
        &PeriodFilter::All,
    )?)
}

pub fn run(ctx: &mut Context, args: &SlabArgs) -> Report {
    let keys = ctx.keys();
    let months = args.months();
    let layouts = ctx.layouts.slab.clone();

    let mut report = Report::new();
    for layout in &layouts {
        let what = format!("{} slab cycle", layout.project);
        let Some(key) = ctx.select(&keys, &layout.source, &what) else {
            continue;
        };
        let mut regions = match classified(ctx, &key, layout) {
            Ok(regions) => regions,
            Err(e) => {
                ctx.report_failed(Some(&key), &e);
                continue;
            }
        };

        let year = args.year.unwrap_or_else(|| {
            years_in_cells(regions.iter().flat_map(|r| &r.cells))
                .last()
                .copied()
                .unwrap_or_else(|| ctx.today.year())
        });
        let period = PeriodFilter::Only {
            year,
            months: months.clone(),
        };
        for cell in regions.iter_mut().flat_map(|r| r.cells.iter_mut()) {
            cell.counted = period.counts(cell.date);
        }

        let groups: Vec<MonthlyCounts> = regions.iter().map(ClassifiedRegion::monthly).collect();
        let counted: u32 = groups
            .iter()
            .map(|g| g.total_completed() + g.total_non_completed())
            .sum();
        if counted == 0 {
            ctx.emit(
                Diagnostic::new(
                    DiagnosticCode::H001EmptyPeriod,
                    format!("{what}: no cells dated in {}", period_label(&months, year)),
                )
                .with_file(&key),
            );
        }

        let (completed, pending) = tower_month_tables(&groups, &months);
        let mut sheet = ReportSheet::new(format!("{} Slab Cycle {year}", layout.project))
            .table(completed)
            .table(pending)
            .table(verified_totals(ctx, &what, &groups, &months));
        if args.pivots {
            for group in &groups {
                sheet = sheet.table(pivot(group, &months));
            }
        }
        info!(project = %layout.project, year, counted, "slab cycle counts");
        report = report.sheet(sheet);
    }
    report
}

/// `Tower Name | Completed | Non-Completed` from each tower's pivot, passed
/// through the post-processor
fn verified_totals(ctx: &mut Context, what: &str, groups: &[MonthlyCounts], months: &[u32]) -> ReportTable {
    let mut table = ReportTable::new("Totals", ["Tower Name", "Completed", "Non-Completed"]);
    for group in groups {
        let totals = ctx.post_processor().monthly_totals(&pivot(group, months));
        ctx.note_source(&format!("{what} {}", group.group), &totals.source);
        table.rows.push(vec![
            TableCell::text(&group.group),
            totals.value.completed.into(),
            totals.value.non_completed.into(),
        ]);
    }
    table
}

fn period_label(months: &[u32], year: i32) -> String {
    if months.len() == 12 {
        return year.to_string();
    }
    let names: Vec<&str> = months.iter().filter_map(|&m| month_abbreviation(m)).collect();
    format!("{} {year}", names.join(", "))
}

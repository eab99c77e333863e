//! `towerlens structure`: fill-color counts per tower of each structure
//! tracker

use clap::Args;
use tracing::info;
use towerlens_core::{
    BlobStore, GroupCount, PeriodFilter, Report, ReportError, ReportPolicy, ReportSheet,
    ReportTable, TableCell, TrackerLayout,
};
use towerlens_rollup::layout_counts;

use super::{open_workbook, parse_month_year, title_date, Context};

#[derive(Args, Debug, Default)]
pub struct StructureArgs {
    /// Only these projects (repeatable), e.g. `VERIDIA`
    #[arg(long)]
    pub project: Vec<String>,

    /// Leave cells dated in this month (MM-YYYY) out of the counts
    #[arg(long, value_name = "MM-YYYY", value_parser = parse_month_year)]
    pub ignore_month: Option<(i32, u32)>,
}

impl StructureArgs {
    pub fn period(&self) -> PeriodFilter {
        match self.ignore_month {
            Some((year, month)) => PeriodFilter::Ignore { year, month },
            None => PeriodFilter::All,
        }
    }

    pub fn wants(&self, project: &str) -> bool {
        self.project.is_empty() || self.project.iter().any(|p| p.eq_ignore_ascii_case(project))
    }
}

/// Fetch, open and count one tracker
pub fn tracker_counts(
    store: &dyn BlobStore,
    key: &str,
    layout: &TrackerLayout,
    policy: &ReportPolicy,
    period: &PeriodFilter,
) -> Result<Vec<GroupCount>, ReportError> {
    let mut workbook = open_workbook(store, key)?;
    let sheet = workbook.sheet(&layout.sheet).map_err(|e| e.for_key(key))?;
    Ok(layout_counts(&sheet, layout, policy, period)?)
}

/// `Tower Name | Complete | Incomplete | Unclassified | Structure`
pub fn counts_table(title: &str, counts: &[GroupCount], policy: &ReportPolicy) -> ReportTable {
    let mut table = ReportTable::new(
        title,
        ["Tower Name", "Complete", "Incomplete", "Unclassified", "Structure"],
    );
    for count in counts {
        table.rows.push(vec![
            TableCell::text(&count.group),
            count.complete.into(),
            count.incomplete.into(),
            count.unclassified.into(),
            count.percentage(policy.rounding).into(),
        ]);
    }
    table
}

pub fn run(ctx: &mut Context, args: &StructureArgs) -> Report {
    let keys = ctx.keys();
    let period = args.period();
    let policy = ctx.config.policy.structure.clone();
    let layouts: Vec<TrackerLayout> = ctx
        .layouts
        .structure
        .iter()
        .filter(|l| args.wants(&l.project))
        .cloned()
        .collect();

    let mut sheet = ReportSheet::new("Structure");
    for layout in &layouts {
        let what = format!("{} structure", layout.project);
        let Some(key) = ctx.select(&keys, &layout.source, &what) else {
            continue;
        };
        match tracker_counts(ctx.store.as_ref(), &key, layout, &policy, &period) {
            Ok(counts) => {
                info!(project = %layout.project, towers = counts.len(), "structure counts");
                let title = format!("{} Structure ({})", layout.project, title_date(ctx.today));
                sheet = sheet.table(counts_table(&title, &counts, &policy));
            }
            Err(e) => ctx.report_failed(Some(&key), &e),
        }
    }
    Report::new().sheet(sheet)
}

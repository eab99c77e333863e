//! `towerlens activity`: finishing activities counted by finish month

use clap::Args;
use tracing::info;
use towerlens_core::{FinishingLayout, Report, ReportSheet};
use towerlens_rollup::{activity_month_summary, filter_by_period};

use super::{finishing_activities, parse_month_arg, Context};

#[derive(Args, Debug, Default)]
pub struct ActivityArgs {
    /// Only these projects (repeatable)
    #[arg(long)]
    pub project: Vec<String>,

    /// Only activities finishing in this year
    #[arg(long)]
    pub year: Option<i32>,

    /// Only activities finishing in these months (comma separated)
    #[arg(long, value_delimiter = ',', value_parser = parse_month_arg)]
    pub months: Vec<u32>,
}

pub fn run(ctx: &mut Context, args: &ActivityArgs) -> Report {
    let keys = ctx.keys();
    let layouts: Vec<FinishingLayout> = ctx
        .layouts
        .finishing
        .iter()
        .filter(|l| args.project.is_empty() || args.project.iter().any(|p| p.eq_ignore_ascii_case(&l.project)))
        .cloned()
        .collect();

    let mut sheet = ReportSheet::new("Activity Summary");
    for layout in &layouts {
        let what = format!("{} {} activities", layout.project, layout.tower);
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
        // bold rows are section headings
        let tasks: Vec<_> = activities.into_iter().filter(|a| !a.bold).collect();
        let selected = filter_by_period(&tasks, args.year, &args.months);
        info!(tower = %layout.tower, activities = selected.len(), "activity summary");
        sheet = sheet.table(activity_month_summary(&selected, &layout.tower));
    }
    Report::new().sheet(sheet)
}

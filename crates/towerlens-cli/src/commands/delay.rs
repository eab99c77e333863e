//! `towerlens delay`: activities whose finish date slipped more than once
//! between the stored snapshot and the current one

use clap::Args;
use tracing::{debug, info};
use towerlens_core::files::{pick_latest, select_files, split_by_cutoff};
use towerlens_core::{Diagnostic, DiagnosticCode, FinishingLayout, Report, ReportSheet};
use towerlens_rollup::{delay_table, filter_by_period, finish_deltas, repeated_delays};

use super::{finishing_activities, parse_month_arg, Context};

#[derive(Args, Debug, Default)]
pub struct DelayArgs {
    /// Only these projects (repeatable)
    #[arg(long)]
    pub project: Vec<String>,

    /// Current snapshot key; defaults to the latest file dated on or after
    /// the cutoff day of this month
    #[arg(long, value_name = "KEY")]
    pub current: Option<String>,

    /// Stored snapshot key; defaults to the latest earlier file
    #[arg(long, value_name = "KEY")]
    pub stored: Option<String>,

    /// Only current activities finishing in this year
    #[arg(long)]
    pub year: Option<i32>,

    /// Only current activities finishing in these months (comma separated)
    #[arg(long, value_delimiter = ',', value_parser = parse_month_arg)]
    pub months: Vec<u32>,
}

impl DelayArgs {
    fn wants(&self, layout: &FinishingLayout) -> bool {
        let project = self.project.is_empty()
            || self.project.iter().any(|p| p.eq_ignore_ascii_case(&layout.project));
        let current = self
            .current
            .as_deref()
            .map_or(true, |key| layout.source.matches(key));
        project && current
    }
}

/// `(current, stored)` snapshot keys of one tower
fn snapshots(ctx: &mut Context, keys: &[String], layout: &FinishingLayout, args: &DelayArgs) -> Option<(String, String)> {
    let what = format!("{} {} delay", layout.project, layout.tower);
    let matches = select_files(keys, &layout.source);
    let split = split_by_cutoff(&matches, ctx.today, ctx.config.cutoff_day);

    let current = args
        .current
        .clone()
        .or_else(|| pick_latest(&split.current).map(str::to_string))
        .or_else(|| pick_latest(&matches).map(str::to_string));
    let Some(current) = current else {
        ctx.emit(
            Diagnostic::new(
                DiagnosticCode::W001MissingSource,
                format!("{what}: no file matches {}", layout.source),
            )
            .with_hint("upload the tracker or check the layout source filter"),
        );
        return None;
    };

    let earlier: Vec<&String> = split.previous.iter().filter(|k| **k != current).collect();
    let stored = args
        .stored
        .clone()
        .or_else(|| pick_latest(&earlier).map(str::to_string));
    let Some(stored) = stored else {
        ctx.emit(
            Diagnostic::new(
                DiagnosticCode::W001MissingSource,
                format!("{what}: no earlier snapshot to compare {current} with"),
            )
            .with_file(&current),
        );
        return None;
    };

    for (role, key) in [("current", &current), ("stored", &stored)] {
        ctx.emit(
            Diagnostic::new(
                DiagnosticCode::I001SourceSelected,
                format!("{what}: {role} snapshot {key}"),
            )
            .with_file(key.as_str()),
        );
    }
    Some((current, stored))
}

pub fn run(ctx: &mut Context, args: &DelayArgs) -> Report {
    let keys = ctx.keys();
    let layouts: Vec<FinishingLayout> = ctx
        .layouts
        .finishing
        .iter()
        .filter(|l| args.wants(l))
        .cloned()
        .collect();

    let mut sheet = ReportSheet::new("Time Delay");
    for layout in &layouts {
        let Some((current_key, stored_key)) = snapshots(ctx, &keys, layout, args) else {
            continue;
        };
        let load = |key: &str| finishing_activities(ctx.store.as_ref(), key, layout);
        let (current, stored) = match (load(&current_key), load(&stored_key)) {
            (Ok(current), Ok(stored)) => (current, stored),
            (Err(e), _) => {
                ctx.report_failed(Some(&current_key), &e);
                continue;
            }
            (_, Err(e)) => {
                ctx.report_failed(Some(&stored_key), &e);
                continue;
            }
        };

        let tasks: Vec<_> = current.into_iter().filter(|a| !a.bold).collect();
        let tasks = filter_by_period(&tasks, args.year, &args.months);
        let deltas = finish_deltas(&tasks, &stored);
        debug!(tower = %layout.tower, joined = deltas.len(), "finish deltas");
        let rows = repeated_delays(&deltas, &layout.tower);
        info!(tower = %layout.tower, delayed = rows.len(), "delay report");
        sheet = sheet.table(delay_table(&format!("{} Time Delay", layout.tower), &rows));
    }
    Report::new().sheet(sheet)
}

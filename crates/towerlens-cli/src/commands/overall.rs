//! `towerlens overall`: structure and finishing percentages of every tower
//!
//! Trackers are chosen one after another (selection emits diagnostics),
//! then fetched, parsed and rolled up on the rayon pool. Results come back
//! in job order, so the report never depends on scheduling.

use std::collections::HashMap;

use clap::Args;
use rayon::prelude::*;
use tracing::info;
use towerlens_core::{
    BlobStore, FinishingLayout, GroupCount, Percentage, PeriodFilter, ProgressLayout, Report,
    ReportError, ReportPolicy, ReportRow, ReportTable, TrackerLayout,
};
use towerlens_rollup::{finishing_progress, keyword_progress, keyword_rows, structure_rows, KeywordProgress};
use towerlens_sheet::read_task_progress;

use super::structure::{tracker_counts, StructureArgs};
use super::{finishing_activities, open_workbook, title_date, Context};

#[derive(Args, Debug, Default)]
pub struct OverallArgs {
    #[command(flatten)]
    pub scope: StructureArgs,
}

enum Job {
    Structure(TrackerLayout),
    Finishing(FinishingLayout),
    Progress(ProgressLayout),
}

enum Outcome {
    Structure { project: String, counts: Vec<GroupCount> },
    Finishing { project: String, tower: String, progress: Percentage },
    Progress { project: String, progress: Vec<KeywordProgress> },
}

impl Job {
    fn run(
        &self,
        store: &dyn BlobStore,
        key: &str,
        policy: &ReportPolicy,
        period: &PeriodFilter,
    ) -> Result<Outcome, ReportError> {
        match self {
            Job::Structure(layout) => Ok(Outcome::Structure {
                project: layout.project.clone(),
                counts: tracker_counts(store, key, layout, policy, period)?,
            }),
            Job::Finishing(layout) => {
                let activities = finishing_activities(store, key, layout)?;
                Ok(Outcome::Finishing {
                    project: layout.project.clone(),
                    tower: layout.tower.clone(),
                    progress: finishing_progress(&activities, policy.rounding),
                })
            }
            Job::Progress(layout) => {
                let mut workbook = open_workbook(store, key)?;
                let sheet = workbook.sheet(&layout.sheet).map_err(|e| e.for_key(key))?;
                let tasks = read_task_progress(
                    &sheet,
                    layout.header_row,
                    &layout.name_header,
                    &layout.progress_header,
                )
                .map_err(|e| e.for_key(key))?;
                Ok(Outcome::Progress {
                    project: layout.project.clone(),
                    progress: keyword_progress(&tasks, &layout.keywords, policy.rounding),
                })
            }
        }
    }

    fn what(&self) -> String {
        match self {
            Job::Structure(l) => format!("{} structure", l.project),
            Job::Finishing(l) => format!("{} {} finishing", l.project, l.tower),
            Job::Progress(l) => format!("{} progress", l.project),
        }
    }
}

pub fn run(ctx: &mut Context, args: &OverallArgs) -> Report {
    let keys = ctx.keys();
    let scope = &args.scope;
    let period = scope.period();
    let policy = ctx.config.policy.overall.clone();

    let candidates: Vec<Job> = ctx
        .layouts
        .structure
        .iter()
        .filter(|l| scope.wants(&l.project))
        .cloned()
        .map(Job::Structure)
        .chain(
            ctx.layouts
                .finishing
                .iter()
                .filter(|l| scope.wants(&l.project))
                .cloned()
                .map(Job::Finishing),
        )
        .chain(
            ctx.layouts
                .progress
                .iter()
                .filter(|l| scope.wants(&l.project))
                .cloned()
                .map(Job::Progress),
        )
        .collect();

    let mut jobs = Vec::new();
    for job in candidates {
        let filter = match &job {
            Job::Structure(l) => &l.source,
            Job::Finishing(l) => &l.source,
            Job::Progress(l) => &l.source,
        };
        if let Some(key) = ctx.select(&keys, filter, &job.what()) {
            jobs.push((job, key));
        }
    }

    let store = ctx.store.as_ref();
    let results: Vec<(String, Result<Outcome, ReportError>)> = jobs
        .par_iter()
        .map(|(job, key)| (key.clone(), job.run(store, key, &policy, &period)))
        .collect();

    let mut structure: Vec<(String, Vec<GroupCount>)> = Vec::new();
    let mut finishing: HashMap<String, HashMap<String, Percentage>> = HashMap::new();
    let mut keywords: Vec<(String, Vec<KeywordProgress>)> = Vec::new();
    for (key, result) in results {
        match result {
            Ok(Outcome::Structure { project, counts }) => structure.push((project, counts)),
            Ok(Outcome::Finishing { project, tower, progress }) => {
                finishing.entry(project).or_default().insert(tower, progress);
            }
            Ok(Outcome::Progress { project, progress }) => keywords.push((project, progress)),
            Err(e) => ctx.report_failed(Some(&key), &e),
        }
    }

    let none = HashMap::new();
    let mut rows: Vec<ReportRow> = Vec::new();
    for (project, counts) in &structure {
        let towers = finishing.get(project).unwrap_or(&none);
        rows.extend(structure_rows(project, counts, towers, &policy));
    }
    for (project, progress) in &keywords {
        rows.extend(keyword_rows(project, progress));
    }

    let enriched = ctx.post_processor().structure_rows(&rows);
    ctx.note_source("overall report", &enriched.source);
    info!(rows = enriched.value.len(), "overall report");

    let title = format!("Overall Project Report ({})", title_date(ctx.today));
    Report::single(ReportTable::from_report_rows(title, &enriched.value).with_sheet_name("Overall"))
}

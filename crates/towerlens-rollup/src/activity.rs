//! Activity-table reports: month summaries, keyword and finishing progress

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, NaiveDate};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use towerlens_core::{
    month_abbreviation, Activity, Percentage, ReportRow, ReportTable, RoundingPolicy, TableCell,
    TaskProgress,
};

/// Column label of a finish month, e.g. `May 2025`
fn month_label(date: NaiveDate) -> String {
    date.format("%b %Y").to_string()
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Activities finishing in one of `months` (all months when empty), in
/// `year` when given. Activities without a finish date are dropped.
pub fn filter_by_period(activities: &[Activity], year: Option<i32>, months: &[u32]) -> Vec<Activity> {
    activities
        .iter()
        .filter(|a| {
            a.finish.is_some_and(|f| {
                year.map_or(true, |y| f.year() == y)
                    && (months.is_empty() || months.contains(&f.month()))
            })
        })
        .cloned()
        .collect()
}

/// Activity count per name and finish month.
///
/// The first column is headed by the tower name and holds `Milestone-N`
/// labels; names are sorted, months run chronologically. Cells read
/// `"N activities"`, or `"No activities"` for a zero count.
pub fn activity_month_summary(activities: &[Activity], tower: &str) -> ReportTable {
    let mut counts: BTreeMap<&str, BTreeMap<NaiveDate, u32>> = BTreeMap::new();
    let mut months: BTreeSet<NaiveDate> = BTreeSet::new();
    for activity in activities {
        let Some(finish) = activity.finish else { continue };
        let month = first_of_month(finish);
        months.insert(month);
        *counts
            .entry(activity.name.as_str())
            .or_default()
            .entry(month)
            .or_default() += 1;
    }

    let columns = [tower.to_string(), "Activity Name".to_string()]
        .into_iter()
        .chain(months.iter().map(|&m| month_label(m)));
    let mut table = ReportTable::new(format!("{tower} Activity Summary"), columns);
    for (i, (name, by_month)) in counts.iter().enumerate() {
        let mut row = vec![
            TableCell::text(format!("Milestone-{}", i + 1)),
            TableCell::text(*name),
        ];
        row.extend(months.iter().map(|m| match by_month.get(m).copied().unwrap_or(0) {
            0 => TableCell::text("No activities"),
            n => TableCell::text(format!("{n} activities")),
        }));
        table.rows.push(row);
    }
    table
}

/// Non-bold activities finishing in `year` (and in `months` when not empty),
/// counted per name and month: `Activity Name | JAN | … | Total`. Only months
/// with at least one activity become columns, in calendar order; names are
/// sorted and `Total` is the row sum.
pub fn activity_counts(activities: &[Activity], tower: &str, year: i32, months: &[u32]) -> ReportTable {
    let mut counts: BTreeMap<&str, BTreeMap<u32, u32>> = BTreeMap::new();
    for activity in activities.iter().filter(|a| !a.bold) {
        let Some(finish) = activity.finish else { continue };
        if finish.year() != year || !(months.is_empty() || months.contains(&finish.month())) {
            continue;
        }
        *counts
            .entry(activity.name.as_str())
            .or_default()
            .entry(finish.month())
            .or_default() += 1;
    }
    let present: BTreeSet<u32> = counts.values().flat_map(|m| m.keys().copied()).collect();

    let columns = std::iter::once("Activity Name".to_string())
        .chain(
            present
                .iter()
                .filter_map(|&m| month_abbreviation(m))
                .map(str::to_string),
        )
        .chain(std::iter::once("Total".to_string()));
    let mut table = ReportTable::new(format!("Activity Counts For {tower} Report:({year})"), columns);
    for (name, by_month) in &counts {
        let mut row = vec![TableCell::text(*name)];
        row.extend(
            present
                .iter()
                .map(|m| TableCell::from(by_month.get(m).copied().unwrap_or(0))),
        );
        row.push(TableCell::from(by_month.values().sum::<u32>()));
        table.rows.push(row);
    }
    table
}

/// `(activity name, total)` pairs read back from an `activity_counts` table
pub fn activity_count_totals(table: &ReportTable) -> Option<Vec<(String, u32)>> {
    let name = table.column("Activity Name")?;
    let total = table.column("Total")?;
    table
        .rows
        .iter()
        .map(|row| {
            let count = u32::try_from(row.get(total)?.as_i64()?).ok()?;
            Some((row.get(name)?.to_string(), count))
        })
        .collect()
}

/// Mean progress of the tasks matching one keyword
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeywordProgress {
    pub keyword: String,
    pub progress: Percentage,
    /// Matched tasks with a `% Complete` value
    pub tasks: usize,
}

/// Mean `% Complete` per keyword. A task belongs to the first keyword its
/// name contains; tasks without a value are left out of the mean. Keywords
/// no task matches are omitted. Output follows keyword order.
pub fn keyword_progress<S: AsRef<str>>(
    tasks: &[TaskProgress],
    keywords: &[S],
    rounding: RoundingPolicy,
) -> Vec<KeywordProgress> {
    let mut sums: Vec<(f64, usize)> = vec![(0.0, 0); keywords.len()];
    for task in tasks {
        let Some(fraction) = task.percent_complete else { continue };
        if let Some(i) = keywords.iter().position(|k| task.name.contains(k.as_ref())) {
            sums[i].0 += fraction;
            sums[i].1 += 1;
        }
    }
    keywords
        .iter()
        .zip(sums)
        .filter(|(_, (_, n))| *n > 0)
        .map(|(keyword, (sum, n))| KeywordProgress {
            keyword: keyword.as_ref().to_string(),
            progress: Percentage::from_fraction(sum / n as f64, rounding),
            tasks: n,
        })
        .collect()
}

/// Report rows for keyword progress; finishing is not tracked there
pub fn keyword_rows(project: &str, progress: &[KeywordProgress]) -> Vec<ReportRow> {
    progress
        .iter()
        .map(|p| ReportRow::new(project, p.keyword.trim(), p.progress, Percentage::ZERO))
        .collect()
}

/// Mean `% Complete` of non-bold activity rows (bold rows are section
/// headings). No measurable rows gives `0%`.
pub fn finishing_progress(activities: &[Activity], rounding: RoundingPolicy) -> Percentage {
    let (sum, n) = activities
        .iter()
        .filter(|a| !a.bold)
        .filter_map(|a| a.percent_complete.and_then(Decimal::from_f64))
        .fold((Decimal::ZERO, 0u32), |(sum, n), v| (sum + v, n + 1));
    if n == 0 {
        return Percentage::ZERO;
    }
    let mean = sum * Decimal::ONE_HUNDRED / Decimal::from(n);
    Percentage::from_value(
        rust_decimal::prelude::ToPrimitive::to_f64(&mean).unwrap_or_default(),
        rounding,
    )
}

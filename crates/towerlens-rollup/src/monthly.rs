//! Month pivots for slab-cycle reports

use std::collections::BTreeSet;

use chrono::Datelike;
use towerlens_core::{
    month_abbreviation, ClassifiedCell, MonthTally, MonthlyCounts, ReportTable, TableCell,
};

const COMPLETED: &str = "Completed";
const NON_COMPLETED: &str = "Non-Completed";

fn month_headers(months: &[u32]) -> impl Iterator<Item = String> + '_ {
    months
        .iter()
        .filter_map(|&m| month_abbreviation(m))
        .map(str::to_string)
}

/// `Category | JAN | … | Total` with one `Completed` and one `Non-Completed`
/// row. Only the given months become columns; `Total` sums those columns.
pub fn pivot(counts: &MonthlyCounts, months: &[u32]) -> ReportTable {
    let months: Vec<u32> = months
        .iter()
        .copied()
        .filter(|&m| month_abbreviation(m).is_some())
        .collect();
    let columns = std::iter::once("Category".to_string())
        .chain(month_headers(&months))
        .chain(std::iter::once("Total".to_string()));
    let mut table = ReportTable::new(format!("{} Counts by Month", counts.group), columns);

    let row = |label: &str, pick: fn(MonthTally) -> u32| {
        let values: Vec<u32> = months.iter().map(|&m| pick(counts.month(m))).collect();
        let total: u32 = values.iter().sum();
        std::iter::once(TableCell::from(label))
            .chain(values.into_iter().map(TableCell::from))
            .chain(std::iter::once(TableCell::from(total)))
            .collect::<Vec<_>>()
    };
    table.rows.push(row(COMPLETED, |t: MonthTally| t.completed));
    table.rows.push(row(NON_COMPLETED, |t: MonthTally| t.non_completed));
    table
}

/// `(completed, non-completed)` totals read back from a `pivot` table
pub fn pivot_totals(table: &ReportTable) -> Option<MonthTally> {
    let total = table.column("Total")?;
    let category = table.column("Category")?;
    let mut tally = MonthTally::default();
    for row in &table.rows {
        let value = u32::try_from(row.get(total)?.as_i64()?).ok()?;
        match row.get(category)?.to_string().as_str() {
            COMPLETED => tally.completed = value,
            NON_COMPLETED => tally.non_completed = value,
            _ => {}
        }
    }
    Some(tally)
}

/// Cross-tower tables, `Tower Name | months… | Total`: completed work first,
/// then non-completed work
pub fn tower_month_tables(groups: &[MonthlyCounts], months: &[u32]) -> (ReportTable, ReportTable) {
    let build = |title: &str, pick: fn(MonthTally) -> u32| {
        let columns = std::iter::once("Tower Name".to_string())
            .chain(month_headers(months))
            .chain(std::iter::once("Total".to_string()));
        let mut table = ReportTable::new(title, columns);
        for group in groups {
            let values: Vec<u32> = months
                .iter()
                .filter(|&&m| month_abbreviation(m).is_some())
                .map(|&m| pick(group.month(m)))
                .collect();
            let total: u32 = values.iter().sum();
            let mut row = vec![TableCell::from(group.group.as_str())];
            row.extend(values.into_iter().map(TableCell::from));
            row.push(TableCell::from(total));
            table.rows.push(row);
        }
        table
    };
    (
        build("Completed Work", |t: MonthTally| t.completed),
        build("Non-Completed Work", |t: MonthTally| t.non_completed),
    )
}

/// Distinct years of all dated cells, ascending
pub fn years_in_cells<'a>(cells: impl IntoIterator<Item = &'a ClassifiedCell>) -> Vec<i32> {
    cells
        .into_iter()
        .filter_map(|c| c.date)
        .map(|d| d.year())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

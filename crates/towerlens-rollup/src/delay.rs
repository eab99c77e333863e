//! Finish-date delays between two snapshots of an activity tracker

use std::collections::{BTreeMap, HashMap};

use towerlens_core::{Activity, ReportTable, TableCell};

/// Finish-date movement of one activity
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FinishDelta {
    pub id: String,
    pub name: String,
    /// Current finish minus stored finish; positive means later
    pub days: i64,
}

/// Inner join of the two snapshots on activity id. Activities missing a
/// finish date on either side are left out; a repeated id in `stored` uses
/// its first row.
pub fn finish_deltas(current: &[Activity], stored: &[Activity]) -> Vec<FinishDelta> {
    let mut stored_finish = HashMap::new();
    for activity in stored {
        if let Some(finish) = activity.finish {
            stored_finish.entry(activity.id.as_str()).or_insert(finish);
        }
    }
    current
        .iter()
        .filter_map(|activity| {
            let now = activity.finish?;
            let before = stored_finish.get(activity.id.as_str())?;
            Some(FinishDelta {
                id: activity.id.clone(),
                name: activity.name.clone(),
                days: (now - *before).num_days(),
            })
        })
        .collect()
}

/// One line of the delay report
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DelayRow {
    pub tower: String,
    pub activity: String,
    pub delay_days: i64,
}

/// Activity names delayed more than once, with their longest delay, sorted
/// by name
pub fn repeated_delays(deltas: &[FinishDelta], tower: &str) -> Vec<DelayRow> {
    let mut by_name: BTreeMap<&str, (usize, i64)> = BTreeMap::new();
    for delta in deltas.iter().filter(|d| d.days > 0) {
        let entry = by_name.entry(delta.name.as_str()).or_insert((0, delta.days));
        entry.0 += 1;
        entry.1 = entry.1.max(delta.days);
    }
    by_name
        .into_iter()
        .filter(|(_, (occurrences, _))| *occurrences > 1)
        .map(|(name, (_, max))| DelayRow {
            tower: tower.to_string(),
            activity: name.to_string(),
            delay_days: max,
        })
        .collect()
}

/// `SNo | Tower | Activity Name | Delay Days | Delay Reason | Remarks`.
/// Reason and remarks are left blank for the site team.
pub fn delay_table(title: &str, rows: &[DelayRow]) -> ReportTable {
    let mut table = ReportTable::new(
        title,
        [
            "SNo",
            "Tower",
            "Activity Name",
            "Delay Days",
            "Delay Reason",
            "Remarks",
        ],
    );
    for (i, row) in rows.iter().enumerate() {
        table.rows.push(vec![
            TableCell::Integer(i as i64 + 1),
            TableCell::text(&row.tower),
            TableCell::text(&row.activity),
            TableCell::Integer(row.delay_days),
            TableCell::Empty,
            TableCell::Empty,
        ]);
    }
    table
}

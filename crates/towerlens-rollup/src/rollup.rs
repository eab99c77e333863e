//! Per-tower counts and structure report rows

use std::collections::HashMap;

use tracing::debug;
use towerlens_core::{
    CellSource, GroupCount, LayoutError, Percentage, PeriodFilter, ReportPolicy, ReportRow,
    TrackerLayout,
};

use crate::classify::classify_layout;

/// Counts for every region of `layout`. The layout's own unclassified
/// policy, when set, wins over the report policy.
pub fn layout_counts(
    sheet: &dyn CellSource,
    layout: &TrackerLayout,
    policy: &ReportPolicy,
    period: &PeriodFilter,
) -> Result<Vec<GroupCount>, LayoutError> {
    let unclassified = layout.unclassified.unwrap_or(policy.unclassified);
    let counts: Vec<GroupCount> = classify_layout(sheet, layout, &policy.colors, period)?
        .iter()
        .map(|region| region.count(unclassified))
        .collect();
    for count in &counts {
        debug!(
            project = %layout.project,
            group = %count.group,
            complete = count.complete,
            incomplete = count.incomplete,
            unclassified = count.unclassified,
            skipped = count.skipped,
            "group count"
        );
    }
    Ok(counts)
}

/// One row per group. Finishing percentages are looked up by group name;
/// groups without one report `0%`.
pub fn structure_rows(
    project: &str,
    groups: &[GroupCount],
    finishing: &HashMap<String, Percentage>,
    policy: &ReportPolicy,
) -> Vec<ReportRow> {
    groups
        .iter()
        .map(|group| {
            let finishing = finishing
                .get(&group.group)
                .copied()
                .unwrap_or(Percentage::ZERO);
            ReportRow::new(
                project,
                &group.group,
                group.percentage(policy.rounding),
                finishing,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use towerlens_core::{
        MemorySheet, RoundingPolicy, UnclassifiedPolicy, COMPLETE_GREEN, INCOMPLETE_BLUE,
    };

    /// 12 rows × 8 columns: 60 green, 20 blue, 16 unfilled
    fn tower_2_sheet() -> MemorySheet {
        let layout = TrackerLayout::veridia_structure();
        let cells = layout.region("TOWER 2").unwrap().cells().unwrap();
        assert_eq!(cells.len(), 96);
        let mut sheet = MemorySheet::new("Revised Baselines");
        for (i, at) in cells.into_iter().enumerate() {
            if i < 60 {
                sheet.set_solid(at, COMPLETE_GREEN);
            } else if i < 80 {
                sheet.set_solid(at, INCOMPLETE_BLUE);
            }
        }
        sheet
    }

    fn tower_2_only() -> TrackerLayout {
        let mut layout = TrackerLayout::veridia_structure();
        layout.regions.truncate(1);
        layout
    }

    #[test]
    fn worked_example_excluding_unfilled() {
        let mut layout = tower_2_only();
        layout.unclassified = None;
        let policy = ReportPolicy::default();
        let counts = layout_counts(&tower_2_sheet(), &layout, &policy, &PeriodFilter::All).unwrap();

        assert_eq!(counts.len(), 1);
        let tower = &counts[0];
        assert_eq!(
            (tower.complete, tower.incomplete, tower.unclassified),
            (60, 20, 16)
        );
        assert_eq!(tower.total(), 96);
        assert_eq!(tower.percentage(RoundingPolicy::Round).to_string(), "75%");
    }

    #[test]
    fn layout_policy_overrides_report_policy() {
        // built-in Veridia layout counts unfilled cells as incomplete
        let policy = ReportPolicy::default();
        let counts =
            layout_counts(&tower_2_sheet(), &tower_2_only(), &policy, &PeriodFilter::All).unwrap();
        assert_eq!((counts[0].incomplete, counts[0].unclassified), (36, 0));
        // 60 / 96 = 62.5
        assert_eq!(counts[0].percentage(RoundingPolicy::Round).to_string(), "63%");
        assert_eq!(counts[0].percentage(RoundingPolicy::Floor).to_string(), "62%");
    }

    #[test]
    fn rollup_is_repeatable() {
        let sheet = tower_2_sheet();
        let policy = ReportPolicy::default().unclassified(UnclassifiedPolicy::Exclude);
        let first = layout_counts(&sheet, &tower_2_only(), &policy, &PeriodFilter::All).unwrap();
        let second = layout_counts(&sheet, &tower_2_only(), &policy, &PeriodFilter::All).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn rows_with_finishing_lookup() {
        let mut t4 = GroupCount::new("TOWER 4");
        t4.complete = 3;
        t4.incomplete = 1;
        let t5 = GroupCount::new("TOWER 5");
        let finishing = HashMap::from([("TOWER 4".to_string(), Percentage::parse("12%").unwrap())]);

        let rows = structure_rows("VERIDIA", &[t4, t5], &finishing, &ReportPolicy::default());
        assert_eq!(
            rows,
            [
                ReportRow::new(
                    "VERIDIA",
                    "TOWER 4",
                    Percentage::parse("75").unwrap(),
                    Percentage::parse("12").unwrap()
                ),
                ReportRow::new("VERIDIA", "TOWER 5", Percentage::ZERO, Percentage::ZERO),
            ]
        );
    }
}

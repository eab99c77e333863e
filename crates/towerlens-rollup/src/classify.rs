//! Fill-color classification of positional regions
//!
//! Every coordinate of a region gets exactly one `Classification`. A period
//! filter never drops a cell; it only marks it as not counted, so the class
//! counts of a region always add up to its size.

use tracing::debug;
use towerlens_core::{
    CellRegion, CellSource, ClassifiedCell, ColorRules, GroupCount, LayoutError, MonthlyCounts,
    PeriodFilter, TrackerLayout, UnclassifiedPolicy,
};

/// Classify every cell of `region`, column by column
pub fn classify_region(
    sheet: &dyn CellSource,
    region: &CellRegion,
    rules: &ColorRules,
    period: &PeriodFilter,
) -> Result<Vec<ClassifiedCell>, LayoutError> {
    let cells: Vec<ClassifiedCell> = region
        .cells()?
        .into_iter()
        .map(|at| {
            let value = sheet.value(at);
            let date = value.as_date();
            let fill = sheet.fill(at);
            let class = rules.classify(&fill);
            ClassifiedCell {
                at,
                counted: period.counts(date),
                value,
                date,
                fill,
                class,
            }
        })
        .collect();

    debug!(
        sheet = sheet.name(),
        region = %region.name,
        cells = cells.len(),
        counted = cells.iter().filter(|c| c.counted).count(),
        "classified region"
    );
    Ok(cells)
}

/// One region's classified cells
#[derive(Clone, Debug, PartialEq)]
pub struct ClassifiedRegion {
    pub name: String,
    pub cells: Vec<ClassifiedCell>,
}

impl ClassifiedRegion {
    pub fn count(&self, policy: UnclassifiedPolicy) -> GroupCount {
        GroupCount::from_cells(&self.name, &self.cells, policy)
    }

    pub fn monthly(&self) -> MonthlyCounts {
        MonthlyCounts::from_cells(&self.name, &self.cells)
    }
}

/// Classify all regions of a layout in layout order
pub fn classify_layout(
    sheet: &dyn CellSource,
    layout: &TrackerLayout,
    rules: &ColorRules,
    period: &PeriodFilter,
) -> Result<Vec<ClassifiedRegion>, LayoutError> {
    layout.validate()?;
    layout
        .regions
        .iter()
        .map(|region| {
            Ok(ClassifiedRegion {
                name: region.name.clone(),
                cells: classify_region(sheet, region, rules, period)?,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use towerlens_core::{
        CellFill, CellRef, CellValue, Classification, FillColor, MemorySheet, COMPLETE_GREEN,
        INCOMPLETE_BLUE,
    };

    fn at(a1: &str) -> CellRef {
        CellRef::parse(a1).unwrap()
    }

    #[test]
    fn every_cell_gets_one_class() {
        let mut sheet = MemorySheet::new("Revised Baselines");
        sheet
            .set_solid(at("B4"), COMPLETE_GREEN)
            .set_solid(at("B5"), "ff00b0f0")
            .set_fill(at("D4"), CellFill::Solid(FillColor::Theme(4)))
            .set_fill(at("D5"), CellFill::Pattern("gray125".into()));
        let region = CellRegion::new("TOWER 2", [4, 5, 6], ["B", "D"]);

        let cells =
            classify_region(&sheet, &region, &ColorRules::default(), &PeriodFilter::All).unwrap();
        let classes: Vec<_> = cells.iter().map(|c| c.class).collect();
        assert_eq!(
            classes,
            [
                Classification::Complete,
                Classification::Incomplete,
                Classification::Unclassified,
                Classification::Unclassified,
                Classification::Unclassified,
                Classification::Unclassified,
            ]
        );
        assert!(cells.iter().all(|c| c.counted));
    }

    #[test]
    fn period_filter_marks_without_dropping() {
        let mut sheet = MemorySheet::new("slab");
        let may = NaiveDate::from_ymd_opt(2025, 5, 10).unwrap();
        sheet
            .set_solid(at("B4"), COMPLETE_GREEN)
            .set_value(at("B4"), CellValue::DateTime(may.and_hms_opt(0, 0, 0).unwrap()))
            .set_solid(at("B5"), INCOMPLETE_BLUE)
            .set_value(at("B5"), CellValue::Text("12-06-2025".into()))
            .set_solid(at("B6"), COMPLETE_GREEN)
            .set_value(at("B6"), CellValue::Text("not a date".into()));
        let region = CellRegion::new("TOWER 6", [4, 5, 6], ["B"]);
        let only_may = PeriodFilter::Only {
            year: 2025,
            months: vec![5],
        };

        let cells = classify_region(&sheet, &region, &ColorRules::default(), &only_may).unwrap();
        assert_eq!(cells.len(), 3);
        assert_eq!(
            cells.iter().map(|c| c.counted).collect::<Vec<_>>(),
            [true, false, false]
        );
        assert_eq!(cells[1].date, NaiveDate::from_ymd_opt(2025, 6, 12));
        assert_eq!(cells[2].date, None);
    }

    #[test]
    fn invalid_region_is_an_error() {
        let sheet = MemorySheet::new("s");
        let region = CellRegion::new("bad", [4], ["B", "4X"]);
        let err =
            classify_region(&sheet, &region, &ColorRules::default(), &PeriodFilter::All).unwrap_err();
        assert!(matches!(err, LayoutError::InvalidColumn { .. }));
    }

    #[test]
    fn layout_regions_in_order() {
        let sheet = MemorySheet::new("Revised Baselines- 25 days SC");
        let layout = TrackerLayout::eligo_structure();
        let regions =
            classify_layout(&sheet, &layout, &ColorRules::default(), &PeriodFilter::All).unwrap();
        let names: Vec<_> = regions.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["TOWER F", "TOWER G", "TOWER H"]);
        assert_eq!(regions[0].cells.len(), 8 * 4);
        assert_eq!(regions[0].count(UnclassifiedPolicy::Exclude).unclassified, 32);
    }
}

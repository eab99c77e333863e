//! Declarative tracker layouts
//!
//! A layout names the sheet of a tracker workbook and the positional regions
//! (one per tower or block) the classifier walks. The built-in tables cover
//! the known trackers; configuration may add layouts or replace a built-in
//! one for the same project.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::files::FileFilter;
use crate::{CellRegion, LayoutError, UnclassifiedPolicy};

/// Data rows of the Veridia baseline sheets
const VERIDIA_ROWS: [u32; 12] = [4, 5, 6, 7, 9, 10, 14, 15, 16, 17, 19, 20];

fn region(name: &str, rows: &[u32], columns: &str) -> CellRegion {
    CellRegion::new(name, rows.iter().copied(), columns.split_whitespace())
}

// ============================================================================
// Structure Layouts
// ============================================================================

/// Positional regions of one tracker sheet
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerLayout {
    pub project: String,
    pub sheet: String,
    pub source: FileFilter,
    pub regions: Vec<CellRegion>,
    /// Overrides the report kind's unclassified policy for this tracker
    #[serde(default)]
    pub unclassified: Option<UnclassifiedPolicy>,
}

impl TrackerLayout {
    /// Every region valid, names unique, no shared coordinates
    pub fn validate(&self) -> Result<(), LayoutError> {
        let mut names = HashSet::new();
        for region in &self.regions {
            region.validate()?;
            if !names.insert(region.name.as_str()) {
                return Err(LayoutError::DuplicateRegion(region.name.clone()));
            }
        }
        for (i, first) in self.regions.iter().enumerate() {
            if let Some(second) = self.regions[i + 1..].iter().find(|r| first.overlaps(r)) {
                return Err(LayoutError::Overlap {
                    first: first.name.clone(),
                    second: second.name.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn region(&self, name: &str) -> Option<&CellRegion> {
        self.regions.iter().find(|r| r.name == name)
    }

    /// Veridia structure tracker. Its tracker has always counted unfilled
    /// cells as not done, so the layout keeps that policy.
    pub fn veridia_structure() -> Self {
        let rows = &VERIDIA_ROWS;
        Self {
            project: "VERIDIA".into(),
            sheet: "Revised Baselines".into(),
            source: FileFilter::new()
                .prefix("Veridia")
                .contains("Structure Work Tracker"),
            regions: vec![
                region("TOWER 2", rows, "B D F H J L N P"),
                region("TOWER 3", rows, "T V X Z AB AD AF AH"),
                region(
                    "TOWER 4",
                    rows,
                    "AL AN AP AR AT AV AX AZ BB BD BF BH BJ BL BN BP",
                ),
                region("TOWER 5", rows, "DC DE DG DI DK DM DO DQ DS DU DW DY EA EC"),
                region("TOWER 6", rows, "FI FK FM FO FQ FS FU FW FY GA GC GE GG GI"),
                region("TOWER 7", rows, "EF EH EJ EL EN EP ER ET EV EX EZ FB FD FF"),
            ],
            unclassified: Some(UnclassifiedPolicy::CountAsIncomplete),
        }
    }

    /// Eligo structure tracker (towers F, G and H)
    pub fn eligo_structure() -> Self {
        let rows: Vec<u32> = (5..=12).collect();
        Self {
            project: "ELIGO".into(),
            sheet: "Revised Baselines- 25 days SC".into(),
            source: FileFilter::new()
                .prefix("Eligo")
                .contains("Structure Work Tracker"),
            regions: vec![
                region("TOWER F", &rows, "B D F H"),
                region("TOWER G", &rows, "L N P R T V"),
                region(
                    "TOWER H",
                    &rows,
                    "Z AB AD AF AH AJ AL AN AP AR AT AV AX AZ",
                ),
            ],
            unclassified: None,
        }
    }

    /// Veridia slab cycle sheet, dated cells per tower
    pub fn veridia_slab() -> Self {
        let rows = &VERIDIA_ROWS;
        Self {
            project: "VERIDIA".into(),
            sheet: "Revised baseline with 60d NGT".into(),
            source: FileFilter::new().prefix("Veridia").contains("Slab Cycle"),
            regions: vec![
                region("TOWER 2", rows, "B D F H J L N P"),
                region("TOWER 3", rows, "T V X Z AB AD AF AH"),
                region(
                    "TOWER 4",
                    rows,
                    "AL AN AP AR AT AV AX AZ BB BD BF BH BJ BL BN BP",
                ),
                region("TOWER 5", rows, "DC DE DG DI DK DM DO DQ DS DU DW DY EA EC"),
                region(
                    "TOWER 6",
                    rows,
                    "FK FM FO FQ FS FU FW FY GA GB GC GE GG GI GK",
                ),
                region("TOWER 7", rows, "EG EL EK EM EO EQ ES EU EW EY FA FC FE FG"),
            ],
            unclassified: None,
        }
    }
}

// ============================================================================
// Activity Layouts
// ============================================================================

/// Header names of an activity table
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivityColumns {
    pub id: String,
    pub name: String,
    pub percent_complete: String,
    pub start: String,
    pub finish: String,
}

impl Default for ActivityColumns {
    fn default() -> Self {
        Self {
            id: "Activity ID".into(),
            name: "Activity Name".into(),
            percent_complete: "% Complete".into(),
            start: "Start".into(),
            finish: "Finish".into(),
        }
    }
}

/// Finishing tracker of one tower
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinishingLayout {
    pub project: String,
    /// Region name the finishing percentage is joined to
    pub tower: String,
    pub source: FileFilter,
    /// First sheet that exists is read
    pub sheets: Vec<String>,
    #[serde(default = "default_header_row")]
    pub header_row: u32,
    #[serde(default)]
    pub columns: ActivityColumns,
    /// Activity names counted by the schedule report; empty counts every name
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub activities: Vec<String>,
}

fn default_header_row() -> u32 {
    1
}

impl FinishingLayout {
    pub fn new(project: &str, folder: &str, tower: &str) -> Self {
        Self {
            project: project.into(),
            tower: format!("TOWER {tower}"),
            source: FileFilter::new()
                .prefix(folder)
                .contains(format!("Tower {tower} Finishing Tracker")),
            sheets: vec![format!("TOWER {tower} FINISHING.")],
            header_row: 1,
            columns: ActivityColumns::default(),
            activities: Vec::new(),
        }
    }

    pub fn with_activities<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.activities = names.into_iter().map(Into::into).collect();
        self
    }

    /// Whether the schedule report counts `name` (trimmed, case-insensitive)
    pub fn counts_activity(&self, name: &str) -> bool {
        self.activities.is_empty()
            || self
                .activities
                .iter()
                .any(|a| a.trim().eq_ignore_ascii_case(name.trim()))
    }

    pub fn veridia_tower_5() -> Self {
        Self::new("VERIDIA", "Veridia", "5").with_activities(TOWER_5_ACTIVITIES)
    }
}

const TOWER_5_ACTIVITIES: [&str; 41] = [
    "Brickwork",
    "AC Installation",
    "Balconies Waterproofing",
    "Brick masonry for entrance wall",
    "C-F-First Fix",
    "C-Gypsum and POP Punning",
    "C-P-First Fix",
    "C-Stone flooring",
    "Closing of shafts",
    "Copper Piping",
    "Counter stone works",
    "CP-Final Fix",
    "EL-Final Fix",
    "EL-Second Fix",
    "False ceiling framing",
    "Fixing of brackets for GRC Moduling",
    "Floor Tiling",
    "Glass Installation",
    "GRC jali fixing (Fire escape staicase)",
    "GRC jali fixing (main staircase)",
    "GRC jali fixing (splash pool)",
    "GRC molding fixing",
    "Grouting of toilets & balcony Tiles",
    "Gypsum board false ceiling",
    "Installation of Rear & Front balcony UPVC Windows",
    "Installation of doors",
    "Installation of wardrobes and cabinets",
    "Ledge Wall Construction",
    "MS works in balconies",
    "Paint in balcony and shafts",
    "Painting First Coat",
    "SS Framing",
    "ST-Electrical",
    "ST-Fire fighting",
    "ST-Plumbing & Water supply",
    "Stone cills, ledges and jambs",
    "Texture paint (final coat)",
    "Texture paint (first coat)",
    "Wall Tiling",
    "Water Proofing Works",
    "Waterproofing works",
];

/// Keyword-averaged `% Complete` from a project schedule export
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressLayout {
    pub project: String,
    pub sheet: String,
    pub source: FileFilter,
    pub header_row: u32,
    pub name_header: String,
    pub progress_header: String,
    pub keywords: Vec<String>,
}

impl ProgressLayout {
    pub fn wave_city_club() -> Self {
        Self {
            project: "Wave City Club".into(),
            sheet: "MSP Progress".into(),
            source: FileFilter::new()
                .prefix("Wave City Club")
                .contains("Structure Work Tracker Wave City Club all Block"),
            header_row: 2,
            name_header: "Task Name".into(),
            progress_header: "% Complete".into(),
            keywords: [
                "Wave City Club Start-finish",
                "Block 1 (B1) Banquet Hall",
                "Block 6 (B6) Toilets",
                "Block 7(B7) Indoor Sports",
                "Block 9 (B9) Spa & Saloon",
                "Block 8 (B8) Squash Court",
                "Block 2 & 3 (B2 & B3) Cafe & Bar",
                "Block 4 (B4) Indoor Swimming Pool Changing Room & Toilets",
                "Block 11 (B11) Guest House",
                "Block 10 (B10) Gym",
                "Block 5 (B5) Admin + Member Lounge+Creche+Av Room + Surveillance Room +Toilets",
                "Fine Dine",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

// ============================================================================
// Layout Set
// ============================================================================

/// Every layout a run knows about
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Layouts {
    pub structure: Vec<TrackerLayout>,
    pub slab: Vec<TrackerLayout>,
    pub finishing: Vec<FinishingLayout>,
    pub progress: Vec<ProgressLayout>,
}

impl Layouts {
    pub fn builtin() -> Self {
        Self {
            structure: vec![
                TrackerLayout::veridia_structure(),
                TrackerLayout::eligo_structure(),
            ],
            slab: vec![TrackerLayout::veridia_slab()],
            finishing: vec![
                FinishingLayout::new("VERIDIA", "Veridia", "4"),
                FinishingLayout::veridia_tower_5(),
                FinishingLayout::new("VERIDIA", "Veridia", "7"),
                FinishingLayout::new("ELIGO", "Eligo", "G"),
                FinishingLayout::new("ELIGO", "Eligo", "H"),
            ],
            progress: vec![ProgressLayout::wave_city_club()],
        }
    }

    /// Layouts from `other` replace same-project (same-tower for finishing)
    /// entries; new ones are appended
    pub fn merge(mut self, other: Layouts) -> Self {
        fn upsert<T>(into: &mut Vec<T>, item: T, same: impl Fn(&T, &T) -> bool) {
            match into.iter_mut().find(|existing| same(existing, &item)) {
                Some(existing) => *existing = item,
                None => into.push(item),
            }
        }
        for layout in other.structure {
            upsert(&mut self.structure, layout, |a, b| a.project == b.project);
        }
        for layout in other.slab {
            upsert(&mut self.slab, layout, |a, b| a.project == b.project);
        }
        for layout in other.finishing {
            upsert(&mut self.finishing, layout, |a, b| {
                a.project == b.project && a.tower == b.tower
            });
        }
        for layout in other.progress {
            upsert(&mut self.progress, layout, |a, b| a.project == b.project);
        }
        self
    }

    pub fn validate(&self) -> Result<(), LayoutError> {
        self.structure
            .iter()
            .chain(&self.slab)
            .try_for_each(TrackerLayout::validate)
    }

    pub fn finishing_for<'a>(&'a self, project: &'a str) -> impl Iterator<Item = &'a FinishingLayout> + 'a {
        self.finishing.iter().filter(move |f| f.project == project)
    }
}

//! # towerlens-rollup
//!
//! Fill-color classification of tracker regions and the rollups built on it.
//!
//! This crate provides:
//! - Region classification against `ColorRules` and a `PeriodFilter`
//! - Per-tower counts and `ReportRow` tables for structure reports
//! - Month pivots for slab-cycle reports
//! - Activity summaries, keyword progress and finishing progress
//! - Finish-date delay comparison between two tracker snapshots
//!
//! Every function here is pure: the same sheet and layout always produce the
//! same tables.
//!
//! ## Example
//!
//! ```rust
//! use towerlens_core::{CellRef, CellRegion, ColorRules, MemorySheet, PeriodFilter};
//! use towerlens_rollup::classify_region;
//!
//! let mut sheet = MemorySheet::new("Revised Baselines");
//! sheet.set_solid(CellRef::parse("B4").unwrap(), "#92D050");
//! let region = CellRegion::new("TOWER 2", [4, 5], ["B"]);
//! let cells = classify_region(&sheet, &region, &ColorRules::default(), &PeriodFilter::All).unwrap();
//! assert_eq!(cells.len(), 2);
//! ```

pub mod activity;
pub mod classify;
pub mod delay;
pub mod monthly;
pub mod rollup;

pub use activity::{
    activity_count_totals, activity_counts, activity_month_summary, filter_by_period,
    finishing_progress, keyword_progress, keyword_rows, KeywordProgress,
};
pub use classify::{classify_layout, classify_region, ClassifiedRegion};
pub use delay::{delay_table, finish_deltas, repeated_delays, DelayRow, FinishDelta};
pub use monthly::{pivot, pivot_totals, tower_month_tables, years_in_cells};
pub use rollup::{layout_counts, structure_rows};

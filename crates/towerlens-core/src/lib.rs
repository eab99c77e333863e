//! # towerlens-core
//!
//! Core domain model and traits for towerlens progress reporting.
//!
//! This crate provides:
//! - Domain types: `CellRef`, `CellRegion`, `CellFill`, `CellValue`, `GroupCount`
//! - Policies: `ColorRules`, `UnclassifiedPolicy`, `RoundingPolicy`, `PeriodFilter`
//! - Core traits: `CellSource`, `BlobStore`, `Renderer`
//! - Error types shared by every report kind
//!
//! ## Example
//!
//! ```rust
//! use towerlens_core::{CellRegion, CellRef};
//!
//! let region = CellRegion::new("TOWER 2", [4, 5, 6], ["B", "D"]);
//! assert_eq!(region.len(), 6);
//! assert_eq!(region.cells().unwrap()[0], CellRef::parse("B4").unwrap());
//! ```

pub mod diagnostics;
pub mod files;
pub mod layout;
pub mod report;
pub mod sheet;
pub mod store;

pub use diagnostics::{Diagnostic, DiagnosticCode, DiagnosticEmitter, Severity};
pub use files::{FileDate, FileFilter, RemoteFile, ReportKind};
pub use layout::{FinishingLayout, Layouts, ProgressLayout, TrackerLayout};
pub use report::{Report, ReportRow, ReportSheet, ReportTable, TableCell};
pub use sheet::{CellSource, MemorySheet};
pub use store::{BlobStore, DirectoryStore, MemoryStore, StoreError};

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use thiserror::Error;

/// Fill color that marks a finished activity in the trackers
pub const COMPLETE_GREEN: &str = "#92D050";

/// Fill color that marks a scheduled but unfinished activity
pub const INCOMPLETE_BLUE: &str = "#00B0F0";

/// Three-letter upper-case month labels used as pivot headers
pub const MONTH_ABBREVIATIONS: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];

// ============================================================================
// Coordinates
// ============================================================================

/// 1-based (row, column) coordinate within a worksheet
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellRef {
    pub row: u32,
    pub col: u32,
}

impl CellRef {
    pub const fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Build a coordinate from column letters and a 1-based row
    pub fn from_letters(column: &str, row: u32) -> Option<Self> {
        if row == 0 {
            return None;
        }
        column_index(column).map(|col| Self { row, col })
    }

    /// Parse A1 notation (`"AB12"`)
    pub fn parse(a1: &str) -> Option<Self> {
        let a1 = a1.trim().trim_start_matches('$');
        let split = a1.find(|c: char| !c.is_ascii_alphabetic())?;
        let (letters, digits) = a1.split_at(split);
        let digits = digits.trim_start_matches('$');
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let row = digits.parse().ok()?;
        Self::from_letters(letters, row)
    }

    pub fn column_letters(&self) -> String {
        column_letters(self.col)
    }

    /// Zero-based (row, column) pair as used by sheet readers
    pub const fn zero_based(&self) -> (u32, u32) {
        (self.row.saturating_sub(1), self.col.saturating_sub(1))
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_letters(self.col), self.row)
    }
}

/// Column letters to 1-based index (`A` = 1, `AA` = 27). Excel stops at `XFD`.
pub fn column_index(letters: &str) -> Option<u32> {
    if letters.is_empty() || letters.len() > 3 {
        return None;
    }
    let mut index: u32 = 0;
    for c in letters.chars() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        let digit = c.to_ascii_uppercase() as u32 - 'A' as u32 + 1;
        index = index * 26 + digit;
    }
    (index <= 16_384).then_some(index)
}

/// 1-based column index to letters (`28` → `"AB"`)
pub fn column_letters(index: u32) -> String {
    let mut n = index;
    let mut out = Vec::new();
    while n > 0 {
        n -= 1;
        out.push(b'A' + (n % 26) as u8);
        n /= 26;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

// ============================================================================
// Regions
// ============================================================================

/// A named rectangle-free set of cells: every row paired with every column
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellRegion {
    pub name: String,
    pub rows: Vec<u32>,
    pub columns: Vec<String>,
}

impl CellRegion {
    pub fn new<S: Into<String>>(
        name: impl Into<String>,
        rows: impl IntoIterator<Item = u32>,
        columns: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            name: name.into(),
            rows: rows.into_iter().collect(),
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    /// Number of coordinates in the region
    pub fn len(&self) -> usize {
        self.rows.len() * self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Coordinates in column-major order (each column walked top to bottom)
    pub fn cells(&self) -> Result<Vec<CellRef>, LayoutError> {
        let mut cells = Vec::with_capacity(self.len());
        for column in &self.columns {
            for &row in &self.rows {
                let at = CellRef::from_letters(column, row).ok_or_else(|| {
                    if row == 0 {
                        LayoutError::InvalidRow {
                            region: self.name.clone(),
                            row,
                        }
                    } else {
                        LayoutError::InvalidColumn {
                            region: self.name.clone(),
                            column: column.clone(),
                        }
                    }
                })?;
                cells.push(at);
            }
        }
        Ok(cells)
    }

    pub fn validate(&self) -> Result<(), LayoutError> {
        if self.is_empty() {
            return Err(LayoutError::EmptyRegion(self.name.clone()));
        }
        self.cells().map(|_| ())
    }

    /// Whether the two regions share at least one coordinate.
    /// Unparseable columns never overlap anything.
    pub fn overlaps(&self, other: &CellRegion) -> bool {
        let rows: HashSet<u32> = self.rows.iter().copied().collect();
        if !other.rows.iter().any(|r| rows.contains(r)) {
            return false;
        }
        let columns: HashSet<u32> = self
            .columns
            .iter()
            .filter_map(|c| column_index(c))
            .collect();
        other
            .columns
            .iter()
            .filter_map(|c| column_index(c))
            .any(|c| columns.contains(&c))
    }
}

// ============================================================================
// Cell Contents
// ============================================================================

/// Color of a cell fill as stored in the workbook
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FillColor {
    /// Normalized `#RRGGBB`
    Rgb(String),
    Theme(u32),
    Indexed(u32),
    Auto,
}

impl FillColor {
    /// Parse `RRGGBB`, `#RRGGBB` or `AARRGGBB`
    pub fn rgb(raw: &str) -> Option<Self> {
        normalize_hex(raw).map(Self::Rgb)
    }

    pub fn hex(&self) -> Option<&str> {
        match self {
            Self::Rgb(hex) => Some(hex),
            _ => None,
        }
    }
}

impl fmt::Display for FillColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rgb(hex) => f.write_str(hex),
            Self::Theme(n) => write!(f, "theme:{n}"),
            Self::Indexed(n) => write!(f, "indexed:{n}"),
            Self::Auto => f.write_str("auto"),
        }
    }
}

/// Normalize a hex color to upper-case `#RRGGBB`, dropping any alpha channel
pub fn normalize_hex(raw: &str) -> Option<String> {
    let s = raw.trim().trim_start_matches('#');
    if !s.is_ascii() {
        return None;
    }
    let s = match s.len() {
        8 => &s[2..],
        6 => s,
        _ => return None,
    };
    if !s.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    Some(format!("#{}", s.to_ascii_uppercase()))
}

/// Background fill of a cell
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellFill {
    #[default]
    None,
    Solid(FillColor),
    /// Any non-solid pattern (`gray125`, `darkGrid`, ...)
    Pattern(String),
}

impl fmt::Display for CellFill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("none"),
            Self::Solid(color) => write!(f, "solid {color}"),
            Self::Pattern(name) => write!(f, "pattern {name}"),
        }
    }
}

/// Value stored in a cell
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
    Error(String),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Date for date cells and for text in a common date format.
    /// Anything else, malformed text included, is not a date.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::DateTime(dt) => Some(dt.date()),
            Self::Text(text) => parse_date_text(text),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Human readable rendering, dates as `YYYY-MM-DD`
    pub fn display(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Text(s) => s.clone(),
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            Self::Number(n) => n.to_string(),
            Self::Bool(b) => b.to_string(),
            Self::DateTime(dt) if dt.time() == chrono::NaiveTime::MIN => {
                dt.date().format("%Y-%m-%d").to_string()
            }
            Self::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
            Self::Error(e) => e.clone(),
        }
    }
}

const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%d-%m-%Y %H:%M"];

// `%Y` also accepts two digits, so each `%y` form is tried before its `%Y` form
const DATE_FORMATS: [&str; 11] = [
    "%Y-%m-%d", "%d-%m-%y", "%d-%m-%Y", "%d/%m/%y", "%d/%m/%Y", "%d.%m.%y", "%d.%m.%Y", "%d-%b-%y",
    "%d-%b-%Y", "%d %b %Y", "%b %d, %Y",
];

/// Parse a date written as text. Day-first forms win over month-first.
pub fn parse_date_text(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(text, f).ok())
        .map(|dt| dt.date())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|f| NaiveDate::parse_from_str(text, f).ok())
        })
}

// ============================================================================
// Classification
// ============================================================================

/// Completion status inferred from a cell fill
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Complete,
    Incomplete,
    Unclassified,
}

impl Classification {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Complete => "complete",
            Self::Incomplete => "incomplete",
            Self::Unclassified => "unclassified",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of inspecting one cell
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ClassifiedCell {
    pub at: CellRef,
    pub value: CellValue,
    pub date: Option<NaiveDate>,
    pub fill: CellFill,
    pub class: Classification,
    /// False when a period filter excluded the cell from counting
    pub counted: bool,
}

/// Ordered fill color to classification map
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColorRules {
    rules: Vec<ColorRule>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorRule {
    pub color: String,
    pub class: Classification,
}

impl Default for ColorRules {
    fn default() -> Self {
        Self::empty()
            .with(COMPLETE_GREEN, Classification::Complete)
            .with(INCOMPLETE_BLUE, Classification::Incomplete)
    }
}

impl ColorRules {
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Append a rule. Colors that do not parse as hex never match.
    pub fn with(mut self, color: &str, class: Classification) -> Self {
        self.rules.push(ColorRule {
            color: normalize_hex(color).unwrap_or_else(|| color.to_string()),
            class,
        });
        self
    }

    pub fn rules(&self) -> &[ColorRule] {
        &self.rules
    }

    /// Only a solid RGB fill matching a rule is classified; first rule wins
    pub fn classify(&self, fill: &CellFill) -> Classification {
        let CellFill::Solid(FillColor::Rgb(hex)) = fill else {
            return Classification::Unclassified;
        };
        self.rules
            .iter()
            .find(|rule| normalize_hex(&rule.color).as_deref() == Some(hex.as_str()))
            .map_or(Classification::Unclassified, |rule| rule.class)
    }
}

/// Which dated cells take part in counting
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "mode")]
pub enum PeriodFilter {
    #[default]
    All,
    /// Skip cells dated in this month; undated cells still count
    Ignore { year: i32, month: u32 },
    /// Count only cells dated in one of these months; undated cells never count
    Only { year: i32, months: Vec<u32> },
}

impl PeriodFilter {
    pub fn counts(&self, date: Option<NaiveDate>) -> bool {
        match self {
            Self::All => true,
            Self::Ignore { year, month } => {
                !matches!(date, Some(d) if d.year() == *year && d.month() == *month)
            }
            Self::Only { year, months } => {
                matches!(date, Some(d) if d.year() == *year && months.contains(&d.month()))
            }
        }
    }
}

// ============================================================================
// Policies
// ============================================================================

/// What happens to counted cells without a recognized color
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnclassifiedPolicy {
    /// Neither complete nor incomplete
    #[default]
    Exclude,
    /// Added to the incomplete count
    CountAsIncomplete,
}

/// How a raw percentage becomes a whole number
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoundingPolicy {
    /// Half away from zero
    #[default]
    Round,
    Ceil,
    Floor,
}

impl RoundingPolicy {
    pub fn apply(self, value: Decimal) -> Decimal {
        match self {
            Self::Round => value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero),
            Self::Ceil => value.ceil(),
            Self::Floor => value.floor(),
        }
    }
}

/// Classification and rounding rules for one report kind
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportPolicy {
    pub colors: ColorRules,
    pub unclassified: UnclassifiedPolicy,
    pub rounding: RoundingPolicy,
}

impl ReportPolicy {
    pub fn unclassified(mut self, policy: UnclassifiedPolicy) -> Self {
        self.unclassified = policy;
        self
    }

    pub fn rounding(mut self, policy: RoundingPolicy) -> Self {
        self.rounding = policy;
        self
    }

    pub fn colors(mut self, colors: ColorRules) -> Self {
        self.colors = colors;
        self
    }
}

// ============================================================================
// Rollup Values
// ============================================================================

/// Whole-number percentage clamped to `0..=100`
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Percentage(Decimal);

impl Percentage {
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// `part / whole × 100`, rounded; zero `whole` gives zero
    pub fn from_counts(part: u32, whole: u32, rounding: RoundingPolicy) -> Self {
        if whole == 0 {
            return Self::ZERO;
        }
        let raw = Decimal::from(part) * Decimal::ONE_HUNDRED / Decimal::from(whole);
        Self::clamped(rounding.apply(raw))
    }

    /// From a value already on the 0..100 scale
    pub fn from_value(value: f64, rounding: RoundingPolicy) -> Self {
        Decimal::from_f64(value)
            .map(|d| Self::clamped(rounding.apply(d)))
            .unwrap_or(Self::ZERO)
    }

    /// From a fraction on the 0..1 scale (`0.45` → 45%)
    pub fn from_fraction(fraction: f64, rounding: RoundingPolicy) -> Self {
        Self::from_value(fraction * 100.0, rounding)
    }

    /// Parse `"75%"`, `"75 %"` or `"75"` without rounding
    pub fn parse(text: &str) -> Option<Self> {
        let digits = text.trim().trim_end_matches('%').trim();
        let value: Decimal = digits.parse().ok()?;
        Some(Self::clamped(value))
    }

    fn clamped(value: Decimal) -> Self {
        Self(value.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn as_f64(&self) -> f64 {
        rust_decimal::prelude::ToPrimitive::to_f64(&self.0).unwrap_or_default()
    }

    /// Absolute difference in percentage points
    pub fn distance(&self, other: &Percentage) -> Decimal {
        (self.0 - other.0).abs()
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0.normalize())
    }
}

/// Aggregated counts for one tower, module or block
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupCount {
    pub group: String,
    pub complete: u32,
    /// Includes counted unclassified cells under `CountAsIncomplete`
    pub incomplete: u32,
    /// Counted cells left out of the percentage
    pub unclassified: u32,
    /// Cells a period filter kept out of counting
    pub skipped: u32,
}

impl GroupCount {
    pub fn new(group: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            ..Self::default()
        }
    }

    /// Denominator of the percentage
    pub fn counted(&self) -> u32 {
        self.complete + self.incomplete
    }

    /// Every inspected cell
    pub fn total(&self) -> u32 {
        self.complete + self.incomplete + self.unclassified + self.skipped
    }

    /// Tally classified cells; only `counted` cells reach the three classes
    pub fn from_cells(
        group: impl Into<String>,
        cells: &[ClassifiedCell],
        policy: UnclassifiedPolicy,
    ) -> Self {
        let mut count = Self::new(group);
        for cell in cells {
            if !cell.counted {
                count.skipped += 1;
                continue;
            }
            match (cell.class, policy) {
                (Classification::Complete, _) => count.complete += 1,
                (Classification::Incomplete, _) => count.incomplete += 1,
                (Classification::Unclassified, UnclassifiedPolicy::CountAsIncomplete) => {
                    count.incomplete += 1;
                }
                (Classification::Unclassified, UnclassifiedPolicy::Exclude) => {
                    count.unclassified += 1;
                }
            }
        }
        count
    }

    pub fn percentage(&self, rounding: RoundingPolicy) -> Percentage {
        Percentage::from_counts(self.complete, self.counted(), rounding)
    }
}

/// Completed and non-completed tallies for one month
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthTally {
    pub completed: u32,
    pub non_completed: u32,
}

/// Per-month tallies for one group, keyed by month number (1..=12)
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyCounts {
    pub group: String,
    pub months: BTreeMap<u32, MonthTally>,
}

impl MonthlyCounts {
    pub fn new(group: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            months: BTreeMap::new(),
        }
    }

    /// Counted, dated, colored cells grouped by month of their date
    pub fn from_cells(group: impl Into<String>, cells: &[ClassifiedCell]) -> Self {
        let mut counts = Self::new(group);
        for cell in cells.iter().filter(|c| c.counted) {
            let Some(date) = cell.date else { continue };
            match cell.class {
                Classification::Complete => {
                    counts.months.entry(date.month()).or_default().completed += 1;
                }
                Classification::Incomplete => {
                    counts.months.entry(date.month()).or_default().non_completed += 1;
                }
                Classification::Unclassified => {}
            }
        }
        counts
    }

    pub fn month(&self, month: u32) -> MonthTally {
        self.months.get(&month).copied().unwrap_or_default()
    }

    pub fn total_completed(&self) -> u32 {
        self.months.values().map(|t| t.completed).sum()
    }

    pub fn total_non_completed(&self) -> u32 {
        self.months.values().map(|t| t.non_completed).sum()
    }
}

/// Upper-case abbreviation for a month number, `None` outside 1..=12
pub fn month_abbreviation(month: u32) -> Option<&'static str> {
    month
        .checked_sub(1)
        .and_then(|i| MONTH_ABBREVIATIONS.get(i as usize))
        .copied()
}

/// Month number for a name or abbreviation (`"may"`, `"September"`)
pub fn parse_month(name: &str) -> Option<u32> {
    let name = name.trim();
    if let Ok(n) = name.parse::<u32>() {
        return (1..=12).contains(&n).then_some(n);
    }
    let prefix: String = name.chars().take(3).collect::<String>().to_ascii_uppercase();
    MONTH_ABBREVIATIONS
        .iter()
        .position(|m| *m == prefix)
        .map(|i| i as u32 + 1)
}

// ============================================================================
// Activities
// ============================================================================

/// One row of an activity tracker sheet
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: String,
    pub name: String,
    /// Fraction on the 0..1 scale
    pub percent_complete: Option<f64>,
    pub start: Option<NaiveDate>,
    pub finish: Option<NaiveDate>,
    pub bold: bool,
    /// 1-based worksheet row the activity was read from
    pub row: u32,
}

impl Activity {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn finish(mut self, date: NaiveDate) -> Self {
        self.finish = Some(date);
        self
    }

    pub fn start(mut self, date: NaiveDate) -> Self {
        self.start = Some(date);
        self
    }

    pub fn percent_complete(mut self, fraction: f64) -> Self {
        self.percent_complete = Some(fraction);
        self
    }

    pub fn bold(mut self, bold: bool) -> Self {
        self.bold = bold;
        self
    }

    pub fn row(mut self, row: u32) -> Self {
        self.row = row;
        self
    }
}

/// A named schedule line with its `% Complete` (fraction on the 0..1 scale)
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskProgress {
    pub name: String,
    pub percent_complete: Option<f64>,
}

impl TaskProgress {
    pub fn new(name: impl Into<String>, percent_complete: Option<f64>) -> Self {
        Self {
            name: name.into(),
            percent_complete,
        }
    }
}

// ============================================================================
// Traits
// ============================================================================

/// Output rendering
pub trait Renderer {
    type Output;

    /// Render a report to the output format
    fn render(&self, report: &Report) -> Result<Self::Output, RenderError>;
}

// ============================================================================
// Errors
// ============================================================================

/// Invalid tracker layout
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    #[error("region {region}: invalid column '{column}'")]
    InvalidColumn { region: String, column: String },

    #[error("region {region}: invalid row {row}")]
    InvalidRow { region: String, row: u32 },

    #[error("region {0} has no cells")]
    EmptyRegion(String),

    #[error("regions {first} and {second} overlap")]
    Overlap { first: String, second: String },

    #[error("region {0} is defined twice")]
    DuplicateRegion(String),
}

/// Rendering error
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Format error: {0}")]
    Format(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Failure of one report. Other reports in the same run continue.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("workbook {key}: {message}")]
    Workbook { key: String, message: String },

    #[error("no file matches {0}")]
    NoMatchingFiles(String),

    #[error("endpoint error: {0}")]
    Endpoint(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

// ============================================================================
// Tests
// ============================================================================

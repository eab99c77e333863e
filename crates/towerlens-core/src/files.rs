//! Filename conventions of the tracker bucket
//!
//! Keys look like `Veridia/Tower 4 Finishing Tracker (13-05-2025).xlsx`: a
//! project folder, a descriptive stem and an embedded date. Everything here
//! is pure string work; nothing touches the store.

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

use crate::store::StoreError;

fn day_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d{2})-(\d{2})-(\d{4})").expect("valid regex"))
}

fn month_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?:^|\D)(\d{2})-(\d{4})(?:\D|$)").expect("valid regex"))
}

fn finishing_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)tower\s+(\w+)\s+finishing\s+tracker").expect("valid regex"))
}

fn upload_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9\s]+\((\d{2})-(\d{2})-(\d{4})\)\.xlsx$").expect("valid regex")
    })
}

/// Date embedded in a file name
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum FileDate {
    /// `DD-MM-YYYY`
    Day(NaiveDate),
    /// `MM-YYYY`
    Month { year: i32, month: u32 },
}

impl FileDate {
    /// Find the first date in `text`; a full day date wins over a month
    pub fn extract(text: &str) -> Option<Self> {
        if let Some(caps) = day_date_re().captures(text) {
            let day = caps[1].parse().ok()?;
            let month = caps[2].parse().ok()?;
            let year = caps[3].parse().ok()?;
            return NaiveDate::from_ymd_opt(year, month, day).map(Self::Day);
        }
        let caps = month_date_re().captures(text)?;
        let month: u32 = caps[1].parse().ok()?;
        let year = caps[2].parse().ok()?;
        (1..=12)
            .contains(&month)
            .then_some(Self::Month { year, month })
    }

    pub fn year(&self) -> i32 {
        match self {
            Self::Day(d) => d.year(),
            Self::Month { year, .. } => *year,
        }
    }

    pub fn month(&self) -> u32 {
        match self {
            Self::Day(d) => d.month(),
            Self::Month { month, .. } => *month,
        }
    }

    /// Day date, or the first of the month
    pub fn first_day(&self) -> Option<NaiveDate> {
        match self {
            Self::Day(d) => Some(*d),
            Self::Month { year, month } => NaiveDate::from_ymd_opt(*year, *month, 1),
        }
    }
}

impl fmt::Display for FileDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Day(d) => write!(f, "{}", d.format("%d-%m-%Y")),
            Self::Month { year, month } => write!(f, "{month:02}-{year}"),
        }
    }
}

/// What a tracker file holds, judged from its stem
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ReportKind {
    StructureTracker,
    FinishingTracker { tower: String },
    Other,
}

impl ReportKind {
    pub fn from_stem(stem: &str) -> Self {
        if let Some(caps) = finishing_re().captures(stem) {
            return Self::FinishingTracker {
                tower: caps[1].to_string(),
            };
        }
        if stem.to_ascii_lowercase().contains("structure work tracker") {
            return Self::StructureTracker;
        }
        Self::Other
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StructureTracker => f.write_str("structure tracker"),
            Self::FinishingTracker { tower } => write!(f, "tower {tower} finishing tracker"),
            Self::Other => f.write_str("other"),
        }
    }
}

/// Object key plus metadata parsed from it
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RemoteFile {
    pub key: String,
    /// Text before the first `/`, empty for top-level keys
    pub project: String,
    /// File name without folder and extension
    pub stem: String,
    pub kind: ReportKind,
    pub date: Option<FileDate>,
}

impl RemoteFile {
    pub fn parse(key: &str) -> Self {
        let project = key.split_once('/').map(|(p, _)| p.to_string()).unwrap_or_default();
        let name = key.rsplit('/').next().unwrap_or(key);
        let stem = name
            .strip_suffix(".xlsx")
            .or_else(|| name.strip_suffix(".XLSX"))
            .unwrap_or(name)
            .to_string();
        Self {
            key: key.to_string(),
            project,
            kind: ReportKind::from_stem(&stem),
            date: FileDate::extract(&stem),
            stem,
        }
    }
}

/// Predicates a key must satisfy to feed a report
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileFilter {
    pub prefix: Option<String>,
    pub contains: Vec<String>,
    /// `(year, month)` the embedded date must fall in
    pub month_year: Option<(i32, u32)>,
}

impl FileFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn contains(mut self, needle: impl Into<String>) -> Self {
        self.contains.push(needle.into());
        self
    }

    pub fn month_year(mut self, year: i32, month: u32) -> Self {
        self.month_year = Some((year, month));
        self
    }

    pub fn matches(&self, key: &str) -> bool {
        if let Some(prefix) = &self.prefix {
            if !key.starts_with(prefix.as_str()) {
                return false;
            }
        }
        if !self.contains.iter().all(|needle| key.contains(needle.as_str())) {
            return false;
        }
        match self.month_year {
            None => true,
            Some((year, month)) => FileDate::extract(key)
                .is_some_and(|d| d.year() == year && d.month() == month),
        }
    }
}

impl fmt::Display for FileFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(prefix) = &self.prefix {
            parts.push(format!("prefix '{prefix}'"));
        }
        for needle in &self.contains {
            parts.push(format!("'{needle}'"));
        }
        if let Some((year, month)) = self.month_year {
            parts.push(format!("{month:02}-{year}"));
        }
        if parts.is_empty() {
            f.write_str("any file")
        } else {
            f.write_str(&parts.join(" + "))
        }
    }
}

/// Keys matching every predicate, sorted and deduplicated
pub fn select_files<S: AsRef<str>>(keys: &[S], filter: &FileFilter) -> Vec<String> {
    let mut selected: Vec<String> = keys
        .iter()
        .map(AsRef::as_ref)
        .filter(|key| filter.matches(key))
        .map(str::to_string)
        .collect();
    selected.sort();
    selected.dedup();
    selected
}

/// Latest embedded date wins, then the greatest key. Undated keys lose to dated ones.
pub fn pick_latest<S: AsRef<str>>(matches: &[S]) -> Option<&str> {
    matches
        .iter()
        .map(AsRef::as_ref)
        .max_by_key(|key| (FileDate::extract(key).and_then(|d| d.first_day()), *key))
}

/// Keys split around the reporting cutoff day
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CutoffSplit {
    pub previous: Vec<String>,
    pub current: Vec<String>,
}

/// Files dated in `today`'s month on or after `cutoff_day` are current; every
/// other dated file is previous. Undated keys are dropped. Month-only dates
/// count as the first of their month.
pub fn split_by_cutoff<S: AsRef<str>>(keys: &[S], today: NaiveDate, cutoff_day: u32) -> CutoffSplit {
    let mut split = CutoffSplit::default();
    for key in keys.iter().map(AsRef::as_ref) {
        let Some(date) = FileDate::extract(key).and_then(|d| d.first_day()) else {
            continue;
        };
        let this_month = date.year() == today.year() && date.month() == today.month();
        if this_month && date.day() >= cutoff_day {
            split.current.push(key.to_string());
        } else {
            split.previous.push(key.to_string());
        }
    }
    split
}

/// Check `Name (DD-MM-YYYY).xlsx`: alphanumeric/space stem and a real date
pub fn validate_upload_name(name: &str) -> Result<NaiveDate, StoreError> {
    let invalid = |reason: &str| StoreError::InvalidName {
        name: name.to_string(),
        reason: reason.to_string(),
    };
    let caps = upload_name_re()
        .captures(name)
        .ok_or_else(|| invalid("expected 'name(DD-MM-YYYY).xlsx' with letters, digits and spaces"))?;
    let day = caps[1].parse().map_err(|_| invalid("bad day"))?;
    let month = caps[2].parse().map_err(|_| invalid("bad month"))?;
    let year = caps[3].parse().map_err(|_| invalid("bad year"))?;
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| invalid("not a calendar date"))
}

/// Key for an upload into `folder`
pub fn upload_key(folder: &str, name: &str) -> String {
    let folder = folder.trim_matches('/');
    if folder.is_empty() {
        name.to_string()
    } else {
        format!("{folder}/{name}")
    }
}

//! Report tables handed to renderers

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Percentage, RenderError};

/// One row of the overall rollup table
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRow {
    #[serde(rename = "Project")]
    pub project: String,
    #[serde(rename = "Tower Name")]
    pub tower: String,
    #[serde(rename = "Structure")]
    pub structure: String,
    #[serde(rename = "Finishing")]
    pub finishing: String,
}

impl ReportRow {
    pub const HEADERS: [&'static str; 4] = ["Project", "Tower Name", "Structure", "Finishing"];

    pub fn new(
        project: impl Into<String>,
        tower: impl Into<String>,
        structure: Percentage,
        finishing: Percentage,
    ) -> Self {
        Self {
            project: project.into(),
            tower: tower.into(),
            structure: structure.to_string(),
            finishing: finishing.to_string(),
        }
    }

    fn cells(&self) -> Vec<TableCell> {
        let percent_or_text = |s: &str| {
            Percentage::parse(s).map_or_else(|| TableCell::Text(s.to_string()), TableCell::Percent)
        };
        vec![
            TableCell::Text(self.project.clone()),
            TableCell::Text(self.tower.clone()),
            percent_or_text(&self.structure),
            percent_or_text(&self.finishing),
        ]
    }
}

/// Cell of a rendered table
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum TableCell {
    Text(String),
    Integer(i64),
    Number(f64),
    Percent(Percentage),
    #[default]
    Empty,
}

impl TableCell {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<&str> for TableCell {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for TableCell {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<u32> for TableCell {
    fn from(value: u32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<i64> for TableCell {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<Percentage> for TableCell {
    fn from(value: Percentage) -> Self {
        Self::Percent(value)
    }
}

impl fmt::Display for TableCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Percent(p) => write!(f, "{p}"),
            Self::Empty => Ok(()),
        }
    }
}

/// A titled table with a header row
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReportTable {
    pub title: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<TableCell>>,
    pub sheet_name: Option<String>,
}

impl ReportTable {
    pub fn new<S: Into<String>>(title: impl Into<String>, columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            title: title.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
            sheet_name: None,
        }
    }

    /// Overall report table from rollup rows
    pub fn from_report_rows(title: impl Into<String>, rows: &[ReportRow]) -> Self {
        let mut table = Self::new(title, ReportRow::HEADERS);
        table.rows = rows.iter().map(ReportRow::cells).collect();
        table
    }

    pub fn with_sheet_name(mut self, name: impl Into<String>) -> Self {
        self.sheet_name = Some(name.into());
        self
    }

    /// Append a row; its width must match the header
    pub fn push_row(&mut self, cells: Vec<TableCell>) -> Result<(), RenderError> {
        if cells.len() != self.columns.len() {
            return Err(RenderError::InvalidData(format!(
                "table '{}': row has {} cells, header has {}",
                self.title,
                cells.len(),
                self.columns.len()
            )));
        }
        self.rows.push(cells);
        Ok(())
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column(&self, header: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == header)
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<&TableCell> {
        let col = self.column(column)?;
        self.rows.get(row)?.get(col)
    }

    /// Pipe-delimited text form, used when a table is embedded in a prompt
    pub fn to_markdown(&self) -> String {
        let mut out = format!("| {} |\n", self.columns.join(" | "));
        out.push_str(&format!("|{}\n", "---|".repeat(self.columns.len())));
        for row in &self.rows {
            let cells: Vec<String> = row.iter().map(ToString::to_string).collect();
            out.push_str(&format!("| {} |\n", cells.join(" | ")));
        }
        out
    }
}

/// One worksheet of stacked tables
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReportSheet {
    pub name: String,
    pub tables: Vec<ReportTable>,
}

impl ReportSheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tables: Vec::new(),
        }
    }

    pub fn table(mut self, table: ReportTable) -> Self {
        self.tables.push(table);
        self
    }
}

/// A workbook worth of report sheets
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub sheets: Vec<ReportSheet>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    /// One sheet holding one table, named after the table
    pub fn single(table: ReportTable) -> Self {
        let name = table.sheet_name.clone().unwrap_or_else(|| table.title.clone());
        Self::new().sheet(ReportSheet::new(name).table(table))
    }

    pub fn sheet(mut self, sheet: ReportSheet) -> Self {
        self.sheets.push(sheet);
        self
    }

    pub fn tables(&self) -> impl Iterator<Item = &ReportTable> {
        self.sheets.iter().flat_map(|s| s.tables.iter())
    }
}

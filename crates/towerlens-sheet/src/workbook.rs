//! Workbook and sheet access

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Arc;

use calamine::{Data, Range, Reader, Xlsx};
use chrono::{NaiveDate, NaiveDateTime};
use quick_xml::events::{BytesStart, Event};
use tracing::debug;

use towerlens_core::{CellFill, CellRef, CellSource, CellValue};

use crate::package::{attr, xml_error, Package};
use crate::styles::StyleTable;
use crate::{excel_serial_to_datetime, SheetError};

/// An opened tracker workbook
pub struct TrackerWorkbook {
    package: Package,
    values: Xlsx<Cursor<Vec<u8>>>,
    styles: Arc<StyleTable>,
    /// `(sheet name, part path)` in workbook order
    sheets: Vec<(String, String)>,
}

impl TrackerWorkbook {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, SheetError> {
        let values =
            Xlsx::new(Cursor::new(bytes.clone())).map_err(|e| SheetError::Package(e.to_string()))?;
        let mut package = Package::open(bytes)?;
        let styles = match package.part("xl/styles.xml")? {
            Some(xml) => StyleTable::parse(&xml)?,
            None => StyleTable::default(),
        };
        let sheets = package.sheet_parts()?;
        debug!(
            sheets = sheets.len(),
            formats = styles.format_count(),
            "opened workbook"
        );
        Ok(Self {
            package,
            values,
            styles: Arc::new(styles),
            sheets,
        })
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Exact name first, then a trimmed case-insensitive match
    fn resolve(&self, name: &str) -> Option<(String, String)> {
        self.sheets
            .iter()
            .find(|(n, _)| n == name)
            .or_else(|| {
                self.sheets
                    .iter()
                    .find(|(n, _)| n.trim().eq_ignore_ascii_case(name.trim()))
            })
            .cloned()
    }

    pub fn has_sheet(&self, name: &str) -> bool {
        self.resolve(name).is_some()
    }

    pub fn sheet(&mut self, name: &str) -> Result<TrackerSheet, SheetError> {
        let (actual, part) = self
            .resolve(name)
            .ok_or_else(|| SheetError::SheetNotFound(name.to_string()))?;
        let range = self
            .values
            .worksheet_range(&actual)
            .map_err(|e| SheetError::Cells(format!("{actual}: {e}")))?;
        let xml = self.package.require(&part)?;
        let cell_styles = parse_cell_styles(&xml, &part)?;
        debug!(sheet = %actual, styled_cells = cell_styles.len(), "loaded sheet");
        Ok(TrackerSheet {
            name: actual,
            range,
            cell_styles,
            styles: Arc::clone(&self.styles),
        })
    }

    /// First of `candidates` present in the workbook
    pub fn first_sheet_named<S: AsRef<str>>(
        &mut self,
        candidates: &[S],
    ) -> Result<TrackerSheet, SheetError> {
        let found = candidates
            .iter()
            .map(AsRef::as_ref)
            .find(|name| self.has_sheet(name))
            .map(str::to_string);
        match found {
            Some(name) => self.sheet(&name),
            None => Err(SheetError::NoMatchingSheet(
                candidates.iter().map(|c| c.as_ref().to_string()).collect(),
            )),
        }
    }
}

/// Style index of every styled `<c>` in a worksheet part
fn parse_cell_styles(xml: &[u8], part: &str) -> Result<HashMap<CellRef, u32>, SheetError> {
    let mut styles = HashMap::new();
    let mut row: u32 = 0;
    let mut next_col: u32 = 1;

    let mut visit = |e: &BytesStart<'_>| match e.local_name().as_ref() {
        b"row" => {
            row = attr(e, b"r").and_then(|r| r.parse().ok()).unwrap_or(row + 1);
            next_col = 1;
        }
        b"c" => {
            let at = attr(e, b"r")
                .and_then(|r| CellRef::parse(&r))
                .unwrap_or(CellRef::new(row, next_col));
            next_col = at.col + 1;
            if let Some(s) = attr(e, b"s").and_then(|s| s.parse::<u32>().ok()) {
                if s > 0 {
                    styles.insert(at, s);
                }
            }
        }
        _ => {}
    };

    let mut reader = quick_xml::Reader::from_reader(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();
    loop {
        match reader
            .read_event_into(&mut buf)
            .map_err(|e| xml_error(part, e))?
        {
            Event::Eof => break,
            Event::Start(e) | Event::Empty(e) => visit(&e),
            _ => {}
        }
        buf.clear();
    }
    Ok(styles)
}

/// One worksheet: calamine values plus resolved styles
pub struct TrackerSheet {
    name: String,
    range: Range<Data>,
    cell_styles: HashMap<CellRef, u32>,
    styles: Arc<StyleTable>,
}

impl TrackerSheet {
    fn style(&self, at: CellRef) -> u32 {
        self.cell_styles.get(&at).copied().unwrap_or(0)
    }

    pub fn max_col(&self) -> u32 {
        let from_values = self.range.end().map_or(0, |(_, c)| c + 1);
        let from_styles = self.cell_styles.keys().map(|at| at.col).max().unwrap_or(0);
        from_values.max(from_styles)
    }

    /// Values of rows `1..=max_row`, columns `1..=max_col`
    pub fn rows(&self) -> Vec<Vec<CellValue>> {
        let cols = self.max_col();
        (1..=self.max_row())
            .map(|row| {
                (1..=cols)
                    .map(|col| self.value(CellRef::new(row, col)))
                    .collect()
            })
            .collect()
    }
}

impl CellSource for TrackerSheet {
    fn name(&self) -> &str {
        &self.name
    }

    fn value(&self, at: CellRef) -> CellValue {
        if at.row == 0 || at.col == 0 {
            return CellValue::Empty;
        }
        self.range
            .get_value(at.zero_based())
            .map(to_cell_value)
            .unwrap_or_default()
    }

    fn fill(&self, at: CellRef) -> CellFill {
        self.styles.fill(self.style(at))
    }

    fn is_bold(&self, at: CellRef) -> bool {
        self.styles.is_bold(self.style(at))
    }

    fn max_row(&self) -> u32 {
        let from_values = self.range.end().map_or(0, |(r, _)| r + 1);
        let from_styles = self.cell_styles.keys().map(|at| at.row).max().unwrap_or(0);
        from_values.max(from_styles)
    }
}

fn to_cell_value(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::Error(e) => CellValue::Error(e.to_string()),
        Data::DateTime(dt) => {
            let serial = dt.as_f64();
            excel_serial_to_datetime(serial).map_or(CellValue::Number(serial), CellValue::DateTime)
        }
        Data::DateTimeIso(s) => parse_iso(s).map_or_else(|| CellValue::Text(s.clone()), CellValue::DateTime),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
    }
}

fn parse_iso(text: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_styles_with_and_without_references() {
        let xml = br#"<worksheet><sheetData>
            <row r="2"><c r="B2" s="3"/><c s="4"><v>1</v></c><c r="E2" s="0"/></row>
            <row><c s="5"/></row>
        </sheetData></worksheet>"#;
        let styles = parse_cell_styles(xml, "sheet1").unwrap();
        assert_eq!(styles.get(&CellRef::new(2, 2)), Some(&3));
        assert_eq!(styles.get(&CellRef::new(2, 3)), Some(&4));
        assert_eq!(styles.get(&CellRef::new(2, 5)), None);
        assert_eq!(styles.get(&CellRef::new(3, 1)), Some(&5));
    }

    #[test]
    fn iso_values() {
        assert_eq!(
            to_cell_value(&Data::DateTimeIso("2025-05-13".into())).as_date(),
            NaiveDate::from_ymd_opt(2025, 5, 13)
        );
        assert_eq!(
            to_cell_value(&Data::DateTimeIso("garbage".into())),
            CellValue::Text("garbage".into())
        );
        assert_eq!(to_cell_value(&Data::Int(3)), CellValue::Number(3.0));
    }
}

//! `xl/styles.xml`: fonts, fills and the `cellXfs` table cells point into
//!
//! Only the pieces the classifier needs are kept: whether a font is bold and
//! what a fill looks like. `dxfs` and `cellStyleXfs` are skipped, so the
//! `fill` and `xf` elements they contain never shift the indices.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use towerlens_core::{CellFill, FillColor};

use crate::package::{attr, xml_error};
use crate::SheetError;

const PART: &str = "xl/styles.xml";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Xf {
    font_id: usize,
    fill_id: usize,
}

/// Resolved style records of a workbook
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StyleTable {
    bold: Vec<bool>,
    fills: Vec<CellFill>,
    xfs: Vec<Xf>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Section {
    Other,
    Fonts,
    Fills,
    CellXfs,
}

struct StyleParser {
    table: StyleTable,
    section: Section,
    bold: bool,
    pattern: Option<String>,
    color: Option<FillColor>,
    in_pattern: bool,
}

impl StyleParser {
    fn open(&mut self, e: &BytesStart<'_>, empty: bool) {
        let name = e.local_name();
        let name = name.as_ref();
        match (self.section, name) {
            (_, b"fonts") => self.section = Section::Fonts,
            (_, b"fills") => self.section = Section::Fills,
            (_, b"cellXfs") => self.section = Section::CellXfs,
            (Section::Fonts, b"font") => self.bold = false,
            (Section::Fonts, b"b") => {
                self.bold = !matches!(attr(e, b"val").as_deref(), Some("0" | "false"));
            }
            (Section::Fills, b"fill") => {
                self.pattern = None;
                self.color = None;
            }
            (Section::Fills, b"patternFill") => {
                self.pattern = Some(attr(e, b"patternType").unwrap_or_else(|| "none".into()));
                self.in_pattern = true;
            }
            (Section::Fills, b"gradientFill") => self.pattern = Some("gradient".into()),
            (Section::Fills, b"fgColor") if self.in_pattern => self.color = Some(parse_color(e)),
            (Section::CellXfs, b"xf") => {
                let index = |key: &[u8]| -> usize {
                    attr(e, key)
                        .and_then(|v| v.parse().ok())
                        .unwrap_or(0)
                };
                self.table.xfs.push(Xf {
                    font_id: index(b"fontId"),
                    fill_id: index(b"fillId"),
                });
            }
            _ => {}
        }
        if empty {
            self.close(name);
        }
    }

    fn close(&mut self, name: &[u8]) {
        match (self.section, name) {
            (_, b"fonts" | b"fills" | b"cellXfs") => self.section = Section::Other,
            (Section::Fonts, b"font") => self.table.bold.push(self.bold),
            (Section::Fills, b"patternFill") => self.in_pattern = false,
            (Section::Fills, b"fill") => {
                let fill = resolve_fill(self.pattern.take(), self.color.take());
                self.table.fills.push(fill);
            }
            _ => {}
        }
    }
}

fn parse_color(e: &BytesStart<'_>) -> FillColor {
    if let Some(rgb) = attr(e, b"rgb") {
        return FillColor::rgb(&rgb).unwrap_or(FillColor::Auto);
    }
    if let Some(theme) = attr(e, b"theme").and_then(|v| v.parse().ok()) {
        return FillColor::Theme(theme);
    }
    if let Some(indexed) = attr(e, b"indexed").and_then(|v| v.parse().ok()) {
        return FillColor::Indexed(indexed);
    }
    FillColor::Auto
}

fn resolve_fill(pattern: Option<String>, color: Option<FillColor>) -> CellFill {
    match pattern.as_deref() {
        None | Some("none") => CellFill::None,
        Some("solid") => CellFill::Solid(color.unwrap_or(FillColor::Auto)),
        Some(other) => CellFill::Pattern(other.to_string()),
    }
}

impl StyleTable {
    pub fn parse(xml: &[u8]) -> Result<Self, SheetError> {
        let mut parser = StyleParser {
            table: Self::default(),
            section: Section::Other,
            bold: false,
            pattern: None,
            color: None,
            in_pattern: false,
        };
        let mut reader = Reader::from_reader(xml);
        reader.trim_text(true);
        let mut buf = Vec::new();
        loop {
            match reader
                .read_event_into(&mut buf)
                .map_err(|e| xml_error(PART, e))?
            {
                Event::Eof => break,
                Event::Start(e) => parser.open(&e, false),
                Event::Empty(e) => parser.open(&e, true),
                Event::End(e) => parser.close(e.local_name().as_ref()),
                _ => {}
            }
            buf.clear();
        }
        Ok(parser.table)
    }

    /// Fill of a cell format index; unknown indices have no fill
    pub fn fill(&self, xf: u32) -> CellFill {
        self.xfs
            .get(xf as usize)
            .and_then(|x| self.fills.get(x.fill_id))
            .cloned()
            .unwrap_or_default()
    }

    pub fn is_bold(&self, xf: u32) -> bool {
        self.xfs
            .get(xf as usize)
            .and_then(|x| self.bold.get(x.font_id))
            .copied()
            .unwrap_or(false)
    }

    pub fn format_count(&self) -> usize {
        self.xfs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <fonts count="3">
    <font><sz val="11"/><name val="Calibri"/></font>
    <font><b/><sz val="11"/></font>
    <font><b val="0"/></font>
  </fonts>
  <fills count="6">
    <fill><patternFill patternType="none"/></fill>
    <fill><patternFill patternType="gray125"/></fill>
    <fill><patternFill patternType="solid"><fgColor rgb="FF92D050"/><bgColor indexed="64"/></patternFill></fill>
    <fill><patternFill patternType="solid"><fgColor theme="4" tint="0.39"/></patternFill></fill>
    <fill><patternFill patternType="solid"><fgColor rgb="FF00B0F0"/></patternFill></fill>
    <fill><patternFill/></fill>
  </fills>
  <borders count="1"><border/></borders>
  <cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="4" borderId="0"/></cellStyleXfs>
  <cellXfs count="6">
    <xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>
    <xf numFmtId="0" fontId="0" fillId="2" borderId="0" xfId="0" applyFill="1"/>
    <xf numFmtId="14" fontId="1" fillId="4" borderId="0" xfId="0"/>
    <xf numFmtId="0" fontId="2" fillId="3" borderId="0" xfId="0"/>
    <xf numFmtId="0" fontId="0" fillId="1" borderId="0" xfId="0"/>
    <xf numFmtId="0" fontId="0" fillId="5" borderId="0" xfId="0"/>
  </cellXfs>
  <dxfs count="1"><dxf><font><b/></font><fill><patternFill><bgColor rgb="FFFFC7CE"/></patternFill></fill></dxf></dxfs>
</styleSheet>"#;

    #[test]
    fn fills_resolved_through_cell_xfs() {
        let table = StyleTable::parse(STYLES.as_bytes()).unwrap();
        assert_eq!(table.format_count(), 6);
        assert_eq!(table.fill(0), CellFill::None);
        assert_eq!(table.fill(1), CellFill::Solid(FillColor::Rgb("#92D050".into())));
        assert_eq!(table.fill(2), CellFill::Solid(FillColor::Rgb("#00B0F0".into())));
        assert_eq!(table.fill(3), CellFill::Solid(FillColor::Theme(4)));
        assert_eq!(table.fill(4), CellFill::Pattern("gray125".into()));
        assert_eq!(table.fill(5), CellFill::None);
        assert_eq!(table.fill(99), CellFill::None);
    }

    #[test]
    fn bold_fonts() {
        let table = StyleTable::parse(STYLES.as_bytes()).unwrap();
        assert!(!table.is_bold(0));
        assert!(table.is_bold(2));
        assert!(!table.is_bold(3));
        assert!(!table.is_bold(42));
    }

    #[test]
    fn malformed_xml_is_an_error() {
        let err = StyleTable::parse(b"<styleSheet><fills></styleSheet>").unwrap_err();
        assert!(matches!(err, SheetError::Xml { .. }));
    }
}

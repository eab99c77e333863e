//! Raw access to the parts of an .xlsx package

use std::io::{Cursor, Read};

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use zip::result::ZipError;
use zip::ZipArchive;

use crate::SheetError;

pub(crate) struct Package {
    archive: ZipArchive<Cursor<Vec<u8>>>,
}

impl Package {
    pub(crate) fn open(bytes: Vec<u8>) -> Result<Self, SheetError> {
        let archive =
            ZipArchive::new(Cursor::new(bytes)).map_err(|e| SheetError::Package(e.to_string()))?;
        Ok(Self { archive })
    }

    /// Part contents, `None` when the part does not exist
    pub(crate) fn part(&mut self, name: &str) -> Result<Option<Vec<u8>>, SheetError> {
        match self.archive.by_name(name) {
            Ok(mut file) => {
                let mut out = Vec::new();
                file.read_to_end(&mut out)
                    .map_err(|e| SheetError::Package(format!("{name}: {e}")))?;
                Ok(Some(out))
            }
            Err(ZipError::FileNotFound) => Ok(None),
            Err(e) => Err(SheetError::Package(format!("{name}: {e}"))),
        }
    }

    pub(crate) fn require(&mut self, name: &str) -> Result<Vec<u8>, SheetError> {
        self.part(name)?
            .ok_or_else(|| SheetError::MissingPart(name.to_string()))
    }

    /// `(sheet name, part path)` in workbook order
    pub(crate) fn sheet_parts(&mut self) -> Result<Vec<(String, String)>, SheetError> {
        const WORKBOOK: &str = "xl/workbook.xml";
        const RELS: &str = "xl/_rels/workbook.xml.rels";

        let workbook = self.require(WORKBOOK)?;
        let mut sheets: Vec<(String, String)> = Vec::new();
        scan(&workbook, WORKBOOK, |e| {
            if e.local_name().as_ref() == b"sheet" {
                if let (Some(name), Some(rid)) = (attr(e, b"name"), attr(e, b"id")) {
                    sheets.push((name, rid));
                }
            }
        })?;

        let rels = self.require(RELS)?;
        let mut targets: Vec<(String, String)> = Vec::new();
        scan(&rels, RELS, |e| {
            if e.local_name().as_ref() == b"Relationship" {
                if let (Some(id), Some(target)) = (attr(e, b"Id"), attr(e, b"Target")) {
                    targets.push((id, target));
                }
            }
        })?;

        sheets
            .into_iter()
            .map(|(name, rid)| {
                let target = targets
                    .iter()
                    .find(|(id, _)| *id == rid)
                    .map(|(_, t)| resolve_target(t))
                    .ok_or_else(|| SheetError::Xml {
                        part: RELS.to_string(),
                        message: format!("no relationship {rid} for sheet {name}"),
                    })?;
                Ok((name, target))
            })
            .collect()
    }
}

/// Relationship targets are relative to `xl/` unless absolute
fn resolve_target(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("xl/{}", target.trim_start_matches("./")),
    }
}

/// Visit every start or empty element of a part
pub(crate) fn scan(
    xml: &[u8],
    part: &str,
    mut visit: impl FnMut(&BytesStart<'_>),
) -> Result<(), SheetError> {
    let mut reader = Reader::from_reader(xml);
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
    Ok(())
}

/// Attribute value by local name
pub(crate) fn attr(e: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == name)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

pub(crate) fn xml_error(part: &str, e: impl std::fmt::Display) -> SheetError {
    SheetError::Xml {
        part: part.to_string(),
        message: e.to_string(),
    }
}

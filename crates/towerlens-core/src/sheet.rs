//! Cell access seam between workbook readers and the classifier

use std::collections::HashMap;

use crate::{CellFill, CellRef, CellValue, FillColor};

/// Read access to one worksheet's cells
pub trait CellSource {
    /// Sheet name, used in log and diagnostic output
    fn name(&self) -> &str;

    fn value(&self, at: CellRef) -> CellValue;

    fn fill(&self, at: CellRef) -> CellFill;

    fn is_bold(&self, at: CellRef) -> bool;

    /// Last row holding any value or style, 0 for an empty sheet
    fn max_row(&self) -> u32;
}

/// In-memory sheet for tests and synthetic inputs
#[derive(Clone, Debug, Default)]
pub struct MemorySheet {
    name: String,
    values: HashMap<CellRef, CellValue>,
    fills: HashMap<CellRef, CellFill>,
    bold: HashMap<CellRef, bool>,
}

impl MemorySheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn set_value(&mut self, at: CellRef, value: CellValue) -> &mut Self {
        self.values.insert(at, value);
        self
    }

    pub fn set_fill(&mut self, at: CellRef, fill: CellFill) -> &mut Self {
        self.fills.insert(at, fill);
        self
    }

    /// Solid RGB fill; an unparseable color leaves the cell unfilled
    pub fn set_solid(&mut self, at: CellRef, hex: &str) -> &mut Self {
        if let Some(color) = FillColor::rgb(hex) {
            self.fills.insert(at, CellFill::Solid(color));
        }
        self
    }

    pub fn set_bold(&mut self, at: CellRef, bold: bool) -> &mut Self {
        self.bold.insert(at, bold);
        self
    }
}

impl CellSource for MemorySheet {
    fn name(&self) -> &str {
        &self.name
    }

    fn value(&self, at: CellRef) -> CellValue {
        self.values.get(&at).cloned().unwrap_or_default()
    }

    fn fill(&self, at: CellRef) -> CellFill {
        self.fills.get(&at).cloned().unwrap_or_default()
    }

    fn is_bold(&self, at: CellRef) -> bool {
        self.bold.get(&at).copied().unwrap_or(false)
    }

    fn max_row(&self) -> u32 {
        self.values
            .keys()
            .chain(self.fills.keys())
            .chain(self.bold.keys())
            .map(|at| at.row)
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sheet_defaults() {
        let mut sheet = MemorySheet::new("Revised Baselines");
        let b4 = CellRef::new(4, 2);
        sheet
            .set_solid(b4, "FF92D050")
            .set_value(b4, CellValue::Text("done".into()))
            .set_bold(CellRef::new(9, 1), true);

        assert_eq!(sheet.name(), "Revised Baselines");
        assert_eq!(sheet.fill(b4), CellFill::Solid(FillColor::Rgb("#92D050".into())));
        assert_eq!(sheet.fill(CellRef::new(1, 1)), CellFill::None);
        assert_eq!(sheet.value(CellRef::new(1, 1)), CellValue::Empty);
        assert!(sheet.is_bold(CellRef::new(9, 1)));
        assert!(!sheet.is_bold(b4));
        assert_eq!(sheet.max_row(), 9);
    }

    #[test]
    fn invalid_color_is_ignored() {
        let mut sheet = MemorySheet::new("s");
        sheet.set_solid(CellRef::new(1, 1), "green");
        assert_eq!(sheet.fill(CellRef::new(1, 1)), CellFill::None);
    }
}

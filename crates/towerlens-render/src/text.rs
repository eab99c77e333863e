//! Aligned plain-text tables for the terminal

use std::fmt::Write;

use towerlens_core::{RenderError, Renderer, Report, ReportTable, TableCell};

/// Column-aligned text renderer
#[derive(Clone, Debug)]
pub struct TextRenderer {
    /// Spaces between columns
    pub gap: usize,
    /// Print `== sheet ==` headings when the report has several sheets
    pub sheet_headings: bool,
}

impl Default for TextRenderer {
    fn default() -> Self {
        Self {
            gap: 2,
            sheet_headings: true,
        }
    }
}

impl TextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gap(mut self, gap: usize) -> Self {
        self.gap = gap;
        self
    }

    pub fn render_table(&self, table: &ReportTable) -> String {
        let mut widths: Vec<usize> = table.columns.iter().map(|c| c.chars().count()).collect();
        let rendered: Vec<Vec<String>> = table
            .rows
            .iter()
            .map(|row| row.iter().map(ToString::to_string).collect())
            .collect();
        for row in &rendered {
            for (col, cell) in row.iter().enumerate() {
                if col < widths.len() {
                    widths[col] = widths[col].max(cell.chars().count());
                }
            }
        }

        let gap = " ".repeat(self.gap);
        let line = |cells: Vec<String>| cells.join(&gap).trim_end().to_string();

        let mut out = String::new();
        let _ = writeln!(out, "{}", table.title);
        let header: Vec<String> = table
            .columns
            .iter()
            .zip(&widths)
            .map(|(c, w)| pad(c, *w, false))
            .collect();
        let _ = writeln!(out, "{}", line(header));
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        let _ = writeln!(out, "{}", line(rule));

        if rendered.is_empty() {
            out.push_str("(no rows)\n");
        }
        for (row, texts) in table.rows.iter().zip(&rendered) {
            let cells: Vec<String> = row
                .iter()
                .zip(texts)
                .zip(&widths)
                .map(|((cell, text), w)| pad(text, *w, is_numeric(cell)))
                .collect();
            let _ = writeln!(out, "{}", line(cells));
        }
        out
    }
}

fn is_numeric(cell: &TableCell) -> bool {
    matches!(
        cell,
        TableCell::Integer(_) | TableCell::Number(_) | TableCell::Percent(_)
    )
}

fn pad(text: &str, width: usize, right: bool) -> String {
    let fill = " ".repeat(width.saturating_sub(text.chars().count()));
    if right {
        format!("{fill}{text}")
    } else {
        format!("{text}{fill}")
    }
}

impl Renderer for TextRenderer {
    type Output = String;

    fn render(&self, report: &Report) -> Result<String, RenderError> {
        let headings = self.sheet_headings && report.sheets.len() > 1;
        let mut blocks = Vec::new();
        for sheet in &report.sheets {
            let mut block = String::new();
            if headings {
                let _ = writeln!(block, "== {} ==", sheet.name);
            }
            let tables: Vec<String> = sheet.tables.iter().map(|t| self.render_table(t)).collect();
            block.push_str(&tables.join("\n"));
            blocks.push(block);
        }
        Ok(blocks.join("\n"))
    }
}

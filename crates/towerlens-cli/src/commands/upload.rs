//! `towerlens upload`: put a tracker workbook into a store folder

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Args;
use tracing::info;
use towerlens_core::files::{upload_key, validate_upload_name};
use towerlens_core::{Diagnostic, DiagnosticCode, Report, ReportError, ReportTable, TableCell};

use super::Context;

#[derive(Args, Debug)]
pub struct UploadArgs {
    /// Workbook to upload
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Destination folder, e.g. `Veridia`
    #[arg(long)]
    pub folder: String,

    /// Object name; defaults to the file name
    #[arg(long)]
    pub name: Option<String>,
}

pub fn run(ctx: &mut Context, args: &UploadArgs) -> Result<Report> {
    let name = match &args.name {
        Some(name) => name.clone(),
        None => args
            .file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .with_context(|| format!("{} has no file name", args.file.display()))?,
    };

    let mut table = ReportTable::new("Upload", ["Key", "Date", "Bytes"]).with_sheet_name("Upload");
    let date = match validate_upload_name(&name) {
        Ok(date) => date,
        Err(e) => {
            ctx.emit(
                Diagnostic::new(DiagnosticCode::E003InvalidUploadName, e.to_string())
                    .with_hint("name files like 'Structure Work Tracker(12-05-2025).xlsx'"),
            );
            return Ok(Report::single(table));
        }
    };

    let bytes = std::fs::read(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let key = upload_key(&args.folder, &name);
    if let Err(e) = ctx.store.put(&key, &bytes) {
        ctx.report_failed(Some(&key), &ReportError::Store(e));
        return Ok(Report::single(table));
    }
    info!(%key, bytes = bytes.len(), "uploaded");

    table.rows.push(vec![
        TableCell::text(&key),
        TableCell::text(date.format("%d-%m-%Y").to_string()),
        TableCell::Integer(i64::try_from(bytes.len()).unwrap_or(i64::MAX)),
    ]);
    Ok(Report::single(table))
}

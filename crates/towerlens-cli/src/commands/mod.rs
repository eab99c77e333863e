//! Report commands
//!
//! Each command reads from the store, emits diagnostics for recoverable
//! conditions and returns the `Report` it produced. A failing tracker only
//! costs its own rows; the rest of the report still renders.

pub mod activity;
pub mod combine;
pub mod delay;
pub mod files;
pub mod overall;
pub mod schedule;
pub mod slab;
pub mod structure;
pub mod upload;

use chrono::NaiveDate;
use tracing::{debug, info};
use towerlens_core::files::{pick_latest, select_files};
use towerlens_core::layout::FinishingLayout;
use towerlens_core::store::list_xlsx;
use towerlens_core::{
    parse_month, Activity, BlobStore, Diagnostic, DiagnosticCode, FileFilter, Layouts, ReportError,
};
use towerlens_llm::{CompletionEndpoint, PostProcessor, Source, WatsonxClient};
use towerlens_sheet::{read_activities, SheetError, TrackerSheet, TrackerWorkbook};

use crate::config::Config;

/// Everything a command needs for one run
pub struct Context {
    pub config: Config,
    pub layouts: Layouts,
    pub store: Box<dyn BlobStore>,
    pub today: NaiveDate,
    endpoint: Option<WatsonxClient>,
    diagnostics: Vec<Diagnostic>,
}

impl Context {
    pub fn new(config: Config, layouts: Layouts, store: Box<dyn BlobStore>, today: NaiveDate) -> Self {
        Self {
            config,
            layouts,
            store,
            today,
            endpoint: None,
            diagnostics: Vec::new(),
        }
    }

    /// Build the completion client when `[llm] enabled = true`. A missing
    /// API key leaves post-processing off with an info diagnostic.
    pub fn with_endpoint(mut self) -> Self {
        if !self.config.llm.enabled {
            return self;
        }
        match WatsonxClient::from_env(self.config.llm.clone()) {
            Ok(client) => self.endpoint = Some(client),
            Err(e) => self.emit(Diagnostic::new(
                DiagnosticCode::I002LocalFallback,
                format!("post-processing off: {e}"),
            )),
        }
        self
    }

    pub fn emit(&mut self, diagnostic: Diagnostic) {
        debug!(code = %diagnostic.code, message = %diagnostic.message, "diagnostic");
        self.diagnostics.push(diagnostic);
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    pub fn post_processor(&self) -> PostProcessor<'_> {
        match &self.endpoint {
            Some(client) => PostProcessor::new(client as &dyn CompletionEndpoint),
            None => PostProcessor::disabled(),
        }
    }

    /// Every `.xlsx` key; a store failure is reported and yields none
    pub fn keys(&mut self) -> Vec<String> {
        match list_xlsx(self.store.as_ref()) {
            Ok(keys) => keys,
            Err(e) => {
                self.report_failed(None, &ReportError::Store(e));
                Vec::new()
            }
        }
    }

    /// The one key feeding `what`. Nothing matching is a warning; several
    /// matches take the latest dated one and say so.
    pub fn select(&mut self, keys: &[String], filter: &FileFilter, what: &str) -> Option<String> {
        let matches = select_files(keys, filter);
        let Some(chosen) = pick_latest(&matches).map(str::to_string) else {
            self.emit(
                Diagnostic::new(
                    DiagnosticCode::W001MissingSource,
                    format!("{what}: no file matches {filter}"),
                )
                .with_hint("upload the tracker or check the layout source filter"),
            );
            return None;
        };
        if matches.len() > 1 {
            let mut diagnostic = Diagnostic::new(
                DiagnosticCode::W002AmbiguousSource,
                format!("{what}: {} files match {filter}, using the latest", matches.len()),
            )
            .with_file(&chosen);
            for other in matches.iter().filter(|k| **k != chosen) {
                diagnostic = diagnostic.with_note(format!("also matched: {other}"));
            }
            self.emit(diagnostic);
        }
        self.emit(
            Diagnostic::new(DiagnosticCode::I001SourceSelected, format!("{what}: reading {chosen}"))
                .with_file(&chosen),
        );
        Some(chosen)
    }

    /// Turn a per-report failure into a diagnostic
    pub fn report_failed(&mut self, key: Option<&str>, error: &ReportError) {
        let code = match error {
            ReportError::Store(_) => DiagnosticCode::E001StoreUnavailable,
            ReportError::Workbook { .. } => DiagnosticCode::E002WorkbookUnreadable,
            ReportError::Layout(_) => DiagnosticCode::E004InvalidLayout,
            ReportError::Render(_) => DiagnosticCode::E005OutputFailed,
            ReportError::NoMatchingFiles(_) => DiagnosticCode::W001MissingSource,
            ReportError::Endpoint(_) => DiagnosticCode::W003EndpointRejected,
            ReportError::InvalidInput(_) => DiagnosticCode::E006InvalidInput,
        };
        let mut diagnostic = Diagnostic::new(code, error.to_string());
        if let Some(key) = key {
            diagnostic = diagnostic.with_file(key);
        }
        self.emit(diagnostic);
    }

    /// Report where a post-processed value came from
    pub fn note_source(&mut self, what: &str, source: &Source) {
        match source {
            Source::Endpoint => info!(what, "endpoint answer verified"),
            Source::Local(reason) if self.endpoint.is_none() => {
                debug!(what, %reason, "post-processing off");
            }
            Source::Local(reason) => self.emit(Diagnostic::new(
                DiagnosticCode::I002LocalFallback,
                format!("{what}: {reason}"),
            )),
            Source::Rejected(reason) => self.emit(
                Diagnostic::new(DiagnosticCode::W003EndpointRejected, format!("{what}: {reason}"))
                    .with_note("the locally computed values were kept"),
            ),
        }
    }
}

/// Fetch and open one workbook
pub fn open_workbook(store: &dyn BlobStore, key: &str) -> Result<TrackerWorkbook, ReportError> {
    let bytes = store.get(key)?;
    TrackerWorkbook::from_bytes(bytes).map_err(|e| e.for_key(key))
}

/// The layout's first existing sheet, or the only sheet of a single-sheet
/// export
pub fn finishing_sheet(
    workbook: &mut TrackerWorkbook,
    layout: &FinishingLayout,
) -> Result<TrackerSheet, SheetError> {
    match workbook.first_sheet_named(&layout.sheets) {
        Err(SheetError::NoMatchingSheet(names)) => {
            let present: Vec<String> = workbook.sheet_names().iter().map(|s| s.to_string()).collect();
            match present.as_slice() {
                [only] => workbook.sheet(only),
                _ => Err(SheetError::NoMatchingSheet(names)),
            }
        }
        found => found,
    }
}

/// Activity rows of a finishing tracker
pub fn finishing_activities(
    store: &dyn BlobStore,
    key: &str,
    layout: &FinishingLayout,
) -> Result<Vec<Activity>, ReportError> {
    let mut workbook = open_workbook(store, key)?;
    let sheet = finishing_sheet(&mut workbook, layout).map_err(|e| e.for_key(key))?;
    read_activities(&sheet, layout.header_row, &layout.columns).map_err(|e| e.for_key(key))
}

/// `MM-YYYY` argument
pub fn parse_month_year(text: &str) -> Result<(i32, u32), String> {
    let (month, year) = text
        .trim()
        .split_once('-')
        .ok_or_else(|| format!("expected MM-YYYY, got '{text}'"))?;
    let month = parse_month(month).ok_or_else(|| format!("unknown month '{month}'"))?;
    let year = year.parse().map_err(|_| format!("bad year '{year}'"))?;
    Ok((year, month))
}

/// Month argument: number or name (`5`, `may`, `September`)
pub fn parse_month_arg(text: &str) -> Result<u32, String> {
    parse_month(text).ok_or_else(|| format!("unknown month '{text}'"))
}

/// `"2025-06-02"`-style date used in report titles
pub fn title_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}


#[cfg(test)]
mod tests {
    use super::*;
    use towerlens_core::MemoryStore;

    fn context(store: MemoryStore) -> Context {
        let today = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        Context::new(Config::default(), Layouts::builtin(), Box::new(store), today)
    }

    #[test]
    fn select_reports_missing_and_ambiguous() {
        let mut ctx = context(MemoryStore::new());
        let keys = vec![
            "Veridia/Structure Work Tracker (02-05-2025).xlsx".to_string(),
            "Veridia/Structure Work Tracker (12-05-2025).xlsx".to_string(),
        ];
        let filter = FileFilter::new().prefix("Veridia").contains("Structure Work Tracker");
        assert_eq!(
            ctx.select(&keys, &filter, "VERIDIA structure").as_deref(),
            Some("Veridia/Structure Work Tracker (12-05-2025).xlsx")
        );
        assert_eq!(ctx.select(&keys, &FileFilter::new().prefix("Eligo"), "ELIGO"), None);

        let codes: Vec<DiagnosticCode> = ctx.take_diagnostics().iter().map(|d| d.code).collect();
        assert_eq!(
            codes,
            [
                DiagnosticCode::W002AmbiguousSource,
                DiagnosticCode::I001SourceSelected,
                DiagnosticCode::W001MissingSource
            ]
        );
    }

    #[test]
    fn unreadable_workbook_is_a_workbook_error() {
        let store = MemoryStore::new().with_object("Veridia/broken.xlsx", b"not a zip".to_vec());
        let err = open_workbook(&store, "Veridia/broken.xlsx").err().unwrap();
        assert!(matches!(err, ReportError::Workbook { ref key, .. } if key == "Veridia/broken.xlsx"));

        let mut ctx = context(MemoryStore::new());
        ctx.report_failed(Some("Veridia/broken.xlsx"), &err);
        let diagnostics = ctx.take_diagnostics();
        assert_eq!(diagnostics[0].code, DiagnosticCode::E002WorkbookUnreadable);
        assert!(diagnostics[0].is_error());
    }

    #[test]
    fn invalid_input_has_its_own_code() {
        let mut ctx = context(MemoryStore::new());
        ctx.report_failed(None, &ReportError::InvalidInput("bad folder".into()));
        let diagnostics = ctx.take_diagnostics();
        assert_eq!(diagnostics[0].code, DiagnosticCode::E006InvalidInput);
        assert_eq!(diagnostics[0].message, "invalid input: bad folder");
        assert!(diagnostics[0].is_error());
    }

    #[test]
    fn month_arguments() {
        assert_eq!(parse_month_year("05-2025"), Ok((2025, 5)));
        assert_eq!(parse_month_year("jun-2025"), Ok((2025, 6)));
        assert!(parse_month_year("2025").is_err());
        assert!(parse_month_year("13-2025").is_err());
        assert_eq!(parse_month_arg("September"), Ok(9));
        assert!(parse_month_arg("smarch").is_err());
    }

    #[test]
    fn disabled_endpoint_stays_quiet() {
        let mut ctx = context(MemoryStore::new()).with_endpoint();
        ctx.note_source("overall", &Source::Local("endpoint disabled".into()));
        assert!(ctx.take_diagnostics().is_empty());
        ctx.note_source("overall", &Source::Rejected("endpoint omitted X".into()));
        assert_eq!(ctx.take_diagnostics()[0].code, DiagnosticCode::W003EndpointRejected);
    }
}

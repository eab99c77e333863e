//! Diagnostics shared by every report kind
//!
//! Recoverable conditions (no matching file, several matching files, endpoint
//! fallback, an unreadable tracker) are reported as [`Diagnostic`]s instead of
//! aborting a run. Emitters live in the binary; this module only defines the
//! data and the [`DiagnosticEmitter`] seam.

use serde::Serialize;
use std::fmt;

/// Diagnostic severity, most severe first
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Hint,
    Info,
}

impl Severity {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Hint => "hint",
            Self::Info => "info",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable diagnostic codes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum DiagnosticCode {
    /// Blob store listing or read failed
    E001StoreUnavailable,
    /// Tracker workbook could not be opened or a sheet is missing
    E002WorkbookUnreadable,
    /// Upload file name does not follow `Name (DD-MM-YYYY).xlsx`
    E003InvalidUploadName,
    /// Layout rejected at load time
    E004InvalidLayout,
    /// Report output could not be written
    E005OutputFailed,
    /// Report arguments rejected before any file is read
    E006InvalidInput,
    /// No stored file matches a report's filter
    W001MissingSource,
    /// Several stored files match one filter
    W002AmbiguousSource,
    /// Endpoint answer rejected against the local computation
    W003EndpointRejected,
    /// Selected source file used for a report
    I001SourceSelected,
    /// Local computation used instead of the endpoint
    I002LocalFallback,
    /// Report written
    I003ReportWritten,
    /// Period filter left no dated cells
    H001EmptyPeriod,
}

impl DiagnosticCode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::E001StoreUnavailable => "E001",
            Self::E002WorkbookUnreadable => "E002",
            Self::E003InvalidUploadName => "E003",
            Self::E004InvalidLayout => "E004",
            Self::E005OutputFailed => "E005",
            Self::E006InvalidInput => "E006",
            Self::W001MissingSource => "W001",
            Self::W002AmbiguousSource => "W002",
            Self::W003EndpointRejected => "W003",
            Self::I001SourceSelected => "I001",
            Self::I002LocalFallback => "I002",
            Self::I003ReportWritten => "I003",
            Self::H001EmptyPeriod => "H001",
        }
    }

    /// Severity implied by the code prefix
    pub const fn default_severity(self) -> Severity {
        match self {
            Self::E001StoreUnavailable
            | Self::E002WorkbookUnreadable
            | Self::E003InvalidUploadName
            | Self::E004InvalidLayout
            | Self::E005OutputFailed
            | Self::E006InvalidInput => Severity::Error,
            Self::W001MissingSource | Self::W002AmbiguousSource | Self::W003EndpointRejected => {
                Severity::Warning
            }
            Self::I001SourceSelected | Self::I002LocalFallback | Self::I003ReportWritten => {
                Severity::Info
            }
            Self::H001EmptyPeriod => Severity::Hint,
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One reportable condition
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub severity: Severity,
    pub message: String,
    /// Blob key or local path the diagnostic refers to
    pub file: Option<String>,
    pub notes: Vec<String>,
    pub hints: Vec<String>,
}

impl Diagnostic {
    /// Diagnostic with the code's default severity
    pub fn new(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            code,
            severity: code.default_severity(),
            message: message.into(),
            file: None,
            notes: Vec::new(),
            hints: Vec::new(),
        }
    }

    pub fn error(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::new(code, message).with_severity(Severity::Error)
    }

    pub fn warning(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::new(code, message).with_severity(Severity::Warning)
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hints.push(hint.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Sink for diagnostics
pub trait DiagnosticEmitter {
    fn emit(&mut self, diagnostic: Diagnostic);
}

impl DiagnosticEmitter for Vec<Diagnostic> {
    fn emit(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_severity_follows_prefix() {
        let codes = [
            DiagnosticCode::E001StoreUnavailable,
            DiagnosticCode::W002AmbiguousSource,
            DiagnosticCode::I002LocalFallback,
            DiagnosticCode::H001EmptyPeriod,
        ];
        for code in codes {
            let expected = match &code.as_str()[..1] {
                "E" => Severity::Error,
                "W" => Severity::Warning,
                "I" => Severity::Info,
                _ => Severity::Hint,
            };
            assert_eq!(code.default_severity(), expected, "{code}");
        }
    }

    #[test]
    fn builder_collects_notes_and_hints() {
        let d = Diagnostic::new(DiagnosticCode::W002AmbiguousSource, "3 files match")
            .with_file("Veridia/a.xlsx")
            .with_note("candidate: Veridia/b.xlsx")
            .with_hint("narrow the filter with --contains");
        assert_eq!(d.severity, Severity::Warning);
        assert_eq!(d.file.as_deref(), Some("Veridia/a.xlsx"));
        assert_eq!(d.notes.len(), 1);
        assert_eq!(d.hints.len(), 1);
        assert!(!d.is_error());
    }

    #[test]
    fn vec_emitter_collects() {
        let mut sink: Vec<Diagnostic> = Vec::new();
        sink.emit(Diagnostic::error(DiagnosticCode::E001StoreUnavailable, "down"));
        assert_eq!(sink.len(), 1);
        assert!(sink[0].is_error());
    }
}

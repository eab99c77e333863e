//! Diagnostic output for the CLI
//!
//! - `TerminalEmitter`: rustc-style lines on stderr
//! - `JsonEmitter`: collected for the JSON document printed on stdout
//!
//! Both apply the same policy:
//! - `--strict` escalates warnings to errors and hints to warnings
//! - `--quiet` hides everything except errors
//!
//! ## Exit Code Semantics
//!
//! | Exit Code | Meaning |
//! |-----------|---------|
//! | 0 | Success: no errors (warnings/hints/info allowed) |
//! | 1 | Failure: one or more errors after policy |
//!
//! `--quiet` never changes the exit code, and JSON output exits exactly as
//! text output does.

use std::io::Write;
use std::process;

use serde::Serialize;
use towerlens_core::{Diagnostic, DiagnosticEmitter, Severity};

// ============================================================================
// Exit Code
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    Failure = 1,
}

impl ExitCode {
    /// The error count must already reflect strict-mode escalation
    pub fn from_error_count(count: usize) -> Self {
        if count > 0 {
            ExitCode::Failure
        } else {
            ExitCode::Success
        }
    }

    pub fn is_success(self) -> bool {
        matches!(self, ExitCode::Success)
    }

    pub fn code(self) -> i32 {
        self as i32
    }
}

impl From<ExitCode> for process::ExitCode {
    fn from(code: ExitCode) -> Self {
        process::ExitCode::from(code as u8)
    }
}

// ============================================================================
// Diagnostic Config
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct DiagnosticConfig {
    /// Escalate severities: warnings become errors, hints become warnings
    pub strict: bool,
    /// Suppress all output except errors
    pub quiet: bool,
    /// Prefix stripped from file names (the store root) for stable output
    pub base_path: Option<String>,
}

impl DiagnosticConfig {
    pub fn strict() -> Self {
        Self {
            strict: true,
            ..Default::default()
        }
    }

    pub fn quiet() -> Self {
        Self {
            quiet: true,
            ..Default::default()
        }
    }

    pub fn with_base_path(mut self, path: impl Into<String>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    pub fn effective_severity(&self, severity: Severity) -> Severity {
        if self.strict {
            match severity {
                Severity::Warning => Severity::Error,
                Severity::Hint => Severity::Warning,
                s => s,
            }
        } else {
            severity
        }
    }

    pub fn should_show(&self, severity: Severity) -> bool {
        !self.quiet || self.effective_severity(severity) == Severity::Error
    }

    pub fn normalize_file(&self, file: &str) -> String {
        if let Some(base) = &self.base_path {
            if let Some(stripped) = file.strip_prefix(base.as_str()) {
                return stripped.trim_start_matches(['/', '\\']).to_string();
            }
        }
        file.to_string()
    }
}

// ============================================================================
// Terminal
// ============================================================================

pub struct TerminalEmitter<W: Write> {
    writer: W,
    config: DiagnosticConfig,
    error_count: usize,
    warning_count: usize,
}

impl<W: Write> TerminalEmitter<W> {
    pub fn new(writer: W, config: DiagnosticConfig) -> Self {
        Self {
            writer,
            config,
            error_count: 0,
            warning_count: 0,
        }
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn warning_count(&self) -> usize {
        self.warning_count
    }

    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from_error_count(self.error_count)
    }

    fn write_diagnostic(&mut self, diagnostic: &Diagnostic) -> std::io::Result<()> {
        let severity = self.config.effective_severity(diagnostic.severity);
        // counted even when quiet hides the line
        match severity {
            Severity::Error => self.error_count += 1,
            Severity::Warning => self.warning_count += 1,
            _ => {}
        }
        if !self.config.should_show(diagnostic.severity) {
            return Ok(());
        }

        writeln!(
            self.writer,
            "{}[{}]: {}",
            severity.as_str(),
            diagnostic.code.as_str(),
            diagnostic.message
        )?;
        if let Some(file) = &diagnostic.file {
            writeln!(self.writer, "  --> {}", self.config.normalize_file(file))?;
        }
        if !diagnostic.notes.is_empty() {
            writeln!(self.writer, "   |")?;
            for note in &diagnostic.notes {
                writeln!(self.writer, "   = {note}")?;
            }
        }
        for hint in &diagnostic.hints {
            writeln!(self.writer, "   = hint: {hint}")?;
        }
        writeln!(self.writer)
    }
}

impl<W: Write> DiagnosticEmitter for TerminalEmitter<W> {
    fn emit(&mut self, diagnostic: Diagnostic) {
        // stderr may be closed
        let _ = self.write_diagnostic(&diagnostic);
    }
}

// ============================================================================
// JSON
// ============================================================================

pub struct JsonEmitter {
    diagnostics: Vec<JsonDiagnostic>,
    config: DiagnosticConfig,
    error_count: usize,
}

#[derive(Debug, Serialize)]
pub struct JsonDiagnostic {
    pub code: String,
    pub severity: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    pub notes: Vec<String>,
    pub hints: Vec<String>,
}

impl JsonEmitter {
    pub fn new(config: DiagnosticConfig) -> Self {
        Self {
            diagnostics: Vec::new(),
            config,
            error_count: 0,
        }
    }

    pub fn diagnostics(&self) -> &[JsonDiagnostic] {
        &self.diagnostics
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from_error_count(self.error_count)
    }

    /// Diagnostics array for the output document
    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::to_value(&self.diagnostics).unwrap_or(serde_json::Value::Null)
    }
}

impl DiagnosticEmitter for JsonEmitter {
    fn emit(&mut self, diagnostic: Diagnostic) {
        let severity = self.config.effective_severity(diagnostic.severity);
        if severity == Severity::Error {
            self.error_count += 1;
        }
        if !self.config.should_show(diagnostic.severity) {
            return;
        }
        self.diagnostics.push(JsonDiagnostic {
            code: diagnostic.code.as_str().to_string(),
            severity: severity.as_str().to_string(),
            message: diagnostic.message,
            file: diagnostic.file.as_deref().map(|f| self.config.normalize_file(f)),
            notes: diagnostic.notes,
            hints: diagnostic.hints,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use towerlens_core::DiagnosticCode;

    fn ambiguous() -> Diagnostic {
        Diagnostic::new(
            DiagnosticCode::W002AmbiguousSource,
            "3 files match 'Structure Work Tracker'",
        )
        .with_file("bucket/Veridia/Structure Work Tracker (12-05-2025).xlsx")
        .with_note("also matched: Veridia/Structure Work Tracker (02-05-2025).xlsx")
        .with_hint("narrow the layout source filter")
    }

    fn unreadable() -> Diagnostic {
        Diagnostic::new(DiagnosticCode::E002WorkbookUnreadable, "sheet not found: Revised Baselines")
    }

    fn render(config: DiagnosticConfig, diagnostics: Vec<Diagnostic>) -> (String, ExitCode) {
        let mut output = Vec::new();
        let mut emitter = TerminalEmitter::new(&mut output, config);
        for d in diagnostics {
            emitter.emit(d);
        }
        let code = emitter.exit_code();
        drop(emitter);
        (String::from_utf8(output).unwrap(), code)
    }

    #[test]
    fn terminal_output() {
        let (text, code) = render(DiagnosticConfig::default(), vec![ambiguous()]);
        assert!(text.starts_with("warning[W002]: 3 files match"));
        assert!(text.contains("  --> bucket/Veridia/Structure Work Tracker (12-05-2025).xlsx"));
        assert!(text.contains("   = also matched:"));
        assert!(text.contains("   = hint: narrow the layout source filter"));
        assert_eq!(code, ExitCode::Success);
    }

    #[test]
    fn base_path_is_stripped() {
        let config = DiagnosticConfig::default().with_base_path("bucket");
        let (text, _) = render(config, vec![ambiguous()]);
        assert!(text.contains("  --> Veridia/Structure Work Tracker (12-05-2025).xlsx"));
    }

    #[test]
    fn strict_escalates_warnings() {
        let (text, code) = render(DiagnosticConfig::strict(), vec![ambiguous()]);
        assert!(text.starts_with("error[W002]"));
        assert_eq!(code, ExitCode::Failure);
    }

    #[test]
    fn quiet_hides_all_but_errors() {
        let (text, code) = render(DiagnosticConfig::quiet(), vec![ambiguous()]);
        assert!(text.is_empty());
        assert_eq!(code, ExitCode::Success);

        let (text, code) = render(DiagnosticConfig::quiet(), vec![ambiguous(), unreadable()]);
        assert!(text.starts_with("error[E002]"));
        assert_eq!(code, ExitCode::Failure);
    }

    #[test]
    fn quiet_does_not_change_exit_code() {
        let config = DiagnosticConfig {
            strict: true,
            quiet: true,
            base_path: None,
        };
        let (_, code) = render(config, vec![ambiguous()]);
        assert_eq!(code, ExitCode::Failure);
    }

    #[test]
    fn json_collects_with_policy() {
        let mut emitter = JsonEmitter::new(DiagnosticConfig::strict());
        emitter.emit(ambiguous());
        emitter.emit(Diagnostic::new(DiagnosticCode::H001EmptyPeriod, "no cells dated 06-2025"));
        emitter.emit(Diagnostic::new(DiagnosticCode::I003ReportWritten, "wrote overall.xlsx"));

        let d = emitter.diagnostics();
        assert_eq!(d[0].code, "W002");
        assert_eq!(d[0].severity, "error");
        assert_eq!(d[1].severity, "warning");
        assert_eq!(d[2].severity, "info");
        assert_eq!(emitter.exit_code(), ExitCode::Failure);

        let json = emitter.to_json_value();
        assert_eq!(json.as_array().unwrap().len(), 3);
        assert_eq!(json[2]["code"], "I003");
        assert!(json[2].get("file").is_none());
    }

    #[test]
    fn hints_and_info_never_fail() {
        let mut emitter = JsonEmitter::new(DiagnosticConfig::strict());
        emitter.emit(Diagnostic::new(DiagnosticCode::H001EmptyPeriod, "no cells"));
        emitter.emit(Diagnostic::new(DiagnosticCode::I002LocalFallback, "endpoint disabled"));
        assert_eq!(emitter.exit_code(), ExitCode::Success);
        assert_eq!(ExitCode::Success.code(), 0);
        assert!(!ExitCode::Failure.is_success());
    }
}

//! # towerlens-llm
//!
//! Optional LLM restatement of report tables, always checked against the
//! local computation.
//!
//! This crate provides:
//! - `CompletionEndpoint`: prompt in, free text out
//! - `WatsonxClient`: token exchange plus text generation over HTTP
//! - `extract_json`: first well-formed JSON value in arbitrary model output
//! - `PostProcessor`: prompt, call, parse and verify, falling back to the
//!   local rows on any failure or disagreement
//!
//! ## Example
//!
//! ```rust
//! use towerlens_core::{Percentage, ReportRow};
//! use towerlens_llm::{LlmError, PostProcessor, Source};
//!
//! let offline = |_: &str| -> Result<String, LlmError> { Err(LlmError::Http("offline".into())) };
//! let rows = vec![ReportRow::new("ELIGO", "TOWER F", Percentage::ZERO, Percentage::ZERO)];
//! let result = PostProcessor::new(&offline).structure_rows(&rows);
//! assert_eq!(result.value, rows);
//! assert!(matches!(result.source, Source::Local(_)));
//! ```

pub mod client;
pub mod json;
pub mod postprocess;
pub mod prompt;

pub use client::{WatsonxClient, WatsonxConfig};
pub use json::extract_json;
pub use postprocess::{Enriched, PostProcessor, Source};

use thiserror::Error;

/// Completion endpoint error
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP transport: {0}")]
    Http(String),

    #[error("endpoint returned {code}: {body}")]
    Status { code: u16, body: String },

    #[error("API key variable {0} is not set")]
    MissingApiKey(String),

    #[error("unexpected response: {0}")]
    Response(String),
}

impl LlmError {
    /// Rate limiting and server errors are worth another attempt
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Status { code, .. } if *code == 429 || *code >= 500)
    }
}

/// A text-completion service
pub trait CompletionEndpoint {
    fn complete(&self, prompt: &str) -> Result<String, LlmError>;
}

impl<F> CompletionEndpoint for F
where
    F: Fn(&str) -> Result<String, LlmError>,
{
    fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        self(prompt)
    }
}

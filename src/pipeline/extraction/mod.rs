//! Extraction adapter: one PDF + compiled schema → one provider call → one row.

pub mod adapter;
pub mod gemini;
pub mod gemini_types;
pub mod parser;
pub mod types;

pub use adapter::*;
pub use gemini::*;
pub use gemini_types::*;
pub use parser::*;
pub use types::*;

use thiserror::Error;

/// Failures of a single extraction call. None of them is retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Could not reach the model provider: {0}")]
    Transport(String),

    #[error("Provider quota exhausted: {0}")]
    RateLimit(String),

    #[error("Could not parse model response: {0}")]
    Parse(String),

    #[error("Provider returned error (status {status}): {message}")]
    Provider { status: u16, message: String },
}

impl ExtractionError {
    /// Short machine-friendly name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Auth(_) => "auth",
            Self::Transport(_) => "transport",
            Self::RateLimit(_) => "rate_limit",
            Self::Parse(_) => "parse",
            Self::Provider { .. } => "provider",
        }
    }

    pub fn is_rate_limit(&self) -> bool {
        matches!(self, Self::RateLimit(_))
    }
}

//! Command layer behind the CLI. Each command returns `CommandError`; the
//! binary prints it and exits non-zero.

pub mod extract;
pub mod output;
pub mod types;

use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;
use crate::pipeline::extraction::ExtractionError;
use crate::pipeline::schema::SchemaError;
use crate::session::SessionError;

#[derive(Error, Debug)]
pub enum CommandError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON output failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown output format '{0}' (expected table or json)")]
    UnknownOutput(String),

    #[error("All {0} file(s) failed to extract")]
    AllFilesFailed(usize),
}

impl CommandError {
    /// Whether the user should see the quota notice.
    pub fn is_rate_limit(&self) -> bool {
        match self {
            Self::Session(e) => e.is_rate_limit(),
            Self::Extraction(e) => e.is_rate_limit(),
            _ => false,
        }
    }
}

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::pipeline::extraction::{Credentials, GEMINI_BASE_URL};
use crate::pipeline::processor::{FailurePolicy, ProcessorOptions};
use crate::pipeline::schema::FormatStyle;

/// Application-level constants
pub const APP_NAME: &str = "pdf-rows";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Environment variables
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const MODEL_ENV: &str = "PDF_ROWS_MODEL";
pub const BASE_URL_ENV: &str = "PDF_ROWS_BASE_URL";
pub const TIMEOUT_ENV: &str = "PDF_ROWS_TIMEOUT_SECS";
pub const MAX_WORKERS_ENV: &str = "PDF_ROWS_MAX_WORKERS";

/// Secrets file name inside the config directory: `{"GEMINI_API_KEY": "..."}`.
pub const SECRETS_FILE: &str = "secrets.json";

/// Shown when the provider reports quota exhaustion.
pub const RATE_LIMIT_NOTICE: &str = "\
The free Gemini API tier allows about 15 files per minute and 1500 files per day. \
Wait a few minutes and try again; if it still fails, wait until the next day.";

/// Tracing filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "warn,pdf_rows_lib=info,pdf_rows=info"
}

/// Per-user config directory, e.g. `~/.config/pdf-rows/`.
pub fn app_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_NAME))
}

pub fn secrets_path() -> Option<PathBuf> {
    app_config_dir().map(|dir| dir.join(SECRETS_FILE))
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(
        "No API key: set {} or add it to {} in the config directory",
        API_KEY_ENV,
        SECRETS_FILE
    )]
    MissingApiKey,

    #[error("Invalid value for {name}: {value}")]
    InvalidEnv { name: &'static str, value: String },

    #[error("Cannot read secrets file {path}: {reason}")]
    SecretsFile { path: PathBuf, reason: String },
}

/// Settings for one extraction session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractorConfig {
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
    pub format_style: FormatStyle,
    pub max_workers: usize,
    pub fail_fast: bool,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            base_url: GEMINI_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            format_style: FormatStyle::Default,
            max_workers: 1,
            fail_fast: false,
        }
    }
}

impl ExtractorConfig {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_lookup(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary variable lookup. Blank values are ignored.
    pub fn with_env_lookup(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(model) = get(MODEL_ENV) {
            self.model = model.trim().to_string();
        }
        if let Some(url) = get(BASE_URL_ENV) {
            self.base_url = url.trim().trim_end_matches('/').to_string();
        }
        if let Some(raw) = get(TIMEOUT_ENV) {
            self.timeout_secs = parse_positive(TIMEOUT_ENV, &raw)?;
        }
        if let Some(raw) = get(MAX_WORKERS_ENV) {
            self.max_workers = parse_positive(MAX_WORKERS_ENV, &raw)? as usize;
        }
        Ok(self)
    }

    pub fn processor_options(&self) -> ProcessorOptions {
        ProcessorOptions {
            format_style: self.format_style,
            max_workers: self.max_workers.max(1),
            failure_policy: if self.fail_fast {
                FailurePolicy::Abort
            } else {
                FailurePolicy::Collect
            },
        }
    }
}

fn parse_positive(name: &'static str, raw: &str) -> Result<u64, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::InvalidEnv {
            name,
            value: raw.to_string(),
        }),
    }
}

/// API key from the environment, falling back to the user's secrets file.
pub fn load_credentials() -> Result<Credentials, ConfigError> {
    resolve_api_key(std::env::var(API_KEY_ENV).ok(), secrets_path().as_deref())
}

/// Key resolution: a non-blank env value wins, then the secrets file.
/// A missing secrets file is not an error; an unreadable one is.
pub fn resolve_api_key(
    env_value: Option<String>,
    secrets_file: Option<&Path>,
) -> Result<Credentials, ConfigError> {
    if let Some(key) = env_value.filter(|k| !k.trim().is_empty()) {
        return Ok(Credentials::new(key.trim()));
    }

    let Some(path) = secrets_file.filter(|p| p.exists()) else {
        return Err(ConfigError::MissingApiKey);
    };

    let secrets_error = |reason: String| ConfigError::SecretsFile {
        path: path.to_path_buf(),
        reason,
    };
    let text = std::fs::read_to_string(path).map_err(|e| secrets_error(e.to_string()))?;
    let secrets: serde_json::Value =
        serde_json::from_str(&text).map_err(|e| secrets_error(e.to_string()))?;

    match secrets.get(API_KEY_ENV).and_then(|v| v.as_str()) {
        Some(key) if !key.trim().is_empty() => {
            tracing::debug!(path = %path.display(), "API key loaded from secrets file");
            Ok(Credentials::new(key.trim()))
        }
        _ => Err(ConfigError::MissingApiKey),
    }
}

//! Application configuration — built once at process start and passed by
//! reference into the components that need it. The report pipeline itself
//! takes no configuration; only the service boundaries and the I/O shell
//! read from here.

use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "Mediscribe";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default report-generation model.
pub const DEFAULT_REPORT_MODEL: &str = "deepseek/deepseek-chat-v3.1:free";

/// Default `tracing` filter when `RUST_LOG` is unset.
pub fn default_log_filter() -> String {
    "mediscribe=info".to_string()
}

/// Errors constructing configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingKey(&'static str),
}

/// Explicit application configuration.
#[derive(Debug, Clone)]
pub struct ScribeConfig {
    /// Where downloaded consultation recordings are saved.
    pub audio_dir: PathBuf,
    /// Where raw transcripts are saved.
    pub transcript_dir: PathBuf,
    /// Where rendered report documents are saved.
    pub report_dir: PathBuf,
    pub assemblyai_api_key: String,
    pub openrouter_api_key: String,
    /// Model identifier for report generation.
    pub report_model: String,
}

impl ScribeConfig {
    /// Build configuration from the environment. API keys are required;
    /// the data root defaults to `data/` (override with `SCRIBE_DATA_DIR`).
    pub fn from_env() -> Result<Self, ConfigError> {
        let data_dir = std::env::var("SCRIBE_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data"));

        Ok(Self {
            assemblyai_api_key: require_env("ASSEMBLYAI_API_KEY")?,
            openrouter_api_key: require_env("OPENROUTER_API_KEY")?,
            report_model: std::env::var("SCRIBE_REPORT_MODEL")
                .unwrap_or_else(|_| DEFAULT_REPORT_MODEL.to_string()),
            ..Self::with_data_dir(data_dir)
        })
    }

    /// Configuration rooted at an explicit data directory, with empty
    /// keys. Used by tests and by callers that supply keys directly.
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        Self {
            audio_dir: data_dir.join("audio"),
            transcript_dir: data_dir.join("transcripts"),
            report_dir: data_dir.join("reports"),
            assemblyai_api_key: String::new(),
            openrouter_api_key: String::new(),
            report_model: DEFAULT_REPORT_MODEL.to_string(),
        }
    }
}

fn require_env(key: &'static str) -> Result<String, ConfigError> {
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::MissingKey(key)),
    }
}

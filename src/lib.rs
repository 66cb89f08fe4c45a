//! Mediscribe — structured clinical reports from consultation recordings.
//!
//! The crate's core is the report normalization and rendering pipeline in
//! [`report`]: raw language-model text is sanitized, censored of patient
//! identifiers, bucketed under a fixed section schema, and laid out as a
//! PDF document with stable structure regardless of what the model
//! returned. [`transcribe`] and [`llm`] are thin boundaries to the
//! speech-to-text and language-model providers; [`intake`] captures
//! patient details from chat text and holds them until the matching
//! recording arrives. The enclosing application (message handling, file
//! download, storage) lives outside this crate.

pub mod config;
pub mod intake;
pub mod llm;
pub mod report;
pub mod transcribe;

use tracing_subscriber::EnvFilter;

/// Initialize tracing for the enclosing application. Call once at
/// startup; honors `RUST_LOG` and falls back to the crate default.
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);
}

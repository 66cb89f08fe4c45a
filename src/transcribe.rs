//! Speech-to-text boundary — transcribes a saved consultation recording
//! through an AssemblyAI-style HTTP API.
//!
//! Upload the audio bytes, create a transcript job with the universal
//! speech model, then poll until the job completes or the provider
//! reports an error. Blocking on purpose: the enclosing application runs
//! this off its request-handling path.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::ScribeConfig;

/// Default AssemblyAI API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.assemblyai.com/v2";

/// Errors from transcription calls.
#[derive(Debug, thiserror::Error)]
pub enum TranscribeError {
    #[error("Audio file not found: {0}")]
    AudioFileNotFound(PathBuf),
    #[error("Cannot read audio file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Cannot connect to transcription endpoint at {0}")]
    Connection(String),
    #[error("HTTP client error: {0}")]
    HttpClient(String),
    #[error("Transcription API returned status {status}: {body}")]
    Api { status: u16, body: String },
    #[error("Transcription failed: {0}")]
    Failed(String),
    #[error("Failed to parse transcription response: {0}")]
    ResponseParsing(String),
    #[error("Transcript {0} still processing after {1} polls")]
    PollTimeout(String, usize),
}

/// Transcript job states reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranscriptStatus {
    Queued,
    Processing,
    Completed,
    Error,
}

#[derive(Deserialize)]
struct UploadResponse {
    upload_url: String,
}

#[derive(Serialize)]
struct CreateTranscriptRequest<'a> {
    audio_url: &'a str,
    speech_model: &'a str,
}

#[derive(Deserialize)]
struct TranscriptResponse {
    id: String,
    status: TranscriptStatus,
    text: Option<String>,
    error: Option<String>,
}

/// Blocking client for an AssemblyAI-style transcription API.
pub struct TranscribeClient {
    base_url: String,
    api_key: String,
    client: reqwest::blocking::Client,
    poll_interval: Duration,
    max_polls: usize,
}

impl TranscribeClient {
    /// Create a client for the given endpoint and key.
    pub fn new(base_url: &str, api_key: &str) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client,
            poll_interval: Duration::from_secs(3),
            max_polls: 200,
        }
    }

    /// Client configured from application config.
    pub fn from_config(config: &ScribeConfig) -> Self {
        Self::new(DEFAULT_BASE_URL, &config.assemblyai_api_key)
    }

    /// Transcribe a saved audio file and return its text.
    ///
    /// Errors when the file is missing, the provider rejects a request,
    /// or the job ends in the provider's `error` state.
    pub fn transcribe_file(&self, audio_path: &Path) -> Result<String, TranscribeError> {
        if !audio_path.exists() {
            return Err(TranscribeError::AudioFileNotFound(audio_path.to_path_buf()));
        }
        let bytes = std::fs::read(audio_path)?;

        tracing::info!(path = %audio_path.display(), bytes = bytes.len(), "Uploading audio for transcription");
        let audio_url = self.upload(bytes)?;
        let transcript_id = self.create_transcript(&audio_url)?;
        self.poll_transcript(&transcript_id)
    }

    fn upload(&self, bytes: Vec<u8>) -> Result<String, TranscribeError> {
        let url = format!("{}/upload", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("authorization", &self.api_key)
            .body(bytes)
            .send()
            .map_err(|e| self.map_send_error(e))?;

        let parsed: UploadResponse = Self::read_json(response)?;
        Ok(parsed.upload_url)
    }

    fn create_transcript(&self, audio_url: &str) -> Result<String, TranscribeError> {
        let url = format!("{}/transcript", self.base_url);
        let body = CreateTranscriptRequest {
            audio_url,
            speech_model: "universal",
        };

        let response = self
            .client
            .post(&url)
            .header("authorization", &self.api_key)
            .json(&body)
            .send()
            .map_err(|e| self.map_send_error(e))?;

        let parsed: TranscriptResponse = Self::read_json(response)?;
        Ok(parsed.id)
    }

    fn poll_transcript(&self, transcript_id: &str) -> Result<String, TranscribeError> {
        let url = format!("{}/transcript/{}", self.base_url, transcript_id);

        for _ in 0..self.max_polls {
            let response = self
                .client
                .get(&url)
                .header("authorization", &self.api_key)
                .send()
                .map_err(|e| self.map_send_error(e))?;

            let parsed: TranscriptResponse = Self::read_json(response)?;
            match parsed.status {
                TranscriptStatus::Completed => {
                    return Ok(parsed.text.unwrap_or_default());
                }
                TranscriptStatus::Error => {
                    return Err(TranscribeError::Failed(
                        parsed.error.unwrap_or_else(|| "unknown provider error".into()),
                    ));
                }
                TranscriptStatus::Queued | TranscriptStatus::Processing => {
                    std::thread::sleep(self.poll_interval);
                }
            }
        }

        Err(TranscribeError::PollTimeout(
            transcript_id.to_string(),
            self.max_polls,
        ))
    }

    fn map_send_error(&self, e: reqwest::Error) -> TranscribeError {
        if e.is_connect() {
            TranscribeError::Connection(self.base_url.clone())
        } else {
            TranscribeError::HttpClient(e.to_string())
        }
    }

    fn read_json<T: for<'de> Deserialize<'de>>(
        response: reqwest::blocking::Response,
    ) -> Result<T, TranscribeError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(TranscribeError::Api {
                status: status.as_u16(),
                body,
            });
        }
        response
            .json()
            .map_err(|e| TranscribeError::ResponseParsing(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_audio_file_is_an_error() {
        let client = TranscribeClient::new("http://localhost:0", "key");
        let err = client
            .transcribe_file(Path::new("/nonexistent/audio.mp3"))
            .unwrap_err();
        assert!(matches!(err, TranscribeError::AudioFileNotFound(_)));
    }

    #[test]
    fn transcript_status_parses_snake_case() {
        for (raw, expected) in [
            ("\"queued\"", TranscriptStatus::Queued),
            ("\"processing\"", TranscriptStatus::Processing),
            ("\"completed\"", TranscriptStatus::Completed),
            ("\"error\"", TranscriptStatus::Error),
        ] {
            let parsed: TranscriptStatus = serde_json::from_str(raw).unwrap();
            assert_eq!(parsed, expected);
        }
    }

    #[test]
    fn transcript_response_parses_completed() {
        let json = r#"{"id":"abc","status":"completed","text":"hello doctor","error":null}"#;
        let parsed: TranscriptResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.id, "abc");
        assert_eq!(parsed.status, TranscriptStatus::Completed);
        assert_eq!(parsed.text.as_deref(), Some("hello doctor"));
    }

    #[test]
    fn transcript_response_parses_error_state() {
        let json = r#"{"id":"abc","status":"error","text":null,"error":"bad audio"}"#;
        let parsed: TranscriptResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.status, TranscriptStatus::Error);
        assert_eq!(parsed.error.as_deref(), Some("bad audio"));
    }

    #[test]
    fn create_request_uses_universal_model() {
        let body = CreateTranscriptRequest {
            audio_url: "https://cdn.example/upload/1",
            speech_model: "universal",
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["speech_model"], "universal");
        assert_eq!(json["audio_url"], "https://cdn.example/upload/1");
    }

    #[test]
    fn base_url_trailing_slash_trimmed() {
        let client = TranscribeClient::new("https://api.example.test/v2/", "key");
        assert_eq!(client.base_url, "https://api.example.test/v2");
    }
}

//! Language-model boundary — turns a consultation transcript into raw
//! report text via an OpenAI-compatible chat-completions endpoint.
//!
//! The pipeline owns only the contract: transcript in, free-form report
//! text out. Whatever comes back is untrusted and goes through the full
//! report sanitization pipeline. Callers are expected to run this client
//! off the request-handling path; the crate carries no async runtime.

use serde::{Deserialize, Serialize};

use crate::config::ScribeConfig;
use crate::report::Section;

/// Default OpenRouter-compatible endpoint.
pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Sampling temperature for report generation. Low — the scribe must not
/// improvise.
const REPORT_TEMPERATURE: f32 = 0.2;

/// Errors from language-model calls.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Cannot connect to LLM endpoint at {0}")]
    Connection(String),
    #[error("LLM request timed out after {0}s")]
    Timeout(u64),
    #[error("HTTP client error: {0}")]
    HttpClient(String),
    #[error("LLM API returned status {status}: {body}")]
    Api { status: u16, body: String },
    #[error("Failed to parse LLM response: {0}")]
    ResponseParsing(String),
    #[error("LLM returned an empty response")]
    EmptyResponse,
}

/// Minimal chat interface the report generator needs. Implemented by the
/// real HTTP client and by the test mock.
pub trait LlmClient {
    fn chat(&self, system: &str, user: &str) -> Result<String, LlmError>;
}

/// Blocking HTTP client for an OpenRouter-compatible chat-completions API.
pub struct OpenRouterClient {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl OpenRouterClient {
    /// Create a client for the given endpoint, key, and model.
    pub fn new(base_url: &str, api_key: &str, model: &str, timeout_secs: u64) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            client,
            timeout_secs,
        }
    }

    /// Client configured from application config, with a 2-minute timeout.
    pub fn from_config(config: &ScribeConfig) -> Self {
        Self::new(
            DEFAULT_BASE_URL,
            &config.openrouter_api_key,
            &config.report_model,
            120,
        )
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

impl LlmClient for OpenRouterClient {
    fn chat(&self, system: &str, user: &str) -> Result<String, LlmError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage { role: "system", content: system },
                ChatMessage { role: "user", content: user },
            ],
            temperature: REPORT_TEMPERATURE,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    LlmError::Connection(self.base_url.clone())
                } else if e.is_timeout() {
                    LlmError::Timeout(self.timeout_secs)
                } else {
                    LlmError::HttpClient(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .map_err(|e| LlmError::ResponseParsing(e.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or(LlmError::EmptyResponse)?;

        if content.trim().is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        Ok(content)
    }
}

/// Mock LLM client for testing — returns a configurable response.
pub struct MockLlmClient {
    response: String,
}

impl MockLlmClient {
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
        }
    }
}

impl LlmClient for MockLlmClient {
    fn chat(&self, _system: &str, _user: &str) -> Result<String, LlmError> {
        Ok(self.response.clone())
    }
}

const SCRIBE_SYSTEM_PROMPT: &str = "You are a professional medical scribe. \
Convert doctor-patient consultation transcripts into structured medical reports. \
Be objective, concise, and never add unverified information. \
Do not include patient names, identifiers, dates of birth, or contact details in the report body.";

/// Build the user prompt for one transcript, enumerating the canonical
/// sections the report must contain.
fn scribe_prompt(transcript: &str) -> String {
    let mut sections = String::new();
    for section in Section::ALL {
        sections.push_str("- ");
        sections.push_str(section.display_name());
        sections.push('\n');
    }
    format!(
        "Convert the following consultation transcript into a structured medical report.\n\
         The report must contain exactly these sections, in this order:\n{sections}\n\
         Use short bullet points under each section. Write \"None reported.\" when a \
         section has nothing.\n\nTranscript:\n{transcript}"
    )
}

/// Generate raw report text for a transcript. The result is untrusted
/// model output — callers must run it through `report::bucket_report`.
pub fn generate_medical_report(
    client: &impl LlmClient,
    transcript: &str,
) -> Result<String, LlmError> {
    tracing::info!(transcript_chars = transcript.len(), "Requesting medical report generation");
    client.chat(SCRIBE_SYSTEM_PROMPT, &scribe_prompt(transcript))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_enumerates_all_sections_in_order() {
        let prompt = scribe_prompt("hello");
        let mut last = 0;
        for section in Section::ALL {
            // Bullet-prefixed search: "Plan" alone would also match inside
            // "Prescription / Treatment Plan".
            let needle = format!("- {}\n", section.display_name());
            let at = prompt
                .find(&needle)
                .unwrap_or_else(|| panic!("prompt missing {section}"));
            assert!(at >= last, "{section} out of order");
            last = at;
        }
        assert!(prompt.contains("Transcript:\nhello"));
    }

    #[test]
    fn prompt_never_requests_patient_identity() {
        assert!(!scribe_prompt("t").to_lowercase().contains("patient information"));
        assert!(SCRIBE_SYSTEM_PROMPT.contains("Do not include patient names"));
    }

    #[test]
    fn generate_report_via_mock() {
        let client = MockLlmClient::new("Symptoms\n- Fever");
        let report = generate_medical_report(&client, "the patient has a fever").unwrap();
        assert_eq!(report, "Symptoms\n- Fever");
    }

    #[test]
    fn mock_output_flows_through_pipeline() {
        let client = MockLlmClient::new("## Symptoms\n- **Fever**\nPatient Name: leak");
        let raw = generate_medical_report(&client, "transcript").unwrap();
        let buckets = crate::report::bucket_report(&raw);
        assert_eq!(buckets.lines(Section::Symptoms), ["- Fever"]);
        for (_, lines) in buckets.iter() {
            assert!(!lines.iter().any(|l| l.contains("leak")));
        }
    }

    #[test]
    fn chat_request_serializes_openai_shape() {
        let body = ChatRequest {
            model: "deepseek/deepseek-chat-v3.1:free",
            messages: vec![
                ChatMessage { role: "system", content: "sys" },
                ChatMessage { role: "user", content: "usr" },
            ],
            temperature: REPORT_TEMPERATURE,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "deepseek/deepseek-chat-v3.1:free");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "usr");
    }

    #[test]
    fn chat_response_parses_first_choice() {
        let json = r#"{"choices":[{"message":{"role":"assistant","content":"Report text"}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.choices[0].message.content, "Report text");
    }

    #[test]
    fn base_url_trailing_slash_trimmed() {
        let client = OpenRouterClient::new("https://example.test/v1/", "key", "model", 5);
        assert_eq!(client.base_url, "https://example.test/v1");
    }
}

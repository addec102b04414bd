//! Gemini HTTP adapter for the planning service.

use std::time::{Duration, Instant};

use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::PlannerError;
use crate::request::PlanRequest;
use crate::traits::PlanningService;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: String,
    pub timeout_secs: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: String::new(),
            timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeminiClient {
    config: GeminiConfig,
    client: reqwest::blocking::Client,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self, PlannerError> {
        if config.api_key.trim().is_empty() {
            return Err(PlannerError::MissingApiKey);
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    pub fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }
}

impl PlanningService for GeminiClient {
    fn generate(&self, request: &PlanRequest) -> Result<String, PlannerError> {
        let started = Instant::now();
        tracing::info!(
            model = %self.config.model,
            prompt_len = request.prompt.len(),
            "requesting plan"
        );

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.config.api_key)
            .json(&request_body(request))
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.json::<GenerateContentResponse>());

        let body = match response {
            Ok(body) => body,
            Err(err) => {
                tracing::error!(error = %err, elapsed = ?started.elapsed(), "planning service call failed");
                return Err(err.into());
            }
        };

        let text = body.text().ok_or_else(|| {
            let reason = body
                .prompt_feedback
                .and_then(|feedback| feedback.block_reason)
                .unwrap_or_else(|| "response carried no text".to_string());
            PlannerError::ServiceCall(reason)
        })?;

        tracing::info!(elapsed = ?started.elapsed(), response_len = text.len(), "plan received");
        Ok(text)
    }
}

/// Stand-in used when no API key is configured. Every call fails with
/// [`PlannerError::MissingApiKey`] so the session reports it like any other
/// optimization failure.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unconfigured;

impl PlanningService for Unconfigured {
    fn generate(&self, _request: &PlanRequest) -> Result<String, PlannerError> {
        Err(PlannerError::MissingApiKey)
    }
}

/// `generateContent` body asking for JSON constrained by the request schema.
pub fn request_body(request: &PlanRequest) -> Value {
    json!({
        "contents": [{
            "role": "user",
            "parts": [{ "text": request.prompt }]
        }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": request.schema
        }
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate.
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect();
        if text.is_empty() { None } else { Some(text) }
    }
}

//! Gemini `generateContent` API client
//!
//! Single operation: submit a prompt (optionally constrained to a JSON
//! reply), return the first candidate's text. All fallback policy lives one
//! layer up in [`crate::services::analyst`]; this client reports failures
//! faithfully as typed errors.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Gateway errors
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Transport-level failure reaching the endpoint
    #[error("Network error: {0}")]
    Network(String),

    /// Non-2xx response from the endpoint
    #[error("API error {0}: {1}")]
    Api(u16, String),

    /// Response body was not the expected JSON envelope
    #[error("Parse error: {0}")]
    Parse(String),

    /// Envelope parsed but carried no candidate text
    #[error("Response contained no candidates")]
    EmptyResponse,
}

/// Abstraction over the external model endpoint.
///
/// The classification pipeline and report generators depend on this trait
/// rather than on [`GeminiClient`] directly, so tests can substitute a
/// scripted backend.
#[async_trait]
pub trait ModelGateway: Send + Sync {
    /// Submit `prompt` and return the reply text.
    ///
    /// When `json_mode` is set the request instructs the model to constrain
    /// its reply to JSON; the returned string is still the raw candidate
    /// text and must be parsed by the caller.
    async fn generate(&self, prompt: &str, json_mode: bool) -> Result<String, GatewayError>;
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

impl GenerateResponse {
    /// Extract the first candidate's text.
    fn into_text(mut self) -> Result<String, GatewayError> {
        if self.candidates.is_empty() {
            return Err(GatewayError::EmptyResponse);
        }
        let candidate = self.candidates.remove(0);
        let mut parts = candidate.content.parts;
        if parts.is_empty() {
            return Err(GatewayError::EmptyResponse);
        }
        Ok(parts.remove(0).text)
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Gemini API client
pub struct GeminiClient {
    http_client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, GatewayError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint: endpoint.into(),
            model: model.into(),
            api_key: api_key.into(),
        })
    }

    fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.endpoint, self.model, self.api_key
        )
    }
}

#[async_trait]
impl ModelGateway for GeminiClient {
    async fn generate(&self, prompt: &str, json_mode: bool) -> Result<String, GatewayError> {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: json_mode.then_some(GenerationConfig {
                response_mime_type: "application/json",
            }),
        };

        tracing::debug!(
            model = %self.model,
            json_mode,
            prompt_chars = prompt.chars().count(),
            "Submitting generateContent request"
        );

        let response = self
            .http_client
            .post(self.url())
            .json(&request)
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(GatewayError::Api(status.as_u16(), error_text));
        }

        let envelope: GenerateResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Parse(e.to_string()))?;

        envelope.into_text()
    }
}

//! Language model clients.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use scribe_core::config::LlmConfig;

use crate::error::InterviewError;

/// Generates the agent's next utterance from a rendered context.
///
/// Called exactly once per user turn; implementations must not retry.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn generate(&self, context: &str) -> Result<String, InterviewError>;

    fn name(&self) -> &str;
}

/// Build the model client from configuration and the environment.
///
/// Without an API key the service still runs; every turn then gets the
/// fallback reply.
pub fn model_from_config(config: &LlmConfig) -> Arc<dyn LanguageModel> {
    let key = std::env::var(&config.api_key_env)
        .ok()
        .filter(|k| !k.trim().is_empty());

    match key {
        Some(key) => match GeminiModel::new(key, config) {
            Ok(model) => {
                info!(model = %config.model, "Language model configured");
                Arc::new(model)
            }
            Err(e) => {
                warn!(error = %e, "Failed to build model client");
                Arc::new(UnconfiguredModel)
            }
        },
        None => {
            warn!(
                env = %config.api_key_env,
                "No model API key set, replies will use the fallback message"
            );
            Arc::new(UnconfiguredModel)
        }
    }
}

/// Gemini `generateContent` REST client.
pub struct GeminiModel {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiModel {
    pub fn new(api_key: impl Into<String>, config: &LlmConfig) -> Result<Self, InterviewError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| InterviewError::Model(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl LanguageModel for GeminiModel {
    async fn generate(&self, context: &str) -> Result<String, InterviewError> {
        let url = format!("{}/{}:generateContent", self.base_url, self.model);
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: context }],
            }],
        };

        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| InterviewError::Model(format!("Gemini API request failed: {err}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response.text().await.unwrap_or_default();
            return Err(InterviewError::Model(error_message(status.as_u16(), &body_text)));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|err| InterviewError::Model(format!("Failed to parse Gemini response: {err}")))?;

        extract_text_response(parsed)
    }

    fn name(&self) -> &str {
        &self.model
    }
}

/// Stand-in used when no model is configured. Always fails.
pub struct UnconfiguredModel;

#[async_trait]
impl LanguageModel for UnconfiguredModel {
    async fn generate(&self, _context: &str) -> Result<String, InterviewError> {
        Err(InterviewError::Model("no language model configured".to_string()))
    }

    fn name(&self) -> &str {
        "unconfigured"
    }
}

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ContentResponse>,
}

#[derive(Deserialize)]
struct ContentResponse {
    parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
struct PartResponse {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

fn extract_text_response(response: GenerateContentResponse) -> Result<String, InterviewError> {
    response
        .candidates
        .and_then(|candidates| candidates.into_iter().next())
        .and_then(|candidate| candidate.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect::<String>()
        })
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .ok_or_else(|| {
            InterviewError::Model("Gemini API returned no text in the response candidates".into())
        })
}

fn error_message(status: u16, body: &str) -> String {
    match serde_json::from_str::<ErrorWrapper>(body) {
        Ok(wrapper) => {
            let msg = wrapper.error.message.unwrap_or_else(|| body.to_string());
            match wrapper.error.status {
                Some(s) if !s.is_empty() => format!("HTTP {status} {s}: {msg}"),
                _ => format!("HTTP {status}: {msg}"),
            }
        }
        Err(_) => format!("HTTP {status}: {body}"),
    }
}

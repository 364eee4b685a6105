//! Anthropic Messages API boundary.

use std::time::Duration;

use async_trait::async_trait;
use pipeline::{
    Content, Experience, InferenceBoundary, InferenceDescriptor, InferenceError, Interpretation,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::render_prompt;

/// Connection and sampling settings for [`AnthropicInference`].
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    /// Full URL of the Messages endpoint.
    pub endpoint: String,
    /// API key sent as `x-api-key`.
    pub api_key: String,
    /// Model identifier.
    pub model: String,
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
    /// Sampling temperature; the provider default applies when `None`.
    pub temperature: Option<f32>,
    /// System prompt sent with every request.
    pub system_prompt: Option<String>,
    /// Whole-request timeout.
    pub timeout: Duration,
}

impl AnthropicConfig {
    /// Messages API endpoint.
    pub const DEFAULT_ENDPOINT: &'static str = "https://api.anthropic.com/v1/messages";
    /// Token ceiling for one answer.
    pub const DEFAULT_MAX_TOKENS: u32 = 1024;
    /// Whole-request timeout, including the model's generation time.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

    /// Creates a configuration with default endpoint, token limit and timeout.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            endpoint: Self::DEFAULT_ENDPOINT.to_owned(),
            api_key: api_key.into(),
            model: model.into(),
            max_tokens: Self::DEFAULT_MAX_TOKENS,
            temperature: None,
            system_prompt: None,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }
}

const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    messages: Vec<RequestMessage>,
}

#[derive(Debug, Serialize)]
struct RequestMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ResponseBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ResponseBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

/// [`InferenceBoundary`] backed by the Anthropic Messages API.
///
/// Interpretations are tagged `"anthropic-<stage>"` and carry no confidence.
#[derive(Debug, Clone)]
pub struct AnthropicInference {
    client: reqwest::Client,
    config: AnthropicConfig,
}

impl AnthropicInference {
    /// Builds the HTTP client for `config`.
    ///
    /// # Errors
    ///
    /// [`InferenceError::Transport`] if the HTTP client cannot be constructed.
    pub fn new(config: AnthropicConfig) -> Result<Self, InferenceError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| InferenceError::Transport {
                message: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self { client, config })
    }

    /// The configuration this client was built from.
    pub fn config(&self) -> &AnthropicConfig {
        &self.config
    }
}

/// Strips a surrounding Markdown code fence, which models often add around JSON.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(body) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = body.strip_suffix("```").unwrap_or(body);
    match body.split_once('\n') {
        Some((_, rest)) => rest.trim(),
        None => body.trim(),
    }
}

fn to_content(text: String, expects_json: bool) -> Content {
    if expects_json {
        if let Ok(value) = serde_json::from_str::<Value>(strip_code_fence(&text)) {
            return Content::Structured(value);
        }
        tracing::debug!("reply did not parse as JSON; keeping it as text");
    }
    Content::Text(text)
}

#[async_trait]
impl InferenceBoundary for AnthropicInference {
    async fn infer(&self, experience: &Experience) -> Result<Interpretation, InferenceError> {
        let request = MessagesRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            system: self.config.system_prompt.as_deref(),
            temperature: self.config.temperature,
            messages: vec![RequestMessage {
                role: "user",
                content: render_prompt(experience),
            }],
        };

        tracing::debug!(
            stage = %experience.source(),
            model = %self.config.model,
            "sending messages request"
        );
        let response = self
            .client
            .post(&self.config.endpoint)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| InferenceError::Transport {
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::warn!(stage = %experience.source(), status = status.as_u16(), "provider rejected request");
            return Err(InferenceError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        let body: MessagesResponse =
            response
                .json()
                .await
                .map_err(|e| InferenceError::InvalidResponse {
                    message: e.to_string(),
                })?;

        let text: String = body
            .content
            .into_iter()
            .filter_map(|block| match block {
                ResponseBlock::Text { text } => Some(text),
                ResponseBlock::Other => None,
            })
            .collect();
        if text.is_empty() {
            return Err(InferenceError::InvalidResponse {
                message: "response contained no text content".to_owned(),
            });
        }

        let expects_json = experience
            .elaboration()
            .is_some_and(|e| e.effective_schema().is_some());
        Ok(Interpretation::new(
            to_content(text, expects_json),
            format!("anthropic-{}", experience.source()),
            None,
        ))
    }

    fn descriptor(&self) -> InferenceDescriptor {
        InferenceDescriptor {
            model: self.config.model.clone(),
            temperature: self.config.temperature,
            max_tokens: Some(self.config.max_tokens),
            system_prompt: self.config.system_prompt.clone(),
        }
    }
}

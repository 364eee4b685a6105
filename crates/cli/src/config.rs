//! `cogline.toml` configuration.
//!
//! Every field has a default, so an empty file (or no file at all) runs the
//! `understand` path against the echo boundary with `info` logging.

use std::path::Path;

use anyhow::Context;
use llm::AnthropicConfig;
use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    /// Name of the registered path to run.
    pub path: String,
    /// Inference boundary settings.
    pub inference: InferenceConfig,
    /// Logging and span export.
    pub telemetry: TelemetryConfig,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            path: nodes::UNDERSTAND.to_owned(),
            inference: InferenceConfig::default(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl CliConfig {
    /// Reads and parses the file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("invalid config file {}", path.display()))
    }

    /// Parses configuration from TOML text. Unknown keys are rejected.
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}

/// Which inference boundary closes the generative stages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Answer every question with the question itself.
    #[default]
    Echo,
    /// Anthropic Messages API.
    Anthropic,
}

/// `[inference]` section.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InferenceConfig {
    /// Boundary implementation to build.
    pub provider: Provider,
    /// Model identifier sent to the provider.
    pub model: String,
    /// Token ceiling for one answer.
    pub max_tokens: u32,
    /// Sampling temperature; the provider default applies when unset.
    pub temperature: Option<f32>,
    /// System prompt sent with every request.
    pub system_prompt: Option<String>,
    /// Messages API URL.
    pub endpoint: String,
    /// Environment variable holding the API key. The key itself never lives
    /// in the file.
    pub api_key_env: String,
    /// Whole-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            provider: Provider::Echo,
            model: "claude-sonnet-4-5".to_owned(),
            max_tokens: AnthropicConfig::DEFAULT_MAX_TOKENS,
            temperature: None,
            system_prompt: None,
            endpoint: AnthropicConfig::DEFAULT_ENDPOINT.to_owned(),
            api_key_env: "ANTHROPIC_API_KEY".to_owned(),
            timeout_secs: AnthropicConfig::DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

/// `[telemetry]` section.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TelemetryConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub filter: String,
    /// Emit log lines as JSON.
    pub json: bool,
    /// OTLP gRPC endpoint; spans are exported only when set.
    pub otlp_endpoint: Option<String>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_owned(),
            json: false,
            otlp_endpoint: None,
        }
    }
}

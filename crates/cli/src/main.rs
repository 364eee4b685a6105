//! Cogline CLI entry point.
//!
//! This binary is the composition root for the entire system. Responsibilities:
//!
//! 1. **Parse configuration**: load the TOML file named by `--config` (all
//!    fields optional) and apply command-line overrides on top.
//! 2. **Wire observability**: install `tracing-subscriber` with an
//!    `EnvFilter`, a plain or JSON formatter, and an OpenTelemetry OTLP
//!    exporter when an endpoint is configured. All `tracing` spans and events
//!    emitted by every crate in the workspace flow through it.
//! 3. **Construct infrastructure**: build the configured inference boundary
//!    (`EchoInference` or `AnthropicInference`) and inject it into the
//!    `Orchestrator`.
//! 4. **Run once**: execute the selected path on the origin and print the
//!    final experience as JSON on stdout.

mod config;
mod telemetry;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use llm::{AnthropicConfig, AnthropicInference};
use nodes::Orchestrator;
use pipeline::{EchoInference, InferenceBoundary, Origin};

use crate::config::{CliConfig, InferenceConfig, Provider};

/// Run a Cogline path once and print the resulting experience as JSON.
#[derive(Debug, Parser)]
#[command(name = "cogline", version)]
struct Cli {
    /// Configuration file (TOML).
    #[arg(long, short, env = "COGLINE_CONFIG")]
    config: Option<PathBuf>,

    /// Registered path to run (default: `understand`).
    #[arg(long, short)]
    path: Option<String>,

    /// Inference boundary closing the generative stages.
    #[arg(long, value_enum)]
    provider: Option<Provider>,

    /// Model identifier passed to the inference provider.
    #[arg(long)]
    model: Option<String>,

    /// Emit log lines as JSON.
    #[arg(long)]
    log_json: bool,

    /// OTLP gRPC endpoint for span export.
    #[arg(long, env = "OTEL_EXPORTER_OTLP_ENDPOINT")]
    otlp_endpoint: Option<String>,

    /// Parse ORIGIN as JSON instead of plain text.
    #[arg(long)]
    json_origin: bool,

    /// The input the run starts from.
    origin: String,
}

impl Cli {
    /// Applies command-line overrides to `config`.
    fn apply(&self, config: &mut CliConfig) {
        if let Some(path) = &self.path {
            config.path = path.clone();
        }
        if let Some(provider) = self.provider {
            config.inference.provider = provider;
        }
        if let Some(model) = &self.model {
            config.inference.model = model.clone();
        }
        if self.log_json {
            config.telemetry.json = true;
        }
        if let Some(endpoint) = &self.otlp_endpoint {
            config.telemetry.otlp_endpoint = Some(endpoint.clone());
        }
    }

    fn origin(&self) -> anyhow::Result<Origin> {
        if self.json_origin {
            let value = serde_json::from_str(&self.origin).context("ORIGIN is not valid JSON")?;
            Ok(Origin::new(value))
        } else {
            Ok(Origin::from(self.origin.as_str()))
        }
    }
}

fn build_inference(config: &InferenceConfig) -> anyhow::Result<Arc<dyn InferenceBoundary>> {
    match config.provider {
        Provider::Echo => Ok(Arc::new(EchoInference)),
        Provider::Anthropic => {
            let api_key = std::env::var(&config.api_key_env).with_context(|| {
                format!("environment variable {} is not set", config.api_key_env)
            })?;
            let mut anthropic = AnthropicConfig::new(api_key, config.model.clone());
            anthropic.endpoint = config.endpoint.clone();
            anthropic.max_tokens = config.max_tokens;
            anthropic.temperature = config.temperature;
            anthropic.system_prompt = config.system_prompt.clone();
            anthropic.timeout = Duration::from_secs(config.timeout_secs);
            let boundary =
                AnthropicInference::new(anthropic).context("failed to build Anthropic client")?;
            Ok(Arc::new(boundary))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => CliConfig::load(path)?,
        None => CliConfig::default(),
    };
    cli.apply(&mut config);

    let _telemetry = telemetry::init(&config.telemetry)?;

    let inference = build_inference(&config.inference)?;
    tracing::info!(
        path = %config.path,
        model = %inference.descriptor().model,
        "starting run"
    );
    let orchestrator = Orchestrator::new(inference).context("failed to build default paths")?;

    let experience = orchestrator
        .process_on(&config.path, cli.origin()?)
        .await
        .with_context(|| format!("path '{}' failed", config.path))?;

    println!("{}", serde_json::to_string_pretty(&experience)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_the_file() {
        let cli = Cli::try_parse_from([
            "cogline",
            "--path",
            "perceive",
            "--provider",
            "anthropic",
            "--model",
            "claude-haiku-4-5",
            "--log-json",
            "The sky is blue",
        ])
        .unwrap();
        let mut config = CliConfig::default();

        cli.apply(&mut config);

        assert_eq!(config.path, "perceive");
        assert_eq!(config.inference.provider, Provider::Anthropic);
        assert_eq!(config.inference.model, "claude-haiku-4-5");
        assert!(config.telemetry.json);
        assert_eq!(cli.origin().unwrap().as_text(), Some("The sky is blue"));
    }

    #[test]
    fn json_origin_is_parsed() {
        let cli = Cli::try_parse_from(["cogline", "--json-origin", r#"{"reading": 42}"#]).unwrap();

        let origin = cli.origin().unwrap();

        assert_eq!(origin.as_value()["reading"], 42);
    }

    #[test]
    fn invalid_json_origin_is_rejected() {
        let cli = Cli::try_parse_from(["cogline", "--json-origin", "{"]).unwrap();
        assert!(cli.origin().is_err());
    }

    #[test]
    fn anthropic_without_key_fails_early() {
        let config = InferenceConfig {
            provider: Provider::Anthropic,
            api_key_env: "COGLINE_TEST_UNSET_KEY".to_owned(),
            ..InferenceConfig::default()
        };

        let err = build_inference(&config).err().unwrap();

        assert!(err.to_string().contains("COGLINE_TEST_UNSET_KEY"));
    }

    #[test]
    fn echo_needs_no_credentials() {
        let inference = build_inference(&InferenceConfig::default()).unwrap();
        assert_eq!(inference.descriptor().model, "echo");
    }
}

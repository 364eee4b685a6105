//! The inference boundary port and its echo reference implementation.
//!
//! Generative stages hand their freshly built experience to an
//! [`InferenceBoundary`] and attach whatever [`Interpretation`] comes back.
//! How the boundary reaches a model, how it renders prompts, and whether it
//! times out are its own business; this crate never retries a failed call.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{Confidence, Content, Experience, InferenceError, Interpretation};

/// Descriptive metadata about an inference boundary configuration.
///
/// Used for diagnostics only; the composition engine never branches on it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InferenceDescriptor {
    /// Model identifier (e.g. `"echo"`, `"claude-sonnet-4-5"`).
    pub model: String,
    /// Sampling temperature, if the boundary uses one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Upper bound on generated tokens, if the boundary enforces one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// System prompt prepended to every call, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

/// Turns a finished elaboration into an interpretation.
///
/// Implementations must tolerate concurrent invocation from independent runs
/// and must not keep per-run state beyond the experience they are given.
#[async_trait]
pub trait InferenceBoundary: Send + Sync {
    /// Answers the question carried by `experience`.
    async fn infer(&self, experience: &Experience) -> Result<Interpretation, InferenceError>;

    /// Describes this boundary for diagnostics.
    fn descriptor(&self) -> InferenceDescriptor;
}

// ---------------------------------------------------------------------------
// Echo
// ---------------------------------------------------------------------------

/// Boundary that returns the question as its own answer.
///
/// Deterministic and side-effect free, which makes pipelines testable without
/// a model. The interpretation source is `"echo-<experience source>"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoInference;

impl EchoInference {
    /// Model name reported by [`InferenceBoundary::descriptor`].
    pub const MODEL: &'static str = "echo";
}

#[async_trait]
impl InferenceBoundary for EchoInference {
    async fn infer(&self, experience: &Experience) -> Result<Interpretation, InferenceError> {
        let content = match experience.elaboration() {
            Some(elaboration) => Content::Elaboration(elaboration.clone()),
            None => Content::Structured(json!({ "message": "No elaboration to echo" })),
        };
        Ok(Interpretation::new(
            content,
            format!("echo-{}", experience.source()),
            Some(Confidence::certain()),
        ))
    }

    fn descriptor(&self) -> InferenceDescriptor {
        InferenceDescriptor {
            model: Self::MODEL.to_owned(),
            ..InferenceDescriptor::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{Elaboration, StageName};

    #[tokio::test]
    async fn echo_returns_the_elaboration() {
        let link = Arc::new(Elaboration::new(
            StageName::new("sensation").unwrap(),
            "look",
            None,
            None,
        ));
        let experience = Experience::new(StageName::new("perception").unwrap())
            .with_elaboration(Some(link.clone()));

        let interpretation = EchoInference.infer(&experience).await.unwrap();

        assert_eq!(interpretation.content, Content::Elaboration(link));
        assert_eq!(interpretation.source, "echo-perception");
        assert_eq!(interpretation.confidence, Some(Confidence::certain()));
    }

    #[tokio::test]
    async fn echo_without_elaboration_reports_placeholder() {
        let experience = Experience::from_origin("bare");

        let interpretation = EchoInference.infer(&experience).await.unwrap();

        assert_eq!(
            interpretation.content,
            Content::Structured(json!({ "message": "No elaboration to echo" }))
        );
        assert_eq!(interpretation.source, "echo-origin");
    }

    #[test]
    fn echo_descriptor_names_the_model() {
        assert_eq!(EchoInference.descriptor().model, "echo");
    }
}

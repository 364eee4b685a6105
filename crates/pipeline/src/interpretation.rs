//! The answer an inference boundary attaches to an experience.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::{Confidence, Elaboration};

/// Payload of an [`Interpretation`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Content {
    /// Free-form text returned by a generative model.
    Text(String),
    /// Structured output, typically shaped by the elaboration's schema.
    Structured(Value),
    /// The question itself, handed back unchanged (echo boundaries).
    Elaboration(Arc<Elaboration>),
}

impl Content {
    /// Returns the text payload, if this is [`Content::Text`].
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Returns the echoed elaboration, if this is [`Content::Elaboration`].
    pub fn as_elaboration(&self) -> Option<&Arc<Elaboration>> {
        match self {
            Self::Elaboration(elaboration) => Some(elaboration),
            _ => None,
        }
    }
}

impl std::fmt::Display for Content {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(text) => write!(f, "{text}"),
            Self::Structured(value) => write!(f, "{value}"),
            Self::Elaboration(elaboration) => {
                for (index, link) in elaboration.chain().into_iter().enumerate() {
                    if index > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "[{}] {}", link.source(), link.prompt())?;
                }
                Ok(())
            }
        }
    }
}

/// The generative answer to an experience's elaboration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Interpretation {
    /// The answer itself.
    pub content: Content,
    /// Which boundary (and stage) produced the answer, e.g. `"echo-perception"`.
    pub source: String,
    /// Confidence reported by the boundary, when it reports one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Confidence>,
}

impl Interpretation {
    /// Creates an interpretation.
    pub fn new(content: Content, source: impl Into<String>, confidence: Option<Confidence>) -> Self {
        Self {
            content,
            source: source.into(),
            confidence,
        }
    }
}

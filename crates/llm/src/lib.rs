//! Cogline inference infrastructure adapter.
//!
//! Implements the [`pipeline::InferenceBoundary`] trait for Anthropic's
//! Messages API. Additional providers are added as new modules in this crate
//! without any changes to the `pipeline` crate.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** All HTTP transport, prompt rendering, request
//! formatting and response parsing live here. The [`pipeline`] crate sees only
//! [`pipeline::InferenceBoundary`].
//!
//! Boundaries in this crate never retry. A failed call surfaces as a
//! [`pipeline::InferenceError`] and the run stops.

#![warn(missing_docs)]

mod anthropic;
mod prompt;

pub use anthropic::{AnthropicConfig, AnthropicInference};
pub use prompt::render_prompt;

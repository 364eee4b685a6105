//! Core composition domain for Cogline.
//!
//! This crate contains the experience and elaboration chains, the evolution
//! variants, the composer that assembles them into paths, and the port traits
//! through which the engine reaches its collaborators. Infrastructure crates
//! implement the traits defined here; they never add composition rules.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! It defines *what* is needed ([`InferenceBoundary`], [`MemorySink`]);
//! infrastructure crates define *how* to supply it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`StageName`, `RunId`, `TraceId`) |
//! | [`types`] | Shared value types (`Origin`, `Confidence`, `Timestamp`) |
//! | [`elaboration`] | The per-transition question chain |
//! | [`experience`] | The append-only milestone history |
//! | [`interpretation`] | Answers attached by inference boundaries |
//! | [`evolution`] | `Computation`, `Generation`, `Path` and the `Evolution` variant |
//! | [`composer`] | Micro- and macro-composition |
//! | [`registry`] | Named, pre-built paths |
//! | [`inference`] | Inference boundary port and the echo boundary |
//! | [`memory`] | Memory sink port |
//! | [`errors`] | Error types |

pub mod composer;
pub mod elaboration;
pub mod errors;
pub mod evolution;
pub mod experience;
pub mod identifiers;
pub mod inference;
pub mod interpretation;
pub mod memory;
pub mod registry;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use composer::{compose, compose_named, Composer};
pub use elaboration::{Elaboration, Links};
pub use errors::{InferenceError, MemoryError, PipelineError};
pub use evolution::{
    Category, Computation, ComputationBuilder, Elaborator, Evolution, Evolve, Generation,
    Members, Path,
};
pub use experience::{Ancestors, Experience};
pub use identifiers::{RunId, StageName, TraceId};
pub use inference::{EchoInference, InferenceBoundary, InferenceDescriptor};
pub use interpretation::{Content, Interpretation};
pub use memory::{MemorySink, MemoryTrace, TraceKind};
pub use registry::PathRegistry;
pub use types::{Confidence, Metadata, Origin, Timestamp, TIMESTAMP_KEY};

//! Error types for the composition domain and its ports.
//!
//! [`PipelineError`] covers every condition that stops a composition from being
//! built or a run from completing. Collaborator failures ([`InferenceError`],
//! [`MemoryError`]) are defined alongside it because the port traits in this
//! crate return them; infrastructure crates construct them.
//!
//! No stage is permitted to swallow one of these and hand back a degraded
//! experience: partial failure always surfaces as an `Err`.

use thiserror::Error;

use crate::{Category, StageName};

// ---------------------------------------------------------------------------
// Pipeline-level errors
// ---------------------------------------------------------------------------

/// Errors that stop a composition from being built or a run from completing.
///
/// The variants fall into four classes:
///
/// - **configuration**: detected while building stages, compositions or the
///   path registry, before any stage executes
///   (see [`PipelineError::is_configuration`]);
/// - **missing predecessor**: a stage's structural precondition failed;
/// - **boundary**: the inference boundary rejected the call;
/// - **memory**: the memory sink rejected a trace.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A composition was requested over an empty member list.
    #[error("Configuration error: cannot compose an empty evolution list")]
    EmptyComposition,

    /// A composition mixed deterministic-step members with generative-step or
    /// path members.
    #[error(
        "Configuration error: category mismatch in composition: expected '{expected}' but found '{found}' in evolution '{member}'"
    )]
    CategoryMismatch {
        /// Category of the first member, which fixes the composition strategy.
        expected: Category,
        /// Category of the offending member.
        found: Category,
        /// Name of the offending member.
        member: StageName,
    },

    /// An evolution was given an empty or whitespace-only name.
    #[error("Configuration error: evolution names must not be empty")]
    InvalidName,

    /// A path was registered under a name that is already taken.
    #[error("Configuration error: path '{name}' is already registered")]
    DuplicatePath {
        /// The contested path name.
        name: StageName,
    },

    /// A path was looked up by a name that is not registered.
    #[error("Configuration error: no path named '{name}'")]
    UnknownPath {
        /// The requested path name.
        name: String,
    },

    /// A deterministic stage that structurally depends on a prior stage's
    /// elaboration received none.
    #[error("Stage '{stage}' requires a preceding elaboration from '{expected}' but received none")]
    MissingPredecessorElaboration {
        /// The stage whose precondition failed.
        stage: StageName,
        /// The stage whose elaboration was expected to precede it.
        expected: StageName,
    },

    /// The inference boundary failed while closing a generative stage.
    #[error("Inference boundary failed in stage '{stage}': {source}")]
    Boundary {
        /// The generative stage that invoked the boundary.
        stage: StageName,
        /// The boundary's own error, unchanged.
        #[source]
        source: InferenceError,
    },

    /// The memory sink failed while recording a completed run.
    #[error("Memory sink failed: {0}")]
    Memory(#[from] MemoryError),
}

impl PipelineError {
    /// Returns `true` for errors detected at build or lookup time, before any
    /// stage has executed.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::EmptyComposition
                | Self::CategoryMismatch { .. }
                | Self::InvalidName
                | Self::DuplicatePath { .. }
                | Self::UnknownPath { .. }
        )
    }
}

// ---------------------------------------------------------------------------
// Collaborator errors
// ---------------------------------------------------------------------------

/// Failures raised by an [`crate::InferenceBoundary`] implementation.
#[derive(Debug, Error)]
pub enum InferenceError {
    /// The request never produced a response (connection, DNS, timeout).
    #[error("Inference transport failed: {message}")]
    Transport {
        /// Description of the transport failure.
        message: String,
    },

    /// The provider answered with a non-success status.
    #[error("Inference provider returned status {status}: {message}")]
    Provider {
        /// HTTP (or equivalent) status code.
        status: u16,
        /// Error body or reason reported by the provider.
        message: String,
    },

    /// The provider answered successfully but the body could not be used.
    #[error("Inference response was invalid: {message}")]
    InvalidResponse {
        /// Description of what was wrong with the body.
        message: String,
    },
}

/// Failures raised by a [`crate::MemorySink`] implementation.
#[derive(Debug, Error)]
pub enum MemoryError {
    /// The sink could not store the trace.
    #[error("Memory encode failed: {message}")]
    Encode {
        /// Description of the failure.
        message: String,
    },

    /// The sink is unavailable (closed, unreachable, misconfigured).
    #[error("Memory sink unavailable: {message}")]
    Unavailable {
        /// Description of the failure.
        message: String,
    },
}

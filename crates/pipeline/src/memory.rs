//! The memory sink port.
//!
//! A [`MemorySink`] receives content worth remembering and can later return
//! traces matching a cue. Its storage and recall strategy are opaque to the
//! composition engine, which only ever writes to it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{MemoryError, Timestamp, TraceId};

/// Kind of memory a trace belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceKind {
    /// A specific event: one completed run.
    Episodic,
    /// General knowledge abstracted from events.
    Semantic,
    /// Know-how: how to perform a task.
    Procedural,
}

impl std::fmt::Display for TraceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Episodic => "episodic",
            Self::Semantic => "semantic",
            Self::Procedural => "procedural",
        };
        write!(f, "{label}")
    }
}

/// A stored memory as returned by [`MemorySink::retrieve`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryTrace {
    /// Identifier assigned at encode time.
    pub id: TraceId,
    /// The encoded content.
    pub content: Value,
    /// What kind of memory this is.
    pub kind: TraceKind,
    /// When the trace was encoded.
    pub encoded_at: Timestamp,
    /// Trace strength in `[0.0, 1.0]`; new traces start at full strength.
    pub strength: f64,
}

/// Pluggable long-term memory collaborator.
#[async_trait]
pub trait MemorySink: Send + Sync {
    /// Stores `content` and returns the identifier of the new trace.
    async fn encode(&self, content: Value, kind: TraceKind) -> Result<TraceId, MemoryError>;

    /// Promotes eligible traces to long-term storage, returning how many moved.
    async fn consolidate(&self) -> Result<usize, MemoryError>;

    /// Returns traces relevant to `cue`.
    async fn retrieve(&self, cue: &str) -> Result<Vec<MemoryTrace>, MemoryError>;
}

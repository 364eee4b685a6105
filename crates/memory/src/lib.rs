//! Cogline in-process memory sink.
//!
//! Implements the [`pipeline::MemorySink`] trait with two in-memory stores:
//!
//! - **short-term**: every encoded trace lands here at full strength;
//! - **long-term**: traces whose strength reaches the consolidation threshold
//!   move here when [`MemorySink::consolidate`] runs.
//!
//! Retrieval is a case-insensitive substring match over trace content in both
//! stores, oldest first. The store is a reference sink for tests and local
//! runs; it keeps nothing across process restarts.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** The [`pipeline`] crate sees only [`pipeline::MemorySink`].

use async_trait::async_trait;
use pipeline::{MemoryError, MemorySink, MemoryTrace, Timestamp, TraceId, TraceKind};
use serde_json::Value;
use tokio::sync::Mutex;

/// Strength assigned to a freshly encoded trace.
pub const INITIAL_STRENGTH: f64 = 1.0;

/// Default minimum strength for a trace to be consolidated.
pub const DEFAULT_CONSOLIDATION_THRESHOLD: f64 = 0.5;

#[derive(Debug, Default)]
struct Stores {
    short_term: Vec<MemoryTrace>,
    long_term: Vec<MemoryTrace>,
}

/// In-process [`MemorySink`].
#[derive(Debug)]
pub struct InMemoryStore {
    stores: Mutex<Stores>,
    threshold: f64,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    /// Creates an empty store with the default consolidation threshold.
    pub fn new() -> Self {
        Self::with_threshold(DEFAULT_CONSOLIDATION_THRESHOLD)
    }

    /// Creates an empty store that consolidates traces with strength at or
    /// above `threshold`.
    pub fn with_threshold(threshold: f64) -> Self {
        Self {
            stores: Mutex::new(Stores::default()),
            threshold,
        }
    }

    /// Number of traces awaiting consolidation.
    pub async fn short_term_len(&self) -> usize {
        self.stores.lock().await.short_term.len()
    }

    /// Number of consolidated traces.
    pub async fn long_term_len(&self) -> usize {
        self.stores.lock().await.long_term.len()
    }
}

fn searchable_text(content: &Value) -> String {
    match content {
        Value::String(text) => text.to_lowercase(),
        other => other.to_string().to_lowercase(),
    }
}

#[async_trait]
impl MemorySink for InMemoryStore {
    async fn encode(&self, content: Value, kind: TraceKind) -> Result<TraceId, MemoryError> {
        let trace = MemoryTrace {
            id: TraceId::new_random(),
            content,
            kind,
            encoded_at: Timestamp::now(),
            strength: INITIAL_STRENGTH,
        };
        let id = trace.id;

        let mut stores = self.stores.lock().await;
        stores.short_term.push(trace);
        tracing::debug!(trace_id = %id, kind = %kind, short_term = stores.short_term.len(), "encoded trace");
        Ok(id)
    }

    async fn consolidate(&self) -> Result<usize, MemoryError> {
        let mut stores = self.stores.lock().await;
        let (moved, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut stores.short_term)
            .into_iter()
            .partition(|trace| trace.strength >= self.threshold);

        let count = moved.len();
        stores.short_term = kept;
        stores.long_term.extend(moved);
        tracing::info!(
            consolidated = count,
            long_term = stores.long_term.len(),
            "consolidated traces"
        );
        Ok(count)
    }

    async fn retrieve(&self, cue: &str) -> Result<Vec<MemoryTrace>, MemoryError> {
        let needle = cue.to_lowercase();
        let stores = self.stores.lock().await;

        let mut matches: Vec<MemoryTrace> = stores
            .long_term
            .iter()
            .chain(stores.short_term.iter())
            .filter(|trace| searchable_text(&trace.content).contains(&needle))
            .cloned()
            .collect();
        matches.sort_by_key(|trace| trace.encoded_at);

        tracing::debug!(cue, matches = matches.len(), "retrieved traces");
        Ok(matches)
    }
}

//! The per-transition question accumulator.
//!
//! Each deterministic stage contributes one [`Elaboration`] link describing
//! what it wants the inference boundary to answer. Links point backwards to
//! the link produced by the stage before them, so the newest link owns the
//! whole question asked so far.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::StageName;

/// One stage's contribution to the question being built up.
///
/// Elaborations are immutable. A chain is extended by creating a new link
/// whose `previous` owns the old head; the old head is never touched, so a
/// chain can be shared between runs without locking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Elaboration {
    prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    schema: Option<Value>,
    source: StageName,
    #[serde(skip_serializing_if = "Option::is_none")]
    previous: Option<Arc<Elaboration>>,
}

impl Elaboration {
    /// Creates a link contributed by `source`, extending `previous`.
    pub fn new(
        source: StageName,
        prompt: impl Into<String>,
        schema: Option<Value>,
        previous: Option<Arc<Elaboration>>,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            schema,
            source,
            previous,
        }
    }

    /// The prompt fragment contributed by this stage.
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Expected output shape, if the stage declared one.
    pub fn schema(&self) -> Option<&Value> {
        self.schema.as_ref()
    }

    /// The stage that contributed this link.
    pub fn source(&self) -> &StageName {
        &self.source
    }

    /// The link contributed by the stage before this one.
    pub fn previous(&self) -> Option<&Arc<Elaboration>> {
        self.previous.as_ref()
    }

    /// Number of links in the chain ending at this one (always at least 1).
    pub fn depth(&self) -> usize {
        self.links().count()
    }

    /// Iterates from this link back to the first one (newest first).
    pub fn links(&self) -> Links<'_> {
        Links { next: Some(self) }
    }

    /// Returns the chain in execution order (oldest first).
    pub fn chain(&self) -> Vec<&Elaboration> {
        let mut chain: Vec<&Elaboration> = self.links().collect();
        chain.reverse();
        chain
    }

    /// Stage names of the chain in execution order.
    pub fn sources(&self) -> Vec<&str> {
        self.chain().into_iter().map(|e| e.source.as_str()).collect()
    }

    /// The most recent link carrying a schema, if any.
    pub fn effective_schema(&self) -> Option<&Value> {
        self.links().find_map(Elaboration::schema)
    }
}

/// Iterator over an elaboration chain, newest link first.
#[derive(Debug, Clone)]
pub struct Links<'a> {
    next: Option<&'a Elaboration>,
}

impl<'a> Iterator for Links<'a> {
    type Item = &'a Elaboration;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.previous.as_deref();
        Some(current)
    }
}

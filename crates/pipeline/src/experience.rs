//! The append-only history of processing milestones.
//!
//! An [`Experience`] is one milestone in a run. Nodes are linked backwards via
//! `previous`; a node is never modified after it has been linked into the
//! history, so ancestors may be shared by any number of in-flight runs.
//!
//! The `with_*` methods consume the value they are called on. They are the
//! construction API: a stage that "replaces" the elaboration of the node it
//! was handed gets that node back by value, so no other holder can observe the
//! change. Ancestors are only reachable through `Arc`, so they can never be
//! reached mutably, and a node can only ever link to a node that already
//! exists, which rules out cycles.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::{Elaboration, Interpretation, Metadata, Origin, StageName, Timestamp, TIMESTAMP_KEY};

/// One milestone of a pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Experience {
    source: StageName,
    #[serde(skip_serializing_if = "Option::is_none")]
    origin: Option<Origin>,
    #[serde(skip_serializing_if = "Option::is_none")]
    elaboration: Option<Arc<Elaboration>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    interpretation: Option<Interpretation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    previous: Option<Arc<Experience>>,
    metadata: Metadata,
}

impl Experience {
    /// Creates a node produced by `source`, stamped with the current time.
    pub fn new(source: StageName) -> Self {
        let mut metadata = Metadata::new();
        metadata.insert(
            TIMESTAMP_KEY.to_owned(),
            Value::String(Timestamp::now().to_string()),
        );
        Self {
            source,
            origin: None,
            elaboration: None,
            interpretation: None,
            previous: None,
            metadata,
        }
    }

    /// Creates the first node of a run: no previous, no elaboration, source
    /// [`StageName::ORIGIN`].
    pub fn from_origin(origin: impl Into<Origin>) -> Self {
        Self::new(StageName::origin()).with_origin(origin.into())
    }

    /// Creates the node that follows `previous`, carrying its origin forward.
    pub fn following(source: StageName, previous: Experience) -> Self {
        let origin = previous.origin.clone();
        let mut next = Self::new(source);
        next.origin = origin;
        next.previous = Some(Arc::new(previous));
        next
    }

    // -----------------------------------------------------------------------
    // Construction
    // -----------------------------------------------------------------------

    /// Sets the origin this run started from.
    pub fn with_origin(mut self, origin: Origin) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Replaces the elaboration, keeping every other field.
    pub fn with_elaboration(mut self, elaboration: Option<Arc<Elaboration>>) -> Self {
        self.elaboration = elaboration;
        self
    }

    /// Attaches the interpretation returned by an inference boundary.
    pub fn with_interpretation(mut self, interpretation: Interpretation) -> Self {
        self.interpretation = Some(interpretation);
        self
    }

    /// Adds a metadata entry, replacing any existing value for `key`.
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Links this node to `previous`.
    ///
    /// Used by macro-composition for members whose output does not already
    /// declare a predecessor.
    pub fn linked_to(mut self, previous: Experience) -> Self {
        self.previous = Some(Arc::new(previous));
        self
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// The stage or path that produced this node.
    pub fn source(&self) -> &StageName {
        &self.source
    }

    /// The trigger the run started from.
    pub fn origin(&self) -> Option<&Origin> {
        self.origin.as_ref()
    }

    /// The finished question for this milestone.
    pub fn elaboration(&self) -> Option<&Arc<Elaboration>> {
        self.elaboration.as_ref()
    }

    /// The generative answer, once the inference boundary has run.
    pub fn interpretation(&self) -> Option<&Interpretation> {
        self.interpretation.as_ref()
    }

    /// The milestone immediately before this one.
    pub fn previous(&self) -> Option<&Arc<Experience>> {
        self.previous.as_ref()
    }

    /// Free-form metadata (always contains [`TIMESTAMP_KEY`]).
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Iterates over the predecessors of this node, nearest first.
    pub fn ancestors(&self) -> Ancestors<'_> {
        Ancestors {
            next: self.previous.as_deref(),
        }
    }

    /// Number of `previous` hops back to the first node of the history.
    pub fn depth(&self) -> usize {
        self.ancestors().count()
    }

    /// Returns `true` while this node's transition is still open: it carries
    /// an elaboration that no inference boundary has answered yet.
    pub fn is_open(&self) -> bool {
        self.elaboration.is_some() && self.interpretation.is_none()
    }

    /// The elaboration a following node continues from: this node's
    /// elaboration while its transition is open, otherwise `None`.
    pub fn open_elaboration(&self) -> Option<Arc<Elaboration>> {
        if self.is_open() {
            self.elaboration.clone()
        } else {
            None
        }
    }
}

/// Iterator over an experience's predecessors, nearest first.
#[derive(Debug, Clone)]
pub struct Ancestors<'a> {
    next: Option<&'a Experience>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a Experience;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.previous.as_deref();
        Some(current)
    }
}

//! Named paths and the entry point that runs them.
//!
//! The [`Orchestrator`] owns a [`PathRegistry`] pre-loaded with the default
//! paths:
//!
//! | Path | Members |
//! |------|---------|
//! | [`UNDERSTAND`] | perception → comprehension → recollection |
//! | [`PERCEIVE`] | perception |
//!
//! Every run starts from a fresh origin node, executes exactly one path, and
//! returns the final [`Experience`]. Runs share no mutable state, so one
//! orchestrator may serve any number of concurrent callers.

use std::sync::Arc;

use pipeline::{
    compose_named, EchoInference, Evolution, Evolve, Experience, InferenceBoundary, MemorySink,
    Origin, PathRegistry, PipelineError, RunId, StageName, TraceKind,
};
use serde_json::json;
use tracing::Instrument;

use crate::{FunctionCatalog, StageCatalog};

/// Name of the full path: perception, comprehension, then recollection.
pub const UNDERSTAND: &str = "understand";

/// Name of the perception-only path.
pub const PERCEIVE: &str = "perceive";

/// Runs named paths from an origin.
#[derive(Clone)]
pub struct Orchestrator {
    registry: PathRegistry,
    default_path: StageName,
    memory: Option<Arc<dyn MemorySink>>,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("paths", &self.registry.names().collect::<Vec<_>>())
            .field("default_path", &self.default_path)
            .field("memory", &self.memory.is_some())
            .finish()
    }
}

impl Orchestrator {
    /// Builds the default stages, functions and paths, closing every
    /// generative function with `inference`. The default path is
    /// [`UNDERSTAND`].
    pub fn new(inference: Arc<dyn InferenceBoundary>) -> Result<Self, PipelineError> {
        let stages = StageCatalog::new()?;
        let functions = FunctionCatalog::new(&stages, inference)?;

        let mut registry = PathRegistry::new();
        registry.register(compose_named(
            UNDERSTAND,
            vec![
                functions.perception.clone().into(),
                functions.comprehension.into(),
                functions.recollection.into(),
            ],
        )?)?;
        registry.register(compose_named(PERCEIVE, vec![functions.perception.into()])?)?;

        Self::from_registry(registry, UNDERSTAND)
    }

    /// Builds the default paths around the [`EchoInference`] boundary.
    pub fn echo() -> Result<Self, PipelineError> {
        Self::new(Arc::new(EchoInference))
    }

    /// Wraps a caller-built registry.
    ///
    /// # Errors
    ///
    /// [`PipelineError::UnknownPath`] if `default_path` is not registered.
    pub fn from_registry(
        registry: PathRegistry,
        default_path: &str,
    ) -> Result<Self, PipelineError> {
        let default_path = registry.require(default_path)?.name().clone();
        Ok(Self {
            registry,
            default_path,
            memory: None,
        })
    }

    /// Records the final interpretation of every completed run in `sink`.
    pub fn with_memory(mut self, sink: Arc<dyn MemorySink>) -> Self {
        self.memory = Some(sink);
        self
    }

    /// Changes the path [`Orchestrator::process`] runs.
    ///
    /// # Errors
    ///
    /// [`PipelineError::UnknownPath`] if `name` is not registered.
    pub fn with_default_path(mut self, name: &str) -> Result<Self, PipelineError> {
        self.default_path = self.registry.require(name)?.name().clone();
        Ok(self)
    }

    /// Registers an additional named path.
    pub fn register(&mut self, evolution: Evolution) -> Result<(), PipelineError> {
        self.registry.register(evolution)
    }

    /// Every path this orchestrator can run, by name.
    pub fn registry(&self) -> &PathRegistry {
        &self.registry
    }

    /// Path run by [`Orchestrator::process`].
    pub fn default_path(&self) -> &StageName {
        &self.default_path
    }

    /// The [`UNDERSTAND`] path. Does not execute it.
    pub fn understand(&self) -> Result<&Evolution, PipelineError> {
        self.registry.require(UNDERSTAND)
    }

    /// The [`PERCEIVE`] path. Does not execute it.
    pub fn perceive(&self) -> Result<&Evolution, PipelineError> {
        self.registry.require(PERCEIVE)
    }

    /// Any registered path. Does not execute it.
    pub fn path(&self, name: &str) -> Result<&Evolution, PipelineError> {
        self.registry.require(name)
    }

    /// Runs the default path on `origin`.
    pub async fn process(&self, origin: impl Into<Origin>) -> Result<Experience, PipelineError> {
        let evolution = self.registry.require(self.default_path.as_str())?;
        self.process_with(evolution, origin).await
    }

    /// Runs the path registered under `name` on `origin`.
    pub async fn process_on(
        &self,
        name: &str,
        origin: impl Into<Origin>,
    ) -> Result<Experience, PipelineError> {
        let evolution = self.registry.require(name)?;
        self.process_with(evolution, origin).await
    }

    /// Runs a caller-supplied evolution on `origin`.
    ///
    /// # Errors
    ///
    /// Whatever the evolution raises, unchanged, or [`PipelineError::Memory`]
    /// if the memory sink rejects the final interpretation. No partial
    /// experience is returned.
    pub async fn process_with(
        &self,
        evolution: &Evolution,
        origin: impl Into<Origin>,
    ) -> Result<Experience, PipelineError> {
        let run_id = RunId::new_random();
        let span = tracing::info_span!("run", run_id = %run_id, path = %evolution.name());
        self.run(run_id, evolution, origin.into())
            .instrument(span)
            .await
    }

    async fn run(
        &self,
        run_id: RunId,
        evolution: &Evolution,
        origin: Origin,
    ) -> Result<Experience, PipelineError> {
        let start =
            Experience::from_origin(origin).with_metadata("run_id", json!(run_id.to_string()));

        let result = evolution.evolve(start).await?;
        tracing::info!(
            depth = result.depth(),
            answered = result.interpretation().is_some(),
            "run complete"
        );

        if let Some(sink) = &self.memory {
            remember(sink.as_ref(), evolution, &result).await?;
        }
        Ok(result)
    }
}

/// Encodes the final interpretation of a completed run as an episodic trace.
async fn remember(
    sink: &dyn MemorySink,
    evolution: &Evolution,
    result: &Experience,
) -> Result<(), PipelineError> {
    let Some(interpretation) = result.interpretation() else {
        tracing::debug!("run produced no interpretation; nothing to encode");
        return Ok(());
    };
    let trace = json!({
        "path": evolution.name().as_str(),
        "origin": result.origin(),
        "source": interpretation.source,
        "content": interpretation.content.to_string(),
    });
    let id = sink.encode(trace, TraceKind::Episodic).await?;
    tracing::debug!(trace_id = %id, "encoded run interpretation");
    Ok(())
}

#[cfg(test)]
mod tests {
    use pipeline::Category;

    use super::*;

    #[test]
    fn default_paths_are_registered() {
        let orchestrator = Orchestrator::echo().unwrap();

        let names: Vec<&str> = orchestrator.registry().names().map(StageName::as_str).collect();
        assert_eq!(names, vec![PERCEIVE, UNDERSTAND]);
        assert_eq!(orchestrator.default_path().as_str(), UNDERSTAND);
    }

    #[test]
    fn understand_is_plain_composed_data() {
        let orchestrator = Orchestrator::echo().unwrap();
        let understand = orchestrator.understand().unwrap();

        assert_eq!(understand.category(), Category::Path);
        let members: Vec<&str> = understand
            .as_path()
            .unwrap()
            .member_names()
            .into_iter()
            .map(StageName::as_str)
            .collect();
        assert_eq!(members, vec!["perception", "comprehension", "recollection"]);
    }

    #[test]
    fn unknown_default_path_is_rejected() {
        let err = Orchestrator::echo()
            .unwrap()
            .with_default_path("imagine")
            .unwrap_err();
        assert!(matches!(err, PipelineError::UnknownPath { .. }));
    }

    #[test]
    fn registering_a_taken_name_fails() {
        let mut orchestrator = Orchestrator::echo().unwrap();
        let again = orchestrator.perceive().unwrap().clone();

        let err = orchestrator.register(again).unwrap_err();

        assert!(matches!(err, PipelineError::DuplicatePath { .. }));
    }

    #[tokio::test]
    async fn origin_node_carries_the_run_id() {
        let orchestrator = Orchestrator::echo().unwrap();

        let result = orchestrator.process_on(PERCEIVE, "input").await.unwrap();

        let origin = result.previous().unwrap();
        assert_eq!(origin.source().as_str(), StageName::ORIGIN);
        assert!(origin.metadata().contains_key("run_id"));
    }
}

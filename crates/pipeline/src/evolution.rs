//! Transformation units and their composition categories.
//!
//! An [`Evolution`] is one of three tagged variants:
//!
//! | Variant | Category | Effect on the experience chain |
//! |---------|----------|--------------------------------|
//! | [`Computation`] | [`Category::DeterministicStep`] | replaces the current node's elaboration; never suspends |
//! | [`Generation`] | [`Category::GenerativeStep`] | creates a new node and asks the inference boundary |
//! | [`Path`] | [`Category::Path`] | runs its members with the strategy chosen by the [`crate::Composer`] |
//!
//! Names and categories are fixed at construction; there is no way to change
//! either afterwards.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Elaboration, Experience, InferenceBoundary, PipelineError, StageName};

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// Composition category of an evolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    /// Synchronous elaboration step; composes by micro-composition.
    DeterministicStep,
    /// Step that closes a macro-step with an inference call.
    GenerativeStep,
    /// Composed evolution; nests inside macro-compositions only.
    Path,
}

impl Category {
    /// Returns `true` if members of this category compose by
    /// micro-composition (threading one experience node through).
    pub fn is_micro(self) -> bool {
        matches!(self, Self::DeterministicStep)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::DeterministicStep => "deterministic-step",
            Self::GenerativeStep => "generative-step",
            Self::Path => "path",
        };
        write!(f, "{label}")
    }
}

// ---------------------------------------------------------------------------
// Evolve
// ---------------------------------------------------------------------------

/// Moves an experience one step forward.
///
/// Deterministic implementations complete without awaiting anything; only a
/// generative stage suspends, and only inside its inference call.
#[async_trait]
pub trait Evolve: Send + Sync {
    /// Evolves `experience`, returning the resulting milestone.
    async fn evolve(&self, experience: Experience) -> Result<Experience, PipelineError>;
}

// ---------------------------------------------------------------------------
// Computation (deterministic stage)
// ---------------------------------------------------------------------------

/// Produces the prompt a deterministic stage contributes.
///
/// Implemented for any `Fn(Option<&Elaboration>) -> String`, so most stages
/// are defined with a closure.
pub trait Elaborator: Send + Sync {
    /// Builds this stage's prompt given the previous link, if any.
    fn prompt(&self, previous: Option<&Elaboration>) -> String;
}

impl<F> Elaborator for F
where
    F: Fn(Option<&Elaboration>) -> String + Send + Sync,
{
    fn prompt(&self, previous: Option<&Elaboration>) -> String {
        self(previous)
    }
}

/// A deterministic stage: appends one link to the current elaboration.
#[derive(Clone)]
pub struct Computation {
    name: StageName,
    elaborator: Arc<dyn Elaborator>,
    schema: Option<Value>,
    requires: Option<StageName>,
}

impl Computation {
    /// Starts defining a stage whose prompt is produced by `prompt`.
    pub fn builder<F>(name: impl Into<String>, prompt: F) -> ComputationBuilder
    where
        F: Fn(Option<&Elaboration>) -> String + Send + Sync + 'static,
    {
        Self::with_elaborator(name, Arc::new(prompt))
    }

    /// Starts defining a stage around an existing [`Elaborator`].
    pub fn with_elaborator(
        name: impl Into<String>,
        elaborator: Arc<dyn Elaborator>,
    ) -> ComputationBuilder {
        ComputationBuilder {
            name: name.into(),
            elaborator,
            schema: None,
            requires: None,
        }
    }

    /// The stage name; tags every link this stage contributes.
    pub fn name(&self) -> &StageName {
        &self.name
    }

    /// Expected output shape this stage declares, if any.
    pub fn schema(&self) -> Option<&Value> {
        self.schema.as_ref()
    }

    /// The stage whose elaboration must precede this one, if any.
    pub fn required_predecessor(&self) -> Option<&StageName> {
        self.requires.as_ref()
    }

    /// Builds this stage's link on top of `previous`.
    ///
    /// # Errors
    ///
    /// [`PipelineError::MissingPredecessorElaboration`] if the stage requires a
    /// predecessor and `previous` is `None`.
    pub fn elaborate(
        &self,
        previous: Option<Arc<Elaboration>>,
    ) -> Result<Elaboration, PipelineError> {
        if previous.is_none() {
            if let Some(expected) = &self.requires {
                return Err(PipelineError::MissingPredecessorElaboration {
                    stage: self.name.clone(),
                    expected: expected.clone(),
                });
            }
        }

        let prompt = self.elaborator.prompt(previous.as_deref());
        let elaboration = Elaboration::new(self.name.clone(), prompt, self.schema.clone(), previous);
        tracing::debug!(stage = %self.name, depth = elaboration.depth(), "elaborated");
        Ok(elaboration)
    }

    /// Runs this stage on `experience`, returning the same node with only its
    /// elaboration replaced.
    pub fn apply(&self, experience: Experience) -> Result<Experience, PipelineError> {
        let elaboration = self.elaborate(experience.elaboration().cloned())?;
        Ok(experience.with_elaboration(Some(Arc::new(elaboration))))
    }
}

impl std::fmt::Debug for Computation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Computation")
            .field("name", &self.name)
            .field("schema", &self.schema.is_some())
            .field("requires", &self.requires)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Evolve for Computation {
    async fn evolve(&self, experience: Experience) -> Result<Experience, PipelineError> {
        self.apply(experience)
    }
}

/// Builder returned by [`Computation::builder`].
pub struct ComputationBuilder {
    name: String,
    elaborator: Arc<dyn Elaborator>,
    schema: Option<Value>,
    requires: Option<String>,
}

impl ComputationBuilder {
    /// Declares the output shape the stage asks for.
    pub fn schema(mut self, schema: Value) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Declares that the stage cannot run without a preceding elaboration.
    ///
    /// Any preceding link satisfies the requirement, whichever stage produced
    /// it. `predecessor` names the stage the caller expects to run first and
    /// is only reported in [`PipelineError::MissingPredecessorElaboration`].
    pub fn requires(mut self, predecessor: impl Into<String>) -> Self {
        self.requires = Some(predecessor.into());
        self
    }

    /// Finishes the stage.
    ///
    /// # Errors
    ///
    /// [`PipelineError::InvalidName`] if the stage or predecessor name is blank.
    pub fn build(self) -> Result<Computation, PipelineError> {
        let name = StageName::new(self.name).ok_or(PipelineError::InvalidName)?;
        let requires = self
            .requires
            .map(|r| StageName::new(r).ok_or(PipelineError::InvalidName))
            .transpose()?;
        Ok(Computation {
            name,
            elaborator: self.elaborator,
            schema: self.schema,
            requires,
        })
    }
}

// ---------------------------------------------------------------------------
// Generation (generative stage)
// ---------------------------------------------------------------------------

/// A generative stage: runs its sub-stages into a new experience node and
/// asks the inference boundary to interpret it.
#[derive(Clone)]
pub struct Generation {
    name: StageName,
    processes: Vec<Computation>,
    inference: Arc<dyn InferenceBoundary>,
}

impl Generation {
    /// Creates a generative stage over zero or more deterministic sub-stages.
    ///
    /// # Errors
    ///
    /// [`PipelineError::InvalidName`] if `name` is blank.
    pub fn new(
        name: impl Into<String>,
        processes: Vec<Computation>,
        inference: Arc<dyn InferenceBoundary>,
    ) -> Result<Self, PipelineError> {
        Ok(Self {
            name: StageName::new(name).ok_or(PipelineError::InvalidName)?,
            processes,
            inference,
        })
    }

    /// The stage name; becomes the source of every node this stage creates.
    pub fn name(&self) -> &StageName {
        &self.name
    }

    /// The deterministic sub-stages, in execution order.
    pub fn processes(&self) -> &[Computation] {
        &self.processes
    }

    /// The boundary this stage closes with.
    pub fn inference(&self) -> &Arc<dyn InferenceBoundary> {
        &self.inference
    }

    /// Builds the new, not yet interpreted, node that follows `previous`.
    ///
    /// The sub-stages extend `previous`'s elaboration while its transition is
    /// still open (elaborated but not yet interpreted); otherwise they start a
    /// fresh chain.
    pub fn experience(&self, previous: Experience) -> Result<Experience, PipelineError> {
        let seed = previous.open_elaboration();
        let elaboration = self.processes.iter().try_fold(seed, |acc, stage| {
            stage.elaborate(acc).map(|link| Some(Arc::new(link)))
        })?;

        Ok(Experience::following(self.name.clone(), previous).with_elaboration(elaboration))
    }
}

impl std::fmt::Debug for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Generation")
            .field("name", &self.name)
            .field("processes", &self.processes)
            .field("model", &self.inference.descriptor().model)
            .finish()
    }
}

#[async_trait]
impl Evolve for Generation {
    async fn evolve(&self, previous: Experience) -> Result<Experience, PipelineError> {
        let experience = self.experience(previous)?;

        tracing::debug!(
            stage = %self.name,
            model = %self.inference.descriptor().model,
            depth = experience.elaboration().map_or(0, |e| e.depth()),
            "invoking inference boundary"
        );
        let interpretation = self
            .inference
            .infer(&experience)
            .await
            .map_err(|source| PipelineError::Boundary {
                stage: self.name.clone(),
                source,
            })?;

        Ok(experience.with_interpretation(interpretation))
    }
}

// ---------------------------------------------------------------------------
// Path (composed evolution)
// ---------------------------------------------------------------------------

/// Members of a [`Path`], typed by the strategy that runs them.
#[derive(Debug, Clone)]
pub enum Members {
    /// Deterministic stages threaded through one experience node.
    Micro(Vec<Computation>),
    /// Generative stages and nested paths, each producing a linked node.
    Macro(Vec<Evolution>),
}

/// A composed evolution. Built by the [`crate::Composer`].
#[derive(Debug, Clone)]
pub struct Path {
    name: StageName,
    members: Members,
}

impl Path {
    pub(crate) fn new(name: StageName, members: Members) -> Self {
        Self { name, members }
    }

    /// The path name.
    pub fn name(&self) -> &StageName {
        &self.name
    }

    /// The ordered members, for introspection or to build alternative paths.
    pub fn members(&self) -> &Members {
        &self.members
    }

    /// Names of the members, in execution order.
    pub fn member_names(&self) -> Vec<&StageName> {
        match &self.members {
            Members::Micro(stages) => stages.iter().map(Computation::name).collect(),
            Members::Macro(members) => members.iter().map(Evolution::name).collect(),
        }
    }

    /// Returns `true` if this path was built by micro-composition.
    pub fn is_micro(&self) -> bool {
        matches!(self.members, Members::Micro(_))
    }
}

#[async_trait]
impl Evolve for Path {
    async fn evolve(&self, experience: Experience) -> Result<Experience, PipelineError> {
        match &self.members {
            Members::Micro(stages) => {
                let mut current = experience;
                for stage in stages {
                    current = stage.apply(current)?;
                }
                Ok(current)
            }
            Members::Macro(members) => {
                let mut current = experience;
                for member in members {
                    let prior = current.clone();
                    let next = match member {
                        // A micro member gets its own node so it never touches an
                        // answered milestone; the node stays open for the next member.
                        Evolution::Path(path) if path.is_micro() => {
                            let seed = current.open_elaboration();
                            let node = Experience::following(path.name().clone(), current)
                                .with_elaboration(seed);
                            path.evolve(node).await?
                        }
                        other => other.evolve(current).await?,
                    };
                    current = if next.previous().is_some() {
                        next
                    } else {
                        next.linked_to(prior)
                    };
                    tracing::debug!(
                        path = %self.name,
                        member = %member.name(),
                        depth = current.depth(),
                        "macro step complete"
                    );
                }
                Ok(current)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Evolution
// ---------------------------------------------------------------------------

/// An abstract transformation unit, dispatched explicitly by variant.
#[derive(Debug, Clone)]
pub enum Evolution {
    /// A deterministic stage.
    Deterministic(Computation),
    /// A generative stage.
    Generative(Generation),
    /// A composed path.
    Path(Path),
}

impl Evolution {
    /// The evolution's name.
    pub fn name(&self) -> &StageName {
        match self {
            Self::Deterministic(stage) => stage.name(),
            Self::Generative(stage) => stage.name(),
            Self::Path(path) => path.name(),
        }
    }

    /// The evolution's composition category.
    pub fn category(&self) -> Category {
        match self {
            Self::Deterministic(_) => Category::DeterministicStep,
            Self::Generative(_) => Category::GenerativeStep,
            Self::Path(_) => Category::Path,
        }
    }

    /// Returns the path if this evolution is composed.
    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Self::Path(path) => Some(path),
            _ => None,
        }
    }
}

impl From<Computation> for Evolution {
    fn from(stage: Computation) -> Self {
        Self::Deterministic(stage)
    }
}

impl From<Generation> for Evolution {
    fn from(stage: Generation) -> Self {
        Self::Generative(stage)
    }
}

impl From<Path> for Evolution {
    fn from(path: Path) -> Self {
        Self::Path(path)
    }
}

#[async_trait]
impl Evolve for Evolution {
    async fn evolve(&self, experience: Experience) -> Result<Experience, PipelineError> {
        match self {
            Self::Deterministic(stage) => stage.apply(experience),
            Self::Generative(stage) => stage.evolve(experience).await,
            Self::Path(path) => path.evolve(experience).await,
        }
    }
}

//! Assembles ordered member lists into composed [`Path`]s.
//!
//! The strategy is chosen from the members' declared categories:
//!
//! - all [`Category::DeterministicStep`] → **micro-composition**: one experience
//!   node is threaded through every member and the elaboration chain grows by
//!   one link per member;
//! - all [`Category::GenerativeStep`] or [`Category::Path`] → **macro-composition**:
//!   every member produces its own node, linked to the node produced before it.
//!   A micro-composed member runs on a fresh node of its own that continues the
//!   previous node's elaboration while that transition is still open.
//!
//! Anything else is rejected here, at build time, so a run never starts with a
//! composition whose semantics are ambiguous.

use crate::{Category, Computation, Evolution, Members, Path, PipelineError, StageName};

/// Builds composed evolutions.
#[derive(Debug, Clone, Copy, Default)]
pub struct Composer;

impl Composer {
    /// Composes `members` under a name derived from the member names:
    /// `micro(a,b)` or `macro(a->b)`.
    pub fn compose(&self, members: Vec<Evolution>) -> Result<Evolution, PipelineError> {
        let category = Self::check_consistency(&members)?;
        let names: Vec<&str> = members.iter().map(|m| m.name().as_str()).collect();
        let derived = if category.is_micro() {
            format!("micro({})", names.join(","))
        } else {
            format!("macro({})", names.join("->"))
        };
        Self::build(derived, category, members)
    }

    /// Composes `members` under an explicit name.
    ///
    /// # Errors
    ///
    /// - [`PipelineError::EmptyComposition`] if `members` is empty.
    /// - [`PipelineError::CategoryMismatch`] if deterministic-step members are
    ///   mixed with generative-step or path members.
    /// - [`PipelineError::InvalidName`] if `name` is blank.
    pub fn compose_named(
        &self,
        name: impl Into<String>,
        members: Vec<Evolution>,
    ) -> Result<Evolution, PipelineError> {
        let category = Self::check_consistency(&members)?;
        Self::build(name.into(), category, members)
    }

    /// Builds the path once `members` are known to share `category`.
    fn build(
        name: String,
        category: Category,
        members: Vec<Evolution>,
    ) -> Result<Evolution, PipelineError> {
        let name = StageName::new(name).ok_or(PipelineError::InvalidName)?;

        let members = if category.is_micro() {
            let stages = members
                .into_iter()
                .map(|member| match member {
                    Evolution::Deterministic(stage) => Ok(stage),
                    other => Err(PipelineError::CategoryMismatch {
                        expected: category,
                        found: other.category(),
                        member: other.name().clone(),
                    }),
                })
                .collect::<Result<Vec<Computation>, _>>()?;
            Members::Micro(stages)
        } else {
            Members::Macro(members)
        };

        let path = Path::new(name, members);
        tracing::debug!(
            path = %path.name(),
            micro = path.is_micro(),
            members = path.member_names().len(),
            "composed"
        );
        Ok(Evolution::Path(path))
    }

    /// Returns the category fixing the composition strategy, or the error
    /// describing why the list cannot be composed.
    fn check_consistency(members: &[Evolution]) -> Result<Category, PipelineError> {
        let first = members.first().ok_or(PipelineError::EmptyComposition)?;
        let expected = first.category();

        if let Some(offender) = members
            .iter()
            .find(|m| m.category().is_micro() != expected.is_micro())
        {
            return Err(PipelineError::CategoryMismatch {
                expected,
                found: offender.category(),
                member: offender.name().clone(),
            });
        }
        Ok(expected)
    }
}

/// Composes with the default [`Composer`] under a derived name.
pub fn compose(members: Vec<Evolution>) -> Result<Evolution, PipelineError> {
    Composer.compose(members)
}

/// Composes with the default [`Composer`] under an explicit name.
pub fn compose_named(
    name: impl Into<String>,
    members: Vec<Evolution>,
) -> Result<Evolution, PipelineError> {
    Composer.compose_named(name, members)
}

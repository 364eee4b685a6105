//! Named, pre-built evolutions.
//!
//! A [`PathRegistry`] is plain data: callers can list the registered names,
//! inspect a path's members, and build alternative paths from the same stages.
//! Nothing in here is global or mutated behind the caller's back.

use std::collections::BTreeMap;

use crate::{Evolution, PipelineError, StageName};

/// Evolutions keyed by name.
#[derive(Debug, Clone, Default)]
pub struct PathRegistry {
    paths: BTreeMap<StageName, Evolution>,
}

impl PathRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `evolution` under its own name.
    ///
    /// # Errors
    ///
    /// [`PipelineError::DuplicatePath`] if the name is already taken.
    pub fn register(&mut self, evolution: Evolution) -> Result<(), PipelineError> {
        let name = evolution.name().clone();
        if self.paths.contains_key(&name) {
            return Err(PipelineError::DuplicatePath { name });
        }
        tracing::debug!(path = %name, category = %evolution.category(), "registered path");
        self.paths.insert(name, evolution);
        Ok(())
    }

    /// Returns the evolution registered under `name`.
    pub fn get(&self, name: &str) -> Option<&Evolution> {
        self.paths.get(name)
    }

    /// Returns the evolution registered under `name`.
    ///
    /// # Errors
    ///
    /// [`PipelineError::UnknownPath`] if nothing is registered under `name`.
    pub fn require(&self, name: &str) -> Result<&Evolution, PipelineError> {
        self.get(name).ok_or_else(|| PipelineError::UnknownPath {
            name: name.to_owned(),
        })
    }

    /// Registered names, in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &StageName> {
        self.paths.keys()
    }

    /// Number of registered evolutions.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{compose_named, Computation, Elaboration};

    fn path(name: &str) -> Evolution {
        let stage = Computation::builder("sensation", |_: Option<&Elaboration>| "look".to_owned())
            .build()
            .unwrap();
        compose_named(name, vec![stage.into()]).unwrap()
    }

    #[test]
    fn registered_paths_are_found_by_name() {
        let mut registry = PathRegistry::new();
        registry.register(path("understand")).unwrap();
        registry.register(path("perceive")).unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.require("understand").unwrap().name().as_str(), "understand");
        let names: Vec<&str> = registry.names().map(StageName::as_str).collect();
        assert_eq!(names, vec!["perceive", "understand"]);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut registry = PathRegistry::new();
        registry.register(path("understand")).unwrap();

        let err = registry.register(path("understand")).unwrap_err();

        assert!(matches!(err, PipelineError::DuplicatePath { .. }));
        assert!(err.is_configuration());
    }

    #[test]
    fn unknown_names_are_configuration_errors() {
        let registry = PathRegistry::new();
        let err = registry.require("imagine").unwrap_err();
        assert!(matches!(err, PipelineError::UnknownPath { ref name } if name == "imagine"));
    }
}

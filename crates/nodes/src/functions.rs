//! The generative functions.
//!
//! A generative function runs a fixed run of deterministic stages into a new
//! experience node and closes it with the inference boundary it was built
//! with.

use std::sync::Arc;

use pipeline::{Generation, InferenceBoundary, PipelineError};

use crate::StageCatalog;

/// The three default generative functions.
#[derive(Debug, Clone)]
pub struct FunctionCatalog {
    /// `sensation → sensory-gating → feature-detection → pattern-recognition`
    pub perception: Generation,
    /// `semantic-encoding → categorization → abstraction`
    pub comprehension: Generation,
    /// `associative-binding → episodic-retrieval`
    pub recollection: Generation,
}

impl FunctionCatalog {
    /// Builds every function from `stages`, closing each with `inference`.
    pub fn new(
        stages: &StageCatalog,
        inference: Arc<dyn InferenceBoundary>,
    ) -> Result<Self, PipelineError> {
        Ok(Self {
            perception: Generation::new(
                "perception",
                vec![
                    stages.sensation.clone(),
                    stages.sensory_gating.clone(),
                    stages.feature_detection.clone(),
                    stages.pattern_recognition.clone(),
                ],
                Arc::clone(&inference),
            )?,
            comprehension: Generation::new(
                "comprehension",
                vec![
                    stages.semantic_encoding.clone(),
                    stages.categorization.clone(),
                    stages.abstraction.clone(),
                ],
                Arc::clone(&inference),
            )?,
            recollection: Generation::new(
                "recollection",
                vec![
                    stages.associative_binding.clone(),
                    stages.episodic_retrieval.clone(),
                ],
                inference,
            )?,
        })
    }
}

//! The deterministic stages.
//!
//! Each stage contributes one prompt to the elaboration chain of the
//! transition it runs in. Stages that follow another stage mention their
//! predecessor by name so the rendered question reads as one line of thought.
//!
//! Stages are explicit values held in a [`StageCatalog`]; build a catalogue,
//! then pick stages from it to compose paths.

use pipeline::{Computation, Elaboration, PipelineError};
use serde_json::{json, Value};

/// The nine default deterministic stages.
#[derive(Debug, Clone)]
pub struct StageCatalog {
    /// Describes the raw input.
    pub sensation: Computation,
    /// Filters what sensation reported; needs a preceding elaboration.
    pub sensory_gating: Computation,
    /// Lists distinct features.
    pub feature_detection: Computation,
    /// Groups features into patterns.
    pub pattern_recognition: Computation,
    /// Restates the input as meaning.
    pub semantic_encoding: Computation,
    /// Assigns categories.
    pub categorization: Computation,
    /// Generalizes beyond the instance.
    pub abstraction: Computation,
    /// Links the input to related concepts.
    pub associative_binding: Computation,
    /// Recalls similar past episodes.
    pub episodic_retrieval: Computation,
}

impl StageCatalog {
    /// Builds every stage.
    pub fn new() -> Result<Self, PipelineError> {
        Ok(Self {
            sensation: sensation()?,
            sensory_gating: sensory_gating()?,
            feature_detection: feature_detection()?,
            pattern_recognition: pattern_recognition()?,
            semantic_encoding: semantic_encoding()?,
            categorization: categorization()?,
            abstraction: abstraction()?,
            associative_binding: associative_binding()?,
            episodic_retrieval: episodic_retrieval()?,
        })
    }

    /// All stages in their canonical order.
    pub fn all(&self) -> [&Computation; 9] {
        [
            &self.sensation,
            &self.sensory_gating,
            &self.feature_detection,
            &self.pattern_recognition,
            &self.semantic_encoding,
            &self.categorization,
            &self.abstraction,
            &self.associative_binding,
            &self.episodic_retrieval,
        ]
    }

    /// Looks a stage up by its name.
    pub fn get(&self, name: &str) -> Option<&Computation> {
        self.all().into_iter().find(|stage| stage.name().as_str() == name)
    }
}

/// Prefixes `task` with a reference to the stage that ran before, if any.
fn building_on(previous: Option<&Elaboration>, what: &str, task: &str) -> String {
    match previous {
        Some(previous) => format!("Building on the {what} from {}, {task}", previous.source()),
        None => {
            let mut chars = task.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        }
    }
}

fn string_list() -> Value {
    json!({ "type": "array", "items": { "type": "string" } })
}

fn sensation() -> Result<Computation, PipelineError> {
    Computation::builder("sensation", |_: Option<&Elaboration>| {
        "Perform initial sensory processing of the input.\n\
         1. Detect its basic properties: data type and format, information density, \
         and how it is distributed.\n\
         2. Identify salient signals: regularities, anomalies and boundaries.\n\
         3. Assess its structure: what stands out against the background and \
         which elements group together.\n\
         Preserve the raw features for the stages that follow."
            .to_owned()
    })
    .build()
}

fn sensory_gating() -> Result<Computation, PipelineError> {
    Computation::builder("sensory-gating", |previous: Option<&Elaboration>| {
        let task = "apply selective attention.\n\
             1. Keep the features with high contrast or novelty.\n\
             2. Keep the features relevant to the apparent goal of the input.\n\
             3. Suppress redundant or background detail.\n\
             List what passes the filter and why.";
        building_on(previous, "sensory features", task)
    })
    .requires("sensation")
    .build()
}

fn feature_detection() -> Result<Computation, PipelineError> {
    Computation::builder("feature-detection", |previous: Option<&Elaboration>| {
        building_on(
            previous,
            "filtered content",
            "detect features.\n\
             1. Extract the key features and recurring markers.\n\
             2. Identify semantic markers and structure.\n\
             3. Describe how the features relate to each other.",
        )
    })
    .schema(json!({
        "type": "object",
        "properties": {
            "features": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "type": { "type": "string" },
                        "value": { "type": "string" },
                        "confidence": { "type": "number" }
                    }
                }
            },
            "relationships": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "from": { "type": "string" },
                        "to": { "type": "string" },
                        "relation": { "type": "string" }
                    }
                }
            }
        }
    }))
    .build()
}

fn pattern_recognition() -> Result<Computation, PipelineError> {
    Computation::builder("pattern-recognition", |previous: Option<&Elaboration>| {
        building_on(
            previous,
            "detected features",
            "recognise the overall pattern.\n\
             1. Combine the features into complete patterns.\n\
             2. Name each pattern and what it means.\n\
             3. Relate the patterns to each other.\n\
             Summarise the overall meaning.",
        )
    })
    .schema(json!({
        "type": "object",
        "properties": {
            "patterns": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "name": { "type": "string" },
                        "type": { "type": "string" },
                        "description": { "type": "string" },
                        "components": string_list(),
                        "confidence": { "type": "number" }
                    }
                }
            },
            "overallMeaning": { "type": "string" }
        }
    }))
    .build()
}

fn semantic_encoding() -> Result<Computation, PipelineError> {
    Computation::builder("semantic-encoding", |previous: Option<&Elaboration>| {
        building_on(
            previous,
            "recognised patterns",
            "encode the meaning as a concept graph.\n\
             1. Identify the concepts and give each an identifier.\n\
             2. Identify the relations between concepts.\n\
             3. Write the graph in Abstract Meaning Representation notation.",
        )
    })
    .schema(json!({
        "type": "object",
        "properties": {
            "concepts": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "string" },
                        "label": { "type": "string" },
                        "type": { "type": "string" }
                    }
                }
            },
            "relations": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "source": { "type": "string" },
                        "target": { "type": "string" },
                        "relation": { "type": "string" }
                    }
                }
            },
            "amrText": { "type": "string" }
        }
    }))
    .build()
}

fn categorization() -> Result<Computation, PipelineError> {
    Computation::builder("categorization", |previous: Option<&Elaboration>| {
        building_on(
            previous,
            "semantic encoding",
            "categorise the concepts.\n\
             1. Assign each concept to a category and name its prototype.\n\
             2. Place the categories in a hierarchy.\n\
             3. Note concepts that fit more than one category.",
        )
    })
    .schema(json!({
        "type": "object",
        "properties": {
            "categories": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "name": { "type": "string" },
                        "prototype": { "type": "string" },
                        "members": string_list(),
                        "parent": { "type": "string" }
                    }
                }
            }
        }
    }))
    .build()
}

fn abstraction() -> Result<Computation, PipelineError> {
    Computation::builder("abstraction", |previous: Option<&Elaboration>| {
        building_on(
            previous,
            "categorisation",
            "extract abstract structure.\n\
             1. Identify structural patterns that generalise.\n\
             2. Separate the invariant parts from the variable parts.\n\
             3. Build templates with named slots.\n\
             4. Map the concrete input onto those templates.",
        )
    })
    .schema(json!({
        "type": "object",
        "properties": {
            "templates": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "name": { "type": "string" },
                        "pattern": { "type": "string" },
                        "slots": string_list(),
                        "constraints": string_list()
                    }
                }
            },
            "mappings": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "concrete": { "type": "string" },
                        "abstract": { "type": "string" },
                        "bindings": { "type": "object" }
                    }
                }
            }
        }
    }))
    .build()
}

fn associative_binding() -> Result<Computation, PipelineError> {
    Computation::builder("associative-binding", |previous: Option<&Elaboration>| {
        building_on(
            previous,
            "abstract structure",
            "bind the current content to what is already known.\n\
             1. Find structurally similar memories.\n\
             2. Find semantically related memories.\n\
             3. Rate the strength of each binding.",
        )
    })
    .schema(json!({
        "type": "object",
        "properties": {
            "bindings": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "currentNode": { "type": "string" },
                        "memoryNode": { "type": "string" },
                        "bindingType": { "type": "string" },
                        "strength": { "type": "number" }
                    }
                }
            },
            "mappings": {
                "type": "object",
                "properties": {
                    "structural": { "type": "number" },
                    "semantic": { "type": "number" },
                    "overall": { "type": "number" }
                }
            }
        }
    }))
    .build()
}

fn episodic_retrieval() -> Result<Computation, PipelineError> {
    Computation::builder("episodic-retrieval", |previous: Option<&Elaboration>| {
        building_on(
            previous,
            "associative bindings",
            "reconstruct the related episode.\n\
             1. Narrate what happened, when and where.\n\
             2. Name the participants and the key events.\n\
             3. Say how confident each detail is and where there are gaps.",
        )
    })
    .schema(json!({
        "type": "object",
        "properties": {
            "episode": {
                "type": "object",
                "properties": {
                    "narrative": { "type": "string" },
                    "timeframe": { "type": "string" },
                    "location": { "type": "string" },
                    "participants": string_list(),
                    "keyEvents": string_list()
                }
            },
            "confidence": {
                "type": "object",
                "properties": {
                    "overall": { "type": "number" },
                    "details": { "type": "array", "items": { "type": "object" } }
                }
            },
            "gaps": string_list()
        }
    }))
    .build()
}

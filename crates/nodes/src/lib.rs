//! Cogline stage catalogue, generative functions and orchestrator.
//!
//! This crate provides the nine default deterministic stages (Sensation
//! through Episodic Retrieval), the three generative functions built from them
//! (Perception, Comprehension, Recollection), the named paths composed from
//! those functions, and the [`Orchestrator`] that runs a path from an origin.
//!
//! ## Architectural Layer
//!
//! **Orchestration layer.** Everything here is assembled from the building
//! blocks in the [`pipeline`] crate and the injected collaborators
//! ([`pipeline::InferenceBoundary`], [`pipeline::MemorySink`]). No composition
//! rules live here.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`stages`] | `StageCatalog`: the deterministic stages |
//! | [`functions`] | `FunctionCatalog`: the generative functions |
//! | [`orchestrator`] | `Orchestrator` and the named paths |

#![warn(missing_docs)]

pub mod functions;
pub mod orchestrator;
pub mod stages;

pub use functions::FunctionCatalog;
pub use orchestrator::{Orchestrator, PERCEIVE, UNDERSTAND};
pub use stages::StageCatalog;

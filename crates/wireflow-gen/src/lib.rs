//! Text-generation capability consumed by transform and act node handlers.
//!
//! The engine never talks to a model API directly. It goes through a
//! [`GeneratorRegistry`] of named [`GenerationProvider`]s, which always
//! contains the deterministic `"simulation"` provider so that a graph can
//! run with zero external configuration.

pub mod provider;
pub mod registry;
pub mod simulation;
pub mod types;

pub use provider::{DynGenerator, GenerationProvider};
pub use registry::{provider_for_model, GeneratorRegistry};
pub use simulation::SimulationProvider;
pub use types::{GenerateOptions, Generation, TokenUsage};

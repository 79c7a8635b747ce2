//! Constrained menu generation
//!
//! [`GenerationPipeline`] turns a [`GenerationRequest`] into a validated
//! [`crate::menu::MenuBundle`] via two provider calls.

pub mod extract;
pub mod pipeline;
pub mod policy;
pub mod prompts;
pub mod request;

pub use pipeline::{GeneratedBundle, GenerationPipeline, MenuGenerator, PipelineSettings, StageOutput};
pub use policy::CuisineFamily;
pub use request::{GenerationRequest, GenerationRequestBuilder, DEFAULT_TIME_CEILING_MINUTES};

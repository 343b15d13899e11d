//! Document-processing pipeline.
//!
//! One CV moves through `idle -> uploading -> uploaded -> parsing -> parsed`,
//! with `error` as the single failure stage and `reset()` as the only way
//! back to `idle`. Once parsed, enrichment operations (peer comparison, ATS
//! scoring, resume generation, download) attach results to the artifact
//! without leaving the `parsed` stage.
//!
//! `models` holds the serializable state machine, `store` the operations that
//! drive it against the backend.

mod models;
mod store;

pub use models::{CvArtifact, EnrichmentErrors, PipelineState, Stage, is_valid_transition};
pub use store::{GenerateOptions, PipelineStore};

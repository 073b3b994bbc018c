//! Pipeline module.
//!
//! Orchestrates loading, imputation, scaling and writing, with optional
//! progress reporting.

mod builder;
pub mod progress;

pub use builder::{Pipeline, PipelineBuilder};
pub use progress::{ClosureProgressReporter, EtlStage, ProgressReporter, ProgressUpdate};

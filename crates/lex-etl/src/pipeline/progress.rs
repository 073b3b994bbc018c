//! Progress reporting for ETL runs.
//!
//! A run moves through four working stages (load, impute, scale, write) and
//! ends in exactly one terminal stage: `Complete`, `Aborted` (input could not
//! be loaded) or `Failed`.
//!
//! # Example
//!
//! ```rust,ignore
//! use lex_etl::Pipeline;
//!
//! let result = Pipeline::builder()
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?
//!     .run()?;
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EtlStage {
    /// Reading and parsing the input file
    Loading,
    /// Filling missing numeric cells
    Imputation,
    /// Standardizing numeric columns
    Scaling,
    /// Writing the output file
    Writing,
    /// Run finished and output was written
    Complete,
    /// Input could not be loaded; nothing was written
    Aborted,
    /// Run stopped on an error after loading
    Failed,
}

impl EtlStage {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Loading => "Loading Data",
            Self::Imputation => "Imputing Values",
            Self::Scaling => "Scaling Features",
            Self::Writing => "Writing Output",
            Self::Complete => "Complete",
            Self::Aborted => "Aborted",
            Self::Failed => "Failed",
        }
    }

    /// Share of overall progress this stage accounts for.
    ///
    /// Weights are binary fractions so stage boundaries add up exactly.
    pub fn weight(&self) -> f32 {
        match self {
            Self::Loading => 0.125,
            Self::Imputation => 0.375,
            Self::Scaling => 0.375,
            Self::Writing => 0.125,
            Self::Complete | Self::Aborted | Self::Failed => 0.0,
        }
    }

    /// Cumulative progress at the start of this stage.
    pub fn base_progress(&self) -> f32 {
        match self {
            Self::Loading => 0.0,
            Self::Imputation => 0.125,
            Self::Scaling => 0.5,
            Self::Writing => 0.875,
            Self::Complete => 1.0,
            Self::Aborted | Self::Failed => 0.0,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Aborted | Self::Failed)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub stage: EtlStage,

    /// Finer-grained position, e.g. "Column: age"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_stage: Option<String>,

    /// Overall progress (0.0 - 1.0)
    pub progress: f32,

    /// Progress within the current stage (0.0 - 1.0)
    pub stage_progress: f32,

    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub items_processed: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub items_total: Option<usize>,
}

impl ProgressUpdate {
    pub fn new(stage: EtlStage, stage_progress: f32, message: impl Into<String>) -> Self {
        let progress = stage.base_progress() + (stage.weight() * stage_progress);
        Self {
            stage,
            sub_stage: None,
            progress: progress.clamp(0.0, 1.0),
            stage_progress: stage_progress.clamp(0.0, 1.0),
            message: message.into(),
            items_processed: None,
            items_total: None,
        }
    }

    /// Progress through an iterative stage, `current` of `total` items done.
    pub fn with_items(
        stage: EtlStage,
        sub_stage: impl Into<String>,
        current: usize,
        total: usize,
        message: impl Into<String>,
    ) -> Self {
        let stage_progress = if total > 0 {
            current as f32 / total as f32
        } else {
            0.0
        };
        Self {
            sub_stage: Some(sub_stage.into()),
            items_processed: Some(current),
            items_total: Some(total),
            ..Self::new(stage, stage_progress, message)
        }
    }

    pub fn complete(message: impl Into<String>) -> Self {
        Self::terminal(EtlStage::Complete, 1.0, message)
    }

    pub fn aborted(message: impl Into<String>) -> Self {
        Self::terminal(EtlStage::Aborted, 0.0, message)
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::terminal(EtlStage::Failed, 0.0, message)
    }

    fn terminal(stage: EtlStage, progress: f32, message: impl Into<String>) -> Self {
        Self {
            stage,
            sub_stage: None,
            progress,
            stage_progress: progress,
            message: message.into(),
            items_processed: None,
            items_total: None,
        }
    }
}

/// Receives progress updates from a running pipeline.
///
/// Called once per column during imputation and scaling, so implementations
/// should return quickly.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, update: ProgressUpdate);
}

/// [`ProgressReporter`] backed by a closure.
pub struct ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    callback: F,
}

impl<F> ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressReporter for ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    fn report(&self, update: ProgressUpdate) {
        (self.callback)(update);
    }
}

static_assertions::assert_impl_all!(ProgressUpdate: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_progress_update_new() {
        let update = ProgressUpdate::new(EtlStage::Scaling, 0.5, "Scaling...");
        assert_eq!(update.stage, EtlStage::Scaling);
        assert!(update.sub_stage.is_none());
        assert_eq!(update.stage_progress, 0.5);
        assert_eq!(update.progress, 0.6875);
    }

    #[test]
    fn test_progress_update_with_items() {
        let update =
            ProgressUpdate::with_items(EtlStage::Imputation, "Column: age", 1, 4, "Imputing age");
        assert_eq!(update.sub_stage.as_deref(), Some("Column: age"));
        assert_eq!(update.stage_progress, 0.25);
        assert_eq!(update.items_processed, Some(1));
        assert_eq!(update.items_total, Some(4));
    }

    #[test]
    fn test_progress_update_with_zero_items() {
        let update = ProgressUpdate::with_items(EtlStage::Scaling, "none", 0, 0, "Nothing to do");
        assert_eq!(update.stage_progress, 0.0);
        assert_eq!(update.progress, EtlStage::Scaling.base_progress());
    }

    #[test]
    fn test_terminal_updates() {
        assert_eq!(ProgressUpdate::complete("Done").progress, 1.0);

        let aborted = ProgressUpdate::aborted("No data found in input file");
        assert_eq!(aborted.stage, EtlStage::Aborted);
        assert!(aborted.stage.is_terminal());

        assert_eq!(ProgressUpdate::failed("boom").stage, EtlStage::Failed);
        assert!(!EtlStage::Writing.is_terminal());
    }

    #[test]
    fn test_stage_weights_sum() {
        let stages = [
            EtlStage::Loading,
            EtlStage::Imputation,
            EtlStage::Scaling,
            EtlStage::Writing,
        ];

        let total_weight: f32 = stages.iter().map(|s| s.weight()).sum();
        assert!((total_weight - 1.0).abs() < 0.01, "Weights should sum to ~1.0");

        for pair in stages.windows(2) {
            let end = pair[0].base_progress() + pair[0].weight();
            assert!((end - pair[1].base_progress()).abs() < 1e-6);
        }
    }

    #[test]
    fn test_stage_json_values() {
        let stage_expectations = [
            (EtlStage::Loading, "\"loading\""),
            (EtlStage::Imputation, "\"imputation\""),
            (EtlStage::Scaling, "\"scaling\""),
            (EtlStage::Writing, "\"writing\""),
            (EtlStage::Complete, "\"complete\""),
            (EtlStage::Aborted, "\"aborted\""),
            (EtlStage::Failed, "\"failed\""),
        ];

        for (stage, expected_json) in stage_expectations {
            let json = serde_json::to_string(&stage).unwrap();
            assert_eq!(json, expected_json);
        }
    }

    #[test]
    fn test_closure_progress_reporter() {
        let call_count = Arc::new(AtomicUsize::new(0));
        let call_count_clone = call_count.clone();

        let reporter = ClosureProgressReporter::new(move |_update| {
            call_count_clone.fetch_add(1, Ordering::SeqCst);
        });

        reporter.report(ProgressUpdate::new(EtlStage::Loading, 0.0, "Loading"));
        reporter.report(ProgressUpdate::complete("Done"));

        assert_eq!(call_count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_progress_reporter_across_threads() {
        let call_count = Arc::new(AtomicUsize::new(0));
        let call_count_clone = call_count.clone();

        let reporter = Arc::new(ClosureProgressReporter::new(move |_update| {
            call_count_clone.fetch_add(1, Ordering::SeqCst);
        }));

        let reporter_clone = reporter.clone();
        let handle = std::thread::spawn(move || {
            reporter_clone.report(ProgressUpdate::new(EtlStage::Writing, 0.5, "From thread"));
        });

        handle.join().expect("Thread should not panic");
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
    }
}

use crate::error::EtlError;
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Outcome of [`Pipeline::run`](crate::Pipeline::run).
///
/// A run either completes (`success == true`, output written) or is aborted
/// because the input could not be loaded (`success == false`, no output file,
/// `abort_reason` set). Failures after loading are returned as `Err` instead.
#[derive(Debug, Serialize)]
pub struct PipelineResult {
    pub success: bool,
    pub input_path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abort_reason: Option<EtlError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<EtlSummary>,
    /// Rendered first rows of the processed table.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
    /// The processed table, kept in memory for library callers.
    #[serde(skip)]
    pub data: Option<DataFrame>,
}

impl PipelineResult {
    pub fn completed(
        input_path: PathBuf,
        output_path: PathBuf,
        summary: EtlSummary,
        preview: String,
        data: DataFrame,
    ) -> Self {
        Self {
            success: true,
            input_path,
            output_path: Some(output_path),
            abort_reason: None,
            summary: Some(summary),
            preview: Some(preview),
            data: Some(data),
        }
    }

    pub fn aborted(input_path: PathBuf, reason: EtlError) -> Self {
        Self {
            success: false,
            input_path,
            output_path: None,
            abort_reason: Some(reason),
            summary: None,
            preview: None,
            data: None,
        }
    }

    pub fn is_aborted(&self) -> bool {
        !self.success
    }
}

// ============================================================================
// Run Summary Types
// ============================================================================

/// Human-readable summary of what a run did to the table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EtlSummary {
    /// Total execution time in milliseconds.
    pub duration_ms: u64,

    pub rows: usize,
    pub columns: usize,
    /// Number of columns treated as numeric.
    pub numeric_columns: usize,

    /// Missing numeric cells before imputation.
    pub missing_before: usize,
    /// Missing numeric cells after imputation (non-zero only for skipped columns).
    pub missing_after: usize,

    pub actions: Vec<EtlAction>,
    pub column_summaries: Vec<ColumnSummary>,
    pub warnings: Vec<String>,

    /// Local time the run finished, `%Y-%m-%d %H:%M:%S`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
}

impl EtlSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_action(&mut self, action: EtlAction) {
        self.actions.push(action);
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    pub fn add_column_summary(&mut self, summary: ColumnSummary) {
        self.column_summaries.push(summary);
    }

    pub fn column(&self, name: &str) -> Option<&ColumnSummary> {
        self.column_summaries.iter().find(|c| c.name == name)
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut ColumnSummary> {
        self.column_summaries.iter_mut().find(|c| c.name == name)
    }

    /// Number of cells that received an imputed value.
    pub fn cells_imputed(&self) -> usize {
        self.missing_before.saturating_sub(self.missing_after)
    }

    pub fn actions_of(&self, action_type: ActionType) -> impl Iterator<Item = &EtlAction> {
        self.actions
            .iter()
            .filter(move |a| a.action_type == action_type)
    }
}

/// A single action taken during a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EtlAction {
    pub action_type: ActionType,
    /// Column name the action applied to.
    pub target: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl EtlAction {
    pub fn new(
        action_type: ActionType,
        target: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            action_type,
            target: target.into(),
            description: description.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// Missing values were replaced with the column mean.
    ValueImputed,
    /// A column was standardized to zero mean and unit variance.
    DataNormalized,
    /// A constant column was set to all zeros.
    ConstantColumnZeroed,
    /// A numeric column was left unchanged because it had no values.
    ColumnSkipped,
}

impl ActionType {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::ValueImputed => "Value Imputed",
            Self::DataNormalized => "Data Normalized",
            Self::ConstantColumnZeroed => "Constant Column Zeroed",
            Self::ColumnSkipped => "Column Skipped",
        }
    }
}

/// Summary of changes made to a single column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnSummary {
    pub name: String,
    /// Data type as loaded.
    pub original_type: String,
    /// Data type as written.
    pub final_type: String,
    pub numeric: bool,
    pub missing_before: usize,
    pub missing_after: usize,
    /// Mean used to fill missing cells, if any were filled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_value: Option<f64>,
    /// Mean subtracted during scaling.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale_mean: Option<f64>,
    /// Standard deviation divided by during scaling.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale_std: Option<f64>,
    pub constant: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<String>,
}

impl ColumnSummary {
    pub fn new(name: impl Into<String>, original_type: impl Into<String>, numeric: bool) -> Self {
        let original_type = original_type.into();
        Self {
            name: name.into(),
            final_type: original_type.clone(),
            original_type,
            numeric,
            missing_before: 0,
            missing_after: 0,
            fill_value: None,
            scale_mean: None,
            scale_std: None,
            constant: false,
            skip_reason: None,
        }
    }

    pub fn mark_skipped(&mut self, reason: impl Into<String>) {
        self.skip_reason = Some(reason.into());
    }
}

// ============================================================================
// Tests
// ============================================================================

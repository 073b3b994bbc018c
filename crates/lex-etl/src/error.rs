//! Error types for the ETL pipeline.
//!
//! Load failures are split into distinct variants (missing, empty, unreadable)
//! so callers can react to each cause. The pipeline treats all three as a
//! clean abort; write failures always propagate.
//!
//! Errors serialize as `{ code, message }` so they can be embedded in the
//! JSON run report.

use crate::config::ConfigValidationError;
use serde::Serialize;
use serde::ser::SerializeStruct;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for the ETL pipeline.
#[derive(Error, Debug)]
pub enum EtlError {
    /// The input file does not exist.
    #[error("Input file not found: {}", path.display())]
    SourceNotFound { path: PathBuf },

    /// The input file has no parsable rows or columns.
    #[error("CSV file is empty or has no columns to parse: {}", path.display())]
    EmptySource { path: PathBuf },

    /// The input file exists but could not be read or parsed.
    #[error("Failed to read '{}': {reason}", path.display())]
    ReadFailure { path: PathBuf, reason: String },

    /// The output file could not be written.
    #[error("Failed to write '{}': {reason}", path.display())]
    WriteFailure { path: PathBuf, reason: String },

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Column was not found in the table.
    #[error("Column '{0}' not found in dataset")]
    ColumnNotFound(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<EtlError>,
    },
}

impl EtlError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        EtlError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Stable error code for machine-readable output.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::SourceNotFound { .. } => "SOURCE_NOT_FOUND",
            Self::EmptySource { .. } => "EMPTY_SOURCE",
            Self::ReadFailure { .. } => "READ_FAILURE",
            Self::WriteFailure { .. } => "WRITE_FAILURE",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if this error came from the loading stage.
    ///
    /// Load failures abort the run without producing output; they are never
    /// surfaced as a failed run.
    pub fn is_load_failure(&self) -> bool {
        match self {
            Self::SourceNotFound { .. } | Self::EmptySource { .. } | Self::ReadFailure { .. } => {
                true
            }
            Self::WithContext { source, .. } => source.is_load_failure(),
            _ => false,
        }
    }
}

impl From<ConfigValidationError> for EtlError {
    fn from(err: ConfigValidationError) -> Self {
        EtlError::InvalidConfig(err.to_string())
    }
}

impl Serialize for EtlError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("EtlError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for ETL operations.
pub type Result<T> = std::result::Result<T, EtlError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| EtlError::Polars(e).with_context(context))
    }
}

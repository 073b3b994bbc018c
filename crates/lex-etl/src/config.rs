//! Configuration types for the ETL pipeline.
//!
//! The imputation and scaling strategies are fixed (mean, z-score); only the
//! file locations and the CSV dialect are configurable.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_INPUT_PATH: &str = "raw_data.csv";
pub const DEFAULT_OUTPUT_PATH: &str = "clean_data.csv";
pub const DEFAULT_DELIMITER: char = ',';
pub const DEFAULT_PREVIEW_ROWS: usize = 5;

/// Configuration for a single pipeline run.
///
/// Use [`PipelineConfig::builder()`] to create a validated configuration.
///
/// # Example
///
/// ```rust,ignore
/// use lex_etl::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .input_path("data/raw_data.csv")
///     .output_path("data/clean_data.csv")
///     .preview_rows(10)
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Delimited text file to read.
    /// Default: "raw_data.csv"
    pub input_path: PathBuf,

    /// Destination of the cleaned table. Parent directories are created.
    /// Default: "clean_data.csv"
    pub output_path: PathBuf,

    /// Field delimiter for both reading and writing. Must be a single ASCII character.
    /// Default: ','
    pub delimiter: char,

    /// Drop spaces that immediately follow a delimiter when reading.
    /// Default: true
    pub skip_initial_space: bool,

    /// Number of rows polars scans to infer column types.
    /// `None` scans the whole file.
    /// Default: None
    #[serde(default)]
    pub infer_schema_length: Option<usize>,

    /// Number of rows included in the final preview.
    /// Default: 5
    pub preview_rows: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from(DEFAULT_INPUT_PATH),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            delimiter: DEFAULT_DELIMITER,
            skip_initial_space: true,
            infer_schema_length: None,
            preview_rows: DEFAULT_PREVIEW_ROWS,
        }
    }
}

impl PipelineConfig {
    /// Create a new configuration builder.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// The delimiter as the byte polars expects.
    ///
    /// Only meaningful after [`validate`](Self::validate) has accepted the config.
    pub fn delimiter_byte(&self) -> u8 {
        self.delimiter as u8
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.input_path.as_os_str().is_empty() {
            return Err(ConfigValidationError::EmptyPath("input_path".to_string()));
        }

        if self.output_path.as_os_str().is_empty() {
            return Err(ConfigValidationError::EmptyPath("output_path".to_string()));
        }

        if self.input_path == self.output_path {
            return Err(ConfigValidationError::SameInputOutput(self.input_path.clone()));
        }

        if !self.delimiter.is_ascii() || matches!(self.delimiter, '"' | '\r' | '\n') {
            return Err(ConfigValidationError::InvalidDelimiter(self.delimiter));
        }

        if self.infer_schema_length == Some(0) {
            return Err(ConfigValidationError::InvalidInferSchemaLength(0));
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Path for '{0}' must not be empty")]
    EmptyPath(String),

    #[error("Input and output paths must differ: {}", .0.display())]
    SameInputOutput(PathBuf),

    #[error("Invalid delimiter {0:?} (must be a single ASCII character other than a quote or newline)")]
    InvalidDelimiter(char),

    #[error("Invalid schema inference length: {0} (must be at least 1)")]
    InvalidInferSchemaLength(usize),
}

/// Builder for [`PipelineConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    input_path: Option<PathBuf>,
    output_path: Option<PathBuf>,
    delimiter: Option<char>,
    skip_initial_space: Option<bool>,
    infer_schema_length: Option<usize>,
    preview_rows: Option<usize>,
}

impl PipelineConfigBuilder {
    /// Set the file to read.
    pub fn input_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.input_path = Some(path.into());
        self
    }

    /// Set the file to write.
    pub fn output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }

    /// Set the field delimiter used for reading and writing.
    pub fn delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    /// Enable or disable skipping spaces after delimiters.
    pub fn skip_initial_space(mut self, skip: bool) -> Self {
        self.skip_initial_space = Some(skip);
        self
    }

    /// Limit type inference to the first `rows` rows instead of the whole file.
    pub fn infer_schema_length(mut self, rows: usize) -> Self {
        self.infer_schema_length = Some(rows);
        self
    }

    /// Set how many rows the final preview shows.
    pub fn preview_rows(mut self, rows: usize) -> Self {
        self.preview_rows = Some(rows);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `PipelineConfig` or an error if validation fails.
    pub fn build(self) -> Result<PipelineConfig, ConfigValidationError> {
        let config = PipelineConfig {
            input_path: self
                .input_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_INPUT_PATH)),
            output_path: self
                .output_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_PATH)),
            delimiter: self.delimiter.unwrap_or(DEFAULT_DELIMITER),
            skip_initial_space: self.skip_initial_space.unwrap_or(true),
            infer_schema_length: self.infer_schema_length,
            preview_rows: self.preview_rows.unwrap_or(DEFAULT_PREVIEW_ROWS),
        };

        config.validate()?;
        Ok(config)
    }
}

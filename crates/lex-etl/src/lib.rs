//! Batch CSV Cleaning Library
//!
//! A small, synchronous ETL pipeline built on Polars: load a delimited file,
//! fill missing numeric cells with the column mean, standardize numeric
//! columns to zero mean and unit variance, and write the result.
//!
//! # Overview
//!
//! - **Loading**: header row, inferred column types, tolerant of a space after
//!   the delimiter. Missing, empty or unreadable input is reported as a typed
//!   [`EtlError`] and aborts the run without writing anything.
//! - **Imputation**: per-column mean of the present values ([`MeanImputer`]).
//! - **Scaling**: z-score with population standard deviation
//!   ([`StandardScaler`]). Constant columns become all zeros.
//! - **Writing**: header plus rows, no index column ([`CsvExporter`]).
//! - **Progress Reporting**: per-stage and per-column updates.
//!
//! Non-numeric columns pass through untouched.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use lex_etl::{Pipeline, PipelineConfig};
//!
//! let config = PipelineConfig::builder()
//!     .input_path("raw_data.csv")
//!     .output_path("clean_data.csv")
//!     .build()?;
//!
//! let result = Pipeline::builder()
//!     .config(config)
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?
//!     .run()?;
//!
//! match result.abort_reason {
//!     Some(reason) => println!("ETL process aborted: {}", reason),
//!     None => println!("{}", result.preview.unwrap_or_default()),
//! }
//! ```
//!
//! # In-memory use
//!
//! ```rust,ignore
//! use lex_etl::Pipeline;
//! use polars::prelude::*;
//!
//! let df = df!["a" => [Some(1.0), None, Some(3.0)]]?;
//! let (scaled, summary) = Pipeline::builder().build()?.process(df)?;
//! assert_eq!(summary.cells_imputed(), 1);
//! ```

pub mod config;
pub mod error;
pub mod imputers;
pub mod io;
pub mod pipeline;
pub mod scaling;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use config::{ConfigValidationError, PipelineConfig, PipelineConfigBuilder};
pub use error::{EtlError, Result as EtlResult, ResultExt};
pub use imputers::{ImputationReport, ImputationStats, MeanImputer};
pub use io::{CsvExporter, CsvLoader};
pub use pipeline::{
    ClosureProgressReporter, EtlStage, Pipeline, PipelineBuilder, ProgressReporter, ProgressUpdate,
};
pub use scaling::{ScalingReport, ScalingStats, StandardScaler};
pub use types::{ActionType, ColumnSummary, EtlAction, EtlSummary, PipelineResult};
pub use utils::{is_numeric_dtype, numeric_column_names};

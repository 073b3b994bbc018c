//! The ETL pipeline and its builder.
//!
//! [`Pipeline::run`] reads the configured input file, fills missing numeric
//! cells, standardizes numeric columns and writes the result.
//! [`Pipeline::process`] runs only the in-memory transform.

use crate::config::{ConfigValidationError, PipelineConfig};
use crate::error::{Result, ResultExt};
use crate::imputers::MeanImputer;
use crate::io::{CsvExporter, CsvLoader};
use crate::pipeline::progress::{ClosureProgressReporter, EtlStage, ProgressReporter, ProgressUpdate};
use crate::scaling::StandardScaler;
use crate::types::{ActionType, ColumnSummary, EtlAction, EtlSummary, PipelineResult};
use crate::utils::{
    column_missing, is_numeric_dtype, missing_cells, numeric_column_names, preview,
};
use polars::prelude::*;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// Batch CSV cleaning pipeline.
///
/// # Example
///
/// ```rust,ignore
/// use lex_etl::{Pipeline, PipelineConfig};
///
/// let config = PipelineConfig::builder()
///     .input_path("data/raw.csv")
///     .output_path("data/clean.csv")
///     .build()?;
///
/// let result = Pipeline::builder().config(config).build()?.run()?;
/// if !result.success {
///     eprintln!("aborted: {:?}", result.abort_reason);
/// }
/// ```
pub struct Pipeline {
    config: PipelineConfig,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
    loader: CsvLoader,
    imputer: MeanImputer,
    scaler: StandardScaler,
    exporter: CsvExporter,
}

static_assertions::assert_impl_all!(Pipeline: Send);

impl Pipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Load, transform and write the configured files.
    ///
    /// A load failure aborts the run: nothing is written and the returned
    /// result has `success == false` with the typed reason attached.
    ///
    /// # Errors
    ///
    /// Returns `Err` if writing the output fails or a transform step fails
    /// after the input was loaded.
    pub fn run(&self) -> Result<PipelineResult> {
        match self.run_internal() {
            Ok(result) => {
                if result.success {
                    self.report_progress(ProgressUpdate::complete("ETL process completed"));
                }
                Ok(result)
            }
            Err(e) => {
                self.report_progress(ProgressUpdate::failed(e.to_string()));
                error!("ETL process failed: {}", e);
                Err(e)
            }
        }
    }

    /// Run the in-memory transform (imputation then scaling) on `df`.
    pub fn process(&self, df: DataFrame) -> Result<(DataFrame, EtlSummary)> {
        let start_time = Instant::now();
        let (df, mut summary) = self.transform(df)?;
        summary.duration_ms = start_time.elapsed().as_millis() as u64;
        Ok((df, summary))
    }

    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }

    fn run_internal(&self) -> Result<PipelineResult> {
        let start_time = Instant::now();
        let input_path = self.config.input_path.clone();

        self.report_progress(ProgressUpdate::new(
            EtlStage::Loading,
            0.0,
            format!("Reading {}", input_path.display()),
        ));

        let df = match self.loader.load(&input_path) {
            Ok(df) => df,
            Err(e) if e.is_load_failure() => {
                error!("ETL process aborted: {}", e);
                self.report_progress(ProgressUpdate::aborted(e.to_string()));
                return Ok(PipelineResult::aborted(input_path, e));
            }
            Err(e) => return Err(e),
        };

        self.report_progress(ProgressUpdate::new(
            EtlStage::Loading,
            1.0,
            format!("Loaded {} rows x {} columns", df.height(), df.width()),
        ));

        let (mut df, mut summary) = self.transform(df)?;

        let output_path = self.config.output_path.clone();
        self.report_progress(ProgressUpdate::new(
            EtlStage::Writing,
            0.0,
            format!("Writing {}", output_path.display()),
        ));
        self.exporter.write(&mut df, &output_path)?;
        self.report_progress(ProgressUpdate::new(EtlStage::Writing, 1.0, "Output written"));

        summary.duration_ms = start_time.elapsed().as_millis() as u64;
        summary.completed_at = Some(chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string());

        let preview = preview(&df, self.config.preview_rows);
        info!("ETL process completed successfully.");
        info!("Processed Data Preview:\n{}", preview);

        Ok(PipelineResult::completed(
            input_path,
            output_path,
            summary,
            preview,
            df,
        ))
    }

    fn transform(&self, mut df: DataFrame) -> Result<(DataFrame, EtlSummary)> {
        let numeric = numeric_column_names(&df);

        let mut summary = EtlSummary::new();
        summary.rows = df.height();
        summary.columns = df.width();
        summary.numeric_columns = numeric.len();
        summary.missing_before = missing_cells(&df, &numeric);

        for column in df.get_columns() {
            let mut col_summary = ColumnSummary::new(
                column.name().as_str(),
                column.dtype().to_string(),
                is_numeric_dtype(column.dtype()),
            );
            col_summary.missing_before = column_missing(column);
            summary.add_column_summary(col_summary);
        }

        if numeric.is_empty() {
            info!("No numeric columns found; table left unchanged");
        }

        self.impute(&mut df, &numeric, &mut summary)?;
        self.scale(&mut df, &numeric, &mut summary)?;

        summary.missing_after = missing_cells(&df, &numeric);
        for column in df.get_columns() {
            if let Some(col_summary) = summary.column_mut(column.name().as_str()) {
                col_summary.final_type = column.dtype().to_string();
                col_summary.missing_after = column_missing(column);
            }
        }

        Ok((df, summary))
    }

    fn impute(&self, df: &mut DataFrame, numeric: &[String], summary: &mut EtlSummary) -> Result<()> {
        let total = numeric.len();

        for (i, name) in numeric.iter().enumerate() {
            self.report_progress(ProgressUpdate::with_items(
                EtlStage::Imputation,
                format!("Column: {}", name),
                i,
                total,
                format!("Imputing missing values in '{}'", name),
            ));

            let imputed = self
                .imputer
                .impute_column(df, name)
                .context(format!("Imputing column '{}'", name))?;

            match imputed {
                Some(stats) if stats.missing > 0 => {
                    summary.add_action(
                        EtlAction::new(
                            ActionType::ValueImputed,
                            name,
                            format!("Filled {} missing values with the column mean", stats.missing),
                        )
                        .with_details(format!("mean = {:.4}", stats.mean)),
                    );
                    if let Some(col_summary) = summary.column_mut(name) {
                        col_summary.fill_value = Some(stats.mean);
                    }
                }
                Some(_) => {}
                None => {
                    let reason = "no present values; mean is undefined";
                    summary.add_warning(format!("Column '{}' left unchanged: {}", name, reason));
                    summary.add_action(EtlAction::new(ActionType::ColumnSkipped, name, reason));
                    if let Some(col_summary) = summary.column_mut(name) {
                        col_summary.mark_skipped(reason);
                    }
                }
            }
        }

        self.report_progress(ProgressUpdate::new(EtlStage::Imputation, 1.0, "Imputation complete"));
        Ok(())
    }

    fn scale(&self, df: &mut DataFrame, numeric: &[String], summary: &mut EtlSummary) -> Result<()> {
        let total = numeric.len();

        for (i, name) in numeric.iter().enumerate() {
            self.report_progress(ProgressUpdate::with_items(
                EtlStage::Scaling,
                format!("Column: {}", name),
                i,
                total,
                format!("Standardizing '{}'", name),
            ));

            // Columns skipped during imputation are already recorded.
            let scaled = self
                .scaler
                .scale_column(df, name)
                .context(format!("Scaling column '{}'", name))?;
            let Some(stats) = scaled else {
                continue;
            };

            let constant = stats.is_constant();
            if let Some(col_summary) = summary.column_mut(name) {
                col_summary.scale_mean = Some(stats.mean);
                col_summary.scale_std = Some(stats.std_dev);
                col_summary.constant = constant;
            }

            if constant {
                warn!("Column '{}' has zero variance", name);
                summary.add_warning(format!(
                    "Column '{}' is constant; all values set to 0",
                    name
                ));
                summary.add_action(
                    EtlAction::new(ActionType::ConstantColumnZeroed, name, "Constant column set to 0")
                        .with_details(format!("value = {}", stats.mean)),
                );
            } else {
                summary.add_action(
                    EtlAction::new(
                        ActionType::DataNormalized,
                        name,
                        "Standardized to zero mean and unit variance",
                    )
                    .with_details(format!("mean = {:.4}, std = {:.4}", stats.mean, stats.std_dev)),
                );
            }
        }

        self.report_progress(ProgressUpdate::new(EtlStage::Scaling, 1.0, "Scaling complete"));
        Ok(())
    }
}

/// Builder for [`Pipeline`].
#[derive(Default)]
pub struct PipelineBuilder {
    config: Option<PipelineConfig>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

static_assertions::assert_impl_all!(PipelineBuilder: Send);

impl PipelineBuilder {
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Set a progress callback closure.
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    /// Build the pipeline, validating the configuration.
    pub fn build(self) -> std::result::Result<Pipeline, ConfigValidationError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        Ok(Pipeline {
            loader: CsvLoader::from_config(&config),
            exporter: CsvExporter::from_config(&config),
            imputer: MeanImputer,
            scaler: StandardScaler,
            progress_reporter: self.progress_reporter,
            config,
        })
    }
}

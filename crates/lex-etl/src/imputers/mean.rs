//! Mean imputation for numeric columns.
//!
//! Two passes per column: [`column_mean`] summarizes the present values and
//! [`fill_missing`] rewrites the column using that summary. Every imputed
//! column is emitted as `Float64`.

use crate::error::{EtlError, Result};
use crate::utils::{numeric_column_names, series_to_f64};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Summary of a numeric column's present values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImputationStats {
    /// Arithmetic mean of the non-missing values.
    pub mean: f64,
    /// Number of non-missing cells.
    pub present: usize,
    /// Number of missing cells.
    pub missing: usize,
}

/// Compute the mean of the present values of a numeric series.
///
/// Returns `None` when every cell is missing, since the mean is undefined.
pub fn column_mean(series: &Series) -> PolarsResult<Option<ImputationStats>> {
    let values = series_to_f64(series)?;

    let mut sum = 0.0;
    let mut present = 0usize;
    for value in values.iter().flatten() {
        sum += value;
        present += 1;
    }

    if present == 0 {
        return Ok(None);
    }

    Ok(Some(ImputationStats {
        mean: sum / present as f64,
        present,
        missing: values.len() - present,
    }))
}

/// Replace every missing cell with `fill_value`.
pub fn fill_missing(series: &Series, fill_value: f64) -> PolarsResult<Series> {
    let filled: Vec<f64> = series_to_f64(series)?
        .into_iter()
        .map(|value| value.unwrap_or(fill_value))
        .collect();

    Ok(Series::new(series.name().clone(), filled))
}

/// Imputation applied to one column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnImputation {
    pub column: String,
    pub stats: ImputationStats,
}

/// What [`MeanImputer::impute`] did to a table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImputationReport {
    /// Numeric columns that were processed, in table order.
    pub columns: Vec<ColumnImputation>,
    /// Numeric columns with no present values, left untouched.
    pub skipped: Vec<String>,
}

impl ImputationReport {
    /// Total number of cells that received the column mean.
    pub fn cells_filled(&self) -> usize {
        self.columns.iter().map(|c| c.stats.missing).sum()
    }
}

/// Fills missing numeric cells with the per-column mean.
///
/// Non-numeric columns are never touched. A numeric column with no present
/// values is left as-is and reported in [`ImputationReport::skipped`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MeanImputer;

impl MeanImputer {
    /// Impute every numeric column of `df`.
    pub fn impute(&self, mut df: DataFrame) -> Result<(DataFrame, ImputationReport)> {
        let mut report = ImputationReport::default();

        for col_name in numeric_column_names(&df) {
            match self.impute_column(&mut df, &col_name)? {
                Some(stats) => report.columns.push(ColumnImputation {
                    column: col_name,
                    stats,
                }),
                None => report.skipped.push(col_name),
            }
        }

        Ok((df, report))
    }

    /// Impute a single column in place.
    ///
    /// Returns `None` if the column has no present values.
    pub fn impute_column(&self, df: &mut DataFrame, col_name: &str) -> Result<Option<ImputationStats>> {
        let series = df
            .column(col_name)
            .map_err(|_| EtlError::ColumnNotFound(col_name.to_string()))?
            .as_materialized_series()
            .clone();

        let Some(stats) = column_mean(&series)? else {
            warn!(
                "Column '{}' has no present values; mean is undefined, leaving it unchanged",
                col_name
            );
            return Ok(None);
        };

        let filled = fill_missing(&series, stats.mean)?;
        df.replace(col_name, filled)?;

        if stats.missing > 0 {
            debug!(
                "Filled {} missing values in '{}' with mean {:.4}",
                stats.missing, col_name, stats.mean
            );
        }

        Ok(Some(stats))
    }
}

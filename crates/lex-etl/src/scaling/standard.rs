//! Standard scaling (z-score normalization).
//!
//! Each value `x` of a numeric column becomes
//!
//! ```text
//! z = (x - u) / s
//! ```
//!
//! where `u` is the column mean and `s` the population standard deviation
//! (ddof = 0). A constant column has no spread to divide by; all of its
//! values become exactly `0.0`.

use crate::error::{EtlError, Result};
use crate::utils::{numeric_column_names, series_to_f64};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Mean and spread of a numeric column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalingStats {
    pub mean: f64,
    /// Population standard deviation.
    pub std_dev: f64,
    /// Number of present values the statistics were computed over.
    pub count: usize,
}

impl ScalingStats {
    /// Compute statistics over the present values of a numeric series.
    ///
    /// Returns `None` when the series has no present values.
    pub fn compute(series: &Series) -> PolarsResult<Option<Self>> {
        let values: Vec<f64> = series_to_f64(series)?.into_iter().flatten().collect();
        Ok(Self::from_values(&values))
    }

    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let count = values.len();
        let mean = values.iter().sum::<f64>() / count as f64;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;

        Some(Self {
            mean,
            std_dev: variance.sqrt(),
            count,
        })
    }

    /// Whether the spread is indistinguishable from rounding noise in the mean.
    pub fn is_constant(&self) -> bool {
        let tolerance = (self.count as f64).max(10.0) * f64::EPSILON * self.mean.abs();
        self.std_dev <= tolerance
    }

    /// Standardize a single value.
    #[inline]
    pub fn apply(&self, value: f64) -> f64 {
        if self.is_constant() {
            0.0
        } else {
            (value - self.mean) / self.std_dev
        }
    }
}

/// Rewrite a numeric series with precomputed statistics.
///
/// Missing cells stay missing. The result is always `Float64`.
pub fn standardize(series: &Series, stats: &ScalingStats) -> PolarsResult<Series> {
    let scaled: Vec<Option<f64>> = series_to_f64(series)?
        .into_iter()
        .map(|value| value.map(|v| stats.apply(v)))
        .collect();

    Ok(Series::new(series.name().clone(), scaled))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnScaling {
    pub column: String,
    pub stats: ScalingStats,
    pub constant: bool,
}

/// What [`StandardScaler::scale`] did to a table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScalingReport {
    pub columns: Vec<ColumnScaling>,
    /// Numeric columns with no present values, left untouched.
    pub skipped: Vec<String>,
}

impl ScalingReport {
    pub fn constant_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.constant)
            .map(|c| c.column.as_str())
            .collect()
    }
}

/// Standardizes numeric columns to zero mean and unit variance.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardScaler;

impl StandardScaler {
    /// Scale every numeric column of `df`.
    pub fn scale(&self, mut df: DataFrame) -> Result<(DataFrame, ScalingReport)> {
        let mut report = ScalingReport::default();

        for col_name in numeric_column_names(&df) {
            match self.scale_column(&mut df, &col_name)? {
                Some(stats) => report.columns.push(ColumnScaling {
                    column: col_name,
                    constant: stats.is_constant(),
                    stats,
                }),
                None => report.skipped.push(col_name),
            }
        }

        Ok((df, report))
    }

    /// Scale a single column in place.
    ///
    /// Returns `None` if the column has no present values.
    pub fn scale_column(&self, df: &mut DataFrame, col_name: &str) -> Result<Option<ScalingStats>> {
        let series = df
            .column(col_name)
            .map_err(|_| EtlError::ColumnNotFound(col_name.to_string()))?
            .as_materialized_series()
            .clone();

        let Some(stats) = ScalingStats::compute(&series)? else {
            warn!("Column '{}' has no present values; skipping scaling", col_name);
            return Ok(None);
        };

        if stats.is_constant() {
            warn!(
                "Column '{}' is constant ({}); setting all values to 0",
                col_name, stats.mean
            );
        }

        let scaled = standardize(&series, &stats)?;
        df.replace(col_name, scaled)?;

        debug!(
            "Scaled '{}' (mean={:.4}, std={:.4})",
            col_name, stats.mean, stats.std_dev
        );

        Ok(Some(stats))
    }
}

//! Shared utilities for the ETL pipeline.
//!
//! Column classification and value extraction used by both the imputer and
//! the scaler.

use polars::prelude::*;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Names of the numeric columns, in table order.
pub fn numeric_column_names(df: &DataFrame) -> Vec<String> {
    df.get_columns()
        .iter()
        .filter(|col| is_numeric_dtype(col.dtype()))
        .map(|col| col.name().to_string())
        .collect()
}

/// Total number of missing cells across the given columns.
pub fn missing_cells(df: &DataFrame, columns: &[String]) -> usize {
    columns
        .iter()
        .filter_map(|name| df.column(name).ok())
        .map(column_missing)
        .sum()
}

/// Number of missing cells in one column.
///
/// In numeric columns a float `NaN` counts as missing alongside nulls.
pub fn column_missing(column: &Column) -> usize {
    let series = column.as_materialized_series();
    if !is_numeric_dtype(series.dtype()) {
        return series.null_count();
    }
    series_to_f64(series)
        .map(|values| values.iter().filter(|v| v.is_none()).count())
        .unwrap_or_else(|_| series.null_count())
}

// =============================================================================
// Series Utilities
// =============================================================================

/// Read a numeric Series as `f64` values, keeping missing cells as `None`.
///
/// `NaN` is read as missing so it never reaches a mean or a variance.
pub fn series_to_f64(series: &Series) -> PolarsResult<Vec<Option<f64>>> {
    let float_series = series.cast(&DataType::Float64)?;
    let values = float_series
        .f64()?
        .into_iter()
        .map(|value| value.filter(|v| !v.is_nan()))
        .collect();
    Ok(values)
}

/// Render the first `rows` rows of a table for display.
pub fn preview(df: &DataFrame, rows: usize) -> String {
    format!("{}", df.head(Some(rows)))
}

// =============================================================================
// Tests
// =============================================================================

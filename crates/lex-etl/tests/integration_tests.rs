//! Integration tests for the ETL pipeline.
//!
//! Each test runs the full load -> impute -> scale -> write sequence against a
//! fixture file and inspects the written output.

use approx::assert_abs_diff_eq;
use lex_etl::{
    ActionType, EtlError, EtlStage, Pipeline, PipelineConfig, PipelineResult, numeric_column_names,
};
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use pretty_assertions::assert_eq;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn read_csv(path: &Path) -> DataFrame {
    CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .expect("Failed to create CSV reader")
        .finish()
        .expect("Failed to read CSV file")
}

fn f64_column(df: &DataFrame, name: &str) -> Vec<Option<f64>> {
    df.column(name)
        .unwrap()
        .as_materialized_series()
        .cast(&DataType::Float64)
        .unwrap()
        .f64()
        .unwrap()
        .into_iter()
        .collect()
}

fn mean_and_std(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

fn config(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> PipelineConfig {
    PipelineConfig::builder()
        .input_path(input)
        .output_path(output)
        .build()
        .unwrap()
}

fn run_fixture(fixture: &str, dir: &TempDir) -> (PipelineResult, PathBuf) {
    let output = dir.path().join("clean_data.csv");
    let result = Pipeline::builder()
        .config(config(fixtures_path().join(fixture), &output))
        .build()
        .unwrap()
        .run()
        .unwrap();
    (result, output)
}

// ============================================================================
// End-to-end scenario
// ============================================================================

#[test]
fn test_scenario_imputes_then_scales() {
    let dir = tempfile::tempdir().unwrap();
    let (result, output) = run_fixture("scenario.csv", &dir);

    assert!(result.success);
    assert_eq!(result.output_path.as_deref(), Some(output.as_path()));

    let df = read_csv(&output);
    assert_eq!(df.height(), 3);
    assert_eq!(df.get_column_names_str(), vec!["a", "b"]);

    let a: Vec<f64> = f64_column(&df, "a").into_iter().flatten().collect();
    assert_eq!(a.len(), 3);
    assert_abs_diff_eq!(a[0], -1.224_744_871, epsilon = 1e-6);
    assert_abs_diff_eq!(a[1], 0.0, epsilon = 1e-9);
    assert_abs_diff_eq!(a[2], 1.224_744_871, epsilon = 1e-6);

    let b: Vec<Option<&str>> = df
        .column("b")
        .unwrap()
        .as_materialized_series()
        .str()
        .unwrap()
        .into_iter()
        .collect();
    assert_eq!(b, vec![Some("x"), Some("y"), Some("z")]);
}

#[test]
fn test_output_layout_has_header_and_no_index() {
    let dir = tempfile::tempdir().unwrap();
    let (_, output) = run_fixture("scenario.csv", &dir);

    let text = std::fs::read_to_string(&output).unwrap();
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], "a,b");
    assert!(lines[1..].iter().all(|line| line.split(',').count() == 2));
}

#[test]
fn test_result_carries_summary_and_preview() {
    let dir = tempfile::tempdir().unwrap();
    let (result, _) = run_fixture("scenario.csv", &dir);

    let summary = result.summary.as_ref().unwrap();
    assert_eq!(summary.rows, 3);
    assert_eq!(summary.columns, 2);
    assert_eq!(summary.cells_imputed(), 1);
    assert!(summary.completed_at.is_some());

    let preview = result.preview.as_ref().unwrap();
    assert!(preview.contains("shape: (3, 2)"));

    let data = result.data.as_ref().unwrap();
    assert_eq!(data.shape(), (3, 2));
}

// ============================================================================
// Abort paths
// ============================================================================

#[test]
fn test_empty_input_aborts_without_output() {
    let dir = tempfile::tempdir().unwrap();
    let (result, output) = run_fixture("empty.csv", &dir);

    assert!(!result.success);
    assert!(matches!(result.abort_reason, Some(EtlError::EmptySource { .. })));
    assert!(result.summary.is_none());
    assert!(!output.exists(), "No output file should be written");
}

#[test]
fn test_header_only_input_aborts() {
    let dir = tempfile::tempdir().unwrap();
    let (result, output) = run_fixture("header_only.csv", &dir);

    assert!(result.is_aborted());
    assert_eq!(
        result.abort_reason.as_ref().map(|e| e.error_code()),
        Some("EMPTY_SOURCE")
    );
    assert!(!output.exists());
}

#[test]
fn test_missing_input_aborts() {
    let dir = tempfile::tempdir().unwrap();
    let (result, output) = run_fixture("does_not_exist.csv", &dir);

    assert!(result.is_aborted());
    assert!(matches!(result.abort_reason, Some(EtlError::SourceNotFound { .. })));
    assert!(!output.exists());
}

#[test]
fn test_aborted_run_reports_aborted_stage() {
    let dir = tempfile::tempdir().unwrap();
    let stages = Arc::new(Mutex::new(Vec::new()));
    let stages_clone = stages.clone();

    let result = Pipeline::builder()
        .config(config(fixtures_path().join("empty.csv"), dir.path().join("out.csv")))
        .on_progress(move |update| stages_clone.lock().unwrap().push(update.stage))
        .build()
        .unwrap()
        .run()
        .unwrap();

    assert!(!result.success);
    let stages = stages.lock().unwrap();
    assert_eq!(stages.last(), Some(&EtlStage::Aborted));
    assert!(!stages.contains(&EtlStage::Complete));
    assert!(!stages.contains(&EtlStage::Writing));
}

#[test]
fn test_write_failure_propagates() {
    let dir = tempfile::tempdir().unwrap();
    let stages = Arc::new(Mutex::new(Vec::new()));
    let stages_clone = stages.clone();

    // The destination is an existing directory, so it cannot be opened as a file.
    let result = Pipeline::builder()
        .config(config(fixtures_path().join("scenario.csv"), dir.path()))
        .on_progress(move |update| stages_clone.lock().unwrap().push(update.stage))
        .build()
        .unwrap()
        .run();

    let err = result.unwrap_err();
    assert_eq!(err.error_code(), "WRITE_FAILURE");
    assert!(!err.is_load_failure());
    assert_eq!(stages.lock().unwrap().last(), Some(&EtlStage::Failed));
}

// ============================================================================
// Column policies
// ============================================================================

#[test]
fn test_constant_column_becomes_zero() {
    let dir = tempfile::tempdir().unwrap();
    let (result, output) = run_fixture("constant.csv", &dir);

    let df = read_csv(&output);
    let value: Vec<f64> = f64_column(&df, "value").into_iter().flatten().collect();
    assert_eq!(value, vec![0.0, 0.0, 0.0, 0.0]);

    let id: Vec<f64> = f64_column(&df, "id").into_iter().flatten().collect();
    assert!(id.iter().all(|v| v.is_finite()));

    let summary = result.summary.unwrap();
    assert!(summary.column("value").unwrap().constant);
    assert_eq!(summary.actions_of(ActionType::ConstantColumnZeroed).count(), 1);
}

#[test]
fn test_strings_only_table_is_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let (result, output) = run_fixture("strings_only.csv", &dir);

    assert!(result.success);
    let original = read_csv(&fixtures_path().join("strings_only.csv"));
    let written = read_csv(&output);

    assert!(written.equals_missing(&original));
    assert_eq!(result.summary.unwrap().numeric_columns, 0);
}

#[test]
fn test_space_after_delimiter_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let (result, output) = run_fixture("spaced.csv", &dir);

    assert!(result.success);
    let df = read_csv(&output);
    assert_eq!(df.get_column_names_str(), vec!["height", "weight", "name"]);

    for column in ["height", "weight"] {
        let values = f64_column(&df, column);
        assert_eq!(values.iter().filter(|v| v.is_none()).count(), 0);
    }

    let names: Vec<Option<&str>> = df
        .column("name")
        .unwrap()
        .as_materialized_series()
        .str()
        .unwrap()
        .into_iter()
        .collect();
    assert_eq!(names, vec![Some("ann"), Some("bo"), Some("cy")]);
}

// ============================================================================
// Missing markers and type inference
// ============================================================================

#[test]
fn test_textual_missing_markers_are_imputed() {
    let dir = tempfile::tempdir().unwrap();
    let (result, output) = run_fixture("missing_markers.csv", &dir);

    assert!(result.success);
    let summary = result.summary.unwrap();
    assert_eq!(summary.numeric_columns, 3);
    assert_eq!(summary.missing_before, 5);
    assert_eq!(summary.missing_after, 0);
    assert_eq!(summary.column("reading").unwrap().fill_value, Some(12.0));
    assert_eq!(summary.column("level").unwrap().fill_value, Some(5.0));

    let df = read_csv(&output);
    assert_eq!(df.column("level").unwrap().dtype(), &DataType::Float64);

    let reading: Vec<f64> = f64_column(&df, "reading").into_iter().flatten().collect();
    assert_eq!(reading.len(), 5);
    for i in [1, 2, 4] {
        assert_abs_diff_eq!(reading[i], 0.0, epsilon = 1e-9);
    }

    let level: Vec<f64> = f64_column(&df, "level").into_iter().flatten().collect();
    assert_eq!(level.len(), 5);
    assert_abs_diff_eq!(level[1], 0.0, epsilon = 1e-9);
    assert_abs_diff_eq!(level[3], 0.0, epsilon = 1e-9);

    // A marker in a text column is a missing text cell.
    assert_eq!(df.column("label").unwrap().null_count(), 1);
}

#[test]
fn test_late_float_widens_integer_column() {
    let dir = tempfile::tempdir().unwrap();
    let (result, output) = run_fixture("late_float.csv", &dir);

    assert!(result.success, "abort reason: {:?}", result.abort_reason);
    let summary = result.summary.unwrap();
    assert_eq!(summary.rows, 151);
    assert_eq!(summary.numeric_columns, 2);
    assert_eq!(summary.cells_imputed(), 1);

    let df = read_csv(&output);
    assert_eq!(df.height(), 151);
    let count = f64_column(&df, "count");
    assert!(count.iter().all(Option::is_some));
}

#[test]
fn test_numeric_output_is_always_finite() {
    for fixture in [
        "scenario.csv",
        "sensors.csv",
        "constant.csv",
        "spaced.csv",
        "missing_markers.csv",
        "late_float.csv",
    ] {
        let dir = tempfile::tempdir().unwrap();
        let (result, _) = run_fixture(fixture, &dir);
        let data = result.data.unwrap();

        for column in numeric_column_names(&data) {
            let values = f64_column(&data, &column);
            assert!(
                values.iter().all(|v| v.is_some_and(f64::is_finite)),
                "{}: column '{}' has a missing, NaN or infinite cell",
                fixture,
                column
            );
        }
    }
}

// ============================================================================
// Statistical properties
// ============================================================================

#[test]
fn test_numeric_columns_standardized() {
    let dir = tempfile::tempdir().unwrap();
    let (result, output) = run_fixture("sensors.csv", &dir);

    let summary = result.summary.unwrap();
    assert_eq!(summary.numeric_columns, 3);
    assert_eq!(summary.missing_before, 4);
    assert_eq!(summary.missing_after, 0);

    let df = read_csv(&output);
    assert_eq!(df.height(), 8);

    for column in ["reading", "humidity", "count"] {
        let values = f64_column(&df, column);
        assert!(values.iter().all(Option::is_some), "{} still has nulls", column);

        let values: Vec<f64> = values.into_iter().flatten().collect();
        let (mean, std) = mean_and_std(&values);
        assert_abs_diff_eq!(mean, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(std, 1.0, epsilon = 1e-9);
    }

    // Missing text cells pass through as missing.
    assert_eq!(df.column("status").unwrap().null_count(), 1);
}

#[test]
fn test_write_then_read_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let (result, output) = run_fixture("sensors.csv", &dir);

    let in_memory = result.data.unwrap();
    let written = read_csv(&output);

    assert_eq!(written.get_column_names(), in_memory.get_column_names());
    assert_eq!(written.height(), in_memory.height());

    for column in ["reading", "humidity", "count"] {
        let expected: Vec<f64> = f64_column(&in_memory, column).into_iter().flatten().collect();
        let actual: Vec<f64> = f64_column(&written, column).into_iter().flatten().collect();
        for (e, a) in expected.iter().zip(actual.iter()) {
            assert_abs_diff_eq!(*e, *a, epsilon = 1e-9);
        }
    }
}

#[test]
fn test_second_run_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let (_, first_output) = run_fixture("sensors.csv", &dir);
    let second_output = dir.path().join("second.csv");

    Pipeline::builder()
        .config(config(&first_output, &second_output))
        .build()
        .unwrap()
        .run()
        .unwrap();

    let first = read_csv(&first_output);
    let second = read_csv(&second_output);

    for column in ["reading", "humidity", "count"] {
        let a: Vec<f64> = f64_column(&first, column).into_iter().flatten().collect();
        let b: Vec<f64> = f64_column(&second, column).into_iter().flatten().collect();
        for (x, y) in a.iter().zip(b.iter()) {
            assert_abs_diff_eq!(*x, *y, epsilon = 1e-9);
        }
    }
}

// ============================================================================
// Progress and serialization
// ============================================================================

#[test]
fn test_progress_reports_each_numeric_column() {
    let dir = tempfile::tempdir().unwrap();
    let updates = Arc::new(Mutex::new(Vec::new()));
    let updates_clone = updates.clone();

    let result = Pipeline::builder()
        .config(config(fixtures_path().join("sensors.csv"), dir.path().join("out.csv")))
        .on_progress(move |update| updates_clone.lock().unwrap().push(update))
        .build()
        .unwrap()
        .run()
        .unwrap();

    assert!(result.success);
    let updates = updates.lock().unwrap();

    let per_column = |stage: EtlStage| {
        updates
            .iter()
            .filter(|u| u.stage == stage && u.items_total.is_some())
            .count()
    };
    assert_eq!(per_column(EtlStage::Imputation), 3);
    assert_eq!(per_column(EtlStage::Scaling), 3);

    let progress: Vec<f32> = updates.iter().map(|u| u.progress).collect();
    assert!(progress.windows(2).all(|w| w[0] <= w[1]), "Progress should never go backwards");
    assert_eq!(updates.last().map(|u| u.stage), Some(EtlStage::Complete));
}

#[test]
fn test_result_json_shape() {
    let dir = tempfile::tempdir().unwrap();
    let (result, _) = run_fixture("scenario.csv", &dir);

    let json: serde_json::Value = serde_json::to_value(&result).unwrap();

    assert_eq!(json["success"], serde_json::json!(true));
    assert!(json.get("data").is_none());
    assert!(json.get("abort_reason").is_none());
    assert_eq!(json["summary"]["numeric_columns"], serde_json::json!(1));
    assert_eq!(
        json["summary"]["actions"][0]["action_type"],
        serde_json::json!("value_imputed")
    );
}

//! CLI entry point for the batch CSV cleaning pipeline.

use anyhow::Result;
use clap::Parser;
use lex_etl::config::{
    DEFAULT_DELIMITER, DEFAULT_INPUT_PATH, DEFAULT_OUTPUT_PATH, DEFAULT_PREVIEW_ROWS,
};
use lex_etl::{ActionType, Pipeline, PipelineConfig, PipelineResult};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    author = "Lex Machina Team",
    version,
    about = "Batch CSV cleaning: mean imputation and z-score scaling",
    long_about = "Reads a delimited file, fills missing numeric cells with the column mean, \
                  standardizes numeric columns to zero mean and unit variance, and writes \
                  the result.\n\n\
                  EXAMPLES:\n  \
                  # Default paths (raw_data.csv -> clean_data.csv)\n  \
                  lex-etl\n\n  \
                  # Explicit paths\n  \
                  lex-etl -i data/raw.csv -o data/clean.csv\n\n  \
                  # Machine-readable summary\n  \
                  lex-etl --json | jq .summary"
)]
struct Args {
    /// Path to the delimited input file
    #[arg(short, long, default_value = DEFAULT_INPUT_PATH)]
    input: PathBuf,

    /// Path of the cleaned output file
    #[arg(short, long, default_value = DEFAULT_OUTPUT_PATH)]
    output: PathBuf,

    /// Field delimiter for both input and output
    #[arg(short, long, default_value_t = DEFAULT_DELIMITER)]
    delimiter: char,

    /// Keep spaces that follow a delimiter instead of skipping them
    #[arg(long)]
    keep_initial_space: bool,

    /// Number of rows used to infer column types (default: the whole file)
    #[arg(long)]
    infer_schema_length: Option<usize>,

    /// Number of rows shown in the preview
    #[arg(long, default_value_t = DEFAULT_PREVIEW_ROWS)]
    preview_rows: usize,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Only show warnings, errors and the final result
    #[arg(short, long)]
    quiet: bool,

    /// Output JSON to stdout instead of a human-readable summary
    ///
    /// Disables all logs; only the final JSON result is printed.
    #[arg(long)]
    json: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// With `json_output` no subscriber is installed so stdout only carries JSON.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    let mut config_builder = PipelineConfig::builder()
        .input_path(args.input.clone())
        .output_path(args.output.clone())
        .delimiter(args.delimiter)
        .skip_initial_space(!args.keep_initial_space)
        .preview_rows(args.preview_rows);
    if let Some(rows) = args.infer_schema_length {
        config_builder = config_builder.infer_schema_length(rows);
    }
    let config = config_builder.build()?;

    let pipeline = Pipeline::builder()
        .config(config)
        .on_progress(|update| {
            tracing::debug!(
                "[{:>3.0}%] {}: {}",
                update.progress * 100.0,
                update.stage.display_name(),
                update.message
            );
        })
        .build()?;

    // Write failures surface here as a non-zero exit.
    let result = pipeline.run()?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    if let Some(ref reason) = result.abort_reason {
        println!("ETL process aborted: {}", reason);
        return Ok(());
    }

    print_human_readable_summary(&result, args.quiet);
    Ok(())
}

/// Print the preview and a summary of what the run did.
///
/// Uses `println!` so the result is visible regardless of log level.
fn print_human_readable_summary(result: &PipelineResult, quiet: bool) {
    let Some(ref summary) = result.summary else {
        return;
    };

    println!();
    println!("{}", "=".repeat(80));
    println!("ETL COMPLETE");
    println!("{}", "=".repeat(80));
    println!();

    println!(
        "Input:  {} ({} rows x {} columns)",
        result.input_path.display(),
        summary.rows,
        summary.columns
    );
    if let Some(ref output_path) = result.output_path {
        println!("Output: {}", output_path.display());
    }
    println!();

    println!("Processing Summary:");
    println!("  Duration: {}ms", summary.duration_ms);
    println!("  Numeric columns: {}", summary.numeric_columns);
    println!(
        "  Missing numeric cells: {} -> {} ({} imputed)",
        summary.missing_before,
        summary.missing_after,
        summary.cells_imputed()
    );
    println!(
        "  Columns standardized: {}",
        summary.actions_of(ActionType::DataNormalized).count()
    );
    println!();

    if !quiet && !summary.actions.is_empty() {
        println!("Actions Taken:");
        for action in &summary.actions {
            match action.details {
                Some(ref details) => println!(
                    "  - [{}] {}: {} ({})",
                    action.action_type.display_name(),
                    action.target,
                    action.description,
                    details
                ),
                None => println!(
                    "  - [{}] {}: {}",
                    action.action_type.display_name(),
                    action.target,
                    action.description
                ),
            }
        }
        println!();
    }

    if !summary.warnings.is_empty() {
        println!("Warnings:");
        for warning in &summary.warnings {
            println!("  ! {}", warning);
        }
        println!();
    }

    if let Some(ref preview) = result.preview {
        println!("Processed Data Preview:");
        println!("{}", preview);
        println!();
    }

    println!("Use --json for machine-readable output");
    println!("{}", "=".repeat(80));
}

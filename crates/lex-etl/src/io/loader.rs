//! Delimited text loading.

use crate::config::PipelineConfig;
use crate::error::{EtlError, Result};
use polars::prelude::*;
use std::io::{Cursor, ErrorKind};
use std::path::Path;
use tracing::{debug, info, warn};

const UTF8_BOM: char = '\u{feff}';

/// Cell texts read as missing values, in addition to empty fields.
pub const MISSING_MARKERS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Reads a delimited text file with a header row into a [`DataFrame`].
///
/// Column types come from polars schema inference. Empty fields and the
/// [`MISSING_MARKERS`] become nulls.
#[derive(Debug, Clone)]
pub struct CsvLoader {
    delimiter: u8,
    skip_initial_space: bool,
    infer_schema_length: Option<usize>,
}

impl Default for CsvLoader {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

impl CsvLoader {
    /// `infer_schema_length` of `None` infers column types from every row.
    pub fn new(
        delimiter: u8,
        skip_initial_space: bool,
        infer_schema_length: Option<usize>,
    ) -> Self {
        Self {
            delimiter,
            skip_initial_space,
            infer_schema_length,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(
            config.delimiter_byte(),
            config.skip_initial_space,
            config.infer_schema_length,
        )
    }

    /// Load the file at `path`.
    ///
    /// # Errors
    ///
    /// - [`EtlError::SourceNotFound`] if the file does not exist
    /// - [`EtlError::EmptySource`] if it yields no columns or no rows
    /// - [`EtlError::ReadFailure`] for encoding, permission and parse errors
    pub fn load(&self, path: &Path) -> Result<DataFrame> {
        info!("Reading data from: {}", path.display());

        let content = Self::read_source(path)?;
        let content = if self.skip_initial_space {
            strip_initial_space(&content, self.delimiter as char)
        } else {
            content
        };

        if content.trim().is_empty() {
            warn!("CSV file is empty or has no columns to parse: {}", path.display());
            return Err(EtlError::EmptySource {
                path: path.to_path_buf(),
            });
        }

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(self.infer_schema_length)
            .with_parse_options(
                CsvParseOptions::default()
                    .with_separator(self.delimiter)
                    .with_quote_char(Some(b'"'))
                    .with_null_values(Some(missing_markers())),
            )
            .into_reader_with_file_handle(Cursor::new(content))
            .finish()
            .map_err(|e| {
                warn!("Failed to parse {}: {}", path.display(), e);
                EtlError::ReadFailure {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                }
            })?;

        if df.width() == 0 || df.height() == 0 {
            warn!("CSV file is empty or has no columns to parse: {}", path.display());
            return Err(EtlError::EmptySource {
                path: path.to_path_buf(),
            });
        }

        debug!("Loaded {} rows x {} columns", df.height(), df.width());
        Ok(df)
    }

    fn read_source(path: &Path) -> Result<String> {
        let bytes = std::fs::read(path).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                warn!("Input file not found: {}", path.display());
                EtlError::SourceNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                warn!("Could not read {}: {}", path.display(), e);
                EtlError::ReadFailure {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                }
            }
        })?;

        let mut text = String::from_utf8(bytes).map_err(|e| {
            warn!("{} is not valid UTF-8: {}", path.display(), e);
            EtlError::ReadFailure {
                path: path.to_path_buf(),
                reason: format!("invalid UTF-8: {}", e),
            }
        })?;

        if text.starts_with(UTF8_BOM) {
            text.remove(0);
        }

        Ok(text)
    }
}

fn missing_markers() -> NullValues {
    NullValues::AllColumns(MISSING_MARKERS.iter().map(|m| (*m).into()).collect())
}

/// Drop spaces that directly follow a delimiter outside quoted fields.
///
/// A quote opens a quoted field only at the start of a field (after any
/// skipped spaces). A doubled quote inside a quoted field is an escape.
pub fn strip_initial_space(content: &str, delimiter: char) -> String {
    let mut result = String::with_capacity(content.len());
    let mut in_quotes = false;
    let mut after_delimiter = false;
    let mut at_field_start = true;
    let mut just_closed = false;

    for c in content.chars() {
        if after_delimiter && c == ' ' {
            continue;
        }
        after_delimiter = false;

        let field_start = at_field_start;
        let reopen = just_closed;
        at_field_start = false;
        just_closed = false;

        if in_quotes {
            if c == '"' {
                in_quotes = false;
                just_closed = true;
            }
        } else if c == '"' {
            in_quotes = field_start || reopen;
        } else if c == delimiter {
            after_delimiter = true;
            at_field_start = true;
        } else if c == '\n' || c == '\r' {
            at_field_start = true;
        }
        result.push(c);
    }

    result
}

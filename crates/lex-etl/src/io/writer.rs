//! Delimited text writing.

use crate::config::PipelineConfig;
use crate::error::{EtlError, Result};
use polars::prelude::*;
use std::fs::{self, File};
use std::path::Path;
use tracing::info;

/// Writes a [`DataFrame`] as delimited text: header row, no index column.
#[derive(Debug, Clone)]
pub struct CsvExporter {
    delimiter: u8,
}

impl Default for CsvExporter {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

impl CsvExporter {
    pub fn new(delimiter: u8) -> Self {
        Self { delimiter }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.delimiter_byte())
    }

    /// Write `df` to `path`, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Every I/O or serialization failure is returned as
    /// [`EtlError::WriteFailure`].
    pub fn write(&self, df: &mut DataFrame, path: &Path) -> Result<()> {
        let write_failure = |reason: String| EtlError::WriteFailure {
            path: path.to_path_buf(),
            reason,
        };

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| write_failure(e.to_string()))?;
        }

        let mut file = File::create(path).map_err(|e| write_failure(e.to_string()))?;

        CsvWriter::new(&mut file)
            .include_header(true)
            .with_separator(self.delimiter)
            .with_quote_char(b'"')
            .finish(df)
            .map_err(|e| write_failure(e.to_string()))?;

        info!("Cleaned data saved to: {}", path.display());
        Ok(())
    }
}

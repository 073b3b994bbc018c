//! File boundaries of the pipeline: loading and writing delimited text.

mod loader;
mod writer;

pub use loader::{CsvLoader, strip_initial_space};
pub use writer::CsvExporter;

use polars::prelude::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the refugee-flow pipeline.
#[derive(Error, Debug)]
pub enum FlowsError {
    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An output file could not be created or written.
    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A CSV document could not be parsed into, or written from, a frame.
    #[error("CSV error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: PolarsError,
    },

    /// One or more required input tables are absent from the data directory.
    #[error("Missing input files: {}", .0.join(", "))]
    MissingInputs(Vec<String>),

    /// A table lacks a column an operation depends on.
    #[error("Missing column '{column}' in {table}")]
    MissingColumn { table: String, column: String },

    /// A report generator failed; the whole run is aborted.
    #[error("Report {report} failed: {message}")]
    Report { report: String, message: String },

    /// A frame transformation failed.
    #[error(transparent)]
    Polars(#[from] PolarsError),
}

impl FlowsError {
    /// Build a [`FlowsError::MissingColumn`] for `table`.
    pub fn missing_column(table: impl Into<String>, column: impl Into<String>) -> Self {
        FlowsError::MissingColumn {
            table: table.into(),
            column: column.into(),
        }
    }
}

/// Convenience alias used throughout the pipeline crates.
pub type Result<T> = std::result::Result<T, FlowsError>;

//! CSV loading for UNHCR tables.
//!
//! Every field is read as a string. The UNHCR missing marker `*` and empty
//! fields become nulls; interpreting numbers is the cleaner's job.

use std::path::Path;

use flows_core::{FlowsError, Result};
use polars::prelude::*;
use tracing::debug;

/// Placeholder UNHCR uses for suppressed or unknown values.
pub const MISSING_MARKER: &str = "*";

/// Lazily scan a CSV file with a header row.
///
/// Rows shorter than the header are padded with nulls, longer ones are
/// truncated. Invalid UTF-8 is replaced rather than rejected.
pub fn scan_table(path: &Path) -> Result<LazyFrame> {
    std::fs::metadata(path).map_err(|source| FlowsError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    LazyCsvReader::new(path)
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .with_null_values(Some(NullValues::AllColumns(vec![
            MISSING_MARKER.to_string(),
            String::new(),
        ])))
        .with_missing_is_null(true)
        .with_truncate_ragged_lines(true)
        .with_encoding(CsvEncoding::LossyUtf8)
        .finish()
        .map_err(|source| FlowsError::Csv {
            path: path.to_path_buf(),
            source,
        })
}

/// Load a CSV file eagerly.
pub fn load_table(path: &Path) -> Result<DataFrame> {
    let df = scan_table(path)?
        .collect()
        .map_err(|source| FlowsError::Csv {
            path: path.to_path_buf(),
            source,
        })?;

    debug!(
        "Loaded {}: {} rows, {} columns",
        table_name(path),
        df.height(),
        df.width()
    );
    Ok(df)
}

/// File name of `path`, used to label the table in errors.
pub fn table_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

//! CSV output for generated edge tables.

use std::fs::File;
use std::path::Path;

use flows_core::{FlowsError, Result};
use polars::prelude::*;
use tracing::debug;

/// Write `df` with a header row to `path`, replacing any existing file.
pub fn write_table(df: &mut DataFrame, path: &Path) -> Result<()> {
    let mut file = File::create(path).map_err(|source| FlowsError::FileWrite {
        path: path.to_path_buf(),
        source,
    })?;

    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(df)
        .map_err(|source| FlowsError::Csv {
            path: path.to_path_buf(),
            source,
        })?;

    debug!("Wrote {} rows to {}", df.height(), path.display());
    Ok(())
}

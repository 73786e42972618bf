//! Fixed file layout of a pipeline run.
//!
//! Inputs live directly in the data directory under their UNHCR export
//! names; reports go to the output directory.

use std::path::{Path, PathBuf};

use flows_core::settings::Settings;
use flows_core::{FlowsError, Result};
use flows_data::cleaner::{CleanSpec, ALL_SOURCES};
use flows_data::reports::ReportKind;

/// Resolved input and output locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataLayout {
    data_dir: PathBuf,
    output_dir: PathBuf,
}

impl DataLayout {
    pub fn new(data_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            output_dir: output_dir.into(),
        }
    }

    /// Layout for resolved CLI settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.data_dir(), settings.output_dir())
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Every expected input with its path, in validation order.
    pub fn inputs(&self) -> Vec<(CleanSpec, PathBuf)> {
        ALL_SOURCES
            .into_iter()
            .map(|spec| (spec, spec.path_in(&self.data_dir)))
            .collect()
    }

    /// Where `kind` is written.
    pub fn report_path(&self, kind: ReportKind) -> PathBuf {
        self.output_dir.join(kind.file_name())
    }

    /// Every report with its path, in generation order.
    pub fn outputs(&self) -> Vec<(ReportKind, PathBuf)> {
        ReportKind::ALL
            .iter()
            .map(|&kind| (kind, self.report_path(kind)))
            .collect()
    }

    /// Create the output directory (and parents) if absent.
    pub fn ensure_output_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.output_dir).map_err(|source| FlowsError::FileWrite {
            path: self.output_dir.clone(),
            source,
        })
    }
}

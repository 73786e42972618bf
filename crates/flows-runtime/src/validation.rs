//! Pre- and post-run checks.
//!
//! Input presence is the only hard requirement. Country coverage and output
//! validation only log warnings; their results end up in the run report.

use std::collections::BTreeSet;
use std::path::PathBuf;

use flows_core::countries::{aliased_labels, classify, CountryClass};
use flows_core::formatting::{format_count, format_size};
use flows_core::{FlowsError, Result};
use flows_data::cleaner::{
    CleanSpec, ASYLUM_COLUMN, ASYLUM_SEEKERS, ORIGIN_COLUMN, PERSONS_OF_CONCERN, SOURCE_COLUMN,
    TARGET_COLUMN, TIME_SERIES,
};
use flows_data::frame::{distinct_strings, has_column};
use flows_data::reader::load_table;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::layout::DataLayout;

/// Sources scanned for country labels.
pub const COVERAGE_SOURCES: [CleanSpec; 3] = [ASYLUM_SEEKERS, PERSONS_OF_CONCERN, TIME_SERIES];

/// Above this many unknown labels the run logs a geocoding warning.
pub const UNKNOWN_WARNING_THRESHOLD: usize = 10;

/// How many unknown labels verbose mode lists.
pub const UNKNOWN_LIST_LIMIT: usize = 20;

// ── Inputs ────────────────────────────────────────────────────────────────────

/// Presence and size of one expected input.
#[derive(Debug, Clone, Serialize)]
pub struct InputStatus {
    pub name: &'static str,
    pub path: PathBuf,
    /// `None` when the file does not exist.
    pub size_bytes: Option<u64>,
}

impl InputStatus {
    pub fn exists(&self) -> bool {
        self.size_bytes.is_some()
    }
}

/// Stat every expected input and log a line per file.
pub fn check_inputs(layout: &DataLayout) -> Vec<InputStatus> {
    info!("Checking input files");
    layout
        .inputs()
        .into_iter()
        .map(|(spec, path)| {
            let size_bytes = std::fs::metadata(&path)
                .ok()
                .filter(|m| m.is_file())
                .map(|m| m.len());
            match size_bytes {
                Some(size) => info!("  ok {}: {}", spec.file_name, format_size(size)),
                None => warn!("  missing {}", spec.file_name),
            }
            InputStatus {
                name: spec.name,
                path,
                size_bytes,
            }
        })
        .collect()
}

/// Fail with [`FlowsError::MissingInputs`] unless every input exists.
pub fn require_inputs(statuses: &[InputStatus]) -> Result<()> {
    let missing: Vec<String> = statuses
        .iter()
        .filter(|s| !s.exists())
        .map(|s| s.path.display().to_string())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(FlowsError::MissingInputs(missing))
    }
}

// ── Country coverage ──────────────────────────────────────────────────────────

/// How the distinct country labels across the inputs classify.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CountryCoverage {
    pub total: usize,
    /// Labels with an explicit alias.
    pub mapped: usize,
    /// Labels already in canonical form.
    pub geocodable: usize,
    /// Labels dropped on purpose (`Stateless`, `Various/Unknown`, ...).
    pub excluded: usize,
    /// Labels passed through unchanged; geocoding may fail for these.
    pub unknown: Vec<String>,
    /// Alias keys that no input label used.
    pub unused_aliases: usize,
}

impl CountryCoverage {
    /// Tally a set of raw labels. Labels are trimmed before counting and
    /// blank labels are ignored.
    pub fn from_labels<'a>(labels: impl IntoIterator<Item = &'a str>) -> Self {
        let mut coverage = Self::default();
        let distinct: BTreeSet<&str> = labels.into_iter().map(str::trim).collect();
        coverage.unused_aliases = aliased_labels()
            .into_iter()
            .filter(|alias| !distinct.contains(alias))
            .count();
        for label in distinct {
            match classify(label) {
                CountryClass::Blank => continue,
                CountryClass::Mapped => coverage.mapped += 1,
                CountryClass::Excluded => coverage.excluded += 1,
                CountryClass::Canonical => coverage.geocodable += 1,
                CountryClass::Passthrough => coverage.unknown.push(label.to_string()),
            }
            coverage.total += 1;
        }
        coverage
    }

    pub fn unknown_count(&self) -> usize {
        self.unknown.len()
    }

    pub fn exceeds_threshold(&self) -> bool {
        self.unknown_count() > UNKNOWN_WARNING_THRESHOLD
    }

    pub fn log(&self, verbose: bool) {
        info!("  Unique countries: {}", format_count(self.total));
        info!("  Mapped: {}", self.mapped);
        info!("  Already geocodable: {}", self.geocodable);
        info!("  Excluded: {}", self.excluded);
        debug!("  Aliases not seen in inputs: {}", self.unused_aliases);
        if self.unknown.is_empty() {
            info!("  Unknown: 0");
        } else {
            warn!("  Unknown: {}", self.unknown_count());
        }
        if verbose && !self.unknown.is_empty() {
            info!("  Unknown countries (geocoding may fail):");
            for label in self.unknown.iter().take(UNKNOWN_LIST_LIMIT) {
                info!("    - {}", label);
            }
        }
    }
}

/// Scan the origin and asylum columns of [`COVERAGE_SOURCES`].
///
/// Inputs that are absent or unreadable are skipped with a warning.
pub fn country_coverage(layout: &DataLayout, verbose: bool) -> CountryCoverage {
    info!("Checking country coverage");
    let mut labels: BTreeSet<String> = BTreeSet::new();
    for spec in &COVERAGE_SOURCES {
        let path = spec.path_in(layout.data_dir());
        let df = match load_table(&path) {
            Ok(df) => df,
            Err(e) => {
                warn!("  skipping {}: {}", spec.file_name, e);
                continue;
            }
        };
        for column in [ORIGIN_COLUMN, ASYLUM_COLUMN] {
            if !has_column(&df, column) {
                debug!("{}: no '{}' column", spec.name, column);
                continue;
            }
            match distinct_strings(&df, column) {
                Ok(values) => labels.extend(values.iter().map(|v| v.trim().to_string())),
                Err(e) => warn!("  skipping {} in {}: {}", column, spec.file_name, e),
            }
        }
    }

    let coverage = CountryCoverage::from_labels(labels.iter().map(String::as_str));
    coverage.log(verbose);
    coverage
}

// ── Outputs ───────────────────────────────────────────────────────────────────

/// Result of checking one generated file.
#[derive(Debug, Clone, Serialize)]
pub struct OutputStatus {
    pub path: PathBuf,
    pub rows: usize,
    pub columns: usize,
    pub size_bytes: u64,
    /// Why the file is unusable, if it is.
    pub problem: Option<String>,
}

impl OutputStatus {
    pub fn is_valid(&self) -> bool {
        self.problem.is_none()
    }

    fn failed(path: PathBuf, problem: impl Into<String>) -> Self {
        Self {
            path,
            rows: 0,
            columns: 0,
            size_bytes: 0,
            problem: Some(problem.into()),
        }
    }
}

/// Check every expected report file. Problems are logged as warnings.
pub fn validate_outputs(layout: &DataLayout) -> Vec<OutputStatus> {
    info!("Checking output files");
    layout
        .outputs()
        .into_iter()
        .map(|(kind, path)| {
            let status = validate_output(path);
            match &status.problem {
                None => info!(
                    "  ok {}: {} rows, {} columns, {}",
                    kind.file_name(),
                    format_count(status.rows),
                    status.columns,
                    format_size(status.size_bytes)
                ),
                Some(problem) => warn!("  {}: {}", kind.file_name(), problem),
            }
            status
        })
        .collect()
}

/// A report file must exist, parse, carry `Source` and `Target` and hold
/// at least one row.
pub fn validate_output(path: PathBuf) -> OutputStatus {
    let size_bytes = match std::fs::metadata(&path) {
        Ok(m) if m.is_file() => m.len(),
        _ => return OutputStatus::failed(path, "does not exist"),
    };
    let df = match load_table(&path) {
        Ok(df) => df,
        Err(e) => return OutputStatus::failed(path, format!("unreadable: {e}")),
    };

    let problem = if !has_column(&df, SOURCE_COLUMN) || !has_column(&df, TARGET_COLUMN) {
        Some("missing Source/Target columns".to_string())
    } else if df.height() == 0 {
        Some("no rows".to_string())
    } else {
        None
    };

    OutputStatus {
        path,
        rows: df.height(),
        columns: df.width(),
        size_bytes,
        problem,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

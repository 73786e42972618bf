//! Pipeline orchestrator.
//!
//! Runs the stages in a fixed order, `validate inputs → country coverage →
//! generate reports → validate outputs`, with no retries. Only missing inputs
//! and report failures stop the run; everything else is logged and recorded
//! in the returned [`PipelineReport`].

use std::path::PathBuf;
use std::time::Instant;

use chrono::{DateTime, Local};
use flows_core::formatting::{format_duration, format_size};
use flows_core::Result;
use flows_data::reports::{self, ReportSummary};
use serde::Serialize;
use tracing::{info, warn};

use crate::layout::DataLayout;
use crate::validation::{
    check_inputs, country_coverage, require_inputs, validate_outputs, CountryCoverage,
    InputStatus, OutputStatus,
};

// ── Public types ──────────────────────────────────────────────────────────────

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    ValidateInputs,
    CountryCoverage,
    GenerateOutputs,
    ValidateOutputs,
}

impl Stage {
    pub fn title(&self) -> &'static str {
        match self {
            Stage::ValidateInputs => "Validating input files",
            Stage::CountryCoverage => "Validating country coverage",
            Stage::GenerateOutputs => "Generating output files",
            Stage::ValidateOutputs => "Validating output files",
        }
    }
}

/// A generated file and its size, as listed in the run summary.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedFile {
    pub path: PathBuf,
    pub size_bytes: u64,
}

/// Everything a run found and produced.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub generated_at: DateTime<Local>,
    pub validate_only: bool,
    pub data_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Stages that ran to completion.
    pub stages: Vec<Stage>,
    pub inputs: Vec<InputStatus>,
    pub coverage: CountryCoverage,
    pub reports: Vec<ReportSummary>,
    pub outputs: Vec<OutputStatus>,
    /// CSV files present in the output directory after the run.
    pub files: Vec<GeneratedFile>,
    pub duration_secs: f64,
}

impl PipelineReport {
    fn new(layout: &DataLayout, validate_only: bool) -> Self {
        Self {
            generated_at: Local::now(),
            validate_only,
            data_dir: layout.data_dir().to_path_buf(),
            output_dir: layout.output_dir().to_path_buf(),
            stages: Vec::new(),
            inputs: Vec::new(),
            coverage: CountryCoverage::default(),
            reports: Vec::new(),
            outputs: Vec::new(),
            files: Vec::new(),
            duration_secs: 0.0,
        }
    }

    /// `true` when every checked output passed validation.
    pub fn outputs_valid(&self) -> bool {
        self.outputs.iter().all(OutputStatus::is_valid)
    }
}

// ── Pipeline ──────────────────────────────────────────────────────────────────

/// Synchronous pipeline over one [`DataLayout`].
pub struct Pipeline {
    layout: DataLayout,
    /// List unknown country labels during the coverage stage.
    verbose: bool,
}

impl Pipeline {
    pub fn new(layout: DataLayout, verbose: bool) -> Self {
        Self { layout, verbose }
    }

    pub fn layout(&self) -> &DataLayout {
        &self.layout
    }

    /// Full run: all four stages.
    ///
    /// Returns [`flows_core::FlowsError::MissingInputs`] before touching the
    /// output directory when any input is absent, and the first report
    /// failure otherwise.
    pub fn run(&self) -> Result<PipelineReport> {
        let started = Instant::now();
        let mut report = PipelineReport::new(&self.layout, false);
        info!("UNHCR data preparation pipeline");
        info!("Start: {}", report.generated_at.format("%Y-%m-%d %H:%M:%S"));

        self.enter(Stage::ValidateInputs);
        report.inputs = check_inputs(&self.layout);
        require_inputs(&report.inputs)?;
        report.stages.push(Stage::ValidateInputs);

        self.enter(Stage::CountryCoverage);
        report.coverage = country_coverage(&self.layout, self.verbose);
        if report.coverage.exceeds_threshold() {
            warn!(
                "{} countries may fail geocoding",
                report.coverage.unknown_count()
            );
        }
        report.stages.push(Stage::CountryCoverage);

        self.enter(Stage::GenerateOutputs);
        self.layout.ensure_output_dir()?;
        for (kind, path) in self.layout.outputs() {
            let summary = reports::generate(kind, self.layout.data_dir(), &path)?;
            summary.log();
            report.reports.push(summary);
        }
        report.stages.push(Stage::GenerateOutputs);

        self.enter(Stage::ValidateOutputs);
        report.outputs = validate_outputs(&self.layout);
        if !report.outputs_valid() {
            warn!("Some output files have problems");
        }
        report.stages.push(Stage::ValidateOutputs);

        report.files = list_output_files(&self.layout);
        report.duration_secs = started.elapsed().as_secs_f64();
        self.log_summary(&report);
        Ok(report)
    }

    /// Checks only: inputs (non-fatal), coverage and existing outputs.
    pub fn validate_only(&self) -> Result<PipelineReport> {
        let started = Instant::now();
        let mut report = PipelineReport::new(&self.layout, true);
        info!("UNHCR data validation");

        self.enter(Stage::ValidateInputs);
        report.inputs = check_inputs(&self.layout);
        if let Err(e) = require_inputs(&report.inputs) {
            warn!("{}", e);
        }
        report.stages.push(Stage::ValidateInputs);

        self.enter(Stage::CountryCoverage);
        report.coverage = country_coverage(&self.layout, self.verbose);
        report.stages.push(Stage::CountryCoverage);

        self.enter(Stage::ValidateOutputs);
        report.outputs = validate_outputs(&self.layout);
        report.stages.push(Stage::ValidateOutputs);

        report.files = list_output_files(&self.layout);
        report.duration_secs = started.elapsed().as_secs_f64();
        info!("Validation complete");
        Ok(report)
    }

    fn enter(&self, stage: Stage) {
        info!("── {} ──", stage.title());
    }

    fn log_summary(&self, report: &PipelineReport) {
        info!("Pipeline complete");
        info!("Duration: {}", format_duration(report.duration_secs));
        info!("Files generated in: {}", self.layout.output_dir().display());
        for file in &report.files {
            info!("  {} ({})", file.path.display(), format_size(file.size_bytes));
        }
    }
}

// ── Private helpers ───────────────────────────────────────────────────────────

/// CSV files directly inside the output directory, sorted by path.
fn list_output_files(layout: &DataLayout) -> Vec<GeneratedFile> {
    let mut files: Vec<GeneratedFile> = walkdir::WalkDir::new(layout.output_dir())
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file()
                && entry
                    .path()
                    .extension()
                    .map(|ext| ext == "csv")
                    .unwrap_or(false)
        })
        .map(|entry| GeneratedFile {
            size_bytes: entry.metadata().map(|m| m.len()).unwrap_or(0),
            path: entry.into_path(),
        })
        .collect();
    files.sort_by(|a, b| a.path.cmp(&b.path));
    files
}

// ── Tests ─────────────────────────────────────────────────────────────────────

use clap::Parser;
use std::path::{Path, PathBuf};

/// Default name of the directory (under the data directory) receiving outputs.
pub const DEFAULT_OUTPUT_SUBDIR: &str = "output";

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Prepare UNHCR refugee-flow statistics as graph edge tables
#[derive(Parser, Debug, Clone)]
#[command(
    name = "refugee-flows",
    about = "Prepare UNHCR refugee-flow statistics as graph edge tables",
    version
)]
pub struct Settings {
    /// Directory holding the six UNHCR input CSV files
    #[arg(long, env = "REFUGEE_FLOWS_DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,

    /// Directory receiving the generated CSV files (default: <data-dir>/output)
    #[arg(long, env = "REFUGEE_FLOWS_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Only validate inputs, country coverage and existing outputs
    #[arg(long)]
    pub validate_only: bool,

    /// List unknown countries and log at debug level
    #[arg(long, short = 'v')]
    pub verbose: bool,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"])]
    pub log_level: String,

    /// Append logs to this file instead of stderr
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Write a JSON run report to this path
    #[arg(long)]
    pub report_json: Option<PathBuf>,
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse process arguments and resolve derived values.
    pub fn load() -> Self {
        Self::parse().resolve()
    }

    /// Same as [`Settings::load`] with an explicit argument list.
    pub fn load_from_args<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::parse_from(args).resolve()
    }

    /// Fill in the default output directory and apply `--verbose` to the log
    /// level.
    pub fn resolve(mut self) -> Self {
        if self.output_dir.is_none() {
            self.output_dir = Some(self.data_dir.join(DEFAULT_OUTPUT_SUBDIR));
        }
        if self.verbose && self.log_level == "INFO" {
            self.log_level = "DEBUG".to_string();
        }
        self
    }

    /// Output directory, falling back to `<data-dir>/output` when unresolved.
    pub fn output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join(DEFAULT_OUTPUT_SUBDIR))
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

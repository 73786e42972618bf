use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use anyhow::Context;
use flows_runtime::orchestrator::PipelineReport;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Map a CLI level name onto a tracing filter directive.
///
/// Unrecognised names fall back to `"info"`.
pub fn level_directive(log_level: &str) -> &'static str {
    match log_level.to_uppercase().as_str() {
        "DEBUG" => "debug",
        "WARNING" | "WARN" => "warn",
        "ERROR" | "CRITICAL" => "error",
        _ => "info",
    }
}

/// Initialise the global `tracing` subscriber.
///
/// `RUST_LOG` overrides `log_level` when set. With `log_file` the events are
/// appended to that file (parents created) instead of going to stderr.
pub fn setup_logging(log_level: &str, log_file: Option<&Path>) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_directive(log_level)));

    let (stderr_layer, file_layer) = match log_file {
        Some(path) => {
            let file = open_log_file(path)?;
            let layer = fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(file));
            (None, Some(layer))
        }
        None => {
            let layer = fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_writer(std::io::stderr);
            (Some(layer), None)
        }
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("failed to initialise logging")?;

    Ok(())
}

fn open_log_file(path: &Path) -> anyhow::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("cannot create log directory {}", parent.display()))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("cannot open log file {}", path.display()))
}

// ── Run report ─────────────────────────────────────────────────────────────────

/// Write the run report as pretty-printed JSON.
pub fn write_report_json(report: &PipelineReport, path: &Path) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json)
        .with_context(|| format!("cannot write run report {}", path.display()))?;
    Ok(())
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use flows_runtime::layout::DataLayout;
    use flows_runtime::orchestrator::Pipeline;
    use tempfile::TempDir;

    #[test]
    fn test_level_directive_mapping() {
        assert_eq!(level_directive("DEBUG"), "debug");
        assert_eq!(level_directive("info"), "info");
        assert_eq!(level_directive("WARNING"), "warn");
        assert_eq!(level_directive("ERROR"), "error");
        assert_eq!(level_directive("verbose"), "info");
    }

    #[test]
    fn test_open_log_file_creates_parents_and_appends() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp.path().join("logs").join("pipeline.log");

        {
            use std::io::Write;
            let mut f = open_log_file(&path).expect("open");
            writeln!(f, "first").unwrap();
            let mut f = open_log_file(&path).expect("reopen");
            writeln!(f, "second").unwrap();
        }

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "first\nsecond\n");
    }

    #[test]
    fn test_write_report_json() {
        let tmp = TempDir::new().expect("tempdir");
        let layout = DataLayout::new(tmp.path(), tmp.path().join("output"));
        let report = Pipeline::new(layout, false).validate_only().unwrap();

        let path = tmp.path().join("report.json");
        write_report_json(&report, &path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["validate_only"], true);
        assert_eq!(value["inputs"].as_array().map(Vec::len), Some(6));
    }
}

mod bootstrap;

use anyhow::Result;
use flows_core::settings::Settings;
use flows_runtime::layout::DataLayout;
use flows_runtime::orchestrator::Pipeline;

fn main() -> Result<()> {
    let settings = Settings::load();

    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_deref())?;

    tracing::info!("refugee-flows v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::debug!(
        "Data: {}, output: {}",
        settings.data_dir().display(),
        settings.output_dir().display()
    );

    let pipeline = Pipeline::new(DataLayout::from_settings(&settings), settings.verbose);

    let outcome = if settings.validate_only {
        pipeline.validate_only()
    } else {
        pipeline.run()
    };

    let report = match outcome {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("{}", e);
            return Err(e.into());
        }
    };

    if let Ok(json) = serde_json::to_string(&report) {
        tracing::debug!("Run report: {}", json);
    }
    if let Some(path) = &settings.report_json {
        bootstrap::write_report_json(&report, path)?;
        tracing::info!("Run report written to {}", path.display());
    }

    Ok(())
}

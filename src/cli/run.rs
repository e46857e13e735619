//! Batch run implementation.

use super::output::format_cost;
use super::preflight;
use super::Output;
use crate::config::Settings;
use crate::orchestrator::{BatchSummary, Orchestrator};
use anyhow::Result;

/// Run the pipeline once over the configured input root.
///
/// Errors only for run-scoped problems (credentials, missing input root);
/// per-job failures are reported in the summary.
pub async fn run_batch(settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check() {
        Output::error(&format!("{}", e));
        for name in preflight::missing_credentials() {
            Output::info(&preflight::credential_hint(name));
        }
        return Err(e.into());
    }

    let orchestrator = Orchestrator::new(settings)?;

    if !orchestrator.can_transcode() {
        Output::warning("Audio extraction unavailable; video files will be sent to transcription as-is.");
    }

    Output::info(&format!(
        "Checking for new media files in {}",
        orchestrator.input_dir().display()
    ));

    let summary = match orchestrator.run().await {
        Ok(summary) => summary,
        Err(e) => {
            Output::error(&format!("{}", e));
            return Err(e.into());
        }
    };

    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &BatchSummary) {
    if summary.processed == 0 {
        Output::warning("No media files found");
        return;
    }

    Output::header("Summary");
    Output::kv("Processed", &summary.processed.to_string());
    Output::kv("Succeeded", &summary.succeeded.to_string());
    Output::kv("Failed", &summary.failed.to_string());
    Output::kv("Degraded", &summary.degraded.to_string());
    Output::kv("Cleanup warnings", &summary.cleanup_warnings.to_string());
    Output::kv("Estimated cost", &format_cost(summary.total_cost_usd));

    for (file, stage) in &summary.failures {
        Output::list_item(&format!("{} (failed while {})", file, stage));
    }

    if summary.failed == 0 {
        Output::success("Finished processing media files.");
    } else {
        Output::warning(&format!(
            "{} file(s) failed and were left in place for the next run.",
            summary.failed
        ));
    }
}

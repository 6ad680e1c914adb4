use anyhow::{Context, Result};
use serde::Serialize;
use std::path::PathBuf;

pub mod config;
pub mod export;
pub mod recovery;

pub use config::{ExportConfig, RecoveryConfig, RunConfig};
pub use export::{export_table, DateColumnRule, ExportError, ExportOutcome};
pub use recovery::{
    classify, recover, sniff_file, EntryOutcome, FileKind, FileRecoverer, RecoveryEntry,
    RecoveryError, RecoveryProgress, RecoveryStatistics,
};

/// What happened to the optional metadata export
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExportStatus {
    /// No metadata store was given
    Skipped,
    Exported { path: PathBuf, rows: usize },
    /// The table was empty or absent
    NothingExported,
    Failed { reason: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Entries written to the report (recoveries and failures)
    pub entries_reported: usize,
    pub statistics: RecoveryStatistics,
    pub report_path: PathBuf,
    pub export: ExportStatus,
}

/// Recover the cache, write the report, then export the metadata table.
///
/// Only environment failures are returned as errors: an unusable destination
/// directory or an unwritable report. Per-file problems land in the report and
/// export problems land in [`RunSummary::export`].
pub fn run(config: &RunConfig) -> Result<RunSummary> {
    run_with_progress(config, |_| {})
}

/// Same as [`run`], forwarding per-file progress to `on_progress`.
pub fn run_with_progress<F>(config: &RunConfig, on_progress: F) -> Result<RunSummary>
where
    F: Fn(RecoveryProgress) + 'static,
{
    std::fs::create_dir_all(&config.destination).with_context(|| {
        format!(
            "Failed to create destination directory {}",
            config.destination.display()
        )
    })?;

    let mut recoverer = FileRecoverer::new(&config.destination, config.recovery.clone());
    recoverer.set_progress_callback(on_progress);
    let entries = recoverer.recover_tree(&config.source);

    let report_path = recovery::write_report(
        &entries,
        &config.destination,
        &config.recovery.report_file_name,
    )?;

    let export = match &config.metadata_store {
        Some(store) => export_metadata(store, config),
        None => ExportStatus::Skipped,
    };

    Ok(RunSummary {
        entries_reported: entries.len(),
        statistics: recoverer.statistics().clone(),
        report_path,
        export,
    })
}

fn export_metadata(store: &std::path::Path, config: &RunConfig) -> ExportStatus {
    tracing::info!("Parsing metadata database at {}", store.display());

    let output_path = config.destination.join(&config.export.output_file_name);
    match export_table(
        store,
        &config.export.table_name,
        &output_path,
        &config.export.date_columns,
    ) {
        Ok(ExportOutcome::Exported { path, rows, .. }) => ExportStatus::Exported { path, rows },
        Ok(ExportOutcome::Empty) => ExportStatus::NothingExported,
        Err(err) => {
            tracing::error!("Failed to export metadata: {}", err);
            ExportStatus::Failed {
                reason: err.to_string(),
            }
        }
    }
}

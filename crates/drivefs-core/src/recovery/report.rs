//! Plain-text analysis report, one line per recorded entry.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::walker::{EntryOutcome, RecoveryEntry};

/// Render a single report line.
pub fn render_line(entry: &RecoveryEntry) -> String {
    match &entry.outcome {
        EntryOutcome::Recovered { kind, .. } => format!(
            "{} --> {} [{}]",
            entry.original_name,
            entry.destination_name().unwrap_or_default(),
            kind.mime_type()
        ),
        EntryOutcome::Failed(err) => format!("{} --> ERROR: {}", entry.original_name, err),
    }
}

/// Render all entries in visitation order, newline separated.
pub fn render_report(entries: &[RecoveryEntry]) -> String {
    entries
        .iter()
        .map(render_line)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Write the report into `output_dir`, replacing any previous one.
pub fn write_report(
    entries: &[RecoveryEntry],
    output_dir: &Path,
    file_name: &str,
) -> Result<PathBuf> {
    let report_path = output_dir.join(file_name);
    std::fs::write(&report_path, render_report(entries))
        .with_context(|| format!("Failed to write report to {}", report_path.display()))?;

    tracing::info!("Wrote {} report lines to {}", entries.len(), report_path.display());
    Ok(report_path)
}

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use drivefs_core::config::{DEFAULT_DATE_SUFFIX, DEFAULT_TABLE};
use drivefs_core::{DateColumnRule, ExportStatus, RunConfig, RunSummary};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::Level;

const RULE: &str = "==========================================================";

fn banner() -> String {
	format!(
		"{rule}
  Google DriveFS Content Cache Recovery & Metadata Export
  Version {version}
{rule}
Supported file types for recovery:
  - PDF (.pdf)
  - Office XML documents and zip archives (.zip)
  - JPEG images (.jpg)
  - PNG images (.png)
----------------------------------------------------------",
		rule = RULE,
		version = env!("CARGO_PKG_VERSION"),
	)
}

#[derive(Parser, Debug)]
#[command(
	name = "drivefs",
	version,
	about = "Recover cached files from a DriveFS content_cache and export item metadata to CSV"
)]
struct Cli {
	/// Path to the content_cache directory
	#[arg(short, long)]
	source: PathBuf,
	/// Output directory, created if missing
	#[arg(short, long)]
	dest: PathBuf,
	/// Path to metadata_sqlite_db (optional)
	#[arg(short, long = "metadata-file", alias = "metadata_file")]
	metadata_file: Option<PathBuf>,
	/// Table to export from the metadata store
	#[arg(long, default_value = DEFAULT_TABLE)]
	table: String,
	/// Columns ending in this suffix hold millisecond timestamps
	#[arg(long, default_value = DEFAULT_DATE_SUFFIX)]
	date_suffix: String,
	/// Do not copy modification times onto recovered files
	#[arg(long)]
	no_preserve_mtime: bool,
	/// Print the run summary as JSON
	#[arg(long)]
	json: bool,
	/// Increase log verbosity (-v info, -vv debug)
	#[arg(short, long, action = clap::ArgAction::Count)]
	verbose: u8,
}

impl Cli {
	fn into_config(self) -> RunConfig {
		let mut config = RunConfig::new(self.source, self.dest);
		config.metadata_store = self.metadata_file;
		config.recovery.preserve_modified_time = !self.no_preserve_mtime;
		config.export.table_name = self.table;
		config.export.date_columns = if self.date_suffix.is_empty() {
			DateColumnRule::Disabled
		} else {
			DateColumnRule::Suffix(self.date_suffix)
		};
		config
	}
}

fn main() -> Result<()> {
	let cli = Cli::parse();

	let level = match cli.verbose {
		0 => Level::WARN,
		1 => Level::INFO,
		_ => Level::DEBUG,
	};
	tracing_subscriber::fmt()
		.with_max_level(level)
		.with_writer(std::io::stderr)
		.init();

	let json = cli.json;
	let config = cli.into_config();

	if !json {
		println!("{}", banner());
		println!("📂 Source: {}", config.source.display());
		println!("💾 Destination: {}", config.destination.display());
	}

	let spinner = if json { ProgressBar::hidden() } else { ProgressBar::new_spinner() };
	spinner.set_style(
		ProgressStyle::with_template("{spinner} {msg}")
			.unwrap_or_else(|_| ProgressStyle::default_spinner()),
	);
	spinner.enable_steady_tick(Duration::from_millis(120));

	let progress = spinner.clone();
	let summary = drivefs_core::run_with_progress(&config, move |p| {
		progress.set_message(format!(
			"{} files scanned, {} recovered, {} failed",
			p.files_visited, p.files_recovered, p.files_failed
		));
	});
	spinner.finish_and_clear();
	let summary = summary?;

	if json {
		println!("{}", serde_json::to_string_pretty(&summary)?);
	} else {
		print_summary(&summary, &config);
	}
	Ok(())
}

fn print_summary(summary: &RunSummary, config: &RunConfig) {
	println!("✅ Analysis complete. {} files processed.", summary.entries_reported);
	println!("🔍 Files Scanned: {}", summary.statistics.files_visited);
	println!("🔄 Recovered Files: {}", summary.statistics.files_recovered);
	println!("❌ Failed Files: {}", summary.statistics.files_failed);
	println!("📄 Report: {}", summary.report_path.display());

	match &summary.export {
		ExportStatus::Skipped => {}
		ExportStatus::Exported { path, rows } => {
			println!("📊 Metadata CSV exported: {} ({} rows)", path.display(), rows);
			if let DateColumnRule::Suffix(suffix) = &config.export.date_columns {
				println!(
					"🕒 Timestamps for all fields ending in {} are exported as ISO8601 UTC.",
					suffix
				);
			}
		}
		ExportStatus::NothingExported => {
			println!(
				"⚠️  No rows found in {} table, nothing exported.",
				config.export.table_name
			);
		}
		ExportStatus::Failed { reason } => {
			eprintln!("❌ Failed to export metadata: {}", reason);
		}
	}
}

//! Run configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::export::DateColumnRule;

pub const DEFAULT_REPORT_FILE: &str = "drivefs_analysis_report.txt";
pub const DEFAULT_EXPORT_FILE: &str = "drivefs_items_table.csv";
pub const DEFAULT_TABLE: &str = "items";
pub const DEFAULT_DATE_SUFFIX: &str = "_date";

/// Settings for the cache walk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoveryConfig {
    /// Re-apply the source modification time to each recovered copy
    pub preserve_modified_time: bool,
    /// Report file name inside the destination directory
    pub report_file_name: String,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            preserve_modified_time: true,
            report_file_name: DEFAULT_REPORT_FILE.to_string(),
        }
    }
}

/// Settings for the metadata table export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    pub table_name: String,
    pub date_columns: DateColumnRule,
    /// Export file name inside the destination directory
    pub output_file_name: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            table_name: DEFAULT_TABLE.to_string(),
            date_columns: DateColumnRule::Suffix(DEFAULT_DATE_SUFFIX.to_string()),
            output_file_name: DEFAULT_EXPORT_FILE.to_string(),
        }
    }
}

/// Everything one invocation needs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub metadata_store: Option<PathBuf>,
    pub recovery: RecoveryConfig,
    pub export: ExportConfig,
}

impl RunConfig {
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            metadata_store: None,
            recovery: RecoveryConfig::default(),
            export: ExportConfig::default(),
        }
    }

    pub fn with_metadata_store(mut self, store: impl Into<PathBuf>) -> Self {
        self.metadata_store = Some(store.into());
        self
    }
}

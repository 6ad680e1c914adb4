/// Cache traversal and signature-driven file recovery
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use serde::Serialize;
use walkdir::WalkDir;

use super::signatures::{sniff_file, FileKind};
use super::RecoveryError;
use crate::config::RecoveryConfig;

/// Outcome of one visited file
#[derive(Debug)]
pub struct RecoveryEntry {
    /// Base name of the cached file as found on disk
    pub original_name: String,
    pub source_path: PathBuf,
    pub outcome: EntryOutcome,
}

#[derive(Debug)]
pub enum EntryOutcome {
    Recovered {
        destination: PathBuf,
        kind: FileKind,
        bytes_copied: u64,
    },
    Failed(RecoveryError),
}

impl RecoveryEntry {
    pub fn is_recovered(&self) -> bool {
        matches!(self.outcome, EntryOutcome::Recovered { .. })
    }

    /// File name of the recovered copy, absent for failures
    pub fn destination_name(&self) -> Option<String> {
        match &self.outcome {
            EntryOutcome::Recovered { destination, .. } => destination
                .file_name()
                .map(|name| name.to_string_lossy().into_owned()),
            EntryOutcome::Failed(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RecoveryProgress {
    pub files_visited: u64,
    pub files_recovered: u64,
    pub files_failed: u64,
    pub current_file: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecoveryStatistics {
    pub files_visited: u64,
    pub files_recovered: u64,
    pub files_failed: u64,
    /// Regular files whose signature matched nothing; not reported as entries
    pub files_unrecognized: u64,
    pub bytes_copied: u64,
}

/// Walks a content cache and copies every recognized file out of it
pub struct FileRecoverer {
    config: RecoveryConfig,
    destination: PathBuf,
    statistics: RecoveryStatistics,
    progress_callback: Option<Box<dyn Fn(RecoveryProgress)>>,
}

impl FileRecoverer {
    pub fn new(destination: impl Into<PathBuf>, config: RecoveryConfig) -> Self {
        Self {
            config,
            destination: destination.into(),
            statistics: RecoveryStatistics::default(),
            progress_callback: None,
        }
    }

    pub fn set_progress_callback<F>(&mut self, callback: F)
    where
        F: Fn(RecoveryProgress) + 'static,
    {
        self.progress_callback = Some(Box::new(callback));
    }

    pub fn statistics(&self) -> &RecoveryStatistics {
        &self.statistics
    }

    /// Visit every regular file (or link to one) under `source` once and
    /// return the entries in visitation order. A failing file is recorded and
    /// the walk moves on.
    pub fn recover_tree(&mut self, source: &Path) -> Vec<RecoveryEntry> {
        tracing::info!(
            "Starting recovery from {} to {}",
            source.display(),
            self.destination.display()
        );

        let mut entries = Vec::new();

        let walker = WalkDir::new(source)
            .follow_links(false)
            .sort_by_file_name();

        for item in walker {
            let entry = match item {
                Ok(entry) => entry,
                Err(err) => {
                    let source_path = err
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| source.to_path_buf());
                    tracing::warn!("❌ Cannot traverse {}: {}", source_path.display(), err);
                    self.statistics.files_failed += 1;
                    entries.push(RecoveryEntry {
                        original_name: display_name(&source_path),
                        source_path,
                        outcome: EntryOutcome::Failed(RecoveryError::Walk(err)),
                    });
                    continue;
                }
            };

            let file_type = entry.file_type();
            if file_type.is_dir() {
                continue;
            }
            // Links to files are recovered through the link, dangling ones fail
            // in classification; linked directories are not descended into
            if file_type.is_symlink() && entry.path().is_dir() {
                tracing::debug!("Skipping directory link {}", entry.path().display());
                continue;
            }
            if !file_type.is_file() && !file_type.is_symlink() {
                tracing::debug!("Skipping non-regular entry {}", entry.path().display());
                continue;
            }

            if let Some(recorded) = self.recover_file(entry.path()) {
                entries.push(recorded);
            }
        }

        tracing::info!(
            "Recovery complete: {} visited, {} recovered, {} failed, {} unrecognized",
            self.statistics.files_visited,
            self.statistics.files_recovered,
            self.statistics.files_failed,
            self.statistics.files_unrecognized
        );

        entries
    }

    /// Classify and copy a single file. Returns `None` when its signature is
    /// unknown, since that is an exclusion rather than a failure.
    pub fn recover_file(&mut self, path: &Path) -> Option<RecoveryEntry> {
        self.statistics.files_visited += 1;
        let original_name = display_name(path);

        let outcome = match self.copy_if_recognized(path) {
            Ok(Some((destination, kind, bytes_copied))) => {
                self.statistics.files_recovered += 1;
                self.statistics.bytes_copied += bytes_copied;
                tracing::info!(
                    "✅ Recovered {} as {} ({})",
                    original_name,
                    destination.display(),
                    kind
                );
                Some(EntryOutcome::Recovered {
                    destination,
                    kind,
                    bytes_copied,
                })
            }
            Ok(None) => {
                self.statistics.files_unrecognized += 1;
                tracing::debug!("No known signature in {}", path.display());
                None
            }
            Err(err) => {
                self.statistics.files_failed += 1;
                tracing::warn!("❌ {}", err);
                Some(EntryOutcome::Failed(err))
            }
        };

        self.emit_progress(path);

        outcome.map(|outcome| RecoveryEntry {
            original_name,
            source_path: path.to_path_buf(),
            outcome,
        })
    }

    fn copy_if_recognized(
        &self,
        path: &Path,
    ) -> Result<Option<(PathBuf, FileKind, u64)>, RecoveryError> {
        let kind = sniff_file(path)?;
        let Some(extension) = kind.extension() else {
            return Ok(None);
        };

        // Same base name from different subdirectories: the later copy wins
        let mut file_name = path.file_name().unwrap_or(path.as_os_str()).to_os_string();
        file_name.push(".");
        file_name.push(extension);
        let destination = self.destination.join(file_name);

        let bytes_copied = fs::copy(path, &destination).map_err(|source| RecoveryError::Copy {
            path: path.to_path_buf(),
            destination: destination.clone(),
            source,
        })?;

        if self.config.preserve_modified_time {
            if let Err(err) = copy_modified_time(path, &destination) {
                tracing::warn!(
                    "Could not preserve modification time on {}: {}",
                    destination.display(),
                    err
                );
            }
        }

        Ok(Some((destination, kind, bytes_copied)))
    }

    fn emit_progress(&self, current_file: &Path) {
        if let Some(ref callback) = self.progress_callback {
            callback(RecoveryProgress {
                files_visited: self.statistics.files_visited,
                files_recovered: self.statistics.files_recovered,
                files_failed: self.statistics.files_failed,
                current_file: current_file.to_path_buf(),
            });
        }
    }
}

/// Recover everything under `source` into `destination` with default settings
pub fn recover(source: &Path, destination: &Path) -> Vec<RecoveryEntry> {
    FileRecoverer::new(destination, RecoveryConfig::default()).recover_tree(source)
}

fn copy_modified_time(source: &Path, destination: &Path) -> std::io::Result<()> {
    let modified = fs::metadata(source)?.modified()?;
    File::options()
        .write(true)
        .open(destination)?
        .set_modified(modified)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

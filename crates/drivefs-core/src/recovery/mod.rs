/// Recovery module: signature sniffing, cache walking and the outcome report
use std::path::PathBuf;

use thiserror::Error;

pub mod report;
pub mod signatures;
pub mod walker;

pub use report::{render_report, write_report};
pub use signatures::{classify, sniff_file, FileKind, SIGNATURE_LEN};
pub use walker::{
    recover, EntryOutcome, FileRecoverer, RecoveryEntry, RecoveryProgress, RecoveryStatistics,
};

/// Per-file failures recorded in the report; none of them stops the walk
#[derive(Error, Debug)]
pub enum RecoveryError {
    #[error("failed to read signature of {}: {source}", path.display())]
    ClassificationRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to copy {} to {}: {source}", path.display(), destination.display())]
    Copy {
        path: PathBuf,
        destination: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to traverse cache: {0}")]
    Walk(#[from] walkdir::Error),
}

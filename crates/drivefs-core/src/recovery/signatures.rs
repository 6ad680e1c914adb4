/// Magic-number classification of cached files
use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::RecoveryError;

/// Number of leading bytes inspected when sniffing a file
pub const SIGNATURE_LEN: usize = 8;

/// A recognized file type, or `Unknown` when no signature matched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    Pdf,
    /// Plain zip archives and Office-XML documents (docx/xlsx/pptx) alike
    ZipContainer,
    Jpeg,
    Png,
    Unknown,
}

impl FileKind {
    /// Extension appended to the recovered copy, `None` for unknown files
    pub fn extension(&self) -> Option<&'static str> {
        match self {
            FileKind::Pdf => Some("pdf"),
            FileKind::ZipContainer => Some("zip"),
            FileKind::Jpeg => Some("jpg"),
            FileKind::Png => Some("png"),
            FileKind::Unknown => None,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            FileKind::Pdf => "application/pdf",
            FileKind::ZipContainer => "application/zip",
            FileKind::Jpeg => "image/jpeg",
            FileKind::Png => "image/png",
            FileKind::Unknown => "unknown",
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, FileKind::Unknown)
    }
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileKind::Pdf => write!(f, "PDF Document"),
            FileKind::ZipContainer => write!(f, "ZIP Container"),
            FileKind::Jpeg => write!(f, "JPEG Image"),
            FileKind::Png => write!(f, "PNG Image"),
            FileKind::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Signature table, checked in order; first match wins
const SIGNATURES: &[(&[u8], FileKind)] = &[
    (b"%PDF", FileKind::Pdf),
    (&[0x50, 0x4B, 0x03, 0x04], FileKind::ZipContainer), // PK\x03\x04
    (&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A], FileKind::Png),
    (&[0xFF, 0xD8], FileKind::Jpeg),
];

/// Classify a file from its leading bytes.
///
/// Only the first [`SIGNATURE_LEN`] bytes are considered. Input shorter than
/// that still matches when it covers a whole signature.
pub fn classify(data: &[u8]) -> FileKind {
    let head = &data[..data.len().min(SIGNATURE_LEN)];

    SIGNATURES
        .iter()
        .find(|(magic, _)| head.starts_with(magic))
        .map(|(_, kind)| *kind)
        .unwrap_or(FileKind::Unknown)
}

/// Read the head of `path` and classify it.
///
/// Read failures surface as [`RecoveryError::ClassificationRead`] so they are
/// never confused with an `Unknown` classification.
pub fn sniff_file(path: &Path) -> Result<FileKind, RecoveryError> {
    let read_err = |source| RecoveryError::ClassificationRead {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(read_err)?;
    let mut head = Vec::with_capacity(SIGNATURE_LEN);
    file.take(SIGNATURE_LEN as u64)
        .read_to_end(&mut head)
        .map_err(read_err)?;

    Ok(classify(&head))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_signatures() {
        assert_eq!(classify(b"%PDF-1.7\n"), FileKind::Pdf);
        assert_eq!(classify(b"PK\x03\x04\x14\x00\x06\x00"), FileKind::ZipContainer);
        assert_eq!(
            classify(&[0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1A, b'\n', 0x00]),
            FileKind::Png
        );
        assert_eq!(classify(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10]), FileKind::Jpeg);
    }

    #[test]
    fn test_exact_length_prefixes() {
        assert_eq!(classify(b"%PDF"), FileKind::Pdf);
        assert_eq!(classify(b"PK\x03\x04"), FileKind::ZipContainer);
        assert_eq!(classify(&[0xFF, 0xD8]), FileKind::Jpeg);
    }

    #[test]
    fn test_truncated_and_empty_input_is_unknown() {
        assert_eq!(classify(&[]), FileKind::Unknown);
        assert_eq!(classify(b"%PD"), FileKind::Unknown);
        assert_eq!(classify(&[0xFF]), FileKind::Unknown);
        // PNG needs all eight bytes
        assert_eq!(classify(&[0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1A]), FileKind::Unknown);
    }

    #[test]
    fn test_signature_must_be_at_start() {
        assert_eq!(classify(b" %PDF-1.4"), FileKind::Unknown);
        assert_eq!(classify(b"hello world"), FileKind::Unknown);
        // PK with a different record type (empty archive marker)
        assert_eq!(classify(b"PK\x05\x06"), FileKind::Unknown);
    }

    #[test]
    fn test_extensions_and_mime_types() {
        assert_eq!(FileKind::Pdf.extension(), Some("pdf"));
        assert_eq!(FileKind::ZipContainer.extension(), Some("zip"));
        assert_eq!(FileKind::Jpeg.extension(), Some("jpg"));
        assert_eq!(FileKind::Png.extension(), Some("png"));
        assert_eq!(FileKind::Unknown.extension(), None);
        assert_eq!(FileKind::ZipContainer.mime_type(), "application/zip");
        assert!(!FileKind::Unknown.is_known());
    }

    #[test]
    fn test_sniff_file_reads_head_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob");
        let mut content = b"%PDF-1.5".to_vec();
        content.extend(std::iter::repeat(0xAB).take(4096));
        std::fs::write(&path, &content).unwrap();

        assert_eq!(sniff_file(&path).unwrap(), FileKind::Pdf);
    }

    #[test]
    fn test_sniff_missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = sniff_file(&dir.path().join("vanished")).unwrap_err();
        assert!(matches!(err, RecoveryError::ClassificationRead { .. }));
    }
}

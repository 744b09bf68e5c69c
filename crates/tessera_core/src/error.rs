//! Error types for segmented virtual file operations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for segmented virtual file operations.
pub type TesseraResult<T> = Result<T, TesseraError>;

/// Errors that can occur when slicing, opening, or driving a segmented file.
#[derive(Debug, Error)]
pub enum TesseraError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The manifest file could not be parsed.
    #[error("manifest parse error: {0}")]
    ManifestParse(#[from] serde_json::Error),

    /// The manifest format version is not recognized.
    ///
    /// No forward or backward compatibility is attempted; any version
    /// other than the current one is fatal at open.
    #[error("unsupported manifest version: {found}")]
    UnsupportedManifestVersion {
        /// The version found in the manifest file.
        found: u32,
    },

    /// The archive layout reported by the format inspector is unusable.
    #[error("invalid archive layout: {message}")]
    InvalidLayout {
        /// Description of the layout fault.
        message: String,
    },

    /// Seek to an offset not covered by any segment.
    #[error("seek outside of all segments: offset {offset}, total size {total}")]
    SeekOutOfRange {
        /// The requested logical offset.
        offset: u64,
        /// The total logical file size.
        total: u64,
    },

    /// A read or write request extends past the end of the active segment.
    ///
    /// A single request must lie entirely inside one segment; the caller
    /// is responsible for aligning its I/O pattern to segment boundaries.
    #[error(
        "request crosses segment boundary: offset {offset}, len {len}, segment ends at {segment_end}"
    )]
    CrossesSegment {
        /// The logical offset of the request.
        offset: u64,
        /// The requested length in bytes.
        len: usize,
        /// The logical end of the active segment.
        segment_end: u64,
    },

    /// A segment file yielded fewer bytes than its recorded size allows.
    ///
    /// The manifest disagrees with the on-disk state; this is an
    /// integrity fault, not a recoverable end-of-file condition.
    #[error("segment truncated: {path:?} yielded fewer than {requested} requested bytes")]
    SegmentTruncated {
        /// Path of the truncated segment file.
        path: PathBuf,
        /// Number of bytes the read requested.
        requested: usize,
    },

    /// The operation is a deliberate capability limitation.
    #[error("unsupported operation: {operation}")]
    Unsupported {
        /// Name of the unsupported operation.
        operation: &'static str,
    },

    /// The file has been closed.
    #[error("file is closed")]
    Closed,
}

impl TesseraError {
    /// Creates an invalid layout error.
    pub fn invalid_layout(message: impl Into<String>) -> Self {
        Self::InvalidLayout {
            message: message.into(),
        }
    }

    /// Creates an unsupported operation error.
    #[must_use]
    pub fn unsupported(operation: &'static str) -> Self {
        Self::Unsupported { operation }
    }
}

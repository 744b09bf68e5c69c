//! Segment descriptors and lazy handle management.
//!
//! A segment is one physical file holding one contiguous sub-range of
//! the logical file. Handles are opened lazily: a segment starts out
//! `Unopened` and resolves to an open file on first access, so archives
//! that are never touched never cost a descriptor or a hit on slow
//! storage.

use crate::error::TesseraResult;
use crate::open::OpenMode;
use std::ffi::OsString;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Storage-class label attached to a segment at slicing time.
///
/// Tier tags are placement hints for the deployment (e.g. which segments
/// to move to archival storage); they carry no runtime behavior and only
/// appear in segment file names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// Frequently accessed.
    Hot,
    /// Infrequently accessed.
    Cold,
}

impl Tier {
    /// The tag as it appears in segment file names.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Hot => "hot",
            Tier::Cold => "cold",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns the segment file path for a logical name, tier tag, and
/// sequence number: `<logical>.tessera.<tier>.<index>`.
#[must_use]
pub fn segment_path(logical: &Path, tier: Tier, index: usize) -> PathBuf {
    let mut name = OsString::from(logical.as_os_str());
    name.push(format!(".tessera.{tier}.{index}"));
    PathBuf::from(name)
}

/// Open state of a segment's physical file.
#[derive(Debug)]
pub(crate) enum SegmentState {
    /// No handle held; the path is opened on first access.
    Unopened,
    /// Handle held for the lifetime of the owning file.
    Open(File),
}

/// One contiguous byte range of the logical file, backed by one
/// physical file.
#[derive(Debug)]
pub struct Segment {
    path: PathBuf,
    size: u64,
    pub(crate) state: SegmentState,
}

impl Segment {
    /// Creates an unopened segment descriptor.
    #[must_use]
    pub fn new(path: PathBuf, size: u64) -> Self {
        Self {
            path,
            size,
            state: SegmentState::Unopened,
        }
    }

    /// Path of the backing physical file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size of the segment in bytes, as recorded in the manifest.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Whether a handle to the physical file is currently held.
    #[must_use]
    pub fn is_open(&self) -> bool {
        matches!(self.state, SegmentState::Open(_))
    }

    /// Resolves the segment to an open handle, opening the physical file
    /// with `mode` on first access. A freshly opened handle is positioned
    /// at physical offset 0.
    pub(crate) fn ensure_open(&mut self, mode: OpenMode) -> TesseraResult<&mut File> {
        if matches!(self.state, SegmentState::Unopened) {
            tracing::trace!(path = %self.path.display(), "opening segment");
            let file = mode.open_options().open(&self.path)?;
            self.state = SegmentState::Open(file);
        }

        match &mut self.state {
            SegmentState::Open(file) => Ok(file),
            SegmentState::Unopened => unreachable!("segment opened above"),
        }
    }

    /// Releases the handle, if any. The segment reverts to `Unopened`.
    pub(crate) fn release(&mut self) {
        self.state = SegmentState::Unopened;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::tempdir;

    #[test]
    fn naming_scheme() {
        assert_eq!(
            segment_path(Path::new("metrics.wsp"), Tier::Cold, 0),
            PathBuf::from("metrics.wsp.tessera.cold.0")
        );
        assert_eq!(
            segment_path(Path::new("metrics.wsp"), Tier::Hot, 3),
            PathBuf::from("metrics.wsp.tessera.hot.3")
        );
    }

    #[test]
    fn starts_unopened_and_opens_once() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("seg");
        std::fs::write(&path, b"abc").unwrap();

        let mut segment = Segment::new(path, 3);
        assert!(!segment.is_open());

        let mut buf = [0u8; 3];
        segment
            .ensure_open(OpenMode::read_only())
            .unwrap()
            .read_exact(&mut buf)
            .unwrap();
        assert_eq!(&buf, b"abc");
        assert!(segment.is_open());

        segment.release();
        assert!(!segment.is_open());
    }

    #[test]
    fn missing_file_surfaces_io_error() {
        let dir = tempdir().unwrap();
        let mut segment = Segment::new(dir.path().join("absent"), 8);

        let result = segment.ensure_open(OpenMode::read_only());
        assert!(matches!(result, Err(crate::TesseraError::Io(_))));
    }
}

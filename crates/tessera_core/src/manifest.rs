//! Manifest persistence for segmented logical files.
//!
//! A sliced logical file `name` is described by a sibling manifest file
//! `name.tessera` holding JSON of the form:
//!
//! ```text
//! { "version": 1, "archives": [ ["name.tessera.cold.0", 28], ... ] }
//! ```
//!
//! Each descriptor is a `(path, size)` pair. Sizes are taken verbatim
//! from the manifest, trusting it over the on-disk files; a mismatch
//! surfaces later as a short-read integrity fault. The manifest is
//! written once by the slicer and never mutated in place.

use crate::error::{TesseraError, TesseraResult};
use crate::segment::Segment;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Current manifest format version.
pub const MANIFEST_VERSION: u32 = 1;

/// Suffix appended to a logical name to derive its manifest path.
pub const MANIFEST_SUFFIX: &str = ".tessera";

/// Returns the manifest path for a logical file name.
#[must_use]
pub fn manifest_path(logical: &Path) -> PathBuf {
    let mut name = OsString::from(logical.as_os_str());
    name.push(MANIFEST_SUFFIX);
    PathBuf::from(name)
}

/// Persisted descriptor for a segmented logical file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Manifest format version.
    pub version: u32,
    /// Ordered segment descriptors: `(path, size)` pairs, ascending and
    /// gapless in logical offset space.
    pub archives: Vec<(PathBuf, u64)>,
}

impl Default for Manifest {
    fn default() -> Self {
        Self::new()
    }
}

impl Manifest {
    /// Creates an empty manifest at the current format version.
    #[must_use]
    pub fn new() -> Self {
        Self {
            version: MANIFEST_VERSION,
            archives: Vec::new(),
        }
    }

    /// Total logical file size: the sum of all segment sizes.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.archives.iter().map(|(_, size)| size).sum()
    }

    /// Builds unopened segment descriptors from the manifest entries.
    #[must_use]
    pub fn segments(&self) -> Vec<Segment> {
        self.archives
            .iter()
            .map(|(path, size)| Segment::new(path.clone(), *size))
            .collect()
    }

    /// Loads and validates a manifest from disk.
    ///
    /// Only the format version is validated here. Internal consistency
    /// (gaplessness, sizes matching the on-disk segment files) is not
    /// checked at open time; inconsistency surfaces when reads or writes
    /// encounter it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid JSON,
    /// or carries an unrecognized format version.
    pub fn load(path: &Path) -> TesseraResult<Self> {
        let data = fs::read_to_string(path)?;
        let manifest: Self = serde_json::from_str(&data)?;

        if manifest.version != MANIFEST_VERSION {
            return Err(TesseraError::UnsupportedManifestVersion {
                found: manifest.version,
            });
        }

        Ok(manifest)
    }

    /// Saves the manifest to disk atomically.
    ///
    /// Uses the write-then-rename pattern for crash safety:
    /// 1. Write to a temporary sibling file
    /// 2. Sync the temporary file to disk
    /// 3. Rename it over the target path
    /// 4. Fsync the parent directory so the rename is durable
    ///
    /// # Errors
    ///
    /// Returns an error if any of the write, sync, or rename steps fail.
    pub fn save(&self, path: &Path) -> TesseraResult<()> {
        let mut temp_name = OsString::from(path.as_os_str());
        temp_name.push(".tmp");
        let temp_path = PathBuf::from(temp_name);

        let data = serde_json::to_vec(self)?;
        let mut file = File::create(&temp_path)?;
        file.write_all(&data)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&temp_path, path)?;
        sync_parent_dir(path)?;

        Ok(())
    }
}

/// Syncs the parent directory of `path` so entry creation, rename, and
/// deletion are durable.
#[cfg(unix)]
pub(crate) fn sync_parent_dir(path: &Path) -> TesseraResult<()> {
    if let Some(parent) = path.parent() {
        let parent = if parent.as_os_str().is_empty() {
            Path::new(".")
        } else {
            parent
        };
        let dir = File::open(parent)?;
        dir.sync_all()?;
    }
    Ok(())
}

/// Syncs the parent directory of `path`.
///
/// Directory fsync is not supported on non-Unix platforms; the NTFS
/// journal covers metadata durability there.
#[cfg(not(unix))]
pub(crate) fn sync_parent_dir(_path: &Path) -> TesseraResult<()> {
    Ok(())
}

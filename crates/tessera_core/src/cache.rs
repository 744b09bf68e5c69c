//! Process-wide manifest cache.
//!
//! Re-opening a hot logical file costs a manifest read and parse every
//! time. A [`ManifestCache`] trades memory (and staleness, though
//! manifests are write-once) for skipping that work. It is an explicit
//! object with an explicit lifecycle, not hidden module state: attach
//! one at startup, hand it to
//! [`open_with_cache`](crate::open_with_cache), clear it on demand.

use crate::error::TesseraResult;
use crate::manifest::Manifest;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Cache from manifest path to parsed manifest.
#[derive(Debug, Default)]
pub struct ManifestCache {
    entries: RwLock<HashMap<PathBuf, Arc<Manifest>>>,
}

impl ManifestCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the manifest at `path`, parsing and caching it on first
    /// access.
    ///
    /// # Errors
    ///
    /// Returns an error if the manifest must be read and the read or
    /// parse fails. Failures are not cached.
    pub fn load(&self, path: &Path) -> TesseraResult<Arc<Manifest>> {
        if let Some(manifest) = self.entries.read().get(path) {
            tracing::trace!(path = %path.display(), "manifest cache hit");
            return Ok(Arc::clone(manifest));
        }

        let manifest = Arc::new(Manifest::load(path)?);
        self.entries
            .write()
            .insert(path.to_path_buf(), Arc::clone(&manifest));
        Ok(manifest)
    }

    /// Drops every cached manifest.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Number of cached manifests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

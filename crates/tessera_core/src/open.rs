//! Opening logical files.
//!
//! [`open`] is the single entry point for consumers: given a logical
//! name it either degrades to the plain file when no manifest is
//! present (byte-for-byte the behavior of never having used this
//! layer) or assembles a [`SegmentedFile`] from the manifest's
//! segments.

use crate::cache::ManifestCache;
use crate::error::{TesseraError, TesseraResult};
use crate::file::SegmentedFile;
use crate::manifest::{manifest_path, Manifest};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Mode flags forwarded to every underlying file open.
///
/// Only read and write matter here; binary mode has no equivalent on
/// Rust file handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenMode {
    read: bool,
    write: bool,
}

impl OpenMode {
    /// Read-only access.
    #[must_use]
    pub const fn read_only() -> Self {
        Self {
            read: true,
            write: false,
        }
    }

    /// Read and write access.
    #[must_use]
    pub const fn read_write() -> Self {
        Self {
            read: true,
            write: true,
        }
    }

    /// Whether writes are permitted.
    #[must_use]
    pub fn writable(&self) -> bool {
        self.write
    }

    pub(crate) fn open_options(&self) -> OpenOptions {
        let mut options = OpenOptions::new();
        options.read(self.read).write(self.write);
        options
    }
}

/// A plain, unsegmented file behind the same surface as
/// [`SegmentedFile`].
///
/// Produced by [`open`] when no manifest exists for the logical name.
#[derive(Debug)]
pub struct PlainFile {
    path: PathBuf,
    file: Option<File>,
}

impl PlainFile {
    fn open(path: &Path, mode: OpenMode) -> TesseraResult<Self> {
        let file = mode.open_options().open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            file: Some(file),
        })
    }

    /// Reads exactly `len` bytes at the current position.
    ///
    /// # Errors
    ///
    /// Returns [`TesseraError::Closed`] after `close`, or the underlying
    /// I/O error (including an unexpected end of file).
    pub fn read(&mut self, len: usize) -> TesseraResult<Vec<u8>> {
        let file = self.file_mut()?;
        let mut buf = vec![0u8; len];
        file.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Writes `data` at the current position.
    ///
    /// # Errors
    ///
    /// Returns [`TesseraError::Closed`] after `close`, or the underlying
    /// I/O error.
    pub fn write(&mut self, data: &[u8]) -> TesseraResult<()> {
        self.file_mut()?.write_all(data)?;
        Ok(())
    }

    /// Seeks the file. All origins are supported; a plain file behaves
    /// exactly as if this layer were never involved.
    ///
    /// # Errors
    ///
    /// Returns [`TesseraError::Closed`] after `close`, or the underlying
    /// I/O error.
    pub fn seek(&mut self, pos: SeekFrom) -> TesseraResult<u64> {
        Ok(self.file_mut()?.seek(pos)?)
    }

    /// Returns the current byte offset.
    ///
    /// # Errors
    ///
    /// Returns [`TesseraError::Closed`] after `close`.
    pub fn tell(&mut self) -> TesseraResult<u64> {
        Ok(self.file_mut()?.stream_position()?)
    }

    /// Flushes buffered writes.
    ///
    /// # Errors
    ///
    /// Returns [`TesseraError::Closed`] after `close`, or the underlying
    /// I/O error.
    pub fn flush(&mut self) -> TesseraResult<()> {
        Ok(self.file_mut()?.flush()?)
    }

    /// Syncs data and metadata to durable storage.
    ///
    /// # Errors
    ///
    /// Returns [`TesseraError::Closed`] after `close`, or the underlying
    /// I/O error.
    pub fn sync_all(&mut self) -> TesseraResult<()> {
        Ok(self.file_mut()?.sync_all()?)
    }

    /// Releases the handle. Idempotent; subsequent I/O fails fast.
    pub fn close(&mut self) {
        self.file = None;
    }

    /// The native descriptor of the underlying file.
    ///
    /// # Errors
    ///
    /// Returns [`TesseraError::Closed`] after `close`.
    #[cfg(unix)]
    pub fn as_raw_fd(&self) -> TesseraResult<std::os::unix::io::RawFd> {
        use std::os::unix::io::AsRawFd;
        match &self.file {
            Some(file) => Ok(file.as_raw_fd()),
            None => Err(TesseraError::Closed),
        }
    }

    /// The path this file was opened from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn file_mut(&mut self) -> TesseraResult<&mut File> {
        self.file.as_mut().ok_or(TesseraError::Closed)
    }
}

/// A logical file: either the plain file itself or a segmented virtual
/// file assembled from a manifest.
#[derive(Debug)]
pub enum LogicalFile {
    /// No manifest existed; this is the file at the logical name.
    Plain(PlainFile),
    /// Assembled from a manifest's segments.
    Segmented(SegmentedFile),
}

impl LogicalFile {
    /// Whether this logical file is backed by segments.
    #[must_use]
    pub fn is_segmented(&self) -> bool {
        matches!(self, LogicalFile::Segmented(_))
    }

    /// Reads exactly `len` bytes at the cursor.
    ///
    /// # Errors
    ///
    /// See [`SegmentedFile::read`] and [`PlainFile::read`].
    pub fn read(&mut self, len: usize) -> TesseraResult<Vec<u8>> {
        match self {
            LogicalFile::Plain(file) => file.read(len),
            LogicalFile::Segmented(file) => file.read(len),
        }
    }

    /// Writes `data` at the cursor.
    ///
    /// # Errors
    ///
    /// See [`SegmentedFile::write`] and [`PlainFile::write`].
    pub fn write(&mut self, data: &[u8]) -> TesseraResult<()> {
        match self {
            LogicalFile::Plain(file) => file.write(data),
            LogicalFile::Segmented(file) => file.write(data),
        }
    }

    /// Seeks the logical cursor.
    ///
    /// The segmented variant supports only [`SeekFrom::Start`]; the
    /// plain variant delegates every origin to the OS file.
    ///
    /// # Errors
    ///
    /// See [`SegmentedFile::seek`] and [`PlainFile::seek`].
    pub fn seek(&mut self, pos: SeekFrom) -> TesseraResult<u64> {
        match self {
            LogicalFile::Plain(file) => file.seek(pos),
            LogicalFile::Segmented(file) => file.seek(pos),
        }
    }

    /// Returns the current logical byte offset.
    ///
    /// # Errors
    ///
    /// Returns [`TesseraError::Closed`] if the plain variant is closed.
    pub fn tell(&mut self) -> TesseraResult<u64> {
        match self {
            LogicalFile::Plain(file) => file.tell(),
            LogicalFile::Segmented(file) => Ok(file.tell()),
        }
    }

    /// Flushes buffered writes.
    ///
    /// # Errors
    ///
    /// See [`SegmentedFile::flush`] and [`PlainFile::flush`].
    pub fn flush(&mut self) -> TesseraResult<()> {
        match self {
            LogicalFile::Plain(file) => file.flush(),
            LogicalFile::Segmented(file) => file.flush(),
        }
    }

    /// Syncs data and metadata to durable storage.
    ///
    /// # Errors
    ///
    /// See [`SegmentedFile::sync_all`] and [`PlainFile::sync_all`].
    pub fn sync_all(&mut self) -> TesseraResult<()> {
        match self {
            LogicalFile::Plain(file) => file.sync_all(),
            LogicalFile::Segmented(file) => file.sync_all(),
        }
    }

    /// Releases all handles. Idempotent.
    pub fn close(&mut self) {
        match self {
            LogicalFile::Plain(file) => file.close(),
            LogicalFile::Segmented(file) => file.close(),
        }
    }

    /// The native descriptor, where one exists.
    ///
    /// # Errors
    ///
    /// [`TesseraError::Unsupported`] for the segmented variant: a
    /// segmented file has no single native descriptor.
    #[cfg(unix)]
    pub fn as_raw_fd(&self) -> TesseraResult<std::os::unix::io::RawFd> {
        match self {
            LogicalFile::Plain(file) => file.as_raw_fd(),
            LogicalFile::Segmented(file) => file.as_raw_fd(),
        }
    }
}

/// Opens a logical file.
///
/// If no manifest exists for `logical`, the name is opened as an
/// ordinary file: pass-through compatibility, indistinguishable from
/// never having sliced it. Otherwise the manifest is loaded, its format
/// version validated, and a [`SegmentedFile`] assembled over its
/// segments with `mode` forwarded to each segment open.
///
/// # Errors
///
/// Returns an error if the plain file cannot be opened, the manifest is
/// unreadable or carries an unsupported version, or the segment list is
/// empty.
pub fn open(logical: &Path, mode: OpenMode) -> TesseraResult<LogicalFile> {
    let manifest_file = manifest_path(logical);
    if !manifest_file.exists() {
        tracing::debug!(path = %logical.display(), "no manifest, opening plain file");
        return Ok(LogicalFile::Plain(PlainFile::open(logical, mode)?));
    }

    let manifest = Manifest::load(&manifest_file)?;
    segmented(logical, &manifest, mode)
}

/// Opens a logical file, resolving the manifest through `cache`.
///
/// Behaves like [`open`] but avoids re-reading and re-parsing the
/// manifest on hot paths. The existence check still hits the
/// filesystem on every call.
///
/// # Errors
///
/// See [`open`].
pub fn open_with_cache(
    logical: &Path,
    mode: OpenMode,
    cache: &ManifestCache,
) -> TesseraResult<LogicalFile> {
    let manifest_file = manifest_path(logical);
    if !manifest_file.exists() {
        tracing::debug!(path = %logical.display(), "no manifest, opening plain file");
        return Ok(LogicalFile::Plain(PlainFile::open(logical, mode)?));
    }

    let manifest = cache.load(&manifest_file)?;
    segmented(logical, &manifest, mode)
}

fn segmented(logical: &Path, manifest: &Manifest, mode: OpenMode) -> TesseraResult<LogicalFile> {
    tracing::debug!(
        path = %logical.display(),
        segments = manifest.archives.len(),
        total = manifest.total_size(),
        "opening segmented file"
    );
    let file = SegmentedFile::new(logical.to_path_buf(), manifest.segments(), mode)?;
    Ok(LogicalFile::Segmented(file))
}

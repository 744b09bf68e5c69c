//! The segmented virtual file.
//!
//! A [`SegmentedFile`] presents an ordered list of segments as one
//! logically contiguous file with a single byte-addressable cursor. The
//! caller drives it exactly like a plain file handle, under one
//! contract: a single read or write must never span a segment boundary.
//! The format-aware consumer is responsible for aligning its I/O
//! pattern; the virtual file never assembles a request from multiple
//! segments.

use crate::error::{TesseraError, TesseraResult};
use crate::open::OpenMode;
use crate::segment::{Segment, SegmentState};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// N physical segment files behaving as one logical file.
///
/// Cursor bookkeeping is maintained so that at all times the active
/// segment's physical cursor equals `cursor - active_start`. Segment
/// handles are opened lazily on first access and owned exclusively by
/// this instance until [`close`](SegmentedFile::close).
///
/// Not safe for concurrent use without external serialization.
#[derive(Debug)]
pub struct SegmentedFile {
    /// Logical name this file was opened under.
    path: PathBuf,
    /// Mode forwarded to every segment open.
    mode: OpenMode,
    segments: Vec<Segment>,
    /// Cumulative segment sizes; `boundaries[i]` is the logical end of
    /// segment `i`, strictly increasing, last entry equals `total`.
    boundaries: Vec<u64>,
    total: u64,
    /// Current logical byte offset, `0 <= cursor <= total`.
    cursor: u64,
    active: usize,
    active_start: u64,
    active_end: u64,
    closed: bool,
}

impl SegmentedFile {
    /// Constructs a segmented file over an ordered segment list.
    ///
    /// The cursor starts at offset 0 with the first segment active. No
    /// segment file is opened until first access.
    ///
    /// # Errors
    ///
    /// Returns an error if the segment list is empty.
    pub fn new(path: PathBuf, segments: Vec<Segment>, mode: OpenMode) -> TesseraResult<Self> {
        if segments.is_empty() {
            return Err(TesseraError::invalid_layout("no segments to assemble"));
        }

        let mut boundaries = Vec::with_capacity(segments.len());
        let mut total = 0u64;
        for segment in &segments {
            total += segment.size();
            boundaries.push(total);
        }

        Ok(Self {
            path,
            mode,
            active: 0,
            active_start: 0,
            active_end: boundaries[0],
            total,
            cursor: 0,
            boundaries,
            segments,
            closed: false,
        })
    }

    /// Reads exactly `len` bytes at the cursor from the active segment.
    ///
    /// The request must lie entirely inside the active segment
    /// (`cursor + len <= active segment end`). A read that exactly fills
    /// the active segment eagerly activates the next one, so the
    /// following read finds it positioned at physical offset 0 without
    /// an intervening seek. There is deliberately no read-to-end
    /// variant: "end" is ill-defined per segment.
    ///
    /// # Errors
    ///
    /// - [`TesseraError::CrossesSegment`] if the request extends past
    ///   the active segment
    /// - [`TesseraError::SegmentTruncated`] if the segment file yields
    ///   fewer than `len` bytes; the manifest disagrees with the on-disk
    ///   state and no partial data is returned
    /// - [`TesseraError::Closed`] after `close`
    pub fn read(&mut self, len: usize) -> TesseraResult<Vec<u8>> {
        self.check_open()?;

        let end = self.cursor.saturating_add(len as u64);
        if end > self.active_end {
            return Err(TesseraError::CrossesSegment {
                offset: self.cursor,
                len,
                segment_end: self.active_end,
            });
        }

        let mode = self.mode;
        let segment = &mut self.segments[self.active];
        let segment_path = segment.path().to_path_buf();
        let file = segment.ensure_open(mode)?;

        let mut buf = vec![0u8; len];
        file.read_exact(&mut buf).map_err(|err| match err.kind() {
            ErrorKind::UnexpectedEof => TesseraError::SegmentTruncated {
                path: segment_path,
                requested: len,
            },
            _ => TesseraError::Io(err),
        })?;

        self.cursor = end;
        // End-of-file is not a crossing event; the last segment stays
        // active once the cursor reaches the total size.
        if self.cursor == self.active_end && self.cursor != self.total {
            self.activate(self.active + 1, self.cursor)?;
        }

        Ok(buf)
    }

    /// Writes `data` at the cursor into the active segment.
    ///
    /// Same boundary precondition as [`read`](SegmentedFile::read).
    /// Unlike reads, a write that exactly fills the active segment does
    /// **not** advance to the next one; a subsequent write at the
    /// boundary requires an explicit `seek` first.
    ///
    /// # Errors
    ///
    /// Returns [`TesseraError::CrossesSegment`] if the request extends
    /// past the active segment, [`TesseraError::Closed`] after `close`,
    /// or the underlying I/O error.
    pub fn write(&mut self, data: &[u8]) -> TesseraResult<()> {
        self.check_open()?;

        let end = self.cursor.saturating_add(data.len() as u64);
        if end > self.active_end {
            return Err(TesseraError::CrossesSegment {
                offset: self.cursor,
                len: data.len(),
                segment_end: self.active_end,
            });
        }

        let mode = self.mode;
        let file = self.segments[self.active].ensure_open(mode)?;
        file.write_all(data)?;

        self.cursor = end;
        Ok(())
    }

    /// Seeks to an absolute logical offset.
    ///
    /// Only [`SeekFrom::Start`] is supported; seeking relative to the
    /// current position or to the end is a deliberate capability
    /// limitation. `offset == total_size` is a valid end-of-file
    /// position. A failed seek leaves the cursor unchanged.
    ///
    /// # Errors
    ///
    /// - [`TesseraError::Unsupported`] for `Current`/`End` origins
    /// - [`TesseraError::SeekOutOfRange`] if no segment covers `offset`
    /// - [`TesseraError::Closed`] after `close`
    pub fn seek(&mut self, pos: SeekFrom) -> TesseraResult<u64> {
        self.check_open()?;

        let offset = match pos {
            SeekFrom::Start(offset) => offset,
            SeekFrom::Current(_) => {
                return Err(TesseraError::unsupported(
                    "seek relative to current position",
                ))
            }
            SeekFrom::End(_) => return Err(TesseraError::unsupported("seek relative to end")),
        };

        if offset >= self.active_start && offset < self.active_end {
            // Inside the active range: position the active segment
            // directly, no boundary search.
            self.activate(self.active, offset)?;
        } else {
            let index = self.locate(offset)?;
            self.activate(index, offset)?;
        }

        Ok(offset)
    }

    /// Returns the current logical byte offset. No side effects.
    #[must_use]
    pub fn tell(&self) -> u64 {
        self.cursor
    }

    /// Flushes every open segment handle.
    ///
    /// Segments that were never touched hold no handle and nothing to
    /// flush.
    ///
    /// # Errors
    ///
    /// Returns [`TesseraError::Closed`] after `close`, or the first
    /// underlying I/O error.
    pub fn flush(&mut self) -> TesseraResult<()> {
        self.check_open()?;
        for segment in &mut self.segments {
            if let SegmentState::Open(file) = &mut segment.state {
                file.flush()?;
            }
        }
        Ok(())
    }

    /// Syncs every open segment's data and metadata to durable storage.
    ///
    /// The stronger sibling of [`flush`](SegmentedFile::flush).
    ///
    /// # Errors
    ///
    /// Returns [`TesseraError::Closed`] after `close`, or the first
    /// underlying I/O error.
    pub fn sync_all(&mut self) -> TesseraResult<()> {
        self.check_open()?;
        for segment in &mut self.segments {
            if let SegmentState::Open(file) = &mut segment.state {
                file.sync_all()?;
            }
        }
        Ok(())
    }

    /// Releases every segment handle. Idempotent.
    ///
    /// Subsequent reads, writes, seeks, and flushes fail with
    /// [`TesseraError::Closed`].
    pub fn close(&mut self) {
        for segment in &mut self.segments {
            segment.release();
        }
        self.closed = true;
    }

    /// A segmented file has no single native descriptor, so any caller
    /// depending on one (e.g. to request an OS-level sync) is denied
    /// explicitly rather than handed a descriptor for only one segment.
    ///
    /// # Errors
    ///
    /// Always returns [`TesseraError::Unsupported`].
    #[cfg(unix)]
    pub fn as_raw_fd(&self) -> TesseraResult<std::os::unix::io::RawFd> {
        Err(TesseraError::unsupported("raw file descriptor"))
    }

    /// The logical name this file was opened under.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Total logical file size: the sum of all segment sizes.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.total
    }

    /// Number of segments backing this file.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Whether `close` has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn check_open(&self) -> TesseraResult<()> {
        if self.closed {
            return Err(TesseraError::Closed);
        }
        Ok(())
    }

    /// Finds the segment whose logical range contains `offset`: the
    /// first index `i` with `offset < boundaries[i]`. `offset == total`
    /// resolves to the last segment.
    fn locate(&self, offset: u64) -> TesseraResult<usize> {
        if offset == self.total {
            return Ok(self.segments.len() - 1);
        }
        self.boundaries
            .iter()
            .position(|&end| offset < end)
            .ok_or(TesseraError::SeekOutOfRange {
                offset,
                total: self.total,
            })
    }

    /// Makes segment `index` active with the cursor at logical `offset`,
    /// positioning its physical cursor at `offset - segment start`.
    ///
    /// An unopened segment with a zero delta is left untouched: a fresh
    /// handle starts at physical offset 0, and the segment may never be
    /// accessed at all. An existing handle's position is unknown here,
    /// so it is always seeked. State is committed only after the
    /// physical positioning succeeds.
    fn activate(&mut self, index: usize, offset: u64) -> TesseraResult<()> {
        let start = if index == 0 {
            0
        } else {
            self.boundaries[index - 1]
        };
        let delta = offset - start;

        let mode = self.mode;
        let segment = &mut self.segments[index];
        match segment.state {
            SegmentState::Unopened if delta == 0 => {}
            _ => {
                let file = segment.ensure_open(mode)?;
                file.seek(SeekFrom::Start(delta))?;
            }
        }

        if index != self.active {
            tracing::trace!(from = self.active, to = index, offset, "switching active segment");
        }
        self.active = index;
        self.active_start = start;
        self.active_end = self.boundaries[index];
        self.cursor = offset;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{tempdir, TempDir};

    /// Writes segment files of the given sizes filled with a counting
    /// byte pattern and returns them with the full logical content.
    fn make_segments(sizes: &[usize]) -> (TempDir, Vec<Segment>, Vec<u8>) {
        let dir = tempdir().unwrap();
        let mut segments = Vec::new();
        let mut content = Vec::new();
        let mut counter = 0u8;

        for (i, &size) in sizes.iter().enumerate() {
            let bytes: Vec<u8> = (0..size)
                .map(|_| {
                    counter = counter.wrapping_add(1);
                    counter
                })
                .collect();
            let path = dir.path().join(format!("seg.{i}"));
            std::fs::write(&path, &bytes).unwrap();
            content.extend_from_slice(&bytes);
            segments.push(Segment::new(path, size as u64));
        }

        (dir, segments, content)
    }

    fn open_fixture(sizes: &[usize]) -> (TempDir, SegmentedFile, Vec<u8>) {
        let (dir, segments, content) = make_segments(sizes);
        let file = SegmentedFile::new(
            dir.path().join("logical"),
            segments,
            OpenMode::read_write(),
        )
        .unwrap();
        (dir, file, content)
    }

    #[test]
    fn empty_segment_list_rejected() {
        let result = SegmentedFile::new(
            PathBuf::from("logical"),
            Vec::new(),
            OpenMode::read_only(),
        );
        assert!(matches!(result, Err(TesseraError::InvalidLayout { .. })));
    }

    #[test]
    fn sequential_reads_cross_boundaries_eagerly() {
        // Segment sizes [10, 20, 5], total 35.
        let (_dir, mut file, content) = open_fixture(&[10, 20, 5]);
        assert_eq!(file.total_size(), 35);

        file.seek(SeekFrom::Start(10)).unwrap();
        let middle = file.read(20).unwrap();
        assert_eq!(middle, &content[10..30]);
        assert_eq!(file.tell(), 30);

        // The read exactly filled segment 1; segment 2 must already be
        // active without an explicit seek(30).
        let tail = file.read(5).unwrap();
        assert_eq!(tail, &content[30..35]);
        assert_eq!(file.tell(), 35);

        // End of file: read(0) succeeds and returns nothing.
        assert!(file.read(0).unwrap().is_empty());
        assert_eq!(file.tell(), 35);
    }

    #[test]
    fn read_from_start_walks_every_segment() {
        let (_dir, mut file, content) = open_fixture(&[10, 20, 5]);

        let mut assembled = Vec::new();
        for len in [10, 20, 5] {
            assembled.extend(file.read(len).unwrap());
        }
        assert_eq!(assembled, content);
    }

    #[test]
    fn seek_then_tell_round_trips() {
        let (_dir, mut file, _) = open_fixture(&[10, 20, 5]);

        for offset in [0u64, 5, 9, 10, 11, 29, 30, 34, 35] {
            assert_eq!(file.seek(SeekFrom::Start(offset)).unwrap(), offset);
            assert_eq!(file.tell(), offset);
        }
    }

    #[test]
    fn seek_past_end_fails_and_leaves_cursor() {
        let (_dir, mut file, _) = open_fixture(&[10, 20, 5]);

        file.seek(SeekFrom::Start(12)).unwrap();
        let result = file.seek(SeekFrom::Start(36));
        assert!(matches!(
            result,
            Err(TesseraError::SeekOutOfRange { offset: 36, total: 35 })
        ));
        assert_eq!(file.tell(), 12);
    }

    #[test]
    fn relative_seeks_are_unsupported() {
        let (_dir, mut file, _) = open_fixture(&[10, 20, 5]);

        assert!(matches!(
            file.seek(SeekFrom::Current(4)),
            Err(TesseraError::Unsupported { .. })
        ));
        assert!(matches!(
            file.seek(SeekFrom::End(0)),
            Err(TesseraError::Unsupported { .. })
        ));
    }

    #[test]
    fn read_crossing_boundary_is_rejected() {
        let (_dir, mut file, _) = open_fixture(&[10, 20, 5]);

        file.seek(SeekFrom::Start(5)).unwrap();
        let result = file.read(10);
        assert!(matches!(
            result,
            Err(TesseraError::CrossesSegment {
                offset: 5,
                len: 10,
                segment_end: 10,
            })
        ));
        // The failed request must not move the cursor.
        assert_eq!(file.tell(), 5);
    }

    #[test]
    fn write_fills_segment_without_advancing() {
        let (_dir, mut file, _) = open_fixture(&[10, 20, 5]);

        file.write(&[0xAA; 10]).unwrap();
        assert_eq!(file.tell(), 10);

        // No eager switch on writes: the next write at the boundary
        // still targets the exhausted segment.
        let result = file.write(&[0xBB; 4]);
        assert!(matches!(result, Err(TesseraError::CrossesSegment { .. })));

        // An explicit seek re-arms it.
        file.seek(SeekFrom::Start(10)).unwrap();
        file.write(&[0xBB; 4]).unwrap();
        assert_eq!(file.tell(), 14);

        file.seek(SeekFrom::Start(0)).unwrap();
        assert_eq!(file.read(10).unwrap(), vec![0xAA; 10]);
        assert_eq!(file.read(4).unwrap(), vec![0xBB; 4]);
    }

    #[test]
    fn truncated_segment_is_an_integrity_fault() {
        let (dir, segments, _) = make_segments(&[10, 20]);
        // Cut the second segment short of its recorded size.
        let short_path = dir.path().join("seg.1");
        std::fs::write(&short_path, b"abc").unwrap();

        let mut file = SegmentedFile::new(
            dir.path().join("logical"),
            segments,
            OpenMode::read_only(),
        )
        .unwrap();

        file.seek(SeekFrom::Start(10)).unwrap();
        let result = file.read(20);
        assert!(matches!(
            result,
            Err(TesseraError::SegmentTruncated { requested: 20, .. })
        ));
    }

    #[test]
    fn untouched_segments_stay_unopened() {
        let (dir, segments, content) = make_segments(&[10, 20, 5]);
        // Remove a segment that the access pattern below never touches.
        std::fs::remove_file(dir.path().join("seg.2")).unwrap();

        let mut file = SegmentedFile::new(
            dir.path().join("logical"),
            segments,
            OpenMode::read_only(),
        )
        .unwrap();

        assert_eq!(file.read(10).unwrap(), &content[..10]);
        file.seek(SeekFrom::Start(15)).unwrap();
        assert_eq!(file.read(10).unwrap(), &content[15..25]);

        // Touching the missing segment surfaces the underlying error.
        file.seek(SeekFrom::Start(30)).unwrap();
        assert!(matches!(file.read(5), Err(TesseraError::Io(_))));
    }

    #[test]
    fn io_after_close_fails_fast() {
        let (_dir, mut file, _) = open_fixture(&[10, 20, 5]);

        file.read(4).unwrap();
        file.close();
        file.close(); // idempotent

        assert!(file.is_closed());
        assert!(matches!(file.read(1), Err(TesseraError::Closed)));
        assert!(matches!(file.write(b"x"), Err(TesseraError::Closed)));
        assert!(matches!(
            file.seek(SeekFrom::Start(0)),
            Err(TesseraError::Closed)
        ));
        assert!(matches!(file.flush(), Err(TesseraError::Closed)));
    }

    #[cfg(unix)]
    #[test]
    fn raw_descriptor_is_denied() {
        let (_dir, file, _) = open_fixture(&[10, 20, 5]);
        assert!(matches!(
            file.as_raw_fd(),
            Err(TesseraError::Unsupported { .. })
        ));
    }

    #[test]
    fn reads_after_seek_back_into_visited_segment() {
        let (_dir, mut file, content) = open_fixture(&[10, 20, 5]);

        // Visit segment 1, then come back to it at a different offset;
        // the already-open handle must be repositioned.
        file.seek(SeekFrom::Start(10)).unwrap();
        file.read(20).unwrap();
        file.seek(SeekFrom::Start(12)).unwrap();
        assert_eq!(file.read(8).unwrap(), &content[12..20]);

        // Returning to a visited segment's start must also reposition.
        file.seek(SeekFrom::Start(10)).unwrap();
        assert_eq!(file.read(4).unwrap(), &content[10..14]);
    }
}

//! One-shot migration of a monolithic file into manifest + segments.
//!
//! The slicer consults the format inspector for archive boundaries,
//! copies the header prefix and each archive region into its own
//! segment file, persists the manifest, and removes the original.
//!
//! The procedure is not transactional. A crash while segments are being
//! written leaves the original file intact and the opener's plain-file
//! fallback working; only the narrow window between manifest durability
//! and original deletion can leave both paths alive at once. The
//! original is deleted strictly last, after every segment and the
//! manifest have been synced to disk.
//!
//! The slicer requires exclusive access to the logical name for its
//! duration; it is non-reentrant and deliberately unguarded, so
//! exclusion is the caller's responsibility.

use crate::error::{TesseraError, TesseraResult};
use crate::inspect::FormatInspector;
use crate::manifest::{manifest_path, sync_parent_dir, Manifest};
use crate::segment::{segment_path, Tier};
use std::fs::{self, File};
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

/// Transforms the monolithic file at `logical` into a manifest plus
/// segment files, removing the original.
///
/// Segment 0 holds the header prefix (everything before the first
/// archive region), tagged `cold`; archive regions follow as segments
/// `1..`, tagged `hot` except the last, which is tagged `cold`. Tier
/// tags are placement hints embedded in file names only.
///
/// # Errors
///
/// Returns an error if the inspector reports no regions or a region
/// outside the file, or if any copy, sync, manifest write, or deletion
/// fails. On error the original file is left in place unless the
/// failure occurred during the final deletion itself.
pub fn slice(logical: &Path, inspector: &dyn FormatInspector) -> TesseraResult<()> {
    let regions = inspector.archive_regions(logical)?;
    if regions.is_empty() {
        return Err(TesseraError::invalid_layout("no archive regions"));
    }

    let header_len = regions[0].offset;
    if header_len == 0 {
        return Err(TesseraError::invalid_layout(
            "first archive region starts at offset 0, leaving no header prefix",
        ));
    }

    let original_len = fs::metadata(logical)?.len();
    let mut original = File::open(logical)?;
    let mut manifest = Manifest::new();

    tracing::debug!(
        path = %logical.display(),
        archives = regions.len(),
        total = original_len,
        "slicing monolithic file"
    );

    let header_path = segment_path(logical, Tier::Cold, 0);
    copy_region(&mut original, &header_path, 0, header_len, original_len)?;
    manifest.archives.push((header_path, header_len));

    let total_archives = regions.len();
    for (i, region) in regions.iter().enumerate() {
        let tier = if i + 1 == total_archives {
            Tier::Cold
        } else {
            Tier::Hot
        };
        let path = segment_path(logical, tier, i + 1);
        copy_region(&mut original, &path, region.offset, region.size, original_len)?;
        tracing::debug!(path = %path.display(), size = region.size, "wrote segment");
        manifest.archives.push((path, region.size));
    }
    drop(original);

    sync_parent_dir(logical)?;
    manifest.save(&manifest_path(logical))?;

    // Deleted strictly last: any crash before this point leaves the
    // plain-file fallback working.
    fs::remove_file(logical)?;
    sync_parent_dir(logical)?;

    Ok(())
}

/// Copies `len` bytes at `offset` of the original into a new segment
/// file and syncs it.
fn copy_region(
    original: &mut File,
    dest: &Path,
    offset: u64,
    len: u64,
    original_len: u64,
) -> TesseraResult<()> {
    let end = offset.saturating_add(len);
    if end > original_len {
        return Err(TesseraError::invalid_layout(format!(
            "region [{offset}, {end}) extends past end of file ({original_len} bytes)"
        )));
    }

    original.seek(SeekFrom::Start(offset))?;
    let mut segment = File::create(dest)?;
    let copied = io::copy(&mut original.by_ref().take(len), &mut segment)?;
    if copied != len {
        return Err(TesseraError::invalid_layout(format!(
            "short copy into {}: {copied} of {len} bytes",
            dest.display()
        )));
    }
    segment.sync_all()?;

    Ok(())
}

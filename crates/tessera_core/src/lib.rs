//! # Tessera Core
//!
//! Segmented virtual file layer for fixed-layout binary formats.
//!
//! Tessera makes N physically separate files behave, to any reader or
//! writer, as one logically contiguous file with a single
//! byte-addressable cursor. A round-robin time-series database file (a
//! header followed by consecutive fixed-size archive regions) can be
//! split across storage locations, hot archives on fast storage and
//! cold ones on archival storage, without changing the code that reads
//! and writes the format.
//!
//! ## Design Principles
//!
//! - The caller's I/O pattern never spans a segment boundary within one
//!   request; the layer never assembles a read from multiple segments
//! - Segment handles are opened lazily and owned exclusively
//! - No knowledge of the host format: archive boundaries come from a
//!   [`FormatInspector`] collaborator
//! - Single-threaded, synchronous, blocking I/O; no internal retries
//!
//! ## Components
//!
//! - [`slice`] - one-shot migration of a monolithic file into a
//!   manifest plus segment files
//! - [`open`] - entry point: plain-file pass-through when no manifest
//!   exists, otherwise a [`SegmentedFile`] over the manifest's segments
//! - [`ManifestCache`] - optional cache of parsed manifests for hot
//!   open paths
//!
//! ## Example
//!
//! ```no_run
//! use tessera_core::{open, slice, FixedLayout, OpenMode};
//! use std::io::SeekFrom;
//! use std::path::Path;
//!
//! # fn main() -> tessera_core::TesseraResult<()> {
//! let logical = Path::new("metrics.wsp");
//!
//! // One-time migration: header of 28 bytes, two archives.
//! slice(logical, &FixedLayout::new(28, vec![720, 180]))?;
//!
//! // Every later access goes through the same entry point.
//! let mut file = open(logical, OpenMode::read_only())?;
//! file.seek(SeekFrom::Start(28))?;
//! let points = file.read(720)?;
//! # let _ = points;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

/// Crate version, as reported by CLI tooling.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

mod cache;
mod error;
mod file;
mod inspect;
mod manifest;
mod open;
mod segment;
mod slice;

pub use cache::ManifestCache;
pub use error::{TesseraError, TesseraResult};
pub use file::SegmentedFile;
pub use inspect::{FixedLayout, FormatInspector, Region};
pub use manifest::{manifest_path, Manifest, MANIFEST_SUFFIX, MANIFEST_VERSION};
pub use open::{open, open_with_cache, LogicalFile, OpenMode, PlainFile};
pub use segment::{segment_path, Segment, Tier};
pub use slice::slice;

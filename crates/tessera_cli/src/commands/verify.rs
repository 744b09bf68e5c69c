//! Verify command implementation.

use std::io::SeekFrom;
use std::path::Path;
use tessera_core::{manifest_path, open, Manifest, OpenMode};

/// Verification result.
#[derive(Debug)]
pub struct VerifyResult {
    /// Number of segments checked.
    pub segments_checked: usize,
    /// Bytes streamed during a deep check.
    pub bytes_read: u64,
    /// List of problems found.
    pub errors: Vec<String>,
}

impl VerifyResult {
    fn new() -> Self {
        Self {
            segments_checked: 0,
            bytes_read: 0,
            errors: Vec::new(),
        }
    }

    fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Runs the verify command.
pub fn run(file: &Path, deep: bool) -> Result<(), Box<dyn std::error::Error>> {
    println!("Verifying {file:?}");
    println!();

    let manifest_file = manifest_path(file);
    if !manifest_file.exists() {
        return Err(format!("no manifest found at {manifest_file:?}").into());
    }

    let manifest = Manifest::load(&manifest_file)?;
    let mut result = VerifyResult::new();

    for (path, size) in &manifest.archives {
        result.segments_checked += 1;
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() == *size => {}
            Ok(meta) => result.errors.push(format!(
                "{}: recorded {} bytes, found {}",
                path.display(),
                size,
                meta.len()
            )),
            Err(err) => result.errors.push(format!("{}: {err}", path.display())),
        }
    }

    if deep && result.is_ok() {
        match stream_all(file, &manifest) {
            Ok(bytes) => result.bytes_read = bytes,
            Err(err) => result.errors.push(format!("deep read failed: {err}")),
        }
    }

    println!("Checked {} segments", result.segments_checked);
    if deep {
        println!("Streamed {} bytes", result.bytes_read);
    }
    for error in &result.errors {
        println!("  error: {error}");
    }

    println!();
    if result.is_ok() {
        println!("✓ Verification passed");
        Ok(())
    } else {
        println!("✗ Verification failed");
        Err("verification failed".into())
    }
}

/// Streams the whole logical file with segment-aligned, bounded reads.
fn stream_all(file: &Path, manifest: &Manifest) -> Result<u64, Box<dyn std::error::Error>> {
    let mut logical = open(file, OpenMode::read_only())?;
    logical.seek(SeekFrom::Start(0))?;

    let mut total = 0u64;
    for (_, size) in &manifest.archives {
        // Chunks stay inside the current segment; the eager switch on an
        // exactly-filling read carries the cursor into the next one.
        let mut remaining = *size;
        while remaining > 0 {
            let chunk = remaining.min(64 * 1024) as usize;
            let bytes = logical.read(chunk)?;
            total += bytes.len() as u64;
            remaining -= bytes.len() as u64;
        }
    }

    Ok(total)
}

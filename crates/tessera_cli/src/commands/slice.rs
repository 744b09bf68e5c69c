//! Slice command implementation.

use std::path::Path;
use tessera_core::{manifest_path, slice, FixedLayout, Manifest};
use tracing::info;

/// Runs the slice command.
pub fn run(file: &Path, header: u64, archives: &[u64]) -> Result<(), Box<dyn std::error::Error>> {
    if archives.is_empty() {
        return Err("at least one archive size is required".into());
    }

    info!(file = %file.display(), header, archives = archives.len(), "slicing");

    let layout = FixedLayout::new(header, archives.to_vec());
    slice(file, &layout)?;

    let manifest = Manifest::load(&manifest_path(file))?;
    println!("Sliced {:?} into {} segments:", file, manifest.archives.len());
    for (path, size) in &manifest.archives {
        println!("  {size:>12}  {}", path.display());
    }
    println!("Total: {} bytes", manifest.total_size());

    Ok(())
}

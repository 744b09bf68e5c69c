//! Inspect command implementation.

use serde::Serialize;
use std::path::Path;
use tessera_core::{manifest_path, Manifest};

/// Manifest inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Logical file path.
    pub path: String,
    /// Manifest format version.
    pub version: u32,
    /// Total logical size in bytes.
    pub total_size: u64,
    /// Per-segment details.
    pub segments: Vec<SegmentInfo>,
}

/// Details for a single segment.
#[derive(Debug, Serialize)]
pub struct SegmentInfo {
    /// Segment file path.
    pub path: String,
    /// Size recorded in the manifest.
    pub size: u64,
    /// Actual on-disk size, if the file exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_disk: Option<u64>,
}

/// Runs the inspect command.
pub fn run(file: &Path, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let manifest_file = manifest_path(file);
    if !manifest_file.exists() {
        return Err(format!("no manifest found at {manifest_file:?}").into());
    }

    let manifest = Manifest::load(&manifest_file)?;

    let segments = manifest
        .archives
        .iter()
        .map(|(path, size)| SegmentInfo {
            path: path.display().to_string(),
            size: *size,
            on_disk: std::fs::metadata(path).ok().map(|meta| meta.len()),
        })
        .collect();

    let result = InspectResult {
        path: file.display().to_string(),
        version: manifest.version,
        total_size: manifest.total_size(),
        segments,
    };

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            print_text_output(&result);
        }
    }

    Ok(())
}

fn print_text_output(result: &InspectResult) {
    println!("Manifest for {}", result.path);
    println!("  Version:    {}", result.version);
    println!("  Total size: {} bytes", result.total_size);
    println!("  Segments:   {}", result.segments.len());
    for segment in &result.segments {
        let on_disk = match segment.on_disk {
            Some(len) => format!("{len} bytes on disk"),
            None => "missing".to_string(),
        };
        println!("    {:>10}  {}  ({on_disk})", segment.size, segment.path);
    }
}

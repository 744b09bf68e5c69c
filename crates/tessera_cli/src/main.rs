//! Tessera CLI
//!
//! Command-line tools for slicing and managing segmented virtual files.
//!
//! # Commands
//!
//! - `slice` - Split a monolithic file into a manifest plus tiered segments
//! - `inspect` - Display a segmented file's manifest
//! - `verify` - Check segments against the manifest

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Tessera command-line tools.
#[derive(Parser)]
#[command(name = "tessera")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Split a monolithic file into a manifest plus tiered segments
    Slice {
        /// Path to the monolithic file
        file: PathBuf,

        /// Header prefix length in bytes
        #[arg(long)]
        header: u64,

        /// Comma-separated archive sizes in bytes, in file order
        #[arg(long, value_delimiter = ',', required = true)]
        archives: Vec<u64>,
    },

    /// Display a segmented file's manifest
    Inspect {
        /// Path to the logical file
        file: PathBuf,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Verify segments against the manifest
    Verify {
        /// Path to the logical file
        file: PathBuf,

        /// Also stream every byte through the virtual file
        #[arg(long)]
        deep: bool,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Slice {
            file,
            header,
            archives,
        } => {
            commands::slice::run(&file, header, &archives)?;
        }
        Commands::Inspect { file, format } => {
            commands::inspect::run(&file, &format)?;
        }
        Commands::Verify { file, deep } => {
            commands::verify::run(&file, deep)?;
        }
        Commands::Version => {
            println!("Tessera CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("Tessera Core v{}", tessera_core::VERSION);
        }
    }

    Ok(())
}

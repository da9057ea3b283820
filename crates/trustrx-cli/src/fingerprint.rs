//! # Fingerprint Subcommand
//!
//! Prints the SHA-256 fingerprint of a file as 64 lowercase hex
//! characters. Reads the file in chunks; nothing touches the ledger.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use trustrx_core::Fingerprint;

/// Arguments for `trustrx fingerprint`.
#[derive(Args, Debug)]
pub struct FingerprintArgs {
    /// File to fingerprint.
    pub file: PathBuf,
}

/// Fingerprint a file on disk.
pub fn fingerprint_file(path: &Path) -> Result<Fingerprint> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("opening {}", path.display()))?;
    Fingerprint::from_reader(std::io::BufReader::new(file))
        .with_context(|| format!("reading {}", path.display()))
}

/// Execute the fingerprint subcommand.
pub fn run_fingerprint(args: &FingerprintArgs) -> Result<u8> {
    let fingerprint = fingerprint_file(&args.file)?;
    println!("{fingerprint}  {}", args.file.display());
    Ok(0)
}

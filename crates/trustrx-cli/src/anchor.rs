//! # Anchor Subcommand
//!
//! Fingerprints a file, commits the fingerprint to the ledger, and records
//! the receipt in the local registry. Exits 1 when anchoring fails; no
//! record is written in that case.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use trustrx_anchor::{AnchoredRecord, ExplorerLinks, FundingOutcome, RecordMetadata, RecordRegistry};

use crate::account::format_algos;
use crate::context::CliContext;

/// Arguments for `trustrx anchor`.
#[derive(Args, Debug)]
pub struct AnchorArgs {
    /// File to anchor.
    pub file: PathBuf,

    /// Seed file to sign with. Defaults to the configured credential source.
    #[arg(long)]
    pub key: Option<PathBuf>,

    /// Registry file to record the anchor in.
    #[arg(long)]
    pub registry: Option<PathBuf>,

    /// Free-text description stored with the record.
    #[arg(long)]
    pub description: Option<String>,

    /// Request faucet funds for the signing address first.
    #[arg(long)]
    pub fund: bool,
}

fn metadata_for(path: &Path, size_bytes: u64, description: Option<String>) -> RecordMetadata {
    let label = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    RecordMetadata {
        label,
        description,
        size_bytes,
    }
}

/// Print a committed record.
pub fn print_record(record: &AnchoredRecord, explorer: &ExplorerLinks) {
    let receipt = &record.receipt;
    println!("anchored {}", record.metadata.label);
    println!("  record:      {}", record.record_id);
    println!("  fingerprint: {}", receipt.fingerprint);
    println!("  reference:   {}", receipt.reference);
    match receipt.committed_at {
        Some(at) => println!("  committed:   {at} (round {})", receipt.committed_round),
        None => println!(
            "  committed:   round {} (block time not yet reported)",
            receipt.committed_round
        ),
    }
    println!("  network:     {}", receipt.network);
    if !receipt.network.simulated {
        println!("  explorer:    {}", explorer.transaction_url(&receipt.reference));
    }
}

/// Execute the anchor subcommand.
pub async fn run_anchor(args: &AnchorArgs, ctx: &CliContext) -> Result<u8> {
    let content = std::fs::read(&args.file)
        .with_context(|| format!("reading {}", args.file.display()))?;
    let custodian = ctx.custodian(args.key.as_deref())?;
    let explorer = ctx.config.explorer()?;
    let service = ctx.service()?;

    if args.fund {
        if let FundingOutcome::Funded(receipt) = service.fund(&custodian.address()).await {
            println!("funded {} with {}", receipt.address, format_algos(receipt.amount));
        }
    }

    let registry_path = ctx.registry_path(args.registry.as_deref());
    let registry = RecordRegistry::load(&registry_path)?;
    let metadata = metadata_for(&args.file, content.len() as u64, args.description.clone());

    let result = service
        .anchor_record(&registry, metadata, &content, custodian.as_ref())
        .await;
    // Saved on failure too: funds granted above must survive the run.
    ctx.persist(&service)?;

    match result {
        Ok(record) => {
            registry.save(&registry_path)?;
            print_record(&record, &explorer);
            Ok(0)
        }
        Err(failure) => {
            if let Some(pending) = &failure.pending_reference {
                eprintln!("transaction {pending} was submitted but not confirmed; check it later with `trustrx verify`");
            }
            bail!("anchoring {} failed: {failure}", args.file.display())
        }
    }
}

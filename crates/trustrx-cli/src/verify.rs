//! # Verify Subcommand
//!
//! Checks a file against an anchor, given either the transaction id or a
//! record id from the local registry.
//!
//! ## Exit Codes
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0 | verified |
//! | 2 | ledger holds a different fingerprint |
//! | 3 | reference not found (or malformed) |
//! | 1 | lookup failed, or any other error |

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use trustrx_anchor::{RecordRegistry, VerificationOutcome};
use trustrx_core::RecordId;

use crate::context::CliContext;
use crate::fingerprint::fingerprint_file;

pub const EXIT_VERIFIED: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_MISMATCHED: u8 = 2;
pub const EXIT_NOT_FOUND: u8 = 3;

/// Arguments for `trustrx verify`.
#[derive(Args, Debug)]
#[command(group(
    clap::ArgGroup::new("target")
        .required(true)
        .args(["reference", "record"]),
))]
pub struct VerifyArgs {
    /// File whose current content is checked.
    pub file: PathBuf,

    /// Ledger transaction id of the anchor.
    #[arg(long)]
    pub reference: Option<String>,

    /// Registry record id of the anchor.
    #[arg(long)]
    pub record: Option<RecordId>,

    /// Registry file used with `--record`.
    #[arg(long)]
    pub registry: Option<PathBuf>,
}

/// Process exit code for an outcome.
pub fn exit_code(outcome: &VerificationOutcome) -> u8 {
    match outcome {
        VerificationOutcome::Verified(_) => EXIT_VERIFIED,
        VerificationOutcome::Mismatched(_) => EXIT_MISMATCHED,
        VerificationOutcome::NotFound { .. } => EXIT_NOT_FOUND,
        VerificationOutcome::LookupFailed(_) => EXIT_FAILURE,
    }
}

/// Print an outcome. Lookup failures go to stderr.
pub fn print_outcome(outcome: &VerificationOutcome) {
    match outcome {
        VerificationOutcome::Verified(result) => {
            println!("VERIFIED {}", result.reference);
            println!("  fingerprint: {}", result.requested);
            println!(
                "  committed:   {} (round {})",
                result.committed_at, result.committed_round
            );
            println!("  network:     {}", result.network);
        }
        VerificationOutcome::Mismatched(result) => {
            println!("MISMATCH {}", result.reference);
            println!("  file:        {}", result.requested);
            match &result.ledger_reported {
                Some(fp) => println!("  ledger:      {fp}"),
                None => println!("  ledger:      (note is not a fingerprint)"),
            }
            println!("  committed:   {}", result.committed_at);
            println!("  network:     {}", result.network);
        }
        VerificationOutcome::NotFound { reference } => {
            println!("NOT FOUND {reference}");
        }
        VerificationOutcome::LookupFailed(failure) => {
            eprintln!("lookup failed: {failure}");
        }
    }
}

/// Execute the verify subcommand.
pub async fn run_verify(args: &VerifyArgs, ctx: &CliContext) -> Result<u8> {
    let service = ctx.service()?;

    let outcome = match (&args.reference, &args.record) {
        (Some(reference), _) => {
            let fingerprint = fingerprint_file(&args.file)?;
            service.verify(reference, &fingerprint).await
        }
        (None, Some(record_id)) => {
            let registry = RecordRegistry::load(&ctx.registry_path(args.registry.as_deref()))?;
            let content = std::fs::read(&args.file)
                .with_context(|| format!("reading {}", args.file.display()))?;
            service.verify_record(&registry, record_id, &content).await?
        }
        (None, None) => bail!("either --reference or --record is required"),
    };

    tracing::debug!(outcome = outcome.label(), "verification finished");
    print_outcome(&outcome);
    Ok(exit_code(&outcome))
}

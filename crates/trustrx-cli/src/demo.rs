//! # Demo Subcommand
//!
//! Runs the whole workflow in one process against a fresh simulated
//! ledger: generate an identity, fund it, anchor the file, verify it, and
//! show that a one-byte change is detected. Nothing touches the network
//! and nothing is persisted.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use trustrx_anchor::{AnchorService, FundingOutcome, VerificationOutcome};
use trustrx_core::Fingerprint;
use trustrx_crypto::{KeyCustodian, LocalCustodian};
use trustrx_ledger::InMemoryLedger;

use crate::account::format_algos;
use crate::verify::{exit_code, print_outcome};

/// Arguments for `trustrx demo`.
#[derive(Args, Debug)]
pub struct DemoArgs {
    /// File to anchor.
    pub file: PathBuf,
}

/// Execute the demo subcommand.
pub async fn run_demo(args: &DemoArgs) -> Result<u8> {
    let content = std::fs::read(&args.file)
        .with_context(|| format!("reading {}", args.file.display()))?;
    let service = AnchorService::new(InMemoryLedger::new());
    let custodian = LocalCustodian::generate();
    let address = custodian.address();

    println!("1. identity   {address}");
    match service.fund(&address).await {
        FundingOutcome::Funded(receipt) => {
            println!("2. funded     {}", format_algos(receipt.amount))
        }
        FundingOutcome::Unavailable(failure) => bail!("simulated faucet failed: {failure}"),
    }

    let fingerprint = Fingerprint::of(&content);
    let receipt = service
        .anchor(&fingerprint, &custodian)
        .await
        .into_result()
        .map_err(|failure| anyhow::anyhow!("anchoring failed: {failure}"))?;
    println!("3. anchored   {} (round {})", receipt.reference, receipt.committed_round);

    println!("4. verify original:");
    let outcome = service.verify(receipt.reference.as_str(), &fingerprint).await;
    print_outcome(&outcome);
    if !outcome.is_verified() {
        return Ok(exit_code(&outcome));
    }

    let mut tampered = content;
    match tampered.first_mut() {
        Some(byte) => *byte ^= 0x01,
        None => tampered.push(0),
    }
    println!("5. verify with one byte changed:");
    let tampered_outcome = service.verify_content(receipt.reference.as_str(), &tampered).await;
    print_outcome(&tampered_outcome);
    if !matches!(tampered_outcome, VerificationOutcome::Mismatched(_)) {
        bail!("tampered content was not detected");
    }

    println!("all results above are from a simulated ledger");
    Ok(0)
}

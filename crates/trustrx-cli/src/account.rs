//! # Fund and Balance Subcommands
//!
//! `fund` asks the faucet for TestNet funds (or credits the simulated
//! ledger). A faucet refusal is reported but exits 0: funding is best
//! effort, and the account may already hold enough.

use anyhow::{bail, Result};
use clap::Args;
use trustrx_anchor::FundingOutcome;
use trustrx_core::LedgerAddress;
use trustrx_ledger::MICROALGOS_PER_ALGO;

use crate::context::CliContext;

/// Arguments for `trustrx fund`.
#[derive(Args, Debug)]
pub struct FundArgs {
    /// Address to fund.
    pub address: LedgerAddress,
}

/// Arguments for `trustrx balance`.
#[derive(Args, Debug)]
pub struct BalanceArgs {
    /// Address to query.
    pub address: LedgerAddress,
}

/// Render microalgos as ALGO with six decimals.
pub fn format_algos(microalgos: u64) -> String {
    format!(
        "{}.{:06} ALGO",
        microalgos / MICROALGOS_PER_ALGO,
        microalgos % MICROALGOS_PER_ALGO
    )
}

/// Execute the fund subcommand.
pub async fn run_fund(args: &FundArgs, ctx: &CliContext) -> Result<u8> {
    let service = ctx.service()?;
    let network = service.network();
    match service.fund(&args.address).await {
        FundingOutcome::Funded(receipt) => {
            println!(
                "funded {} with {} on {network}",
                receipt.address,
                format_algos(receipt.amount)
            );
            if let Some(reference) = &receipt.reference {
                println!("faucet transaction: {reference}");
            }
        }
        FundingOutcome::Unavailable(failure) => {
            println!("funding unavailable on {network}: {failure}");
        }
    }
    ctx.persist(&service)?;
    Ok(0)
}

/// Execute the balance subcommand.
pub async fn run_balance(args: &BalanceArgs, ctx: &CliContext) -> Result<u8> {
    let service = ctx.service()?;
    match service.balance(&args.address).await {
        Ok(amount) => {
            println!(
                "{}: {} on {}",
                args.address,
                format_algos(amount),
                service.network()
            );
            Ok(0)
        }
        Err(failure) => bail!("balance lookup for {} failed: {failure}", args.address),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn algos_format_with_six_decimals() {
        assert_eq!(format_algos(0), "0.000000 ALGO");
        assert_eq!(format_algos(1_000), "0.001000 ALGO");
        assert_eq!(format_algos(10_000_000), "10.000000 ALGO");
        assert_eq!(format_algos(12_345_678), "12.345678 ALGO");
    }
}

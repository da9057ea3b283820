//! # Keygen Subcommand
//!
//! Generates a ledger identity, writes its credential (hex seed or 25-word
//! recovery phrase) to a file only the owner can read, and optionally
//! writes a wallet backup document next to it.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use trustrx_anchor::WalletBackup;
use trustrx_crypto::{generate_identity, write_seed_file};

use crate::context::CliContext;

/// Arguments for `trustrx keygen`.
#[derive(Args, Debug)]
pub struct KeygenArgs {
    /// Where to write the credential.
    #[arg(long)]
    pub out: PathBuf,

    /// Write the 25-word recovery phrase instead of the hex seed.
    #[arg(long)]
    pub phrase: bool,

    /// Also write a wallet backup JSON into this directory.
    #[arg(long)]
    pub backup: Option<PathBuf>,

    /// Overwrite an existing seed file.
    #[arg(long)]
    pub force: bool,
}

/// Execute the keygen subcommand.
pub fn run_keygen(args: &KeygenArgs, ctx: &CliContext) -> Result<u8> {
    if args.out.exists() && !args.force {
        bail!(
            "{} already exists; pass --force to replace it",
            args.out.display()
        );
    }

    let identity = generate_identity();
    let credential = if args.phrase {
        &identity.mnemonic
    } else {
        &identity.credential
    };
    write_seed_file(&args.out, credential)
        .with_context(|| format!("writing seed to {}", args.out.display()))?;

    println!("address: {}", identity.address);
    println!("key:     {}", args.out.display());

    if let Some(dir) = &args.backup {
        let backup = WalletBackup::from_identity(&identity, ctx.network_name());
        let path = write_backup(&backup, dir)?;
        println!("backup:  {}", path.display());
    }
    Ok(0)
}

fn write_backup(backup: &WalletBackup, dir: &Path) -> Result<PathBuf> {
    backup
        .write_to_dir(dir)
        .with_context(|| format!("writing wallet backup into {}", dir.display()))
}

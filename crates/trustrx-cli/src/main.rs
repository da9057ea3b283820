//! # trustrx CLI entry point
//!
//! Parses command-line arguments, installs logging, and dispatches to the
//! subcommand handlers in the `trustrx_cli` library.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use trustrx_cli::account::{run_balance, run_fund, BalanceArgs, FundArgs};
use trustrx_cli::anchor::{run_anchor, AnchorArgs};
use trustrx_cli::demo::{run_demo, DemoArgs};
use trustrx_cli::fingerprint::{run_fingerprint, FingerprintArgs};
use trustrx_cli::keygen::{run_keygen, KeygenArgs};
use trustrx_cli::verify::{run_verify, VerifyArgs};
use trustrx_cli::CliContext;

/// TrustRx: tamper-evident medical records on a public ledger.
///
/// Fingerprints record files, anchors the fingerprints as Algorand
/// transaction notes, and verifies files against those anchors later.
#[derive(Parser, Debug)]
#[command(name = "trustrx", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a YAML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    /// Use the simulated ledger instead of the configured network.
    #[arg(long, global = true)]
    demo: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the SHA-256 fingerprint of a file.
    Fingerprint(FingerprintArgs),

    /// Generate a ledger identity and write its seed file.
    Keygen(KeygenArgs),

    /// Request faucet funds for an address.
    Fund(FundArgs),

    /// Show the balance of an address.
    Balance(BalanceArgs),

    /// Anchor a file's fingerprint on the ledger.
    Anchor(AnchorArgs),

    /// Verify a file against an anchor.
    Verify(VerifyArgs),

    /// Run the whole workflow once against a throwaway simulated ledger.
    Demo(DemoArgs),
}

fn env_filter(verbose: u8) -> EnvFilter {
    if verbose == 0 {
        if let Ok(filter) = EnvFilter::try_from_default_env() {
            return filter;
        }
    }
    match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    }
}

fn init_tracing(verbose: u8, json: bool) {
    let filter = env_filter(verbose);
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }
}

async fn dispatch(cli: &Cli) -> anyhow::Result<u8> {
    let ctx = || CliContext::load(cli.config.as_deref(), cli.demo);
    match &cli.command {
        Commands::Fingerprint(args) => run_fingerprint(args),
        Commands::Keygen(args) => run_keygen(args, &ctx()?),
        Commands::Fund(args) => run_fund(args, &ctx()?).await,
        Commands::Balance(args) => run_balance(args, &ctx()?).await,
        Commands::Anchor(args) => run_anchor(args, &ctx()?).await,
        Commands::Verify(args) => run_verify(args, &ctx()?).await,
        Commands::Demo(args) => run_demo(args).await,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);
    tracing::debug!("trustrx CLI v{} starting", env!("CARGO_PKG_VERSION"));

    match dispatch(&cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parse_fingerprint() {
        let cli = Cli::try_parse_from(["trustrx", "fingerprint", "report.pdf"]).unwrap();
        if let Commands::Fingerprint(args) = cli.command {
            assert_eq!(args.file, PathBuf::from("report.pdf"));
        } else {
            panic!("expected fingerprint");
        }
    }

    #[test]
    fn cli_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "trustrx",
            "anchor",
            "report.pdf",
            "-vv",
            "--demo",
            "--log-json",
            "--config",
            "trustrx.yaml",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(cli.demo);
        assert!(cli.log_json);
        assert_eq!(cli.config, Some(PathBuf::from("trustrx.yaml")));
    }

    #[test]
    fn cli_parse_keygen_with_backup() {
        let cli = Cli::try_parse_from([
            "trustrx",
            "keygen",
            "--out",
            "owner.seed",
            "--backup",
            "backups",
            "--phrase",
        ])
        .unwrap();
        if let Commands::Keygen(args) = cli.command {
            assert_eq!(args.out, PathBuf::from("owner.seed"));
            assert_eq!(args.backup, Some(PathBuf::from("backups")));
            assert!(args.phrase);
            assert!(!args.force);
        } else {
            panic!("expected keygen");
        }
    }

    #[test]
    fn cli_parse_keygen_requires_out() {
        assert!(Cli::try_parse_from(["trustrx", "keygen"]).is_err());
    }

    #[test]
    fn cli_parse_anchor_options() {
        let cli = Cli::try_parse_from([
            "trustrx",
            "anchor",
            "lab.pdf",
            "--key",
            "owner.seed",
            "--registry",
            "records.json",
            "--description",
            "lipid panel",
            "--fund",
        ])
        .unwrap();
        if let Commands::Anchor(args) = cli.command {
            assert_eq!(args.key, Some(PathBuf::from("owner.seed")));
            assert_eq!(args.registry, Some(PathBuf::from("records.json")));
            assert_eq!(args.description.as_deref(), Some("lipid panel"));
            assert!(args.fund);
        } else {
            panic!("expected anchor");
        }
    }

    #[test]
    fn cli_parse_verify_needs_exactly_one_target() {
        assert!(Cli::try_parse_from(["trustrx", "verify", "lab.pdf"]).is_err());
        assert!(Cli::try_parse_from([
            "trustrx",
            "verify",
            "lab.pdf",
            "--reference",
            "ABC",
            "--record",
            "67e55044-10b1-426f-9247-bb680e5fe0c8",
        ])
        .is_err());

        let cli = Cli::try_parse_from([
            "trustrx",
            "verify",
            "lab.pdf",
            "--record",
            "67e55044-10b1-426f-9247-bb680e5fe0c8",
        ])
        .unwrap();
        if let Commands::Verify(args) = cli.command {
            assert!(args.reference.is_none());
            assert_eq!(
                args.record.map(|id| id.to_string()),
                Some("67e55044-10b1-426f-9247-bb680e5fe0c8".to_string())
            );
        } else {
            panic!("expected verify");
        }
    }

    #[test]
    fn cli_parse_verify_rejects_bad_record_id() {
        assert!(Cli::try_parse_from(["trustrx", "verify", "lab.pdf", "--record", "nope"]).is_err());
    }

    #[test]
    fn cli_parse_fund_validates_address() {
        assert!(Cli::try_parse_from(["trustrx", "fund", "not-an-address"]).is_err());
        let cli = Cli::try_parse_from([
            "trustrx",
            "fund",
            "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAY5HFKQ",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Fund(_)));
    }

    #[test]
    fn verbosity_maps_to_filter_levels() {
        assert!(env_filter(1).to_string().contains("info"));
        assert!(env_filter(3).to_string().contains("trace"));
    }
}

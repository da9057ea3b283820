//! # trustrx-cli — TrustRx Command-Line Interface
//!
//! Provides the `trustrx` binary over the anchoring workflow:
//!
//! ```bash
//! trustrx fingerprint report.pdf
//! trustrx keygen --out ~/.trustrx/owner.seed --backup ~/backups
//! trustrx fund <address>
//! trustrx anchor report.pdf --key ~/.trustrx/owner.seed --registry records.json
//! trustrx verify report.pdf --reference <txid>
//! trustrx --demo demo report.pdf
//! ```
//!
//! ## Crate Policy
//!
//! - Argument parsing lives in `main.rs`; handlers live here and return
//!   the process exit code.
//! - Handlers delegate to `trustrx-anchor`. No ledger logic here.
//! - Results for the simulated ledger are always marked `(simulated)`.

pub mod account;
pub mod anchor;
pub mod context;
pub mod demo;
pub mod fingerprint;
pub mod keygen;
pub mod verify;

pub use context::CliContext;

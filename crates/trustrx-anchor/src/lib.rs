//! # trustrx-anchor — Record Anchoring Workflow
//!
//! Proves that a medical record existed, unchanged, at a point in time:
//! its SHA-256 fingerprint is committed as the note of a zero-value
//! self-payment on a public ledger, and anyone holding the transaction id
//! can later check the fingerprint and read the commit time.
//!
//! ```ignore
//! let service = AnchorService::new(config.build_ledger()?);
//! let custodian = config.credential_source.load()?;
//! match service.anchor(&Fingerprint::of(&bytes), custodian.as_ref()).await {
//!     AnchorOutcome::Committed(receipt) => println!("{}", receipt.reference),
//!     AnchorOutcome::Failed(failure) => eprintln!("{failure}"),
//! }
//! ```
//!
//! ## Modules
//!
//! - [`service`]: [`AnchorService`], the workflow itself.
//! - [`outcome`]: tagged results for anchor, verify, and fund.
//! - [`registry`]: local record metadata with copies of ledger receipts.
//! - [`config`]: [`TrustRxConfig`] and the live/demo [`AnchorMode`].
//! - [`wallet`]: wallet backup documents.
//! - [`explorer`]: block-explorer links.

pub mod config;
pub mod explorer;
pub mod outcome;
pub mod registry;
pub mod service;
pub mod wallet;

pub use config::{AnchorMode, ConfigError, TrustRxConfig};
pub use explorer::ExplorerLinks;
pub use outcome::{
    AnchorFailure, AnchorOutcome, AnchorReceipt, FailureKind, FundingOutcome,
    VerificationOutcome, VerificationResult,
};
pub use registry::{AnchoredRecord, RecordMetadata, RecordRegistry, RegistryError};
pub use service::AnchorService;
pub use wallet::WalletBackup;

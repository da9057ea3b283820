//! # trustrx-ledger — Ledger Access
//!
//! Everything between a signed anchoring transaction and the ledger that
//! commits it:
//!
//! - [`transaction`]: the zero-amount self-payment that carries a
//!   fingerprint in its note, its canonical encoding, and its id.
//! - [`msgpack`]: the canonical MessagePack subset transactions use.
//! - [`Ledger`] / [`Faucet`]: the traits the anchoring workflow is written
//!   against.
//! - [`AlgorandClient`]: algod + indexer + TestNet faucet over HTTP, with
//!   bounded retry.
//! - [`InMemoryLedger`]: a simulated ledger for demo mode and tests.
//!
//! ## Crate Policy
//!
//! - HTTP only through `reqwest` with rustls.
//! - Never returns a reference for a transaction that was not committed.

pub mod algorand;
pub mod config;
pub mod error;
pub mod ledger;
pub mod memory;
pub mod msgpack;
pub(crate) mod retry;
pub mod transaction;

pub use algorand::{AlgorandClient, FAUCET_GRANT};
pub use config::{ConfigError, LedgerConfig};
pub use error::{CodecError, LedgerError};
pub use ledger::{
    AnyLedger, CommittedEntry, Faucet, FundingReceipt, Ledger, NetworkDescriptor, Submission,
    MICROALGOS_PER_ALGO,
};
pub use memory::{InMemoryLedger, LedgerSnapshot};
pub use transaction::{PaymentTransaction, SignedTransaction, SuggestedParams, MAX_NOTE_LEN};

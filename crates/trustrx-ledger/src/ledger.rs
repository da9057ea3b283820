//! # Ledger and Faucet Traits
//!
//! The anchoring workflow talks to a ledger only through [`Ledger`]. Two
//! implementations ship with this crate: [`AlgorandClient`] for the real
//! network and [`InMemoryLedger`] for demo mode and tests. [`AnyLedger`]
//! lets configuration pick between them at runtime.
//!
//! ## Contract
//!
//! - `submit` returns only after the transaction is committed or the
//!   bounded confirmation wait has run out. A returned [`Submission`] is
//!   durable: a later `lookup` of its reference finds it.
//! - `lookup` returns `Ok(None)` for a reference the ledger has never
//!   committed. Transport and protocol failures are errors, never `None`.
//! - All futures are `Send` so services can run on a multi-threaded runtime.

use std::future::Future;

use serde::{Deserialize, Serialize};
use trustrx_core::{AnchorReference, LedgerAddress, Timestamp};

use crate::algorand::AlgorandClient;
use crate::error::LedgerError;
use crate::memory::InMemoryLedger;
use crate::transaction::{SignedTransaction, SuggestedParams};

/// One ALGO in microalgos.
pub const MICROALGOS_PER_ALGO: u64 = 1_000_000;

/// Which ledger a result came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkDescriptor {
    /// Network name, e.g. `algorand-testnet`.
    pub name: String,
    /// True when the ledger is the in-process simulation.
    pub simulated: bool,
}

impl std::fmt::Display for NetworkDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.simulated {
            write!(f, "{} (simulated)", self.name)
        } else {
            f.write_str(&self.name)
        }
    }
}

/// A confirmed submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub reference: AnchorReference,
    pub confirmed_round: u64,
    /// Block time of the confirming round, when the client could read it.
    pub committed_at: Option<Timestamp>,
}

/// A committed transaction as read back from the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommittedEntry {
    pub reference: AnchorReference,
    pub sender: LedgerAddress,
    /// Raw note bytes.
    #[serde(with = "note_hex")]
    pub note: Vec<u8>,
    pub round: u64,
    pub committed_at: Timestamp,
}

/// Funds granted by a faucet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingReceipt {
    pub address: LedgerAddress,
    /// Amount granted, in microalgos.
    pub amount: u64,
    /// Faucet transaction id, when the faucet reports one.
    pub reference: Option<String>,
}

/// Read and write access to a ledger.
pub trait Ledger: Send + Sync {
    /// The network this client talks to.
    fn network(&self) -> NetworkDescriptor;

    /// Parameters for building a transaction valid right now.
    fn suggested_params(&self) -> impl Future<Output = Result<SuggestedParams, LedgerError>> + Send;

    /// Submit a signed transaction and wait for it to be committed.
    fn submit(
        &self,
        txn: &SignedTransaction,
    ) -> impl Future<Output = Result<Submission, LedgerError>> + Send;

    /// Find a committed transaction by reference.
    fn lookup(
        &self,
        reference: &AnchorReference,
    ) -> impl Future<Output = Result<Option<CommittedEntry>, LedgerError>> + Send;

    /// Current balance of an account, in microalgos.
    fn account_balance(
        &self,
        address: &LedgerAddress,
    ) -> impl Future<Output = Result<u64, LedgerError>> + Send;
}

/// A source of test funds.
pub trait Faucet: Send + Sync {
    fn request_funds(
        &self,
        address: &LedgerAddress,
    ) -> impl Future<Output = Result<FundingReceipt, LedgerError>> + Send;
}

/// A ledger chosen at runtime.
#[derive(Debug, Clone)]
pub enum AnyLedger {
    Algorand(AlgorandClient),
    Memory(InMemoryLedger),
}

impl Ledger for AnyLedger {
    fn network(&self) -> NetworkDescriptor {
        match self {
            Self::Algorand(client) => client.network(),
            Self::Memory(ledger) => ledger.network(),
        }
    }

    async fn suggested_params(&self) -> Result<SuggestedParams, LedgerError> {
        match self {
            Self::Algorand(client) => client.suggested_params().await,
            Self::Memory(ledger) => ledger.suggested_params().await,
        }
    }

    async fn submit(&self, txn: &SignedTransaction) -> Result<Submission, LedgerError> {
        match self {
            Self::Algorand(client) => client.submit(txn).await,
            Self::Memory(ledger) => ledger.submit(txn).await,
        }
    }

    async fn lookup(
        &self,
        reference: &AnchorReference,
    ) -> Result<Option<CommittedEntry>, LedgerError> {
        match self {
            Self::Algorand(client) => client.lookup(reference).await,
            Self::Memory(ledger) => ledger.lookup(reference).await,
        }
    }

    async fn account_balance(&self, address: &LedgerAddress) -> Result<u64, LedgerError> {
        match self {
            Self::Algorand(client) => client.account_balance(address).await,
            Self::Memory(ledger) => ledger.account_balance(address).await,
        }
    }
}

impl Faucet for AnyLedger {
    async fn request_funds(&self, address: &LedgerAddress) -> Result<FundingReceipt, LedgerError> {
        match self {
            Self::Algorand(client) => client.request_funds(address).await,
            Self::Memory(ledger) => ledger.request_funds(address).await,
        }
    }
}

mod note_hex {
    use serde::{Deserialize, Deserializer, Serializer};
    use trustrx_core::encoding::{hex_decode, hex_encode};

    pub fn serialize<S: Serializer>(note: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex_encode(note))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        hex_decode(&text).map_err(serde::de::Error::custom)
    }
}

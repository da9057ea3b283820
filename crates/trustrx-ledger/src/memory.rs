//! # Simulated Ledger
//!
//! An in-process ledger that enforces the rules an anchor depends on:
//! signatures must verify against the sender, the sender must afford the
//! fee and keep the minimum balance, transactions must be inside their
//! validity window for this genesis, and a transaction id commits at most
//! once. Every accepted transaction advances the round by one and is
//! stamped with the wall-clock time.
//!
//! State can be snapshotted to JSON and restored, so a CLI can anchor in
//! one process and verify in another. Results produced through this ledger
//! report `simulated: true` in their [`NetworkDescriptor`].

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use trustrx_core::{AnchorReference, LedgerAddress, Timestamp};

use crate::algorand::FAUCET_GRANT;
use crate::error::LedgerError;
use crate::ledger::{
    CommittedEntry, Faucet, FundingReceipt, Ledger, NetworkDescriptor, Submission,
};
use crate::transaction::{SignedTransaction, SuggestedParams};

/// Genesis id of the simulated network.
pub const SIMULATED_GENESIS_ID: &str = "trustrx-sim-v1";

/// Network name reported by the simulated ledger.
pub const SIMULATED_NETWORK_NAME: &str = "trustrx-simulated";

/// Smallest balance an account may be left with, in microalgos.
pub const MIN_BALANCE: u64 = 100_000;

const MIN_FEE: u64 = 1_000;
const ENDPOINT: &str = "memory";

/// Serializable ledger state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub round: u64,
    pub balances: BTreeMap<LedgerAddress, u64>,
    pub transactions: BTreeMap<AnchorReference, CommittedEntry>,
}

impl Default for LedgerSnapshot {
    fn default() -> Self {
        Self {
            round: 1,
            balances: BTreeMap::new(),
            transactions: BTreeMap::new(),
        }
    }
}

/// In-memory ledger. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    state: Arc<Mutex<LedgerSnapshot>>,
    offline: Arc<AtomicBool>,
}

impl InMemoryLedger {
    /// A fresh ledger at round 1 with no accounts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore a ledger from a snapshot.
    pub fn from_snapshot(snapshot: LedgerSnapshot) -> Self {
        Self {
            state: Arc::new(Mutex::new(snapshot)),
            offline: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> LedgerSnapshot {
        self.state.lock().clone()
    }

    /// Load state from a JSON file. A missing file yields a fresh ledger.
    pub fn load(path: &Path) -> Result<Self, std::io::Error> {
        match std::fs::read_to_string(path) {
            Ok(text) => {
                let snapshot: LedgerSnapshot = serde_json::from_str(&text)
                    .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
                tracing::debug!(path = %path.display(), round = snapshot.round, "restored simulated ledger");
                Ok(Self::from_snapshot(snapshot))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::new()),
            Err(e) => Err(e),
        }
    }

    /// Write state to a JSON file, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(&self.snapshot())
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, json)
    }

    /// Simulate losing connectivity. While offline every call fails with
    /// [`LedgerError::Unavailable`].
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Credit an account directly.
    pub fn credit(&self, address: &LedgerAddress, amount: u64) {
        let mut state = self.state.lock();
        let balance = state.balances.entry(address.clone()).or_insert(0);
        *balance = balance.saturating_add(amount);
    }

    /// The current round.
    pub fn round(&self) -> u64 {
        self.state.lock().round
    }

    fn ensure_online(&self) -> Result<(), LedgerError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(LedgerError::unavailable(ENDPOINT, "simulated ledger is offline"))
        } else {
            Ok(())
        }
    }

    fn apply(&self, signed: &SignedTransaction) -> Result<Submission, LedgerError> {
        let txn = &signed.transaction;
        let reference = signed.id();

        if txn.genesis_id != SIMULATED_GENESIS_ID || txn.genesis_hash != genesis_hash() {
            return Err(LedgerError::Rejected(format!(
                "transaction {reference} is for genesis {:?}, not {SIMULATED_GENESIS_ID:?}",
                txn.genesis_id
            )));
        }
        signed.verify().map_err(|e| {
            LedgerError::Unauthorized(format!("signature check failed for {reference}: {e}"))
        })?;
        if txn.fee < MIN_FEE {
            return Err(LedgerError::Rejected(format!(
                "fee {} below minimum {MIN_FEE}",
                txn.fee
            )));
        }

        let mut state = self.state.lock();
        let next_round = state.round + 1;
        if next_round < txn.first_valid || next_round > txn.last_valid {
            return Err(LedgerError::Rejected(format!(
                "round {next_round} outside validity window {}..={}",
                txn.first_valid, txn.last_valid
            )));
        }
        if state.transactions.contains_key(&reference) {
            return Err(LedgerError::Rejected(format!(
                "transaction already in ledger: {reference}"
            )));
        }

        let balance = state.balances.get(&txn.sender).copied().unwrap_or(0);
        let spend = txn.fee.saturating_add(txn.amount);
        let remaining = balance.checked_sub(spend).filter(|r| *r >= MIN_BALANCE);
        let Some(remaining) = remaining else {
            return Err(LedgerError::Rejected(format!(
                "overspend (account {}, balance {balance}, needs {spend} plus minimum {MIN_BALANCE})",
                txn.sender
            )));
        };

        state.balances.insert(txn.sender.clone(), remaining);
        let receiver = state.balances.entry(txn.receiver.clone()).or_insert(0);
        *receiver = receiver.saturating_add(txn.amount);

        let committed_at = Timestamp::now();
        state.round = next_round;
        state.transactions.insert(
            reference.clone(),
            CommittedEntry {
                reference: reference.clone(),
                sender: txn.sender.clone(),
                note: txn.note.clone(),
                round: next_round,
                committed_at,
            },
        );
        Ok(Submission {
            reference,
            confirmed_round: next_round,
            committed_at: Some(committed_at),
        })
    }
}

/// Genesis hash of the simulated network.
pub fn genesis_hash() -> [u8; 32] {
    Sha256::digest(SIMULATED_GENESIS_ID.as_bytes()).into()
}

impl Ledger for InMemoryLedger {
    fn network(&self) -> NetworkDescriptor {
        NetworkDescriptor {
            name: SIMULATED_NETWORK_NAME.to_string(),
            simulated: true,
        }
    }

    async fn suggested_params(&self) -> Result<SuggestedParams, LedgerError> {
        self.ensure_online()?;
        Ok(SuggestedParams {
            fee: 0,
            min_fee: MIN_FEE,
            last_round: self.round(),
            genesis_id: SIMULATED_GENESIS_ID.to_string(),
            genesis_hash: genesis_hash(),
        })
    }

    async fn submit(&self, txn: &SignedTransaction) -> Result<Submission, LedgerError> {
        self.ensure_online()?;
        let result = self.apply(txn);
        match &result {
            Ok(submission) => tracing::info!(
                reference = %submission.reference,
                round = submission.confirmed_round,
                "simulated transaction committed"
            ),
            Err(e) => tracing::debug!("simulated ledger refused transaction: {e}"),
        }
        result
    }

    async fn lookup(
        &self,
        reference: &AnchorReference,
    ) -> Result<Option<CommittedEntry>, LedgerError> {
        self.ensure_online()?;
        Ok(self.state.lock().transactions.get(reference).cloned())
    }

    async fn account_balance(&self, address: &LedgerAddress) -> Result<u64, LedgerError> {
        self.ensure_online()?;
        Ok(self.state.lock().balances.get(address).copied().unwrap_or(0))
    }
}

impl Faucet for InMemoryLedger {
    async fn request_funds(&self, address: &LedgerAddress) -> Result<FundingReceipt, LedgerError> {
        self.ensure_online()?;
        self.credit(address, FAUCET_GRANT);
        tracing::info!(%address, amount = FAUCET_GRANT, "simulated faucet granted funds");
        Ok(FundingReceipt {
            address: address.clone(),
            amount: FAUCET_GRANT,
            reference: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::PaymentTransaction;
    use trustrx_core::Fingerprint;
    use trustrx_crypto::{KeyCustodian, LocalCustodian};

    async fn signed_anchor(
        ledger: &InMemoryLedger,
        custodian: &LocalCustodian,
        content: &[u8],
    ) -> SignedTransaction {
        let params = ledger.suggested_params().await.unwrap();
        PaymentTransaction::self_payment(
            &custodian.address(),
            Fingerprint::of(content).to_note(),
            &params,
        )
        .unwrap()
        .sign_with(custodian)
        .unwrap()
    }

    #[tokio::test]
    async fn funded_account_commits_and_is_found() {
        let ledger = InMemoryLedger::new();
        let custodian = LocalCustodian::generate();
        ledger.request_funds(&custodian.address()).await.unwrap();

        let signed = signed_anchor(&ledger, &custodian, b"record").await;
        let submission = ledger.submit(&signed).await.unwrap();
        assert_eq!(submission.reference, signed.id());
        assert_eq!(submission.confirmed_round, 2);

        let entry = ledger.lookup(&submission.reference).await.unwrap().unwrap();
        assert_eq!(entry.note, Fingerprint::of(b"record").to_note());
        assert_eq!(entry.sender, custodian.address());
        assert_eq!(
            ledger.account_balance(&custodian.address()).await.unwrap(),
            FAUCET_GRANT - MIN_FEE
        );
    }

    #[tokio::test]
    async fn unfunded_account_is_rejected() {
        let ledger = InMemoryLedger::new();
        let custodian = LocalCustodian::generate();
        let signed = signed_anchor(&ledger, &custodian, b"record").await;
        let err = ledger.submit(&signed).await.unwrap_err();
        assert!(matches!(err, LedgerError::Rejected(msg) if msg.contains("overspend")));
        assert!(ledger.lookup(&signed.id()).await.unwrap().is_none());
        assert_eq!(ledger.round(), 1);
    }

    #[tokio::test]
    async fn bad_signature_is_unauthorized() {
        let ledger = InMemoryLedger::new();
        let custodian = LocalCustodian::generate();
        ledger.credit(&custodian.address(), FAUCET_GRANT);
        let mut signed = signed_anchor(&ledger, &custodian, b"record").await;
        let other = signed_anchor(&ledger, &LocalCustodian::generate(), b"record").await;
        signed.signature = other.signature;
        assert!(matches!(
            ledger.submit(&signed).await,
            Err(LedgerError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn duplicate_submission_is_rejected() {
        let ledger = InMemoryLedger::new();
        let custodian = LocalCustodian::generate();
        ledger.credit(&custodian.address(), FAUCET_GRANT);
        let signed = signed_anchor(&ledger, &custodian, b"record").await;
        ledger.submit(&signed).await.unwrap();
        assert!(matches!(
            ledger.submit(&signed).await,
            Err(LedgerError::Rejected(msg)) if msg.contains("already in ledger")
        ));
    }

    #[tokio::test]
    async fn foreign_genesis_is_rejected() {
        let ledger = InMemoryLedger::new();
        let custodian = LocalCustodian::generate();
        ledger.credit(&custodian.address(), FAUCET_GRANT);
        let params = SuggestedParams {
            genesis_id: "testnet-v1.0".to_string(),
            ..ledger.suggested_params().await.unwrap()
        };
        let signed = PaymentTransaction::self_payment(&custodian.address(), b"n".to_vec(), &params)
            .unwrap()
            .sign_with(&custodian)
            .unwrap();
        assert!(matches!(
            ledger.submit(&signed).await,
            Err(LedgerError::Rejected(_))
        ));
    }

    #[tokio::test]
    async fn offline_ledger_is_unavailable() {
        let ledger = InMemoryLedger::new();
        ledger.set_offline(true);
        assert!(matches!(
            ledger.suggested_params().await,
            Err(LedgerError::Unavailable { .. })
        ));
        let reference = AnchorReference::from_digest(&[1u8; 32]);
        assert!(matches!(
            ledger.lookup(&reference).await,
            Err(LedgerError::Unavailable { .. })
        ));
        ledger.set_offline(false);
        assert!(ledger.lookup(&reference).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn snapshot_survives_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("ledger.json");

        let ledger = InMemoryLedger::new();
        let custodian = LocalCustodian::generate();
        ledger.request_funds(&custodian.address()).await.unwrap();
        let signed = signed_anchor(&ledger, &custodian, b"persisted").await;
        ledger.submit(&signed).await.unwrap();
        ledger.save(&path).unwrap();

        let restored = InMemoryLedger::load(&path).unwrap();
        assert_eq!(restored.snapshot(), ledger.snapshot());
        assert!(restored.lookup(&signed.id()).await.unwrap().is_some());
    }

    #[test]
    fn load_missing_file_is_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = InMemoryLedger::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(ledger.round(), 1);
    }

    #[test]
    fn clones_share_state() {
        let ledger = InMemoryLedger::new();
        let clone = ledger.clone();
        let address = LedgerAddress::from_public_key(&[2u8; 32]);
        clone.credit(&address, 5);
        assert_eq!(ledger.snapshot().balances.get(&address), Some(&5));
    }
}

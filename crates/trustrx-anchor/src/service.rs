//! # Anchoring Service
//!
//! The record anchoring workflow, written against the [`Ledger`] trait:
//!
//! ```text
//! anchor:  fingerprint ─▶ params ─▶ self-payment(note = hex) ─▶ sign ─▶ submit+confirm ─▶ receipt
//! verify:  reference ─▶ parse ─▶ lookup ─▶ note ─▶ fingerprint ─▶ compare
//! ```
//!
//! ## Failure Policy
//!
//! No path turns a failure into a success value. A failed anchor carries no
//! reference; an unresolvable lookup is `NotFound` or `LookupFailed`, never
//! `Verified`. Retries belong to the ledger client: this service makes each
//! ledger call once and reports what happened.

use trustrx_core::{AnchorReference, Fingerprint, LedgerAddress, RecordId, Timestamp};
use trustrx_crypto::KeyCustodian;
use trustrx_ledger::{Faucet, Ledger, NetworkDescriptor, PaymentTransaction};

use crate::outcome::{
    AnchorFailure, AnchorOutcome, AnchorReceipt, FundingOutcome, VerificationOutcome,
    VerificationResult,
};
use crate::registry::{AnchoredRecord, RecordMetadata, RecordRegistry, RegistryError};

/// Anchors fingerprints on a ledger and verifies them later.
#[derive(Debug, Clone)]
pub struct AnchorService<L> {
    ledger: L,
}

impl<L: Ledger> AnchorService<L> {
    pub fn new(ledger: L) -> Self {
        Self { ledger }
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn network(&self) -> NetworkDescriptor {
        self.ledger.network()
    }

    /// Commit `fingerprint` to the ledger under the custodian's identity.
    pub async fn anchor(
        &self,
        fingerprint: &Fingerprint,
        custodian: &dyn KeyCustodian,
    ) -> AnchorOutcome {
        let submitter = custodian.address();
        tracing::debug!(
            %fingerprint,
            address = %submitter,
            custodian = custodian.custodian_name(),
            "anchoring fingerprint"
        );
        match self.try_anchor(fingerprint, custodian, &submitter).await {
            Ok(receipt) => {
                tracing::info!(
                    %fingerprint,
                    reference = %receipt.reference,
                    round = receipt.committed_round,
                    network = %receipt.network,
                    "fingerprint anchored"
                );
                AnchorOutcome::Committed(receipt)
            }
            Err(failure) => {
                tracing::warn!(%fingerprint, kind = %failure.kind, "anchoring failed: {}", failure.message);
                AnchorOutcome::Failed(failure)
            }
        }
    }

    async fn try_anchor(
        &self,
        fingerprint: &Fingerprint,
        custodian: &dyn KeyCustodian,
        submitter: &LedgerAddress,
    ) -> Result<AnchorReceipt, AnchorFailure> {
        let params = self.ledger.suggested_params().await?;
        let txn = PaymentTransaction::self_payment(submitter, fingerprint.to_note(), &params)?;
        let signed = txn.sign_with(custodian)?;
        let submission = self.ledger.submit(&signed).await?;

        let committed_at = match submission.committed_at {
            Some(ts) => Some(ts),
            None => self.commit_time_from_lookup(&submission.reference).await,
        };
        Ok(AnchorReceipt {
            fingerprint: *fingerprint,
            reference: submission.reference,
            committed_at,
            committed_round: submission.confirmed_round,
            submitter: submitter.clone(),
            network: self.ledger.network(),
        })
    }

    // The transaction is committed at this point; only its block time is
    // missing. A receipt without a commit time beats a failed anchor.
    async fn commit_time_from_lookup(&self, reference: &AnchorReference) -> Option<Timestamp> {
        match self.ledger.lookup(reference).await {
            Ok(Some(entry)) => Some(entry.committed_at),
            Ok(None) => {
                tracing::warn!(%reference, "committed transaction not yet indexed, commit time unknown");
                None
            }
            Err(e) => {
                tracing::warn!(%reference, "commit time lookup failed, commit time unknown: {e}");
                None
            }
        }
    }

    /// Check that `reference` resolves to a commitment of `expected`.
    ///
    /// A reference that does not parse is reported as `NotFound` without
    /// contacting the ledger.
    pub async fn verify(&self, reference: &str, expected: &Fingerprint) -> VerificationOutcome {
        let parsed = match AnchorReference::parse(reference.trim()) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::debug!(reference, "malformed reference: {e}");
                return VerificationOutcome::NotFound {
                    reference: reference.to_string(),
                };
            }
        };

        let entry = match self.ledger.lookup(&parsed).await {
            Ok(Some(entry)) => entry,
            Ok(None) => {
                tracing::info!(reference = %parsed, "reference not found on ledger");
                return VerificationOutcome::NotFound {
                    reference: parsed.to_string(),
                };
            }
            Err(e) => {
                let failure = AnchorFailure::from(e);
                tracing::warn!(reference = %parsed, kind = %failure.kind, "lookup failed: {}", failure.message);
                return VerificationOutcome::LookupFailed(failure);
            }
        };

        let ledger_reported = Fingerprint::from_note(&entry.note);
        let matched = ledger_reported.as_ref() == Some(expected);
        let result = VerificationResult {
            reference: parsed,
            requested: *expected,
            ledger_reported,
            matched,
            committed_at: entry.committed_at,
            committed_round: entry.round,
            network: self.ledger.network(),
        };
        if matched {
            tracing::info!(
                reference = %result.reference,
                fingerprint = %expected,
                committed_at = %result.committed_at,
                "fingerprint verified"
            );
            VerificationOutcome::Verified(result)
        } else {
            tracing::warn!(
                reference = %result.reference,
                expected = %expected,
                "ledger holds a different fingerprint"
            );
            VerificationOutcome::Mismatched(result)
        }
    }

    /// Fingerprint `content` and verify it against `reference`.
    pub async fn verify_content(&self, reference: &str, content: &[u8]) -> VerificationOutcome {
        self.verify(reference, &Fingerprint::of(content)).await
    }

    /// Current balance of `address`, in microalgos.
    pub async fn balance(&self, address: &LedgerAddress) -> Result<u64, AnchorFailure> {
        Ok(self.ledger.account_balance(address).await?)
    }

    /// Fingerprint and anchor `content`; on commit, add it to `registry`.
    ///
    /// Nothing is added to the registry when anchoring fails.
    pub async fn anchor_record(
        &self,
        registry: &RecordRegistry,
        metadata: RecordMetadata,
        content: &[u8],
        custodian: &dyn KeyCustodian,
    ) -> Result<AnchoredRecord, AnchorFailure> {
        let fingerprint = Fingerprint::of(content);
        let receipt = self.anchor(&fingerprint, custodian).await.into_result()?;
        let record = AnchoredRecord {
            record_id: RecordId::new(),
            metadata,
            receipt,
        };
        registry.insert(record.clone());
        tracing::info!(record_id = %record.record_id, label = %record.metadata.label, "record registered");
        Ok(record)
    }

    /// Verify the current `content` of a registered record against its anchor.
    pub async fn verify_record(
        &self,
        registry: &RecordRegistry,
        record_id: &RecordId,
        content: &[u8],
    ) -> Result<VerificationOutcome, RegistryError> {
        let record = registry
            .get(record_id)
            .ok_or(RegistryError::UnknownRecord(*record_id))?;
        Ok(self
            .verify_content(record.receipt.reference.as_str(), content)
            .await)
    }
}

impl<L: Ledger + Faucet> AnchorService<L> {
    /// Ask the faucet to fund `address`. Best effort: failure is reported,
    /// logged, and otherwise harmless.
    pub async fn fund(&self, address: &LedgerAddress) -> FundingOutcome {
        match self.ledger.request_funds(address).await {
            Ok(receipt) => FundingOutcome::Funded(receipt),
            Err(e) => {
                let failure = AnchorFailure::from(e);
                tracing::warn!(%address, "funding request failed, continuing: {failure}");
                FundingOutcome::Unavailable(failure)
            }
        }
    }
}

//! End-to-end properties of the anchoring workflow against the simulated
//! ledger: determinism, round-trip, mismatch detection, not-found
//! distinctness, and failure propagation.

use trustrx_anchor::{
    AnchorFailure, AnchorOutcome, AnchorService, FailureKind, RecordMetadata, RecordRegistry,
    VerificationOutcome,
};
use trustrx_core::{AnchorReference, Fingerprint, LedgerAddress, Timestamp};
use trustrx_crypto::{
    CryptoError, Ed25519Signature, KeyCustodian, LocalCustodian, SigningPayload,
};
use trustrx_ledger::{
    CommittedEntry, InMemoryLedger, Ledger, LedgerError, NetworkDescriptor, PaymentTransaction,
    SignedTransaction, Submission, SuggestedParams,
};

async fn funded_service() -> (AnchorService<InMemoryLedger>, LocalCustodian) {
    let service = AnchorService::new(InMemoryLedger::new());
    let custodian = LocalCustodian::generate();
    assert!(service.fund(&custodian.address()).await.is_funded());
    (service, custodian)
}

fn committed_reference(outcome: &AnchorOutcome) -> AnchorReference {
    outcome
        .reference()
        .cloned()
        .unwrap_or_else(|| panic!("expected Committed, got {outcome:?}"))
}

/// A custodian whose credential store has gone away.
struct UnavailableCustodian {
    address: LedgerAddress,
}

impl KeyCustodian for UnavailableCustodian {
    fn address(&self) -> LedgerAddress {
        self.address.clone()
    }

    fn sign(&self, _payload: &SigningPayload) -> Result<Ed25519Signature, CryptoError> {
        Err(CryptoError::CredentialUnavailable {
            source_name: "hsm:slot-0".to_string(),
            reason: "device not present".to_string(),
        })
    }

    fn custodian_name(&self) -> &str {
        "UnavailableCustodian"
    }
}

/// A ledger that commits without reporting block time and whose index
/// has not caught up yet.
struct UnindexedLedger {
    inner: InMemoryLedger,
}

impl Ledger for UnindexedLedger {
    fn network(&self) -> NetworkDescriptor {
        self.inner.network()
    }

    async fn suggested_params(&self) -> Result<SuggestedParams, LedgerError> {
        self.inner.suggested_params().await
    }

    async fn submit(&self, txn: &SignedTransaction) -> Result<Submission, LedgerError> {
        let submission = self.inner.submit(txn).await?;
        Ok(Submission {
            committed_at: None,
            ..submission
        })
    }

    async fn lookup(
        &self,
        _reference: &AnchorReference,
    ) -> Result<Option<CommittedEntry>, LedgerError> {
        Ok(None)
    }

    async fn account_balance(&self, address: &LedgerAddress) -> Result<u64, LedgerError> {
        self.inner.account_balance(address).await
    }
}

// ── Fingerprinting ───────────────────────────────────────────────────

#[test]
fn abc_known_answer() {
    assert_eq!(
        Fingerprint::of(b"abc").to_hex(),
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
}

#[test]
fn fingerprint_is_deterministic_and_sensitive_to_single_bits() {
    let base = b"Patient: Jane Doe\nHbA1c: 5.4%\n".to_vec();
    assert_eq!(Fingerprint::of(&base), Fingerprint::of(&base));

    let mut seen = vec![Fingerprint::of(&base)];
    for byte in 0..base.len() {
        let mut flipped = base.clone();
        flipped[byte] ^= 0x01;
        let fp = Fingerprint::of(&flipped);
        assert!(!seen.contains(&fp), "collision after flipping byte {byte}");
        seen.push(fp);
    }
}

// ── Round-trip and mismatch ──────────────────────────────────────────

#[tokio::test]
async fn anchored_fingerprint_verifies_with_commit_time_after_start() {
    let (service, custodian) = funded_service().await;
    let content = b"MRI report, 2026-03-02";
    let start = Timestamp::now();

    let outcome = service.anchor(&Fingerprint::of(content), &custodian).await;
    let reference = committed_reference(&outcome);

    match service.verify_content(reference.as_str(), content).await {
        VerificationOutcome::Verified(result) => {
            assert!(result.matched);
            assert!(result.committed_at >= start);
            assert_eq!(result.reference, reference);
        }
        other => panic!("expected Verified, got {other:?}"),
    }
}

#[tokio::test]
async fn different_expected_fingerprint_is_mismatch_not_error() {
    let (service, custodian) = funded_service().await;
    let outcome = service.anchor(&Fingerprint::of(b"original"), &custodian).await;
    let reference = committed_reference(&outcome);

    let outcome = service.verify_content(reference.as_str(), b"altered").await;
    assert!(!outcome.is_verified());
    match outcome {
        VerificationOutcome::Mismatched(result) => {
            assert!(!result.matched);
            assert_eq!(result.requested, Fingerprint::of(b"altered"));
            assert_eq!(result.ledger_reported, Some(Fingerprint::of(b"original")));
        }
        other => panic!("expected Mismatched, got {other:?}"),
    }
}

#[tokio::test]
async fn uppercase_hex_and_prefix_in_expected_value_still_match() {
    let (service, custodian) = funded_service().await;
    let fingerprint = Fingerprint::of(b"prescription");
    let reference = committed_reference(&service.anchor(&fingerprint, &custodian).await);

    let displayed = format!("0x{}", fingerprint.to_hex().to_uppercase());
    let expected = Fingerprint::from_hex(&displayed).unwrap();
    assert!(service.verify(reference.as_str(), &expected).await.is_verified());
}

#[tokio::test]
async fn note_that_only_resembles_the_fingerprint_is_mismatch() {
    let (service, custodian) = funded_service().await;
    let expected = Fingerprint::of(b"abc");
    let note = format!("  0X{}\n", expected.to_hex().to_uppercase()).into_bytes();

    let params = service.ledger().suggested_params().await.unwrap();
    let signed = PaymentTransaction::self_payment(&custodian.address(), note, &params)
        .unwrap()
        .sign_with(&custodian)
        .unwrap();
    let submission = service.ledger().submit(&signed).await.unwrap();

    match service.verify(submission.reference.as_str(), &expected).await {
        VerificationOutcome::Mismatched(result) => {
            assert!(!result.matched);
            assert_eq!(result.ledger_reported, None);
        }
        other => panic!("expected Mismatched, got {other:?}"),
    }
}

// ── Not found ────────────────────────────────────────────────────────

#[tokio::test]
async fn never_submitted_reference_is_not_found() {
    let (service, _) = funded_service().await;
    let unknown = AnchorReference::from_digest(&[0xab; 32]);
    let outcome = service
        .verify(unknown.as_str(), &Fingerprint::of(b"anything"))
        .await;
    assert!(matches!(outcome, VerificationOutcome::NotFound { .. }));
    assert!(outcome.result().is_none());
}

#[tokio::test]
async fn malformed_references_are_not_found() {
    let (service, _) = funded_service().await;
    let expected = Fingerprint::of(b"anything");
    for bad in [
        "",
        "algo-tx-1700000000000-k3j5h2",
        "not-a-reference",
        "2iyuew37qgbokeiuctseac6t36aakwqqqrwvednxm423tx26yujq",
        "2IYUEW37QGBOKEIUCTSEAC6T36AAKWQQQRWVEDNXM423TX26YUJ",
    ] {
        let outcome = service.verify(bad, &expected).await;
        assert!(
            matches!(outcome, VerificationOutcome::NotFound { .. }),
            "{bad:?} gave {outcome:?}"
        );
    }
}

// ── Failure propagation ──────────────────────────────────────────────

#[tokio::test]
async fn offline_ledger_fails_anchor_without_reference() {
    let ledger = InMemoryLedger::new();
    let custodian = LocalCustodian::generate();
    ledger.credit(&custodian.address(), 10_000_000);
    ledger.set_offline(true);
    let service = AnchorService::new(ledger.clone());

    let outcome = service.anchor(&Fingerprint::of(b"x"), &custodian).await;
    assert!(outcome.reference().is_none());
    let failure = outcome.into_result().unwrap_err();
    assert_eq!(failure.kind, FailureKind::Transient);
    assert!(failure.is_retryable());

    ledger.set_offline(false);
    assert!(ledger.snapshot().transactions.is_empty());
}

#[tokio::test]
async fn offline_lookup_is_lookup_failed_not_verified() {
    let (service, custodian) = funded_service().await;
    let fingerprint = Fingerprint::of(b"lab results");
    let reference = committed_reference(&service.anchor(&fingerprint, &custodian).await);

    service.ledger().set_offline(true);
    match service.verify(reference.as_str(), &fingerprint).await {
        VerificationOutcome::LookupFailed(AnchorFailure { kind, .. }) => {
            assert_eq!(kind, FailureKind::Transient)
        }
        other => panic!("expected LookupFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn unavailable_credential_fails_unauthorized() {
    let service = AnchorService::new(InMemoryLedger::new());
    let owner = LocalCustodian::generate();
    service.ledger().credit(&owner.address(), 10_000_000);
    let custodian = UnavailableCustodian {
        address: owner.address(),
    };

    let outcome = service.anchor(&Fingerprint::of(b"x"), &custodian).await;
    match outcome {
        AnchorOutcome::Failed(failure) => {
            assert_eq!(failure.kind, FailureKind::Unauthorized);
            assert!(!failure.is_retryable());
        }
        other => panic!("expected Failed, got {other:?}"),
    }
}

#[tokio::test]
async fn rejected_anchor_leaves_no_verifiable_reference() {
    let service = AnchorService::new(InMemoryLedger::new());
    let custodian = LocalCustodian::generate();
    let fingerprint = Fingerprint::of(b"unfunded account record");

    // Build the exact transaction the service will attempt, to learn its id.
    let params = service.ledger().suggested_params().await.unwrap();
    let would_be = PaymentTransaction::self_payment(&custodian.address(), fingerprint.to_note(), &params)
        .unwrap()
        .id();

    let outcome = service.anchor(&fingerprint, &custodian).await;
    assert_eq!(
        outcome.clone().into_result().unwrap_err().kind,
        FailureKind::Rejected
    );
    assert!(outcome.reference().is_none());

    let lookup = service.verify(would_be.as_str(), &fingerprint).await;
    assert!(matches!(lookup, VerificationOutcome::NotFound { .. }));
}

#[tokio::test]
async fn unreported_block_time_is_left_empty_on_receipt() {
    let inner = InMemoryLedger::new();
    let custodian = LocalCustodian::generate();
    inner.credit(&custodian.address(), 10_000_000);
    let service = AnchorService::new(UnindexedLedger { inner });

    let receipt = service
        .anchor(&Fingerprint::of(b"echo report"), &custodian)
        .await
        .into_result()
        .unwrap();
    assert_eq!(receipt.committed_at, None);
    assert!(receipt.committed_round > 0);
}

// ── Registry ─────────────────────────────────────────────────────────

#[tokio::test]
async fn registered_record_reverifies_and_detects_tampering() {
    let (service, custodian) = funded_service().await;
    let registry = RecordRegistry::new();
    let content = b"%PDF-1.7 cardiology consult".to_vec();

    let record = service
        .anchor_record(
            &registry,
            RecordMetadata {
                label: "consult.pdf".to_string(),
                description: None,
                size_bytes: content.len() as u64,
            },
            &content,
            &custodian,
        )
        .await
        .unwrap();
    assert_eq!(registry.len(), 1);
    assert_eq!(
        registry.find_by_fingerprint(&Fingerprint::of(&content))[0].record_id,
        record.record_id
    );

    let outcome = service
        .verify_record(&registry, &record.record_id, &content)
        .await
        .unwrap();
    assert!(outcome.is_verified());

    let mut tampered = content.clone();
    tampered[0] = b'#';
    let outcome = service
        .verify_record(&registry, &record.record_id, &tampered)
        .await
        .unwrap();
    assert!(matches!(outcome, VerificationOutcome::Mismatched(_)));
}

#[tokio::test]
async fn failed_anchor_does_not_register_record() {
    let service = AnchorService::new(InMemoryLedger::new());
    let registry = RecordRegistry::new();
    let custodian = LocalCustodian::generate();

    let result = service
        .anchor_record(
            &registry,
            RecordMetadata {
                label: "x.pdf".to_string(),
                description: None,
                size_bytes: 1,
            },
            b"x",
            &custodian,
        )
        .await;
    assert!(result.is_err());
    assert!(registry.is_empty());
}

// ── Demo persistence and concurrency ─────────────────────────────────

#[tokio::test]
async fn demo_state_survives_between_runs() {
    let dir = tempfile::tempdir().unwrap();
    let state = dir.path().join("ledger.json");
    let fingerprint = Fingerprint::of(b"vaccination record");

    let reference = {
        let (service, custodian) = funded_service().await;
        let reference = committed_reference(&service.anchor(&fingerprint, &custodian).await);
        service.ledger().save(&state).unwrap();
        reference
    };

    let service = AnchorService::new(InMemoryLedger::load(&state).unwrap());
    assert!(service.verify(reference.as_str(), &fingerprint).await.is_verified());
}

#[tokio::test]
async fn concurrent_anchors_do_not_interact() {
    let (service, custodian) = funded_service().await;
    let other = LocalCustodian::generate();
    service.fund(&other.address()).await;

    let a = Fingerprint::of(b"record A");
    let b = Fingerprint::of(b"record B");
    let (first, second) = tokio::join!(service.anchor(&a, &custodian), service.anchor(&b, &other));
    let ref_a = committed_reference(&first);
    let ref_b = committed_reference(&second);
    assert_ne!(ref_a, ref_b);

    assert!(service.verify(ref_a.as_str(), &a).await.is_verified());
    assert!(service.verify(ref_b.as_str(), &b).await.is_verified());
    assert!(!service.verify(ref_a.as_str(), &b).await.is_verified());
}

//! The anchoring workflow over the Algorand HTTP client, with wiremock
//! standing in for algod, the indexer, and the faucet.
//!
//! These check that ledger-side failures surface as typed outcomes and
//! never as a receipt or a verification.

use trustrx_anchor::{AnchorOutcome, AnchorService, FailureKind, FundingOutcome, VerificationOutcome};
use trustrx_core::encoding::base64_encode;
use trustrx_core::{AnchorReference, Fingerprint};
use trustrx_crypto::{KeyCustodian, LocalCustodian};
use trustrx_ledger::{AlgorandClient, LedgerConfig, SignedTransaction};
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

fn test_service(mock_server: &MockServer) -> AnchorService<AlgorandClient> {
    let config = LedgerConfig::local_mock(&mock_server.uri()).unwrap();
    AnchorService::new(AlgorandClient::new(config).unwrap())
}

/// Answers a transaction post with the id of the transaction in the body,
/// the way algod does.
struct EchoTxId;

impl Respond for EchoTxId {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        match SignedTransaction::decode(&request.body) {
            Ok(signed) => ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "txId": signed.id().as_str() })),
            Err(e) => ResponseTemplate::new(400)
                .set_body_json(serde_json::json!({ "message": e.to_string() })),
        }
    }
}

async fn mount_params(mock_server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/v2/transactions/params"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "fee": 0,
            "min-fee": 1000,
            "last-round": 500,
            "genesis-id": "testnet-v1.0",
            "genesis-hash": base64_encode(&[2u8; 32]),
        })))
        .mount(mock_server)
        .await;
}

fn indexer_entry(reference: &AnchorReference, custodian: &LocalCustodian, note: &[u8]) -> serde_json::Value {
    serde_json::json!({
        "current-round": 600,
        "transaction": {
            "id": reference.as_str(),
            "sender": custodian.address().as_str(),
            "note": base64_encode(note),
            "confirmed-round": 501,
            "round-time": 1_750_000_000,
            "tx-type": "pay",
        }
    })
}

// ── anchor ───────────────────────────────────────────────────────────

#[tokio::test]
async fn anchor_commits_and_reports_block_time() {
    let mock_server = MockServer::start().await;
    let custodian = LocalCustodian::generate();
    let fingerprint = Fingerprint::of(b"radiology.dcm");

    mount_params(&mock_server).await;
    Mock::given(method("POST"))
        .and(path("/v2/transactions"))
        .respond_with(EchoTxId)
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "last-round": 500 })))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/v2/transactions/pending/[A-Z2-7]{52}$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "confirmed-round": 501,
            "pool-error": "",
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/blocks/501"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "block": { "rnd": 501, "ts": 1_750_000_000 }
        })))
        .mount(&mock_server)
        .await;

    let receipt = match test_service(&mock_server).anchor(&fingerprint, &custodian).await {
        AnchorOutcome::Committed(receipt) => receipt,
        AnchorOutcome::Failed(failure) => panic!("anchor failed: {failure}"),
    };
    assert_eq!(receipt.fingerprint, fingerprint);
    assert_eq!(receipt.committed_round, 501);
    assert_eq!(receipt.committed_at.map(|t| t.epoch_secs()), Some(1_750_000_000));
    assert_eq!(receipt.submitter, custodian.address());
    assert!(!receipt.network.simulated);

    let requests = mock_server.received_requests().await.unwrap();
    let posted = requests
        .iter()
        .find(|r| r.method.as_str() == "POST")
        .unwrap();
    let signed = SignedTransaction::decode(&posted.body).unwrap();
    assert_eq!(signed.id(), receipt.reference);
    assert_eq!(signed.transaction.note, fingerprint.to_note());
    assert_eq!(signed.transaction.amount, 0);
    assert_eq!(signed.transaction.receiver, custodian.address());
    assert_eq!(signed.transaction.first_valid, 500);
    signed.verify().unwrap();
}

#[tokio::test]
async fn anchor_during_outage_fails_transient_without_reference() {
    let mock_server = MockServer::start().await;
    let custodian = LocalCustodian::generate();

    mount_params(&mock_server).await;
    Mock::given(method("POST"))
        .and(path("/v2/transactions"))
        .respond_with(ResponseTemplate::new(503))
        .expect(4)
        .mount(&mock_server)
        .await;

    let outcome = test_service(&mock_server)
        .anchor(&Fingerprint::of(b"x"), &custodian)
        .await;
    assert!(outcome.reference().is_none());
    let failure = outcome.into_result().unwrap_err();
    assert_eq!(failure.kind, FailureKind::Transient);
    assert!(failure.pending_reference.is_none());
}

#[tokio::test]
async fn anchor_unconfirmed_reports_pending_reference() {
    let mock_server = MockServer::start().await;
    let custodian = LocalCustodian::generate();

    mount_params(&mock_server).await;
    Mock::given(method("POST"))
        .and(path("/v2/transactions"))
        .respond_with(EchoTxId)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "last-round": 500 })))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/v2/transactions/pending/[A-Z2-7]{52}$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "pool-error": "" })))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/v2/status/wait-for-block-after/\d+$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "last-round": 501 })))
        .mount(&mock_server)
        .await;

    let outcome = test_service(&mock_server)
        .anchor(&Fingerprint::of(b"slow network"), &custodian)
        .await;
    assert!(outcome.reference().is_none());
    let failure = outcome.into_result().unwrap_err();
    assert_eq!(failure.kind, FailureKind::ConfirmationTimeout);
    assert!(failure.pending_reference.is_some());
}

#[tokio::test]
async fn anchor_overspend_fails_rejected() {
    let mock_server = MockServer::start().await;
    let custodian = LocalCustodian::generate();

    mount_params(&mock_server).await;
    Mock::given(method("POST"))
        .and(path("/v2/transactions"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "message": "TransactionPool.Remember: transaction overspend"
        })))
        .mount(&mock_server)
        .await;

    let outcome = test_service(&mock_server)
        .anchor(&Fingerprint::of(b"x"), &custodian)
        .await;
    match outcome {
        AnchorOutcome::Failed(failure) => {
            assert_eq!(failure.kind, FailureKind::Rejected);
            assert!(failure.message.contains("overspend"));
        }
        other => panic!("expected Failed, got {other:?}"),
    }
}

// ── verify ───────────────────────────────────────────────────────────

#[tokio::test]
async fn verify_reads_fingerprint_from_indexer_note() {
    let mock_server = MockServer::start().await;
    let custodian = LocalCustodian::generate();
    let reference = AnchorReference::from_digest(&[8u8; 32]);
    let fingerprint = Fingerprint::of(b"blood panel");

    Mock::given(method("GET"))
        .and(path(format!("/v2/transactions/{reference}")))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(indexer_entry(&reference, &custodian, &fingerprint.to_note())),
        )
        .mount(&mock_server)
        .await;

    let service = test_service(&mock_server);
    match service.verify(reference.as_str(), &fingerprint).await {
        VerificationOutcome::Verified(result) => {
            assert_eq!(result.committed_round, 501);
            assert_eq!(result.committed_at.epoch_secs(), 1_750_000_000);
        }
        other => panic!("expected Verified, got {other:?}"),
    }
    let other = Fingerprint::of(b"edited blood panel");
    assert!(matches!(
        service.verify(reference.as_str(), &other).await,
        VerificationOutcome::Mismatched(_)
    ));
}

#[tokio::test]
async fn verify_unrelated_note_is_mismatch() {
    let mock_server = MockServer::start().await;
    let custodian = LocalCustodian::generate();
    let reference = AnchorReference::from_digest(&[9u8; 32]);

    Mock::given(method("GET"))
        .and(path(format!("/v2/transactions/{reference}")))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(indexer_entry(&reference, &custodian, b"hello from a wallet")),
        )
        .mount(&mock_server)
        .await;

    match test_service(&mock_server)
        .verify(reference.as_str(), &Fingerprint::of(b"x"))
        .await
    {
        VerificationOutcome::Mismatched(result) => assert!(result.ledger_reported.is_none()),
        other => panic!("expected Mismatched, got {other:?}"),
    }
}

#[tokio::test]
async fn verify_unknown_reference_is_not_found() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/v2/transactions/[A-Z2-7]{52}$"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "message": "no transaction found for transaction id"
        })))
        .mount(&mock_server)
        .await;

    let reference = AnchorReference::from_digest(&[10u8; 32]);
    let outcome = test_service(&mock_server)
        .verify(reference.as_str(), &Fingerprint::of(b"x"))
        .await;
    assert!(matches!(outcome, VerificationOutcome::NotFound { .. }));
}

#[tokio::test]
async fn verify_malformed_reference_makes_no_request() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let outcome = test_service(&mock_server)
        .verify("algo-tx-1700000000000-k3j5h2", &Fingerprint::of(b"x"))
        .await;
    assert!(matches!(outcome, VerificationOutcome::NotFound { .. }));
}

#[tokio::test]
async fn verify_during_indexer_outage_is_lookup_failed() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/v2/transactions/[A-Z2-7]{52}$"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let reference = AnchorReference::from_digest(&[11u8; 32]);
    match test_service(&mock_server)
        .verify(reference.as_str(), &Fingerprint::of(b"x"))
        .await
    {
        VerificationOutcome::LookupFailed(failure) => assert!(failure.is_retryable()),
        other => panic!("expected LookupFailed, got {other:?}"),
    }
}

// ── fund ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn fund_reports_faucet_refusal_without_failing() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/faucet"))
        .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
            "message": "slow down"
        })))
        .mount(&mock_server)
        .await;

    let custodian = LocalCustodian::generate();
    match test_service(&mock_server).fund(&custodian.address()).await {
        FundingOutcome::Unavailable(failure) => assert_eq!(failure.kind, FailureKind::Rejected),
        other => panic!("expected Unavailable, got {other:?}"),
    }
}

//! # Workflow Outcomes
//!
//! Every anchoring, verification, and funding call returns a tagged outcome
//! instead of a bare value. A caller that only looks at the happy path has
//! to write a `match` to get there, so "not anchored" cannot be mistaken
//! for "anchored" and "could not verify" cannot be mistaken for "verified".
//!
//! | Call | Outcomes |
//! |------|----------|
//! | anchor | `Committed(receipt)` / `Failed(failure)` |
//! | verify | `Verified` / `Mismatched` / `NotFound` / `LookupFailed` |
//! | fund | `Funded` / `Unavailable` |

use serde::{Deserialize, Serialize};
use trustrx_core::{AnchorReference, Fingerprint, LedgerAddress, Timestamp};
use trustrx_crypto::CryptoError;
use trustrx_ledger::{FundingReceipt, LedgerError, NetworkDescriptor};

/// Why an anchoring or lookup call did not complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The ledger could not be reached. Retrying later may succeed.
    Transient,
    /// The credential is missing, invalid, or not the sender's.
    Unauthorized,
    /// The ledger refused the transaction.
    Rejected,
    /// Submitted but not committed within the round budget.
    ConfirmationTimeout,
    /// The ledger answered with something unintelligible.
    Protocol,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Transient => "transient",
            Self::Unauthorized => "unauthorized",
            Self::Rejected => "rejected",
            Self::ConfirmationTimeout => "confirmation_timeout",
            Self::Protocol => "protocol",
        };
        f.write_str(s)
    }
}

/// A failed call, classified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorFailure {
    pub kind: FailureKind,
    pub message: String,
    /// For confirmation timeouts: the id of the transaction still pending.
    /// Diagnostic only. It was never observed as committed.
    pub pending_reference: Option<AnchorReference>,
}

impl AnchorFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            pending_reference: None,
        }
    }

    /// Whether trying the same call again could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind,
            FailureKind::Transient | FailureKind::ConfirmationTimeout
        )
    }
}

impl std::fmt::Display for AnchorFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl From<LedgerError> for AnchorFailure {
    fn from(err: LedgerError) -> Self {
        let message = err.to_string();
        match err {
            LedgerError::Unavailable { .. } => Self::new(FailureKind::Transient, message),
            LedgerError::Unauthorized(_) => Self::new(FailureKind::Unauthorized, message),
            LedgerError::Rejected(_) => Self::new(FailureKind::Rejected, message),
            LedgerError::ConfirmationTimeout { reference, .. } => Self {
                kind: FailureKind::ConfirmationTimeout,
                message,
                pending_reference: Some(reference),
            },
            LedgerError::Protocol { .. } | LedgerError::Codec(_) => {
                Self::new(FailureKind::Protocol, message)
            }
        }
    }
}

impl From<CryptoError> for AnchorFailure {
    fn from(err: CryptoError) -> Self {
        Self::new(FailureKind::Unauthorized, err.to_string())
    }
}

// ---------------------------------------------------------------------------
// Anchoring
// ---------------------------------------------------------------------------

/// Proof that a fingerprint was committed to the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorReceipt {
    pub fingerprint: Fingerprint,
    pub reference: AnchorReference,
    /// Block time as reported by the ledger. `None` when neither the node
    /// nor the indexer reported it before the anchor call returned; the
    /// local clock is never substituted.
    pub committed_at: Option<Timestamp>,
    pub committed_round: u64,
    /// Address that signed the anchoring transaction.
    pub submitter: LedgerAddress,
    pub network: NetworkDescriptor,
}

/// Result of an anchoring call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnchorOutcome {
    Committed(AnchorReceipt),
    Failed(AnchorFailure),
}

impl AnchorOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed(_))
    }

    /// The receipt, only when committed.
    pub fn receipt(&self) -> Option<&AnchorReceipt> {
        match self {
            Self::Committed(receipt) => Some(receipt),
            Self::Failed(_) => None,
        }
    }

    /// The ledger reference, only when committed. A pending reference from
    /// a timeout is not returned here.
    pub fn reference(&self) -> Option<&AnchorReference> {
        self.receipt().map(|r| &r.reference)
    }

    pub fn into_result(self) -> Result<AnchorReceipt, AnchorFailure> {
        match self {
            Self::Committed(receipt) => Ok(receipt),
            Self::Failed(failure) => Err(failure),
        }
    }
}

// ---------------------------------------------------------------------------
// Verification
// ---------------------------------------------------------------------------

/// What the ledger holds for a reference, compared with what was expected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub reference: AnchorReference,
    pub requested: Fingerprint,
    /// `None` when the committed note does not hold a fingerprint.
    pub ledger_reported: Option<Fingerprint>,
    pub matched: bool,
    pub committed_at: Timestamp,
    pub committed_round: u64,
    pub network: NetworkDescriptor,
}

/// Result of a verification call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    /// The committed fingerprint equals the expected one.
    Verified(VerificationResult),
    /// The reference resolved, but to a different fingerprint.
    Mismatched(VerificationResult),
    /// The reference is malformed or was never committed.
    NotFound { reference: String },
    /// The ledger could not be asked.
    LookupFailed(AnchorFailure),
}

impl VerificationOutcome {
    /// True only for [`VerificationOutcome::Verified`].
    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified(_))
    }

    /// The comparison, when the reference resolved.
    pub fn result(&self) -> Option<&VerificationResult> {
        match self {
            Self::Verified(result) | Self::Mismatched(result) => Some(result),
            Self::NotFound { .. } | Self::LookupFailed(_) => None,
        }
    }

    /// Short label for logs and CLI output.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Verified(_) => "verified",
            Self::Mismatched(_) => "mismatched",
            Self::NotFound { .. } => "not_found",
            Self::LookupFailed(_) => "lookup_failed",
        }
    }
}

// ---------------------------------------------------------------------------
// Funding
// ---------------------------------------------------------------------------

/// Result of a best-effort funding request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FundingOutcome {
    Funded(FundingReceipt),
    Unavailable(AnchorFailure),
}

impl FundingOutcome {
    pub fn is_funded(&self) -> bool {
        matches!(self, Self::Funded(_))
    }
}

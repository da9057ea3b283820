//! Ledger client error types.

use trustrx_core::AnchorReference;

/// Errors from ledger calls.
///
/// Variants line up with how a caller should react: retry later
/// (`Unavailable`, `ConfirmationTimeout`), fix the credential
/// (`Unauthorized`), fix the transaction or fund the account (`Rejected`),
/// or report a broken node (`Protocol`).
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// The ledger node could not be reached or answered with a server error.
    #[error("ledger unavailable at {endpoint}: {reason}")]
    Unavailable { endpoint: String, reason: String },

    /// The ledger refused the transaction's authorization.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The ledger refused the transaction for any other reason.
    #[error("transaction rejected: {0}")]
    Rejected(String),

    /// The transaction was accepted into the pool but not committed within
    /// the round budget. The reference is diagnostic only.
    #[error("transaction {reference} not committed after {rounds} rounds")]
    ConfirmationTimeout {
        reference: AnchorReference,
        rounds: u64,
    },

    /// The ledger answered with something this client cannot interpret.
    #[error("unexpected response from {endpoint}: {reason}")]
    Protocol { endpoint: String, reason: String },

    /// A transaction could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
}

impl LedgerError {
    pub(crate) fn unavailable(endpoint: &str, reason: impl ToString) -> Self {
        Self::Unavailable {
            endpoint: endpoint.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn protocol(endpoint: &str, reason: impl ToString) -> Self {
        Self::Protocol {
            endpoint: endpoint.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Canonical msgpack encoding or decoding failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// Input ended before a value was complete.
    #[error("unexpected end of input at offset {0}")]
    Truncated(usize),

    /// A type marker this codec does not handle.
    #[error("unsupported msgpack marker 0x{marker:02x} at offset {offset}")]
    UnsupportedMarker { marker: u8, offset: usize },

    /// Input is valid msgpack but not in canonical form.
    #[error("non-canonical encoding: {0}")]
    NonCanonical(String),

    /// A required field is missing or has the wrong type.
    #[error("field {field}: {reason}")]
    Field { field: String, reason: String },

    /// Maps nested deeper than the decoder allows.
    #[error("maps nested too deeply at offset {0}")]
    TooDeep(usize),

    /// Bytes remained after the top-level value.
    #[error("{0} trailing bytes after value")]
    Trailing(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_names_endpoint() {
        let err = LedgerError::unavailable("/v2/status", "connection refused");
        let msg = err.to_string();
        assert!(msg.contains("/v2/status"));
        assert!(msg.contains("connection refused"));
    }

    #[test]
    fn codec_error_converts() {
        let err: LedgerError = CodecError::Truncated(3).into();
        assert!(matches!(err, LedgerError::Codec(CodecError::Truncated(3))));
    }
}

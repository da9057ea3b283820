//! # Error Types
//!
//! Errors raised while constructing core TrustRx values. All errors use
//! `thiserror` and carry the offending input in their message so a
//! rejected identifier can be diagnosed from the log line alone.

use thiserror::Error;

/// Top-level error type for `trustrx-core`.
#[derive(Error, Debug)]
pub enum TrustRxError {
    /// A value failed format validation.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A text encoding could not be decoded.
    #[error("encoding error: {0}")]
    Encoding(#[from] EncodingError),

    /// IO error while reading record content.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A domain identifier or value did not satisfy its format rules.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Fingerprint text is not 64 hex characters.
    #[error("invalid fingerprint {value:?}: {reason}")]
    InvalidFingerprint {
        /// The rejected input.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Ledger address is malformed or fails its checksum.
    #[error("invalid ledger address {value:?}: {reason}")]
    InvalidAddress {
        /// The rejected input.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Anchor reference (transaction id) is malformed.
    #[error("invalid anchor reference {value:?}: {reason}")]
    InvalidReference {
        /// The rejected input.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Timestamp could not be parsed or is out of range.
    #[error("invalid timestamp {value:?}: {reason}")]
    InvalidTimestamp {
        /// The rejected input.
        value: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// A hex, base32, or base64 string could not be decoded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    /// Hex decoding failed.
    #[error("hex decode error: {0}")]
    Hex(String),

    /// Base32 decoding failed.
    #[error("base32 decode error: {0}")]
    Base32(String),

    /// Base64 decoding failed.
    #[error("base64 decode error: {0}")]
    Base64(String),
}

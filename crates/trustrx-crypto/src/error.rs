//! # Cryptographic Error Types

use thiserror::Error;

/// Errors from key handling and signing.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// Ed25519 signature verification failed.
    #[error("Ed25519 verification failed: {0}")]
    VerificationFailed(String),

    /// Invalid Ed25519 signature encoding.
    #[error("invalid Ed25519 signature: {0}")]
    InvalidSignature(String),

    /// Invalid Ed25519 public key.
    #[error("invalid Ed25519 public key: {0}")]
    InvalidPublicKey(String),

    /// Seed material is malformed (wrong length, bad hex).
    #[error("invalid signing key: {0}")]
    InvalidSigningKey(String),

    /// A recovery phrase is malformed or fails its checksum.
    #[error("invalid recovery phrase: {0}")]
    InvalidMnemonic(String),

    /// The credential source could not supply a key.
    #[error("credential unavailable from {source_name}: {reason}")]
    CredentialUnavailable {
        /// Where the credential was expected to come from.
        source_name: String,
        /// Why it could not be loaded.
        reason: String,
    },

    /// The custodian was asked to sign for an address it does not hold.
    #[error("custodian for {held} cannot sign for sender {requested}")]
    SenderMismatch {
        /// Address the custodian holds.
        held: String,
        /// Address named as the transaction sender.
        requested: String,
    },

    /// I/O error reading or writing key files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sender_mismatch_names_both_addresses() {
        let err = CryptoError::SenderMismatch {
            held: "AAA".to_string(),
            requested: "BBB".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("AAA"));
        assert!(msg.contains("BBB"));
    }

    #[test]
    fn credential_unavailable_display() {
        let err = CryptoError::CredentialUnavailable {
            source_name: "env:TRUSTRX_SIGNING_SEED".to_string(),
            reason: "not set".to_string(),
        };
        assert!(err.to_string().contains("TRUSTRX_SIGNING_SEED"));
    }
}

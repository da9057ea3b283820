//! # Ed25519 Signing and Verification
//!
//! Ed25519 keys authorize anchoring transactions. A key's public half
//! *is* the ledger identity: the [`LedgerAddress`] is derived from it.
//!
//! ## Security Invariant
//!
//! Signing input is a [`SigningPayload`], not raw bytes. The only
//! constructor prepends the ledger's `"TX"` domain-separation tag to an
//! encoded transaction, so a key held by a custodian can never be made to
//! sign an arbitrary message that happens to parse as something else.
//!
//! Private key material is never serialized or logged; `SigningKey` has
//! no `Serialize` impl and its `Debug` output is redacted.

use ed25519_dalek::{Signer, Verifier};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use trustrx_core::encoding::{hex_decode, hex_encode};
use trustrx_core::LedgerAddress;
use zeroize::Zeroizing;

use crate::error::CryptoError;
use crate::mnemonic::{mnemonic_to_seed, seed_to_mnemonic};

/// Domain-separation tag the ledger prepends to every transaction before
/// signing or hashing.
pub const TRANSACTION_TAG: &[u8; 2] = b"TX";

/// Bytes a custodian is allowed to sign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningPayload(Vec<u8>);

impl SigningPayload {
    /// Tag an encoded transaction body for signing.
    pub fn transaction(encoded: &[u8]) -> Self {
        let mut bytes = Vec::with_capacity(TRANSACTION_TAG.len() + encoded.len());
        bytes.extend_from_slice(TRANSACTION_TAG);
        bytes.extend_from_slice(encoded);
        Self(bytes)
    }

    /// The tagged bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Ed25519Signature
// ---------------------------------------------------------------------------

/// An Ed25519 signature (64 bytes). Serializes as hex.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ed25519Signature([u8; 64]);

impl Ed25519Signature {
    /// Wrap raw signature bytes.
    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    /// The raw 64 bytes.
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }

    /// Render as 128 lowercase hex characters.
    pub fn to_hex(&self) -> String {
        hex_encode(&self.0)
    }

    /// Parse from 128 hex characters.
    pub fn from_hex(hex: &str) -> Result<Self, CryptoError> {
        let bytes = hex_decode(hex.trim()).map_err(|e| CryptoError::InvalidSignature(e.to_string()))?;
        let arr: [u8; 64] = bytes.try_into().map_err(|v: Vec<u8>| {
            CryptoError::InvalidSignature(format!("expected 64 bytes, got {}", v.len()))
        })?;
        Ok(Self(arr))
    }
}

impl std::fmt::Debug for Ed25519Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Ed25519Signature({}...)", hex_encode(&self.0[..4]))
    }
}

impl Serialize for Ed25519Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Ed25519Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        Self::from_hex(&hex).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// SigningKey
// ---------------------------------------------------------------------------

/// An Ed25519 signing key. Zeroized on drop.
pub struct SigningKey {
    inner: ed25519_dalek::SigningKey,
}

impl SigningKey {
    /// Generate a new key from the OS CSPRNG.
    pub fn generate() -> Self {
        Self {
            inner: ed25519_dalek::SigningKey::generate(&mut rand_core::OsRng),
        }
    }

    /// Build from a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            inner: ed25519_dalek::SigningKey::from_bytes(seed),
        }
    }

    /// Build from a 64-character hex seed.
    pub fn from_seed_hex(hex: &str) -> Result<Self, CryptoError> {
        let bytes = Zeroizing::new(
            hex_decode(hex.trim()).map_err(|e| CryptoError::InvalidSigningKey(e.to_string()))?,
        );
        if bytes.len() != 32 {
            return Err(CryptoError::InvalidSigningKey(format!(
                "expected 32-byte seed (64 hex chars), got {} bytes",
                bytes.len()
            )));
        }
        let mut seed = Zeroizing::new([0u8; 32]);
        seed.copy_from_slice(&bytes);
        Ok(Self::from_seed(&seed))
    }

    /// The seed as hex, wrapped so the copy is wiped when dropped.
    pub fn seed_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(hex_encode(self.inner.as_bytes()))
    }

    /// Build from a 25-word recovery phrase.
    pub fn from_mnemonic(phrase: &str) -> Result<Self, CryptoError> {
        let seed = mnemonic_to_seed(phrase)?;
        Ok(Self::from_seed(&seed))
    }

    /// The seed as a 25-word recovery phrase, wiped when dropped.
    pub fn mnemonic(&self) -> Zeroizing<String> {
        seed_to_mnemonic(self.inner.as_bytes())
    }

    /// The 32-byte public key.
    pub fn public_key(&self) -> [u8; 32] {
        self.inner.verifying_key().to_bytes()
    }

    /// The ledger address controlled by this key.
    pub fn address(&self) -> LedgerAddress {
        LedgerAddress::from_public_key(&self.public_key())
    }

    /// Sign a tagged payload.
    pub fn sign(&self, payload: &SigningPayload) -> Ed25519Signature {
        Ed25519Signature(self.inner.sign(payload.as_bytes()).to_bytes())
    }
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SigningKey(<private>, address={})", self.address())
    }
}

// ---------------------------------------------------------------------------
// Verification
// ---------------------------------------------------------------------------

/// Verify that `signature` over `payload` was produced by the key behind
/// `address`.
pub fn verify_for_address(
    payload: &SigningPayload,
    signature: &Ed25519Signature,
    address: &LedgerAddress,
) -> Result<(), CryptoError> {
    let key = ed25519_dalek::VerifyingKey::from_bytes(&address.public_key())
        .map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))?;
    let sig = ed25519_dalek::Signature::from_bytes(signature.as_bytes());
    key.verify(payload.as_bytes(), &sig)
        .map_err(|e| CryptoError::VerificationFailed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_carries_tx_tag() {
        let payload = SigningPayload::transaction(&[0x81, 0xa1]);
        assert_eq!(payload.as_bytes(), b"TX\x81\xa1");
    }

    #[test]
    fn sign_and_verify_for_own_address() {
        let key = SigningKey::generate();
        let payload = SigningPayload::transaction(b"body");
        let sig = key.sign(&payload);
        verify_for_address(&payload, &sig, &key.address()).expect("own signature verifies");
    }

    #[test]
    fn verify_rejects_other_address() {
        let signer = SigningKey::generate();
        let other = SigningKey::generate();
        let payload = SigningPayload::transaction(b"body");
        let sig = signer.sign(&payload);
        assert!(verify_for_address(&payload, &sig, &other.address()).is_err());
    }

    #[test]
    fn verify_rejects_tampered_payload() {
        let key = SigningKey::generate();
        let sig = key.sign(&SigningPayload::transaction(b"original"));
        let tampered = SigningPayload::transaction(b"tampered");
        assert!(verify_for_address(&tampered, &sig, &key.address()).is_err());
    }

    #[test]
    fn seed_hex_roundtrip_is_deterministic() {
        let key = SigningKey::from_seed(&[42u8; 32]);
        let again = SigningKey::from_seed_hex(&key.seed_hex()).unwrap();
        assert_eq!(key.address(), again.address());
        let payload = SigningPayload::transaction(b"x");
        assert_eq!(key.sign(&payload), again.sign(&payload));
    }

    #[test]
    fn seed_hex_rejects_bad_input() {
        assert!(SigningKey::from_seed_hex("abcd").is_err());
        assert!(SigningKey::from_seed_hex(&"zz".repeat(32)).is_err());
    }

    #[test]
    fn signature_hex_roundtrip() {
        let key = SigningKey::generate();
        let sig = key.sign(&SigningPayload::transaction(b"y"));
        assert_eq!(Ed25519Signature::from_hex(&sig.to_hex()).unwrap(), sig);
        assert!(Ed25519Signature::from_hex("aabb").is_err());
    }

    #[test]
    fn debug_does_not_leak_seed() {
        let key = SigningKey::from_seed(&[1u8; 32]);
        let debug = format!("{key:?}");
        assert!(debug.contains("<private>"));
        assert!(!debug.contains(key.seed_hex().as_str()));
    }
}

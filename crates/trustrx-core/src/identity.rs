//! # Identifier Newtypes
//!
//! Distinct types for the identifiers that flow through the anchoring
//! workflow. A [`LedgerAddress`] cannot be passed where an
//! [`AnchorReference`] is expected, and neither can be built from a string
//! that fails its format rules.
//!
//! ## Formats
//!
//! - [`LedgerAddress`]: 58 characters of unpadded base32 over the 32-byte
//!   Ed25519 public key followed by a 4-byte checksum (the last four bytes
//!   of SHA-512/256 of the key).
//! - [`AnchorReference`]: 52 characters of unpadded base32 over a 32-byte
//!   transaction id.
//! - [`RecordId`]: UUID v4, always valid by construction.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512_256};
use uuid::Uuid;

use crate::encoding::{base32_decode, base32_encode};
use crate::error::ValidationError;

/// Deserialize string newtypes through their validating constructor so
/// that malformed values never enter the system through serde.
macro_rules! impl_validating_deserialize {
    ($ty:ident) => {
        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let raw = String::deserialize(deserializer)?;
                Self::parse(&raw).map_err(serde::de::Error::custom)
            }
        }
    };
}

const ADDRESS_LEN: usize = 58;
const CHECKSUM_LEN: usize = 4;
const REFERENCE_LEN: usize = 52;

// ---------------------------------------------------------------------------
// LedgerAddress
// ---------------------------------------------------------------------------

/// A ledger account address derived from an Ed25519 public key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct LedgerAddress(String);

impl LedgerAddress {
    /// Derive the address for a 32-byte Ed25519 public key.
    pub fn from_public_key(public_key: &[u8; 32]) -> Self {
        let mut raw = Vec::with_capacity(32 + CHECKSUM_LEN);
        raw.extend_from_slice(public_key);
        raw.extend_from_slice(&address_checksum(public_key));
        Self(base32_encode(&raw))
    }

    /// Parse and checksum-validate an address string.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let invalid = |reason: String| ValidationError::InvalidAddress {
            value: s.to_string(),
            reason,
        };
        if s.len() != ADDRESS_LEN {
            return Err(invalid(format!(
                "expected {ADDRESS_LEN} characters, got {}",
                s.len()
            )));
        }
        let raw = base32_decode(s).map_err(|e| invalid(e.to_string()))?;
        if raw.len() != 32 + CHECKSUM_LEN {
            return Err(invalid(format!("decoded to {} bytes", raw.len())));
        }
        let mut key = [0u8; 32];
        key.copy_from_slice(&raw[..32]);
        if raw[32..] != address_checksum(&key) {
            return Err(invalid("checksum mismatch".to_string()));
        }
        Ok(Self(s.to_string()))
    }

    /// The 32-byte public key this address encodes.
    pub fn public_key(&self) -> [u8; 32] {
        // The string was validated (or derived) at construction time.
        let raw = base32_decode(&self.0).unwrap_or_default();
        let mut key = [0u8; 32];
        if raw.len() >= 32 {
            key.copy_from_slice(&raw[..32]);
        }
        key
    }

    /// The address string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn address_checksum(public_key: &[u8; 32]) -> [u8; CHECKSUM_LEN] {
    let hash = Sha512_256::digest(public_key);
    let mut out = [0u8; CHECKSUM_LEN];
    out.copy_from_slice(&hash[hash.len() - CHECKSUM_LEN..]);
    out
}

impl_validating_deserialize!(LedgerAddress);

impl std::fmt::Display for LedgerAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for LedgerAddress {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// ---------------------------------------------------------------------------
// AnchorReference
// ---------------------------------------------------------------------------

/// The ledger's durable handle for a committed anchoring transaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct AnchorReference(String);

impl AnchorReference {
    /// Build the reference for a raw 32-byte transaction id.
    pub fn from_digest(digest: &[u8; 32]) -> Self {
        Self(base32_encode(digest))
    }

    /// Parse a reference string.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let invalid = |reason: String| ValidationError::InvalidReference {
            value: s.to_string(),
            reason,
        };
        if s.len() != REFERENCE_LEN {
            return Err(invalid(format!(
                "expected {REFERENCE_LEN} base32 characters, got {}",
                s.len()
            )));
        }
        let raw = base32_decode(s).map_err(|e| invalid(e.to_string()))?;
        if raw.len() != 32 {
            return Err(invalid(format!("decoded to {} bytes", raw.len())));
        }
        Ok(Self(s.to_string()))
    }

    /// The reference string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl_validating_deserialize!(AnchorReference);

impl std::fmt::Display for AnchorReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for AnchorReference {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// ---------------------------------------------------------------------------
// RecordId
// ---------------------------------------------------------------------------

/// Identifier for a medical record tracked in the local registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(Uuid);

impl RecordId {
    /// Create a new random record identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for RecordId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RecordId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::from_str(s).map(Self)
    }
}

//! # Record Fingerprints
//!
//! A [`Fingerprint`] is the SHA-256 digest of a record's exact byte
//! content. It is the value anchored on the ledger and the value compared
//! during verification.
//!
//! ## Invariants
//!
//! - Pure function of the input bytes: identical bytes always produce
//!   identical fingerprints, and the empty input is valid.
//! - Transport form is 64 lowercase hex characters with no prefix. Parsing
//!   also accepts uppercase and a leading `0x`, which is how the web
//!   dashboard displays hashes.
//! - Equality between fingerprints is evaluated in constant time.

use std::io::Read;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::encoding::{hex_decode, hex_encode};
use crate::error::{TrustRxError, ValidationError};

/// Length of a fingerprint in bytes.
pub const FINGERPRINT_LEN: usize = 32;

/// Length of a fingerprint's hex transport form.
pub const FINGERPRINT_HEX_LEN: usize = FINGERPRINT_LEN * 2;

const READ_CHUNK: usize = 64 * 1024;

/// SHA-256 digest of a record's content.
#[derive(Clone, Copy)]
pub struct Fingerprint([u8; FINGERPRINT_LEN]);

impl Fingerprint {
    /// Fingerprint an in-memory byte sequence.
    pub fn of(bytes: &[u8]) -> Self {
        let hash = Sha256::digest(bytes);
        let mut out = [0u8; FINGERPRINT_LEN];
        out.copy_from_slice(&hash);
        Self(out)
    }

    /// Fingerprint everything readable from `reader`, streaming in chunks.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self, TrustRxError> {
        let mut hasher = Sha256::new();
        let mut buf = vec![0u8; READ_CHUNK];
        loop {
            let n = reader.read(&mut buf)?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
        }
        let mut out = [0u8; FINGERPRINT_LEN];
        out.copy_from_slice(&hasher.finalize());
        Ok(Self(out))
    }

    /// Wrap raw digest bytes.
    pub fn from_bytes(bytes: [u8; FINGERPRINT_LEN]) -> Self {
        Self(bytes)
    }

    /// The raw 32 digest bytes.
    pub fn as_bytes(&self) -> &[u8; FINGERPRINT_LEN] {
        &self.0
    }

    /// Render as 64 lowercase hex characters.
    pub fn to_hex(&self) -> String {
        hex_encode(&self.0)
    }

    /// Parse the hex transport form.
    pub fn from_hex(text: &str) -> Result<Self, ValidationError> {
        let trimmed = text.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        if digits.len() != FINGERPRINT_HEX_LEN {
            return Err(ValidationError::InvalidFingerprint {
                value: text.to_string(),
                reason: format!(
                    "expected {FINGERPRINT_HEX_LEN} hex characters, got {}",
                    digits.len()
                ),
            });
        }
        let bytes = hex_decode(digits).map_err(|e| ValidationError::InvalidFingerprint {
            value: text.to_string(),
            reason: e.to_string(),
        })?;
        let mut out = [0u8; FINGERPRINT_LEN];
        out.copy_from_slice(&bytes);
        Ok(Self(out))
    }

    /// The bytes carried in a ledger transaction note: the ASCII hex form.
    pub fn to_note(&self) -> Vec<u8> {
        self.to_hex().into_bytes()
    }

    /// Recover a fingerprint from a ledger transaction note.
    ///
    /// Only the exact form [`Fingerprint::to_note`] writes is accepted: 64
    /// lowercase hex bytes with nothing around them. Anything else returns
    /// `None` and can never match an expected value.
    pub fn from_note(note: &[u8]) -> Option<Self> {
        if note.len() != FINGERPRINT_HEX_LEN
            || !note.iter().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
        {
            return None;
        }
        let text = std::str::from_utf8(note).ok()?;
        Self::from_hex(text).ok()
    }
}

impl PartialEq for Fingerprint {
    fn eq(&self, other: &Self) -> bool {
        self.0.ct_eq(&other.0).into()
    }
}

impl Eq for Fingerprint {}

impl std::hash::Hash for Fingerprint {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl std::fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Fingerprint({})", self.to_hex())
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl std::str::FromStr for Fingerprint {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for Fingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Fingerprint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        Self::from_hex(&hex).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const ABC_SHA256: &str = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";
    const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    #[test]
    fn known_answer_abc() {
        assert_eq!(Fingerprint::of(b"abc").to_hex(), ABC_SHA256);
    }

    #[test]
    fn empty_input_is_valid() {
        assert_eq!(Fingerprint::of(b"").to_hex(), EMPTY_SHA256);
    }

    #[test]
    fn reader_matches_in_memory() {
        let data: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        let streamed = Fingerprint::from_reader(std::io::Cursor::new(&data)).unwrap();
        assert_eq!(streamed, Fingerprint::of(&data));
    }

    #[test]
    fn near_identical_inputs_differ() {
        let base = b"patient: Jane Doe; result: negative".to_vec();
        let reference = Fingerprint::of(&base);
        for byte in 0..base.len() {
            for bit in 0..8 {
                let mut flipped = base.clone();
                flipped[byte] ^= 1 << bit;
                assert_ne!(Fingerprint::of(&flipped), reference, "byte {byte} bit {bit}");
            }
        }
    }

    #[test]
    fn parse_accepts_prefix_and_uppercase() {
        let fp = Fingerprint::of(b"abc");
        let upper = format!("0x{}", ABC_SHA256.to_uppercase());
        assert_eq!(Fingerprint::from_hex(&upper).unwrap(), fp);
    }

    #[test]
    fn parse_rejects_wrong_length() {
        let err = Fingerprint::from_hex("0xabcdef123456789").unwrap_err();
        assert!(matches!(err, ValidationError::InvalidFingerprint { .. }));
    }

    #[test]
    fn parse_rejects_non_hex() {
        assert!(Fingerprint::from_hex(&"g".repeat(64)).is_err());
    }

    #[test]
    fn note_roundtrip_and_garbage() {
        let fp = Fingerprint::of(b"lab-report.pdf contents");
        assert_eq!(fp.to_note().len(), FINGERPRINT_HEX_LEN);
        assert_eq!(Fingerprint::from_note(&fp.to_note()), Some(fp));
        assert_eq!(Fingerprint::from_note(&[0xff, 0xfe]), None);
        assert_eq!(Fingerprint::from_note(b"hello"), None);
    }

    #[test]
    fn note_must_be_exact_lowercase_form() {
        let upper = ABC_SHA256.to_uppercase();
        for note in [
            upper.clone(),
            format!("0x{ABC_SHA256}"),
            format!(" {ABC_SHA256}"),
            format!("{ABC_SHA256}\n"),
            format!("  0X{upper}\n"),
        ] {
            assert_eq!(Fingerprint::from_note(note.as_bytes()), None, "{note:?}");
        }
        assert_eq!(
            Fingerprint::from_note(ABC_SHA256.as_bytes()),
            Some(Fingerprint::of(b"abc"))
        );
    }

    #[test]
    fn serde_as_hex_string() {
        let fp = Fingerprint::of(b"abc");
        let json = serde_json::to_string(&fp).unwrap();
        assert_eq!(json, format!("\"{ABC_SHA256}\""));
        let back: Fingerprint = serde_json::from_str(&json).unwrap();
        assert_eq!(back, fp);
    }

    proptest! {
        #[test]
        fn fingerprint_is_deterministic(data in proptest::collection::vec(any::<u8>(), 0..2048)) {
            prop_assert_eq!(Fingerprint::of(&data), Fingerprint::of(&data));
        }

        #[test]
        fn hex_form_is_lowercase_64(data in proptest::collection::vec(any::<u8>(), 0..256)) {
            let hex = Fingerprint::of(&data).to_hex();
            prop_assert_eq!(hex.len(), 64);
            prop_assert!(hex.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
        }
    }
}

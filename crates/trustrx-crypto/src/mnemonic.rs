//! # Recovery Phrases
//!
//! The ledger's 25-word recovery phrase for a 32-byte Ed25519 seed:
//!
//! ```text
//! seed (256 bits) ─▶ 24 × 11-bit groups, little-endian ─▶ 24 words
//! SHA-512/256(seed)[0..2] ─▶ low 11 bits ─────────────▶ checksum word
//! ```
//!
//! Words come from the BIP-39 English list. The last data group carries
//! only the seed's final 3 bits, so decoding must leave a zero byte past
//! the seed. Phrases written here restore in standard ledger wallets and
//! phrases exported by those wallets load here.

use sha2::{Digest, Sha512_256};
use zeroize::Zeroizing;

use crate::error::CryptoError;
use crate::wordlist::{index_of, ENGLISH};

/// Words in a recovery phrase, checksum included.
pub const MNEMONIC_WORDS: usize = 25;

const SEED_LEN: usize = 32;
const DATA_WORDS: usize = MNEMONIC_WORDS - 1;
const ELEVEN_BITS: u32 = 0x7ff;

/// Encode a seed as its recovery phrase, words separated by single spaces.
pub fn seed_to_mnemonic(seed: &[u8; SEED_LEN]) -> Zeroizing<String> {
    let indices = to_eleven_bit(seed);
    let mut words: Vec<&str> = indices.iter().map(|&i| ENGLISH[usize::from(i)]).collect();
    words.push(checksum_word(seed));
    Zeroizing::new(words.join(" "))
}

/// Decode a recovery phrase back to its seed.
///
/// Words are matched case-insensitively and may be separated by any
/// whitespace. Errors never echo the phrase.
pub fn mnemonic_to_seed(phrase: &str) -> Result<Zeroizing<[u8; SEED_LEN]>, CryptoError> {
    let words: Vec<Zeroizing<String>> = phrase
        .split_whitespace()
        .map(|w| Zeroizing::new(w.to_ascii_lowercase()))
        .collect();
    if words.len() != MNEMONIC_WORDS {
        return Err(CryptoError::InvalidMnemonic(format!(
            "expected {MNEMONIC_WORDS} words, got {}",
            words.len()
        )));
    }

    let mut indices = Zeroizing::new(Vec::with_capacity(DATA_WORDS));
    for (position, word) in words[..DATA_WORDS].iter().enumerate() {
        let index = index_of(word).ok_or_else(|| {
            CryptoError::InvalidMnemonic(format!("word {} is not in the wordlist", position + 1))
        })?;
        indices.push(index);
    }

    let bytes = from_eleven_bit(&indices);
    if bytes.len() != SEED_LEN + 1 || bytes[SEED_LEN] != 0 {
        return Err(CryptoError::InvalidMnemonic(
            "phrase does not encode a 32-byte seed".to_string(),
        ));
    }
    let mut seed = Zeroizing::new([0u8; SEED_LEN]);
    seed.copy_from_slice(&bytes[..SEED_LEN]);

    if checksum_word(&seed) != words[DATA_WORDS].as_str() {
        return Err(CryptoError::InvalidMnemonic(
            "checksum word does not match".to_string(),
        ));
    }
    Ok(seed)
}

fn checksum_word(seed: &[u8; SEED_LEN]) -> &'static str {
    let digest = Sha512_256::digest(seed);
    let index = (u32::from(digest[0]) | u32::from(digest[1]) << 8) & ELEVEN_BITS;
    ENGLISH[index as usize]
}

fn to_eleven_bit(bytes: &[u8]) -> Zeroizing<Vec<u16>> {
    let mut out = Zeroizing::new(Vec::with_capacity(bytes.len() * 8 / 11 + 1));
    let mut acc: u32 = 0;
    let mut bits: u32 = 0;
    for &byte in bytes {
        acc |= u32::from(byte) << bits;
        bits += 8;
        if bits >= 11 {
            out.push((acc & ELEVEN_BITS) as u16);
            acc >>= 11;
            bits -= 11;
        }
    }
    if bits > 0 {
        out.push(acc as u16);
    }
    out
}

fn from_eleven_bit(groups: &[u16]) -> Zeroizing<Vec<u8>> {
    let mut out = Zeroizing::new(Vec::with_capacity(groups.len() * 11 / 8 + 1));
    let mut acc: u32 = 0;
    let mut bits: u32 = 0;
    for &group in groups {
        acc |= u32::from(group) << bits;
        bits += 11;
        while bits >= 8 {
            out.push((acc & 0xff) as u8);
            acc >>= 8;
            bits -= 8;
        }
    }
    if bits > 0 {
        out.push(acc as u8);
    }
    out
}

//! # Text Encodings
//!
//! Hex, base32, and base64 codecs for the ledger wire formats.
//!
//! - **Hex** (lowercase) is the transport form of record fingerprints and
//!   key seeds.
//! - **Base32** (RFC 4648 alphabet, unpadded) encodes ledger addresses and
//!   transaction identifiers.
//! - **Base64** (RFC 4648 standard alphabet, padded) is how the ledger's
//!   REST APIs carry binary fields such as transaction notes and the
//!   genesis hash.
//!
//! Each codec is a handful of lines; they live here rather than behind
//! three extra dependencies.

use crate::error::EncodingError;

const BASE32_ALPHABET: &[u8; 32] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";
const BASE64_ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

// ---------------------------------------------------------------------------
// Hex
// ---------------------------------------------------------------------------

/// Render bytes as a lowercase hex string.
pub fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Decode a hex string (either case) into bytes.
pub fn hex_decode(hex: &str) -> Result<Vec<u8>, EncodingError> {
    if hex.len() % 2 != 0 {
        return Err(EncodingError::Hex(
            "hex string must have even length".to_string(),
        ));
    }
    if !hex.is_ascii() {
        return Err(EncodingError::Hex("hex string must be ASCII".to_string()));
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|e| EncodingError::Hex(format!("invalid hex at position {i}: {e}")))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Base32 (unpadded)
// ---------------------------------------------------------------------------

/// Encode bytes as unpadded RFC 4648 base32.
pub fn base32_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity((bytes.len() * 8).div_ceil(5));
    let mut buffer: u32 = 0;
    let mut bits: u32 = 0;
    for &byte in bytes {
        buffer = (buffer << 8) | u32::from(byte);
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            let index = ((buffer >> bits) & 0x1f) as usize;
            out.push(BASE32_ALPHABET[index] as char);
        }
    }
    if bits > 0 {
        let index = ((buffer << (5 - bits)) & 0x1f) as usize;
        out.push(BASE32_ALPHABET[index] as char);
    }
    out
}

/// Decode unpadded RFC 4648 base32.
///
/// Trailing bits that do not complete a byte must be zero, so every byte
/// string has exactly one accepted encoding.
pub fn base32_decode(text: &str) -> Result<Vec<u8>, EncodingError> {
    let mut out = Vec::with_capacity(text.len() * 5 / 8);
    let mut buffer: u32 = 0;
    let mut bits: u32 = 0;
    for (position, c) in text.bytes().enumerate() {
        let value = match c {
            b'A'..=b'Z' => c - b'A',
            b'2'..=b'7' => c - b'2' + 26,
            _ => {
                return Err(EncodingError::Base32(format!(
                    "invalid character {:?} at position {position}",
                    c as char
                )))
            }
        };
        buffer = ((buffer << 5) | u32::from(value)) & 0xffff;
        bits += 5;
        if bits >= 8 {
            bits -= 8;
            out.push(((buffer >> bits) & 0xff) as u8);
        }
    }
    if bits >= 5 || buffer & ((1 << bits) - 1) != 0 {
        return Err(EncodingError::Base32(
            "non-canonical trailing bits".to_string(),
        ));
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Base64 (padded)
// ---------------------------------------------------------------------------

/// Encode bytes as padded RFC 4648 base64.
pub fn base64_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len().div_ceil(3) * 4);
    for chunk in bytes.chunks(3) {
        let b0 = u32::from(chunk[0]);
        let b1 = chunk.get(1).copied().map(u32::from).unwrap_or(0);
        let b2 = chunk.get(2).copied().map(u32::from).unwrap_or(0);
        let triple = (b0 << 16) | (b1 << 8) | b2;
        out.push(BASE64_ALPHABET[(triple >> 18) as usize & 0x3f] as char);
        out.push(BASE64_ALPHABET[(triple >> 12) as usize & 0x3f] as char);
        if chunk.len() > 1 {
            out.push(BASE64_ALPHABET[(triple >> 6) as usize & 0x3f] as char);
        } else {
            out.push('=');
        }
        if chunk.len() > 2 {
            out.push(BASE64_ALPHABET[triple as usize & 0x3f] as char);
        } else {
            out.push('=');
        }
    }
    out
}

/// Decode padded RFC 4648 base64. Surrounding whitespace is ignored.
pub fn base64_decode(text: &str) -> Result<Vec<u8>, EncodingError> {
    let text = text.trim();
    if text.len() % 4 != 0 {
        return Err(EncodingError::Base64(format!(
            "length {} is not a multiple of 4",
            text.len()
        )));
    }
    let mut out = Vec::with_capacity(text.len() / 4 * 3);
    let bytes = text.as_bytes();
    let quads = bytes.len() / 4;
    for (q, quad) in bytes.chunks(4).enumerate() {
        let last = q + 1 == quads;
        let padding = quad.iter().rev().take_while(|&&c| c == b'=').count();
        if padding > 2 || (padding > 0 && !last) {
            return Err(EncodingError::Base64("misplaced padding".to_string()));
        }
        let mut triple: u32 = 0;
        for (i, &c) in quad.iter().enumerate() {
            let value = if i >= 4 - padding {
                0
            } else {
                base64_value(c).ok_or_else(|| {
                    EncodingError::Base64(format!(
                        "invalid character {:?} at position {}",
                        c as char,
                        q * 4 + i
                    ))
                })?
            };
            triple = (triple << 6) | value;
        }
        out.push((triple >> 16) as u8);
        if padding < 2 {
            out.push((triple >> 8) as u8);
        }
        if padding < 1 {
            out.push(triple as u8);
        }
    }
    Ok(out)
}

fn base64_value(c: u8) -> Option<u32> {
    match c {
        b'A'..=b'Z' => Some(u32::from(c - b'A')),
        b'a'..=b'z' => Some(u32::from(c - b'a') + 26),
        b'0'..=b'9' => Some(u32::from(c - b'0') + 52),
        b'+' => Some(62),
        b'/' => Some(63),
        _ => None,
    }
}

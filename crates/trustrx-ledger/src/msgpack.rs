//! # Canonical MessagePack
//!
//! The ledger hashes and signs transactions in a canonical msgpack form:
//!
//! - maps have string keys sorted in ascending byte order,
//! - zero and empty fields are omitted entirely,
//! - integers and length headers use their smallest encoding,
//! - byte fields are `bin`, text fields are `str`.
//!
//! Two encoders that follow these rules produce identical bytes for the
//! same transaction, which is what makes the transaction id reproducible.
//! Only the subset of msgpack used by payment transactions is supported.
//! The decoder rejects anything non-canonical, and maps nested deeper
//! than [`MAX_DEPTH`].

use std::collections::BTreeMap;

use crate::error::CodecError;

/// Deepest map nesting the decoder accepts. A signed transaction is two
/// levels deep.
pub const MAX_DEPTH: usize = 4;

/// A msgpack value in the subset used by transactions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Uint(u64),
    Str(String),
    Bin(Vec<u8>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Encode canonically.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.encode_into(&mut out);
        out
    }

    fn encode_into(&self, out: &mut Vec<u8>) {
        match self {
            Value::Uint(n) => write_uint(out, *n),
            Value::Str(s) => {
                write_str_header(out, s.len());
                out.extend_from_slice(s.as_bytes());
            }
            Value::Bin(b) => {
                write_bin_header(out, b.len());
                out.extend_from_slice(b);
            }
            Value::Map(m) => {
                write_map_header(out, m.len());
                for (key, value) in m {
                    write_str_header(out, key.len());
                    out.extend_from_slice(key.as_bytes());
                    value.encode_into(out);
                }
            }
        }
    }

    /// Decode one canonical value spanning all of `bytes`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut reader = Reader {
            bytes,
            pos: 0,
            depth: 0,
        };
        let value = reader.value()?;
        let rest = bytes.len() - reader.pos;
        if rest != 0 {
            return Err(CodecError::Trailing(rest));
        }
        Ok(value)
    }

    /// Look up a map entry.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Map(m) => m.get(key),
            _ => None,
        }
    }

    /// An unsigned integer field; absent means zero.
    pub fn uint_field(&self, key: &str) -> Result<u64, CodecError> {
        match self.get(key) {
            None => Ok(0),
            Some(Value::Uint(n)) => Ok(*n),
            Some(_) => Err(field_error(key, "expected unsigned integer")),
        }
    }

    /// A string field; absent means empty.
    pub fn str_field(&self, key: &str) -> Result<&str, CodecError> {
        match self.get(key) {
            None => Ok(""),
            Some(Value::Str(s)) => Ok(s),
            Some(_) => Err(field_error(key, "expected string")),
        }
    }

    /// A byte field; absent means empty.
    pub fn bin_field(&self, key: &str) -> Result<&[u8], CodecError> {
        match self.get(key) {
            None => Ok(&[]),
            Some(Value::Bin(b)) => Ok(b),
            Some(_) => Err(field_error(key, "expected bytes")),
        }
    }

    /// A fixed-width byte field; absent means all zeros.
    pub fn fixed_field<const N: usize>(&self, key: &str) -> Result<[u8; N], CodecError> {
        let raw = self.bin_field(key)?;
        let mut out = [0u8; N];
        match raw.len() {
            0 => Ok(out),
            n if n == N => {
                out.copy_from_slice(raw);
                Ok(out)
            }
            n => Err(field_error(key, format!("expected {N} bytes, got {n}"))),
        }
    }
}

fn field_error(key: &str, reason: impl ToString) -> CodecError {
    CodecError::Field {
        field: key.to_string(),
        reason: reason.to_string(),
    }
}

/// Builds a canonical map, dropping zero and empty fields.
#[derive(Debug, Default)]
pub struct MapBuilder(BTreeMap<String, Value>);

impl MapBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn uint(mut self, key: &str, value: u64) -> Self {
        if value != 0 {
            self.0.insert(key.to_string(), Value::Uint(value));
        }
        self
    }

    pub fn str(mut self, key: &str, value: &str) -> Self {
        if !value.is_empty() {
            self.0.insert(key.to_string(), Value::Str(value.to_string()));
        }
        self
    }

    /// Variable-length bytes; omitted when empty.
    pub fn bin(mut self, key: &str, value: &[u8]) -> Self {
        if !value.is_empty() {
            self.0.insert(key.to_string(), Value::Bin(value.to_vec()));
        }
        self
    }

    /// Fixed-width bytes (keys, hashes); omitted when all zero.
    pub fn fixed(mut self, key: &str, value: &[u8]) -> Self {
        if value.iter().any(|b| *b != 0) {
            self.0.insert(key.to_string(), Value::Bin(value.to_vec()));
        }
        self
    }

    pub fn map(mut self, key: &str, value: Value) -> Self {
        if !matches!(&value, Value::Map(m) if m.is_empty()) {
            self.0.insert(key.to_string(), value);
        }
        self
    }

    pub fn build(self) -> Value {
        Value::Map(self.0)
    }
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

fn write_uint(out: &mut Vec<u8>, n: u64) {
    if n <= 0x7f {
        out.push(n as u8);
    } else if n <= u8::MAX as u64 {
        out.extend_from_slice(&[0xcc, n as u8]);
    } else if n <= u16::MAX as u64 {
        out.push(0xcd);
        out.extend_from_slice(&(n as u16).to_be_bytes());
    } else if n <= u32::MAX as u64 {
        out.push(0xce);
        out.extend_from_slice(&(n as u32).to_be_bytes());
    } else {
        out.push(0xcf);
        out.extend_from_slice(&n.to_be_bytes());
    }
}

fn write_str_header(out: &mut Vec<u8>, len: usize) {
    if len < 32 {
        out.push(0xa0 | len as u8);
    } else if len <= u8::MAX as usize {
        out.extend_from_slice(&[0xd9, len as u8]);
    } else if len <= u16::MAX as usize {
        out.push(0xda);
        out.extend_from_slice(&(len as u16).to_be_bytes());
    } else {
        out.push(0xdb);
        out.extend_from_slice(&(len as u32).to_be_bytes());
    }
}

fn write_bin_header(out: &mut Vec<u8>, len: usize) {
    if len <= u8::MAX as usize {
        out.extend_from_slice(&[0xc4, len as u8]);
    } else if len <= u16::MAX as usize {
        out.push(0xc5);
        out.extend_from_slice(&(len as u16).to_be_bytes());
    } else {
        out.push(0xc6);
        out.extend_from_slice(&(len as u32).to_be_bytes());
    }
}

fn write_map_header(out: &mut Vec<u8>, len: usize) {
    if len < 16 {
        out.push(0x80 | len as u8);
    } else if len <= u16::MAX as usize {
        out.push(0xde);
        out.extend_from_slice(&(len as u16).to_be_bytes());
    } else {
        out.push(0xdf);
        out.extend_from_slice(&(len as u32).to_be_bytes());
    }
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
    depth: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], CodecError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.bytes.len())
            .ok_or(CodecError::Truncated(self.pos))?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn byte(&mut self) -> Result<u8, CodecError> {
        Ok(self.take(1)?[0])
    }

    fn be(&mut self, width: usize) -> Result<u64, CodecError> {
        Ok(self
            .take(width)?
            .iter()
            .fold(0u64, |acc, b| (acc << 8) | u64::from(*b)))
    }

    fn value(&mut self) -> Result<Value, CodecError> {
        let offset = self.pos;
        let marker = self.byte()?;
        match marker {
            0x00..=0x7f => Ok(Value::Uint(u64::from(marker))),
            0xcc..=0xcf => {
                let width = 1usize << (marker - 0xcc);
                let n = self.be(width)?;
                if (width > 1 && n < (1u64 << (4 * width))) || (width == 1 && n <= 0x7f) {
                    return Err(CodecError::NonCanonical(format!(
                        "integer {n} at offset {offset} has a wider encoding than needed"
                    )));
                }
                Ok(Value::Uint(n))
            }
            0xa0..=0xbf => self.string((marker & 0x1f) as usize),
            0xd9..=0xdb => {
                let width = 1usize << (marker - 0xd9);
                let len = self.be(width)? as usize;
                let min = if width == 1 { 32 } else { 1usize << (4 * width) };
                if len < min {
                    return Err(CodecError::NonCanonical(format!(
                        "string header at offset {offset} wider than needed"
                    )));
                }
                self.string(len)
            }
            0xc4..=0xc6 => {
                let width = 1usize << (marker - 0xc4);
                let len = self.be(width)? as usize;
                if width > 1 && len < (1usize << (4 * width)) {
                    return Err(CodecError::NonCanonical(format!(
                        "bin header at offset {offset} wider than needed"
                    )));
                }
                Ok(Value::Bin(self.take(len)?.to_vec()))
            }
            0x80..=0x8f => self.map((marker & 0x0f) as usize),
            0xde | 0xdf => {
                let width = if marker == 0xde { 2 } else { 4 };
                let len = self.be(width)? as usize;
                let min = if width == 2 { 16 } else { 1 << 16 };
                if len < min {
                    return Err(CodecError::NonCanonical(format!(
                        "map header at offset {offset} wider than needed"
                    )));
                }
                self.map(len)
            }
            other => Err(CodecError::UnsupportedMarker {
                marker: other,
                offset,
            }),
        }
    }

    fn string(&mut self, len: usize) -> Result<Value, CodecError> {
        let offset = self.pos;
        let raw = self.take(len)?;
        let s = std::str::from_utf8(raw)
            .map_err(|_| CodecError::NonCanonical(format!("invalid UTF-8 at offset {offset}")))?;
        Ok(Value::Str(s.to_string()))
    }

    fn map(&mut self, len: usize) -> Result<Value, CodecError> {
        if self.depth == MAX_DEPTH {
            return Err(CodecError::TooDeep(self.pos));
        }
        self.depth += 1;
        let map = self.entries(len)?;
        self.depth -= 1;
        Ok(Value::Map(map))
    }

    fn entries(&mut self, len: usize) -> Result<BTreeMap<String, Value>, CodecError> {
        let mut map = BTreeMap::new();
        let mut previous: Option<String> = None;
        for _ in 0..len {
            let offset = self.pos;
            let key = match self.value()? {
                Value::Str(s) => s,
                _ => {
                    return Err(CodecError::NonCanonical(format!(
                        "map key at offset {offset} is not a string"
                    )))
                }
            };
            if previous.as_ref().is_some_and(|p| *p >= key) {
                return Err(CodecError::NonCanonical(format!(
                    "map key {key:?} at offset {offset} out of order"
                )));
            }
            let value = self.value()?;
            previous = Some(key.clone());
            map.insert(key, value);
        }
        Ok(map)
    }
}

//! # trustrx-core — Foundational Types for Record Anchoring
//!
//! Leaf crate of the TrustRx workspace. Every other crate depends on it;
//! it depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtypes for every identifier.** [`LedgerAddress`],
//!    [`AnchorReference`], and [`RecordId`] validate at construction and
//!    at deserialization. A fabricated transaction id such as
//!    `algo-tx-<millis>-<random>` cannot be represented as a reference.
//!
//! 2. **One fingerprint type.** [`Fingerprint`] is SHA-256 over the exact
//!    record bytes, transported as lowercase hex, compared in constant time.
//!
//! 3. **UTC seconds-precision time.** [`Timestamp`] matches the precision of
//!    ledger round times.
//!
//! ## Crate Policy
//!
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod encoding;
pub mod error;
pub mod fingerprint;
pub mod identity;
pub mod temporal;

pub use error::{EncodingError, TrustRxError, ValidationError};
pub use fingerprint::{Fingerprint, FINGERPRINT_HEX_LEN, FINGERPRINT_LEN};
pub use identity::{AnchorReference, LedgerAddress, RecordId};
pub use temporal::Timestamp;

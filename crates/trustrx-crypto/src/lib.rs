//! # trustrx-crypto — Keys and Signing
//!
//! - **Ed25519** signing over tagged transaction payloads.
//! - **Recovery phrases**: the ledger's 25-word encoding of a seed.
//! - **Key custodians** that hold the credential for a ledger identity:
//!   in-memory, environment variable, or seed file.
//!
//! ## Crate Policy
//!
//! - Depends only on `trustrx-core` internally.
//! - Tests use real Ed25519; nothing cryptographic is mocked.

pub mod custodian;
pub mod ed25519;
pub mod error;
pub mod mnemonic;
mod wordlist;

pub use custodian::{
    generate_identity, parse_credential, write_seed_file, CredentialSource, EnvCustodian,
    FileCustodian, Identity, KeyCustodian, LocalCustodian,
};
pub use ed25519::{verify_for_address, Ed25519Signature, SigningKey, SigningPayload};
pub use error::CryptoError;
pub use mnemonic::{mnemonic_to_seed, seed_to_mnemonic, MNEMONIC_WORDS};

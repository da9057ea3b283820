//! # Payment Transactions
//!
//! An anchor is a zero-amount payment from an account to itself whose note
//! carries the record fingerprint. This module builds that transaction from
//! the ledger's suggested parameters, encodes it canonically, derives its
//! id, and has a [`KeyCustodian`] sign it.
//!
//! ## Identity of a transaction
//!
//! ```text
//! payload = "TX" || msgpack(txn)
//! txid    = base32(SHA-512/256(payload))    52 chars, unpadded
//! ```
//!
//! The id is fixed before submission, so a client can poll for the
//! commitment of exactly the transaction it signed.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512_256};
use trustrx_core::{AnchorReference, LedgerAddress};
use trustrx_crypto::{
    verify_for_address, CryptoError, Ed25519Signature, KeyCustodian, SigningPayload,
};

use crate::error::{CodecError, LedgerError};
use crate::msgpack::{MapBuilder, Value};

/// Largest note the ledger accepts, in bytes.
pub const MAX_NOTE_LEN: usize = 1024;

/// Rounds a transaction stays valid after its first valid round.
pub const VALIDITY_WINDOW: u64 = 1000;

const PAYMENT_TYPE: &str = "pay";

/// Network parameters needed to build a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedParams {
    /// Suggested fee in microalgos.
    pub fee: u64,
    /// Minimum fee the network accepts.
    pub min_fee: u64,
    /// Latest committed round.
    pub last_round: u64,
    /// Genesis id, e.g. `testnet-v1.0`.
    pub genesis_id: String,
    /// Genesis block hash.
    pub genesis_hash: [u8; 32],
}

/// A payment transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentTransaction {
    pub sender: LedgerAddress,
    pub receiver: LedgerAddress,
    /// Amount in microalgos.
    pub amount: u64,
    /// Flat fee in microalgos.
    pub fee: u64,
    pub first_valid: u64,
    pub last_valid: u64,
    pub genesis_id: String,
    pub genesis_hash: [u8; 32],
    pub note: Vec<u8>,
}

impl PaymentTransaction {
    /// Build a zero-amount payment from `sender` to itself carrying `note`.
    pub fn self_payment(
        sender: &LedgerAddress,
        note: Vec<u8>,
        params: &SuggestedParams,
    ) -> Result<Self, LedgerError> {
        if note.len() > MAX_NOTE_LEN {
            return Err(LedgerError::Rejected(format!(
                "note is {} bytes, limit is {MAX_NOTE_LEN}",
                note.len()
            )));
        }
        Ok(Self {
            sender: sender.clone(),
            receiver: sender.clone(),
            amount: 0,
            fee: params.fee.max(params.min_fee),
            first_valid: params.last_round,
            last_valid: params.last_round + VALIDITY_WINDOW,
            genesis_id: params.genesis_id.clone(),
            genesis_hash: params.genesis_hash,
            note,
        })
    }

    fn to_value(&self) -> Value {
        MapBuilder::new()
            .uint("amt", self.amount)
            .uint("fee", self.fee)
            .uint("fv", self.first_valid)
            .str("gen", &self.genesis_id)
            .fixed("gh", &self.genesis_hash)
            .uint("lv", self.last_valid)
            .bin("note", &self.note)
            .fixed("rcv", &self.receiver.public_key())
            .fixed("snd", &self.sender.public_key())
            .str("type", PAYMENT_TYPE)
            .build()
    }

    fn from_value(value: &Value) -> Result<Self, CodecError> {
        let kind = value.str_field("type")?;
        if kind != PAYMENT_TYPE {
            return Err(CodecError::Field {
                field: "type".to_string(),
                reason: format!("expected {PAYMENT_TYPE:?}, got {kind:?}"),
            });
        }
        Ok(Self {
            sender: LedgerAddress::from_public_key(&value.fixed_field::<32>("snd")?),
            receiver: LedgerAddress::from_public_key(&value.fixed_field::<32>("rcv")?),
            amount: value.uint_field("amt")?,
            fee: value.uint_field("fee")?,
            first_valid: value.uint_field("fv")?,
            last_valid: value.uint_field("lv")?,
            genesis_id: value.str_field("gen")?.to_string(),
            genesis_hash: value.fixed_field::<32>("gh")?,
            note: value.bin_field("note")?.to_vec(),
        })
    }

    /// Canonical msgpack bytes.
    pub fn encode(&self) -> Vec<u8> {
        self.to_value().to_bytes()
    }

    /// Decode canonical msgpack bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        Self::from_value(&Value::from_bytes(bytes)?)
    }

    /// The bytes the sender signs.
    pub fn signing_payload(&self) -> SigningPayload {
        SigningPayload::transaction(&self.encode())
    }

    /// The transaction id.
    pub fn id(&self) -> AnchorReference {
        let digest = Sha512_256::digest(self.signing_payload().as_bytes());
        let mut raw = [0u8; 32];
        raw.copy_from_slice(&digest);
        AnchorReference::from_digest(&raw)
    }

    /// Have `custodian` sign this transaction.
    ///
    /// Fails with [`CryptoError::SenderMismatch`] when the custodian does
    /// not hold the sender's key.
    pub fn sign_with(&self, custodian: &dyn KeyCustodian) -> Result<SignedTransaction, CryptoError> {
        let held = custodian.address();
        if held != self.sender {
            return Err(CryptoError::SenderMismatch {
                held: held.to_string(),
                requested: self.sender.to_string(),
            });
        }
        let signature = custodian.sign(&self.signing_payload())?;
        Ok(SignedTransaction {
            transaction: self.clone(),
            signature,
        })
    }
}

/// A transaction with the sender's signature attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    pub transaction: PaymentTransaction,
    pub signature: Ed25519Signature,
}

impl SignedTransaction {
    /// Canonical msgpack bytes, as posted to the ledger.
    pub fn encode(&self) -> Vec<u8> {
        MapBuilder::new()
            .bin("sig", self.signature.as_bytes())
            .map("txn", self.transaction.to_value())
            .build()
            .to_bytes()
    }

    /// Decode a signed transaction from canonical msgpack.
    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        let value = Value::from_bytes(bytes)?;
        let signature = Ed25519Signature::from_bytes(value.fixed_field::<64>("sig")?);
        let txn = value.get("txn").ok_or_else(|| CodecError::Field {
            field: "txn".to_string(),
            reason: "missing".to_string(),
        })?;
        Ok(Self {
            transaction: PaymentTransaction::from_value(txn)?,
            signature,
        })
    }

    /// The transaction id.
    pub fn id(&self) -> AnchorReference {
        self.transaction.id()
    }

    /// Check the signature against the sender's key.
    pub fn verify(&self) -> Result<(), CryptoError> {
        verify_for_address(
            &self.transaction.signing_payload(),
            &self.signature,
            &self.transaction.sender,
        )
    }
}

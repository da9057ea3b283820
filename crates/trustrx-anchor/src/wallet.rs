//! Wallet backup documents.
//!
//! A backup holds the 25-word recovery phrase of a ledger identity, the
//! form any standard ledger wallet can restore. It is the one place the
//! phrase is written out in the clear, so the file is created
//! owner-read/write only and the in-memory copy is wiped on drop.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use trustrx_core::{LedgerAddress, Timestamp};
use trustrx_crypto::{CryptoError, Identity, SigningKey};
use zeroize::Zeroize;

const PLATFORM: &str = "TrustRx";
const WARNING: &str = "KEEP THIS SAFE! This file contains your wallet recovery phrase. \
Anyone holding it can sign transactions for this address.";

/// A wallet backup document.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletBackup {
    pub address: LedgerAddress,
    /// 25-word recovery phrase.
    pub mnemonic: String,
    pub created_at: Timestamp,
    pub platform: String,
    pub network: String,
    pub warning: String,
}

impl WalletBackup {
    /// Back up a freshly generated identity.
    pub fn from_identity(identity: &Identity, network: &str) -> Self {
        Self::new(identity.address.clone(), identity.mnemonic.as_str(), network)
    }

    pub fn new(address: LedgerAddress, mnemonic: &str, network: &str) -> Self {
        Self {
            address,
            mnemonic: mnemonic.to_string(),
            created_at: Timestamp::now(),
            platform: PLATFORM.to_string(),
            network: network.to_string(),
            warning: WARNING.to_string(),
        }
    }

    /// `trustrx-wallet-backup-<epoch-millis>.json`
    pub fn file_name(now_millis: i64) -> String {
        format!("trustrx-wallet-backup-{now_millis}.json")
    }

    /// Write the backup as pretty JSON to `path` with mode 0600 on Unix.
    pub fn write(&self, path: &Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut json = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        let written = write_private(path, json.as_bytes());
        json.zeroize();
        written?;
        tracing::info!(address = %self.address, path = %path.display(), "wrote wallet backup");
        Ok(())
    }

    /// Write into `dir` under [`WalletBackup::file_name`]; returns the path.
    pub fn write_to_dir(&self, dir: &Path) -> Result<PathBuf, std::io::Error> {
        let millis = self.created_at.as_datetime().timestamp_millis();
        let path = dir.join(Self::file_name(millis));
        self.write(&path)?;
        Ok(path)
    }

    pub fn read(path: &Path) -> Result<Self, std::io::Error> {
        let text = zeroize::Zeroizing::new(std::fs::read_to_string(path)?);
        serde_json::from_str(&text).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Recover the signing key, checking it controls the recorded address.
    pub fn restore(&self) -> Result<SigningKey, CryptoError> {
        let key = SigningKey::from_mnemonic(&self.mnemonic)?;
        if key.address() != self.address {
            return Err(CryptoError::InvalidMnemonic(format!(
                "phrase restores {}, backup is for {}",
                key.address(),
                self.address
            )));
        }
        Ok(key)
    }
}

#[cfg(unix)]
fn write_private(path: &Path, bytes: &[u8]) -> Result<(), std::io::Error> {
    use std::io::Write;
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    file.write_all(bytes)
}

#[cfg(not(unix))]
fn write_private(path: &Path, bytes: &[u8]) -> Result<(), std::io::Error> {
    std::fs::write(path, bytes)
}

impl Drop for WalletBackup {
    fn drop(&mut self) {
        self.mnemonic.zeroize();
    }
}

impl std::fmt::Debug for WalletBackup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletBackup")
            .field("address", &self.address)
            .field("mnemonic", &"[REDACTED]")
            .field("created_at", &self.created_at)
            .field("network", &self.network)
            .finish()
    }
}

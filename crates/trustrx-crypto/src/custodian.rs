//! # Key Custodians
//!
//! A custodian holds the signing credential for one ledger identity and
//! signs anchoring transactions on its behalf. The rest of the workflow
//! only ever sees the [`KeyCustodian`] trait, so how keys are stored stays
//! out of the anchoring logic.
//!
//! Backends:
//!
//! - [`LocalCustodian`]: key in process memory, generated or from a seed.
//! - [`EnvCustodian`]: credential read from an environment variable once
//!   at construction. Suits container deployments with injected secrets.
//! - [`FileCustodian`]: credential read from a file written by `keygen`.
//!
//! A credential is either a 64-character hex seed or a 25-word recovery
//! phrase; text containing whitespace is read as a phrase.
//!
//! [`CredentialSource`] is the configuration-level choice between them.
//!
//! ## Security Invariants
//!
//! - Seed material is zeroized on drop.
//! - `KeyCustodian` is `Send + Sync` for use across async tasks.
//! - Signing input is a [`SigningPayload`], never raw bytes.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use trustrx_core::LedgerAddress;
use zeroize::Zeroizing;

use crate::ed25519::{Ed25519Signature, SigningKey, SigningPayload};
use crate::error::CryptoError;

/// Holder of a signing credential for a single ledger identity.
pub trait KeyCustodian: Send + Sync {
    /// The address whose transactions this custodian can authorize.
    fn address(&self) -> LedgerAddress;

    /// Sign a tagged transaction payload.
    fn sign(&self, payload: &SigningPayload) -> Result<Ed25519Signature, CryptoError>;

    /// Human-readable backend name, for logs.
    fn custodian_name(&self) -> &str;
}

// ─── Identity generation ─────────────────────────────────────────────────

/// A freshly generated identity: its address and the credential for it.
pub struct Identity {
    /// Ledger address of the identity.
    pub address: LedgerAddress,
    /// Hex-encoded 32-byte seed. Wiped on drop.
    pub credential: Zeroizing<String>,
    /// The same seed as a 25-word recovery phrase. Wiped on drop.
    pub mnemonic: Zeroizing<String>,
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("address", &self.address)
            .field("credential", &"[REDACTED]")
            .field("mnemonic", &"[REDACTED]")
            .finish()
    }
}

/// Generate a new identity from the OS CSPRNG.
pub fn generate_identity() -> Identity {
    let key = SigningKey::generate();
    let identity = Identity {
        address: key.address(),
        credential: key.seed_hex(),
        mnemonic: key.mnemonic(),
    };
    tracing::info!(address = %identity.address, "generated ledger identity");
    identity
}

/// Parse a credential: a recovery phrase if it contains whitespace after
/// trimming, otherwise a hex seed.
pub fn parse_credential(text: &str) -> Result<SigningKey, CryptoError> {
    let trimmed = text.trim();
    if trimmed.contains(char::is_whitespace) {
        SigningKey::from_mnemonic(trimmed)
    } else {
        SigningKey::from_seed_hex(trimmed)
    }
}

/// Write a credential (hex seed or recovery phrase) to `path`.
///
/// On Unix the file is opened with mode 0600 and, if it already existed,
/// narrowed to 0600 before any secret byte is written.
pub fn write_seed_file(path: &Path, credential: &str) -> Result<(), CryptoError> {
    use std::io::Write;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    }
    let contents = Zeroizing::new(format!("{credential}\n"));
    file.write_all(contents.as_bytes())?;
    Ok(())
}

// ─── LocalCustodian ──────────────────────────────────────────────────────

/// In-memory custodian for development, tests, and demo mode.
pub struct LocalCustodian {
    key: SigningKey,
}

impl LocalCustodian {
    /// Wrap an existing key.
    pub fn new(key: SigningKey) -> Self {
        Self { key }
    }

    /// Generate a fresh key.
    pub fn generate() -> Self {
        Self {
            key: SigningKey::generate(),
        }
    }

    /// Build from a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            key: SigningKey::from_seed(seed),
        }
    }

    /// Build from the credential of a generated [`Identity`].
    pub fn from_identity(identity: &Identity) -> Result<Self, CryptoError> {
        Ok(Self {
            key: SigningKey::from_seed_hex(&identity.credential)?,
        })
    }

    /// The seed as hex, for backups.
    pub fn seed_hex(&self) -> Zeroizing<String> {
        self.key.seed_hex()
    }
}

impl KeyCustodian for LocalCustodian {
    fn address(&self) -> LedgerAddress {
        self.key.address()
    }

    fn sign(&self, payload: &SigningPayload) -> Result<Ed25519Signature, CryptoError> {
        Ok(self.key.sign(payload))
    }

    fn custodian_name(&self) -> &str {
        "LocalCustodian"
    }
}

impl std::fmt::Debug for LocalCustodian {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LocalCustodian({})", self.key.address())
    }
}

// ─── EnvCustodian ────────────────────────────────────────────────────────

/// Loads the credential from an environment variable.
///
/// ```bash
/// export TRUSTRX_SIGNING_SEED="5f1c..."            # 64 hex chars
/// export TRUSTRX_SIGNING_SEED="advice pudding ..."  # or 25 words
/// ```
pub struct EnvCustodian {
    key: SigningKey,
    var_name: String,
}

impl EnvCustodian {
    /// Load a hex seed or recovery phrase from `var_name`.
    pub fn from_env(var_name: &str) -> Result<Self, CryptoError> {
        let text = read_env(var_name)?;
        Ok(Self {
            key: parse_credential(&text)?,
            var_name: var_name.to_string(),
        })
    }

    /// Load a recovery phrase from `var_name`; a hex seed is refused.
    pub fn from_env_mnemonic(var_name: &str) -> Result<Self, CryptoError> {
        let text = read_env(var_name)?;
        Ok(Self {
            key: SigningKey::from_mnemonic(&text)?,
            var_name: var_name.to_string(),
        })
    }

    /// The environment variable the seed came from.
    pub fn var_name(&self) -> &str {
        &self.var_name
    }
}

fn read_env(var_name: &str) -> Result<Zeroizing<String>, CryptoError> {
    std::env::var(var_name)
        .map(Zeroizing::new)
        .map_err(|_| CryptoError::CredentialUnavailable {
            source_name: format!("env:{var_name}"),
            reason: "environment variable not set".to_string(),
        })
}

impl KeyCustodian for EnvCustodian {
    fn address(&self) -> LedgerAddress {
        self.key.address()
    }

    fn sign(&self, payload: &SigningPayload) -> Result<Ed25519Signature, CryptoError> {
        Ok(self.key.sign(payload))
    }

    fn custodian_name(&self) -> &str {
        "EnvCustodian"
    }
}

// ─── FileCustodian ───────────────────────────────────────────────────────

/// Loads the credential from a file holding a hex seed or a recovery phrase.
pub struct FileCustodian {
    key: SigningKey,
    path: PathBuf,
}

impl FileCustodian {
    /// Read the credential file at `path`.
    pub fn open(path: &Path) -> Result<Self, CryptoError> {
        let text = Zeroizing::new(std::fs::read_to_string(path).map_err(|e| {
            CryptoError::CredentialUnavailable {
                source_name: format!("file:{}", path.display()),
                reason: e.to_string(),
            }
        })?);
        let key = parse_credential(&text)?;
        Ok(Self {
            key,
            path: path.to_path_buf(),
        })
    }

    /// The file the seed came from.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KeyCustodian for FileCustodian {
    fn address(&self) -> LedgerAddress {
        self.key.address()
    }

    fn sign(&self, payload: &SigningPayload) -> Result<Ed25519Signature, CryptoError> {
        Ok(self.key.sign(payload))
    }

    fn custodian_name(&self) -> &str {
        "FileCustodian"
    }
}

// ─── CredentialSource ────────────────────────────────────────────────────

/// Where the signing credential comes from.
///
/// In configuration files this is written as `generate`, `env: VAR`,
/// `mnemonic: VAR`, or `file: path`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CredentialSourceRepr", into = "CredentialSourceRepr")]
pub enum CredentialSource {
    /// Generate a throwaway key for this process.
    Generate,
    /// Read a hex seed or recovery phrase from an environment variable.
    Env(String),
    /// Read a recovery phrase, and only a phrase, from an environment variable.
    Mnemonic(String),
    /// Read a hex seed or recovery phrase from a file.
    File(PathBuf),
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum CredentialSourceRepr {
    Keyword(String),
    Env { env: String },
    Mnemonic { mnemonic: String },
    File { file: PathBuf },
}

impl TryFrom<CredentialSourceRepr> for CredentialSource {
    type Error = String;

    fn try_from(repr: CredentialSourceRepr) -> Result<Self, Self::Error> {
        match repr {
            CredentialSourceRepr::Keyword(word) if word == "generate" => Ok(Self::Generate),
            CredentialSourceRepr::Keyword(word) => Err(format!(
                "unknown credential source {word:?}, expected generate, env: VAR, mnemonic: VAR, or file: PATH"
            )),
            CredentialSourceRepr::Env { env } => Ok(Self::Env(env)),
            CredentialSourceRepr::Mnemonic { mnemonic } => Ok(Self::Mnemonic(mnemonic)),
            CredentialSourceRepr::File { file } => Ok(Self::File(file)),
        }
    }
}

impl From<CredentialSource> for CredentialSourceRepr {
    fn from(source: CredentialSource) -> Self {
        match source {
            CredentialSource::Generate => Self::Keyword("generate".to_string()),
            CredentialSource::Env(env) => Self::Env { env },
            CredentialSource::Mnemonic(mnemonic) => Self::Mnemonic { mnemonic },
            CredentialSource::File(file) => Self::File { file },
        }
    }
}

impl Default for CredentialSource {
    fn default() -> Self {
        Self::Env("TRUSTRX_SIGNING_SEED".to_string())
    }
}

impl CredentialSource {
    /// Build the custodian this source describes.
    pub fn load(&self) -> Result<Box<dyn KeyCustodian>, CryptoError> {
        let custodian: Box<dyn KeyCustodian> = match self {
            Self::Generate => Box::new(LocalCustodian::generate()),
            Self::Env(var) => Box::new(EnvCustodian::from_env(var)?),
            Self::Mnemonic(var) => Box::new(EnvCustodian::from_env_mnemonic(var)?),
            Self::File(path) => Box::new(FileCustodian::open(path)?),
        };
        tracing::debug!(
            custodian = custodian.custodian_name(),
            address = %custodian.address(),
            "loaded key custodian"
        );
        Ok(custodian)
    }
}

impl std::fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Generate => f.write_str("generate"),
            Self::Env(var) => write!(f, "env:{var}"),
            Self::Mnemonic(var) => write!(f, "mnemonic:{var}"),
            Self::File(path) => write!(f, "file:{}", path.display()),
        }
    }
}

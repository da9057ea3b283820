//! # Workspace Configuration
//!
//! One explicit object decides which ledger the workflow talks to, where
//! the signing credential comes from, and where local state lives. Nothing
//! in the workflow reads ambient configuration on its own.
//!
//! ```yaml
//! mode: live              # or: demo
//! ledger:
//!   algod_url: https://testnet-api.algonode.cloud
//!   indexer_url: https://testnet-idx.algonode.cloud
//!   confirmation_rounds: 4
//! credential_source:
//!   file: ~/.trustrx/owner.seed   # or: env: TRUSTRX_SIGNING_SEED, or: generate
//! explorer_url: https://testnet.algoexplorer.io
//! registry_path: .trustrx/registry.json
//! demo_state_path: .trustrx/simulated-ledger.json
//! ```
//!
//! Precedence: built-in defaults, then the YAML file, then `TRUSTRX_*`
//! environment variables, then command-line flags.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use trustrx_crypto::CredentialSource;
use trustrx_ledger::{AlgorandClient, AnyLedger, InMemoryLedger, LedgerConfig};
use url::Url;

use crate::explorer::{ExplorerLinks, DEFAULT_EXPLORER_URL};

/// Which ledger the workflow uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnchorMode {
    /// The Algorand network named by [`LedgerConfig`].
    #[default]
    Live,
    /// The in-process simulated ledger. Results say `simulated: true`.
    Demo,
}

impl std::str::FromStr for AnchorMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "live" => Ok(Self::Live),
            "demo" => Ok(Self::Demo),
            other => Err(ConfigError::InvalidMode(other.to_string())),
        }
    }
}

/// Errors loading configuration or building what it describes.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Yaml {
        path: String,
        source: serde_yaml::Error,
    },

    #[error("invalid mode {0:?}, expected \"live\" or \"demo\"")]
    InvalidMode(String),

    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),

    #[error(transparent)]
    Ledger(#[from] trustrx_ledger::ConfigError),

    #[error("cannot load simulated ledger state {path}: {source}")]
    DemoState {
        path: String,
        source: std::io::Error,
    },
}

/// Top-level TrustRx configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrustRxConfig {
    pub mode: AnchorMode,
    pub ledger: LedgerConfig,
    pub credential_source: CredentialSource,
    /// Parsed when links are built; see [`TrustRxConfig::explorer`].
    pub explorer_url: String,
    pub registry_path: PathBuf,
    pub demo_state_path: PathBuf,
}

impl Default for TrustRxConfig {
    fn default() -> Self {
        Self {
            mode: AnchorMode::Live,
            ledger: LedgerConfig::default(),
            credential_source: CredentialSource::default(),
            explorer_url: DEFAULT_EXPLORER_URL.to_string(),
            registry_path: PathBuf::from(".trustrx/registry.json"),
            demo_state_path: PathBuf::from(".trustrx/simulated-ledger.json"),
        }
    }
}

impl TrustRxConfig {
    /// Read a YAML config file. Missing keys take their defaults.
    pub fn from_yaml_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&text).map_err(|source| ConfigError::Yaml {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, serde_yaml::Error> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text)
    }

    /// Defaults, then `path` if given, then environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let base = match path {
            Some(path) => Self::from_yaml_file(path)?,
            None => Self::default(),
        };
        base.with_env_overrides()
    }

    /// Apply `TRUSTRX_*` environment variables.
    ///
    /// Besides the ledger variables read by [`LedgerConfig`]:
    /// `TRUSTRX_MODE`, `TRUSTRX_EXPLORER_URL`, `TRUSTRX_REGISTRY_PATH`,
    /// `TRUSTRX_DEMO_STATE_PATH`.
    pub fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        self.ledger = self.ledger.with_env_overrides()?;
        if let Ok(mode) = std::env::var("TRUSTRX_MODE") {
            self.mode = mode.parse()?;
        }
        if let Ok(raw) = std::env::var("TRUSTRX_EXPLORER_URL") {
            parse_explorer_url("TRUSTRX_EXPLORER_URL", &raw)?;
            self.explorer_url = raw;
        }
        if let Ok(path) = std::env::var("TRUSTRX_REGISTRY_PATH") {
            self.registry_path = PathBuf::from(path);
        }
        if let Ok(path) = std::env::var("TRUSTRX_DEMO_STATE_PATH") {
            self.demo_state_path = PathBuf::from(path);
        }
        Ok(self)
    }

    /// Build the ledger this configuration selects.
    ///
    /// Demo mode restores the simulated ledger from `demo_state_path` so
    /// anchors from earlier runs can still be verified.
    pub fn build_ledger(&self) -> Result<AnyLedger, ConfigError> {
        match self.mode {
            AnchorMode::Live => Ok(AnyLedger::Algorand(AlgorandClient::new(self.ledger.clone())?)),
            AnchorMode::Demo => InMemoryLedger::load(&self.demo_state_path)
                .map(AnyLedger::Memory)
                .map_err(|source| ConfigError::DemoState {
                    path: self.demo_state_path.display().to_string(),
                    source,
                }),
        }
    }

    /// Explorer links under `explorer_url`, which must be an http(s) URL.
    pub fn explorer(&self) -> Result<ExplorerLinks, ConfigError> {
        parse_explorer_url("explorer_url", &self.explorer_url).map(|url| ExplorerLinks::new(&url))
    }
}

fn parse_explorer_url(field: &str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ConfigError::InvalidUrl(field.to_string(), e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::InvalidUrl(
            field.to_string(),
            format!("unsupported scheme {other:?}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_live_with_env_credential() {
        let cfg = TrustRxConfig::default();
        assert_eq!(cfg.mode, AnchorMode::Live);
        assert_eq!(
            cfg.credential_source,
            CredentialSource::Env("TRUSTRX_SIGNING_SEED".to_string())
        );
        assert_eq!(cfg.explorer_url, "https://testnet.algoexplorer.io");
        assert_eq!(cfg.explorer().unwrap(), ExplorerLinks::default());
    }

    #[test]
    fn yaml_overrides_nested_fields() {
        let cfg = TrustRxConfig::from_yaml_str(
            "mode: demo\n\
             ledger:\n  confirmation_rounds: 8\n\
             credential_source:\n  file: /keys/owner.seed\n\
             registry_path: /data/registry.json\n",
        )
        .unwrap();
        assert_eq!(cfg.mode, AnchorMode::Demo);
        assert_eq!(cfg.ledger.confirmation_rounds, 8);
        assert_eq!(cfg.ledger.network_name, "algorand-testnet");
        assert_eq!(
            cfg.credential_source,
            CredentialSource::File(PathBuf::from("/keys/owner.seed"))
        );
        assert_eq!(cfg.registry_path, PathBuf::from("/data/registry.json"));
    }

    #[test]
    fn empty_yaml_is_default() {
        let cfg = TrustRxConfig::from_yaml_str("  \n").unwrap();
        assert_eq!(cfg.mode, AnchorMode::Live);
    }

    #[test]
    fn unknown_mode_is_rejected() {
        assert!(TrustRxConfig::from_yaml_str("mode: fallback\n").is_err());
        assert!(matches!(
            "fallback".parse::<AnchorMode>(),
            Err(ConfigError::InvalidMode(_))
        ));
        assert_eq!("DEMO".parse::<AnchorMode>().unwrap(), AnchorMode::Demo);
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = TrustRxConfig::from_yaml_file(Path::new("/nonexistent/trustrx.yaml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn demo_mode_builds_simulated_ledger() {
        use trustrx_ledger::Ledger;
        let dir = tempfile::tempdir().unwrap();
        let cfg = TrustRxConfig {
            mode: AnchorMode::Demo,
            demo_state_path: dir.path().join("ledger.json"),
            ..TrustRxConfig::default()
        };
        let ledger = cfg.build_ledger().unwrap();
        assert!(matches!(ledger, AnyLedger::Memory(_)));
        assert!(ledger.network().simulated);
    }

    #[test]
    fn live_mode_builds_http_client() {
        let ledger = TrustRxConfig::default().build_ledger().unwrap();
        assert!(matches!(ledger, AnyLedger::Algorand(_)));
    }

    #[test]
    fn bad_explorer_url_from_yaml_is_reported_on_use() {
        let cfg = TrustRxConfig::from_yaml_str("explorer_url: testnet.algoexplorer.io\n").unwrap();
        match cfg.explorer() {
            Err(ConfigError::InvalidUrl(field, _)) => assert_eq!(field, "explorer_url"),
            other => panic!("expected InvalidUrl, got {other:?}"),
        }

        let ftp = TrustRxConfig {
            explorer_url: "ftp://explorer.example".to_string(),
            ..TrustRxConfig::default()
        };
        assert!(matches!(ftp.explorer(), Err(ConfigError::InvalidUrl(..))));
    }

    #[test]
    fn bad_ledger_endpoint_from_yaml_fails_build() {
        let cfg = TrustRxConfig::from_yaml_str("ledger:\n  algod_url: not a url\n").unwrap();
        assert!(matches!(cfg.build_ledger(), Err(ConfigError::Ledger(_))));
    }
}

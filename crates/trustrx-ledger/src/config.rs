//! Ledger client configuration.
//!
//! Defaults point at the public AlgoNode TestNet endpoints, which need no
//! API token. Override via environment variables, a YAML config section,
//! or explicit construction for tests. Endpoints are kept as text and
//! checked by [`LedgerConfig::validate`] before a client is built.

use serde::{Deserialize, Serialize};
use url::Url;

const DEFAULT_ALGOD_URL: &str = "https://testnet-api.algonode.cloud";
const DEFAULT_INDEXER_URL: &str = "https://testnet-idx.algonode.cloud";
const DEFAULT_FAUCET_URL: &str = "https://testnet.algoexplorerapi.io/v1/faucet";
const DEFAULT_NETWORK_NAME: &str = "algorand-testnet";

/// Configuration for the Algorand ledger client.
///
/// Custom `Debug` implementation redacts the API tokens. Tokens are never
/// written back out when the config is serialized.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Base URL of the algod node.
    pub algod_url: String,
    /// `X-Algo-API-Token` value. Empty means no header.
    #[serde(skip_serializing)]
    pub algod_token: String,
    /// Base URL of the indexer.
    pub indexer_url: String,
    /// `X-Indexer-API-Token` value. Empty means no header.
    #[serde(skip_serializing)]
    pub indexer_token: String,
    /// TestNet dispenser endpoint.
    pub faucet_url: String,
    /// Name reported in receipts.
    pub network_name: String,
    /// Rounds to wait for a submitted transaction to commit.
    pub confirmation_rounds: u64,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl std::fmt::Debug for LedgerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerConfig")
            .field("algod_url", &self.algod_url)
            .field("algod_token", &redact(&self.algod_token))
            .field("indexer_url", &self.indexer_url)
            .field("indexer_token", &redact(&self.indexer_token))
            .field("faucet_url", &self.faucet_url)
            .field("network_name", &self.network_name)
            .field("confirmation_rounds", &self.confirmation_rounds)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

fn redact(token: &str) -> &'static str {
    if token.is_empty() {
        ""
    } else {
        "[REDACTED]"
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            algod_url: DEFAULT_ALGOD_URL.to_string(),
            algod_token: String::new(),
            indexer_url: DEFAULT_INDEXER_URL.to_string(),
            indexer_token: String::new(),
            faucet_url: DEFAULT_FAUCET_URL.to_string(),
            network_name: DEFAULT_NETWORK_NAME.to_string(),
            confirmation_rounds: 4,
            timeout_secs: 30,
        }
    }
}

impl LedgerConfig {
    /// Load configuration from environment variables over the defaults.
    ///
    /// Variables:
    /// - `TRUSTRX_ALGOD_URL` (default: `https://testnet-api.algonode.cloud`)
    /// - `TRUSTRX_ALGOD_TOKEN` (default: empty)
    /// - `TRUSTRX_INDEXER_URL` (default: `https://testnet-idx.algonode.cloud`)
    /// - `TRUSTRX_INDEXER_TOKEN` (default: empty)
    /// - `TRUSTRX_FAUCET_URL` (default: `https://testnet.algoexplorerapi.io/v1/faucet`)
    /// - `TRUSTRX_CONFIRMATION_ROUNDS` (default: 4)
    /// - `TRUSTRX_TIMEOUT_SECS` (default: 30)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_overrides()
    }

    /// Apply any `TRUSTRX_*` environment variables on top of `self`.
    pub fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        if let Some(url) = env_url("TRUSTRX_ALGOD_URL")? {
            self.algod_url = url;
        }
        if let Ok(token) = std::env::var("TRUSTRX_ALGOD_TOKEN") {
            self.algod_token = token;
        }
        if let Some(url) = env_url("TRUSTRX_INDEXER_URL")? {
            self.indexer_url = url;
        }
        if let Ok(token) = std::env::var("TRUSTRX_INDEXER_TOKEN") {
            self.indexer_token = token;
        }
        if let Some(url) = env_url("TRUSTRX_FAUCET_URL")? {
            self.faucet_url = url;
        }
        if let Some(rounds) = env_u64("TRUSTRX_CONFIRMATION_ROUNDS")? {
            self.confirmation_rounds = rounds;
        }
        if let Some(secs) = env_u64("TRUSTRX_TIMEOUT_SECS")? {
            self.timeout_secs = secs;
        }
        Ok(self)
    }

    /// Check that every endpoint is an absolute http(s) URL.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, raw) in [
            ("algod_url", &self.algod_url),
            ("indexer_url", &self.indexer_url),
            ("faucet_url", &self.faucet_url),
        ] {
            parse_endpoint(field, raw)?;
        }
        Ok(())
    }

    /// A configuration with every endpoint on one local mock server.
    ///
    /// The faucet lives at `{base}/faucet`.
    pub fn local_mock(base: &str) -> Result<Self, ConfigError> {
        let base = parse_endpoint(base, base)?;
        let faucet_url = base
            .join("faucet")
            .map_err(|e| ConfigError::InvalidUrl("faucet".to_string(), e.to_string()))?;
        Ok(Self {
            algod_url: base.to_string(),
            indexer_url: base.to_string(),
            faucet_url: faucet_url.to_string(),
            network_name: "algorand-mock".to_string(),
            confirmation_rounds: 2,
            timeout_secs: 5,
            ..Self::default()
        })
    }
}

fn parse_endpoint(field: &str, raw: &str) -> Result<Url, ConfigError> {
    let url =
        Url::parse(raw).map_err(|e| ConfigError::InvalidUrl(field.to_string(), e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::InvalidUrl(
            field.to_string(),
            format!("unsupported scheme {other:?}"),
        )),
    }
}

fn env_url(var: &str) -> Result<Option<String>, ConfigError> {
    match std::env::var(var) {
        Ok(raw) => parse_endpoint(var, &raw).map(|_| Some(raw)),
        Err(_) => Ok(None),
    }
}

fn env_u64(var: &str) -> Result<Option<u64>, ConfigError> {
    match std::env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidNumber(var.to_string(), raw)),
        Err(_) => Ok(None),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
    #[error("invalid number for {0}: {1:?}")]
    InvalidNumber(String, String),
    #[error("cannot build HTTP client: {0}")]
    HttpClient(String),
}

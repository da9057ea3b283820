//! Shared state for subcommand handlers: resolved configuration, the
//! ledger it selects, and where the signing credential comes from.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use trustrx_anchor::{AnchorMode, AnchorService, TrustRxConfig};
use trustrx_crypto::{FileCustodian, KeyCustodian};
use trustrx_ledger::AnyLedger;

/// Configuration after defaults, file, environment, and global flags.
#[derive(Debug, Clone)]
pub struct CliContext {
    pub config: TrustRxConfig,
}

impl CliContext {
    /// Load configuration. `--demo` overrides the configured mode.
    pub fn load(config_path: Option<&Path>, demo: bool) -> Result<Self> {
        let mut config = TrustRxConfig::load(config_path).context("loading configuration")?;
        if demo {
            config.mode = AnchorMode::Demo;
        }
        tracing::debug!(mode = ?config.mode, "configuration loaded");
        Ok(Self { config })
    }

    pub fn new(config: TrustRxConfig) -> Self {
        Self { config }
    }

    /// The anchoring service over the configured ledger.
    pub fn service(&self) -> Result<AnchorService<AnyLedger>> {
        let ledger = self
            .config
            .build_ledger()
            .context("connecting to the configured ledger")?;
        Ok(AnchorService::new(ledger))
    }

    /// Save simulated ledger state so later runs can verify against it.
    /// Does nothing for a live ledger.
    pub fn persist(&self, service: &AnchorService<AnyLedger>) -> Result<()> {
        if let AnyLedger::Memory(ledger) = service.ledger() {
            let path = &self.config.demo_state_path;
            ledger
                .save(path)
                .with_context(|| format!("saving simulated ledger state to {}", path.display()))?;
            tracing::debug!(path = %path.display(), round = ledger.round(), "simulated ledger saved");
        }
        Ok(())
    }

    /// The signing credential: `--key` when given, else the configured source.
    pub fn custodian(&self, key: Option<&Path>) -> Result<Box<dyn KeyCustodian>> {
        match key {
            Some(path) => {
                let custodian = FileCustodian::open(path)
                    .with_context(|| format!("loading signing key from {}", path.display()))?;
                Ok(Box::new(custodian))
            }
            None => {
                let source = &self.config.credential_source;
                source
                    .load()
                    .with_context(|| format!("loading signing credential ({source})"))
            }
        }
    }

    pub fn registry_path(&self, flag: Option<&Path>) -> PathBuf {
        flag.map(Path::to_path_buf)
            .unwrap_or_else(|| self.config.registry_path.clone())
    }

    pub fn network_name(&self) -> &str {
        match self.config.mode {
            AnchorMode::Live => &self.config.ledger.network_name,
            AnchorMode::Demo => trustrx_ledger::memory::SIMULATED_NETWORK_NAME,
        }
    }
}

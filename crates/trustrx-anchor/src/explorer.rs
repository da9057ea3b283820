//! Block-explorer links for references and addresses.

use trustrx_core::{AnchorReference, LedgerAddress};
use url::Url;

/// Default explorer for Algorand TestNet.
pub const DEFAULT_EXPLORER_URL: &str = "https://testnet.algoexplorer.io";

/// Builds explorer URLs under a base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplorerLinks {
    base_url: String,
}

impl ExplorerLinks {
    pub fn new(base_url: &Url) -> Self {
        Self {
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
        }
    }

    /// `{base}/tx/{reference}`
    pub fn transaction_url(&self, reference: &AnchorReference) -> String {
        format!("{}/tx/{reference}", self.base_url)
    }

    /// `{base}/address/{address}`
    pub fn address_url(&self, address: &LedgerAddress) -> String {
        format!("{}/address/{address}", self.base_url)
    }
}

impl Default for ExplorerLinks {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_EXPLORER_URL.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_links_point_at_testnet_explorer() {
        let links = ExplorerLinks::default();
        let reference = AnchorReference::from_digest(&[0u8; 32]);
        assert_eq!(
            links.transaction_url(&reference),
            format!("https://testnet.algoexplorer.io/tx/{reference}")
        );
        let address = LedgerAddress::from_public_key(&[0u8; 32]);
        assert_eq!(
            links.address_url(&address),
            "https://testnet.algoexplorer.io/address/AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAY5HFKQ"
        );
    }

    #[test]
    fn trailing_slash_is_not_doubled() {
        let links = ExplorerLinks::new(&Url::parse("https://explorer.example/").unwrap());
        let reference = AnchorReference::from_digest(&[0u8; 32]);
        assert!(links
            .transaction_url(&reference)
            .starts_with("https://explorer.example/tx/"));
    }
}

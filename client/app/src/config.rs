//! Environment configuration. Everything here is external wiring: chain
//! selection, store addressing, API keys. None of it participates in the
//! domain logic.

use xefers::chains::{self, ChainInfo};

/// Account-scoped namespace the campaign collection lives under when the
/// environment does not override it.
const DEFAULT_STORE_NAMESPACE: &str = "pk/0xbb44be3b8e07ed240e9144acfa4760f872ea5282b86647e678b505ffc2192b8cb5462e4624f2b1f363b6ad91b23ad7c3b99bf97450354725273cd486c1898606/Xefers";

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Target chain for new campaigns.
    pub chain_id: u64,
    /// Wallet/node RPC endpoint; defaults to the chain's registry entry.
    pub rpc_url: Option<String>,
    /// Origin used when rendering shareable `/link/<address>` URLs.
    pub public_origin: String,
    pub store_base_url: String,
    pub store_namespace: String,
    pub store_collection: String,
    /// Mirror/explorer API used by the analytics view.
    pub mirror_base_url: String,
    pub mirror_api_key: Option<String>,
}

impl AppConfig {
    /// Reads the whole configuration from the environment, with workable
    /// defaults for every value.
    #[must_use]
    pub fn from_env() -> Self {
        AppConfig {
            chain_id: env_var("XEFERS_CHAIN_ID")
                .and_then(|v| v.parse().ok())
                .unwrap_or(chains::DEFAULT_CHAIN_ID),
            rpc_url: env_var("XEFERS_RPC_URL"),
            public_origin: env_var("XEFERS_ORIGIN")
                .unwrap_or_else(|| "https://xefers.app".to_string()),
            store_base_url: env_var("XEFERS_STORE_URL")
                .unwrap_or_else(|| "https://testnet.polybase.xyz".to_string()),
            store_namespace: env_var("XEFERS_STORE_NAMESPACE")
                .unwrap_or_else(|| DEFAULT_STORE_NAMESPACE.to_string()),
            store_collection: env_var("XEFERS_STORE_COLLECTION")
                .unwrap_or_else(|| "Xefers".to_string()),
            mirror_base_url: env_var("XEFERS_MIRROR_URL")
                .unwrap_or_else(|| "https://previewnet.mirrornode.hedera.com".to_string()),
            mirror_api_key: env_var("XEFERS_MIRROR_KEY"),
        }
    }

    /// The configured chain, when the registry knows it.
    #[must_use]
    pub fn chain(&self) -> Option<&'static ChainInfo> {
        chains::lookup(self.chain_id)
    }

    /// RPC endpoint to reach the wallet/node with: the explicit override, or
    /// the chain's default.
    #[must_use]
    pub fn rpc_endpoint(&self) -> Option<String> {
        self.rpc_url
            .clone()
            .or_else(|| self.chain().map(|c| c.rpc_url.to_string()))
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

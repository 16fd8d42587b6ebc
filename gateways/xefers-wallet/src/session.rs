use std::path::PathBuf;
use std::sync::RwLock;

use serde_json::{json, Value};

use xefers::chains;
use xefers::errors::XefersError;

use crate::provider::{ProviderError, WalletProvider};

/// Session-scoped persistence of the connected account. Survives a restart
/// of the hosting process the way `sessionStorage` survives a page reload;
/// it is not durable storage and losing it only means reconnecting.
#[derive(Debug, Clone)]
pub struct SessionCache {
    path: PathBuf,
}

impl SessionCache {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        SessionCache { path }
    }

    #[must_use]
    pub fn default_path() -> PathBuf {
        std::env::temp_dir().join("xefers-session.json")
    }

    #[must_use]
    pub fn load(&self) -> Option<String> {
        let raw = std::fs::read_to_string(&self.path).ok()?;
        let value: Value = serde_json::from_str(&raw).ok()?;
        value
            .get("address")
            .and_then(Value::as_str)
            .map(str::to_owned)
    }

    /// Best effort; a failed write only costs the next session a reconnect.
    pub fn store(&self, account: &str) {
        let payload = json!({ "address": account }).to_string();
        if let Err(e) = std::fs::write(&self.path, payload) {
            tracing::debug!(error = %e, path = %self.path.display(), "session cache write failed");
        }
    }

    pub fn clear(&self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

/// The wallet session: holds the (possibly absent) provider and the active
/// account. The account is written only by [`WalletSession::connect`] and
/// [`WalletSession::check_connected`]; everything else reads.
pub struct WalletSession<P> {
    provider: Option<P>,
    cache: SessionCache,
    account: RwLock<Option<String>>,
}

impl<P: WalletProvider> WalletSession<P> {
    /// Builds a session with the default cache location. `None` models a
    /// hosting environment without a wallet: every interactive call then
    /// fails with [`XefersError::NoWalletProvider`], which is a user-visible
    /// condition, never a crash.
    #[must_use]
    pub fn new(provider: Option<P>) -> Self {
        Self::with_cache(provider, SessionCache::new(SessionCache::default_path()))
    }

    #[must_use]
    pub fn with_cache(provider: Option<P>, cache: SessionCache) -> Self {
        let account = RwLock::new(cache.load());
        WalletSession {
            provider,
            cache,
            account,
        }
    }

    /// The provider, or the user-visible absence condition.
    pub fn provider(&self) -> Result<&P, XefersError> {
        self.provider.as_ref().ok_or(XefersError::NoWalletProvider)
    }

    /// The active account, if one is bound.
    #[must_use]
    pub fn account(&self) -> Option<String> {
        self.account.read().expect("account lock").clone()
    }

    /// Requests account access interactively and binds the first account for
    /// the session lifetime.
    pub async fn connect(&self) -> Result<String, XefersError> {
        let provider = self.provider()?;
        let result = provider
            .request("eth_requestAccounts", json!([]))
            .await
            .map_err(map_session_error)?;
        let account = first_account(&result).ok_or(XefersError::UserRejected)?;
        self.bind(&account);
        Ok(account)
    }

    /// Non-interactive probe of the wallet's exposed accounts.
    pub async fn current_accounts(&self) -> Result<Vec<String>, XefersError> {
        let provider = self.provider()?;
        let result = provider
            .request("eth_accounts", json!([]))
            .await
            .map_err(map_session_error)?;
        Ok(result
            .as_array()
            .map(|accounts| {
                accounts
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default())
    }

    /// Binds an already-exposed account without prompting, when there is
    /// one. Callers decide whether to fall back to [`Self::connect`].
    pub async fn check_connected(&self) -> Result<Option<String>, XefersError> {
        let accounts = self.current_accounts().await?;
        if let Some(account) = accounts.into_iter().next() {
            self.bind(&account);
            return Ok(Some(account));
        }
        Ok(None)
    }

    /// Compares the wallet's active network to `target_chain_id` and
    /// requests a switch when they differ. A declined switch halts the
    /// dependent operation with a message naming the required chain.
    pub async fn ensure_network(&self, target_chain_id: u64) -> Result<(), XefersError> {
        let provider = self.provider()?;
        let active = provider
            .request("eth_chainId", json!([]))
            .await
            .map_err(map_session_error)?;
        let active = active.as_str().unwrap_or_default().to_string();
        let required = chains::to_network_handle(target_chain_id);
        if active.eq_ignore_ascii_case(&required) {
            return Ok(());
        }
        match provider
            .request("wallet_switchEthereumChain", json!([{ "chainId": required }]))
            .await
        {
            Ok(_) => Ok(()),
            Err(e) => {
                tracing::warn!(error = %e, target_chain_id, "network switch declined");
                Err(XefersError::wrong_network(target_chain_id, &active))
            }
        }
    }

    fn bind(&self, account: &str) {
        *self.account.write().expect("account lock") = Some(account.to_string());
        self.cache.store(account);
    }
}

fn first_account(result: &Value) -> Option<String> {
    result
        .as_array()
        .and_then(|accounts| accounts.first())
        .and_then(Value::as_str)
        .map(str::to_owned)
}

fn map_session_error(e: ProviderError) -> XefersError {
    match e {
        ProviderError::Rejected(_) => XefersError::UserRejected,
        other => XefersError::Wallet(other.rpc_text()),
    }
}

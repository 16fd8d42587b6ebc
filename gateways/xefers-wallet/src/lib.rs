//! Wallet-side gateway for Xefers: the provider request seam, the HTTP
//! JSON-RPC transport, and the session that owns the active account.

pub mod provider;
pub mod session;

pub use provider::{HttpProvider, ProviderError, WalletProvider};
pub use session::{SessionCache, WalletSession};

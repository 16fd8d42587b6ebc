use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::{json, Value};
use thiserror::Error;

use xefers::errors::rpc_error_message;

/// Rejection code an injected provider returns when the user denies a
/// request prompt.
pub const USER_REJECTED_CODE: i64 = 4001;

/// Errors surfaced by a wallet provider transport.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    #[error("the wallet rejected the request: {0}")]
    Rejected(String),
    #[error("RPC error {code}: {message}")]
    Rpc {
        code: i64,
        message: String,
        data: Option<Value>,
    },
    #[error("transport failure: {0}")]
    Transport(String),
}

impl ProviderError {
    /// The most specific human-readable text carried by this error, digging
    /// into the RPC error object when there is one.
    #[must_use]
    pub fn rpc_text(&self) -> String {
        match self {
            ProviderError::Rpc { code, message, data } => rpc_error_message(&json!({
                "code": code,
                "message": message,
                "data": data,
            })),
            ProviderError::Rejected(m) | ProviderError::Transport(m) => m.clone(),
        }
    }
}

/// The request surface of an injected wallet provider: one entry point
/// taking a method name and JSON params. Everything this system asks of a
/// wallet (accounts, chain id, network switches, transactions, calls) goes
/// through here.
#[allow(async_fn_in_trait)]
pub trait WalletProvider {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError>;
}

/// JSON-RPC over HTTP with the injected-provider request shape. Used when
/// the wallet endpoint is a node or wallet bridge reachable by URL.
pub struct HttpProvider {
    client: reqwest::Client,
    url: String,
    next_id: AtomicU64,
}

impl HttpProvider {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        HttpProvider {
            client: reqwest::Client::new(),
            url: url.into(),
            next_id: AtomicU64::new(1),
        }
    }
}

impl WalletProvider for HttpProvider {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": self.next_id.fetch_add(1, Ordering::Relaxed),
            "method": method,
            "params": params,
        });
        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;
        let reply: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        if let Some(err) = reply.get("error") {
            let code = err.get("code").and_then(Value::as_i64).unwrap_or(0);
            let message = err
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown RPC error")
                .to_string();
            if code == USER_REJECTED_CODE {
                return Err(ProviderError::Rejected(message));
            }
            return Err(ProviderError::Rpc {
                code,
                message,
                data: err.get("data").cloned(),
            });
        }
        Ok(reply.get("result").cloned().unwrap_or(Value::Null))
    }
}

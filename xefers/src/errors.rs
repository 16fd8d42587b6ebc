use serde_json::Value;
use thiserror::Error;

use crate::chains;

/// Message shown whenever an action needs a connected account.
///
/// Contains [`WALLET_REQUIRED_MARKER`] so downstream classification treats it
/// as an explanatory condition, not a failure.
pub const WALLET_PROMPT: &str = "Please connect your wallet to continue.";

/// Replacement text when a contract read reverts, which in practice means the
/// wallet is pointed at a network the contract was never deployed to.
pub const WRONG_NETWORK_HINT: &str =
    "You may be connected to the wrong network. Please check the selected network and try again.";

// Our library's custom, top-level error type.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum XefersError {
    #[error("No wallet provider is available in this environment")]
    NoWalletProvider,
    #[error("The wallet rejected the request")]
    UserRejected,
    #[error(
        "Please switch to the {required_name} ({required_handle}) network in the wallet to continue (active network is {active_handle})"
    )]
    WrongNetwork {
        required_name: String,
        required_handle: String,
        active_handle: String,
    },
    #[error("Error reading link data: {0}")]
    ContractRead(String),
    #[error("Error completing referral: {0}")]
    ContractWrite(String),
    #[error("Record store failure: {0}")]
    Persistence(String),
    #[error("Wallet request failed: {0}")]
    Wallet(String),
    #[error("{0}")]
    Validation(String),
}

impl XefersError {
    /// Builds the network-mismatch error for a required chain, naming it when
    /// the registry knows it.
    #[must_use]
    pub fn wrong_network(required_chain_id: u64, active_handle: &str) -> Self {
        let required_name = chains::lookup(required_chain_id)
            .map_or_else(|| format!("chain {required_chain_id}"), |c| c.name.to_string());
        XefersError::WrongNetwork {
            required_name,
            required_handle: chains::to_network_handle(required_chain_id),
            active_handle: active_handle.to_string(),
        }
    }
}

// Marker substrings emitted by the link contract and the wallet glue. The
// contract's revert wording is external and may change, silently breaking
// this classification; every needle lives here and nowhere else.
pub const ALREADY_REFERRED_MARKER: &str = "already referred";
pub const WALLET_REQUIRED_MARKER: &str = "wallet to continue";
pub const CALL_REVERT_MARKER: &str = "call revert";

/// Coarse class of a wallet/contract failure, derived from its message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// The viewer has redeemed this link before. Benign; the destination is
    /// still valid.
    AlreadyReferred,
    /// No account is bound; render an explanation instead of an error.
    WalletRequired,
    /// The call reverted, usually a network mismatch.
    Revert,
    Other,
}

/// Classifies a failure message by substring. Single point of translation
/// for the markers above.
#[must_use]
pub fn classify_failure(message: &str) -> FailureClass {
    if message.contains(ALREADY_REFERRED_MARKER) {
        FailureClass::AlreadyReferred
    } else if message.contains(WALLET_REQUIRED_MARKER) {
        FailureClass::WalletRequired
    } else if message.contains(CALL_REVERT_MARKER) {
        FailureClass::Revert
    } else {
        FailureClass::Other
    }
}

/// Human-readable text for a failed contract read, with the revert case
/// rewritten to the network hint.
#[must_use]
pub fn read_failure_text(raw: &str) -> String {
    if classify_failure(raw) == FailureClass::Revert {
        WRONG_NETWORK_HINT.to_string()
    } else {
        raw.to_string()
    }
}

/// Extracts the human-readable message from a JSON-RPC error object:
/// `data.message` when present, then `message`, then the raw JSON.
#[must_use]
pub fn rpc_error_message(err: &Value) -> String {
    if let Some(m) = err.pointer("/data/message").and_then(Value::as_str) {
        return m.to_string();
    }
    if let Some(m) = err.get("message").and_then(Value::as_str) {
        return m.to_string();
    }
    err.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn classification_matches_markers() {
        assert_eq!(
            classify_failure("execution reverted: User already referred"),
            FailureClass::AlreadyReferred
        );
        assert_eq!(classify_failure(WALLET_PROMPT), FailureClass::WalletRequired);
        assert_eq!(
            classify_failure("call revert exception (method=\"getMetadata()\")"),
            FailureClass::Revert
        );
        assert_eq!(classify_failure("nonce too low"), FailureClass::Other);
    }

    #[test]
    fn revert_reads_become_network_hint() {
        assert_eq!(read_failure_text("call revert exception"), WRONG_NETWORK_HINT);
        assert_eq!(read_failure_text("timeout"), "timeout");
    }

    #[test]
    fn rpc_message_prefers_nested_data() {
        let err = json!({
            "code": 3,
            "message": "execution reverted",
            "data": { "message": "execution reverted: User already referred" }
        });
        assert_eq!(
            rpc_error_message(&err),
            "execution reverted: User already referred"
        );
        assert_eq!(
            rpc_error_message(&json!({ "code": -32000, "message": "nonce too low" })),
            "nonce too low"
        );
        assert_eq!(rpc_error_message(&json!("boom")), "\"boom\"");
    }

    #[test]
    fn wrong_network_names_known_chain() {
        let err = XefersError::wrong_network(1029, "0xc7");
        assert_eq!(
            err.to_string(),
            "Please switch to the BitTorrent Chain Donau (0x405) network in the wallet to continue (active network is 0xc7)"
        );
    }

    #[test]
    fn wrong_network_falls_back_to_id() {
        let err = XefersError::wrong_network(5, "0x1");
        assert!(err.to_string().contains("chain 5 (0x5)"));
    }
}

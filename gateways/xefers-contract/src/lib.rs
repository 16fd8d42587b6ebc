//! Gateway to the on-chain Xefers link contract.
//!
//! Every operation goes through the wallet session: the connected account
//! signs, the provider transports. The contract's internal rules (one
//! redemption per address, reward payout conditions) are external; this
//! crate only surfaces their outcomes.

use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::utils::{format_units, parse_units};
use alloy_primitives::{Address, U256};
use alloy_sol_types::{sol, SolCall, SolValue};
use serde::Deserialize;
use serde_json::{json, Value};

use xefers::campaign::LinkMetadata;
use xefers::errors::{XefersError, WALLET_PROMPT};
use xefers_wallet::provider::{ProviderError, WalletProvider};
use xefers_wallet::session::WalletSession;

pub mod artifact;

sol! {
    /// On-chain interface of a Xefers link contract.
    interface LinkContract {
        function getMetadata() external view returns (string memory title, string memory redirectUrl, address owner, uint256 reward);
        function refer() external;
    }
}

const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(2);
const RECEIPT_POLL_ATTEMPTS: u32 = 60;

/// The receipt fields this system reads.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxReceipt {
    pub transaction_hash: String,
    #[serde(default)]
    pub contract_address: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl TxReceipt {
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.status.as_deref() != Some("0x0")
    }
}

/// Deploys link contracts and invokes their read and write operations
/// through the wallet session.
pub struct LinkContractGateway<P> {
    session: Arc<WalletSession<P>>,
    poll_interval: Duration,
}

impl<P: WalletProvider> LinkContractGateway<P> {
    #[must_use]
    pub fn new(session: Arc<WalletSession<P>>) -> Self {
        LinkContractGateway {
            session,
            poll_interval: RECEIPT_POLL_INTERVAL,
        }
    }

    /// Overrides the receipt poll cadence.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    fn connected_account(&self) -> Result<String, XefersError> {
        self.session
            .account()
            .ok_or_else(|| XefersError::Wallet(WALLET_PROMPT.to_string()))
    }

    /// Deploys a link contract with `(title, reward, redirectUrl)` and waits
    /// for the deployment to land, returning the contract address.
    pub async fn deploy(
        &self,
        title: &str,
        reward: f64,
        redirect_url: &str,
    ) -> Result<String, XefersError> {
        let from = self.connected_account()?;
        let provider = self.session.provider()?;
        let data = deployment_calldata(title, reward, redirect_url)?;
        let tx_hash = send_transaction(provider, json!({ "from": from, "data": data })).await?;
        tracing::info!(%tx_hash, "link contract deployment submitted");
        let receipt = self.wait_for_receipt(&tx_hash).await?;
        if !receipt.succeeded() {
            return Err(XefersError::ContractWrite(
                "deployment transaction reverted".to_string(),
            ));
        }
        receipt.contract_address.ok_or_else(|| {
            XefersError::ContractWrite("deployment receipt carries no contract address".to_string())
        })
    }

    /// Reads `(title, redirectUrl, owner, reward)` from a deployed link
    /// contract.
    pub async fn metadata(&self, contract_address: &str) -> Result<LinkMetadata, XefersError> {
        let to = parse_address(contract_address)?;
        let provider = self.session.provider()?;
        let data = encode_bytes(&LinkContract::getMetadataCall {}.abi_encode());
        let result = provider
            .request(
                "eth_call",
                json!([{ "to": to.to_string(), "data": data }, "latest"]),
            )
            .await
            .map_err(|e| XefersError::ContractRead(e.rpc_text()))?;
        let bytes = decode_hex_value(&result).map_err(XefersError::ContractRead)?;
        let ret = LinkContract::getMetadataCall::abi_decode_returns(&bytes)
            .map_err(|e| XefersError::ContractRead(e.to_string()))?;
        Ok(LinkMetadata {
            title: ret.title,
            redirect_url: ret.redirectUrl,
            owner: ret.owner.to_string(),
            reward: from_wei(ret.reward),
        })
    }

    /// Submits the visitor's `refer` transaction and waits for it to land.
    pub async fn refer(&self, contract_address: &str) -> Result<TxReceipt, XefersError> {
        let from = self.connected_account()?;
        let to = parse_address(contract_address)?;
        let provider = self.session.provider()?;
        let data = encode_bytes(&LinkContract::referCall {}.abi_encode());
        let tx_hash = send_transaction(
            provider,
            json!({ "from": from, "to": to.to_string(), "data": data }),
        )
        .await?;
        let receipt = self.wait_for_receipt(&tx_hash).await?;
        if !receipt.succeeded() {
            return Err(XefersError::ContractWrite(
                "refer transaction reverted".to_string(),
            ));
        }
        Ok(receipt)
    }

    /// Transfers the reward balance to a deployed contract, after checking
    /// the sender can cover it.
    pub async fn fund(&self, contract_address: &str, amount: f64) -> Result<TxReceipt, XefersError> {
        let from = self.connected_account()?;
        let to = parse_address(contract_address)?;
        let provider = self.session.provider()?;
        let value = to_wei(amount)?;
        let balance = provider
            .request("eth_getBalance", json!([from, "latest"]))
            .await
            .map_err(|e| XefersError::ContractWrite(e.rpc_text()))?;
        let balance = parse_quantity(&balance).map_err(XefersError::ContractWrite)?;
        if balance < value {
            return Err(XefersError::ContractWrite(
                "Insufficient funds for this transaction.".to_string(),
            ));
        }
        let tx_hash = send_transaction(
            provider,
            json!({ "from": from, "to": to.to_string(), "value": format!("{value:#x}") }),
        )
        .await?;
        let receipt = self.wait_for_receipt(&tx_hash).await?;
        if !receipt.succeeded() {
            return Err(XefersError::ContractWrite(
                "funding transaction reverted".to_string(),
            ));
        }
        Ok(receipt)
    }

    async fn wait_for_receipt(&self, tx_hash: &str) -> Result<TxReceipt, XefersError> {
        let provider = self.session.provider()?;
        for _ in 0..RECEIPT_POLL_ATTEMPTS {
            let result = provider
                .request("eth_getTransactionReceipt", json!([tx_hash]))
                .await
                .map_err(|e| XefersError::ContractWrite(e.rpc_text()))?;
            if !result.is_null() {
                return serde_json::from_value(result)
                    .map_err(|e| XefersError::ContractWrite(format!("malformed receipt: {e}")));
            }
            tokio::time::sleep(self.poll_interval).await;
        }
        Err(XefersError::ContractWrite(format!(
            "timed out waiting for receipt of {tx_hash}"
        )))
    }
}

/// Whether a string is a well-formed contract/account address.
#[must_use]
pub fn valid_address(addr: &str) -> bool {
    addr.parse::<Address>().is_ok()
}

fn parse_address(addr: &str) -> Result<Address, XefersError> {
    addr.parse()
        .map_err(|_| XefersError::Validation(format!("\"{addr}\" is not a valid contract address.")))
}

async fn send_transaction<P: WalletProvider>(
    provider: &P,
    tx: Value,
) -> Result<String, XefersError> {
    let result = provider
        .request("eth_sendTransaction", json!([tx]))
        .await
        .map_err(map_write_error)?;
    result
        .as_str()
        .map(str::to_owned)
        .ok_or_else(|| XefersError::ContractWrite("no transaction hash returned".to_string()))
}

fn map_write_error(e: ProviderError) -> XefersError {
    match e {
        ProviderError::Rejected(_) => XefersError::UserRejected,
        other => XefersError::ContractWrite(other.rpc_text()),
    }
}

/// Creation calldata: the compiled bytecode followed by the ABI-encoded
/// constructor arguments.
fn deployment_calldata(
    title: &str,
    reward: f64,
    redirect_url: &str,
) -> Result<String, XefersError> {
    let reward_wei = to_wei(reward)?;
    let args = (title.to_string(), reward_wei, redirect_url.to_string()).abi_encode_params();
    Ok(format!(
        "{}{}",
        artifact::LINK_CONTRACT_BYTECODE,
        hex::encode(args)
    ))
}

/// Native-unit amount to wei (18 decimals).
fn to_wei(amount: f64) -> Result<U256, XefersError> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(XefersError::Validation(format!(
            "\"{amount}\" is not a valid reward amount."
        )));
    }
    parse_units(&format!("{amount}"), 18u8)
        .map(|p| p.get_absolute())
        .map_err(|e| XefersError::Validation(format!("invalid reward amount: {e}")))
}

fn from_wei(value: U256) -> f64 {
    format_units(value, 18u8)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(0.0)
}

fn encode_bytes(data: &[u8]) -> String {
    format!("0x{}", hex::encode(data))
}

fn decode_hex_value(value: &Value) -> Result<Vec<u8>, String> {
    let text = value
        .as_str()
        .ok_or_else(|| "eth_call returned a non-string result".to_string())?;
    hex::decode(text.strip_prefix("0x").unwrap_or(text))
        .map_err(|e| format!("bad hex in call result: {e}"))
}

fn parse_quantity(value: &Value) -> Result<U256, String> {
    let text = value
        .as_str()
        .ok_or_else(|| "expected a hex quantity".to_string())?;
    U256::from_str_radix(text.strip_prefix("0x").unwrap_or(text), 16)
        .map_err(|e| format!("bad hex quantity: {e}"))
}

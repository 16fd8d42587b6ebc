//! End-to-end flow scenarios over scripted gateways: the wallet provider is
//! a canned JSON-RPC script, the record store an in-memory map.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy_primitives::{Address, U256};
use alloy_sol_types::SolValue;
use serde_json::{json, Value};

use client_app::flows::create::CreateCampaignFlow;
use client_app::flows::links::owner_links;
use client_app::flows::redeem::RedemptionFlow;
use xefers::campaign::{Campaign, CampaignDraft};
use xefers::chains;
use xefers::errors::{FailureClass, XefersError};
use xefers::redemption::RedemptionState;
use xefers_contract::LinkContractGateway;
use xefers_store::RecordStore;
use xefers_wallet::provider::{ProviderError, WalletProvider};
use xefers_wallet::session::{SessionCache, WalletSession};

const OWNER: &str = "0x00000000000000000000000000000000000000a1";
const CONTRACT: &str = "0x00000000000000000000000000000000000000c2";

struct ScriptedProvider {
    replies: Mutex<VecDeque<Result<Value, ProviderError>>>,
    seen: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    fn new(replies: Vec<Result<Value, ProviderError>>) -> Self {
        ScriptedProvider {
            replies: Mutex::new(replies.into()),
            seen: Mutex::new(Vec::new()),
        }
    }

    fn methods(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

impl WalletProvider for ScriptedProvider {
    async fn request(&self, method: &str, _params: Value) -> Result<Value, ProviderError> {
        self.seen.lock().unwrap().push(method.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .expect("unexpected provider request")
    }
}

#[derive(Default)]
struct MemStore {
    records: Mutex<Vec<Campaign>>,
    fail_writes: bool,
}

impl MemStore {
    fn failing() -> Self {
        MemStore {
            records: Mutex::new(Vec::new()),
            fail_writes: true,
        }
    }
}

impl RecordStore for &MemStore {
    async fn create_campaign(&self, campaign: &Campaign) -> Result<String, XefersError> {
        if self.fail_writes {
            return Err(XefersError::Persistence("store unreachable".to_string()));
        }
        self.records.lock().unwrap().push(campaign.clone());
        Ok(campaign.id.clone())
    }

    async fn list_campaigns_by_owner(&self, owner: &str) -> Result<Vec<Campaign>, XefersError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.owner == owner)
            .cloned()
            .collect())
    }
}

fn session(
    provider: ScriptedProvider,
    account: Option<&str>,
    tag: &str,
) -> Arc<WalletSession<ScriptedProvider>> {
    let cache = SessionCache::new(std::env::temp_dir().join(format!("xefers-flow-{tag}.json")));
    match account {
        Some(account) => cache.store(account),
        None => cache.clear(),
    }
    Arc::new(WalletSession::with_cache(Some(provider), cache))
}

fn gateway(session: &Arc<WalletSession<ScriptedProvider>>) -> LinkContractGateway<ScriptedProvider> {
    LinkContractGateway::new(Arc::clone(session)).with_poll_interval(Duration::from_millis(1))
}

fn draft() -> CampaignDraft {
    CampaignDraft {
        title: "Launch Promo".to_string(),
        redirect_url: "sunpump.meme".to_string(),
        reward: String::new(),
        reward_checked: false,
    }
}

fn metadata_blob() -> Value {
    let bytes = (
        "Launch Promo".to_string(),
        "http://sunpump.meme".to_string(),
        OWNER.parse::<Address>().unwrap(),
        U256::ZERO,
    )
        .abi_encode_params();
    Value::String(format!("0x{}", hex::encode(bytes)))
}

#[tokio::test]
async fn happy_path_creates_and_persists_a_campaign() {
    let provider = ScriptedProvider::new(vec![
        Ok(json!("0x405")), // eth_chainId matches the Donau chain
        Ok(json!("0xdeploy")),
        Ok(json!({
            "transactionHash": "0xdeploy",
            "contractAddress": CONTRACT,
            "status": "0x1",
        })),
    ]);
    let session = session(provider, Some(OWNER), "happy");
    let store = MemStore::default();
    let chain = chains::lookup(1029).unwrap();
    let flow = CreateCampaignFlow::new(
        Arc::clone(&session),
        gateway(&session),
        &store,
        chain,
        "https://xefers.app",
    );

    let receipt = flow.run(&draft()).await.unwrap();

    assert!(receipt.persisted);
    assert_eq!(receipt.campaign.id, CONTRACT);
    assert_eq!(receipt.campaign.owner, OWNER);
    assert_eq!(receipt.campaign.redirect_url, "http://sunpump.meme");
    assert_eq!(receipt.campaign.reward, 0.0);
    assert_eq!(receipt.share_link, format!("https://xefers.app/link/{CONTRACT}"));
    assert_eq!(
        receipt.contract_url,
        format!("https://testnet.bttcscan.com/address/{CONTRACT}")
    );

    // The record landed under the owner and comes back by equality query.
    let listed = owner_links(&session, &&store).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0], receipt.campaign);
}

#[tokio::test]
async fn network_mismatch_blocks_before_any_transaction() {
    let provider = ScriptedProvider::new(vec![
        Ok(json!("0xc7")), // wallet sits on mainnet
        Err(ProviderError::Rejected("User rejected the request.".to_string())),
    ]);
    let session = session(provider, Some(OWNER), "mismatch");
    let store = MemStore::default();
    let chain = chains::lookup(1029).unwrap();
    let flow = CreateCampaignFlow::new(
        Arc::clone(&session),
        gateway(&session),
        &store,
        chain,
        "https://xefers.app",
    );

    let err = flow.run(&draft()).await.unwrap_err();
    let message = err.to_string();
    assert!(message.contains("BitTorrent Chain Donau"));
    assert!(message.contains("0x405"));
    assert!(message.contains("0xc7"));

    let methods = session.provider().unwrap().methods();
    assert!(!methods.iter().any(|m| m == "eth_sendTransaction"));
    assert!(store.records.lock().unwrap().is_empty());
}

#[tokio::test]
async fn validation_failure_never_reaches_the_network() {
    let provider = ScriptedProvider::new(vec![]);
    let session = session(provider, Some(OWNER), "invalid");
    let store = MemStore::default();
    let chain = chains::lookup(1029).unwrap();
    let flow = CreateCampaignFlow::new(
        Arc::clone(&session),
        gateway(&session),
        &store,
        chain,
        "https://xefers.app",
    );

    let mut bad = draft();
    bad.title = String::new();
    let err = flow.run(&bad).await.unwrap_err();
    assert!(matches!(err, XefersError::Validation(_)));
    assert!(session.provider().unwrap().methods().is_empty());
}

#[tokio::test]
async fn persistence_failure_does_not_unwind_the_deployment() {
    let provider = ScriptedProvider::new(vec![
        Ok(json!("0x405")),
        Ok(json!("0xdeploy")),
        Ok(json!({
            "transactionHash": "0xdeploy",
            "contractAddress": CONTRACT,
            "status": "0x1",
        })),
    ]);
    let session = session(provider, Some(OWNER), "bestefort");
    let store = MemStore::failing();
    let chain = chains::lookup(1029).unwrap();
    let flow = CreateCampaignFlow::new(
        Arc::clone(&session),
        gateway(&session),
        &store,
        chain,
        "https://xefers.app",
    );

    let receipt = flow.run(&draft()).await.unwrap();
    assert!(!receipt.persisted);
    assert_eq!(receipt.campaign.id, CONTRACT);
}

#[tokio::test]
async fn repeat_visitor_keeps_the_destination_affordance() {
    let provider = ScriptedProvider::new(vec![
        Ok(metadata_blob()),
        Err(ProviderError::Rpc {
            code: 3,
            message: "execution reverted".to_string(),
            data: Some(json!({ "message": "execution reverted: User already referred" })),
        }),
    ]);
    let session = session(provider, Some(OWNER), "repeat");
    let flow = RedemptionFlow::new(Arc::clone(&session), gateway(&session));

    let mut page = flow.open(CONTRACT).await;
    assert!(matches!(page.state(), RedemptionState::Ready { .. }));

    // The refer call reverts because this viewer already redeemed.
    assert_eq!(flow.continue_pressed(&mut page).await, None);
    let RedemptionState::Errored { class, reason, .. } = page.state() else {
        panic!("expected Errored, got {:?}", page.state());
    };
    assert_eq!(*class, FailureClass::AlreadyReferred);
    assert!(reason.contains("already referred"));

    // The destination is still offered, with no further on-chain call.
    let calls_before = session.provider().unwrap().methods().len();
    assert_eq!(
        flow.continue_pressed(&mut page).await,
        Some(format!("http://sunpump.meme?ref={OWNER}"))
    );
    assert_eq!(session.provider().unwrap().methods().len(), calls_before);
}

#[tokio::test]
async fn happy_redemption_exposes_the_tagged_destination() {
    let provider = ScriptedProvider::new(vec![
        Ok(metadata_blob()),
        Ok(json!("0xrefer")),
        Ok(json!({ "transactionHash": "0xrefer", "status": "0x1" })),
    ]);
    let session = session(provider, Some(OWNER), "redeem");
    let flow = RedemptionFlow::new(Arc::clone(&session), gateway(&session));

    let mut page = flow.open(CONTRACT).await;
    let destination = flow.continue_pressed(&mut page).await.unwrap();
    assert_eq!(destination, format!("http://sunpump.meme?ref={OWNER}"));
    assert!(matches!(page.state(), RedemptionState::Redeemed { .. }));
}

#[tokio::test]
async fn unauthenticated_page_never_touches_the_chain() {
    let provider = ScriptedProvider::new(vec![]);
    let session = session(provider, None, "unauth");
    let flow = RedemptionFlow::new(Arc::clone(&session), gateway(&session));

    let mut page = flow.open(CONTRACT).await;
    assert_eq!(page.state(), &RedemptionState::Unauthenticated);
    assert_eq!(flow.continue_pressed(&mut page).await, None);
    assert!(session.provider().unwrap().methods().is_empty());
}

#[tokio::test]
async fn owner_with_no_campaigns_gets_an_empty_list() {
    let provider = ScriptedProvider::new(vec![]);
    let session = session(provider, Some(OWNER), "empty");
    let store = MemStore::default();
    let listed = owner_links(&session, &&store).await.unwrap();
    assert!(listed.is_empty());
}

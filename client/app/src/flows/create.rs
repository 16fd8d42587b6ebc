//! Campaign creation: validate, verify the network, deploy, then persist the
//! record best-effort.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use xefers::campaign::{share_link, Campaign, CampaignDraft};
use xefers::chains::{self, ChainInfo};
use xefers::errors::XefersError;
use xefers_contract::LinkContractGateway;
use xefers_store::RecordStore;
use xefers_wallet::provider::WalletProvider;
use xefers_wallet::session::WalletSession;

/// Outcome of a creation run. `persisted` is false when the record store
/// write failed; the deployment itself still succeeded and the link is
/// usable.
#[derive(Debug, Clone, Serialize)]
pub struct CampaignReceipt {
    pub campaign: Campaign,
    pub share_link: String,
    pub contract_url: String,
    pub persisted: bool,
}

pub struct CreateCampaignFlow<P, S> {
    session: Arc<WalletSession<P>>,
    gateway: LinkContractGateway<P>,
    store: S,
    chain: &'static ChainInfo,
    origin: String,
}

impl<P: WalletProvider, S: RecordStore> CreateCampaignFlow<P, S> {
    #[must_use]
    pub fn new(
        session: Arc<WalletSession<P>>,
        gateway: LinkContractGateway<P>,
        store: S,
        chain: &'static ChainInfo,
        origin: impl Into<String>,
    ) -> Self {
        CreateCampaignFlow {
            session,
            gateway,
            store,
            chain,
            origin: origin.into(),
        }
    }

    /// Runs the whole flow for one submitted form. Validation and the
    /// network check both happen before anything is sent to the wallet.
    /// Persistence failure after a successful deployment is reported, not
    /// unwound; the two systems share no transaction.
    pub async fn run(&self, draft: &CampaignDraft) -> Result<CampaignReceipt, XefersError> {
        draft.validate()?;
        self.session.ensure_network(self.chain.id).await?;
        let owner = match self.session.account() {
            Some(account) => account,
            None => self.session.connect().await?,
        };

        let address = self
            .gateway
            .deploy(
                &draft.title,
                draft.resolved_reward(),
                &draft.normalized_redirect_url(),
            )
            .await?;

        let campaign =
            Campaign::from_deployment(Some(&address), draft, &owner, self.chain.id, now_millis());
        let persisted = match self.store.create_campaign(&campaign).await {
            Ok(record_id) => {
                tracing::debug!(%record_id, "campaign record created");
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, contract = %address, "campaign record was not persisted; the deployed link is still usable");
                false
            }
        };

        Ok(CampaignReceipt {
            share_link: share_link(&self.origin, &address),
            contract_url: chains::explorer_address_url(self.chain, &address),
            campaign,
            persisted,
        })
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

//! Drives one redemption page instance against the live gateways. The
//! machine in `xefers::redemption` decides what may happen; this flow only
//! performs the I/O it asks for and feeds results back under the key they
//! were dispatched with.

use std::sync::Arc;

use xefers::errors::XefersError;
use xefers::redemption::{RedemptionAction, RedemptionPage};
use xefers_contract::LinkContractGateway;
use xefers_wallet::provider::WalletProvider;
use xefers_wallet::session::WalletSession;

pub struct RedemptionFlow<P> {
    session: Arc<WalletSession<P>>,
    gateway: LinkContractGateway<P>,
}

impl<P: WalletProvider> RedemptionFlow<P> {
    #[must_use]
    pub fn new(session: Arc<WalletSession<P>>, gateway: LinkContractGateway<P>) -> Self {
        RedemptionFlow { session, gateway }
    }

    /// Opens the page for a contract address: binds the session account (if
    /// any) and performs the initial metadata load. Without an account the
    /// page stays unauthenticated and nothing touches the chain.
    pub async fn open(&self, contract_address: &str) -> RedemptionPage {
        let mut page = RedemptionPage::new(contract_address, self.session.account());
        self.load(&mut page).await;
        page
    }

    /// Re-runs the load when the machine asks for one (fresh page, account
    /// change, contract change).
    pub async fn load(&self, page: &mut RedemptionPage) {
        let Some(key) = page.wants_metadata() else {
            return;
        };
        match self.gateway.metadata(&key.contract).await {
            Ok(metadata) => page.metadata_loaded(&key, metadata),
            Err(e) => page.load_failed(&key, &failure_text(&e)),
        }
    }

    /// The viewer's explicit continue action. Returns the destination URL to
    /// offer once there is one; the caller renders it, the system never
    /// navigates on its own.
    pub async fn continue_pressed(&self, page: &mut RedemptionPage) -> Option<String> {
        match page.continue_pressed()? {
            RedemptionAction::Open(destination) => Some(destination),
            RedemptionAction::Refer(key) => {
                match self.gateway.refer(&key.contract).await {
                    Ok(receipt) => {
                        tracing::info!(tx = %receipt.transaction_hash, "referral recorded");
                        page.refer_confirmed(&key);
                    }
                    Err(e) => page.refer_failed(&key, &failure_text(&e)),
                }
                page.destination().map(str::to_owned)
            }
        }
    }
}

/// The message the page renders for a gateway failure: the inner text for
/// contract errors (the classifier reads it), the display form otherwise.
fn failure_text(e: &XefersError) -> String {
    match e {
        XefersError::ContractRead(text)
        | XefersError::ContractWrite(text)
        | XefersError::Wallet(text) => text.clone(),
        other => other.to_string(),
    }
}

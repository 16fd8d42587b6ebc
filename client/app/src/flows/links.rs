//! Owner's campaign listing. Requires a connected account; delegates the
//! query to the record store.

use std::sync::Arc;

use xefers::campaign::Campaign;
use xefers::errors::{XefersError, WALLET_PROMPT};
use xefers_store::RecordStore;
use xefers_wallet::provider::WalletProvider;
use xefers_wallet::session::WalletSession;

/// Campaigns owned by the session's account, in store order.
pub async fn owner_links<P: WalletProvider, S: RecordStore>(
    session: &Arc<WalletSession<P>>,
    store: &S,
) -> Result<Vec<Campaign>, XefersError> {
    let owner = session
        .account()
        .ok_or_else(|| XefersError::Wallet(WALLET_PROMPT.to_string()))?;
    store.list_campaigns_by_owner(&owner).await
}

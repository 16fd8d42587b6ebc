//! State machine for a referral redemption page.
//!
//! One machine instance corresponds to one page view of
//! `/link/<contractAddress>` by one viewer account. All contract I/O happens
//! outside; the machine decides *when* a load or a refer call may be issued
//! and folds the (possibly late) results back in. Async results carry the
//! [`RedemptionKey`] they were dispatched under; a result for any other key
//! is stale and dropped.

use crate::campaign::{referral_destination, LinkMetadata};
use crate::errors::{classify_failure, read_failure_text, FailureClass};

/// Identity of one in-flight redemption attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedemptionKey {
    pub contract: String,
    pub account: String,
}

/// Observable state of the redemption page.
#[derive(Debug, Clone, PartialEq)]
pub enum RedemptionState {
    /// No account bound; nothing may touch the chain.
    Unauthenticated,
    /// Metadata fetch may be (or is being) issued.
    Loading,
    /// Metadata loaded; waiting for the viewer's explicit continue.
    Ready { metadata: LinkMetadata },
    /// Refer transaction in flight; the trigger is disabled.
    Redeeming { metadata: LinkMetadata },
    /// Terminal success. The destination is exposed, never auto-followed.
    Redeemed {
        metadata: LinkMetadata,
        destination: String,
    },
    /// Terminal for this attempt; a new explicit trigger is required.
    Errored {
        reason: String,
        class: FailureClass,
        /// Metadata from an earlier successful load, if any. Keeps the
        /// continue-to-destination affordance alive for repeat visitors.
        metadata: Option<LinkMetadata>,
    },
}

/// What the page should do in response to a continue press.
#[derive(Debug, Clone, PartialEq)]
pub enum RedemptionAction {
    /// Issue the on-chain refer call for this key.
    Refer(RedemptionKey),
    /// No new on-chain call; offer the destination directly.
    Open(String),
}

/// The redemption page machine. See the module docs for the contract.
#[derive(Debug)]
pub struct RedemptionPage {
    contract: String,
    account: Option<String>,
    last_metadata: Option<LinkMetadata>,
    state: RedemptionState,
}

impl RedemptionPage {
    #[must_use]
    pub fn new(contract: impl Into<String>, account: Option<String>) -> Self {
        let state = if account.is_some() {
            RedemptionState::Loading
        } else {
            RedemptionState::Unauthenticated
        };
        RedemptionPage {
            contract: contract.into(),
            account,
            last_metadata: None,
            state,
        }
    }

    #[must_use]
    pub fn state(&self) -> &RedemptionState {
        &self.state
    }

    /// The key under which chain calls must be dispatched right now.
    #[must_use]
    pub fn key(&self) -> Option<RedemptionKey> {
        self.account.as_ref().map(|account| RedemptionKey {
            contract: self.contract.clone(),
            account: account.clone(),
        })
    }

    /// `Some(key)` exactly when a metadata fetch should be issued. Never
    /// yields a key without a bound account.
    #[must_use]
    pub fn wants_metadata(&self) -> Option<RedemptionKey> {
        match self.state {
            RedemptionState::Loading => self.key(),
            _ => None,
        }
    }

    fn is_current(&self, key: &RedemptionKey) -> bool {
        self.key().as_ref() == Some(key)
    }

    /// An account became available (or the active account changed). Restarts
    /// the attempt under the new key.
    pub fn account_connected(&mut self, account: impl Into<String>) {
        let account = account.into();
        if self.account.as_deref() == Some(account.as_str()) {
            return;
        }
        self.account = Some(account);
        self.state = RedemptionState::Loading;
    }

    /// The account went away; back to the explanatory resting state.
    pub fn account_disconnected(&mut self) {
        self.account = None;
        self.state = RedemptionState::Unauthenticated;
    }

    /// The route's contract address changed. Restarts the attempt.
    pub fn contract_changed(&mut self, contract: impl Into<String>) {
        self.contract = contract.into();
        self.last_metadata = None;
        self.state = if self.account.is_some() {
            RedemptionState::Loading
        } else {
            RedemptionState::Unauthenticated
        };
    }

    /// Folds in a successful metadata fetch dispatched under `key`.
    pub fn metadata_loaded(&mut self, key: &RedemptionKey, metadata: LinkMetadata) {
        if !self.is_current(key) || !matches!(self.state, RedemptionState::Loading) {
            return;
        }
        self.last_metadata = Some(metadata.clone());
        self.state = RedemptionState::Ready { metadata };
    }

    /// Folds in a failed metadata fetch dispatched under `key`.
    pub fn load_failed(&mut self, key: &RedemptionKey, raw_reason: &str) {
        if !self.is_current(key) || !matches!(self.state, RedemptionState::Loading) {
            return;
        }
        let class = classify_failure(raw_reason);
        self.state = RedemptionState::Errored {
            reason: format!("Error reading link data: {}", read_failure_text(raw_reason)),
            class,
            metadata: self.last_metadata.clone(),
        };
    }

    /// The viewer's explicit continue action. Returns what to do, or `None`
    /// when the trigger is currently disabled (no metadata yet, transaction
    /// already in flight, or a blocking error).
    pub fn continue_pressed(&mut self) -> Option<RedemptionAction> {
        match &self.state {
            RedemptionState::Ready { metadata } => {
                let key = self.key()?;
                let metadata = metadata.clone();
                self.state = RedemptionState::Redeeming { metadata };
                Some(RedemptionAction::Refer(key))
            }
            // A repeat visitor may still follow the destination; no new
            // on-chain call is made for it.
            RedemptionState::Errored {
                class: FailureClass::AlreadyReferred,
                metadata: Some(metadata),
                ..
            } => {
                let account = self.account.as_deref()?;
                Some(RedemptionAction::Open(referral_destination(
                    &metadata.redirect_url,
                    account,
                )))
            }
            RedemptionState::Redeemed { destination, .. } => {
                Some(RedemptionAction::Open(destination.clone()))
            }
            _ => None,
        }
    }

    /// Folds in a confirmed refer transaction dispatched under `key`.
    pub fn refer_confirmed(&mut self, key: &RedemptionKey) {
        if !self.is_current(key) {
            return;
        }
        let metadata = match &self.state {
            RedemptionState::Redeeming { metadata } => metadata.clone(),
            _ => return,
        };
        let destination = referral_destination(&metadata.redirect_url, &key.account);
        self.state = RedemptionState::Redeemed {
            metadata,
            destination,
        };
    }

    /// Folds in a failed refer transaction dispatched under `key`.
    pub fn refer_failed(&mut self, key: &RedemptionKey, raw_reason: &str) {
        if !self.is_current(key) || !matches!(self.state, RedemptionState::Redeeming { .. }) {
            return;
        }
        self.state = RedemptionState::Errored {
            reason: format!("Error completing referral: {raw_reason}"),
            class: classify_failure(raw_reason),
            metadata: self.last_metadata.clone(),
        };
    }

    /// The destination URL, once the attempt has succeeded.
    #[must_use]
    pub fn destination(&self) -> Option<&str> {
        match &self.state {
            RedemptionState::Redeemed { destination, .. } => Some(destination),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const CONTRACT: &str = "0xDEF0000000000000000000000000000000000001";
    const VIEWER: &str = "0xAbC0000000000000000000000000000000001234";

    fn metadata() -> LinkMetadata {
        LinkMetadata {
            title: "Launch Promo".to_string(),
            redirect_url: "http://sunpump.meme".to_string(),
            owner: "0x0000000000000000000000000000000000000002".to_string(),
            reward: 0.0,
        }
    }

    fn loaded_page() -> (RedemptionPage, RedemptionKey) {
        let mut page = RedemptionPage::new(CONTRACT, Some(VIEWER.to_string()));
        let key = page.wants_metadata().unwrap();
        page.metadata_loaded(&key, metadata());
        (page, key)
    }

    #[test]
    fn no_account_means_no_metadata_fetch() {
        let page = RedemptionPage::new(CONTRACT, None);
        assert_eq!(page.state(), &RedemptionState::Unauthenticated);
        assert_eq!(page.wants_metadata(), None);
        assert_eq!(page.key(), None);
    }

    #[test]
    fn account_arrival_enters_loading() {
        let mut page = RedemptionPage::new(CONTRACT, None);
        page.account_connected(VIEWER);
        assert_eq!(page.state(), &RedemptionState::Loading);
        let key = page.wants_metadata().unwrap();
        assert_eq!(key.account, VIEWER);
        assert_eq!(key.contract, CONTRACT);
    }

    #[test]
    fn load_success_reaches_ready() {
        let (page, _) = loaded_page();
        assert_eq!(
            page.state(),
            &RedemptionState::Ready {
                metadata: metadata()
            }
        );
        // Ready does not re-request the metadata.
        assert_eq!(page.wants_metadata(), None);
    }

    #[test]
    fn stale_load_results_are_ignored() {
        let mut page = RedemptionPage::new(CONTRACT, Some(VIEWER.to_string()));
        let old_key = page.wants_metadata().unwrap();
        page.account_connected("0x0000000000000000000000000000000000000009");
        page.metadata_loaded(&old_key, metadata());
        assert_eq!(page.state(), &RedemptionState::Loading);
    }

    #[test]
    fn continue_moves_to_redeeming_and_disables_reentry() {
        let (mut page, key) = loaded_page();
        assert_eq!(
            page.continue_pressed(),
            Some(RedemptionAction::Refer(key.clone()))
        );
        assert!(matches!(page.state(), RedemptionState::Redeeming { .. }));
        // Trigger disabled while the transaction is in flight.
        assert_eq!(page.continue_pressed(), None);
        page.refer_confirmed(&key);
        assert_eq!(
            page.destination(),
            Some(format!("http://sunpump.meme?ref={VIEWER}").as_str())
        );
    }

    #[test]
    fn refer_failure_is_terminal_until_new_trigger() {
        let (mut page, key) = loaded_page();
        page.continue_pressed();
        page.refer_failed(&key, "nonce too low");
        let RedemptionState::Errored { class, reason, .. } = page.state() else {
            panic!("expected Errored, got {:?}", page.state());
        };
        assert_eq!(*class, FailureClass::Other);
        assert_eq!(reason, "Error completing referral: nonce too low");
        // A blocking error disables continue entirely.
        assert_eq!(page.continue_pressed(), None);
        // An account change is the explicit trigger that restarts.
        page.account_connected("0x0000000000000000000000000000000000000009");
        assert_eq!(page.state(), &RedemptionState::Loading);
    }

    #[test]
    fn already_referred_keeps_the_destination_affordance() {
        let (mut page, key) = loaded_page();
        page.continue_pressed();
        page.refer_failed(&key, "execution reverted: User already referred");
        let RedemptionState::Errored { class, metadata, .. } = page.state() else {
            panic!("expected Errored");
        };
        assert_eq!(*class, FailureClass::AlreadyReferred);
        assert!(metadata.is_some());
        assert_eq!(
            page.continue_pressed(),
            Some(RedemptionAction::Open(format!(
                "http://sunpump.meme?ref={VIEWER}"
            )))
        );
    }

    #[test]
    fn revert_on_load_reads_as_network_hint() {
        let mut page = RedemptionPage::new(CONTRACT, Some(VIEWER.to_string()));
        let key = page.wants_metadata().unwrap();
        page.load_failed(&key, "call revert exception");
        let RedemptionState::Errored { reason, class, metadata } = page.state() else {
            panic!("expected Errored");
        };
        assert_eq!(*class, FailureClass::Revert);
        assert!(reason.contains("wrong network"));
        assert_eq!(*metadata, None);
        assert_eq!(page.continue_pressed(), None);
    }

    #[test]
    fn contract_change_restarts_the_attempt() {
        let (mut page, _) = loaded_page();
        page.contract_changed("0xDEF0000000000000000000000000000000000002");
        assert_eq!(page.state(), &RedemptionState::Loading);
        let key = page.wants_metadata().unwrap();
        assert_eq!(key.contract, "0xDEF0000000000000000000000000000000000002");
    }

    #[test]
    fn disconnect_returns_to_unauthenticated() {
        let (mut page, _) = loaded_page();
        page.account_disconnected();
        assert_eq!(page.state(), &RedemptionState::Unauthenticated);
        assert_eq!(page.wants_metadata(), None);
    }
}

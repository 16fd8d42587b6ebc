use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::chains;
use crate::errors::XefersError;

fn reward_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d*\.?\d+$").expect("static regex"))
}

fn address_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^0x[0-9a-fA-F]{40}$").expect("static regex"))
}

/// On-chain metadata returned by a link contract's `getMetadata` call.
/// Fetched per page view, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkMetadata {
    pub title: String,
    pub redirect_url: String,
    pub owner: String,
    /// Reward in native units.
    pub reward: f64,
}

/// An off-chain campaign record, created once at persistence time and never
/// updated. Serialized in the store's camelCase field convention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    /// Deployed contract address, or a timestamp-derived fallback when the
    /// deployment was still pending at persistence time.
    pub id: String,
    pub title: String,
    pub redirect_url: String,
    /// Reward in native units; always `0` when rewards were disabled.
    pub reward: f64,
    /// Wallet account that created the campaign. Records are only ever
    /// queried by equality on this field.
    pub owner: String,
    pub created_at: u64,
    pub chain_id: u64,
}

impl Campaign {
    /// Builds the record for a finished (or still pending) deployment.
    #[must_use]
    pub fn from_deployment(
        contract_address: Option<&str>,
        draft: &CampaignDraft,
        owner: &str,
        chain_id: u64,
        created_at_millis: u64,
    ) -> Self {
        Campaign {
            id: contract_address
                .map(str::to_owned)
                .unwrap_or_else(|| created_at_millis.to_string()),
            title: draft.title.clone(),
            redirect_url: draft.normalized_redirect_url(),
            reward: draft.resolved_reward(),
            owner: owner.to_string(),
            created_at: created_at_millis,
            chain_id,
        }
    }

    /// Parses one record coming back from the schema-less store. The rest of
    /// the system only ever sees records that passed this boundary.
    pub fn from_record(record: &serde_json::Value) -> Result<Self, XefersError> {
        let campaign: Campaign = serde_json::from_value(record.clone())
            .map_err(|e| XefersError::Validation(format!("malformed campaign record: {e}")))?;
        if campaign.title.trim().is_empty() {
            return Err(XefersError::Validation(
                "campaign record has an empty title".to_string(),
            ));
        }
        if campaign.reward < 0.0 {
            return Err(XefersError::Validation(
                "campaign record has a negative reward".to_string(),
            ));
        }
        if !address_re().is_match(&campaign.owner) {
            return Err(XefersError::Validation(format!(
                "campaign record has an invalid owner address: {}",
                campaign.owner
            )));
        }
        if chains::lookup(campaign.chain_id).is_none() {
            return Err(XefersError::Validation(format!(
                "campaign record references unknown chain {}",
                campaign.chain_id
            )));
        }
        Url::parse(&campaign.redirect_url)
            .map_err(|e| XefersError::Validation(format!("campaign record redirect URL: {e}")))?;
        Ok(campaign)
    }
}

/// Form input for a new campaign, before validation.
#[derive(Debug, Clone, Default)]
pub struct CampaignDraft {
    pub title: String,
    pub redirect_url: String,
    /// Free-text reward field; may hold stale content while rewards are
    /// toggled off.
    pub reward: String,
    pub reward_checked: bool,
}

impl CampaignDraft {
    /// The redirect URL as it will be stored and passed to the contract.
    #[must_use]
    pub fn normalized_redirect_url(&self) -> String {
        normalize_redirect_url(&self.redirect_url)
    }

    /// Reward that actually applies: the checkbox wins over whatever text is
    /// left in the field, and an unchecked box always records zero.
    #[must_use]
    pub fn resolved_reward(&self) -> f64 {
        if !self.reward_checked {
            return 0.0;
        }
        let text = self.reward.trim();
        if text.is_empty() {
            0.0
        } else {
            text.parse().unwrap_or(0.0)
        }
    }

    /// The sole enforcement point for campaign invariants; neither the
    /// contract nor the store re-validates.
    pub fn validate(&self) -> Result<(), XefersError> {
        if self.title.trim().is_empty() {
            return Err(XefersError::Validation(
                "Please provide a link page title and valid redirect URL.".to_string(),
            ));
        }
        let normalized = self.normalized_redirect_url();
        let parsed = Url::parse(&normalized).map_err(|_| {
            XefersError::Validation(format!("\"{}\" is not a valid redirect URL.", self.redirect_url))
        })?;
        if !parsed.has_host() {
            return Err(XefersError::Validation(format!(
                "\"{}\" is not a valid redirect URL.",
                self.redirect_url
            )));
        }
        if self.reward_checked {
            let text = self.reward.trim();
            if !text.is_empty() && !reward_re().is_match(text) {
                return Err(XefersError::Validation(format!(
                    "\"{text}\" is not a valid reward amount."
                )));
            }
        }
        Ok(())
    }
}

/// Prepends `http://` to inputs that carry no scheme; anything already
/// containing `://` passes through unchanged.
#[must_use]
pub fn normalize_redirect_url(input: &str) -> String {
    if input.contains("://") {
        input.to_string()
    } else {
        format!("http://{input}")
    }
}

/// The durable share path for a deployed link contract.
#[must_use]
pub fn share_path(contract_address: &str) -> String {
    format!("/link/{contract_address}")
}

/// The full shareable URL for a deployed link contract.
#[must_use]
pub fn share_link(origin: &str, contract_address: &str) -> String {
    format!("{}{}", origin.trim_end_matches('/'), share_path(contract_address))
}

/// Where a successful redemption sends the visitor: the campaign's redirect
/// URL tagged with the visitor's account.
#[must_use]
pub fn referral_destination(redirect_url: &str, account: &str) -> String {
    format!("{redirect_url}?ref={account}")
}

//! Client for the hosted document database that keeps off-chain campaign
//! records.
//!
//! The store is schema-less; every record passes through
//! [`Campaign::from_record`] on the way in, so the rest of the system only
//! ever sees well-formed campaigns. Writes are best-effort secondaries to an
//! on-chain deployment and must never be treated as transactional with it.

use serde_json::{json, Value};

use xefers::campaign::Campaign;
use xefers::errors::XefersError;

/// Create/query operations over campaign records, keyed by owner address.
#[allow(async_fn_in_trait)]
pub trait RecordStore {
    /// Persists a campaign, returning the backing store's record id.
    async fn create_campaign(&self, campaign: &Campaign) -> Result<String, XefersError>;

    /// All records whose owner equals `owner`, in the backing store's native
    /// order. An owner with no campaigns gets an empty vec, not an error.
    async fn list_campaigns_by_owner(&self, owner: &str) -> Result<Vec<Campaign>, XefersError>;
}

/// HTTP client for one collection of the hosted database.
pub struct CollectionClient {
    http: reqwest::Client,
    base_url: String,
    collection_path: String,
}

impl CollectionClient {
    /// `namespace` is the account-scoped namespace string; `collection` the
    /// collection name inside it.
    #[must_use]
    pub fn new(base_url: impl Into<String>, namespace: &str, collection: &str) -> Self {
        CollectionClient {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            collection_path: encode_path_segment(&format!("{namespace}/{collection}")),
        }
    }

    fn records_url(&self) -> String {
        format!(
            "{}/v0/collections/{}/records",
            self.base_url.trim_end_matches('/'),
            self.collection_path
        )
    }
}

impl RecordStore for CollectionClient {
    async fn create_campaign(&self, campaign: &Campaign) -> Result<String, XefersError> {
        // The collection constructor takes a positional args array.
        let body = json!({
            "args": [
                campaign.id,
                campaign.title,
                campaign.redirect_url,
                campaign.reward,
                campaign.owner,
                campaign.created_at,
                campaign.chain_id,
            ],
        });
        let response = self
            .http
            .post(self.records_url())
            .json(&body)
            .send()
            .await
            .map_err(|e| XefersError::Persistence(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(XefersError::Persistence(format!(
                "record create failed with {status}: {detail}"
            )));
        }
        let reply: Value = response
            .json()
            .await
            .map_err(|e| XefersError::Persistence(e.to_string()))?;
        Ok(reply
            .pointer("/data/id")
            .and_then(Value::as_str)
            .unwrap_or(&campaign.id)
            .to_string())
    }

    async fn list_campaigns_by_owner(&self, owner: &str) -> Result<Vec<Campaign>, XefersError> {
        let filter = json!({ "owner": owner }).to_string();
        let response = self
            .http
            .get(self.records_url())
            .query(&[("where", filter.as_str())])
            .send()
            .await
            .map_err(|e| XefersError::Persistence(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(XefersError::Persistence(format!(
                "record query failed with {status}"
            )));
        }
        let reply: Value = response
            .json()
            .await
            .map_err(|e| XefersError::Persistence(e.to_string()))?;
        Ok(parse_record_page(&reply))
    }
}

/// Pulls the campaigns out of one query reply, dropping records that fail
/// the boundary parse. A schema-less backend may hold anything; one bad
/// record must not take the whole listing down.
fn parse_record_page(reply: &Value) -> Vec<Campaign> {
    let Some(rows) = reply.get("data").and_then(Value::as_array) else {
        return Vec::new();
    };
    rows.iter()
        .filter_map(|row| {
            let record = row.get("data").unwrap_or(row);
            match Campaign::from_record(record) {
                Ok(campaign) => Some(campaign),
                Err(e) => {
                    tracing::warn!(error = %e, "skipping malformed campaign record");
                    None
                }
            }
        })
        .collect()
}

fn encode_path_segment(raw: &str) -> String {
    raw.replace('/', "%2F")
}

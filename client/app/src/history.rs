//! Analytics data for an address: transaction history fetched from the
//! chain's mirror API, collapsed into the per-day series the dashboard
//! charts.

use chrono::DateTime;
use serde::Deserialize;
use std::collections::BTreeMap;

use xefers::errors::XefersError;

/// One transaction row, as the mirror API reports it. The consensus
/// timestamp is `seconds.nanos` since the epoch.
#[derive(Debug, Clone, Deserialize)]
pub struct MirrorTransaction {
    pub consensus_timestamp: String,
}

#[derive(Debug, Default, Deserialize)]
struct MirrorAccountReply {
    #[serde(default)]
    transactions: Vec<MirrorTransaction>,
}

pub struct HistoryClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HistoryClient {
    #[must_use]
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        HistoryClient {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key,
        }
    }

    /// Transactions recorded for `address`. A missing transaction list is an
    /// empty history, not an error.
    pub async fn account_transactions(
        &self,
        address: &str,
    ) -> Result<Vec<MirrorTransaction>, XefersError> {
        let url = format!(
            "{}/api/v1/accounts/{address}",
            self.base_url.trim_end_matches('/')
        );
        let mut request = self.http.get(url);
        if let Some(key) = &self.api_key {
            request = request.header("x-api-key", key);
        }
        let response = request
            .send()
            .await
            .map_err(|e| XefersError::Persistence(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(XefersError::Persistence(format!(
                "history fetch failed with {status}"
            )));
        }
        let reply: MirrorAccountReply = response
            .json()
            .await
            .map_err(|e| XefersError::Persistence(e.to_string()))?;
        Ok(reply.transactions)
    }
}

/// Label for a millisecond timestamp, the way the dashboard labels its axes.
#[must_use]
pub fn date_string(ts_millis: i64, show_time: bool) -> String {
    let Some(dt) = DateTime::from_timestamp_millis(ts_millis) else {
        return String::new();
    };
    if show_time {
        dt.format("%m/%d/%Y %H:%M:%S").to_string()
    } else {
        dt.format("%m/%d/%Y").to_string()
    }
}

/// Per-day transaction counts, oldest day first.
#[must_use]
pub fn daily_counts(rows: &[MirrorTransaction]) -> Vec<(String, u64)> {
    let mut days: BTreeMap<i64, u64> = BTreeMap::new();
    for row in rows {
        let Some(millis) = consensus_millis(&row.consensus_timestamp) else {
            continue;
        };
        *days.entry(millis.div_euclid(86_400_000)).or_insert(0) += 1;
    }
    days.into_iter()
        .map(|(day, count)| (date_string(day * 86_400_000, false), count))
        .collect()
}

fn consensus_millis(timestamp: &str) -> Option<i64> {
    let seconds: f64 = timestamp.parse().ok()?;
    Some((seconds * 1000.0) as i64)
}

//! ER wait-time feed client
//!
//! Fetches the public JSON feed and unwraps its `rss.channel.item`
//! envelope into facility records. One attempt per call; retry policy
//! belongs to the caller.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

use crate::config::FeedConfig;
use crate::models::FacilityRecord;
use crate::{CareFinderError, Result};

/// Source of facility records
#[async_trait]
pub trait FacilityFeed: Send + Sync {
    /// Fetch every record the feed currently publishes, in feed order
    async fn fetch(&self, hostname: &str, path: &str) -> Result<Vec<FacilityRecord>>;
}

#[derive(Debug, Deserialize)]
struct Envelope {
    rss: Rss,
}

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    item: OneOrMany,
}

/// Single-item feeds may serialize `item` as a bare object
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    Many(Vec<Value>),
    One(Value),
}

impl OneOrMany {
    fn into_vec(self) -> Vec<Value> {
        match self {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => vec![item],
        }
    }
}

/// Parse a feed body into facility records.
///
/// Items that do not match the record shape are skipped and logged; the
/// feed only fails as a whole when the envelope is missing or no item at
/// all could be read.
pub fn parse_feed(body: &[u8]) -> Result<Vec<FacilityRecord>> {
    let envelope: Envelope = serde_json::from_slice(body)
        .map_err(|e| CareFinderError::feed_parse(format!("unexpected feed envelope: {e}")))?;

    let items = envelope.rss.channel.item.into_vec();
    let total = items.len();
    let mut records = Vec::with_capacity(total);
    let mut parse_errors = 0;

    for (index, item) in items.into_iter().enumerate() {
        match serde_json::from_value::<FacilityRecord>(item) {
            Ok(record) => records.push(record),
            Err(e) => {
                warn!("Skipping feed item {}: {}", index, e);
                parse_errors += 1;
            }
        }
    }

    debug!(
        "Parsed {} facility records ({} parse errors)",
        records.len(),
        parse_errors
    );

    if records.is_empty() && parse_errors > 0 {
        return Err(CareFinderError::feed_parse(
            "No valid facility records could be parsed from the feed",
        ));
    }

    Ok(records)
}

/// HTTP client for the ER wait-time feed
pub struct ErWaitFeedClient {
    client: Client,
    scheme: String,
}

impl ErWaitFeedClient {
    /// Create a new client
    pub fn new(config: &FeedConfig) -> Result<Self> {
        Self::with_timeout(&config.scheme, config.timeout())
    }

    pub fn with_timeout(scheme: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("CareFinder/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CareFinderError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            scheme: scheme.to_string(),
        })
    }
}

#[async_trait]
impl FacilityFeed for ErWaitFeedClient {
    #[instrument(skip(self))]
    async fn fetch(&self, hostname: &str, path: &str) -> Result<Vec<FacilityRecord>> {
        let url = format!("{}://{}{}", self.scheme, hostname, path);
        let start_time = Instant::now();

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| CareFinderError::feed_unavailable(format!("request failed: {e}")))?;

        let status = response.status();
        info!("ER wait feed responded with a status code of: {}", status);

        if !status.is_success() {
            return Err(CareFinderError::feed_unavailable(format!(
                "feed responded with HTTP {status}"
            )));
        }

        let body = response.bytes().await.map_err(|e| {
            CareFinderError::feed_unavailable(format!("failed to read feed body: {e}"))
        })?;

        let records = parse_feed(&body)?;

        let elapsed = start_time.elapsed();
        info!(
            "Fetched {} facilities in {:.3}s",
            records.len(),
            elapsed.as_secs_f64()
        );
        if elapsed.as_secs() > 5 {
            warn!("Slow feed response: {:.3}s", elapsed.as_secs_f64());
        }

        Ok(records)
    }
}

// Paginated subscriber (device inventory) retrieval.
//
// The provider pages through the inventory with an opaque continuation
// token carried in the `x-soracom-next-key` response header. Each page is
// independently retryable; credential failures abort the whole fetch.

use std::time::Duration;

use tracing::{debug, warn};

use crate::client::ApiClient;
use crate::error::Error;
use crate::models::DeviceRecord;

/// Response header carrying the pagination continuation token.
pub const NEXT_KEY_HEADER: &str = "x-soracom-next-key";

/// Optional server-side filters for the subscriber listing.
#[derive(Debug, Clone, Default)]
pub struct SubscriberFilters {
    pub status_filter: Option<String>,
    pub tag_name: Option<String>,
    pub tag_value: Option<String>,
}

/// Tuning for the bulk fetch.
///
/// Backoffs are configurable so tests don't sleep for real; production
/// callers keep the defaults (2s general, 3s for connection-level faults).
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub page_size: usize,
    pub max_retries: u32,
    pub retry_backoff: Duration,
    pub connect_backoff: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            page_size: 1000,
            max_retries: 3,
            retry_backoff: Duration::from_secs(2),
            connect_backoff: Duration::from_secs(3),
        }
    }
}

impl ApiClient {
    /// Fetch one page of subscriber records.
    ///
    /// `GET /subscribers?limit=&last_evaluated_key=&status_filter=...`
    ///
    /// Returns the page plus the continuation token for the next page, if
    /// the server sent one.
    pub async fn list_subscribers_page(
        &self,
        limit: usize,
        last_key: Option<&str>,
        filters: &SubscriberFilters,
    ) -> Result<(Vec<DeviceRecord>, Option<String>), Error> {
        let mut url = self.url("subscribers")?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("limit", &limit.to_string());
            if let Some(key) = last_key {
                query.append_pair("last_evaluated_key", key);
            }
            if let Some(status) = &filters.status_filter {
                query.append_pair("status_filter", status);
            }
            if let Some(name) = &filters.tag_name {
                query.append_pair("tag_name", name);
            }
            if let Some(value) = &filters.tag_value {
                query.append_pair("tag_value", value);
            }
        }

        debug!(%url, "GET subscribers page");

        let resp = self.http().get(url).send().await.map_err(Error::Transport)?;
        let resp = Self::ensure_success(resp).await?;

        let next_key = resp
            .headers()
            .get(NEXT_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(str::to_owned);

        let records: Vec<DeviceRecord> = Self::json_body(resp).await?;
        Ok((records, next_key))
    }

    /// Fetch the full subscriber inventory.
    ///
    /// Pages until the server returns no continuation token or an empty
    /// page. Transient failures (timeouts, connection errors, non-auth HTTP
    /// errors) retry the current page up to `max_retries` times with fixed
    /// backoff; the counter resets after every successful page. Exhausting
    /// retries stops the fetch and returns whatever accumulated so far —
    /// partial inventory is considered usable. Only a 401/403 turns into
    /// a hard error, since nothing useful can follow bad credentials.
    pub async fn fetch_all_subscribers(
        &self,
        filters: &SubscriberFilters,
        opts: &FetchOptions,
    ) -> Result<Vec<DeviceRecord>, Error> {
        let mut all: Vec<DeviceRecord> = Vec::new();
        let mut last_key: Option<String> = None;
        let mut attempts = 0u32;
        let mut page = 1u32;

        loop {
            let result = self
                .list_subscribers_page(opts.page_size, last_key.as_deref(), filters)
                .await;

            match result {
                Ok((records, next_key)) => {
                    attempts = 0;
                    let page_was_empty = records.is_empty();
                    debug!(page, count = records.len(), total = all.len() + records.len(), "page retrieved");
                    all.extend(records);

                    match next_key {
                        Some(key) if !page_was_empty => {
                            last_key = Some(key);
                            page += 1;
                        }
                        _ => break,
                    }
                }
                Err(err) if err.is_auth() => return Err(err),
                Err(err) if err.is_transient() && attempts < opts.max_retries => {
                    attempts += 1;
                    let backoff = if err.is_connection_level() {
                        opts.connect_backoff
                    } else {
                        opts.retry_backoff
                    };
                    warn!(
                        page,
                        attempt = attempts,
                        max_retries = opts.max_retries,
                        error = %err,
                        "transient error fetching page, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(err) => {
                    warn!(
                        page,
                        retrieved = all.len(),
                        error = %err,
                        "giving up on page; returning partial inventory"
                    );
                    break;
                }
            }
        }

        Ok(all)
    }
}

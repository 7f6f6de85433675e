use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};

use dossier_enrich::{Clock, SystemClock};
use urlscan_client::{UrlscanClient, UrlscanError, Visibility};

use crate::lookup::{Lookup, LookupOutcome};

const SEARCH_SIZE: u32 = 5;
const SETTLE_DELAY: Duration = Duration::from_secs(15);

/// Existing urlscan.io scans for a domain, or a fresh one when there are none.
pub struct ScanLookup {
    client: UrlscanClient,
    api_key: Option<String>,
    clock: Arc<dyn Clock>,
    settle_delay: Duration,
}

impl ScanLookup {
    pub fn new(client: UrlscanClient, api_key: Option<String>) -> Self {
        Self::with_clock(client, api_key, Arc::new(SystemClock))
    }

    pub fn with_clock(client: UrlscanClient, api_key: Option<String>, clock: Arc<dyn Clock>) -> Self {
        Self {
            client,
            api_key,
            clock,
            settle_delay: SETTLE_DELAY,
        }
    }

    async fn fresh_scan(&self, api_key: &str, domain: &str) -> Result<Option<Value>> {
        let target = format!("https://{domain}");
        let submitted = match self.client.submit(api_key, &target, Visibility::Public).await {
            Ok(submitted) => submitted,
            Err(e) if is_expected(&e) => {
                debug!(domain, error = %e, "urlscan submission failed");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        info!(domain, uuid = %submitted.uuid, "Submitted scan, waiting for result");
        self.clock.sleep(self.settle_delay).await;

        match self.client.result_raw(&submitted.uuid).await {
            Ok(result) => Ok(Some(result)),
            Err(e) if is_expected(&e) => {
                debug!(domain, error = %e, "urlscan result not available");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl Lookup for ScanLookup {
    fn name(&self) -> &'static str {
        "urlscan"
    }

    fn file_suffix(&self) -> &'static str {
        "urlscan"
    }

    async fn lookup(&self, domain: &str) -> Result<LookupOutcome> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Ok(LookupOutcome::Skipped("no urlscan API key".into()));
        };

        let hits = match self.client.search_domain_raw(domain, SEARCH_SIZE).await {
            Ok(hits) => hits,
            Err(e) if is_expected(&e) => {
                debug!(domain, error = %e, "urlscan search failed");
                Vec::new()
            }
            Err(e) => return Err(e.into()),
        };

        if !hits.is_empty() {
            info!(domain, scans = hits.len(), "Found existing scans");
            return Ok(LookupOutcome::Found(Value::Array(hits)));
        }

        info!(domain, "No existing scans, submitting a new one");
        Ok(match self.fresh_scan(api_key, domain).await? {
            Some(result) => LookupOutcome::Found(Value::Array(vec![result])),
            None => LookupOutcome::NotFound,
        })
    }
}

/// Failures that mean "nothing to report" rather than a broken setup.
fn is_expected(e: &UrlscanError) -> bool {
    e.is_transient() || matches!(e, UrlscanError::RateLimited { .. })
}

// Enrichment sources: the trait the batch driver consumes and the urlscan-backed
// implementation.
//
// A source never fails for "expected" trouble. Timeouts, malformed bodies, rate limits
// that outlast the retry budget and unscannable targets all come back as `Ok(None)`.
// Only unexpected responses (bad credentials, forbidden) surface as `Err`.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, info, warn};

use urlscan_client::{UrlscanClient, UrlscanError, Visibility};

use crate::clock::{Clock, SystemClock};
use crate::keys::KeyRing;
use crate::limiter::RateLimiter;
use crate::merge::EnrichmentResult;

#[async_trait]
pub trait EnrichmentSource: Send + Sync {
    /// Look for existing work on the remote side. Never creates new scans.
    async fn search(&self, domain: &str) -> Result<Option<EnrichmentResult>>;

    /// Request a fresh scan and wait for it to settle.
    async fn submit(&self, domain: &str) -> Result<Option<EnrichmentResult>>;

    /// Whether `submit` has the credentials it needs.
    fn can_submit(&self) -> bool;
}

/// How rate-limit responses are retried.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            backoff: Duration::from_secs(60),
        }
    }
}

const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(500);
const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(15);

pub struct UrlscanSource {
    client: UrlscanClient,
    keys: KeyRing,
    clock: Arc<dyn Clock>,
    limiter: RateLimiter,
    retry: RetryPolicy,
    settle_delay: Duration,
    visibility: Visibility,
}

impl UrlscanSource {
    pub fn new(client: UrlscanClient, keys: Vec<String>) -> Self {
        Self::with_clock(client, keys, Arc::new(SystemClock))
    }

    pub fn with_clock(client: UrlscanClient, keys: Vec<String>, clock: Arc<dyn Clock>) -> Self {
        Self {
            client,
            keys: KeyRing::new(keys),
            limiter: RateLimiter::new(DEFAULT_MIN_INTERVAL, clock.clone()),
            clock,
            retry: RetryPolicy::default(),
            settle_delay: DEFAULT_SETTLE_DELAY,
            visibility: Visibility::Public,
        }
    }

    pub fn retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    pub fn min_interval(mut self, interval: Duration) -> Self {
        self.limiter = RateLimiter::new(interval, self.clock.clone());
        self
    }

    /// Throttle, call, and retry on 429 up to the policy's attempt budget.
    async fn call<T, F, Fut>(&self, what: &str, domain: &str, mut op: F) -> urlscan_client::Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = urlscan_client::Result<T>>,
    {
        let mut attempt = 1;
        loop {
            self.limiter.acquire().await;
            match op().await {
                Err(UrlscanError::RateLimited { .. }) if attempt < self.retry.max_attempts => {
                    warn!(
                        domain,
                        what,
                        attempt,
                        backoff_secs = self.retry.backoff.as_secs(),
                        "Rate limited, backing off"
                    );
                    self.clock.sleep(self.retry.backoff).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    async fn detail(&self, domain: &str, uuid: &str) -> Result<Option<EnrichmentResult>> {
        let result = self
            .call("result", domain, || self.client.result(uuid))
            .await;
        settle(domain, "result", result.map(|r| r.into_summary(uuid).into()))
    }
}

#[async_trait]
impl EnrichmentSource for UrlscanSource {
    async fn search(&self, domain: &str) -> Result<Option<EnrichmentResult>> {
        let hits = self
            .call("search", domain, || self.client.search_domain(domain, 1))
            .await;
        let Some(hits) = settle(domain, "search", hits)? else {
            return Ok(None);
        };

        let Some(hit) = hits.into_iter().next() else {
            return Ok(None);
        };
        if let Some(summary) = hit.summary() {
            return Ok(Some(summary.into()));
        }
        match hit.id {
            Some(uuid) => self.detail(domain, &uuid).await,
            None => Ok(None),
        }
    }

    async fn submit(&self, domain: &str) -> Result<Option<EnrichmentResult>> {
        let Some(api_key) = self.keys.next_key() else {
            warn!(domain, "No API key available for submitting new scans");
            return Ok(None);
        };

        let target = format!("https://{domain}");
        let submitted = self
            .call("submit", domain, || {
                self.client.submit(api_key, &target, self.visibility)
            })
            .await;
        let Some(submitted) = settle(domain, "submit", submitted)? else {
            return Ok(None);
        };

        info!(domain, uuid = %submitted.uuid, "Submitted scan, waiting for result");
        self.clock.sleep(self.settle_delay).await;
        self.detail(domain, &submitted.uuid).await
    }

    fn can_submit(&self) -> bool {
        !self.keys.is_empty()
    }
}

/// Fold expected failures into "not found"; keep the rest as errors.
fn settle<T>(domain: &str, what: &str, result: urlscan_client::Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(UrlscanError::RateLimited { .. }) => {
            warn!(domain, what, "Still rate limited after retry, skipping");
            Ok(None)
        }
        Err(e) if e.is_transient() => {
            debug!(domain, what, error = %e, "urlscan lookup failed");
            Ok(None)
        }
        Err(e) => Err(anyhow::Error::new(e).context(format!("urlscan {what} for {domain}"))),
    }
}

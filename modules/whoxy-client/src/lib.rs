pub mod error;
pub mod types;

pub use error::{Result, WhoxyError};
pub use types::{ReverseKind, ReversePage, WhoisRecord, WhoisSummary};

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;

const BASE_URL: &str = "https://api.whoxy.com";

pub struct WhoxyClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl WhoxyClient {
    pub fn new(api_key: String) -> Result<Self> {
        Self::with_base_url(BASE_URL, api_key)
    }

    pub fn with_base_url(base_url: &str, api_key: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// WHOIS record for a single domain.
    pub async fn whois(&self, domain: &str) -> Result<WhoisRecord> {
        self.get(&[("whois", domain)]).await
    }

    /// One page of domains whose registrant matches `query`.
    pub async fn reverse(&self, kind: ReverseKind, query: &str, page: u64) -> Result<ReversePage> {
        let page = page.to_string();
        self.get(&[
            ("reverse", "whois"),
            (kind.as_param(), query),
            ("page", page.as_str()),
        ])
        .await
    }

    /// Every domain registered with `email`, following pagination until
    /// `total_results` rows have been fetched or a page comes back empty.
    /// A failure on the first page is an error; a later failure keeps the rows
    /// fetched so far.
    pub async fn domains_by_email(&self, email: &str) -> Result<Vec<WhoisRecord>> {
        let mut all = Vec::new();
        let mut page = 1;

        loop {
            tracing::debug!(email, page, "Fetching reverse WHOIS page");
            let batch = match self.reverse(ReverseKind::Email, email, page).await {
                Ok(batch) => batch,
                Err(e) if page > 1 => {
                    tracing::warn!(
                        email,
                        page,
                        fetched = all.len(),
                        error = %e,
                        "Reverse WHOIS page failed, keeping partial results"
                    );
                    break;
                }
                Err(e) => return Err(e),
            };
            if batch.search_result.is_empty() {
                break;
            }

            all.extend(batch.search_result);
            tracing::info!(email, fetched = all.len(), total = batch.total_results, "Reverse WHOIS progress");

            if all.len() as u64 >= batch.total_results {
                break;
            }
            page += 1;
        }

        Ok(all)
    }

    async fn get<T: DeserializeOwned>(&self, params: &[(&str, &str)]) -> Result<T> {
        let resp = self
            .client
            .get(&self.base_url)
            .query(&[("key", self.api_key.as_str())])
            .query(params)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(WhoxyError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: Value = serde_json::from_str(&resp.text().await?)?;
        if body.get("status").and_then(Value::as_i64) != Some(1) {
            let reason = body
                .get("status_reason")
                .and_then(Value::as_str)
                .unwrap_or("Unknown error");
            return Err(WhoxyError::Lookup(reason.to_string()));
        }

        Ok(serde_json::from_value(body)?)
    }
}

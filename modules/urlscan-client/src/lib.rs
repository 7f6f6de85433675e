pub mod error;
pub mod types;

pub use error::{Result, UrlscanError};
pub use types::{
    screenshot_url, PageInfo, ScanResult, ScanSummary, SearchHit, SubmitRequest, SubmitResponse,
    Visibility,
};

use std::time::Duration;

use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use types::SearchResponse;

const BASE_URL: &str = "https://urlscan.io/api/v1";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

pub struct UrlscanClient {
    client: reqwest::Client,
    base_url: String,
}

impl UrlscanClient {
    pub fn new() -> Result<Self> {
        Self::with_base_url(BASE_URL)
    }

    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Existing scans for a domain, newest first.
    pub async fn search_domain(&self, domain: &str, size: u32) -> Result<Vec<SearchHit>> {
        self.search(&format!("domain:{domain}"), size).await
    }

    /// Same query as [`search_domain`](Self::search_domain) but keeps the raw hit documents.
    pub async fn search_domain_raw(
        &self,
        domain: &str,
        size: u32,
    ) -> Result<Vec<serde_json::Value>> {
        self.search(&format!("domain:{domain}"), size).await
    }

    async fn search<T: DeserializeOwned>(&self, query: &str, size: u32) -> Result<Vec<T>> {
        let url = format!("{}/search/", self.base_url);
        let size = size.to_string();
        let resp = self
            .client
            .get(&url)
            .query(&[("q", query), ("size", size.as_str())])
            .send()
            .await?;

        let resp = check_status(resp).await?;
        let body: SearchResponse<T> = resp.json().await?;
        tracing::debug!(query, hits = body.results.len(), "urlscan search");
        Ok(body.results)
    }

    /// Fetch the full scan record. urlscan answers 404 while a scan is still running.
    pub async fn result(&self, uuid: &str) -> Result<ScanResult> {
        self.result_as(uuid).await
    }

    pub async fn result_raw(&self, uuid: &str) -> Result<serde_json::Value> {
        self.result_as(uuid).await
    }

    async fn result_as<T: DeserializeOwned>(&self, uuid: &str) -> Result<T> {
        let url = format!("{}/result/{}/", self.base_url, uuid);
        let resp = self.client.get(&url).send().await?;
        let resp = check_status(resp).await?;
        Ok(resp.json().await?)
    }

    /// Ask urlscan to scan a new URL. Requires an API key.
    pub async fn submit(
        &self,
        api_key: &str,
        target_url: &str,
        visibility: Visibility,
    ) -> Result<SubmitResponse> {
        let url = format!("{}/scan/", self.base_url);
        let body = SubmitRequest {
            url: target_url.to_string(),
            visibility,
        };

        let resp = self
            .client
            .post(&url)
            .header("API-Key", api_key)
            .json(&body)
            .send()
            .await?;

        if resp.status() == StatusCode::BAD_REQUEST {
            let message = resp.text().await.unwrap_or_default();
            return Err(UrlscanError::NotScannable(message));
        }

        let resp = check_status(resp).await?;
        let submitted: SubmitResponse = resp.json().await?;
        tracing::debug!(uuid = %submitted.uuid, target_url, "urlscan scan submitted");
        Ok(submitted)
    }
}

async fn check_status(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = resp
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());
        return Err(UrlscanError::RateLimited { retry_after });
    }

    let message = resp.text().await.unwrap_or_default();
    Err(UrlscanError::Api {
        status: status.as_u16(),
        message,
    })
}

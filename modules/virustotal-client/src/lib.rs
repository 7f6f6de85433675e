pub mod error;

pub use error::{Result, VirusTotalError};

use std::time::Duration;

use serde_json::Value;

const BASE_URL: &str = "https://www.virustotal.com/api/v3";

pub struct VirusTotalClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl VirusTotalClient {
    pub fn new(api_key: String) -> Result<Self> {
        Self::with_base_url(BASE_URL, api_key)
    }

    pub fn with_base_url(base_url: &str, api_key: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(20))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Full domain report as returned by `/domains/{domain}`. `None` when VirusTotal
    /// has never seen the domain.
    pub async fn domain_report(&self, domain: &str) -> Result<Option<Value>> {
        let url = format!("{}/domains/{}", self.base_url, domain);
        let resp = self
            .client
            .get(&url)
            .header("x-apikey", &self.api_key)
            .send()
            .await?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(VirusTotalError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(Some(resp.json().await?))
    }
}

/// Number of engines flagging the domain in the last analysis.
pub fn malicious_detections(report: &Value) -> u64 {
    report
        .pointer("/data/attributes/last_analysis_stats/malicious")
        .and_then(Value::as_u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_malicious_count() {
        let report = json!({
            "data": { "attributes": { "last_analysis_stats": { "malicious": 4, "harmless": 60 } } }
        });
        assert_eq!(malicious_detections(&report), 4);
    }

    #[test]
    fn missing_stats_count_as_clean() {
        assert_eq!(malicious_detections(&json!({ "data": {} })), 0);
    }
}

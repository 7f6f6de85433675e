pub mod error;

pub use error::{CrtshError, Result};

use std::collections::BTreeSet;
use std::time::Duration;

use serde::Deserialize;

const BASE_URL: &str = "https://crt.sh";

const USER_AGENT: &str = "Mozilla/5.0 (compatible; dossier/0.1)";

/// One certificate log entry. `name_value` holds every SAN, newline separated.
#[derive(Debug, Clone, Deserialize)]
pub struct CertEntry {
    #[serde(default)]
    pub name_value: String,
    pub issuer_name: Option<String>,
    pub not_before: Option<String>,
    pub not_after: Option<String>,
}

pub struct CrtshClient {
    client: reqwest::Client,
    base_url: String,
}

impl CrtshClient {
    pub fn new() -> Result<Self> {
        Self::with_base_url(BASE_URL)
    }

    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(20))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Raw certificate entries matching `%.domain`.
    pub async fn entries(&self, domain: &str) -> Result<Vec<CertEntry>> {
        let pattern = format!("%.{domain}");
        let resp = self
            .client
            .get(format!("{}/", self.base_url))
            .query(&[("q", pattern.as_str()), ("output", "json")])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(CrtshError::Api {
                status: status.as_u16(),
                message,
            });
        }

        // crt.sh serves an HTML error page with status 200 when overloaded.
        let body = resp.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Sorted, deduplicated, lowercased subdomains. Wildcard names are dropped.
    pub async fn subdomains(&self, domain: &str) -> Result<Vec<String>> {
        let entries = self.entries(domain).await?;
        let subdomains = collect_subdomains(&entries);
        tracing::debug!(domain, count = subdomains.len(), "crt.sh subdomains");
        Ok(subdomains)
    }
}

pub fn collect_subdomains(entries: &[CertEntry]) -> Vec<String> {
    let mut names = BTreeSet::new();
    for entry in entries {
        for name in entry.name_value.split('\n') {
            let name = name.trim();
            if name.is_empty() || name.contains('*') {
                continue;
            }
            names.insert(name.to_lowercase());
        }
    }
    names.into_iter().collect()
}

//! Reverse WHOIS over a list of registrant emails.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{error, info, warn};

use whoxy_client::{WhoisRecord, WhoxyClient};

/// Domains found for one email.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EmailDomains {
    pub total_domains: usize,
    pub domains: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub registrars: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub raw_data: Vec<WhoisRecord>,
}

impl EmailDomains {
    pub fn from_records(records: Vec<WhoisRecord>) -> Self {
        let domains = records
            .iter()
            .filter_map(|r| r.domain_name.clone())
            .collect();
        let registrars: BTreeSet<String> = records
            .iter()
            .filter_map(|r| r.registrar_name())
            .filter(|name| !name.is_empty())
            .map(String::from)
            .collect();

        Self {
            total_domains: records.len(),
            domains,
            registrars: registrars.into_iter().collect(),
            raw_data: records,
        }
    }
}

pub type BulkEmailResults = BTreeMap<String, EmailDomains>;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BulkEmailSummary {
    pub emails: usize,
    pub domains: usize,
    pub errors: usize,
}

impl fmt::Display for BulkEmailSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "emails={} domains={} errors={}",
            self.emails, self.domains, self.errors
        )
    }
}

/// Lines containing `@`, trimmed and lowercased.
pub fn read_emails(path: &Path) -> Result<Vec<String>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading email list {}", path.display()))?;
    Ok(raw
        .lines()
        .map(|line| line.trim().to_lowercase())
        .filter(|line| line.contains('@'))
        .collect())
}

/// Every domain registered to each email. An email whose lookup fails is recorded with
/// zero domains and counted as an error.
pub async fn bulk_email(
    client: &WhoxyClient,
    emails: &[String],
) -> (BulkEmailResults, BulkEmailSummary) {
    let mut results = BulkEmailResults::new();
    let mut summary = BulkEmailSummary::default();
    let total = emails.len();

    for (i, email) in emails.iter().enumerate() {
        let progress = format!("[{}/{}]", i + 1, total);
        info!(progress = %progress, email = %email, "Looking up");

        let records = match client.domains_by_email(email).await {
            Ok(records) => records,
            Err(e) => {
                summary.errors += 1;
                error!(email = %email, error = %e, "Reverse WHOIS failed");
                Vec::new()
            }
        };

        if records.is_empty() {
            warn!(email = %email, "No domains found");
        } else {
            info!(email = %email, domains = records.len(), "Found domains");
        }

        let entry = EmailDomains::from_records(records);
        summary.domains += entry.total_domains;
        results.insert(email.clone(), entry);
    }

    summary.emails = results.len();
    info!("Bulk email lookup complete. {summary}");
    (results, summary)
}

/// One row per domain: `email,domain,registrar,created,expires`.
pub fn export_csv(results: &BulkEmailResults, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    writer.write_record(["email", "domain", "registrar", "created", "expires"])?;

    for (email, found) in results {
        for record in &found.raw_data {
            writer.write_record([
                email.as_str(),
                record.domain_name.as_deref().unwrap_or_default(),
                record.registrar_name().unwrap_or_default(),
                record.create_date.as_deref().unwrap_or_default(),
                record.expiry_date.as_deref().unwrap_or_default(),
            ])?;
        }
    }

    writer.flush()?;
    info!(path = %path.display(), "CSV exported");
    Ok(())
}

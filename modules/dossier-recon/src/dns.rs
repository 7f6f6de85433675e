use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info};
use trust_dns_resolver::config::{ResolverConfig, ResolverOpts};
use trust_dns_resolver::proto::rr::RecordType;
use trust_dns_resolver::TokioAsyncResolver;

use crate::lookup::{Lookup, LookupOutcome};

/// A, MX, TXT and NS answers in presentation form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DnsRecords {
    #[serde(rename = "A")]
    pub a: Vec<String>,
    #[serde(rename = "MX")]
    pub mx: Vec<String>,
    #[serde(rename = "TXT")]
    pub txt: Vec<String>,
    #[serde(rename = "NS")]
    pub ns: Vec<String>,
}

impl DnsRecords {
    pub fn is_empty(&self) -> bool {
        self.a.is_empty() && self.mx.is_empty() && self.txt.is_empty() && self.ns.is_empty()
    }
}

pub struct DnsLookup {
    resolver: TokioAsyncResolver,
}

impl DnsLookup {
    pub fn new() -> Self {
        Self {
            resolver: TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default()),
        }
    }

    pub async fn records(&self, domain: &str) -> DnsRecords {
        DnsRecords {
            a: self.query(domain, RecordType::A).await,
            mx: self.query(domain, RecordType::MX).await,
            txt: self.query(domain, RecordType::TXT).await,
            ns: self.query(domain, RecordType::NS).await,
        }
    }

    /// A failed query is an empty answer.
    async fn query(&self, domain: &str, record_type: RecordType) -> Vec<String> {
        match self.resolver.lookup(domain, record_type).await {
            Ok(answer) => answer
                .iter()
                .map(|rdata| strip_quotes(&rdata.to_string()))
                .collect(),
            Err(e) => {
                debug!(domain, %record_type, error = %e, "DNS query failed");
                Vec::new()
            }
        }
    }
}

impl Default for DnsLookup {
    fn default() -> Self {
        Self::new()
    }
}

/// TXT data is presented quoted; store it bare.
pub fn strip_quotes(text: &str) -> String {
    text.trim().trim_matches('"').to_string()
}

#[async_trait]
impl Lookup for DnsLookup {
    fn name(&self) -> &'static str {
        "dns"
    }

    fn file_suffix(&self) -> &'static str {
        "dns"
    }

    async fn lookup(&self, domain: &str) -> Result<LookupOutcome> {
        let records = self.records(domain).await;
        if records.is_empty() {
            info!(domain, "No DNS records found");
            return Ok(LookupOutcome::NotFound);
        }
        info!(
            domain,
            a = records.a.len(),
            mx = records.mx.len(),
            txt = records.txt.len(),
            ns = records.ns.len(),
            "DNS records found"
        );
        Ok(LookupOutcome::Found(serde_json::to_value(&records)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn txt_quotes_are_removed() {
        assert_eq!(strip_quotes("\"v=spf1 -all\""), "v=spf1 -all");
        assert_eq!(strip_quotes("10 mail.example.com."), "10 mail.example.com.");
    }

    #[test]
    fn records_serialize_with_upper_case_keys() {
        let records = DnsRecords {
            a: vec!["93.184.216.34".into()],
            ..Default::default()
        };
        let value = serde_json::to_value(&records).unwrap();
        assert_eq!(value["A"][0], "93.184.216.34");
        assert_eq!(value["MX"], serde_json::json!([]));
        assert!(!records.is_empty());
        assert!(DnsRecords::default().is_empty());
    }
}

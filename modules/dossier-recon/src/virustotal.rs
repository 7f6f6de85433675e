use anyhow::Result;
use async_trait::async_trait;
use tracing::{info, warn};

use virustotal_client::{malicious_detections, VirusTotalClient};

use crate::lookup::{Lookup, LookupOutcome};

/// VirusTotal domain reputation. Without an API key the lookup is skipped.
pub struct ReputationLookup {
    client: Option<VirusTotalClient>,
}

impl ReputationLookup {
    pub fn new(client: Option<VirusTotalClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Lookup for ReputationLookup {
    fn name(&self) -> &'static str {
        "virustotal"
    }

    fn file_suffix(&self) -> &'static str {
        "virustotal"
    }

    async fn lookup(&self, domain: &str) -> Result<LookupOutcome> {
        let Some(client) = &self.client else {
            return Ok(LookupOutcome::Skipped("no VirusTotal API key".into()));
        };

        let Some(report) = client.domain_report(domain).await? else {
            info!(domain, "VirusTotal has no data");
            return Ok(LookupOutcome::NotFound);
        };

        let malicious = malicious_detections(&report);
        if malicious > 0 {
            warn!(domain, malicious, "MALICIOUS: VirusTotal detections");
        } else {
            info!(domain, "VirusTotal: clean");
        }
        Ok(LookupOutcome::Found(report))
    }
}

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use tracing::{info, warn};

use crtsh_client::CrtshClient;

use crate::lookup::{Lookup, LookupOutcome};

/// Subdomains seen in certificate transparency logs.
pub struct SubdomainLookup {
    client: CrtshClient,
}

impl SubdomainLookup {
    pub fn new(client: CrtshClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Lookup for SubdomainLookup {
    fn name(&self) -> &'static str {
        "crt.sh"
    }

    fn file_suffix(&self) -> &'static str {
        "subdomains"
    }

    async fn lookup(&self, domain: &str) -> Result<LookupOutcome> {
        // crt.sh is flaky enough that any failure just means "nothing learned".
        let subdomains = match self.client.subdomains(domain).await {
            Ok(subdomains) => subdomains,
            Err(e) => {
                warn!(domain, error = %e, "crt.sh lookup failed");
                Vec::new()
            }
        };

        if subdomains.is_empty() {
            info!(domain, "No subdomains found");
            return Ok(LookupOutcome::NotFound);
        }
        info!(domain, count = subdomains.len(), "Subdomains found");
        Ok(LookupOutcome::Found(Value::from(subdomains)))
    }
}

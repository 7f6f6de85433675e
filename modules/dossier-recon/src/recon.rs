use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{error, info, warn};

use crtsh_client::CrtshClient;
use dossier_common::Config;
use urlscan_client::UrlscanClient;
use virustotal_client::VirusTotalClient;

use crate::blocklist::Blocklist;
use crate::dns::DnsLookup;
use crate::lookup::{Lookup, LookupOutcome};
use crate::subdomains::SubdomainLookup;
use crate::urlscan::ScanLookup;
use crate::virustotal::ReputationLookup;

const SEED_TARGETS: &str = "google.com\nexample.com";

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconSummary {
    pub targets: u64,
    pub files_written: u64,
    pub skipped: u64,
    pub errors: u64,
}

impl fmt::Display for ReconSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "targets={} files_written={} skipped={} errors={}",
            self.targets, self.files_written, self.skipped, self.errors,
        )
    }
}

/// Read one target per line, ignoring blank lines. A missing file is created with a
/// couple of sample targets and `None` is returned so the caller can stop there.
pub fn load_targets(path: &Path) -> Result<Option<Vec<String>>> {
    if !path.exists() {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        fs::write(path, SEED_TARGETS)
            .with_context(|| format!("creating target list {}", path.display()))?;
        warn!(path = %path.display(), "Target list created. Add targets there and run again.");
        return Ok(None);
    }

    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading target list {}", path.display()))?;
    Ok(Some(
        raw.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect(),
    ))
}

/// Pretty-printed JSON, creating parent directories as needed.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    let body = serde_json::to_string_pretty(value)?;
    fs::write(path, body).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

/// The full lookup chain in run order: blocklists, DNS, certificates, VirusTotal, urlscan.
pub fn standard_lookups(config: &Config) -> Result<Vec<Box<dyn Lookup>>> {
    let virustotal = config
        .virustotal_api_key
        .clone()
        .map(VirusTotalClient::new)
        .transpose()?;

    let mut lookups: Vec<Box<dyn Lookup>> = Vec::new();
    lookups.push(Box::new(Blocklist::new(&config.cache_dir)?));
    lookups.push(Box::new(DnsLookup::new()));
    lookups.push(Box::new(SubdomainLookup::new(CrtshClient::new()?)));
    lookups.push(Box::new(ReputationLookup::new(virustotal)));
    lookups.push(Box::new(ScanLookup::new(
        UrlscanClient::new()?,
        config.urlscan_api_keys.first().cloned(),
    )));
    Ok(lookups)
}

/// Runs every lookup against every target and writes what they find.
pub struct Recon {
    lookups: Vec<Box<dyn Lookup>>,
    output_dir: PathBuf,
}

impl Recon {
    pub fn new(lookups: Vec<Box<dyn Lookup>>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            lookups,
            output_dir: output_dir.into(),
        }
    }

    pub fn output_path(&self, domain: &str, suffix: &str) -> PathBuf {
        self.output_dir.join(format!("{domain}_{suffix}.json"))
    }

    /// Targets are processed one at a time. A failing lookup is logged and counted;
    /// it never stops the other lookups or targets.
    pub async fn run(&self, targets: &[String]) -> Result<ReconSummary> {
        fs::create_dir_all(&self.output_dir).with_context(|| {
            format!("creating output directory {}", self.output_dir.display())
        })?;

        info!(targets = targets.len(), "Loaded targets");
        let mut summary = ReconSummary::default();

        for domain in targets {
            summary.targets += 1;
            info!(domain = %domain, "ANALYZING");

            for lookup in &self.lookups {
                match lookup.lookup(domain).await {
                    Ok(LookupOutcome::Found(value)) => {
                        let path = self.output_path(domain, lookup.file_suffix());
                        match write_json(&path, &value) {
                            Ok(()) => summary.files_written += 1,
                            Err(e) => {
                                summary.errors += 1;
                                error!(lookup = lookup.name(), domain = %domain, error = %e, "Failed to write result");
                            }
                        }
                    }
                    Ok(LookupOutcome::NotFound) => {}
                    Ok(LookupOutcome::Skipped(reason)) => {
                        summary.skipped += 1;
                        warn!(lookup = lookup.name(), reason = %reason, "Skipping");
                    }
                    Err(e) => {
                        summary.errors += 1;
                        error!(lookup = lookup.name(), domain = %domain, error = %e, "Lookup failed");
                    }
                }
            }
        }

        info!("Recon complete. {summary}");
        Ok(summary)
    }
}

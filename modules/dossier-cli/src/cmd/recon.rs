use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Subcommand;
use serde_json::Value;
use tracing::info;

use crtsh_client::CrtshClient;
use dossier_common::Config;
use dossier_recon::{load_targets, standard_lookups, Blocklist, DnsLookup, Recon};
use virustotal_client::{malicious_detections, VirusTotalClient};

use super::print_json;

#[derive(Subcommand)]
pub enum BlocklistCommand {
    /// Check one domain against the cached lists
    Check { domain: String },

    /// Download every list and rebuild the cache
    Update,
}

pub async fn scan(config: &Config, input: Option<PathBuf>, output: Option<PathBuf>) -> Result<()> {
    let input = input.unwrap_or_else(|| config.input_file.clone());
    let output = output.unwrap_or_else(|| config.output_dir.clone());

    let Some(targets) = load_targets(&input)? else {
        return Ok(());
    };

    let recon = Recon::new(standard_lookups(config)?, &output);
    recon.run(&targets).await?;
    info!(output = %output.display(), "All scans completed");
    Ok(())
}

pub async fn blocklist(config: &Config, command: BlocklistCommand) -> Result<()> {
    let blocklist = Blocklist::new(&config.cache_dir)?;
    match command {
        BlocklistCommand::Check { domain } => {
            let blocked = blocklist.check(&domain).await?;
            println!("{}", if blocked { "Blocked" } else { "Clean" });
        }
        BlocklistCommand::Update => {
            let count = blocklist.update().await?;
            println!("Updated. {count} domains cached.");
        }
    }
    Ok(())
}

pub async fn dns(domain: &str) -> Result<()> {
    let records = DnsLookup::new().records(domain).await;
    print_json(&serde_json::to_value(&records)?)
}

pub async fn crtsh(domain: &str) -> Result<()> {
    let subdomains = CrtshClient::new()?
        .subdomains(domain)
        .await
        .with_context(|| format!("crt.sh lookup for {domain}"))?;
    print_json(&Value::from(subdomains))
}

pub async fn virustotal(config: &Config, domain: &str) -> Result<()> {
    let key = config
        .virustotal_api_key
        .clone()
        .context("VIRUSTOTAL_API_KEY is not set")?;
    let client = VirusTotalClient::new(key)?;

    match client.domain_report(domain).await? {
        Some(report) => {
            info!(domain, malicious = malicious_detections(&report), "VirusTotal report");
            print_json(&report)
        }
        None => {
            println!("VirusTotal has no data for {domain}");
            Ok(())
        }
    }
}

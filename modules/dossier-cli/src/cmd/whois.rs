use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, ValueEnum};
use tracing::{info, warn};

use dossier_common::Config;
use dossier_recon::{bulk_email as lookup_emails, export_csv, read_emails, write_json};
use whoxy_client::{ReverseKind, WhoisRecord, WhoxyClient};

use super::print_json;

const PREVIEW: usize = 20;

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ReverseBy {
    Email,
    Name,
    Company,
}

impl From<ReverseBy> for ReverseKind {
    fn from(by: ReverseBy) -> Self {
        match by {
            ReverseBy::Email => ReverseKind::Email,
            ReverseBy::Name => ReverseKind::Name,
            ReverseBy::Company => ReverseKind::Company,
        }
    }
}

#[derive(Args, Debug)]
pub struct ReverseArgs {
    #[arg(value_enum)]
    pub by: ReverseBy,

    pub query: String,

    /// Save the full result as JSON
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct BulkEmailArgs {
    /// File with one email per line
    pub file: PathBuf,

    #[arg(short, long, default_value = "whoxy_results.json")]
    pub output: PathBuf,

    /// Also export one row per domain as CSV
    #[arg(long)]
    pub csv: Option<PathBuf>,
}

fn client(config: &Config) -> Result<WhoxyClient> {
    let key = config.require_whoxy_key()?;
    Ok(WhoxyClient::new(key.to_string())?)
}

pub async fn whois(config: &Config, domain: &str) -> Result<()> {
    let record = client(config)?.whois(domain).await?;
    print_json(&serde_json::to_value(record.summary())?)
}

pub async fn reverse(config: &Config, args: ReverseArgs) -> Result<()> {
    let client = client(config)?;

    // Email searches follow every page; name and company searches stop at the first.
    let (records, total) = match args.by {
        ReverseBy::Email => {
            let records = client.domains_by_email(&args.query).await?;
            let total = records.len() as u64;
            (records, total)
        }
        by => {
            let page = client.reverse(by.into(), &args.query, 1).await?;
            (page.search_result, page.total_results)
        }
    };

    if records.is_empty() {
        warn!(query = %args.query, "No domains found");
        return Ok(());
    }

    info!(query = %args.query, total, "Found domains");
    for line in preview_lines(&records, total) {
        println!("{line}");
    }

    if let Some(path) = args.output {
        write_json(&path, &records)?;
        info!(path = %path.display(), "Full results saved");
    }
    Ok(())
}

pub async fn bulk_email(config: &Config, args: BulkEmailArgs) -> Result<()> {
    let client = client(config)?;
    let emails = read_emails(&args.file)?;
    info!(emails = emails.len(), "Loaded emails");

    let (results, summary) = lookup_emails(&client, &emails).await;
    write_json(&args.output, &results)?;
    info!(path = %args.output.display(), "Results saved");

    if let Some(csv) = args.csv {
        export_csv(&results, &csv)?;
    }
    info!("Total: {} domains across {} emails", summary.domains, summary.emails);
    Ok(())
}

/// `  - domain (created)` for the first few rows, then how many were left out.
fn preview_lines(records: &[WhoisRecord], total: u64) -> Vec<String> {
    let mut lines: Vec<String> = records
        .iter()
        .take(PREVIEW)
        .map(|r| {
            format!(
                "  - {} ({})",
                r.domain_name.as_deref().unwrap_or("?"),
                r.create_date.as_deref().unwrap_or("N/A")
            )
        })
        .collect();
    if total > PREVIEW as u64 {
        lines.push(format!("  ... and {} more", total - PREVIEW as u64));
    }
    lines
}

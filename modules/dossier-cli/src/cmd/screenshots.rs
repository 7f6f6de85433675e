use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use tracing::{info, warn};

use dossier_common::{Config, JsonFileStore};
use dossier_enrich::{find_gaps, EnrichConfig, Enricher, Gap, Interrupt, UrlscanSource};
use urlscan_client::UrlscanClient;

const DRY_RUN_PREVIEW: usize = 20;

#[derive(Args, Debug)]
pub struct ScreenshotsArgs {
    /// Record store to update (defaults to DOSSIER_DATA_FILE)
    #[arg(long)]
    pub data_file: Option<PathBuf>,

    /// Process at most this many domains
    #[arg(long)]
    pub limit: Option<usize>,

    /// List the domains that would be processed and exit
    #[arg(long)]
    pub dry_run: bool,

    /// Submit new scans for domains urlscan has never seen (needs an API key)
    #[arg(long)]
    pub submit: bool,
}

pub async fn run(config: &Config, args: ScreenshotsArgs) -> Result<()> {
    let path = args.data_file.unwrap_or_else(|| config.data_file.clone());
    let file_store = Arc::new(JsonFileStore::new(path));
    let mut store = file_store
        .load()
        .with_context(|| format!("loading {}", file_store.path().display()))?;

    let mut gaps = find_gaps(&store);
    info!(people = store.emails.len(), missing = gaps.len(), "Domains without screenshots");

    if let Some(limit) = args.limit {
        gaps.truncate(limit);
    }
    if gaps.is_empty() {
        info!("No domains to enrich, the store is still saved once");
    }

    if args.dry_run {
        for line in dry_run_lines(&gaps) {
            println!("{line}");
        }
        return Ok(());
    }

    if args.submit && config.urlscan_api_keys.is_empty() {
        warn!("--submit given but no urlscan API key is configured, searching only");
    }

    let interrupt = Interrupt::new();
    watch_ctrl_c(interrupt.clone());

    let source = UrlscanSource::new(UrlscanClient::new()?, config.urlscan_api_keys.clone());
    let enricher = Enricher::new(
        Arc::new(source),
        file_store.clone(),
        EnrichConfig {
            submit: args.submit,
            ..EnrichConfig::default()
        },
        interrupt,
    );

    let summary = enricher.run(&mut store, &gaps).await?;
    let remaining = find_gaps(&store).len();
    info!(found = summary.found, remaining, "Screenshots updated");
    Ok(())
}

/// The first few gaps, then a count of the rest.
pub fn dry_run_lines(gaps: &[Gap]) -> Vec<String> {
    let mut lines: Vec<String> = gaps
        .iter()
        .take(DRY_RUN_PREVIEW)
        .map(|gap| format!("  {} ({})", gap.domain, gap.email))
        .collect();
    if gaps.len() > DRY_RUN_PREVIEW {
        lines.push(format!("  ... and {} more", gaps.len() - DRY_RUN_PREVIEW));
    }
    lines
}

/// First Ctrl-C asks the run to stop after the current domain; a second one exits
/// immediately, even in the middle of a backoff or settle wait.
fn watch_ctrl_c(interrupt: Interrupt) {
    tokio::spawn(async move {
        let force = escalate(interrupt, || async { tokio::signal::ctrl_c().await.is_ok() }).await;
        if force {
            std::process::exit(130);
        }
    });
}

/// Waits for up to two signals. Returns true when the second one arrives.
async fn escalate<F, Fut>(interrupt: Interrupt, mut next_signal: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    if !next_signal().await {
        return false;
    }
    warn!("Interrupt received, stopping after the current domain (Ctrl-C again to quit now)");
    interrupt.trigger();

    if !next_signal().await {
        return false;
    }
    warn!("Second interrupt, exiting without waiting");
    true
}

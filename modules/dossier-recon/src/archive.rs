//! Wayback Machine checks over a list of URLs, and saving captures to disk.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{error, info, warn};

use dossier_enrich::{Clock, SystemClock};
use wayback_client::{snapshot_filename, Availability, WaybackClient};

const BULK_PAUSE: Duration = Duration::from_secs(1);

/// Archive status of one URL in a bulk run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ArchiveStatus {
    pub archived: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl From<Availability> for ArchiveStatus {
    fn from(a: Availability) -> Self {
        if !a.available {
            return Self::default();
        }
        let date = a.date();
        Self {
            archived: true,
            archive_url: a.url,
            timestamp: a.timestamp,
            date,
        }
    }
}

pub struct Archive {
    client: WaybackClient,
    clock: Arc<dyn Clock>,
}

impl Archive {
    pub fn new(client: WaybackClient) -> Self {
        Self::with_clock(client, Arc::new(SystemClock))
    }

    pub fn with_clock(client: WaybackClient, clock: Arc<dyn Clock>) -> Self {
        Self { client, clock }
    }

    /// Check each URL in turn with a short pause between requests. A URL whose check
    /// fails is reported as not archived.
    pub async fn bulk(&self, urls: &[String]) -> BTreeMap<String, ArchiveStatus> {
        let mut results = BTreeMap::new();
        let total = urls.len();

        for (i, url) in urls.iter().enumerate() {
            let progress = format!("[{}/{}]", i + 1, total);
            info!(progress = %progress, url = %url, "Checking");

            let status = match self.client.check(url).await {
                Ok(availability) => ArchiveStatus::from(availability),
                Err(e) => {
                    error!(url = %url, error = %e, "Availability check failed");
                    ArchiveStatus::default()
                }
            };
            match &status.date {
                Some(date) if status.archived => info!(url = %url, date = %date, "Archived"),
                _ if status.archived => info!(url = %url, "Archived"),
                _ => warn!(url = %url, "Not archived"),
            }
            results.insert(url.clone(), status);

            self.clock.sleep(BULK_PAUSE).await;
        }

        let archived = results.values().filter(|s| s.archived).count();
        info!(archived, total = results.len(), "Bulk archive check complete");
        results
    }

    /// Save a capture as `<host>_<timestamp|latest>.html` under `output_dir`.
    pub async fn save_snapshot(
        &self,
        url: &str,
        timestamp: Option<&str>,
        output_dir: &Path,
    ) -> Result<PathBuf> {
        let content = self
            .client
            .download(url, timestamp)
            .await
            .with_context(|| format!("downloading archived copy of {url}"))?;

        fs::create_dir_all(output_dir)
            .with_context(|| format!("creating {}", output_dir.display()))?;
        let path = output_dir.join(snapshot_filename(url, timestamp));
        fs::write(&path, content).with_context(|| format!("writing {}", path.display()))?;

        info!(path = %path.display(), "Saved snapshot");
        Ok(path)
    }
}

/// Non-blank lines, trimmed.
pub fn read_urls(path: &Path) -> Result<Vec<String>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading URL list {}", path.display()))?;
    Ok(raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect())
}

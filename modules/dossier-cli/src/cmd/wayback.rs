use std::path::PathBuf;

use anyhow::Result;
use clap::Subcommand;
use serde_json::json;
use tracing::{info, warn};

use dossier_recon::{read_urls, write_json, Archive};
use wayback_client::WaybackClient;

use super::print_json;

#[derive(Subcommand)]
pub enum WaybackCommand {
    /// Closest archived copy of a URL
    Check { url: String },

    /// List captures from the CDX index
    Snapshots {
        url: String,

        /// Only captures from this year
        #[arg(long)]
        year: Option<i32>,

        #[arg(long, default_value_t = 100)]
        limit: u32,
    },

    /// Save an archived page as HTML
    Download {
        url: String,

        /// Capture timestamp (YYYYMMDDhhmmss, any prefix); latest when omitted
        #[arg(long)]
        timestamp: Option<String>,

        #[arg(long, default_value = ".")]
        output: PathBuf,
    },

    /// Check every URL in a file
    Bulk {
        file: PathBuf,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

pub async fn run(command: WaybackCommand) -> Result<()> {
    let client = WaybackClient::new()?;

    match command {
        WaybackCommand::Check { url } => {
            let availability = client.check(&url).await?;
            let date = availability.date();
            print_json(&json!({
                "available": availability.available,
                "url": availability.url,
                "timestamp": availability.timestamp,
                "status": availability.status,
                "date": date,
            }))
        }
        WaybackCommand::Snapshots { url, year, limit } => {
            let snapshots = client.snapshots(&url, year, limit).await?;
            if snapshots.is_empty() {
                warn!(url = %url, "No snapshots found");
                return Ok(());
            }
            info!(url = %url, count = snapshots.len(), "Snapshots found");
            for s in &snapshots {
                println!("{}  {}  {}", s.timestamp, s.status, s.archive_url);
            }
            Ok(())
        }
        WaybackCommand::Download {
            url,
            timestamp,
            output,
        } => {
            Archive::new(client)
                .save_snapshot(&url, timestamp.as_deref(), &output)
                .await?;
            Ok(())
        }
        WaybackCommand::Bulk { file, output } => {
            let urls = read_urls(&file)?;
            let results = Archive::new(client).bulk(&urls).await;
            match output {
                Some(path) => {
                    write_json(&path, &results)?;
                    info!(path = %path.display(), "Results saved");
                    Ok(())
                }
                None => print_json(&serde_json::to_value(&results)?),
            }
        }
    }
}

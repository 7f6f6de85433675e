use std::env;
use std::path::PathBuf;

use tracing::{info, warn};

use crate::error::{DossierError, Result};

/// Application configuration loaded from environment variables (and `.env`).
/// Only secrets and paths live here; per-command knobs come from CLI flags.
#[derive(Debug, Clone)]
pub struct Config {
    // API keys
    pub urlscan_api_keys: Vec<String>,
    pub virustotal_api_key: Option<String>,
    pub whoxy_api_key: Option<String>,

    // Paths
    pub data_file: PathBuf,
    pub input_file: PathBuf,
    pub output_dir: PathBuf,
    pub cache_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let urlscan_keys = env::var("URLSCAN_API_KEYS")
            .or_else(|_| env::var("URLSCAN_API_KEY"))
            .unwrap_or_default();

        Self {
            urlscan_api_keys: split_keys(&urlscan_keys),
            virustotal_api_key: optional_env("VIRUSTOTAL_API_KEY"),
            whoxy_api_key: optional_env("WHOXY_API_KEY"),
            data_file: path_env("DOSSIER_DATA_FILE", "data/data.json"),
            input_file: path_env("DOSSIER_INPUT_FILE", "domains.txt"),
            output_dir: path_env("DOSSIER_OUTPUT_DIR", "output"),
            cache_dir: path_env("DOSSIER_CACHE_DIR", "cache"),
        }
    }

    /// The Whoxy key, for commands that cannot run without it.
    pub fn require_whoxy_key(&self) -> Result<&str> {
        self.whoxy_api_key
            .as_deref()
            .ok_or_else(|| DossierError::Config("WHOXY_API_KEY is not set".into()))
    }

    /// Log which credentials are present without printing them.
    pub fn log_redacted(&self) {
        if self.urlscan_api_keys.is_empty() {
            warn!("No urlscan API keys configured, only existing scans will be searched");
        } else {
            info!(count = self.urlscan_api_keys.len(), "urlscan API keys loaded");
        }
        info!(
            virustotal = self.virustotal_api_key.is_some(),
            whoxy = self.whoxy_api_key.is_some(),
            data_file = %self.data_file.display(),
            "Configuration loaded"
        );
    }
}

/// Comma separated list, blanks dropped.
pub fn split_keys(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(String::from)
        .collect()
}

fn optional_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn path_env(key: &str, default: &str) -> PathBuf {
    optional_env(key)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(default))
}

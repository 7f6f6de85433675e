//! Community phishing blocklists, merged into one cached domain set.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::lookup::{Lookup, LookupOutcome};

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);
const CACHE_FILE: &str = "blocklist_cache.json";

/// Cached lists older than this are fetched again before a check.
pub const CACHE_MAX_AGE: Duration = Duration::from_secs(6 * 3600);

#[derive(Debug, Clone)]
pub struct BlocklistSource {
    pub name: String,
    pub url: String,
}

impl BlocklistSource {
    pub fn new(name: &str, url: &str) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
        }
    }
}

pub fn default_sources() -> Vec<BlocklistSource> {
    vec![
        BlocklistSource::new(
            "MetaMask",
            "https://raw.githubusercontent.com/MetaMask/eth-phishing-detect/master/src/config.json",
        ),
        BlocklistSource::new(
            "ScamSniffer",
            "https://raw.githubusercontent.com/scamsniffer/scam-database/main/blacklist/domains.json",
        ),
        BlocklistSource::new(
            "PhishDestroy",
            "https://raw.githubusercontent.com/phishdestroy/destroylist/main/list.json",
        ),
    ]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlocklistCache {
    pub updated: String,
    #[serde(default)]
    pub domains: Vec<String>,
}

impl BlocklistCache {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        let Ok(updated) = DateTime::parse_from_rfc3339(&self.updated) else {
            return false;
        };
        let age = now.signed_duration_since(updated.with_timezone(&Utc));
        age.to_std().is_ok_and(|age| age < CACHE_MAX_AGE)
    }
}

/// `  Evil.COM/login ` -> `evil.com`
pub fn normalize_domain(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    match lowered.split_once('/') {
        Some((host, _)) => host.to_string(),
        None => lowered,
    }
}

/// Pull domains out of a list body: a bare JSON array, an object keyed by `blacklist`
/// or `domains`, or plain text with one entry per line.
pub fn parse_list(body: &str) -> HashSet<String> {
    let strings = |items: &Vec<Value>| -> HashSet<String> {
        items
            .iter()
            .filter_map(Value::as_str)
            .map(normalize_domain)
            .filter(|d| !d.is_empty())
            .collect()
    };

    match serde_json::from_str::<Value>(body) {
        Ok(Value::Array(items)) => strings(&items),
        Ok(Value::Object(map)) => ["blacklist", "domains"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_array))
            .map(strings)
            .unwrap_or_default(),
        _ => body
            .lines()
            .filter(|line| line.contains('.'))
            .map(normalize_domain)
            .collect(),
    }
}

pub struct Blocklist {
    client: reqwest::Client,
    sources: Vec<BlocklistSource>,
    cache_path: PathBuf,
}

impl Blocklist {
    pub fn new(cache_dir: &Path) -> Result<Self> {
        Self::with_sources(cache_dir, default_sources())
    }

    pub fn with_sources(cache_dir: &Path, sources: Vec<BlocklistSource>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .context("building blocklist HTTP client")?;
        Ok(Self {
            client,
            sources,
            cache_path: cache_dir.join(CACHE_FILE),
        })
    }

    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }

    /// Download every source and rewrite the cache. A source that fails is skipped.
    /// Returns the number of distinct domains cached.
    pub async fn update(&self) -> Result<usize> {
        let mut domains = HashSet::new();
        for source in &self.sources {
            match self.fetch(source).await {
                Ok(list) => {
                    info!(source = %source.name, entries = list.len(), "Fetched blocklist");
                    domains.extend(list);
                }
                Err(e) => warn!(source = %source.name, error = %e, "Blocklist fetch failed"),
            }
        }

        if domains.is_empty() {
            if let Some(stale) = self.read_cache() {
                warn!("No blocklist could be fetched, keeping the existing cache");
                return Ok(stale.domains.len());
            }
        }

        let mut domains: Vec<String> = domains.into_iter().collect();
        domains.sort();
        let cache = BlocklistCache {
            updated: Utc::now().to_rfc3339(),
            domains,
        };
        self.write_cache(&cache)?;
        Ok(cache.domains.len())
    }

    /// Whether `domain` appears on any list, refreshing the cache first when needed.
    pub async fn check(&self, domain: &str) -> Result<bool> {
        let cache = match self.read_cache() {
            Some(cache) if cache.is_fresh(Utc::now()) => cache,
            _ => {
                debug!(path = %self.cache_path.display(), "Blocklist cache missing or stale");
                self.update().await?;
                self.read_cache()
                    .context("blocklist cache unreadable after update")?
            }
        };

        let needle = normalize_domain(domain);
        Ok(cache.domains.iter().any(|d| *d == needle))
    }

    async fn fetch(&self, source: &BlocklistSource) -> Result<HashSet<String>> {
        let resp = self.client.get(&source.url).send().await?;
        let resp = resp.error_for_status()?;
        let body = resp.text().await?;
        Ok(parse_list(&body))
    }

    fn read_cache(&self) -> Option<BlocklistCache> {
        let raw = fs::read_to_string(&self.cache_path).ok()?;
        match serde_json::from_str(&raw) {
            Ok(cache) => Some(cache),
            Err(e) => {
                warn!(error = %e, "Ignoring corrupt blocklist cache");
                None
            }
        }
    }

    fn write_cache(&self, cache: &BlocklistCache) -> Result<()> {
        if let Some(dir) = self.cache_path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating cache directory {}", dir.display()))?;
        }
        let body = serde_json::to_string(cache)?;
        fs::write(&self.cache_path, body)
            .with_context(|| format!("writing {}", self.cache_path.display()))?;
        Ok(())
    }
}

#[async_trait]
impl Lookup for Blocklist {
    fn name(&self) -> &'static str {
        "blocklist"
    }

    fn file_suffix(&self) -> &'static str {
        "blocklist"
    }

    async fn lookup(&self, domain: &str) -> Result<LookupOutcome> {
        let blocked = self.check(domain).await?;
        if blocked {
            warn!(domain, "BLOCKED: domain found in blocklist");
        } else {
            info!(domain, "Clean (blocklists)");
        }
        Ok(LookupOutcome::Found(json!({ "domain": domain, "blocked": blocked })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    #[test]
    fn normalizes_case_whitespace_and_path() {
        assert_eq!(normalize_domain("  Evil.COM/login?x=1 "), "evil.com");
        assert_eq!(normalize_domain("plain.io"), "plain.io");
    }

    #[test]
    fn parses_every_list_shape() {
        let array = parse_list(r#"["A.com", "b.com/path", 3]"#);
        assert_eq!(array, HashSet::from(["a.com".to_string(), "b.com".to_string()]));

        let metamask = parse_list(r#"{"version":2,"whitelist":["ok.com"],"blacklist":["bad.com"]}"#);
        assert_eq!(metamask, HashSet::from(["bad.com".to_string()]));

        let keyed = parse_list(r#"{"domains":["x.org"]}"#);
        assert_eq!(keyed, HashSet::from(["x.org".to_string()]));

        let text = parse_list("# comment\nfoo.net\n\nbar.net/a\n");
        assert_eq!(text, HashSet::from(["foo.net".to_string(), "bar.net".to_string()]));
    }

    #[test]
    fn cache_freshness_follows_max_age() {
        let now = Utc::now();
        let cache = |updated: DateTime<Utc>| BlocklistCache {
            updated: updated.to_rfc3339(),
            domains: vec![],
        };

        assert!(cache(now - ChronoDuration::hours(1)).is_fresh(now));
        assert!(!cache(now - ChronoDuration::hours(7)).is_fresh(now));

        let legacy = BlocklistCache {
            updated: "2024-01-01T10:00:00.123456".into(),
            domains: vec![],
        };
        assert!(!legacy.is_fresh(now));
    }
}

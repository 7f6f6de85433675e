use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

/// What a single lookup produced for a domain.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome {
    /// Data worth writing to `<domain>_<suffix>.json`.
    Found(Value),
    NotFound,
    /// The lookup could not run at all, usually for lack of an API key.
    Skipped(String),
}

/// One reconnaissance source, run once per target.
#[async_trait]
pub trait Lookup: Send + Sync {
    fn name(&self) -> &'static str;

    /// Output file suffix, e.g. `dns` for `example.com_dns.json`.
    fn file_suffix(&self) -> &'static str;

    async fn lookup(&self, domain: &str) -> Result<LookupOutcome>;
}

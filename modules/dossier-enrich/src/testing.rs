// In-memory stand-ins for the enrichment seams: no network, no disk.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use dossier_common::{DossierError, Store, StorePersister};

use crate::enricher::Interrupt;
use crate::merge::EnrichmentResult;
use crate::source::EnrichmentSource;

/// Scripted answer for one domain.
#[derive(Debug, Clone)]
pub enum MockAnswer {
    Found(EnrichmentResult),
    NotFound,
    Fail(String),
}

// ---------------------------------------------------------------------------
// MockSource
// ---------------------------------------------------------------------------

/// Answers `search` and `submit` from fixed tables. Unlisted domains are not found.
#[derive(Default)]
pub struct MockSource {
    search: HashMap<String, MockAnswer>,
    submit: HashMap<String, MockAnswer>,
    can_submit: bool,
    interrupt_after: Option<(usize, Interrupt)>,
    calls: Mutex<Vec<String>>,
    searches: AtomicUsize,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_search(mut self, domain: &str, answer: MockAnswer) -> Self {
        self.search.insert(domain.to_string(), answer);
        self
    }

    pub fn on_submit(mut self, domain: &str, answer: MockAnswer) -> Self {
        self.submit.insert(domain.to_string(), answer);
        self.can_submit = true;
        self
    }

    pub fn with_credentials(mut self, can_submit: bool) -> Self {
        self.can_submit = can_submit;
        self
    }

    /// Trigger `interrupt` during the n-th search, simulating Ctrl-C mid-gap.
    pub fn interrupt_after(mut self, searches: usize, interrupt: Interrupt) -> Self {
        self.interrupt_after = Some((searches, interrupt));
        self
    }

    /// Every call made, as `search:<domain>` / `submit:<domain>`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn answer(table: &HashMap<String, MockAnswer>, domain: &str) -> Result<Option<EnrichmentResult>> {
        match table.get(domain) {
            Some(MockAnswer::Found(r)) => Ok(Some(r.clone())),
            Some(MockAnswer::Fail(msg)) => Err(anyhow!(msg.clone())),
            Some(MockAnswer::NotFound) | None => Ok(None),
        }
    }
}

#[async_trait]
impl EnrichmentSource for MockSource {
    async fn search(&self, domain: &str) -> Result<Option<EnrichmentResult>> {
        self.calls.lock().unwrap().push(format!("search:{domain}"));
        let n = self.searches.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some((after, interrupt)) = &self.interrupt_after {
            if n == *after {
                interrupt.trigger();
            }
        }
        Self::answer(&self.search, domain)
    }

    async fn submit(&self, domain: &str) -> Result<Option<EnrichmentResult>> {
        self.calls.lock().unwrap().push(format!("submit:{domain}"));
        Self::answer(&self.submit, domain)
    }

    fn can_submit(&self) -> bool {
        self.can_submit
    }
}

// ---------------------------------------------------------------------------
// MemoryPersister
// ---------------------------------------------------------------------------

/// Keeps a copy of the store at every persist point.
#[derive(Default)]
pub struct MemoryPersister {
    snapshots: Mutex<Vec<Store>>,
    fail_on: Mutex<Vec<usize>>,
    attempts: AtomicUsize,
}

impl MemoryPersister {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the given 1-based persist attempts fail.
    pub fn failing_on(attempts: &[usize]) -> Self {
        Self {
            fail_on: Mutex::new(attempts.to_vec()),
            ..Self::default()
        }
    }

    pub fn writes(&self) -> usize {
        self.snapshots.lock().unwrap().len()
    }

    pub fn last(&self) -> Option<Store> {
        self.snapshots.lock().unwrap().last().cloned()
    }

    pub fn snapshots(&self) -> Vec<Store> {
        self.snapshots.lock().unwrap().clone()
    }
}

impl StorePersister for MemoryPersister {
    fn persist(&self, store: &Store) -> dossier_common::Result<()> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on.lock().unwrap().contains(&attempt) {
            return Err(DossierError::Anyhow(anyhow!("disk full")));
        }
        self.snapshots.lock().unwrap().push(store.clone());
        Ok(())
    }
}

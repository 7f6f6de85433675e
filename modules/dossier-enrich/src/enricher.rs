use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, error, info, warn};

use dossier_common::{Store, StorePersister};

use crate::gaps::Gap;
use crate::merge;
use crate::source::EnrichmentSource;

const DEFAULT_SAVE_EVERY: usize = 10;

#[derive(Debug, Clone)]
pub struct EnrichConfig {
    /// Fall back to submitting a new scan when search finds nothing.
    pub submit: bool,
    /// Persist after every this-many successful merges.
    pub save_every: usize,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            submit: false,
            save_every: DEFAULT_SAVE_EVERY,
        }
    }
}

/// Stop request, honored between gaps.
#[derive(Debug, Clone, Default)]
pub struct Interrupt(Arc<AtomicBool>);

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Terminal state of one gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GapOutcome {
    Merged,
    NotFound,
}

/// Counters from one batch run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EnrichSummary {
    pub processed: u64,
    pub found: u64,
    pub not_found: u64,
    pub errors: u64,
    pub persists: u64,
    pub persist_failures: u64,
    pub interrupted: bool,
}

impl fmt::Display for EnrichSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "processed={} found={} not_found={} errors={} persists={} persist_failures={} interrupted={}",
            self.processed,
            self.found,
            self.not_found,
            self.errors,
            self.persists,
            self.persist_failures,
            self.interrupted,
        )
    }
}

/// Walks a list of gaps, enriches each one and persists the store along the way.
pub struct Enricher {
    source: Arc<dyn EnrichmentSource>,
    persister: Arc<dyn StorePersister>,
    config: EnrichConfig,
    interrupt: Interrupt,
}

impl Enricher {
    pub fn new(
        source: Arc<dyn EnrichmentSource>,
        persister: Arc<dyn StorePersister>,
        config: EnrichConfig,
        interrupt: Interrupt,
    ) -> Self {
        Self {
            source,
            persister,
            config,
            interrupt,
        }
    }

    /// Process `gaps` in order against `store`. The gaps must come from this same store
    /// and people must not be removed from it while the run is in progress.
    ///
    /// The store is always persisted once after the loop, however the loop ended. An
    /// error is returned only when that final persist fails.
    pub async fn run(&self, store: &mut Store, gaps: &[Gap]) -> Result<EnrichSummary> {
        let mut summary = EnrichSummary::default();
        let total = gaps.len();
        let save_every = self.config.save_every.max(1) as u64;

        for (i, gap) in gaps.iter().enumerate() {
            if self.interrupt.is_triggered() {
                warn!("Interrupted, saving progress");
                summary.interrupted = true;
                break;
            }

            let progress = format!("[{}/{}]", i + 1, total);
            summary.processed += 1;

            match self.process(store, gap).await {
                Ok(GapOutcome::Merged) => {
                    summary.found += 1;
                    info!(progress = %progress, domain = %gap.domain, "FOUND");

                    if summary.found % save_every == 0 {
                        info!(found = summary.found, "Saving progress");
                        self.persist(store, &mut summary).ok();
                    }
                }
                Ok(GapOutcome::NotFound) => {
                    summary.not_found += 1;
                    debug!(progress = %progress, domain = %gap.domain, "Not found");
                }
                Err(e) => {
                    summary.errors += 1;
                    error!(progress = %progress, domain = %gap.domain, error = %e, "Error processing domain");
                }
            }
        }

        info!("Saving final data");
        let saved = self.persist(store, &mut summary);

        info!("Enrichment run complete. {summary}");
        saved.context("final save of the store failed")?;
        Ok(summary)
    }

    async fn process(&self, store: &mut Store, gap: &Gap) -> Result<GapOutcome> {
        let mut result = self.source.search(&gap.domain).await?;

        if result.is_none() && self.config.submit && self.source.can_submit() {
            result = self.source.submit(&gap.domain).await?;
        }

        match result {
            Some(found) if !found.screenshot.is_empty() => {
                merge::apply(store, gap, &found)?;
                Ok(GapOutcome::Merged)
            }
            _ => Ok(GapOutcome::NotFound),
        }
    }

    fn persist(
        &self,
        store: &Store,
        summary: &mut EnrichSummary,
    ) -> dossier_common::Result<()> {
        match self.persister.persist(store) {
            Ok(()) => {
                summary.persists += 1;
                Ok(())
            }
            Err(e) => {
                summary.persist_failures += 1;
                error!(error = %e, "Failed to save store, will retry at the next save point");
                Err(e)
            }
        }
    }
}

//! Aggregation over every registered source adapter.
//!
//! ### Fan-out
//! - Adapters run one after another in registration order.
//! - A failing adapter call is logged and the remaining calls still run.
//!
//! ### Persistence
//! - Each batch is checked against the gateway by (title, author) and also
//!   against records staged earlier in the same batch, then inserted in one call.
//! - Gateway failures propagate; scrape failures never do.
//!
//! ### Concurrency
//! - Scrape, search and refresh runs hold one service-wide lock, so the
//!   find-then-insert check of one run never interleaves with another's.

use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;

use ficrecs_core::{Error, ScrapedStory, Source, StoryGateway, estimate_weekly_views};

use crate::adapters::SourceAdapter;

/// Outcome of a scrape or search run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreReport {
    /// Records returned by the adapters
    pub scraped: usize,
    /// New rows written
    pub inserted: u64,
    /// Records already stored or repeated within the batch
    pub skipped: usize,
}

/// Outcome of a weekly view refresh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RefreshReport {
    pub updated: usize,
    pub failed: usize,
    /// Stories whose source has no registered adapter
    pub skipped: usize,
}

/// Drives scraping across the adapter registry and persists the results.
pub struct ScrapingService {
    adapters: Vec<Box<dyn SourceAdapter>>,
    gateway: Arc<dyn StoryGateway>,
    run_lock: Mutex<()>,
}

impl ScrapingService {
    pub fn new(gateway: Arc<dyn StoryGateway>) -> Self {
        Self { adapters: Vec::new(), gateway, run_lock: Mutex::new(()) }
    }

    /// Add an adapter, replacing any adapter already registered for its source.
    pub fn register(&mut self, adapter: Box<dyn SourceAdapter>) {
        let source = adapter.source();
        match self.adapters.iter_mut().find(|a| a.source() == source) {
            Some(slot) => {
                tracing::info!(source = %source, "replacing registered adapter");
                *slot = adapter;
            }
            None => {
                tracing::info!(source = %source, "registered adapter");
                self.adapters.push(adapter);
            }
        }
    }

    /// Registered sources in registration order.
    pub fn available_sources(&self) -> Vec<Source> {
        self.adapters.iter().map(|a| a.source()).collect()
    }

    fn is_registered(&self, source: Source) -> bool {
        self.adapters.iter().any(|a| a.source() == source)
    }

    /// Scrape popular stories from every adapter and store the new ones.
    ///
    /// With no fandoms each adapter is asked for `limit` stories. Otherwise
    /// `limit` is split evenly (rounded up) across the fandoms and each
    /// adapter is asked once per fandom.
    pub async fn scrape_and_store(&self, fandoms: &[String], limit: usize) -> Result<StoreReport, Error> {
        let _run = self.run_lock.lock().await;
        if self.adapters.is_empty() {
            tracing::warn!("no adapters registered, nothing to scrape");
            return Ok(StoreReport::default());
        }

        let fandoms = distinct_fandoms(fandoms);
        tracing::info!(fandoms = fandoms.len(), limit, "starting popular scrape");

        let mut batch = Vec::new();
        for adapter in &self.adapters {
            let source = adapter.source();
            if fandoms.is_empty() {
                match adapter.get_popular_stories(None, limit).await {
                    Ok(stories) => batch.extend(stories),
                    Err(e) => tracing::error!(source = %source, error = %e, "popular scrape failed"),
                }
                continue;
            }

            let per_fandom = limit.div_ceil(fandoms.len());
            for fandom in &fandoms {
                match adapter.get_popular_stories(Some(fandom), per_fandom).await {
                    Ok(stories) => batch.extend(stories),
                    Err(e) => tracing::error!(source = %source, fandom = %fandom, error = %e, "popular scrape failed"),
                }
            }
        }

        self.store_batch(batch).await
    }

    /// Search every adapter for `query` and store the new results.
    ///
    /// `limit` is split evenly (rounded up) across the registered adapters.
    pub async fn search_and_store(&self, query: &str, limit: usize) -> Result<StoreReport, Error> {
        let _run = self.run_lock.lock().await;
        if self.adapters.is_empty() {
            tracing::warn!("no adapters registered, nothing to search");
            return Ok(StoreReport::default());
        }

        let per_source = limit.div_ceil(self.adapters.len());
        tracing::info!(query, limit, per_source, "starting search");

        let mut batch = Vec::new();
        for adapter in &self.adapters {
            match adapter.search_stories(query, per_source).await {
                Ok(stories) => batch.extend(stories),
                Err(e) => tracing::error!(source = %adapter.source(), query, error = %e, "search failed"),
            }
        }

        self.store_batch(batch).await
    }

    /// Recompute `weekly_views` for every stored story from a registered source.
    pub async fn refresh_weekly_views(&self) -> Result<RefreshReport, Error> {
        let _run = self.run_lock.lock().await;
        let stories = self.gateway.list_all_stories().await?;
        let mut report = RefreshReport::default();

        for story in stories {
            if !self.is_registered(story.source) {
                report.skipped += 1;
                continue;
            }

            let weekly_views = estimate_weekly_views(story.view_count);
            match self.gateway.update_weekly_views(story.id, weekly_views).await {
                Ok(()) => report.updated += 1,
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!(story_id = story.id, error = %e, "failed to update weekly views");
                }
            }
        }

        tracing::info!(
            updated = report.updated,
            failed = report.failed,
            skipped = report.skipped,
            "weekly view refresh finished"
        );
        Ok(report)
    }

    async fn store_batch(&self, batch: Vec<ScrapedStory>) -> Result<StoreReport, Error> {
        let mut report = StoreReport { scraped: batch.len(), ..StoreReport::default() };
        let mut staged_keys = HashSet::new();
        let mut staged = Vec::new();

        for story in batch {
            let key = (story.title.clone(), story.author.clone());
            if staged_keys.contains(&key) {
                tracing::debug!(title = %story.title, author = %story.author, "duplicate within batch, skipping");
                report.skipped += 1;
                continue;
            }
            if self.gateway.find_story_by_title_author(&story.title, &story.author).await?.is_some() {
                tracing::debug!(title = %story.title, author = %story.author, "already stored, skipping");
                report.skipped += 1;
                continue;
            }
            staged_keys.insert(key);
            staged.push(story);
        }

        if staged.is_empty() {
            tracing::info!(scraped = report.scraped, "no new stories to store");
            return Ok(report);
        }

        report.inserted = self.gateway.insert_stories(&staged).await?;
        tracing::info!(scraped = report.scraped, inserted = report.inserted, skipped = report.skipped, "stored new stories");
        Ok(report)
    }
}

/// Trimmed, non-empty fandoms with repeats removed, first occurrence kept.
fn distinct_fandoms(fandoms: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    fandoms
        .iter()
        .map(|f| f.trim())
        .filter(|f| !f.is_empty() && seen.insert(f.to_string()))
        .map(str::to_string)
        .collect()
}

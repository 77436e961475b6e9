// src/ingest/cache.rs
//! Per-source TTL cache with stale fallback.
//!
//! The entry lives behind an async mutex that is held across the refresh, so
//! callers racing on an expired entry trigger exactly one fetch; the others
//! wait and then find the fresh entry. The last good payload is mirrored in a
//! separate snapshot that readers can take without queueing on that mutex.

use metrics::counter;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::ingest::types::{Article, SourceFetcher};

pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

/// Snapshot of one successful fetch. Replaced wholesale, never edited.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub fetched_at: u64, // unix seconds
    pub payload: Arc<Vec<Article>>,
}

pub struct TtlCache {
    fetcher: Arc<dyn SourceFetcher>,
    ttl: Duration,
    entry: Mutex<Option<CacheEntry>>,
    last_good: RwLock<Option<Arc<Vec<Article>>>>,
}

impl TtlCache {
    pub fn new(fetcher: Arc<dyn SourceFetcher>, ttl: Duration) -> Self {
        Self {
            fetcher,
            ttl,
            entry: Mutex::new(None),
            last_good: RwLock::new(None),
        }
    }

    pub fn name(&self) -> &str {
        self.fetcher.name()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn is_fresh(&self, entry: &CacheEntry, now: u64) -> bool {
        now.saturating_sub(entry.fetched_at) < self.ttl.as_secs()
    }

    /// Serve the cached payload while fresh, otherwise refresh.
    pub async fn get_or_fetch(&self, now: u64) -> Vec<Article> {
        let mut guard = self.entry.lock().await;
        if let Some(entry) = guard.as_ref() {
            if self.is_fresh(entry, now) {
                counter!("news_cache_hits_total", "source" => self.name().to_string())
                    .increment(1);
                debug!(source = self.name(), age_secs = now.saturating_sub(entry.fetched_at), "cache hit");
                return entry.payload.as_ref().clone();
            }
        }
        counter!("news_cache_misses_total", "source" => self.name().to_string()).increment(1);
        self.refresh_locked(&mut guard, now).await
    }

    /// Fetch regardless of freshness; the same fallback rules apply.
    pub async fn refresh(&self, now: u64) -> Vec<Article> {
        let mut guard = self.entry.lock().await;
        self.refresh_locked(&mut guard, now).await
    }

    async fn refresh_locked(&self, slot: &mut Option<CacheEntry>, now: u64) -> Vec<Article> {
        let result = self.fetcher.fetch().await;

        if !result.is_failure() {
            let articles = result.articles;
            let payload = Arc::new(articles.clone());
            *self.last_good.write().unwrap_or_else(|e| e.into_inner()) = Some(payload.clone());
            *slot = Some(CacheEntry {
                fetched_at: now,
                payload,
            });
            return articles;
        }

        match slot.as_ref() {
            Some(prev) => {
                warn!(
                    source = self.name(),
                    stale_secs = now.saturating_sub(prev.fetched_at),
                    error = ?result.error(),
                    "refresh failed; serving stale payload"
                );
                counter!("news_cache_stale_served_total", "source" => self.name().to_string())
                    .increment(1);
                prev.payload.as_ref().clone()
            }
            None => {
                warn!(source = self.name(), error = ?result.error(), "refresh failed; nothing cached");
                Vec::new()
            }
        }
    }

    /// Last good payload without waiting on an in-flight refresh; `None`
    /// before the first success.
    pub fn peek_stale(&self) -> Option<Vec<Article>> {
        let snapshot = self.last_good.read().unwrap_or_else(|e| e.into_inner());
        snapshot.as_ref().map(|p| p.as_ref().clone())
    }

    /// Current entry, waiting for any in-flight refresh.
    pub async fn entry(&self) -> Option<CacheEntry> {
        self.entry.lock().await.clone()
    }
}

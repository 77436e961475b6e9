// src/aggregator.rs
//! Composition root: owns one `TtlCache` per registered source, fans reads
//! out concurrently and merges them into one ranked feed.

use futures::stream::{FuturesUnordered, StreamExt};
use metrics::{counter, gauge};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

use crate::config::AggregatorConfig;
use crate::hotness::HotnessTable;
use crate::ingest::dedup::dedup_global;
use crate::ingest::{
    ensure_metrics_described, Article, HttpSourceFetcher, HttpTransport, ReqwestTransport,
    SourceFetcher, TtlCache, UnknownSourceError,
};

/// Slack added on top of the slowest source when no overall deadline is set.
const OVERALL_SLACK: Duration = Duration::from_secs(1);

struct SourceSlot {
    cache: TtlCache,
    budget: Duration,
}

pub struct Aggregator {
    sources: Vec<SourceSlot>,
    hotness: HotnessTable,
    overall_timeout: Option<Duration>,
}

pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Score, order newest-first (hotter first on ties), then drop repeats.
/// The sort is stable, so equal keys keep their merge order.
pub fn rank(mut articles: Vec<Article>, table: &HotnessTable) -> Vec<Article> {
    for a in articles.iter_mut() {
        a.score = table.score(&a.title);
    }
    articles.sort_by(|a, b| {
        b.published_at
            .cmp(&a.published_at)
            .then_with(|| b.score.cmp(&a.score))
    });
    let (kept, dropped) = dedup_global(articles);
    if dropped > 0 {
        counter!("news_dedup_total", "stage" => "global").increment(dropped as u64);
        debug!(dropped, "global dedup");
    }
    kept
}

impl Aggregator {
    pub fn new(hotness: HotnessTable, overall_timeout: Option<Duration>) -> Self {
        ensure_metrics_described();
        Self {
            sources: Vec::new(),
            hotness,
            overall_timeout,
        }
    }

    /// Build every configured source on a shared reqwest client.
    pub fn from_config(cfg: &AggregatorConfig) -> anyhow::Result<Self> {
        cfg.validate()?;
        let transport: Arc<dyn HttpTransport> =
            Arc::new(ReqwestTransport::new(cfg.request_timeout())?);
        Ok(Self::from_config_with_transport(cfg, transport))
    }

    /// Same as `from_config` over a caller-provided transport.
    pub fn from_config_with_transport(
        cfg: &AggregatorConfig,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        let mut agg = Self::new(
            cfg.hotness_table(),
            cfg.overall_timeout_secs.map(Duration::from_secs),
        );
        let retry = cfg.retry.policy();
        let normalizer = cfg.normalizer();

        for src in &cfg.sources {
            let mut fetcher =
                HttpSourceFetcher::new(src.name.trim(), src.base_url.as_str(), transport.clone())
                    .with_retry(retry.clone())
                    .with_request_timeout(cfg.request_timeout())
                    .with_normalizer(normalizer.clone());
            for st in &src.strategies {
                fetcher = fetcher.with_strategy(st.extractor.build(), st.endpoints.iter().cloned());
            }
            let budget = fetcher.time_budget();
            agg.register(Arc::new(fetcher), cfg.ttl(), budget);
        }
        info!(
            sources = agg.sources.len(),
            ttl_secs = cfg.cache_ttl_secs,
            overall_ms = agg.overall_budget().as_millis() as u64,
            "aggregator ready"
        );
        agg
    }

    /// Add a source. A second registration under the same name replaces the
    /// first (and its cache).
    pub fn register(&mut self, fetcher: Arc<dyn SourceFetcher>, ttl: Duration, budget: Duration) {
        let slot = SourceSlot {
            cache: TtlCache::new(fetcher, ttl),
            budget,
        };
        match self
            .sources
            .iter()
            .position(|s| s.cache.name() == slot.cache.name())
        {
            Some(i) => {
                warn!(source = slot.cache.name(), "source registered twice; replacing");
                self.sources[i] = slot;
            }
            None => self.sources.push(slot),
        }
    }

    pub fn source_names(&self) -> Vec<String> {
        self.sources
            .iter()
            .map(|s| s.cache.name().to_string())
            .collect()
    }

    pub fn hotness(&self) -> &HotnessTable {
        &self.hotness
    }

    /// Deadline for a whole `fetch_all`.
    pub fn overall_budget(&self) -> Duration {
        self.overall_timeout.unwrap_or_else(|| {
            self.sources
                .iter()
                .map(|s| s.budget)
                .max()
                .unwrap_or_default()
                .saturating_add(OVERALL_SLACK)
        })
    }

    /// Merged, ranked, deduplicated feed across every source.
    pub async fn fetch_all(&self) -> Vec<Article> {
        self.fetch_all_at(unix_now()).await
    }

    pub async fn fetch_all_at(&self, now: u64) -> Vec<Article> {
        self.aggregate(now, false).await
    }

    /// As `fetch_all`, but every source refetches regardless of cache age.
    pub async fn refresh_all(&self) -> Vec<Article> {
        self.aggregate(unix_now(), true).await
    }

    /// One source's cached result as-is: no merge, no ranking, no global dedup.
    pub async fn fetch_by_source(&self, name: &str) -> Result<Vec<Article>, UnknownSourceError> {
        self.fetch_by_source_at(name, unix_now()).await
    }

    pub async fn fetch_by_source_at(
        &self,
        name: &str,
        now: u64,
    ) -> Result<Vec<Article>, UnknownSourceError> {
        let slot = self.slot(name)?;
        Ok(self.read_source(slot, now, false).await)
    }

    pub async fn refresh_source(&self, name: &str) -> Result<Vec<Article>, UnknownSourceError> {
        let slot = self.slot(name)?;
        Ok(self.read_source(slot, unix_now(), true).await)
    }

    fn slot(&self, name: &str) -> Result<&SourceSlot, UnknownSourceError> {
        self.sources
            .iter()
            .find(|s| s.cache.name() == name)
            .ok_or_else(|| UnknownSourceError(name.to_string()))
    }

    /// Cache read under the source's budget. An overrun falls back to the last
    /// good payload, if the cache still has one.
    async fn read_source(&self, slot: &SourceSlot, now: u64, force: bool) -> Vec<Article> {
        let read = async {
            if force {
                slot.cache.refresh(now).await
            } else {
                slot.cache.get_or_fetch(now).await
            }
        };
        match tokio::time::timeout(slot.budget, read).await {
            Ok(articles) => articles,
            Err(_) => {
                counter!("news_source_timeouts_total", "source" => slot.cache.name().to_string())
                    .increment(1);
                let stale = slot.cache.peek_stale().unwrap_or_default();
                warn!(
                    source = slot.cache.name(),
                    budget_ms = slot.budget.as_millis() as u64,
                    stale = stale.len(),
                    "source overran its budget"
                );
                stale
            }
        }
    }

    async fn aggregate(&self, now: u64, force: bool) -> Vec<Article> {
        let deadline = tokio::time::sleep(self.overall_budget());
        tokio::pin!(deadline);

        let mut pending: FuturesUnordered<_> = self
            .sources
            .iter()
            .enumerate()
            .map(|(idx, slot)| async move { (idx, self.read_source(slot, now, force).await) })
            .collect();

        // Results are slotted by registration index so ties sort the same way
        // regardless of completion order.
        let mut per_source: Vec<Option<Vec<Article>>> = vec![None; self.sources.len()];
        loop {
            tokio::select! {
                next = pending.next() => match next {
                    Some((idx, articles)) => {
                        if articles.is_empty() {
                            warn!(source = self.sources[idx].cache.name(), "source contributed nothing");
                        }
                        per_source[idx] = Some(articles);
                    }
                    None => break,
                },
                _ = &mut deadline => {
                    let missing: Vec<&str> = per_source
                        .iter()
                        .zip(&self.sources)
                        .filter(|(r, _)| r.is_none())
                        .map(|(_, s)| s.cache.name())
                        .collect();
                    warn!(?missing, "overall deadline reached; returning partial feed");
                    break;
                }
            }
        }
        // Unfinished fetches are cancelled here.
        drop(pending);

        let merged: Vec<Article> = per_source.into_iter().flatten().flatten().collect();
        let feed = rank(merged, &self.hotness);

        gauge!("news_feed_articles").set(feed.len() as f64);
        gauge!("news_aggregate_last_run_ts").set(now as f64);
        info!(articles = feed.len(), forced = force, "feed aggregated");
        feed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::normalize::canonical_offset;
    use chrono::TimeZone;

    fn art(title: &str, url: &str, hour: u32) -> Article {
        Article {
            title: title.into(),
            published_at: canonical_offset(8 * 3600)
                .with_ymd_and_hms(2024, 1, 1, hour, 0, 0)
                .unwrap(),
            url: url.into(),
            source: "t".into(),
            category: "article".into(),
            score: 0,
        }
    }

    #[test]
    fn rank_orders_by_time_then_score() {
        let table = HotnessTable::from_map([("surge".to_string(), 3)].into_iter().collect());
        let out = rank(
            vec![
                art("Calm day", "https://a/1", 10),
                art("Stocks surge", "https://a/2", 10),
                art("Later", "https://a/3", 11),
            ],
            &table,
        );
        let titles: Vec<_> = out.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["Later", "Stocks surge", "Calm day"]);
        assert_eq!(out[1].score, 3);
    }

    #[test]
    fn rank_keeps_first_of_duplicates() {
        let out = rank(
            vec![
                art("Same", "https://a/1", 10),
                art("Same", "https://b/1", 9),
                art("Other", "https://a/1", 8),
            ],
            &HotnessTable::from_map(Default::default()),
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].url, "https://a/1");
    }

    #[test]
    fn default_overall_budget_tracks_slowest_source() {
        let agg = Aggregator::new(HotnessTable::default(), None);
        assert_eq!(agg.overall_budget(), OVERALL_SLACK);
        let fixed = Aggregator::new(HotnessTable::default(), Some(Duration::from_secs(7)));
        assert_eq!(fixed.overall_budget(), Duration::from_secs(7));
    }
}

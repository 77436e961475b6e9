// src/ingest/mod.rs
pub mod cache;
pub mod dedup;
pub mod error;
pub mod extractors;
pub mod fetcher;
pub mod normalize;
pub mod retry;
pub mod types;

use metrics::{describe_counter, describe_gauge, describe_histogram};
use once_cell::sync::OnceCell;

pub use cache::{CacheEntry, TtlCache};
pub use error::{ExtractionError, FetchError, Rejection, UnknownSourceError};
pub use fetcher::{HttpResponse, HttpSourceFetcher, HttpTransport, ReqwestTransport};
pub use normalize::Normalizer;
pub use retry::RetryPolicy;
pub use types::{Article, Extraction, Extractor, FetchResult, RawRecord, SourceFetcher};

/// One-time metrics registration (so series show up on /metrics).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("news_fetch_attempts_total", "HTTP attempts per source, retries included.");
        describe_counter!("news_fetch_retries_total", "Attempts that were retried after a transient failure.");
        describe_counter!(
            "news_endpoint_failures_total",
            "Endpoints that failed after exhausting retries or returned an unusable body."
        );
        describe_counter!("news_records_extracted_total", "Raw records produced by extractors.");
        describe_counter!("news_records_skipped_total", "Records an extractor could not parse.");
        describe_counter!("news_records_rejected_total", "Records rejected by the normalizer.");
        describe_counter!("news_dedup_total", "Records/articles removed by deduplication.");
        describe_counter!("news_cache_hits_total", "Source reads served from a fresh cache entry.");
        describe_counter!("news_cache_misses_total", "Source reads that triggered a fetch.");
        describe_counter!(
            "news_cache_stale_served_total",
            "Failed refreshes answered with the previous payload."
        );
        describe_counter!("news_source_timeouts_total", "Sources that overran their time budget.");
        describe_histogram!("news_fetch_duration_ms", "Source fetch time in milliseconds.");
        describe_gauge!("news_feed_articles", "Articles in the last merged feed.");
        describe_gauge!(
            "news_aggregate_last_run_ts",
            "Unix ts when the merged feed was last built."
        );
    });
}

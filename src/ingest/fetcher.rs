// src/ingest/fetcher.rs
//! HTTP-backed `SourceFetcher`: mirrors fetched concurrently, each request
//! retried per `RetryPolicy`, extractor strategies tried in order.

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::future::join_all;
use metrics::{counter, histogram};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::ingest::dedup::HrefSeen;
use crate::ingest::error::FetchError;
use crate::ingest::normalize::Normalizer;
use crate::ingest::retry::RetryPolicy;
use crate::ingest::types::{Extractor, FetchResult, SourceFetcher};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Status + body of a completed request. Non-2xx statuses are not errors at
/// this layer; the fetcher classifies them.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Seam between the fetcher and the network.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(&self, url: &str) -> Result<HttpResponse, FetchError>;
}

pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(request_timeout: Duration) -> Result<Self> {
        use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};

        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/json,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static("zh-CN,zh;q=0.9,en-US;q=0.8,en;q=0.7"),
        );

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .connect_timeout(request_timeout.min(Duration::from_secs(4)))
            .timeout(request_timeout)
            .build()
            .context("building http client")?;
        Ok(Self { client })
    }
}

fn classify_reqwest(url: &str, e: &reqwest::Error) -> FetchError {
    if e.is_timeout() || e.is_connect() || e.is_request() || e.is_body() {
        FetchError::transient(url, e.to_string())
    } else {
        FetchError::permanent(url, e.to_string())
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse, FetchError> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_reqwest(url, &e))?;
        let status = resp.status().as_u16();
        let body = resp.bytes().await.map_err(|e| classify_reqwest(url, &e))?;
        Ok(HttpResponse {
            status,
            body: body.to_vec(),
        })
    }
}

/// One extractor plus the equivalent endpoints (mirrors) it understands.
#[derive(Clone)]
pub struct Strategy {
    pub extractor: Arc<dyn Extractor>,
    pub endpoints: Vec<String>,
}

pub struct HttpSourceFetcher {
    name: String,
    base_url: String,
    strategies: Vec<Strategy>,
    transport: Arc<dyn HttpTransport>,
    retry: RetryPolicy,
    request_timeout: Duration,
    normalizer: Normalizer,
}

impl HttpSourceFetcher {
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            strategies: Vec::new(),
            transport,
            retry: RetryPolicy::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            normalizer: Normalizer::default(),
        }
    }

    pub fn with_strategy<I, S>(mut self, extractor: Arc<dyn Extractor>, endpoints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.strategies.push(Strategy {
            extractor,
            endpoints: endpoints.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Worst case for one `fetch()`: every strategy runs, each endpoint burns
    /// every attempt to the timeout and sleeps the full backoff between them.
    pub fn time_budget(&self) -> Duration {
        let per_request = self
            .request_timeout
            .saturating_mul(self.retry.max_attempts.max(1))
            .saturating_add(self.retry.total_backoff());
        per_request.saturating_mul(self.strategies.len().max(1) as u32)
    }

    fn classify(&self, url: &str, resp: HttpResponse) -> Result<Vec<u8>, FetchError> {
        match resp.status {
            200..=299 => Ok(resp.body),
            s if self.retry.is_transient_status(s) => {
                Err(FetchError::transient(url, format!("HTTP {s}")))
            }
            s => Err(FetchError::permanent(url, format!("HTTP {s}"))),
        }
    }

    /// GET one endpoint, retrying transient failures with backoff.
    pub async fn get_with_retry(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let max = self.retry.max_attempts.max(1);
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            counter!("news_fetch_attempts_total", "source" => self.name.clone()).increment(1);

            let outcome =
                match tokio::time::timeout(self.request_timeout, self.transport.get(url)).await {
                    Ok(Ok(resp)) => self.classify(url, resp),
                    Ok(Err(e)) => Err(e),
                    Err(_) => Err(FetchError::transient(
                        url,
                        format!("timed out after {:?}", self.request_timeout),
                    )),
                };

            match outcome {
                Ok(body) => return Ok(body),
                Err(e) if e.is_transient() && attempt < max => {
                    let delay = self.retry.delay_for(attempt);
                    warn!(
                        source = %self.name,
                        %url,
                        attempt,
                        max,
                        ?delay,
                        error = %e,
                        "fetch attempt failed; backing off"
                    );
                    counter!("news_fetch_retries_total", "source" => self.name.clone())
                        .increment(1);
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    warn!(source = %self.name, %url, attempt, error = %e, "giving up on endpoint");
                    return Err(e);
                }
            }
        }
    }
}

#[async_trait]
impl SourceFetcher for HttpSourceFetcher {
    async fn fetch(&self) -> FetchResult {
        let t0 = Instant::now();
        let now = self.normalizer.now();
        let mut result = FetchResult::default();
        let mut seen = HrefSeen::new();

        for (idx, strategy) in self.strategies.iter().enumerate() {
            let outcomes = join_all(
                strategy
                    .endpoints
                    .iter()
                    .map(|url| async move { (url.as_str(), self.get_with_retry(url).await) }),
            )
            .await;

            let mut records = Vec::new();
            for (url, outcome) in outcomes {
                let body = match outcome {
                    Ok(body) => body,
                    Err(e) => {
                        counter!("news_endpoint_failures_total", "source" => self.name.clone())
                            .increment(1);
                        result.errors.push(e);
                        continue;
                    }
                };
                match strategy.extractor.extract(&body) {
                    Ok(extraction) => {
                        for skipped in &extraction.skipped {
                            debug!(source = %self.name, %url, error = %skipped, "record skipped");
                        }
                        counter!("news_records_extracted_total", "source" => self.name.clone())
                            .increment(extraction.records.len() as u64);
                        counter!("news_records_skipped_total", "source" => self.name.clone())
                            .increment(extraction.skipped.len() as u64);
                        records.extend(extraction.records);
                    }
                    Err(e) => {
                        warn!(
                            source = %self.name,
                            %url,
                            extractor = strategy.extractor.name(),
                            error = %e,
                            "unusable response body"
                        );
                        counter!("news_endpoint_failures_total", "source" => self.name.clone())
                            .increment(1);
                        result.errors.push(FetchError::permanent(url, e.to_string()));
                    }
                }
            }

            let (fresh, dup) = seen.retain_new(records);
            counter!("news_dedup_total", "stage" => "href").increment(dup as u64);

            for raw in &fresh {
                match self.normalizer.normalize(raw, &self.base_url, &self.name, now) {
                    Ok(article) => result.articles.push(article),
                    Err(reason) => {
                        debug!(source = %self.name, href = %raw.href, %reason, "record rejected");
                        counter!("news_records_rejected_total", "source" => self.name.clone())
                            .increment(1);
                    }
                }
            }

            if !result.articles.is_empty() {
                if idx > 0 {
                    info!(
                        source = %self.name,
                        extractor = strategy.extractor.name(),
                        "fallback strategy produced articles"
                    );
                }
                break;
            }
            debug!(
                source = %self.name,
                extractor = strategy.extractor.name(),
                "strategy produced nothing"
            );
        }

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("news_fetch_duration_ms", "source" => self.name.clone()).record(ms);
        info!(
            source = %self.name,
            articles = result.articles.len(),
            errors = result.errors.len(),
            elapsed_ms = ms as u64,
            "source fetch finished"
        );
        result
    }

    fn name(&self) -> &str {
        &self.name
    }
}

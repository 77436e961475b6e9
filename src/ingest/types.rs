// src/ingest/types.rs
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::ingest::error::{ExtractionError, FetchError};

/// Display format every `published_at` renders in.
pub const CANONICAL_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Category assigned when a source does not supply a resource type.
pub const DEFAULT_CATEGORY: &str = "article";

/// Canonical news record produced by the normalizer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Article {
    pub title: String,
    pub published_at: DateTime<FixedOffset>, // canonical offset, whole seconds
    pub url: String,                         // always absolute http(s)
    pub source: String,                      // registered source name
    pub category: String,
    /// Hotness weight; filled in by the ranking pass, 0 before that.
    #[serde(default)]
    pub score: u32,
}

impl Article {
    /// `published_at` in the canonical display format.
    pub fn display_time(&self) -> String {
        self.published_at.format(CANONICAL_FORMAT).to_string()
    }

    /// Stable short id derived from the url, for renderers that key cards.
    pub fn id(&self) -> String {
        use sha2::{Digest, Sha256};
        let digest = Sha256::digest(self.url.as_bytes());
        let mut out = String::with_capacity(16);
        for b in digest.iter().take(8) {
            use std::fmt::Write as _;
            let _ = write!(&mut out, "{:02x}", b);
        }
        out
    }
}

/// Pre-normalization tuple handed over by an extractor.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawRecord {
    pub title: String,
    pub href: String,
    pub raw_timestamp: Option<String>,
    pub resource_type: Option<String>,
}

impl RawRecord {
    pub fn new(title: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            href: href.into(),
            raw_timestamp: None,
            resource_type: None,
        }
    }

    pub fn with_timestamp(mut self, ts: impl Into<String>) -> Self {
        self.raw_timestamp = Some(ts.into());
        self
    }

    pub fn with_resource_type(mut self, kind: impl Into<String>) -> Self {
        self.resource_type = Some(kind.into());
        self
    }
}

/// Output of one extractor run over one response body.
#[derive(Debug, Default)]
pub struct Extraction {
    pub records: Vec<RawRecord>,
    /// Records the extractor gave up on; siblings are unaffected.
    pub skipped: Vec<ExtractionError>,
}

impl Extraction {
    pub fn push(&mut self, rec: Result<RawRecord, ExtractionError>) {
        match rec {
            Ok(r) => self.records.push(r),
            Err(e) => self.skipped.push(e),
        }
    }
}

/// Source-specific markup/API parser. Receives raw bytes of one endpoint body.
///
/// An `Err` means the body as a whole could not be understood (malformed
/// JSON/XML); individual bad records belong in `Extraction::skipped`.
pub trait Extractor: Send + Sync {
    fn extract(&self, body: &[u8]) -> Result<Extraction, ExtractionError>;
    fn name(&self) -> &'static str;
}

/// Transient result of one fetch pass for a source.
#[derive(Debug, Default)]
pub struct FetchResult {
    pub articles: Vec<Article>,
    pub errors: Vec<FetchError>,
}

impl FetchResult {
    /// First recorded endpoint failure, if any.
    pub fn error(&self) -> Option<&FetchError> {
        self.errors.first()
    }

    /// A pass counts as failed when nothing usable came back.
    pub fn is_failure(&self) -> bool {
        self.articles.is_empty()
    }
}

#[async_trait::async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Never errors: endpoint failures are collected into `FetchResult::errors`.
    async fn fetch(&self) -> FetchResult;
    fn name(&self) -> &str;
}

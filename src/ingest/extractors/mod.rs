// src/ingest/extractors/mod.rs
//! Source-specific parsers behind the `Extractor` seam.
//!
//! Each turns one response body into `RawRecord`s; the core never looks at
//! markup or API shapes itself.

pub mod reuters_html;
pub mod rss;
pub mod wallstreetcn_api;
pub mod wallstreetcn_html;

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::ingest::error::ExtractionError;
use crate::ingest::types::Extractor;

pub use reuters_html::ReutersHtmlExtractor;
pub use rss::RssExtractor;
pub use wallstreetcn_api::WallstreetcnApiExtractor;
pub use wallstreetcn_html::WallstreetcnHtmlExtractor;

/// Config-facing name of an extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractorKind {
    ReutersHtml,
    WallstreetcnApi,
    WallstreetcnHtml,
    Rss,
}

impl ExtractorKind {
    pub fn build(self) -> Arc<dyn Extractor> {
        match self {
            Self::ReutersHtml => Arc::new(ReutersHtmlExtractor),
            Self::WallstreetcnApi => Arc::new(WallstreetcnApiExtractor),
            Self::WallstreetcnHtml => Arc::new(WallstreetcnHtmlExtractor),
            Self::Rss => Arc::new(RssExtractor),
        }
    }
}

/// Collapse whitespace in text gathered from several DOM text nodes.
pub(crate) fn squash_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub(crate) fn utf8_body(body: &[u8]) -> String {
    String::from_utf8_lossy(body).into_owned()
}

/// Compile a CSS selector; literals only, so failure means a typo here.
pub(crate) fn selector(css: &'static str) -> Result<scraper::Selector, ExtractionError> {
    scraper::Selector::parse(css)
        .map_err(|e| ExtractionError::MalformedBody(format!("bad selector {css}: {e:?}")))
}

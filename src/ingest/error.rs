// src/ingest/error.rs
use thiserror::Error;

/// Failure of a single endpoint request, after retries where applicable.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// Timeouts, 429/5xx, connection resets. Retried by the fetcher.
    #[error("transient failure fetching {url}: {reason}")]
    Transient { url: String, reason: String },

    /// Other 4xx statuses and malformed bodies. Never retried.
    #[error("permanent failure fetching {url}: {reason}")]
    Permanent { url: String, reason: String },
}

impl FetchError {
    pub fn transient(url: &str, reason: impl Into<String>) -> Self {
        Self::Transient {
            url: url.to_string(),
            reason: reason.into(),
        }
    }

    pub fn permanent(url: &str, reason: impl Into<String>) -> Self {
        Self::Permanent {
            url: url.to_string(),
            reason: reason.into(),
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }

    pub fn url(&self) -> &str {
        match self {
            Self::Transient { url, .. } | Self::Permanent { url, .. } => url,
        }
    }
}

/// Extractor could not produce a record (or, at body level, anything at all).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("record is missing {0}")]
    MissingField(&'static str),

    #[error("malformed record: {0}")]
    MalformedRecord(String),

    #[error("malformed body: {0}")]
    MalformedBody(String),
}

/// Why the normalizer declined a raw record.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Rejection {
    #[error("title is empty")]
    EmptyTitle,

    #[error("title shorter than {min} chars: {title:?}")]
    TitleTooShort { title: String, min: usize },

    #[error("href cannot be made absolute: {0:?}")]
    UnresolvableHref(String),
}

/// Caller asked for a source that was never registered.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown news source: {0}")]
pub struct UnknownSourceError(pub String);

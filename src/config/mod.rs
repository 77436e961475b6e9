//! Aggregator configuration: TOML or JSON on disk, env overrides on top,
//! built-in defaults underneath.
//!
//! Lookup order for `load_default()`:
//! 1) $NEWS_CONFIG_PATH
//! 2) config/news.toml
//! 3) config/news.json
//! 4) built-in defaults

pub mod sources;

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::hotness::HotnessTable;
use crate::ingest::normalize::{
    canonical_offset, Normalizer, DEFAULT_MIN_TITLE_CHARS, DEFAULT_UTC_OFFSET_SECS,
};
use crate::ingest::retry::{RetryPolicy, DEFAULT_TRANSIENT_STATUSES};

pub use sources::{default_sources, SourceConfig, StrategyConfig};

pub const ENV_CONFIG_PATH: &str = "NEWS_CONFIG_PATH";
pub const ENV_CACHE_TTL_SECS: &str = "NEWS_CACHE_TTL_SECS";
pub const ENV_RETRY_ATTEMPTS: &str = "NEWS_RETRY_ATTEMPTS";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "NEWS_REQUEST_TIMEOUT_SECS";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    pub cache_ttl_secs: u64,
    pub request_timeout_secs: u64,
    /// Whole `fetch_all` deadline; derived from source budgets when absent.
    pub overall_timeout_secs: Option<u64>,
    pub canonical_utc_offset_secs: i32,
    pub min_title_chars: usize,
    pub retry: RetryConfig,
    /// Replaces the built-in hotness lexicon when present.
    pub hotness: Option<HashMap<String, u32>>,
    pub sources: Vec<SourceConfig>,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: 60,
            request_timeout_secs: 10,
            overall_timeout_secs: None,
            canonical_utc_offset_secs: DEFAULT_UTC_OFFSET_SECS,
            min_title_chars: DEFAULT_MIN_TITLE_CHARS,
            retry: RetryConfig::default(),
            hotness: None,
            sources: default_sources(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub backoff_base_ms: u64,
    pub backoff_max_ms: u64,
    pub jitter_ms: u64,
    pub transient_statuses: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base_ms: 500,
            backoff_max_ms: 8_000,
            jitter_ms: 100,
            transient_statuses: DEFAULT_TRANSIENT_STATUSES.to_vec(),
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            base_delay: Duration::from_millis(self.backoff_base_ms),
            max_delay: Duration::from_millis(self.backoff_max_ms.max(self.backoff_base_ms)),
            jitter: Duration::from_millis(self.jitter_ms),
            transient_statuses: self.transient_statuses.clone(),
        }
    }
}

impl AggregatorConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn normalizer(&self) -> Normalizer {
        Normalizer::new(
            canonical_offset(self.canonical_utc_offset_secs),
            self.min_title_chars,
        )
    }

    pub fn hotness_table(&self) -> HotnessTable {
        match &self.hotness {
            Some(map) => HotnessTable::from_map(map.clone()),
            None => HotnessTable::default(),
        }
    }

    /// Env values win over file values; unparsable values are ignored.
    pub fn apply_env_overrides(&mut self) {
        if let Some(v) = env_u64(ENV_CACHE_TTL_SECS) {
            self.cache_ttl_secs = v;
        }
        if let Some(v) = env_u64(ENV_RETRY_ATTEMPTS) {
            self.retry.max_attempts = v.clamp(1, u32::MAX as u64) as u32;
        }
        if let Some(v) = env_u64(ENV_REQUEST_TIMEOUT_SECS) {
            self.request_timeout_secs = v;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.sources.is_empty() {
            bail!("no news sources configured");
        }
        if self.retry.max_attempts == 0 {
            bail!("retry.max_attempts must be at least 1");
        }
        if self.request_timeout_secs == 0 {
            bail!("request_timeout_secs must be positive");
        }
        if !(-86_399..=86_399).contains(&self.canonical_utc_offset_secs) {
            bail!(
                "canonical_utc_offset_secs out of range: {}",
                self.canonical_utc_offset_secs
            );
        }

        let mut names = HashSet::new();
        for src in &self.sources {
            let name = src.name.trim();
            if name.is_empty() {
                bail!("source with empty name");
            }
            if !names.insert(name.to_string()) {
                bail!("duplicate source name: {name}");
            }
            let base = url::Url::parse(&src.base_url)
                .with_context(|| format!("source {name}: invalid base_url {:?}", src.base_url))?;
            if !matches!(base.scheme(), "http" | "https") {
                bail!("source {name}: base_url must be http(s)");
            }
            if src.strategies.is_empty() {
                bail!("source {name}: no strategies");
            }
            for (i, st) in src.strategies.iter().enumerate() {
                if st.endpoints.is_empty() {
                    bail!("source {name}: strategy #{i} has no endpoints");
                }
            }
        }
        Ok(())
    }
}

fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok().and_then(|s| s.trim().parse::<u64>().ok())
}

/// Load config from an explicit path. Supports TOML or JSON formats.
pub fn load_from(path: &Path) -> Result<AggregatorConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading news config from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let mut cfg = parse_config(&content, ext.as_str())
        .with_context(|| format!("parsing news config {}", path.display()))?;
    cfg.apply_env_overrides();
    cfg.validate()?;
    Ok(cfg)
}

/// Load config using env var + fallbacks (see module docs).
pub fn load_default() -> Result<AggregatorConfig> {
    if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_from(&pb);
        }
        return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
    }
    for candidate in ["config/news.toml", "config/news.json"] {
        let p = PathBuf::from(candidate);
        if p.exists() {
            return load_from(&p);
        }
    }
    let mut cfg = AggregatorConfig::default();
    cfg.apply_env_overrides();
    cfg.validate()?;
    Ok(cfg)
}

fn parse_config(s: &str, hint_ext: &str) -> Result<AggregatorConfig> {
    match hint_ext {
        "toml" => Ok(toml::from_str(s)?),
        "json" => Ok(serde_json::from_str(s)?),
        _ => {
            // No usable extension: JSON if it looks like an object, else TOML.
            if s.trim_start().starts_with('{') {
                Ok(serde_json::from_str(s)?)
            } else {
                Ok(toml::from_str(s)?)
            }
        }
    }
}

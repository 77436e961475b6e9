//! Per-source configuration and the built-in source seed.

use serde::{Deserialize, Serialize};

use crate::ingest::extractors::ExtractorKind;

/// One upstream provider: where relative links resolve against and the
/// ordered strategies used to fetch it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub name: String,
    pub base_url: String,
    pub strategies: Vec<StrategyConfig>,
}

/// An extractor and the equivalent endpoints (mirrors) it parses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyConfig {
    pub extractor: ExtractorKind,
    pub endpoints: Vec<String>,
}

impl SourceConfig {
    pub fn new(name: &str, base_url: &str) -> Self {
        Self {
            name: name.to_string(),
            base_url: base_url.to_string(),
            strategies: Vec::new(),
        }
    }

    pub fn strategy(mut self, extractor: ExtractorKind, endpoints: &[&str]) -> Self {
        self.strategies.push(StrategyConfig {
            extractor,
            endpoints: endpoints.iter().map(|s| s.to_string()).collect(),
        });
        self
    }
}

/// Sources used when no config file names any.
pub fn default_sources() -> Vec<SourceConfig> {
    vec![
        SourceConfig::new("wallstreetcn", "https://wallstreetcn.com")
            .strategy(
                ExtractorKind::WallstreetcnApi,
                &["https://api.wscn.net/apiv1/content/information-flow?channel=global&limit=50"],
            )
            .strategy(
                ExtractorKind::WallstreetcnHtml,
                &["https://wallstreetcn.com/news/global"],
            ),
        SourceConfig::new("reuters", "https://www.reuters.com").strategy(
            ExtractorKind::ReutersHtml,
            &[
                "https://www.reuters.com/world",
                "https://www.reuters.com/business",
                "https://www.reuters.com/markets",
            ],
        ),
    ]
}

// src/export.rs
//! Feed exports: the per-day links file and a JSON dump in the wire shape
//! the HTTP surface serves.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::ingest::normalize::Normalizer;
use crate::ingest::Article;

/// Wire shape of one feed item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleView {
    pub id: String,
    pub title: String,
    pub datetime: String,
    pub link: String,
    pub source: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub score: u32,
}

impl From<&Article> for ArticleView {
    fn from(a: &Article) -> Self {
        Self {
            id: a.id(),
            title: a.title.clone(),
            datetime: a.display_time(),
            link: a.url.clone(),
            source: a.source.clone(),
            kind: a.category.clone(),
            score: a.score,
        }
    }
}

pub fn to_views(articles: &[Article]) -> Vec<ArticleView> {
    articles.iter().map(ArticleView::from).collect()
}

/// Today's date in the canonical zone.
pub fn canonical_today(normalizer: &Normalizer) -> NaiveDate {
    normalizer.now().date_naive()
}

/// Urls of articles published on `date` (canonical zone), trailing `/`
/// stripped, first occurrence kept.
pub fn links_for_date(articles: &[Article], date: NaiveDate) -> Vec<String> {
    let mut seen = HashSet::new();
    articles
        .iter()
        .filter(|a| a.published_at.date_naive() == date)
        .map(|a| a.url.trim_end_matches('/').to_string())
        .filter(|link| !link.is_empty() && seen.insert(link.clone()))
        .collect()
}

/// Write `links_for_date` one per line. Returns how many were written.
pub fn write_links_file(path: &Path, articles: &[Article], date: NaiveDate) -> Result<usize> {
    let links = links_for_date(articles, date);
    ensure_parent(path)?;
    let mut body = links.join("\n");
    if !body.is_empty() {
        body.push('\n');
    }
    fs::write(path, body).with_context(|| format!("writing links to {}", path.display()))?;
    Ok(links.len())
}

/// Pretty JSON array of `ArticleView`s.
pub fn write_json(path: &Path, articles: &[Article]) -> Result<()> {
    ensure_parent(path)?;
    let json = serde_json::to_string_pretty(&to_views(articles)).context("serializing feed")?;
    fs::write(path, json).with_context(|| format!("writing feed json to {}", path.display()))
}

fn ensure_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => fs::create_dir_all(dir)
            .with_context(|| format!("creating directory {}", dir.display())),
        _ => Ok(()),
    }
}

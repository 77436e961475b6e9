//! One-shot fetch: builds the aggregator from config, prints the merged feed
//! (or one source via NEWS_SOURCE) and optionally writes exports.
//!
//! NEWS_JSON_OUT   path for a JSON dump of the feed
//! NEWS_LINKS_OUT  path for the links-of-the-day file
//! NEWS_LINKS_DATE YYYY-MM-DD for the links file (default: today, canonical zone)

use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::path::PathBuf;

use news_aggregator::export::{canonical_today, write_json, write_links_file};
use news_aggregator::{config, logging, Aggregator};

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    logging::init_tracing();

    let cfg = config::load_default().context("loading news config")?;
    let agg = Aggregator::from_config(&cfg)?;

    let feed = match std::env::var("NEWS_SOURCE").ok().filter(|s| !s.is_empty()) {
        Some(name) => agg.fetch_by_source(&name).await?,
        None => agg.fetch_all().await,
    };

    for a in &feed {
        println!("[{}] {} ({}, {})", a.source, a.title, a.display_time(), a.score);
        println!("    {}", a.url);
    }
    println!("{} articles", feed.len());

    if let Ok(p) = std::env::var("NEWS_JSON_OUT") {
        let path = PathBuf::from(p);
        write_json(&path, &feed)?;
        println!("feed written to {}", path.display());
    }

    if let Ok(p) = std::env::var("NEWS_LINKS_OUT") {
        let date = match std::env::var("NEWS_LINKS_DATE") {
            Ok(d) => NaiveDate::parse_from_str(d.trim(), "%Y-%m-%d")
                .with_context(|| format!("NEWS_LINKS_DATE not YYYY-MM-DD: {d}"))?,
            Err(_) => canonical_today(&cfg.normalizer()),
        };
        let path = PathBuf::from(p);
        let n = write_links_file(&path, &feed, date)?;
        println!("{n} links for {date} written to {}", path.display());
    }
    Ok(())
}

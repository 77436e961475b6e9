// src/ingest/extractors/wallstreetcn_html.rs
//! Server-rendered WallStreetCN listing; used when the content API is down.
//! Card markup has changed over time, so several container selectors are
//! tried in order and the first that matches anything wins.

use scraper::{ElementRef, Html};

use super::{selector, squash_ws, utf8_body};
use crate::ingest::error::ExtractionError;
use crate::ingest::types::{Extraction, Extractor, RawRecord};

const CARD_SELECTORS: &[&str] = &[
    "article.athing",
    "div.news-item",
    r#"div[data-component="NewsItem"]"#,
    "div.c-card-item",
];

pub struct WallstreetcnHtmlExtractor;

fn card_record(
    card: ElementRef<'_>,
    link_sel: &scraper::Selector,
    time_sel: &scraper::Selector,
) -> Result<RawRecord, ExtractionError> {
    let a = card
        .select(link_sel)
        .next()
        .ok_or(ExtractionError::MissingField("link"))?;
    let title = squash_ws(&a.text().collect::<Vec<_>>().join(" "));
    if title.is_empty() {
        return Err(ExtractionError::MissingField("title"));
    }
    let href = a
        .value()
        .attr("href")
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .ok_or(ExtractionError::MissingField("href"))?;

    let mut rec = RawRecord::new(title, href);
    rec.raw_timestamp = card.select(time_sel).next().and_then(|t| {
        let text = t
            .value()
            .attr("datetime")
            .map(str::to_string)
            .unwrap_or_else(|| squash_ws(&t.text().collect::<String>()));
        Some(text).filter(|s| !s.is_empty())
    });
    Ok(rec)
}

impl Extractor for WallstreetcnHtmlExtractor {
    fn extract(&self, body: &[u8]) -> Result<Extraction, ExtractionError> {
        let html = utf8_body(body);
        if html.trim().is_empty() {
            return Err(ExtractionError::MalformedBody("empty body".into()));
        }
        let doc = Html::parse_document(&html);
        let link_sel = selector("a")?;
        let time_sel = selector("time")?;

        let mut out = Extraction::default();
        for css in CARD_SELECTORS {
            let cards = selector(*css)?;
            let matched: Vec<ElementRef<'_>> = doc.select(&cards).collect();
            if matched.is_empty() {
                continue;
            }
            for card in matched {
                out.push(card_record(card, &link_sel, &time_sel));
            }
            break;
        }
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "wallstreetcn_html"
    }
}

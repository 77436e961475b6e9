// src/ingest/extractors/reuters_html.rs
//! Reuters section pages (`/world`, `/business`, `/markets`).
//!
//! Article anchors are recognized by their path; the headline is taken from
//! a heading inside the anchor, else the anchor text, else the first long
//! `<span>`.
//! A `<time datetime>` in the enclosing `<article>` (or nearest `<div>`)
//! supplies the timestamp.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::{selector, squash_ws, utf8_body};
use crate::ingest::error::ExtractionError;
use crate::ingest::types::{Extraction, Extractor, RawRecord};

static ARTICLE_PATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/article/|/world/|/business/|/markets/").expect("article path regex"));

/// Anchor text shorter than this is usually a kicker or section label.
const MIN_LINK_TEXT_CHARS: usize = 11;

pub struct ReutersHtmlExtractor;

struct Selectors {
    links: Selector,
    headings: Selector,
    spans: Selector,
    times: Selector,
}

impl Selectors {
    fn compile() -> Result<Self, ExtractionError> {
        Ok(Self {
            links: selector("a[href]")?,
            headings: selector("h2, h3, h4")?,
            spans: selector("span")?,
            times: selector("time[datetime]")?,
        })
    }
}

fn element_text(el: ElementRef<'_>) -> String {
    squash_ws(&el.text().collect::<Vec<_>>().join(" "))
}

fn link_title(a: ElementRef<'_>, sel: &Selectors) -> Option<String> {
    // a heading beats the full anchor text, which also carries kickers
    if let Some(h) = a.select(&sel.headings).next() {
        let t = element_text(h);
        if !t.is_empty() {
            return Some(t);
        }
    }
    let own = element_text(a);
    if own.chars().count() >= MIN_LINK_TEXT_CHARS {
        return Some(own);
    }
    a.select(&sel.spans)
        .map(element_text)
        .find(|t| t.chars().count() >= MIN_LINK_TEXT_CHARS)
}

fn enclosing<'a>(a: ElementRef<'a>, tag: &str) -> Option<ElementRef<'a>> {
    a.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|e| e.value().name() == tag)
}

fn nearby_timestamp(a: ElementRef<'_>, sel: &Selectors) -> Option<String> {
    let container = enclosing(a, "article").or_else(|| enclosing(a, "div"))?;
    container
        .select(&sel.times)
        .next()
        .and_then(|t| t.value().attr("datetime"))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

impl Extractor for ReutersHtmlExtractor {
    fn extract(&self, body: &[u8]) -> Result<Extraction, ExtractionError> {
        let html = utf8_body(body);
        if html.trim().is_empty() {
            return Err(ExtractionError::MalformedBody("empty body".into()));
        }
        let sel = Selectors::compile()?;
        let doc = Html::parse_document(&html);

        let mut out = Extraction::default();
        for a in doc.select(&sel.links) {
            let href = a.value().attr("href").unwrap_or_default().trim();
            if href.is_empty() || !ARTICLE_PATH.is_match(href) {
                continue;
            }
            let rec = match link_title(a, &sel) {
                Some(title) => {
                    let mut rec = RawRecord::new(title, href).with_resource_type("article");
                    rec.raw_timestamp = nearby_timestamp(a, &sel);
                    Ok(rec)
                }
                None => Err(ExtractionError::MissingField("title")),
            };
            out.push(rec);
        }
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "reuters_html"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
<html><body>
  <article>
    <a href="/world/asia/markets-surge-on-stimulus-2024-01-01/">Asian markets surge on fresh stimulus hopes</a>
    <time datetime="2024-01-01T02:00:00Z">Jan 1</time>
  </article>
  <div class="story">
    <a href="/business/autos/ev-maker-plans/"><span>Autos</span><h3>EV maker plans new plant in Mexico</h3></a>
  </div>
  <div><a href="/markets/x/"><span>Hi</span></a></div>
  <a href="/about-us/">About Reuters and our standards</a>
</body></html>"#;

    #[test]
    fn extracts_titles_links_and_times() {
        let ex = ReutersHtmlExtractor.extract(PAGE.as_bytes()).unwrap();
        assert_eq!(ex.records.len(), 2);

        let first = &ex.records[0];
        assert_eq!(first.title, "Asian markets surge on fresh stimulus hopes");
        assert_eq!(
            first.href,
            "/world/asia/markets-surge-on-stimulus-2024-01-01/"
        );
        assert_eq!(first.raw_timestamp.as_deref(), Some("2024-01-01T02:00:00Z"));

        let second = &ex.records[1];
        assert_eq!(second.title, "EV maker plans new plant in Mexico");
        assert_eq!(second.raw_timestamp, None);
    }

    #[test]
    fn untitled_anchor_is_skipped_not_fatal() {
        let ex = ReutersHtmlExtractor.extract(PAGE.as_bytes()).unwrap();
        assert_eq!(ex.skipped, vec![ExtractionError::MissingField("title")]);
    }

    #[test]
    fn empty_body_is_malformed() {
        assert!(ReutersHtmlExtractor.extract(b"   ").is_err());
    }
}

// src/ingest/extractors/rss.rs
use quick_xml::de::from_str;
use serde::Deserialize;

use super::utf8_body;
use crate::ingest::error::ExtractionError;
use crate::ingest::types::{Extraction, Extractor, RawRecord};

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
}

/// Plain RSS 2.0 feed; `pubDate` (RFC 2822) is passed through untouched.
pub struct RssExtractor;

impl Extractor for RssExtractor {
    fn extract(&self, body: &[u8]) -> Result<Extraction, ExtractionError> {
        let xml_clean = scrub_html_entities_for_xml(&utf8_body(body));
        let rss: Rss = from_str(&xml_clean)
            .map_err(|e| ExtractionError::MalformedBody(format!("rss xml: {e}")))?;

        let mut out = Extraction::default();
        for it in rss.channel.item {
            let rec = match (it.title, it.link) {
                (Some(title), Some(link)) if !title.trim().is_empty() && !link.trim().is_empty() => {
                    let mut rec = RawRecord::new(title, link.trim());
                    rec.raw_timestamp = it.pub_date;
                    Ok(rec)
                }
                (None, _) => Err(ExtractionError::MissingField("title")),
                (Some(t), _) if t.trim().is_empty() => Err(ExtractionError::MissingField("title")),
                _ => Err(ExtractionError::MissingField("link")),
            };
            out.push(rec);
        }
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "rss"
    }
}

// XML only knows five named entities; feeds routinely ship HTML ones.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}

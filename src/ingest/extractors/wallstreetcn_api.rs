// src/ingest/extractors/wallstreetcn_api.rs
//! WallStreetCN content API (`/apiv1/content/information-flow`, `/lives`).
//!
//! information-flow wraps each entry as `{resource_type, resource: {title,
//! uri, display_time}}`; lives entries are flat `{title, content_text, uri,
//! display_time}` and are tagged `live`.

use serde::Deserialize;
use serde_json::Value;

use super::squash_ws;
use crate::ingest::error::ExtractionError;
use crate::ingest::types::{Extraction, Extractor, RawRecord};

#[derive(Debug, Deserialize)]
struct Envelope {
    data: Option<Data>,
}

#[derive(Debug, Deserialize)]
struct Data {
    #[serde(default)]
    items: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct Item {
    resource_type: Option<String>,
    resource: Option<Resource>,
    // flat (lives) shape
    title: Option<String>,
    content_text: Option<String>,
    uri: Option<String>,
    display_time: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct Resource {
    title: Option<String>,
    uri: Option<String>,
    display_time: Option<Value>,
    #[serde(rename = "type")]
    kind: Option<String>,
    resource_type: Option<String>,
}

fn non_blank(s: Option<String>) -> Option<String> {
    s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Epoch seconds arrive as numbers, occasionally as strings.
fn timestamp_text(v: Option<Value>) -> Option<String> {
    match v? {
        Value::Number(n) => n.as_i64().map(|x| x.to_string()),
        Value::String(s) => non_blank(Some(s)),
        _ => None,
    }
}

fn record_from(value: Value) -> Result<RawRecord, ExtractionError> {
    let item: Item =
        serde_json::from_value(value).map_err(|e| ExtractionError::MalformedRecord(e.to_string()))?;

    let (title, uri, ts, kind) = match item.resource {
        Some(res) => {
            let kind = non_blank(item.resource_type)
                .or_else(|| non_blank(res.kind))
                .or_else(|| non_blank(res.resource_type));
            (res.title, res.uri, res.display_time, kind)
        }
        None => {
            let title = non_blank(item.title)
                .or_else(|| non_blank(item.content_text).map(|t| squash_ws(&t)));
            let kind = non_blank(item.resource_type).or_else(|| Some("live".to_string()));
            (title, item.uri, item.display_time, kind)
        }
    };

    let title = non_blank(title).ok_or(ExtractionError::MissingField("title"))?;
    let uri = non_blank(uri).ok_or(ExtractionError::MissingField("uri"))?;

    Ok(RawRecord {
        title,
        href: uri,
        raw_timestamp: timestamp_text(ts),
        resource_type: kind,
    })
}

pub struct WallstreetcnApiExtractor;

impl Extractor for WallstreetcnApiExtractor {
    fn extract(&self, body: &[u8]) -> Result<Extraction, ExtractionError> {
        let env: Envelope = serde_json::from_slice(body)
            .map_err(|e| ExtractionError::MalformedBody(format!("wallstreetcn json: {e}")))?;
        let data = env
            .data
            .ok_or_else(|| ExtractionError::MalformedBody("wallstreetcn json: no data".into()))?;

        let mut out = Extraction::default();
        for value in data.items {
            out.push(record_from(value));
        }
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "wallstreetcn_api"
    }
}

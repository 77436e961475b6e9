// src/ingest/normalize.rs
//! Raw record → canonical `Article`: title cleanup, href resolution and
//! timestamp canonicalization.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Offset, TimeZone, Timelike, Utc};
use time::format_description::well_known::{Rfc2822, Rfc3339};
use time::OffsetDateTime;

use crate::ingest::error::Rejection;
use crate::ingest::types::{Article, RawRecord, DEFAULT_CATEGORY};

pub const DEFAULT_MIN_TITLE_CHARS: usize = 5;
/// Asia/Shanghai, which has no DST, so a fixed offset is exact.
pub const DEFAULT_UTC_OFFSET_SECS: i32 = 8 * 3600;

const MAX_TITLE_CHARS: usize = 300;

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

/// Build the canonical offset; out-of-range values fall back to UTC.
pub fn canonical_offset(secs: i32) -> FixedOffset {
    FixedOffset::east_opt(secs).unwrap_or_else(|| Utc.fix())
}

/// Clean a display title: decode entities, strip tags, collapse whitespace.
/// Case and punctuation are preserved since titles are compared exactly.
pub fn clean_title(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    // 3) Collapse whitespace (incl. NBSP, which `\s` covers in Unicode mode)
    static RE_WS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();
    out = out.trim().to_string();

    // 4) Length cap
    if out.chars().count() > MAX_TITLE_CHARS {
        out = out.chars().take(MAX_TITLE_CHARS).collect();
    }

    out
}

/// Make `href` absolute against `base_url`.
///
/// Leading `/` → prefixed with the base; `http(s)://` → kept verbatim;
/// anything else (`//host` links, bare relative paths, `ftp:`, ...) → `None`.
pub fn resolve_href(href: &str, base_url: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }

    // protocol-relative links would otherwise land on the base host
    if href.starts_with("//") {
        return None;
    }

    let candidate = if href.starts_with('/') {
        format!("{}{}", base_url.trim_end_matches('/'), href)
    } else {
        let lower = href.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            href.to_string()
        } else {
            return None;
        }
    };

    match url::Url::parse(&candidate) {
        Ok(u) if matches!(u.scheme(), "http" | "https") && u.host_str().is_some() => {
            Some(candidate)
        }
        _ => None,
    }
}

fn truncate_to_secs(dt: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
    dt.with_nanosecond(0).unwrap_or(dt)
}

#[derive(Debug, Clone)]
pub struct Normalizer {
    offset: FixedOffset,
    min_title_chars: usize,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(
            canonical_offset(DEFAULT_UTC_OFFSET_SECS),
            DEFAULT_MIN_TITLE_CHARS,
        )
    }
}

impl Normalizer {
    pub fn new(offset: FixedOffset, min_title_chars: usize) -> Self {
        Self {
            offset,
            min_title_chars,
        }
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Current time in the canonical timezone, whole seconds.
    pub fn now(&self) -> DateTime<FixedOffset> {
        truncate_to_secs(Utc::now().with_timezone(&self.offset))
    }

    /// Convert one raw record; `now` stands in for a missing or unparseable
    /// timestamp, so such articles rank as most recent.
    pub fn normalize(
        &self,
        raw: &RawRecord,
        base_url: &str,
        source: &str,
        now: DateTime<FixedOffset>,
    ) -> Result<Article, Rejection> {
        let title = clean_title(&raw.title);
        if title.is_empty() {
            return Err(Rejection::EmptyTitle);
        }
        if title.chars().count() < self.min_title_chars {
            return Err(Rejection::TitleTooShort {
                title,
                min: self.min_title_chars,
            });
        }

        let url = resolve_href(&raw.href, base_url)
            .ok_or_else(|| Rejection::UnresolvableHref(raw.href.clone()))?;

        let published_at = raw
            .raw_timestamp
            .as_deref()
            .and_then(|ts| self.parse_timestamp(ts, now))
            .unwrap_or_else(|| truncate_to_secs(now.with_timezone(&self.offset)));

        let category = raw
            .resource_type
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_CATEGORY)
            .to_string();

        Ok(Article {
            title,
            published_at,
            url,
            source: source.to_string(),
            category,
            score: 0,
        })
    }

    /// Parse epoch seconds, RFC 3339, RFC 2822, naive local datetimes (read in
    /// the canonical zone) and bare dates (paired with `now`'s time of day).
    pub fn parse_timestamp(
        &self,
        raw: &str,
        now: DateTime<FixedOffset>,
    ) -> Option<DateTime<FixedOffset>> {
        let s = raw.trim();
        if s.is_empty() {
            return None;
        }

        if s.bytes().all(|b| b.is_ascii_digit()) {
            let secs: i64 = s.parse().ok()?;
            return DateTime::from_timestamp(secs, 0).map(|dt| dt.with_timezone(&self.offset));
        }

        if let Some(secs) = OffsetDateTime::parse(s, &Rfc3339)
            .or_else(|_| OffsetDateTime::parse(s, &Rfc2822))
            .ok()
            .map(|dt| dt.unix_timestamp())
        {
            return DateTime::from_timestamp(secs, 0).map(|dt| dt.with_timezone(&self.offset));
        }

        for fmt in NAIVE_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
                return self
                    .offset
                    .from_local_datetime(&naive)
                    .single()
                    .map(truncate_to_secs);
            }
        }

        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            let local_now = now.with_timezone(&self.offset);
            return self
                .offset
                .from_local_datetime(&date.and_time(local_now.time()))
                .single()
                .map(truncate_to_secs);
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_now() -> DateTime<FixedOffset> {
        canonical_offset(DEFAULT_UTC_OFFSET_SECS)
            .with_ymd_and_hms(2024, 3, 5, 9, 30, 15)
            .unwrap()
    }

    #[test]
    fn clean_title_decodes_and_collapses() {
        let s = "  <b>Stocks&nbsp;&amp; bonds</b>\n\t rally  ";
        assert_eq!(clean_title(s), "Stocks & bonds rally");
    }

    #[test]
    fn clean_title_keeps_case_and_punctuation() {
        assert_eq!(clean_title("Fed holds rates?!"), "Fed holds rates?!");
    }

    #[test]
    fn epoch_seconds_convert_to_canonical_zone() {
        let n = Normalizer::default();
        let dt = n.parse_timestamp("1704074400", fixed_now()).unwrap(); // 2024-01-01T02:00:00Z
        assert_eq!(dt.format("%Y-%m-%d %H:%M:%S").to_string(), "2024-01-01 10:00:00");
    }

    #[test]
    fn rfc3339_with_zulu_converts() {
        let n = Normalizer::default();
        let dt = n
            .parse_timestamp("2024-01-01T02:00:00.123Z", fixed_now())
            .unwrap();
        assert_eq!(dt.format("%Y-%m-%d %H:%M:%S").to_string(), "2024-01-01 10:00:00");
        assert_eq!(dt.nanosecond(), 0);
    }

    #[test]
    fn rfc2822_converts() {
        let n = Normalizer::default();
        let dt = n
            .parse_timestamp("Mon, 01 Jan 2024 02:00:00 +0000", fixed_now())
            .unwrap();
        assert_eq!(dt.format("%Y-%m-%d %H:%M:%S").to_string(), "2024-01-01 10:00:00");
    }

    #[test]
    fn naive_datetime_is_read_in_canonical_zone() {
        let n = Normalizer::default();
        let dt = n
            .parse_timestamp("2024-01-01 10:00:00", fixed_now())
            .unwrap();
        assert_eq!(dt.offset().local_minus_utc(), DEFAULT_UTC_OFFSET_SECS);
        assert_eq!(dt.format("%Y-%m-%d %H:%M:%S").to_string(), "2024-01-01 10:00:00");
    }

    #[test]
    fn bare_date_takes_current_time_of_day() {
        let n = Normalizer::default();
        let dt = n.parse_timestamp("2024-01-01", fixed_now()).unwrap();
        assert_eq!(dt.format("%Y-%m-%d %H:%M:%S").to_string(), "2024-01-01 09:30:15");
    }

    #[test]
    fn garbage_timestamp_is_none() {
        let n = Normalizer::default();
        assert!(n.parse_timestamp("yesterday-ish", fixed_now()).is_none());
        assert!(n.parse_timestamp("   ", fixed_now()).is_none());
    }

    #[test]
    fn resolve_href_rules() {
        let base = "https://example.com/";
        assert_eq!(
            resolve_href("/news/x", base).as_deref(),
            Some("https://example.com/news/x")
        );
        assert_eq!(
            resolve_href("http://other.org/a", base).as_deref(),
            Some("http://other.org/a")
        );
        assert_eq!(resolve_href("news/x", base), None);
        assert_eq!(resolve_href("ftp://x", base), None);
        assert_eq!(resolve_href("javascript:void(0)", base), None);
        assert_eq!(resolve_href("", base), None);
    }
}

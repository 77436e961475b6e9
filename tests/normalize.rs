// tests/normalize.rs
//
// Normalizer behaviour through the public API: href resolution, title
// cleanup and rejection, timestamp canonicalization.

use chrono::{DateTime, FixedOffset, TimeZone};

use news_aggregator::ingest::normalize::{canonical_offset, resolve_href};
use news_aggregator::ingest::{Normalizer, RawRecord, Rejection};

const BASE: &str = "https://example.com";

fn now() -> DateTime<FixedOffset> {
    canonical_offset(8 * 3600)
        .with_ymd_and_hms(2024, 3, 5, 9, 30, 15)
        .unwrap()
}

fn norm(raw: RawRecord) -> Result<news_aggregator::Article, Rejection> {
    Normalizer::default().normalize(&raw, BASE, "example", now())
}

#[test]
fn root_relative_href_is_prefixed_with_base() {
    let a = norm(RawRecord::new("Stocks rally on earnings", "/news/x")).unwrap();
    assert_eq!(a.url, "https://example.com/news/x");
    assert_eq!(a.source, "example");
}

#[test]
fn base_trailing_slash_is_not_doubled() {
    assert_eq!(
        resolve_href("/news/x", "https://example.com/").as_deref(),
        Some("https://example.com/news/x")
    );
}

#[test]
fn protocol_relative_href_does_not_resolve_onto_base_host() {
    assert_eq!(resolve_href("//cdn.other.com/x", BASE), None);
}

#[test]
fn absolute_href_is_kept() {
    let a = norm(RawRecord::new("Stocks rally on earnings", "https://cdn.example.org/a?b=1")).unwrap();
    assert_eq!(a.url, "https://cdn.example.org/a?b=1");
}

#[test]
fn non_http_hrefs_are_rejected() {
    for href in [
        "ftp://x",
        "javascript:void(0)",
        "news/x",
        "",
        "mailto:a@b.c",
        "//cdn.other.com/x",
    ] {
        let res = norm(RawRecord::new("Stocks rally on earnings", href));
        assert!(
            matches!(res, Err(Rejection::UnresolvableHref(_))),
            "{href:?} should be rejected, got {res:?}"
        );
    }
}

#[test]
fn short_and_empty_titles_are_rejected() {
    assert!(matches!(
        norm(RawRecord::new("  <b></b> ", "/a")),
        Err(Rejection::EmptyTitle)
    ));
    assert!(matches!(
        norm(RawRecord::new("Fed", "/a")),
        Err(Rejection::TitleTooShort { min: 5, .. })
    ));
    // five CJK chars meet the minimum
    assert!(norm(RawRecord::new("美股收盘了", "/a")).is_ok());
}

#[test]
fn title_markup_is_cleaned() {
    let a = norm(RawRecord::new("<span>Oil&nbsp;&amp;\n gas   slide</span>", "/a")).unwrap();
    assert_eq!(a.title, "Oil & gas slide");
}

#[test]
fn timestamps_render_in_canonical_format() {
    let cases = [
        ("2024-01-01 10:00:00", "2024-01-01 10:00:00"),
        ("2024-01-01T10:00:00", "2024-01-01 10:00:00"),
        ("2024-01-01T02:00:00Z", "2024-01-01 10:00:00"),
        ("2024-01-01T10:00:00.750+08:00", "2024-01-01 10:00:00"),
        ("Mon, 01 Jan 2024 02:00:00 +0000", "2024-01-01 10:00:00"),
        ("1704074400", "2024-01-01 10:00:00"),
        ("2024-01-01", "2024-01-01 09:30:15"),
    ];
    for (raw, want) in cases {
        let a = norm(RawRecord::new("Stocks rally on earnings", "/a").with_timestamp(raw)).unwrap();
        assert_eq!(a.display_time(), want, "input {raw:?}");
        assert_eq!(a.published_at.offset().local_minus_utc(), 8 * 3600);
    }
}

#[test]
fn missing_or_garbage_timestamp_falls_back_to_now() {
    let missing = norm(RawRecord::new("Stocks rally on earnings", "/a")).unwrap();
    assert_eq!(missing.published_at, now());

    let garbage =
        norm(RawRecord::new("Stocks rally on earnings", "/a").with_timestamp("3 hours ago")).unwrap();
    assert_eq!(garbage.published_at, now());
}

#[test]
fn category_defaults_to_article() {
    let plain = norm(RawRecord::new("Stocks rally on earnings", "/a")).unwrap();
    assert_eq!(plain.category, "article");

    let live = norm(RawRecord::new("Stocks rally on earnings", "/a").with_resource_type("live")).unwrap();
    assert_eq!(live.category, "live");
    assert_eq!(live.score, 0);
}

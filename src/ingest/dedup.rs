// src/ingest/dedup.rs
//! Order-preserving deduplication; the first occurrence always wins.

use std::collections::HashSet;

use crate::ingest::types::{Article, RawRecord};

/// Per-source href filter spanning one whole fetch pass (all endpoints and
/// strategies), so a link repeated across DOM locations or mirrors is only
/// normalized once.
#[derive(Debug, Default)]
pub struct HrefSeen {
    seen: HashSet<String>,
}

impl HrefSeen {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep the records whose raw href has not been seen yet; returns
    /// (kept, dropped_count).
    pub fn retain_new(&mut self, records: Vec<RawRecord>) -> (Vec<RawRecord>, usize) {
        let mut kept = Vec::with_capacity(records.len());
        let mut dropped = 0usize;
        for rec in records {
            let key = rec.href.trim();
            if !key.is_empty() && !self.seen.insert(key.to_string()) {
                dropped += 1;
                continue;
            }
            kept.push(rec);
        }
        (kept, dropped)
    }
}

/// Global pass over an already-sorted feed: drop an article when its title or
/// its url was already kept. Returns (kept, dropped_count).
pub fn dedup_global(sorted: Vec<Article>) -> (Vec<Article>, usize) {
    let mut titles: HashSet<String> = HashSet::new();
    let mut urls: HashSet<String> = HashSet::new();
    let mut keep = Vec::with_capacity(sorted.len());
    let mut dropped = 0usize;

    for art in sorted {
        if titles.contains(&art.title) || urls.contains(&art.url) {
            dropped += 1;
            continue;
        }
        titles.insert(art.title.clone());
        urls.insert(art.url.clone());
        keep.push(art);
    }

    (keep, dropped)
}

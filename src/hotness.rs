//! Keyword-weighted "hotness" of a headline.
//!
//! The table is data: a built-in lexicon (`hotness_lexicon.json`) that
//! configuration may replace wholesale.

use once_cell::sync::Lazy;
use std::collections::HashMap;

static DEFAULT_LEXICON: Lazy<HashMap<String, u32>> = Lazy::new(|| {
    let raw = include_str!("../hotness_lexicon.json");
    serde_json::from_str::<HashMap<String, u32>>(raw).expect("valid hotness lexicon")
});

#[derive(Debug, Clone)]
pub struct HotnessTable {
    /// (lowercased keyword, weight); zero weights and blank keys are dropped.
    entries: Vec<(String, u32)>,
}

impl Default for HotnessTable {
    fn default() -> Self {
        Self::from_map(DEFAULT_LEXICON.clone())
    }
}

impl HotnessTable {
    pub fn from_map(map: HashMap<String, u32>) -> Self {
        let mut entries: Vec<(String, u32)> = map
            .into_iter()
            .map(|(k, w)| (k.trim().to_lowercase(), w))
            .filter(|(k, w)| !k.is_empty() && *w > 0)
            .collect();
        // deterministic iteration for debugging output
        entries.sort();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of `weight × occurrences` over all keywords. Matching is
    /// case-insensitive and overlapping occurrences each count.
    pub fn score(&self, title: &str) -> u32 {
        let hay = title.to_lowercase();
        self.entries
            .iter()
            .map(|(kw, w)| w.saturating_mul(count_overlapping(&hay, kw)))
            .fold(0u32, u32::saturating_add)
    }
}

/// Occurrences of `needle` in `hay`, advancing one char at a time.
fn count_overlapping(hay: &str, needle: &str) -> u32 {
    if needle.is_empty() {
        return 0;
    }
    hay.char_indices()
        .filter(|(i, _)| hay[*i..].starts_with(needle))
        .count() as u32
}

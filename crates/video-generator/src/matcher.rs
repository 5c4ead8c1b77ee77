//! Query-to-video matching.
//!
//! Scores every catalog entry by substring overlap with the normalized query:
//! topics weigh 10, keywords 3, title words longer than three characters 2.
//! The first entry with the strictly highest positive score wins.

use crate::catalog::Catalog;
use shared::CatalogEntry;
use tracing::debug;

const TOPIC_WEIGHT: u32 = 10;
const KEYWORD_WEIGHT: u32 = 3;
const TITLE_WORD_WEIGHT: u32 = 2;
const MIN_TITLE_WORD_LEN: usize = 3;

/// Score a single entry against an already-normalized query
pub fn score(entry: &CatalogEntry, normalized_query: &str) -> u32 {
    let topic_hits = entry
        .topics
        .iter()
        .filter(|topic| normalized_query.contains(&topic.to_lowercase()))
        .count() as u32;

    let keyword_hits = entry
        .keywords
        .iter()
        .filter(|keyword| normalized_query.contains(&keyword.to_lowercase()))
        .count() as u32;

    let title = entry.title.to_lowercase();
    let title_hits = title
        .split(' ')
        .filter(|word| word.chars().count() > MIN_TITLE_WORD_LEN && normalized_query.contains(word))
        .count() as u32;

    topic_hits * TOPIC_WEIGHT + keyword_hits * KEYWORD_WEIGHT + title_hits * TITLE_WORD_WEIGHT
}

impl Catalog {
    /// Find the best matching entry for a free-text query
    pub fn find_match(&self, query: &str) -> Option<&CatalogEntry> {
        let normalized = query.trim().to_lowercase();

        let mut best: Option<(&CatalogEntry, u32)> = None;
        for entry in self.entries() {
            let entry_score = score(entry, &normalized);
            if entry_score == 0 {
                continue;
            }
            // Strictly greater: earlier entries keep ties
            if best.map_or(true, |(_, best_score)| entry_score > best_score) {
                best = Some((entry, entry_score));
            }
        }

        match best {
            Some((entry, entry_score)) => {
                debug!(query = %normalized, video = %entry.id, score = entry_score, "Query matched");
                Some(entry)
            }
            None => {
                debug!(query = %normalized, "No catalog entry matched");
                None
            }
        }
    }
}

/// Match a query against the built-in catalog
pub fn find_matching_video(query: &str) -> Option<&'static CatalogEntry> {
    Catalog::builtin().find_match(query)
}

//! Inverted word -> sentence index over content words.
//!
//! Restricts the greedy selector's per-iteration candidate pool to
//! sentences that can still contribute, turning an
//! O(sentences x words) scan into an O(uncovered x avg_frequency)
//! pool rebuild. Only content-word occurrences count (nouns, verbs,
//! adjectives, adverbs, proper nouns); a target word that never
//! occurs as a content word is simply absent from the map.

use indexmap::{IndexMap, IndexSet};
use tracing::debug;

use crate::core::index::SentenceIndex;

/// Posting lists: normalized target word -> indices of sentences
/// containing it as a content word, in index order.
pub type FrequencyIndex = IndexMap<String, Vec<usize>>;

pub fn build_frequency_index(
    index: &SentenceIndex,
    wordlist: &IndexSet<String>,
) -> FrequencyIndex {
    let mut freq = FrequencyIndex::new();

    for (&sentence_idx, record) in index {
        for token in &record.tokens {
            if !token.is_content() || !wordlist.contains(&token.normalized) {
                continue;
            }
            let postings = freq.entry(token.normalized.clone()).or_insert_with(Vec::new);
            // A sentence appears once per word no matter how often
            // the word repeats in it.
            if postings.last() != Some(&sentence_idx) {
                postings.push(sentence_idx);
            }
        }
    }

    debug!(words = freq.len(), "frequency index built");
    freq
}

/// Number of sentences a word occurs in as a content word; the
/// "global frequency" the rarity bonuses are tiered on.
pub fn global_frequency(freq: &FrequencyIndex, word: &str) -> usize {
    freq.get(word).map_or(0, Vec::len)
}

//! Sentence indexing: tokenize a corpus once, keep only sentences
//! inside the configured length window, and precompute per-sentence
//! word-list membership for the selectors.

use std::panic::{AssertUnwindSafe, catch_unwind};

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use tracing::{debug, warn};

use crate::core::tagger::{Tagger, Token};
use crate::infra::config::EngineConfig;

/// Sentences are tokenized in fixed-size batches purely to bound
/// peak memory when a heavier tagging pipeline is plugged in. The
/// resulting index is identical for any batch size.
const INDEX_BATCH: usize = 256;

/// Everything the selectors need to know about one indexed sentence.
/// Created once during indexing, never mutated.
#[derive(Debug, Clone, Serialize)]
pub struct SentenceRecord {
    /// Original sentence text
    pub text: String,
    /// Lexical tokens (punctuation already discarded)
    pub tokens: Vec<Token>,
    /// Number of lexical tokens
    pub token_count: usize,
    /// Normalized keys present in the target word list
    pub words_in_list: IndexSet<String>,
    /// Normalized keys absent from the target word list
    pub words_not_in_list: IndexSet<String>,
    /// |words_in_list| / token_count, 0 when the sentence is empty
    pub in_list_ratio: f64,
}

impl SentenceRecord {
    /// Normalized keys of content-word tokens that are in the word
    /// list. This is the set coverage scoring operates on.
    pub fn content_words_in_list(&self) -> impl Iterator<Item = &str> {
        self.tokens
            .iter()
            .filter(|t| t.is_content() && self.words_in_list.contains(&t.normalized))
            .map(|t| t.normalized.as_str())
    }
}

/// Index keyed by position in the input sentence list. Sentences
/// outside the length window (and ones that failed to tokenize) are
/// simply absent.
pub type SentenceIndex = IndexMap<usize, SentenceRecord>;

/// Build the sentence index for a corpus against a normalized target
/// word set. Deterministic for identical input and tagger behavior.
pub fn build_sentence_index(
    sentences: &[String],
    wordlist: &IndexSet<String>,
    cfg: &EngineConfig,
    tagger: &dyn Tagger,
) -> SentenceIndex {
    build_index_batched(sentences, wordlist, cfg, tagger, INDEX_BATCH)
}

pub(crate) fn build_index_batched(
    sentences: &[String],
    wordlist: &IndexSet<String>,
    cfg: &EngineConfig,
    tagger: &dyn Tagger,
    batch_size: usize,
) -> SentenceIndex {
    let opts = cfg.tokenize_opts();
    let mut index = SentenceIndex::new();

    for (batch_no, batch) in sentences.chunks(batch_size.max(1)).enumerate() {
        for (offset, text) in batch.iter().enumerate() {
            let i = batch_no * batch_size.max(1) + offset;

            // A tokenizer blow-up on one sentence skips that sentence
            // only; the rest of the corpus still gets indexed.
            let tokens = match catch_unwind(AssertUnwindSafe(|| tagger.tokenize(text, &opts))) {
                Ok(tokens) => tokens,
                Err(_) => {
                    warn!(sentence = i, "tokenization failed; skipping sentence");
                    continue;
                }
            };

            let token_count = tokens.len();
            // Hard pre-filter, not a scoring signal
            if token_count < cfg.len_min || token_count > cfg.len_max {
                continue;
            }

            let mut words_in_list = IndexSet::new();
            let mut words_not_in_list = IndexSet::new();
            for token in &tokens {
                if wordlist.contains(&token.normalized) {
                    words_in_list.insert(token.normalized.clone());
                } else {
                    words_not_in_list.insert(token.normalized.clone());
                }
            }

            let in_list_ratio = if token_count == 0 {
                0.0
            } else {
                words_in_list.len() as f64 / token_count as f64
            };

            index.insert(i, SentenceRecord {
                text: text.clone(),
                tokens,
                token_count,
                words_in_list,
                words_not_in_list,
                in_list_ratio,
            });
        }
    }

    debug!(
        scanned = sentences.len(),
        indexed = index.len(),
        tagger = tagger.name(),
        "sentence index built"
    );

    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::normalize::expand_wordlist;
    use crate::core::tagger::FallbackTagger;

    fn corpus(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn length_window_is_a_hard_filter() {
        let tagger = FallbackTagger::new();
        let wordlist = expand_wordlist(["chat"], false);
        let cfg = EngineConfig {
            len_min: 1,
            len_max: 8,
            ..Default::default()
        };

        let long: String = std::iter::repeat_n("chat", 20).collect::<Vec<_>>().join(" ");
        let sentences = corpus(&["Le chat dort.", &long]);

        let index = build_sentence_index(&sentences, &wordlist, &cfg, &tagger);
        assert!(index.contains_key(&0));
        // 20 tokens, window max 8: never indexed no matter the matches
        assert!(!index.contains_key(&1));
    }

    #[test]
    fn membership_and_ratio() {
        let tagger = FallbackTagger::new();
        let wordlist = expand_wordlist(["chat", "dormir"], false);
        let cfg = EngineConfig {
            len_min: 1,
            len_max: 10,
            ..Default::default()
        };

        let index = build_sentence_index(&corpus(&["Le chat dort."]), &wordlist, &cfg, &tagger);
        let record = &index[&0];
        assert_eq!(record.token_count, 3);
        let in_list: Vec<&str> = record.words_in_list.iter().map(String::as_str).collect();
        assert_eq!(in_list, vec!["chat", "dormir"]);
        assert!(record.words_not_in_list.contains("le"));
        assert!((record.in_list_ratio - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn output_is_independent_of_batch_size() {
        let tagger = FallbackTagger::new();
        let wordlist = expand_wordlist(["chat", "chien", "manger"], false);
        let cfg = EngineConfig {
            len_min: 1,
            len_max: 10,
            ..Default::default()
        };
        let sentences = corpus(&[
            "Le chat mange.",
            "Le chien dort.",
            "Un chat noir.",
            "La maison est grande.",
        ]);

        let one = build_index_batched(&sentences, &wordlist, &cfg, &tagger, 1);
        let big = build_index_batched(&sentences, &wordlist, &cfg, &tagger, 1000);

        assert_eq!(one.len(), big.len());
        for (k, record) in &one {
            assert_eq!(record.text, big[k].text);
            assert_eq!(record.words_in_list, big[k].words_in_list);
        }
    }

    #[test]
    fn empty_corpus_empty_index() {
        let tagger = FallbackTagger::new();
        let wordlist = expand_wordlist(["chat"], false);
        let index =
            build_sentence_index(&[], &wordlist, &EngineConfig::default(), &tagger);
        assert!(index.is_empty());
    }
}

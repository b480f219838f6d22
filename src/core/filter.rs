//! Non-greedy filter mode.
//!
//! Keeps every sentence that clears two fixed thresholds: at most
//! `max_tokens` tokens and at least `min_content_words` content-word
//! matches against the target list. No scoring and no reordering —
//! selected sentences come back in input order, and there is no cap
//! on how many are selected. Scoring was removed from this mode on
//! purpose; do not reintroduce it.

use std::sync::Arc;

use indexmap::IndexSet;
use serde::Serialize;
use tracing::{info, instrument, warn};

use anyhow::Result;
use owo_colors::OwoColorize;

use crate::cli::{AppContext, FilterArgs};
use crate::core::index::build_sentence_index;
use crate::core::tagger::{Tagger, shared_tagger};
use crate::infra::config::{Config, ConfigError, EngineConfig, FilterConfig, load_config};
use crate::infra::input::{read_lines, read_wordlist};
use crate::infra::progress::{BarSink, NoProgress, ProgressSink, emit};

/// CLI entry point for `lxv filter`.
pub fn run(args: FilterArgs, ctx: &AppContext) -> Result<()> {
    let file_cfg = load_config().unwrap_or_else(|err| {
        warn!(%err, "failed to load configuration; falling back to defaults");
        Config::default()
    });
    let mut engine = file_cfg.engine;
    let mut thresholds = file_cfg.filter;

    if args.fold_diacritics {
        engine.fold_diacritics = true;
    }
    if let Some(v) = args.min_content_words {
        thresholds.min_content_words = v;
    }
    if let Some(v) = args.max_tokens {
        thresholds.max_tokens = v;
    }
    // The filter's own token ceiling is the binding length limit;
    // keep the index window wide enough to see every candidate.
    engine.len_max = engine.len_max.max(thresholds.max_tokens);

    let wordlist = read_wordlist(&args.words, engine.fold_diacritics)?;
    let sentences = read_lines(&args.sentences)?;
    let selector = FilterSelector::new(engine, thresholds)?;

    let outcome = if ctx.quiet || args.json {
        selector.filter(&sentences, &wordlist, &mut NoProgress)
    } else {
        let mut bar = BarSink::new();
        let out = selector.filter(&sentences, &wordlist, &mut bar);
        bar.finish();
        out
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    if !ctx.quiet {
        println!(
            "{} {} of {} indexed sentences",
            "Kept:".style(crate::core::coverage::heading_style(ctx.no_color)),
            outcome.stats.selected_count,
            outcome.stats.sentences_indexed
        );
        for s in &outcome.selected {
            println!(
                "  {:>4} [{} matches] {}",
                s.sentence_index,
                s.content_match_count,
                s.text
            );
        }
    }
    Ok(())
}

/// Emit a progress milestone every this many scanned sentences.
const PROGRESS_EVERY: usize = 200;

/// One sentence that passed the thresholds.
#[derive(Debug, Clone, Serialize)]
pub struct FilteredSentence {
    /// Index into the input sentence list
    pub sentence_index: usize,
    /// Sentence text
    pub text: String,
    /// Lexical token count
    pub token_count: usize,
    /// Content-word tokens matching the target list (occurrences)
    pub content_match_count: usize,
    /// The distinct matched words
    pub matched_words: Vec<String>,
}

/// Aggregate statistics for one filter run.
#[derive(Debug, Clone, Serialize)]
pub struct FilterStats {
    pub sentences_scanned: usize,
    pub sentences_indexed: usize,
    pub selected_count: usize,
    pub total_words: usize,
}

/// Full result of a filter run.
#[derive(Debug, Clone, Serialize)]
pub struct FilterOutcome {
    pub selected: Vec<FilteredSentence>,
    pub stats: FilterStats,
}

/// Threshold-based sentence filter.
pub struct FilterSelector {
    engine: EngineConfig,
    thresholds: FilterConfig,
    tagger: Arc<dyn Tagger>,
}

impl FilterSelector {
    pub fn new(engine: EngineConfig, thresholds: FilterConfig) -> Result<Self, ConfigError> {
        Self::with_tagger(engine, thresholds, shared_tagger())
    }

    pub fn with_tagger(
        engine: EngineConfig,
        thresholds: FilterConfig,
        tagger: Arc<dyn Tagger>,
    ) -> Result<Self, ConfigError> {
        engine.validate()?;
        Ok(Self {
            engine,
            thresholds,
            tagger,
        })
    }

    /// Run the filter over a corpus. Empty inputs produce empty
    /// outputs, never an error.
    #[instrument(skip_all, fields(sentences = sentences.len(), words = wordlist.len()))]
    pub fn filter(
        &self,
        sentences: &[String],
        wordlist: &IndexSet<String>,
        progress: &mut dyn ProgressSink,
    ) -> FilterOutcome {
        let index =
            build_sentence_index(sentences, wordlist, &self.engine, self.tagger.as_ref());

        let mut selected = Vec::new();
        for (scanned, (&sentence_index, record)) in index.iter().enumerate() {
            if scanned % PROGRESS_EVERY == 0 && !index.is_empty() {
                emit(progress, (scanned * 100 / index.len()) as u8, None);
            }

            if record.token_count > self.thresholds.max_tokens {
                continue;
            }

            let mut content_match_count = 0usize;
            let mut matched_words = IndexSet::new();
            for token in &record.tokens {
                if token.is_content() && record.words_in_list.contains(&token.normalized) {
                    content_match_count += 1;
                    matched_words.insert(token.normalized.clone());
                }
            }

            if content_match_count < self.thresholds.min_content_words {
                continue;
            }

            selected.push(FilteredSentence {
                sentence_index,
                text: record.text.clone(),
                token_count: record.token_count,
                content_match_count,
                matched_words: matched_words.into_iter().collect(),
            });
        }

        let stats = FilterStats {
            sentences_scanned: sentences.len(),
            sentences_indexed: index.len(),
            selected_count: selected.len(),
            total_words: wordlist.len(),
        };

        emit(progress, 100, None);
        info!(
            selected = stats.selected_count,
            indexed = stats.sentences_indexed,
            "filter run finished"
        );

        FilterOutcome { selected, stats }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::normalize::expand_wordlist;
    use crate::infra::progress::NoProgress;

    fn selector(min_content_words: usize, max_tokens: usize) -> FilterSelector {
        FilterSelector::new(
            EngineConfig {
                len_min: 1,
                len_max: 20,
                ..Default::default()
            },
            FilterConfig {
                min_content_words,
                max_tokens,
            },
        )
        .expect("valid config")
    }

    fn corpus(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn token_ceiling_and_match_floor_are_both_enforced() {
        let sel = selector(4, 8);
        let wordlist =
            expand_wordlist(["chat", "chien", "maison", "manger", "dormir", "voir"], false);
        let sentences = corpus(&[
            // 4 content matches (chat, chien, voir->voient, maison), 7 tokens: kept
            "Le chat et chien voient la maison.",
            // 3 content matches, short enough: dropped
            "Le chat voit la maison.",
            // enough matches but 9 tokens with max 8: dropped
            "Le chat et le chien voient la grande maison.",
        ]);

        let outcome = sel.filter(&sentences, &wordlist, &mut NoProgress);
        let kept: Vec<usize> = outcome.selected.iter().map(|s| s.sentence_index).collect();
        assert_eq!(kept, vec![0]);
        assert_eq!(outcome.selected[0].content_match_count, 4);
    }

    #[test]
    fn input_order_is_preserved() {
        let sel = selector(1, 10);
        let wordlist = expand_wordlist(["chat", "chien", "maison", "manger"], false);
        let sentences = corpus(&[
            "Le chien mange.",
            "Le chat dort.",
            "La maison est grande.",
        ]);

        let outcome = sel.filter(&sentences, &wordlist, &mut NoProgress);

        let indices: Vec<usize> = outcome.selected.iter().map(|s| s.sentence_index).collect();
        let mut sorted = indices.clone();
        sorted.sort_unstable();
        assert_eq!(indices, sorted);
        assert!(indices.len() >= 2);
    }

    #[test]
    fn no_cap_on_selection() {
        let sel = selector(1, 10);
        let wordlist = expand_wordlist(["chat"], false);
        let sentences: Vec<String> =
            (0..50).map(|i| format!("Le chat numéro {i} dort.")).collect();

        let outcome = sel.filter(&sentences, &wordlist, &mut NoProgress);
        assert_eq!(outcome.stats.selected_count, 50);
    }

    #[test]
    fn empty_inputs_yield_zeroed_stats() {
        let sel = selector(4, 8);
        let outcome = sel.filter(&[], &IndexSet::new(), &mut NoProgress);
        assert!(outcome.selected.is_empty());
        assert_eq!(outcome.stats.sentences_scanned, 0);
        assert_eq!(outcome.stats.selected_count, 0);
    }
}

//! Greedy coverage selection.
//!
//! One pass picks, sentence by sentence, whichever candidate covers
//! the most still-uncovered target words per token spent, until the
//! word set is exhausted, the sentence budget runs out, or no
//! candidate contributes anything new. Scoring adapts as coverage
//! climbs: new words are worth more near the long tail, rare words
//! carry bonuses, and short sentences win ties on weight.

use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use anyhow::Result;
use itertools::Itertools;
use owo_colors::{OwoColorize, Style};

use crate::cli::{AppContext, CoverArgs};
use crate::core::frequency::{FrequencyIndex, build_frequency_index, global_frequency};
use crate::core::index::{SentenceIndex, SentenceRecord, build_sentence_index};
use crate::core::tagger::{Tagger, shared_tagger};
use crate::infra::config::{Config, ConfigError, EngineConfig, load_config};
use crate::infra::input::{read_lines, read_wordlist};
use crate::infra::progress::{BarSink, NoProgress, ProgressSink, emit};

/// CLI entry point for `lxv cover`.
pub fn run(args: CoverArgs, ctx: &AppContext) -> Result<()> {
    let file_cfg = load_config().unwrap_or_else(|err| {
        warn!(%err, "failed to load configuration; falling back to defaults");
        Config::default()
    });
    let mut cfg = file_cfg.engine;

    if let Some(v) = args.len_min {
        cfg.len_min = v;
    }
    if let Some(v) = args.len_max {
        cfg.len_max = v;
    }
    if let Some(v) = args.target {
        cfg.target_count = v;
    }
    if args.fold_diacritics {
        cfg.fold_diacritics = true;
    }
    if args.no_elisions {
        cfg.handle_elisions = false;
    }

    let wordlist = read_wordlist(&args.words, cfg.fold_diacritics)?;
    let sentences = read_lines(&args.sentences)?;
    let selector = CoverageSelector::new(cfg)?;

    let outcome = if ctx.quiet || args.json {
        selector.select(&sentences, &wordlist, &mut NoProgress)
    } else {
        let mut bar = BarSink::new();
        let out = selector.select(&sentences, &wordlist, &mut bar);
        bar.finish();
        out
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    if !ctx.quiet {
        print_cover_summary(&outcome, ctx.no_color);
    }
    Ok(())
}

/// Heading style for human output, plain when colors are disabled.
pub(crate) fn heading_style(no_color: bool) -> Style {
    if no_color {
        Style::new()
    } else {
        Style::new().green().bold()
    }
}

pub(crate) fn dim_style(no_color: bool) -> Style {
    if no_color { Style::new() } else { Style::new().dimmed() }
}

fn print_cover_summary(outcome: &CoverageOutcome, no_color: bool) {
    let stats = &outcome.stats;
    println!(
        "{} {:.1}% ({}/{} words), stopped: {}",
        "Coverage:".style(heading_style(no_color)),
        stats.coverage_pct,
        stats.words_covered,
        stats.total_words,
        stats.stopped_reason.as_str()
    );
    println!(
        "Selected {} sentences (scanned {}, indexed {}) in {} iterations",
        stats.selected_sentence_count,
        stats.sentences_scanned,
        stats.sentences_indexed,
        stats.iterations
    );

    for entry in &stats.learning_set {
        println!(
            "  {:>3}. [+{}] {} {}",
            entry.rank,
            entry.new_word_count,
            entry.text,
            format!("(score {:.1})", entry.score).style(dim_style(no_color))
        );
    }

    if !stats.uncovered_words.is_empty() {
        print_uncovered(&stats.uncovered_words, no_color);
    }
}

/// Uncovered lists can run to hundreds of words; show a prefix.
const UNCOVERED_SHOWN: usize = 15;

pub(crate) fn print_uncovered(uncovered: &[String], no_color: bool) {
    let tag = if no_color { Style::new() } else { Style::new().yellow() };
    let shown = uncovered.iter().take(UNCOVERED_SHOWN).join(", ");
    let rest = uncovered.len().saturating_sub(UNCOVERED_SHOWN);
    if rest > 0 {
        println!("{} {} (+{} more)", "Uncovered:".style(tag), shown, rest);
    } else {
        println!("{} {}", "Uncovered:".style(tag), shown);
    }
}

/// Rarity tiers: a new word occurring in fewer than 5 sentences is
/// worth +20, fewer than 20 sentences +5. Exclusive tiers.
const RARE_BONUS: f64 = 20.0;
const RARE_THRESHOLD: usize = 5;
const UNCOMMON_BONUS: f64 = 5.0;
const UNCOMMON_THRESHOLD: usize = 20;

/// Extra +10 for sentences that pack three or more rare new words
/// once coverage has passed 60%.
const EFFICIENCY_BONUS: f64 = 10.0;
const EFFICIENCY_COVERAGE_PCT: f64 = 60.0;
const EFFICIENCY_MIN_NEW: usize = 3;

/// Rebuild the candidate pool every this many stagnant iterations.
const STAGNATION_REBUILD_EVERY: usize = 10;
/// Give up after this many stagnant iterations in total.
const STAGNATION_LIMIT: usize = 50;

/// Why a coverage pass stopped. All variants are expected outcomes,
/// not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StopReason {
    /// Every target word was covered
    Complete,
    /// The sentence budget was spent first
    Budget,
    /// No remaining sentence contributes any new word
    Stagnation,
}

impl StopReason {
    pub fn as_str(self) -> &'static str {
        match self {
            StopReason::Complete => "complete",
            StopReason::Budget => "budget",
            StopReason::Stagnation => "stagnation",
        }
    }
}

/// One word -> sentence assignment. A word is assigned at most once
/// per pass and never reassigned.
#[derive(Debug, Clone, Serialize)]
pub struct Assignment {
    /// Normalized target word
    pub word_key: String,
    /// Index of the covering sentence in the input list
    pub sentence_index: usize,
    /// Surface form that matched inside the sentence
    pub matched_surface: String,
    /// Full sentence text
    pub sentence_text: String,
    /// Score the sentence won with
    pub sentence_score: f64,
    /// All new words this same sentence covered, for the
    /// "why this sentence" trace
    pub covered_words: Vec<String>,
    /// Source tag, set by the batch orchestrator
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// One entry of the ranked learning set.
#[derive(Debug, Clone, Serialize)]
pub struct LearningSentence {
    /// 1-based selection rank
    pub rank: usize,
    /// Index into the input sentence list
    pub sentence_index: usize,
    /// Sentence text
    pub text: String,
    /// How many new words this sentence contributed when selected
    pub new_word_count: usize,
    /// Winning score
    pub score: f64,
    /// The new words themselves
    pub new_words: Vec<String>,
    /// Source tag, set by the batch orchestrator
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Aggregate statistics for one pass.
#[derive(Debug, Clone, Serialize)]
pub struct CoverageStats {
    pub total_words: usize,
    pub words_covered: usize,
    pub words_uncovered: usize,
    /// The words left uncovered at termination
    pub uncovered_words: Vec<String>,
    pub coverage_pct: f64,
    pub sentences_scanned: usize,
    pub sentences_indexed: usize,
    pub selected_sentence_count: usize,
    pub iterations: usize,
    pub stopped_reason: StopReason,
    /// Selected sentences in selection order
    pub learning_set: Vec<LearningSentence>,
}

/// Full result of a coverage pass.
#[derive(Debug, Clone, Serialize)]
pub struct CoverageOutcome {
    pub assignments: Vec<Assignment>,
    pub stats: CoverageStats,
}

/// Greedy coverage selector. One instance per configuration; every
/// call to [`CoverageSelector::select`] starts from fresh state.
pub struct CoverageSelector {
    cfg: EngineConfig,
    tagger: Arc<dyn Tagger>,
}

impl CoverageSelector {
    /// Build a selector with the process-wide tagger.
    pub fn new(cfg: EngineConfig) -> Result<Self, ConfigError> {
        Self::with_tagger(cfg, shared_tagger())
    }

    /// Build a selector with an explicit tagger implementation.
    pub fn with_tagger(cfg: EngineConfig, tagger: Arc<dyn Tagger>) -> Result<Self, ConfigError> {
        cfg.validate()?;
        Ok(Self { cfg, tagger })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.cfg
    }

    /// Run one coverage pass over `sentences` against the normalized
    /// target word set. Never fails on data: empty inputs produce
    /// empty outputs with zeroed stats.
    #[instrument(skip_all, fields(sentences = sentences.len(), words = wordlist.len()))]
    pub fn select(
        &self,
        sentences: &[String],
        wordlist: &IndexSet<String>,
        progress: &mut dyn ProgressSink,
    ) -> CoverageOutcome {
        let index = build_sentence_index(sentences, wordlist, &self.cfg, self.tagger.as_ref());
        emit(progress, 5, Some("sentence index built"));

        let freq = build_frequency_index(&index, wordlist);
        emit(progress, 10, Some("frequency index built"));

        let total_words = wordlist.len();
        let mut uncovered: IndexSet<String> = wordlist.clone();
        let mut word_to_sentence: IndexMap<String, usize> = IndexMap::new();
        let mut assignments: Vec<Assignment> = Vec::new();
        let mut learning_set: Vec<LearningSentence> = Vec::new();
        let mut selected_order: Vec<usize> = Vec::new();
        let mut selected_set: IndexSet<usize> = IndexSet::new();

        let mut candidate_pool = rebuild_pool(&freq, &uncovered, &selected_set);

        let mut iterations = 0usize;
        let mut stagnant = 0usize;
        let mut reason = StopReason::Complete;

        while !uncovered.is_empty() {
            if self.cfg.target_count > 0 && selected_order.len() >= self.cfg.target_count {
                reason = StopReason::Budget;
                break;
            }
            iterations += 1;

            let coverage_pct = if total_words == 0 {
                100.0
            } else {
                word_to_sentence.len() as f64 / total_words as f64 * 100.0
            };
            // Adaptive weighting: filling the long tail pays more.
            let new_word_weight = if coverage_pct < 50.0 {
                10.0
            } else if coverage_pct < 70.0 {
                15.0
            } else {
                25.0
            };

            let best = find_best_candidate(
                &index,
                &freq,
                &candidate_pool,
                &uncovered,
                new_word_weight,
                coverage_pct,
            );

            let Some((winner, new_words, score)) = best else {
                stagnant += 1;
                if stagnant % STAGNATION_REBUILD_EVERY == 0 {
                    candidate_pool = rebuild_pool(&freq, &uncovered, &selected_set);
                    if candidate_pool.is_empty() {
                        debug!(iterations, "candidate pool exhausted");
                        reason = StopReason::Stagnation;
                        break;
                    }
                }
                if stagnant >= STAGNATION_LIMIT {
                    debug!(iterations, "stagnation limit reached");
                    reason = StopReason::Stagnation;
                    break;
                }
                continue;
            };

            stagnant = 0;
            candidate_pool.shift_remove(&winner);
            selected_set.insert(winner);
            selected_order.push(winner);

            let record = &index[&winner];
            for word in &new_words {
                let matched_surface = record
                    .tokens
                    .iter()
                    .find(|t| &t.normalized == word)
                    .map(|t| t.surface.clone())
                    .unwrap_or_default();

                word_to_sentence.insert(word.clone(), winner);
                uncovered.shift_remove(word);

                assignments.push(Assignment {
                    word_key: word.clone(),
                    sentence_index: winner,
                    matched_surface,
                    sentence_text: record.text.clone(),
                    sentence_score: score,
                    covered_words: new_words.clone(),
                    source: None,
                });
            }

            learning_set.push(LearningSentence {
                rank: selected_order.len(),
                sentence_index: winner,
                text: record.text.clone(),
                new_word_count: new_words.len(),
                score,
                new_words,
                source: None,
            });

            let pct = if total_words == 0 {
                100.0
            } else {
                word_to_sentence.len() as f64 / total_words as f64
            };
            emit(progress, 10 + (pct * 90.0) as u8, None);
        }

        if uncovered.is_empty() {
            reason = StopReason::Complete;
        }

        let stats = CoverageStats {
            total_words,
            words_covered: word_to_sentence.len(),
            words_uncovered: uncovered.len(),
            uncovered_words: uncovered.iter().cloned().collect(),
            coverage_pct: if total_words == 0 {
                0.0
            } else {
                word_to_sentence.len() as f64 / total_words as f64 * 100.0
            },
            sentences_scanned: sentences.len(),
            sentences_indexed: index.len(),
            selected_sentence_count: selected_order.len(),
            iterations,
            stopped_reason: reason,
            learning_set,
        };

        emit(progress, 100, Some(reason.as_str()));
        info!(
            covered = stats.words_covered,
            total = stats.total_words,
            selected = stats.selected_sentence_count,
            reason = reason.as_str(),
            "coverage pass finished"
        );

        CoverageOutcome { assignments, stats }
    }
}

/// Sentences still worth scanning: anything unselected that contains
/// at least one uncovered word as a content word. Insertion order of
/// the pool is what breaks score ties (first seen wins).
fn rebuild_pool(
    freq: &FrequencyIndex,
    uncovered: &IndexSet<String>,
    selected: &IndexSet<usize>,
) -> IndexSet<usize> {
    let mut pool = IndexSet::new();
    for word in uncovered {
        if let Some(postings) = freq.get(word) {
            for &idx in postings {
                if !selected.contains(&idx) {
                    pool.insert(idx);
                }
            }
        }
    }
    pool
}

/// Scan the candidate pool and return the best-scoring sentence with
/// its new words. Ties keep the first candidate found.
fn find_best_candidate(
    index: &SentenceIndex,
    freq: &FrequencyIndex,
    pool: &IndexSet<usize>,
    uncovered: &IndexSet<String>,
    new_word_weight: f64,
    coverage_pct: f64,
) -> Option<(usize, Vec<String>, f64)> {
    let mut best: Option<(usize, Vec<String>, f64)> = None;

    for &idx in pool {
        let Some(record) = index.get(&idx) else {
            continue;
        };

        let new_words = collect_new_words(record, uncovered);
        if new_words.is_empty() {
            continue;
        }

        let score = score_sentence(record, &new_words, freq, new_word_weight, coverage_pct);
        match &best {
            Some((_, _, best_score)) if score <= *best_score => {}
            _ => best = Some((idx, new_words, score)),
        }
    }

    best
}

/// Uncovered target words appearing in this sentence as content
/// words, deduplicated, in token order.
fn collect_new_words(record: &SentenceRecord, uncovered: &IndexSet<String>) -> Vec<String> {
    let mut seen = IndexSet::new();
    for word in record.content_words_in_list() {
        if uncovered.contains(word) {
            seen.insert(word.to_string());
        }
    }
    seen.into_iter().collect()
}

/// Marginal-coverage score: new words scaled by the adaptive weight,
/// minus token count so shorter sentences win, plus rarity and
/// efficiency bonuses.
fn score_sentence(
    record: &SentenceRecord,
    new_words: &[String],
    freq: &FrequencyIndex,
    new_word_weight: f64,
    coverage_pct: f64,
) -> f64 {
    let mut score = new_words.len() as f64 * new_word_weight - record.token_count as f64;

    let mut rare_count = 0usize;
    for word in new_words {
        let occurrences = global_frequency(freq, word);
        if occurrences < RARE_THRESHOLD {
            score += RARE_BONUS;
        } else if occurrences < UNCOMMON_THRESHOLD {
            score += UNCOMMON_BONUS;
        }
        if occurrences < UNCOMMON_THRESHOLD {
            rare_count += 1;
        }
    }

    if coverage_pct > EFFICIENCY_COVERAGE_PCT
        && new_words.len() >= EFFICIENCY_MIN_NEW
        && rare_count >= EFFICIENCY_MIN_NEW
    {
        score += EFFICIENCY_BONUS;
    }

    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::normalize::expand_wordlist;
    use crate::infra::progress::NoProgress;

    fn selector(len_min: usize, len_max: usize, target: usize) -> CoverageSelector {
        CoverageSelector::new(EngineConfig {
            len_min,
            len_max,
            target_count: target,
            fold_diacritics: false,
            handle_elisions: true,
        })
        .expect("valid config")
    }

    fn corpus(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn covers_basic_word_list() {
        let sel = selector(1, 10, 0);
        let wordlist = expand_wordlist(["chat", "chien", "manger", "dormir"], false);
        let sentences = corpus(&["Le chat mange.", "Le chien dort."]);

        let outcome = sel.select(&sentences, &wordlist, &mut NoProgress);

        assert_eq!(outcome.stats.words_covered, 4);
        assert_eq!(outcome.stats.selected_sentence_count, 2);
        assert_eq!(outcome.stats.stopped_reason, StopReason::Complete);
        assert_eq!(outcome.assignments.len(), 4);
    }

    #[test]
    fn budget_caps_selection() {
        let sel = selector(1, 10, 1);
        let wordlist = expand_wordlist(["chat", "chien", "manger", "dormir"], false);
        let sentences = corpus(&["Le chat mange.", "Le chien dort."]);

        let outcome = sel.select(&sentences, &wordlist, &mut NoProgress);

        assert_eq!(outcome.stats.selected_sentence_count, 1);
        assert_eq!(outcome.stats.stopped_reason, StopReason::Budget);
        assert!(outcome.stats.words_uncovered > 0);
    }

    #[test]
    fn unmatched_word_ends_in_stagnation() {
        let sel = selector(1, 10, 0);
        let wordlist = expand_wordlist(["chat", "licorne"], false);
        let sentences = corpus(&["Le chat dort."]);

        let outcome = sel.select(&sentences, &wordlist, &mut NoProgress);

        assert_eq!(outcome.stats.stopped_reason, StopReason::Stagnation);
        assert_eq!(outcome.stats.words_covered, 1);
        assert_eq!(outcome.stats.uncovered_words, vec!["licorne".to_string()]);
    }

    #[test]
    fn empty_inputs_are_not_errors() {
        let sel = selector(1, 10, 0);

        let empty_words = sel.select(&corpus(&["Le chat dort."]), &IndexSet::new(), &mut NoProgress);
        assert_eq!(empty_words.stats.total_words, 0);
        assert_eq!(empty_words.stats.selected_sentence_count, 0);
        assert_eq!(empty_words.stats.stopped_reason, StopReason::Complete);

        let wordlist = expand_wordlist(["chat"], false);
        let empty_corpus = sel.select(&[], &wordlist, &mut NoProgress);
        assert_eq!(empty_corpus.stats.words_covered, 0);
        assert!(empty_corpus.assignments.is_empty());
        assert_eq!(empty_corpus.stats.stopped_reason, StopReason::Stagnation);
    }

    #[test]
    fn words_are_never_reassigned() {
        let sel = selector(1, 10, 0);
        let wordlist = expand_wordlist(["chat", "chien", "maison"], false);
        // "chat" appears in several sentences; only one assignment
        // may exist for it.
        let sentences = corpus(&[
            "Le chat dort.",
            "Le chat et le chien jouent.",
            "Le chat voit la maison.",
        ]);

        let outcome = sel.select(&sentences, &wordlist, &mut NoProgress);

        let chat_assignments: Vec<_> = outcome
            .assignments
            .iter()
            .filter(|a| a.word_key == "chat")
            .collect();
        assert_eq!(chat_assignments.len(), 1);

        // Each selected sentence appears once in the learning set
        let mut seen = IndexSet::new();
        for entry in &outcome.stats.learning_set {
            assert!(seen.insert(entry.sentence_index));
        }
    }

    #[test]
    fn prefers_sentences_covering_more_words() {
        let sel = selector(1, 12, 0);
        let wordlist = expand_wordlist(["chat", "chien", "maison"], false);
        let sentences = corpus(&[
            "Le chat dort.",
            "Le chat et le chien voient la maison.",
        ]);

        let outcome = sel.select(&sentences, &wordlist, &mut NoProgress);

        // The three-word sentence wins the first pick
        assert_eq!(outcome.stats.learning_set[0].sentence_index, 1);
        assert_eq!(outcome.stats.learning_set[0].new_word_count, 3);
        assert_eq!(outcome.stats.selected_sentence_count, 1);
    }

    #[test]
    fn learning_set_ranks_are_sequential() {
        let sel = selector(1, 10, 0);
        let wordlist = expand_wordlist(["chat", "chien", "manger", "dormir"], false);
        let sentences = corpus(&["Le chat mange.", "Le chien dort."]);

        let outcome = sel.select(&sentences, &wordlist, &mut NoProgress);

        let ranks: Vec<usize> = outcome.stats.learning_set.iter().map(|e| e.rank).collect();
        assert_eq!(ranks, vec![1, 2]);
    }

    #[test]
    fn matched_surface_points_into_sentence() {
        let sel = selector(1, 10, 0);
        let wordlist = expand_wordlist(["manger"], false);
        let sentences = corpus(&["Le chat mange."]);

        let outcome = sel.select(&sentences, &wordlist, &mut NoProgress);

        assert_eq!(outcome.assignments.len(), 1);
        let a = &outcome.assignments[0];
        assert_eq!(a.word_key, "manger");
        assert_eq!(a.matched_surface, "mange");
        assert!(a.sentence_text.contains(&a.matched_surface));
    }

    #[test]
    fn invalid_window_is_a_programmer_error() {
        let err = CoverageSelector::new(EngineConfig {
            len_min: 9,
            len_max: 3,
            ..Default::default()
        });
        assert!(err.is_err());
    }
}

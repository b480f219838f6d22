//! Multi-source batch orchestration.
//!
//! Runs the greedy selector over sources strictly in input order,
//! threading a shrinking uncovered-word set and a shared sentence
//! budget through each run. Later sources only ever compete for
//! words not already covered and sentences not already spent. The
//! orchestrator owns the canonical uncovered set; each per-source
//! run receives a snapshot copy, never a shared reference.

use std::sync::Arc;

use indexmap::IndexSet;
use serde::Serialize;
use tracing::{info, instrument, warn};

use anyhow::Result;
use owo_colors::OwoColorize;

use crate::cli::{AppContext, BatchArgs};
use crate::core::coverage;
use crate::core::coverage::{Assignment, CoverageSelector, LearningSentence, StopReason};
use crate::core::tagger::{Tagger, shared_tagger};
use crate::infra::config::{Config, ConfigError, EngineConfig, load_config};
use crate::infra::input::{read_lines, read_wordlist};
use crate::infra::progress::{BarSink, NoProgress, ProgressSink, emit};

/// CLI entry point for `lxv batch`.
pub fn run(args: BatchArgs, ctx: &AppContext) -> Result<()> {
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
    if args.fold_diacritics {
        cfg.fold_diacritics = true;
    }
    // The per-source cap comes from the shared budget, not config
    cfg.target_count = 0;

    let wordlist = read_wordlist(&args.words, cfg.fold_diacritics)?;
    let mut sources: Vec<Source> = Vec::with_capacity(args.sources.len());
    for path in &args.sources {
        let id = path
            .file_stem()
            .map_or_else(|| path.display().to_string(), |s| s.to_string_lossy().into_owned());
        sources.push((id, read_lines(path)?));
    }

    let orchestrator = BatchOrchestrator::new(cfg)?;

    let outcome = if ctx.quiet || args.json {
        orchestrator.run(&sources, &wordlist, args.budget, &mut NoProgress)
    } else {
        let mut bar = BarSink::new();
        let out = orchestrator.run(&sources, &wordlist, args.budget, &mut bar);
        bar.finish();
        out
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    if !ctx.quiet {
        let stats = &outcome.stats;
        println!(
            "{} {:.1}% ({}/{} words) across {} sources, {} sentences selected",
            "Coverage:".style(coverage::heading_style(ctx.no_color)),
            stats.coverage_pct,
            stats.words_covered,
            stats.total_words,
            stats.sources_processed,
            stats.total_sentences_selected
        );
        for s in &stats.per_source {
            println!(
                "  {} {}: {} selected, {} newly covered, {} remaining ({})",
                "-".style(coverage::dim_style(ctx.no_color)),
                s.source_id,
                s.sentences_selected,
                s.words_newly_covered,
                s.words_remaining,
                s.stopped_reason.as_str()
            );
        }
        if !stats.uncovered_words.is_empty() {
            coverage::print_uncovered(&stats.uncovered_words, ctx.no_color);
        }
    }
    Ok(())
}

/// One named source: an identifier and its candidate sentences.
pub type Source = (String, Vec<String>);

/// Per-source outcome summary, appended in processing order.
#[derive(Debug, Clone, Serialize)]
pub struct SourceStats {
    pub source_id: String,
    pub source_index: usize,
    pub sentences_scanned: usize,
    pub sentences_selected: usize,
    pub words_newly_covered: usize,
    pub words_remaining: usize,
    pub stopped_reason: StopReason,
}

/// Aggregate statistics for one batch run.
#[derive(Debug, Clone, Serialize)]
pub struct BatchStats {
    pub total_words: usize,
    pub words_covered: usize,
    pub words_uncovered: usize,
    /// Words still uncovered after the last processed source
    pub uncovered_words: Vec<String>,
    pub coverage_pct: f64,
    /// Shared sentence budget across all sources; 0 = unlimited
    pub global_budget: usize,
    pub total_sentences_selected: usize,
    pub sources_processed: usize,
    pub per_source: Vec<SourceStats>,
}

/// Full result of a batch run: combined assignments, stats, and the
/// re-ranked learning set across all sources.
#[derive(Debug, Clone, Serialize)]
pub struct BatchOutcome {
    pub assignments: Vec<Assignment>,
    pub stats: BatchStats,
    pub learning_set: Vec<LearningSentence>,
}

/// Sequential, budget-shrinking assembly line over sources.
pub struct BatchOrchestrator {
    cfg: EngineConfig,
    tagger: Arc<dyn Tagger>,
}

impl BatchOrchestrator {
    pub fn new(cfg: EngineConfig) -> Result<Self, ConfigError> {
        Self::with_tagger(cfg, shared_tagger())
    }

    pub fn with_tagger(cfg: EngineConfig, tagger: Arc<dyn Tagger>) -> Result<Self, ConfigError> {
        cfg.validate()?;
        Ok(Self { cfg, tagger })
    }

    /// Process every source in order against a shared word set and
    /// sentence budget (`global_budget`, 0 = unlimited).
    #[instrument(skip_all, fields(sources = sources.len(), words = wordlist.len(), budget = global_budget))]
    pub fn run(
        &self,
        sources: &[Source],
        wordlist: &IndexSet<String>,
        global_budget: usize,
        progress: &mut dyn ProgressSink,
    ) -> BatchOutcome {
        let total_words = wordlist.len();
        let mut uncovered: IndexSet<String> = wordlist.clone();
        let mut total_selected = 0usize;
        let mut assignments: Vec<Assignment> = Vec::new();
        let mut learning_set: Vec<LearningSentence> = Vec::new();
        let mut per_source: Vec<SourceStats> = Vec::new();

        for (source_index, (source_id, sentences)) in sources.iter().enumerate() {
            if uncovered.is_empty() {
                info!(source = source_id.as_str(), "all words covered; stopping early");
                break;
            }
            if global_budget > 0 && total_selected >= global_budget {
                info!(source = source_id.as_str(), "sentence budget spent; stopping early");
                break;
            }

            let remaining_budget = if global_budget == 0 {
                0
            } else {
                global_budget - total_selected
            };

            // Per-source run against a snapshot of the shared state.
            let source_cfg = EngineConfig {
                target_count: remaining_budget,
                ..self.cfg.clone()
            };
            let selector = CoverageSelector::with_tagger(source_cfg, self.tagger.clone())
                .expect("validated at orchestrator construction");
            let snapshot = uncovered.clone();
            let outcome = selector.select(sentences, &snapshot, progress);

            for assignment in outcome.assignments {
                uncovered.shift_remove(&assignment.word_key);
                assignments.push(Assignment {
                    source: Some(source_id.clone()),
                    ..assignment
                });
            }
            total_selected += outcome.stats.selected_sentence_count;

            for entry in outcome.stats.learning_set {
                learning_set.push(LearningSentence {
                    rank: learning_set.len() + 1,
                    source: Some(source_id.clone()),
                    ..entry
                });
            }

            per_source.push(SourceStats {
                source_id: source_id.clone(),
                source_index,
                sentences_scanned: outcome.stats.sentences_scanned,
                sentences_selected: outcome.stats.selected_sentence_count,
                words_newly_covered: outcome.stats.words_covered,
                words_remaining: uncovered.len(),
                stopped_reason: outcome.stats.stopped_reason,
            });

            let done = total_words.saturating_sub(uncovered.len());
            let pct = if total_words == 0 {
                100.0
            } else {
                done as f64 / total_words as f64 * 100.0
            };
            emit(progress, pct as u8, Some(source_id));
        }

        let words_covered = total_words - uncovered.len();
        let stats = BatchStats {
            total_words,
            words_covered,
            words_uncovered: uncovered.len(),
            uncovered_words: uncovered.iter().cloned().collect(),
            coverage_pct: if total_words == 0 {
                0.0
            } else {
                words_covered as f64 / total_words as f64 * 100.0
            },
            global_budget,
            total_sentences_selected: total_selected,
            sources_processed: per_source.len(),
            per_source,
        };

        info!(
            covered = stats.words_covered,
            total = stats.total_words,
            selected = stats.total_sentences_selected,
            sources = stats.sources_processed,
            "batch run finished"
        );

        BatchOutcome {
            assignments,
            stats,
            learning_set,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::normalize::expand_wordlist;
    use crate::infra::progress::NoProgress;

    fn orchestrator(budgetless_cfg: Option<EngineConfig>) -> BatchOrchestrator {
        BatchOrchestrator::new(budgetless_cfg.unwrap_or(EngineConfig {
            len_min: 1,
            len_max: 12,
            ..Default::default()
        }))
        .expect("valid config")
    }

    fn source(id: &str, texts: &[&str]) -> Source {
        (id.to_string(), texts.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn later_sources_only_chase_remaining_words() {
        let orch = orchestrator(None);
        let wordlist = expand_wordlist(
            ["chat", "chien", "manger", "dormir", "maison", "porte", "table", "livre"],
            false,
        );
        let sources = vec![
            source("a", &["Le chat mange.", "Le chien dort."]),
            // Also contains chat/chien, but those are already covered
            source("b", &[
                "Le chat voit la maison.",
                "La porte est grande.",
                "Le livre est sur la table.",
            ]),
        ];

        let outcome = orch.run(&sources, &wordlist, 0, &mut NoProgress);

        // First 4 words assigned from source "a" and never touched again
        for word in ["chat", "chien", "manger", "dormir"] {
            let matches: Vec<_> = outcome
                .assignments
                .iter()
                .filter(|a| a.word_key == word)
                .collect();
            assert_eq!(matches.len(), 1, "one assignment for {word}");
            assert_eq!(matches[0].source.as_deref(), Some("a"));
        }

        assert_eq!(outcome.stats.per_source[0].words_newly_covered, 4);
        assert_eq!(outcome.stats.per_source[1].words_remaining, 0);
        assert_eq!(outcome.stats.words_covered, 8);
    }

    #[test]
    fn budget_is_conserved_across_sources() {
        let orch = orchestrator(None);
        let wordlist = expand_wordlist(
            ["chat", "chien", "manger", "dormir", "maison", "porte"],
            false,
        );
        let sources = vec![
            source("a", &["Le chat mange.", "Le chien dort."]),
            source("b", &["Le chat voit la maison.", "La porte est grande."]),
        ];

        let outcome = orch.run(&sources, &wordlist, 3, &mut NoProgress);

        let per_source_sum: usize = outcome
            .stats
            .per_source
            .iter()
            .map(|s| s.sentences_selected)
            .sum();
        assert!(per_source_sum <= 3);
        assert_eq!(outcome.stats.total_sentences_selected, per_source_sum);
    }

    #[test]
    fn stops_once_budget_is_spent() {
        let orch = orchestrator(None);
        let wordlist = expand_wordlist(["chat", "chien", "maison"], false);
        let sources = vec![
            source("a", &["Le chat dort.", "Le chien mange."]),
            source("b", &["Le chat voit la maison."]),
        ];

        let outcome = orch.run(&sources, &wordlist, 2, &mut NoProgress);

        // Two sentences from source "a" exhaust the budget; source
        // "b" is never processed.
        assert_eq!(outcome.stats.sources_processed, 1);
        assert_eq!(outcome.stats.total_sentences_selected, 2);
    }

    #[test]
    fn stops_once_all_words_are_covered() {
        let orch = orchestrator(None);
        let wordlist = expand_wordlist(["chat", "manger"], false);
        let sources = vec![
            source("a", &["Le chat mange."]),
            source("b", &["Le chat dort."]),
        ];

        let outcome = orch.run(&sources, &wordlist, 0, &mut NoProgress);

        assert_eq!(outcome.stats.sources_processed, 1);
        assert_eq!(outcome.stats.words_covered, 2);
    }

    #[test]
    fn learning_set_is_re_ranked_across_sources() {
        let orch = orchestrator(None);
        let wordlist = expand_wordlist(["chat", "chien", "manger", "dormir", "maison"], false);
        let sources = vec![
            source("a", &["Le chat mange.", "Le chien dort."]),
            source("b", &["Le chat voit la maison."]),
        ];

        let outcome = orch.run(&sources, &wordlist, 0, &mut NoProgress);

        let ranks: Vec<usize> = outcome.learning_set.iter().map(|e| e.rank).collect();
        let expected: Vec<usize> = (1..=outcome.learning_set.len()).collect();
        assert_eq!(ranks, expected);

        let sources_seen: Vec<&str> = outcome
            .learning_set
            .iter()
            .filter_map(|e| e.source.as_deref())
            .collect();
        assert!(sources_seen.starts_with(&["a"]));
        assert!(sources_seen.ends_with(&["b"]));
    }

    #[test]
    fn empty_sources_produce_zeroed_stats() {
        let orch = orchestrator(None);
        let outcome = orch.run(&[], &IndexSet::new(), 10, &mut NoProgress);
        assert!(outcome.assignments.is_empty());
        assert_eq!(outcome.stats.sources_processed, 0);
        assert_eq!(outcome.stats.total_sentences_selected, 0);
    }
}

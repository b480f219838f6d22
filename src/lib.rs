//! **lexicover** - Vocabulary coverage engine for language-learning corpora
//!
//! Given a target word list and a corpus of candidate sentences,
//! select a minimal learning set that covers as many target words as
//! possible, under per-sentence length constraints and an optional
//! sentence budget, greedily with adaptive scoring. A non-greedy
//! filter mode and a multi-source budgeted batch mode ride on the
//! same index.

/// Command-line interface with clap integration
pub mod cli;

/// Shell completion generation
pub mod completion;

/// Coverage engine - indexing, scoring and selection
pub mod core {
    /// Word-key normalization, variant splitting, word-list expansion
    pub mod normalize;
    pub use normalize::{expand_wordlist, normalize_list_entry, normalize_word_key, split_variants};

    /// Tokenizer/tagger seam with the lightweight fallback backend
    pub mod tagger;
    pub use tagger::{FallbackTagger, Pos, Tagger, Token, shared_tagger};

    /// Sentence index: tokenized records inside the length window
    pub mod index;
    pub use index::{SentenceIndex, SentenceRecord, build_sentence_index};

    /// Inverted word -> sentence index over content words
    pub mod frequency;
    pub use frequency::{FrequencyIndex, build_frequency_index};

    /// Greedy coverage selector (the algorithmic heart)
    pub mod coverage;
    pub use coverage::{Assignment, CoverageOutcome, CoverageSelector, StopReason, run as cover_run};

    /// Threshold filter selector, order preserving
    pub mod filter;
    pub use filter::{FilterOutcome, FilterSelector, run as filter_run};

    /// Sequential multi-source orchestration under a shared budget
    pub mod batch;
    pub use batch::{BatchOrchestrator, BatchOutcome, run as batch_run};
}

/// Infrastructure - configuration, input files, progress reporting
pub mod infra {
    /// Configuration management with TOML support and env overrides
    pub mod config;
    pub use self::config::{Config, EngineConfig, FilterConfig, init as config_init, load_config};

    /// Line-oriented word-list and corpus input
    pub mod input;
    pub use input::{read_lines, read_wordlist};

    /// Progress sink contract (never throws, may be absent)
    pub mod progress;
    pub use progress::{BarSink, NoProgress, ProgressSink};
}

// Strategic re-exports for clean CLI interface
pub use cli::{AppContext, Cli, Commands};
pub use crate::core::{batch_run, cover_run, filter_run};
pub use crate::infra::{Config, EngineConfig, load_config};

// Core types for external consumers
pub use crate::core::coverage::{Assignment, CoverageOutcome, CoverageSelector, StopReason};
pub use crate::core::filter::FilterSelector;
pub use crate::core::batch::BatchOrchestrator;

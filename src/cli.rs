use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Shared application context for global flags
#[derive(Clone, Debug)]
pub struct AppContext {
    pub quiet: bool,    // global --quiet
    pub no_color: bool, // global --no-color
}

#[derive(Parser)]
#[command(name = "lxv")]
#[command(about = "Vocabulary coverage engine: pick the minimal sentence set covering a word list")]
#[command(version, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Suppress progress bars and non-essential output
    #[arg(long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Greedy coverage pass: minimal learning set for a word list
    Cover(CoverArgs),

    /// Threshold filter: keep dense short sentences, input order
    Filter(FilterArgs),

    /// Sequential multi-source coverage under a shared budget
    Batch(BatchArgs),

    /// Initialize a lexicover.toml config file
    Init(InitArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Parser)]
pub struct CoverArgs {
    /// Word list file, one entry per line (variants like "un|une" allowed)
    #[arg(short, long)]
    pub words: PathBuf,

    /// Sentence corpus file, one sentence per line
    #[arg(short, long)]
    pub sentences: PathBuf,

    /// Minimum sentence length in tokens
    #[arg(long)]
    pub len_min: Option<usize>,

    /// Maximum sentence length in tokens
    #[arg(long)]
    pub len_max: Option<usize>,

    /// Sentence budget (0 = unlimited)
    #[arg(long)]
    pub target: Option<usize>,

    /// Fold diacritics when matching (été == ete)
    #[arg(long)]
    pub fold_diacritics: bool,

    /// Leave elision contractions unresolved
    #[arg(long)]
    pub no_elisions: bool,

    /// Emit the full outcome as JSON to stdout
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser)]
pub struct FilterArgs {
    /// Word list file, one entry per line
    #[arg(short, long)]
    pub words: PathBuf,

    /// Sentence corpus file, one sentence per line
    #[arg(short, long)]
    pub sentences: PathBuf,

    /// Minimum in-list content-word matches to keep a sentence
    #[arg(long)]
    pub min_content_words: Option<usize>,

    /// Maximum token count to keep a sentence
    #[arg(long)]
    pub max_tokens: Option<usize>,

    /// Fold diacritics when matching
    #[arg(long)]
    pub fold_diacritics: bool,

    /// Emit the full outcome as JSON to stdout
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser)]
pub struct BatchArgs {
    /// Word list file, one entry per line
    #[arg(short, long)]
    pub words: PathBuf,

    /// Source corpus files, processed strictly in the given order
    #[arg(required = true)]
    pub sources: Vec<PathBuf>,

    /// Global sentence budget shared across sources (0 = unlimited)
    #[arg(long, default_value = "0")]
    pub budget: usize,

    /// Minimum sentence length in tokens
    #[arg(long)]
    pub len_min: Option<usize>,

    /// Maximum sentence length in tokens
    #[arg(long)]
    pub len_max: Option<usize>,

    /// Fold diacritics when matching
    #[arg(long)]
    pub fold_diacritics: bool,

    /// Emit the full outcome as JSON to stdout
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser)]
pub struct InitArgs {
    /// Directory for the config file
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Overwrite an existing config file
    #[arg(long)]
    pub force: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[derive(Parser)]
pub struct CompletionsArgs {
    /// Target shell
    #[arg(value_enum)]
    pub shell: Shell,

    /// Write the completion script to this directory
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Print the completion script to stdout instead
    #[arg(long)]
    pub stdout: bool,
}

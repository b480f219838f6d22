//! Word-key normalization helpers.
//!
//! Everything in here is a pure function over strings: trim, strip
//! list-numbering noise, resolve French elisions, case-fold and
//! optionally fold diacritics. Two elision behaviors coexist on
//! purpose: the token/lemma path *expands* a leading elision
//! (`l'homme` -> `lehomme`) while the word-list ingestion path
//! *drops* it (`l'homme` -> `homme`). Downstream consumers rely on
//! each form, so they are kept as separate entry points.

use indexmap::IndexSet;
use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Leading list-numbering pattern, e.g. "1. mot", "12) mot", "3 - mot"
static LEADING_INDEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+\s*[.)\-:]\s*").expect("valid leading-index regex"));

/// Zero-width and BOM-like characters stripped before any other step
const ZERO_WIDTH: [char; 5] = ['\u{200B}', '\u{200C}', '\u{200D}', '\u{2060}', '\u{FEFF}'];

/// Quote characters trimmed from both ends of an entry. The single
/// quotes are absent: they double as the French apostrophe and only
/// strip as a wrapping pair (see [`trim_single_quote_pair`]).
const QUOTES: [char; 6] = ['"', '\u{201C}', '\u{201D}', '«', '»', '`'];

/// Apostrophe-shaped characters, stripped only in pairs.
const SINGLE_QUOTES: [char; 3] = ['\'', '\u{2018}', '\u{2019}'];

/// Elided contractions and their full forms. `qu'` first so the
/// longest prefix wins.
const ELISIONS: [(&str, &str); 7] = [
    ("qu'", "que"),
    ("l'", "le"),
    ("d'", "de"),
    ("j'", "je"),
    ("n'", "ne"),
    ("t'", "te"),
    ("c'", "ce"),
];

/// How a leading elision contraction is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElisionMode {
    /// `l'homme` -> `lehomme` (lemma/token normalization)
    Expand,
    /// `l'homme` -> `homme` (word-list ingestion)
    Drop,
    /// Leave the apostrophe form untouched
    Keep,
}

/// Canonical normalization used for sentence tokens and lemmas.
///
/// Steps, in order: trim, strip zero-width characters, strip
/// surrounding quotes, strip a leading numeric index ("1. mot" ->
/// "mot"), expand a leading elision, case-fold, optionally remove
/// combining marks via NFD, collapse internal whitespace.
///
/// Total: empty string in, empty string out. Never panics.
pub fn normalize_word_key(raw: &str, fold_diacritics: bool) -> String {
    normalize_key_opts(raw, fold_diacritics, ElisionMode::Expand)
}

/// Normalization for raw word-list entries. Identical pipeline to
/// [`normalize_word_key`] except a leading elision is dropped
/// entirely, keeping only the head word.
pub fn normalize_list_entry(raw: &str, fold_diacritics: bool) -> String {
    normalize_key_opts(raw, fold_diacritics, ElisionMode::Drop)
}

/// Shared pipeline behind the public entry points. The indexer calls
/// this with [`ElisionMode::Keep`] when elision handling is disabled
/// in configuration.
pub fn normalize_key_opts(raw: &str, fold_diacritics: bool, elisions: ElisionMode) -> String {
    let s = raw.trim();
    if s.is_empty() {
        return String::new();
    }

    let mut s: String = s.chars().filter(|c| !ZERO_WIDTH.contains(c)).collect();
    // Quote and numbering layers can nest ("1. 'mot'"); strip until
    // stable so the pipeline is idempotent.
    loop {
        let trimmed = s.trim().trim_matches(|c| QUOTES.contains(&c)).trim();
        let trimmed = trim_single_quote_pair(trimmed);
        let stripped = LEADING_INDEX.replace(trimmed, "");
        if stripped == s {
            break;
        }
        s = stripped.into_owned();
    }

    let s = resolve_elision(&s, elisions);
    let s = s.to_lowercase();

    let s = if fold_diacritics {
        s.nfd().filter(|c| !is_combining_mark(*c)).collect()
    } else {
        s
    };

    collapse_whitespace(&s)
}

/// Split a multi-form entry like `"un|une"` or `"beau / belle"` into
/// its candidate words. Splits on `|`, `/` and `,`; empties dropped.
pub fn split_variants(raw: &str) -> Vec<String> {
    raw.split(['|', '/', ','])
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// First whitespace-delimited token of a phrase entry, e.g.
/// `"faire attention"` -> `"faire"`. Empty input yields empty output.
pub fn phrase_head(raw: &str) -> &str {
    raw.split_whitespace().next().unwrap_or("")
}

/// Build the target key set from raw word-list entries: variants are
/// split, each candidate run through the list-ingestion normalizer,
/// and phrases reduced to their head token. Normalization comes
/// first so a numbered entry like `"1. chat"` loses its index before
/// the head is taken. Empty keys are discarded and duplicates
/// collapse.
pub fn expand_wordlist<'a, I>(entries: I, fold_diacritics: bool) -> IndexSet<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut keys = IndexSet::new();
    for entry in entries {
        for variant in split_variants(entry) {
            let normalized = normalize_list_entry(&variant, fold_diacritics);
            let key = phrase_head(&normalized);
            if !key.is_empty() {
                keys.insert(key.to_string());
            }
        }
    }
    keys
}

/// Strip single quotes only when they wrap the entry on both ends.
/// One-sided trimming would turn a bare contraction like `l'` into
/// `l` before elision handling ever sees it.
fn trim_single_quote_pair(s: &str) -> &str {
    let mut s = s;
    loop {
        let mut chars = s.chars();
        match (chars.next(), chars.next_back()) {
            (Some(first), Some(last))
                if SINGLE_QUOTES.contains(&first) && SINGLE_QUOTES.contains(&last) =>
            {
                s = &s[first.len_utf8()..s.len() - last.len_utf8()];
            }
            _ => break,
        }
    }
    s.trim()
}

/// Resolve a leading elided contraction. Matching is
/// case-insensitive and accepts both the ASCII apostrophe and
/// U+2019.
fn resolve_elision(s: &str, mode: ElisionMode) -> String {
    if mode == ElisionMode::Keep {
        return s.to_string();
    }

    // U+2019 is three bytes where the ASCII apostrophe is one, so
    // prefix matching walks chars and slices at the original byte
    // offset rather than comparing folded strings.
    let fold = |c: char| {
        if c == '\u{2019}' { '\'' } else { c.to_ascii_lowercase() }
    };

    'next: for (contraction, full) in ELISIONS {
        let mut indices = s.char_indices();
        for expected in contraction.chars() {
            match indices.next() {
                Some((_, c)) if fold(c) == expected => {}
                _ => continue 'next,
            }
        }
        // A bare contraction with nothing after it is not an elision.
        let Some((rest_start, _)) = indices.next() else {
            continue;
        };
        let rest = &s[rest_start..];
        return match mode {
            ElisionMode::Expand => format!("{full}{rest}"),
            ElisionMode::Drop => rest.to_string(),
            ElisionMode::Keep => unreachable!("handled above"),
        };
    }

    s.to_string()
}

/// Collapse runs of internal whitespace into single spaces.
fn collapse_whitespace(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_gap = false;
    for c in s.chars() {
        if c.is_whitespace() {
            in_gap = true;
        } else {
            if in_gap && !out.is_empty() {
                out.push(' ');
            }
            in_gap = false;
            out.push(c);
        }
    }
    out
}

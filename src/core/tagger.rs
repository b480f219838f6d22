//! Tokenization seam for the coverage engine.
//!
//! The indexer depends only on the [`Tagger`] trait. A full
//! linguistic pipeline (lemmatizer + POS model) would implement the
//! same trait; what ships here is [`FallbackTagger`], a lightweight
//! tokenizer with coarse POS inference from a French function-word
//! lexicon, a lemma exception table for high-frequency verb forms,
//! and suffix heuristics. It must never fail: a sentence it cannot
//! make sense of simply tokenizes to fewer (or zero) tokens.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use moka::sync::Cache;
use once_cell::sync::Lazy;
use serde::Serialize;
use unicode_segmentation::UnicodeSegmentation;
use xxhash_rust::xxh64::Xxh64;

use crate::core::normalize::{ElisionMode, normalize_key_opts};

/// Coarse universal part-of-speech tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Pos {
    Noun,
    Verb,
    Adj,
    Adv,
    Propn,
    Det,
    Pron,
    Adp,
    Conj,
    Num,
    Intj,
    Other,
}

impl Pos {
    /// Content words are the only ones that count toward coverage.
    pub fn is_content(self) -> bool {
        matches!(self, Pos::Noun | Pos::Verb | Pos::Adj | Pos::Adv | Pos::Propn)
    }
}

/// One lexical token of a sentence. Immutable once produced.
#[derive(Debug, Clone, Serialize)]
pub struct Token {
    /// Surface form as it appears in the sentence
    pub surface: String,
    /// Lemma; falls back to the surface when no lemmatizer is present
    pub lemma: String,
    /// Canonical lookup key (lowercased, optionally diacritic-folded,
    /// elision-resolved)
    pub normalized: String,
    /// Part-of-speech tag when the tagger provides one
    pub pos: Option<Pos>,
}

impl Token {
    pub fn is_content(&self) -> bool {
        self.pos.is_some_and(Pos::is_content)
    }
}

/// Per-call tokenization options, mirrored from engine configuration.
#[derive(Debug, Clone, Copy)]
pub struct TokenizeOpts {
    pub fold_diacritics: bool,
    pub handle_elisions: bool,
}

/// Pluggable tokenizer/tagger. Implementations are selected at
/// construction time; the selection code never inspects which one it
/// got.
pub trait Tagger: Send + Sync {
    /// Tokenize one sentence into lexical tokens. Punctuation and
    /// whitespace-only tokens are already discarded. Never fails: bad
    /// input yields an empty token list.
    fn tokenize(&self, sentence: &str, opts: &TokenizeOpts) -> Vec<Token>;

    /// Short backend name, for logs.
    fn name(&self) -> &'static str;
}

static DETERMINERS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    HashSet::from([
        "le", "la", "les", "un", "une", "des", "du", "ce", "cet", "cette", "ces", "mon", "ma",
        "mes", "ton", "ta", "tes", "son", "sa", "ses", "notre", "nos", "votre", "vos", "leur",
        "leurs", "au", "aux", "quel", "quelle", "quels", "quelles",
    ])
});

static PRONOUNS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    HashSet::from([
        "je", "tu", "il", "elle", "on", "nous", "vous", "ils", "elles", "me", "te", "se", "moi",
        "toi", "lui", "eux", "y", "en", "qui", "que", "quoi", "dont", "où", "ça", "cela", "ceci",
    ])
});

static PREPOSITIONS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    HashSet::from([
        "à", "de", "dans", "sur", "sous", "avec", "sans", "pour", "par", "entre", "vers", "chez",
        "après", "avant", "depuis", "pendant", "contre",
    ])
});

static CONJUNCTIONS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    HashSet::from(["et", "ou", "mais", "donc", "or", "ni", "car", "si", "quand", "comme", "lorsque"])
});

static ADVERBS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    HashSet::from([
        "ne", "pas", "plus", "moins", "très", "bien", "mal", "toujours", "jamais", "souvent",
        "ici", "là", "aussi", "encore", "déjà", "trop", "peu", "beaucoup", "vite", "hier",
        "demain", "aujourd'hui",
    ])
});

static INTERJECTIONS: Lazy<HashSet<&'static str>> =
    Lazy::new(|| HashSet::from(["oui", "non", "ah", "oh", "eh", "hein", "voilà", "bonjour", "merci"]));

/// Inflected form -> infinitive for common French verbs. The full
/// pipeline gets this from its lemmatizer; the fallback carries an
/// exception table for the forms that matter most in beginner
/// corpora. Unknown forms keep their surface as lemma.
static LEMMA_EXCEPTIONS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        // être / avoir
        ("suis", "être"), ("es", "être"), ("est", "être"), ("sommes", "être"),
        ("êtes", "être"), ("sont", "être"), ("était", "être"), ("étaient", "être"),
        ("ai", "avoir"), ("as", "avoir"), ("a", "avoir"), ("avons", "avoir"),
        ("avez", "avoir"), ("ont", "avoir"), ("avait", "avoir"),
        // high-frequency irregulars
        ("vais", "aller"), ("vas", "aller"), ("va", "aller"), ("allons", "aller"),
        ("allez", "aller"), ("vont", "aller"),
        ("fais", "faire"), ("fait", "faire"), ("faisons", "faire"), ("font", "faire"),
        ("dis", "dire"), ("dit", "dire"), ("disent", "dire"),
        ("peux", "pouvoir"), ("peut", "pouvoir"), ("peuvent", "pouvoir"),
        ("veux", "vouloir"), ("veut", "vouloir"), ("veulent", "vouloir"),
        ("sais", "savoir"), ("sait", "savoir"), ("savent", "savoir"),
        ("vois", "voir"), ("voit", "voir"), ("voient", "voir"),
        ("prends", "prendre"), ("prend", "prendre"), ("prennent", "prendre"),
        ("viens", "venir"), ("vient", "venir"), ("viennent", "venir"),
        ("bois", "boire"), ("boit", "boire"), ("boivent", "boire"),
        ("lis", "lire"), ("lit", "lire"), ("lisent", "lire"),
        ("écris", "écrire"), ("écrit", "écrire"), ("écrivent", "écrire"),
        ("dors", "dormir"), ("dort", "dormir"), ("dorment", "dormir"),
        ("sors", "sortir"), ("sort", "sortir"), ("sortent", "sortir"),
        ("pars", "partir"), ("part", "partir"), ("partent", "partir"),
        ("mets", "mettre"), ("met", "mettre"), ("mettent", "mettre"),
        // common first-group forms
        ("mange", "manger"), ("manges", "manger"), ("mangent", "manger"),
        ("mangeons", "manger"), ("mangez", "manger"),
        ("parle", "parler"), ("parles", "parler"), ("parlent", "parler"),
        ("aime", "aimer"), ("aimes", "aimer"), ("aiment", "aimer"),
        ("joue", "jouer"), ("joues", "jouer"), ("jouent", "jouer"),
        ("donne", "donner"), ("donnes", "donner"), ("donnent", "donner"),
        ("habite", "habiter"), ("habites", "habiter"), ("habitent", "habiter"),
        ("regarde", "regarder"), ("regardes", "regarder"), ("regardent", "regarder"),
    ])
});

/// Lightweight tokenizer with coarse POS inference.
///
/// Word splitting follows UAX-29 word boundaries, which keeps
/// apostrophe contractions like `l'homme` as single tokens.
/// Normalization results are memoized since the same surface forms
/// recur constantly across a corpus.
pub struct FallbackTagger {
    /// lemma+opts digest -> normalized key
    norm_cache: Cache<u64, String>,
}

impl FallbackTagger {
    pub fn new() -> Self {
        Self {
            norm_cache: Cache::new(100_000),
        }
    }

    fn normalized_key(&self, lemma: &str, opts: &TokenizeOpts) -> String {
        let mut hasher = Xxh64::new(0);
        hasher.update(lemma.as_bytes());
        hasher.update(&[u8::from(opts.fold_diacritics), u8::from(opts.handle_elisions)]);
        let key = hasher.digest();

        if let Some(hit) = self.norm_cache.get(&key) {
            return hit;
        }

        let mode = if opts.handle_elisions {
            ElisionMode::Expand
        } else {
            ElisionMode::Keep
        };
        let normalized = normalize_key_opts(lemma, opts.fold_diacritics, mode);
        self.norm_cache.insert(key, normalized.clone());
        normalized
    }

    /// Coarse POS guess from function-word lexicon and suffix shape.
    fn infer_pos(surface: &str, position: usize) -> Pos {
        let lower = surface.to_lowercase();
        // Elided function words keep their apostrophe form in the
        // surface; classify from the contraction itself.
        let lookup = lower
            .replace('\u{2019}', "'")
            .trim_end_matches('\'')
            .to_string();

        if lower.chars().all(|c| c.is_ascii_digit()) {
            return Pos::Num;
        }
        if DETERMINERS.contains(lookup.as_str()) || matches!(lookup.as_str(), "l" | "d") {
            return Pos::Det;
        }
        if PRONOUNS.contains(lookup.as_str())
            || matches!(lookup.as_str(), "j" | "t" | "s" | "m" | "c" | "qu")
        {
            return Pos::Pron;
        }
        if PREPOSITIONS.contains(lookup.as_str()) {
            return Pos::Adp;
        }
        if CONJUNCTIONS.contains(lookup.as_str()) {
            return Pos::Conj;
        }
        if LEMMA_EXCEPTIONS.contains_key(lookup.as_str()) {
            return Pos::Verb;
        }
        if ADVERBS.contains(lookup.as_str()) || lower.ends_with("ment") {
            return Pos::Adv;
        }
        if INTERJECTIONS.contains(lookup.as_str()) {
            return Pos::Intj;
        }
        // Mid-sentence capitalization reads as a proper noun.
        if position > 0 && surface.chars().next().is_some_and(char::is_uppercase) {
            return Pos::Propn;
        }
        if lower.len() > 3 && (lower.ends_with("er") || lower.ends_with("ir") || lower.ends_with("oir")) {
            return Pos::Verb;
        }

        Pos::Noun
    }
}

impl Default for FallbackTagger {
    fn default() -> Self {
        Self::new()
    }
}

impl Tagger for FallbackTagger {
    fn tokenize(&self, sentence: &str, opts: &TokenizeOpts) -> Vec<Token> {
        sentence
            .unicode_words()
            .enumerate()
            .map(|(i, word)| {
                let lemma = LEMMA_EXCEPTIONS
                    .get(word.to_lowercase().as_str())
                    .map_or_else(|| word.to_string(), |l| (*l).to_string());
                let normalized = self.normalized_key(&lemma, opts);
                Token {
                    surface: word.to_string(),
                    lemma,
                    normalized,
                    pos: Some(Self::infer_pos(word, i)),
                }
            })
            .filter(|t| !t.normalized.is_empty())
            .collect()
    }

    fn name(&self) -> &'static str {
        "fallback"
    }
}

static SHARED: Lazy<Arc<FallbackTagger>> = Lazy::new(|| Arc::new(FallbackTagger::new()));

/// Process-wide tagger instance, initialized once and read-only
/// thereafter. A heavyweight model would be loaded here instead.
pub fn shared_tagger() -> Arc<dyn Tagger> {
    SHARED.clone() as Arc<dyn Tagger>
}

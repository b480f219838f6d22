//! Line-oriented input files for the CLI: word lists and sentence
//! corpora, one entry per line, blank lines skipped.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use indexmap::IndexSet;

use crate::core::normalize::expand_wordlist;

/// Read non-empty trimmed lines from a UTF-8 text file.
pub fn read_lines(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("read {}", path.display()))?;

    Ok(text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}

/// Read a word-list file and expand it into normalized target keys.
pub fn read_wordlist(path: &Path, fold_diacritics: bool) -> Result<IndexSet<String>> {
    let lines = read_lines(path)?;
    Ok(expand_wordlist(lines.iter().map(String::as_str), fold_diacritics))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn skips_blank_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "chat\n\n  chien  \n").unwrap();

        let lines = read_lines(file.path()).unwrap();
        assert_eq!(lines, vec!["chat", "chien"]);
    }

    #[test]
    fn wordlist_is_normalized_and_expanded() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "1. Chat\nun|une\nl'homme").unwrap();

        let keys = read_wordlist(file.path(), false).unwrap();
        let got: Vec<&str> = keys.iter().map(String::as_str).collect();
        assert_eq!(got, vec!["chat", "un", "une", "homme"]);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(read_lines(Path::new("no/such/file.txt")).is_err());
    }
}

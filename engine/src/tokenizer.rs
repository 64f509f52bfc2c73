use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref WORD: Regex = Regex::new(r"(?u)\p{L}+").expect("valid regex");
    static ref STOPWORD: Regex = Regex::new(r"[a-zA-Z]+").expect("valid regex");
}

/// Turns raw text into index terms: NFKC normalization, lowercase, maximal
/// letter runs, stopword removal and a minimum token length.
#[derive(Debug, Clone, Default)]
pub struct Tokenizer {
    stopwords: HashSet<String>,
    min_len: usize,
}

impl Tokenizer {
    pub fn new(stopwords: HashSet<String>, min_len: usize) -> Self {
        Self { stopwords, min_len }
    }

    /// Load stopwords from `path`. Any alphabetic run in the file counts as a
    /// stopword, so both one-word-per-line lists and HTML-wrapped lists work.
    /// A missing file is not fatal: the tokenizer runs with no stopwords.
    pub fn from_stopwords_file<P: AsRef<Path>>(path: P, min_len: usize) -> Self {
        let path = path.as_ref();
        let stopwords = match fs::read_to_string(path) {
            Ok(text) => parse_stopwords(&text),
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "stopwords file not readable, continuing without stopwords");
                HashSet::new()
            }
        };
        tracing::info!(count = stopwords.len(), "loaded stopwords");
        Self::new(stopwords, min_len)
    }

    pub fn num_stopwords(&self) -> usize { self.stopwords.len() }

    pub fn is_stopword(&self, token: &str) -> bool { self.stopwords.contains(token) }

    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let normalized = text.nfkc().collect::<String>().to_lowercase();
        WORD.find_iter(&normalized)
            .map(|m| m.as_str())
            .filter(|t| t.chars().count() >= self.min_len && !self.is_stopword(t))
            .map(str::to_string)
            .collect()
    }
}

pub fn parse_stopwords(text: &str) -> HashSet<String> {
    STOPWORD.find_iter(text).map(|m| m.as_str().to_lowercase()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_digits_punctuation_and_short_tokens() {
        let t = Tokenizer::new(HashSet::new(), 3);
        assert_eq!(t.tokenize("Cats, 42 dogs & an OX!"), vec!["cats", "dogs"]);
    }

    #[test]
    fn stopwords_from_html_list() {
        let words = parse_stopwords("<ul><li>The</li>\n<li>and</li></ul>");
        assert!(words.contains("the"));
        assert!(words.contains("and"));
        assert!(words.contains("li"));
    }

    #[test]
    fn missing_stopwords_file_is_empty() {
        let t = Tokenizer::from_stopwords_file("/definitely/not/here.txt", 1);
        assert_eq!(t.num_stopwords(), 0);
        assert_eq!(t.tokenize("a b"), vec!["a", "b"]);
    }
}

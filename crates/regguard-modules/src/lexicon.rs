//! Case-insensitive whole-word term matching

use aho_corasick::{AhoCorasick, MatchKind};
use regguard_core::{Error, Result};

/// Fast multi-term matcher built on the Aho-Corasick algorithm
pub struct Lexicon {
    matcher: AhoCorasick,
    terms: Vec<String>,
}

impl Lexicon {
    /// Build a lexicon from a list of terms
    pub fn new<I, S>(terms: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let terms: Vec<String> = terms
            .into_iter()
            .map(Into::into)
            .filter(|t| !t.trim().is_empty())
            .collect();

        let matcher = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .match_kind(MatchKind::LeftmostLongest)
            .build(&terms)
            .map_err(|e| Error::config(format!("Failed to build term matcher: {}", e)))?;

        Ok(Self { matcher, terms })
    }

    /// Distinct terms found as whole words, in order of first appearance
    pub fn matches(&self, text: &str) -> Vec<&str> {
        let bytes = text.as_bytes();
        let mut found: Vec<&str> = Vec::new();

        for mat in self.matcher.find_iter(text) {
            let before = mat.start().checked_sub(1).map(|i| bytes[i]);
            let after = bytes.get(mat.end()).copied();
            if is_word_byte(before) || is_word_byte(after) {
                continue;
            }

            let term = self.terms[mat.pattern().as_usize()].as_str();
            if !found.contains(&term) {
                found.push(term);
            }
        }

        found
    }

    /// Whether any term occurs as a whole word
    pub fn is_match(&self, text: &str) -> bool {
        !self.matches(text).is_empty()
    }

    /// The configured terms
    pub fn terms(&self) -> &[String] {
        &self.terms
    }
}

fn is_word_byte(byte: Option<u8>) -> bool {
    byte.map_or(false, |b| b.is_ascii_alphanumeric() || b == b'_')
}

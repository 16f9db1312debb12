//! Whole-word keyword matching.

use regex::{Regex, RegexBuilder};
use tracing::warn;

/// Compiles the whole-word, case-insensitive pattern for one keyword.
///
/// Word boundaries are Unicode-aware, so Arabic or Cyrillic keywords are
/// bounded the same way Latin ones are.
pub fn compile_keyword(keyword: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(&format!(r"\b{}\b", regex::escape(keyword)))
        .case_insensitive(true)
        .build()
}

/// Whether a keyword begins and ends with a word character.
///
/// Keywords such as `C++` or `50%` compile, but the trailing `\b` only
/// matches when a word character follows, so they miss text where they
/// stand between spaces.
#[must_use]
pub fn has_word_edges(keyword: &str) -> bool {
    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    matches!(
        (keyword.chars().next(), keyword.chars().next_back()),
        (Some(first), Some(last)) if is_word(first) && is_word(last)
    )
}

/// Keyword patterns compiled once, in configured order.
#[derive(Debug, Clone, Default)]
pub struct KeywordMatcher {
    patterns: Vec<(String, Regex)>,
}

impl KeywordMatcher {
    /// Compiles all keywords. Empty keywords and keywords whose pattern
    /// fails to compile are skipped with a warning.
    #[must_use]
    pub fn new(keywords: &[String]) -> Self {
        let patterns = keywords
            .iter()
            .filter(|keyword| !keyword.is_empty())
            .filter_map(|keyword| match compile_keyword(keyword) {
                Ok(regex) => Some((keyword.clone(), regex)),
                Err(e) => {
                    warn!("Skipping keyword '{}': {}", keyword, e);
                    None
                }
            })
            .collect();

        Self { patterns }
    }

    /// Returns the first keyword that occurs in `text` as a whole word.
    #[must_use]
    pub fn find(&self, text: &str) -> Option<&str> {
        if text.is_empty() {
            return None;
        }

        self.patterns
            .iter()
            .find(|(_, regex)| regex.is_match(text))
            .map(|(keyword, _)| keyword.as_str())
    }

    /// Number of active patterns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Whether no pattern is active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// One-shot variant of [`KeywordMatcher::find`].
#[must_use]
pub fn find_match<'k>(text: &str, keywords: &'k [String]) -> Option<&'k str> {
    if text.is_empty() {
        return None;
    }

    keywords
        .iter()
        .filter(|keyword| !keyword.is_empty())
        .find(|keyword| compile_keyword(keyword).is_ok_and(|regex| regex.is_match(text)))
        .map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(list: &[&str]) -> Vec<String> {
        list.iter().map(|w| (*w).to_owned()).collect()
    }

    #[test]
    fn test_arabic_whole_word() {
        let keywords = words(&["حصري"]);
        assert_eq!(find_match("هذا عرض حصري اليوم", &keywords), Some("حصري"));
        // Prefixed with the definite article it is a different word.
        assert_eq!(find_match("العرض الحصري اليوم", &keywords), None);
    }

    #[test]
    fn test_case_insensitive() {
        let keywords = words(&["urgent"]);
        assert_eq!(find_match("URGENT: read this", &keywords), Some("urgent"));
        assert_eq!(find_match("Something Urgent.", &keywords), Some("urgent"));
    }

    #[test]
    fn test_substring_inside_word_does_not_match() {
        let keywords = words(&["sale"]);
        assert_eq!(find_match("wholesale prices", &keywords), None);
        assert_eq!(find_match("salesman", &keywords), None);
        assert_eq!(find_match("big sale!", &keywords), Some("sale"));
    }

    #[test]
    fn test_first_configured_keyword_wins() {
        let keywords = words(&["discount", "sale"]);
        assert_eq!(
            find_match("sale and discount today", &keywords),
            Some("discount")
        );
    }

    #[test]
    fn test_empty_inputs() {
        assert_eq!(find_match("", &words(&["sale"])), None);
        assert_eq!(find_match("sale", &[]), None);
        assert_eq!(find_match("sale", &words(&[""])), None);
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        let keywords = words(&["a.b"]);
        assert_eq!(find_match("axb", &keywords), None);
        assert_eq!(find_match("see a.b now", &keywords), Some("a.b"));
    }

    #[test]
    fn test_compiled_matcher_agrees_with_find_match() {
        let keywords = words(&["عاجل", "خصم", "هام", "حصري"]);
        let matcher = KeywordMatcher::new(&keywords);
        assert_eq!(matcher.len(), 4);

        for text in ["خبر عاجل الآن", "لا شيء هنا", "خصم 50% هام", ""] {
            assert_eq!(matcher.find(text), find_match(text, &keywords), "{text}");
        }
    }

    #[test]
    fn test_word_edges() {
        assert!(has_word_edges("sale"));
        assert!(has_word_edges("حصري"));
        assert!(has_word_edges("a.b"));
        assert!(!has_word_edges("C++"));
        assert!(!has_word_edges("50%"));
        assert!(!has_word_edges(""));

        // Standalone occurrences are missed.
        assert_eq!(find_match("learning C++ today", &words(&["C++"])), None);
    }
}

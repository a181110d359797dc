use std::collections::HashSet;

use crate::traits::TokenClassifier;

/// Keyword-list token classifier: splits on non-alphanumeric boundaries and
/// drops stopwords and bare punctuation/digits. Substitutable with a real
/// linguistic pipeline behind the same trait.
pub struct BasicTokenClassifier {
    stopwords: HashSet<&'static str>,
}

const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "has", "have", "if", "in",
    "is", "it", "its", "of", "on", "or", "that", "the", "this", "to", "was", "were", "which",
    "will", "with",
];

impl BasicTokenClassifier {
    pub fn new() -> Self {
        Self {
            stopwords: STOPWORDS.iter().copied().collect(),
        }
    }
}

impl Default for BasicTokenClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenClassifier for BasicTokenClassifier {
    fn significant_token_count(&self, text: &str) -> usize {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|token| !token.is_empty())
            .filter(|token| token.chars().any(char::is_alphabetic))
            .filter(|token| !self.stopwords.contains(token.to_lowercase().as_str()))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stopwords_and_punctuation_are_not_significant() {
        let classifier = BasicTokenClassifier::new();
        // "class", "Student", "encapsulates", "name" — the rest is noise
        let count =
            classifier.significant_token_count("The class Student encapsulates a name, 123 ...");
        assert_eq!(count, 4);
    }

    #[test]
    fn empty_text_has_no_tokens() {
        let classifier = BasicTokenClassifier::new();
        assert_eq!(classifier.significant_token_count(""), 0);
        assert_eq!(classifier.significant_token_count("... 42 !!"), 0);
    }
}

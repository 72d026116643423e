//! Blocked-term text classifier

use async_trait::async_trait;
use blockwatch_core::Result;

use crate::classifier::{Classifier, Verdict};

/// Terms that reject a text body outright
const DEFAULT_BLOCKED_TERMS: &[&str] = &[
    "spam", "scam", "fraud", "offensive", "violence", "drugs",
];

/// Text classifier screening bodies against a blocked-term lexicon.
///
/// This implementation is intentionally dependency-light and deterministic;
/// richer heuristics plug in behind the same [`Classifier`] trait.
pub struct LexiconClassifier {
    name: String,
    blocked_terms: Vec<String>,
}

impl LexiconClassifier {
    /// Create a classifier with the default term list
    pub fn new() -> Self {
        Self::with_terms(DEFAULT_BLOCKED_TERMS.iter().map(|t| t.to_string()))
    }

    /// Create a classifier with a custom term list
    pub fn with_terms(terms: impl IntoIterator<Item = String>) -> Self {
        Self {
            name: "lexicon".to_string(),
            blocked_terms: terms
                .into_iter()
                .map(|t| t.to_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
        }
    }
}

impl Default for LexiconClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Classifier for LexiconClassifier {
    async fn classify(&self, input: &str) -> Result<Verdict> {
        let text = input.to_lowercase();

        let blocked = self.blocked_terms.iter().any(|term| text.contains(term));
        if blocked {
            return Ok(Verdict::Rejected);
        }

        Ok(Verdict::Approved)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_clean_text_approved() {
        let classifier = LexiconClassifier::new();
        let verdict = classifier
            .classify("Broken streetlight on 5th avenue")
            .await
            .unwrap();
        assert_eq!(verdict, Verdict::Approved);
    }

    #[tokio::test]
    async fn test_blocked_term_rejected() {
        let classifier = LexiconClassifier::new();
        let verdict = classifier
            .classify("Great SCAM opportunity, click here")
            .await
            .unwrap();
        assert_eq!(verdict, Verdict::Rejected);
    }

    #[tokio::test]
    async fn test_custom_terms() {
        let classifier = LexiconClassifier::with_terms(vec!["zucchini".to_string()]);

        let verdict = classifier.classify("I sell zucchini").await.unwrap();
        assert_eq!(verdict, Verdict::Rejected);

        // Default terms no longer apply
        let verdict = classifier.classify("total spam").await.unwrap();
        assert_eq!(verdict, Verdict::Approved);
    }
}

//! Classifier trait and verdicts

use async_trait::async_trait;
use blockwatch_core::{ModerationState, Result};

/// Outcome of one classification call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Content is acceptable
    Approved,
    /// Content violates the content policies
    Rejected,
}

impl Verdict {
    /// Whether this verdict admits the content
    pub fn is_approved(self) -> bool {
        matches!(self, Self::Approved)
    }

    /// The terminal moderation state this verdict maps to
    pub fn into_state(self) -> ModerationState {
        match self {
            Self::Approved => ModerationState::Approved,
            Self::Rejected => ModerationState::Rejected,
        }
    }
}

/// Trait for all classifiers.
///
/// A classifier is a black box to the pipeline: it may take seconds, it is
/// not guaranteed to be deterministic, and its verdict is never retried once
/// received. `input` is the raw text body for text classifiers and the media
/// locator for media classifiers.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Classify the given input
    async fn classify(&self, input: &str) -> Result<Verdict>;

    /// Get the classifier name
    fn name(&self) -> &str;
}

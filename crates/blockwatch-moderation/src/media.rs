//! Media-locator classifier

use async_trait::async_trait;
use blockwatch_core::Result;

use crate::classifier::{Classifier, Verdict};

/// Locator substrings that reject attached media outright
const SUSPICIOUS_NAMES: &[&str] = &["virus", "malware", "hack"];

/// Minimum plausible length of a media locator
const MIN_LOCATOR_LEN: usize = 5;

/// Classifier screening media by its locator.
///
/// A stand-in for a real image/video analysis service: it rejects obviously
/// malformed locators and locators whose names match a suspicious-name list,
/// and approves everything else.
pub struct MediaLocatorClassifier {
    name: String,
}

impl MediaLocatorClassifier {
    pub fn new() -> Self {
        Self {
            name: "media-locator".to_string(),
        }
    }
}

impl Default for MediaLocatorClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Classifier for MediaLocatorClassifier {
    async fn classify(&self, input: &str) -> Result<Verdict> {
        if input.trim().len() < MIN_LOCATOR_LEN {
            return Ok(Verdict::Rejected);
        }

        let locator = input.to_lowercase();
        let suspicious = SUSPICIOUS_NAMES.iter().any(|name| locator.contains(name));
        if suspicious {
            return Ok(Verdict::Rejected);
        }

        Ok(Verdict::Approved)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

//! Composite content screen.
//!
//! Runs the sub-checks for whichever signals a content item carries and
//! approves only when every sub-check approves (logical AND). The screen
//! also owns the classification deadline: an elapsed timeout is reported as
//! a classification failure for the orchestrator's deny-by-default path.

use std::sync::Arc;
use std::time::Duration;

use futures::future::{join_all, BoxFuture};
use futures::FutureExt;
use tracing::debug;

use blockwatch_core::{Error, Result};

use crate::classifier::{Classifier, Verdict};

/// Default classification deadline
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Composite screen over the text and media classifiers
pub struct ContentScreen {
    text: Arc<dyn Classifier>,
    media: Arc<dyn Classifier>,
    timeout: Duration,
}

impl ContentScreen {
    /// Create a screen over the given classifiers with the default deadline
    pub fn new(text: Arc<dyn Classifier>, media: Arc<dyn Classifier>) -> Self {
        Self {
            text,
            media,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Override the classification deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Screen a content item's signals.
    ///
    /// Sub-checks run concurrently; the item is rejected if **any** sub-check
    /// rejects. An item with no reviewable signal is a classifier error (the
    /// creation boundary refuses such items before they get here).
    pub async fn review(&self, body: Option<&str>, media_url: Option<&str>) -> Result<Verdict> {
        let mut checks: Vec<BoxFuture<'_, Result<Verdict>>> = Vec::new();

        if let Some(text) = body.filter(|t| !t.trim().is_empty()) {
            checks.push(self.text.classify(text).boxed());
        }
        if let Some(locator) = media_url {
            checks.push(self.media.classify(locator).boxed());
        }

        if checks.is_empty() {
            return Err(Error::classifier("content has no reviewable signals"));
        }

        let run = async {
            let mut verdicts = Vec::with_capacity(checks.len());
            for result in join_all(checks).await {
                verdicts.push(result?);
            }
            Ok::<_, Error>(verdicts)
        };

        let verdicts = tokio::time::timeout(self.timeout, run)
            .await
            .map_err(|_| Error::Timeout)??;

        let approved = verdicts.iter().all(|v| v.is_approved());
        debug!(
            checks = verdicts.len(),
            approved,
            "Content screen completed"
        );

        Ok(if approved {
            Verdict::Approved
        } else {
            Verdict::Rejected
        })
    }
}

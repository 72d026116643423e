//! Moderation orchestrator.
//!
//! Drives a content item from `pending` to a terminal state and propagates
//! the outcome. Reviews run as detached background tasks so the creation
//! path never waits on classification; every failure inside a review is
//! captured and converted into the deny-by-default rejection, never left to
//! propagate silently.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use blockwatch_core::{
    BlobStore, ContentItem, ContentRepository, NotificationEnvelope, Result, StateTransition,
};
use blockwatch_realtime::NotificationDispatcher;

use crate::classifier::Verdict;
use crate::screen::ContentScreen;

/// Owns the per-content state machine and the outcome fan-out
pub struct ModerationOrchestrator {
    repo: Arc<dyn ContentRepository>,
    screen: ContentScreen,
    dispatcher: Arc<NotificationDispatcher>,
    blobs: Option<Arc<dyn BlobStore>>,
}

impl ModerationOrchestrator {
    pub fn new(
        repo: Arc<dyn ContentRepository>,
        screen: ContentScreen,
        dispatcher: Arc<NotificationDispatcher>,
    ) -> Self {
        Self {
            repo,
            screen,
            dispatcher,
            blobs: None,
        }
    }

    /// Attach a blob store for media cleanup on rejection
    pub fn with_blob_store(mut self, blobs: Arc<dyn BlobStore>) -> Self {
        self.blobs = Some(blobs);
        self
    }

    /// Dispatch the classification pass for a freshly persisted item.
    ///
    /// Runs as a detached task: the caller's acknowledgment of the pending
    /// item is already on its way before any classification starts.
    pub fn spawn_review(self: &Arc<Self>, item: ContentItem) {
        let orchestrator = Arc::clone(self);
        tokio::spawn(async move {
            orchestrator.review(item).await;
        });
    }

    /// Run the classification pass and resolve the item.
    ///
    /// Classification failures (errors, timeout) take the deny-by-default
    /// path: the item is rejected and the author is still notified.
    pub async fn review(&self, item: ContentItem) {
        debug!(content = %item.id, "Starting moderation review");

        let verdict = match self
            .screen
            .review(item.body.as_deref(), item.media_url.as_deref())
            .await
        {
            Ok(verdict) => verdict,
            Err(e) => {
                warn!(
                    content = %item.id,
                    error = %e,
                    "Classification failed, rejecting by default"
                );
                metrics::counter!("blockwatch_moderation_failures_total").increment(1);
                Verdict::Rejected
            }
        };

        if let Err(e) = self.resolve(&item, verdict).await {
            error!(
                content = %item.id,
                error = %e,
                "Failed to resolve moderation outcome"
            );
        }
    }

    /// Apply a verdict to the stored item and fan the outcome out.
    ///
    /// Idempotent per content id: a repeated resolution with the same verdict
    /// neither re-transitions the item nor re-notifies the author. A
    /// conflicting verdict is refused by the repository's monotonic guard.
    pub async fn resolve(&self, item: &ContentItem, verdict: Verdict) -> Result<StateTransition> {
        let transition = self.repo.update_state(item.id, verdict.into_state()).await?;

        if !transition.applied {
            debug!(
                content = %item.id,
                state = %transition.item.state,
                "Item already resolved, skipping"
            );
            return Ok(transition);
        }

        info!(
            content = %item.id,
            verdict = %transition.item.state,
            "Moderation resolved"
        );
        metrics::counter!(
            "blockwatch_moderation_verdicts_total",
            "verdict" => transition.item.state.to_string()
        )
        .increment(1);

        let resolved = &transition.item;
        let envelope = match verdict {
            Verdict::Approved => NotificationEnvelope::content_approved(resolved),
            Verdict::Rejected => NotificationEnvelope::content_rejected(resolved),
        };
        self.dispatcher.deliver(resolved.author, envelope).await;

        if verdict == Verdict::Rejected {
            self.cleanup_media(resolved).await;
        }

        Ok(transition)
    }

    /// Best-effort blob deletion for rejected media-bearing items
    async fn cleanup_media(&self, item: &ContentItem) {
        let (Some(blobs), Some(url)) = (self.blobs.as_ref(), item.media_url.as_deref()) else {
            return;
        };

        match blobs.delete(url).await {
            Ok(()) => debug!(content = %item.id, url, "Rejected media deleted"),
            Err(e) => warn!(
                content = %item.id,
                url,
                error = %e,
                "Failed to delete rejected media"
            ),
        }
    }
}

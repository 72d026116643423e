//! Content creation boundary.
//!
//! Consumes validated request shapes from the API layer and applies the
//! domain-state rules: targets must exist and be approved, self-targeting is
//! refused, and reply nesting is capped at one level. Creation always
//! returns the pending item immediately; the moderation outcome arrives
//! later over the recipient's live connections.

use std::sync::Arc;

use tracing::{debug, info};

use blockwatch_core::{
    BlobStore, ContentId, ContentItem, ContentRepository, Error, IncidentId, ModerationState,
    NotificationEnvelope, Result, User, UserDirectory, UserId,
};
use blockwatch_realtime::NotificationDispatcher;

use crate::orchestrator::ModerationOrchestrator;

/// Raw media attached to a creation request
#[derive(Debug, Clone)]
pub struct MediaUpload {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Validated request to create a post
#[derive(Debug, Clone, Default)]
pub struct NewPost {
    /// Optional text body
    pub body: Option<String>,

    /// Raw media to upload through the blob store
    pub media: Option<MediaUpload>,

    /// Already-hosted media reference, used when no raw upload is given
    pub media_url: Option<String>,

    /// Map incident the post reports on
    pub incident: Option<IncidentId>,
}

/// Validated request to create a comment or a one-level reply
#[derive(Debug, Clone)]
pub struct NewComment {
    /// Text body (comments are text-only)
    pub body: String,

    /// Post being commented on; exclusive with `parent_comment`
    pub post: Option<ContentId>,

    /// Comment being replied to; exclusive with `post`
    pub parent_comment: Option<ContentId>,
}

/// Creation and read surface over posts and comments
pub struct ContentService {
    repo: Arc<dyn ContentRepository>,
    users: Arc<dyn UserDirectory>,
    dispatcher: Arc<NotificationDispatcher>,
    orchestrator: Arc<ModerationOrchestrator>,
    blobs: Option<Arc<dyn BlobStore>>,
}

impl ContentService {
    pub fn new(
        repo: Arc<dyn ContentRepository>,
        users: Arc<dyn UserDirectory>,
        dispatcher: Arc<NotificationDispatcher>,
        orchestrator: Arc<ModerationOrchestrator>,
    ) -> Self {
        Self {
            repo,
            users,
            dispatcher,
            orchestrator,
            blobs: None,
        }
    }

    /// Attach a blob store for raw media uploads
    pub fn with_blob_store(mut self, blobs: Arc<dyn BlobStore>) -> Self {
        self.blobs = Some(blobs);
        self
    }

    /// Create a post.
    ///
    /// The post is persisted `pending` and returned immediately; the
    /// classification pass runs out-of-band.
    pub async fn create_post(&self, author: UserId, request: NewPost) -> Result<ContentItem> {
        if request.body.as_deref().map_or(true, |b| b.trim().is_empty())
            && request.media.is_none()
            && request.media_url.is_none()
        {
            return Err(Error::validation("a post needs a text body or media"));
        }

        self.require_user(author).await?;

        let media_url = match request.media {
            Some(upload) => {
                let blobs = self
                    .blobs
                    .as_ref()
                    .ok_or_else(|| Error::storage("no blob store configured"))?;
                Some(blobs.upload(&upload.bytes, &upload.content_type).await?)
            }
            None => request.media_url,
        };

        let body = request.body.map(|b| b.trim().to_string()).filter(|b| !b.is_empty());
        let item = ContentItem::new_post(author, body, media_url, request.incident);
        let item = self.repo.save(item).await?;

        info!(content = %item.id, author = %author, "Post created pending");
        metrics::counter!("blockwatch_content_created_total", "kind" => "post").increment(1);

        self.orchestrator.spawn_review(item.clone());
        Ok(item)
    }

    /// Create a comment on a post, or a one-level reply to a comment.
    ///
    /// The parent content's author is notified immediately (they are known
    /// to exist and the parent is known approved); the comment itself still
    /// goes through the moderation pass like any other item.
    pub async fn create_comment(&self, author: UserId, request: NewComment) -> Result<ContentItem> {
        if request.body.trim().is_empty() {
            return Err(Error::validation("a comment needs a text body"));
        }

        let author_user = self.require_user(author).await?;
        let body = request.body.trim().to_string();

        match (request.post, request.parent_comment) {
            (Some(post_id), None) => self.comment_on_post(author_user, body, post_id).await,
            (None, Some(parent_id)) => self.reply_to_comment(author_user, body, parent_id).await,
            _ => Err(Error::validation(
                "exactly one of post or parent_comment must be given",
            )),
        }
    }

    async fn comment_on_post(
        &self,
        author: User,
        body: String,
        post_id: ContentId,
    ) -> Result<ContentItem> {
        let post = self.require_approved(post_id).await?;
        if post.is_comment() {
            return Err(Error::not_found(format!("post {} not found", post_id)));
        }
        if post.author == author.id {
            return Err(Error::validation("you cannot comment on your own post"));
        }

        let item = ContentItem::new_comment(author.id, body, post.id, None);
        let item = self.repo.save(item).await?;

        info!(content = %item.id, post = %post.id, "Comment created pending");
        metrics::counter!("blockwatch_content_created_total", "kind" => "comment").increment(1);

        let envelope = NotificationEnvelope::new_comment(post.author, post.id, &item, &author);
        self.dispatcher.deliver(post.author, envelope).await;

        self.orchestrator.spawn_review(item.clone());
        Ok(item)
    }

    async fn reply_to_comment(
        &self,
        author: User,
        body: String,
        parent_id: ContentId,
    ) -> Result<ContentItem> {
        let parent = self.require_approved(parent_id).await?;
        let Some(post_id) = parent.post_ref() else {
            return Err(Error::not_found(format!("comment {} not found", parent_id)));
        };
        if parent.is_reply() {
            return Err(Error::validation("replies are limited to one level"));
        }
        if parent.author == author.id {
            return Err(Error::validation("you cannot reply to your own comment"));
        }

        let item = ContentItem::new_comment(author.id, body, post_id, Some(parent.id));
        let item = self.repo.save(item).await?;

        info!(content = %item.id, parent = %parent.id, "Reply created pending");
        metrics::counter!("blockwatch_content_created_total", "kind" => "comment").increment(1);

        let envelope = NotificationEnvelope::new_reply(parent.author, parent.id, &item, &author);
        self.dispatcher.deliver(parent.author, envelope).await;

        self.orchestrator.spawn_review(item.clone());
        Ok(item)
    }

    /// Fetch an item: approved items are public, anything else is visible
    /// only to its author and otherwise presented as absent.
    pub async fn get(&self, id: ContentId, viewer: Option<UserId>) -> Result<ContentItem> {
        let item = self
            .repo
            .find(id)
            .await?
            .ok_or_else(|| Error::not_found(format!("content {} not found", id)))?;

        if item.state != ModerationState::Approved && viewer != Some(item.author) {
            debug!(content = %id, "Unapproved item hidden from non-author");
            return Err(Error::not_found(format!("content {} not found", id)));
        }

        Ok(item)
    }

    /// Approved comments of an approved post, creation order
    pub async fn comments_for_post(&self, post_id: ContentId) -> Result<Vec<ContentItem>> {
        let post = self.require_approved(post_id).await?;
        if post.is_comment() {
            return Err(Error::not_found(format!("post {} not found", post_id)));
        }

        let comments = self.repo.comments_for_post(post.id).await?;
        Ok(comments
            .into_iter()
            .filter(|c| c.state == ModerationState::Approved)
            .collect())
    }

    /// All of a user's own items, any state, newest first
    pub async fn authored_by(&self, author: UserId) -> Result<Vec<ContentItem>> {
        self.require_user(author).await?;
        self.repo.authored_by(author).await
    }

    async fn require_user(&self, id: UserId) -> Result<User> {
        self.users
            .find(id)
            .await?
            .ok_or_else(|| Error::not_found(format!("user {} not found", id)))
    }

    /// Fetch a target item, presenting non-approved targets as absent
    async fn require_approved(&self, id: ContentId) -> Result<ContentItem> {
        let item = self
            .repo
            .find(id)
            .await?
            .ok_or_else(|| Error::not_found(format!("content {} not found or not available", id)))?;

        if item.state != ModerationState::Approved {
            return Err(Error::not_found(format!(
                "content {} not found or not available",
                id
            )));
        }

        Ok(item)
    }
}

//! Notification envelopes delivered to live connections.
//!
//! Envelopes are immutable values that live for a single dispatch call:
//! they are never persisted, and an offline recipient simply never sees one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::types::{ContentId, ContentItem, ModerationState, User, UserId};

/// Maximum body length echoed into notification payloads
const EXCERPT_LEN: usize = 140;

/// Notification type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Someone commented on the recipient's post
    NewComment,
    /// Someone replied to the recipient's comment
    NewReply,
    /// The recipient's own content passed moderation
    ContentApproved,
    /// The recipient's own content failed moderation
    ContentRejected,
}

/// The structured message pushed to a recipient's live connections
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationEnvelope {
    /// Notification type tag
    #[serde(rename = "type")]
    pub kind: NotificationKind,

    /// Type-specific payload
    pub data: serde_json::Value,

    /// Envelope creation time
    pub timestamp: DateTime<Utc>,

    /// The user this envelope is addressed to
    pub recipient_id: UserId,
}

impl NotificationEnvelope {
    /// Create an envelope with the current timestamp
    pub fn new(kind: NotificationKind, recipient: UserId, data: serde_json::Value) -> Self {
        Self {
            kind,
            data,
            timestamp: Utc::now(),
            recipient_id: recipient,
        }
    }

    /// Envelope for a fresh comment on the recipient's post
    pub fn new_comment(
        recipient: UserId,
        post_id: ContentId,
        comment: &ContentItem,
        comment_author: &User,
    ) -> Self {
        let data = json!({
            "post_id": post_id,
            "comment": {
                "id": comment.id,
                "body": excerpt(comment.body.as_deref()),
                "author": { "id": comment_author.id, "name": comment_author.name },
            },
        });
        Self::new(NotificationKind::NewComment, recipient, data)
    }

    /// Envelope for a fresh reply to the recipient's comment
    pub fn new_reply(
        recipient: UserId,
        parent_comment_id: ContentId,
        reply: &ContentItem,
        reply_author: &User,
    ) -> Self {
        let data = json!({
            "parent_comment_id": parent_comment_id,
            "reply": {
                "id": reply.id,
                "body": excerpt(reply.body.as_deref()),
                "author": { "id": reply_author.id, "name": reply_author.name },
            },
        });
        Self::new(NotificationKind::NewReply, recipient, data)
    }

    /// Envelope telling the author their item passed moderation
    pub fn content_approved(item: &ContentItem) -> Self {
        let data = json!({
            "content_id": item.id,
            "content_kind": if item.is_comment() { "comment" } else { "post" },
            "state": ModerationState::Approved,
            "message": outcome_message(item, ModerationState::Approved),
        });
        Self::new(NotificationKind::ContentApproved, item.author, data)
    }

    /// Envelope telling the author their item failed moderation
    pub fn content_rejected(item: &ContentItem) -> Self {
        let data = json!({
            "content_id": item.id,
            "content_kind": if item.is_comment() { "comment" } else { "post" },
            "state": ModerationState::Rejected,
            "message": outcome_message(item, ModerationState::Rejected),
        });
        Self::new(NotificationKind::ContentRejected, item.author, data)
    }
}

/// Human-readable moderation outcome shown in the client
fn outcome_message(item: &ContentItem, state: ModerationState) -> String {
    let noun = if item.is_comment() { "comment" } else { "post" };
    match state {
        ModerationState::Approved => {
            format!("Your {} has been approved and is now visible to other users", noun)
        }
        _ => format!(
            "Your {} has been rejected for violating the content policies",
            noun
        ),
    }
}

fn excerpt(body: Option<&str>) -> String {
    let body = body.unwrap_or_default();
    if body.len() <= EXCERPT_LEN {
        body.to_string()
    } else {
        let mut cut = EXCERPT_LEN;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        format!("{}…", &body[..cut])
    }
}

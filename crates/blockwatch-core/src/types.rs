//! Core types for Blockwatch

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of a registered user
pub type UserId = Uuid;

/// Identity of a content item (post or comment)
pub type ContentId = Uuid;

/// Identity of a map incident a post may be attached to
pub type IncidentId = Uuid;

/// A registered user, resolvable through [`crate::repository::UserDirectory`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Stable user identity
    pub id: UserId,

    /// Display name shown in notification payloads
    pub name: String,
}

impl User {
    /// Create a new user with a fresh identity
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
        }
    }
}

/// Moderation state of a content item.
///
/// Transitions are monotonic: `Pending` moves to exactly one of the terminal
/// states and never back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModerationState {
    /// Freshly created, awaiting the asynchronous classification pass
    Pending,
    /// Classification approved the item; it is visible to other users
    Approved,
    /// Classification rejected the item; it stays hidden
    Rejected,
}

impl ModerationState {
    /// Whether this state admits no further transitions
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }

    /// Whether the state machine permits moving from `self` to `next`
    pub fn can_transition_to(self, next: Self) -> bool {
        self == Self::Pending && next.is_terminal()
    }
}

impl std::fmt::Display for ModerationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        };
        f.write_str(s)
    }
}

/// Discriminates posts from comments and carries their references
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ContentKind {
    /// Top-level post, optionally attached to a map incident
    Post {
        /// Incident the post reports on, if any
        incident: Option<IncidentId>,
    },

    /// Comment on a post, or a one-level reply to another comment
    Comment {
        /// The post this comment belongs to
        post: ContentId,

        /// The comment being replied to; `None` for top-level comments
        parent: Option<ContentId>,
    },
}

/// A post or comment subject to moderation.
///
/// Both share one state machine: created `Pending`, resolved to exactly one
/// terminal state by the moderation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    /// Stable content identity
    pub id: ContentId,

    /// Identity of the creating user
    pub author: UserId,

    /// Post/comment discriminator and parent references
    pub kind: ContentKind,

    /// Optional text body
    pub body: Option<String>,

    /// Optional URL of attached media, as returned by the blob store
    pub media_url: Option<String>,

    /// Current moderation state
    pub state: ModerationState,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last state-change timestamp
    pub updated_at: DateTime<Utc>,
}

impl ContentItem {
    /// Create a new pending post
    pub fn new_post(
        author: UserId,
        body: Option<String>,
        media_url: Option<String>,
        incident: Option<IncidentId>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            author,
            kind: ContentKind::Post { incident },
            body,
            media_url,
            state: ModerationState::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a new pending comment on `post`, optionally replying to `parent`
    pub fn new_comment(
        author: UserId,
        body: String,
        post: ContentId,
        parent: Option<ContentId>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            author,
            kind: ContentKind::Comment { post, parent },
            body: Some(body),
            media_url: None,
            state: ModerationState::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether this item is a comment
    pub fn is_comment(&self) -> bool {
        matches!(self.kind, ContentKind::Comment { .. })
    }

    /// Whether this item is itself a reply to another comment
    pub fn is_reply(&self) -> bool {
        matches!(
            self.kind,
            ContentKind::Comment {
                parent: Some(_),
                ..
            }
        )
    }

    /// Whether the item carries an attached media reference
    pub fn has_media(&self) -> bool {
        self.media_url.is_some()
    }

    /// The post a comment belongs to, if this item is a comment
    pub fn post_ref(&self) -> Option<ContentId> {
        match self.kind {
            ContentKind::Comment { post, .. } => Some(post),
            ContentKind::Post { .. } => None,
        }
    }
}

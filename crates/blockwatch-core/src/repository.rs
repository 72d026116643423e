//! Repository traits for persisted entities.
//!
//! Storage is an external collaborator: the pipeline only needs
//! find/save/update-by-id, and the moderation transition must be a single
//! atomic write. The in-memory implementations back the development server
//! and the test suites.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::error::{Error, Result};
use crate::types::{ContentId, ContentItem, ModerationState, User, UserId};

/// Outcome of an [`ContentRepository::update_state`] call
#[derive(Debug, Clone)]
pub struct StateTransition {
    /// The stored item after the call
    pub item: ContentItem,

    /// Whether this call performed the transition. `false` means the item
    /// was already in the requested terminal state (idempotent repeat).
    pub applied: bool,
}

/// CRUD surface for posts and comments
#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// Persist a new item
    async fn save(&self, item: ContentItem) -> Result<ContentItem>;

    /// Fetch an item by id
    async fn find(&self, id: ContentId) -> Result<Option<ContentItem>>;

    /// Atomically move an item's moderation state.
    ///
    /// The state machine is enforced here: only `pending → approved` and
    /// `pending → rejected` apply. Repeating an applied transition with the
    /// same verdict is reported as `applied: false`; a conflicting verdict
    /// is refused with [`Error::State`].
    async fn update_state(&self, id: ContentId, state: ModerationState)
        -> Result<StateTransition>;

    /// All comments belonging to a post, any state, creation order
    async fn comments_for_post(&self, post: ContentId) -> Result<Vec<ContentItem>>;

    /// All items created by a user, newest first
    async fn authored_by(&self, author: UserId) -> Result<Vec<ContentItem>>;
}

/// Lookup surface for user identities
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Fetch a user by id
    async fn find(&self, id: UserId) -> Result<Option<User>>;
}

/// In-memory content repository
#[derive(Default)]
pub struct InMemoryContentRepository {
    items: RwLock<HashMap<ContentId, ContentItem>>,
}

impl InMemoryContentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ContentRepository for InMemoryContentRepository {
    async fn save(&self, item: ContentItem) -> Result<ContentItem> {
        let mut items = self.items.write().await;
        items.insert(item.id, item.clone());
        Ok(item)
    }

    async fn find(&self, id: ContentId) -> Result<Option<ContentItem>> {
        let items = self.items.read().await;
        Ok(items.get(&id).cloned())
    }

    async fn update_state(
        &self,
        id: ContentId,
        state: ModerationState,
    ) -> Result<StateTransition> {
        // Single write-lock section: the transition is atomic to readers.
        let mut items = self.items.write().await;
        let item = items
            .get_mut(&id)
            .ok_or_else(|| Error::not_found(format!("content {} not found", id)))?;

        if item.state == state {
            return Ok(StateTransition {
                item: item.clone(),
                applied: false,
            });
        }

        if !item.state.can_transition_to(state) {
            return Err(Error::state(format!(
                "content {}: {} -> {} is not permitted",
                id, item.state, state
            )));
        }

        item.state = state;
        item.updated_at = Utc::now();

        Ok(StateTransition {
            item: item.clone(),
            applied: true,
        })
    }

    async fn comments_for_post(&self, post: ContentId) -> Result<Vec<ContentItem>> {
        let items = self.items.read().await;
        let mut comments: Vec<ContentItem> = items
            .values()
            .filter(|item| item.post_ref() == Some(post))
            .cloned()
            .collect();
        comments.sort_by_key(|c| c.created_at);
        Ok(comments)
    }

    async fn authored_by(&self, author: UserId) -> Result<Vec<ContentItem>> {
        let items = self.items.read().await;
        let mut authored: Vec<ContentItem> = items
            .values()
            .filter(|item| item.author == author)
            .cloned()
            .collect();
        authored.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(authored)
    }
}

/// In-memory user directory
#[derive(Default)]
pub struct InMemoryUserDirectory {
    users: RwLock<HashMap<UserId, User>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a user to the directory
    pub async fn insert(&self, user: User) {
        self.users.write().await.insert(user.id, user);
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find(&self, id: UserId) -> Result<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }
}

//! Pipeline tests for the moderation orchestrator and content service
//!
//! Exercises the full admit → classify → resolve → notify flow against the
//! in-memory repository and registry, with configurable mock classifiers for
//! the verdict, failure, and timeout paths.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;

use blockwatch_core::{
    ContentItem, ContentRepository, Error, InMemoryBlobStore, InMemoryContentRepository,
    InMemoryUserDirectory, ModerationState, NotificationKind, Result, User,
};
use blockwatch_moderation::{
    Classifier, ContentScreen, ContentService, MediaUpload, ModerationOrchestrator, NewComment,
    NewPost, Verdict,
};
use blockwatch_realtime::{
    ConnectionHandle, ConnectionRegistry, NotificationDispatcher, ServerFrame,
};

/// A classifier that always returns the configured verdict
struct StaticClassifier(Verdict);

#[async_trait]
impl Classifier for StaticClassifier {
    async fn classify(&self, _input: &str) -> Result<Verdict> {
        Ok(self.0)
    }

    fn name(&self) -> &str {
        "static"
    }
}

/// A classifier that always fails - for testing the deny-by-default path
struct FailingClassifier;

#[async_trait]
impl Classifier for FailingClassifier {
    async fn classify(&self, _input: &str) -> Result<Verdict> {
        Err(Error::classifier("simulated classifier failure"))
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// A classifier that never answers within any reasonable deadline
struct StallingClassifier;

#[async_trait]
impl Classifier for StallingClassifier {
    async fn classify(&self, _input: &str) -> Result<Verdict> {
        sleep(Duration::from_secs(3600)).await;
        Ok(Verdict::Approved)
    }

    fn name(&self) -> &str {
        "stalling"
    }
}

struct Harness {
    repo: Arc<InMemoryContentRepository>,
    users: Arc<InMemoryUserDirectory>,
    registry: Arc<ConnectionRegistry>,
    blobs: Arc<InMemoryBlobStore>,
    orchestrator: Arc<ModerationOrchestrator>,
    service: ContentService,
}

fn harness_with_screen(screen: ContentScreen) -> Harness {
    let repo = Arc::new(InMemoryContentRepository::new());
    let users = Arc::new(InMemoryUserDirectory::new());
    let registry = Arc::new(ConnectionRegistry::new());
    let blobs = Arc::new(InMemoryBlobStore::new());
    let dispatcher = Arc::new(NotificationDispatcher::new(registry.clone()));

    let orchestrator = Arc::new(
        ModerationOrchestrator::new(repo.clone(), screen, dispatcher.clone())
            .with_blob_store(blobs.clone()),
    );

    let service = ContentService::new(
        repo.clone(),
        users.clone(),
        dispatcher,
        orchestrator.clone(),
    )
    .with_blob_store(blobs.clone());

    Harness {
        repo,
        users,
        registry,
        blobs,
        orchestrator,
        service,
    }
}

fn harness(verdict: Verdict) -> Harness {
    harness_with_screen(ContentScreen::new(
        Arc::new(StaticClassifier(verdict)),
        Arc::new(StaticClassifier(verdict)),
    ))
}

impl Harness {
    async fn user(&self, name: &str) -> User {
        let user = User::new(name);
        self.users.insert(user.clone()).await;
        user
    }

    /// Seed an already-approved post by `author`
    async fn approved_post(&self, author: &User) -> ContentItem {
        let item = ContentItem::new_post(author.id, Some("streetlight out".into()), None, None);
        let item = self.repo.save(item).await.unwrap();
        self.repo
            .update_state(item.id, ModerationState::Approved)
            .await
            .unwrap()
            .item
    }

    /// Wait until the stored item leaves `pending`, returning its state
    async fn final_state(&self, item: &ContentItem) -> ModerationState {
        for _ in 0..200 {
            let stored = self.repo.find(item.id).await.unwrap().unwrap();
            if stored.state.is_terminal() {
                return stored.state;
            }
            sleep(Duration::from_millis(10)).await;
        }
        panic!("item {} never left pending", item.id);
    }
}

fn drain(rx: &mut tokio::sync::mpsc::UnboundedReceiver<ServerFrame>) -> Vec<ServerFrame> {
    let mut frames = Vec::new();
    while let Ok(frame) = rx.try_recv() {
        frames.push(frame);
    }
    frames
}

// ---------------------------------------------------------------------------
// Moderation outcomes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn always_rejecting_classifier_rejects_everything() {
    let h = harness(Verdict::Rejected);
    let alice = h.user("alice").await;

    let (conn, mut rx) = ConnectionHandle::new(alice.id);
    h.registry.register(conn).await;

    let post = h
        .service
        .create_post(
            alice.id,
            NewPost {
                body: Some("anything at all".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(post.state, ModerationState::Pending);

    assert_eq!(h.final_state(&post).await, ModerationState::Rejected);

    // Exactly one rejection notification for the connected author
    sleep(Duration::from_millis(50)).await;
    let rejections: Vec<_> = drain(&mut rx)
        .into_iter()
        .filter(|f| matches!(
            f,
            ServerFrame::Notification { envelope } if envelope.kind == NotificationKind::ContentRejected
        ))
        .collect();
    assert_eq!(rejections.len(), 1);
}

#[tokio::test]
async fn approving_classifier_approves_and_notifies_author() {
    let h = harness(Verdict::Approved);
    let alice = h.user("alice").await;

    let (conn, mut rx) = ConnectionHandle::new(alice.id);
    h.registry.register(conn).await;

    let post = h
        .service
        .create_post(
            alice.id,
            NewPost {
                body: Some("pothole on main street".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(h.final_state(&post).await, ModerationState::Approved);

    sleep(Duration::from_millis(50)).await;
    let frames = drain(&mut rx);
    assert!(frames.iter().any(|f| matches!(
        f,
        ServerFrame::Notification { envelope } if envelope.kind == NotificationKind::ContentApproved
    )));
}

#[tokio::test]
async fn classifier_failure_rejects_by_default() {
    let h = harness_with_screen(ContentScreen::new(
        Arc::new(FailingClassifier),
        Arc::new(FailingClassifier),
    ));
    let alice = h.user("alice").await;

    let post = h
        .service
        .create_post(
            alice.id,
            NewPost {
                body: Some("perfectly fine text".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(h.final_state(&post).await, ModerationState::Rejected);
}

#[tokio::test]
async fn classification_timeout_rejects_by_default() {
    let screen = ContentScreen::new(
        Arc::new(StallingClassifier),
        Arc::new(StaticClassifier(Verdict::Approved)),
    )
    .with_timeout(Duration::from_millis(50));
    let h = harness_with_screen(screen);
    let alice = h.user("alice").await;

    let post = h
        .service
        .create_post(
            alice.id,
            NewPost {
                body: Some("never classified".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(h.final_state(&post).await, ModerationState::Rejected);
}

#[tokio::test]
async fn resolution_is_idempotent_per_item() {
    let h = harness(Verdict::Rejected);
    let alice = h.user("alice").await;

    let (conn, mut rx) = ConnectionHandle::new(alice.id);
    h.registry.register(conn).await;

    let item = ContentItem::new_post(alice.id, Some("body".into()), None, None);
    let item = h.repo.save(item).await.unwrap();

    let first = h
        .orchestrator
        .resolve(&item, Verdict::Rejected)
        .await
        .unwrap();
    assert!(first.applied);

    // Same verdict again: no double transition, no duplicate notification
    let second = h
        .orchestrator
        .resolve(&item, Verdict::Rejected)
        .await
        .unwrap();
    assert!(!second.applied);
    assert_eq!(second.item.state, ModerationState::Rejected);

    let notifications = drain(&mut rx)
        .into_iter()
        .filter(|f| matches!(f, ServerFrame::Notification { .. }))
        .count();
    assert_eq!(notifications, 1);
}

#[tokio::test]
async fn rejected_media_is_deleted_best_effort() {
    let h = harness(Verdict::Rejected);
    let alice = h.user("alice").await;

    let post = h
        .service
        .create_post(
            alice.id,
            NewPost {
                media: Some(MediaUpload {
                    bytes: vec![0xFF, 0xD8, 0xFF],
                    content_type: "image/jpeg".into(),
                }),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let url = post.media_url.clone().unwrap();
    assert!(h.blobs.contains(&url).await);

    assert_eq!(h.final_state(&post).await, ModerationState::Rejected);

    sleep(Duration::from_millis(50)).await;
    assert!(!h.blobs.contains(&url).await);
}

// ---------------------------------------------------------------------------
// Creation-boundary rules
// ---------------------------------------------------------------------------

#[tokio::test]
async fn post_without_body_or_media_is_refused() {
    let h = harness(Verdict::Approved);
    let alice = h.user("alice").await;

    let err = h
        .service
        .create_post(alice.id, NewPost::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}

#[tokio::test]
async fn unknown_author_is_refused() {
    let h = harness(Verdict::Approved);

    let err = h
        .service
        .create_post(
            uuid::Uuid::new_v4(),
            NewPost {
                body: Some("hello".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn commenting_on_pending_post_is_refused() {
    let h = harness(Verdict::Approved);
    let alice = h.user("alice").await;
    let bob = h.user("bob").await;

    // Persist a pending post directly so no review resolves it
    let pending = ContentItem::new_post(alice.id, Some("unreviewed".into()), None, None);
    let pending = h.repo.save(pending).await.unwrap();

    let err = h
        .service
        .create_comment(
            bob.id,
            NewComment {
                body: "too early".into(),
                post: Some(pending.id),
                parent_comment: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn commenting_on_own_post_is_refused() {
    let h = harness(Verdict::Approved);
    let alice = h.user("alice").await;
    let post = h.approved_post(&alice).await;

    let err = h
        .service
        .create_comment(
            alice.id,
            NewComment {
                body: "nice post, me".into(),
                post: Some(post.id),
                parent_comment: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}

#[tokio::test]
async fn replying_to_own_comment_is_refused() {
    let h = harness(Verdict::Approved);
    let alice = h.user("alice").await;
    let bob = h.user("bob").await;
    let post = h.approved_post(&alice).await;

    let comment = h
        .service
        .create_comment(
            bob.id,
            NewComment {
                body: "saw it too".into(),
                post: Some(post.id),
                parent_comment: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(h.final_state(&comment).await, ModerationState::Approved);

    let err = h
        .service
        .create_comment(
            bob.id,
            NewComment {
                body: "replying to myself".into(),
                post: None,
                parent_comment: Some(comment.id),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}

#[tokio::test]
async fn replies_are_capped_at_one_level() {
    let h = harness(Verdict::Approved);
    let alice = h.user("alice").await;
    let bob = h.user("bob").await;
    let carol = h.user("carol").await;
    let post = h.approved_post(&alice).await;

    let comment = h
        .service
        .create_comment(
            bob.id,
            NewComment {
                body: "top-level comment".into(),
                post: Some(post.id),
                parent_comment: None,
            },
        )
        .await
        .unwrap();
    h.final_state(&comment).await;

    let reply = h
        .service
        .create_comment(
            carol.id,
            NewComment {
                body: "a reply".into(),
                post: None,
                parent_comment: Some(comment.id),
            },
        )
        .await
        .unwrap();
    assert_eq!(h.final_state(&reply).await, ModerationState::Approved);

    // Replying to the reply exceeds the nesting cap
    let err = h
        .service
        .create_comment(
            alice.id,
            NewComment {
                body: "reply to a reply".into(),
                post: None,
                parent_comment: Some(reply.id),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}

#[tokio::test]
async fn comment_must_target_exactly_one_parent() {
    let h = harness(Verdict::Approved);
    let alice = h.user("alice").await;
    let bob = h.user("bob").await;
    let post = h.approved_post(&alice).await;

    let err = h
        .service
        .create_comment(
            bob.id,
            NewComment {
                body: "confused".into(),
                post: None,
                parent_comment: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    let err = h
        .service
        .create_comment(
            bob.id,
            NewComment {
                body: "doubly targeted".into(),
                post: Some(post.id),
                parent_comment: Some(post.id),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}

// ---------------------------------------------------------------------------
// End-to-end scenario
// ---------------------------------------------------------------------------

#[tokio::test]
async fn comment_flow_notifies_post_author_in_order() {
    let h = harness(Verdict::Approved);
    let alice = h.user("alice").await;
    let bob = h.user("bob").await;
    let post = h.approved_post(&alice).await;

    let (alice_conn, mut alice_rx) = ConnectionHandle::new(alice.id);
    h.registry.register(alice_conn).await;

    let comment = h
        .service
        .create_comment(
            bob.id,
            NewComment {
                body: "I saw this happen".into(),
                post: Some(post.id),
                parent_comment: None,
            },
        )
        .await
        .unwrap();

    // Bob's acknowledgment is immediate and pending
    assert_eq!(comment.state, ModerationState::Pending);

    // Alice's new-comment notification references the post and carries
    // Bob's author context
    let frame = alice_rx.recv().await.unwrap();
    match frame {
        ServerFrame::Notification { envelope } => {
            assert_eq!(envelope.kind, NotificationKind::NewComment);
            assert_eq!(envelope.recipient_id, alice.id);
            assert_eq!(envelope.data["post_id"], serde_json::json!(post.id));
            assert_eq!(
                envelope.data["comment"]["author"]["name"],
                serde_json::json!("bob")
            );
        }
        other => panic!("unexpected frame: {:?}", other),
    }

    // The comment becomes visible once approved
    assert_eq!(h.final_state(&comment).await, ModerationState::Approved);
    let visible = h.service.comments_for_post(post.id).await.unwrap();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].id, comment.id);
}

#[tokio::test]
async fn reply_flow_notifies_parent_comment_author() {
    let h = harness(Verdict::Approved);
    let alice = h.user("alice").await;
    let bob = h.user("bob").await;
    let post = h.approved_post(&alice).await;

    let comment = h
        .service
        .create_comment(
            bob.id,
            NewComment {
                body: "original comment".into(),
                post: Some(post.id),
                parent_comment: None,
            },
        )
        .await
        .unwrap();
    h.final_state(&comment).await;

    let (bob_conn, mut bob_rx) = ConnectionHandle::new(bob.id);
    h.registry.register(bob_conn).await;

    h.service
        .create_comment(
            alice.id,
            NewComment {
                body: "thanks for confirming".into(),
                post: None,
                parent_comment: Some(comment.id),
            },
        )
        .await
        .unwrap();

    // Bob may still see the approval frame for his own comment; the reply
    // notification is what matters here.
    let envelope = loop {
        match bob_rx.recv().await.unwrap() {
            ServerFrame::Notification { envelope }
                if envelope.kind == NotificationKind::NewReply =>
            {
                break envelope;
            }
            ServerFrame::Notification { .. } => continue,
            other => panic!("unexpected frame: {:?}", other),
        }
    };
    assert_eq!(envelope.recipient_id, bob.id);
    assert_eq!(
        envelope.data["parent_comment_id"],
        serde_json::json!(comment.id)
    );
}

#[tokio::test]
async fn unapproved_items_are_hidden_from_others() {
    let h = harness(Verdict::Rejected);
    let alice = h.user("alice").await;
    let bob = h.user("bob").await;

    let post = h
        .service
        .create_post(
            alice.id,
            NewPost {
                body: Some("will be rejected".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    h.final_state(&post).await;

    // The author still sees their own rejected item
    let own = h.service.get(post.id, Some(alice.id)).await.unwrap();
    assert_eq!(own.state, ModerationState::Rejected);

    // Everyone else gets a not-found
    let err = h.service.get(post.id, Some(bob.id)).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
    let err = h.service.get(post.id, None).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

//! Connection handles and the realtime wire protocol.
//!
//! A [`ConnectionHandle`] is the registry-facing side of one live client
//! session: the authenticated user identity plus an unbounded channel the
//! gateway drains into the actual socket. Handles are cheap to clone; the
//! receiving half lives in the gateway's outbound pump task.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use uuid::Uuid;

use blockwatch_core::{NotificationEnvelope, UserId};

/// Identity of one live connection
pub type ConnectionId = Uuid;

/// Frames pushed from the server to a client.
///
/// The `channel` tag keeps notification delivery distinct from the liveness
/// and confirmation channels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "channel", rename_all = "snake_case")]
pub enum ServerFrame {
    /// Handshake confirmation carrying the resolved user identity
    Connected {
        user_id: UserId,
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// Targeted notification for this connection's user
    Notification { envelope: NotificationEnvelope },

    /// System-wide announcement
    Broadcast { envelope: NotificationEnvelope },

    /// Liveness probe reply
    Pong { timestamp: DateTime<Utc> },
}

impl ServerFrame {
    /// Build the handshake confirmation frame
    pub fn connected(user_id: UserId) -> Self {
        Self::Connected {
            user_id,
            message: "Connected to the notification service".to_string(),
            timestamp: Utc::now(),
        }
    }

    /// Build a pong frame stamped now
    pub fn pong() -> Self {
        Self::Pong {
            timestamp: Utc::now(),
        }
    }
}

/// Frames a client may send to the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "channel", rename_all = "snake_case")]
pub enum ClientFrame {
    /// Liveness probe
    Ping,
}

/// One live realtime session bound to a user identity
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    user_id: UserId,
    sender: mpsc::UnboundedSender<ServerFrame>,
}

impl ConnectionHandle {
    /// Create a handle and the receiving half the gateway pumps from
    pub fn new(user_id: UserId) -> (Self, mpsc::UnboundedReceiver<ServerFrame>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let handle = Self {
            id: Uuid::new_v4(),
            user_id,
            sender,
        };
        (handle, receiver)
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Push a frame toward the client.
    ///
    /// Returns `false` when the receiving half is gone (the socket closed);
    /// callers treat that as a per-connection delivery failure, never an
    /// error to propagate.
    pub fn push(&self, frame: ServerFrame) -> bool {
        self.sender.send(frame).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_push_reaches_receiver() {
        let (handle, mut rx) = ConnectionHandle::new(Uuid::new_v4());

        assert!(handle.push(ServerFrame::pong()));
        let frame = rx.recv().await.unwrap();
        assert!(matches!(frame, ServerFrame::Pong { .. }));
    }

    #[tokio::test]
    async fn test_push_after_close_reports_failure() {
        let (handle, rx) = ConnectionHandle::new(Uuid::new_v4());
        drop(rx);

        assert!(!handle.push(ServerFrame::pong()));
    }

    #[test]
    fn test_frame_wire_shape() {
        let user = Uuid::new_v4();
        let json = serde_json::to_value(ServerFrame::connected(user)).unwrap();
        assert_eq!(json["channel"], "connected");
        assert_eq!(json["user_id"], serde_json::json!(user));

        let ping: ClientFrame = serde_json::from_str(r#"{"channel": "ping"}"#).unwrap();
        assert_eq!(ping, ClientFrame::Ping);
    }
}

//! Notification dispatcher: envelope fan-out to live connections.
//!
//! Delivery is best-effort. A recipient with no live connections drops the
//! envelope silently; a write failure on one connection never blocks the
//! others and is sunk to diagnostics. Nothing here is persisted or retried.

use std::sync::Arc;

use tracing::{debug, warn};

use blockwatch_core::{NotificationEnvelope, UserId};

use crate::connection::ServerFrame;
use crate::registry::ConnectionRegistry;

/// Delivered-vs-dropped outcome of one dispatch call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Connections the envelope was handed to
    pub delivered: usize,

    /// Connections whose write failed (peer already gone)
    pub dropped: usize,
}

impl DeliveryReport {
    /// Whether any connection received the envelope
    pub fn any_delivered(&self) -> bool {
        self.delivered > 0
    }
}

/// Builds typed frames and delivers them through the registry
pub struct NotificationDispatcher {
    registry: Arc<ConnectionRegistry>,
}

impl NotificationDispatcher {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// Deliver an envelope to all of the recipient's live connections.
    ///
    /// Zero live connections is a silent drop, not an error: a future
    /// reconnect re-establishes delivery for subsequent notifications only.
    pub async fn deliver(
        &self,
        recipient: UserId,
        envelope: NotificationEnvelope,
    ) -> DeliveryReport {
        let connections = self.registry.connections_for(recipient).await;

        if connections.is_empty() {
            debug!(
                user = %recipient,
                kind = ?envelope.kind,
                "Recipient offline, notification dropped"
            );
            metrics::counter!("blockwatch_notifications_offline_total").increment(1);
            return DeliveryReport::default();
        }

        let mut report = DeliveryReport::default();
        for connection in &connections {
            let frame = ServerFrame::Notification {
                envelope: envelope.clone(),
            };
            if connection.push(frame) {
                report.delivered += 1;
            } else {
                report.dropped += 1;
                warn!(
                    user = %recipient,
                    connection = %connection.id(),
                    "Connection write failed, skipping"
                );
            }
        }

        debug!(
            user = %recipient,
            kind = ?envelope.kind,
            delivered = report.delivered,
            dropped = report.dropped,
            "Notification dispatched"
        );
        metrics::counter!("blockwatch_notifications_delivered_total")
            .increment(report.delivered as u64);
        metrics::counter!("blockwatch_notifications_dropped_total")
            .increment(report.dropped as u64);

        report
    }

    /// Deliver a system-wide announcement to every live connection,
    /// independent of identity resolution.
    pub async fn broadcast(&self, envelope: NotificationEnvelope) -> DeliveryReport {
        let connections = self.registry.all_connections().await;

        let mut report = DeliveryReport::default();
        for connection in &connections {
            let frame = ServerFrame::Broadcast {
                envelope: envelope.clone(),
            };
            if connection.push(frame) {
                report.delivered += 1;
            } else {
                report.dropped += 1;
            }
        }

        debug!(
            delivered = report.delivered,
            dropped = report.dropped,
            "Broadcast dispatched"
        );
        metrics::counter!("blockwatch_broadcasts_total").increment(1);

        report
    }
}

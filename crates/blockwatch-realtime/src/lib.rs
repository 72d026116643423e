//! Blockwatch Realtime
//!
//! Single-process realtime delivery substrate:
//! - Connection handles bound to authenticated user identities
//! - The connection registry (user → live connections)
//! - The notification dispatcher (targeted fan-out and broadcast)
//!
//! Delivery is best-effort to currently-connected sessions only; there is no
//! persisted inbox and no cross-process fan-out.

pub mod connection;
pub mod dispatcher;
pub mod registry;

pub use connection::{ClientFrame, ConnectionHandle, ConnectionId, ServerFrame};
pub use dispatcher::{DeliveryReport, NotificationDispatcher};
pub use registry::ConnectionRegistry;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::connection::{ClientFrame, ConnectionHandle, ConnectionId, ServerFrame};
    pub use crate::dispatcher::{DeliveryReport, NotificationDispatcher};
    pub use crate::registry::ConnectionRegistry;
}

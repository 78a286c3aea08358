//! Registry slot keys, announced sessions and change events

use std::sync::Arc;

use tokio::time::Instant;

use crate::client::interface::NetworkInterface;
use crate::sdp::{SessionDescription, SessionIdentity};

/// Key of one registry slot: (interface, session identity)
///
/// The registry holds at most one session per key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SlotKey {
    pub interface_index: u32,
    pub identity: SessionIdentity,
}

impl SlotKey {
    pub(crate) fn new(interface: &NetworkInterface, identity: SessionIdentity) -> Self {
        Self {
            interface_index: interface.index,
            identity,
        }
    }
}

/// A session currently announced on the network
///
/// The document is frozen: it travels inside an `Arc` and is never
/// mutated after the announcement is accepted.
#[derive(Debug, Clone)]
pub struct AnnouncedSession {
    /// The announced SDP document
    pub description: Arc<SessionDescription>,
    /// Interface the announcement arrived on
    pub interface: NetworkInterface,
    /// When the session was first announced
    pub announced_at: Instant,
    /// Deadline after which the session is evicted without a renewal
    pub expires_at: Instant,
}

/// Change notification published by the registry
///
/// Events are delivered through a broadcast channel in the order the
/// producing mutations happened; subscribers may call back into the
/// registry from their receive loop.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A session was announced for the first time
    Added(AnnouncedSession),
    /// A strictly newer version replaced an active session
    Replaced {
        old: AnnouncedSession,
        new: AnnouncedSession,
    },
    /// A session was deleted, expired or lost its interface
    Removed(AnnouncedSession),
}

impl SessionEvent {
    /// The session the event is about (the new one for replacements)
    pub fn session(&self) -> &AnnouncedSession {
        match self {
            SessionEvent::Added(session) => session,
            SessionEvent::Replaced { new, .. } => new,
            SessionEvent::Removed(session) => session,
        }
    }
}

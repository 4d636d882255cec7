use std::net::SocketAddr;

use strix_shared::{ClassId, DoId, FieldId, ZoneId};

/// Queued notifications a server application reads each tick, in the
/// order the repository produced them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerEvent {
    /// A new session sent its first datagram
    SessionConnected(SocketAddr),
    /// A session said goodbye
    SessionDisconnected(SocketAddr),
    /// A session fell silent past the timeout window
    SessionTimedOut(SocketAddr),
    /// An object entered the authoritative table
    ObjectCreated {
        do_id: DoId,
        class_id: ClassId,
        zone: ZoneId,
        /// The creating session for client creates, `None` for the
        /// server's own generates
        owner: Option<SocketAddr>,
    },
    /// An object left the authoritative table
    ObjectDeleted(DoId),
    /// A session's field update was accepted and stored or relayed
    FieldUpdated {
        do_id: DoId,
        field: FieldId,
        from: SocketAddr,
    },
    /// A session sent an update it had no right to send
    UpdateRejected {
        do_id: DoId,
        field: FieldId,
        from: SocketAddr,
    },
}

/// Event queue drained by the application once per tick.
#[derive(Debug, Default)]
pub struct ServerEvents {
    queue: Vec<ServerEvent>,
}

impl ServerEvents {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, event: ServerEvent) {
        self.queue.push(event);
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn take(&mut self) -> Vec<ServerEvent> {
        std::mem::take(&mut self.queue)
    }
}

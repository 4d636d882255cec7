use strix_shared::{DoId, ZoneId};

/// Queued notifications a client application reads each tick, in the
/// order the repository produced them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// An object finished announce-generate and is live
    ObjectGenerated(DoId),
    /// An object left interest and was disabled
    ObjectDisabled(DoId),
    /// An object was deleted; its doId never comes back
    ObjectDeleted(DoId),
    /// The server finished the interest change for this zone
    ZoneComplete(ZoneId),
    /// The server granted a doId block for client-side creation
    DoIdRangeGranted { base: DoId, size: u32 },
    /// Nothing heard from the server for the timeout window
    ServerTimeout,
    /// The server closed the session
    Disconnected,
}

/// Event queue drained by the application once per tick.
#[derive(Debug, Default)]
pub struct ClientEvents {
    queue: Vec<ClientEvent>,
}

impl ClientEvents {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, event: ClientEvent) {
        self.queue.push(event);
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn take(&mut self) -> Vec<ClientEvent> {
        std::mem::take(&mut self.queue)
    }
}

use std::ops::Range;

use strix_shared::DoId;

/// What to do with field updates for doIds the client does not know yet.
///
/// Out-of-order delivery can put an update ahead of its object's create.
/// `Buffer` holds up to `limit` raw updates per doId and replays them when
/// the create arrives; `Drop` discards them with a debug log. Updates for
/// doIds inside a globally-visible range are always buffered, without
/// limit, since their creates may be arbitrarily far behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnknownUpdatePolicy {
    Drop,
    Buffer { limit: usize },
}

/// Contains configuration required to initialize a client repository
#[derive(Clone)]
pub struct ClientConfig {
    /// Seconds between heartbeats sent to keep the session alive
    pub heartbeat_interval: f64,
    /// Seconds of server silence before a timeout event is raised
    pub server_timeout: f64,
    /// Handling of updates that arrive before their object's create
    pub unknown_update_policy: UnknownUpdatePolicy,
    /// doId ranges whose objects are globally visible; updates for them
    /// are never dropped while unknown
    pub global_doid_ranges: Vec<Range<DoId>>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: 10.0,
            server_timeout: 30.0,
            unknown_update_policy: UnknownUpdatePolicy::Buffer { limit: 64 },
            global_doid_ranges: Vec::new(),
        }
    }
}

impl ClientConfig {
    pub(crate) fn is_global_doid(&self, do_id: DoId) -> bool {
        self.global_doid_ranges.iter().any(|r| r.contains(&do_id))
    }
}

use strix_shared::DoId;

/// Contains configuration required to initialize a server repository
#[derive(Clone)]
pub struct ServerConfig {
    /// First doId of the server's own allocation range. Server-generated
    /// objects draw from `[server_doid_base, client_doid_base)`.
    pub server_doid_base: DoId,
    /// First doId handed out in per-session blocks
    pub client_doid_base: DoId,
    /// doIds granted to each connecting session
    pub client_block_size: u32,
    /// Seconds of client silence before the session is dropped
    pub client_timeout: f64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server_doid_base: 1,
            client_doid_base: 100_000,
            client_block_size: 1_000,
            client_timeout: 30.0,
        }
    }
}

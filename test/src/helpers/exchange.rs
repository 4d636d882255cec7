//! Drives queued datagrams between endpoints until replies to replies
//! have settled.

use strix_server::ServerRepository;

use crate::helpers::test_client::TestClient;

/// One settle pass at a fixed time: alternating pumps so a datagram sent
/// in response to a datagram still lands within the call.
pub fn exchange(server: &mut ServerRepository, clients: &mut [&mut TestClient], now: f64) {
    for _ in 0..4 {
        server.process_incoming(now);
        for client in clients.iter_mut() {
            client.pump(now);
        }
    }
}

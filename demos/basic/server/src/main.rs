//! Hosts the lobby: one server-owned Character wanders in a circle while
//! clients connect, spawn their own, and chat.
//!
//! Run with `RUST_LOG=info cargo run -p strix-basic-demo-server`.

use std::error::Error;
use std::thread;
use std::time::Duration;

use log::info;

use strix_basic_demo_shared::{protocol, server_addr, LOBBY_ZONE};
use strix_server::shared::{try_now_seconds, DcValue, Timer};
use strix_server::transport::udp::UdpServerSocket;
use strix_server::{ServerConfig, ServerEvent, ServerRepository};

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    info!("Basic Strix Server Demo started");

    let mut server = ServerRepository::new(ServerConfig::default(), protocol());
    server.listen(Box::new(UdpServerSocket::bind(server_addr())?));
    info!("listening on {}", server_addr());

    let now = try_now_seconds()?;
    let npc = server.generate_with_required(
        "Character",
        LOBBY_ZONE,
        vec![
            vec![DcValue::Float64(5.0), DcValue::Float64(0.0)],
            vec![DcValue::from("Brutus")],
        ],
    )?;
    info!("npc generated as doId {npc}");

    let mut wander = Timer::new(1.0, now);
    let mut angle: f64 = 0.0;

    loop {
        let now = try_now_seconds()?;
        server.process_incoming(now);
        server.tick(now);

        if wander.ringing(now) {
            wander.reset(now);
            angle += 0.3;
            server.send_update(
                npc,
                "setPos",
                &[
                    DcValue::Float64(5.0 * angle.cos()),
                    DcValue::Float64(5.0 * angle.sin()),
                ],
            )?;
        }

        for event in server.take_events() {
            match event {
                ServerEvent::SessionConnected(address) => {
                    info!("Strix Server connected to: {address}");
                }
                ServerEvent::SessionDisconnected(address) => {
                    info!("Strix Server disconnected from: {address}");
                }
                ServerEvent::SessionTimedOut(address) => {
                    info!("session {address} went silent, dropped");
                }
                ServerEvent::ObjectCreated { do_id, owner, .. } => {
                    if let Some(address) = owner {
                        info!("doId {do_id} created by {address}");
                    }
                }
                ServerEvent::ObjectDeleted(do_id) => {
                    info!("doId {do_id} deleted");
                }
                ServerEvent::FieldUpdated { .. } => {}
                ServerEvent::UpdateRejected { do_id, from, .. } => {
                    info!("rejected update for doId {do_id} from {from}");
                }
            }
        }

        thread::sleep(Duration::from_millis(20));
    }
}

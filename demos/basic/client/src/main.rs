//! Joins the lobby, mirrors every Character there, creates one of its
//! own once the server grants a doId block, and chats every few seconds.
//!
//! Run with `RUST_LOG=info cargo run -p strix-basic-demo-client`.

use std::error::Error;
use std::thread;
use std::time::Duration;

use log::info;

use strix_basic_demo_shared::{factory, protocol, server_addr, Character, LOBBY_ZONE};
use strix_client::shared::{try_now_seconds, DcValue, HeadlessScene, Messenger, Timer};
use strix_client::transport::udp::UdpClientSocket;
use strix_client::{ClientConfig, ClientEvent, ClientRepository};

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    info!("Basic Strix Client Demo started");

    let mut client = ClientRepository::new(ClientConfig::default(), protocol(), factory());
    let mut scene = HeadlessScene;
    let mut messenger = Messenger::new();

    let now = try_now_seconds()?;
    client.connect(Box::new(UdpClientSocket::bind(server_addr())?), now);
    client.set_interest(LOBBY_ZONE, &[])?;

    let mut avatar = None;
    let mut chat = Timer::new(5.0, now);
    let mut chats_sent = 0u32;

    loop {
        let now = try_now_seconds()?;
        client.process_incoming(&mut scene, &mut messenger, now);
        client.tick(now);

        for event in client.take_events() {
            match event {
                ClientEvent::ObjectGenerated(do_id) => {
                    if let Some(character) = client.object_as::<Character>(do_id) {
                        info!(
                            "creation of Character - doId: {do_id}, x: {:.1}, y: {:.1}, name: {}",
                            character.pos.0, character.pos.1, character.name,
                        );
                    }
                }
                ClientEvent::ObjectDisabled(do_id) => {
                    info!("Character {do_id} left interest");
                }
                ClientEvent::ObjectDeleted(do_id) => {
                    info!("deletion of Character {do_id}");
                }
                ClientEvent::ZoneComplete(zone) => {
                    info!("zone {zone} fully populated");
                }
                ClientEvent::DoIdRangeGranted { base, size } => {
                    info!("granted doIds {base}..{}", base + size);
                    let do_id = client.create_distributed_object(
                        "Character",
                        LOBBY_ZONE,
                        vec![
                            vec![DcValue::Float64(0.0), DcValue::Float64(0.0)],
                            vec![DcValue::from("Wanderer")],
                        ],
                        &mut scene,
                        &mut messenger,
                        now,
                    )?;
                    avatar = Some(do_id);
                    info!("own avatar created as doId {do_id}");
                }
                ClientEvent::ServerTimeout => {
                    info!("server went quiet, giving up");
                    return Ok(());
                }
                ClientEvent::Disconnected => {
                    info!("Strix Client disconnected");
                    return Ok(());
                }
            }
        }

        for event in messenger.drain() {
            if event.name == "chat" {
                if let (Some(name), Some(line)) = (
                    event.args.first().and_then(DcValue::as_str),
                    event.args.get(1).and_then(DcValue::as_str),
                ) {
                    info!("Client recv <- {name}: {line}");
                }
            }
        }

        if chat.ringing(now) {
            chat.reset(now);
            if let Some(do_id) = avatar {
                chats_sent += 1;
                let line = format!("hello from the lobby ({chats_sent})");
                info!("Client send -> {line}");
                client.send_update(do_id, "setChat", &[DcValue::from(line.as_str())])?;
            }
        }

        thread::sleep(Duration::from_millis(20));
    }
}

/// Lifecycle behavior that spans the wire: delay-delete holders defer
/// server deletes, and heartbeats keep sessions alive while silence
/// times them out.

use strix_client::ClientEvent;
use strix_server::ServerRepository;
use strix_shared::DcValue;

use strix_test::{
    avatar_factory, client_addr, exchange, game_schema, server_config, LocalWire, TestClient,
};

fn avatar_args(name: &str) -> Vec<Vec<DcValue>> {
    vec![
        vec![DcValue::Float64(0.0), DcValue::Float64(0.0)],
        vec![DcValue::Str(name.to_owned())],
    ]
}

#[test]
fn delay_delete_defers_a_wire_delete_until_release() {
    let _ = env_logger::builder().is_test(true).try_init();
    let wire = LocalWire::new();
    let mut server = ServerRepository::new(server_config(), game_schema());
    server.listen(wire.server_socket());
    let npc = server
        .generate_with_required("Avatar", 5, avatar_args("npc"))
        .unwrap();

    let mut client = TestClient::new(game_schema(), avatar_factory());
    client.connect(&wire, 1, 0.0);
    client.repo.set_interest(5, &[]).unwrap();
    exchange(&mut server, &mut [&mut client], 0.0);
    client.repo.take_events();

    let handle = client.repo.delay_delete(npc, "camera-follow").unwrap();
    server.delete_object(npc).unwrap();
    exchange(&mut server, &mut [&mut client], 1.0);

    // The wire delete arrived but a holder keeps the object alive.
    assert!(client.repo.object(npc).is_some());
    assert!(client.repo.take_events().is_empty());

    client.release(handle, 2.0);
    assert!(client.repo.object(npc).is_none());
    assert_eq!(
        client.repo.take_events(),
        vec![ClientEvent::ObjectDeleted(npc)]
    );

    // Deletes are terminal: the avatar never announced a second time.
    assert_eq!(client.repo.num_objects(), 0);
}

#[test]
fn heartbeats_keep_the_session_alive_while_the_server_stays_quiet() {
    let wire = LocalWire::new();
    let mut server = ServerRepository::new(server_config(), game_schema());
    server.listen(wire.server_socket());

    let mut client = TestClient::new(game_schema(), avatar_factory());
    client.connect(&wire, 1, 0.0);
    client.repo.set_interest(5, &[]).unwrap();
    exchange(&mut server, &mut [&mut client], 0.0);
    client.repo.take_events();

    // Forty quiet seconds. The default heartbeat interval is ten, the
    // server timeout thirty, so heartbeats alone must keep the session.
    for t in 1..=40 {
        let now = f64::from(t);
        client.repo.tick(now);
        server.process_incoming(now);
        server.tick(now);
    }
    assert!(server.has_session(client_addr(1)));

    // The server sent nothing in all that time, so the client's own
    // thirty-second timeout fired exactly once.
    let timeouts = client
        .repo
        .take_events()
        .into_iter()
        .filter(|event| *event == ClientEvent::ServerTimeout)
        .count();
    assert_eq!(timeouts, 1);
}

#[test]
fn a_vanished_client_is_timed_out_and_its_objects_deleted() {
    let wire = LocalWire::new();
    let mut server = ServerRepository::new(server_config(), game_schema());
    server.listen(wire.server_socket());

    let mut ghost = TestClient::new(game_schema(), avatar_factory());
    let mut watcher = TestClient::new(game_schema(), avatar_factory());
    ghost.connect(&wire, 1, 0.0);
    watcher.connect(&wire, 2, 0.0);
    ghost.repo.set_interest(5, &[]).unwrap();
    watcher.repo.set_interest(5, &[]).unwrap();
    exchange(&mut server, &mut [&mut ghost, &mut watcher], 0.0);

    let do_id = ghost.create("Avatar", 5, avatar_args("ghost"), 1.0).unwrap();
    exchange(&mut server, &mut [&mut ghost, &mut watcher], 1.0);
    assert!(watcher.repo.object(do_id).is_some());
    watcher.repo.take_events();

    // The ghost goes silent; only the watcher keeps heartbeating.
    for t in 2..=35 {
        let now = f64::from(t);
        watcher.repo.tick(now);
        server.process_incoming(now);
        server.tick(now);
        watcher.pump(now);
    }

    assert!(!server.has_session(client_addr(1)));
    assert!(server.has_session(client_addr(2)));
    assert_eq!(server.num_objects(), 0);
    assert!(watcher.repo.object(do_id).is_none());
    assert!(watcher
        .repo
        .take_events()
        .contains(&ClientEvent::ObjectDeleted(do_id)));
}

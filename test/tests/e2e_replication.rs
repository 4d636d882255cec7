/// End-to-end replication over an in-memory wire: server-side generates
/// appear on interested clients, broadcasts fan out, and client sends
/// reach their peers.

use strix_client::ClientEvent;
use strix_server::{ServerEvent, ServerRepository};
use strix_shared::DcValue;

use strix_test::{
    avatar_factory, client_addr, exchange, game_schema, server_config, LocalWire, TestAvatar,
    TestClient,
};

fn avatar_args(x: f64, y: f64, name: &str) -> Vec<Vec<DcValue>> {
    vec![
        vec![DcValue::Float64(x), DcValue::Float64(y)],
        vec![DcValue::Str(name.to_owned())],
    ]
}

#[test]
fn server_generates_reach_interested_clients() {
    let _ = env_logger::builder().is_test(true).try_init();
    let wire = LocalWire::new();
    let mut server = ServerRepository::new(server_config(), game_schema());
    server.listen(wire.server_socket());
    let npc = server
        .generate_with_required("Avatar", 5, avatar_args(4.0, 2.0, "npc"))
        .unwrap();

    let mut client = TestClient::new(game_schema(), avatar_factory());
    client.connect(&wire, 1, 0.0);
    client.repo.set_interest(5, &[]).unwrap();
    exchange(&mut server, &mut [&mut client], 0.0);

    assert_eq!(client.repo.num_objects(), 1);
    let avatar = client.repo.object_as::<TestAvatar>(npc).unwrap();
    assert_eq!(avatar.name, "npc");
    assert_eq!(avatar.pos, (4.0, 2.0));
    assert_eq!(avatar.announces, 1);

    assert_eq!(
        client.repo.take_events(),
        vec![
            ClientEvent::DoIdRangeGranted {
                base: 1_000,
                size: 10,
            },
            ClientEvent::ObjectGenerated(npc),
            ClientEvent::ZoneComplete(5),
        ]
    );
    assert!(client
        .event_names()
        .contains(&"set-zone-done-5".to_string()));
}

#[test]
fn broadcast_updates_apply_on_every_interested_client() {
    let wire = LocalWire::new();
    let mut server = ServerRepository::new(server_config(), game_schema());
    server.listen(wire.server_socket());
    let npc = server
        .generate_with_required("Avatar", 5, avatar_args(0.0, 0.0, "npc"))
        .unwrap();

    let mut first = TestClient::new(game_schema(), avatar_factory());
    let mut second = TestClient::new(game_schema(), avatar_factory());
    first.connect(&wire, 1, 0.0);
    second.connect(&wire, 2, 0.0);
    first.repo.set_interest(5, &[]).unwrap();
    second.repo.set_interest(5, &[]).unwrap();
    exchange(&mut server, &mut [&mut first, &mut second], 0.0);

    server
        .send_update(npc, "setPos", &[DcValue::Float64(7.0), DcValue::Float64(8.0)])
        .unwrap();
    exchange(&mut server, &mut [&mut first, &mut second], 1.0);

    assert_eq!(first.repo.object_as::<TestAvatar>(npc).unwrap().pos, (7.0, 8.0));
    assert_eq!(second.repo.object_as::<TestAvatar>(npc).unwrap().pos, (7.0, 8.0));
}

#[test]
fn client_chats_relay_to_other_clients_but_never_echo() {
    let wire = LocalWire::new();
    let mut server = ServerRepository::new(server_config(), game_schema());
    server.listen(wire.server_socket());
    let npc = server
        .generate_with_required("Avatar", 5, avatar_args(0.0, 0.0, "npc"))
        .unwrap();

    let mut talker = TestClient::new(game_schema(), avatar_factory());
    let mut listener = TestClient::new(game_schema(), avatar_factory());
    talker.connect(&wire, 1, 0.0);
    listener.connect(&wire, 2, 0.0);
    talker.repo.set_interest(5, &[]).unwrap();
    listener.repo.set_interest(5, &[]).unwrap();
    exchange(&mut server, &mut [&mut talker, &mut listener], 0.0);
    server.take_events();

    // setChat carries the clsend keyword, so any session may send it.
    talker
        .repo
        .send_update(npc, "setChat", &[DcValue::Str("hi all".to_owned())])
        .unwrap();
    exchange(&mut server, &mut [&mut talker, &mut listener], 1.0);

    let heard = listener.repo.object_as::<TestAvatar>(npc).unwrap();
    assert_eq!(heard.chats, vec!["hi all".to_owned()]);
    let own = talker.repo.object_as::<TestAvatar>(npc).unwrap();
    assert!(own.chats.is_empty());

    let events = server.take_events();
    assert!(events.iter().any(|event| matches!(
        event,
        ServerEvent::FieldUpdated { do_id, from, .. } if *do_id == npc && *from == client_addr(1)
    )));
}

/// Client-side creation: doId block grants, replication of client
/// creates to peers, ownership enforcement, and deletes both explicit
/// and implied by disconnect.

use strix_client::{ClientEvent, StrixClientError};
use strix_server::{ServerEvent, ServerRepository};
use strix_shared::{DcValue, ObjectError};

use strix_test::{
    avatar_factory, client_addr, exchange, game_schema, server_config, LocalWire, TestAvatar,
    TestClient,
};

fn hero_args(name: &str) -> Vec<Vec<DcValue>> {
    vec![
        vec![DcValue::Float64(1.0), DcValue::Float64(2.0)],
        vec![DcValue::Str(name.to_owned())],
    ]
}

/// Connects both clients into zone 5 and settles the grants.
fn two_clients(server: &mut ServerRepository, wire: &LocalWire) -> (TestClient, TestClient) {
    let mut first = TestClient::new(game_schema(), avatar_factory());
    let mut second = TestClient::new(game_schema(), avatar_factory());
    first.connect(wire, 1, 0.0);
    second.connect(wire, 2, 0.0);
    first.repo.set_interest(5, &[]).unwrap();
    second.repo.set_interest(5, &[]).unwrap();
    exchange(server, &mut [&mut first, &mut second], 0.0);
    first.repo.take_events();
    second.repo.take_events();
    server.take_events();
    (first, second)
}

#[test]
fn client_creates_replicate_to_peers() {
    let _ = env_logger::builder().is_test(true).try_init();
    let wire = LocalWire::new();
    let mut server = ServerRepository::new(server_config(), game_schema());
    server.listen(wire.server_socket());
    let (mut owner, mut peer) = two_clients(&mut server, &wire);

    let do_id = owner.create("Avatar", 5, hero_args("hero"), 1.0).unwrap();
    assert_eq!(do_id, 1_000);
    assert!(owner.repo.owns(do_id));
    assert_eq!(
        owner.repo.object_as::<TestAvatar>(do_id).unwrap().announces,
        1
    );

    exchange(&mut server, &mut [&mut owner, &mut peer], 1.0);
    assert_eq!(server.num_objects(), 1);
    assert_eq!(
        server.take_events(),
        vec![ServerEvent::ObjectCreated {
            do_id,
            class_id: 0,
            zone: 5,
            owner: Some(client_addr(1)),
        }]
    );

    let seen = peer.repo.object_as::<TestAvatar>(do_id).unwrap();
    assert_eq!(seen.name, "hero");
    assert_eq!(seen.pos, (1.0, 2.0));
    // The create must not echo back to its sender as a second object.
    assert_eq!(owner.repo.num_objects(), 1);
}

#[test]
fn non_clsend_fields_are_refused_without_ownership() {
    let wire = LocalWire::new();
    let mut server = ServerRepository::new(server_config(), game_schema());
    server.listen(wire.server_socket());
    let (mut owner, mut peer) = two_clients(&mut server, &wire);

    let do_id = owner.create("Avatar", 5, hero_args("hero"), 1.0).unwrap();
    exchange(&mut server, &mut [&mut owner, &mut peer], 1.0);

    let err = peer
        .repo
        .send_update(do_id, "setName", &[DcValue::Str("imposter".to_owned())])
        .unwrap_err();
    assert!(matches!(
        err,
        StrixClientError::Object(ObjectError::FieldNotSendable { .. })
    ));

    // The owner may send it, and the peer applies it.
    owner
        .repo
        .send_update(do_id, "setName", &[DcValue::Str("renamed".to_owned())])
        .unwrap();
    exchange(&mut server, &mut [&mut owner, &mut peer], 2.0);
    assert_eq!(peer.repo.object_as::<TestAvatar>(do_id).unwrap().name, "renamed");
}

#[test]
fn request_delete_removes_the_object_everywhere() {
    let wire = LocalWire::new();
    let mut server = ServerRepository::new(server_config(), game_schema());
    server.listen(wire.server_socket());
    let (mut owner, mut peer) = two_clients(&mut server, &wire);

    let do_id = owner.create("Avatar", 5, hero_args("hero"), 1.0).unwrap();
    exchange(&mut server, &mut [&mut owner, &mut peer], 1.0);
    peer.repo.take_events();

    owner.request_delete(do_id, 2.0).unwrap();
    assert!(owner.repo.object(do_id).is_none());
    exchange(&mut server, &mut [&mut owner, &mut peer], 2.0);

    assert_eq!(server.num_objects(), 0);
    assert!(peer.repo.object(do_id).is_none());
    assert_eq!(
        peer.repo.take_events(),
        vec![ClientEvent::ObjectDeleted(do_id)]
    );
}

#[test]
fn disconnecting_cleans_up_owned_objects_on_peers() {
    let wire = LocalWire::new();
    let mut server = ServerRepository::new(server_config(), game_schema());
    server.listen(wire.server_socket());
    let (mut owner, mut peer) = two_clients(&mut server, &wire);

    let do_id = owner.create("Avatar", 5, hero_args("hero"), 1.0).unwrap();
    exchange(&mut server, &mut [&mut owner, &mut peer], 1.0);
    peer.repo.take_events();

    owner.disconnect(2.0);
    assert!(!owner.repo.is_connected());
    exchange(&mut server, &mut [&mut peer], 2.0);

    assert_eq!(server.num_sessions(), 1);
    assert_eq!(server.num_objects(), 0);
    assert!(peer.repo.object(do_id).is_none());
    assert_eq!(
        peer.repo.take_events(),
        vec![ClientEvent::ObjectDeleted(do_id)]
    );
}

#[test]
fn creates_fail_once_the_granted_block_is_spent() {
    let wire = LocalWire::new();
    let mut server = ServerRepository::new(server_config(), game_schema());
    server.listen(wire.server_socket());
    let (mut owner, mut peer) = two_clients(&mut server, &wire);

    // The test config grants blocks of ten doIds.
    for n in 0..10 {
        owner
            .create("Avatar", 5, hero_args(&format!("hero-{n}")), 1.0)
            .unwrap();
    }
    let err = owner
        .create("Avatar", 5, hero_args("one-too-many"), 1.0)
        .unwrap_err();
    assert!(matches!(err, StrixClientError::Alloc(_)));

    exchange(&mut server, &mut [&mut owner, &mut peer], 1.0);
    assert_eq!(server.num_objects(), 10);
    assert_eq!(peer.repo.num_objects(), 10);
}

/// Zone interest over the wire: switching the primary zone disables
/// departed objects, regenerates returning ones on the same instance,
/// and always finishes with the zone completion marker.

use strix_client::ClientEvent;
use strix_server::ServerRepository;
use strix_shared::{DcValue, UBER_ZONE};

use strix_test::{
    avatar_factory, exchange, game_schema, server_config, LocalWire, TestAvatar, TestClient,
};

fn avatar_args(name: &str) -> Vec<Vec<DcValue>> {
    vec![
        vec![DcValue::Float64(0.0), DcValue::Float64(0.0)],
        vec![DcValue::Str(name.to_owned())],
    ]
}

#[test]
fn switching_zones_disables_and_regenerates_on_the_same_instance() {
    let _ = env_logger::builder().is_test(true).try_init();
    let wire = LocalWire::new();
    let mut server = ServerRepository::new(server_config(), game_schema());
    server.listen(wire.server_socket());
    let north = server
        .generate_with_required("Avatar", 5, avatar_args("north"))
        .unwrap();
    let south = server
        .generate_with_required("Avatar", 6, avatar_args("south"))
        .unwrap();

    let mut client = TestClient::new(game_schema(), avatar_factory());
    client.connect(&wire, 1, 0.0);
    client.repo.set_interest(5, &[]).unwrap();
    exchange(&mut server, &mut [&mut client], 0.0);
    assert_eq!(client.repo.num_objects(), 1);
    client.repo.take_events();

    client.repo.set_interest(6, &[]).unwrap();
    exchange(&mut server, &mut [&mut client], 1.0);

    // The departed object stays in the table, disabled, ready to come back.
    assert_eq!(client.repo.num_objects(), 2);
    assert_eq!(
        client.repo.take_events(),
        vec![
            ClientEvent::ObjectDisabled(north),
            ClientEvent::ObjectGenerated(south),
            ClientEvent::ZoneComplete(6),
        ]
    );
    let gone = client.repo.object_as::<TestAvatar>(north).unwrap();
    assert_eq!(gone.disables, 1);
    assert_eq!(gone.announces, 1);

    client.repo.set_interest(5, &[6]).unwrap();
    exchange(&mut server, &mut [&mut client], 2.0);

    assert_eq!(
        client.repo.take_events(),
        vec![
            ClientEvent::ObjectGenerated(north),
            ClientEvent::ZoneComplete(5),
        ]
    );
    let back = client.repo.object_as::<TestAvatar>(north).unwrap();
    assert_eq!(back.generates, 2);
    assert_eq!(back.announces, 2);
    assert_eq!(back.disables, 1);
    // Same instance: state set before the disable is still there.
    assert_eq!(back.name, "north");
    assert_eq!(
        client.repo.interest_zones(),
        [UBER_ZONE, 5, 6].into_iter().collect()
    );
}

#[test]
fn extra_zones_stay_visible_across_primary_switches() {
    let wire = LocalWire::new();
    let mut server = ServerRepository::new(server_config(), game_schema());
    server.listen(wire.server_socket());
    let north = server
        .generate_with_required("Avatar", 5, avatar_args("north"))
        .unwrap();
    let south = server
        .generate_with_required("Avatar", 6, avatar_args("south"))
        .unwrap();

    let mut client = TestClient::new(game_schema(), avatar_factory());
    client.connect(&wire, 1, 0.0);
    client.repo.set_interest(5, &[6]).unwrap();
    exchange(&mut server, &mut [&mut client], 0.0);
    assert_eq!(client.repo.num_objects(), 2);
    client.repo.take_events();

    // Zone 6 moves from extra to primary; nothing is disabled.
    client.repo.set_interest(6, &[5]).unwrap();
    exchange(&mut server, &mut [&mut client], 1.0);
    assert_eq!(
        client.repo.take_events(),
        vec![ClientEvent::ZoneComplete(6)]
    );
    assert_eq!(
        client.repo.object_as::<TestAvatar>(north).unwrap().disables,
        0
    );

    // Dropping zone 5 disables only its object.
    client.repo.set_interest(6, &[]).unwrap();
    exchange(&mut server, &mut [&mut client], 2.0);
    assert_eq!(
        client.repo.take_events(),
        vec![
            ClientEvent::ObjectDisabled(north),
            ClientEvent::ZoneComplete(6),
        ]
    );
    assert_eq!(
        client.repo.object_as::<TestAvatar>(south).unwrap().disables,
        0
    );
}

#[test]
fn uber_zone_objects_survive_every_interest_change() {
    let wire = LocalWire::new();
    let mut server = ServerRepository::new(server_config(), game_schema());
    server.listen(wire.server_socket());
    let global = server
        .generate_with_required("Avatar", UBER_ZONE, avatar_args("timeMgr"))
        .unwrap();

    let mut client = TestClient::new(game_schema(), avatar_factory());
    client.connect(&wire, 1, 0.0);
    client.repo.set_interest(5, &[]).unwrap();
    exchange(&mut server, &mut [&mut client], 0.0);
    assert_eq!(
        client.repo.object_as::<TestAvatar>(global).unwrap().announces,
        1
    );

    for (zone, now) in [(6, 1.0), (7, 2.0), (5, 3.0)] {
        client.repo.set_interest(zone, &[]).unwrap();
        exchange(&mut server, &mut [&mut client], now);
    }
    let timekeeper = client.repo.object_as::<TestAvatar>(global).unwrap();
    assert_eq!(timekeeper.disables, 0);
    assert_eq!(timekeeper.announces, 1);
}

/// A distributed level delivered over the wire: the create carries the
/// network zone ids, announce builds the level from its spec, and
/// walking its zones drives interest changes.

use strix_client::DistributedLevel;
use strix_server::ServerRepository;
use strix_shared::{DcValue, ZoneId, UBER_ZONE};

use strix_test::{exchange, game_factory, game_schema, level_spec, server_config, LocalWire, TestClient};

#[test]
fn levels_initialize_from_the_wire_and_map_zones() {
    let _ = env_logger::builder().is_test(true).try_init();
    let wire = LocalWire::new();
    let mut server = ServerRepository::new(server_config(), game_schema());
    server.listen(wire.server_socket());

    let net: Vec<ZoneId> = (0..3).map(|_| server.allocate_zone()).collect();
    assert!(net.iter().all(|&zone| zone != UBER_ZONE));
    let zone_args = vec![vec![DcValue::List(
        net.iter().map(|&zone| DcValue::Uint32(zone)).collect(),
    )]];
    let lvl = server
        .generate_with_required("GameLevel", 5, zone_args)
        .unwrap();

    let mut client = TestClient::new(game_schema(), game_factory(level_spec()));
    client.connect(&wire, 1, 0.0);
    client.repo.set_interest(5, &[]).unwrap();
    exchange(&mut server, &mut [&mut client], 0.0);

    let level = client.repo.object_as::<DistributedLevel>(lvl).unwrap();
    assert!(level.level().is_initialized());
    assert_eq!(level.network_zone(10), Some(net[0]));
    assert_eq!(level.network_zone(11), Some(net[1]));
    assert_eq!(level.network_zone(12), Some(net[2]));
}

#[test]
fn walking_the_level_drives_zone_interest() {
    let wire = LocalWire::new();
    let mut server = ServerRepository::new(server_config(), game_schema());
    server.listen(wire.server_socket());

    let net: Vec<ZoneId> = (0..3).map(|_| server.allocate_zone()).collect();
    let zone_args = vec![vec![DcValue::List(
        net.iter().map(|&zone| DcValue::Uint32(zone)).collect(),
    )]];
    let lvl = server
        .generate_with_required("GameLevel", 5, zone_args)
        .unwrap();

    let mut client = TestClient::new(game_schema(), game_factory(level_spec()));
    client.connect(&wire, 1, 0.0);
    client.repo.set_interest(5, &[]).unwrap();
    exchange(&mut server, &mut [&mut client], 0.0);

    // Stand in level zone 10: its network zone becomes primary, and the
    // visible neighbor 11 rides along. The level's own zone stays in the
    // set so the level object itself never leaves interest.
    let level = client.repo.object_as_mut::<DistributedLevel>(lvl).unwrap();
    level.set_current_zone(10);
    let (primary, mut extras) = level.take_interest_change().unwrap();
    assert_eq!(primary, net[0]);
    assert_eq!(extras, vec![net[1]]);
    extras.push(5);

    client.repo.set_interest(primary, &extras).unwrap();
    exchange(&mut server, &mut [&mut client], 1.0);
    assert!(client
        .event_names()
        .contains(&format!("set-zone-done-{primary}")));
    assert!(client.repo.interest_zones().contains(&net[1]));

    // A door opens and zone 12 becomes visible from here too.
    let level = client.repo.object_as_mut::<DistributedLevel>(lvl).unwrap();
    level.handle_event("door-open", &[DcValue::from(true)]);
    let (primary, mut extras) = level.take_interest_change().unwrap();
    assert_eq!(primary, net[0]);
    assert_eq!(extras, vec![net[1], net[2]]);
    extras.push(5);

    client.repo.set_interest(primary, &extras).unwrap();
    exchange(&mut server, &mut [&mut client], 2.0);
    assert!(client.repo.interest_zones().contains(&net[2]));

    // Step through the level into zone 11.
    let level = client.repo.object_as_mut::<DistributedLevel>(lvl).unwrap();
    level.set_current_zone(11);
    let (primary, extras) = level.take_interest_change().unwrap();
    assert_eq!(primary, net[1]);
    assert_eq!(extras, Vec::<ZoneId>::new());
}

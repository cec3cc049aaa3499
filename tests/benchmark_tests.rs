//! Performance benchmarks for the hot paths of state sync

use arena_client::ecs::{EntityManager, Transform, Velocity};
use arena_client::{ClientGame, ControlInput, Tracked};
use arena_server::{router, simulation, GameConfig, GameState, Outbox};
use arena_shared::dto::{AsteroidCoordinatesDto, JoinRequest, PlayerCoordinatesDto};
use arena_shared::{EventName, Frame, Vector2};
use std::time::Instant;

fn report(label: &str, iterations: u32, duration: std::time::Duration) {
    println!(
        "{}: {} iterations in {:?} ({:.2} us/iter)",
        label,
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );
}

/// Benchmarks routing of validated coordinate frames through the server
#[test]
fn benchmark_coordinate_routing() {
    let mut game = GameState::new(GameConfig {
        seed: Some(1),
        ..GameConfig::default()
    });
    let join = Frame::success(
        EventName::PlayerJoin,
        &JoinRequest {
            name: "Vega".into(),
            sprite_key: None,
        },
    )
    .unwrap();
    router::route(&mut game, 1, join, &mut Outbox::new()).unwrap();

    let iterations = 10_000;
    let start = Instant::now();
    for i in 0..iterations {
        let text = Frame::success(
            EventName::PlayerCoordinates,
            &PlayerCoordinatesDto {
                id: "ignored".into(),
                x: (i % 1000) as f32,
                y: 300.0,
                angle: 0.5,
            },
        )
        .unwrap()
        .to_text()
        .unwrap();
        let mut outbox = Outbox::new();
        router::route_text(&mut game, 1, &text, &mut outbox).unwrap();
    }
    let duration = start.elapsed();
    report("Coordinate routing", iterations, duration);

    assert_eq!(game.player(1).unwrap().position.x, 999.0);
    assert!(duration.as_secs() < 5);
}

/// Benchmarks the server tick with a full asteroid field
#[test]
fn benchmark_simulation_tick() {
    let mut game = GameState::new(GameConfig {
        seed: Some(2),
        max_asteroids: 200,
        asteroid_spawn_interval: 0.0,
        ..GameConfig::default()
    });
    for i in 0..200 {
        game.spawn_asteroid(Vector2::new(400.0 + i as f32, 600.0), Vector2::new(1.0, 0.0));
    }

    let iterations = 1_000;
    let start = Instant::now();
    for _ in 0..iterations {
        let mut outbox = Outbox::new();
        simulation::advance(&mut game, 1.0 / 60.0, true, &mut outbox).unwrap();
        assert_eq!(outbox.frames().len(), 200);
    }
    let duration = start.elapsed();
    report("Simulation tick", iterations, duration);

    assert_eq!(game.asteroid_count(), 200);
    assert!(duration.as_secs() < 10);
}

/// Benchmarks client reconciliation of server coordinate frames
#[test]
fn benchmark_client_reconciliation() {
    let mut client = ClientGame::headless();
    let ids: Vec<String> = (0..100).map(|i| format!("a-{}", i)).collect();
    for id in &ids {
        let create = Frame::success(
            EventName::AsteroidCreate,
            &arena_shared::dto::AsteroidDto {
                id: id.clone(),
                x: 0.0,
                y: 0.0,
                health: 30.0,
                max_health: 30.0,
            },
        )
        .unwrap();
        client.apply(create).unwrap();
    }

    let iterations = 20_000;
    let start = Instant::now();
    for i in 0..iterations {
        let frame = Frame::success(
            EventName::AsteroidCoordinates,
            &AsteroidCoordinatesDto {
                id: ids[i as usize % ids.len()].clone(),
                x: i as f32,
                y: 1.0,
            },
        )
        .unwrap();
        client.apply(frame).unwrap();
    }
    let duration = start.elapsed();
    report("Client reconciliation", iterations, duration);

    assert_eq!(client.tracked_count(Tracked::Asteroid), 100);
    assert_eq!(client.entities().len(), 100);
    assert!(duration.as_secs() < 5);
}

/// Benchmarks the local ECS update loop
#[test]
fn benchmark_ecs_update() {
    let mut client = ClientGame::headless();
    for _ in 0..500 {
        let entity = client.entities_mut().create();
        client
            .entities_mut()
            .insert(entity, Transform::new(10.0, 10.0, 0.0))
            .unwrap();
        client
            .entities_mut()
            .insert(
                entity,
                Velocity {
                    linear: Vector2::new(1.0, 1.0),
                },
            )
            .unwrap();
    }

    let iterations = 2_000;
    let start = Instant::now();
    for _ in 0..iterations {
        client.tick(1.0 / 60.0, ControlInput::default()).unwrap();
    }
    let duration = start.elapsed();
    report("ECS update", iterations, duration);

    assert!(client.drain_outbound().is_empty());
    assert!(duration.as_secs() < 5);
}

/// Benchmarks entity churn through create and remove
#[test]
fn benchmark_entity_churn() {
    let mut manager = EntityManager::new();

    let iterations = 50_000;
    let start = Instant::now();
    for i in 0..iterations {
        let entity = manager.create();
        manager
            .insert(entity, Transform::new(i as f32, 0.0, 0.0))
            .unwrap();
        assert!(manager.remove(entity));
    }
    let duration = start.elapsed();
    report("Entity churn", iterations, duration);

    assert!(manager.is_empty());
    assert!(duration.as_secs() < 5);
}

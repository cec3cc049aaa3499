//! Fixed-step world simulation run on every server tick.

use crate::game::GameState;
use crate::outbox::{Outbox, Target};
use arena_shared::dto::{AsteroidCoordinatesDto, DestroyDto, ProjectileCoordinatesDto};
use arena_shared::{EventName, ValidationError, Vector2};
use log::debug;
use rand::Rng;

/// Advances the world by `dt` seconds.
///
/// State always advances; frames are only queued when somebody is connected
/// to receive them.
pub fn advance(
    game: &mut GameState,
    dt: f32,
    has_audience: bool,
    outbox: &mut Outbox,
) -> Result<(), ValidationError> {
    let mut frames = Outbox::new();
    game.tick += 1;

    spawn_asteroids(game, dt, &mut frames)?;
    move_asteroids(game, dt, &mut frames)?;
    move_projectiles(game, dt, &mut frames)?;
    expire_pickups(game, dt, &mut frames)?;

    if has_audience {
        outbox.extend(frames);
    }
    Ok(())
}

fn spawn_asteroids(game: &mut GameState, dt: f32, frames: &mut Outbox) -> Result<(), ValidationError> {
    let interval = game.config.asteroid_spawn_interval;
    if interval <= 0.0 {
        return Ok(());
    }

    game.spawn_timer += dt;
    while game.spawn_timer >= interval {
        game.spawn_timer -= interval;
        if game.asteroids.len() >= game.config.max_asteroids {
            continue;
        }
        let (position, velocity) = edge_spawn(game);
        let asteroid = game.spawn_asteroid(position, velocity);
        frames.emit(Target::Broadcast, EventName::AsteroidCreate, &asteroid)?;
    }
    Ok(())
}

// Random point on the world edge, heading towards the middle half of the map.
fn edge_spawn(game: &mut GameState) -> (Vector2, Vector2) {
    let bounds = game.config.bounds;
    let min_speed = game.config.asteroid_min_speed.min(game.config.asteroid_max_speed);
    let max_speed = game.config.asteroid_max_speed.max(min_speed);
    let rng = &mut game.rng;

    let position = match rng.gen_range(0..4) {
        0 => Vector2::new(rng.gen_range(0.0..=bounds.width), 0.0),
        1 => Vector2::new(bounds.width, rng.gen_range(0.0..=bounds.height)),
        2 => Vector2::new(rng.gen_range(0.0..=bounds.width), bounds.height),
        _ => Vector2::new(0.0, rng.gen_range(0.0..=bounds.height)),
    };
    let target = Vector2::new(
        rng.gen_range(bounds.width * 0.25..=bounds.width * 0.75),
        rng.gen_range(bounds.height * 0.25..=bounds.height * 0.75),
    );
    let speed = rng.gen_range(min_speed..=max_speed);
    let direction = Vector2::new(target.x - position.x, target.y - position.y).normalize();
    (position, direction.scale(speed))
}

fn move_asteroids(game: &mut GameState, dt: f32, frames: &mut Outbox) -> Result<(), ValidationError> {
    let bounds = game.config.bounds;
    let padding = game.config.boundary_padding;
    let mut escaped = Vec::new();

    for asteroid in game.asteroids.values_mut() {
        asteroid.position = asteroid.position.add(&asteroid.velocity.scale(dt));
        if bounds.contains(asteroid.position, padding) {
            frames.emit(
                Target::Broadcast,
                EventName::AsteroidCoordinates,
                &AsteroidCoordinatesDto {
                    id: asteroid.id.clone(),
                    x: asteroid.position.x,
                    y: asteroid.position.y,
                },
            )?;
        } else {
            escaped.push(asteroid.id.clone());
        }
    }

    for id in escaped {
        game.remove_asteroid(&id);
        debug!("Asteroid {} left the arena", id);
        frames.emit(Target::Broadcast, EventName::AsteroidDestroy, &DestroyDto { id })?;
    }
    Ok(())
}

fn move_projectiles(game: &mut GameState, dt: f32, frames: &mut Outbox) -> Result<(), ValidationError> {
    let bounds = game.config.bounds;
    let padding = game.config.boundary_padding;
    let ttl = game.config.projectile_ttl;
    let mut retired = Vec::new();

    for projectile in game.projectiles.values_mut() {
        projectile.age += dt;
        projectile.position = projectile
            .position
            .add(&projectile.direction.scale(projectile.speed * dt));

        if projectile.age >= ttl || !bounds.contains(projectile.position, padding) {
            retired.push(projectile.id.clone());
        } else {
            frames.emit(
                Target::Broadcast,
                EventName::ProjectileCoordinates,
                &ProjectileCoordinatesDto {
                    id: projectile.id.clone(),
                    x: projectile.position.x,
                    y: projectile.position.y,
                },
            )?;
        }
    }

    for id in retired {
        game.projectiles.remove(&id);
        frames.emit(Target::Broadcast, EventName::ProjectileDestroy, &DestroyDto { id })?;
    }
    Ok(())
}

fn expire_pickups(game: &mut GameState, dt: f32, frames: &mut Outbox) -> Result<(), ValidationError> {
    let ttl = game.config.pickup_ttl;
    let mut expired = Vec::new();

    for pickup in game.pickups.values_mut() {
        pickup.age += dt;
        if pickup.age >= ttl {
            expired.push(pickup.id.clone());
        }
    }

    for id in expired {
        game.pickups.remove(&id);
        frames.emit(Target::Broadcast, EventName::PickupDestroy, &DestroyDto { id })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use arena_shared::dto::{FireRequest, PickupKind};
    use arena_shared::AmmoKind;

    fn quiet_game() -> GameState {
        GameState::new(GameConfig {
            seed: Some(11),
            asteroid_spawn_interval: 0.0,
            ..GameConfig::default()
        })
    }

    fn events(outbox: &Outbox) -> Vec<&str> {
        outbox
            .frames()
            .iter()
            .map(|outgoing| outgoing.frame.event.as_str())
            .collect()
    }

    #[test]
    fn test_spawns_up_to_max_asteroids() {
        let mut game = GameState::new(GameConfig {
            seed: Some(2),
            asteroid_spawn_interval: 1.0,
            max_asteroids: 3,
            ..GameConfig::default()
        });
        let mut created = 0;
        for _ in 0..5 {
            let mut outbox = Outbox::new();
            advance(&mut game, 1.0, true, &mut outbox).unwrap();
            created += events(&outbox)
                .into_iter()
                .filter(|event| *event == "asteroid:create")
                .count();
        }

        assert_eq!(game.asteroid_count(), 3);
        assert_eq!(created, 3);
    }

    #[test]
    fn test_spawned_asteroids_head_inward() {
        let mut game = GameState::new(GameConfig {
            seed: Some(9),
            asteroid_spawn_interval: 1.0,
            ..GameConfig::default()
        });
        let center = game.config().bounds.center();
        let mut outbox = Outbox::new();
        advance(&mut game, 1.0, true, &mut outbox).unwrap();

        let created = &outbox.frames()[0].frame.payload["dto"];
        let spawn = Vector2::new(
            created["x"].as_f64().unwrap() as f32,
            created["y"].as_f64().unwrap() as f32,
        );
        let asteroid = game.asteroids.values().next().unwrap();
        assert!(asteroid.position.distance(&center) < spawn.distance(&center));
    }

    #[test]
    fn test_asteroid_leaving_bounds_is_destroyed() {
        let mut game = quiet_game();
        let asteroid = game.spawn_asteroid(Vector2::new(10.0, 10.0), Vector2::new(-500.0, 0.0));
        let mut outbox = Outbox::new();
        advance(&mut game, 1.0, true, &mut outbox).unwrap();

        assert_eq!(game.asteroid_count(), 0);
        assert!(!game.health().contains(&asteroid.id));
        assert_eq!(events(&outbox), vec!["asteroid:destroy"]);
    }

    #[test]
    fn test_moving_asteroid_reports_coordinates() {
        let mut game = quiet_game();
        game.spawn_asteroid(Vector2::new(100.0, 100.0), Vector2::new(10.0, 0.0));
        let mut outbox = Outbox::new();
        advance(&mut game, 0.5, true, &mut outbox).unwrap();

        assert_eq!(events(&outbox), vec!["asteroid:coordinates"]);
        assert_eq!(outbox.frames()[0].frame.payload["dto"]["x"], 105.0);
    }

    #[test]
    fn test_projectile_expires_after_ttl() {
        let mut game = quiet_game();
        game.add_player(1, "Vega".to_string(), None);
        game.fire(
            1,
            &FireRequest {
                x: 800.0,
                y: 600.0,
                dx: 0.0,
                dy: 1.0,
                projectile_type: AmmoKind::Mine,
            },
        );

        let mut outbox = Outbox::new();
        advance(&mut game, 1.0, true, &mut outbox).unwrap();
        assert_eq!(events(&outbox), vec!["projectile:coordinates"]);

        let mut outbox = Outbox::new();
        advance(&mut game, 5.0, true, &mut outbox).unwrap();
        assert_eq!(events(&outbox), vec!["projectile:destroy"]);
        assert_eq!(game.projectile_count(), 0);
    }

    #[test]
    fn test_pickup_expires() {
        let mut game = quiet_game();
        game.create_pickup(PickupKind::Health, Vector2::new(10.0, 10.0));
        let mut outbox = Outbox::new();
        advance(&mut game, 100.0, true, &mut outbox).unwrap();

        assert_eq!(events(&outbox), vec!["pickup:destroy"]);
        assert_eq!(game.pickup_count(), 0);
    }

    #[test]
    fn test_no_audience_no_frames() {
        let mut game = GameState::new(GameConfig {
            seed: Some(4),
            asteroid_spawn_interval: 1.0,
            ..GameConfig::default()
        });
        let mut outbox = Outbox::new();
        advance(&mut game, 3.0, false, &mut outbox).unwrap();

        assert!(outbox.is_empty());
        assert_eq!(game.asteroid_count(), 3);
        assert_eq!(game.tick, 1);
    }
}

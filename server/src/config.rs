//! Server and simulation settings.

use arena_shared::{Bounds, Vector2, DEFAULT_MAX_HEALTH};
use std::time::Duration;

/// Tuning for the authoritative simulation.
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub bounds: Bounds,
    /// Fixed spawn point for new players. `None` picks a random point in bounds.
    pub spawn_point: Option<Vector2>,
    pub player_max_health: f32,
    pub asteroid_max_health: f32,
    /// Seconds between asteroid spawn attempts.
    pub asteroid_spawn_interval: f32,
    pub max_asteroids: usize,
    pub asteroid_min_speed: f32,
    pub asteroid_max_speed: f32,
    /// Distance outside the play area an entity may travel before it is retired.
    pub boundary_padding: f32,
    pub projectile_ttl: f32,
    pub pickup_ttl: f32,
    /// Probability in `[0, 1]` that a destroyed asteroid drops a pickup.
    pub drop_chance: f64,
    pub asteroid_points: u32,
    pub health_pickup_amount: u32,
    pub score_pickup_points: u32,
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            bounds: Bounds::default(),
            spawn_point: None,
            player_max_health: DEFAULT_MAX_HEALTH,
            asteroid_max_health: 30.0,
            asteroid_spawn_interval: 2.0,
            max_asteroids: 12,
            asteroid_min_speed: 40.0,
            asteroid_max_speed: 120.0,
            boundary_padding: 100.0,
            projectile_ttl: 3.0,
            pickup_ttl: 15.0,
            drop_chance: 0.35,
            asteroid_points: 25,
            health_pickup_amount: 25,
            score_pickup_points: 50,
            seed: None,
        }
    }
}

/// Network-facing settings plus the simulation they drive.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Simulation updates per second.
    pub tick_rate: u32,
    pub max_clients: usize,
    pub idle_timeout: Duration,
    /// Frames queued per connection before it is dropped as a stalled reader.
    pub outbound_capacity: usize,
    pub event_bus_capacity: usize,
    pub game: GameConfig,
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn tick_duration(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.tick_rate.max(1) as f64)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            tick_rate: 30,
            max_clients: 32,
            idle_timeout: Duration::from_secs(30),
            outbound_capacity: 256,
            event_bus_capacity: 256,
            game: GameConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_and_tick_duration() {
        let config = ServerConfig {
            host: "0.0.0.0".to_string(),
            port: 9000,
            tick_rate: 20,
            ..ServerConfig::default()
        };
        assert_eq!(config.address(), "0.0.0.0:9000");
        assert_eq!(config.tick_duration(), Duration::from_millis(50));
    }

    #[test]
    fn test_zero_tick_rate_does_not_divide_by_zero() {
        let config = ServerConfig {
            tick_rate: 0,
            ..ServerConfig::default()
        };
        assert_eq!(config.tick_duration(), Duration::from_secs(1));
    }

    #[test]
    fn test_game_defaults_are_sane() {
        let game = GameConfig::default();
        assert!(game.asteroid_min_speed <= game.asteroid_max_speed);
        assert!((0.0..=1.0).contains(&game.drop_chance));
        assert_eq!(game.max_asteroids, 12);
        assert_eq!(game.asteroid_points, 25);
    }
}

//! # Arena Shared Protocol
//!
//! Everything the server and the clients must agree on verbatim lives here:
//! the event registry, the `{ ok, dto | error }` envelope, the DTO schemas and
//! the small domain models (health, weapons, geometry) both sides simulate.
//!
//! ## Module Organization
//!
//! ### Events (`events`)
//! The fixed set of namespaced event names (`player:hit`, `asteroid:create`, ...)
//! together with their domain and direction of travel.
//!
//! ### Envelope & Schemas (`envelope`, `schema`, `dto`)
//! Every payload travels inside an [`Envelope`]. Parsing a payload and checking
//! it against its schema is a single step, so no malformed value can reach
//! simulation state and none can leave the process either.
//!
//! ### Wire (`wire`)
//! The JSON frame carried by each WebSocket text message.
//!
//! ### Domain Models (`health`, `weapon`, `geometry`)
//! Clamped health tracking, per-kind ammunition and the 2D math shared by the
//! authoritative simulation and the client mirror.

pub mod dto;
pub mod envelope;
pub mod events;
pub mod geometry;
pub mod health;
pub mod schema;
pub mod weapon;
pub mod wire;

pub use envelope::{open, Envelope, ErrorCode, ErrorDto, Inbound};
pub use events::{Domain, EventName, Flow, UnknownEventError};
pub use geometry::{Bounds, Vector2};
pub use health::{Health, HealthMap};
pub use schema::{validate, validate_value, FieldPath, Schema, ValidationError};
pub use weapon::{AmmoKind, AmmoSpec, Weapon};
pub use wire::Frame;

pub const WORLD_WIDTH: f32 = 1600.0;
pub const WORLD_HEIGHT: f32 = 1200.0;

pub const DEFAULT_MAX_HEALTH: f32 = 100.0;
pub const MAX_LEVEL: u8 = 10;
pub const POINTS_PER_LEVEL: u32 = 100;
pub const MAX_NAME_LEN: usize = 24;

pub const PLAYER_RADIUS: f32 = 24.0;
pub const ASTEROID_RADIUS: f32 = 40.0;
pub const PICKUP_RADIUS: f32 = 16.0;
pub const PROJECTILE_RADIUS: f32 = 4.0;

/// Clamps an arbitrary level into `0..=MAX_LEVEL`.
pub fn clamp_level(level: u32) -> u8 {
    level.min(MAX_LEVEL as u32) as u8
}

/// Level reached with the given score, one level per [`POINTS_PER_LEVEL`].
pub fn level_for_score(score: u32) -> u8 {
    clamp_level(score / POINTS_PER_LEVEL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_level() {
        assert_eq!(clamp_level(0), 0);
        assert_eq!(clamp_level(7), 7);
        assert_eq!(clamp_level(MAX_LEVEL as u32), MAX_LEVEL);
        assert_eq!(clamp_level(u32::MAX), MAX_LEVEL);
    }

    #[test]
    fn test_level_for_score() {
        assert_eq!(level_for_score(0), 0);
        assert_eq!(level_for_score(99), 0);
        assert_eq!(level_for_score(100), 1);
        assert_eq!(level_for_score(450), 4);
        assert_eq!(level_for_score(1_000_000), MAX_LEVEL);
    }
}

//! # Entity Component System
//!
//! Engine-agnostic container mirroring authoritative state into local
//! entities. Entities carry at most one component per [`ComponentKind`];
//! systems declare the kinds they need and run once per matching entity.

mod component;
mod entity;
mod manager;
mod system;

pub use component::{
    Component, ComponentData, ComponentKind, Control, Health, NetworkId, Pickup, Projectile,
    Sprite, Stats, Transform, Velocity, Weapon,
};
pub use entity::{Entity, EntityId};
pub use manager::{EcsError, EntityManager};
pub use system::System;

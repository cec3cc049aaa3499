//! Local-only systems. Only the local ship carries a `Control` component, so
//! movement and weapons never touch entities mirrored from the server.

use crate::ecs::{ComponentKind, Control, Entity, Sprite, System, Transform, Velocity, Weapon};
use arena_shared::{Bounds, Vector2};

pub const MOVEMENT: &str = "movement";
pub const WEAPON: &str = "weapon";
pub const RENDER_SYNC: &str = "render-sync";

/// Rotation, thrust and braking for the local ship, kept inside the arena.
#[derive(Debug, Clone)]
pub struct MovementSystem {
    pub bounds: Bounds,
    /// Radians per second at full rotation input.
    pub turn_rate: f32,
    pub thrust: f32,
    /// Fraction of speed shed per second while braking.
    pub brake: f32,
    pub max_speed: f32,
}

impl MovementSystem {
    pub fn new(bounds: Bounds) -> Self {
        Self {
            bounds,
            turn_rate: 3.5,
            thrust: 320.0,
            brake: 2.5,
            max_speed: 360.0,
        }
    }
}

impl System for MovementSystem {
    fn name(&self) -> &str {
        MOVEMENT
    }

    fn requires(&self) -> &[ComponentKind] {
        &[ComponentKind::Transform, ComponentKind::Velocity, ComponentKind::Control]
    }

    fn run(&mut self, entity: &mut Entity, dt: f32) {
        let (Some(input), Some(mut velocity), Some(mut transform)) = (
            entity.get::<Control>().map(|control| control.input),
            entity.get::<Velocity>().map(|velocity| velocity.linear),
            entity.get::<Transform>().copied(),
        ) else {
            return;
        };

        transform.rotation += input.rotation.clamp(-1.0, 1.0) * self.turn_rate * dt;
        if input.thrust {
            velocity = velocity.add(&Vector2::from_angle(transform.rotation).scale(self.thrust * dt));
        }
        if input.brake {
            velocity = velocity.scale((1.0 - self.brake * dt).max(0.0));
        }
        if velocity.magnitude() > self.max_speed {
            velocity = velocity.normalize().scale(self.max_speed);
        }

        let moved = transform.position.add(&velocity.scale(dt));
        transform.position = self.bounds.clamp(moved);
        if transform.position.x != moved.x {
            velocity.x = 0.0;
        }
        if transform.position.y != moved.y {
            velocity.y = 0.0;
        }

        if let Some(slot) = entity.get_mut::<Transform>() {
            *slot = transform;
        }
        if let Some(slot) = entity.get_mut::<Velocity>() {
            slot.linear = velocity;
        }
    }
}

/// Cooldown, ammo selection and trigger handling. A successful shot is left
/// in `Weapon::pending_shot` for the game to send.
#[derive(Debug, Clone, Default)]
pub struct WeaponSystem;

impl System for WeaponSystem {
    fn name(&self) -> &str {
        WEAPON
    }

    fn requires(&self) -> &[ComponentKind] {
        &[ComponentKind::Weapon, ComponentKind::Control]
    }

    fn run(&mut self, entity: &mut Entity, dt: f32) {
        let Some(input) = entity.get::<Control>().map(|control| control.input) else {
            return;
        };
        let Some(weapon) = entity.get_mut::<Weapon>() else {
            return;
        };

        weapon.state.cool(dt);
        if let Some(kind) = input.select {
            weapon.state.select(kind);
        }
        if input.trigger && weapon.pending_shot.is_none() {
            weapon.pending_shot = weapon.state.fire();
        }
    }
}

/// Moves each visual handle to its entity's transform.
#[derive(Debug, Clone, Default)]
pub struct RenderSyncSystem;

impl System for RenderSyncSystem {
    fn name(&self) -> &str {
        RENDER_SYNC
    }

    fn requires(&self) -> &[ComponentKind] {
        &[ComponentKind::Transform, ComponentKind::Sprite]
    }

    fn run(&mut self, entity: &mut Entity, _dt: f32) {
        let Some(transform) = entity.get::<Transform>().copied() else {
            return;
        };
        if let Some(visual) = entity.get_mut::<Sprite>().and_then(|sprite| sprite.visual.as_mut()) {
            visual.reposition(transform.position.x, transform.position.y, transform.rotation);
        }
    }
}

//! # Components
//!
//! Components are data holders with no behavior beyond their own invariants.
//! They are stored in a tagged [`Component`] enum and reached through the
//! typed [`ComponentData`] accessors.

use crate::input::ControlInput;
use crate::rendering::Visual;
use arena_shared::dto::PickupKind;
use arena_shared::{AmmoKind, Vector2};
use std::fmt;

/// Tag identifying a component type. An entity holds at most one per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ComponentKind {
    Transform,
    Velocity,
    Health,
    Weapon,
    Sprite,
    NetworkId,
    Control,
    Projectile,
    Pickup,
    Stats,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Transform {
    pub position: Vector2,
    /// Facing angle in radians.
    pub rotation: f32,
}

impl Transform {
    pub fn new(x: f32, y: f32, rotation: f32) -> Self {
        Self {
            position: Vector2::new(x, y),
            rotation,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Velocity {
    pub linear: Vector2,
}

/// Clamped health of a mirrored entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Health {
    pub value: arena_shared::Health,
}

impl Health {
    pub fn new(current: f32, max: f32) -> Self {
        Self {
            value: arena_shared::Health::with_current(current, max),
        }
    }

    pub fn current(&self) -> f32 {
        self.value.current()
    }

    pub fn max(&self) -> f32 {
        self.value.max()
    }

    /// Overwrites both values with an authoritative pair.
    pub fn assign(&mut self, current: f32, max: f32) {
        self.value = arena_shared::Health::with_current(current, max);
    }

    pub fn is_dead(&self) -> bool {
        self.value.is_dead()
    }
}

/// Local weapon state plus the shot requested during the current tick.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Weapon {
    pub state: arena_shared::Weapon,
    pub pending_shot: Option<AmmoKind>,
}

/// Sprite key plus the visual handle the renderer returned for it.
pub struct Sprite {
    pub key: String,
    pub visual: Option<Box<dyn Visual>>,
}

impl Sprite {
    pub fn new(key: impl Into<String>, visual: Box<dyn Visual>) -> Self {
        Self {
            key: key.into(),
            visual: Some(visual),
        }
    }

    /// Destroys the visual handle. Safe to call more than once.
    pub fn teardown(&mut self) {
        if let Some(mut visual) = self.visual.take() {
            visual.destroy();
        }
    }
}

impl fmt::Debug for Sprite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sprite")
            .field("key", &self.key)
            .field("has_visual", &self.visual.is_some())
            .finish()
    }
}

/// Server-minted id of the domain object this entity mirrors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkId {
    pub id: String,
    pub is_local: bool,
}

/// Per-tick input, present only on the local ship.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Control {
    pub input: ControlInput,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Projectile {
    pub owner_id: String,
    pub kind: AmmoKind,
    pub damage: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pickup {
    pub kind: PickupKind,
    pub value: u32,
    pub ammo_kind: Option<AmmoKind>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Stats {
    pub name: String,
    pub score: u32,
    pub level: u8,
}

#[derive(Debug)]
pub enum Component {
    Transform(Transform),
    Velocity(Velocity),
    Health(Health),
    Weapon(Weapon),
    Sprite(Sprite),
    NetworkId(NetworkId),
    Control(Control),
    Projectile(Projectile),
    Pickup(Pickup),
    Stats(Stats),
}

impl Component {
    pub fn kind(&self) -> ComponentKind {
        match self {
            Component::Transform(_) => ComponentKind::Transform,
            Component::Velocity(_) => ComponentKind::Velocity,
            Component::Health(_) => ComponentKind::Health,
            Component::Weapon(_) => ComponentKind::Weapon,
            Component::Sprite(_) => ComponentKind::Sprite,
            Component::NetworkId(_) => ComponentKind::NetworkId,
            Component::Control(_) => ComponentKind::Control,
            Component::Projectile(_) => ComponentKind::Projectile,
            Component::Pickup(_) => ComponentKind::Pickup,
            Component::Stats(_) => ComponentKind::Stats,
        }
    }

    /// Releases anything the component owns outside the ECS.
    pub fn teardown(&mut self) {
        if let Component::Sprite(sprite) = self {
            sprite.teardown();
        }
    }
}

/// Typed access to one variant of [`Component`].
pub trait ComponentData: Sized {
    const KIND: ComponentKind;

    fn wrap(self) -> Component;
    fn unwrap_ref(component: &Component) -> Option<&Self>;
    fn unwrap_mut(component: &mut Component) -> Option<&mut Self>;
    fn unwrap_owned(component: Component) -> Option<Self>;
}

macro_rules! component_data {
    ($($ty:ident),+ $(,)?) => {
        $(
            impl ComponentData for $ty {
                const KIND: ComponentKind = ComponentKind::$ty;

                fn wrap(self) -> Component {
                    Component::$ty(self)
                }

                fn unwrap_ref(component: &Component) -> Option<&Self> {
                    match component {
                        Component::$ty(value) => Some(value),
                        _ => None,
                    }
                }

                fn unwrap_mut(component: &mut Component) -> Option<&mut Self> {
                    match component {
                        Component::$ty(value) => Some(value),
                        _ => None,
                    }
                }

                fn unwrap_owned(component: Component) -> Option<Self> {
                    match component {
                        Component::$ty(value) => Some(value),
                        _ => None,
                    }
                }
            }
        )+
    };
}

component_data!(
    Transform, Velocity, Health, Weapon, Sprite, NetworkId, Control, Projectile, Pickup, Stats,
);

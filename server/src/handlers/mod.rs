//! Per-domain listeners. Each module owns the rules for one entity kind and
//! exposes its listeners as `const` registrations for the router.

pub mod asteroid;
pub mod pickup;
pub mod player;
pub mod projectile;

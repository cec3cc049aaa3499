//! Clamped health values and the id-keyed health table used for every
//! entity kind.

use crate::DEFAULT_MAX_HEALTH;
use std::collections::HashMap;

/// Current/max health pair. `current` always stays within `[0, max]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Health {
    current: f32,
    max: f32,
}

impl Health {
    /// Full health with the given maximum.
    pub fn new(max: f32) -> Self {
        let max = sanitize(max);
        Self { current: max, max }
    }

    pub fn with_current(current: f32, max: f32) -> Self {
        let max = sanitize(max);
        Self {
            current: sanitize(current).min(max),
            max,
        }
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    /// Subtracts `amount`, stopping at zero. Returns the new value.
    pub fn damage(&mut self, amount: f32) -> f32 {
        self.current = (self.current - sanitize(amount)).max(0.0);
        self.current
    }

    /// Adds `amount`, stopping at `max`. Returns the new value.
    pub fn heal(&mut self, amount: f32) -> f32 {
        self.current = (self.current + sanitize(amount)).min(self.max);
        self.current
    }

    pub fn set(&mut self, current: f32) {
        self.current = sanitize(current).min(self.max);
    }

    pub fn set_max(&mut self, max: f32) {
        self.max = sanitize(max);
        self.current = self.current.min(self.max);
    }

    pub fn is_dead(&self) -> bool {
        self.current <= 0.0
    }
}

impl Default for Health {
    fn default() -> Self {
        Health::new(DEFAULT_MAX_HEALTH)
    }
}

// Negative and NaN amounts collapse to zero.
fn sanitize(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.max(0.0)
    }
}

/// Health for any entity kind, keyed by network id.
///
/// Unknown ids read as `0 / 0` and are therefore dead; damaging or healing an
/// unknown id is a no-op.
#[derive(Debug, Clone, Default)]
pub struct HealthMap {
    entries: HashMap<String, Health>,
}

impl HealthMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts tracking `id` at full health.
    pub fn track(&mut self, id: impl Into<String>, max: f32) {
        self.entries.insert(id.into(), Health::new(max));
    }

    pub fn insert(&mut self, id: impl Into<String>, health: Health) {
        self.entries.insert(id.into(), health);
    }

    pub fn get(&self, id: &str) -> Option<Health> {
        self.entries.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn damage(&mut self, id: &str, amount: f32) -> f32 {
        self.entries
            .get_mut(id)
            .map(|health| health.damage(amount))
            .unwrap_or(0.0)
    }

    pub fn heal(&mut self, id: &str, amount: f32) -> f32 {
        self.entries
            .get_mut(id)
            .map(|health| health.heal(amount))
            .unwrap_or(0.0)
    }

    pub fn current(&self, id: &str) -> f32 {
        self.entries.get(id).map(Health::current).unwrap_or(0.0)
    }

    pub fn max(&self, id: &str) -> f32 {
        self.entries.get(id).map(Health::max).unwrap_or(0.0)
    }

    pub fn is_dead(&self, id: &str) -> bool {
        self.current(id) <= 0.0
    }

    pub fn remove(&mut self, id: &str) -> Option<Health> {
        self.entries.remove(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

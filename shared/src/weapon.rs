//! Weapon model: per-kind ammunition with clamped counts and a fire cooldown.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AmmoKind {
    Bullet,
    Rocket,
    Mine,
}

/// Static tuning for one ammunition kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmmoSpec {
    pub max: u32,
    pub start: u32,
    pub speed: f32,
    pub damage: f32,
}

impl AmmoKind {
    pub const ALL: [AmmoKind; 3] = [AmmoKind::Bullet, AmmoKind::Rocket, AmmoKind::Mine];

    pub const fn spec(self) -> AmmoSpec {
        match self {
            AmmoKind::Bullet => AmmoSpec {
                max: 100,
                start: 50,
                speed: 600.0,
                damage: 10.0,
            },
            AmmoKind::Rocket => AmmoSpec {
                max: 10,
                start: 3,
                speed: 350.0,
                damage: 35.0,
            },
            AmmoKind::Mine => AmmoSpec {
                max: 5,
                start: 2,
                speed: 0.0,
                damage: 50.0,
            },
        }
    }

    const fn index(self) -> usize {
        match self {
            AmmoKind::Bullet => 0,
            AmmoKind::Rocket => 1,
            AmmoKind::Mine => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            AmmoKind::Bullet => "bullet",
            AmmoKind::Rocket => "rocket",
            AmmoKind::Mine => "mine",
        }
    }
}

pub const FIRE_INTERVAL_SECS: f32 = 0.25;

/// A ship's weapon. Counts for each kind are independent; the selected kind
/// only decides which counter `fire` draws from.
#[derive(Debug, Clone, PartialEq)]
pub struct Weapon {
    selected: AmmoKind,
    counts: [u32; 3],
    fire_interval: f32,
    cooldown: f32,
}

impl Weapon {
    pub fn new() -> Self {
        Self {
            selected: AmmoKind::Bullet,
            counts: AmmoKind::ALL.map(|kind| kind.spec().start),
            fire_interval: FIRE_INTERVAL_SECS,
            cooldown: 0.0,
        }
    }

    pub fn with_fire_interval(mut self, seconds: f32) -> Self {
        self.fire_interval = seconds.max(0.0);
        self
    }

    pub fn selected(&self) -> AmmoKind {
        self.selected
    }

    pub fn select(&mut self, kind: AmmoKind) {
        self.selected = kind;
    }

    pub fn ammo(&self, kind: AmmoKind) -> u32 {
        self.counts[kind.index()]
    }

    pub fn max_ammo(&self, kind: AmmoKind) -> u32 {
        kind.spec().max
    }

    /// Adds ammunition of `kind`, never exceeding its maximum. Returns the new count.
    pub fn add_ammo(&mut self, kind: AmmoKind, amount: u32) -> u32 {
        let slot = &mut self.counts[kind.index()];
        *slot = slot.saturating_add(amount).min(kind.spec().max);
        *slot
    }

    /// Overwrites the count for `kind`, clamped to its maximum.
    pub fn set_ammo(&mut self, kind: AmmoKind, count: u32) {
        self.counts[kind.index()] = count.min(kind.spec().max);
    }

    /// Takes one round of `kind`. False (and no change) when empty.
    pub fn try_consume(&mut self, kind: AmmoKind) -> bool {
        let slot = &mut self.counts[kind.index()];
        if *slot == 0 {
            return false;
        }
        *slot -= 1;
        true
    }

    pub fn cool(&mut self, dt: f32) {
        self.cooldown = (self.cooldown - dt).max(0.0);
    }

    pub fn ready(&self) -> bool {
        self.cooldown <= 0.0
    }

    /// Fires the selected kind if the cooldown has elapsed and ammo remains.
    pub fn fire(&mut self) -> Option<AmmoKind> {
        if !self.ready() {
            return None;
        }
        let kind = self.selected;
        if !self.try_consume(kind) {
            return None;
        }
        self.cooldown = self.fire_interval;
        Some(kind)
    }

    pub fn speed(&self, kind: AmmoKind) -> f32 {
        kind.spec().speed
    }

    pub fn damage(&self, kind: AmmoKind) -> f32 {
        kind.spec().damage
    }

    pub fn counts(&self) -> BTreeMap<AmmoKind, u32> {
        AmmoKind::ALL
            .iter()
            .map(|kind| (*kind, self.ammo(*kind)))
            .collect()
    }
}

impl Default for Weapon {
    fn default() -> Self {
        Self::new()
    }
}

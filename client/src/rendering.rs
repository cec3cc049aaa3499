//! Rendering and HUD collaborators.
//!
//! The core only hands sprite keys and positions to a [`Renderer`] and keeps
//! the returned [`Visual`] handle on the entity. [`HeadlessRenderer`] and
//! [`LogHud`] stand in when there is no window, which is how the bot client
//! and the tests run.

use arena_shared::AmmoKind;
use log::debug;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Opaque handle to something drawn on screen.
pub trait Visual: Send {
    fn reposition(&mut self, x: f32, y: f32, rotation: f32);

    /// Removes the visual. Calling it twice must be harmless.
    fn destroy(&mut self);
}

pub trait Renderer: Send {
    fn spawn(&mut self, key: &str, x: f32, y: f32, rotation: f32) -> Box<dyn Visual>;
}

/// Scalar HUD updates for the local player.
pub trait Hud: Send {
    fn score(&mut self, score: u32);
    fn ammo(&mut self, kind: AmmoKind, count: u32);
    fn level(&mut self, level: u8);
    fn health(&mut self, current: f32, max: f32);
}

/// Counters shared between a [`HeadlessRenderer`] and its visuals.
#[derive(Debug, Default)]
pub struct RenderStats {
    spawned: AtomicUsize,
    destroyed: AtomicUsize,
    repositioned: AtomicUsize,
}

impl RenderStats {
    pub fn spawned(&self) -> usize {
        self.spawned.load(Ordering::Relaxed)
    }

    pub fn destroyed(&self) -> usize {
        self.destroyed.load(Ordering::Relaxed)
    }

    pub fn repositioned(&self) -> usize {
        self.repositioned.load(Ordering::Relaxed)
    }

    /// Visuals spawned and not yet destroyed.
    pub fn live(&self) -> usize {
        self.spawned().saturating_sub(self.destroyed())
    }
}

/// Renderer that draws nothing and counts what it was asked to do.
#[derive(Debug, Default)]
pub struct HeadlessRenderer {
    stats: Arc<RenderStats>,
}

impl HeadlessRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> Arc<RenderStats> {
        Arc::clone(&self.stats)
    }
}

impl Renderer for HeadlessRenderer {
    fn spawn(&mut self, key: &str, x: f32, y: f32, rotation: f32) -> Box<dyn Visual> {
        self.stats.spawned.fetch_add(1, Ordering::Relaxed);
        Box::new(HeadlessVisual {
            key: key.to_string(),
            position: (x, y, rotation),
            destroyed: false,
            stats: Arc::clone(&self.stats),
        })
    }
}

#[derive(Debug)]
struct HeadlessVisual {
    key: String,
    position: (f32, f32, f32),
    destroyed: bool,
    stats: Arc<RenderStats>,
}

impl Visual for HeadlessVisual {
    fn reposition(&mut self, x: f32, y: f32, rotation: f32) {
        if self.destroyed {
            return;
        }
        self.position = (x, y, rotation);
        self.stats.repositioned.fetch_add(1, Ordering::Relaxed);
    }

    fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        self.stats.destroyed.fetch_add(1, Ordering::Relaxed);
        debug!("Destroyed visual {} at {:?}", self.key, self.position);
    }
}

/// Last values pushed to a HUD.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HudSnapshot {
    pub score: u32,
    pub level: u8,
    pub health: (f32, f32),
    pub ammo: Vec<(AmmoKind, u32)>,
}

/// HUD that logs every update at debug level and remembers the latest values.
#[derive(Debug, Default)]
pub struct LogHud {
    snapshot: HudSnapshot,
}

impl LogHud {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> &HudSnapshot {
        &self.snapshot
    }
}

impl Hud for LogHud {
    fn score(&mut self, score: u32) {
        debug!("HUD score {}", score);
        self.snapshot.score = score;
    }

    fn ammo(&mut self, kind: AmmoKind, count: u32) {
        debug!("HUD {} ammo {}", kind.name(), count);
        match self.snapshot.ammo.iter_mut().find(|(k, _)| *k == kind) {
            Some(slot) => slot.1 = count,
            None => self.snapshot.ammo.push((kind, count)),
        }
    }

    fn level(&mut self, level: u8) {
        debug!("HUD level {}", level);
        self.snapshot.level = level;
    }

    fn health(&mut self, current: f32, max: f32) {
        debug!("HUD health {:.0}/{:.0}", current, max);
        self.snapshot.health = (current, max);
    }
}

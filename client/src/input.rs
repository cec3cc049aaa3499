//! Per-tick control input for the local ship.

use arena_shared::AmmoKind;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;

/// What the local player asked for during one tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ControlInput {
    /// Turn direction in `[-1, 1]`; positive turns clockwise.
    pub rotation: f32,
    pub thrust: bool,
    pub brake: bool,
    pub trigger: bool,
    /// Ammo kind to switch to before firing.
    pub select: Option<AmmoKind>,
}

/// Source of local input, polled once per tick.
pub trait InputSource: Send {
    fn poll(&mut self, dt: f32) -> ControlInput;
}

/// Replays a fixed list of inputs, then repeats the fallback forever.
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    steps: VecDeque<ControlInput>,
    fallback: ControlInput,
}

impl ScriptedInput {
    pub fn new(steps: impl IntoIterator<Item = ControlInput>) -> Self {
        Self {
            steps: steps.into_iter().collect(),
            fallback: ControlInput::default(),
        }
    }

    pub fn with_fallback(mut self, fallback: ControlInput) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn remaining(&self) -> usize {
        self.steps.len()
    }
}

impl InputSource for ScriptedInput {
    fn poll(&mut self, _dt: f32) -> ControlInput {
        self.steps.pop_front().unwrap_or(self.fallback)
    }
}

/// Bot pilot: keeps a heading for a while, then picks a new one, firing
/// whenever its trigger timer allows.
#[derive(Debug, Clone)]
pub struct WanderInput {
    rng: StdRng,
    heading_timer: f32,
    rotation: f32,
    fire_chance: f64,
}

impl WanderInput {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng,
            heading_timer: 0.0,
            rotation: 0.0,
            fire_chance: 0.2,
        }
    }
}

impl InputSource for WanderInput {
    fn poll(&mut self, dt: f32) -> ControlInput {
        self.heading_timer -= dt;
        if self.heading_timer <= 0.0 {
            self.heading_timer = self.rng.gen_range(0.5..2.0);
            self.rotation = self.rng.gen_range(-1.0..=1.0);
        }

        let select = if self.rng.gen_bool(0.01) {
            Some(AmmoKind::ALL[self.rng.gen_range(0..AmmoKind::ALL.len())])
        } else {
            None
        };

        ControlInput {
            rotation: self.rotation,
            thrust: self.rng.gen_bool(0.7),
            brake: false,
            trigger: self.rng.gen_bool(self.fire_chance),
            select,
        }
    }
}

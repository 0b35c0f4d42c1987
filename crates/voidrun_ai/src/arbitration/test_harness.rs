//! Test-only env builder for driving single behaviors.

use bevy::prelude::*;
use rand::SeedableRng;

use crate::context::SituationalContext;
use crate::spatial::{SpatialFrame, SpatialSnapshot};

use super::{AgentRng, BehaviorEnv, CooldownLedger};

pub struct Harness {
    pub snapshot: SpatialSnapshot,
    pub rng: AgentRng,
    pub cooldowns: CooldownLedger,
}

impl Harness {
    pub fn new(seed: u64) -> Self {
        Self {
            snapshot: SpatialSnapshot::new(),
            rng: AgentRng::seed_from_u64(seed),
            cooldowns: CooldownLedger::new(),
        }
    }

    pub fn env(&mut self, dt: f32) -> BehaviorEnv<'_> {
        BehaviorEnv {
            spatial: &self.snapshot,
            rng: &mut self.rng,
            cooldowns: &mut self.cooldowns,
            dt,
        }
    }
}

pub fn entity(index: u32) -> Entity {
    Entity::from_raw(index)
}

/// Agent #1 (faction 1) at `position`, facing -Z.
pub fn context_at(position: Vec3) -> SituationalContext {
    SituationalContext::new(entity(1), 1, SpatialFrame::from_translation(position))
}

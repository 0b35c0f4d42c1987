//! Combat layer: attack state machines, no fallback.

use std::sync::Arc;

use bevy::prelude::*;

use crate::combat::{MeleeAttackBehavior, RangedAttackBehavior};
use crate::context::SituationalContext;
use crate::settings::AgentSettings;
use crate::spatial::SpatialQuery;

use super::{AgentRng, Behavior, BehaviorEnv, BehaviorId, BehaviorPool, CooldownLedger};

/// Request to hurt a damageable actor (resolved by the host).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageRequest {
    pub source: Entity,
    pub target: Entity,
    pub amount: u32,
    /// Physical impulse (zero: без отбрасывания)
    pub knockback: Vec3,
}

/// Projectile the host must spawn and advance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectileSpawn {
    pub owner: Entity,
    pub position: Vec3,
    /// Unit flight direction
    pub direction: Vec3,
    pub speed: f32,
    pub damage: u32,
    pub radius: f32,
    pub lifetime: f32,
}

/// Side effects produced by one combat tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CombatEffects {
    pub damage: Vec<DamageRequest>,
    pub projectiles: Vec<ProjectileSpawn>,
}

impl CombatEffects {
    pub fn is_empty(&self) -> bool {
        self.damage.is_empty() && self.projectiles.is_empty()
    }
}

/// Attack strategy: a small state machine advanced by `execute`.
pub trait CombatBehavior: Behavior {
    fn execute(
        &mut self,
        ctx: &mut SituationalContext,
        env: &mut BehaviorEnv<'_>,
        effects: &mut CombatEffects,
    );

    /// Committed action: movement must not run this tick.
    fn is_action_in_progress(&self) -> bool;
}

pub struct CombatArbitrator {
    pool: BehaviorPool<dyn CombatBehavior>,
}

impl Default for CombatArbitrator {
    fn default() -> Self {
        Self::new()
    }
}

impl CombatArbitrator {
    pub fn new() -> Self {
        Self {
            pool: BehaviorPool::new("combat"),
        }
    }

    /// Melee, then ranged.
    pub fn with_default_behaviors(settings: Arc<AgentSettings>) -> Self {
        let mut arbitrator = Self::new();
        let (melee_weight, ranged_weight) = (settings.combat.melee_weight, settings.combat.ranged_weight);

        arbitrator.register(Box::new(MeleeAttackBehavior::new(settings.clone())), melee_weight);
        arbitrator.register(Box::new(RangedAttackBehavior::new(settings)), ranged_weight);
        arbitrator
    }

    pub fn register(&mut self, behavior: Box<dyn CombatBehavior>, weight: f32) {
        self.pool.register(behavior, weight);
    }

    pub fn set_weight(&mut self, id: BehaviorId, weight: f32) {
        self.pool.set_weight(id, weight);
    }

    pub fn current_id(&self) -> Option<BehaviorId> {
        self.pool.current_id()
    }

    pub fn behavior(&self, id: BehaviorId) -> Option<&dyn CombatBehavior> {
        self.pool.behavior(id)
    }

    pub fn behavior_ids(&self) -> Vec<BehaviorId> {
        self.pool.ids()
    }

    pub fn cooldowns(&self) -> &CooldownLedger {
        self.pool.cooldowns()
    }

    pub fn is_action_in_progress(&self) -> bool {
        self.pool
            .current()
            .is_some_and(|behavior| behavior.is_action_in_progress())
    }

    /// Select → transition → execute. Nothing eligible → nothing happens.
    pub fn tick(
        &mut self,
        ctx: &mut SituationalContext,
        spatial: &dyn SpatialQuery,
        rng: &mut AgentRng,
        dt: f32,
    ) -> CombatEffects {
        let mut effects = CombatEffects::default();

        if self.pool.arbitrate(ctx, spatial, rng, dt).is_none() {
            return effects;
        }

        self.pool.with_current(spatial, rng, dt, |behavior, env| {
            behavior.execute(ctx, env, &mut effects);
        });

        effects
    }
}

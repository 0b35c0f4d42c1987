//! Movement layer: pool of steering behaviors + physical integration.

use std::sync::Arc;

use bevy::prelude::*;

use crate::context::SituationalContext;
use crate::movement::{
    CombatRepositioningBehavior, DashBehavior, DodgeBehavior, FormationBehavior, PatrolBehavior,
};
use crate::settings::AgentSettings;
use crate::spatial::SpatialQuery;
use crate::steering::{flat_direction, yaw_towards};

use super::{AgentRng, Behavior, BehaviorEnv, BehaviorId, BehaviorPool, CooldownLedger};

/// Steering strategy: produces a desired ground-plane direction.
pub trait MovementBehavior: Behavior {
    /// Desired direction this tick (zero = stay in place).
    fn calculate_direction(&mut self, ctx: &SituationalContext, env: &mut BehaviorEnv<'_>) -> Vec3;

    /// Scales `move_speed` for the integrated velocity.
    fn speed_multiplier(&self) -> f32 {
        1.0
    }
}

/// Result of one movement tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementOutput {
    pub behavior: Option<BehaviorId>,
    /// Flat unit direction or zero
    pub direction: Vec3,
    pub velocity: Vec3,
}

impl Default for MovementOutput {
    fn default() -> Self {
        Self {
            behavior: None,
            direction: Vec3::ZERO,
            velocity: Vec3::ZERO,
        }
    }
}

pub struct MovementArbitrator {
    pool: BehaviorPool<dyn MovementBehavior>,
    move_speed: f32,
    rotation_speed: f32,
}

impl MovementArbitrator {
    /// Empty pool, no fallback.
    pub fn new(move_speed: f32, rotation_speed: f32) -> Self {
        Self {
            pool: BehaviorPool::new("movement"),
            move_speed,
            rotation_speed,
        }
    }

    /// Standard pool; combat repositioning doubles as the fallback.
    pub fn with_default_behaviors(settings: Arc<AgentSettings>) -> Self {
        let movement = &settings.movement;
        let mut arbitrator = Self::new(movement.move_speed, movement.rotation_speed);

        arbitrator.register(
            Box::new(CombatRepositioningBehavior::new(settings.clone())),
            movement.combat_weight,
        );
        arbitrator.register(Box::new(DashBehavior::new(settings.clone())), movement.dash_weight);
        arbitrator.register(Box::new(DodgeBehavior::new(settings.clone())), movement.dodge_weight);
        arbitrator.register(
            Box::new(FormationBehavior::new(settings.clone())),
            movement.formation_weight,
        );
        arbitrator.register(Box::new(PatrolBehavior::new(settings.clone())), movement.patrol_weight);
        arbitrator.set_fallback(Some(BehaviorId::CombatRepositioning));

        arbitrator
    }

    pub fn register(&mut self, behavior: Box<dyn MovementBehavior>, weight: f32) {
        self.pool.register(behavior, weight);
    }

    pub fn set_fallback(&mut self, id: Option<BehaviorId>) {
        self.pool.set_fallback(id);
    }

    pub fn set_weight(&mut self, id: BehaviorId, weight: f32) {
        self.pool.set_weight(id, weight);
    }

    pub fn current_id(&self) -> Option<BehaviorId> {
        self.pool.current_id()
    }

    pub fn behavior(&self, id: BehaviorId) -> Option<&dyn MovementBehavior> {
        self.pool.behavior(id)
    }

    pub fn behavior_ids(&self) -> Vec<BehaviorId> {
        self.pool.ids()
    }

    pub fn cooldowns(&self) -> &CooldownLedger {
        self.pool.cooldowns()
    }

    pub fn cooldowns_mut(&mut self) -> &mut CooldownLedger {
        self.pool.cooldowns_mut()
    }

    /// Select → transition → direction → integrate position and yaw.
    pub fn tick(
        &mut self,
        ctx: &mut SituationalContext,
        spatial: &dyn SpatialQuery,
        rng: &mut AgentRng,
        dt: f32,
    ) -> MovementOutput {
        self.pool.arbitrate(ctx, spatial, rng, dt);

        let snapshot: &SituationalContext = ctx;
        let Some((raw_direction, multiplier)) = self.pool.with_current(spatial, rng, dt, |behavior, env| {
            (behavior.calculate_direction(snapshot, env), behavior.speed_multiplier())
        }) else {
            ctx.current_velocity = Vec3::ZERO;
            return MovementOutput::default();
        };

        // Вырожденное направление → стоим на месте
        let direction = flat_direction(raw_direction).unwrap_or(Vec3::ZERO);
        let velocity = direction * self.move_speed * multiplier;

        ctx.frame.position += velocity * dt;
        if let Some(target_rotation) = yaw_towards(direction) {
            let t = (self.rotation_speed * dt).clamp(0.0, 1.0);
            ctx.frame.rotation = ctx.frame.rotation.slerp(target_rotation, t);
            ctx.current_direction = direction;
        }
        ctx.current_velocity = velocity;
        ctx.refresh_distance();

        MovementOutput {
            behavior: self.pool.current_id(),
            direction,
            velocity,
        }
    }
}

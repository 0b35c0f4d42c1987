//! Dash: короткий рывок по прямой к цели.
//!
//! Направление фиксируется в `initialize` и не меняется до конца рывка,
//! даже если цель сместилась. Cooldown ставится в момент старта.

use std::sync::Arc;

use bevy::prelude::*;
use rand::Rng;

use crate::arbitration::{Behavior, BehaviorEnv, BehaviorId, MovementBehavior};
use crate::context::SituationalContext;
use crate::settings::AgentSettings;
use crate::spatial::MASK_OCCLUDERS;

/// Fraction of the target distance that must be clear of obstacles.
const CLEARANCE_FRACTION: f32 = 0.8;

pub struct DashBehavior {
    settings: Arc<AgentSettings>,
    locked_direction: Vec3,
    remaining: f32,
    boosting: bool,
}

impl DashBehavior {
    pub fn new(settings: Arc<AgentSettings>) -> Self {
        Self {
            settings,
            locked_direction: Vec3::ZERO,
            remaining: 0.0,
            boosting: false,
        }
    }

    pub fn is_dashing(&self) -> bool {
        self.remaining > 0.0
    }

    pub fn locked_direction(&self) -> Vec3 {
        self.locked_direction
    }
}

impl Behavior for DashBehavior {
    fn id(&self) -> BehaviorId {
        BehaviorId::Dash
    }

    fn suitability(&mut self, ctx: &SituationalContext, env: &mut BehaviorEnv<'_>) -> f32 {
        if self.is_dashing() {
            return 0.9;
        }

        let movement = &self.settings.movement;
        let distance = ctx.distance_to_target;
        let Some(direction) = ctx.direction_to_target() else {
            return 0.1;
        };
        if distance < movement.dash_min_distance || distance > movement.dash_max_distance {
            return 0.1;
        }

        let blocked = env.spatial.raycast_occluded(
            ctx.position(),
            direction,
            distance * CLEARANCE_FRACTION,
            MASK_OCCLUDERS,
        );
        if blocked {
            return 0.1;
        }

        // Вероятностный gate, рывок редкое событие
        if env.rng.gen::<f32>() < movement.dash_probability {
            0.85
        } else {
            0.1
        }
    }

    fn initialize(&mut self, ctx: &SituationalContext, env: &mut BehaviorEnv<'_>) {
        let movement = &self.settings.movement;
        self.locked_direction = ctx
            .direction_to_target()
            .unwrap_or_else(|| ctx.fallback_heading());
        self.remaining = movement.dash_duration;
        self.boosting = false;
        env.cooldowns.set(BehaviorId::Dash, movement.dash_cooldown);
    }

    fn cleanup(&mut self, _ctx: &SituationalContext, _env: &mut BehaviorEnv<'_>) {
        self.remaining = 0.0;
        self.boosting = false;
    }

    fn is_committed(&self) -> bool {
        self.is_dashing()
    }
}

impl MovementBehavior for DashBehavior {
    fn calculate_direction(&mut self, ctx: &SituationalContext, env: &mut BehaviorEnv<'_>) -> Vec3 {
        if self.is_dashing() {
            self.remaining -= env.dt;
            self.boosting = true;
            return self.locked_direction;
        }

        self.boosting = false;
        ctx.direction_to_target()
            .unwrap_or_else(|| ctx.fallback_heading())
    }

    fn speed_multiplier(&self) -> f32 {
        if self.boosting {
            self.settings.movement.dash_speed_multiplier
        } else {
            1.0
        }
    }
}

//! Dodge: уклонение от самой опасной угрозы.
//!
//! Evasion = перпендикуляр к направлению угрозы (сторона случайна)
//! минус backward bias вдоль угрозы. Держится `dodge_duration`, потом
//! behavior отдаёт прямое направление к цели (или последний heading).

use std::sync::Arc;

use bevy::prelude::*;
use rand::Rng;

use crate::arbitration::{Behavior, BehaviorEnv, BehaviorId, MovementBehavior};
use crate::context::SituationalContext;
use crate::settings::AgentSettings;
use crate::steering::{flat_direction, flat_direction_or, tangent};

pub struct DodgeBehavior {
    settings: Arc<AgentSettings>,
    evade_direction: Vec3,
    remaining: f32,
    boosting: bool,
}

impl DodgeBehavior {
    pub fn new(settings: Arc<AgentSettings>) -> Self {
        Self {
            settings,
            evade_direction: Vec3::ZERO,
            remaining: 0.0,
            boosting: false,
        }
    }

    pub fn is_dodging(&self) -> bool {
        self.remaining > 0.0
    }

    pub fn evade_direction(&self) -> Vec3 {
        self.evade_direction
    }

    /// Perpendicular to `threat_direction` on `side`, pulled away from the threat.
    pub fn evasion(threat_direction: Vec3, side: f32, backward_bias: f32) -> Vec3 {
        let perpendicular = tangent(threat_direction) * side;
        flat_direction_or(perpendicular - threat_direction * backward_bias, perpendicular)
    }
}

impl Behavior for DodgeBehavior {
    fn id(&self) -> BehaviorId {
        BehaviorId::Dodge
    }

    fn suitability(&mut self, ctx: &SituationalContext, _env: &mut BehaviorEnv<'_>) -> f32 {
        if self.is_dodging() {
            return 0.95;
        }
        0.9 * ctx.max_danger()
    }

    fn initialize(&mut self, ctx: &SituationalContext, env: &mut BehaviorEnv<'_>) {
        let movement = &self.settings.movement;

        let threat_direction = ctx
            .most_dangerous_threat()
            .and_then(|threat| flat_direction(threat.direction));

        self.evade_direction = match threat_direction {
            Some(direction) => {
                let side = if env.rng.gen::<bool>() { 1.0 } else { -1.0 };
                Self::evasion(direction, side, movement.dodge_backward_bias)
            }
            // Угроза исчезла между sensing и стартом → просто назад
            None => -ctx.fallback_heading(),
        };
        self.remaining = movement.dodge_duration;
        self.boosting = false;
        env.cooldowns.set(BehaviorId::Dodge, movement.dodge_cooldown);
    }

    fn cleanup(&mut self, _ctx: &SituationalContext, _env: &mut BehaviorEnv<'_>) {
        self.remaining = 0.0;
        self.boosting = false;
    }

    fn is_committed(&self) -> bool {
        self.is_dodging()
    }
}

impl MovementBehavior for DodgeBehavior {
    fn calculate_direction(&mut self, ctx: &SituationalContext, env: &mut BehaviorEnv<'_>) -> Vec3 {
        if self.is_dodging() {
            self.remaining -= env.dt;
            self.boosting = true;
            return self.evade_direction;
        }

        self.boosting = false;
        ctx.direction_to_target()
            .unwrap_or_else(|| ctx.fallback_heading())
    }

    fn speed_multiplier(&self) -> f32 {
        if self.boosting {
            self.settings.movement.dodge_speed_multiplier
        } else {
            1.0
        }
    }
}

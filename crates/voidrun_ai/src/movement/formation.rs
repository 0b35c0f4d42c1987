//! Formation (flocking): cohesion + alignment + separation.

use std::sync::Arc;

use bevy::prelude::*;

use crate::arbitration::{Behavior, BehaviorEnv, BehaviorId, MovementBehavior};
use crate::context::SituationalContext;
use crate::settings::AgentSettings;
use crate::steering::{flat, flat_direction, flat_direction_or, EPSILON};

/// Minimum allies for a formation to make sense.
const MIN_ALLIES: usize = 2;

pub struct FormationBehavior {
    settings: Arc<AgentSettings>,
}

impl FormationBehavior {
    pub fn new(settings: Arc<AgentSettings>) -> Self {
        Self { settings }
    }

    /// Normalized flocking vector (zero without allies).
    pub fn flocking(&self, ctx: &SituationalContext) -> Vec3 {
        let movement = &self.settings.movement;
        if ctx.allies.is_empty() {
            return Vec3::ZERO;
        }

        let position = ctx.position();
        let count = ctx.allies.len() as f32;

        let centroid = ctx.allies.iter().map(|ally| ally.position).sum::<Vec3>() / count;
        let cohesion = flat_direction(centroid - position).unwrap_or(Vec3::ZERO);

        let heading_sum: Vec3 = ctx.allies.iter().map(|ally| ally.heading).sum();
        let alignment = flat_direction(heading_sum).unwrap_or(Vec3::ZERO);

        // Inverse-distance: чем ближе союзник, тем сильнее отталкивание
        let separation: Vec3 = ctx
            .allies
            .iter()
            .filter_map(|ally| {
                let away = flat(position - ally.position);
                let distance = away.length();
                (distance > EPSILON && distance < movement.formation_spacing)
                    .then(|| away / (distance * distance))
            })
            .sum();

        let blend = cohesion * movement.cohesion_weight
            + alignment * movement.alignment_weight
            + separation * movement.separation_weight;
        flat_direction(blend).unwrap_or(Vec3::ZERO)
    }
}

impl Behavior for FormationBehavior {
    fn id(&self) -> BehaviorId {
        BehaviorId::Formation
    }

    fn suitability(&mut self, ctx: &SituationalContext, _env: &mut BehaviorEnv<'_>) -> f32 {
        if ctx.allies.len() >= MIN_ALLIES {
            0.6
        } else {
            0.2
        }
    }

    fn initialize(&mut self, _ctx: &SituationalContext, _env: &mut BehaviorEnv<'_>) {}
}

impl MovementBehavior for FormationBehavior {
    fn calculate_direction(&mut self, ctx: &SituationalContext, _env: &mut BehaviorEnv<'_>) -> Vec3 {
        let flock = self.flocking(ctx);

        match ctx.direction_to_target() {
            Some(to_target) => {
                let weight = self.settings.movement.formation_target_blend;
                flat_direction_or(flock * (1.0 - weight) + to_target * weight, flock)
            }
            None => flock,
        }
    }
}

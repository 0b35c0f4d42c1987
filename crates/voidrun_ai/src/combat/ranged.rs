//! Ranged attack: Idle → Charging → Firing → Cooldown.
//!
//! Требования для выбора: цель в ranged range, НЕ в melee range (scratch),
//! чистая линия огня (ray против всего, кроме категории цели).
//! Предпочтительная дистанция: peak на `preferred_range_ratio × range`.

use std::sync::Arc;

use bevy::prelude::*;

use crate::arbitration::{
    Behavior, BehaviorEnv, BehaviorId, CombatBehavior, CombatEffects, ProjectileSpawn,
};
use crate::context::{SituationalContext, TargetRef};
use crate::logger;
use crate::settings::AgentSettings;
use crate::spatial::MASK_ALL;
use crate::steering::{peak, yaw_towards};

/// Lead the target: `q + v × (|q − p| / s)`.
///
/// Non-positive projectile speed → no lead.
pub fn predict_aim_point(shooter: Vec3, target: Vec3, target_velocity: Vec3, projectile_speed: f32) -> Vec3 {
    if projectile_speed <= 0.0 {
        return target;
    }
    let flight_time = (target - shooter).length() / projectile_speed;
    target + target_velocity * flight_time
}

/// Ranged attack phase.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub enum RangedPhase {
    Idle,
    Charging { remaining: f32 },
    Firing { remaining: f32 },
    Cooldown { ready_at: f32 },
}

pub struct RangedAttackBehavior {
    settings: Arc<AgentSettings>,
    phase: RangedPhase,
}

impl RangedAttackBehavior {
    pub fn new(settings: Arc<AgentSettings>) -> Self {
        Self {
            settings,
            phase: RangedPhase::Idle,
        }
    }

    pub fn phase(&self) -> RangedPhase {
        self.phase
    }

    fn is_busy(&self) -> bool {
        matches!(self.phase, RangedPhase::Charging { .. } | RangedPhase::Firing { .. })
    }

    fn is_ready(&self, clock: f32) -> bool {
        match self.phase {
            RangedPhase::Idle => true,
            RangedPhase::Cooldown { ready_at } => clock >= ready_at,
            _ => false,
        }
    }

    /// Target in ranged band, outside melee band.
    fn in_firing_band(ctx: &SituationalContext) -> bool {
        ctx.has_target() && ctx.scratch.in_ranged_range && !ctx.scratch.in_melee_range
    }

    fn face(ctx: &mut SituationalContext, target: Vec3) {
        let offset = target - ctx.position();
        if let Some(rotation) = yaw_towards(offset) {
            ctx.frame.rotation = rotation;
        }
    }

    fn aim_point(&self, ctx: &SituationalContext, target: &TargetRef) -> Vec3 {
        match target.velocity {
            Some(velocity) => predict_aim_point(
                ctx.position(),
                target.position,
                velocity,
                self.settings.combat.projectile_speed,
            ),
            None => target.position,
        }
    }

    fn fire(&self, ctx: &SituationalContext, effects: &mut CombatEffects) -> bool {
        let Some(target) = ctx.target.as_ref() else {
            return false;
        };
        let combat = &self.settings.combat;
        let origin = ctx.position();
        let aim = self.aim_point(ctx, target);
        let direction = (aim - origin).normalize_or(ctx.frame.forward());

        effects.projectiles.push(ProjectileSpawn {
            owner: ctx.entity,
            position: origin,
            direction,
            speed: combat.projectile_speed,
            damage: combat.ranged_damage,
            radius: combat.projectile_radius,
            lifetime: combat.projectile_lifetime,
        });
        logger::log(&format!(
            "🏹 {:?} fired at {:?} (aim {:.2?})",
            ctx.entity, target.entity, aim
        ));
        true
    }
}

impl Behavior for RangedAttackBehavior {
    fn id(&self) -> BehaviorId {
        BehaviorId::RangedAttack
    }

    fn suitability(&mut self, ctx: &SituationalContext, env: &mut BehaviorEnv<'_>) -> f32 {
        if self.is_busy() {
            return 0.95;
        }
        if !self.is_ready(ctx.elapsed) {
            return 0.1;
        }
        let Some(target) = ctx.target.as_ref() else {
            return 0.0;
        };
        if !Self::in_firing_band(ctx) {
            return 0.1;
        }

        let origin = ctx.position();
        let distance = ctx.distance_to_target;
        let Some(direction) = (target.position - origin).try_normalize() else {
            return 0.1;
        };
        let occluders = MASK_ALL & !target.tag.layer();
        if env.spatial.raycast_occluded(origin, direction, distance, occluders) {
            return 0.1;
        }

        let combat = &self.settings.combat;
        let preferred = combat.preferred_range_ratio * combat.ranged_attack_range;
        0.4 + 0.5 * peak(distance, preferred, preferred)
    }

    fn initialize(&mut self, _ctx: &SituationalContext, _env: &mut BehaviorEnv<'_>) {
        if !matches!(self.phase, RangedPhase::Cooldown { .. }) {
            self.phase = RangedPhase::Idle;
        }
    }

    fn cleanup(&mut self, ctx: &SituationalContext, _env: &mut BehaviorEnv<'_>) {
        match self.phase {
            // Заряд прерван: выстрела не было
            RangedPhase::Charging { .. } => self.phase = RangedPhase::Idle,
            RangedPhase::Firing { .. } => {
                self.phase = RangedPhase::Cooldown {
                    ready_at: ctx.elapsed + self.settings.combat.ranged_cooldown,
                };
            }
            _ => {}
        }
    }
}

impl CombatBehavior for RangedAttackBehavior {
    fn execute(
        &mut self,
        ctx: &mut SituationalContext,
        env: &mut BehaviorEnv<'_>,
        effects: &mut CombatEffects,
    ) {
        let combat = &self.settings.combat;

        match self.phase {
            RangedPhase::Charging { remaining } => {
                let Some(target) = ctx.target.as_ref().map(|target| target.position) else {
                    // Цель пропала во время заряда
                    self.phase = RangedPhase::Idle;
                    return;
                };
                Self::face(ctx, target);

                let next = remaining - env.dt;
                if next > 0.0 {
                    self.phase = RangedPhase::Charging { remaining: next };
                } else if self.fire(ctx, effects) {
                    self.phase = RangedPhase::Firing {
                        remaining: combat.fire_delay,
                    };
                } else {
                    self.phase = RangedPhase::Idle;
                }
            }
            RangedPhase::Firing { remaining } => {
                let next = remaining - env.dt;
                self.phase = if next > 0.0 {
                    RangedPhase::Firing { remaining: next }
                } else {
                    RangedPhase::Cooldown {
                        ready_at: ctx.elapsed + combat.ranged_cooldown,
                    }
                };
            }
            _ if self.is_ready(ctx.elapsed) => {
                if !Self::in_firing_band(ctx) {
                    return;
                }
                if let Some(target) = ctx.target.as_ref().map(|target| target.position) {
                    Self::face(ctx, target);
                    self.phase = RangedPhase::Charging {
                        remaining: combat.charge_duration,
                    };
                }
            }
            _ => {}
        }
    }

    fn is_action_in_progress(&self) -> bool {
        self.is_busy()
    }
}

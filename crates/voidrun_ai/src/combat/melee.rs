//! Melee attack: Ready → Attacking → Cooldown.
//!
//! # Attack Flow
//!
//! ```text
//! target в melee range (scratch) → Attacking (поворот к цели, timer = duration)
//!   ↓
//! timer пересекает duration/2 → один area query перед агентом → DamageRequest × N
//!   ↓
//! timer ≤ 0 → Cooldown (ready_at = clock + melee_cooldown)
//! ```
//!
//! Cooldown хранится как абсолютный момент agent clock: он истекает,
//! даже пока behavior не текущий.

use std::sync::Arc;

use bevy::prelude::*;

use crate::arbitration::{
    Behavior, BehaviorEnv, BehaviorId, CombatBehavior, CombatEffects, DamageRequest,
};
use crate::context::SituationalContext;
use crate::logger;
use crate::settings::AgentSettings;
use crate::spatial::LAYER_AGENTS;
use crate::steering::{flat_direction, yaw_towards};

/// Melee attack phase.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub enum MeleePhase {
    Ready,
    Attacking {
        /// Seconds left in the swing
        remaining: f32,
        hit_applied: bool,
    },
    Cooldown {
        /// Agent clock time when the next swing is allowed
        ready_at: f32,
    },
}

pub struct MeleeAttackBehavior {
    settings: Arc<AgentSettings>,
    phase: MeleePhase,
}

impl MeleeAttackBehavior {
    pub fn new(settings: Arc<AgentSettings>) -> Self {
        Self {
            settings,
            phase: MeleePhase::Ready,
        }
    }

    pub fn phase(&self) -> MeleePhase {
        self.phase
    }

    pub fn is_attacking(&self) -> bool {
        matches!(self.phase, MeleePhase::Attacking { .. })
    }

    fn is_ready(&self, clock: f32) -> bool {
        match self.phase {
            MeleePhase::Ready => true,
            MeleePhase::Cooldown { ready_at } => clock >= ready_at,
            MeleePhase::Attacking { .. } => false,
        }
    }

    fn start_cooldown(&mut self, clock: f32) {
        self.phase = MeleePhase::Cooldown {
            ready_at: clock + self.settings.combat.melee_cooldown,
        };
    }

    /// One area query in front of the agent; every agent hit except self.
    fn strike(&self, ctx: &SituationalContext, env: &BehaviorEnv<'_>, effects: &mut CombatEffects) {
        let combat = &self.settings.combat;
        let forward = flat_direction(ctx.frame.forward()).unwrap_or(Vec3::NEG_Z);
        let center = ctx.position() + forward * combat.melee_hit_offset;

        let hits = env.spatial.query_nearby(
            center,
            combat.melee_hit_radius,
            LAYER_AGENTS,
            combat.max_query_results,
        );

        for hit in hits.into_iter().filter(|hit| hit.entity != ctx.entity) {
            let push = flat_direction(hit.frame.position - ctx.position()).unwrap_or(forward);
            effects.damage.push(DamageRequest {
                source: ctx.entity,
                target: hit.entity,
                amount: combat.melee_damage,
                knockback: push * combat.knockback_force,
            });
        }

        logger::log(&format!(
            "🗡️ {:?} melee hit: {} target(s)",
            ctx.entity,
            effects.damage.len()
        ));
    }
}

impl Behavior for MeleeAttackBehavior {
    fn id(&self) -> BehaviorId {
        BehaviorId::MeleeAttack
    }

    fn suitability(&mut self, ctx: &SituationalContext, _env: &mut BehaviorEnv<'_>) -> f32 {
        if self.is_attacking() {
            return 0.95;
        }
        if !self.is_ready(ctx.elapsed) {
            return 0.1;
        }
        if !ctx.has_target() {
            return 0.0;
        }
        if ctx.scratch.in_melee_range {
            0.9
        } else {
            0.2
        }
    }

    fn initialize(&mut self, _ctx: &SituationalContext, _env: &mut BehaviorEnv<'_>) {
        // Pending cooldown переживает смену behavior
        if !matches!(self.phase, MeleePhase::Cooldown { .. }) {
            self.phase = MeleePhase::Ready;
        }
    }

    fn cleanup(&mut self, ctx: &SituationalContext, _env: &mut BehaviorEnv<'_>) {
        if self.is_attacking() {
            self.start_cooldown(ctx.elapsed);
        }
    }
}

impl CombatBehavior for MeleeAttackBehavior {
    fn execute(
        &mut self,
        ctx: &mut SituationalContext,
        env: &mut BehaviorEnv<'_>,
        effects: &mut CombatEffects,
    ) {
        match self.phase {
            MeleePhase::Attacking {
                remaining,
                hit_applied,
            } => {
                let half = self.settings.combat.melee_attack_duration * 0.5;
                let next = remaining - env.dt;

                let crossed_midpoint = !hit_applied && remaining > half && next <= half;
                if crossed_midpoint {
                    self.strike(ctx, env, effects);
                }

                if next <= 0.0 {
                    self.start_cooldown(ctx.elapsed);
                } else {
                    self.phase = MeleePhase::Attacking {
                        remaining: next,
                        hit_applied: hit_applied || crossed_midpoint,
                    };
                }
            }
            _ if self.is_ready(ctx.elapsed) => {
                if !ctx.scratch.in_melee_range {
                    return;
                }
                let Some(direction) = ctx.direction_to_target() else {
                    return;
                };

                // Yaw-only разворот к цели в момент старта
                if let Some(rotation) = yaw_towards(direction) {
                    ctx.frame.rotation = rotation;
                    ctx.current_direction = direction;
                }
                self.phase = MeleePhase::Attacking {
                    remaining: self.settings.combat.melee_attack_duration,
                    hit_applied: false,
                };
                logger::log(&format!("⚔️ {:?} melee attack started", ctx.entity));
            }
            _ => {}
        }
    }

    fn is_action_in_progress(&self) -> bool {
        self.is_attacking()
    }
}

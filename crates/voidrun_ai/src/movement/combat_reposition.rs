//! Combat Repositioning: держим дистанцию, обходим цель, не толпимся.
//!
//! Внутри strafing radius: касательная к цели (знак меняется по синусу времени).
//! Снаружи: 8 agent-local направлений, каждое оценивается по:
//! - dot с направлением на цель
//! - штраф за препятствие (короткий ray)
//! - штраф за толпу в точке назначения
//! - lateral bias (внутри detection radius боком лучше, чем в лоб)
//!
//! Победитель смешивается с separation от союзников.

use std::f32::consts::TAU;
use std::sync::Arc;

use bevy::prelude::*;
use rand::Rng;

use crate::arbitration::{Behavior, BehaviorEnv, BehaviorId, MovementBehavior};
use crate::context::SituationalContext;
use crate::settings::AgentSettings;
use crate::spatial::{LAYER_AGENTS, MASK_OCCLUDERS};
use crate::steering::{flat_direction, flat_direction_or, rotate_yaw, tangent};

pub struct CombatRepositioningBehavior {
    settings: Arc<AgentSettings>,
    /// Randomized per activation so squads don't strafe in lockstep
    strafe_phase: f32,
}

impl CombatRepositioningBehavior {
    pub fn new(settings: Arc<AgentSettings>) -> Self {
        Self {
            settings,
            strafe_phase: 0.0,
        }
    }

    /// +1 / -1 по синусу agent clock.
    fn strafe_sign(&self, elapsed: f32) -> f32 {
        let movement = &self.settings.movement;
        if !movement.strafe_flip_enabled {
            return 1.0;
        }
        let wave = (elapsed * movement.strafe_flip_frequency * TAU + self.strafe_phase).sin();
        if wave >= 0.0 {
            1.0
        } else {
            -1.0
        }
    }

    /// Forward, back, right, left, then the diagonals (agent-local).
    fn candidate_directions(ctx: &SituationalContext, to_target: Vec3) -> [Vec3; 8] {
        let forward = flat_direction(ctx.frame.forward()).unwrap_or(to_target);
        let right = forward.cross(Vec3::Y);
        [
            forward,
            -forward,
            right,
            -right,
            (forward + right).normalize(),
            (forward - right).normalize(),
            (-forward + right).normalize(),
            (-forward - right).normalize(),
        ]
    }

    fn score_candidate(
        &self,
        ctx: &SituationalContext,
        env: &BehaviorEnv<'_>,
        candidate: Vec3,
        to_target: Vec3,
    ) -> f32 {
        let movement = &self.settings.movement;
        let origin = ctx.position();
        let alignment = candidate.dot(to_target);
        let mut score = alignment;

        if env
            .spatial
            .raycast_occluded(origin, candidate, movement.obstacle_check_distance, MASK_OCCLUDERS)
        {
            score -= movement.obstacle_penalty;
        }

        let destination = origin + candidate * movement.obstacle_check_distance;
        let target = ctx.target_entity();
        let crowded = env
            .spatial
            .query_nearby(
                destination,
                movement.crowding_radius,
                LAYER_AGENTS,
                movement.max_query_results,
            )
            .iter()
            .any(|hit| hit.entity != ctx.entity && Some(hit.entity) != target);
        if crowded {
            score -= movement.crowding_penalty;
        }

        if ctx.distance_to_target <= movement.detection_radius {
            score += movement.lateral_bias * (1.0 - alignment.abs());
        }

        score
    }

    /// Average away-from-ally direction, each rotated by a fixed yaw offset.
    fn separation(&self, ctx: &SituationalContext) -> Vec3 {
        let movement = &self.settings.movement;
        let offset = movement.separation_rotation_degrees.to_radians();

        let (sum, count) = ctx
            .allies
            .iter()
            .filter(|ally| ally.position.distance(ctx.position()) <= movement.separation_radius)
            .filter_map(|ally| flat_direction(ctx.position() - ally.position))
            .fold((Vec3::ZERO, 0u32), |(sum, count), away| {
                (sum + rotate_yaw(away, offset), count + 1)
            });

        if count == 0 {
            Vec3::ZERO
        } else {
            sum / count as f32
        }
    }
}

impl Behavior for CombatRepositioningBehavior {
    fn id(&self) -> BehaviorId {
        BehaviorId::CombatRepositioning
    }

    fn suitability(&mut self, ctx: &SituationalContext, _env: &mut BehaviorEnv<'_>) -> f32 {
        let movement = &self.settings.movement;
        if !ctx.has_target() {
            return 0.2;
        }

        let distance = ctx.distance_to_target;
        if distance > movement.detection_radius {
            0.3
        } else if distance <= movement.close_range_radius {
            // Вплотную: пусть работают dodge / melee
            0.5
        } else {
            0.8
        }
    }

    fn initialize(&mut self, _ctx: &SituationalContext, env: &mut BehaviorEnv<'_>) {
        self.strafe_phase = env.rng.gen_range(0.0..TAU);
    }
}

impl MovementBehavior for CombatRepositioningBehavior {
    fn calculate_direction(&mut self, ctx: &SituationalContext, env: &mut BehaviorEnv<'_>) -> Vec3 {
        let Some(to_target) = ctx.direction_to_target() else {
            return Vec3::ZERO;
        };

        if ctx.distance_to_target <= self.settings.movement.strafing_radius {
            return tangent(to_target) * self.strafe_sign(ctx.elapsed);
        }

        let mut best = to_target;
        let mut best_score = f32::NEG_INFINITY;
        for candidate in Self::candidate_directions(ctx, to_target) {
            let score = self.score_candidate(ctx, env, candidate, to_target);
            if score > best_score {
                best_score = score;
                best = candidate;
            }
        }

        let blended = best + self.separation(ctx) * self.settings.movement.separation_blend;
        flat_direction_or(blended, best)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arbitration::test_harness::{context_at, entity, Harness};
    use crate::context::AllyRef;
    use crate::spatial::{SpatialBody, SpatialTag};

    fn behavior() -> CombatRepositioningBehavior {
        CombatRepositioningBehavior::new(Arc::new(AgentSettings::default()))
    }

    fn with_target(harness: &mut Harness, target: Vec3) -> SituationalContext {
        harness
            .snapshot
            .insert(SpatialBody::new(entity(2), target, 0.5, SpatialTag::Agent).with_faction(2));
        let mut ctx = context_at(Vec3::ZERO);
        ctx.set_target(Some(entity(2)));
        ctx.refresh(&harness.snapshot);
        ctx
    }

    #[test]
    fn test_suitability_bands() {
        let mut harness = Harness::new(1);
        let mut behavior = behavior();

        let ctx = context_at(Vec3::ZERO);
        assert_eq!(behavior.suitability(&ctx, &mut harness.env(0.1)), 0.2);

        // detection 15, close range 2.5
        for (distance, expected) in [(20.0, 0.3), (10.0, 0.8), (2.0, 0.5)] {
            let mut harness = Harness::new(1);
            let ctx = with_target(&mut harness, Vec3::new(0.0, 0.0, -distance));
            assert_eq!(
                behavior.suitability(&ctx, &mut harness.env(0.1)),
                expected,
                "distance {}",
                distance
            );
        }
    }

    #[test]
    fn test_strafes_tangentially_inside_strafing_radius() {
        let mut harness = Harness::new(1);
        let ctx = with_target(&mut harness, Vec3::new(0.0, 0.0, -4.0));
        let mut behavior = behavior();
        behavior.initialize(&ctx, &mut harness.env(0.1));

        let direction = behavior.calculate_direction(&ctx, &mut harness.env(0.1));

        assert!((direction.length() - 1.0).abs() < 1e-4);
        assert!(direction.dot(Vec3::NEG_Z).abs() < 1e-4);
    }

    #[test]
    fn test_strafe_sign_flips_over_time() {
        let mut behavior = behavior();
        behavior.strafe_phase = 0.0;

        // frequency 0.25 Hz: sin ≥ 0 на [0, 2), < 0 на (2, 4)
        assert_eq!(behavior.strafe_sign(1.0), 1.0);
        assert_eq!(behavior.strafe_sign(3.0), -1.0);
    }

    #[test]
    fn test_sampling_avoids_occluded_direction() {
        let mut harness = Harness::new(1);
        // Цель далеко за стеной прямо по курсу (forward = -Z)
        let ctx = with_target(&mut harness, Vec3::new(0.0, 0.0, -10.0));
        harness
            .snapshot
            .insert(SpatialBody::new(entity(9), Vec3::new(0.0, 0.0, -1.5), 0.6, SpatialTag::Obstacle));
        let mut behavior = behavior();

        let direction = behavior.calculate_direction(&ctx, &mut harness.env(0.1));

        // Прямо в стену не идём, но продолжаем сближаться по диагонали
        assert!(direction.dot(Vec3::NEG_Z) < 0.99);
        assert!(direction.dot(Vec3::NEG_Z) > 0.0);
    }

    #[test]
    fn test_sampling_prefers_forward_with_default_lateral_bias() {
        let mut harness = Harness::new(1);
        let ctx = with_target(&mut harness, Vec3::new(0.0, 0.0, -10.0));
        let mut behavior = behavior();

        let direction = behavior.calculate_direction(&ctx, &mut harness.env(0.1));

        // forward: 1.0; diagonal: 0.707 + 0.3 × 0.293 ≈ 0.795 → forward wins
        assert!((direction - Vec3::NEG_Z).length() < 1e-4);
    }

    #[test]
    fn test_strong_lateral_bias_flanks_inside_detection_only() {
        let mut settings = AgentSettings::default();
        settings.movement.lateral_bias = 2.0;
        let mut behavior = CombatRepositioningBehavior::new(Arc::new(settings));

        // right: 0 + 2.0 × 1 = 2.0; diagonal: 0.707 + 2.0 × 0.293 ≈ 1.29; forward: 1.0
        let mut harness = Harness::new(1);
        let ctx = with_target(&mut harness, Vec3::new(0.0, 0.0, -10.0));
        let direction = behavior.calculate_direction(&ctx, &mut harness.env(0.1));
        assert!((direction - Vec3::X).length() < 1e-4);

        // Вне detection radius bias не действует
        let mut harness = Harness::new(1);
        let ctx = with_target(&mut harness, Vec3::new(0.0, 0.0, -20.0));
        let direction = behavior.calculate_direction(&ctx, &mut harness.env(0.1));
        assert!((direction - Vec3::NEG_Z).length() < 1e-4);
    }

    #[test]
    fn test_separation_pushes_away_from_ally() {
        let mut harness = Harness::new(1);
        let mut ctx = with_target(&mut harness, Vec3::new(0.0, 0.0, -10.0));
        ctx.allies.push(AllyRef {
            entity: entity(3),
            position: Vec3::new(-1.0, 0.0, 0.0),
            heading: Vec3::NEG_Z,
            velocity: None,
        });
        let mut behavior = behavior();

        let direction = behavior.calculate_direction(&ctx, &mut harness.env(0.1));

        // Союзник слева → смещение вправо (+X)
        assert!(direction.x > 0.1);
        assert!((direction.length() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_no_target_stands_still() {
        let mut harness = Harness::new(1);
        let ctx = context_at(Vec3::ZERO);
        let mut behavior = behavior();
        assert_eq!(behavior.calculate_direction(&ctx, &mut harness.env(0.1)), Vec3::ZERO);
    }
}

//! Patrol: квадратный маршрут вокруг точки активации.
//!
//! Waypoints: center + (r,0,r), (r,0,-r), (-r,0,-r), (-r,0,r).
//! На waypoint стоим `waypoint_wait_time`, затем следующий (по кругу).

use std::sync::Arc;

use bevy::prelude::*;

use crate::arbitration::cooldown::countdown_expired;
use crate::arbitration::{Behavior, BehaviorEnv, BehaviorId, MovementBehavior};
use crate::context::SituationalContext;
use crate::settings::AgentSettings;
use crate::steering::{flat, flat_direction};

pub struct PatrolBehavior {
    settings: Arc<AgentSettings>,
    waypoints: Vec<Vec3>,
    index: usize,
    wait_remaining: f32,
}

impl PatrolBehavior {
    pub fn new(settings: Arc<AgentSettings>) -> Self {
        Self {
            settings,
            waypoints: Vec::new(),
            index: 0,
            wait_remaining: 0.0,
        }
    }

    pub fn square_loop(center: Vec3, radius: f32) -> Vec<Vec3> {
        vec![
            center + Vec3::new(radius, 0.0, radius),
            center + Vec3::new(radius, 0.0, -radius),
            center + Vec3::new(-radius, 0.0, -radius),
            center + Vec3::new(-radius, 0.0, radius),
        ]
    }

    pub fn waypoints(&self) -> &[Vec3] {
        &self.waypoints
    }

    pub fn current_index(&self) -> usize {
        self.index
    }

    pub fn is_waiting(&self) -> bool {
        self.wait_remaining > 0.0
    }

    /// One tick of the waypoint pause; on expiry the next waypoint is selected.
    fn wait_tick(&mut self, dt: f32) {
        self.wait_remaining -= dt;
        if countdown_expired(self.wait_remaining, dt) {
            self.wait_remaining = 0.0;
            self.advance();
        }
    }

    fn advance(&mut self) {
        if !self.waypoints.is_empty() {
            self.index = (self.index + 1) % self.waypoints.len();
        }
    }
}

impl Behavior for PatrolBehavior {
    fn id(&self) -> BehaviorId {
        BehaviorId::Patrol
    }

    fn suitability(&mut self, ctx: &SituationalContext, _env: &mut BehaviorEnv<'_>) -> f32 {
        let movement = &self.settings.movement;
        let far = movement.detection_radius * movement.patrol_far_factor;

        if !ctx.has_target() || ctx.distance_to_target > far {
            0.7
        } else {
            0.1
        }
    }

    fn initialize(&mut self, ctx: &SituationalContext, _env: &mut BehaviorEnv<'_>) {
        self.waypoints = Self::square_loop(ctx.position(), self.settings.movement.patrol_radius);
        self.index = 0;
        self.wait_remaining = 0.0;
    }
}

impl MovementBehavior for PatrolBehavior {
    fn calculate_direction(&mut self, ctx: &SituationalContext, env: &mut BehaviorEnv<'_>) -> Vec3 {
        let movement = &self.settings.movement;

        if self.is_waiting() {
            self.wait_tick(env.dt);
            return Vec3::ZERO;
        }

        let Some(&waypoint) = self.waypoints.get(self.index) else {
            return Vec3::ZERO;
        };

        let offset = flat(waypoint - ctx.position());
        if offset.length() <= movement.waypoint_reach_distance {
            if movement.waypoint_wait_time > 0.0 {
                // Тик прибытия уже первый тик ожидания
                self.wait_remaining = movement.waypoint_wait_time;
                self.wait_tick(env.dt);
            } else {
                self.advance();
            }
            return Vec3::ZERO;
        }

        flat_direction(offset).unwrap_or(Vec3::ZERO)
    }
}

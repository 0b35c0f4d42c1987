//! Threat records (one-tick lifetime).

use bevy::prelude::*;

/// What kind of hazard a threat is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub enum ThreatCategory {
    Projectile,
    MeleeAttack,
    AreaEffect,
    Environmental,
}

/// A sensed hazard, rebuilt every tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Threat {
    pub source: Entity,
    /// [0, 1], 1: вплотную, 0: на границе detection radius
    pub danger_level: f32,
    /// Unit direction from self to source (zero if source sits on self)
    pub direction: Vec3,
    pub distance: f32,
    pub category: ThreatCategory,
}

/// `clamp01(1 - distance / radius)`; non-positive radius → 0.
pub fn danger_level(distance: f32, radius: f32) -> f32 {
    if radius <= 0.0 {
        return 0.0;
    }
    (1.0 - distance / radius).clamp(0.0, 1.0)
}

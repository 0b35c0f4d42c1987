//! Spatial Query Service boundary.
//!
//! Core никогда не ходит в физику напрямую: все proximity/ray запросы идут
//! через `SpatialQuery`, который передаётся в tick (dependency injection).
//! `SpatialSnapshot`: in-memory реализация (headless + тесты + ECS plugin).

use bevy::prelude::*;

use crate::context::ThreatCategory;

pub mod layers;
pub mod snapshot;


pub use layers::*;
pub use snapshot::{SpatialBody, SpatialSnapshot};

/// Position + orientation of a body.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct SpatialFrame {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for SpatialFrame {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

impl SpatialFrame {
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    pub fn from_translation(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
        }
    }

    /// Forward axis (-Z, как у Bevy Transform)
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    pub fn to_transform(&self) -> Transform {
        Transform::from_translation(self.position).with_rotation(self.rotation)
    }
}

impl From<&Transform> for SpatialFrame {
    fn from(transform: &Transform) -> Self {
        Self {
            position: transform.translation,
            rotation: transform.rotation,
        }
    }
}

/// Category tag carried by every body the service knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub enum SpatialTag {
    Agent,
    Obstacle,
    Projectile,
    MeleeAttack,
    AreaEffect,
    Hazard,
}

impl SpatialTag {
    pub fn layer(self) -> u32 {
        match self {
            SpatialTag::Agent => LAYER_AGENTS,
            SpatialTag::Obstacle => LAYER_OBSTACLES,
            SpatialTag::Projectile => LAYER_PROJECTILES,
            SpatialTag::MeleeAttack => LAYER_MELEE_ATTACKS,
            SpatialTag::AreaEffect => LAYER_AREA_EFFECTS,
            SpatialTag::Hazard => LAYER_HAZARDS,
        }
    }

    pub fn matches(self, filter: u32) -> bool {
        self.layer() & filter != 0
    }

    /// Threat category inferred from the tag (None: не угроза).
    pub fn threat_category(self) -> Option<ThreatCategory> {
        match self {
            SpatialTag::Projectile => Some(ThreatCategory::Projectile),
            SpatialTag::MeleeAttack => Some(ThreatCategory::MeleeAttack),
            SpatialTag::AreaEffect => Some(ThreatCategory::AreaEffect),
            SpatialTag::Hazard => Some(ThreatCategory::Environmental),
            SpatialTag::Agent | SpatialTag::Obstacle => None,
        }
    }
}

/// One result of a proximity query.
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialHit {
    pub entity: Entity,
    pub frame: SpatialFrame,
    /// Known linear velocity (None: статичный body или неизвестно)
    pub velocity: Option<Vec3>,
    pub tag: SpatialTag,
    /// Faction of agents; None for everything else
    pub faction: Option<u64>,
    /// Who spawned it (projectiles, attack volumes)
    pub owner: Option<Entity>,
}

/// Nearest body along a ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub entity: Entity,
    pub distance: f32,
    pub point: Vec3,
    pub tag: SpatialTag,
}

/// Spatial Query Service consumed by the arbitration core.
///
/// All calls are synchronous and bounded. Hitting `max_results` means
/// "saw only the first N" and is not an error.
pub trait SpatialQuery {
    fn query_nearby(
        &self,
        center: Vec3,
        radius: f32,
        filter: u32,
        max_results: usize,
    ) -> Vec<SpatialHit>;

    /// Nearest body of `filter` along the ray; bodies containing `origin` are ignored.
    fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32, filter: u32)
        -> Option<RayHit>;

    /// `raycast` that looks through `exclude` (e.g. a projectile's owner).
    fn raycast_excluding(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        filter: u32,
        exclude: Entity,
    ) -> Option<RayHit>;

    /// Resolve an entity reference (weak: despawned → None).
    fn lookup(&self, entity: Entity) -> Option<SpatialHit>;

    fn raycast_occluded(&self, origin: Vec3, direction: Vec3, max_distance: f32, filter: u32) -> bool {
        self.raycast(origin, direction, max_distance, filter).is_some()
    }
}

//! Projectile: постоянная скорость, фиксированное направление, один hit.

use bevy::prelude::*;

use crate::arbitration::ProjectileSpawn;
use crate::spatial::{SpatialQuery, SpatialTag, MASK_PROJECTILE_CONTACT};

/// Contact candidates examined per step.
const CONTACT_QUERY_LIMIT: usize = 8;

/// First contact of a projectile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectileImpact {
    pub owner: Entity,
    pub target: Entity,
    pub point: Vec3,
    pub damage: u32,
    pub tag: SpatialTag,
}

/// Outcome of one projectile step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProjectileStep {
    Flying,
    Hit(ProjectileImpact),
    /// Lifetime exhausted without contact
    Expired,
}

/// Projectile in flight (ECS component).
#[derive(Component, Debug, Clone, PartialEq, Reflect)]
#[reflect(Component)]
pub struct Projectile {
    pub owner: Entity,
    pub position: Vec3,
    pub direction: Vec3,
    pub speed: f32,
    pub damage: u32,
    pub radius: f32,
    pub lifetime: f32,
    pub age: f32,
    /// Set on first contact or expiry; a spent projectile never triggers again
    pub spent: bool,
}

impl Projectile {
    pub fn from_spawn(spawn: &ProjectileSpawn) -> Self {
        Self {
            owner: spawn.owner,
            position: spawn.position,
            direction: spawn.direction.normalize_or_zero(),
            speed: spawn.speed,
            damage: spawn.damage,
            radius: spawn.radius,
            lifetime: spawn.lifetime,
            age: 0.0,
            spent: false,
        }
    }

    pub fn velocity(&self) -> Vec3 {
        self.direction * self.speed
    }

    /// Overlap at the current position, then a swept ray over this step.
    pub fn step(&mut self, dt: f32, spatial: &dyn SpatialQuery) -> ProjectileStep {
        if self.spent {
            return ProjectileStep::Expired;
        }

        if let Some(impact) = self.find_contact(dt, spatial) {
            self.spent = true;
            return ProjectileStep::Hit(impact);
        }

        self.position += self.velocity() * dt;
        self.age += dt;
        if self.age >= self.lifetime {
            self.spent = true;
            return ProjectileStep::Expired;
        }

        ProjectileStep::Flying
    }

    fn find_contact(&self, dt: f32, spatial: &dyn SpatialQuery) -> Option<ProjectileImpact> {
        let overlap = spatial
            .query_nearby(self.position, self.radius, MASK_PROJECTILE_CONTACT, CONTACT_QUERY_LIMIT)
            .into_iter()
            .find(|hit| hit.entity != self.owner)
            .map(|hit| (hit.entity, self.position, hit.tag));

        let contact = overlap.or_else(|| {
            let travel = self.speed * dt + self.radius;
            spatial
                .raycast_excluding(
                    self.position,
                    self.direction,
                    travel,
                    MASK_PROJECTILE_CONTACT,
                    self.owner,
                )
                .map(|ray| (ray.entity, ray.point, ray.tag))
        });

        contact.map(|(target, point, tag)| ProjectileImpact {
            owner: self.owner,
            target,
            point,
            damage: self.damage,
            tag,
        })
    }
}

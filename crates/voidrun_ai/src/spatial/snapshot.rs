//! In-memory Spatial Query Service.
//!
//! Sphere bodies, brute-force queries. Пересобирается один раз за fixed step
//! (ECS) или вручную (тесты), поэтому все агенты одного step'а видят одно и
//! то же pre-step состояние мира.

use std::collections::HashMap;

use bevy::prelude::*;

use super::{RayHit, SpatialFrame, SpatialHit, SpatialQuery, SpatialTag};

/// One body registered in the snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialBody {
    pub entity: Entity,
    pub frame: SpatialFrame,
    pub radius: f32,
    pub velocity: Option<Vec3>,
    pub tag: SpatialTag,
    pub faction: Option<u64>,
    pub owner: Option<Entity>,
}

impl SpatialBody {
    pub fn new(entity: Entity, position: Vec3, radius: f32, tag: SpatialTag) -> Self {
        Self {
            entity,
            frame: SpatialFrame::from_translation(position),
            radius,
            velocity: None,
            tag,
            faction: None,
            owner: None,
        }
    }

    pub fn with_faction(mut self, faction: u64) -> Self {
        self.faction = Some(faction);
        self
    }

    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.velocity = Some(velocity);
        self
    }

    pub fn with_owner(mut self, owner: Entity) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.frame.rotation = rotation;
        self
    }

    fn to_hit(&self) -> SpatialHit {
        SpatialHit {
            entity: self.entity,
            frame: self.frame,
            velocity: self.velocity,
            tag: self.tag,
            faction: self.faction,
            owner: self.owner,
        }
    }

    /// Entry distance of a ray (direction normalized) into this sphere.
    fn ray_entry(&self, origin: Vec3, direction: Vec3) -> Option<f32> {
        let oc = origin - self.frame.position;
        let radius_sq = self.radius * self.radius;
        let c = oc.length_squared() - radius_sq;
        if c <= 0.0 {
            // Origin внутри body (например, собственное тело): игнорируем
            return None;
        }

        let b = oc.dot(direction);
        let discriminant = b * b - c;
        if discriminant < 0.0 {
            return None;
        }

        let t = -b - discriminant.sqrt();
        (t >= 0.0).then_some(t)
    }
}

/// Snapshot of every body in the world for one step.
#[derive(Resource, Debug, Clone, Default)]
pub struct SpatialSnapshot {
    bodies: Vec<SpatialBody>,
    index: HashMap<Entity, usize>,
}

impl SpatialSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.bodies.clear();
        self.index.clear();
    }

    /// Insert or replace the body of `body.entity`.
    pub fn insert(&mut self, body: SpatialBody) {
        if let Some(&slot) = self.index.get(&body.entity) {
            self.bodies[slot] = body;
            return;
        }

        self.index.insert(body.entity, self.bodies.len());
        self.bodies.push(body);
    }

    pub fn remove(&mut self, entity: Entity) {
        if self.index.remove(&entity).is_none() {
            return;
        }

        self.bodies.retain(|body| body.entity != entity);
        self.index = self
            .bodies
            .iter()
            .enumerate()
            .map(|(slot, body)| (body.entity, slot))
            .collect();
    }

    pub fn body(&self, entity: Entity) -> Option<&SpatialBody> {
        self.index.get(&entity).and_then(|&slot| self.bodies.get(slot))
    }

    pub fn body_mut(&mut self, entity: Entity) -> Option<&mut SpatialBody> {
        let slot = *self.index.get(&entity)?;
        self.bodies.get_mut(slot)
    }

    pub fn bodies(&self) -> &[SpatialBody] {
        &self.bodies
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    fn nearest_on_ray(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        filter: u32,
        exclude: Option<Entity>,
    ) -> Option<RayHit> {
        let direction = direction.normalize_or_zero();
        if direction == Vec3::ZERO || max_distance <= 0.0 {
            return None;
        }

        let mut nearest: Option<(f32, &SpatialBody)> = None;
        let candidates = self
            .bodies
            .iter()
            .filter(|body| body.tag.matches(filter) && Some(body.entity) != exclude);
        for body in candidates {
            let Some(t) = body.ray_entry(origin, direction) else {
                continue;
            };
            if t > max_distance {
                continue;
            }

            match nearest {
                Some((best, _)) if best <= t => {}
                _ => nearest = Some((t, body)),
            }
        }

        nearest.map(|(distance, body)| RayHit {
            entity: body.entity,
            distance,
            point: origin + direction * distance,
            tag: body.tag,
        })
    }
}

impl SpatialQuery for SpatialSnapshot {
    fn query_nearby(
        &self,
        center: Vec3,
        radius: f32,
        filter: u32,
        max_results: usize,
    ) -> Vec<SpatialHit> {
        if max_results == 0 || radius < 0.0 {
            return Vec::new();
        }

        let mut found: Vec<(f32, &SpatialBody)> = self
            .bodies
            .iter()
            .filter(|body| body.tag.matches(filter))
            .filter_map(|body| {
                let distance = body.frame.position.distance(center);
                (distance <= radius + body.radius).then_some((distance, body))
            })
            .collect();

        // Ближайшие первыми, entity index как tie-break (детерминизм)
        found.sort_by(|(da, a), (db, b)| {
            da.total_cmp(db)
                .then_with(|| a.entity.index().cmp(&b.entity.index()))
        });
        found.truncate(max_results);

        found.into_iter().map(|(_, body)| body.to_hit()).collect()
    }

    fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        filter: u32,
    ) -> Option<RayHit> {
        self.nearest_on_ray(origin, direction, max_distance, filter, None)
    }

    fn raycast_excluding(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        filter: u32,
        exclude: Entity,
    ) -> Option<RayHit> {
        self.nearest_on_ray(origin, direction, max_distance, filter, Some(exclude))
    }

    fn lookup(&self, entity: Entity) -> Option<SpatialHit> {
        self.body(entity).map(SpatialBody::to_hit)
    }
}

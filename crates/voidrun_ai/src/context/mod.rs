//! Situational Context: per-tick snapshot одного агента.
//!
//! Владеет им ровно один агент. Каждый tick:
//! 1. `refresh`: разрешаем weak target reference, пересчитываем дистанцию
//! 2. `update_ranges`: scratch флаги (melee/ranged range) для behaviors
//! 3. `sense_threats` / `sense_allies`: списки пересобираются целиком

use bevy::prelude::*;

use crate::spatial::{SpatialFrame, SpatialQuery, SpatialTag};
use crate::steering::{flat, flat_direction};

pub mod threat;


pub use threat::{danger_level, Threat, ThreatCategory};

/// Resolved target for this tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetRef {
    pub entity: Entity,
    pub position: Vec3,
    pub velocity: Option<Vec3>,
    pub tag: SpatialTag,
}

/// Nearby same-faction agent (this tick).
#[derive(Debug, Clone, PartialEq)]
pub struct AllyRef {
    pub entity: Entity,
    pub position: Vec3,
    /// Flat forward of the ally
    pub heading: Vec3,
    pub velocity: Option<Vec3>,
}

/// Cross-behavior facts written during sensing, read by behaviors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RangeFlags {
    pub in_melee_range: bool,
    pub in_ranged_range: bool,
}

#[derive(Debug, Clone)]
pub struct SituationalContext {
    pub entity: Entity,
    pub faction: u64,
    /// Own spatial frame
    pub frame: SpatialFrame,
    target_entity: Option<Entity>,
    pub target: Option<TargetRef>,
    /// `f32::INFINITY` while no target is resolved
    pub distance_to_target: f32,
    pub current_velocity: Vec3,
    /// Last non-degenerate heading (flat, normalized or zero)
    pub current_direction: Vec3,
    pub scratch: RangeFlags,
    pub threats: Vec<Threat>,
    pub allies: Vec<AllyRef>,
    /// Agent clock (sum of tick dt)
    pub elapsed: f32,
}

impl SituationalContext {
    pub fn new(entity: Entity, faction: u64, frame: SpatialFrame) -> Self {
        let current_direction = flat_direction(frame.forward()).unwrap_or(Vec3::ZERO);
        Self {
            entity,
            faction,
            frame,
            target_entity: None,
            target: None,
            distance_to_target: f32::INFINITY,
            current_velocity: Vec3::ZERO,
            current_direction,
            scratch: RangeFlags::default(),
            threats: Vec::new(),
            allies: Vec::new(),
            elapsed: 0.0,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.frame.position
    }

    /// Assign (or clear) the target. Resolved on the next `refresh`.
    pub fn set_target(&mut self, target: Option<Entity>) {
        if self.target_entity != target {
            self.target = None;
            self.distance_to_target = f32::INFINITY;
        }
        self.target_entity = target;
    }

    pub fn target_entity(&self) -> Option<Entity> {
        self.target_entity
    }

    pub fn has_target(&self) -> bool {
        self.target.is_some()
    }

    /// Resolve the target reference and recompute the distance.
    ///
    /// Target пропал из мира (weak reference) → target сбрасывается.
    pub fn refresh(&mut self, spatial: &dyn SpatialQuery) {
        let Some(entity) = self.target_entity else {
            self.target = None;
            self.distance_to_target = f32::INFINITY;
            return;
        };

        match spatial.lookup(entity) {
            Some(hit) => {
                self.distance_to_target = self.frame.position.distance(hit.frame.position);
                self.target = Some(TargetRef {
                    entity,
                    position: hit.frame.position,
                    velocity: hit.velocity,
                    tag: hit.tag,
                });
            }
            None => {
                self.target_entity = None;
                self.target = None;
                self.distance_to_target = f32::INFINITY;
            }
        }
    }

    /// Recompute distance only (own frame moved, target unchanged).
    pub fn refresh_distance(&mut self) {
        self.distance_to_target = match &self.target {
            Some(target) => self.frame.position.distance(target.position),
            None => f32::INFINITY,
        };
    }

    /// Scratch range facts for the combat layer.
    pub fn update_ranges(&mut self, melee_range: f32, ranged_range: f32) {
        let has_target = self.target.is_some();
        self.scratch = RangeFlags {
            in_melee_range: has_target && self.distance_to_target <= melee_range,
            in_ranged_range: has_target && self.distance_to_target <= ranged_range,
        };
    }

    /// One proximity query; `threats` is replaced wholesale.
    pub fn sense_threats(
        &mut self,
        spatial: &dyn SpatialQuery,
        radius: f32,
        filter: u32,
        max_results: usize,
    ) {
        let origin = self.frame.position;
        let hits = spatial.query_nearby(origin, radius, filter, max_results);

        self.threats = hits
            .into_iter()
            .filter(|hit| hit.entity != self.entity)
            // Свои снаряды: не угроза
            .filter(|hit| hit.owner != Some(self.entity))
            .filter_map(|hit| {
                let category = hit.tag.threat_category()?;
                let offset = hit.frame.position - origin;
                let distance = offset.length();
                Some(Threat {
                    source: hit.entity,
                    danger_level: danger_level(distance, radius),
                    direction: offset.normalize_or_zero(),
                    distance,
                    category,
                })
            })
            .collect();
    }

    /// One proximity query; `allies` is replaced wholesale (same faction only).
    pub fn sense_allies(
        &mut self,
        spatial: &dyn SpatialQuery,
        radius: f32,
        filter: u32,
        max_results: usize,
    ) {
        let hits = spatial.query_nearby(self.frame.position, radius, filter, max_results);

        self.allies = hits
            .into_iter()
            .filter(|hit| hit.entity != self.entity)
            .filter(|hit| hit.tag == SpatialTag::Agent && hit.faction == Some(self.faction))
            .map(|hit| AllyRef {
                entity: hit.entity,
                position: hit.frame.position,
                heading: flat_direction(hit.frame.forward()).unwrap_or(Vec3::ZERO),
                velocity: hit.velocity,
            })
            .collect();
    }

    /// Flat unit vector self → target (None without target or when on top of it).
    pub fn direction_to_target(&self) -> Option<Vec3> {
        let target = self.target.as_ref()?;
        flat_direction(target.position - self.frame.position)
    }

    /// Flat offset self → target.
    pub fn offset_to_target(&self) -> Option<Vec3> {
        self.target
            .as_ref()
            .map(|target| flat(target.position - self.frame.position))
    }

    /// Last heading, or the flat forward if the agent never moved.
    pub fn fallback_heading(&self) -> Vec3 {
        if self.current_direction != Vec3::ZERO {
            self.current_direction
        } else {
            flat_direction(self.frame.forward()).unwrap_or(Vec3::ZERO)
        }
    }

    pub fn max_danger(&self) -> f32 {
        self.threats
            .iter()
            .map(|threat| threat.danger_level)
            .fold(0.0, f32::max)
    }

    /// Highest danger; first sensed wins ties.
    pub fn most_dangerous_threat(&self) -> Option<&Threat> {
        self.threats.iter().fold(None, |best: Option<&Threat>, threat| match best {
            Some(current) if current.danger_level >= threat.danger_level => Some(current),
            _ => Some(threat),
        })
    }
}

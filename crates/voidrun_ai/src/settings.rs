//! Per-agent tunables (movement + combat).
//!
//! Immutable after construction: every behavior of an agent holds the same
//! `Arc<AgentSettings>` and reads its `movement` / `combat` section. Loading
//! is the caller's job; records derive serde so any format works.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rejected settings record.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SettingsError {
    #[error("`{field}` must be positive (got {value})")]
    NonPositive { field: &'static str, value: f32 },

    #[error("`{field}` must be within [{min}, {max}] (got {value})")]
    OutOfRange {
        field: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },

    #[error("`{field}` band is inverted: min {min} > max {max}")]
    InvalidBand {
        field: &'static str,
        min: f32,
        max: f32,
    },
}

fn positive(field: &'static str, value: f32) -> Result<(), SettingsError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(SettingsError::NonPositive { field, value })
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), SettingsError> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(SettingsError::OutOfRange {
            field,
            value,
            min: 0.0,
            max: f32::MAX,
        })
    }
}

fn unit(field: &'static str, value: f32) -> Result<(), SettingsError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(SettingsError::OutOfRange {
            field,
            value,
            min: 0.0,
            max: 1.0,
        })
    }
}

// ============================================================================
// Movement
// ============================================================================

/// Movement layer tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementSettings {
    /// Базовая скорость (m/s)
    pub move_speed: f32,
    /// Скорость поворота к направлению движения (rad/s)
    pub rotation_speed: f32,

    // --- Sensing ---
    /// Радиус обнаружения target (m)
    pub detection_radius: f32,
    /// Radius of the threat proximity query; danger is 1 at 0m, 0 at this radius
    pub threat_detection_radius: f32,
    /// Radius of the ally proximity query
    pub ally_detection_radius: f32,
    /// Cap for every proximity query the movement layer issues
    pub max_query_results: usize,

    // --- Combat repositioning ---
    /// "Слишком близко": ниже этой дистанции repositioning уступает evasive behaviors
    pub close_range_radius: f32,
    /// Inside this radius the agent circles the target instead of sampling
    pub strafing_radius: f32,
    pub strafe_flip_enabled: bool,
    /// Sign flips of the strafing direction per second (sine schedule)
    pub strafe_flip_frequency: f32,
    /// Length of the occlusion ray / crowding check per candidate
    pub obstacle_check_distance: f32,
    pub obstacle_penalty: f32,
    pub crowding_radius: f32,
    pub crowding_penalty: f32,
    pub lateral_bias: f32,
    pub separation_radius: f32,
    /// Rotation applied to each away-from-ally vector (degrees)
    pub separation_rotation_degrees: f32,
    pub separation_blend: f32,

    // --- Dash ---
    pub dash_min_distance: f32,
    pub dash_max_distance: f32,
    /// Chance per evaluation that a clear mid-range dash is proposed
    pub dash_probability: f32,
    pub dash_duration: f32,
    pub dash_cooldown: f32,
    pub dash_speed_multiplier: f32,

    // --- Dodge ---
    pub dodge_duration: f32,
    pub dodge_cooldown: f32,
    pub dodge_speed_multiplier: f32,
    pub dodge_backward_bias: f32,

    // --- Formation (flocking) ---
    pub cohesion_weight: f32,
    pub alignment_weight: f32,
    pub separation_weight: f32,
    /// Allies closer than this push the agent away
    pub formation_spacing: f32,
    /// Share of direct-to-target in the final formation direction
    pub formation_target_blend: f32,

    // --- Patrol ---
    /// Half-size of the square patrol loop
    pub patrol_radius: f32,
    pub waypoint_reach_distance: f32,
    pub waypoint_wait_time: f32,
    /// Target beyond `detection_radius * factor` counts as "far" for patrol
    pub patrol_far_factor: f32,

    // --- Arbitration weights ---
    pub combat_weight: f32,
    pub dash_weight: f32,
    pub dodge_weight: f32,
    pub formation_weight: f32,
    pub patrol_weight: f32,
}

impl Default for MovementSettings {
    fn default() -> Self {
        Self {
            move_speed: 4.0,
            rotation_speed: 10.0,

            detection_radius: 15.0,
            threat_detection_radius: 6.0,
            ally_detection_radius: 8.0,
            max_query_results: 16,

            close_range_radius: 2.5,
            strafing_radius: 6.0,
            strafe_flip_enabled: true,
            strafe_flip_frequency: 0.25,
            obstacle_check_distance: 2.0,
            obstacle_penalty: 10.0,
            crowding_radius: 1.0,
            crowding_penalty: 0.5,
            lateral_bias: 0.3,
            separation_radius: 2.5,
            separation_rotation_degrees: 30.0,
            separation_blend: 0.5,

            dash_min_distance: 6.0,
            dash_max_distance: 12.0,
            dash_probability: 0.05,
            dash_duration: 0.4,
            dash_cooldown: 4.0,
            dash_speed_multiplier: 3.0,

            dodge_duration: 0.35,
            dodge_cooldown: 1.5,
            dodge_speed_multiplier: 2.5,
            dodge_backward_bias: 0.4,

            cohesion_weight: 1.0,
            alignment_weight: 0.8,
            separation_weight: 1.5,
            formation_spacing: 2.0,
            formation_target_blend: 0.3,

            patrol_radius: 5.0,
            waypoint_reach_distance: 0.5,
            waypoint_wait_time: 1.0,
            patrol_far_factor: 1.5,

            combat_weight: 1.0,
            dash_weight: 1.0,
            dodge_weight: 1.0,
            formation_weight: 1.0,
            patrol_weight: 1.0,
        }
    }
}

impl MovementSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        positive("move_speed", self.move_speed)?;
        positive("rotation_speed", self.rotation_speed)?;
        positive("detection_radius", self.detection_radius)?;
        positive("threat_detection_radius", self.threat_detection_radius)?;
        positive("ally_detection_radius", self.ally_detection_radius)?;
        if self.max_query_results == 0 {
            return Err(SettingsError::NonPositive {
                field: "max_query_results",
                value: 0.0,
            });
        }

        non_negative("close_range_radius", self.close_range_radius)?;
        non_negative("strafing_radius", self.strafing_radius)?;
        non_negative("strafe_flip_frequency", self.strafe_flip_frequency)?;
        positive("obstacle_check_distance", self.obstacle_check_distance)?;
        non_negative("obstacle_penalty", self.obstacle_penalty)?;
        non_negative("crowding_radius", self.crowding_radius)?;
        non_negative("crowding_penalty", self.crowding_penalty)?;
        non_negative("lateral_bias", self.lateral_bias)?;
        non_negative("separation_radius", self.separation_radius)?;
        non_negative("separation_blend", self.separation_blend)?;

        non_negative("dash_min_distance", self.dash_min_distance)?;
        if self.dash_min_distance > self.dash_max_distance {
            return Err(SettingsError::InvalidBand {
                field: "dash_distance",
                min: self.dash_min_distance,
                max: self.dash_max_distance,
            });
        }
        unit("dash_probability", self.dash_probability)?;
        positive("dash_duration", self.dash_duration)?;
        non_negative("dash_cooldown", self.dash_cooldown)?;
        positive("dash_speed_multiplier", self.dash_speed_multiplier)?;

        positive("dodge_duration", self.dodge_duration)?;
        non_negative("dodge_cooldown", self.dodge_cooldown)?;
        positive("dodge_speed_multiplier", self.dodge_speed_multiplier)?;
        non_negative("dodge_backward_bias", self.dodge_backward_bias)?;

        non_negative("cohesion_weight", self.cohesion_weight)?;
        non_negative("alignment_weight", self.alignment_weight)?;
        non_negative("separation_weight", self.separation_weight)?;
        non_negative("formation_spacing", self.formation_spacing)?;
        unit("formation_target_blend", self.formation_target_blend)?;

        positive("patrol_radius", self.patrol_radius)?;
        positive("waypoint_reach_distance", self.waypoint_reach_distance)?;
        non_negative("waypoint_wait_time", self.waypoint_wait_time)?;
        positive("patrol_far_factor", self.patrol_far_factor)?;

        non_negative("combat_weight", self.combat_weight)?;
        non_negative("dash_weight", self.dash_weight)?;
        non_negative("dodge_weight", self.dodge_weight)?;
        non_negative("formation_weight", self.formation_weight)?;
        non_negative("patrol_weight", self.patrol_weight)?;
        Ok(())
    }
}

// ============================================================================
// Combat
// ============================================================================

/// Combat layer tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatSettings {
    // --- Melee ---
    pub melee_attack_range: f32,
    pub melee_damage: u32,
    /// Полная длительность swing (секунды); hit на середине
    pub melee_attack_duration: f32,
    pub melee_cooldown: f32,
    /// Radius of the area query that resolves the hit
    pub melee_hit_radius: f32,
    /// Forward offset of the hit sphere center
    pub melee_hit_offset: f32,
    pub knockback_force: f32,

    // --- Ranged ---
    pub ranged_attack_range: f32,
    pub ranged_damage: u32,
    pub charge_duration: f32,
    pub fire_delay: f32,
    pub ranged_cooldown: f32,
    pub projectile_speed: f32,
    pub projectile_lifetime: f32,
    pub projectile_radius: f32,
    /// Preferred distance as a fraction of `ranged_attack_range`
    pub preferred_range_ratio: f32,

    pub max_query_results: usize,

    // --- Arbitration weights ---
    pub melee_weight: f32,
    pub ranged_weight: f32,
}

impl Default for CombatSettings {
    fn default() -> Self {
        Self {
            melee_attack_range: 2.0,
            melee_damage: 20,
            melee_attack_duration: 0.5,
            melee_cooldown: 1.0,
            melee_hit_radius: 1.5,
            melee_hit_offset: 1.0,
            knockback_force: 4.0,

            ranged_attack_range: 10.0,
            ranged_damage: 12,
            charge_duration: 0.6,
            fire_delay: 0.2,
            ranged_cooldown: 2.0,
            projectile_speed: 20.0,
            projectile_lifetime: 3.0,
            projectile_radius: 0.2,
            preferred_range_ratio: 0.7,

            max_query_results: 16,

            melee_weight: 1.0,
            ranged_weight: 1.0,
        }
    }
}

impl CombatSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        positive("melee_attack_range", self.melee_attack_range)?;
        positive("melee_attack_duration", self.melee_attack_duration)?;
        non_negative("melee_cooldown", self.melee_cooldown)?;
        positive("melee_hit_radius", self.melee_hit_radius)?;
        non_negative("melee_hit_offset", self.melee_hit_offset)?;
        non_negative("knockback_force", self.knockback_force)?;

        positive("ranged_attack_range", self.ranged_attack_range)?;
        positive("charge_duration", self.charge_duration)?;
        non_negative("fire_delay", self.fire_delay)?;
        non_negative("ranged_cooldown", self.ranged_cooldown)?;
        positive("projectile_speed", self.projectile_speed)?;
        positive("projectile_lifetime", self.projectile_lifetime)?;
        positive("projectile_radius", self.projectile_radius)?;
        if !(self.preferred_range_ratio > 0.0 && self.preferred_range_ratio <= 1.0) {
            return Err(SettingsError::OutOfRange {
                field: "preferred_range_ratio",
                value: self.preferred_range_ratio,
                min: 0.0,
                max: 1.0,
            });
        }
        if self.max_query_results == 0 {
            return Err(SettingsError::NonPositive {
                field: "max_query_results",
                value: 0.0,
            });
        }

        non_negative("melee_weight", self.melee_weight)?;
        non_negative("ranged_weight", self.ranged_weight)?;
        Ok(())
    }
}

/// Both layers of one agent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    pub movement: MovementSettings,
    pub combat: CombatSettings,
}

impl AgentSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        self.movement.validate()?;
        self.combat.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert_eq!(AgentSettings::default().validate(), Ok(()));
    }

    #[test]
    fn test_inverted_dash_band_rejected() {
        let settings = MovementSettings {
            dash_min_distance: 10.0,
            dash_max_distance: 5.0,
            ..Default::default()
        };

        assert!(matches!(
            settings.validate(),
            Err(SettingsError::InvalidBand { field: "dash_distance", .. })
        ));
    }

    #[test]
    fn test_non_positive_speed_rejected() {
        let settings = CombatSettings {
            projectile_speed: 0.0,
            ..Default::default()
        };

        assert_eq!(
            settings.validate(),
            Err(SettingsError::NonPositive {
                field: "projectile_speed",
                value: 0.0
            })
        );
    }

    #[test]
    fn test_probability_out_of_range_rejected() {
        let settings = MovementSettings {
            dash_probability: 1.5,
            ..Default::default()
        };

        assert!(matches!(settings.validate(), Err(SettingsError::OutOfRange { .. })));
    }
}

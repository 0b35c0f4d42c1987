//! Steering helpers (ground-plane math).
//!
//! Агенты двигаются по XZ плоскости: все направления для movement
//! проецируются на ground plane и нормализуются с защитой от нулевой длины.

use bevy::prelude::*;

/// Below this length a vector counts as degenerate.
pub const EPSILON: f32 = 1e-4;

/// Project onto the ground plane (y = 0).
#[inline]
pub fn flat(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

/// Flatten + normalize; degenerate input → None.
#[inline]
pub fn flat_direction(v: Vec3) -> Option<Vec3> {
    let v = flat(v);
    let length = v.length();
    if length < EPSILON || !length.is_finite() {
        None
    } else {
        Some(v / length)
    }
}

/// Flatten + normalize; degenerate input → `fallback`.
#[inline]
pub fn flat_direction_or(v: Vec3, fallback: Vec3) -> Vec3 {
    flat_direction(v).unwrap_or(fallback)
}

/// Tangent around the up axis (`up × v`): counter-clockwise seen from above.
#[inline]
pub fn tangent(v: Vec3) -> Vec3 {
    Vec3::Y.cross(flat(v)).normalize_or_zero()
}

/// Rotate a ground-plane vector around the up axis.
#[inline]
pub fn rotate_yaw(v: Vec3, radians: f32) -> Vec3 {
    Quat::from_rotation_y(radians) * v
}

/// Yaw-only rotation that makes -Z look along `direction`.
pub fn yaw_towards(direction: Vec3) -> Option<Quat> {
    let direction = flat_direction(direction)?;
    // -Z forward: yaw = atan2(-x, -z)
    Some(Quat::from_rotation_y(f32::atan2(-direction.x, -direction.z)))
}

/// Peak function: 1 at `center`, falling linearly to 0 at `center ± width`.
pub fn peak(value: f32, center: f32, width: f32) -> f32 {
    if width <= 0.0 {
        return if (value - center).abs() < EPSILON { 1.0 } else { 0.0 };
    }
    (1.0 - (value - center).abs() / width).clamp(0.0, 1.0)
}

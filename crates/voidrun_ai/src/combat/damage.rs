//! Damage-receiving capability.
//!
//! Arbitration core только формирует `DamageRequest` / `ProjectileImpact`.
//! Применяет их тот, кто реализует `Damageable` (ECS actor: Health + Knockback).

use bevy::prelude::*;

/// Anything that can take damage (and optionally be pushed).
pub trait Damageable {
    fn apply_damage(&mut self, amount: u32);

    /// Physical impulse (knockback). Default: ignored.
    fn apply_impulse(&mut self, _impulse: Vec3) {}

    fn is_alive(&self) -> bool;
}

/// Здоровье актора
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Reflect)]
#[reflect(Component)]
pub struct Health {
    pub current: u32,
    pub max: u32,
}

impl Default for Health {
    fn default() -> Self {
        Self::new(100)
    }
}

impl Health {
    pub fn new(max: u32) -> Self {
        Self { current: max, max }
    }

    pub fn is_alive(&self) -> bool {
        self.current > 0
    }

    pub fn take_damage(&mut self, amount: u32) {
        self.current = self.current.saturating_sub(amount);
    }

    pub fn heal(&mut self, amount: u32) {
        self.current = self.current.saturating_add(amount).min(self.max);
    }
}

impl Damageable for Health {
    fn apply_damage(&mut self, amount: u32) {
        self.take_damage(amount);
    }

    fn is_alive(&self) -> bool {
        Health::is_alive(self)
    }
}

/// Knockback velocity, decays exponentially.
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub struct Knockback {
    pub velocity: Vec3,
    /// Fraction of velocity lost per second (0..∞)
    pub damping: f32,
}

impl Default for Knockback {
    fn default() -> Self {
        Self {
            velocity: Vec3::ZERO,
            damping: 6.0,
        }
    }
}

impl Knockback {
    pub fn push(&mut self, impulse: Vec3) {
        self.velocity += impulse;
    }

    /// Displacement for this step; velocity decays afterwards.
    pub fn advance(&mut self, dt: f32) -> Vec3 {
        let displacement = self.velocity * dt;
        self.velocity *= (-self.damping * dt).exp();
        if self.velocity.length_squared() < 1e-6 {
            self.velocity = Vec3::ZERO;
        }
        displacement
    }

    pub fn is_idle(&self) -> bool {
        self.velocity == Vec3::ZERO
    }
}

/// Mutable view of an actor's damage components.
pub struct ActorDamage<'a> {
    pub health: &'a mut Health,
    pub knockback: Option<&'a mut Knockback>,
}

impl Damageable for ActorDamage<'_> {
    fn apply_damage(&mut self, amount: u32) {
        self.health.take_damage(amount);
    }

    fn apply_impulse(&mut self, impulse: Vec3) {
        if let Some(knockback) = self.knockback.as_deref_mut() {
            knockback.push(impulse);
        }
    }

    fn is_alive(&self) -> bool {
        self.health.is_alive()
    }
}

/// Result of applying one hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageOutcome {
    pub applied: bool,
    pub killed: bool,
}

/// Apply damage + impulse; dead targets are left untouched.
pub fn apply_hit(target: &mut dyn Damageable, amount: u32, impulse: Vec3) -> DamageOutcome {
    if !target.is_alive() {
        return DamageOutcome {
            applied: false,
            killed: false,
        };
    }

    target.apply_damage(amount);
    if impulse != Vec3::ZERO {
        target.apply_impulse(impulse);
    }

    DamageOutcome {
        applied: true,
        killed: !target.is_alive(),
    }
}

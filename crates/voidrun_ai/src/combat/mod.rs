//! Combat behaviors: стратегии атаки для combat arbitrator.
//!
//! Каждая атака это маленький state machine: Idle/Cooldown → Active → Cooldown.
//! Core не применяет урон сам: он выдаёт `DamageRequest` / `ProjectileSpawn`,
//! а хост (ECS) применяет их к `Damageable` акторам.
//!
//! Содержит:
//! - MeleeAttackBehavior (area hit на середине замаха)
//! - RangedAttackBehavior (заряд → выстрел с упреждением → задержка)
//! - Projectile (полёт, первый контакт, lifetime)
//! - Damageable / Health / Knockback

pub mod damage;
pub mod melee;
pub mod projectile;
pub mod ranged;

pub use damage::{apply_hit, ActorDamage, DamageOutcome, Damageable, Health, Knockback};
pub use melee::{MeleeAttackBehavior, MeleePhase};
pub use projectile::{Projectile, ProjectileImpact, ProjectileStep};
pub use ranged::{predict_aim_point, RangedAttackBehavior, RangedPhase};

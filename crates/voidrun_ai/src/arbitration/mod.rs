//! Utility-based behavior arbitration.
//!
//! Каждый tick каждый слой (movement / combat):
//! 1. уменьшает cooldown ledger на dt
//! 2. опрашивает suitability всех не-подавленных behaviors (× weight)
//! 3. выбирает победителя (max score; ничья → текущий, затем первый зарегистрированный)
//! 4. при смене: Cleanup старого → Initialize нового
//!
//! Выбор детерминирован при одинаковых входах и одинаковом seed RNG.

use std::fmt;

use rand_chacha::ChaCha8Rng;

use crate::context::SituationalContext;
use crate::spatial::SpatialQuery;

pub mod combat;
pub mod controller;
pub mod cooldown;
pub mod movement;
pub mod selection;

#[cfg(test)]
mod arbitration_tests;
#[cfg(test)]
pub(crate) mod test_harness;

pub use combat::{CombatArbitrator, CombatBehavior, CombatEffects, DamageRequest, ProjectileSpawn};
pub use controller::{AgentController, AgentTickReport};
pub use cooldown::CooldownLedger;
pub use movement::{MovementArbitrator, MovementBehavior, MovementOutput};
pub use selection::{select_winner, BehaviorPool, Candidate};

/// Per-agent random stream (seeded from `DeterministicRng`).
pub type AgentRng = ChaCha8Rng;

/// Behavior identity: cooldown key + selection reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BehaviorId {
    CombatRepositioning,
    Dash,
    Dodge,
    Formation,
    Patrol,
    MeleeAttack,
    RangedAttack,
    /// Game-specific behaviors registered by the host
    Custom(&'static str),
}

impl fmt::Display for BehaviorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BehaviorId::Custom(name) => write!(f, "{}", name),
            other => write!(f, "{:?}", other),
        }
    }
}

/// Everything a behavior may touch besides the context.
pub struct BehaviorEnv<'a> {
    pub spatial: &'a dyn SpatialQuery,
    pub rng: &'a mut AgentRng,
    /// Ledger of the owning arbitrator
    pub cooldowns: &'a mut CooldownLedger,
    pub dt: f32,
}

/// Lifecycle shared by movement and combat behaviors.
///
/// Contract:
/// - `suitability` returns a score in [0, 1]; it may read the context,
///   query space and consume randomness, but it never mutates the context
/// - `initialize` runs once when the behavior becomes current
/// - `cleanup` runs once when it stops being current
pub trait Behavior: Send + Sync {
    fn id(&self) -> BehaviorId;

    fn suitability(&mut self, ctx: &SituationalContext, env: &mut BehaviorEnv<'_>) -> f32;

    fn initialize(&mut self, ctx: &SituationalContext, env: &mut BehaviorEnv<'_>);

    fn cleanup(&mut self, _ctx: &SituationalContext, _env: &mut BehaviorEnv<'_>) {}

    /// Mid-activity (dash in flight, dodge held): stays eligible while
    /// current even if its own cooldown is running.
    fn is_committed(&self) -> bool {
        false
    }
}

//! VOIDRUN AI: utility-based behavior arbitration core
//!
//! Каждый агент каждый tick выбирает лучшую стратегию из пула:
//! - movement слой: combat repositioning, dash, dodge, formation, patrol
//! - combat слой: melee, ranged (приоритет над movement)
//!
//! Core (arbitration / movement / combat / context) не зависит от ECS:
//! мир он видит только через `SpatialQuery`. ECS слой (`ecs`): один из хостов.

use std::time::Duration;

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// Публичные модули
pub mod arbitration;
pub mod combat;
pub mod context;
pub mod ecs;
pub mod logger;
pub mod movement;
pub mod settings;
pub mod spatial;
pub mod steering;

// Re-export основных типов
pub use arbitration::{
    AgentController, AgentTickReport, Behavior, BehaviorEnv, BehaviorId, CombatArbitrator,
    CombatBehavior, CombatEffects, CooldownLedger, DamageRequest, MovementArbitrator,
    MovementBehavior, MovementOutput, ProjectileSpawn,
};
pub use combat::{predict_aim_point, Damageable, Health, Knockback, Projectile};
pub use context::{SituationalContext, Threat, ThreatCategory};
pub use ecs::{
    spawn_agent, spawn_hazard, spawn_obstacle, Actor, AgentBrain, ArbitrationPlugin, DamageDealt,
    DamageRequested, Dead, EntityDied, ProjectileFired, SpatialPresence,
};
pub use logger::init_logger;
pub use settings::{AgentSettings, CombatSettings, MovementSettings, SettingsError};
pub use spatial::{SpatialFrame, SpatialQuery, SpatialSnapshot, SpatialTag};

/// Simulation tick rate (FixedUpdate).
pub const TICK_HZ: f64 = 60.0;

/// Главный plugin симуляции (fixed step + RNG + arbitration)
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app
            // Fixed timestep 60Hz для simulation tick
            .insert_resource(Time::<Fixed>::from_hz(TICK_HZ))
            .add_plugins(ArbitrationPlugin);

        // Детерминистичный RNG (seed по умолчанию), если хост не задал свой
        if !app.world().contains_resource::<DeterministicRng>() {
            app.insert_resource(DeterministicRng::new(42));
        }
    }
}

/// Детерминистичный RNG resource (seeded)
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Создаёт minimal Bevy App для headless симуляции
///
/// Каждый `app.update()` продвигает время ровно на один fixed tick,
/// независимо от wall clock.
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    init_logger();
    app.add_plugins(MinimalPlugins)
        .insert_resource(DeterministicRng::new(seed))
        .insert_resource(Time::<Fixed>::from_hz(TICK_HZ))
        .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f64(
            1.0 / TICK_HZ,
        )));

    app
}

/// Snapshot мира для сравнения детерминизма
pub fn world_snapshot<T: Component>(world: &mut World) -> Vec<u8>
where
    T: std::fmt::Debug,
{
    let mut snapshot = Vec::new();

    let mut query = world.query::<(Entity, &T)>();
    let mut entities: Vec<_> = query.iter(world).collect();

    // Сортируем по Entity ID для детерминизма
    entities.sort_by_key(|(entity, _)| entity.index());

    // Сериализуем в байты через Debug (простейший способ)
    for (entity, component) in entities {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", component).as_bytes());
    }

    snapshot
}

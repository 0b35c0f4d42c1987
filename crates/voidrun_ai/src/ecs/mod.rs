//! ECS integration: arbitration agents как Bevy entities.
//!
//! Порядок выполнения (FixedUpdate, chain для детерминизма):
//! 1. rebuild_spatial_snapshot: pre-step состояние мира
//! 2. acquire_targets: ближайший враг в detection radius
//! 3. tick_agents: AgentController по возрастанию Entity index
//! 4. advance_projectiles: полёт + первый контакт
//! 5. apply_damage: DamageRequested → Health / Knockback
//! 6. apply_knockback: смещение + затухание
//! 7. disable_ai_on_death: снимаем AgentBrain, ставим Dead

use bevy::prelude::*;
use rand::Rng;

use crate::arbitration::AgentController;
use crate::combat::{Health, Knockback};
use crate::logger;
use crate::settings::{AgentSettings, SettingsError};
use crate::spatial::{SpatialFrame, SpatialSnapshot, SpatialTag};
use crate::DeterministicRng;

pub mod components;
pub mod systems;

pub use components::{Actor, AgentBrain, Dead, SpatialPresence};
pub use systems::{DamageDealt, DamageRequested, EntityDied, ProjectileFired};

/// Default collision radius of an agent body.
pub const AGENT_RADIUS: f32 = 0.5;

pub struct ArbitrationPlugin;

impl Plugin for ArbitrationPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SpatialSnapshot>()
            .add_event::<DamageRequested>()
            .add_event::<DamageDealt>()
            .add_event::<EntityDied>()
            .add_event::<ProjectileFired>();

        app.add_systems(
            FixedUpdate,
            (
                systems::rebuild_spatial_snapshot,
                systems::acquire_targets,
                systems::tick_agents,
                systems::advance_projectiles,
                systems::apply_damage,
                systems::apply_knockback,
                systems::disable_ai_on_death,
            )
                .chain(), // Последовательное выполнение для детерминизма
        );
    }
}

/// Spawn an arbitration-driven agent.
///
/// Seed агента берётся из `DeterministicRng` (если ресурса нет: из Entity index).
pub fn spawn_agent(
    world: &mut World,
    position: Vec3,
    faction_id: u64,
    max_health: u32,
    settings: AgentSettings,
) -> Result<Entity, SettingsError> {
    if let Err(error) = settings.validate() {
        logger::log_warning(&format!("⚠️ spawn_agent at {:?}: settings rejected: {}", position, error));
        return Err(error);
    }

    let seed = match world.get_resource_mut::<DeterministicRng>() {
        Some(mut rng) => rng.rng.gen::<u64>(),
        None => 0,
    };

    let entity = world
        .spawn((
            Transform::from_translation(position),
            Actor { faction_id },
            Health::new(max_health),
            Knockback::default(),
            SpatialPresence::agent(AGENT_RADIUS),
        ))
        .id();

    let controller = AgentController::new(
        entity,
        faction_id,
        SpatialFrame::from_translation(position),
        settings,
        seed ^ u64::from(entity.index()),
    )?;
    world.entity_mut(entity).insert(AgentBrain(controller));

    Ok(entity)
}

/// Static obstacle (blocks rays, movement sampling and projectiles).
pub fn spawn_obstacle(world: &mut World, position: Vec3, radius: f32) -> Entity {
    world
        .spawn((
            Transform::from_translation(position),
            SpatialPresence::obstacle(radius),
        ))
        .id()
}

/// Environmental hazard (sensed as a threat).
pub fn spawn_hazard(world: &mut World, position: Vec3, radius: f32) -> Entity {
    world
        .spawn((
            Transform::from_translation(position),
            SpatialPresence {
                radius,
                tag: SpatialTag::Hazard,
            },
        ))
        .id()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::capture;

    #[test]
    fn test_spawn_agent_rejects_and_logs_invalid_settings() {
        capture::install();
        let mut world = World::new();
        let mut settings = AgentSettings::default();
        settings.movement.move_speed = -9.375;

        let result = spawn_agent(&mut world, Vec3::ZERO, 1, 100, settings);

        assert!(matches!(
            result,
            Err(SettingsError::NonPositive { field: "move_speed", .. })
        ));
        assert!(capture::contains(logger::LogLevel::Warning, "-9.375"));

        // Ничего не заспавнено
        let mut actors = world.query::<&Actor>();
        assert_eq!(actors.iter(&world).count(), 0);
    }
}

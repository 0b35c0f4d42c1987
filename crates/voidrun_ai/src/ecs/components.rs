//! ECS components for arbitration-driven actors.

use bevy::prelude::*;

use crate::arbitration::AgentController;
use crate::spatial::SpatialTag;

/// Актор (NPC или игрок). Фракция определяет врагов и союзников.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Reflect)]
#[reflect(Component)]
pub struct Actor {
    pub faction_id: u64,
}

/// Presence in the spatial snapshot: sphere radius + category tag.
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub struct SpatialPresence {
    pub radius: f32,
    pub tag: SpatialTag,
}

impl SpatialPresence {
    pub fn agent(radius: f32) -> Self {
        Self {
            radius,
            tag: SpatialTag::Agent,
        }
    }

    pub fn obstacle(radius: f32) -> Self {
        Self {
            radius,
            tag: SpatialTag::Obstacle,
        }
    }
}

/// Per-agent arbitration state (context, both layers, RNG).
///
/// Снимается при смерти: мёртвые не думают.
#[derive(Component)]
pub struct AgentBrain(pub AgentController);

impl std::fmt::Debug for AgentBrain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentBrain")
            .field("movement", &self.0.movement().current_id())
            .field("combat", &self.0.combat().current_id())
            .field("target", &self.0.target())
            .finish()
    }
}

/// Компонент-маркер: entity мертв (Health == 0)
///
/// Деспавн не автоматический: трупы остаются на месте,
/// но из spatial snapshot исключаются.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Dead;

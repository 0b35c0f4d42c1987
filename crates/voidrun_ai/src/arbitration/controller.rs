//! Agent Controller: один агент, два слоя арбитража.
//!
//! Порядок tick:
//! 1. agent clock += dt
//! 2. context: target refresh, range scratch, threats, allies
//! 3. combat arbitrator (priority layer)
//! 4. combat action in progress → movement пропускается целиком
//!    (ни decay cooldowns, ни scoring); иначе movement arbitrator

use std::sync::Arc;

use bevy::prelude::*;
use rand::SeedableRng;

use crate::context::SituationalContext;
use crate::logger;
use crate::settings::{AgentSettings, SettingsError};
use crate::spatial::{SpatialFrame, SpatialQuery, LAYER_AGENTS, MASK_THREATS};

use super::{
    AgentRng, BehaviorId, CombatArbitrator, CombatEffects, MovementArbitrator, MovementOutput,
};

/// What happened during one agent tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AgentTickReport {
    pub movement: Option<BehaviorId>,
    pub combat: Option<BehaviorId>,
    /// Combat held priority: movement was not ticked
    pub movement_skipped: bool,
    pub motion: MovementOutput,
    pub effects: CombatEffects,
}

pub struct AgentController {
    context: SituationalContext,
    movement: MovementArbitrator,
    combat: CombatArbitrator,
    settings: Arc<AgentSettings>,
    rng: AgentRng,
}

impl AgentController {
    /// Controller with the standard behavior pools.
    pub fn new(
        entity: Entity,
        faction: u64,
        frame: SpatialFrame,
        settings: AgentSettings,
        seed: u64,
    ) -> Result<Self, SettingsError> {
        if let Err(error) = settings.validate() {
            logger::log_warning(&format!("⚠️ {:?}: agent settings rejected: {}", entity, error));
            return Err(error);
        }
        let settings = Arc::new(settings);

        Ok(Self::with_arbitrators(
            SituationalContext::new(entity, faction, frame),
            MovementArbitrator::with_default_behaviors(settings.clone()),
            CombatArbitrator::with_default_behaviors(settings.clone()),
            settings,
            seed,
        ))
    }

    /// Custom pools (host-specific behaviors).
    pub fn with_arbitrators(
        context: SituationalContext,
        movement: MovementArbitrator,
        combat: CombatArbitrator,
        settings: Arc<AgentSettings>,
        seed: u64,
    ) -> Self {
        Self {
            context,
            movement,
            combat,
            settings,
            rng: AgentRng::seed_from_u64(seed),
        }
    }

    pub fn context(&self) -> &SituationalContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut SituationalContext {
        &mut self.context
    }

    pub fn movement(&self) -> &MovementArbitrator {
        &self.movement
    }

    pub fn movement_mut(&mut self) -> &mut MovementArbitrator {
        &mut self.movement
    }

    pub fn combat(&self) -> &CombatArbitrator {
        &self.combat
    }

    pub fn combat_mut(&mut self) -> &mut CombatArbitrator {
        &mut self.combat
    }

    pub fn settings(&self) -> &AgentSettings {
        &self.settings
    }

    pub fn set_target(&mut self, target: Option<Entity>) {
        self.context.set_target(target);
    }

    pub fn target(&self) -> Option<Entity> {
        self.context.target_entity()
    }

    pub fn frame(&self) -> SpatialFrame {
        self.context.frame
    }

    /// Host moved the agent (physics, teleport): adopt its frame.
    pub fn sync_frame(&mut self, frame: SpatialFrame) {
        self.context.frame = frame;
    }

    pub fn tick(&mut self, spatial: &dyn SpatialQuery, dt: f32) -> AgentTickReport {
        self.context.elapsed += dt;
        self.sense(spatial);

        let effects = self.combat.tick(&mut self.context, spatial, &mut self.rng, dt);

        let movement_skipped = self.combat.is_action_in_progress();
        let motion = if movement_skipped {
            // Атака в процессе: стоим, movement не трогаем
            self.context.current_velocity = Vec3::ZERO;
            MovementOutput {
                behavior: self.movement.current_id(),
                ..MovementOutput::default()
            }
        } else {
            self.movement.tick(&mut self.context, spatial, &mut self.rng, dt)
        };

        AgentTickReport {
            movement: self.movement.current_id(),
            combat: self.combat.current_id(),
            movement_skipped,
            motion,
            effects,
        }
    }

    fn sense(&mut self, spatial: &dyn SpatialQuery) {
        let movement = &self.settings.movement;
        let combat = &self.settings.combat;

        self.context.refresh(spatial);
        self.context
            .update_ranges(combat.melee_attack_range, combat.ranged_attack_range);
        self.context.sense_threats(
            spatial,
            movement.threat_detection_radius,
            MASK_THREATS,
            movement.max_query_results,
        );
        self.context.sense_allies(
            spatial,
            movement.ally_detection_radius,
            LAYER_AGENTS,
            movement.max_query_results,
        );
    }
}

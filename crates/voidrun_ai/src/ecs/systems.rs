//! FixedUpdate systems: snapshot → targets → agents → projectiles → damage.

use bevy::prelude::*;

use crate::combat::{apply_hit, ActorDamage, Health, Knockback, Projectile, ProjectileStep};
use crate::logger;
use crate::spatial::{
    get_layer_name, SpatialBody, SpatialFrame, SpatialQuery, SpatialSnapshot, SpatialTag,
    LAYER_AGENTS,
};

use super::components::{Actor, AgentBrain, Dead, SpatialPresence};

// ============================================================================
// Events
// ============================================================================

/// Событие: кто-то хочет нанести урон (melee hit или projectile impact)
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct DamageRequested {
    pub source: Entity,
    pub target: Entity,
    pub amount: u32,
    pub knockback: Vec3,
}

/// Событие: урон нанесен
///
/// Генерируется после применения damage к Health.
#[derive(Event, Debug, Clone)]
pub struct DamageDealt {
    pub attacker: Entity,
    pub target: Entity,
    pub damage: u32,
    pub target_died: bool,
}

/// Событие: entity умер (health == 0)
#[derive(Event, Debug, Clone)]
pub struct EntityDied {
    pub entity: Entity,
    pub killer: Option<Entity>,
}

/// Событие: projectile заспавнен
#[derive(Event, Debug, Clone)]
pub struct ProjectileFired {
    pub projectile: Entity,
    pub owner: Entity,
}

// ============================================================================
// Systems
// ============================================================================

/// System: пересобираем spatial snapshot из живых entities
///
/// Все агенты в этом fixed step читают одно и то же (pre-step) состояние мира.
pub fn rebuild_spatial_snapshot(
    mut snapshot: ResMut<SpatialSnapshot>,
    bodies: Query<
        (
            Entity,
            &Transform,
            &SpatialPresence,
            Option<&Actor>,
            Option<&AgentBrain>,
            Option<&Projectile>,
        ),
        Without<Dead>,
    >,
) {
    snapshot.clear();

    for (entity, transform, presence, actor, brain, projectile) in bodies.iter() {
        let mut body = SpatialBody::new(entity, transform.translation, presence.radius, presence.tag)
            .with_rotation(transform.rotation);

        if let Some(actor) = actor {
            body = body.with_faction(actor.faction_id);
        }
        if let Some(brain) = brain {
            body = body.with_velocity(brain.0.context().current_velocity);
        }
        if let Some(projectile) = projectile {
            body = body
                .with_velocity(projectile.velocity())
                .with_owner(projectile.owner);
        }

        snapshot.insert(body);
    }
}

/// System: выбор цели (ближайший живой враг в detection radius)
///
/// Текущая цель сохраняется, пока она есть в snapshot.
pub fn acquire_targets(
    snapshot: Res<SpatialSnapshot>,
    mut agents: Query<(Entity, &Actor, &Transform, &mut AgentBrain), Without<Dead>>,
) {
    for (entity, actor, transform, mut brain) in agents.iter_mut() {
        if let Some(current) = brain.0.target() {
            if snapshot.lookup(current).is_some() {
                continue;
            }
        }

        let movement = &brain.0.settings().movement;
        let nearest_enemy = snapshot
            .query_nearby(
                transform.translation,
                movement.detection_radius,
                LAYER_AGENTS,
                movement.max_query_results,
            )
            .into_iter()
            .find(|hit| {
                hit.entity != entity
                    && hit.tag == SpatialTag::Agent
                    && hit.faction.is_some_and(|faction| faction != actor.faction_id)
            })
            .map(|hit| hit.entity);

        if nearest_enemy != brain.0.target() {
            if let Some(enemy) = nearest_enemy {
                logger::log(&format!("🎯 {:?} acquired target {:?}", entity, enemy));
            }
            brain.0.set_target(nearest_enemy);
        }
    }
}

/// System: tick всех агентов в порядке Entity index (детерминизм)
pub fn tick_agents(
    mut commands: Commands,
    time: Res<Time<Fixed>>,
    snapshot: Res<SpatialSnapshot>,
    mut agents: Query<(Entity, &mut Transform, &mut AgentBrain), Without<Dead>>,
    mut damage_events: EventWriter<DamageRequested>,
    mut fired_events: EventWriter<ProjectileFired>,
) {
    let delta = time.delta_secs();
    if delta <= 0.0 {
        return;
    }

    let mut order: Vec<Entity> = agents.iter().map(|(entity, _, _)| entity).collect();
    order.sort_by_key(|entity| entity.index());

    for entity in order {
        let Ok((_, mut transform, mut brain)) = agents.get_mut(entity) else {
            continue;
        };

        // Knockback / внешние силы могли сдвинуть агента
        brain.0.sync_frame(SpatialFrame::from(&*transform));

        let report = brain.0.tick(&*snapshot, delta);

        *transform = brain.0.frame().to_transform().with_scale(transform.scale);

        for request in &report.effects.damage {
            damage_events.write(DamageRequested {
                source: request.source,
                target: request.target,
                amount: request.amount,
                knockback: request.knockback,
            });
        }

        for spawn in &report.effects.projectiles {
            let projectile = commands
                .spawn((
                    Projectile::from_spawn(spawn),
                    Transform::from_translation(spawn.position),
                    SpatialPresence {
                        radius: spawn.radius,
                        tag: SpatialTag::Projectile,
                    },
                ))
                .id();
            fired_events.write(ProjectileFired {
                projectile,
                owner: spawn.owner,
            });
        }
    }
}

/// System: полёт projectiles, первый контакт → DamageRequested + despawn
pub fn advance_projectiles(
    mut commands: Commands,
    time: Res<Time<Fixed>>,
    snapshot: Res<SpatialSnapshot>,
    mut projectiles: Query<(Entity, &mut Projectile, &mut Transform)>,
    mut damage_events: EventWriter<DamageRequested>,
) {
    let delta = time.delta_secs();

    let mut order: Vec<Entity> = projectiles.iter().map(|(entity, _, _)| entity).collect();
    order.sort_by_key(|entity| entity.index());

    for entity in order {
        let Ok((_, mut projectile, mut transform)) = projectiles.get_mut(entity) else {
            continue;
        };

        match projectile.step(delta, &*snapshot) {
            ProjectileStep::Flying => {
                transform.translation = projectile.position;
            }
            ProjectileStep::Hit(impact) => {
                logger::log(&format!(
                    "💥 projectile {:?} hit {:?} ({})",
                    entity,
                    impact.target,
                    get_layer_name(impact.tag.layer())
                ));
                if impact.tag == SpatialTag::Agent {
                    damage_events.write(DamageRequested {
                        source: impact.owner,
                        target: impact.target,
                        amount: impact.damage,
                        knockback: Vec3::ZERO,
                    });
                }
                commands.entity(entity).despawn();
            }
            ProjectileStep::Expired => {
                commands.entity(entity).despawn();
            }
        }
    }
}

/// System: применяем DamageRequested к Damageable акторам
///
/// Entity без Health (стены, мёртвые) молча игнорируются.
pub fn apply_damage(
    mut requests: EventReader<DamageRequested>,
    mut targets: Query<(&mut Health, Option<&mut Knockback>), Without<Dead>>,
    mut damage_dealt_events: EventWriter<DamageDealt>,
    mut entity_died_events: EventWriter<EntityDied>,
) {
    for request in requests.read() {
        let Ok((mut health, knockback)) = targets.get_mut(request.target) else {
            continue;
        };

        let mut actor = ActorDamage {
            health: &mut *health,
            knockback: knockback.map(|knockback| knockback.into_inner()),
        };
        let outcome = apply_hit(&mut actor, request.amount, request.knockback);
        if !outcome.applied {
            continue;
        }

        damage_dealt_events.write(DamageDealt {
            attacker: request.source,
            target: request.target,
            damage: request.amount,
            target_died: outcome.killed,
        });

        if outcome.killed {
            entity_died_events.write(EntityDied {
                entity: request.target,
                killer: Some(request.source),
            });
        }
    }
}

/// System: knockback сдвигает актора и затухает
pub fn apply_knockback(time: Res<Time<Fixed>>, mut actors: Query<(&mut Knockback, &mut Transform)>) {
    let delta = time.delta_secs();

    for (mut knockback, mut transform) in actors.iter_mut() {
        if knockback.is_idle() {
            continue;
        }
        let displacement = knockback.advance(delta);
        transform.translation += displacement;
    }
}

/// System: смерть → AI отключается, entity получает маркер Dead
pub fn disable_ai_on_death(mut commands: Commands, mut died_events: EventReader<EntityDied>) {
    for event in died_events.read() {
        commands.entity(event.entity).remove::<AgentBrain>().insert(Dead);
        logger::log_info(&format!(
            "💀 {:?} died (killer {:?}) → AI disabled",
            event.entity, event.killer
        ));
    }
}

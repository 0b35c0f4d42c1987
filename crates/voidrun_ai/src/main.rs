//! Headless симуляция VOIDRUN AI
//!
//! Два отряда + препятствия, 1200 тиков (20 sec при 60Hz)

use bevy::prelude::*;
use voidrun_ai::logger::{self, LogLevel};
use voidrun_ai::{
    create_headless_app, spawn_agent, spawn_obstacle, Actor, AgentSettings, Dead, Health,
    SettingsError, SimulationPlugin,
};

const TICKS: usize = 1200;
const SQUAD_SIZE: usize = 3;

fn main() -> Result<(), SettingsError> {
    let seed = 42;
    println!("Starting VOIDRUN AI headless simulation (seed: {})", seed);

    let mut app = create_headless_app(seed);
    app.add_plugins(SimulationPlugin);
    logger::set_log_level(LogLevel::Info);

    let world = app.world_mut();
    for i in 0..SQUAD_SIZE {
        let offset = i as f32 * 2.0;
        spawn_agent(world, Vec3::new(-12.0, 0.0, offset), 1, 100, AgentSettings::default())?;
        spawn_agent(world, Vec3::new(12.0, 0.0, offset), 2, 100, AgentSettings::default())?;
    }
    spawn_obstacle(world, Vec3::new(0.0, 0.0, 2.0), 1.5);
    spawn_obstacle(world, Vec3::new(0.0, 0.0, -4.0), 1.0);

    for tick in 0..TICKS {
        app.update();

        if tick % 200 == 0 {
            print_status(app.world_mut(), tick);
        }
    }
    print_status(app.world_mut(), TICKS);

    println!("Simulation complete!");
    Ok(())
}

fn print_status(world: &mut World, tick: usize) {
    let mut query = world.query::<(Entity, &Actor, &Health, Option<&Dead>)>();
    let mut actors: Vec<_> = query.iter(world).collect();
    actors.sort_by_key(|(entity, ..)| entity.index());

    let alive = actors.iter().filter(|(.., dead)| dead.is_none()).count();
    println!("Tick {}: {} / {} actors alive", tick, alive, actors.len());
    for (entity, actor, health, dead) in actors {
        println!(
            "  {:?} faction {} HP {}/{}{}",
            entity,
            actor.faction_id,
            health.current,
            health.max,
            if dead.is_some() { " (dead)" } else { "" }
        );
    }
}

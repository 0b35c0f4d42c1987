//! Тесты детерминизма
//!
//! Проверяем что симуляция с одинаковым seed даёт идентичные результаты:
//! позиции, здоровье и выбор стратегий у всех агентов.

use bevy::prelude::*;
use voidrun_ai::{
    create_headless_app, spawn_agent, spawn_hazard, spawn_obstacle, world_snapshot, AgentBrain,
    AgentSettings, Health, SimulationPlugin,
};

const SQUAD_SIZE: usize = 4;

#[test]
fn test_determinism_same_seed() {
    const SEED: u64 = 12345;
    const TICK_COUNT: usize = 600;

    // Первый прогон
    let snapshot1 = run_simulation(SEED, TICK_COUNT);

    // Второй прогон с тем же seed
    let snapshot2 = run_simulation(SEED, TICK_COUNT);

    // Снепшоты должны быть идентичны
    assert_eq!(
        snapshot1, snapshot2,
        "Симуляция с одинаковым seed ({}) дала разные результаты!",
        SEED
    );
}

#[test]
fn test_determinism_multiple_runs() {
    const SEED: u64 = 42;
    const TICK_COUNT: usize = 300;

    // Запускаем 3 раза: все должны быть идентичны
    let snapshots: Vec<_> = (0..3).map(|_| run_simulation(SEED, TICK_COUNT)).collect();

    // Все снепшоты должны совпадать с первым
    for (i, snapshot) in snapshots.iter().enumerate().skip(1) {
        assert_eq!(
            snapshots[0], *snapshot,
            "Прогон {} дал результат отличный от прогона 0",
            i
        );
    }
}

/// Запускает симуляцию и возвращает snapshot мира
fn run_simulation(seed: u64, tick_count: usize) -> Vec<u8> {
    let mut app = create_headless_app(seed);
    app.add_plugins(SimulationPlugin);

    let world = app.world_mut();
    for i in 0..SQUAD_SIZE {
        let z = i as f32 * 2.5;
        spawn_agent(world, Vec3::new(-8.0, 0.0, z), 1, 100, AgentSettings::default())
            .expect("valid settings");
        spawn_agent(world, Vec3::new(8.0, 0.0, z), 2, 100, AgentSettings::default())
            .expect("valid settings");
    }
    spawn_obstacle(world, Vec3::new(0.0, 0.0, 3.0), 1.5);
    spawn_hazard(world, Vec3::new(0.0, 0.0, -3.0), 1.0);

    // Прогоняем симуляцию
    for _ in 0..tick_count {
        app.update();
    }

    // Возвращаем snapshot
    let world = app.world_mut();
    let mut snapshot = world_snapshot::<Transform>(world);
    snapshot.extend(world_snapshot::<Health>(world));
    snapshot.extend(world_snapshot::<AgentBrain>(world));
    snapshot
}

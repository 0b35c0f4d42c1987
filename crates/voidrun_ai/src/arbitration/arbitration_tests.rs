//! Tests for selection, lifecycle transitions and the cooldown ledger.

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use bevy::prelude::*;
    use rand::SeedableRng;

    use crate::arbitration::{
        select_winner, AgentController, AgentRng, Behavior, BehaviorEnv, BehaviorId, Candidate,
        CombatArbitrator, CombatBehavior, CombatEffects, CooldownLedger, MovementArbitrator,
        MovementBehavior,
    };
    use crate::context::SituationalContext;
    use crate::logger::{self, capture};
    use crate::settings::{AgentSettings, SettingsError};
    use crate::spatial::{SpatialBody, SpatialFrame, SpatialSnapshot, SpatialTag};

    // ========================================================================
    // Scripted behaviors
    // ========================================================================

    #[derive(Debug, Default)]
    struct Script {
        score: f32,
        scored: u32,
        initialized: u32,
        cleaned: u32,
        committed: bool,
        in_progress: bool,
        cooldown_on_init: f32,
    }

    type Shared = Arc<Mutex<Script>>;

    fn script(score: f32) -> Shared {
        Arc::new(Mutex::new(Script {
            score,
            ..Script::default()
        }))
    }

    struct Scripted {
        id: BehaviorId,
        state: Shared,
        direction: Vec3,
    }

    impl Scripted {
        fn boxed(name: &'static str, state: &Shared) -> Box<Self> {
            Box::new(Self {
                id: BehaviorId::Custom(name),
                state: state.clone(),
                direction: Vec3::X,
            })
        }
    }

    impl Behavior for Scripted {
        fn id(&self) -> BehaviorId {
            self.id
        }

        fn suitability(&mut self, _ctx: &SituationalContext, _env: &mut BehaviorEnv<'_>) -> f32 {
            let mut state = self.state.lock().unwrap();
            state.scored += 1;
            state.score
        }

        fn initialize(&mut self, _ctx: &SituationalContext, env: &mut BehaviorEnv<'_>) {
            let mut state = self.state.lock().unwrap();
            state.initialized += 1;
            if state.cooldown_on_init > 0.0 {
                env.cooldowns.set(self.id, state.cooldown_on_init);
            }
        }

        fn cleanup(&mut self, _ctx: &SituationalContext, _env: &mut BehaviorEnv<'_>) {
            self.state.lock().unwrap().cleaned += 1;
        }

        fn is_committed(&self) -> bool {
            self.state.lock().unwrap().committed
        }
    }

    impl MovementBehavior for Scripted {
        fn calculate_direction(&mut self, _ctx: &SituationalContext, _env: &mut BehaviorEnv<'_>) -> Vec3 {
            self.direction
        }
    }

    impl CombatBehavior for Scripted {
        fn execute(
            &mut self,
            _ctx: &mut SituationalContext,
            _env: &mut BehaviorEnv<'_>,
            _effects: &mut CombatEffects,
        ) {
        }

        fn is_action_in_progress(&self) -> bool {
            self.state.lock().unwrap().in_progress
        }
    }

    fn setup() -> (SituationalContext, SpatialSnapshot, AgentRng) {
        (
            SituationalContext::new(Entity::from_raw(1), 1, SpatialFrame::default()),
            SpatialSnapshot::new(),
            AgentRng::seed_from_u64(7),
        )
    }

    const DT: f32 = 1.0 / 60.0;

    // ========================================================================
    // Selection
    // ========================================================================

    #[test]
    fn test_select_winner_strict_max() {
        let candidates = [
            Candidate { index: 0, score: 0.3 },
            Candidate { index: 1, score: 0.9 },
            Candidate { index: 2, score: 0.5 },
        ];
        assert_eq!(select_winner(&candidates, Some(2)), Some(1));
        assert_eq!(select_winner(&[], Some(0)), None);
    }

    #[test]
    fn test_select_winner_tie_keeps_current_then_first_registered() {
        let candidates = [
            Candidate { index: 0, score: 0.2 },
            Candidate { index: 1, score: 0.7 },
            Candidate { index: 3, score: 0.7 },
        ];
        assert_eq!(select_winner(&candidates, Some(3)), Some(3));
        assert_eq!(select_winner(&candidates, Some(0)), Some(1));
        assert_eq!(select_winner(&candidates, None), Some(1));
    }

    #[test]
    fn test_suppressed_behavior_excluded_from_candidacy() {
        let (mut ctx, snapshot, mut rng) = setup();
        let a = script(0.9);
        let b = script(0.5);

        let mut arbitrator = MovementArbitrator::new(4.0, 10.0);
        arbitrator.register(Scripted::boxed("a", &a), 1.0);
        arbitrator.register(Scripted::boxed("b", &b), 1.0);
        arbitrator.cooldowns_mut().set(BehaviorId::Custom("a"), 1.0);

        arbitrator.tick(&mut ctx, &snapshot, &mut rng, DT);

        assert_eq!(arbitrator.current_id(), Some(BehaviorId::Custom("b")));
        // Omitted, not scored as 0
        assert_eq!(a.lock().unwrap().scored, 0);
        assert_eq!(a.lock().unwrap().initialized, 0);
    }

    #[test]
    fn test_lifecycle_hooks_only_on_transition() {
        let (mut ctx, snapshot, mut rng) = setup();
        let a = script(0.6);
        let b = script(0.4);

        let mut arbitrator = MovementArbitrator::new(4.0, 10.0);
        arbitrator.register(Scripted::boxed("a", &a), 1.0);
        arbitrator.register(Scripted::boxed("b", &b), 1.0);

        for _ in 0..5 {
            arbitrator.tick(&mut ctx, &snapshot, &mut rng, DT);
        }
        assert_eq!(a.lock().unwrap().initialized, 1);
        assert_eq!(a.lock().unwrap().cleaned, 0);

        b.lock().unwrap().score = 0.8;
        for _ in 0..3 {
            arbitrator.tick(&mut ctx, &snapshot, &mut rng, DT);
        }

        assert_eq!(arbitrator.current_id(), Some(BehaviorId::Custom("b")));
        assert_eq!(a.lock().unwrap().cleaned, 1);
        assert_eq!(b.lock().unwrap().initialized, 1);
        assert_eq!(b.lock().unwrap().cleaned, 0);
    }

    #[test]
    fn test_equal_scores_keep_current() {
        let (mut ctx, snapshot, mut rng) = setup();
        let a = script(0.4);
        let b = script(0.5);

        let mut arbitrator = MovementArbitrator::new(4.0, 10.0);
        arbitrator.register(Scripted::boxed("a", &a), 1.0);
        arbitrator.register(Scripted::boxed("b", &b), 1.0);

        arbitrator.tick(&mut ctx, &snapshot, &mut rng, DT);
        assert_eq!(arbitrator.current_id(), Some(BehaviorId::Custom("b")));

        // Ничья: остаётся текущий, хотя "a" зарегистрирован первым
        a.lock().unwrap().score = 0.5;
        arbitrator.tick(&mut ctx, &snapshot, &mut rng, DT);
        assert_eq!(arbitrator.current_id(), Some(BehaviorId::Custom("b")));
        assert_eq!(a.lock().unwrap().initialized, 0);
    }

    #[test]
    fn test_weight_permutation_decides_winner() {
        // dodge: danger 0.8 × 0.9 = 0.72, repositioning: 0.8
        let cases = [
            ((1.0, 1.0), "reposition"),
            ((0.5, 1.0), "dodge"),
            ((1.0, 2.0), "dodge"),
            ((1.0, 0.5), "reposition"),
        ];

        for ((reposition_weight, dodge_weight), expected) in cases {
            let (mut ctx, snapshot, mut rng) = setup();
            let reposition = script(0.8);
            let dodge = script(0.72);

            let mut arbitrator = MovementArbitrator::new(4.0, 10.0);
            arbitrator.register(Scripted::boxed("reposition", &reposition), reposition_weight);
            arbitrator.register(Scripted::boxed("dodge", &dodge), dodge_weight);

            arbitrator.tick(&mut ctx, &snapshot, &mut rng, DT);

            assert_eq!(
                arbitrator.current_id(),
                Some(BehaviorId::Custom(expected)),
                "weights {:?}",
                (reposition_weight, dodge_weight)
            );
        }
    }

    #[test]
    fn test_weight_permutation_registration_order() {
        for swap in [false, true] {
            let (mut ctx, snapshot, mut rng) = setup();
            let first = script(0.5);
            let second = script(0.5);

            let mut arbitrator = MovementArbitrator::new(4.0, 10.0);
            if swap {
                arbitrator.register(Scripted::boxed("second", &second), 1.0);
                arbitrator.register(Scripted::boxed("first", &first), 1.0);
            } else {
                arbitrator.register(Scripted::boxed("first", &first), 1.0);
                arbitrator.register(Scripted::boxed("second", &second), 1.0);
            }

            arbitrator.tick(&mut ctx, &snapshot, &mut rng, DT);

            let expected = if swap { "second" } else { "first" };
            assert_eq!(arbitrator.current_id(), Some(BehaviorId::Custom(expected)));
        }
    }

    #[test]
    fn test_movement_fallback_when_all_suppressed() {
        let (mut ctx, snapshot, mut rng) = setup();
        let a = script(0.9);
        let b = script(0.5);

        let mut arbitrator = MovementArbitrator::new(4.0, 10.0);
        arbitrator.register(Scripted::boxed("a", &a), 1.0);
        arbitrator.register(Scripted::boxed("b", &b), 1.0);
        arbitrator.set_fallback(Some(BehaviorId::Custom("b")));
        arbitrator.cooldowns_mut().set(BehaviorId::Custom("a"), 1.0);
        arbitrator.cooldowns_mut().set(BehaviorId::Custom("b"), 1.0);

        let output = arbitrator.tick(&mut ctx, &snapshot, &mut rng, DT);

        assert_eq!(output.behavior, Some(BehaviorId::Custom("b")));
        assert_eq!(b.lock().unwrap().initialized, 1);
        // Fallback двигает агента: X × move_speed × dt
        assert!((ctx.position().x - 4.0 * DT).abs() < 1e-5);
    }

    #[test]
    fn test_nan_score_is_skipped() {
        let (mut ctx, snapshot, mut rng) = setup();
        let a = script(f32::NAN);
        let b = script(0.1);

        let mut arbitrator = MovementArbitrator::new(4.0, 10.0);
        arbitrator.register(Scripted::boxed("a", &a), 1.0);
        arbitrator.register(Scripted::boxed("b", &b), 1.0);

        arbitrator.tick(&mut ctx, &snapshot, &mut rng, DT);
        assert_eq!(arbitrator.current_id(), Some(BehaviorId::Custom("b")));
    }

    #[test]
    fn test_committed_current_survives_own_cooldown() {
        let (mut ctx, snapshot, mut rng) = setup();
        let sticky = script(0.9);
        let other = script(0.5);
        {
            let mut state = sticky.lock().unwrap();
            state.cooldown_on_init = 2.0;
            state.committed = true;
        }

        let mut arbitrator = MovementArbitrator::new(4.0, 10.0);
        arbitrator.register(Scripted::boxed("sticky", &sticky), 1.0);
        arbitrator.register(Scripted::boxed("other", &other), 1.0);

        for _ in 0..10 {
            arbitrator.tick(&mut ctx, &snapshot, &mut rng, DT);
        }
        assert_eq!(arbitrator.current_id(), Some(BehaviorId::Custom("sticky")));
        assert_eq!(sticky.lock().unwrap().initialized, 1);

        // Активность закончилась → cooldown снова подавляет
        sticky.lock().unwrap().committed = false;
        arbitrator.tick(&mut ctx, &snapshot, &mut rng, DT);
        assert_eq!(arbitrator.current_id(), Some(BehaviorId::Custom("other")));
        assert_eq!(sticky.lock().unwrap().cleaned, 1);
    }

    #[test]
    fn test_combat_layer_has_no_fallback() {
        let (mut ctx, snapshot, mut rng) = setup();
        let melee = script(0.9);

        let mut arbitrator = CombatArbitrator::new();
        arbitrator.register(Scripted::boxed("melee", &melee), 1.0);

        arbitrator.tick(&mut ctx, &snapshot, &mut rng, DT);
        assert_eq!(arbitrator.current_id(), Some(BehaviorId::Custom("melee")));

        // Единственный кандидат выпал → combat слой ничего не делает
        melee.lock().unwrap().score = f32::NAN;
        let effects = arbitrator.tick(&mut ctx, &snapshot, &mut rng, DT);

        assert!(effects.is_empty());
        assert_eq!(arbitrator.current_id(), None);
        assert_eq!(melee.lock().unwrap().cleaned, 1);
        assert!(!arbitrator.is_action_in_progress());
    }

    // ========================================================================
    // Controller priority
    // ========================================================================

    #[test]
    fn test_combat_in_progress_skips_movement_entirely() {
        let (ctx, snapshot, _) = setup();
        let attack = script(0.9);
        let walk = script(0.5);
        attack.lock().unwrap().in_progress = true;

        let mut movement = MovementArbitrator::new(4.0, 10.0);
        movement.register(Scripted::boxed("walk", &walk), 1.0);
        movement.cooldowns_mut().set(BehaviorId::Custom("unused"), 1.0);
        let mut combat = CombatArbitrator::new();
        combat.register(Scripted::boxed("attack", &attack), 1.0);

        let mut controller = AgentController::with_arbitrators(
            ctx,
            movement,
            combat,
            Arc::new(AgentSettings::default()),
            1,
        );

        for _ in 0..30 {
            let report = controller.tick(&snapshot, DT);
            assert!(report.movement_skipped);
            assert_eq!(report.combat, Some(BehaviorId::Custom("attack")));
        }

        // Full skip: ни scoring, ни decay ledger
        assert_eq!(walk.lock().unwrap().scored, 0);
        assert_eq!(
            controller.movement().cooldowns().remaining(BehaviorId::Custom("unused")),
            Some(1.0)
        );
        assert_eq!(controller.context().position(), Vec3::ZERO);

        attack.lock().unwrap().in_progress = false;
        let report = controller.tick(&snapshot, DT);
        assert!(!report.movement_skipped);
        assert_eq!(report.movement, Some(BehaviorId::Custom("walk")));
    }

    #[test]
    fn test_controller_rejects_and_logs_invalid_settings() {
        capture::install();
        let mut settings = AgentSettings::default();
        settings.movement.move_speed = -7.125;

        let result = AgentController::new(
            Entity::from_raw(1),
            1,
            SpatialFrame::default(),
            settings,
            7,
        );

        assert!(matches!(
            result,
            Err(SettingsError::NonPositive { field: "move_speed", .. })
        ));
        assert!(capture::contains(logger::LogLevel::Warning, "-7.125"));
    }

    // ========================================================================
    // Cooldown ledger
    // ========================================================================

    #[test]
    fn test_cooldown_decay() {
        let mut ledger = CooldownLedger::new();
        ledger.set(BehaviorId::Dash, 1.0);

        for _ in 0..3 {
            ledger.tick(0.25);
        }
        let remaining = ledger.remaining(BehaviorId::Dash).expect("still suppressed");
        assert!((remaining - 0.25).abs() < 1e-6);

        ledger.tick(0.25);
        assert!(!ledger.is_suppressed(BehaviorId::Dash));
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_cooldown_shared_by_identity() {
        let mut ledger = CooldownLedger::new();
        ledger.set(BehaviorId::Dodge, 1.5);
        ledger.set(BehaviorId::Dodge, 0.5);

        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.remaining(BehaviorId::Dodge), Some(0.5));

        ledger.set(BehaviorId::Dodge, 0.0);
        assert!(!ledger.is_suppressed(BehaviorId::Dodge));
    }

    #[test]
    fn test_cooldown_expires_on_exact_tick_at_60hz() {
        for duration in [4.0_f32, 1.5, 2.0, 1.0] {
            let mut ledger = CooldownLedger::new();
            ledger.set(BehaviorId::Dash, duration);
            let ticks = (duration / DT).round() as usize;

            for _ in 0..ticks - 1 {
                ledger.tick(DT);
            }
            assert!(
                ledger.is_suppressed(BehaviorId::Dash),
                "{}s cooldown ended before tick {}",
                duration,
                ticks
            );

            ledger.tick(DT);
            assert!(
                !ledger.is_suppressed(BehaviorId::Dash),
                "{}s cooldown still active after {} ticks",
                duration,
                ticks
            );
        }
    }

    // ========================================================================
    // Combat phase continuity
    // ========================================================================

    /// Шаг агентских часов + пересчёт дистанций, затем combat tick.
    fn combat_step(
        arbitrator: &mut CombatArbitrator,
        ctx: &mut SituationalContext,
        snapshot: &SpatialSnapshot,
        rng: &mut AgentRng,
        settings: &AgentSettings,
        dt: f32,
    ) -> CombatEffects {
        ctx.elapsed += dt;
        ctx.refresh(snapshot);
        ctx.update_ranges(settings.combat.melee_attack_range, settings.combat.ranged_attack_range);
        arbitrator.tick(ctx, snapshot, rng, dt)
    }

    #[test]
    fn test_melee_cooldown_runs_while_ranged_is_current() {
        // dt 0.125 и длительности кратные ему: фазы без float drift
        const STEP: f32 = 0.125;
        let mut settings = AgentSettings::default();
        settings.combat.charge_duration = STEP;
        settings.combat.fire_delay = 0.0;
        settings.combat.ranged_cooldown = 10.0;
        let settings = Arc::new(settings);

        let (mut ctx, mut snapshot, mut rng) = setup();
        let enemy = Entity::from_raw(2);
        let enemy_at = |x: f32| {
            SpatialBody::new(enemy, Vec3::new(x, 0.0, 0.0), 0.5, SpatialTag::Agent).with_faction(2)
        };
        snapshot.insert(enemy_at(1.0));
        ctx.set_target(Some(enemy));

        let mut arbitrator = CombatArbitrator::with_default_behaviors(settings.clone());

        // Ticks 1..=5: замах 0.5s, удар на середине (tick 3), cooldown с 0.625
        let mut hits = 0;
        for tick in 1..=5 {
            let effects = combat_step(&mut arbitrator, &mut ctx, &snapshot, &mut rng, &settings, STEP);
            hits += effects.damage.len();
            if tick == 3 {
                assert_eq!(effects.damage.len(), 1, "strike expected at the midpoint");
            }
        }
        assert_eq!(hits, 1);
        assert_eq!(arbitrator.current_id(), Some(BehaviorId::MeleeAttack));
        assert!(!arbitrator.is_action_in_progress());
        let melee_ready_at = 5.0 * STEP + settings.combat.melee_cooldown;

        // Цель отходит: ranged перехватывает, заряжается и стреляет
        snapshot.insert(enemy_at(5.0));
        let mut shots = 0;
        for _ in 6..=8 {
            let effects = combat_step(&mut arbitrator, &mut ctx, &snapshot, &mut rng, &settings, STEP);
            shots += effects.projectiles.len();
        }
        assert_eq!(shots, 1);
        assert_eq!(arbitrator.current_id(), Some(BehaviorId::RangedAttack));
        assert!(!arbitrator.is_action_in_progress());

        // Цель снова рядом: оба на cooldown (0.1 vs 0.1), текущий ranged удерживается
        snapshot.insert(enemy_at(1.0));
        let mut tick = 8;
        loop {
            tick += 1;
            combat_step(&mut arbitrator, &mut ctx, &snapshot, &mut rng, &settings, STEP);
            if ctx.elapsed >= melee_ready_at {
                break;
            }
            assert_eq!(
                arbitrator.current_id(),
                Some(BehaviorId::RangedAttack),
                "melee selected at {}s before its cooldown ended",
                ctx.elapsed
            );
        }

        // Cooldown истёк пока melee не был текущим: первый же tick после ready_at
        assert_eq!(tick, 13);
        assert_eq!(ctx.elapsed, melee_ready_at);
        assert_eq!(arbitrator.current_id(), Some(BehaviorId::MeleeAttack));
        assert!(arbitrator.is_action_in_progress());
    }
}

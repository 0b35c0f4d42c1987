//! Selection + lifecycle transitions shared by both arbitration layers.

use crate::context::SituationalContext;
use crate::logger;
use crate::spatial::SpatialQuery;

use super::{AgentRng, Behavior, BehaviorEnv, BehaviorId, CooldownLedger};

/// Scored, eligible behavior (index into the registration list).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub index: usize,
    pub score: f32,
}

/// Pick the winner among scored candidates.
///
/// - strictly greatest score wins
/// - tie: keep `current` if it is among the tied winners
/// - otherwise the first-registered tied winner
pub fn select_winner(candidates: &[Candidate], current: Option<usize>) -> Option<usize> {
    let best = candidates
        .iter()
        .map(|candidate| candidate.score)
        .fold(f32::NEG_INFINITY, f32::max);

    let mut tied = candidates.iter().filter(|candidate| candidate.score == best);

    if let Some(current) = current {
        if tied.clone().any(|candidate| candidate.index == current) {
            return Some(current);
        }
    }

    tied.next().map(|candidate| candidate.index)
}

/// Registered behavior + its configured weight.
pub struct Registered<B: ?Sized> {
    pub behavior: Box<B>,
    pub weight: f32,
}

/// Ordered behavior pool with a current behavior and a cooldown ledger.
pub struct BehaviorPool<B: ?Sized> {
    layer: &'static str,
    entries: Vec<Registered<B>>,
    current: Option<usize>,
    cooldowns: CooldownLedger,
    fallback: Option<BehaviorId>,
}

impl<B: ?Sized + Behavior> BehaviorPool<B> {
    pub fn new(layer: &'static str) -> Self {
        Self {
            layer,
            entries: Vec::new(),
            current: None,
            cooldowns: CooldownLedger::new(),
            fallback: None,
        }
    }

    /// Append to the registration order (stable, caller-defined).
    pub fn register(&mut self, behavior: Box<B>, weight: f32) {
        self.entries.push(Registered { behavior, weight });
    }

    /// Behavior used when every registered one is suppressed.
    pub fn set_fallback(&mut self, id: Option<BehaviorId>) {
        self.fallback = id;
    }

    pub fn fallback(&self) -> Option<BehaviorId> {
        self.fallback
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> Vec<BehaviorId> {
        self.entries.iter().map(|entry| entry.behavior.id()).collect()
    }

    pub fn set_weight(&mut self, id: BehaviorId, weight: f32) {
        for entry in self.entries.iter_mut().filter(|entry| entry.behavior.id() == id) {
            entry.weight = weight;
        }
    }

    pub fn current_id(&self) -> Option<BehaviorId> {
        self.current().map(|behavior| behavior.id())
    }

    pub fn current(&self) -> Option<&B> {
        self.current
            .and_then(|index| self.entries.get(index))
            .map(|entry| entry.behavior.as_ref())
    }

    pub fn behavior(&self, id: BehaviorId) -> Option<&B> {
        self.entries
            .iter()
            .find(|entry| entry.behavior.id() == id)
            .map(|entry| entry.behavior.as_ref())
    }

    pub fn cooldowns(&self) -> &CooldownLedger {
        &self.cooldowns
    }

    pub fn cooldowns_mut(&mut self) -> &mut CooldownLedger {
        &mut self.cooldowns
    }

    /// Cooldown decay → scoring → selection → Cleanup/Initialize.
    ///
    /// Returns the index of the behavior that is current after this tick.
    pub fn arbitrate(
        &mut self,
        ctx: &SituationalContext,
        spatial: &dyn SpatialQuery,
        rng: &mut AgentRng,
        dt: f32,
    ) -> Option<usize> {
        self.cooldowns.tick(dt);

        let current = self.current;
        let mut env = BehaviorEnv {
            spatial,
            rng,
            cooldowns: &mut self.cooldowns,
            dt,
        };

        let mut candidates = Vec::with_capacity(self.entries.len());
        for (index, entry) in self.entries.iter_mut().enumerate() {
            let id = entry.behavior.id();
            // Текущий behavior в середине активности не выкидывается своим же cooldown
            let committed = current == Some(index) && entry.behavior.is_committed();
            if env.cooldowns.is_suppressed(id) && !committed {
                continue;
            }

            let score = entry.behavior.suitability(ctx, &mut env) * entry.weight;
            if score.is_nan() {
                continue;
            }
            candidates.push(Candidate { index, score });
        }

        let winner = select_winner(&candidates, current).or_else(|| {
            let fallback = self.fallback?;
            self.entries
                .iter()
                .position(|entry| entry.behavior.id() == fallback)
        });

        if winner != current {
            if let Some(entry) = current.and_then(|index| self.entries.get_mut(index)) {
                entry.behavior.cleanup(ctx, &mut env);
            }
            if let Some(entry) = winner.and_then(|index| self.entries.get_mut(index)) {
                entry.behavior.initialize(ctx, &mut env);
            }

            logger::log(&format!(
                "🔀 {} {:?}: {:?} → {:?}",
                self.layer,
                ctx.entity,
                current.and_then(|index| self.entries.get(index)).map(|e| e.behavior.id()),
                winner.and_then(|index| self.entries.get(index)).map(|e| e.behavior.id()),
            ));
        }

        self.current = winner;
        winner
    }

    /// Run `f` against the current behavior with a fresh env.
    pub fn with_current<R>(
        &mut self,
        spatial: &dyn SpatialQuery,
        rng: &mut AgentRng,
        dt: f32,
        f: impl FnOnce(&mut B, &mut BehaviorEnv<'_>) -> R,
    ) -> Option<R> {
        let entry = self.current.and_then(|index| self.entries.get_mut(index))?;
        let mut env = BehaviorEnv {
            spatial,
            rng,
            cooldowns: &mut self.cooldowns,
            dt,
        };
        Some(f(entry.behavior.as_mut(), &mut env))
    }
}

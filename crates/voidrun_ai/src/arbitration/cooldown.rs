//! Cooldown ledger: behavior identity → remaining suppression (seconds).

use std::collections::HashMap;

use super::BehaviorId;

/// Fraction of a tick below which a countdown counts as finished.
///
/// Суммирование f32 dt оставляет хвост порядка 1e-6, из-за которого
/// таймер жил бы на один tick дольше своей длительности.
const EXPIRY_TOLERANCE: f32 = 1e-3;

/// Countdown finished after subtracting this tick's `dt`.
pub(crate) fn countdown_expired(remaining: f32, dt: f32) -> bool {
    remaining <= dt.abs() * EXPIRY_TOLERANCE
}

/// Owned by one arbitrator. Absent key = not suppressed.
///
/// Keyed by `BehaviorId`, not by instance: two registrations of the same
/// kind share one slot. Entries for ids nobody registered are inert.
#[derive(Debug, Clone, Default)]
pub struct CooldownLedger {
    entries: HashMap<BehaviorId, f32>,
}

impl CooldownLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decrement every entry; entries reaching 0 (within float drift) are purged.
    pub fn tick(&mut self, dt: f32) {
        self.entries.retain(|_, remaining| {
            *remaining -= dt;
            !countdown_expired(*remaining, dt)
        });
    }

    /// Insert or overwrite. Non-positive duration clears the entry.
    pub fn set(&mut self, id: BehaviorId, duration: f32) {
        if duration > 0.0 {
            self.entries.insert(id, duration);
        } else {
            self.entries.remove(&id);
        }
    }

    pub fn is_suppressed(&self, id: BehaviorId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn remaining(&self, id: BehaviorId) -> Option<f32> {
        self.entries.get(&id).copied()
    }

    pub fn clear(&mut self, id: BehaviorId) {
        self.entries.remove(&id);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

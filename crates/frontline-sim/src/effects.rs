//! Deadline-driven reversions: buffs wearing off, rolls ending, boss shields
//! closing.
//!
//! Entries are keyed by entity so removing an entity or resetting a level
//! drops its pending reversions instead of letting them touch stale state.

use frontline_common::EntityId;
use serde::{Deserialize, Serialize};

/// A deferred state reversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimedEffect {
    /// Boss damage immunity ends
    ShieldDown,
    /// Player roll ends
    RollEnd,
    /// Post-spawn invulnerability ends
    SpawnProtectionEnd,
    /// Damage power-up wears off
    DamageBoostEnd,
    /// Speed power-up wears off
    SpeedBoostEnd,
    /// Rapid fire power-up wears off
    RapidFireEnd,
    /// Invincibility power-up wears off
    InvincibilityEnd,
}

/// One pending reversion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScheduledEffect {
    /// When it fires
    pub deadline_ms: f64,
    /// Entity it applies to
    pub entity: EntityId,
    /// What to revert
    pub effect: TimedEffect,
    seq: u64,
}

/// Pending reversions, drained each frame against the current time.
#[derive(Debug, Clone, Default)]
pub struct EffectScheduler {
    pending: Vec<ScheduledEffect>,
    next_seq: u64,
}

impl EffectScheduler {
    /// Creates an empty scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `effect` for `entity` at `deadline_ms`.
    pub fn schedule(&mut self, entity: EntityId, effect: TimedEffect, deadline_ms: f64) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.push(ScheduledEffect {
            deadline_ms,
            entity,
            effect,
            seq,
        });
    }

    /// Moves an existing `(entity, effect)` entry to a new deadline, or queues
    /// it. Returns true if an entry was refreshed.
    pub fn refresh(&mut self, entity: EntityId, effect: TimedEffect, deadline_ms: f64) -> bool {
        let before = self.pending.len();
        self.pending
            .retain(|e| !(e.entity == entity && e.effect == effect));
        let refreshed = self.pending.len() != before;
        self.schedule(entity, effect, deadline_ms);
        refreshed
    }

    /// Whether `(entity, effect)` is pending.
    #[must_use]
    pub fn is_pending(&self, entity: EntityId, effect: TimedEffect) -> bool {
        self.pending
            .iter()
            .any(|e| e.entity == entity && e.effect == effect)
    }

    /// Removes and returns every entry due at `now`, earliest first; ties keep
    /// scheduling order.
    pub fn drain_due(&mut self, now: f64) -> Vec<ScheduledEffect> {
        let (mut due, rest): (Vec<_>, Vec<_>) = self
            .pending
            .drain(..)
            .partition(|e| e.deadline_ms <= now);
        self.pending = rest;
        due.sort_by(|a, b| {
            a.deadline_ms
                .total_cmp(&b.deadline_ms)
                .then(a.seq.cmp(&b.seq))
        });
        due
    }

    /// Drops every pending entry for `entity`.
    pub fn purge_entity(&mut self, entity: EntityId) -> usize {
        let before = self.pending.len();
        self.pending.retain(|e| e.entity != entity);
        before - self.pending.len()
    }

    /// Drops everything.
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Number of pending entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// True when nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

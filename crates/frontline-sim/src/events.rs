//! Discrete simulation events for scoring, audio and achievement layers.

use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use frontline_common::{EntityId, Vec2};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::ai::AiState;
use crate::effects::TimedEffect;
use crate::enemy::EnemyKind;
use crate::pickup::PickupKind;
use crate::projectile::Faction;
use crate::weapon::WeaponKind;

/// Something that happened during a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimEvent {
    /// A projectile entered play
    ProjectileFired {
        /// Projectile id
        projectile: EntityId,
        /// Combatant that fired it
        owner: EntityId,
        /// Side it fights for
        faction: Faction,
        /// Weapon it came from
        weapon: WeaponKind,
    },
    /// An enemy survived a hit
    EnemyDamaged {
        /// Enemy id
        enemy: EntityId,
        /// Health removed
        amount: f32,
        /// Health left
        remaining: f32,
    },
    /// The player took damage
    PlayerDamaged {
        /// Health removed
        amount: f32,
        /// Health left
        remaining: f32,
    },
    /// An enemy died
    EnemyKilled {
        /// Enemy id
        enemy: EntityId,
        /// Archetype
        kind: EnemyKind,
        /// Boss table id, for bosses
        boss_id: Option<u32>,
        /// Where it fell
        position: Vec2,
        /// Weapon that landed the final hit
        weapon: WeaponKind,
    },
    /// The player died
    PlayerKilled {
        /// Player id
        player: EntityId,
    },
    /// A cover block was destroyed
    CoverDestroyed {
        /// Cover id
        cover: EntityId,
        /// Its center
        position: Vec2,
    },
    /// A pickup appeared
    PickupSpawned {
        /// Pickup id
        pickup: EntityId,
        /// What it grants
        kind: PickupKind,
        /// Top-left corner
        position: Vec2,
    },
    /// The player collected a pickup
    PickupCollected {
        /// Pickup id
        pickup: EntityId,
        /// What it granted
        kind: PickupKind,
    },
    /// The player touched a weapon with a full inventory
    WeaponSwapOffered {
        /// Pickup id
        pickup: EntityId,
        /// Weapon on offer
        weapon: WeaponKind,
    },
    /// The player swapped a carried weapon for a pickup
    WeaponSwapped {
        /// Slot replaced
        slot: usize,
        /// Weapon left behind
        dropped: WeaponKind,
        /// Weapon taken
        taken: WeaponKind,
    },
    /// A timed effect ran out
    EffectExpired {
        /// Entity it applied to
        entity: EntityId,
        /// Which effect
        effect: TimedEffect,
    },
    /// A reload finished
    WeaponReloaded {
        /// Combatant holding the weapon
        owner: EntityId,
        /// Weapon reloaded
        weapon: WeaponKind,
    },
    /// An enemy changed behavior state
    AiStateChanged {
        /// Enemy id
        enemy: EntityId,
        /// State left
        from: AiState,
        /// State entered
        to: AiState,
    },
    /// A boss entered rage
    BossEnraged {
        /// Boss id
        boss: EntityId,
    },
    /// A boss opened its shield
    BossShieldRaised {
        /// Boss id
        boss: EntityId,
        /// When it closes
        until_ms: f64,
    },
    /// A boss shield closed
    BossShieldLowered {
        /// Boss id
        boss: EntityId,
    },
    /// A boss called in minions
    MinionsSummoned {
        /// Boss id
        boss: EntityId,
        /// Minions spawned
        count: u32,
    },
    /// A campaign level began
    LevelStarted {
        /// Level index
        index: usize,
        /// Level name
        name: String,
        /// Enemies spawned
        enemies: usize,
    },
    /// A survival wave began
    WaveStarted {
        /// Wave number, from 1
        wave: u32,
        /// Enemies spawned
        enemies: usize,
    },
    /// Every enemy of the current level is dead
    LevelCleared {
        /// Level index
        index: usize,
    },
    /// Every enemy of the current wave is dead
    WaveCleared {
        /// Wave number
        wave: u32,
    },
}

/// Bounded event queue drained once per frame.
///
/// Sized from `SimConfig::event_capacity`. When a frame produces more events
/// than that, the newest ones are dropped, counted and logged.
#[derive(Debug)]
pub struct EventBus {
    sender: Sender<SimEvent>,
    receiver: Receiver<SimEvent>,
    capacity: usize,
    dropped: AtomicU64,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl EventBus {
    /// Creates a bus holding at most `capacity` undrained events.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity.max(1));
        Self {
            sender,
            receiver,
            capacity: capacity.max(1),
            dropped: AtomicU64::new(0),
        }
    }

    /// Queues an event without blocking; returns false if the bus is full and
    /// the event was dropped.
    pub fn publish(&self, event: SimEvent) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event) | TrySendError::Disconnected(event)) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                warn!(capacity = self.capacity, dropped, ?event, "Event bus full, event dropped");
                false
            },
        }
    }

    /// Events dropped on a full bus since creation.
    #[must_use]
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Takes every pending event in publication order.
    pub fn drain(&self) -> Vec<SimEvent> {
        self.receiver.try_iter().collect()
    }

    /// Number of undrained events.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    /// Maximum undrained events.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_and_drain_in_order() {
        let bus = EventBus::new(8);
        bus.publish(SimEvent::WaveStarted { wave: 1, enemies: 7 });
        bus.publish(SimEvent::WaveCleared { wave: 1 });
        assert_eq!(bus.pending_count(), 2);
        let events = bus.drain();
        assert_eq!(events[1], SimEvent::WaveCleared { wave: 1 });
        assert_eq!(bus.pending_count(), 0);
    }

    #[test]
    fn test_full_bus_drops() {
        let bus = EventBus::new(1);
        assert!(bus.publish(SimEvent::LevelCleared { index: 0 }));
        assert!(!bus.publish(SimEvent::LevelCleared { index: 1 }));
        assert!(!bus.publish(SimEvent::WaveCleared { wave: 2 }));
        assert_eq!(bus.dropped_count(), 2);
        assert_eq!(bus.drain(), vec![SimEvent::LevelCleared { index: 0 }]);
        assert!(bus.publish(SimEvent::LevelCleared { index: 2 }));
    }

    #[test]
    fn test_events_serialize() {
        let event = SimEvent::PickupCollected {
            pickup: EntityId::from_raw(4),
            kind: PickupKind::Weapon(WeaponKind::Rifle),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("PickupCollected"));
        let back: SimEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}

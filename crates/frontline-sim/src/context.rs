//! Explicit per-simulation context passed into every update.

use fastrand::Rng;
use frontline_common::EntityIdAllocator;

use crate::combat::CombatStats;
use crate::config::SimConfig;
use crate::effects::EffectScheduler;
use crate::events::{EventBus, SimEvent};
use crate::loot::LootTable;

/// Shared state of one simulation: tuning, randomness, id allocation, the
/// timed-effect queue, the event bus and running statistics.
#[derive(Debug)]
pub struct SimContext {
    /// Tuning
    pub config: SimConfig,
    /// The only RNG the simulation draws from
    pub rng: Rng,
    /// Entity id source
    pub ids: EntityIdAllocator,
    /// Pending timed effects
    pub scheduler: EffectScheduler,
    /// Events published this frame
    pub events: EventBus,
    /// Running combat statistics
    pub stats: CombatStats,
    /// Drop tables
    pub loot: LootTable,
    /// Time of the frame being simulated
    pub now: f64,
}

impl SimContext {
    /// Creates a context seeded from `config.seed`.
    #[must_use]
    pub fn new(config: SimConfig) -> Self {
        Self {
            rng: Rng::with_seed(config.seed),
            events: EventBus::new(config.event_capacity),
            ids: EntityIdAllocator::new(),
            scheduler: EffectScheduler::new(),
            stats: CombatStats::default(),
            loot: LootTable::default(),
            now: 0.0,
            config,
        }
    }

    /// Builder: custom drop tables.
    pub fn with_loot(mut self, loot: LootTable) -> Self {
        self.loot = loot;
        self
    }

    /// Publishes an event, noting drops when the bus is full.
    pub fn emit(&self, event: SimEvent) {
        if !self.events.publish(event) {
            tracing::trace!("Event bus full, event dropped");
        }
    }
}

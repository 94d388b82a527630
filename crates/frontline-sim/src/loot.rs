//! Tiered loot selection for kills and level scatter.

use fastrand::Rng;
use serde::{Deserialize, Serialize};

use crate::enemy::EnemyKind;
use crate::pickup::PickupKind;
use crate::weapon::WeaponKind;

/// Who died.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LootSource {
    /// A regular enemy of this archetype
    Regular(EnemyKind),
    /// Any boss
    Boss,
}

/// Weighted pools sampled on every kill.
///
/// A regular kill draws from the common pool, upgraded to the uncommon pool
/// with `uncommon_chance`; elite archetypes may instead roll the weapon pool.
/// Bosses always draw from the boss pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LootTable {
    /// Basic resources and power-ups
    pub common: Vec<PickupKind>,
    /// Rarer power-ups
    pub uncommon: Vec<PickupKind>,
    /// Chance to use the uncommon pool
    pub uncommon_chance: f32,
    /// Weapons dropped by elite archetypes
    pub elite_weapons: Vec<PickupKind>,
    /// Chance an elite kill drops a weapon
    pub elite_chance: f32,
    /// Guaranteed boss drops
    pub boss: Vec<PickupKind>,
    /// Pickups scattered over a level at load
    pub scatter: Vec<PickupKind>,
}

impl Default for LootTable {
    fn default() -> Self {
        use PickupKind as P;
        Self {
            common: vec![
                P::Health,
                P::Ammo,
                P::Healing,
                P::DamageBoost,
                P::SpeedBoost,
                P::RapidFire,
            ],
            uncommon: vec![P::Invincibility, P::DamageBoost, P::RapidFire],
            uncommon_chance: 0.25,
            elite_weapons: vec![
                P::Weapon(WeaponKind::Rifle),
                P::Weapon(WeaponKind::Shotgun),
                P::Weapon(WeaponKind::MachineGun),
                P::Weapon(WeaponKind::Sniper),
            ],
            elite_chance: 0.2,
            boss: vec![
                P::Weapon(WeaponKind::GrenadeLauncher),
                P::Weapon(WeaponKind::LaserGun),
                P::Weapon(WeaponKind::MachineGun),
            ],
            scatter: vec![
                P::Health,
                P::Ammo,
                P::Weapon(WeaponKind::Rifle),
                P::Weapon(WeaponKind::Shotgun),
                P::Weapon(WeaponKind::Knife),
                P::Weapon(WeaponKind::Sword),
                P::Weapon(WeaponKind::Axe),
            ],
        }
    }
}

impl LootTable {
    /// Picks the drop for a kill; `None` only if the chosen pool is empty.
    pub fn roll(&self, source: LootSource, rng: &mut Rng) -> Option<PickupKind> {
        let pool = match source {
            LootSource::Boss => &self.boss,
            LootSource::Regular(kind) => {
                let mut pool = &self.common;
                if rng.f32() < self.uncommon_chance {
                    pool = &self.uncommon;
                }
                if kind.is_elite() && rng.f32() < self.elite_chance {
                    pool = &self.elite_weapons;
                }
                pool
            },
        };
        pick(pool, rng)
    }

    /// Picks a pickup for the level scatter.
    pub fn roll_scatter(&self, rng: &mut Rng) -> Option<PickupKind> {
        pick(&self.scatter, rng)
    }
}

fn pick(pool: &[PickupKind], rng: &mut Rng) -> Option<PickupKind> {
    if pool.is_empty() {
        None
    } else {
        Some(pool[rng.usize(..pool.len())])
    }
}

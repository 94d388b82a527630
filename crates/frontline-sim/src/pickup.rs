//! Collectible pickups and what they do to the player.

use frontline_common::{EntityId, Vec2};
use serde::{Deserialize, Serialize};

use crate::body::Body;
use crate::effects::{EffectScheduler, TimedEffect};
use crate::player::{AddWeapon, Player};
use crate::weapon::WeaponKind;

/// Pickup footprint.
pub const PICKUP_SIZE: Vec2 = Vec2::new(20.0, 20.0);

/// Every kind of pickup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PickupKind {
    /// Large heal
    Health,
    /// Small heal
    Healing,
    /// Refill the weapon in hand
    Ammo,
    /// Temporary damage multiplier
    DamageBoost,
    /// Temporary speed multiplier
    SpeedBoost,
    /// Temporary fire interval multiplier
    RapidFire,
    /// Temporary damage immunity
    Invincibility,
    /// A weapon
    Weapon(WeaponKind),
}

impl PickupKind {
    /// Health restored by healing kinds.
    #[must_use]
    pub const fn heal_amount(self) -> Option<f32> {
        match self {
            Self::Health => Some(30.0),
            Self::Healing => Some(15.0),
            _ => None,
        }
    }

    /// Power-up duration and the effect that ends it.
    #[must_use]
    pub const fn timed(self) -> Option<(f64, TimedEffect)> {
        match self {
            Self::DamageBoost => Some((10_000.0, TimedEffect::DamageBoostEnd)),
            Self::SpeedBoost => Some((8_000.0, TimedEffect::SpeedBoostEnd)),
            Self::RapidFire => Some((8_000.0, TimedEffect::RapidFireEnd)),
            Self::Invincibility => Some((5_000.0, TimedEffect::InvincibilityEnd)),
            _ => None,
        }
    }
}

/// Multiplier granted by the damage power-up.
pub const DAMAGE_BOOST: f32 = 1.5;
/// Multiplier granted by the speed power-up.
pub const SPEED_BOOST: f32 = 1.5;
/// Fire interval multiplier granted by rapid fire.
pub const RAPID_FIRE: f32 = 0.5;

/// What collecting a pickup did.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PickupOutcome {
    /// Health restored
    Healed {
        /// Amount actually restored
        amount: f32,
    },
    /// Current weapon refilled
    Refilled,
    /// A power-up started or was extended
    Boosted {
        /// Effect that will end it
        effect: TimedEffect,
        /// When it ends
        until_ms: f64,
    },
    /// Weapon stored in a slot
    WeaponAdded {
        /// Slot index
        slot: usize,
    },
    /// Weapon already carried; the pickup is used up
    WeaponDuplicate,
    /// Inventory full; the pickup stays and a swap is offered
    SwapOffered,
}

impl PickupOutcome {
    /// False when the pickup stays in the world.
    #[must_use]
    pub const fn consumed(self) -> bool {
        !matches!(self, Self::SwapOffered)
    }
}

/// A pickup lying in the level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pickup {
    /// Unique id
    pub id: EntityId,
    /// Position
    pub body: Body,
    /// What it grants
    pub kind: PickupKind,
    /// A swap offer for this pickup is outstanding
    pub swap_offered: bool,
}

impl Pickup {
    /// Creates a pickup with its top-left corner at `position`.
    #[must_use]
    pub fn new(id: EntityId, kind: PickupKind, position: Vec2) -> Self {
        Self {
            id,
            body: Body::new(position.x, position.y, PICKUP_SIZE.x, PICKUP_SIZE.y),
            kind,
            swap_offered: false,
        }
    }

    /// Creates a pickup resting where a body stood.
    #[must_use]
    pub fn dropped_by(id: EntityId, kind: PickupKind, body: &Body) -> Self {
        let position = Vec2::new(body.center().x - PICKUP_SIZE.x / 2.0, body.bottom() - PICKUP_SIZE.y);
        Self::new(id, kind, position)
    }

    /// Applies the pickup to `player`, scheduling power-up expiry.
    pub fn apply(&self, player: &mut Player, now: f64, scheduler: &mut EffectScheduler) -> PickupOutcome {
        if let Some(amount) = self.kind.heal_amount() {
            return PickupOutcome::Healed {
                amount: player.combatant.heal(amount),
            };
        }
        if let Some((duration, effect)) = self.kind.timed() {
            match self.kind {
                PickupKind::DamageBoost => player.set_damage_boost(DAMAGE_BOOST),
                PickupKind::SpeedBoost => player.set_speed_boost(SPEED_BOOST),
                PickupKind::RapidFire => player.set_fire_rate_boost(RAPID_FIRE),
                _ => player.set_invincible(true),
            }
            let until_ms = now + duration;
            scheduler.refresh(player.id(), effect, until_ms);
            return PickupOutcome::Boosted { effect, until_ms };
        }
        match self.kind {
            PickupKind::Weapon(kind) => match player.add_weapon(kind) {
                AddWeapon::Added { slot } => PickupOutcome::WeaponAdded { slot },
                AddWeapon::Duplicate => PickupOutcome::WeaponDuplicate,
                AddWeapon::Full => PickupOutcome::SwapOffered,
            },
            _ => {
                player.combatant.weapon_mut().refill();
                PickupOutcome::Refilled
            },
        }
    }
}

/// Undoes a power-up whose time ran out.
pub fn revert_power_up(player: &mut Player, effect: TimedEffect) {
    match effect {
        TimedEffect::DamageBoostEnd => player.set_damage_boost(1.0),
        TimedEffect::SpeedBoostEnd => player.set_speed_boost(1.0),
        TimedEffect::RapidFireEnd => player.set_fire_rate_boost(1.0),
        TimedEffect::InvincibilityEnd => player.set_invincible(false),
        TimedEffect::ShieldDown | TimedEffect::RollEnd | TimedEffect::SpawnProtectionEnd => {},
    }
}

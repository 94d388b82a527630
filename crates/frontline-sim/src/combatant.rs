//! State shared by the player and enemies: health, facing, weapons.

use frontline_common::{EntityId, Vec2};
use serde::{Deserialize, Serialize};

use crate::body::Body;
use crate::weapon::{Weapon, WeaponKind};

/// Horizontal facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Facing {
    /// Toward negative x
    Left,
    /// Toward positive x
    Right,
}

impl Facing {
    /// −1 or +1.
    #[must_use]
    pub const fn sign(self) -> f32 {
        match self {
            Self::Left => -1.0,
            Self::Right => 1.0,
        }
    }

    /// Facing that matches the sign of `dx`; zero counts as left.
    #[must_use]
    pub fn from_dx(dx: f32) -> Self {
        if dx > 0.0 {
            Self::Right
        } else {
            Self::Left
        }
    }
}

/// Outcome of [`Combatant::take_damage`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DamageOutcome {
    /// Invulnerable, already dead, or a non-positive amount
    Ignored,
    /// Took damage and survived
    Wounded {
        /// Health actually removed
        dealt: f32,
    },
    /// This hit brought health to zero
    Killed {
        /// Health actually removed
        dealt: f32,
    },
}

impl DamageOutcome {
    /// Health removed by the hit.
    #[must_use]
    pub const fn dealt(self) -> f32 {
        match self {
            Self::Ignored => 0.0,
            Self::Wounded { dealt } | Self::Killed { dealt } => dealt,
        }
    }

    /// True if the hit changed health.
    #[must_use]
    pub const fn landed(self) -> bool {
        !matches!(self, Self::Ignored)
    }
}

/// A body that fights.
///
/// Health stays within `[0, max_health]`; reaching zero deactivates the body
/// exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Combatant {
    /// Unique id
    pub id: EntityId,
    /// Position and motion
    pub body: Body,
    health: f32,
    max_health: f32,
    /// Horizontal facing
    pub facing: Facing,
    /// Supported by ground, slope, platform or cover this frame
    pub on_ground: bool,
    /// Damage is ignored while set
    pub invulnerable: bool,
    /// Horizontal speed per reference frame
    pub speed: f32,
    weapons: Vec<Weapon>,
    current_weapon: usize,
}

impl Combatant {
    /// Creates a combatant at full health carrying one weapon.
    #[must_use]
    pub fn new(id: EntityId, body: Body, max_health: f32, speed: f32, weapon: Weapon) -> Self {
        let max_health = max_health.max(1.0);
        Self {
            id,
            body,
            health: max_health,
            max_health,
            facing: Facing::Right,
            on_ground: false,
            invulnerable: false,
            speed,
            weapons: vec![weapon],
            current_weapon: 0,
        }
    }

    /// Builder: initial facing.
    pub fn facing(mut self, facing: Facing) -> Self {
        self.facing = facing;
        self
    }

    /// Current health.
    #[must_use]
    pub const fn health(&self) -> f32 {
        self.health
    }

    /// Maximum health.
    #[must_use]
    pub const fn max_health(&self) -> f32 {
        self.max_health
    }

    /// Health as a fraction of max.
    #[must_use]
    pub fn health_fraction(&self) -> f32 {
        self.health / self.max_health
    }

    /// Alive and in play.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.body.active
    }

    /// Replaces max health and refills to it.
    pub fn reset_max_health(&mut self, max_health: f32) {
        self.max_health = max_health.max(1.0);
        self.health = self.max_health;
    }

    /// Applies damage with the zero floor and one-way death.
    pub fn take_damage(&mut self, amount: f32) -> DamageOutcome {
        if self.invulnerable || !self.body.active || amount <= 0.0 || amount.is_nan() {
            return DamageOutcome::Ignored;
        }
        let dealt = amount.min(self.health);
        self.health -= dealt;
        if self.health <= 0.0 {
            self.health = 0.0;
            self.body.deactivate();
            DamageOutcome::Killed { dealt }
        } else {
            DamageOutcome::Wounded { dealt }
        }
    }

    /// Restores health up to max; the dead stay dead.
    pub fn heal(&mut self, amount: f32) -> f32 {
        if !self.body.active || amount <= 0.0 {
            return 0.0;
        }
        let before = self.health;
        self.health = (self.health + amount).min(self.max_health);
        self.health - before
    }

    /// Equipped weapons in slot order.
    #[must_use]
    pub fn weapons(&self) -> &[Weapon] {
        &self.weapons
    }

    /// Mutable access to every weapon.
    pub fn weapons_mut(&mut self) -> &mut [Weapon] {
        &mut self.weapons
    }

    /// Slot of the weapon in hand.
    #[must_use]
    pub const fn current_slot(&self) -> usize {
        self.current_weapon
    }

    /// Weapon in hand.
    #[must_use]
    pub fn weapon(&self) -> &Weapon {
        &self.weapons[self.current_weapon]
    }

    /// Weapon in hand, mutably.
    pub fn weapon_mut(&mut self) -> &mut Weapon {
        &mut self.weapons[self.current_weapon]
    }

    /// Switches to `slot` if it exists.
    pub fn select_weapon(&mut self, slot: usize) -> bool {
        if slot < self.weapons.len() {
            self.current_weapon = slot;
            true
        } else {
            false
        }
    }

    /// True if a weapon of `kind` is already carried.
    #[must_use]
    pub fn has_weapon(&self, kind: WeaponKind) -> bool {
        self.weapons.iter().any(|w| w.kind() == kind)
    }

    /// Appends a weapon to the next slot.
    pub fn push_weapon(&mut self, weapon: Weapon) {
        self.weapons.push(weapon);
    }

    /// Replaces the weapon in `slot`; returns the one removed.
    pub fn replace_weapon(&mut self, slot: usize, weapon: Weapon) -> Option<Weapon> {
        self.weapons
            .get_mut(slot)
            .map(|existing| std::mem::replace(existing, weapon))
    }

    /// Muzzle position `offset` units ahead of center along facing.
    #[must_use]
    pub fn muzzle(&self, offset: f32) -> Vec2 {
        self.body.center() + Vec2::new(self.facing.sign() * offset, 0.0)
    }

    /// Advances every weapon's reload timer; returns kinds that finished.
    pub fn update_weapons(&mut self, now: f64) -> Vec<WeaponKind> {
        self.weapons
            .iter_mut()
            .filter_map(|w| w.update(now).then(|| w.kind()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn grunt(health: f32) -> Combatant {
        Combatant::new(
            EntityId::from_raw(1),
            Body::new(0.0, 0.0, 28.0, 48.0),
            health,
            2.0,
            Weapon::new(WeaponKind::Pistol),
        )
    }

    #[test]
    fn test_damage_and_death() {
        let mut c = grunt(50.0);
        assert_eq!(c.take_damage(15.0), DamageOutcome::Wounded { dealt: 15.0 });
        assert_eq!(c.take_damage(100.0), DamageOutcome::Killed { dealt: 35.0 });
        assert_eq!(c.health(), 0.0);
        assert!(!c.is_alive());
        assert_eq!(c.take_damage(10.0), DamageOutcome::Ignored);
    }

    #[test]
    fn test_invulnerable_ignores_damage() {
        let mut c = grunt(50.0);
        c.invulnerable = true;
        assert_eq!(c.take_damage(40.0), DamageOutcome::Ignored);
        assert_eq!(c.health(), 50.0);
    }

    #[test]
    fn test_heal_clamps() {
        let mut c = grunt(100.0);
        c.take_damage(20.0);
        assert_eq!(c.heal(50.0), 20.0);
        assert_eq!(c.health(), 100.0);
    }

    #[test]
    fn test_weapon_slots() {
        let mut c = grunt(100.0);
        c.push_weapon(Weapon::new(WeaponKind::Rifle));
        assert!(c.select_weapon(1));
        assert_eq!(c.weapon().kind(), WeaponKind::Rifle);
        assert!(!c.select_weapon(4));
        let old = c.replace_weapon(0, Weapon::new(WeaponKind::Sword));
        assert_eq!(old.map(|w| w.kind()), Some(WeaponKind::Pistol));
        assert!(c.has_weapon(WeaponKind::Sword));
    }

    #[test]
    fn test_muzzle_follows_facing() {
        let c = grunt(50.0).facing(Facing::Left);
        assert_eq!(c.muzzle(10.0), Vec2::new(4.0, 24.0));
    }

    proptest! {
        #[test]
        fn prop_health_never_negative_and_dies_once(hits in proptest::collection::vec(-10.0f32..80.0, 1..40)) {
            let mut c = grunt(100.0);
            let mut deaths = 0;
            for amount in hits {
                if let DamageOutcome::Killed { .. } = c.take_damage(amount) {
                    deaths += 1;
                }
                prop_assert!(c.health() >= 0.0);
                prop_assert!(c.health() <= c.max_health());
                prop_assert_eq!(c.health() == 0.0, !c.is_alive());
            }
            prop_assert!(deaths <= 1);
        }
    }
}

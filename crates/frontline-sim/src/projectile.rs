//! Projectiles and their expiry rules.

use frontline_common::{EntityId, Vec2};
use serde::{Deserialize, Serialize};

use crate::body::Body;
use crate::weapon::WeaponKind;

/// Side a projectile fights for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Faction {
    /// Fired from a weapon the player owns
    Player,
    /// Fired by anyone else
    Hostile,
}

/// When a projectile stops existing. Exactly one rule applies per projectile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Expiry {
    /// Expire after travelling this far
    Distance {
        /// Maximum travel distance
        max: f32,
    },
    /// Expire after this much simulated time (melee hit volumes)
    Lifetime {
        /// Lifetime in ms
        ms: f64,
    },
}

/// Everything a weapon decides about a shot, before it gets an identity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectileSpawn {
    /// Muzzle point; the projectile is centered on it
    pub origin: Vec2,
    /// Units per reference frame
    pub velocity: Vec2,
    /// Footprint
    pub size: Vec2,
    /// Damage on hit
    pub damage: f32,
    /// Expiry rule
    pub expiry: Expiry,
    /// Blast radius for explosive rounds
    pub explosion_radius: Option<f32>,
    /// Weapon that produced it
    pub weapon: WeaponKind,
}

/// A live projectile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    /// Unique id
    pub id: EntityId,
    /// Position and motion
    pub body: Body,
    /// Damage on hit
    pub damage: f32,
    /// Combatant whose weapon fired it
    pub owner: EntityId,
    /// Side it fights for
    pub faction: Faction,
    /// Weapon kind that fired it
    pub weapon: WeaponKind,
    /// Blast radius for explosive rounds
    pub explosion_radius: Option<f32>,
    expiry: Expiry,
    distance_traveled: f32,
    age_ms: f64,
}

impl Projectile {
    /// Gives a spawn request an identity and an owner.
    #[must_use]
    pub fn from_spawn(id: EntityId, owner: EntityId, faction: Faction, spawn: ProjectileSpawn) -> Self {
        let top_left = spawn.origin - spawn.size * 0.5;
        Self {
            id,
            body: Body::new(top_left.x, top_left.y, spawn.size.x, spawn.size.y)
                .with_velocity(spawn.velocity),
            damage: spawn.damage,
            owner,
            faction,
            weapon: spawn.weapon,
            explosion_radius: spawn.explosion_radius,
            expiry: spawn.expiry,
            distance_traveled: 0.0,
            age_ms: 0.0,
        }
    }

    /// Expiry rule.
    #[must_use]
    pub const fn expiry(&self) -> Expiry {
        self.expiry
    }

    /// Distance covered so far.
    #[must_use]
    pub const fn distance_traveled(&self) -> f32 {
        self.distance_traveled
    }

    /// Simulated time alive.
    #[must_use]
    pub const fn age_ms(&self) -> f64 {
        self.age_ms
    }

    /// True for explosive rounds.
    #[must_use]
    pub const fn is_explosive(&self) -> bool {
        self.explosion_radius.is_some()
    }

    /// Moves the projectile and applies its expiry rule.
    ///
    /// A distance-limited projectile stops exactly at its maximum distance.
    /// Returns whether it is still active.
    pub fn advance(&mut self, dt_scale: f32, delta_ms: f64) -> bool {
        if !self.body.active {
            return false;
        }
        let mut step = self.body.velocity * dt_scale;
        let length = step.length();
        match self.expiry {
            Expiry::Distance { max } => {
                let remaining = max - self.distance_traveled;
                if length >= remaining {
                    if length > 0.0 {
                        step *= remaining.max(0.0) / length;
                    }
                    self.body.position += step;
                    self.distance_traveled = max;
                    self.body.deactivate();
                } else {
                    self.body.position += step;
                    self.distance_traveled += length;
                }
            },
            Expiry::Lifetime { ms } => {
                self.body.position += step;
                self.distance_traveled += length;
                self.age_ms += delta_ms;
                if self.age_ms >= ms {
                    self.body.deactivate();
                }
            },
        }
        self.body.active
    }

    /// Destroys the projectile on impact.
    pub fn hit(&mut self) {
        self.body.deactivate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn spawn(expiry: Expiry, velocity: Vec2) -> Projectile {
        Projectile::from_spawn(
            EntityId::from_raw(1),
            EntityId::from_raw(2),
            Faction::Player,
            ProjectileSpawn {
                origin: Vec2::new(100.0, 100.0),
                velocity,
                size: Vec2::new(8.0, 4.0),
                damage: 15.0,
                expiry,
                explosion_radius: None,
                weapon: WeaponKind::Pistol,
            },
        )
    }

    #[test]
    fn test_spawn_is_centered_on_muzzle() {
        let p = spawn(Expiry::Distance { max: 1000.0 }, Vec2::new(15.0, 0.0));
        assert_eq!(p.body.center(), Vec2::new(100.0, 100.0));
        assert!(!p.is_explosive());
    }

    #[test]
    fn test_distance_expiry_stops_at_max() {
        let mut p = spawn(Expiry::Distance { max: 100.0 }, Vec2::new(30.0, 40.0));
        // 50 units per frame
        assert!(p.advance(1.0, 16.0));
        assert!(!p.advance(1.0, 16.0));
        assert_eq!(p.distance_traveled(), 100.0);
        assert!(!p.body.active);
        // Frozen once expired
        assert!(!p.advance(1.0, 16.0));
        assert_eq!(p.distance_traveled(), 100.0);
    }

    #[test]
    fn test_lifetime_expiry_ignores_distance() {
        let mut p = spawn(Expiry::Lifetime { ms: 48.0 }, Vec2::new(20.0, 0.0));
        assert!(p.advance(1.0, 16.0));
        assert!(p.advance(1.0, 16.0));
        assert!(!p.advance(1.0, 16.0));
        assert_eq!(p.age_ms(), 48.0);
        assert_eq!(p.distance_traveled(), 60.0);
    }

    proptest! {
        #[test]
        fn prop_distance_monotonic_and_bounded(
            vx in -30.0f32..30.0, vy in -30.0f32..30.0,
            steps in proptest::collection::vec(0.1f32..6.0, 1..200),
        ) {
            prop_assume!(vx.abs() + vy.abs() > 0.5);
            let mut p = spawn(Expiry::Distance { max: 1000.0 }, Vec2::new(vx, vy));
            let mut last = 0.0;
            for dt in steps {
                let alive = p.advance(dt, f64::from(dt) * 16.0);
                prop_assert!(p.distance_traveled() <= 1000.0);
                if !alive {
                    break;
                }
                prop_assert!(p.distance_traveled() > last);
                last = p.distance_traveled();
            }
        }

        #[test]
        fn prop_lifetime_never_outlives(deltas in proptest::collection::vec(1.0f64..40.0, 1..50)) {
            let mut p = spawn(Expiry::Lifetime { ms: 75.0 }, Vec2::new(12.0, 0.0));
            for delta in deltas {
                p.advance((delta / 16.0) as f32, delta);
                if p.age_ms() >= 75.0 {
                    prop_assert!(!p.body.active);
                }
            }
        }
    }
}

//! Weapon archetypes and the fire/reload state machine.
//!
//! This module provides:
//! - The closed set of weapon kinds and their stat table
//! - Cooldown, ammo and reload bookkeeping per equipped weapon
//! - Projectile spawn computation for every archetype

use fastrand::Rng;
use frontline_common::Vec2;
use serde::{Deserialize, Serialize};

use crate::projectile::{Expiry, ProjectileSpawn};

/// Distance after which ranged projectiles expire.
pub const DEFAULT_MAX_DISTANCE: f32 = 1000.0;

/// Default projectile footprint.
pub const DEFAULT_PROJECTILE_SIZE: Vec2 = Vec2::new(8.0, 4.0);

/// Duration of the reference frame used to turn melee reach into a lifetime.
pub const REFERENCE_FRAME_MS: f64 = 16.0;

// ============================================================================
// Weapon kinds
// ============================================================================

/// Every weapon in the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeaponKind {
    /// Starting sidearm
    Pistol,
    /// Fast automatic rifle
    Rifle,
    /// Five-pellet spread
    Shotgun,
    /// Large magazine, very fast
    MachineGun,
    /// Slow, heavy hitting, fast projectile
    Sniper,
    /// Explosive rounds
    GrenadeLauncher,
    /// Energy beam
    LaserGun,
    /// Short melee
    Knife,
    /// Medium melee
    Sword,
    /// Heavy melee
    Axe,
    /// Slowest, hardest melee
    Hammer,
    /// Longest melee reach
    Spear,
}

/// Behavioral family of a weapon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Archetype {
    /// One projectile along the aim line
    Standard,
    /// Several projectiles sharing the damage, each with random angular spread
    MultiPellet {
        /// Projectiles per shot
        pellets: u32,
        /// Total spread in radians
        spread: f32,
    },
    /// One projectile flagged explosive
    Explosive {
        /// Declared blast radius
        radius: f32,
    },
    /// Cosmetically distinct, ballistically standard
    Beam,
    /// Short-lived hit volume with a hard range gate
    Melee {
        /// Maximum distance to the target point
        range: f32,
    },
}

impl Archetype {
    /// Blast radius of explosive archetypes.
    #[must_use]
    pub const fn explosion_radius(self) -> Option<f32> {
        match self {
            Self::Explosive { radius } => Some(radius),
            _ => None,
        }
    }
}

/// Static stats of a weapon kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeaponProfile {
    /// Display name
    pub name: &'static str,
    /// Damage per shot (split across pellets)
    pub damage: f32,
    /// Minimum ms between shots
    pub fire_rate_ms: f64,
    /// Magazine size
    pub ammo_capacity: u32,
    /// Time to refill the magazine
    pub reload_ms: f64,
    /// Projectile speed per reference frame
    pub projectile_speed: f32,
    /// Behavioral family
    pub archetype: Archetype,
    /// Projectile footprint
    pub projectile_size: Vec2,
}

const fn profile(
    name: &'static str,
    damage: f32,
    fire_rate_ms: f64,
    ammo_capacity: u32,
    reload_ms: f64,
    projectile_speed: f32,
    archetype: Archetype,
) -> WeaponProfile {
    WeaponProfile {
        name,
        damage,
        fire_rate_ms,
        ammo_capacity,
        reload_ms,
        projectile_speed,
        archetype,
        projectile_size: DEFAULT_PROJECTILE_SIZE,
    }
}

impl WeaponKind {
    /// All kinds, ranged first.
    pub const ALL: [Self; 12] = [
        Self::Pistol,
        Self::Rifle,
        Self::Shotgun,
        Self::MachineGun,
        Self::Sniper,
        Self::GrenadeLauncher,
        Self::LaserGun,
        Self::Knife,
        Self::Sword,
        Self::Axe,
        Self::Hammer,
        Self::Spear,
    ];

    /// Stat table lookup.
    #[must_use]
    pub const fn profile(self) -> WeaponProfile {
        match self {
            Self::Pistol => profile("Pistol", 15.0, 300.0, 12, 1500.0, 15.0, Archetype::Standard),
            Self::Rifle => profile("Rifle", 25.0, 150.0, 30, 2000.0, 20.0, Archetype::Standard),
            Self::Shotgun => profile(
                "Shotgun",
                50.0,
                800.0,
                6,
                2500.0,
                12.0,
                Archetype::MultiPellet {
                    pellets: 5,
                    spread: 0.2,
                },
            ),
            Self::MachineGun => {
                profile("Machine Gun", 20.0, 100.0, 100, 3000.0, 18.0, Archetype::Standard)
            },
            Self::Sniper => {
                profile("Sniper Rifle", 100.0, 1200.0, 5, 2500.0, 30.0, Archetype::Standard)
            },
            Self::GrenadeLauncher => WeaponProfile {
                projectile_size: Vec2::new(10.0, 10.0),
                ..profile(
                    "Grenade Launcher",
                    150.0,
                    2000.0,
                    6,
                    3000.0,
                    10.0,
                    Archetype::Explosive { radius: 80.0 },
                )
            },
            Self::LaserGun => WeaponProfile {
                projectile_size: Vec2::new(12.0, 2.0),
                ..profile("Laser Gun", 30.0, 80.0, 999, 2000.0, 25.0, Archetype::Beam)
            },
            Self::Knife => profile("Knife", 35.0, 300.0, 999, 0.0, 20.0, Archetype::Melee { range: 60.0 }),
            Self::Sword => profile("Sword", 60.0, 500.0, 999, 0.0, 18.0, Archetype::Melee { range: 80.0 }),
            Self::Axe => profile("Axe", 80.0, 700.0, 999, 0.0, 15.0, Archetype::Melee { range: 70.0 }),
            Self::Hammer => profile("Hammer", 100.0, 900.0, 999, 0.0, 12.0, Archetype::Melee { range: 75.0 }),
            Self::Spear => profile("Spear", 70.0, 600.0, 999, 0.0, 22.0, Archetype::Melee { range: 100.0 }),
        }
    }

    /// Returns true for melee weapons.
    #[must_use]
    pub const fn is_melee(self) -> bool {
        matches!(self.profile().archetype, Archetype::Melee { .. })
    }
}

// ============================================================================
// Equipped weapon state
// ============================================================================

/// Where a shot comes from and goes to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aim {
    /// Muzzle position
    pub origin: Vec2,
    /// Point aimed at
    pub target: Vec2,
    /// Shooter facing sign, used when origin and target coincide
    pub facing: f32,
}

impl Aim {
    /// Unit direction from origin to target, or along facing when degenerate.
    #[must_use]
    pub fn direction(&self) -> Vec2 {
        (self.target - self.origin)
            .try_normalize()
            .unwrap_or_else(|| Vec2::new(self.facing.signum(), 0.0))
    }
}

/// A weapon owned by exactly one combatant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weapon {
    kind: WeaponKind,
    current_ammo: u32,
    last_fire_ms: Option<f64>,
    reload_started_ms: Option<f64>,
    /// Multiplier on damage (power-ups, boss and difficulty scaling)
    pub damage_scale: f32,
    /// Multiplier on the fire interval (rapid fire, rage)
    pub fire_rate_scale: f32,
    /// Start reloading when a shot finds the magazine empty
    pub auto_reload: bool,
}

impl Weapon {
    /// Creates a weapon with a full magazine.
    #[must_use]
    pub fn new(kind: WeaponKind) -> Self {
        let profile = kind.profile();
        Self {
            kind,
            current_ammo: profile.ammo_capacity,
            last_fire_ms: None,
            reload_started_ms: None,
            damage_scale: 1.0,
            fire_rate_scale: 1.0,
            auto_reload: matches!(profile.archetype, Archetype::MultiPellet { .. }),
        }
    }

    /// Builder: reload automatically when empty.
    pub fn with_auto_reload(mut self) -> Self {
        self.auto_reload = true;
        self
    }

    /// Weapon kind.
    #[must_use]
    pub const fn kind(&self) -> WeaponKind {
        self.kind
    }

    /// Stat table entry.
    #[must_use]
    pub const fn profile(&self) -> WeaponProfile {
        self.kind.profile()
    }

    /// Rounds left in the magazine.
    #[must_use]
    pub const fn current_ammo(&self) -> u32 {
        self.current_ammo
    }

    /// True while a reload timer runs.
    #[must_use]
    pub const fn is_reloading(&self) -> bool {
        self.reload_started_ms.is_some()
    }

    /// Effective ms between shots.
    #[must_use]
    pub fn fire_interval_ms(&self) -> f64 {
        self.profile().fire_rate_ms * f64::from(self.fire_rate_scale)
    }

    /// Effective damage of one shot before pellet splitting.
    #[must_use]
    pub fn effective_damage(&self) -> f32 {
        self.profile().damage * self.damage_scale
    }

    /// Whether `fire` would succeed at `now`, ignoring the melee range gate.
    #[must_use]
    pub fn can_fire(&self, now: f64) -> bool {
        let has_ammo = self.kind.is_melee() || self.current_ammo > 0;
        let cooled = self
            .last_fire_ms
            .map_or(true, |last| now - last >= self.fire_interval_ms());
        !self.is_reloading() && has_ammo && cooled
    }

    /// Fires at `aim.target`.
    ///
    /// Returns the projectiles to spawn; empty when a precondition fails
    /// (reloading, empty, cooling down, melee target out of reach).
    pub fn fire(&mut self, aim: Aim, now: f64, rng: &mut Rng) -> Vec<ProjectileSpawn> {
        if !self.can_fire(now) {
            if self.auto_reload && self.current_ammo == 0 {
                self.reload(now);
            }
            return Vec::new();
        }

        let profile = self.profile();
        if let Archetype::Melee { range } = profile.archetype {
            if aim.origin.distance(aim.target) > range {
                return Vec::new();
            }
        } else {
            self.current_ammo -= 1;
        }
        self.last_fire_ms = Some(now);

        let direction = aim.direction();
        let damage = self.effective_damage();
        let spawn = |velocity: Vec2, damage: f32, expiry: Expiry, explosion_radius: Option<f32>| {
            ProjectileSpawn {
                origin: aim.origin,
                velocity,
                size: profile.projectile_size,
                damage,
                expiry,
                explosion_radius,
                weapon: self.kind,
            }
        };
        let ranged = Expiry::Distance {
            max: DEFAULT_MAX_DISTANCE,
        };

        match profile.archetype {
            Archetype::Standard | Archetype::Beam => {
                vec![spawn(direction * profile.projectile_speed, damage, ranged, None)]
            },
            Archetype::Explosive { radius } => vec![spawn(
                direction * profile.projectile_speed,
                damage,
                ranged,
                Some(radius),
            )],
            Archetype::MultiPellet { pellets, spread } => {
                let base = direction.y.atan2(direction.x);
                let per_pellet = damage / pellets.max(1) as f32;
                (0..pellets)
                    .map(|_| {
                        let angle = base + (rng.f32() - 0.5) * spread;
                        let velocity = Vec2::from_angle(angle) * profile.projectile_speed;
                        spawn(velocity, per_pellet, ranged, None)
                    })
                    .collect()
            },
            Archetype::Melee { range } => {
                let ms = f64::from(range / profile.projectile_speed) * REFERENCE_FRAME_MS;
                vec![spawn(
                    direction * profile.projectile_speed,
                    damage,
                    Expiry::Lifetime { ms },
                    None,
                )]
            },
        }
    }

    /// Starts a reload. Refused while reloading, when full, or for melee.
    pub fn reload(&mut self, now: f64) -> bool {
        if self.is_reloading()
            || self.kind.is_melee()
            || self.current_ammo >= self.profile().ammo_capacity
        {
            return false;
        }
        self.reload_started_ms = Some(now);
        true
    }

    /// Advances the reload timer; returns true when a reload completes.
    pub fn update(&mut self, now: f64) -> bool {
        match self.reload_started_ms {
            Some(started) if now - started >= self.profile().reload_ms => {
                self.current_ammo = self.profile().ammo_capacity;
                self.reload_started_ms = None;
                true
            },
            _ => false,
        }
    }

    /// Fills the magazine immediately and cancels any reload.
    pub fn refill(&mut self) {
        self.current_ammo = self.profile().ammo_capacity;
        self.reload_started_ms = None;
    }
}

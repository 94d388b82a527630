//! Boss table and the mechanic timers layered over the regular AI.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Health fraction under which rage kicks in.
pub const RAGE_THRESHOLD: f32 = 0.5;

/// Which extra mechanics a boss runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BossMechanic {
    /// Speed and fire-rate boost under half health
    Rage,
    /// Periodic minion summons
    Summon,
    /// Periodic damage-immunity window
    Shield,
    /// Everything above
    All,
}

impl BossMechanic {
    /// Runs the rage mechanic.
    #[must_use]
    pub const fn rages(self) -> bool {
        matches!(self, Self::Rage | Self::All)
    }

    /// Runs the summon mechanic.
    #[must_use]
    pub const fn summons(self) -> bool {
        matches!(self, Self::Summon | Self::All)
    }

    /// Runs the shield mechanic.
    #[must_use]
    pub const fn shields(self) -> bool {
        matches!(self, Self::Shield | Self::All)
    }
}

/// Stat multipliers and timers of one boss.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BossProfile {
    /// Table id
    pub id: u32,
    /// Display name
    pub name: &'static str,
    /// Health multiplier over the base infantry
    pub health_mult: f32,
    /// Damage multiplier
    pub damage_mult: f32,
    /// Speed multiplier
    pub speed_mult: f32,
    /// Shot cooldown multiplier
    pub cooldown_mult: f64,
    /// Awareness radius
    pub aggro_range: f32,
    /// Stop-and-shoot radius
    pub attack_range: f32,
    /// Mechanics layered on the AI
    pub mechanic: BossMechanic,
    /// Summon period
    pub summon_every_ms: Option<f64>,
    /// Shield period
    pub shield_every_ms: Option<f64>,
}

const BASE_HEALTH: f32 = 8.0;
const BASE_DAMAGE: f32 = 2.5;
const BASE_SPEED: f32 = 1.5;
const BASE_COOLDOWN: f64 = 0.4;

impl BossProfile {
    /// Number of authored bosses.
    pub const COUNT: u32 = 4;

    /// Table entry for `id`; unknown ids fall back to id 0.
    #[must_use]
    pub fn for_id(id: u32) -> Self {
        let base = |id, name, mechanic| Self {
            id,
            name,
            health_mult: BASE_HEALTH,
            damage_mult: BASE_DAMAGE,
            speed_mult: BASE_SPEED,
            cooldown_mult: BASE_COOLDOWN,
            aggro_range: 1000.0,
            attack_range: 800.0,
            mechanic,
            summon_every_ms: None,
            shield_every_ms: None,
        };
        match id {
            1 => Self {
                health_mult: BASE_HEALTH * 1.5,
                summon_every_ms: Some(15_000.0),
                ..base(1, "The Devastator", BossMechanic::Summon)
            },
            2 => Self {
                health_mult: BASE_HEALTH * 2.0,
                shield_every_ms: Some(20_000.0),
                ..base(2, "The Annihilator", BossMechanic::Shield)
            },
            3 => Self {
                health_mult: BASE_HEALTH * 3.0,
                damage_mult: BASE_DAMAGE * 1.5,
                speed_mult: BASE_SPEED * 1.3,
                cooldown_mult: BASE_COOLDOWN * 0.7,
                summon_every_ms: Some(12_000.0),
                shield_every_ms: Some(18_000.0),
                ..base(3, "The Overlord", BossMechanic::All)
            },
            _ => base(0, "The Warlord", BossMechanic::Rage),
        }
    }
}

/// Something a boss mechanic did this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BossAction {
    /// Rage started
    Enraged,
    /// Minions should appear
    Summon {
        /// How many
        count: u32,
    },
    /// The shield opened
    ShieldUp,
}

/// Mechanic state of a live boss.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Boss {
    id: u32,
    enraged: bool,
    shielded: bool,
    last_summon_ms: f64,
    last_shield_ms: f64,
}

impl Boss {
    /// Starts every timer at `now`.
    #[must_use]
    pub fn new(profile: BossProfile, now: f64) -> Self {
        Self {
            id: profile.id,
            enraged: false,
            shielded: false,
            last_summon_ms: now,
            last_shield_ms: now,
        }
    }

    /// Table id.
    #[must_use]
    pub const fn id(&self) -> u32 {
        self.id
    }

    /// Table entry.
    #[must_use]
    pub fn profile(&self) -> BossProfile {
        BossProfile::for_id(self.id)
    }

    /// True once rage has kicked in.
    #[must_use]
    pub const fn is_enraged(&self) -> bool {
        self.enraged
    }

    /// True while the shield window is open.
    #[must_use]
    pub const fn is_shielded(&self) -> bool {
        self.shielded
    }

    /// Opens or closes the shield window.
    pub fn set_shielded(&mut self, on: bool) {
        self.shielded = on;
    }

    /// Advances the mechanic timers.
    pub fn update(&mut self, health_fraction: f32, now: f64, summon_count: u32) -> Vec<BossAction> {
        let mut actions = Vec::new();
        let profile = self.profile();
        let mechanic = profile.mechanic;

        if mechanic.rages() && !self.enraged && health_fraction < RAGE_THRESHOLD {
            self.enraged = true;
            debug!(boss = profile.name, "Boss enraged");
            actions.push(BossAction::Enraged);
        }

        if let Some(every) = profile.summon_every_ms.filter(|_| mechanic.summons()) {
            if now - self.last_summon_ms >= every {
                self.last_summon_ms = now;
                debug!(boss = profile.name, count = summon_count, "Boss summons minions");
                actions.push(BossAction::Summon {
                    count: summon_count,
                });
            }
        }

        if let Some(every) = profile.shield_every_ms.filter(|_| mechanic.shields()) {
            if !self.shielded && now - self.last_shield_ms >= every {
                self.last_shield_ms = now;
                self.shielded = true;
                debug!(boss = profile.name, "Boss shield up");
                actions.push(BossAction::ShieldUp);
            }
        }
        actions
    }
}

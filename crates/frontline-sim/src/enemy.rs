//! Enemy archetypes and the enemy combatant.

use std::str::FromStr;

use fastrand::Rng;
use frontline_common::{EntityId, Vec2};
use serde::{Deserialize, Serialize};

use crate::ai::{self, AiState, Brain, Transition};
use crate::body::Body;
use crate::boss::{Boss, BossAction, BossProfile};
use crate::combatant::{Combatant, DamageOutcome, Facing};
use crate::config::SimConfig;
use crate::projectile::ProjectileSpawn;
use crate::weapon::{Aim, Weapon, WeaponKind};

/// Regular enemy footprint.
pub const ENEMY_SIZE: Vec2 = Vec2::new(28.0, 48.0);
/// Boss height; bosses share the regular width.
pub const BOSS_HEIGHT: f32 = 70.0;
/// Distance from center to the muzzle.
pub const ENEMY_MUZZLE_OFFSET: f32 = 10.0;
/// Default awareness radius.
pub const DEFAULT_AGGRO_RANGE: f32 = 400.0;
/// Default stop-and-shoot radius.
pub const DEFAULT_ATTACK_RANGE: f32 = 300.0;
/// Health fraction below which enemies retreat.
pub const DEFAULT_RETREAT_THRESHOLD: f32 = 0.3;
/// Minimum ms between enemy shots.
pub const DEFAULT_SHOT_COOLDOWN_MS: f64 = 1000.0;
/// Patrol reach either side of the spawn point.
pub const PATROL_REACH: f32 = 100.0;

/// Regular enemy archetype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyKind {
    /// Pistol grunt
    Infantry,
    /// Slow, tough, machine gun
    Heavy,
    /// Long-range rifle
    Sniper,
    /// Fast and fragile
    Scout,
}

/// Stats of an enemy archetype.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemyProfile {
    /// Max health before difficulty scaling
    pub max_health: f32,
    /// Speed per reference frame
    pub speed: f32,
    /// Weapon carried
    pub weapon: WeaponKind,
    /// Stop-and-shoot radius
    pub attack_range: f32,
}

impl EnemyKind {
    /// Every regular archetype.
    pub const ALL: [Self; 4] = [Self::Infantry, Self::Heavy, Self::Sniper, Self::Scout];

    /// Stat table entry.
    #[must_use]
    pub const fn profile(self) -> EnemyProfile {
        let (max_health, speed, weapon, attack_range) = match self {
            Self::Infantry => (50.0, 2.0, WeaponKind::Pistol, DEFAULT_ATTACK_RANGE),
            Self::Heavy => (100.0, 1.5, WeaponKind::MachineGun, DEFAULT_ATTACK_RANGE),
            Self::Sniper => (40.0, 1.8, WeaponKind::Sniper, 600.0),
            Self::Scout => (30.0, 3.5, WeaponKind::Pistol, DEFAULT_ATTACK_RANGE),
        };
        EnemyProfile {
            max_health,
            speed,
            weapon,
            attack_range,
        }
    }

    /// Lowercase name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Infantry => "infantry",
            Self::Heavy => "heavy",
            Self::Sniper => "sniper",
            Self::Scout => "scout",
        }
    }

    /// Archetypes that can drop a weapon on death.
    #[must_use]
    pub const fn is_elite(self) -> bool {
        matches!(self, Self::Heavy | Self::Sniper)
    }
}

impl FromStr for EnemyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown enemy kind '{s}'"))
    }
}

/// A hostile combatant driven by [`ai::think`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enemy {
    /// Health, body and weapon
    pub combatant: Combatant,
    /// Archetype the stats came from
    pub kind: EnemyKind,
    /// State machine
    pub brain: Brain,
    /// Awareness radius
    pub aggro_range: f32,
    /// Stop-and-shoot radius
    pub attack_range: f32,
    /// Health fraction that triggers retreat
    pub retreat_threshold: f32,
    /// Minimum ms between shots
    pub shot_cooldown_ms: f64,
    /// Last time a shot actually left the weapon
    pub last_shot_ms: Option<f64>,
    /// Left patrol bound
    pub patrol_min: f32,
    /// Right patrol bound
    pub patrol_max: f32,
    /// Current patrol heading, ±1
    pub patrol_dir: f32,
    /// Boss extension
    pub boss: Option<Boss>,
}

impl Enemy {
    /// Spawns a regular enemy standing on `ground_level` at `x`.
    ///
    /// `strength` scales health and damage.
    #[must_use]
    pub fn spawn(id: EntityId, kind: EnemyKind, x: f32, ground_level: f32, strength: f32, now: f64) -> Self {
        let profile = kind.profile();
        let body = Body::new(x, ground_level - ENEMY_SIZE.y, ENEMY_SIZE.x, ENEMY_SIZE.y);
        let mut weapon = Weapon::new(profile.weapon).with_auto_reload();
        weapon.damage_scale = strength;
        let combatant = Combatant::new(id, body, profile.max_health * strength, profile.speed, weapon)
            .facing(Facing::Left);
        Self {
            combatant,
            kind,
            brain: Brain::new(AiState::Patrol, now),
            aggro_range: DEFAULT_AGGRO_RANGE,
            attack_range: profile.attack_range,
            retreat_threshold: DEFAULT_RETREAT_THRESHOLD,
            shot_cooldown_ms: DEFAULT_SHOT_COOLDOWN_MS,
            last_shot_ms: None,
            patrol_min: x - PATROL_REACH,
            patrol_max: x + PATROL_REACH,
            patrol_dir: -1.0,
            boss: None,
        }
    }

    /// Spawns the boss with table id `boss_id` (unknown ids use the first boss).
    #[must_use]
    pub fn spawn_boss(id: EntityId, boss_id: u32, x: f32, ground_level: f32, strength: f32, now: f64) -> Self {
        let profile = BossProfile::for_id(boss_id);
        let mut enemy = Self::spawn(id, EnemyKind::Infantry, x, ground_level, strength, now);
        let base = EnemyKind::Infantry.profile();

        enemy.combatant.body.resize_height(BOSS_HEIGHT);
        enemy
            .combatant
            .reset_max_health(base.max_health * profile.health_mult * strength);
        enemy.combatant.speed = base.speed * profile.speed_mult;
        enemy.combatant.weapon_mut().damage_scale = profile.damage_mult * strength;
        enemy.shot_cooldown_ms = DEFAULT_SHOT_COOLDOWN_MS * profile.cooldown_mult;
        enemy.aggro_range = profile.aggro_range;
        enemy.attack_range = profile.attack_range;
        enemy.boss = Some(Boss::new(profile, now));
        enemy
    }

    /// Entity id.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.combatant.id
    }

    /// Position and motion.
    #[must_use]
    pub const fn body(&self) -> &Body {
        &self.combatant.body
    }

    /// Whether this enemy has the boss extension.
    #[must_use]
    pub const fn is_boss(&self) -> bool {
        self.boss.is_some()
    }

    /// Muzzle position.
    #[must_use]
    pub fn muzzle(&self) -> Vec2 {
        self.combatant.muzzle(ENEMY_MUZZLE_OFFSET)
    }

    /// Applies a hit and feeds a survived hit back into the state machine.
    pub fn take_hit(&mut self, amount: f32, now: f64, rng: &mut Rng) -> (DamageOutcome, Option<Transition>) {
        let outcome = self.combatant.take_damage(amount);
        let transition = match outcome {
            DamageOutcome::Wounded { .. } => ai::on_damaged(self, now, rng),
            _ => None,
        };
        (outcome, transition)
    }

    /// Fires the weapon at `target`.
    ///
    /// The shot cooldown restarts only when the weapon produced projectiles.
    pub fn fire_at(&mut self, target: Vec2, now: f64, rng: &mut Rng) -> Vec<ProjectileSpawn> {
        let aim = Aim {
            origin: self.muzzle(),
            target,
            facing: self.combatant.facing.sign(),
        };
        let shots = self.combatant.weapon_mut().fire(aim, now, rng);
        if !shots.is_empty() {
            self.last_shot_ms = Some(now);
        }
        shots
    }

    /// Runs boss timers and applies their immediate effects.
    ///
    /// Rage boosts are applied here; the caller spawns summoned minions and
    /// schedules the shield's end.
    pub fn update_boss(&mut self, now: f64, config: &SimConfig) -> Vec<BossAction> {
        let alive = self.combatant.is_alive();
        let fraction = self.combatant.health_fraction();
        let Some(boss) = self.boss.as_mut() else {
            return Vec::new();
        };
        if !alive {
            return Vec::new();
        }

        let actions = boss.update(fraction, now, config.boss_summon_count);
        for action in &actions {
            match action {
                BossAction::Enraged => {
                    self.combatant.speed *= config.boss_rage_speed;
                    self.shot_cooldown_ms *= f64::from(config.boss_rage_cooldown);
                    self.combatant.weapon_mut().fire_rate_scale *= config.boss_rage_cooldown;
                },
                BossAction::ShieldUp => self.combatant.invulnerable = true,
                BossAction::Summon { .. } => {},
            }
        }
        actions
    }

    /// Closes the boss shield window.
    pub fn lower_shield(&mut self) -> bool {
        match self.boss.as_mut() {
            Some(boss) if boss.is_shielded() => {
                boss.set_shielded(false);
                self.combatant.invulnerable = false;
                true
            },
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_profiles() {
        let sniper = Enemy::spawn(EntityId::from_raw(1), EnemyKind::Sniper, 500.0, 550.0, 1.0, 0.0);
        assert_eq!(sniper.combatant.max_health(), 40.0);
        assert_eq!(sniper.attack_range, 600.0);
        assert_eq!(sniper.combatant.weapon().kind(), WeaponKind::Sniper);
        assert!(sniper.combatant.weapon().auto_reload);
        assert_eq!(sniper.patrol_min, 400.0);
        assert_eq!(sniper.patrol_max, 600.0);
        assert_eq!(sniper.combatant.facing, Facing::Left);
        assert_eq!(sniper.body().bottom(), 550.0);
        assert_eq!("HEAVY".parse::<EnemyKind>(), Ok(EnemyKind::Heavy));
    }

    #[test]
    fn test_strength_scales_health_and_damage() {
        let weak = Enemy::spawn(EntityId::from_raw(1), EnemyKind::Heavy, 0.0, 550.0, 0.5, 0.0);
        assert_eq!(weak.combatant.max_health(), 50.0);
        assert_eq!(weak.combatant.weapon().effective_damage(), 10.0);
    }

    #[test]
    fn test_boss_stats() {
        let boss = Enemy::spawn_boss(EntityId::from_raw(1), 0, 800.0, 550.0, 1.0, 0.0);
        assert!(boss.is_boss());
        assert_eq!(boss.combatant.max_health(), 400.0);
        assert_eq!(boss.combatant.speed, 3.0);
        assert_eq!(boss.combatant.weapon().effective_damage(), 37.5);
        assert_eq!(boss.shot_cooldown_ms, 400.0);
        assert_eq!(boss.aggro_range, 1000.0);
        assert_eq!(boss.attack_range, 800.0);
        assert_eq!(boss.body().size.y, BOSS_HEIGHT);
        assert_eq!(boss.body().bottom(), 550.0);
    }

    #[test]
    fn test_wounded_enemy_chases() {
        let mut rng = Rng::with_seed(1);
        let mut enemy = Enemy::spawn(EntityId::from_raw(1), EnemyKind::Infantry, 0.0, 550.0, 1.0, 0.0);
        let (outcome, transition) = enemy.take_hit(15.0, 10.0, &mut rng);
        assert_eq!(outcome, DamageOutcome::Wounded { dealt: 15.0 });
        assert_eq!(transition.map(|t| t.to), Some(AiState::Chase));
        let (outcome, transition) = enemy.take_hit(100.0, 20.0, &mut rng);
        assert_eq!(outcome, DamageOutcome::Killed { dealt: 35.0 });
        assert_eq!(transition, None);
    }

    #[test]
    fn test_rage_applies_once() {
        let config = SimConfig::default();
        let mut boss = Enemy::spawn_boss(EntityId::from_raw(1), 0, 800.0, 550.0, 1.0, 0.0);
        boss.combatant.take_damage(250.0);
        let actions = boss.update_boss(16.0, &config);
        assert_eq!(actions, vec![BossAction::Enraged]);
        assert!((boss.combatant.speed - 3.9).abs() < 1e-5);
        assert!((boss.shot_cooldown_ms - 240.0).abs() < 1e-3);
        assert!(boss.update_boss(32.0, &config).is_empty());
    }

    #[test]
    fn test_shield_window() {
        let config = SimConfig::default();
        let mut boss = Enemy::spawn_boss(EntityId::from_raw(1), 2, 800.0, 550.0, 1.0, 0.0);
        assert!(boss.update_boss(19_999.0, &config).is_empty());
        assert_eq!(boss.update_boss(20_000.0, &config), vec![BossAction::ShieldUp]);
        assert!(boss.combatant.invulnerable);
        assert_eq!(boss.combatant.take_damage(50.0), DamageOutcome::Ignored);
        assert!(boss.lower_shield());
        assert!(!boss.lower_shield());
        assert!(boss.combatant.take_damage(50.0).landed());
    }
}

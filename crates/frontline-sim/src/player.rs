//! The player combatant: character classes, movement intent, rolls and
//! power-up modifiers.
//!
//! Input devices are out of scope; hosts describe what the player wants to do
//! each frame with a [`PlayerInput`] and the simulation applies it.

use std::str::FromStr;

use fastrand::Rng;
use frontline_common::{EntityId, Vec2};
use serde::{Deserialize, Serialize};

use crate::body::Body;
use crate::combatant::{Combatant, Facing};
use crate::projectile::ProjectileSpawn;
use crate::terrain::Terrain;
use crate::weapon::{Aim, Weapon, WeaponKind};

/// Standing player footprint.
pub const PLAYER_SIZE: Vec2 = Vec2::new(30.0, 50.0);

/// Height while crouching.
pub const CROUCH_HEIGHT: f32 = 30.0;

/// Speed while crouching.
pub const CROUCH_SPEED: f32 = 2.0;

/// Initial vertical velocity of a jump.
pub const JUMP_VELOCITY: f32 = -12.0;

/// How long a roll lasts.
pub const ROLL_DURATION_MS: f64 = 400.0;

/// Extra wait after a roll before the next one.
pub const ROLL_RECOVERY_MS: f64 = 800.0;

/// Horizontal speed during a roll.
pub const ROLL_SPEED: f32 = 10.0;

/// Distance from center to the muzzle.
pub const PLAYER_MUZZLE_OFFSET: f32 = 15.0;

/// Maximum weapons carried.
pub const MAX_WEAPONS: usize = 4;

// ============================================================================
// Character classes
// ============================================================================

/// Selectable character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CharacterClass {
    /// Balanced
    #[default]
    Soldier,
    /// Fast, fragile, quicker rolls
    Scout,
    /// Slow and tough
    Heavy,
    /// Regenerates health
    Medic,
}

/// Stats of a character class.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CharacterProfile {
    /// Base max health before difficulty scaling
    pub max_health: f32,
    /// Run speed per reference frame
    pub speed: f32,
    /// Added to the roll wait; negative rolls sooner
    pub roll_cooldown_ms: f64,
    /// Health restored per reference frame
    pub regen_per_frame: f32,
}

impl CharacterClass {
    /// Every class.
    pub const ALL: [Self; 4] = [Self::Soldier, Self::Scout, Self::Heavy, Self::Medic];

    /// Stat table entry.
    #[must_use]
    pub const fn profile(self) -> CharacterProfile {
        let (max_health, speed, roll_cooldown_ms, regen_per_frame) = match self {
            Self::Soldier => (100.0, 4.0, 0.0, 0.0),
            Self::Scout => (80.0, 6.0, -200.0, 0.0),
            Self::Heavy => (150.0, 3.0, 0.0, 0.0),
            Self::Medic => (90.0, 4.5, 0.0, 0.05),
        };
        CharacterProfile {
            max_health,
            speed,
            roll_cooldown_ms,
            regen_per_frame,
        }
    }
}

impl std::fmt::Display for CharacterClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Soldier => "soldier",
            Self::Scout => "scout",
            Self::Heavy => "heavy",
            Self::Medic => "medic",
        };
        f.write_str(name)
    }
}

impl FromStr for CharacterClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|class| class.to_string().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown character class '{s}'"))
    }
}

// ============================================================================
// Input
// ============================================================================

/// What the player wants to do this frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerInput {
    /// −1 left, +1 right, 0 idle
    pub move_axis: f32,
    /// Jump if grounded
    pub jump: bool,
    /// Hold to crouch
    pub crouch: bool,
    /// Start a roll
    pub roll: bool,
    /// Fire the current weapon at this point
    pub fire_at: Option<Vec2>,
    /// Start reloading the current weapon
    pub reload: bool,
    /// Switch to this weapon slot
    pub select_weapon: Option<usize>,
}

impl PlayerInput {
    /// Builder: move along `axis`.
    pub fn moving(mut self, axis: f32) -> Self {
        self.move_axis = axis;
        self
    }

    /// Builder: fire at `target`.
    pub fn firing_at(mut self, target: Vec2) -> Self {
        self.fire_at = Some(target);
        self
    }
}

// ============================================================================
// Player
// ============================================================================

/// Animation-level state of the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PlayerState {
    /// Standing still
    #[default]
    Idle,
    /// Moving on the ground
    Running,
    /// In the air after a jump
    Jumping,
    /// Crouched
    Crouching,
    /// Mid-roll
    Rolling,
}

/// Result of picking up a weapon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddWeapon {
    /// Stored in this slot
    Added {
        /// Slot index
        slot: usize,
    },
    /// A weapon of this kind is already carried
    Duplicate,
    /// All slots are taken
    Full,
}

/// What applying one frame of input produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerActions {
    /// Projectiles to spawn
    pub shots: Vec<ProjectileSpawn>,
    /// A roll began; the caller schedules its end
    pub roll_started: bool,
    /// A reload began
    pub reload_started: bool,
}

/// The player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Health, body and weapons
    pub combatant: Combatant,
    /// Character class
    pub class: CharacterClass,
    /// Current movement state
    pub state: PlayerState,
    base_speed: f32,
    crouching: bool,
    rolling: bool,
    last_roll_ms: Option<f64>,
    spawn_protected: bool,
    invincible: bool,
    damage_boost: f32,
    speed_boost: f32,
    fire_rate_boost: f32,
}

impl Player {
    /// Spawns a player standing on `ground_level` at `x`.
    ///
    /// `health_mult` is the difficulty's player health multiplier.
    #[must_use]
    pub fn spawn(id: EntityId, class: CharacterClass, x: f32, ground_level: f32, health_mult: f32) -> Self {
        let profile = class.profile();
        let body = Body::new(x, ground_level - PLAYER_SIZE.y, PLAYER_SIZE.x, PLAYER_SIZE.y);
        let combatant = Combatant::new(
            id,
            body,
            (profile.max_health * health_mult).round(),
            profile.speed,
            Weapon::new(WeaponKind::Pistol),
        )
        .facing(Facing::Right);
        Self {
            combatant,
            class,
            state: PlayerState::Idle,
            base_speed: profile.speed,
            crouching: false,
            rolling: false,
            last_roll_ms: None,
            spawn_protected: false,
            invincible: false,
            damage_boost: 1.0,
            speed_boost: 1.0,
            fire_rate_boost: 1.0,
        }
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

    /// Alive and in play.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.combatant.is_alive()
    }

    /// True while crouched.
    #[must_use]
    pub const fn is_crouching(&self) -> bool {
        self.crouching
    }

    /// True while rolling.
    #[must_use]
    pub const fn is_rolling(&self) -> bool {
        self.rolling
    }

    /// Muzzle position.
    #[must_use]
    pub fn muzzle(&self) -> Vec2 {
        self.combatant.muzzle(PLAYER_MUZZLE_OFFSET)
    }

    /// Applies one frame of intent: movement, stance, jump, roll, weapon
    /// selection, reload and fire.
    pub fn apply_input(&mut self, input: &PlayerInput, now: f64, rng: &mut Rng) -> PlayerActions {
        let mut actions = PlayerActions::default();
        if !self.is_alive() {
            return actions;
        }

        if let Some(slot) = input.select_weapon {
            self.combatant.select_weapon(slot);
        }

        if !self.rolling {
            if input.crouch {
                self.crouch();
            } else {
                self.stand();
            }
            self.steer(input.move_axis);
            if input.jump && self.combatant.on_ground && !self.crouching {
                self.combatant.body.velocity.y = JUMP_VELOCITY;
                self.combatant.on_ground = false;
                self.state = PlayerState::Jumping;
            }
            if input.roll {
                actions.roll_started = self.start_roll(now);
            }
        }

        if input.reload {
            actions.reload_started = self.combatant.weapon_mut().reload(now);
        }

        if let Some(target) = input.fire_at {
            let aim = Aim {
                origin: self.muzzle(),
                target,
                facing: self.combatant.facing.sign(),
            };
            actions.shots = self.combatant.weapon_mut().fire(aim, now, rng);
        }
        actions
    }

    fn steer(&mut self, axis: f32) {
        let speed = self.speed();
        let body = &mut self.combatant.body;
        if axis < 0.0 {
            body.velocity.x = -speed;
            self.combatant.facing = Facing::Left;
        } else if axis > 0.0 {
            body.velocity.x = speed;
            self.combatant.facing = Facing::Right;
        } else {
            body.velocity.x = 0.0;
        }

        self.state = if self.crouching {
            PlayerState::Crouching
        } else if !self.combatant.on_ground {
            PlayerState::Jumping
        } else if axis == 0.0 {
            PlayerState::Idle
        } else {
            PlayerState::Running
        };
    }

    /// Effective run speed including stance and boosts.
    #[must_use]
    pub fn speed(&self) -> f32 {
        let base = if self.crouching { CROUCH_SPEED } else { self.base_speed };
        base * self.speed_boost
    }

    fn crouch(&mut self) {
        if !self.crouching && self.combatant.on_ground {
            self.crouching = true;
            self.combatant.body.resize_height(CROUCH_HEIGHT);
            self.state = PlayerState::Crouching;
        }
    }

    fn stand(&mut self) {
        if self.crouching {
            self.crouching = false;
            self.combatant.body.resize_height(PLAYER_SIZE.y);
        }
    }

    /// Stays crouched when standing up would push the head into solid terrain.
    ///
    /// Returns true if the stand was undone.
    pub fn keep_headroom(&mut self, terrain: &Terrain) -> bool {
        if self.crouching || self.rolling || !self.combatant.on_ground {
            return false;
        }
        let standing = self.combatant.body.bounds();
        if !terrain.blocks(&standing) {
            return false;
        }
        let mut low = self.combatant.body;
        low.resize_height(CROUCH_HEIGHT);
        if terrain.blocks(&low.bounds()) {
            return false;
        }
        self.crouching = true;
        self.combatant.body = low;
        let speed = self.speed();
        self.combatant.body.velocity.x = self.combatant.body.velocity.x.clamp(-speed, speed);
        self.state = PlayerState::Crouching;
        true
    }

    /// Starts a roll if grounded and recovered from the last one.
    pub fn start_roll(&mut self, now: f64) -> bool {
        let wait = ROLL_DURATION_MS + self.class.profile().roll_cooldown_ms + ROLL_RECOVERY_MS;
        let recovered = self.last_roll_ms.map_or(true, |last| now - last > wait);
        if !self.combatant.on_ground || self.rolling || !recovered {
            return false;
        }
        self.stand();
        self.rolling = true;
        self.last_roll_ms = Some(now);
        self.combatant.body.velocity.x = self.combatant.facing.sign() * ROLL_SPEED;
        self.state = PlayerState::Rolling;
        self.refresh_invulnerability();
        true
    }

    /// Ends the current roll, halving its momentum.
    pub fn end_roll(&mut self) {
        if self.rolling {
            self.rolling = false;
            self.combatant.body.velocity.x *= 0.5;
            self.state = PlayerState::Idle;
            self.refresh_invulnerability();
        }
    }

    /// Toggles post-spawn protection.
    pub fn set_spawn_protection(&mut self, on: bool) {
        self.spawn_protected = on;
        self.refresh_invulnerability();
    }

    /// Toggles the invincibility power-up.
    pub fn set_invincible(&mut self, on: bool) {
        self.invincible = on;
        self.refresh_invulnerability();
    }

    fn refresh_invulnerability(&mut self) {
        self.combatant.invulnerable = self.rolling || self.spawn_protected || self.invincible;
    }

    /// Sets the damage multiplier applied to every carried weapon.
    pub fn set_damage_boost(&mut self, mult: f32) {
        self.damage_boost = mult;
        self.sync_weapon_modifiers();
    }

    /// Sets the fire interval multiplier applied to every carried weapon.
    pub fn set_fire_rate_boost(&mut self, mult: f32) {
        self.fire_rate_boost = mult;
        self.sync_weapon_modifiers();
    }

    /// Sets the run speed multiplier.
    pub fn set_speed_boost(&mut self, mult: f32) {
        self.speed_boost = mult;
    }

    fn sync_weapon_modifiers(&mut self) {
        let (damage, fire_rate) = (self.damage_boost, self.fire_rate_boost);
        for weapon in self.combatant.weapons_mut() {
            weapon.damage_scale = damage;
            weapon.fire_rate_scale = fire_rate;
        }
    }

    /// Passive regeneration for classes that have it.
    pub fn regenerate(&mut self, dt_scale: f32) {
        let rate = self.class.profile().regen_per_frame;
        if rate > 0.0 && self.combatant.health() < self.combatant.max_health() {
            self.combatant.heal(rate * dt_scale);
        }
    }

    /// Picks up a weapon into the next free slot.
    pub fn add_weapon(&mut self, kind: WeaponKind) -> AddWeapon {
        if self.combatant.has_weapon(kind) {
            return AddWeapon::Duplicate;
        }
        if self.combatant.weapons().len() >= MAX_WEAPONS {
            return AddWeapon::Full;
        }
        self.combatant.push_weapon(Weapon::new(kind));
        self.sync_weapon_modifiers();
        AddWeapon::Added {
            slot: self.combatant.weapons().len() - 1,
        }
    }

    /// Replaces the weapon in `slot`; returns the kind dropped.
    pub fn swap_weapon(&mut self, slot: usize, kind: WeaponKind) -> Option<WeaponKind> {
        if self.combatant.has_weapon(kind) {
            return None;
        }
        let dropped = self.combatant.replace_weapon(slot, Weapon::new(kind))?;
        self.sync_weapon_modifiers();
        Some(dropped.kind())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grounded(class: CharacterClass) -> Player {
        let mut player = Player::spawn(EntityId::from_raw(1), class, 100.0, 550.0, 1.0);
        player.combatant.on_ground = true;
        player
    }

    #[test]
    fn test_class_profiles() {
        let scout = grounded(CharacterClass::Scout);
        assert_eq!(scout.combatant.max_health(), 80.0);
        assert_eq!(scout.speed(), 6.0);
        assert_eq!(
            "HEAVY".parse::<CharacterClass>(),
            Ok(CharacterClass::Heavy)
        );
        assert!("pilot".parse::<CharacterClass>().is_err());
    }

    #[test]
    fn test_difficulty_health() {
        let player = Player::spawn(EntityId::from_raw(1), CharacterClass::Soldier, 0.0, 550.0, 2.5);
        assert_eq!(player.combatant.max_health(), 250.0);
        assert_eq!(player.body().bottom(), 550.0);
    }

    #[test]
    fn test_move_sets_facing() {
        let mut rng = Rng::with_seed(1);
        let mut player = grounded(CharacterClass::Soldier);
        player.apply_input(&PlayerInput::default().moving(-1.0), 0.0, &mut rng);
        assert_eq!(player.combatant.facing, Facing::Left);
        assert_eq!(player.body().velocity.x, -4.0);
        assert_eq!(player.state, PlayerState::Running);
    }

    #[test]
    fn test_crouch_keeps_feet() {
        let mut rng = Rng::with_seed(1);
        let mut player = grounded(CharacterClass::Soldier);
        let input = PlayerInput {
            crouch: true,
            move_axis: 1.0,
            ..PlayerInput::default()
        };
        player.apply_input(&input, 0.0, &mut rng);
        assert!(player.is_crouching());
        assert_eq!(player.body().size.y, CROUCH_HEIGHT);
        assert_eq!(player.body().bottom(), 550.0);
        assert_eq!(player.body().velocity.x, CROUCH_SPEED);

        player.apply_input(&PlayerInput::default(), 16.0, &mut rng);
        assert_eq!(player.body().size.y, PLAYER_SIZE.y);
    }

    #[test]
    fn test_jump_only_from_ground() {
        let mut rng = Rng::with_seed(1);
        let mut player = grounded(CharacterClass::Soldier);
        let jump = PlayerInput {
            jump: true,
            ..PlayerInput::default()
        };
        player.apply_input(&jump, 0.0, &mut rng);
        assert_eq!(player.body().velocity.y, JUMP_VELOCITY);
        player.combatant.body.velocity.y = 0.0;
        player.apply_input(&jump, 16.0, &mut rng);
        assert_eq!(player.body().velocity.y, 0.0);
    }

    #[test]
    fn test_roll_cycle() {
        let mut player = grounded(CharacterClass::Soldier);
        assert!(player.start_roll(0.0));
        assert!(player.combatant.invulnerable);
        assert_eq!(player.body().velocity.x, ROLL_SPEED);
        assert!(!player.start_roll(100.0));

        player.end_roll();
        assert!(!player.combatant.invulnerable);
        assert_eq!(player.body().velocity.x, ROLL_SPEED * 0.5);

        assert!(!player.start_roll(1200.0));
        assert!(player.start_roll(1201.0));
    }

    #[test]
    fn test_scout_rolls_sooner() {
        let mut player = grounded(CharacterClass::Scout);
        assert!(player.start_roll(0.0));
        player.end_roll();
        assert!(player.start_roll(1001.0));
    }

    #[test]
    fn test_invulnerability_sources_combine() {
        let mut player = grounded(CharacterClass::Soldier);
        player.set_spawn_protection(true);
        player.set_invincible(true);
        player.set_spawn_protection(false);
        assert!(player.combatant.invulnerable);
        player.set_invincible(false);
        assert!(!player.combatant.invulnerable);
    }

    #[test]
    fn test_weapon_inventory() {
        let mut player = grounded(CharacterClass::Soldier);
        assert_eq!(player.add_weapon(WeaponKind::Pistol), AddWeapon::Duplicate);
        assert_eq!(player.add_weapon(WeaponKind::Rifle), AddWeapon::Added { slot: 1 });
        player.add_weapon(WeaponKind::Shotgun);
        player.add_weapon(WeaponKind::Sniper);
        assert_eq!(player.add_weapon(WeaponKind::Sword), AddWeapon::Full);
        assert_eq!(player.swap_weapon(0, WeaponKind::Sword), Some(WeaponKind::Pistol));
        assert!(player.combatant.has_weapon(WeaponKind::Sword));
    }

    #[test]
    fn test_boosts_reach_new_weapons() {
        let mut player = grounded(CharacterClass::Soldier);
        player.set_damage_boost(1.5);
        player.add_weapon(WeaponKind::Rifle);
        assert!(player.combatant.weapons().iter().all(|w| w.damage_scale == 1.5));
        player.set_damage_boost(1.0);
        assert!(player.combatant.weapons().iter().all(|w| w.damage_scale == 1.0));
    }

    #[test]
    fn test_fire_from_muzzle() {
        let mut rng = Rng::with_seed(1);
        let mut player = grounded(CharacterClass::Soldier);
        let muzzle = player.muzzle();
        let actions = player.apply_input(
            &PlayerInput::default().firing_at(muzzle + Vec2::new(200.0, 0.0)),
            0.0,
            &mut rng,
        );
        assert_eq!(actions.shots.len(), 1);
        assert_eq!(actions.shots[0].origin, muzzle);
    }

    #[test]
    fn test_medic_regenerates() {
        let mut player = grounded(CharacterClass::Medic);
        player.combatant.take_damage(10.0);
        player.regenerate(2.0);
        assert!((player.combatant.health() - 80.1).abs() < 1e-4);
    }
}

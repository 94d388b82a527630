//! Frame orchestration.
//!
//! [`Simulation::step`] runs one frame in a fixed order:
//! 1. due timed effects
//! 2. player intent and AI decisions against last frame's positions
//! 3. boss mechanics
//! 4. integration, projectile flight and weapon timers
//! 5. terrain resolution
//! 6. projectile impacts and loot
//! 7. pickup collection
//! 8. removal of inactive entities, then queued spawns join the world
//! 9. the frame report goes to observers, whose failures are contained

use std::panic::{self, AssertUnwindSafe};
use std::str::FromStr;

use ahash::AHashMap;
use frontline_common::{EntityId, FrontlineError, FrontlineResult, SchemaVersion, Vec2};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, trace, warn};

use crate::ai::{self, AiState};
use crate::boss::BossAction;
use crate::collision::{TerrainResolver, Tolerances};
use crate::combat::{self, CombatStats};
use crate::combatant::{Combatant, Facing};
use crate::config::SimConfig;
use crate::context::SimContext;
use crate::effects::TimedEffect;
use crate::enemy::{Enemy, EnemyKind};
use crate::events::SimEvent;
use crate::level::{self, Campaign, SpawnKind, SpawnPlan};
use crate::pickup::{self, Pickup, PickupKind, PickupOutcome};
use crate::player::{CharacterClass, Player, PlayerInput, ROLL_DURATION_MS};
use crate::projectile::{Faction, Projectile, ProjectileSpawn};
use crate::terrain::Terrain;
use crate::waves::WaveDirector;
use crate::weapon::WeaponKind;

/// Player spawn x at the start of a level.
pub const PLAYER_START_X: f32 = 100.0;
/// Health restored when advancing to the next campaign level.
pub const LEVEL_HEAL: f32 = 30.0;
/// Horizontal spacing of summoned minions around their boss.
pub const MINION_SPACING: f32 = 60.0;

// ============================================================================
// Modes, outcomes, observers
// ============================================================================

/// How enemies are supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    /// Authored levels in order
    #[default]
    Campaign,
    /// Endless escalating waves
    Survival,
}

impl std::fmt::Display for GameMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Campaign => "campaign",
            Self::Survival => "survival",
        })
    }
}

impl FromStr for GameMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "campaign" => Ok(Self::Campaign),
            "survival" => Ok(Self::Survival),
            other => Err(format!("unknown game mode '{other}'")),
        }
    }
}

/// State of the run after a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// Enemies remain
    InProgress,
    /// The current level has no enemies left
    LevelCleared {
        /// Level index
        index: usize,
    },
    /// The current wave has no enemies left
    WaveCleared {
        /// Wave number
        wave: u32,
    },
    /// The last level was cleared
    CampaignComplete,
    /// The player is dead
    PlayerDead,
}

/// Failure reported by a frame observer. Logged, never propagated.
#[derive(Debug, Error)]
pub enum ObserverError {
    /// The observer could not handle the frame
    #[error("observer '{observer}' failed: {reason}")]
    Failed {
        /// Observer name
        observer: String,
        /// What went wrong
        reason: String,
    },
}

/// Result type alias for observers.
pub type ObserverResult = Result<(), ObserverError>;

/// Something that consumes frame reports: scoring, audio cues, logging.
pub trait FrameObserver {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Handles one frame.
    fn on_frame(&mut self, report: &FrameReport) -> ObserverResult;
}

/// Runs `observer` on `report`, logging an error or a panic instead of
/// propagating it.
pub fn notify_isolated(observer: &mut dyn FrameObserver, report: &FrameReport) -> bool {
    match panic::catch_unwind(AssertUnwindSafe(|| observer.on_frame(report))) {
        Ok(Ok(())) => true,
        Ok(Err(error)) => {
            warn!(observer = observer.name(), %error, "Frame observer failed");
            false
        },
        Err(_) => {
            warn!(observer = observer.name(), "Frame observer panicked");
            false
        },
    }
}

// ============================================================================
// Frame report
// ============================================================================

/// Render-facing state of a combatant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatantSnapshot {
    /// Entity id
    pub id: EntityId,
    /// Top-left corner
    pub position: Vec2,
    /// Width and height
    pub size: Vec2,
    /// Units per reference frame
    pub velocity: Vec2,
    /// Current health
    pub health: f32,
    /// Maximum health
    pub max_health: f32,
    /// Facing
    pub facing: Facing,
    /// Standing on something
    pub on_ground: bool,
    /// Ignoring damage
    pub invulnerable: bool,
    /// Weapon in hand
    pub weapon: WeaponKind,
    /// Rounds left
    pub ammo: u32,
    /// Archetype, for enemies
    pub kind: Option<EnemyKind>,
    /// AI state, for enemies
    pub ai_state: Option<AiState>,
    /// Boss table id, for bosses
    pub boss_id: Option<u32>,
}

impl CombatantSnapshot {
    fn of(combatant: &Combatant) -> Self {
        Self {
            id: combatant.id,
            position: combatant.body.position,
            size: combatant.body.size,
            velocity: combatant.body.velocity,
            health: combatant.health(),
            max_health: combatant.max_health(),
            facing: combatant.facing,
            on_ground: combatant.on_ground,
            invulnerable: combatant.invulnerable,
            weapon: combatant.weapon().kind(),
            ammo: combatant.weapon().current_ammo(),
            kind: None,
            ai_state: None,
            boss_id: None,
        }
    }

    fn of_enemy(enemy: &Enemy) -> Self {
        Self {
            kind: Some(enemy.kind),
            ai_state: Some(enemy.brain.state()),
            boss_id: enemy.boss.as_ref().map(|b| b.id()),
            ..Self::of(&enemy.combatant)
        }
    }
}

/// Render-facing state of a projectile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectileSnapshot {
    /// Entity id
    pub id: EntityId,
    /// Top-left corner
    pub position: Vec2,
    /// Units per reference frame
    pub velocity: Vec2,
    /// Side
    pub faction: Faction,
    /// Source weapon
    pub weapon: WeaponKind,
}

/// Render-facing state of a pickup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickupSnapshot {
    /// Entity id
    pub id: EntityId,
    /// Top-left corner
    pub position: Vec2,
    /// What it grants
    pub kind: PickupKind,
}

/// Render-facing state of a cover block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverSnapshot {
    /// Entity id
    pub id: EntityId,
    /// Top-left corner
    pub position: Vec2,
    /// Side lengths
    pub size: Vec2,
    /// Remaining health
    pub health: f32,
}

/// Everything the outside world sees after a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameReport {
    /// Report schema version
    pub version: SchemaVersion,
    /// Frame counter, from 1
    pub frame: u64,
    /// Frame time in ms
    pub now: f64,
    /// The player
    pub player: CombatantSnapshot,
    /// Live enemies
    pub enemies: Vec<CombatantSnapshot>,
    /// Live projectiles
    pub projectiles: Vec<ProjectileSnapshot>,
    /// Projectiles that entered play this frame
    pub new_projectiles: Vec<EntityId>,
    /// Live pickups
    pub pickups: Vec<PickupSnapshot>,
    /// Standing cover
    pub covers: Vec<CoverSnapshot>,
    /// Events in publication order
    pub events: Vec<SimEvent>,
    /// Running totals
    pub stats: CombatStats,
    /// State of the run
    pub outcome: Outcome,
}

impl FrameReport {
    /// Serializes the report to compact JSON.
    pub fn to_json(&self) -> FrontlineResult<String> {
        serde_json::to_string(self).map_err(|e| FrontlineError::Serialization(e.to_string()))
    }
}

// ============================================================================
// World and simulation
// ============================================================================

/// Every entity of the running level.
#[derive(Debug, Clone)]
pub struct World {
    /// The player
    pub player: Player,
    /// Enemies
    pub enemies: Vec<Enemy>,
    /// Projectiles in flight
    pub projectiles: Vec<Projectile>,
    /// Pickups lying around
    pub pickups: Vec<Pickup>,
    /// Level geometry and cover
    pub terrain: Terrain,
}

#[derive(Debug, Default)]
struct Pending {
    enemies: Vec<Enemy>,
    projectiles: Vec<Projectile>,
    pickups: Vec<Pickup>,
}

/// The simulation core.
pub struct Simulation {
    ctx: SimContext,
    world: World,
    campaign: Campaign,
    mode: GameMode,
    level_index: usize,
    waves: WaveDirector,
    pending: Pending,
    observers: Vec<Box<dyn FrameObserver>>,
    frame: u64,
    cleared: bool,
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("mode", &self.mode)
            .field("level_index", &self.level_index)
            .field("wave", &self.waves.wave())
            .field("frame", &self.frame)
            .field("enemies", &self.world.enemies.len())
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}

impl Simulation {
    /// Creates a simulation with an empty, flat level and a freshly spawned
    /// player. Call [`Self::start`] or load content before stepping.
    #[must_use]
    pub fn new(mut config: SimConfig, class: CharacterClass) -> Self {
        config.validate();
        let mut ctx = SimContext::new(config);
        let ground = ctx.config.ground_level;
        let health_mult = ctx.config.difficulty.player_health_mult();
        let player = Player::spawn(ctx.ids.allocate(), class, PLAYER_START_X, ground, health_mult);
        let mut sim = Self {
            ctx,
            world: World {
                player,
                enemies: Vec::new(),
                projectiles: Vec::new(),
                pickups: Vec::new(),
                terrain: Terrain::flat(ground),
            },
            campaign: Campaign::default(),
            mode: GameMode::Campaign,
            level_index: 0,
            waves: WaveDirector::new(),
            pending: Pending::default(),
            observers: Vec::new(),
            frame: 0,
            cleared: false,
        };
        sim.protect_player(0.0);
        sim
    }

    /// Builder: the campaign to play.
    pub fn with_campaign(mut self, campaign: Campaign) -> Self {
        self.campaign = campaign;
        self
    }

    /// Registers an observer called after every frame.
    pub fn add_observer(&mut self, observer: Box<dyn FrameObserver>) {
        self.observers.push(observer);
    }

    /// Starts `mode` at time `now`; campaigns begin at `level`.
    pub fn start(&mut self, mode: GameMode, level: usize, now: f64) -> FrontlineResult<()> {
        self.mode = mode;
        match mode {
            GameMode::Campaign => self.load_level(level, now).map(|_| ()),
            GameMode::Survival => {
                self.waves = WaveDirector::new();
                self.start_wave(now)
            },
        }
    }

    /// Game mode.
    #[must_use]
    pub const fn mode(&self) -> GameMode {
        self.mode
    }

    /// Current campaign level index.
    #[must_use]
    pub const fn level_index(&self) -> usize {
        self.level_index
    }

    /// Current survival wave.
    #[must_use]
    pub const fn wave(&self) -> u32 {
        self.waves.wave()
    }

    /// Entities.
    #[must_use]
    pub const fn world(&self) -> &World {
        &self.world
    }

    /// Mutable entities, for hosts and tests that stage scenarios.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Shared context.
    #[must_use]
    pub const fn context(&self) -> &SimContext {
        &self.ctx
    }

    /// Running totals.
    #[must_use]
    pub const fn stats(&self) -> &CombatStats {
        &self.ctx.stats
    }

    /// Frames simulated so far.
    #[must_use]
    pub const fn frame(&self) -> u64 {
        self.frame
    }

    /// Replaces the level with campaign level `index` (or the last level when
    /// out of range). Pending effects, projectiles and pickups are dropped.
    pub fn load_level(&mut self, index: usize, now: f64) -> FrontlineResult<usize> {
        let ground = self.ctx.config.ground_level;
        let (index, manifest) = self
            .campaign
            .level(index)
            .ok_or(FrontlineError::Level(frontline_common::LevelError::EmptyCampaign))?;
        let manifest = manifest.clone();
        let terrain = manifest.build_terrain(ground, &mut self.ctx.ids)?;

        self.reset_level(terrain, now);
        self.level_index = index;

        let difficulty = self.ctx.config.difficulty;
        let plans = manifest.plan_spawns(difficulty, &mut self.ctx.rng);
        self.spawn_plans(&plans, now);
        self.scatter_pickups();

        level::log_level(index, &manifest, self.world.enemies.len());
        info!(index, name = %manifest.name, enemies = self.world.enemies.len(), "Level started");
        self.ctx.emit(SimEvent::LevelStarted {
            index,
            name: manifest.name,
            enemies: self.world.enemies.len(),
        });
        Ok(index)
    }

    /// Starts the next survival wave on fresh terrain.
    pub fn start_wave(&mut self, now: f64) -> FrontlineResult<()> {
        let ground = self.ctx.config.ground_level;
        let terrain = match self.campaign.levels.first() {
            Some(manifest) => manifest.build_terrain(ground, &mut self.ctx.ids)?,
            None => Terrain::flat(ground),
        };
        self.world.terrain = terrain;
        self.world.projectiles.clear();
        self.world.pickups.clear();
        self.pending = Pending::default();
        self.cleared = false;

        let player_x = self.world.player.body().position.x;
        let difficulty = self.ctx.config.difficulty;
        let plans = self.waves.next_wave(player_x, difficulty, &mut self.ctx.rng);
        self.spawn_plans(&plans, now);
        self.scatter_pickups();

        self.ctx.emit(SimEvent::WaveStarted {
            wave: self.waves.wave(),
            enemies: self.world.enemies.len(),
        });
        Ok(())
    }

    /// Moves on after a cleared level or wave. Returns false when the
    /// campaign has no further level.
    pub fn advance(&mut self, now: f64) -> FrontlineResult<bool> {
        match self.mode {
            GameMode::Survival => self.start_wave(now).map(|()| true),
            GameMode::Campaign => {
                if self.level_index + 1 >= self.campaign.len() {
                    return Ok(false);
                }
                self.world.player.combatant.heal(LEVEL_HEAL);
                self.load_level(self.level_index + 1, now).map(|_| true)
            },
        }
    }

    /// Replaces the weapon in `slot` with the weapon on offer from `pickup`.
    pub fn swap_weapon(&mut self, slot: usize, pickup: EntityId) -> bool {
        let Some(offer) = self
            .world
            .pickups
            .iter_mut()
            .find(|p| p.id == pickup && p.body.active && p.swap_offered)
        else {
            return false;
        };
        let PickupKind::Weapon(taken) = offer.kind else {
            return false;
        };
        let Some(dropped) = self.world.player.swap_weapon(slot, taken) else {
            return false;
        };
        offer.body.deactivate();
        self.ctx.stats.pickups_collected += 1;
        debug!(slot, ?dropped, ?taken, "Weapon swapped");
        self.ctx.emit(SimEvent::WeaponSwapped { slot, dropped, taken });
        true
    }

    fn reset_level(&mut self, terrain: Terrain, now: f64) {
        self.ctx.scheduler.clear();
        self.world.terrain = terrain;
        self.world.enemies.clear();
        self.world.projectiles.clear();
        self.world.pickups.clear();
        self.pending = Pending::default();
        self.cleared = false;

        let player = &mut self.world.player;
        if player.is_rolling() {
            player.end_roll();
        }
        player.set_damage_boost(1.0);
        player.set_speed_boost(1.0);
        player.set_fire_rate_boost(1.0);
        player.set_invincible(false);
        let body = &mut player.combatant.body;
        body.position.x = PLAYER_START_X;
        body.velocity = Vec2::ZERO;
        body.set_bottom(self.ctx.config.ground_level);
        self.protect_player(now);
    }

    fn protect_player(&mut self, now: f64) {
        let player = &mut self.world.player;
        player.set_spawn_protection(true);
        self.ctx.scheduler.refresh(
            player.id(),
            TimedEffect::SpawnProtectionEnd,
            now + self.ctx.config.spawn_protection_ms,
        );
    }

    fn spawn_plans(&mut self, plans: &[SpawnPlan], now: f64) {
        let ground = self.ctx.config.ground_level;
        let strength = self.ctx.config.difficulty.enemy_strength();
        for plan in plans {
            let enemy = plan.spawn(&mut self.ctx.ids, ground, strength, now);
            trace!(enemy = %enemy.id(), ?plan.kind, x = plan.x, "Enemy spawned");
            self.world.enemies.push(enemy);
        }
    }

    fn scatter_pickups(&mut self) {
        let pickups = level::scatter_pickups(
            &self.world.terrain,
            &self.ctx.loot,
            &mut self.ctx.ids,
            &mut self.ctx.rng,
        );
        for pickup in pickups {
            self.ctx.emit(SimEvent::PickupSpawned {
                pickup: pickup.id,
                kind: pickup.kind,
                position: pickup.body.position,
            });
            self.world.pickups.push(pickup);
        }
    }

    // ========================================================================
    // Frame
    // ========================================================================

    /// Simulates one frame ending at `now`, `delta_ms` after the previous one.
    pub fn step(&mut self, now: f64, delta_ms: f64, input: &PlayerInput) -> FrameReport {
        self.frame += 1;
        self.ctx.now = now;
        let delta_ms = self.ctx.config.clamp_delta(delta_ms);
        let dt_scale = self.ctx.config.dt_scale(delta_ms);

        self.apply_due_effects(now);
        self.decide(now, delta_ms, input);
        self.run_boss_mechanics(now);
        self.integrate(now, delta_ms, dt_scale);
        self.resolve_terrain();

        let World {
            player,
            enemies,
            projectiles,
            pickups: _,
            terrain,
        } = &mut self.world;
        let mut drops = combat::resolve(&mut self.ctx, player, enemies, projectiles, terrain);
        // Shots fired this frame are tested once where they spawned
        drops.extend(combat::resolve(
            &mut self.ctx,
            player,
            enemies,
            &mut self.pending.projectiles,
            terrain,
        ));
        self.pending.pickups.extend(drops);

        self.collect_pickups(now);
        let new_projectiles = self.collect_garbage();
        let outcome = self.evaluate_outcome();

        let report = self.report(now, new_projectiles, outcome);
        for observer in &mut self.observers {
            notify_isolated(observer.as_mut(), &report);
        }
        report
    }

    fn apply_due_effects(&mut self, now: f64) {
        let due = self.ctx.scheduler.drain_due(now);
        if due.is_empty() {
            return;
        }
        let enemy_index: AHashMap<EntityId, usize> = self
            .world
            .enemies
            .iter()
            .enumerate()
            .filter(|(_, e)| e.combatant.is_alive())
            .map(|(i, e)| (e.id(), i))
            .collect();

        for entry in due {
            let player = &mut self.world.player;
            let applied = if entry.entity == player.id() && player.is_alive() {
                match entry.effect {
                    TimedEffect::RollEnd => player.end_roll(),
                    TimedEffect::SpawnProtectionEnd => player.set_spawn_protection(false),
                    TimedEffect::ShieldDown => {},
                    effect => pickup::revert_power_up(player, effect),
                }
                true
            } else if let Some(&i) = enemy_index.get(&entry.entity) {
                let enemy = &mut self.world.enemies[i];
                if entry.effect == TimedEffect::ShieldDown && enemy.lower_shield() {
                    self.ctx.emit(SimEvent::BossShieldLowered { boss: enemy.id() });
                }
                true
            } else {
                false
            };

            if applied {
                self.ctx.emit(SimEvent::EffectExpired {
                    entity: entry.entity,
                    effect: entry.effect,
                });
            } else {
                trace!(entity = %entry.entity, ?entry.effect, "Skipped effect for missing entity");
            }
        }
    }

    fn decide(&mut self, now: f64, delta_ms: f64, input: &PlayerInput) {
        let player_body = self.world.player.is_alive().then(|| *self.world.player.body());

        let actions = self.world.player.apply_input(input, now, &mut self.ctx.rng);
        self.world.player.keep_headroom(&self.world.terrain);
        if actions.roll_started {
            let id = self.world.player.id();
            self.ctx
                .scheduler
                .schedule(id, TimedEffect::RollEnd, now + ROLL_DURATION_MS);
        }
        let player_id = self.world.player.id();
        self.ctx.stats.shots_fired += actions.shots.len() as u64;
        for spawn in actions.shots {
            self.queue_projectile(player_id, Faction::Player, spawn);
        }

        for i in 0..self.world.enemies.len() {
            let enemy = &mut self.world.enemies[i];
            if !enemy.combatant.is_alive() {
                continue;
            }
            let decision = ai::think(enemy, player_body.as_ref(), now, delta_ms, &mut self.ctx.rng);
            let id = enemy.id();
            if let Some(transition) = decision.transition {
                self.ctx.emit(SimEvent::AiStateChanged {
                    enemy: id,
                    from: transition.from,
                    to: transition.to,
                });
            }
            if let Some(target) = decision.fire_at {
                let shots = enemy.fire_at(target, now, &mut self.ctx.rng);
                for spawn in shots {
                    self.queue_projectile(id, Faction::Hostile, spawn);
                }
            }
        }
    }

    fn queue_projectile(&mut self, owner: EntityId, faction: Faction, spawn: ProjectileSpawn) {
        let projectile = Projectile::from_spawn(self.ctx.ids.allocate(), owner, faction, spawn);
        self.ctx.emit(SimEvent::ProjectileFired {
            projectile: projectile.id,
            owner,
            faction,
            weapon: projectile.weapon,
        });
        self.pending.projectiles.push(projectile);
    }

    fn run_boss_mechanics(&mut self, now: f64) {
        let strength = self.ctx.config.difficulty.enemy_strength();
        let ground = self.ctx.config.ground_level;
        for i in 0..self.world.enemies.len() {
            let actions = self.world.enemies[i].update_boss(now, &self.ctx.config);
            let boss = self.world.enemies[i].id();
            let boss_x = self.world.enemies[i].body().position.x;
            for action in actions {
                match action {
                    BossAction::Enraged => self.ctx.emit(SimEvent::BossEnraged { boss }),
                    BossAction::ShieldUp => {
                        let until_ms = now + self.ctx.config.boss_shield_ms;
                        self.ctx.scheduler.schedule(boss, TimedEffect::ShieldDown, until_ms);
                        self.ctx.emit(SimEvent::BossShieldRaised { boss, until_ms });
                    },
                    BossAction::Summon { count } => {
                        for n in 0..count {
                            let side = if n % 2 == 0 { -1.0 } else { 1.0 };
                            let x = boss_x + side * MINION_SPACING * (n / 2 + 1) as f32;
                            let plan = SpawnPlan {
                                kind: SpawnKind::Infantry,
                                x,
                                boss_id: None,
                            };
                            let minion = plan.spawn(&mut self.ctx.ids, ground, strength, now);
                            self.pending.enemies.push(minion);
                        }
                        self.ctx.emit(SimEvent::MinionsSummoned { boss, count });
                    },
                }
            }
        }
    }

    fn integrate(&mut self, now: f64, delta_ms: f64, dt_scale: f32) {
        let gravity = self.ctx.config.gravity;
        let world_width = self.ctx.config.world_width;

        let player = &mut self.world.player;
        if player.is_alive() {
            let body = &mut player.combatant.body;
            body.apply_gravity(gravity, dt_scale);
            body.integrate(dt_scale);
            body.clamp_to_world(world_width);
            player.regenerate(dt_scale);
        }
        for weapon in player.combatant.update_weapons(now) {
            self.ctx.emit(SimEvent::WeaponReloaded {
                owner: player.id(),
                weapon,
            });
        }

        for enemy in self.world.enemies.iter_mut().filter(|e| e.combatant.is_alive()) {
            let body = &mut enemy.combatant.body;
            body.apply_gravity(gravity, dt_scale);
            body.integrate(dt_scale);
            body.clamp_to_world(world_width);
            for weapon in enemy.combatant.update_weapons(now) {
                self.ctx.emit(SimEvent::WeaponReloaded {
                    owner: enemy.id(),
                    weapon,
                });
            }
        }

        for projectile in &mut self.world.projectiles {
            projectile.advance(dt_scale, delta_ms);
        }
    }

    fn resolve_terrain(&mut self) {
        let World {
            player,
            enemies,
            terrain,
            ..
        } = &mut self.world;
        let resolver = TerrainResolver::new(terrain, Tolerances::from(&self.ctx.config));

        if player.is_alive() {
            player.combatant.on_ground = resolver.resolve(&mut player.combatant.body);
        }
        for enemy in enemies.iter_mut().filter(|e| e.combatant.is_alive()) {
            enemy.combatant.on_ground = resolver.resolve(&mut enemy.combatant.body);
        }
    }

    fn collect_pickups(&mut self, now: f64) {
        let player = &mut self.world.player;
        for pickup in self.world.pickups.iter_mut().filter(|p| p.body.active) {
            if !player.is_alive() || !pickup.body.overlaps(&player.combatant.body) {
                pickup.swap_offered = false;
                continue;
            }
            let outcome = pickup.apply(player, now, &mut self.ctx.scheduler);
            if outcome.consumed() {
                pickup.body.deactivate();
                self.ctx.stats.pickups_collected += 1;
                debug!(pickup = %pickup.id, kind = ?pickup.kind, "Pickup collected");
                self.ctx.emit(SimEvent::PickupCollected {
                    pickup: pickup.id,
                    kind: pickup.kind,
                });
            } else if !pickup.swap_offered {
                pickup.swap_offered = true;
                if let PickupKind::Weapon(weapon) = pickup.kind {
                    self.ctx.emit(SimEvent::WeaponSwapOffered {
                        pickup: pickup.id,
                        weapon,
                    });
                }
            }
            if let PickupOutcome::Boosted { effect, until_ms } = outcome {
                trace!(?effect, until_ms, "Power-up active");
            }
        }
    }

    /// Drops inactive entities and their pending effects, then admits queued
    /// spawns. Returns the ids of projectiles that joined this frame.
    fn collect_garbage(&mut self) -> Vec<EntityId> {
        let scheduler = &mut self.ctx.scheduler;
        self.world.enemies.retain(|enemy| {
            let keep = enemy.combatant.is_alive();
            if !keep {
                scheduler.purge_entity(enemy.id());
            }
            keep
        });
        self.world.projectiles.retain(|p| p.body.active);
        self.world.pickups.retain(|p| p.body.active);
        let removed = self.world.terrain.prune_covers();
        if removed > 0 {
            trace!(removed, "Pruned destroyed cover");
        }

        let pending = std::mem::take(&mut self.pending);
        let new_projectiles = pending.projectiles.iter().map(|p| p.id).collect();
        self.world
            .projectiles
            .extend(pending.projectiles.into_iter().filter(|p| p.body.active));
        self.world.enemies.extend(pending.enemies);
        for pickup in &pending.pickups {
            trace!(pickup = %pickup.id, kind = ?pickup.kind, "Pickup dropped");
        }
        self.world.pickups.extend(pending.pickups);
        new_projectiles
    }

    fn evaluate_outcome(&mut self) -> Outcome {
        if !self.world.player.is_alive() {
            return Outcome::PlayerDead;
        }
        if !self.world.enemies.is_empty() {
            return Outcome::InProgress;
        }
        let outcome = match self.mode {
            GameMode::Survival => Outcome::WaveCleared {
                wave: self.waves.wave(),
            },
            GameMode::Campaign if self.level_index + 1 >= self.campaign.len() => Outcome::CampaignComplete,
            GameMode::Campaign => Outcome::LevelCleared {
                index: self.level_index,
            },
        };
        if !self.cleared {
            self.cleared = true;
            match self.mode {
                GameMode::Survival => {
                    info!(wave = self.waves.wave(), "Wave cleared");
                    self.ctx.emit(SimEvent::WaveCleared {
                        wave: self.waves.wave(),
                    });
                },
                GameMode::Campaign => {
                    info!(index = self.level_index, "Level cleared");
                    self.ctx.emit(SimEvent::LevelCleared {
                        index: self.level_index,
                    });
                },
            }
        }
        outcome
    }

    fn report(&self, now: f64, new_projectiles: Vec<EntityId>, outcome: Outcome) -> FrameReport {
        let world = &self.world;
        FrameReport {
            version: SchemaVersion::FRAME_REPORT,
            frame: self.frame,
            now,
            player: CombatantSnapshot::of(&world.player.combatant),
            enemies: world.enemies.iter().map(CombatantSnapshot::of_enemy).collect(),
            projectiles: world
                .projectiles
                .iter()
                .map(|p| ProjectileSnapshot {
                    id: p.id,
                    position: p.body.position,
                    velocity: p.body.velocity,
                    faction: p.faction,
                    weapon: p.weapon,
                })
                .collect(),
            new_projectiles,
            pickups: world
                .pickups
                .iter()
                .map(|p| PickupSnapshot {
                    id: p.id,
                    position: p.body.position,
                    kind: p.kind,
                })
                .collect(),
            covers: world
                .terrain
                .covers
                .iter()
                .map(|c| CoverSnapshot {
                    id: c.id,
                    position: c.rect.position(),
                    size: c.rect.size(),
                    health: c.health(),
                })
                .collect(),
            events: self.ctx.events.drain(),
            stats: self.ctx.stats.clone(),
            outcome,
        }
    }
}

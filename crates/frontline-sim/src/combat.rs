//! Projectile impacts: damage, deaths, cover erosion and loot.
//!
//! Every live projectile is tested against live combatants of the opposing
//! faction first, then against cover. A projectile hits at most once.

use frontline_common::Vec2;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::combatant::DamageOutcome;
use crate::context::SimContext;
use crate::enemy::Enemy;
use crate::events::SimEvent;
use crate::loot::LootSource;
use crate::pickup::Pickup;
use crate::player::Player;
use crate::projectile::{Faction, Projectile};
use crate::terrain::{CoverHit, Terrain};
use crate::weapon::WeaponKind;

/// Running totals from the player's point of view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CombatStats {
    /// Projectiles the player fired
    pub shots_fired: u64,
    /// Player projectiles that hit an enemy
    pub shots_hit: u64,
    /// Damage the player dealt
    pub damage_dealt: f32,
    /// Damage the player took
    pub damage_taken: f32,
    /// Enemies killed
    pub kills: u32,
    /// Bosses killed
    pub bosses_killed: u32,
    /// Pickups collected
    pub pickups_collected: u32,
    /// Cover blocks destroyed
    pub covers_destroyed: u32,
}

impl CombatStats {
    /// Share of player shots that hit, 0 when nothing was fired.
    #[must_use]
    pub fn accuracy(&self) -> f32 {
        if self.shots_fired == 0 {
            0.0
        } else {
            self.shots_hit as f32 / self.shots_fired as f32
        }
    }
}

/// Resolves every projectile impact for this frame.
///
/// Returns pickups dropped by kills; the caller adds them between frames.
pub fn resolve(
    ctx: &mut SimContext,
    player: &mut Player,
    enemies: &mut [Enemy],
    projectiles: &mut [Projectile],
    terrain: &mut Terrain,
) -> Vec<Pickup> {
    let mut drops = Vec::new();

    for projectile in projectiles.iter_mut().filter(|p| p.body.active) {
        let impact = match projectile.faction {
            Faction::Player => hit_enemy(ctx, projectile, enemies, &mut drops),
            Faction::Hostile => hit_player(ctx, projectile, player),
        };
        let impact = impact.or_else(|| hit_cover(ctx, projectile, terrain));

        if let (Some(point), Some(radius)) = (impact, projectile.explosion_radius) {
            if ctx.config.explosive_splash {
                splash(ctx, projectile, point, radius, player, enemies, &mut drops);
            }
        }
    }
    drops
}

fn hit_enemy(
    ctx: &mut SimContext,
    projectile: &mut Projectile,
    enemies: &mut [Enemy],
    drops: &mut Vec<Pickup>,
) -> Option<Vec2> {
    let enemy = enemies
        .iter_mut()
        .find(|e| e.combatant.is_alive() && projectile.body.overlaps(&e.combatant.body))?;
    projectile.hit();
    // Shield and invulnerability absorb the shot without counting a hit
    if damage_enemy(ctx, enemy, projectile.damage, projectile.weapon, drops) != DamageOutcome::Ignored {
        ctx.stats.shots_hit += 1;
    }
    Some(projectile.body.center())
}

fn hit_player(ctx: &mut SimContext, projectile: &mut Projectile, player: &mut Player) -> Option<Vec2> {
    if !player.is_alive() || !projectile.body.overlaps(&player.combatant.body) {
        return None;
    }
    projectile.hit();
    damage_player(ctx, player, projectile.damage);
    Some(projectile.body.center())
}

fn hit_cover(ctx: &mut SimContext, projectile: &mut Projectile, terrain: &mut Terrain) -> Option<Vec2> {
    if !projectile.body.active {
        return None;
    }
    let cover = terrain
        .covers
        .iter_mut()
        .find(|c| c.active && projectile.body.overlaps_rect(&c.rect))?;
    projectile.hit();
    if let CoverHit::Destroyed = cover.take_damage(projectile.damage * ctx.config.cover_damage_ratio) {
        ctx.stats.covers_destroyed += 1;
        debug!(cover = %cover.id, "Cover destroyed");
        ctx.emit(SimEvent::CoverDestroyed {
            cover: cover.id,
            position: cover.rect.center(),
        });
    }
    Some(projectile.body.center())
}

/// Area damage around an explosive impact, falling off linearly from
/// `splash_falloff` of the projectile's damage at the center to zero at the
/// radius. Bodies the projectile itself touched took the direct hit and are
/// skipped.
fn splash(
    ctx: &mut SimContext,
    projectile: &Projectile,
    point: Vec2,
    radius: f32,
    player: &mut Player,
    enemies: &mut [Enemy],
    drops: &mut Vec<Pickup>,
) {
    let falloff = ctx.config.splash_falloff;
    let amount_at = |center: Vec2| {
        let distance = center.distance(point);
        (distance < radius).then(|| projectile.damage * falloff * (1.0 - distance / radius))
    };
    match projectile.faction {
        Faction::Player => {
            for enemy in enemies.iter_mut().filter(|e| e.combatant.is_alive()) {
                if projectile.body.bounds().overlaps(&enemy.combatant.body.bounds()) {
                    continue;
                }
                if let Some(amount) = amount_at(enemy.combatant.body.center()) {
                    damage_enemy(ctx, enemy, amount, projectile.weapon, drops);
                }
            }
        },
        Faction::Hostile => {
            if player.is_alive() && !projectile.body.bounds().overlaps(&player.combatant.body.bounds()) {
                if let Some(amount) = amount_at(player.combatant.body.center()) {
                    damage_player(ctx, player, amount);
                }
            }
        },
    }
}

fn damage_enemy(
    ctx: &mut SimContext,
    enemy: &mut Enemy,
    amount: f32,
    weapon: WeaponKind,
    drops: &mut Vec<Pickup>,
) -> DamageOutcome {
    let now = ctx.now;
    let (outcome, transition) = enemy.take_hit(amount, now, &mut ctx.rng);
    ctx.stats.damage_dealt += outcome.dealt();

    if let Some(transition) = transition {
        ctx.emit(SimEvent::AiStateChanged {
            enemy: enemy.id(),
            from: transition.from,
            to: transition.to,
        });
    }

    match outcome {
        DamageOutcome::Ignored => {},
        DamageOutcome::Wounded { dealt } => ctx.emit(SimEvent::EnemyDamaged {
            enemy: enemy.id(),
            amount: dealt,
            remaining: enemy.combatant.health(),
        }),
        DamageOutcome::Killed { .. } => {
            ctx.stats.kills += 1;
            let boss_id = enemy.boss.as_ref().map(|b| b.id());
            if boss_id.is_some() {
                ctx.stats.bosses_killed += 1;
                info!(enemy = %enemy.id(), "Boss defeated");
            } else {
                debug!(enemy = %enemy.id(), kind = enemy.kind.name(), "Enemy killed");
            }
            ctx.emit(SimEvent::EnemyKilled {
                enemy: enemy.id(),
                kind: enemy.kind,
                boss_id,
                position: enemy.combatant.body.center(),
                weapon,
            });

            let source = if boss_id.is_some() {
                LootSource::Boss
            } else {
                LootSource::Regular(enemy.kind)
            };
            if let Some(kind) = ctx.loot.roll(source, &mut ctx.rng) {
                let pickup = Pickup::dropped_by(ctx.ids.allocate(), kind, &enemy.combatant.body);
                ctx.emit(SimEvent::PickupSpawned {
                    pickup: pickup.id,
                    kind,
                    position: pickup.body.position,
                });
                drops.push(pickup);
            }
        },
    }
    outcome
}

fn damage_player(ctx: &mut SimContext, player: &mut Player, amount: f32) {
    match player.combatant.take_damage(amount) {
        DamageOutcome::Ignored => {},
        DamageOutcome::Wounded { dealt } => {
            ctx.stats.damage_taken += dealt;
            ctx.emit(SimEvent::PlayerDamaged {
                amount: dealt,
                remaining: player.combatant.health(),
            });
        },
        DamageOutcome::Killed { dealt } => {
            ctx.stats.damage_taken += dealt;
            info!(player = %player.id(), "Player killed");
            ctx.emit(SimEvent::PlayerDamaged {
                amount: dealt,
                remaining: 0.0,
            });
            ctx.emit(SimEvent::PlayerKilled { player: player.id() });
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::enemy::EnemyKind;
    use crate::player::CharacterClass;
    use crate::projectile::{Expiry, ProjectileSpawn};
    use crate::terrain::Cover;
    use frontline_common::{EntityId, Rect};

    fn ctx() -> SimContext {
        SimContext::new(SimConfig::default())
    }

    fn shot(ctx: &mut SimContext, at: Vec2, damage: f32, faction: Faction, weapon: WeaponKind) -> Projectile {
        let spawn = ProjectileSpawn {
            origin: at,
            velocity: Vec2::new(10.0, 0.0),
            size: Vec2::new(8.0, 4.0),
            damage,
            expiry: Expiry::Distance { max: 1000.0 },
            explosion_radius: weapon.profile().archetype.explosion_radius(),
            weapon,
        };
        Projectile::from_spawn(ctx.ids.allocate(), EntityId::from_raw(1), faction, spawn)
    }

    fn setup(ctx: &mut SimContext) -> (Player, Vec<Enemy>) {
        let player = Player::spawn(ctx.ids.allocate(), CharacterClass::Soldier, 100.0, 550.0, 1.0);
        let enemy = Enemy::spawn(ctx.ids.allocate(), EnemyKind::Infantry, 500.0, 550.0, 1.0, 0.0);
        (player, vec![enemy])
    }

    #[test]
    fn test_player_shot_damages_enemy_once() {
        let mut ctx = ctx();
        let (mut player, mut enemies) = setup(&mut ctx);
        let center = enemies[0].combatant.body.center();
        let mut projectiles = vec![shot(&mut ctx, center, 15.0, Faction::Player, WeaponKind::Pistol)];
        let mut terrain = Terrain::flat(550.0);

        resolve(&mut ctx, &mut player, &mut enemies, &mut projectiles, &mut terrain);
        resolve(&mut ctx, &mut player, &mut enemies, &mut projectiles, &mut terrain);

        assert_eq!(enemies[0].combatant.health(), 35.0);
        assert!(!projectiles[0].body.active);
        assert_eq!(ctx.stats.shots_hit, 1);
        assert_eq!(ctx.stats.damage_dealt, 15.0);
        let events = ctx.events.drain();
        assert!(events.iter().any(|e| matches!(e, SimEvent::EnemyDamaged { remaining, .. } if *remaining == 35.0)));
    }

    #[test]
    fn test_absorbed_shot_is_not_counted_as_hit() {
        let mut ctx = ctx();
        let (mut player, mut enemies) = setup(&mut ctx);
        enemies[0].combatant.invulnerable = true;
        let center = enemies[0].combatant.body.center();
        let mut projectiles = vec![shot(&mut ctx, center, 15.0, Faction::Player, WeaponKind::Pistol)];

        resolve(&mut ctx, &mut player, &mut enemies, &mut projectiles, &mut Terrain::flat(550.0));

        assert!(!projectiles[0].body.active);
        assert_eq!(enemies[0].combatant.health(), 50.0);
        assert_eq!(ctx.stats.shots_hit, 0);
        assert_eq!(ctx.stats.damage_dealt, 0.0);
    }

    #[test]
    fn test_own_faction_is_not_hit() {
        let mut ctx = ctx();
        let (mut player, mut enemies) = setup(&mut ctx);
        let center = enemies[0].combatant.body.center();
        let mut projectiles = vec![shot(&mut ctx, center, 15.0, Faction::Hostile, WeaponKind::Pistol)];
        resolve(&mut ctx, &mut player, &mut enemies, &mut projectiles, &mut Terrain::flat(550.0));
        assert_eq!(enemies[0].combatant.health(), 50.0);
        assert!(projectiles[0].body.active);
    }

    #[test]
    fn test_kill_drops_loot() {
        let mut ctx = ctx();
        let (mut player, mut enemies) = setup(&mut ctx);
        let center = enemies[0].combatant.body.center();
        let mut projectiles = vec![shot(&mut ctx, center, 60.0, Faction::Player, WeaponKind::Sword)];
        let drops = resolve(&mut ctx, &mut player, &mut enemies, &mut projectiles, &mut Terrain::flat(550.0));

        assert!(!enemies[0].combatant.is_alive());
        assert_eq!(ctx.stats.kills, 1);
        assert_eq!(drops.len(), 1);
        let events = ctx.events.drain();
        assert!(events
            .iter()
            .any(|e| matches!(e, SimEvent::EnemyKilled { weapon: WeaponKind::Sword, boss_id: None, .. })));
        assert!(events.iter().any(|e| matches!(e, SimEvent::PickupSpawned { .. })));
    }

    #[test]
    fn test_hostile_shot_hurts_player() {
        let mut ctx = ctx();
        let (mut player, mut enemies) = setup(&mut ctx);
        let center = player.body().center();
        let mut projectiles = vec![shot(&mut ctx, center, 15.0, Faction::Hostile, WeaponKind::Pistol)];
        resolve(&mut ctx, &mut player, &mut enemies, &mut projectiles, &mut Terrain::flat(550.0));
        assert_eq!(player.combatant.health(), 85.0);
        assert_eq!(ctx.stats.damage_taken, 15.0);
    }

    #[test]
    fn test_cover_takes_a_tenth() {
        let mut ctx = ctx();
        let (mut player, mut enemies) = setup(&mut ctx);
        let mut terrain = Terrain::flat(550.0).with_cover(Cover::new(
            EntityId::from_raw(99),
            Rect::new(300.0, 510.0, 40.0, 40.0),
        ));
        let mut projectiles = vec![shot(&mut ctx, Vec2::new(320.0, 530.0), 10.0, Faction::Player, WeaponKind::Pistol)];
        resolve(&mut ctx, &mut player, &mut enemies, &mut projectiles, &mut terrain);
        assert_eq!(terrain.covers[0].health(), 99.0);
        assert!(!projectiles[0].body.active);
        assert_eq!(ctx.stats.shots_hit, 0);
    }

    #[test]
    fn test_splash_only_when_enabled() {
        for enabled in [false, true] {
            let mut ctx = SimContext::new(SimConfig {
                explosive_splash: enabled,
                ..SimConfig::default()
            });
            let (mut player, mut enemies) = setup(&mut ctx);
            enemies.push(Enemy::spawn(ctx.ids.allocate(), EnemyKind::Heavy, 540.0, 550.0, 1.0, 0.0));
            let center = enemies[0].combatant.body.center();
            let mut projectiles = vec![shot(&mut ctx, center, 150.0, Faction::Player, WeaponKind::GrenadeLauncher)];
            resolve(&mut ctx, &mut player, &mut enemies, &mut projectiles, &mut Terrain::flat(550.0));

            assert!(!enemies[0].combatant.is_alive());
            let bystander = enemies[1].combatant.health();
            if enabled {
                assert!(bystander < 100.0);
            } else {
                assert_eq!(bystander, 100.0);
            }
        }
    }
}

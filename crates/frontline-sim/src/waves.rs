//! Survival mode: escalating waves spawned ahead of the player.

use fastrand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::boss::BossProfile;
use crate::difficulty::Difficulty;
use crate::enemy::EnemyKind;
use crate::level::{SpawnKind, SpawnPlan};

/// Base enemies in a wave.
pub const BASE_WAVE_SIZE: u32 = 5;
/// Extra enemies per wave number.
pub const WAVE_GROWTH: u32 = 2;
/// Every this many waves a boss joins.
pub const BOSS_WAVE_INTERVAL: u32 = 5;
/// Nearest spawn distance ahead of the player.
pub const SPAWN_AHEAD: f32 = 400.0;
/// Width of the spawn band.
pub const SPAWN_BAND: f32 = 1000.0;
/// Boss distance ahead of the player.
pub const BOSS_AHEAD: f32 = 800.0;

/// Tracks the survival wave number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaveDirector {
    wave: u32,
}

impl WaveDirector {
    /// Starts before wave 1.
    #[must_use]
    pub const fn new() -> Self {
        Self { wave: 0 }
    }

    /// Last wave started; 0 before the first.
    #[must_use]
    pub const fn wave(&self) -> u32 {
        self.wave
    }

    /// Regular enemies in `wave` after difficulty scaling.
    #[must_use]
    pub fn enemy_count(wave: u32, difficulty: Difficulty) -> u32 {
        Difficulty::scale_count(BASE_WAVE_SIZE + WAVE_GROWTH * wave, difficulty.wave_count_mult())
    }

    /// Archetypes drawn from in `wave`; repeats weight the draw.
    #[must_use]
    pub fn type_pool(wave: u32) -> Vec<EnemyKind> {
        let mut pool = vec![EnemyKind::Infantry, EnemyKind::Infantry, EnemyKind::Scout];
        if wave >= 3 {
            pool.push(EnemyKind::Heavy);
        }
        if wave >= 5 {
            pool.push(EnemyKind::Sniper);
        }
        if wave >= 7 {
            pool.extend([EnemyKind::Heavy, EnemyKind::Sniper]);
        }
        pool
    }

    /// Boss joining `wave`, if any; ids cycle through the boss table.
    #[must_use]
    pub fn boss_for(wave: u32) -> Option<u32> {
        (wave > 0 && wave % BOSS_WAVE_INTERVAL == 0)
            .then(|| (wave / BOSS_WAVE_INTERVAL - 1) % BossProfile::COUNT)
    }

    /// Advances to the next wave and plans its spawns around `player_x`.
    pub fn next_wave(&mut self, player_x: f32, difficulty: Difficulty, rng: &mut Rng) -> Vec<SpawnPlan> {
        self.wave += 1;
        let wave = self.wave;
        let pool = Self::type_pool(wave);
        let count = Self::enemy_count(wave, difficulty);

        let mut plans: Vec<SpawnPlan> = (0..count)
            .map(|_| SpawnPlan {
                kind: SpawnKind::from(pool[rng.usize(..pool.len())]),
                x: player_x + SPAWN_AHEAD + rng.f32() * SPAWN_BAND,
                boss_id: None,
            })
            .collect();

        if let Some(boss_id) = Self::boss_for(wave) {
            plans.push(SpawnPlan {
                kind: SpawnKind::Boss,
                x: player_x + BOSS_AHEAD,
                boss_id: Some(boss_id),
            });
        }
        info!(wave, enemies = plans.len(), "Wave planned");
        plans
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wave_sizes() {
        assert_eq!(WaveDirector::enemy_count(1, Difficulty::Medium), 7);
        assert_eq!(WaveDirector::enemy_count(1, Difficulty::Baby), 1);
        assert_eq!(WaveDirector::enemy_count(1, Difficulty::Easy), 2);
        assert_eq!(WaveDirector::enemy_count(2, Difficulty::Extreme), 13);
    }

    #[test]
    fn test_type_unlocks() {
        assert!(!WaveDirector::type_pool(2).contains(&EnemyKind::Heavy));
        assert!(WaveDirector::type_pool(3).contains(&EnemyKind::Heavy));
        assert!(!WaveDirector::type_pool(4).contains(&EnemyKind::Sniper));
        assert_eq!(WaveDirector::type_pool(7).len(), 7);
    }

    #[test]
    fn test_boss_every_fifth_wave() {
        assert_eq!(WaveDirector::boss_for(4), None);
        assert_eq!(WaveDirector::boss_for(5), Some(0));
        assert_eq!(WaveDirector::boss_for(10), Some(1));
        assert_eq!(WaveDirector::boss_for(25), Some(0));
    }

    #[test]
    fn test_spawn_band() {
        let mut director = WaveDirector::new();
        let mut rng = Rng::with_seed(3);
        for _ in 0..5 {
            let plans = director.next_wave(200.0, Difficulty::Medium, &mut rng);
            for plan in plans.iter().filter(|p| p.kind != SpawnKind::Boss) {
                assert!(plan.x >= 600.0 && plan.x < 1600.0);
            }
        }
        assert_eq!(director.wave(), 5);
    }

    #[test]
    fn test_fifth_wave_has_boss() {
        let mut director = WaveDirector::new();
        let mut rng = Rng::with_seed(3);
        let mut last = Vec::new();
        for _ in 0..5 {
            last = director.next_wave(0.0, Difficulty::Medium, &mut rng);
        }
        let boss = last.iter().find(|p| p.kind == SpawnKind::Boss).unwrap();
        assert_eq!(boss.x, BOSS_AHEAD);
        assert_eq!(last.len(), 16);
    }
}

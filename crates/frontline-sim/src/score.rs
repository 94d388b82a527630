//! Scoring from frame reports.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::events::SimEvent;
use crate::sim::{FrameObserver, FrameReport, ObserverResult};

/// Base points for a kill.
pub const KILL_POINTS: u64 = 100;
/// Extra points per combo step.
pub const COMBO_STEP_POINTS: u64 = 10;
/// Combo steps that still add points.
pub const COMBO_CAP: u32 = 10;
/// Points for any collected pickup.
pub const PICKUP_POINTS: u64 = 50;
/// Points per wave number when a wave is cleared.
pub const WAVE_POINTS: u64 = 500;
/// Points per level number when a level is cleared.
pub const LEVEL_POINTS: u64 = 1000;

/// Score, kill combo and best combo of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreKeeper {
    score: u64,
    combo: u32,
    max_combo: u32,
    last_kill_ms: Option<f64>,
    combo_timeout_ms: f64,
}

impl ScoreKeeper {
    /// Creates a keeper whose combo lapses `combo_timeout_ms` after a kill.
    #[must_use]
    pub fn new(combo_timeout_ms: f64) -> Self {
        Self {
            combo_timeout_ms,
            ..Self::default()
        }
    }

    /// Total score.
    #[must_use]
    pub const fn score(&self) -> u64 {
        self.score
    }

    /// Current combo.
    #[must_use]
    pub const fn combo(&self) -> u32 {
        self.combo
    }

    /// Best combo so far.
    #[must_use]
    pub const fn max_combo(&self) -> u32 {
        self.max_combo
    }

    fn expire_combo(&mut self, now: f64) {
        if let Some(last) = self.last_kill_ms {
            if self.combo > 0 && now - last > self.combo_timeout_ms {
                debug!(combo = self.combo, "Combo lapsed");
                self.combo = 0;
            }
        }
    }

    fn record_kill(&mut self, now: f64) {
        self.combo += 1;
        self.max_combo = self.max_combo.max(self.combo);
        self.last_kill_ms = Some(now);
        self.score += KILL_POINTS + u64::from(self.combo.min(COMBO_CAP)) * COMBO_STEP_POINTS;
    }

    /// Applies one frame's events.
    pub fn record(&mut self, report: &FrameReport) {
        self.expire_combo(report.now);
        for event in &report.events {
            match event {
                SimEvent::EnemyKilled { .. } => self.record_kill(report.now),
                SimEvent::PickupCollected { .. } | SimEvent::WeaponSwapped { .. } => {
                    self.score += PICKUP_POINTS;
                },
                SimEvent::WaveCleared { wave } => self.score += u64::from(*wave) * WAVE_POINTS,
                SimEvent::LevelCleared { index } => self.score += (*index as u64 + 1) * LEVEL_POINTS,
                _ => {},
            }
        }
    }
}

impl FrameObserver for ScoreKeeper {
    fn name(&self) -> &str {
        "score"
    }

    fn on_frame(&mut self, report: &FrameReport) -> ObserverResult {
        self.record(report);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::enemy::EnemyKind;
    use crate::pickup::PickupKind;
    use crate::weapon::WeaponKind;
    use crate::player::{CharacterClass, PlayerInput};
    use crate::sim::Simulation;
    use frontline_common::{EntityId, Vec2};

    fn report_with(now: f64, events: Vec<SimEvent>) -> FrameReport {
        let mut sim = Simulation::new(SimConfig::default(), CharacterClass::Soldier);
        let mut report = sim.step(now, 16.0, &PlayerInput::default());
        report.events = events;
        report
    }

    fn kill() -> SimEvent {
        SimEvent::EnemyKilled {
            enemy: EntityId::from_raw(9),
            kind: EnemyKind::Infantry,
            boss_id: None,
            position: Vec2::ZERO,
            weapon: WeaponKind::Pistol,
        }
    }

    #[test]
    fn test_kill_combo_scoring() {
        let mut keeper = ScoreKeeper::new(3000.0);
        keeper.record(&report_with(100.0, vec![kill()]));
        assert_eq!(keeper.score(), 110);
        keeper.record(&report_with(200.0, vec![kill(), kill()]));
        assert_eq!(keeper.score(), 110 + 120 + 130);
        assert_eq!(keeper.combo(), 3);
    }

    #[test]
    fn test_combo_lapses_after_timeout() {
        let mut keeper = ScoreKeeper::new(3000.0);
        keeper.record(&report_with(0.0, vec![kill(), kill()]));
        keeper.record(&report_with(3500.0, Vec::new()));
        assert_eq!(keeper.combo(), 0);
        assert_eq!(keeper.max_combo(), 2);
        keeper.record(&report_with(3600.0, vec![kill()]));
        assert_eq!(keeper.combo(), 1);
    }

    #[test]
    fn test_combo_bonus_is_capped() {
        let mut keeper = ScoreKeeper::new(3000.0);
        keeper.record(&report_with(0.0, vec![kill(); 12]));
        let expected: u64 = (1..=12u64).map(|c| 100 + c.min(10) * 10).sum();
        assert_eq!(keeper.score(), expected);
    }

    #[test]
    fn test_clear_and_pickup_bonuses() {
        let mut keeper = ScoreKeeper::new(3000.0);
        keeper.record(&report_with(
            0.0,
            vec![
                SimEvent::PickupCollected {
                    pickup: EntityId::from_raw(3),
                    kind: PickupKind::Ammo,
                },
                SimEvent::WaveCleared { wave: 2 },
                SimEvent::LevelCleared { index: 0 },
            ],
        ));
        assert_eq!(keeper.score(), 50 + 1000 + 1000);
    }
}

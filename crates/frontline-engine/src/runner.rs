//! Headless frame loop.
//!
//! Drives the simulation with the autopilot, keeps score, logs the
//! interesting events and advances through levels or waves.

use std::fs::File;
use std::io::{BufWriter, Write};

use anyhow::{Context, Result};
use frontline_sim::{
    notify_isolated, Campaign, CombatStats, FrameObserver, FrameReport, ObserverResult, Outcome,
    ScoreKeeper, SimEvent, Simulation,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::autopilot::Autopilot;
use crate::config::EngineConfig;

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunEnd {
    /// Every campaign level cleared
    Victory,
    /// The player died
    Defeat,
    /// The frame limit ran out
    OutOfFrames,
}

/// Totals printed at the end of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    /// How the run ended
    pub end: RunEnd,
    /// Frames simulated
    pub frames: u64,
    /// Simulated time in ms
    pub elapsed_ms: f64,
    /// Last campaign level index
    pub level: usize,
    /// Last survival wave
    pub wave: u32,
    /// Final score
    pub score: u64,
    /// Best kill combo
    pub max_combo: u32,
    /// Combat totals
    pub stats: CombatStats,
}

/// Logs discrete events as they come out of the simulation.
#[derive(Debug, Default)]
pub struct EventLog;

impl FrameObserver for EventLog {
    fn name(&self) -> &str {
        "event-log"
    }

    fn on_frame(&mut self, report: &FrameReport) -> ObserverResult {
        for event in &report.events {
            match event {
                SimEvent::LevelStarted { index, name, enemies } => {
                    info!(index, name = %name, enemies, "Level started");
                },
                SimEvent::WaveStarted { wave, enemies } => info!(wave, enemies, "Wave started"),
                SimEvent::EnemyKilled { kind, boss_id, weapon, .. } => {
                    debug!(kind = kind.name(), ?boss_id, ?weapon, "Kill");
                },
                SimEvent::PlayerKilled { .. } => info!(frame = report.frame, "Player killed"),
                SimEvent::CoverDestroyed { cover, .. } => debug!(%cover, "Cover destroyed"),
                SimEvent::BossEnraged { boss } => info!(%boss, "Boss enraged"),
                SimEvent::MinionsSummoned { boss, count } => info!(%boss, count, "Minions summoned"),
                SimEvent::PickupCollected { kind, .. } => debug!(?kind, "Pickup collected"),
                _ => {},
            }
        }
        Ok(())
    }
}

/// Owns the simulation for one headless run.
pub struct Runner {
    config: EngineConfig,
    sim: Simulation,
    autopilot: Autopilot,
    score: ScoreKeeper,
    reports: Option<BufWriter<File>>,
}

impl Runner {
    /// Builds the simulation and starts the configured mode.
    pub fn new(config: EngineConfig, campaign: Campaign) -> Result<Self> {
        let mut sim = Simulation::new(config.sim.clone(), config.character).with_campaign(campaign);
        sim.add_observer(Box::new(EventLog));
        sim.start(config.mode, config.start_level, 0.0)
            .context("Failed to start the simulation")?;

        let reports = match &config.report_path {
            Some(path) => {
                let file =
                    File::create(path).with_context(|| format!("Failed to create report file {}", path.display()))?;
                Some(BufWriter::new(file))
            },
            None => None,
        };

        Ok(Self {
            score: ScoreKeeper::new(config.sim.combo_timeout_ms),
            config,
            sim,
            autopilot: Autopilot::new(),
            reports,
        })
    }

    /// Runs until victory, defeat or the frame limit.
    pub fn run(mut self) -> Result<RunSummary> {
        let frame_ms = self.config.frame_ms;
        let mut now = 0.0;
        let mut last: Option<FrameReport> = None;
        let mut advance_at: Option<f64> = None;
        let mut end = RunEnd::OutOfFrames;

        for _ in 0..self.config.frames {
            now += frame_ms;
            let input = self.autopilot.next_input(last.as_ref());
            let report = self.sim.step(now, frame_ms, &input);
            notify_isolated(&mut self.score, &report);
            self.accept_swap_offers(&report);
            self.write_report(&report)?;

            match report.outcome {
                Outcome::PlayerDead => {
                    end = RunEnd::Defeat;
                    break;
                },
                Outcome::CampaignComplete => {
                    end = RunEnd::Victory;
                    break;
                },
                Outcome::LevelCleared { .. } | Outcome::WaveCleared { .. } => {
                    let due = *advance_at.get_or_insert(now + self.config.advance_delay_ms);
                    if now >= due {
                        advance_at = None;
                        if !self.sim.advance(now).context("Failed to load the next stage")? {
                            end = RunEnd::Victory;
                            break;
                        }
                    }
                },
                Outcome::InProgress => {},
            }
            last = Some(report);
        }

        if let Some(writer) = self.reports.as_mut() {
            writer.flush().context("Failed to flush frame reports")?;
        }

        let summary = RunSummary {
            end,
            frames: self.sim.frame(),
            elapsed_ms: now,
            level: self.sim.level_index(),
            wave: self.sim.wave(),
            score: self.score.score(),
            max_combo: self.score.max_combo(),
            stats: self.sim.stats().clone(),
        };
        info!(
            end = ?summary.end,
            frames = summary.frames,
            score = summary.score,
            kills = summary.stats.kills,
            accuracy = summary.stats.accuracy(),
            "Run finished"
        );
        Ok(summary)
    }

    /// Takes any weapon on offer in place of the weakest carried one.
    fn accept_swap_offers(&mut self, report: &FrameReport) {
        for event in &report.events {
            let SimEvent::WeaponSwapOffered { pickup, weapon } = event else {
                continue;
            };
            let weakest = self
                .sim
                .world()
                .player
                .combatant
                .weapons()
                .iter()
                .enumerate()
                .min_by(|(_, a), (_, b)| a.profile().damage.total_cmp(&b.profile().damage))
                .map(|(slot, w)| (slot, w.profile().damage));
            match weakest {
                Some((slot, damage)) if damage < weapon.profile().damage => {
                    if self.sim.swap_weapon(slot, *pickup) {
                        debug!(slot, ?weapon, "Swapped weapon");
                    }
                },
                _ => debug!(?weapon, "Declined weapon swap"),
            }
        }
    }

    fn write_report(&mut self, report: &FrameReport) -> Result<()> {
        let Some(writer) = self.reports.as_mut() else {
            return Ok(());
        };
        match report.to_json() {
            Ok(line) => writeln!(writer, "{line}").context("Failed to write frame report")?,
            Err(e) => warn!("Failed to serialize frame {}: {e}", report.frame),
        }
        Ok(())
    }
}

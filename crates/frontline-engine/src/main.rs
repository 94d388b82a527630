//! # Frontline
//!
//! Headless runner for the Frontline combat simulation.
//!
//! Loads the engine configuration and a campaign, then plays it with a
//! scripted autopilot:
//! - Config: TOML file with a `[sim]` tuning table
//! - Levels: bundled campaign or RON files on disk
//! - Output: structured logs, optional JSON-lines frame reports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

mod autopilot;
mod config;
mod level_loader;
mod runner;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use frontline_sim::{Campaign, CharacterClass, Difficulty, GameMode};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{EngineConfig, CONFIG_FILE};
use crate::level_loader::LevelLoader;
use crate::runner::Runner;

/// Command line options; each one overrides the config file.
#[derive(Debug, Parser)]
#[command(name = "frontline", version, about = "Headless Frontline combat simulation")]
struct Cli {
    /// Engine configuration file
    #[arg(long, default_value = CONFIG_FILE)]
    config: PathBuf,

    /// Campaign file or directory of campaign files
    #[arg(long)]
    levels: Option<PathBuf>,

    /// First campaign level (0-based)
    #[arg(long)]
    level: Option<usize>,

    /// campaign or survival
    #[arg(long)]
    mode: Option<GameMode>,

    /// Frames to simulate
    #[arg(long)]
    frames: Option<u64>,

    /// RNG seed
    #[arg(long)]
    seed: Option<u64>,

    /// baby, easy, medium or extreme
    #[arg(long)]
    difficulty: Option<Difficulty>,

    /// soldier, scout, heavy or medic
    #[arg(long)]
    character: Option<CharacterClass>,

    /// Write every frame report as a JSON line to this file
    #[arg(long)]
    report: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Write the effective configuration back to the config file and exit
    #[arg(long)]
    write_config: bool,
}

impl Cli {
    fn apply(&self, config: &mut EngineConfig) {
        if let Some(levels) = &self.levels {
            config.levels = Some(levels.clone());
        }
        if let Some(level) = self.level {
            config.start_level = level;
        }
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(frames) = self.frames {
            config.frames = frames;
        }
        if let Some(seed) = self.seed {
            config.sim.seed = seed;
        }
        if let Some(difficulty) = self.difficulty {
            config.sim.difficulty = difficulty;
        }
        if let Some(character) = self.character {
            config.character = character;
        }
        if let Some(report) = &self.report {
            config.report_path = Some(report.clone());
        }
        config.validate();
    }
}

/// Main entry point.
fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::from_default_env().add_directive("frontline=info".parse()?);
    if cli.json_logs {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry().with(fmt::layer()).with(filter).init();
    }

    info!("Frontline starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let mut config = EngineConfig::load_from(&cli.config);
    cli.apply(&mut config);

    if cli.write_config {
        config
            .save_to(&cli.config)
            .with_context(|| format!("Failed to write {}", cli.config.display()))?;
        return Ok(());
    }

    let campaign = match &config.levels {
        Some(path) => LevelLoader::new(path, config.sim.ground_level)
            .load()
            .with_context(|| format!("Failed to load levels from {}", path.display()))?,
        None => Campaign::bundled().context("Bundled campaign is invalid")?,
    };

    info!(
        mode = %config.mode,
        character = %config.character,
        difficulty = %config.sim.difficulty,
        seed = config.sim.seed,
        levels = campaign.len(),
        "Starting run"
    );
    let summary = Runner::new(config, campaign)?.run()?;
    println!("{}", serde_json::to_string_pretty(&summary)?);

    info!("Frontline shutdown complete");
    Ok(())
}

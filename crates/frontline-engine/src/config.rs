//! Engine configuration.
//!
//! Run parameters plus the embedded simulation tuning (`[sim]` table).
//! Loaded from and saved to TOML.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use frontline_sim::{CharacterClass, GameMode, SimConfig};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Configuration file name.
pub const CONFIG_FILE: &str = "frontline.toml";

/// Engine configuration parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // === Run Settings ===
    /// Campaign or survival
    pub mode: GameMode,
    /// First campaign level (0-based)
    pub start_level: usize,
    /// Player character
    pub character: CharacterClass,
    /// Frames to simulate before stopping
    pub frames: u64,
    /// Simulated frame duration in ms
    pub frame_ms: f64,
    /// Pause between a cleared level or wave and the next one, in ms
    pub advance_delay_ms: f64,

    // === Files ===
    /// Campaign file or directory of campaign files (bundled campaign when unset)
    pub levels: Option<PathBuf>,
    /// Write every frame report as a JSON line here
    pub report_path: Option<PathBuf>,

    // === Simulation ===
    /// Simulation tuning
    pub sim: SimConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            mode: GameMode::Campaign,
            start_level: 0,
            character: CharacterClass::Soldier,
            frames: 36_000,
            frame_ms: 16.0,
            advance_delay_ms: 2000.0,

            levels: None,
            report_path: None,

            sim: SimConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a specific path.
    /// Returns default config if file doesn't exist or is invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file not found, using defaults");
            return Self::default();
        }

        let mut contents = String::new();
        if let Err(e) = fs::File::open(path).and_then(|mut file| file.read_to_string(&mut contents)) {
            warn!("Failed to read config file {}: {e}", path.display());
            return Self::default();
        }

        match toml::from_str::<Self>(&contents) {
            Ok(mut config) => {
                config.validate();
                info!("Loaded config from {}", path.display());
                config
            },
            Err(e) => {
                warn!("Failed to parse config file: {e}");
                Self::default()
            },
        }
    }

    /// Save configuration to a specific path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let mut file = fs::File::create(path)?;
        file.write_all(contents.as_bytes())?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Validate and clamp configuration values to sensible ranges.
    pub fn validate(&mut self) {
        self.frame_ms = self.frame_ms.clamp(1.0, 100.0);
        self.advance_delay_ms = self.advance_delay_ms.clamp(0.0, 10_000.0);
        self.sim.validate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use frontline_sim::Difficulty;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.mode, GameMode::Campaign);
        assert_eq!(config.frame_ms, 16.0);
        assert_eq!(config.sim.gravity, 0.6);
        assert!(config.levels.is_none());
    }

    #[test]
    fn test_config_validation() {
        let mut config = EngineConfig::default();
        config.frame_ms = 0.0;
        config.sim.cover_damage_ratio = 4.0;

        config.validate();

        assert_eq!(config.frame_ms, 1.0);
        assert_eq!(config.sim.cover_damage_ratio, 1.0);
    }

    #[test]
    fn test_config_save_load() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("nested").join(CONFIG_FILE);

        let mut config = EngineConfig::default();
        config.mode = GameMode::Survival;
        config.character = CharacterClass::Medic;
        config.sim.seed = 12345;
        config.sim.difficulty = Difficulty::Extreme;

        config.save_to(&config_path).expect("Failed to save config");

        let loaded = EngineConfig::load_from(&config_path);
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_config_load_missing_file() {
        let config = EngineConfig::load_from("/nonexistent/path/frontline.toml");
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join(CONFIG_FILE);
        fs::write(&config_path, "mode = \"survival\"\n\n[sim]\ngravity = 0.8\n").unwrap();

        let loaded = EngineConfig::load_from(&config_path);
        assert_eq!(loaded.mode, GameMode::Survival);
        assert_eq!(loaded.sim.gravity, 0.8);
        assert_eq!(loaded.sim.world_width, 3000.0);
        assert_eq!(loaded.frames, 36_000);
    }

    #[test]
    fn test_invalid_file_falls_back() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join(CONFIG_FILE);
        fs::write(&config_path, "mode = [").unwrap();
        assert_eq!(EngineConfig::load_from(&config_path), EngineConfig::default());
    }
}

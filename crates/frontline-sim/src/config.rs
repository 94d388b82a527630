//! Simulation tuning.
//!
//! Every constant the frame loop reads lives here so hosts can override it
//! from a config file instead of reaching for globals.

use serde::{Deserialize, Serialize};

use crate::difficulty::Difficulty;

/// Tuning parameters for one simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    // === Time ===
    /// Duration of one reference frame in ms; velocities are per reference frame
    pub frame_unit_ms: f32,
    /// Frame deltas above this are clamped (tab stalls, debugger pauses)
    pub max_delta_ms: f32,

    // === World ===
    /// Downward acceleration per reference frame
    pub gravity: f32,
    /// Arena width; combatants are clamped to `[0, world_width]`
    pub world_width: f32,
    /// Y coordinate of the ground plane
    pub ground_level: f32,

    // === Terrain tolerances ===
    /// How far above a platform top a falling bottom edge may be and still land
    pub landing_above: f32,
    /// How far below a platform top a falling bottom edge may sink and still land
    pub landing_below: f32,
    /// Horizontal overhang required to stand on a platform edge
    pub landing_edge_margin: f32,
    /// Snap band above a slope surface
    pub slope_snap_above: f32,
    /// Snap band below a slope surface
    pub slope_snap_below: f32,
    /// Vertical penetration a solid platform needs before it blocks sideways
    pub solid_side_depth: f32,
    /// Maximum penetration from below that counts as a head bonk
    pub head_bonk_depth: f32,

    // === Combat ===
    /// Fraction of projectile damage transferred to cover
    pub cover_damage_ratio: f32,
    /// Apply area damage around explosive impacts
    pub explosive_splash: bool,
    /// Fraction of the direct damage dealt to bystanders inside the blast
    pub splash_falloff: f32,
    /// Window without a kill before the combo counter resets
    pub combo_timeout_ms: f64,

    // === Bosses ===
    /// Length of a boss shield window
    pub boss_shield_ms: f64,
    /// Speed multiplier applied once when a raging boss drops under half health
    pub boss_rage_speed: f32,
    /// Shot cooldown multiplier applied together with the rage speed boost
    pub boss_rage_cooldown: f32,
    /// Minions spawned per summon
    pub boss_summon_count: u32,

    // === Player ===
    /// Invulnerability window after (re)spawning
    pub spawn_protection_ms: f64,

    // === Run ===
    /// RNG seed; equal seeds and inputs reproduce a run
    pub seed: u64,
    /// Difficulty preset
    pub difficulty: Difficulty,
    /// Capacity of the event bus per frame
    pub event_capacity: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            frame_unit_ms: 16.0,
            max_delta_ms: 100.0,

            gravity: 0.6,
            world_width: 3000.0,
            ground_level: 550.0,

            landing_above: 5.0,
            landing_below: 10.0,
            landing_edge_margin: 5.0,
            slope_snap_above: 5.0,
            slope_snap_below: 10.0,
            solid_side_depth: 10.0,
            head_bonk_depth: 15.0,

            cover_damage_ratio: 0.1,
            explosive_splash: false,
            splash_falloff: 0.5,
            combo_timeout_ms: 3000.0,

            boss_shield_ms: 3000.0,
            boss_rage_speed: 1.3,
            boss_rage_cooldown: 0.6,
            boss_summon_count: 2,

            spawn_protection_ms: 2000.0,

            seed: 0x5EED,
            difficulty: Difficulty::Medium,
            event_capacity: 1024,
        }
    }
}

impl SimConfig {
    /// Converts a raw frame delta into the integration scale.
    ///
    /// A 16 ms frame yields 1.0; deltas are clamped to `[0, max_delta_ms]`.
    #[must_use]
    pub fn dt_scale(&self, delta_ms: f64) -> f32 {
        let clamped = (delta_ms as f32).clamp(0.0, self.max_delta_ms);
        clamped / self.frame_unit_ms
    }

    /// Clamps a raw frame delta to the configured cap.
    #[must_use]
    pub fn clamp_delta(&self, delta_ms: f64) -> f64 {
        delta_ms.clamp(0.0, f64::from(self.max_delta_ms))
    }

    /// Validate and clamp configuration values to sensible ranges.
    pub fn validate(&mut self) {
        self.frame_unit_ms = self.frame_unit_ms.clamp(1.0, 100.0);
        self.max_delta_ms = self.max_delta_ms.clamp(self.frame_unit_ms, 1000.0);
        self.gravity = self.gravity.clamp(0.0, 5.0);
        self.world_width = self.world_width.max(100.0);

        self.cover_damage_ratio = self.cover_damage_ratio.clamp(0.0, 1.0);
        self.splash_falloff = self.splash_falloff.clamp(0.0, 1.0);
        self.boss_shield_ms = self.boss_shield_ms.clamp(0.0, 60_000.0);
        self.boss_summon_count = self.boss_summon_count.min(8);
        self.event_capacity = self.event_capacity.clamp(16, 1 << 16);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dt_scale() {
        let config = SimConfig::default();
        assert_eq!(config.dt_scale(16.0), 1.0);
        assert_eq!(config.dt_scale(8.0), 0.5);
        // Stalls are capped
        assert_eq!(config.dt_scale(10_000.0), 100.0 / 16.0);
        assert_eq!(config.dt_scale(-5.0), 0.0);
    }

    #[test]
    fn test_config_validation() {
        let mut config = SimConfig {
            cover_damage_ratio: 4.0,
            event_capacity: 0,
            gravity: -1.0,
            ..SimConfig::default()
        };
        config.validate();

        assert_eq!(config.cover_damage_ratio, 1.0);
        assert_eq!(config.event_capacity, 16);
        assert_eq!(config.gravity, 0.0);
    }

    #[test]
    fn test_partial_deserialize_uses_defaults() {
        let config: SimConfig =
            serde_json::from_str(r#"{"seed": 7, "difficulty": "extreme"}"#).expect("parse");
        assert_eq!(config.seed, 7);
        assert_eq!(config.difficulty, Difficulty::Extreme);
        assert_eq!(config.gravity, 0.6);
    }
}

//! Difficulty presets.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Difficulty setting chosen before a run starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// Very few, very weak enemies and a sturdy player
    Baby,
    /// Fewer, weaker enemies
    Easy,
    /// Reference tuning
    #[default]
    Medium,
    /// More and stronger enemies, fragile player
    Extreme,
}

impl Difficulty {
    /// All presets, easiest first.
    pub const ALL: [Self; 4] = [Self::Baby, Self::Easy, Self::Medium, Self::Extreme];

    /// Multiplier on the player's max health.
    #[must_use]
    pub const fn player_health_mult(self) -> f32 {
        match self {
            Self::Baby => 5.0,
            Self::Easy => 2.5,
            Self::Medium => 1.0,
            Self::Extreme => 0.7,
        }
    }

    /// Multiplier on survival wave sizes.
    #[must_use]
    pub const fn wave_count_mult(self) -> f32 {
        match self {
            Self::Baby => 0.2,
            Self::Easy => 0.4,
            Self::Medium => 1.0,
            Self::Extreme => 1.5,
        }
    }

    /// Multiplier on campaign group sizes.
    #[must_use]
    pub const fn campaign_count_mult(self) -> f32 {
        match self {
            Self::Baby => 0.4,
            Self::Easy => 0.6,
            Self::Medium => 1.0,
            Self::Extreme => 1.3,
        }
    }

    /// Multiplier on enemy health and damage.
    #[must_use]
    pub const fn enemy_strength(self) -> f32 {
        match self {
            Self::Baby => 0.3,
            Self::Easy => 0.5,
            Self::Medium => 1.0,
            Self::Extreme => 1.5,
        }
    }

    /// Scales a spawn count, flooring and keeping at least one enemy.
    #[must_use]
    pub fn scale_count(count: u32, mult: f32) -> u32 {
        ((count as f32 * mult).floor() as u32).max(1)
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Baby => "baby",
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Extreme => "extreme",
        };
        f.write_str(name)
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|d| d.to_string().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown difficulty '{s}' (expected baby, easy, medium or extreme)"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_count_floors_with_minimum() {
        assert_eq!(Difficulty::scale_count(5, 0.4), 2);
        assert_eq!(Difficulty::scale_count(1, 0.2), 1);
        assert_eq!(Difficulty::scale_count(4, 1.3), 5);
    }

    #[test]
    fn test_parse_round_trip() {
        for d in Difficulty::ALL {
            assert_eq!(d.to_string().parse::<Difficulty>(), Ok(d));
        }
        assert_eq!("EXTREME".parse::<Difficulty>(), Ok(Difficulty::Extreme));
        assert!("nightmare".parse::<Difficulty>().is_err());
    }

    #[test]
    fn test_medium_is_identity() {
        let d = Difficulty::Medium;
        assert_eq!(d.player_health_mult(), 1.0);
        assert_eq!(d.enemy_strength(), 1.0);
        assert_eq!(d.wave_count_mult(), 1.0);
    }
}

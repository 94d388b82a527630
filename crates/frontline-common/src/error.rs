//! Error types for the Frontline simulation.

use thiserror::Error;

/// Top-level error type for Frontline operations.
#[derive(Debug, Error)]
pub enum FrontlineError {
    /// Level/terrain configuration errors
    #[error("Level error: {0}")]
    Level(#[from] LevelError),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Schema version mismatch
    #[error("Schema version mismatch: expected {expected}, got {actual}")]
    VersionMismatch {
        /// Expected version
        expected: String,
        /// Actual version found
        actual: String,
    },
}

/// Problems found while validating a level configuration.
///
/// These are raised at level-load time; the frame loop assumes geometry
/// has already passed validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LevelError {
    /// A rectangle has a zero, negative or non-finite dimension
    #[error("{kind} #{index} has malformed geometry: {reason}")]
    MalformedGeometry {
        /// Terrain kind ("platform", "slope", "cover")
        kind: &'static str,
        /// Index within its list
        index: usize,
        /// Human-readable reason
        reason: String,
    },

    /// A slope spans no horizontal distance
    #[error("slope #{index} has zero width")]
    ZeroWidthSlope {
        /// Index within the slope list
        index: usize,
    },

    /// An enemy group spawns nobody
    #[error("enemy group #{index} in level '{level}' has count 0")]
    EmptyGroup {
        /// Level name
        level: String,
        /// Index within the enemy list
        index: usize,
    },

    /// A campaign with no levels
    #[error("campaign contains no levels")]
    EmptyCampaign,
}

/// Result type alias for Frontline operations.
pub type FrontlineResult<T> = Result<T, FrontlineError>;

/// Result type alias for level validation.
pub type LevelResult<T> = Result<T, LevelError>;

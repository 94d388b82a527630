//! # Frontline Sim
//!
//! Real-time simulation core of a 2D side-scrolling combat game.
//!
//! This crate owns everything that happens inside a frame:
//! - Terrain (platforms, slopes, destructible cover) and collision resolution
//! - Weapons, projectiles and hit resolution
//! - Player movement, rolling and power-ups
//! - Enemy AI state machine and boss mechanics
//! - Timed effects, pickups and loot
//! - Campaign levels and survival waves
//! - Frame orchestration, reports and observers
//!
//! Rendering, audio and input devices live outside; they consume
//! [`FrameReport`]s and feed [`PlayerInput`]s.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod ai;
pub mod body;
pub mod boss;
pub mod collision;
pub mod combat;
pub mod combatant;
pub mod config;
pub mod context;
pub mod difficulty;
pub mod effects;
pub mod enemy;
pub mod events;
pub mod level;
pub mod loot;
pub mod pickup;
pub mod player;
pub mod projectile;
pub mod score;
pub mod sim;
pub mod terrain;
pub mod waves;
pub mod weapon;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::ai::{AiState, Brain, Decision, Transition};
    pub use crate::body::*;
    pub use crate::boss::*;
    pub use crate::collision::*;
    pub use crate::combat::CombatStats;
    pub use crate::combatant::*;
    pub use crate::config::*;
    pub use crate::context::*;
    pub use crate::difficulty::*;
    pub use crate::effects::*;
    pub use crate::enemy::*;
    pub use crate::events::*;
    pub use crate::level::*;
    pub use crate::loot::*;
    pub use crate::pickup::*;
    pub use crate::player::*;
    pub use crate::projectile::*;
    pub use crate::score::*;
    pub use crate::sim::*;
    pub use crate::terrain::*;
    pub use crate::waves::*;
    pub use crate::weapon::*;
}

pub use prelude::*;

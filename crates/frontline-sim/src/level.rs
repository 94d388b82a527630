//! Declarative level manifests and the bundled campaign.
//!
//! A manifest is data only: rectangles with type tags plus enemy groups.
//! Geometry is validated when a level is built, so the frame loop never
//! sees a malformed slope or a negative rectangle.

use fastrand::Rng;
use frontline_common::{
    EntityIdAllocator, FrontlineError, FrontlineResult, LevelError, LevelResult, Rect, SchemaVersion, Vec2,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::difficulty::Difficulty;
use crate::enemy::{Enemy, EnemyKind};
use crate::loot::LootTable;
use crate::pickup::{Pickup, PICKUP_SIZE};
use crate::terrain::{Cover, Platform, PlatformKind, Slope, SlopeDirection, Terrain};

/// The campaign shipped with the crate.
const BUNDLED_CAMPAIGN: &str = include_str!("../assets/campaign.ron");

/// Running x offset of the first unpositioned enemy group.
pub const GROUP_START_X: f32 = 500.0;
/// Gap added after each unpositioned group.
pub const GROUP_GAP: f32 = 200.0;
/// Random jitter added to each unpositioned spawn.
pub const SPAWN_JITTER: f32 = 100.0;
/// Pickups scattered over a level at load.
pub const SCATTER_COUNT: usize = 5;

// ============================================================================
// Manifest types
// ============================================================================

/// A platform; `elevation` is the height of its top above the ground line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlatformSpec {
    /// Left edge
    pub x: f32,
    /// Top edge above ground
    pub elevation: f32,
    /// Width
    pub width: f32,
    /// Thickness
    pub height: f32,
    /// Solid or passthrough
    pub kind: PlatformKind,
}

/// A ramp; `elevation` is the height of its top above the ground line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlopeSpec {
    /// Left edge
    pub x: f32,
    /// Top edge above ground
    pub elevation: f32,
    /// Horizontal span
    pub width: f32,
    /// Rise
    pub height: f32,
    /// Which way it rises
    pub direction: SlopeDirection,
}

/// A square cover block resting `elevation` above the ground line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoverSpec {
    /// Left edge
    pub x: f32,
    /// Side length
    pub size: f32,
    /// Bottom edge above ground
    #[serde(default)]
    pub elevation: f32,
    /// Ignores all damage
    #[serde(default)]
    pub indestructible: bool,
}

/// What an enemy group spawns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpawnKind {
    /// Pistol grunt
    Infantry,
    /// Machine gunner
    Heavy,
    /// Marksman
    Sniper,
    /// Runner
    Scout,
    /// A boss from the boss table
    Boss,
}

impl From<EnemyKind> for SpawnKind {
    fn from(kind: EnemyKind) -> Self {
        match kind {
            EnemyKind::Infantry => Self::Infantry,
            EnemyKind::Heavy => Self::Heavy,
            EnemyKind::Sniper => Self::Sniper,
            EnemyKind::Scout => Self::Scout,
        }
    }
}

/// A run of identical enemies.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnemyGroup {
    /// What to spawn
    pub kind: SpawnKind,
    /// How many before difficulty scaling
    pub count: u32,
    /// Distance between members
    pub spacing: f32,
    /// Fixed x for every member instead of the running offset
    #[serde(default)]
    pub position: Option<f32>,
    /// Boss table id
    #[serde(default)]
    pub boss_id: Option<u32>,
}

/// One authored level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelManifest {
    /// Display name
    pub name: String,
    /// Ends with a boss
    #[serde(default)]
    pub boss_level: bool,
    /// Platforms
    #[serde(default)]
    pub platforms: Vec<PlatformSpec>,
    /// Ramps
    #[serde(default)]
    pub slopes: Vec<SlopeSpec>,
    /// Cover blocks
    #[serde(default)]
    pub covers: Vec<CoverSpec>,
    /// Enemy groups in spawn order
    #[serde(default)]
    pub enemies: Vec<EnemyGroup>,
}

/// A concrete spawn decided from a manifest or wave.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnPlan {
    /// What to spawn
    pub kind: SpawnKind,
    /// Left edge
    pub x: f32,
    /// Boss table id
    pub boss_id: Option<u32>,
}

impl SpawnPlan {
    /// Builds the enemy standing on `ground_level`.
    #[must_use]
    pub fn spawn(&self, ids: &mut EntityIdAllocator, ground_level: f32, strength: f32, now: f64) -> Enemy {
        let id = ids.allocate();
        match self.kind {
            SpawnKind::Boss => Enemy::spawn_boss(id, self.boss_id.unwrap_or(0), self.x, ground_level, strength, now),
            SpawnKind::Infantry => Enemy::spawn(id, EnemyKind::Infantry, self.x, ground_level, strength, now),
            SpawnKind::Heavy => Enemy::spawn(id, EnemyKind::Heavy, self.x, ground_level, strength, now),
            SpawnKind::Sniper => Enemy::spawn(id, EnemyKind::Sniper, self.x, ground_level, strength, now),
            SpawnKind::Scout => Enemy::spawn(id, EnemyKind::Scout, self.x, ground_level, strength, now),
        }
    }
}

impl LevelManifest {
    /// Checks enemy groups and terrain geometry.
    pub fn validate(&self, ground_level: f32) -> LevelResult<()> {
        if let Some(index) = self.enemies.iter().position(|g| g.count == 0) {
            return Err(LevelError::EmptyGroup {
                level: self.name.clone(),
                index,
            });
        }
        self.build_terrain(ground_level, &mut EntityIdAllocator::new())
            .map(|_| ())
    }

    /// Turns the manifest's rectangles into validated terrain.
    pub fn build_terrain(&self, ground_level: f32, ids: &mut EntityIdAllocator) -> LevelResult<Terrain> {
        let mut terrain = Terrain::flat(ground_level);
        for p in &self.platforms {
            terrain = terrain.with_platform(Platform::new(
                Rect::new(p.x, ground_level - p.elevation, p.width, p.height),
                p.kind,
            ));
        }
        for s in &self.slopes {
            terrain = terrain.with_slope(Slope::new(
                Rect::new(s.x, ground_level - s.elevation, s.width, s.height),
                s.direction,
            ));
        }
        for c in &self.covers {
            let rect = Rect::new(c.x, ground_level - c.elevation - c.size, c.size, c.size);
            let cover = Cover::new(ids.allocate(), rect);
            terrain = terrain.with_cover(if c.indestructible {
                cover.indestructible()
            } else {
                cover
            });
        }
        terrain.validate()?;
        Ok(terrain)
    }

    /// Decides where every enemy of the level appears.
    ///
    /// Group counts are scaled by the difficulty. Unpositioned groups are laid
    /// out left to right from a running offset with a little jitter.
    pub fn plan_spawns(&self, difficulty: Difficulty, rng: &mut Rng) -> Vec<SpawnPlan> {
        let mult = difficulty.campaign_count_mult();
        let mut offset = GROUP_START_X;
        let mut plans = Vec::new();
        for group in &self.enemies {
            let count = Difficulty::scale_count(group.count, mult);
            for i in 0..count {
                let x = group
                    .position
                    .unwrap_or_else(|| offset + i as f32 * group.spacing + rng.f32() * SPAWN_JITTER);
                plans.push(SpawnPlan {
                    kind: group.kind,
                    x,
                    boss_id: group.boss_id,
                });
            }
            if group.position.is_none() {
                offset += count as f32 * group.spacing + GROUP_GAP;
            }
        }
        plans
    }
}

/// Scatters starter pickups across the level, resting on the highest surface
/// under each one.
pub fn scatter_pickups(
    terrain: &Terrain,
    loot: &LootTable,
    ids: &mut EntityIdAllocator,
    rng: &mut Rng,
) -> Vec<Pickup> {
    (0..SCATTER_COUNT)
        .filter_map(|i| {
            let kind = loot.roll_scatter(rng)?;
            let x = 300.0 + i as f32 * 400.0 + rng.f32() * 100.0;
            let y = terrain.standing_height(x + PICKUP_SIZE.x / 2.0) - PICKUP_SIZE.y;
            Some(Pickup::new(ids.allocate(), kind, Vec2::new(x, y)))
        })
        .collect()
}

// ============================================================================
// Campaign
// ============================================================================

/// An ordered list of levels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    /// Manifest schema version
    pub version: SchemaVersion,
    /// Levels in play order
    pub levels: Vec<LevelManifest>,
}

impl Campaign {
    /// The bundled ten-level campaign.
    pub fn bundled() -> FrontlineResult<Self> {
        Self::from_ron_str(BUNDLED_CAMPAIGN)
    }

    /// Parses a RON campaign, checking the schema version but not geometry.
    pub fn from_ron_str(source: &str) -> FrontlineResult<Self> {
        let campaign: Self =
            ron::from_str(source).map_err(|e| FrontlineError::Serialization(e.to_string()))?;
        if !SchemaVersion::LEVEL_MANIFEST.reads(&campaign.version) {
            return Err(FrontlineError::VersionMismatch {
                expected: SchemaVersion::LEVEL_MANIFEST.to_string(),
                actual: campaign.version.to_string(),
            });
        }
        Ok(campaign)
    }

    /// Serializes to pretty RON.
    pub fn to_ron_string(&self) -> FrontlineResult<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| FrontlineError::Serialization(e.to_string()))
    }

    /// Validates every level.
    pub fn validate(&self, ground_level: f32) -> LevelResult<()> {
        if self.levels.is_empty() {
            return Err(LevelError::EmptyCampaign);
        }
        self.levels
            .iter()
            .try_for_each(|level| level.validate(ground_level))
    }

    /// Number of levels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// True when there are no levels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Level at `index`, or the last level when `index` runs past the end.
    ///
    /// Returns the index actually used; `None` only for an empty campaign.
    #[must_use]
    pub fn level(&self, index: usize) -> Option<(usize, &LevelManifest)> {
        if let Some(level) = self.levels.get(index) {
            return Some((index, level));
        }
        let last = self.levels.len().checked_sub(1)?;
        warn!(requested = index, used = last, "Level index out of range, using last level");
        self.levels.last().map(|level| (last, level))
    }
}

impl Default for Campaign {
    fn default() -> Self {
        Self {
            version: SchemaVersion::LEVEL_MANIFEST,
            levels: Vec::new(),
        }
    }
}

/// Logs a one-line summary of a built level.
pub(crate) fn log_level(index: usize, level: &LevelManifest, enemies: usize) {
    debug!(
        index,
        name = %level.name,
        platforms = level.platforms.len(),
        slopes = level.slopes.len(),
        covers = level.covers.len(),
        enemies,
        "Level built"
    );
}

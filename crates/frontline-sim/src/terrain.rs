//! Static level geometry: platforms, slopes and destructible cover.

use frontline_common::{EntityId, LevelError, LevelResult, Rect};
use serde::{Deserialize, Serialize};

/// Default hit points of a cover block.
pub const COVER_HEALTH: f32 = 100.0;

// ============================================================================
// Solid seam
// ============================================================================

/// Geometry that blocks movement from every side.
pub trait Solid {
    /// Current bounding box.
    fn bounds(&self) -> Rect;

    /// Whether the obstacle still blocks anything.
    fn is_solid(&self) -> bool;
}

// ============================================================================
// Platforms
// ============================================================================

/// How a platform interacts with bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlatformKind {
    /// Blocks all four sides
    Solid,
    /// Only supports landing from above
    Passthrough,
}

/// Rectangular ledge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Platform {
    /// Extent
    pub rect: Rect,
    /// Blocking behavior
    pub kind: PlatformKind,
}

impl Platform {
    /// Creates a platform.
    #[must_use]
    pub const fn new(rect: Rect, kind: PlatformKind) -> Self {
        Self { rect, kind }
    }
}

impl Solid for Platform {
    fn bounds(&self) -> Rect {
        self.rect
    }

    fn is_solid(&self) -> bool {
        self.kind == PlatformKind::Solid
    }
}

// ============================================================================
// Slopes
// ============================================================================

/// Which way a slope rises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlopeDirection {
    /// Rises left to right
    Up,
    /// Falls left to right
    Down,
}

/// Ramp whose walkable surface interpolates between two corners of its rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Slope {
    /// Extent
    pub rect: Rect,
    /// Rise direction
    pub direction: SlopeDirection,
}

impl Slope {
    /// Creates a slope.
    #[must_use]
    pub const fn new(rect: Rect, direction: SlopeDirection) -> Self {
        Self { rect, direction }
    }

    /// Surface height at `x`, or `None` outside the horizontal span.
    #[must_use]
    pub fn y_at_x(&self, x: f32) -> Option<f32> {
        if !self.rect.spans_x(x) || self.rect.width <= 0.0 {
            return None;
        }
        let progress = (x - self.rect.x) / self.rect.width;
        let y = match self.direction {
            SlopeDirection::Up => self.rect.y + self.rect.height - progress * self.rect.height,
            SlopeDirection::Down => self.rect.y + progress * self.rect.height,
        };
        Some(y)
    }
}

// ============================================================================
// Cover
// ============================================================================

/// Result of a projectile striking cover.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CoverHit {
    /// Indestructible or already inert
    Ignored,
    /// Took damage and still stands
    Damaged {
        /// Health left
        remaining: f32,
    },
    /// Health reached zero on this hit
    Destroyed,
}

/// Destructible block; solid to movement, stops projectiles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cover {
    /// Stable id for events
    pub id: EntityId,
    /// Extent
    pub rect: Rect,
    health: f32,
    max_health: f32,
    /// Ignores all damage
    pub indestructible: bool,
    /// False once destroyed
    pub active: bool,
}

impl Cover {
    /// Creates a cover block at full health.
    #[must_use]
    pub fn new(id: EntityId, rect: Rect) -> Self {
        Self {
            id,
            rect,
            health: COVER_HEALTH,
            max_health: COVER_HEALTH,
            indestructible: false,
            active: true,
        }
    }

    /// Builder: makes the block immune to damage.
    pub fn indestructible(mut self) -> Self {
        self.indestructible = true;
        self
    }

    /// Current health.
    #[must_use]
    pub fn health(&self) -> f32 {
        self.health
    }

    /// Health at spawn.
    #[must_use]
    pub fn max_health(&self) -> f32 {
        self.max_health
    }

    /// Applies damage, clamping at zero. Destruction happens at most once.
    pub fn take_damage(&mut self, amount: f32) -> CoverHit {
        if self.indestructible || !self.active || amount <= 0.0 {
            return CoverHit::Ignored;
        }
        self.health = (self.health - amount).max(0.0);
        if self.health == 0.0 {
            self.active = false;
            CoverHit::Destroyed
        } else {
            CoverHit::Damaged {
                remaining: self.health,
            }
        }
    }
}

impl Solid for Cover {
    fn bounds(&self) -> Rect {
        self.rect
    }

    fn is_solid(&self) -> bool {
        self.active
    }
}

// ============================================================================
// Level terrain
// ============================================================================

/// All static geometry of the active level.
///
/// Replaced wholesale on level transition.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Terrain {
    /// Y of the ground plane
    pub ground_level: f32,
    /// Ledges
    pub platforms: Vec<Platform>,
    /// Ramps
    pub slopes: Vec<Slope>,
    /// Destructible blocks
    pub covers: Vec<Cover>,
}

impl Terrain {
    /// Flat ground with nothing on it.
    #[must_use]
    pub fn flat(ground_level: f32) -> Self {
        Self {
            ground_level,
            ..Self::default()
        }
    }

    /// Builder: adds a platform.
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platforms.push(platform);
        self
    }

    /// Builder: adds a slope.
    pub fn with_slope(mut self, slope: Slope) -> Self {
        self.slopes.push(slope);
        self
    }

    /// Builder: adds a cover block.
    pub fn with_cover(mut self, cover: Cover) -> Self {
        self.covers.push(cover);
        self
    }

    /// Rejects geometry the resolver cannot handle.
    pub fn validate(&self) -> LevelResult<()> {
        if !self.ground_level.is_finite() {
            return Err(LevelError::MalformedGeometry {
                kind: "ground",
                index: 0,
                reason: format!("ground level {} is not finite", self.ground_level),
            });
        }
        for (index, slope) in self.slopes.iter().enumerate() {
            if slope.rect.width == 0.0 {
                return Err(LevelError::ZeroWidthSlope { index });
            }
            check_rect("slope", index, &slope.rect)?;
        }
        for (index, platform) in self.platforms.iter().enumerate() {
            check_rect("platform", index, &platform.rect)?;
        }
        for (index, cover) in self.covers.iter().enumerate() {
            check_rect("cover", index, &cover.rect)?;
        }
        Ok(())
    }

    /// Drops destroyed cover; returns how many were removed.
    pub fn prune_covers(&mut self) -> usize {
        let before = self.covers.len();
        self.covers.retain(|c| c.active);
        before - self.covers.len()
    }

    /// True if `rect` overlaps a solid platform or live cover.
    #[must_use]
    pub fn blocks(&self, rect: &Rect) -> bool {
        fn hit<S: Solid>(solid: &S, rect: &Rect) -> bool {
            solid.is_solid() && solid.bounds().overlaps(rect)
        }
        self.platforms.iter().any(|p| hit(p, rect)) || self.covers.iter().any(|c| hit(c, rect))
    }

    /// Top of the highest platform spanning `x`, or the ground.
    #[must_use]
    pub fn standing_height(&self, x: f32) -> f32 {
        self.platforms
            .iter()
            .filter(|p| p.rect.spans_x(x) && p.rect.y < self.ground_level)
            .map(|p| p.rect.y)
            .fold(self.ground_level, f32::min)
    }
}

fn check_rect(kind: &'static str, index: usize, rect: &Rect) -> LevelResult<()> {
    if rect.is_well_formed() {
        Ok(())
    } else {
        Err(LevelError::MalformedGeometry {
            kind,
            index,
            reason: format!(
                "rect ({}, {}, {}x{}) needs finite coordinates and positive size",
                rect.x, rect.y, rect.width, rect.height
            ),
        })
    }
}

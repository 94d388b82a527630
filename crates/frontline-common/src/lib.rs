//! # Frontline Common
//!
//! Shared vocabulary for the Frontline combat simulation.
//!
//! - Entity IDs and the per-simulation allocator
//! - Axis-aligned rectangle geometry over `glam::Vec2`
//! - Schema versions for data files
//! - Common error types
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod error;
pub mod geometry;
pub mod ids;
pub mod version;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::*;
    pub use crate::geometry::*;
    pub use crate::ids::*;
    pub use crate::version::*;
    pub use glam::Vec2;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_entity_id_allocation() {
        let mut ids = EntityIdAllocator::new();
        let id1 = ids.allocate();
        let id2 = ids.allocate();
        assert_ne!(id1, id2);
        assert!(id1.is_valid());
        assert!(!EntityId::NULL.is_valid());
        assert_eq!(ids.allocated(), 2);
    }

    #[test]
    fn test_level_error_display() {
        let err = FrontlineError::from(LevelError::ZeroWidthSlope { index: 3 });
        assert_eq!(err.to_string(), "Level error: slope #3 has zero width");
    }

    proptest! {
        #[test]
        fn prop_overlap_is_symmetric(
            ax in -500.0f32..500.0, ay in -500.0f32..500.0,
            bx in -500.0f32..500.0, by in -500.0f32..500.0,
            w in 1.0f32..100.0, h in 1.0f32..100.0,
        ) {
            let a = Rect::new(ax, ay, w, h);
            let b = Rect::new(bx, by, h, w);
            prop_assert_eq!(a.overlaps(&b), b.overlaps(&a));
        }
    }
}

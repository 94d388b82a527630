//! Terrain collision resolution.
//!
//! Corrects a body after integration against the ground plane, slopes,
//! platforms and cover, in that order. Geometry is assumed valid; see
//! [`Terrain::validate`].

use frontline_common::Rect;
use serde::{Deserialize, Serialize};

use crate::body::Body;
use crate::config::SimConfig;
use crate::terrain::{Platform, PlatformKind, Solid, Terrain};

/// Tolerance bands used when snapping bodies onto surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerances {
    /// Landing window above a platform top
    pub landing_above: f32,
    /// Landing window below a platform top
    pub landing_below: f32,
    /// Required overhang on platform edges
    pub landing_edge_margin: f32,
    /// Snap band above a slope surface
    pub slope_snap_above: f32,
    /// Snap band below a slope surface
    pub slope_snap_below: f32,
    /// Vertical depth before a solid platform blocks sideways
    pub solid_side_depth: f32,
    /// Maximum depth of a head bonk from below
    pub head_bonk_depth: f32,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self::from(&SimConfig::default())
    }
}

impl From<&SimConfig> for Tolerances {
    fn from(config: &SimConfig) -> Self {
        Self {
            landing_above: config.landing_above,
            landing_below: config.landing_below,
            landing_edge_margin: config.landing_edge_margin,
            slope_snap_above: config.slope_snap_above,
            slope_snap_below: config.slope_snap_below,
            solid_side_depth: config.solid_side_depth,
            head_bonk_depth: config.head_bonk_depth,
        }
    }
}

/// How a push-out was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOut {
    /// No overlap
    Clear,
    /// Displaced left or right
    Sideways,
    /// Placed on top; counts as ground contact
    Landed,
    /// Pushed below the obstacle's underside
    Ceiling,
}

/// Resolves bodies against one level's terrain.
#[derive(Debug, Clone, Copy)]
pub struct TerrainResolver<'a> {
    terrain: &'a Terrain,
    tolerances: Tolerances,
}

impl<'a> TerrainResolver<'a> {
    /// Creates a resolver over `terrain`.
    #[must_use]
    pub fn new(terrain: &'a Terrain, tolerances: Tolerances) -> Self {
        Self {
            terrain,
            tolerances,
        }
    }

    /// Corrects `body` in place and returns the new `on_ground` flag.
    pub fn resolve(&self, body: &mut Body) -> bool {
        let mut grounded = self.resolve_ground(body);
        grounded |= self.resolve_slopes(body);
        for platform in &self.terrain.platforms {
            grounded |= self.resolve_platform(body, platform);
        }
        for cover in self.terrain.covers.iter().filter(|c| c.is_solid()) {
            grounded |= push_out(body, cover) == PushOut::Landed;
        }
        grounded
    }

    fn resolve_ground(&self, body: &mut Body) -> bool {
        if body.bottom() >= self.terrain.ground_level {
            body.set_bottom(self.terrain.ground_level);
            body.velocity.y = 0.0;
            true
        } else {
            false
        }
    }

    fn resolve_slopes(&self, body: &mut Body) -> bool {
        if body.velocity.y < 0.0 {
            return false;
        }
        let mut grounded = false;
        let center_x = body.center().x;
        for slope in &self.terrain.slopes {
            let Some(surface) = slope.y_at_x(center_x) else {
                continue;
            };
            let bottom = body.bottom();
            if bottom >= surface - self.tolerances.slope_snap_above
                && bottom <= surface + self.tolerances.slope_snap_below
            {
                body.set_bottom(surface);
                body.velocity.y = 0.0;
                grounded = true;
            }
        }
        grounded
    }

    fn resolve_platform(&self, body: &mut Body, platform: &Platform) -> bool {
        let tol = &self.tolerances;
        let b = body.bounds();
        let p = platform.rect;

        if body.velocity.y >= 0.0
            && b.bottom() <= p.top() + tol.landing_below
            && b.bottom() >= p.top() - tol.landing_above
            && b.right() > p.left() + tol.landing_edge_margin
            && b.left() < p.right() - tol.landing_edge_margin
        {
            body.set_bottom(p.top());
            body.velocity.y = 0.0;
            return true;
        }

        if platform.kind != PlatformKind::Solid || !b.overlaps(&p) {
            return false;
        }

        let pen = b.penetration(&p);
        if body.velocity.y < 0.0 {
            // A rising body never lands; it hits a side or the underside.
            if pen.min_horizontal() < pen.bottom {
                push_sideways(body, &p, pen.left < pen.right);
            } else {
                body.position.y = p.bottom();
                body.velocity.y = 0.0;
            }
            return false;
        }
        if pen.min_horizontal() < pen.min_vertical() && pen.top > tol.solid_side_depth {
            push_sideways(body, &p, pen.left < pen.right);
            return false;
        }
        if pen.top <= pen.bottom {
            body.set_bottom(p.top());
            body.velocity.y = 0.0;
            true
        } else {
            body.position.y = p.bottom();
            false
        }
    }
}

/// Pushes `body` out of `solid` along the axis of least penetration.
///
/// Exactly diagonal approaches may resolve on the "wrong" axis; that is
/// accepted behavior of the min-overlap rule.
pub fn push_out<S: Solid>(body: &mut Body, solid: &S) -> PushOut {
    let rect = solid.bounds();
    if !solid.is_solid() || !body.overlaps_rect(&rect) {
        return PushOut::Clear;
    }
    let pen = body.bounds().penetration(&rect);
    if pen.min_horizontal() < pen.min_vertical() {
        push_sideways(body, &rect, pen.left < pen.right);
        PushOut::Sideways
    } else if pen.top < pen.bottom {
        body.set_bottom(rect.top());
        body.velocity.y = 0.0;
        PushOut::Landed
    } else {
        body.position.y = rect.bottom();
        body.velocity.y = 0.0;
        PushOut::Ceiling
    }
}

fn push_sideways(body: &mut Body, rect: &Rect, to_left: bool) {
    body.position.x = if to_left {
        rect.left() - body.size.x
    } else {
        rect.right()
    };
    body.velocity.x = 0.0;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::{Cover, Slope, SlopeDirection};
    use frontline_common::{EntityId, Vec2};
    use proptest::prelude::*;

    const GROUND: f32 = 550.0;

    fn crate_at(x: f32, size: f32) -> Cover {
        Cover::new(EntityId::from_raw(9), Rect::new(x, GROUND - size, size, size))
    }

    #[test]
    fn test_ground_snap() {
        let terrain = Terrain::flat(GROUND);
        let resolver = TerrainResolver::new(&terrain, Tolerances::default());
        let mut body = Body::new(100.0, 510.0, 30.0, 50.0).with_velocity(Vec2::new(0.0, 5.0));
        assert!(resolver.resolve(&mut body));
        assert_eq!(body.bottom(), GROUND);
        assert_eq!(body.velocity.y, 0.0);
    }

    #[test]
    fn test_airborne_is_not_grounded() {
        let terrain = Terrain::flat(GROUND);
        let resolver = TerrainResolver::new(&terrain, Tolerances::default());
        let mut body = Body::new(100.0, 300.0, 30.0, 50.0);
        assert!(!resolver.resolve(&mut body));
        assert_eq!(body.position.y, 300.0);
    }

    #[test]
    fn test_slope_overrides_ground() {
        // Surface under center x=150 is at 550 - 0.5*50 = 525
        let terrain = Terrain::flat(GROUND)
            .with_slope(Slope::new(Rect::new(100.0, 500.0, 100.0, 50.0), SlopeDirection::Up));
        let resolver = TerrainResolver::new(&terrain, Tolerances::default());
        let mut body = Body::new(135.0, 478.0, 30.0, 50.0).with_velocity(Vec2::new(0.0, 1.0));
        assert!(resolver.resolve(&mut body));
        assert_eq!(body.bottom(), 525.0);
    }

    #[test]
    fn test_rising_body_ignores_slope() {
        let terrain = Terrain::flat(GROUND)
            .with_slope(Slope::new(Rect::new(100.0, 500.0, 100.0, 50.0), SlopeDirection::Up));
        let resolver = TerrainResolver::new(&terrain, Tolerances::default());
        let mut body = Body::new(135.0, 477.0, 30.0, 50.0).with_velocity(Vec2::new(0.0, -12.0));
        assert!(!resolver.resolve(&mut body));
        assert_eq!(body.position.y, 477.0);
    }

    #[test]
    fn test_passthrough_catches_falling_body() {
        let terrain = Terrain::flat(GROUND).with_platform(Platform::new(
            Rect::new(100.0, 450.0, 200.0, 20.0),
            PlatformKind::Passthrough,
        ));
        let resolver = TerrainResolver::new(&terrain, Tolerances::default());
        let mut body = Body::new(150.0, 404.0, 30.0, 50.0).with_velocity(Vec2::new(0.0, 3.0));
        assert!(resolver.resolve(&mut body));
        assert_eq!(body.bottom(), 450.0);
    }

    #[test]
    fn test_passthrough_lets_rising_body_through() {
        let terrain = Terrain::flat(GROUND).with_platform(Platform::new(
            Rect::new(100.0, 450.0, 200.0, 20.0),
            PlatformKind::Passthrough,
        ));
        let resolver = TerrainResolver::new(&terrain, Tolerances::default());
        let mut body = Body::new(150.0, 430.0, 30.0, 50.0).with_velocity(Vec2::new(0.0, -8.0));
        assert!(!resolver.resolve(&mut body));
        assert_eq!(body.position.y, 430.0);
    }

    #[test]
    fn test_solid_platform_blocks_sideways() {
        let terrain = Terrain::flat(GROUND).with_platform(Platform::new(
            Rect::new(200.0, 470.0, 200.0, 80.0),
            PlatformKind::Solid,
        ));
        let resolver = TerrainResolver::new(&terrain, Tolerances::default());
        let mut body = Body::new(175.0, 500.0, 30.0, 50.0).with_velocity(Vec2::new(4.0, 0.0));
        resolver.resolve(&mut body);
        assert_eq!(body.position.x, 170.0);
        assert_eq!(body.velocity.x, 0.0);
    }

    #[test]
    fn test_solid_platform_head_bonk() {
        let terrain = Terrain::flat(GROUND).with_platform(Platform::new(
            Rect::new(100.0, 400.0, 200.0, 20.0),
            PlatformKind::Solid,
        ));
        let resolver = TerrainResolver::new(&terrain, Tolerances::default());
        let mut body = Body::new(150.0, 410.0, 30.0, 50.0).with_velocity(Vec2::new(0.0, -10.0));
        assert!(!resolver.resolve(&mut body));
        assert_eq!(body.position.y, 420.0);
        assert_eq!(body.velocity.y, 0.0);
    }

    #[test]
    fn test_solid_platform_pushes_embedded_body_below() {
        let platform = Rect::new(50.0, 470.0, 200.0, 20.0);
        let terrain = Terrain::flat(GROUND).with_platform(Platform::new(platform, PlatformKind::Solid));
        let resolver = TerrainResolver::new(&terrain, Tolerances::default());
        let mut body = Body::new(100.0, 485.0, 30.0, 50.0).with_velocity(Vec2::new(0.0, 0.6));
        assert!(!resolver.resolve(&mut body));
        assert!(!body.bounds().overlaps(&platform));
        assert_eq!(body.position.y, 490.0);
    }

    fn jump_under_solid_platform(delta_ms: f32) {
        let config = SimConfig::default();
        let platform = Rect::new(50.0, 430.0, 280.0, 30.0);
        let terrain = Terrain::flat(GROUND).with_platform(Platform::new(platform, PlatformKind::Solid));
        let resolver = TerrainResolver::new(&terrain, Tolerances::from(&config));
        let dt_scale = config.dt_scale(f64::from(delta_ms));

        let mut body = Body::new(100.0, GROUND - 50.0, 30.0, 50.0).with_velocity(Vec2::new(0.0, -12.0));
        let mut bonked = false;
        for _ in 0..40 {
            body.apply_gravity(config.gravity, dt_scale);
            body.integrate(dt_scale);
            let grounded = resolver.resolve(&mut body);
            bonked |= body.position.y == platform.bottom();
            assert!(!body.bounds().overlaps(&platform), "inside platform at {:?}", body.position);
            assert!(body.bottom() > platform.top(), "ended up on top at {:?}", body.position);
            if grounded {
                assert_eq!(body.bottom(), GROUND);
            }
        }
        assert!(bonked);
        assert_eq!(body.bottom(), GROUND);
    }

    #[test]
    fn test_jump_into_solid_platform_at_50ms() {
        jump_under_solid_platform(50.0);
    }

    #[test]
    fn test_jump_into_solid_platform_at_100ms() {
        jump_under_solid_platform(100.0);
    }

    #[test]
    fn test_rising_body_beside_solid_platform_is_pushed_sideways() {
        let platform = Rect::new(200.0, 400.0, 200.0, 80.0);
        let terrain = Terrain::flat(GROUND).with_platform(Platform::new(platform, PlatformKind::Solid));
        let resolver = TerrainResolver::new(&terrain, Tolerances::default());
        let mut body = Body::new(174.0, 420.0, 30.0, 50.0).with_velocity(Vec2::new(4.0, -6.0));
        assert!(!resolver.resolve(&mut body));
        assert_eq!(body.position.x, 170.0);
        assert_eq!(body.position.y, 420.0);
    }

    #[test]
    fn test_cover_push_out_sideways() {
        let cover = crate_at(300.0, 40.0);
        let mut body = Body::new(275.0, 500.0, 30.0, 50.0);
        assert_eq!(push_out(&mut body, &cover), PushOut::Sideways);
        assert_eq!(body.position.x, 270.0);
    }

    #[test]
    fn test_cover_landing() {
        let cover = crate_at(300.0, 40.0);
        let mut body = Body::new(305.0, 462.0, 30.0, 50.0).with_velocity(Vec2::new(0.0, 4.0));
        assert_eq!(push_out(&mut body, &cover), PushOut::Landed);
        assert_eq!(body.bottom(), 510.0);
        assert_eq!(body.velocity.y, 0.0);
    }

    #[test]
    fn test_destroyed_cover_is_not_solid() {
        let mut cover = crate_at(300.0, 40.0);
        cover.take_damage(1000.0);
        let mut body = Body::new(310.0, 500.0, 30.0, 50.0);
        assert_eq!(push_out(&mut body, &cover), PushOut::Clear);
        assert_eq!(body.position.x, 310.0);
    }

    proptest! {
        #[test]
        fn prop_push_out_is_idempotent(
            x in 150i32..450, y in 420i32..560,
            cx in 250i32..350, size in 20i32..60,
        ) {
            let cover = crate_at(cx as f32, size as f32);
            let mut body = Body::new(x as f32, y as f32, 30.0, 50.0);
            push_out(&mut body, &cover);
            let after_first = body.position;
            let second = push_out(&mut body, &cover);
            prop_assert_eq!(second, PushOut::Clear);
            prop_assert_eq!(body.position, after_first);
        }
    }
}

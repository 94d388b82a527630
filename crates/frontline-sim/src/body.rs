//! Positional state shared by every simulated object.

use frontline_common::{Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Position, size, velocity and liveness of a simulated object.
///
/// Velocity is expressed in units per reference frame and integrated with the
/// frame's `dt_scale`. An inactive body takes no further part in collision or
/// AI passes and is removed at the end of the frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Body {
    /// Top-left corner
    pub position: Vec2,
    /// Width and height
    pub size: Vec2,
    /// Units per reference frame
    pub velocity: Vec2,
    /// False once destroyed
    pub active: bool,
}

impl Body {
    /// Creates an active, motionless body.
    #[must_use]
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            position: Vec2::new(x, y),
            size: Vec2::new(width, height),
            velocity: Vec2::ZERO,
            active: true,
        }
    }

    /// Builder: sets the initial velocity.
    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    /// Bounding box `[x, x+w] × [y, y+h]`.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        Rect::from_pos_size(self.position, self.size)
    }

    /// Center of the bounding box.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        self.position + self.size * 0.5
    }

    /// Y of the bottom edge.
    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.position.y + self.size.y
    }

    /// Moves the body so its bottom edge sits at `y`.
    pub fn set_bottom(&mut self, y: f32) {
        self.position.y = y - self.size.y;
    }

    /// Changes the height while keeping the bottom edge in place.
    pub fn resize_height(&mut self, height: f32) {
        let bottom = self.bottom();
        self.size.y = height;
        self.set_bottom(bottom);
    }

    /// Strict overlap between two live bodies.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.active && other.active && self.bounds().overlaps(&other.bounds())
    }

    /// Strict overlap against a static rectangle.
    #[must_use]
    pub fn overlaps_rect(&self, rect: &Rect) -> bool {
        self.active && self.bounds().overlaps(rect)
    }

    /// Euclidean distance between centers.
    #[must_use]
    pub fn center_distance(&self, other: &Self) -> f32 {
        self.center().distance(other.center())
    }

    /// Applies gravity to the vertical velocity.
    pub fn apply_gravity(&mut self, gravity: f32, dt_scale: f32) {
        self.velocity.y += gravity * dt_scale;
    }

    /// Advances position by velocity; returns the displacement.
    pub fn integrate(&mut self, dt_scale: f32) -> Vec2 {
        let step = self.velocity * dt_scale;
        self.position += step;
        step
    }

    /// Keeps the body within `[0, world_width]` horizontally.
    pub fn clamp_to_world(&mut self, world_width: f32) {
        let max_x = (world_width - self.size.x).max(0.0);
        self.position.x = self.position.x.clamp(0.0, max_x);
    }

    /// Marks the body for removal.
    pub fn deactivate(&mut self) {
        self.active = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_bounds() {
        let body = Body::new(10.0, 20.0, 30.0, 50.0);
        let bounds = body.bounds();
        assert_eq!(bounds.right(), 40.0);
        assert_eq!(bounds.bottom(), 70.0);
        assert_eq!(body.center(), Vec2::new(25.0, 45.0));
    }

    #[test]
    fn test_inactive_never_overlaps() {
        let a = Body::new(0.0, 0.0, 10.0, 10.0);
        let mut b = Body::new(5.0, 5.0, 10.0, 10.0);
        assert!(a.overlaps(&b));
        b.deactivate();
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps_rect(&a.bounds()));
    }

    #[test]
    fn test_integrate_scales_with_dt() {
        let mut body = Body::new(0.0, 0.0, 1.0, 1.0).with_velocity(Vec2::new(4.0, -2.0));
        let step = body.integrate(0.5);
        assert_eq!(step, Vec2::new(2.0, -1.0));
        assert_eq!(body.position, Vec2::new(2.0, -1.0));
    }

    #[test]
    fn test_gravity_and_clamp() {
        let mut body = Body::new(2990.0, 0.0, 30.0, 50.0);
        body.apply_gravity(0.6, 2.0);
        assert!((body.velocity.y - 1.2).abs() < 1e-6);
        body.clamp_to_world(3000.0);
        assert_eq!(body.position.x, 2970.0);
    }

    #[test]
    fn test_resize_keeps_feet() {
        let mut body = Body::new(0.0, 500.0, 30.0, 50.0);
        body.resize_height(30.0);
        assert_eq!(body.bottom(), 550.0);
        assert_eq!(body.position.y, 520.0);
    }
}

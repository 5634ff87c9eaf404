//! Axis-aligned rectangle geometry
//!
//! Rooms, triggers, the player collider and footprint bounds are all AABBs in
//! world pixels, y pointing down. Intersection is inclusive: rectangles that
//! only share an edge still intersect, so a point sitting on a room border
//! resolves to a room.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::lerp;

/// An axis-aligned rectangle (top-left origin)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const ZERO: Rect = Rect::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle of `size` centred on `center`
    pub fn from_center(center: Vec2, size: Vec2) -> Self {
        Self::new(center.x - size.x / 2.0, center.y - size.y / 2.0, size.x, size.y)
    }

    /// 1x1 rectangle at a point
    pub fn point(p: Vec2) -> Self {
        Self::new(p.x, p.y, 1.0, 1.0)
    }

    #[inline]
    pub fn top_left(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Degenerate rectangles never intersect anything
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Inclusive overlap test
    pub fn intersects(&self, other: &Rect) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        !(self.right() < other.x
            || self.bottom() < other.y
            || self.x > other.right()
            || self.y > other.bottom())
    }

    /// Clamp a point into this rectangle
    pub fn clamp_point(&self, p: Vec2) -> Vec2 {
        Vec2::new(
            p.x.clamp(self.x, self.right().max(self.x)),
            p.y.clamp(self.y, self.bottom().max(self.y)),
        )
    }

    /// Same rectangle moved by `offset`
    pub fn translated(&self, offset: Vec2) -> Self {
        Self::new(self.x + offset.x, self.y + offset.y, self.width, self.height)
    }

    /// Component-wise interpolation (camera bound easing)
    pub fn lerp(&self, to: &Rect, t: f32) -> Self {
        Self::new(
            lerp(self.x, to.x, t),
            lerp(self.y, to.y, t),
            lerp(self.width, to.width, t),
            lerp(self.height, to.height, t),
        )
    }
}

/// Circle vs rectangle overlap (hazard collision volume vs player collider)
pub fn circle_intersects_rect(center: Vec2, radius: f32, rect: &Rect) -> bool {
    if rect.is_empty() || radius <= 0.0 {
        return false;
    }
    let closest = Vec2::new(
        center.x.clamp(rect.x, rect.right()),
        center.y.clamp(rect.y, rect.bottom()),
    );
    closest.distance_squared(center) <= radius * radius
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intersects_overlap_and_separation() {
        let a = Rect::new(0.0, 0.0, 100.0, 100.0);
        assert!(a.intersects(&Rect::new(50.0, 50.0, 100.0, 100.0)));
        assert!(!a.intersects(&Rect::new(150.0, 0.0, 10.0, 10.0)));
        assert!(!a.intersects(&Rect::new(0.0, 101.0, 10.0, 10.0)));
    }

    #[test]
    fn test_intersects_shared_edge() {
        let a = Rect::new(0.0, 0.0, 100.0, 100.0);
        let b = Rect::new(100.0, 0.0, 100.0, 100.0);
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
    }

    #[test]
    fn test_degenerate_never_intersects() {
        let a = Rect::new(0.0, 0.0, 100.0, 100.0);
        assert!(!a.intersects(&Rect::ZERO));
        assert!(!Rect::new(10.0, 10.0, 0.0, 5.0).intersects(&a));
    }

    #[test]
    fn test_from_center_and_clamp() {
        let r = Rect::from_center(Vec2::new(50.0, 50.0), Vec2::new(20.0, 10.0));
        assert_eq!(r, Rect::new(40.0, 45.0, 20.0, 10.0));
        assert_eq!(r.center(), Vec2::new(50.0, 50.0));

        let bounds = Rect::new(0.0, 0.0, 100.0, 100.0);
        assert_eq!(bounds.clamp_point(Vec2::new(-5.0, 150.0)), Vec2::new(0.0, 100.0));
    }

    #[test]
    fn test_circle_rect() {
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(circle_intersects_rect(Vec2::new(15.0, 5.0), 5.0, &r));
        assert!(!circle_intersects_rect(Vec2::new(16.0, 16.0), 5.0, &r));
        assert!(circle_intersects_rect(Vec2::new(5.0, 5.0), 1.0, &r));
    }

    #[test]
    fn test_lerp_halfway() {
        let a = Rect::ZERO;
        let b = Rect::new(200.0, 100.0, 400.0, 300.0);
        assert_eq!(a.lerp(&b, 0.5), Rect::new(100.0, 50.0, 200.0, 150.0));
    }
}

//! Axis-aligned bounding box geometry
//!
//! World space is screen-like: `pos` is the top-left corner and +y points
//! down, so "above" means a smaller y.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Overlaps thinner than this are treated as touching, not penetrating.
/// Keeps exact push-outs from re-triggering on float rounding.
pub const OVERLAP_EPSILON: f32 = 1e-3;

/// An axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    /// Top-left corner
    pub pos: Vec2,
    /// Width and height
    pub size: Vec2,
}

impl Aabb {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            pos: Vec2::new(x, y),
            size: Vec2::new(width.max(0.0), height.max(0.0)),
        }
    }

    /// Box of the given size centered on `center`
    pub fn from_center(center: Vec2, size: Vec2) -> Self {
        Self {
            pos: center - size / 2.0,
            size: size.max(Vec2::ZERO),
        }
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.pos.x
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.pos.x + self.size.x
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.pos.y
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.pos.y + self.size.y
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.pos + self.size / 2.0
    }

    /// Penetration depth along each axis, if the boxes actually overlap.
    ///
    /// Each component is the smaller of the two ways out along that axis.
    pub fn penetration(&self, other: &Aabb) -> Option<Vec2> {
        let x = (self.right() - other.left()).min(other.right() - self.left());
        let y = (self.bottom() - other.top()).min(other.bottom() - self.top());
        if x > OVERLAP_EPSILON && y > OVERLAP_EPSILON {
            Some(Vec2::new(x, y))
        } else {
            None
        }
    }

    /// True if the boxes overlap by more than a rounding sliver
    #[inline]
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.penetration(other).is_some()
    }

    /// Keep the box inside `[0, bounds]` on both axes.
    ///
    /// Returns which sides were hit as `(min_x, max_x, min_y, max_y)`.
    /// A box larger than the world is pinned to the origin on that axis.
    pub fn clamp_within(&mut self, bounds: Vec2) -> [bool; 4] {
        let mut hit = [false; 4];
        let max = (bounds - self.size).max(Vec2::ZERO);

        if self.pos.x < 0.0 {
            self.pos.x = 0.0;
            hit[0] = true;
        } else if self.pos.x > max.x {
            self.pos.x = max.x;
            hit[1] = true;
        }

        if self.pos.y < 0.0 {
            self.pos.y = 0.0;
            hit[2] = true;
        } else if self.pos.y > max.y {
            self.pos.y = max.y;
            hit[3] = true;
        }

        hit
    }

    pub fn is_finite(&self) -> bool {
        self.pos.is_finite() && self.size.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edges_and_center() {
        let b = Aabb::new(10.0, 20.0, 30.0, 40.0);
        assert_eq!(b.left(), 10.0);
        assert_eq!(b.right(), 40.0);
        assert_eq!(b.top(), 20.0);
        assert_eq!(b.bottom(), 60.0);
        assert_eq!(b.center(), Vec2::new(25.0, 40.0));
    }

    #[test]
    fn test_touching_boxes_do_not_overlap() {
        let a = Aabb::new(0.0, 0.0, 10.0, 10.0);
        let b = Aabb::new(10.0, 0.0, 10.0, 10.0);
        assert!(!a.overlaps(&b));
        assert!(a.penetration(&b).is_none());
    }

    #[test]
    fn test_penetration_depths() {
        let a = Aabb::new(0.0, 0.0, 10.0, 10.0);
        let b = Aabb::new(8.0, 5.0, 10.0, 10.0);
        let pen = a.penetration(&b).expect("boxes overlap");
        assert!((pen.x - 2.0).abs() < 1e-5);
        assert!((pen.y - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_clamp_within_world() {
        let mut b = Aabb::new(-5.0, 595.0, 20.0, 20.0);
        let hit = b.clamp_within(Vec2::new(800.0, 600.0));
        assert_eq!(b.pos, Vec2::new(0.0, 580.0));
        assert_eq!(hit, [true, false, false, true]);
    }

    #[test]
    fn test_oversized_box_pins_to_origin() {
        let mut b = Aabb::new(50.0, 50.0, 900.0, 10.0);
        b.clamp_within(Vec2::new(800.0, 600.0));
        assert_eq!(b.pos.x, 0.0);
        assert_eq!(b.pos.y, 50.0);
    }

    #[test]
    fn test_from_center() {
        let b = Aabb::from_center(Vec2::new(50.0, 50.0), Vec2::new(20.0, 10.0));
        assert_eq!(b.pos, Vec2::new(40.0, 45.0));
        assert_eq!(b.center(), Vec2::new(50.0, 50.0));
    }
}

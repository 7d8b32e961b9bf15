//! Axis-aligned collision primitives
//!
//! Every entity is a square hitbox centered on its position; walls are
//! rectangles anchored at their top-left corner. Push-out always picks the
//! axis of minimum penetration.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// A wall rectangle (top-left anchored, y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    /// Strict overlap test against a centered square of side `size`
    pub fn overlaps_box(&self, center: Vec2, size: f32) -> bool {
        let half = size / 2.0;
        center.x + half > self.x
            && center.x - half < self.right()
            && center.y + half > self.y
            && center.y - half < self.bottom()
    }

    /// Penetration of a centered square into this rect, per side
    pub fn penetration(&self, center: Vec2, half: f32) -> Penetration {
        Penetration {
            left: (center.x + half) - self.x,
            right: self.right() - (center.x - half),
            top: (center.y + half) - self.y,
            bottom: self.bottom() - (center.y - half),
        }
    }
}

/// Side a box must be pushed out through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
    Top,
    Bottom,
}

impl Side {
    pub fn is_horizontal(self) -> bool {
        matches!(self, Side::Left | Side::Right)
    }
}

/// Overlap depth of a box into a wall through each of the wall's faces
#[derive(Debug, Clone, Copy)]
pub struct Penetration {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl Penetration {
    /// Shallowest side; ties resolve left, right, top, bottom
    pub fn min_side(&self) -> (Side, f32) {
        let min = self.left.min(self.right).min(self.top).min(self.bottom);
        if min == self.left {
            (Side::Left, self.left)
        } else if min == self.right {
            (Side::Right, self.right)
        } else if min == self.top {
            (Side::Top, self.top)
        } else {
            (Side::Bottom, self.bottom)
        }
    }

    /// Offset that moves the box out of the wall along the shallowest side
    pub fn push_out(&self) -> (Side, Vec2) {
        let (side, depth) = self.min_side();
        let offset = match side {
            Side::Left => Vec2::new(-depth, 0.0),
            Side::Right => Vec2::new(depth, 0.0),
            Side::Top => Vec2::new(0.0, -depth),
            Side::Bottom => Vec2::new(0.0, depth),
        };
        (side, offset)
    }
}

/// Square vs square overlap for two centered hitboxes
#[inline]
pub fn boxes_overlap(a: Vec2, a_size: f32, b: Vec2, b_size: f32) -> bool {
    let (ha, hb) = (a_size / 2.0, b_size / 2.0);
    a.x - ha < b.x + hb && a.x + ha > b.x - hb && a.y - ha < b.y + hb && a.y + ha > b.y - hb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boxes_overlap_edges_are_exclusive() {
        // Touching edges do not overlap
        assert!(!boxes_overlap(Vec2::ZERO, 10.0, Vec2::new(10.0, 0.0), 10.0));
        assert!(boxes_overlap(Vec2::ZERO, 10.0, Vec2::new(9.9, 0.0), 10.0));
        assert!(!boxes_overlap(Vec2::ZERO, 10.0, Vec2::new(5.0, 20.0), 10.0));
    }

    #[test]
    fn test_rect_overlaps_box() {
        let wall = Rect::new(100.0, 100.0, 50.0, 50.0);
        assert!(wall.overlaps_box(Vec2::new(95.0, 120.0), 20.0));
        assert!(!wall.overlaps_box(Vec2::new(90.0, 120.0), 20.0));
        assert!(!wall.overlaps_box(Vec2::new(125.0, 160.0), 20.0));
    }

    #[test]
    fn test_push_out_picks_shallowest_side() {
        let wall = Rect::new(0.0, 0.0, 100.0, 100.0);
        // Box poking 4 units into the left face
        let pen = wall.penetration(Vec2::new(-6.0, 50.0), 10.0);
        let (side, offset) = pen.push_out();
        assert_eq!(side, Side::Left);
        assert!((offset.x + 4.0).abs() < 1e-4);
        assert_eq!(offset.y, 0.0);

        // Box poking 3 units through the bottom face
        let pen = wall.penetration(Vec2::new(50.0, 107.0), 10.0);
        let (side, offset) = pen.push_out();
        assert_eq!(side, Side::Bottom);
        assert!((offset.y - 3.0).abs() < 1e-4);
    }

    #[test]
    fn test_push_out_tie_prefers_horizontal() {
        let wall = Rect::new(0.0, 0.0, 100.0, 100.0);
        // Corner overlap with equal depth on left and top
        let pen = wall.penetration(Vec2::new(-5.0, -5.0), 10.0);
        assert_eq!(pen.min_side().0, Side::Left);
        // Equal right and bottom
        let pen = wall.penetration(Vec2::new(105.0, 105.0), 10.0);
        assert_eq!(pen.min_side().0, Side::Right);
    }
}

//! Integer rectangles and floating entity boxes
//!
//! `Rect` is the pixel-aligned box used for collision resolution. Edges are
//! half-open: a rect covers `x..x + w` horizontally and `y..y + h` vertically,
//! so `right()` and `bottom()` are the first pixel outside it.

use glam::{IVec2, Vec2};
use serde::{Deserialize, Serialize};

/// Axis-aligned integer rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    #[inline]
    pub fn left(&self) -> i32 {
        self.x
    }

    #[inline]
    pub fn right(&self) -> i32 {
        self.x + self.w
    }

    #[inline]
    pub fn top(&self) -> i32 {
        self.y
    }

    #[inline]
    pub fn bottom(&self) -> i32 {
        self.y + self.h
    }

    #[inline]
    pub fn center_x(&self) -> i32 {
        self.x + self.w / 2
    }

    #[inline]
    pub fn center_y(&self) -> i32 {
        self.y + self.h / 2
    }

    pub fn mid_top(&self) -> IVec2 {
        IVec2::new(self.center_x(), self.top())
    }

    pub fn mid_bottom(&self) -> IVec2 {
        IVec2::new(self.center_x(), self.bottom())
    }

    pub fn mid_left(&self) -> IVec2 {
        IVec2::new(self.left(), self.center_y())
    }

    pub fn mid_right(&self) -> IVec2 {
        IVec2::new(self.right(), self.center_y())
    }

    /// Move so the right edge sits at `right`
    pub fn set_right(&mut self, right: i32) {
        self.x = right - self.w;
    }

    pub fn set_left(&mut self, left: i32) {
        self.x = left;
    }

    pub fn set_top(&mut self, top: i32) {
        self.y = top;
    }

    /// Move so the bottom edge sits at `bottom`
    pub fn set_bottom(&mut self, bottom: i32) {
        self.y = bottom - self.h;
    }

    /// Half-open point containment
    pub fn contains_point(&self, p: IVec2) -> bool {
        p.x >= self.left() && p.x < self.right() && p.y >= self.top() && p.y < self.bottom()
    }

    /// Whether the interiors of two rects overlap (touching edges do not count)
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.left() < other.right()
            && other.left() < self.right()
            && self.top() < other.bottom()
            && other.top() < self.bottom()
    }
}

/// Continuous entity box `(x, y, w, h)` used for spatial queries
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EntityBox {
    pub pos: Vec2,
    pub size: Vec2,
}

impl EntityBox {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            pos: Vec2::new(x, y),
            size: Vec2::new(w, h),
        }
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.pos.x + self.size.x
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.pos.y + self.size.y
    }

    #[inline]
    pub fn center_x(&self) -> f32 {
        self.pos.x + self.size.x / 2.0
    }
}

//! Axis-aligned rigid body stepped against candidate solid rects
//!
//! Bodies know nothing about tiles: the caller hands `step` the rects it
//! should collide with (usually from `TileWorld::collisions_in`).
//!
//! Each step integrates position, classifies every candidate by which of the
//! body's edge midpoints it contains, snaps the body flush against it on that
//! axis, then applies gravity. Axes are resolved independently; a body moving
//! fast enough to skip a whole tile in one tick can pass through it.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::rect::{EntityBox, Rect};
use crate::settings::BodyTuning;
use crate::trunc_to_i32;

/// Sides of the body touching an obstacle after the latest step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Contacts {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl Contacts {
    pub fn horizontal(&self) -> bool {
        self.left || self.right
    }

    pub fn vertical(&self) -> bool {
        self.up || self.down
    }
}

/// Anything the fixed-step loop can move through the world
pub trait SimBody {
    /// Current `(x, y, w, h)`
    fn bounds(&self) -> EntityBox;

    /// Current `(vx, vy)`
    fn velocity(&self) -> Vec2;

    /// Advance one tick against the given obstacles
    fn step(&mut self, candidates: &[Rect]);
}

/// Kinematic box with per-axis collision response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RigidBody2D {
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: Vec2,
    /// Multiplier on the per-tick gravity step
    pub gravity_scale: f32,
    pub tuning: BodyTuning,
    rect: Rect,
    contacts: Contacts,
}

impl RigidBody2D {
    pub fn new(pos: Vec2, size: Vec2, tuning: BodyTuning) -> Self {
        let mut body = Self {
            pos,
            vel: Vec2::ZERO,
            size,
            gravity_scale: 1.0,
            tuning,
            rect: Rect::default(),
            contacts: Contacts::default(),
        };
        body.sync_rect();
        body
    }

    /// Pixel box; always the truncation of the continuous position
    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn contacts(&self) -> Contacts {
        self.contacts
    }

    pub fn is_grounded(&self) -> bool {
        self.contacts.down
    }

    /// Teleport without touching velocity
    pub fn set_pos(&mut self, pos: Vec2) {
        self.pos = pos;
        self.sync_rect();
    }

    fn sync_rect(&mut self) {
        self.rect = Rect::new(
            trunc_to_i32(self.pos.x),
            trunc_to_i32(self.pos.y),
            trunc_to_i32(self.size.x),
            trunc_to_i32(self.size.y),
        );
    }

    /// Integrate, resolve collisions against `candidates`, then apply gravity
    pub fn move_by_velocity(&mut self, candidates: &[Rect]) {
        self.pos += self.vel;
        self.sync_rect();
        self.contacts = Contacts::default();

        let (vertical, horizontal) = self.classify(candidates);

        for obstacle in &horizontal {
            if self.rect.center_x() < obstacle.center_x() {
                self.rect.set_right(obstacle.left());
                self.contacts.right = true;
            } else {
                self.rect.set_left(obstacle.right());
                self.contacts.left = true;
            }
        }

        for obstacle in &vertical {
            if self.vel.y < 0.0 {
                // Only cap an ascent when the body is fully past the ledge
                if self.rect.bottom() >= obstacle.bottom() {
                    self.rect.set_top(obstacle.bottom());
                    self.contacts.up = true;
                }
            } else if self.vel.y > 0.0 {
                self.rect.set_bottom(obstacle.top());
                self.contacts.down = true;
            }
        }

        if self.contacts.horizontal() {
            self.pos.x = self.rect.x as f32;
        }
        if self.contacts.vertical() {
            self.pos.y = self.rect.y as f32;
        }

        self.apply_gravity();
    }

    /// Split candidates into (vertical, horizontal) contacts by edge midpoint.
    /// Vertical wins when a rect holds both kinds of midpoint.
    fn classify(&self, candidates: &[Rect]) -> (Vec<Rect>, Vec<Rect>) {
        let mut vertical = Vec::new();
        let mut horizontal = Vec::new();
        for obstacle in candidates {
            if obstacle.contains_point(self.rect.mid_bottom())
                || obstacle.contains_point(self.rect.mid_top())
            {
                vertical.push(*obstacle);
            } else if obstacle.contains_point(self.rect.mid_left())
                || obstacle.contains_point(self.rect.mid_right())
            {
                horizontal.push(*obstacle);
            }
        }
        (vertical, horizontal)
    }

    /// Grounded bodies restart from zero; the gravity step is still added so a
    /// resting body keeps pressing into the floor and stays grounded next tick.
    fn apply_gravity(&mut self) {
        if self.contacts.down {
            self.vel.y = 0.0;
        }
        let step = self.tuning.gravity_step * self.gravity_scale;
        self.vel.y = (self.vel.y + step).min(self.tuning.max_fall_speed);
    }
}

impl SimBody for RigidBody2D {
    fn bounds(&self) -> EntityBox {
        EntityBox {
            pos: self.pos,
            size: self.size,
        }
    }

    fn velocity(&self) -> Vec2 {
        self.vel
    }

    fn step(&mut self, candidates: &[Rect]) {
        self.move_by_velocity(candidates);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{EMPTY_TILE, SOLID_TILE};
    use crate::settings::WorldTuning;
    use crate::sim::tiles::TileWorld;
    use proptest::prelude::*;

    fn body_at(x: f32, y: f32, w: f32, h: f32) -> RigidBody2D {
        RigidBody2D::new(Vec2::new(x, y), Vec2::new(w, h), BodyTuning::default())
    }

    #[test]
    fn test_example_scenario_hits_right_wall() {
        let mut row = vec![EMPTY_TILE; 10];
        row[5] = SOLID_TILE;
        let world = TileWorld::from_rows(vec![row], &WorldTuning::default(), 0).unwrap();

        let mut body = body_at(4.0 * 16.0, 0.0, 16.0, 16.0);
        body.vel.x = 2.0;
        let candidates = world.collisions_in(&body.bounds());
        body.step(&candidates);

        assert!(body.contacts().right);
        assert_eq!(body.rect().right(), 5 * 16);
        assert_eq!(body.pos.x, 64.0);
    }

    #[test]
    fn test_lands_on_floor() {
        let floor = Rect::new(0, 32, 64, 16);
        let mut body = body_at(8.0, 14.0, 16.0, 16.0);
        body.vel.y = 4.0;
        body.step(&[floor]);

        assert!(body.contacts().down);
        assert_eq!(body.rect().bottom(), 32);
        assert_eq!(body.pos.y, 16.0);
        // velocity reset then one gravity step
        assert!((body.vel.y - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_resting_body_stays_grounded() {
        let floor = Rect::new(0, 32, 64, 16);
        let mut body = body_at(8.0, 16.0, 16.0, 16.0);
        body.vel.y = 0.2;
        for _ in 0..10 {
            body.step(&[floor]);
            assert!(body.is_grounded());
            assert_eq!(body.rect().bottom(), 32);
        }
    }

    #[test]
    fn test_hits_ceiling_when_rising() {
        let ceiling = Rect::new(0, 0, 64, 16);
        let mut body = body_at(8.0, 18.0, 16.0, 16.0);
        body.vel.y = -3.0;
        body.step(&[ceiling]);

        assert!(body.contacts().up);
        assert_eq!(body.rect().top(), 16);
        assert_eq!(body.pos.y, 16.0);
    }

    #[test]
    fn test_thin_ledge_does_not_cap_ascent_early() {
        // Ledge taller than the body: the body's bottom is still above the
        // ledge's bottom, so the ascent is not capped.
        let ledge = Rect::new(0, 0, 64, 64);
        let mut body = body_at(8.0, 20.0, 16.0, 16.0);
        body.vel.y = -3.0;
        body.step(&[ledge]);
        assert!(!body.contacts().up);
        assert_eq!(body.pos.y, 17.0);
    }

    #[test]
    fn test_hits_left_wall() {
        let wall = Rect::new(0, 0, 16, 64);
        let mut body = body_at(17.0, 10.0, 16.0, 16.0);
        body.vel.x = -2.0;
        body.step(&[wall]);

        assert!(body.contacts().left);
        assert_eq!(body.rect().left(), 16);
        assert_eq!(body.pos.x, 16.0);
    }

    #[test]
    fn test_contacts_reset_every_step() {
        let wall = Rect::new(32, 0, 16, 64);
        let mut body = body_at(14.0, 10.0, 16.0, 16.0);
        body.vel.x = 4.0;
        body.step(&[wall]);
        assert!(body.contacts().right);

        body.vel.x = -4.0;
        body.step(&[]);
        assert_eq!(body.contacts(), Contacts::default());
    }

    #[test]
    fn test_vertical_classification_wins() {
        // A block under the body's bottom midpoint that also reaches its side
        let block = Rect::new(0, 30, 64, 32);
        let mut body = body_at(8.0, 14.0, 16.0, 32.0);
        body.vel.y = 2.0;
        body.step(&[block]);
        assert!(body.contacts().down);
        assert!(!body.contacts().horizontal());
    }

    #[test]
    fn test_rect_tracks_truncated_position() {
        let mut body = body_at(0.0, 0.0, 16.0, 16.0);
        body.vel = Vec2::new(1.7, 0.0);
        body.step(&[]);
        assert_eq!(body.rect().x, 1);
        body.set_pos(Vec2::new(-3.9, 2.5));
        assert_eq!((body.rect().x, body.rect().y), (-3, 2));
    }

    #[test]
    fn test_gravity_scale() {
        let mut body = body_at(0.0, 0.0, 16.0, 16.0);
        body.gravity_scale = 2.0;
        body.step(&[]);
        assert!((body.vel.y - 0.4).abs() < 1e-6);
    }

    proptest! {
        #[test]
        fn prop_free_fall_never_exceeds_terminal_speed(ticks in 1usize..500) {
            let mut body = body_at(0.0, 0.0, 16.0, 32.0);
            let mut last = body.vel.y;
            for _ in 0..ticks {
                body.step(&[]);
                prop_assert!(body.vel.y <= 6.0);
                prop_assert!(body.vel.y >= last);
                last = body.vel.y;
            }
        }

        #[test]
        fn prop_horizontal_approach_never_penetrates(
            start in 0.0f32..30.0,
            speed in 0.5f32..8.0,
            from_left in any::<bool>(),
        ) {
            // Wall occupying x 48..64; body 16 px wide approaching on a row
            let wall = Rect::new(48, 0, 16, 64);
            let (x, vx) = if from_left {
                (48.0 - 16.0 - start * 0.1 - 0.01, speed)
            } else {
                (64.0 + start * 0.1 + 0.01, -speed)
            };
            let mut body = body_at(x, 16.0, 16.0, 16.0);
            body.vel.x = vx;
            body.gravity_scale = 0.0;
            for _ in 0..4 {
                body.step(&[wall]);
                prop_assert!(!body.rect().overlaps(&wall));
            }
        }

        #[test]
        fn prop_vertical_approach_never_penetrates(
            start in 0.0f32..4.0,
            speed in 0.5f32..8.0,
        ) {
            let floor = Rect::new(0, 64, 64, 16);
            let mut body = body_at(24.0, 64.0 - 16.0 - start - 0.01, 16.0, 16.0);
            body.vel.y = speed;
            for _ in 0..4 {
                body.step(&[floor]);
                prop_assert!(!body.rect().overlaps(&floor));
            }
        }
    }
}

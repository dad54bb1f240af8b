//! Player-controlled entity
//!
//! A player is a rigid body plus movement intent. Jumping is only allowed
//! from the ground; releasing jump mid-air arms a single double jump.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::body::{Contacts, RigidBody2D, SimBody};
use super::rect::{EntityBox, Rect};
use crate::consts::{PLAYER_HEIGHT, PLAYER_WIDTH};
use crate::settings::BodyTuning;

/// Held movement keys for the current tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MoveIntent {
    pub left: bool,
    pub right: bool,
    pub jump: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub body: RigidBody2D,
    pub intent: MoveIntent,
    /// Facing left (render hint)
    pub flipped: bool,
    /// Double jump available on the next jump press
    double_ready: bool,
    /// Grounded jump happened; waiting for jump release to arm the double jump
    double_waiting: bool,
}

impl Player {
    pub fn new(pos: Vec2, tuning: BodyTuning) -> Self {
        Self {
            body: RigidBody2D::new(pos, Vec2::new(PLAYER_WIDTH, PLAYER_HEIGHT), tuning),
            intent: MoveIntent::default(),
            flipped: false,
            double_ready: false,
            double_waiting: false,
        }
    }

    pub fn contacts(&self) -> Contacts {
        self.body.contacts()
    }

    /// Teleport to `pos` and stop
    pub fn respawn(&mut self, pos: Vec2) {
        self.body.set_pos(pos);
        self.body.vel = Vec2::ZERO;
        self.double_ready = false;
        self.double_waiting = false;
    }

    /// Turn the held keys into velocity for this tick
    pub fn apply_intent(&mut self) {
        if self.double_waiting && !self.intent.jump {
            self.double_ready = true;
        }
        if self.intent.jump {
            if self.double_ready {
                self.double_jump();
            } else {
                self.jump();
            }
        }

        let speed = self.body.tuning.move_speed;
        if self.intent.left {
            self.body.vel.x = -speed;
            self.flipped = true;
        } else if self.intent.right {
            self.body.vel.x = speed;
            self.flipped = false;
        } else {
            self.body.vel.x = 0.0;
        }
    }

    fn jump(&mut self) {
        if self.body.is_grounded() {
            self.body.vel.y = -self.body.tuning.jump_speed;
            self.double_waiting = true;
        }
    }

    fn double_jump(&mut self) {
        self.body.vel.y = -self.body.tuning.jump_speed;
        self.double_ready = false;
        self.double_waiting = false;
    }
}

impl SimBody for Player {
    fn bounds(&self) -> EntityBox {
        self.body.bounds()
    }

    fn velocity(&self) -> Vec2 {
        self.body.velocity()
    }

    fn step(&mut self, candidates: &[Rect]) {
        self.apply_intent();
        self.body.step(candidates);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grounded_player() -> (Player, Rect) {
        let floor = Rect::new(0, 64, 256, 16);
        let mut player = Player::new(Vec2::new(32.0, 31.0), BodyTuning::default());
        player.body.vel.y = 1.0;
        player.step(&[floor]);
        assert!(player.body.is_grounded());
        (player, floor)
    }

    #[test]
    fn test_walk_sets_horizontal_velocity() {
        let (mut player, floor) = grounded_player();
        player.intent.right = true;
        player.step(&[floor]);
        assert_eq!(player.velocity().x, 2.0);
        assert!(!player.flipped);

        player.intent = MoveIntent {
            left: true,
            ..Default::default()
        };
        player.step(&[floor]);
        assert_eq!(player.velocity().x, -2.0);
        assert!(player.flipped);

        player.intent = MoveIntent::default();
        player.step(&[floor]);
        assert_eq!(player.velocity().x, 0.0);
    }

    #[test]
    fn test_jump_only_from_ground() {
        let (mut player, floor) = grounded_player();
        player.intent.jump = true;
        player.step(&[floor]);
        assert!(player.velocity().y < 0.0);
        assert!(!player.body.is_grounded());

        // Holding jump in the air does nothing more
        let vy = player.velocity().y;
        player.step(&[floor]);
        assert!(player.velocity().y > vy);
    }

    #[test]
    fn test_double_jump_after_release() {
        let (mut player, floor) = grounded_player();
        player.intent.jump = true;
        player.step(&[floor]);
        player.intent.jump = false;
        player.step(&[floor]);
        player.step(&[floor]);
        let falling = player.velocity().y;

        player.intent.jump = true;
        player.step(&[floor]);
        // -3 then one gravity step
        assert!((player.velocity().y - (-2.8)).abs() < 1e-5);
        assert!(player.velocity().y < falling);

        // Only one double jump per grounded jump
        player.intent.jump = false;
        player.step(&[floor]);
        player.intent.jump = true;
        let vy = player.velocity().y;
        player.step(&[floor]);
        assert!(player.velocity().y > vy);
    }

    #[test]
    fn test_respawn_stops_body() {
        let (mut player, _) = grounded_player();
        player.body.vel = Vec2::new(2.0, 5.0);
        player.respawn(Vec2::new(200.0, 0.0));
        assert_eq!(player.bounds().pos, Vec2::new(200.0, 0.0));
        assert_eq!(player.velocity(), Vec2::ZERO);
    }
}

//! Fixed timestep simulation tick
//!
//! One call advances the scene by one frame: player movement against the
//! tiles, the fall-out respawn, the water reaction, then the cloth.

use super::body::SimBody;
use super::player::MoveIntent;
use super::state::Scene;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickInput {
    pub left: bool,
    pub right: bool,
    pub jump: bool,
}

/// Advance the scene by one fixed timestep
pub fn tick(scene: &mut Scene, input: &TickInput) {
    scene.player.intent = MoveIntent {
        left: input.left,
        right: input.right,
        jump: input.jump,
    };

    // Candidates come from where the player is before it moves
    let candidates = scene.world.collisions_in(&scene.player.bounds());
    scene.player.step(&candidates);

    if scene.player.bounds().pos.y > scene.world.floor_y() {
        log::info!(
            "Player fell out of the level at tick {}, respawning",
            scene.time_ticks
        );
        scene.player.respawn(scene.spawn);
    }

    let body = scene.player.bounds();
    let vel = scene.player.velocity();
    scene.water.run(&body, vel.y, vel.x);

    scene.cloth.update(&mut scene.rng);

    scene.time_ticks += 1;
}

//! Scene state
//!
//! Everything one running level needs between ticks. Randomness comes only
//! from the run seed, so two scenes built from the same level, settings and
//! seed stay identical under the same inputs.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::cloth::ClothMesh;
use super::player::Player;
use super::tiles::{TileGrid, TileWorld};
use super::water::WaveField;
use crate::consts::*;
use crate::error::Result;
use crate::settings::Settings;

/// Stream offset so wind draws don't mirror chunk generation
const WIND_STREAM: u64 = 0x9e37_79b9_7f4a_7c15;

/// One level in play
#[derive(Debug)]
pub struct Scene {
    /// Run seed for reproducibility
    pub seed: u64,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub settings: Settings,
    pub world: TileWorld,
    pub player: Player,
    /// Respawn point for the player
    pub spawn: Vec2,
    pub water: WaveField,
    pub cloth: ClothMesh,
    /// Source of cloth wind changes
    pub rng: Pcg32,
}

impl Scene {
    /// Build a scene around an authored level. Settings are validated first.
    pub fn new(level: TileGrid, settings: Settings, seed: u64) -> Result<Self> {
        settings.validate()?;

        let spawn = Vec2::new(SPAWN_X, SPAWN_Y);
        let scene = Self {
            seed,
            time_ticks: 0,
            world: TileWorld::new(level, &settings.world, seed),
            player: Player::new(spawn, settings.body.clone()),
            spawn,
            water: WaveField::new(WATER_LEFT, WATER_RIGHT, WATER_SURFACE_Y, settings.wave.clone()),
            cloth: ClothMesh::new(
                Vec2::new(CLOTH_X, CLOTH_Y),
                Vec2::new(CLOTH_WIDTH, CLOTH_HEIGHT),
                settings.cloth.clone(),
            ),
            rng: Pcg32::seed_from_u64(seed ^ WIND_STREAM),
            settings,
        };

        log::info!(
            "Scene ready: {}x{} tiles, seed {}",
            scene.world.grid().cols(),
            scene.world.grid().rows(),
            seed
        );
        Ok(scene)
    }
}

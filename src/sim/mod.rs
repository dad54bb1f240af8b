//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (row-major grids, keyed chunks)
//! - No rendering or platform dependencies

pub mod body;
pub mod cloth;
pub mod player;
pub mod rect;
pub mod state;
pub mod tick;
pub mod tiles;
pub mod water;

pub use body::{Contacts, RigidBody2D, SimBody};
pub use cloth::{ClothMesh, PointGrid};
pub use player::{MoveIntent, Player};
pub use rect::{EntityBox, Rect};
pub use state::Scene;
pub use tick::{TickInput, tick};
pub use tiles::{
    Chunk, ExposedSides, JitteredTerrain, Side, TerrainRule, ThresholdTerrain, TileGrid, TileWorld,
};
pub use water::{WaveField, WaveSample};

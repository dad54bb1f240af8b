//! Platformer core - simulation for a 2D tile-based side scroller
//!
//! Core modules:
//! - `sim`: Deterministic simulation (tile world, bodies, water, cloth, tick)
//! - `settings`: Data-driven tuning for every numeric constant
//! - `error`: Crate error type
//!
//! Rendering, input dispatch and level file formats live outside this crate.

pub mod error;
pub mod settings;
pub mod sim;

pub use error::{Result, SimError};
pub use settings::{BodyTuning, ClothTuning, Settings, WaveTuning, WorldTuning};

/// Simulation configuration constants
pub mod consts {
    /// Fixed simulation timestep (one tick per rendered frame at 60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 4;

    /// Unscaled view size; also the pixel size of one terrain chunk
    pub const VIEW_WIDTH: u32 = 480;
    pub const VIEW_HEIGHT: u32 = 272;

    /// Edge length of one tile in pixels
    pub const TILE_SIZE: i32 = 16;

    /// Tile codes
    pub const EMPTY_TILE: i32 = -1;
    pub const SOLID_TILE: i32 = 1;

    /// Player box
    pub const PLAYER_WIDTH: f32 = 16.0;
    pub const PLAYER_HEIGHT: f32 = 32.0;

    /// Where the player enters the level and reappears after falling out
    pub const SPAWN_X: f32 = 200.0;
    pub const SPAWN_Y: f32 = 0.0;

    /// Water strip placement
    pub const WATER_LEFT: i32 = 200;
    pub const WATER_RIGHT: i32 = 300;
    pub const WATER_SURFACE_Y: f32 = 100.0;

    /// Cloth placement (top-left pin and pixel size)
    pub const CLOTH_X: f32 = 340.0;
    pub const CLOTH_Y: f32 = 40.0;
    pub const CLOTH_WIDTH: f32 = 40.0;
    pub const CLOTH_HEIGHT: f32 = 60.0;
}

/// Sign of a value, or `None` for zero (and NaN).
///
/// Impulse directions are picked from this, so a body at rest never
/// produces a direction.
#[inline]
pub fn direction_of(value: f32) -> Option<f32> {
    if value > 0.0 {
        Some(1.0)
    } else if value < 0.0 {
        Some(-1.0)
    } else {
        None
    }
}

/// Truncate toward zero, matching how continuous positions map onto pixels.
#[inline]
pub fn trunc_to_i32(value: f32) -> i32 {
    value.trunc() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_of() {
        assert_eq!(direction_of(3.5), Some(1.0));
        assert_eq!(direction_of(-0.1), Some(-1.0));
        assert_eq!(direction_of(0.0), None);
        assert_eq!(direction_of(-0.0), None);
        assert_eq!(direction_of(f32::NAN), None);
    }

    #[test]
    fn test_trunc_to_i32_rounds_toward_zero() {
        assert_eq!(trunc_to_i32(4.9), 4);
        assert_eq!(trunc_to_i32(-4.9), -4);
        assert_eq!(trunc_to_i32(0.2), 0);
    }
}

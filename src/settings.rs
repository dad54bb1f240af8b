//! Simulation tuning
//!
//! Every numeric constant the simulation uses lives here so tests and levels
//! can tighten or loosen behavior without code changes. Defaults reproduce the
//! shipped game feel.

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::{TILE_SIZE, VIEW_HEIGHT, VIEW_WIDTH};
use crate::error::{Result, SimError};

/// Tile world and chunk generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldTuning {
    /// Tile edge in pixels
    pub tile_size: i32,
    /// Chunk size in pixels (one screen)
    pub chunk_width: u32,
    pub chunk_height: u32,
    /// Fraction of a generated chunk's rows left open above the fill line
    pub open_fraction: f32,
    /// Open fraction used for the origin chunk (0, 0)
    pub origin_open_fraction: f32,
    /// Max rows the jittered terrain rule may move the fill line
    pub surface_jitter: u32,
}

impl Default for WorldTuning {
    fn default() -> Self {
        Self {
            tile_size: TILE_SIZE,
            chunk_width: VIEW_WIDTH,
            chunk_height: VIEW_HEIGHT,
            open_fraction: 0.6,
            origin_open_fraction: 0.7,
            surface_jitter: 2,
        }
    }
}

/// Rigid body integration and player movement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyTuning {
    /// Downward velocity added per tick (scaled by the body's gravity factor)
    pub gravity_step: f32,
    /// Terminal fall speed
    pub max_fall_speed: f32,
    /// Horizontal walk speed
    pub move_speed: f32,
    /// Upward speed of a jump
    pub jump_speed: f32,
}

impl Default for BodyTuning {
    fn default() -> Self {
        Self {
            gravity_step: 0.2,
            max_fall_speed: 6.0,
            move_speed: 2.0,
            jump_speed: 3.0,
        }
    }
}

/// Spring-chain water surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveTuning {
    /// Pull toward rest height
    pub tension: f32,
    /// Fraction of speed removed per tick
    pub dampening: f32,
    /// Fraction of height difference handed to each neighbor per pass
    pub spread: f32,
    /// Propagation passes per tick
    pub passes: u32,
    /// Horizontal pixels between samples
    pub sample_spacing: i32,
    /// Rest height of the surface inside the water strip
    pub rest_height: f32,
    /// Speed injected when a body crosses the surface
    pub impulse_speed: f32,
    /// Speed set on the sample ahead of a wading body
    pub ripple_speed: f32,
    /// Pixels ahead of the body center where the ripple lands
    pub ripple_lookahead: i32,
    /// A sample counts as near rest when |speed| is below this
    pub ripple_rest_band: f32,
    /// Vertical speed of a body resting on the ground; treated as "not moving"
    pub resting_body_speed: f32,
    /// Ticks after the last disturbance before the stop check runs
    pub quiescence_ticks: u32,
}

impl Default for WaveTuning {
    fn default() -> Self {
        Self {
            tension: 0.035,
            dampening: 0.02,
            spread: 0.25,
            passes: 1,
            sample_spacing: 2,
            rest_height: 8.0,
            impulse_speed: 5.0,
            ripple_speed: -0.4,
            ripple_lookahead: 6,
            ripple_rest_band: 2.0,
            resting_body_speed: 0.2,
            quiescence_ticks: 180,
        }
    }
}

/// Verlet cloth
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClothTuning {
    /// Cap on points per row and per column
    pub max_points: usize,
    /// Constant acceleration applied during integration
    pub acceleration: Vec2,
    /// Integration sub-step
    pub dt: f32,
    /// Constraint relaxation passes per update
    pub iterations: u32,
    /// Ticks between wind changes
    pub wind_interval: u32,
    /// Wind magnitude is drawn from `-wind_range..=wind_range`
    pub wind_range: i32,
    /// Divisor of the quadratic wind falloff
    pub wind_falloff: f32,
}

impl Default for ClothTuning {
    fn default() -> Self {
        Self {
            max_points: 10,
            acceleration: Vec2::new(0.0, 2.0),
            dt: 0.2,
            iterations: 5,
            wind_interval: 360,
            wind_range: 6,
            wind_falloff: 500.0,
        }
    }
}

/// All simulation tuning
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub world: WorldTuning,
    pub body: BodyTuning,
    pub wave: WaveTuning,
    pub cloth: ClothTuning,
}

impl Settings {
    /// Parse and validate settings from JSON; missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Load settings from a file, falling back to defaults on any failure
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path.as_ref()) {
            Ok(settings) => settings,
            Err(err) => {
                log::warn!("Using default settings ({err})");
                Self::default()
            }
        }
    }

    /// Reject values that break the stability contracts of the simulation
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| Err(SimError::InvalidSettings(msg.to_string()));

        if self.world.tile_size <= 0 {
            return invalid("world.tile_size must be positive");
        }
        if self.world.chunk_width < self.world.tile_size as u32
            || self.world.chunk_height < self.world.tile_size as u32
        {
            return invalid("world chunk must hold at least one tile");
        }
        for fraction in [self.world.open_fraction, self.world.origin_open_fraction] {
            if !(0.0..=1.0).contains(&fraction) {
                return invalid("world open fractions must be within 0..=1");
            }
        }

        if self.body.gravity_step < 0.0 || self.body.max_fall_speed <= 0.0 {
            return invalid("body gravity_step must be >= 0 and max_fall_speed > 0");
        }

        let wave = &self.wave;
        if wave.sample_spacing <= 0 {
            return invalid("wave.sample_spacing must be positive");
        }
        if wave.tension <= 0.0 {
            return invalid("wave.tension must be positive");
        }
        if !(0.0..1.0).contains(&wave.dampening) {
            return invalid("wave.dampening must be within 0..1");
        }
        if !(0.0..0.5).contains(&wave.spread) {
            return invalid("wave.spread must be within 0..0.5");
        }

        let cloth = &self.cloth;
        if cloth.max_points == 0 || cloth.iterations == 0 {
            return invalid("cloth.max_points and cloth.iterations must be non-zero");
        }
        if cloth.wind_interval == 0 || cloth.wind_range < 0 || cloth.wind_falloff <= 0.0 {
            return invalid("cloth wind settings out of range");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let settings = Settings::from_json(r#"{ "wave": { "tension": 0.05 } }"#).unwrap();
        assert_eq!(settings.wave.tension, 0.05);
        assert_eq!(settings.wave.dampening, 0.02);
        assert_eq!(settings.body, BodyTuning::default());
    }

    #[test]
    fn test_json_round_trip() {
        let mut settings = Settings::default();
        settings.cloth.iterations = 9;
        let json = settings.to_json().unwrap();
        assert_eq!(Settings::from_json(&json).unwrap(), settings);
    }

    #[test]
    fn test_rejects_unstable_spread() {
        let err = Settings::from_json(r#"{ "wave": { "spread": 0.6 } }"#).unwrap_err();
        assert!(matches!(err, SimError::InvalidSettings(_)));
    }

    #[test]
    fn test_rejects_zero_tile_size() {
        let mut settings = Settings::default();
        settings.world.tile_size = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(matches!(
            Settings::from_json("{ not json"),
            Err(SimError::Json(_))
        ));
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let settings = Settings::load_or_default("/definitely/not/here.json");
        assert_eq!(settings, Settings::default());
    }
}

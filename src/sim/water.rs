//! Spring-chain water surface
//!
//! A strip of water is a row of samples spaced a few pixels apart. Each
//! sample is a damped spring pulled toward the rest height; after the spring
//! pass, height differences leak into neighbors so a splash spreads as a wave.
//!
//! Heights are measured downward from the top of the strip, so a larger
//! height means a lower surface. The rest surface sits at `surface_y` in world
//! space.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::rect::EntityBox;
use crate::settings::WaveTuning;
use crate::{direction_of, trunc_to_i32};

/// One spring of the chain
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WaveSample {
    pub height: f32,
    pub speed: f32,
    /// Rest height minus height, as of the last spring pass
    pub distance: f32,
    left_delta: f32,
    right_delta: f32,
}

impl WaveSample {
    fn at_rest(rest_height: f32) -> Self {
        Self {
            height: rest_height,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaveField {
    /// World x of the first sample
    left: i32,
    /// World y of the surface at rest
    surface_y: f32,
    samples: Vec<WaveSample>,
    pub tuning: WaveTuning,
    /// Ticks since the last splash or ripple
    idle_ticks: u32,
    /// Snapped back to rest by the quiescence check and not disturbed since
    resting: bool,
    /// A body's entry splash has been injected and not yet released
    started: bool,
    last_body_vy: f32,
}

impl WaveField {
    /// Water between world x `left..right` whose surface rests at `surface_y`
    pub fn new(left: i32, right: i32, surface_y: f32, tuning: WaveTuning) -> Self {
        let spacing = tuning.sample_spacing.max(1);
        let count = ((right - left).max(0) / spacing + 1) as usize;
        Self {
            left,
            surface_y,
            samples: vec![WaveSample::at_rest(tuning.rest_height); count],
            tuning,
            idle_ticks: 0,
            resting: true,
            started: false,
            last_body_vy: 0.0,
        }
    }

    pub fn samples(&self) -> &[WaveSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn is_resting(&self) -> bool {
        self.resting
    }

    fn spacing(&self) -> i32 {
        self.tuning.sample_spacing.max(1)
    }

    /// World x just past the last sample
    pub fn right(&self) -> i32 {
        self.left + self.spacing() * self.samples.len() as i32
    }

    /// World y of the top of the strip (height 0)
    pub fn strip_top(&self) -> f32 {
        self.surface_y - self.tuning.rest_height
    }

    /// Sample index under a world x, if the water covers it
    pub fn index_at(&self, world_x: i32) -> Option<usize> {
        let index = (world_x - self.left).div_euclid(self.spacing());
        usize::try_from(index).ok().filter(|&i| i < self.samples.len())
    }

    /// Surface points in world space, left to right
    pub fn surface_points(&self) -> Vec<Vec2> {
        let top = self.strip_top();
        self.samples
            .iter()
            .enumerate()
            .map(|(i, s)| Vec2::new((self.left + i as i32 * self.spacing()) as f32, top + s.height))
            .collect()
    }

    /// Largest displacement any sample can reach from impulses no bigger than
    /// the configured ones.
    ///
    /// Kicks only ever set a speed of at most `kick`. Kicking every tick, the
    /// spring balances the damped kick at `x = (1 - dampening) * kick / tension`.
    /// A last kick from there adds `kick² / tension` of spring energy (in
    /// height² units), which caps the swing. Spreading only averages heights,
    /// so it never raises the peak.
    pub fn amplitude_bound(&self) -> f32 {
        let WaveTuning {
            tension,
            dampening,
            ..
        } = self.tuning;
        let tension = tension.max(f32::EPSILON);
        let kick = self.tuning.impulse_speed.abs().max(self.tuning.ripple_speed.abs());
        let held = (1.0 - dampening) * kick / tension;
        (held * held + kick * kick / tension).sqrt()
    }

    /// Set the speed of one sample; ignored outside the field
    pub fn disturb(&mut self, index: usize, speed: f32) -> bool {
        let Some(sample) = self.samples.get_mut(index) else {
            return false;
        };
        sample.speed = speed;
        self.idle_ticks = 0;
        self.resting = false;
        true
    }

    /// Advance one tick, reacting to a body with the given box and velocity
    pub fn run(&mut self, body: &EntityBox, body_vy: f32, body_vx: f32) {
        self.react_to_body(body, body_vy, body_vx);
        self.last_body_vy = body_vy;

        if !self.resting {
            self.relax_springs();
            for _ in 0..self.tuning.passes {
                self.spread_deltas();
                self.apply_deltas();
            }
        }

        self.idle_ticks = self.idle_ticks.saturating_add(1);
        if self.idle_ticks > self.tuning.quiescence_ticks {
            self.settle_if_still();
        }
    }

    fn react_to_body(&mut self, body: &EntityBox, vy: f32, vx: f32) {
        // Entry splash is released once the body slows its fall or passes its apex
        if (0.0 < vy && vy < self.last_body_vy) || (self.last_body_vy < 0.0 && vy >= 0.0) {
            self.started = false;
        }

        let inside = (self.left as f32) < body.pos.x && body.right() < self.right() as f32;
        let top = self.strip_top();
        let straddles = body.pos.y - top < self.tuning.rest_height
            && self.tuning.rest_height < body.bottom() - top;
        if !inside || !straddles {
            return;
        }

        let center = trunc_to_i32(body.center_x());
        let resting_on_ground = (vy - self.tuning.resting_body_speed).abs() <= f32::EPSILON;

        match direction_of(vy) {
            Some(dir) if !resting_on_ground && !self.started => {
                if let Some(index) = self.index_at(center) {
                    self.disturb(index, self.tuning.impulse_speed * dir);
                }
                self.started = true;
                self.idle_ticks = 0;
            }
            _ => {
                let Some(dir) = direction_of(vx) else {
                    return;
                };
                let ahead = center + (self.tuning.ripple_lookahead as f32 * dir) as i32;
                if let Some(index) = self.index_at(ahead) {
                    if self.samples[index].speed.abs() < self.tuning.ripple_rest_band {
                        self.disturb(index, self.tuning.ripple_speed);
                    }
                }
            }
        }
    }

    fn relax_springs(&mut self) {
        let WaveTuning {
            tension,
            dampening,
            rest_height,
            ..
        } = self.tuning;
        for s in &mut self.samples {
            s.distance = rest_height - s.height;
            s.speed += tension * s.distance - s.speed * dampening;
            s.height += s.speed;
        }
    }

    /// Compute every neighbor delta from the current heights before any is applied
    fn spread_deltas(&mut self) {
        let spread = self.tuning.spread;
        let n = self.samples.len();
        for i in 0..n {
            let height = self.samples[i].height;
            if i > 0 {
                let delta = spread * (height - self.samples[i - 1].height);
                self.samples[i].left_delta = delta;
            }
            if i + 1 < n {
                let delta = spread * (height - self.samples[i + 1].height);
                self.samples[i].right_delta = delta;
            }
        }
    }

    fn apply_deltas(&mut self) {
        let n = self.samples.len();
        for i in 0..n {
            let (left, right) = (self.samples[i].left_delta, self.samples[i].right_delta);
            if i > 0 {
                self.samples[i - 1].height += left;
            }
            if i + 1 < n {
                self.samples[i + 1].height += right;
            }
        }
    }

    /// Snap to rest once every sample has less than a pixel of motion left
    fn settle_if_still(&mut self) {
        if self.resting {
            return;
        }
        let still = self
            .samples
            .iter()
            .all(|s| trunc_to_i32(s.speed) == 0 && trunc_to_i32(s.distance) == 0);
        if still {
            let rest = self.tuning.rest_height;
            self.samples.fill(WaveSample::at_rest(rest));
            self.resting = true;
            log::debug!("Water at x={} settled after {} idle ticks", self.left, self.idle_ticks);
        }
    }
}

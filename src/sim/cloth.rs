//! Verlet cloth hanging from a pinned top row
//!
//! Points live in flat row-major grids, one for the current positions and one
//! for the positions before the latest update. Each update:
//! 1. Wind: every `wind_interval` ticks a new integer magnitude is drawn;
//!    every point is nudged sideways by `row² * magnitude / wind_falloff`.
//! 2. Verlet: free points move by their implied velocity plus `acc * dt`.
//! 3. Relaxation: each point is pulled toward the resting distance from its
//!    upper and left neighbours, `iterations` times, re-pinning row 0 first.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::settings::ClothTuning;

/// Row-major grid of points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointGrid {
    rows: usize,
    cols: usize,
    points: Vec<Vec2>,
}

impl PointGrid {
    pub fn filled(rows: usize, cols: usize, point: Vec2) -> Self {
        Self {
            rows,
            cols,
            points: vec![point; rows * cols],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> Option<Vec2> {
        self.index(row, col).map(|i| self.points[i])
    }

    pub fn get_mut(&mut self, row: usize, col: usize) -> Option<&mut Vec2> {
        self.index(row, col).map(|i| &mut self.points[i])
    }

    pub fn row(&self, row: usize) -> &[Vec2] {
        &self.points[row * self.cols..(row + 1) * self.cols]
    }

    fn index(&self, row: usize, col: usize) -> Option<usize> {
        (row < self.rows && col < self.cols).then(|| row * self.cols + col)
    }
}

/// Points and spacing for one axis: `max` points when the extent is larger
/// than `max` pixels, otherwise one point per pixel at unit spacing.
fn axis_layout(extent: f32, max: usize) -> (usize, f32) {
    if extent > max as f32 {
        (max, extent / max as f32)
    } else {
        (extent.max(1.0) as usize, 1.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClothMesh {
    origin: Vec2,
    /// Resting distance (horizontal, vertical)
    rest: Vec2,
    points: PointGrid,
    previous: PointGrid,
    /// Implied per-tick velocity from the latest integration step
    velocity: PointGrid,
    tuning: ClothTuning,
    wind: f32,
    wind_timer: u32,
}

impl ClothMesh {
    /// Cloth spanning `size` pixels with its top-left pinned at `origin`
    pub fn new(origin: Vec2, size: Vec2, tuning: ClothTuning) -> Self {
        let max = tuning.max_points.max(1);
        let (cols, rest_x) = axis_layout(size.x, max);
        let (rows, rest_y) = axis_layout(size.y, max);
        let rest = Vec2::new(rest_x, rest_y);

        let mut points = PointGrid::filled(rows, cols, origin);
        for row in 0..rows {
            for col in 0..cols {
                if let Some(p) = points.get_mut(row, col) {
                    *p = origin + rest * Vec2::new(col as f32, row as f32);
                }
            }
        }

        Self {
            origin,
            rest,
            previous: points.clone(),
            velocity: PointGrid::filled(rows, cols, Vec2::ZERO),
            points,
            tuning,
            wind: 0.0,
            wind_timer: 0,
        }
    }

    pub fn rows(&self) -> usize {
        self.points.rows()
    }

    pub fn cols(&self) -> usize {
        self.points.cols()
    }

    pub fn resting_distance(&self) -> Vec2 {
        self.rest
    }

    pub fn wind(&self) -> f32 {
        self.wind
    }

    pub fn points(&self) -> &PointGrid {
        &self.points
    }

    pub fn point(&self, row: usize, col: usize) -> Option<Vec2> {
        self.points.get(row, col)
    }

    /// Move a point directly (e.g. a body pushing the cloth)
    pub fn point_mut(&mut self, row: usize, col: usize) -> Option<&mut Vec2> {
        self.points.get_mut(row, col)
    }

    pub fn velocity_at(&self, row: usize, col: usize) -> Option<Vec2> {
        self.velocity.get(row, col)
    }

    /// Where a top-row point is held
    pub fn pinned_point(&self, col: usize) -> Vec2 {
        self.origin + Vec2::new(self.rest.x * col as f32, 0.0)
    }

    /// Advance one tick, drawing wind changes from `rng`
    pub fn update<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let before = self.points.clone();

        self.blow(rng);
        self.integrate();
        for _ in 0..self.tuning.iterations {
            self.relax();
        }
        self.pin_top_row();

        self.previous = before;
    }

    fn blow<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        if self.wind_timer == self.tuning.wind_interval {
            let range = self.tuning.wind_range;
            self.wind = rng.random_range(-range..=range) as f32;
            self.wind_timer = 0;
            log::debug!("Cloth wind changed to {}", self.wind);
        }
        self.wind_timer += 1;

        if self.wind == 0.0 {
            return;
        }
        for row in 0..self.rows() {
            let nudge = (row * row) as f32 * self.wind / self.tuning.wind_falloff;
            for col in 0..self.cols() {
                if let Some(p) = self.points.get_mut(row, col) {
                    p.x += nudge;
                }
            }
        }
    }

    fn integrate(&mut self) {
        let step = self.tuning.acceleration * self.tuning.dt;
        for row in 1..self.rows() {
            for col in 0..self.cols() {
                let current = self.points.get(row, col);
                let (Some(p), Some(prev)) = (current, self.previous.get(row, col)) else {
                    continue;
                };
                let v = p - prev;
                if let Some(slot) = self.velocity.get_mut(row, col) {
                    *slot = v;
                }
                if let Some(slot) = self.points.get_mut(row, col) {
                    *slot = p + v + step;
                }
            }
        }
    }

    fn relax(&mut self) {
        self.pin_top_row();
        for row in 1..self.rows() {
            for col in 0..self.cols() {
                self.link(row, col, row - 1, col);
                if col != 0 {
                    self.link(row, col, row, col - 1);
                }
            }
        }
    }

    /// Pull `(row, col)` and its partner toward the resting distance, half
    /// the shortfall each. Pinned partners do not move.
    fn link(&mut self, row: usize, col: usize, other_row: usize, other_col: usize) {
        let partner = self.points.get(other_row, other_col);
        let (Some(a), Some(b)) = (self.points.get(row, col), partner) else {
            return;
        };
        let d = a - b;
        let dist = d.length();
        if dist <= f32::EPSILON {
            return;
        }
        let translate = d * 0.5 * (self.rest - Vec2::splat(dist)) / dist;

        if let Some(p) = self.points.get_mut(row, col) {
            *p += translate;
        }
        if other_row != 0 {
            if let Some(p) = self.points.get_mut(other_row, other_col) {
                *p -= translate;
            }
        }
    }

    fn pin_top_row(&mut self) {
        for col in 0..self.cols() {
            let pinned = self.pinned_point(col);
            if let Some(p) = self.points.get_mut(0, col) {
                *p = pinned;
            }
        }
    }

    /// Closed perimeter polygon: row 0 right end, row 0 left end, left
    /// column down, bottom row interior, right column up.
    pub fn outline(&self) -> Vec<Vec2> {
        let (rows, cols) = (self.rows(), self.cols());
        if rows == 0 || cols == 0 {
            return Vec::new();
        }
        let last_row = rows - 1;
        let last_col = cols - 1;

        let mut outline = Vec::with_capacity(2 * (rows + cols));
        outline.push(self.points.row(0)[last_col]);
        outline.push(self.points.row(0)[0]);
        for row in 1..rows {
            outline.push(self.points.row(row)[0]);
        }
        if last_row > 0 {
            let bottom = self.points.row(last_row);
            outline.extend_from_slice(&bottom[1..last_col.max(1)]);
            for row in (1..rows).rev() {
                outline.push(self.points.row(row)[last_col]);
            }
        }
        outline
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn still_tuning() -> ClothTuning {
        ClothTuning {
            acceleration: Vec2::ZERO,
            wind_range: 0,
            ..Default::default()
        }
    }

    /// 40x60 px cloth: 10x10 points at 4x6 px spacing
    fn banner(origin: Vec2, tuning: ClothTuning) -> ClothMesh {
        ClothMesh::new(origin, Vec2::new(40.0, 60.0), tuning)
    }

    fn max_constraint_error(cloth: &ClothMesh) -> f32 {
        let rest = cloth.resting_distance();
        let mut worst = 0.0f32;
        for row in 1..cloth.rows() {
            for col in 0..cloth.cols() {
                let p = cloth.point(row, col).unwrap();
                let up = cloth.point(row - 1, col).unwrap();
                worst = worst.max((p.distance(up) - rest.y).abs());
                if col > 0 {
                    let left = cloth.point(row, col - 1).unwrap();
                    worst = worst.max((p.distance(left) - rest.x).abs());
                }
            }
        }
        worst
    }

    #[test]
    fn test_layout_caps_points() {
        let cloth = banner(Vec2::new(100.0, 40.0), ClothTuning::default());
        assert_eq!((cloth.rows(), cloth.cols()), (10, 10));
        assert_eq!(cloth.resting_distance(), Vec2::new(4.0, 6.0));
        assert_eq!(cloth.point(9, 9), Some(Vec2::new(136.0, 94.0)));
    }

    #[test]
    fn test_small_cloth_uses_unit_spacing() {
        let cloth = ClothMesh::new(Vec2::ZERO, Vec2::new(5.0, 10.0), ClothTuning::default());
        assert_eq!((cloth.rows(), cloth.cols()), (10, 5));
        assert_eq!(cloth.resting_distance(), Vec2::ONE);
    }

    #[test]
    fn test_top_row_stays_pinned() {
        let mut cloth = banner(Vec2::new(100.0, 40.0), ClothTuning::default());
        let mut rng = Pcg32::seed_from_u64(7);
        for _ in 0..1500 {
            cloth.update(&mut rng);
            for col in 0..cloth.cols() {
                assert_eq!(cloth.point(0, col), Some(cloth.pinned_point(col)));
            }
        }
    }

    #[test]
    fn test_still_cloth_keeps_resting_distances() {
        let mut cloth = banner(Vec2::new(10.0, 10.0), still_tuning());
        let mut rng = Pcg32::seed_from_u64(1);
        for _ in 0..200 {
            cloth.update(&mut rng);
        }
        assert!(max_constraint_error(&cloth) < 1e-3);
    }

    #[test]
    fn test_gravity_stretches_then_stays_bounded() {
        let origin = Vec2::new(100.0, 40.0);
        let mut cloth = banner(origin, ClothTuning::default());
        let mut rng = Pcg32::seed_from_u64(99);
        for _ in 0..2000 {
            cloth.update(&mut rng);
        }
        for row in 0..cloth.rows() {
            for &p in cloth.points().row(row) {
                assert!(p.is_finite());
                assert!(p.distance(origin) < 200.0);
            }
        }
        // Hangs below the pinned row
        assert!(cloth.point(9, 0).unwrap().y > origin.y);
    }

    #[test]
    fn test_rows_do_not_alias() {
        let mut cloth = banner(Vec2::ZERO, ClothTuning::default());
        let below = cloth.point(4, 3);
        *cloth.point_mut(3, 3).unwrap() += Vec2::new(5.0, 0.0);
        assert_eq!(cloth.point(4, 3), below);

        let mut rng = Pcg32::seed_from_u64(3);
        for _ in 0..3 {
            cloth.update(&mut rng);
        }
        // Lower rows fall further than upper rows
        let near_top = cloth.velocity_at(1, 0).unwrap();
        let near_bottom = cloth.velocity_at(9, 0).unwrap();
        assert_ne!(near_top, near_bottom);
    }

    #[test]
    fn test_wind_drawn_on_interval() {
        let tuning = ClothTuning {
            wind_interval: 1,
            ..Default::default()
        };
        let mut cloth = banner(Vec2::ZERO, tuning);
        let mut rng = Pcg32::seed_from_u64(11);
        let mut expected = Pcg32::seed_from_u64(11);

        cloth.update(&mut rng);
        assert_eq!(cloth.wind(), 0.0);
        cloth.update(&mut rng);
        assert_eq!(cloth.wind(), expected.random_range(-6..=6) as f32);
    }

    #[test]
    fn test_same_seed_same_cloth() {
        let run = |seed| {
            let mut cloth = banner(Vec2::new(10.0, 0.0), ClothTuning::default());
            let mut rng = Pcg32::seed_from_u64(seed);
            for _ in 0..1000 {
                cloth.update(&mut rng);
            }
            cloth.points().clone()
        };
        assert_eq!(run(42), run(42));
    }

    #[test]
    fn test_outline_order() {
        let cloth = ClothMesh::new(Vec2::ZERO, Vec2::new(3.0, 3.0), ClothTuning::default());
        let p = |row, col| cloth.point(row, col).unwrap();
        assert_eq!(
            cloth.outline(),
            vec![p(0, 2), p(0, 0), p(1, 0), p(2, 0), p(2, 1), p(2, 2), p(1, 2)]
        );
    }

    #[test]
    fn test_outline_of_single_row() {
        let cloth = ClothMesh::new(Vec2::ZERO, Vec2::new(4.0, 1.0), ClothTuning::default());
        assert_eq!(cloth.outline(), vec![Vec2::new(3.0, 0.0), Vec2::ZERO]);
    }
}

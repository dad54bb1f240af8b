//! Tile grid, terrain chunks and spatial collision queries
//!
//! The level is a rectangular grid of tile codes (`-1` empty, `1` solid,
//! anything else decorative). Queries return the pixel rects of solid tiles
//! near an entity box so bodies never have to know about tiles.
//!
//! Beyond the authored level, the world can be extended with chunks: screen-
//! sized grids generated the first time they are asked for and kept forever.

use std::collections::HashMap;
use std::fmt;

use glam::{IVec2, Vec2};
use rand::{Rng, RngCore, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::rect::{EntityBox, Rect};
use crate::consts::{EMPTY_TILE, SOLID_TILE};
use crate::error::{Result, SimError};
use crate::settings::WorldTuning;

/// One side of a cell or of the whole grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Top,
    Right,
    Bottom,
    Left,
}

impl Side {
    pub const ALL: [Side; 4] = [Side::Top, Side::Right, Side::Bottom, Side::Left];

    /// (column, row) step toward this side
    fn step(self) -> (isize, isize) {
        match self {
            Side::Top => (0, -1),
            Side::Right => (1, 0),
            Side::Bottom => (0, 1),
            Side::Left => (-1, 0),
        }
    }
}

/// Which sides of a solid tile face a non-solid neighbor (or the grid edge)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExposedSides {
    pub top: bool,
    pub right: bool,
    pub bottom: bool,
    pub left: bool,
}

/// Rectangular row-major grid of tile codes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<i32>>", into = "Vec<Vec<i32>>")]
pub struct TileGrid {
    rows: usize,
    cols: usize,
    cells: Vec<i32>,
}

impl TileGrid {
    /// A `rows x cols` grid filled with `tile`
    pub fn new(rows: usize, cols: usize, tile: i32) -> Self {
        Self {
            rows,
            cols,
            cells: vec![tile; rows * cols],
        }
    }

    /// Build from parsed level rows; every row must have the same length
    pub fn from_rows(rows: Vec<Vec<i32>>) -> Result<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        let mut cells = Vec::with_capacity(rows.len() * cols);
        for (index, row) in rows.iter().enumerate() {
            if row.len() != cols {
                return Err(SimError::RaggedGrid {
                    row: index,
                    expected: cols,
                    actual: row.len(),
                });
            }
            cells.extend_from_slice(row);
        }
        Ok(Self {
            rows: rows.len(),
            cols,
            cells,
        })
    }

    pub fn to_rows(&self) -> Vec<Vec<i32>> {
        self.iter_rows().map(<[i32]>::to_vec).collect()
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn get(&self, row: usize, col: usize) -> Option<i32> {
        (row < self.rows && col < self.cols).then(|| self.cells[row * self.cols + col])
    }

    /// Set a tile; returns false when the cell is outside the grid
    pub fn set(&mut self, row: usize, col: usize, tile: i32) -> bool {
        if row < self.rows && col < self.cols {
            self.cells[row * self.cols + col] = tile;
            true
        } else {
            false
        }
    }

    pub fn row(&self, row: usize) -> &[i32] {
        &self.cells[row * self.cols..(row + 1) * self.cols]
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[i32]> {
        (0..self.rows).map(move |r| self.row(r))
    }

    /// The tile next to `(row, col)` on `side`, if that cell exists
    pub fn neighbor(&self, row: usize, col: usize, side: Side) -> Option<i32> {
        let (dc, dr) = side.step();
        let row = row.checked_add_signed(dr)?;
        let col = col.checked_add_signed(dc)?;
        self.get(row, col)
    }

    /// Sides of a cell whose neighbor is missing or not solid
    pub fn exposed_sides(&self, row: usize, col: usize) -> ExposedSides {
        let exposed = |side| self.neighbor(row, col, side) != Some(SOLID_TILE);
        ExposedSides {
            top: exposed(Side::Top),
            right: exposed(Side::Right),
            bottom: exposed(Side::Bottom),
            left: exposed(Side::Left),
        }
    }

    /// Insert an empty row or column at the given edge
    pub fn grow(&mut self, edge: Side) {
        match edge {
            Side::Top | Side::Bottom => {
                if edge == Side::Top {
                    let mut cells = vec![EMPTY_TILE; self.cols];
                    cells.append(&mut self.cells);
                    self.cells = cells;
                } else {
                    self.cells.extend(std::iter::repeat_n(EMPTY_TILE, self.cols));
                }
                self.rows += 1;
            }
            Side::Left | Side::Right => {
                let at = if edge == Side::Left { 0 } else { self.cols };
                let mut cells = Vec::with_capacity(self.rows * (self.cols + 1));
                for r in 0..self.rows {
                    let row = self.row(r);
                    cells.extend_from_slice(&row[..at]);
                    cells.push(EMPTY_TILE);
                    cells.extend_from_slice(&row[at..]);
                }
                self.cells = cells;
                self.cols += 1;
            }
        }
    }

    /// Remove the row or column at the given edge; no-op when there is none
    pub fn shrink(&mut self, edge: Side) {
        match edge {
            Side::Top | Side::Bottom => {
                if self.rows == 0 {
                    return;
                }
                if edge == Side::Top {
                    self.cells.drain(..self.cols);
                } else {
                    self.cells.truncate((self.rows - 1) * self.cols);
                }
                self.rows -= 1;
            }
            Side::Left | Side::Right => {
                if self.cols == 0 {
                    return;
                }
                let skip = if edge == Side::Left { 0 } else { self.cols - 1 };
                let cols = self.cols;
                self.cells = self
                    .cells
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| i % cols != skip)
                    .map(|(_, &t)| t)
                    .collect();
                self.cols -= 1;
            }
        }
        if self.rows == 0 || self.cols == 0 {
            self.cells.clear();
        }
    }

    /// Reset every cell to empty, keeping the dimensions
    pub fn clear(&mut self) {
        self.cells.fill(EMPTY_TILE);
    }

    /// Pixel rects of solid tiles touching `query`, with the grid placed at `origin`.
    ///
    /// A tile matches when its closed pixel extent meets the closed extent of
    /// the query box. Rows are walked top to bottom starting at the first row
    /// that can reach the box, and the walk stops at the first row whose top
    /// lies below the box. Columns are clipped to the box's range up front.
    fn solid_rects_near(&self, origin: IVec2, tile_size: i32, query: &EntityBox) -> Vec<Rect> {
        let mut rects = Vec::new();
        if self.is_empty() {
            return rects;
        }

        let ts = tile_size as f32;
        let local = query.pos - origin.as_vec2();
        let (left, right) = (local.x, local.x + query.size.x);
        let (top, bottom) = (local.y, local.y + query.size.y);

        let first_row = ((top - ts) / ts).ceil().max(0.0) as usize;
        let first_col = ((left - ts) / ts).ceil().max(0.0) as usize;
        let last_col = (right / ts).floor();
        if last_col < 0.0 || first_col >= self.cols {
            return rects;
        }
        let last_col = (last_col as usize).min(self.cols - 1);

        for row in first_row..self.rows {
            let y = (row as i32 * tile_size) as f32;
            if bottom < y {
                break;
            }
            if top > y + ts {
                continue;
            }
            let tiles = self.row(row).iter().enumerate();
            for (col, &tile) in tiles.take(last_col + 1).skip(first_col) {
                if tile != SOLID_TILE {
                    continue;
                }
                let x = (col as i32 * tile_size) as f32;
                if left > x + ts || right < x {
                    continue;
                }
                rects.extend(cell_rect(origin, tile_size, row, col));
            }
        }
        rects
    }

    /// Pixel rects of every solid tile, with the grid placed at `origin`
    fn all_solid_rects(&self, origin: IVec2, tile_size: i32) -> Vec<Rect> {
        let mut rects = Vec::new();
        for (row, tiles) in self.iter_rows().enumerate() {
            for (col, &tile) in tiles.iter().enumerate() {
                if tile == SOLID_TILE {
                    rects.extend(cell_rect(origin, tile_size, row, col));
                }
            }
        }
        rects
    }
}

/// World rect of one cell, or `None` when any of its edges falls outside `i32`
fn cell_rect(origin: IVec2, tile_size: i32, row: usize, col: usize) -> Option<Rect> {
    let offset = |index: usize| i32::try_from(index).ok()?.checked_mul(tile_size);
    let x = origin.x.checked_add(offset(col)?)?;
    let y = origin.y.checked_add(offset(row)?)?;
    x.checked_add(tile_size)?;
    y.checked_add(tile_size)?;
    Some(Rect::new(x, y, tile_size, tile_size))
}

impl TryFrom<Vec<Vec<i32>>> for TileGrid {
    type Error = SimError;

    fn try_from(rows: Vec<Vec<i32>>) -> Result<Self> {
        Self::from_rows(rows)
    }
}

impl From<TileGrid> for Vec<Vec<i32>> {
    fn from(grid: TileGrid) -> Self {
        grid.to_rows()
    }
}

/// Produces the tiles of a chunk the first time it is visited
pub trait TerrainRule: fmt::Debug {
    fn generate(&self, coord: IVec2, rows: usize, cols: usize, rng: &mut dyn RngCore) -> TileGrid;
}

/// Open sky above a fixed fill line, solid ground below it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdTerrain {
    pub open_fraction: f32,
    pub origin_open_fraction: f32,
}

impl ThresholdTerrain {
    pub fn from_tuning(tuning: &WorldTuning) -> Self {
        Self {
            open_fraction: tuning.open_fraction,
            origin_open_fraction: tuning.origin_open_fraction,
        }
    }

    /// Number of open rows at the top of a chunk
    pub fn open_rows(&self, coord: IVec2, rows: usize) -> usize {
        let fraction = if coord == IVec2::ZERO {
            self.origin_open_fraction
        } else {
            self.open_fraction
        };
        ((fraction * rows as f32).floor() as usize).min(rows)
    }
}

impl TerrainRule for ThresholdTerrain {
    fn generate(&self, coord: IVec2, rows: usize, cols: usize, _rng: &mut dyn RngCore) -> TileGrid {
        let open = self.open_rows(coord, rows);
        let mut grid = TileGrid::new(rows, cols, EMPTY_TILE);
        for row in open..rows {
            for col in 0..cols {
                grid.set(row, col, SOLID_TILE);
            }
        }
        grid
    }
}

/// Threshold terrain whose fill line wanders per column
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JitteredTerrain {
    pub base: ThresholdTerrain,
    pub jitter: u32,
}

impl TerrainRule for JitteredTerrain {
    fn generate(&self, coord: IVec2, rows: usize, cols: usize, rng: &mut dyn RngCore) -> TileGrid {
        let open = self.base.open_rows(coord, rows) as i64;
        let jitter = self.jitter as i64;
        let mut grid = TileGrid::new(rows, cols, EMPTY_TILE);
        for col in 0..cols {
            let line = (open + rng.random_range(-jitter..=jitter)).clamp(0, rows as i64) as usize;
            for row in line..rows {
                grid.set(row, col, SOLID_TILE);
            }
        }
        grid
    }
}

/// A generated region of the world
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub coord: IVec2,
    pub tiles: TileGrid,
}

/// The authored level plus lazily generated chunks
#[derive(Debug)]
pub struct TileWorld {
    grid: TileGrid,
    tile_size: i32,
    chunk_rows: usize,
    chunk_cols: usize,
    chunks: HashMap<IVec2, Chunk>,
    terrain: Box<dyn TerrainRule>,
    rng: Pcg32,
}

impl TileWorld {
    pub fn new(grid: TileGrid, tuning: &WorldTuning, seed: u64) -> Self {
        let tile_size = tuning.tile_size.max(1);
        Self {
            grid,
            tile_size,
            chunk_rows: (tuning.chunk_height / tile_size as u32) as usize,
            chunk_cols: (tuning.chunk_width / tile_size as u32) as usize,
            chunks: HashMap::new(),
            terrain: Box::new(ThresholdTerrain::from_tuning(tuning)),
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Build from parsed level rows; rejects non-rectangular input
    pub fn from_rows(rows: Vec<Vec<i32>>, tuning: &WorldTuning, seed: u64) -> Result<Self> {
        Ok(Self::new(TileGrid::from_rows(rows)?, tuning, seed))
    }

    /// Replace the rule used for chunks that have not been generated yet
    pub fn with_terrain(mut self, terrain: Box<dyn TerrainRule>) -> Self {
        self.terrain = terrain;
        self
    }

    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    /// Editor access to the authored level
    pub fn grid_mut(&mut self) -> &mut TileGrid {
        &mut self.grid
    }

    pub fn tile_size(&self) -> i32 {
        self.tile_size
    }

    /// Pixel y of the bottom edge of the authored level
    pub fn floor_y(&self) -> f32 {
        (self.grid.rows() as i32 * self.tile_size) as f32
    }

    /// Chunk size in pixels
    pub fn chunk_pixel_size(&self) -> IVec2 {
        IVec2::new(
            self.chunk_cols as i32 * self.tile_size,
            self.chunk_rows as i32 * self.tile_size,
        )
    }

    /// Coordinate of the chunk containing a world point
    pub fn chunk_coord_at(&self, point: Vec2) -> IVec2 {
        let size = self.chunk_pixel_size().max(IVec2::ONE).as_vec2();
        (point / size).floor().as_ivec2()
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Solid tiles of the authored level touching the box
    pub fn collisions_in(&self, query: &EntityBox) -> Vec<Rect> {
        self.grid.solid_rects_near(IVec2::ZERO, self.tile_size, query)
    }

    /// The chunk at `(cx, cy)`, generating and storing it on first access
    pub fn chunk_at(&mut self, cx: i32, cy: i32) -> &Chunk {
        let coord = IVec2::new(cx, cy);
        if !self.chunks.contains_key(&coord) {
            let chunk = self.generate_chunk(coord);
            self.chunks.insert(coord, chunk);
        }
        &self.chunks[&coord]
    }

    /// World pixel position of a chunk's top-left corner, if it fits in `i32`
    pub fn chunk_origin(&self, coord: IVec2) -> Option<IVec2> {
        let size = self.chunk_pixel_size();
        Some(IVec2::new(
            coord.x.checked_mul(size.x)?,
            coord.y.checked_mul(size.y)?,
        ))
    }

    /// Solid tiles of one chunk in world pixels; `None` returns every solid tile.
    ///
    /// Chunks too far out to have pixel coordinates are still generated but
    /// report no rects.
    pub fn chunk_collisions_in(
        &mut self,
        cx: i32,
        cy: i32,
        query: Option<&EntityBox>,
    ) -> Vec<Rect> {
        let tile_size = self.tile_size;
        let origin = self.chunk_origin(IVec2::new(cx, cy));
        let chunk = self.chunk_at(cx, cy);
        let Some(origin) = origin else {
            log::debug!("Chunk ({cx}, {cy}) lies outside pixel space");
            return Vec::new();
        };
        match query {
            Some(query) => chunk.tiles.solid_rects_near(origin, tile_size, query),
            None => chunk.tiles.all_solid_rects(origin, tile_size),
        }
    }

    fn generate_chunk(&mut self, coord: IVec2) -> Chunk {
        let tiles = self
            .terrain
            .generate(coord, self.chunk_rows, self.chunk_cols, &mut self.rng);
        log::debug!(
            "Generated chunk ({}, {}) with {}x{} tiles",
            coord.x,
            coord.y,
            tiles.cols(),
            tiles.rows()
        );
        Chunk { coord, tiles }
    }
}

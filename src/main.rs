//! Platformer core entry point
//!
//! Headless driver: builds a small demo level, then feeds the simulation
//! from a fixed-step accumulator the way a renderer's frame loop would.
//!
//! Usage: `platformer-core [settings.json] [seconds]`

use platformer_core::consts::*;
use platformer_core::sim::{Scene, SimBody, TickInput, TileGrid, tick};
use platformer_core::{Result, Settings};

/// Frame time of a display slower than the simulation rate
const FRAME_DT: f32 = 1.0 / 50.0;

const DEFAULT_SECONDS: f32 = 20.0;

/// Ground with a gap over the water, a ledge and a wall
fn demo_level() -> TileGrid {
    let rows = (VIEW_HEIGHT as i32 / TILE_SIZE) as usize;
    let cols = (VIEW_WIDTH as i32 / TILE_SIZE) as usize;
    let ground = rows - 4;

    let mut grid = TileGrid::new(rows, cols, EMPTY_TILE);
    for col in 0..cols {
        let pool = (WATER_LEFT / TILE_SIZE) as usize..(WATER_RIGHT / TILE_SIZE) as usize;
        let top = if pool.contains(&col) { ground + 2 } else { ground };
        for row in top..rows {
            grid.set(row, col, SOLID_TILE);
        }
    }
    for col in 4..8 {
        grid.set(ground - 4, col, SOLID_TILE);
    }
    for row in ground - 3..ground {
        grid.set(row, cols - 1, SOLID_TILE);
    }
    grid
}

/// Scripted input: walk right, hop now and then, walk back
fn scripted_input(tick: u64) -> TickInput {
    let phase = (tick / 240) % 4;
    TickInput {
        left: phase == 2,
        right: phase == 0 || phase == 1,
        jump: phase == 1 && tick % 60 < 10,
    }
}

fn run() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let settings = match args.next() {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    let seconds = args
        .next()
        .and_then(|s| s.parse::<f32>().ok())
        .unwrap_or(DEFAULT_SECONDS);

    let mut scene = Scene::new(demo_level(), settings, 12345)?;

    let frames = (seconds / FRAME_DT) as u64;
    let mut accumulator = 0.0f32;
    for frame in 0..frames {
        accumulator += FRAME_DT;

        let mut substeps = 0;
        while accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            let input = scripted_input(scene.time_ticks);
            tick(&mut scene, &input);
            accumulator -= SIM_DT;
            substeps += 1;
        }

        if frame % 50 == 0 {
            let body = scene.player.bounds();
            log::info!(
                "t={} player=({:.1}, {:.1}) grounded={} water_resting={} wind={}",
                scene.time_ticks,
                body.pos.x,
                body.pos.y,
                scene.player.body.is_grounded(),
                scene.water.is_resting(),
                scene.cloth.wind()
            );
        }
    }

    let outline = scene.cloth.outline();
    log::info!(
        "Finished {} ticks; cloth outline has {} points, water {} samples",
        scene.time_ticks,
        outline.len(),
        scene.water.len()
    );
    Ok(())
}

fn main() {
    env_logger::init();
    log::info!("Platformer core (headless) starting...");

    if let Err(err) = run() {
        log::error!("{err}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_level_runs_headless() {
        let level = demo_level();
        assert_eq!((level.rows(), level.cols()), (17, 30));

        let mut scene = Scene::new(level, Settings::default(), 12345).unwrap();
        for _ in 0..600 {
            let input = scripted_input(scene.time_ticks);
            tick(&mut scene, &input);
        }
        assert_eq!(scene.time_ticks, 600);
        assert!(scene.player.bounds().pos.y <= scene.world.floor_y());
    }
}

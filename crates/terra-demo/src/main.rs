//! Headless driver: flies a viewer from orbit down to the surface and logs
//! what the terrain builds on each tick.
//!
//! Configuration is loaded from `config.ron` and can be overridden via CLI flags.
//! Run with `cargo run -p terra-demo -- --ticks 120 --max-collider-depth 3`.

use std::process::ExitCode;

use clap::Parser;
use glam::DVec3;
use terra_config::{CliArgs, Config, ViewerConfig, default_config_dir};
use terra_planet::{Terrain, TerrainEvent};
use tracing::{error, info};

fn main() -> ExitCode {
    let args = CliArgs::parse();

    let Some(config_dir) = args.config.clone().or_else(default_config_dir) else {
        eprintln!("No config directory available, pass --config <dir>");
        return ExitCode::FAILURE;
    };

    let mut config = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    config.apply_cli_overrides(&args);

    let log_dir = config_dir.join("logs");
    if let Some(path) = terra_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config))
    {
        info!("Writing JSON log to {}", path.display());
    }

    let mut terrain = match Terrain::from_config(&config, &config_dir) {
        Ok(terrain) => terrain,
        Err(e) => {
            error!("Failed to create terrain: {e}");
            return ExitCode::FAILURE;
        }
    };

    fly(&mut terrain, &config.viewer);

    let stats = terrain.stats();
    let leftover = terrain.destroy();
    info!(
        "Done: {} ticks, {} meshes and {} colliders built, {} resources released on teardown",
        stats.ticks,
        stats.meshes_built,
        stats.colliders_built,
        leftover.len()
    );
    ExitCode::SUCCESS
}

fn fly(terrain: &mut Terrain, viewer: &ViewerConfig) {
    let direction = DVec3::from_array(viewer.direction)
        .try_normalize()
        .unwrap_or(DVec3::Y);
    let ticks = viewer.ticks.max(1);

    for tick in 0..ticks {
        let t = if ticks > 1 {
            f64::from(tick) / f64::from(ticks - 1)
        } else {
            1.0
        };
        let altitude = viewer.start_altitude + (viewer.end_altitude - viewer.start_altitude) * t;
        let ground = terrain.local_height(direction);
        let position = direction * (ground + altitude);
        terrain.set_targets(&[position]);

        let report = terrain.update();
        let events = terrain.drain_events();
        let count = |f: fn(&TerrainEvent) -> bool| events.iter().filter(|e| f(e)).count();

        info!(
            "tick {tick}: altitude {altitude:.4}, {} nodes, {} leaves, +{} split / -{} merged, \
             meshes {} built {} released, colliders {} built {} released",
            terrain.tree().len(),
            terrain.tree().leaves().len(),
            report.split.len(),
            report.merged.len(),
            count(|e| matches!(e, TerrainEvent::MeshUpdated { .. })),
            count(|e| matches!(e, TerrainEvent::MeshReleased { .. })),
            count(|e| matches!(e, TerrainEvent::ColliderUpdated { .. })),
            count(|e| matches!(e, TerrainEvent::ColliderReleased { .. })),
        );
    }
}

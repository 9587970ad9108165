//! Command-line arguments for terrain tools.

use std::path::PathBuf;

use clap::Parser;

use crate::{Config, NormalsConfig};

/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "terra", about = "Planetary terrain LOD driver")]
pub struct CliArgs {
    /// Base sphere radius.
    #[arg(long)]
    pub radius: Option<f64>,

    /// Mesh detail per node (0..=3).
    #[arg(long)]
    pub subdivisions: Option<u8>,

    /// Derive normals from the deformed surface instead of the sphere.
    #[arg(long)]
    pub surface_normals: bool,

    /// Collider depth cap (0 disables colliders).
    #[arg(long)]
    pub max_collider_depth: Option<u8>,

    /// Number of simulated update ticks.
    #[arg(long)]
    pub ticks: Option<u32>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(radius) = args.radius {
            self.terrain.radius = radius;
        }
        if let Some(subdivisions) = args.subdivisions {
            self.terrain.subdivisions = subdivisions;
        }
        if args.surface_normals {
            self.terrain.normals = NormalsConfig::Surface;
        }
        if let Some(depth) = args.max_collider_depth {
            self.terrain.max_collider_depth = depth;
        }
        if let Some(ticks) = args.ticks {
            self.viewer.ticks = ticks;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}

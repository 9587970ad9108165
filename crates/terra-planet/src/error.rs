//! Terrain construction errors.

use std::path::PathBuf;

use terra_height::HeightmapError;
use terra_lod::ThresholdError;
use thiserror::Error;

/// Errors raised while configuring a terrain.
#[derive(Debug, Error)]
pub enum TerrainError {
    #[error("terrain radius must be positive and finite, got {0}")]
    InvalidRadius(f64),
    #[error("invalid LOD distances: {0}")]
    Thresholds(#[from] ThresholdError),
    #[error("failed to load heightmap {}: {source}", path.display())]
    Heightmap {
        path: PathBuf,
        #[source]
        source: HeightmapError,
    },
}

//! Height modifiers built from configuration.

use std::path::Path;

use terra_config::{EncodingConfig, ModifierConfig};
use terra_height::{
    HeightEncoding, HeightModifier, Heightmap, HeightmapModifier, RidgedSimplexModifier,
    SimplexModifier, SimplexParams,
};
use tracing::{debug, warn};

use crate::TerrainError;

/// Instantiate the modifier a config entry describes. Relative heightmap
/// paths are resolved against `base_dir`.
pub fn build_modifier(
    config: &ModifierConfig,
    base_dir: &Path,
) -> Result<Box<dyn HeightModifier>, TerrainError> {
    let modifier: Box<dyn HeightModifier> = match *config {
        ModifierConfig::Simplex {
            frequency,
            amplitude,
            octaves,
            seed,
        } => Box::new(SimplexModifier::new(SimplexParams {
            frequency,
            amplitude,
            octaves,
            seed,
        })),
        ModifierConfig::RidgedSimplex {
            frequency,
            amplitude,
            octaves,
            seed,
            invert,
        } => Box::new(RidgedSimplexModifier::new(
            SimplexParams {
                frequency,
                amplitude,
                octaves,
                seed,
            },
            invert,
        )),
        ModifierConfig::Heightmap {
            ref path,
            encoding,
            displacement_min,
            displacement_max,
        } => {
            let path = base_dir.join(path);
            let heightmap = match Heightmap::open(&path) {
                Ok(map) => Some(map),
                Err(e) if e.is_not_found() => {
                    warn!("Heightmap {} not found, contributing no offset", path.display());
                    None
                }
                Err(source) => return Err(TerrainError::Heightmap { path, source }),
            };
            let encoding = match encoding {
                EncodingConfig::Alpha => HeightEncoding::Alpha,
                EncodingConfig::RedGreen => HeightEncoding::RedGreen,
            };
            Box::new(HeightmapModifier {
                heightmap,
                encoding,
                displacement_min,
                displacement_max,
            })
        }
    };
    debug!("Built height modifier {config:?}");
    Ok(modifier)
}

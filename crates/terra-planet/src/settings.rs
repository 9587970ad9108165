//! Runtime terrain settings and their validation.

use terra_config::{NormalsConfig, TerrainConfig};
use terra_lod::LodThresholds;
use terra_mesh::{MeshSettings, NormalMode};

use crate::{MaterialId, TerrainError};

/// Validated terrain parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct TerrainSettings {
    /// Base sphere radius, positive and finite.
    pub radius: f64,
    pub mesh: MeshSettings,
    pub thresholds: LodThresholds,
    /// Nodes shallower than this carry a collider (0 = no colliders).
    pub max_collider_depth: u8,
    pub base_material: MaterialId,
}

impl Default for TerrainSettings {
    fn default() -> Self {
        Self {
            radius: 1.0,
            mesh: MeshSettings::default(),
            thresholds: LodThresholds::default_planet(),
            max_collider_depth: 0,
            base_material: MaterialId::default(),
        }
    }
}

impl TerrainSettings {
    /// Check the radius.
    pub fn validate(&self) -> Result<(), TerrainError> {
        validate_radius(self.radius)
    }

    /// Build settings from the `terrain` config section.
    pub fn from_config(config: &TerrainConfig) -> Result<Self, TerrainError> {
        validate_radius(config.radius)?;
        let thresholds = LodThresholds::new(config.lod_distances.clone())?;
        Ok(Self {
            radius: config.radius,
            mesh: MeshSettings {
                subdivisions: config.subdivisions,
                normals: match config.normals {
                    NormalsConfig::Sphere => NormalMode::Sphere,
                    NormalsConfig::Surface => NormalMode::Surface,
                },
                tangents: config.tangents,
                center_bounds: config.center_bounds,
            },
            thresholds,
            max_collider_depth: config.max_collider_depth,
            base_material: MaterialId(config.base_material),
        })
    }
}

pub(crate) fn validate_radius(radius: f64) -> Result<(), TerrainError> {
    if radius.is_finite() && radius > 0.0 {
        Ok(())
    } else {
        Err(TerrainError::InvalidRadius(radius))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_default_config() {
        let settings = TerrainSettings::from_config(&TerrainConfig::default()).unwrap();
        assert_eq!(settings.radius, 1.0);
        assert_eq!(settings.thresholds.max_depth(), 5);
        assert_eq!(settings.mesh.resolution(), 8);
    }

    #[test]
    fn test_bad_radius_and_distances_are_rejected() {
        let mut config = TerrainConfig {
            radius: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            TerrainSettings::from_config(&config),
            Err(TerrainError::InvalidRadius(_))
        ));
        config.radius = f64::NAN;
        assert!(TerrainSettings::from_config(&config).is_err());

        config.radius = 1.0;
        config.lod_distances = vec![1.0, 2.0];
        assert!(matches!(
            TerrainSettings::from_config(&config),
            Err(TerrainError::Thresholds(_))
        ));
    }
}

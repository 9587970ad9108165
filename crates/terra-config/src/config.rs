//! Configuration sections with defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// File name used inside a config directory.
pub const CONFIG_FILE_NAME: &str = "config.ron";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub terrain: TerrainConfig,
    /// Height modifiers, applied in list order.
    pub modifiers: Vec<ModifierConfig>,
    pub viewer: ViewerConfig,
    pub debug: DebugConfig,
}

/// Vertex normal source.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum NormalsConfig {
    #[default]
    Sphere,
    Surface,
}

/// Terrain shape and detail.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TerrainConfig {
    /// Base sphere radius in terrain units.
    pub radius: f64,
    /// Mesh detail per node, 0..=3 (4, 8, 16 or 32 quads per edge).
    pub subdivisions: u8,
    pub normals: NormalsConfig,
    pub tangents: bool,
    /// Store mesh positions relative to their bounds centre.
    pub center_bounds: bool,
    /// Split distances per depth, strictly decreasing.
    pub lod_distances: Vec<f64>,
    /// Collider depth cap (0 disables colliders).
    pub max_collider_depth: u8,
    /// Material assigned before material modifiers run.
    pub base_material: u32,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            radius: 1.0,
            subdivisions: 1,
            normals: NormalsConfig::Sphere,
            tangents: false,
            center_bounds: true,
            lod_distances: vec![2.0, 1.0, 0.5, 0.25, 0.125],
            max_collider_depth: 0,
            base_material: 0,
        }
    }
}

/// Heightmap pixel encoding.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum EncodingConfig {
    #[default]
    Alpha,
    RedGreen,
}

/// One entry of the height modifier pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ModifierConfig {
    Simplex {
        frequency: f64,
        amplitude: f64,
        octaves: u32,
        seed: u32,
    },
    RidgedSimplex {
        frequency: f64,
        amplitude: f64,
        octaves: u32,
        seed: u32,
        #[serde(default)]
        invert: bool,
    },
    Heightmap {
        /// Image path; relative paths resolve against the config directory.
        path: PathBuf,
        #[serde(default)]
        encoding: EncodingConfig,
        displacement_min: f64,
        displacement_max: f64,
    },
}

/// Scripted viewer used by the headless demo.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ViewerConfig {
    /// Direction from the planet centre the viewer descends along.
    pub direction: [f64; 3],
    /// Altitude above the base radius at the first tick.
    pub start_altitude: f64,
    /// Altitude at the last tick.
    pub end_altitude: f64,
    /// Number of update ticks to simulate.
    pub ticks: u32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            direction: [0.0, 1.0, 0.0],
            start_altitude: 4.0,
            end_altitude: 0.01,
            ticks: 60,
        }
    }
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log filter (e.g. "debug", "info,terra_lod=trace").
    pub log_level: String,
    /// Also write JSON logs to the config directory in debug builds.
    pub log_to_file: bool,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_to_file: true,
        }
    }
}

/// Per-user config directory for terrain tools (`<config_dir>/terra`).
#[must_use]
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("terra"))
}

// --- Load / Save / Reload ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            let config = Self::read(&config_path)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// [`Config::load_or_create`] in [`default_config_dir`].
    pub fn load_default() -> Result<(Self, PathBuf), ConfigError> {
        let dir = default_config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok((Self::load_or_create(&dir)?, dir))
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        ron::from_str(&contents).map_err(ConfigError::ParseError)
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        let write_error = |source| ConfigError::WriteError {
            path: config_dir.to_path_buf(),
            source,
        };
        std::fs::create_dir_all(config_dir).map_err(write_error)?;

        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(4)
            .separate_tuple_members(true)
            .enumerate_arrays(false);
        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(config_dir.join(CONFIG_FILE_NAME), serialized).map_err(write_error)?;
        Ok(())
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let new_config = Self::read(&config_dir.join(CONFIG_FILE_NAME))?;
        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }
}

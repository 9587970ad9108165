//! Configuration for terrain hosts.
//!
//! Settings persist to disk as a RON file with per-section defaults, so old
//! files keep loading as fields are added. CLI arguments parsed with clap
//! override values loaded from disk, and `reload` detects edits for hot reload.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    CONFIG_FILE_NAME, Config, DebugConfig, EncodingConfig, ModifierConfig, NormalsConfig,
    TerrainConfig, ViewerConfig, default_config_dir,
};
pub use error::ConfigError;

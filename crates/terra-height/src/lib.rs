//! Height-field provider for the terrain sphere.
//!
//! A [`HeightField`] starts every sample at the base radius and lets an
//! ordered list of [`HeightModifier`]s add their displacement. The supplied
//! modifiers cover fractal simplex noise, ridged simplex noise and
//! equirectangular heightmaps.

mod error;
mod field;
mod heightmap;
mod hooks;
mod simplex;

pub use error::HeightmapError;
pub use field::{HeightField, HeightModifier};
pub use heightmap::{HeightEncoding, Heightmap, HeightmapModifier, direction_to_equirect_uv};
pub use hooks::{HookId, HookList};
pub use simplex::{MAX_OCTAVES, RidgedSimplexModifier, SimplexModifier, SimplexParams};

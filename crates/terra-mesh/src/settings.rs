//! Per-node mesh detail and attribute options.

/// Highest supported `subdivisions` value.
pub const MAX_SUBDIVISIONS: u8 = 3;

/// How vertex normals are derived.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NormalMode {
    /// Normalised vertex position, as on an undeformed sphere.
    #[default]
    Sphere,
    /// Cross product of the deformed grid's local derivatives.
    Surface,
}

/// Options shared by every node mesh of a terrain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MeshSettings {
    /// Grid detail: `4 << subdivisions` quads per node edge.
    pub subdivisions: u8,
    pub normals: NormalMode,
    /// Generate per-vertex tangents.
    pub tangents: bool,
    /// Store positions relative to the mesh bounds centre.
    pub center_bounds: bool,
}

impl Default for MeshSettings {
    fn default() -> Self {
        Self {
            subdivisions: 1,
            normals: NormalMode::Sphere,
            tangents: false,
            center_bounds: true,
        }
    }
}

impl MeshSettings {
    /// Quads per node edge.
    #[inline]
    #[must_use]
    pub fn resolution(&self) -> u32 {
        4 << self.subdivisions.min(MAX_SUBDIVISIONS)
    }
}

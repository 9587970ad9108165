//! The terrain root: owns the quadtree, the height pipeline and the per-node
//! meshes and colliders, and schedules their regeneration once per tick.

mod error;
mod events;
mod hooks;
mod materials;
mod modifiers;
mod settings;
mod terrain;

pub use error::TerrainError;
pub use events::TerrainEvent;
pub use hooks::{ColorModifier, FaceHook, FaceInfo, MaterialModifier, VertexPostProcess};
pub use materials::{CubeMaterials, LevelMaterial, MaterialId};
pub use modifiers::build_modifier;
pub use settings::TerrainSettings;
pub use terrain::{Terrain, TerrainStats};

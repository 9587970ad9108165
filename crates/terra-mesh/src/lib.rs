//! Mesh and collider generation for terrain quadtree nodes.
//!
//! Each node is meshed as a regular grid of quads. Edges that border a
//! shallower neighbour have their vertices constrained onto the coarser
//! neighbour's edge segments, which closes T-junction cracks without touching
//! the coarser mesh.

mod builder;
mod collider;
mod settings;
mod vertex;

pub use builder::{MeshRequest, MeshSource, NodeMesh, build_node_mesh, edge_vertex_indices};
pub use collider::ColliderMesh;
pub use settings::{MAX_SUBDIVISIONS, MeshSettings, NormalMode};
pub use vertex::{TerrainVertex, vertex_bytes};

//! Cube-sphere topology: faces, face coordinates, quadtree node addresses, and the
//! static edge adjacency table that stitches the six faces together.

mod address;
mod adjacency;
mod cube_face;
mod face_coord;
mod projection;

pub use address::{CrossEdge, MAX_DEPTH, NodeAddress};
pub use adjacency::{Edge, FaceEdgeAdjacency, face_adjacency, transform_edge_param};
pub use cube_face::CubeFace;
pub use face_coord::FaceCoord;
pub use projection::{cube_to_sphere, face_coord_to_cube_point, face_coord_to_sphere};

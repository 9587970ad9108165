//! Level-of-detail management: distance thresholds, the per-face node arena,
//! neighbour resolution across depths and cube seams, and the split/merge
//! controller.

mod controller;
mod stitch;
mod thresholds;
mod tree;

pub use controller::{LodReport, node_distance_squared, update_states};
pub use stitch::{Neighbor, coarser_edges, edge_leaves, neighbor};
pub use thresholds::{LodThresholds, ThresholdError};
pub use tree::{NodeId, QuadNode, QuadTree, ReleasedNode};

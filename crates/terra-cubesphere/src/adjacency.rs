//! Static edge adjacency of the six cube faces.
//!
//! Every face edge is shared with exactly one edge of another face. The table
//! below records, for each `(face, edge)`, the neighbouring face, the edge on
//! that face that touches back, and whether the edge parameter runs in the
//! opposite direction on the other side. The edge parameter is `u` for the
//! south/north edges and `v` for the west/east edges.

use crate::{CubeFace, FaceCoord};

/// An edge of a face (or of a quadtree node) in face UV space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Edge {
    /// `u = 0`
    West = 0,
    /// `u = 1`
    East = 1,
    /// `v = 0`
    South = 2,
    /// `v = 1`
    North = 3,
}

impl Edge {
    /// All four edges in slot order.
    pub const ALL: [Edge; 4] = [Edge::West, Edge::East, Edge::South, Edge::North];

    /// Slot index in [`Edge::ALL`].
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// The edge on the other side of a node.
    #[must_use]
    pub fn opposite(self) -> Edge {
        match self {
            Edge::West => Edge::East,
            Edge::East => Edge::West,
            Edge::South => Edge::North,
            Edge::North => Edge::South,
        }
    }

    /// Whether the edge parameter is `u` (south/north) rather than `v`.
    #[inline]
    #[must_use]
    pub fn runs_along_u(self) -> bool {
        matches!(self, Edge::South | Edge::North)
    }

    /// Child slots (`[bottom-left, bottom-right, top-left, top-right]` order)
    /// that touch this edge, in increasing edge-parameter order.
    #[must_use]
    pub fn child_slots(self) -> [usize; 2] {
        match self {
            Edge::West => [0, 2],
            Edge::East => [1, 3],
            Edge::South => [0, 1],
            Edge::North => [2, 3],
        }
    }

    /// Face UV of the point at parameter `t` along this edge of the unit square.
    #[must_use]
    pub fn point(self, t: f64) -> (f64, f64) {
        match self {
            Edge::West => (0.0, t),
            Edge::East => (1.0, t),
            Edge::South => (t, 0.0),
            Edge::North => (t, 1.0),
        }
    }
}

/// How one face edge continues onto its neighbouring face.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FaceEdgeAdjacency {
    /// The adjacent face.
    pub neighbor_face: CubeFace,
    /// The edge of `neighbor_face` that coincides with this edge.
    pub neighbor_edge: Edge,
    /// `true` when parameter `t` here is `1 - t` on the neighbour.
    pub flipped: bool,
}

const fn adj(neighbor_face: CubeFace, neighbor_edge: Edge, flipped: bool) -> FaceEdgeAdjacency {
    FaceEdgeAdjacency {
        neighbor_face,
        neighbor_edge,
        flipped,
    }
}

/// Indexed `[face][edge]` in [`CubeFace::ALL`] / [`Edge::ALL`] order.
const ADJACENCY: [[FaceEdgeAdjacency; 4]; 6] = {
    use CubeFace::*;
    use Edge::*;
    [
        // PosX: west, east, south, north
        [
            adj(PosZ, East, false),
            adj(NegZ, West, false),
            adj(NegY, East, true),
            adj(PosY, East, false),
        ],
        // NegX
        [
            adj(NegZ, East, false),
            adj(PosZ, West, false),
            adj(NegY, West, false),
            adj(PosY, West, true),
        ],
        // PosY
        [
            adj(NegX, North, true),
            adj(PosX, North, false),
            adj(PosZ, North, false),
            adj(NegZ, North, true),
        ],
        // NegY
        [
            adj(NegX, South, false),
            adj(PosX, South, true),
            adj(NegZ, South, true),
            adj(PosZ, South, false),
        ],
        // PosZ
        [
            adj(NegX, East, false),
            adj(PosX, West, false),
            adj(NegY, North, false),
            adj(PosY, South, false),
        ],
        // NegZ
        [
            adj(PosX, East, false),
            adj(NegX, West, false),
            adj(NegY, South, true),
            adj(PosY, North, true),
        ],
    ]
};

/// Look up which face continues across `edge` of `face`.
#[inline]
#[must_use]
pub fn face_adjacency(face: CubeFace, edge: Edge) -> FaceEdgeAdjacency {
    ADJACENCY[face.index()][edge.index()]
}

/// Carry an edge parameter `t` across `edge` of `face`.
///
/// Returns the neighbouring face, its touching edge, and the parameter along
/// that edge.
#[must_use]
pub fn transform_edge_param(face: CubeFace, edge: Edge, t: f64) -> (CubeFace, Edge, f64) {
    let a = face_adjacency(face, edge);
    let t = if a.flipped { 1.0 - t } else { t };
    (a.neighbor_face, a.neighbor_edge, t)
}

impl FaceCoord {
    /// The point at parameter `t` along `edge` of `face`.
    #[must_use]
    pub fn on_edge(face: CubeFace, edge: Edge, t: f64) -> Self {
        let (u, v) = edge.point(t);
        FaceCoord::new(face, u, v)
    }
}

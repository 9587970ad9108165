//! Addressing of quadtree nodes on the cube-sphere.

use std::fmt;

use glam::{DVec2, DVec3};

use crate::{CubeFace, Edge, FaceCoord, face_adjacency, face_coord_to_cube_point};

/// Deepest subdivision level a node address can describe.
///
/// At depth 24 a face is split into 2^24 cells per axis, so corner
/// coordinates (`x / 2^depth`) are still exact in `f64`.
pub const MAX_DEPTH: u8 = 24;

/// Position of a quadtree node: the face, the depth (0 = whole face), and the
/// cell `(x, y)` in the `2^depth x 2^depth` grid of that depth.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeAddress {
    /// Cube face owning the node.
    pub face: CubeFace,
    /// Subdivision depth, 0 for a face root.
    pub depth: u8,
    /// Cell column, increasing with `u`.
    pub x: u32,
    /// Cell row, increasing with `v`.
    pub y: u32,
}

/// The same-depth cell on the other side of an edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CrossEdge {
    /// The neighbouring cell (possibly on another face).
    pub address: NodeAddress,
    /// The edge of `address` that touches back.
    pub edge: Edge,
    /// `true` when the edge parameter is reversed on the neighbour.
    pub flipped: bool,
}

impl NodeAddress {
    /// The node covering an entire face.
    #[must_use]
    pub fn root(face: CubeFace) -> Self {
        Self {
            face,
            depth: 0,
            x: 0,
            y: 0,
        }
    }

    /// Construct an address, validating the depth and the cell range.
    ///
    /// # Panics
    ///
    /// Panics if `depth` exceeds [`MAX_DEPTH`] or `x`/`y` fall outside the grid.
    #[must_use]
    pub fn new(face: CubeFace, depth: u8, x: u32, y: u32) -> Self {
        let size = Self::grid_size(depth);
        assert!(x < size, "x={x} out of range for depth {depth} (size {size})");
        assert!(y < size, "y={y} out of range for depth {depth} (size {size})");
        Self { face, depth, x, y }
    }

    /// Number of cells per face axis at `depth`.
    ///
    /// # Panics
    ///
    /// Panics if `depth` exceeds [`MAX_DEPTH`].
    #[must_use]
    pub fn grid_size(depth: u8) -> u32 {
        assert!(depth <= MAX_DEPTH, "depth {depth} exceeds MAX_DEPTH {MAX_DEPTH}");
        1 << depth
    }

    /// `(u_min, v_min, u_max, v_max)` of this cell on its face.
    #[must_use]
    pub fn uv_bounds(&self) -> (f64, f64, f64, f64) {
        let size = Self::grid_size(self.depth) as f64;
        (
            self.x as f64 / size,
            self.y as f64 / size,
            (self.x + 1) as f64 / size,
            (self.y + 1) as f64 / size,
        )
    }

    /// Face UV of the four corners, `[bottom-left, bottom-right, top-left, top-right]`.
    #[must_use]
    pub fn corner_coords(&self) -> [DVec2; 4] {
        let (u0, v0, u1, v1) = self.uv_bounds();
        [
            DVec2::new(u0, v0),
            DVec2::new(u1, v0),
            DVec2::new(u0, v1),
            DVec2::new(u1, v1),
        ]
    }

    /// Cube-space corners in the same order as [`Self::corner_coords`].
    #[must_use]
    pub fn cube_corners(&self) -> [DVec3; 4] {
        self.corner_coords()
            .map(|c| face_coord_to_cube_point(&FaceCoord::new(self.face, c.x, c.y)))
    }

    /// The enclosing cell one level up, `None` for a root.
    #[must_use]
    pub fn parent(&self) -> Option<NodeAddress> {
        (self.depth > 0).then(|| NodeAddress {
            face: self.face,
            depth: self.depth - 1,
            x: self.x / 2,
            y: self.y / 2,
        })
    }

    /// The four cells one level down, `None` at [`MAX_DEPTH`].
    #[must_use]
    pub fn children(&self) -> Option<[NodeAddress; 4]> {
        if self.depth >= MAX_DEPTH {
            return None;
        }
        let (cx, cy) = (self.x * 2, self.y * 2);
        let depth = self.depth + 1;
        let face = self.face;
        Some([
            NodeAddress { face, depth, x: cx, y: cy },
            NodeAddress { face, depth, x: cx + 1, y: cy },
            NodeAddress { face, depth, x: cx, y: cy + 1 },
            NodeAddress { face, depth, x: cx + 1, y: cy + 1 },
        ])
    }

    /// Slot of this cell inside its parent (`[BL, BR, TL, TR]` order).
    #[inline]
    #[must_use]
    pub fn child_slot(&self) -> usize {
        (self.x & 1) as usize + 2 * (self.y & 1) as usize
    }

    /// The ancestor (or self) at a shallower `depth`.
    ///
    /// # Panics
    ///
    /// Panics if `depth` is deeper than this address.
    #[must_use]
    pub fn ancestor_at(&self, depth: u8) -> NodeAddress {
        assert!(depth <= self.depth, "ancestor depth {depth} below {}", self.depth);
        let shift = self.depth - depth;
        NodeAddress {
            face: self.face,
            depth,
            x: self.x >> shift,
            y: self.y >> shift,
        }
    }

    /// Whether `other` lies inside this cell (or is this cell).
    #[must_use]
    pub fn contains(&self, other: &NodeAddress) -> bool {
        other.face == self.face
            && other.depth >= self.depth
            && other.ancestor_at(self.depth) == *self
    }

    /// Index of this cell along `edge`'s direction: `x` for south/north, `y` for west/east.
    #[inline]
    #[must_use]
    pub fn edge_index(&self, edge: Edge) -> u32 {
        if edge.runs_along_u() { self.x } else { self.y }
    }

    /// Whether `edge` of this cell lies on the border of its face.
    #[must_use]
    pub fn on_face_border(&self, edge: Edge) -> bool {
        let last = Self::grid_size(self.depth) - 1;
        match edge {
            Edge::West => self.x == 0,
            Edge::East => self.x == last,
            Edge::South => self.y == 0,
            Edge::North => self.y == last,
        }
    }

    /// The same-depth cell across `edge`, following the cube topology when the
    /// edge is a face border.
    #[must_use]
    pub fn neighbor(&self, edge: Edge) -> CrossEdge {
        if !self.on_face_border(edge) {
            let (x, y) = match edge {
                Edge::West => (self.x - 1, self.y),
                Edge::East => (self.x + 1, self.y),
                Edge::South => (self.x, self.y - 1),
                Edge::North => (self.x, self.y + 1),
            };
            return CrossEdge {
                address: NodeAddress { x, y, ..*self },
                edge: edge.opposite(),
                flipped: false,
            };
        }

        let last = Self::grid_size(self.depth) - 1;
        let a = face_adjacency(self.face, edge);
        let along = self.edge_index(edge);
        let along = if a.flipped { last - along } else { along };
        let (x, y) = match a.neighbor_edge {
            Edge::West => (0, along),
            Edge::East => (last, along),
            Edge::South => (along, 0),
            Edge::North => (along, last),
        };
        CrossEdge {
            address: NodeAddress {
                face: a.neighbor_face,
                depth: self.depth,
                x,
                y,
            },
            edge: a.neighbor_edge,
            flipped: a.flipped,
        }
    }
}

impl fmt::Display for NodeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/d{}/({},{})", self.face, self.depth, self.x, self.y)
    }
}

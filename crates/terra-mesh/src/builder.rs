//! Grid meshing of a single quadtree node on the deformed sphere.

use glam::{DVec2, DVec3, DVec4, Vec4};
use terra_cubesphere::{Edge, NodeAddress};
use terra_height::HeightField;

use crate::MeshSettings;
use crate::settings::NormalMode;

/// Height (and optionally colour) provider for meshing.
pub trait MeshSource {
    /// Distance from the centre of the surface along `direction`.
    fn surface_height(&self, direction: DVec3) -> f64;

    /// Vertex colour for a surface point. White by default.
    fn color(&self, _local_position: DVec3, _height: f64) -> Vec4 {
        Vec4::ONE
    }

    /// Deformed surface point above a cube-space point.
    fn surface_point(&self, cube_point: DVec3) -> DVec3 {
        cube_point.normalize_or_zero() * self.surface_height(cube_point)
    }
}

impl MeshSource for HeightField {
    fn surface_height(&self, direction: DVec3) -> f64 {
        self.height(direction)
    }
}

/// Geometry of the node to mesh plus the depth of any coarser neighbour.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeshRequest {
    pub address: NodeAddress,
    /// Cube-space corners, `[BL, BR, TL, TR]`.
    pub corners: [DVec3; 4],
    /// Face UV of the corners.
    pub coords: [DVec2; 4],
    /// Per edge (`[W, E, S, N]`), the depth of a shallower neighbour.
    pub seams: [Option<u8>; 4],
}

/// Mesh data for one node.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeMesh {
    /// Offset added to every position to get terrain-local space. Zero unless
    /// the mesh was built with `center_bounds`.
    pub origin: DVec3,
    /// Row-major `(resolution + 1)^2` grid, `u` varying fastest.
    pub positions: Vec<DVec3>,
    pub normals: Vec<DVec3>,
    /// `xyz` along increasing `u`, `w` the bitangent sign.
    pub tangents: Option<Vec<DVec4>>,
    /// Face UV per vertex.
    pub coords: Vec<DVec2>,
    pub colors: Vec<Vec4>,
    /// Triangle list, counter-clockwise seen from outside.
    pub indices: Vec<u32>,
    /// `(min, max)` of the positions, in the same space as `positions`.
    pub bounds: (DVec3, DVec3),
    /// Quads per edge.
    pub resolution: u32,
}

impl NodeMesh {
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Vertex `i` in terrain-local space.
    #[inline]
    #[must_use]
    pub fn local_position(&self, i: usize) -> DVec3 {
        self.positions[i] + self.origin
    }

    /// Grid index of vertex `(i, j)`.
    #[inline]
    #[must_use]
    pub fn grid_index(&self, i: u32, j: u32) -> usize {
        (j * (self.resolution + 1) + i) as usize
    }
}

/// Indices of the vertices along `edge` of a `resolution`-quad grid, in
/// increasing edge-parameter order.
#[must_use]
pub fn edge_vertex_indices(edge: Edge, resolution: u32) -> Vec<u32> {
    let n = resolution + 1;
    (0..n)
        .map(|k| match edge {
            Edge::West => k * n,
            Edge::East => k * n + resolution,
            Edge::South => k,
            Edge::North => resolution * n + k,
        })
        .collect()
}

/// Cube-space bilinear patch spanned by a node's corners.
struct Patch {
    corners: [DVec3; 4],
}

impl Patch {
    /// Point at node-local `(s, t)`. Values outside `[0, 1]` extrapolate
    /// along the face plane.
    #[inline]
    fn cube_point(&self, s: f64, t: f64) -> DVec3 {
        let [bl, br, tl, tr] = self.corners;
        let bottom = bl + (br - bl) * s;
        let top = tl + (tr - tl) * s;
        bottom + (top - bottom) * t
    }

    fn edge_point(&self, edge: Edge, t: f64) -> DVec3 {
        let (s, t) = edge.point(t);
        self.cube_point(s, t)
    }
}

/// Build the mesh for one node.
#[must_use]
pub fn build_node_mesh(
    request: &MeshRequest,
    settings: &MeshSettings,
    source: &dyn MeshSource,
) -> NodeMesh {
    let g = settings.resolution();
    let n = g + 1;
    let step = 1.0 / f64::from(g);
    let patch = Patch {
        corners: request.corners,
    };
    let [c_bl, c_br, c_tl, c_tr] = request.coords;

    let count = (n * n) as usize;
    let mut positions = Vec::with_capacity(count);
    let mut coords = Vec::with_capacity(count);
    for j in 0..n {
        let t = f64::from(j) * step;
        for i in 0..n {
            let s = f64::from(i) * step;
            positions.push(source.surface_point(patch.cube_point(s, t)));
            let bottom = c_bl + (c_br - c_bl) * s;
            let top = c_tl + (c_tr - c_tl) * s;
            coords.push(bottom + (top - bottom) * t);
        }
    }

    for edge in Edge::ALL {
        if let Some(coarse_depth) = request.seams[edge.index()] {
            constrain_edge(
                &mut positions,
                request.address,
                edge,
                coarse_depth,
                g,
                &patch,
                source,
            );
        }
    }

    let normals = match settings.normals {
        NormalMode::Sphere => positions.iter().map(|p| p.normalize_or_zero()).collect(),
        NormalMode::Surface => grid_map(g, |s, t| {
            let (du, dv) = derivatives(&patch, source, s, t, step);
            du.cross(dv).normalize_or_zero()
        }),
    };

    let tangents = settings.tangents.then(|| {
        grid_map(g, |s, t| {
            let (du, _) = derivatives(&patch, source, s, t, step);
            du.normalize_or_zero().extend(1.0)
        })
    });

    let colors = positions
        .iter()
        .map(|p| source.color(*p, p.length()))
        .collect();

    let mut indices = Vec::with_capacity((g * g * 6) as usize);
    for j in 0..g {
        for i in 0..g {
            let v00 = j * n + i;
            let v10 = v00 + 1;
            let v01 = v00 + n;
            let v11 = v01 + 1;
            indices.extend_from_slice(&[v00, v10, v11, v00, v11, v01]);
        }
    }

    let mut min = DVec3::splat(f64::INFINITY);
    let mut max = DVec3::splat(f64::NEG_INFINITY);
    for p in &positions {
        min = min.min(*p);
        max = max.max(*p);
    }
    let mut origin = DVec3::ZERO;
    if settings.center_bounds {
        origin = (min + max) * 0.5;
        for p in &mut positions {
            *p -= origin;
        }
        min -= origin;
        max -= origin;
    }

    NodeMesh {
        origin,
        positions,
        normals,
        tangents,
        coords,
        colors,
        indices,
        bounds: (min, max),
        resolution: g,
    }
}

fn grid_map<T>(g: u32, f: impl Fn(f64, f64) -> T) -> Vec<T> {
    let step = 1.0 / f64::from(g);
    let n = g + 1;
    let mut out = Vec::with_capacity((n * n) as usize);
    for j in 0..n {
        for i in 0..n {
            out.push(f(f64::from(i) * step, f64::from(j) * step));
        }
    }
    out
}

/// Central differences of the deformed surface along `u` and `v`.
fn derivatives(patch: &Patch, source: &dyn MeshSource, s: f64, t: f64, h: f64) -> (DVec3, DVec3) {
    let du = source.surface_point(patch.cube_point(s + h, t))
        - source.surface_point(patch.cube_point(s - h, t));
    let dv = source.surface_point(patch.cube_point(s, t + h))
        - source.surface_point(patch.cube_point(s, t - h));
    (du, dv)
}

/// Move the vertices of `edge` onto the straight segments between the edge
/// vertices of a neighbour at `coarse_depth`.
fn constrain_edge(
    positions: &mut [DVec3],
    address: NodeAddress,
    edge: Edge,
    coarse_depth: u8,
    g: u32,
    patch: &Patch,
    source: &dyn MeshSource,
) {
    if coarse_depth >= address.depth {
        return;
    }
    let g = u64::from(g);
    // Fine quads per coarse quad.
    let r = 1u64 << (address.depth - coarse_depth);
    // This node's offset inside the coarse cell, in fine quads.
    let offset = (u64::from(address.edge_index(edge)) % r) * g;
    let inv_g = 1.0 / g as f64;

    for (k, index) in edge_vertex_indices(edge, g as u32).into_iter().enumerate() {
        let along = offset + k as u64;
        let rem = along % r;
        if rem == 0 {
            continue;
        }
        let start = (along - rem) as f64 - offset as f64;
        let p0 = source.surface_point(patch.edge_point(edge, start * inv_g));
        let p1 = source.surface_point(patch.edge_point(edge, (start + r as f64) * inv_g));
        let frac = rem as f64 / r as f64;
        positions[index as usize] = p0 + (p1 - p0) * frac;
    }
}

#[cfg(test)]
mod tests {
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;
    use terra_cubesphere::CubeFace;
    use terra_height::{HeightField, SimplexModifier, SimplexParams};
    use terra_lod::{NodeId, QuadTree, coarser_edges, edge_leaves, neighbor};

    use super::*;

    fn bumpy_field() -> HeightField {
        let mut field = HeightField::new(1.0);
        field.subscribe(Box::new(SimplexModifier::new(SimplexParams {
            frequency: 3.0,
            amplitude: 0.05,
            octaves: 4,
            seed: 5,
        })));
        field
    }

    fn request(tree: &QuadTree, id: NodeId) -> MeshRequest {
        let node = &tree[id];
        MeshRequest {
            address: node.address,
            corners: node.corners,
            coords: node.coords,
            seams: coarser_edges(tree, id),
        }
    }

    fn absolute_settings() -> MeshSettings {
        MeshSettings {
            subdivisions: 0,
            center_bounds: false,
            ..Default::default()
        }
    }

    fn point_segment_distance(p: DVec3, a: DVec3, b: DVec3) -> f64 {
        let ab = b - a;
        let t = ((p - a).dot(ab) / ab.length_squared()).clamp(0.0, 1.0);
        (a + ab * t - p).length()
    }

    /// Every edge vertex of `id` is either a vertex of, or lies on an edge
    /// segment of, a leaf across `edge`.
    fn assert_edge_watertight(
        tree: &QuadTree,
        id: NodeId,
        edge: Edge,
        field: &HeightField,
        settings: &MeshSettings,
    ) {
        let mesh = build_node_mesh(&request(tree, id), settings, field);
        let far_edge = neighbor(tree, id, edge).unwrap().edge;
        let mut vertices = Vec::new();
        let mut segments = Vec::new();
        for other in edge_leaves(tree, id, edge) {
            let other_mesh = build_node_mesh(&request(tree, other), settings, field);
            let row: Vec<DVec3> = edge_vertex_indices(far_edge, other_mesh.resolution)
                .into_iter()
                .map(|i| other_mesh.positions[i as usize])
                .collect();
            segments.extend(row.windows(2).map(|w| (w[0], w[1])));
            vertices.extend(row);
        }
        for idx in edge_vertex_indices(edge, mesh.resolution) {
            let p = mesh.positions[idx as usize];
            if vertices.contains(&p) {
                continue;
            }
            let best = segments
                .iter()
                .map(|&(a, b)| point_segment_distance(p, a, b))
                .fold(f64::INFINITY, f64::min);
            assert!(
                best < 1e-12,
                "{} {edge:?}: vertex {p} is {best} off the neighbour edge",
                tree[id].address
            );
        }
    }

    #[test]
    fn test_grid_shape_and_winding() {
        let field = HeightField::new(2.0);
        let tree = QuadTree::new(0);
        let id = tree.root(CubeFace::PosY);
        let mesh = build_node_mesh(&request(&tree, id), &absolute_settings(), &field);
        assert_eq!(mesh.vertex_count(), 25);
        assert_eq!(mesh.triangle_count(), 32);
        for tri in mesh.indices.chunks_exact(3) {
            let [a, b, c] = [0, 1, 2].map(|k| mesh.positions[tri[k] as usize]);
            let normal = (b - a).cross(c - a);
            assert!(normal.dot(a) > 0.0, "triangle must face outward");
        }
        for p in &mesh.positions {
            assert!((p.length() - 2.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_center_bounds_keeps_local_positions() {
        let field = bumpy_field();
        let tree = QuadTree::new(0);
        let id = tree.root(CubeFace::NegZ);
        let plain = build_node_mesh(&request(&tree, id), &absolute_settings(), &field);
        let centered = build_node_mesh(
            &request(&tree, id),
            &MeshSettings {
                center_bounds: true,
                ..absolute_settings()
            },
            &field,
        );
        assert_ne!(centered.origin, DVec3::ZERO);
        for i in 0..plain.vertex_count() {
            assert!((centered.local_position(i) - plain.positions[i]).length() < 1e-12);
        }
        let (min, max) = centered.bounds;
        assert!(((min + max) * 0.5).length() < 1e-12);
    }

    #[test]
    fn test_surface_normals_face_outward_and_tangents_follow_u() {
        let field = bumpy_field();
        let tree = QuadTree::new(0);
        let id = tree.root(CubeFace::PosX);
        let settings = MeshSettings {
            normals: NormalMode::Surface,
            tangents: true,
            ..absolute_settings()
        };
        let mesh = build_node_mesh(&request(&tree, id), &settings, &field);
        let tangents = mesh.tangents.as_ref().unwrap();
        for i in 0..mesh.vertex_count() {
            let p = mesh.positions[i];
            assert!(mesh.normals[i].dot(p.normalize()) > 0.5);
            assert!((mesh.normals[i].length() - 1.0).abs() < 1e-9);
            // +X face: u runs along -Z.
            assert!(tangents[i].truncate().dot(CubeFace::PosX.tangent()) > 0.0);
        }
    }

    #[test]
    fn test_edge_indices_touch_the_border() {
        for edge in Edge::ALL {
            let idx = edge_vertex_indices(edge, 8);
            assert_eq!(idx.len(), 9);
            for i in idx {
                let (x, y) = (i % 9, i / 9);
                let on = match edge {
                    Edge::West => x == 0,
                    Edge::East => x == 8,
                    Edge::South => y == 0,
                    Edge::North => y == 8,
                };
                assert!(on);
            }
        }
    }

    #[test]
    fn test_same_depth_edges_coincide_across_face_seams() {
        let field = bumpy_field();
        let mut tree = QuadTree::new(2);
        for face in CubeFace::ALL {
            let root = tree.root(face);
            tree.split(root);
        }
        for leaf in tree.leaves() {
            for edge in Edge::ALL {
                assert_edge_watertight(&tree, leaf, edge, &field, &absolute_settings());
            }
        }
    }

    #[test]
    fn test_coarser_neighbor_is_left_untouched() {
        let field = bumpy_field();
        let mut tree = QuadTree::new(2);
        let root = tree.root(CubeFace::PosZ);
        tree.split(root);
        let px = tree.root(CubeFace::PosX);
        let before = build_node_mesh(&request(&tree, px), &absolute_settings(), &field);
        let smooth = build_node_mesh(
            &MeshRequest {
                seams: [None; 4],
                ..request(&tree, px)
            },
            &absolute_settings(),
            &field,
        );
        assert_eq!(before, smooth);
    }

    #[test]
    fn test_mixed_depths_are_watertight_over_random_trees() {
        let field = bumpy_field();
        // Eight quads per edge covers every depth delta a three-level tree can produce.
        let settings = MeshSettings {
            subdivisions: 1,
            ..absolute_settings()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(31337);
        let mut checked_coarse = 0;
        for _ in 0..6 {
            let mut tree = QuadTree::new(3);
            for _ in 0..25 {
                let leaves = tree.leaves();
                let pick = leaves[rng.random_range(0..leaves.len())];
                tree.split(pick);
            }
            for leaf in tree.leaves() {
                let seams = coarser_edges(&tree, leaf);
                for edge in Edge::ALL {
                    let seam = seams[edge.index()];
                    if seam.is_some() && seam == tree[leaf].depth().checked_sub(1) {
                        checked_coarse += 1;
                    }
                    assert_edge_watertight(&tree, leaf, edge, &field, &settings);
                }
            }
        }
        assert!(checked_coarse > 0, "no depth-delta-one edges were generated");
    }
}

//! Collision triangle meshes.

use glam::DVec3;

use crate::NodeMesh;

/// Positions and triangles handed to the host's physics engine.
#[derive(Clone, Debug, PartialEq)]
pub struct ColliderMesh {
    /// Same convention as [`NodeMesh::origin`].
    pub origin: DVec3,
    pub positions: Vec<DVec3>,
    pub triangles: Vec<[u32; 3]>,
}

impl ColliderMesh {
    /// Collision geometry sharing the render mesh's surface.
    #[must_use]
    pub fn from_mesh(mesh: &NodeMesh) -> Self {
        Self {
            origin: mesh.origin,
            positions: mesh.positions.clone(),
            triangles: mesh
                .indices
                .chunks_exact(3)
                .map(|t| [t[0], t[1], t[2]])
                .collect(),
        }
    }

    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Closest vertex to `local_point` (terrain-local), as a cheap query for
    /// tests and debugging.
    #[must_use]
    pub fn nearest_vertex(&self, local_point: DVec3) -> Option<DVec3> {
        let target = local_point - self.origin;
        self.positions
            .iter()
            .min_by(|a, b| a.distance_squared(target).total_cmp(&b.distance_squared(target)))
            .map(|p| *p + self.origin)
    }
}

#[cfg(test)]
mod tests {
    use terra_cubesphere::{CubeFace, NodeAddress};
    use terra_height::HeightField;

    use super::*;
    use crate::{MeshRequest, MeshSettings, build_node_mesh};

    #[test]
    fn test_collider_shares_render_triangles() {
        let address = NodeAddress::new(CubeFace::NegY, 2, 1, 3);
        let request = MeshRequest {
            address,
            corners: address.cube_corners(),
            coords: address.corner_coords(),
            seams: [None; 4],
        };
        let mesh = build_node_mesh(&request, &MeshSettings::default(), &HeightField::new(3.0));
        let collider = ColliderMesh::from_mesh(&mesh);
        assert_eq!(collider.triangle_count(), mesh.triangle_count());
        assert_eq!(collider.triangles[0], [0, 1, 10]);

        let corner = mesh.local_position(0);
        assert_eq!(collider.nearest_vertex(corner * 1.01), Some(corner));
    }
}

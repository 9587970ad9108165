//! Interleaved GPU vertex layout for node meshes.

use bytemuck::{Pod, Zeroable};

use crate::NodeMesh;

/// One interleaved vertex, 64 bytes.
///
/// Positions are relative to [`NodeMesh::origin`] so that `f32` keeps
/// precision on large planets.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct TerrainVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    /// Face UV.
    pub uv: [f32; 2],
    pub color: [f32; 4],
    /// Zero when the mesh has no tangents.
    pub tangent: [f32; 4],
}

const _: () = assert!(std::mem::size_of::<TerrainVertex>() == 64);

impl NodeMesh {
    /// Flatten the mesh into GPU vertices.
    #[must_use]
    pub fn to_vertices(&self) -> Vec<TerrainVertex> {
        (0..self.positions.len())
            .map(|i| TerrainVertex {
                position: self.positions[i].as_vec3().to_array(),
                normal: self.normals[i].as_vec3().to_array(),
                uv: self.coords[i].as_vec2().to_array(),
                color: self.colors[i].to_array(),
                tangent: self
                    .tangents
                    .as_ref()
                    .map_or([0.0; 4], |t| t[i].as_vec4().to_array()),
            })
            .collect()
    }

    /// Index buffer as bytes for upload.
    #[must_use]
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}

/// View a vertex slice as bytes for upload.
#[must_use]
pub fn vertex_bytes(vertices: &[TerrainVertex]) -> &[u8] {
    bytemuck::cast_slice(vertices)
}

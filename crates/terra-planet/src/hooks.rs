//! Callback traits the terrain invokes while building node resources.
//!
//! Every trait has a blanket implementation for matching closures, so small
//! hooks can be registered inline.

use glam::{DVec2, DVec3, Vec4};
use terra_cubesphere::{CubeFace, NodeAddress};
use terra_lod::NodeId;
use terra_mesh::NodeMesh;

use crate::MaterialId;

/// The node a face hook is called for.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FaceInfo {
    pub node: NodeId,
    pub address: NodeAddress,
}

impl FaceInfo {
    #[must_use]
    pub fn new(node: NodeId, address: NodeAddress) -> Self {
        Self { node, address }
    }

    #[inline]
    #[must_use]
    pub fn face(&self) -> CubeFace {
        self.address.face
    }

    #[inline]
    #[must_use]
    pub fn depth(&self) -> u8 {
        self.address.depth
    }

    /// Cube-space corners, `[BL, BR, TL, TR]`.
    #[must_use]
    pub fn corners(&self) -> [DVec3; 4] {
        self.address.cube_corners()
    }

    #[must_use]
    pub fn coords(&self) -> [DVec2; 4] {
        self.address.corner_coords()
    }
}

/// Adjusts the colour of a mesh vertex.
pub trait ColorModifier: Send + Sync {
    fn modify_color(&self, local_position: DVec3, height: f64, color: &mut Vec4);
}

impl<F> ColorModifier for F
where
    F: Fn(DVec3, f64, &mut Vec4) + Send + Sync,
{
    fn modify_color(&self, local_position: DVec3, height: f64, color: &mut Vec4) {
        self(local_position, height, color)
    }
}

/// Picks the material of a node's mesh.
pub trait MaterialModifier: Send + Sync {
    fn modify_material(&self, face: &FaceInfo, material: &mut MaterialId);
}

impl<F> MaterialModifier for F
where
    F: Fn(&FaceInfo, &mut MaterialId) + Send + Sync,
{
    fn modify_material(&self, face: &FaceInfo, material: &mut MaterialId) {
        self(face, material)
    }
}

/// Notified when a node is created or destroyed.
pub trait FaceHook: Send + Sync {
    fn on_face(&self, face: &FaceInfo);
}

impl<F> FaceHook for F
where
    F: Fn(&FaceInfo) + Send + Sync,
{
    fn on_face(&self, face: &FaceInfo) {
        self(face)
    }
}

/// Edits a freshly built mesh before it is published.
pub trait VertexPostProcess: Send + Sync {
    fn post_process(&self, face: &FaceInfo, mesh: &mut NodeMesh);
}

impl<F> VertexPostProcess for F
where
    F: Fn(&FaceInfo, &mut NodeMesh) + Send + Sync,
{
    fn post_process(&self, face: &FaceInfo, mesh: &mut NodeMesh) {
        self(face, mesh)
    }
}

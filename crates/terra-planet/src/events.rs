//! Resource change events queued for the host.

use terra_cubesphere::NodeAddress;
use terra_lod::NodeId;

/// Resource changes reported to the host, in emission order.
///
/// Node ids are recycled after release, so a `MeshReleased` for an id may be
/// followed by a `MeshUpdated` for a new node under the same id in one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TerrainEvent {
    MeshUpdated { node: NodeId, address: NodeAddress },
    MeshReleased { node: NodeId, address: NodeAddress },
    ColliderUpdated { node: NodeId, address: NodeAddress },
    ColliderReleased { node: NodeId, address: NodeAddress },
}

impl TerrainEvent {
    #[must_use]
    pub fn node(&self) -> NodeId {
        match *self {
            TerrainEvent::MeshUpdated { node, .. }
            | TerrainEvent::MeshReleased { node, .. }
            | TerrainEvent::ColliderUpdated { node, .. }
            | TerrainEvent::ColliderReleased { node, .. } => node,
        }
    }

    #[must_use]
    pub fn address(&self) -> NodeAddress {
        match *self {
            TerrainEvent::MeshUpdated { address, .. }
            | TerrainEvent::MeshReleased { address, .. }
            | TerrainEvent::ColliderUpdated { address, .. }
            | TerrainEvent::ColliderReleased { address, .. } => address,
        }
    }
}

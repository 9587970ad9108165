//! Arena-backed quadtrees, one per cube face.
//!
//! Nodes live in a slot vector addressed by [`NodeId`]; merged subtrees go
//! back to a free list and their slots are reused by later splits. Parents
//! own their children exclusively. Neighbour links are not stored; see
//! [`crate::neighbor`].

use std::ops::Index;

use glam::{DVec2, DVec3};
use terra_cubesphere::{CubeFace, MAX_DEPTH, NodeAddress};

/// Handle of a node in a [`QuadTree`]. Stale after the node is released.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One node of a face quadtree.
#[derive(Clone, Debug, PartialEq)]
pub struct QuadNode {
    pub address: NodeAddress,
    /// Corners on the `[-1, 1]` cube surface, `[BL, BR, TL, TR]`.
    pub corners: [DVec3; 4],
    /// Face UV of the same corners.
    pub coords: [DVec2; 4],
    pub parent: Option<NodeId>,
    /// Children in `[BL, BR, TL, TR]` order when split.
    pub children: Option<[NodeId; 4]>,
}

impl QuadNode {
    #[inline]
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    #[inline]
    #[must_use]
    pub fn depth(&self) -> u8 {
        self.address.depth
    }

    #[inline]
    #[must_use]
    pub fn face(&self) -> CubeFace {
        self.address.face
    }

    /// Cube-space centre of the node.
    #[must_use]
    pub fn center(&self) -> DVec3 {
        let [bl, _, _, tr] = self.corners;
        (bl + tr) * 0.5
    }
}

/// A node removed by [`QuadTree::merge`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReleasedNode {
    pub id: NodeId,
    pub address: NodeAddress,
}

/// The six face quadtrees of a cube-sphere.
#[derive(Clone, Debug)]
pub struct QuadTree {
    slots: Vec<Option<QuadNode>>,
    free: Vec<u32>,
    roots: [NodeId; 6],
    max_depth: u8,
}

impl QuadTree {
    /// Six unsplit roots. `max_depth` is clamped to [`MAX_DEPTH`].
    #[must_use]
    pub fn new(max_depth: u8) -> Self {
        let mut tree = Self {
            slots: Vec::with_capacity(6),
            free: Vec::new(),
            roots: [NodeId(0); 6],
            max_depth: max_depth.min(MAX_DEPTH),
        };
        for face in CubeFace::ALL {
            let address = NodeAddress::root(face);
            let id = tree.alloc(QuadNode {
                address,
                corners: address.cube_corners(),
                coords: address.corner_coords(),
                parent: None,
                children: None,
            });
            tree.roots[face.index()] = id;
        }
        tree
    }

    fn alloc(&mut self, node: QuadNode) -> NodeId {
        match self.free.pop() {
            Some(slot) => {
                self.slots[slot as usize] = Some(node);
                NodeId(slot)
            }
            None => {
                self.slots.push(Some(node));
                NodeId(self.slots.len() as u32 - 1)
            }
        }
    }

    #[inline]
    #[must_use]
    pub fn root(&self, face: CubeFace) -> NodeId {
        self.roots[face.index()]
    }

    #[must_use]
    pub fn roots(&self) -> [NodeId; 6] {
        self.roots
    }

    #[inline]
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&QuadNode> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    #[must_use]
    pub fn max_depth(&self) -> u8 {
        self.max_depth
    }

    /// Change the split limit. Existing deeper nodes are left for the
    /// controller to merge.
    pub fn set_max_depth(&mut self, max_depth: u8) {
        self.max_depth = max_depth.min(MAX_DEPTH);
    }

    /// Number of live nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every live node id, in slot order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_some())
            .map(|(i, _)| NodeId(i as u32))
    }

    /// Subdivide a leaf into four children by bisecting its corners.
    ///
    /// Returns `false` (and does nothing) for a split node, a stale id, or a
    /// node already at the depth limit.
    pub fn split(&mut self, id: NodeId) -> bool {
        let Some(node) = self.get(id) else {
            return false;
        };
        if !node.is_leaf() || node.depth() >= self.max_depth {
            return false;
        }
        let Some(addresses) = node.address.children() else {
            return false;
        };
        let corners = bisect(node.corners);
        let coords = bisect(node.coords);

        let mut children = [NodeId(0); 4];
        for slot in 0..4 {
            children[slot] = self.alloc(QuadNode {
                address: addresses[slot],
                corners: corners[slot],
                coords: coords[slot],
                parent: Some(id),
                children: None,
            });
        }
        if let Some(Some(node)) = self.slots.get_mut(id.index()) {
            node.children = Some(children);
        }
        true
    }

    /// Collapse a split node back into a leaf, releasing every descendant.
    ///
    /// Released nodes are reported deepest first (post-order). A leaf or a
    /// stale id yields an empty list.
    pub fn merge(&mut self, id: NodeId) -> Vec<ReleasedNode> {
        let mut released = Vec::new();
        let children = match self.slots.get_mut(id.index()) {
            Some(Some(node)) => node.children.take(),
            _ => None,
        };
        if let Some(children) = children {
            for child in children {
                self.release(child, &mut released);
            }
        }
        released
    }

    fn release(&mut self, id: NodeId, out: &mut Vec<ReleasedNode>) {
        let Some(node) = self.slots.get_mut(id.index()).and_then(Option::take) else {
            return;
        };
        if let Some(children) = node.children {
            for child in children {
                self.release(child, out);
            }
        }
        self.free.push(id.0);
        out.push(ReleasedNode {
            id,
            address: node.address,
        });
    }

    /// Leaves of every face, face by face, children in `[BL, BR, TL, TR]` order.
    #[must_use]
    pub fn leaves(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        for root in self.roots {
            self.collect_leaves(root, &mut out);
        }
        out
    }

    /// Leaves in the subtree rooted at `id` (the node itself when a leaf).
    #[must_use]
    pub fn leaves_under(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_leaves(id, &mut out);
        out
    }

    fn collect_leaves(&self, id: NodeId, out: &mut Vec<NodeId>) {
        let Some(node) = self.get(id) else {
            return;
        };
        match node.children {
            None => out.push(id),
            Some(children) => {
                for child in children {
                    self.collect_leaves(child, out);
                }
            }
        }
    }

    /// The deepest existing node that is `address` or one of its ancestors.
    #[must_use]
    pub fn find_deepest(&self, address: &NodeAddress) -> NodeId {
        let mut id = self.root(address.face);
        loop {
            let node = &self[id];
            let next = match node.children {
                Some(children) if node.depth() < address.depth => {
                    let slot = address.ancestor_at(node.depth() + 1).child_slot();
                    children[slot]
                }
                _ => return id,
            };
            id = next;
        }
    }

    /// The live node at exactly `address`, if the tree reaches that deep.
    #[must_use]
    pub fn find(&self, address: &NodeAddress) -> Option<NodeId> {
        let id = self.find_deepest(address);
        (self[id].address == *address).then_some(id)
    }
}

impl Index<NodeId> for QuadTree {
    type Output = QuadNode;

    /// # Panics
    ///
    /// Panics on a released id; use [`QuadTree::get`] to check first.
    fn index(&self, id: NodeId) -> &QuadNode {
        match self.get(id) {
            Some(node) => node,
            None => panic!("stale node id {id:?}"),
        }
    }
}

/// Split a `[BL, BR, TL, TR]` quad into its four child quads.
fn bisect<T>(c: [T; 4]) -> [[T; 4]; 4]
where
    T: Copy + std::ops::Add<Output = T> + std::ops::Mul<f64, Output = T>,
{
    let [bl, br, tl, tr] = c;
    let bottom = (bl + br) * 0.5;
    let top = (tl + tr) * 0.5;
    let left = (bl + tl) * 0.5;
    let right = (br + tr) * 0.5;
    let center = (bottom + top) * 0.5;
    [
        [bl, bottom, left, center],
        [bottom, br, center, right],
        [left, center, tl, top],
        [center, right, top, tr],
    ]
}

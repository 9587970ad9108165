//! Neighbour resolution across depths and cube-face seams.
//!
//! Neighbours are derived on demand from node addresses and the static face
//! adjacency table, so splits and merges never have to patch links.

use terra_cubesphere::{CrossEdge, Edge};
use tracing::warn;

use crate::{NodeId, QuadTree};

/// The node currently seen across an edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Neighbor {
    /// Same-depth node if it exists, otherwise its deepest live ancestor.
    pub node: NodeId,
    /// Edge of the same-depth cell that faces back.
    pub edge: Edge,
    /// Whether the edge parameter runs backwards on the neighbour side.
    pub flipped: bool,
}

/// Resolve the effective neighbour of `id` across `edge`.
///
/// The result is at the same depth when the far side is as fine or finer
/// (possibly a split node), or a shallower leaf when it is coarser. Returns
/// `None` for a stale id.
#[must_use]
pub fn neighbor(tree: &QuadTree, id: NodeId, edge: Edge) -> Option<Neighbor> {
    let node = tree.get(id)?;
    let cross: CrossEdge = node.address.neighbor(edge);
    let mut found = tree.find_deepest(&cross.address);
    let reached = tree[found].address.contains(&cross.address);
    debug_assert!(reached, "neighbour walk for {} left the target cell", node.address);
    if !reached {
        warn!(
            "Neighbour of {} across {edge:?} not found, falling back to the face root",
            node.address
        );
        found = tree.root(cross.address.face);
    }
    Some(Neighbor {
        node: found,
        edge: cross.edge,
        flipped: cross.flipped,
    })
}

/// Every leaf on the far side of `edge` of `id`, ordered by increasing edge
/// parameter on this node's side.
#[must_use]
pub fn edge_leaves(tree: &QuadTree, id: NodeId, edge: Edge) -> Vec<NodeId> {
    let Some(n) = neighbor(tree, id, edge) else {
        return Vec::new();
    };
    let mut out = Vec::new();
    collect_edge_leaves(tree, n.node, n.edge, &mut out);
    if n.flipped {
        out.reverse();
    }
    out
}

fn collect_edge_leaves(tree: &QuadTree, id: NodeId, edge: Edge, out: &mut Vec<NodeId>) {
    match tree[id].children {
        None => out.push(id),
        Some(children) => {
            for slot in edge.child_slots() {
                collect_edge_leaves(tree, children[slot], edge, out);
            }
        }
    }
}

/// Depth of the neighbour across each edge (`[W, E, S, N]`) when it is
/// shallower than `id`, `None` where the far side is at least as fine.
#[must_use]
pub fn coarser_edges(tree: &QuadTree, id: NodeId) -> [Option<u8>; 4] {
    let Some(node) = tree.get(id) else {
        return [None; 4];
    };
    let depth = node.depth();
    Edge::ALL.map(|edge| {
        neighbor(tree, id, edge)
            .map(|n| tree[n.node].depth())
            .filter(|&d| d < depth)
    })
}

#[cfg(test)]
mod tests {
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;
    use terra_cubesphere::{CubeFace, NodeAddress};

    use super::*;

    fn split_path(tree: &mut QuadTree, face: CubeFace, slots: &[usize]) -> NodeId {
        let mut id = tree.root(face);
        for &slot in slots {
            tree.split(id);
            id = tree[id].children.unwrap()[slot];
        }
        id
    }

    #[test]
    fn test_sibling_neighbors() {
        let mut tree = QuadTree::new(4);
        let root = tree.root(CubeFace::PosZ);
        tree.split(root);
        let kids = tree[root].children.unwrap();
        let n = neighbor(&tree, kids[0], Edge::East).unwrap();
        assert_eq!(n.node, kids[1]);
        assert_eq!(n.edge, Edge::West);
        let n = neighbor(&tree, kids[0], Edge::North).unwrap();
        assert_eq!(n.node, kids[2]);
    }

    #[test]
    fn test_coarser_neighbor_across_face_seam() {
        let mut tree = QuadTree::new(4);
        // East column of +Z touches the west edge of +X.
        let fine = split_path(&mut tree, CubeFace::PosZ, &[1, 3]);
        let n = neighbor(&tree, fine, Edge::East).unwrap();
        assert_eq!(n.node, tree.root(CubeFace::PosX));
        assert_eq!(n.edge, Edge::West);
        assert_eq!(coarser_edges(&tree, fine)[Edge::East.index()], Some(0));
        assert_eq!(coarser_edges(&tree, fine)[Edge::West.index()], None);
    }

    #[test]
    fn test_finer_neighbor_lists_every_touching_leaf() {
        let mut tree = QuadTree::new(4);
        split_path(&mut tree, CubeFace::PosX, &[0, 0]);
        let px = tree.root(CubeFace::PosX);
        let pz = tree.root(CubeFace::PosZ);

        let n = neighbor(&tree, pz, Edge::East).unwrap();
        assert_eq!(n.node, px, "same depth, even though split");

        let leaves = edge_leaves(&tree, pz, Edge::East);
        // Two depth-2 cells and one depth-1 cell along +X west edge.
        let depths: Vec<u8> = leaves.iter().map(|&l| tree[l].depth()).collect();
        assert_eq!(depths, vec![2, 2, 1]);
        for l in leaves {
            assert_eq!(tree[l].address.x, 0, "leaf must touch u = 0");
        }
    }

    #[test]
    fn test_flipped_edge_leaves_follow_local_order() {
        let mut tree = QuadTree::new(3);
        // +X south borders -Y east with a flip.
        let py = tree.root(CubeFace::NegY);
        tree.split(py);
        let px = tree.root(CubeFace::PosX);
        let leaves = edge_leaves(&tree, px, Edge::South);
        assert_eq!(leaves.len(), 2);
        let first = tree[leaves[0]].address;
        let second = tree[leaves[1]].address;
        // Increasing u on +X maps to decreasing v on -Y.
        assert!(first.y > second.y);
    }

    #[test]
    fn test_split_then_merge_restores_neighbors() {
        let mut tree = QuadTree::new(5);
        let mut rng = ChaCha8Rng::seed_from_u64(77);
        for _ in 0..40 {
            let leaves = tree.leaves();
            let pick = leaves[rng.random_range(0..leaves.len())];
            tree.split(pick);
        }

        let leaves = tree.leaves();
        let snapshot: Vec<[Option<Neighbor>; 4]> = leaves
            .iter()
            .map(|&l| Edge::ALL.map(|e| neighbor(&tree, l, e)))
            .collect();

        let target = leaves[rng.random_range(0..leaves.len())];
        if tree.split(target) {
            let released = tree.merge(target);
            assert_eq!(released.len(), 4);
        }

        assert_eq!(tree.leaves(), leaves);
        for (l, before) in leaves.iter().zip(&snapshot) {
            assert_eq!(Edge::ALL.map(|e| neighbor(&tree, *l, e)), *before);
        }
    }

    #[test]
    fn test_neighbor_of_same_depth_cell_is_mutual() {
        let mut tree = QuadTree::new(3);
        for face in CubeFace::ALL {
            let root = tree.root(face);
            tree.split(root);
        }
        for leaf in tree.leaves() {
            for edge in Edge::ALL {
                let n = neighbor(&tree, leaf, edge).unwrap();
                let back = neighbor(&tree, n.node, n.edge).unwrap();
                assert_eq!(back.node, leaf);
                assert_eq!(back.edge, edge);
                let a: NodeAddress = tree[leaf].address;
                assert_ne!(tree[n.node].address.face, a.face.opposite());
            }
        }
    }
}

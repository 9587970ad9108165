//! Distance-driven split/merge pass over the whole cube-sphere.

use std::collections::BTreeSet;

use glam::DVec3;
use terra_cubesphere::Edge;
use tracing::debug;

use crate::{LodThresholds, NodeId, QuadTree, ReleasedNode, edge_leaves};

/// What one [`update_states`] pass changed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LodReport {
    /// Nodes that were split, in visit order.
    pub split: Vec<NodeId>,
    /// Nodes that were merged back into leaves, in visit order.
    pub merged: Vec<NodeId>,
    /// Children created by the splits.
    pub spawned: Vec<NodeId>,
    /// Descendants released by the merges, deepest first per merge.
    pub released: Vec<ReleasedNode>,
    /// Live leaves whose mesh must be rebuilt: new leaves and the leaves
    /// bordering every node whose depth changed.
    pub stale: BTreeSet<NodeId>,
}

impl LodReport {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.split.is_empty() && self.merged.is_empty()
    }
}

/// Squared distance from the nearest viewer to the nearest of the node's
/// deformed sample points (centre and four corners). Infinite without viewers.
#[must_use]
pub fn node_distance_squared(
    tree: &QuadTree,
    id: NodeId,
    viewers: &[DVec3],
    surface: &dyn Fn(DVec3) -> DVec3,
) -> f64 {
    let Some(node) = tree.get(id) else {
        return f64::INFINITY;
    };
    if viewers.is_empty() {
        return f64::INFINITY;
    }
    let mut best = f64::INFINITY;
    for sample in std::iter::once(node.center()).chain(node.corners) {
        let p = surface(sample);
        for viewer in viewers {
            best = best.min(p.distance_squared(*viewer));
        }
    }
    best
}

/// Split nodes that are close enough and merge subtrees that are not.
///
/// Split decisions are made before visiting children, so a fresh split is
/// refined further in the same pass. A node that no longer wants detail
/// evaluates its children first and merges once all of them are leaves.
/// Running the pass twice with the same inputs changes nothing the second time.
pub fn update_states(
    tree: &mut QuadTree,
    thresholds: &LodThresholds,
    viewers: &[DVec3],
    surface: &dyn Fn(DVec3) -> DVec3,
) -> LodReport {
    let mut report = LodReport::default();
    for root in tree.roots() {
        visit(tree, root, thresholds, viewers, surface, &mut report);
    }

    let mut changed: Vec<NodeId> = report.split.clone();
    changed.extend(&report.merged);
    for id in changed {
        if !tree.contains(id) {
            continue;
        }
        report.stale.extend(tree.leaves_under(id));
        for edge in Edge::ALL {
            report.stale.extend(edge_leaves(tree, id, edge));
        }
    }

    if !report.is_empty() {
        debug!(
            "LOD pass: {} split, {} merged, {} released, {} stale leaves",
            report.split.len(),
            report.merged.len(),
            report.released.len(),
            report.stale.len()
        );
    }
    report
}

fn visit(
    tree: &mut QuadTree,
    id: NodeId,
    thresholds: &LodThresholds,
    viewers: &[DVec3],
    surface: &dyn Fn(DVec3) -> DVec3,
    report: &mut LodReport,
) {
    let Some(node) = tree.get(id) else {
        return;
    };
    let depth = node.depth();
    let was_leaf = node.is_leaf();
    let distance_sq = node_distance_squared(tree, id, viewers, surface);
    let wants_split = depth < tree.max_depth() && thresholds.wants_split(depth, distance_sq);

    if wants_split && was_leaf && tree.split(id) {
        report.split.push(id);
        report.spawned.extend(tree[id].children.into_iter().flatten());
    }

    let Some(children) = tree[id].children else {
        return;
    };
    for child in children {
        visit(tree, child, thresholds, viewers, surface, report);
    }

    if !wants_split && children.iter().all(|&c| tree[c].is_leaf()) {
        report.released.extend(tree.merge(id));
        report.merged.push(id);
    }
}

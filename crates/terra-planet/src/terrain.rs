//! The planet root: settings, height field, quadtree and per-node resources.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use glam::{DVec3, Vec4};
use terra_config::Config;
use terra_cubesphere::NodeAddress;
use terra_height::{HeightField, HeightModifier, HookId, HookList};
use terra_lod::{LodReport, LodThresholds, NodeId, QuadNode, QuadTree, coarser_edges};
use terra_mesh::{
    ColliderMesh, MAX_SUBDIVISIONS, MeshRequest, MeshSource, NodeMesh, NormalMode, build_node_mesh,
};
use tracing::{debug, info};

use crate::settings::validate_radius;
use crate::{
    ColorModifier, FaceHook, FaceInfo, MaterialId, MaterialModifier, TerrainError, TerrainEvent,
    TerrainSettings, VertexPostProcess, build_modifier,
};

/// Counters for diagnostics and tests.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TerrainStats {
    pub ticks: u64,
    pub rebuilds: u64,
    pub meshes_built: u64,
    pub colliders_built: u64,
}

struct RenderMesh {
    mesh: NodeMesh,
    material: MaterialId,
}

#[derive(Default)]
struct DirtyState {
    rebuild: bool,
    renderers: bool,
    colliders: bool,
    meshes: BTreeSet<NodeId>,
    collider_nodes: BTreeSet<NodeId>,
}

/// Height field plus colour hooks, as seen by the mesher.
struct HookedSource<'a> {
    field: &'a HeightField,
    colors: &'a HookList<dyn ColorModifier>,
}

impl MeshSource for HookedSource<'_> {
    fn surface_height(&self, direction: DVec3) -> f64 {
        self.field.height(direction)
    }

    fn color(&self, local_position: DVec3, height: f64) -> Vec4 {
        let mut color = Vec4::ONE;
        for hook in self.colors.iter() {
            hook.modify_color(local_position, height, &mut color);
        }
        color
    }
}

/// A planet: six face quadtrees refined around the targets, with one mesh
/// per leaf and colliders down to `max_collider_depth`.
///
/// Mutators only record what became stale; [`Terrain::update`] does the
/// work once per tick and queues [`TerrainEvent`]s for the host.
pub struct Terrain {
    settings: TerrainSettings,
    field: HeightField,
    tree: QuadTree,
    targets: Vec<DVec3>,
    colors: HookList<dyn ColorModifier>,
    materials: HookList<dyn MaterialModifier>,
    spawn_hooks: HookList<dyn FaceHook>,
    despawn_hooks: HookList<dyn FaceHook>,
    post_process: HookList<dyn VertexPostProcess>,
    meshes: BTreeMap<NodeId, RenderMesh>,
    colliders: BTreeMap<NodeId, ColliderMesh>,
    dirty: DirtyState,
    events: Vec<TerrainEvent>,
    stats: TerrainStats,
    started: bool,
}

impl Terrain {
    pub fn new(settings: TerrainSettings) -> Result<Self, TerrainError> {
        settings.validate()?;
        let tree = QuadTree::new(settings.thresholds.max_depth());
        Ok(Self {
            field: HeightField::new(settings.radius),
            tree,
            settings,
            targets: Vec::new(),
            colors: HookList::new(),
            materials: HookList::new(),
            spawn_hooks: HookList::new(),
            despawn_hooks: HookList::new(),
            post_process: HookList::new(),
            meshes: BTreeMap::new(),
            colliders: BTreeMap::new(),
            dirty: DirtyState {
                renderers: true,
                colliders: true,
                ..Default::default()
            },
            events: Vec::new(),
            stats: TerrainStats::default(),
            started: false,
        })
    }

    /// Build a terrain and its height modifiers from a loaded config.
    /// Relative heightmap paths resolve against `base_dir`.
    pub fn from_config(config: &Config, base_dir: &Path) -> Result<Self, TerrainError> {
        let mut terrain = Self::new(TerrainSettings::from_config(&config.terrain)?)?;
        for entry in &config.modifiers {
            terrain.subscribe_height(build_modifier(entry, base_dir)?);
        }
        info!(
            "Terrain created: radius {}, {} modifiers, max depth {}",
            terrain.settings.radius,
            config.modifiers.len(),
            terrain.tree.max_depth()
        );
        Ok(terrain)
    }

    /// Run one tick: pending rebuild, LOD pass, mesh flush, collider flush.
    pub fn update(&mut self) -> LodReport {
        if self.dirty.rebuild {
            self.dirty.rebuild = false;
            self.stats.rebuilds += 1;
            info!("Rebuilding terrain (radius {})", self.settings.radius);
            self.dirty.renderers = true;
            self.dirty.colliders = true;
        }

        let report = self.update_states();

        if self.dirty.renderers {
            self.update_renderers();
        } else {
            for id in std::mem::take(&mut self.dirty.meshes) {
                if self.tree.get(id).is_some_and(QuadNode::is_leaf) {
                    self.store_mesh(id);
                }
            }
        }
        if self.dirty.colliders {
            self.update_colliders();
        } else {
            for id in std::mem::take(&mut self.dirty.collider_nodes) {
                if self.tree.contains(id) {
                    self.refresh_collider(id);
                }
            }
        }

        self.stats.ticks += 1;
        report
    }

    /// Regenerate every mesh and collider now.
    pub fn rebuild(&mut self) {
        self.dirty.rebuild = false;
        self.stats.rebuilds += 1;
        info!("Rebuilding terrain (radius {})", self.settings.radius);
        self.update_renderers();
        self.update_colliders();
    }

    /// Split and merge nodes around the targets now. Resources of released
    /// nodes are dropped immediately; new and neighbouring leaves are queued.
    /// The first call also fires the spawn hooks of the six roots.
    pub fn update_states(&mut self) -> LodReport {
        if !self.started {
            self.started = true;
            for root in self.tree.roots() {
                let info = FaceInfo::new(root, self.tree[root].address);
                fire(&self.spawn_hooks, &info);
            }
        }
        let field = &self.field;
        let surface = |p: DVec3| field.surface_point(p);
        let report = terra_lod::update_states(
            &mut self.tree,
            &self.settings.thresholds,
            &self.targets,
            &surface,
        );

        for released in &report.released {
            self.release_resources(released.id, released.address);
        }
        for &id in &report.split {
            let address = self.tree[id].address;
            if self.meshes.remove(&id).is_some() {
                self.events.push(TerrainEvent::MeshReleased { node: id, address });
            }
            self.dirty.meshes.remove(&id);
            self.dirty.collider_nodes.insert(id);
        }
        self.dirty.collider_nodes.extend(&report.merged);
        for &id in &report.spawned {
            if let Some(node) = self.tree.get(id) {
                fire(&self.spawn_hooks, &FaceInfo::new(id, node.address));
            }
        }
        self.dirty.meshes.extend(&report.stale);
        for &id in &report.stale {
            let owner = self.collider_owner(id);
            self.dirty.collider_nodes.insert(owner);
        }
        report
    }

    /// Rebuild the mesh of every leaf now.
    pub fn update_renderers(&mut self) {
        self.dirty.renderers = false;
        self.dirty.meshes.clear();
        let inner: Vec<NodeId> = self
            .meshes
            .keys()
            .copied()
            .filter(|&id| !self.tree.get(id).is_some_and(QuadNode::is_leaf))
            .collect();
        for id in inner {
            self.meshes.remove(&id);
            if let Some(node) = self.tree.get(id) {
                self.events.push(TerrainEvent::MeshReleased {
                    node: id,
                    address: node.address,
                });
            }
        }
        let leaves = self.tree.leaves();
        debug!("Rebuilding {} leaf meshes", leaves.len());
        for id in leaves {
            self.store_mesh(id);
        }
    }

    /// Create, rebuild or drop the collider of every node now.
    pub fn update_colliders(&mut self) {
        self.dirty.colliders = false;
        self.dirty.collider_nodes.clear();
        let ids: Vec<NodeId> = self.tree.ids().collect();
        for id in ids {
            self.refresh_collider(id);
        }
    }

    pub fn mark_rebuild(&mut self) {
        self.dirty.rebuild = true;
    }

    pub fn mark_renderers_dirty(&mut self) {
        self.dirty.renderers = true;
    }

    pub fn mark_colliders_dirty(&mut self) {
        self.dirty.colliders = true;
    }

    pub fn set_radius(&mut self, radius: f64) -> Result<(), TerrainError> {
        validate_radius(radius)?;
        self.settings.radius = radius;
        self.field.set_radius(radius);
        self.mark_rebuild();
        Ok(())
    }

    pub fn set_subdivisions(&mut self, subdivisions: u8) {
        self.settings.mesh.subdivisions = subdivisions.min(MAX_SUBDIVISIONS);
        self.mark_rebuild();
    }

    pub fn set_normal_mode(&mut self, normals: NormalMode) {
        self.settings.mesh.normals = normals;
        self.mark_rebuild();
    }

    pub fn set_tangents(&mut self, tangents: bool) {
        self.settings.mesh.tangents = tangents;
        self.mark_rebuild();
    }

    pub fn set_center_bounds(&mut self, center_bounds: bool) {
        self.settings.mesh.center_bounds = center_bounds;
        self.mark_rebuild();
    }

    /// Replace the distance table. Nodes past the new maximum depth merge on
    /// the next LOD pass.
    pub fn set_thresholds(&mut self, thresholds: LodThresholds) {
        self.tree.set_max_depth(thresholds.max_depth());
        self.settings.thresholds = thresholds;
    }

    pub fn set_max_collider_depth(&mut self, depth: u8) {
        self.settings.max_collider_depth = depth;
        self.mark_colliders_dirty();
    }

    pub fn set_base_material(&mut self, material: MaterialId) {
        self.settings.base_material = material;
        self.mark_renderers_dirty();
    }

    /// Viewer points in terrain-local space.
    pub fn set_targets(&mut self, targets: &[DVec3]) {
        self.targets.clear();
        self.targets.extend_from_slice(targets);
    }

    pub fn subscribe_height(&mut self, modifier: Box<dyn HeightModifier>) -> HookId {
        self.mark_rebuild();
        self.field.subscribe(modifier)
    }

    pub fn unsubscribe_height(&mut self, id: HookId) -> bool {
        let removed = self.field.unsubscribe(id);
        if removed {
            self.mark_rebuild();
        }
        removed
    }

    pub fn replace_height(&mut self, id: HookId, modifier: Box<dyn HeightModifier>) -> bool {
        let replaced = self.field.replace(id, modifier);
        if replaced {
            self.mark_rebuild();
        }
        replaced
    }

    pub fn subscribe_color(&mut self, hook: Box<dyn ColorModifier>) -> HookId {
        self.mark_renderers_dirty();
        self.colors.subscribe(hook)
    }

    pub fn unsubscribe_color(&mut self, id: HookId) -> bool {
        let removed = self.colors.unsubscribe(id);
        if removed {
            self.mark_renderers_dirty();
        }
        removed
    }

    pub fn subscribe_material(&mut self, hook: Box<dyn MaterialModifier>) -> HookId {
        self.mark_renderers_dirty();
        self.materials.subscribe(hook)
    }

    pub fn unsubscribe_material(&mut self, id: HookId) -> bool {
        let removed = self.materials.unsubscribe(id);
        if removed {
            self.mark_renderers_dirty();
        }
        removed
    }

    /// Post-process hooks also shape the colliders.
    pub fn subscribe_post_process(&mut self, hook: Box<dyn VertexPostProcess>) -> HookId {
        self.mark_renderers_dirty();
        self.mark_colliders_dirty();
        self.post_process.subscribe(hook)
    }

    pub fn unsubscribe_post_process(&mut self, id: HookId) -> bool {
        let removed = self.post_process.unsubscribe(id);
        if removed {
            self.mark_renderers_dirty();
            self.mark_colliders_dirty();
        }
        removed
    }

    pub fn subscribe_spawn(&mut self, hook: Box<dyn FaceHook>) -> HookId {
        self.spawn_hooks.subscribe(hook)
    }

    pub fn unsubscribe_spawn(&mut self, id: HookId) -> bool {
        self.spawn_hooks.unsubscribe(id)
    }

    pub fn subscribe_despawn(&mut self, hook: Box<dyn FaceHook>) -> HookId {
        self.despawn_hooks.subscribe(hook)
    }

    pub fn unsubscribe_despawn(&mut self, id: HookId) -> bool {
        self.despawn_hooks.unsubscribe(id)
    }

    /// Surface distance from the centre along `point`'s direction.
    #[must_use]
    pub fn local_height(&self, point: DVec3) -> f64 {
        self.field.height(point)
    }

    /// Project a cube or local point onto the deformed surface.
    #[must_use]
    pub fn local_point(&self, point: DVec3) -> DVec3 {
        self.field.surface_point(point)
    }

    /// Surface normal at `point` from two offset samples:
    /// `(S(p + right) - p) × (S(p - up) - p)` normalised, where `p = S(point)`.
    #[must_use]
    pub fn local_normal(&self, point: DVec3, right: DVec3, up: DVec3) -> DVec3 {
        let p = self.local_point(point);
        let r = self.local_point(p + right);
        let u = self.local_point(p - up);
        (r - p).cross(u - p).normalize_or_zero()
    }

    /// Take the events queued since the last drain, oldest first.
    pub fn drain_events(&mut self) -> Vec<TerrainEvent> {
        std::mem::take(&mut self.events)
    }

    #[must_use]
    pub fn node_mesh(&self, id: NodeId) -> Option<&NodeMesh> {
        self.meshes.get(&id).map(|r| &r.mesh)
    }

    #[must_use]
    pub fn material(&self, id: NodeId) -> Option<MaterialId> {
        self.meshes.get(&id).map(|r| r.material)
    }

    #[must_use]
    pub fn collider(&self, id: NodeId) -> Option<&ColliderMesh> {
        self.colliders.get(&id)
    }

    /// Nodes currently carrying a collider.
    pub fn collider_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.colliders.keys().copied()
    }

    #[must_use]
    pub fn tree(&self) -> &QuadTree {
        &self.tree
    }

    #[must_use]
    pub fn settings(&self) -> &TerrainSettings {
        &self.settings
    }

    #[must_use]
    pub fn height_field(&self) -> &HeightField {
        &self.field
    }

    #[must_use]
    pub fn targets(&self) -> &[DVec3] {
        &self.targets
    }

    #[must_use]
    pub fn stats(&self) -> TerrainStats {
        self.stats
    }

    /// Release every node, children before parents, and return the
    /// remaining events.
    pub fn destroy(mut self) -> Vec<TerrainEvent> {
        let mut order = Vec::with_capacity(self.tree.len());
        for root in self.tree.roots() {
            post_order(&self.tree, root, &mut order);
        }
        for id in order {
            let address = self.tree[id].address;
            self.release_resources(id, address);
        }
        info!("Terrain destroyed after {} ticks", self.stats.ticks);
        self.events
    }

    fn release_resources(&mut self, id: NodeId, address: NodeAddress) {
        if self.meshes.remove(&id).is_some() {
            self.events.push(TerrainEvent::MeshReleased { node: id, address });
        }
        if self.colliders.remove(&id).is_some() {
            self.events
                .push(TerrainEvent::ColliderReleased { node: id, address });
        }
        self.dirty.meshes.remove(&id);
        self.dirty.collider_nodes.remove(&id);
        if self.started {
            fire(&self.despawn_hooks, &FaceInfo::new(id, address));
        }
    }

    fn build_mesh(&self, id: NodeId) -> NodeMesh {
        let node = &self.tree[id];
        let request = MeshRequest {
            address: node.address,
            corners: node.corners,
            coords: node.coords,
            seams: coarser_edges(&self.tree, id),
        };
        let source = HookedSource {
            field: &self.field,
            colors: &self.colors,
        };
        let mut mesh = build_node_mesh(&request, &self.settings.mesh, &source);
        let info = FaceInfo::new(id, node.address);
        for hook in self.post_process.iter() {
            hook.post_process(&info, &mut mesh);
        }
        mesh
    }

    fn store_mesh(&mut self, id: NodeId) {
        let mesh = self.build_mesh(id);
        let address = self.tree[id].address;
        let info = FaceInfo::new(id, address);
        let mut material = self.settings.base_material;
        for hook in self.materials.iter() {
            hook.modify_material(&info, &mut material);
        }
        self.meshes.insert(id, RenderMesh { mesh, material });
        self.stats.meshes_built += 1;
        self.events.push(TerrainEvent::MeshUpdated { node: id, address });
    }

    fn wants_collider(&self, node: &QuadNode) -> bool {
        let cap = self.settings.max_collider_depth;
        let depth = node.depth();
        depth < cap && (node.is_leaf() || depth + 1 == cap)
    }

    /// The node whose collider covers `id`: itself, or its ancestor one level
    /// above the collider cap.
    fn collider_owner(&self, mut id: NodeId) -> NodeId {
        let cap = self.settings.max_collider_depth;
        while let Some(node) = self.tree.get(id) {
            match node.parent {
                Some(parent) if node.depth() >= cap => id = parent,
                _ => break,
            }
        }
        id
    }

    fn refresh_collider(&mut self, id: NodeId) {
        let node = &self.tree[id];
        let address = node.address;
        if self.wants_collider(node) {
            let collider = match self.meshes.get(&id) {
                Some(render) if node.is_leaf() => ColliderMesh::from_mesh(&render.mesh),
                _ => ColliderMesh::from_mesh(&self.build_mesh(id)),
            };
            self.colliders.insert(id, collider);
            self.stats.colliders_built += 1;
            self.events
                .push(TerrainEvent::ColliderUpdated { node: id, address });
        } else if self.colliders.remove(&id).is_some() {
            self.events
                .push(TerrainEvent::ColliderReleased { node: id, address });
        }
    }
}

impl std::fmt::Debug for Terrain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Terrain")
            .field("settings", &self.settings)
            .field("nodes", &self.tree.len())
            .field("meshes", &self.meshes.len())
            .field("colliders", &self.colliders.len())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

fn fire(hooks: &HookList<dyn FaceHook>, info: &FaceInfo) {
    for hook in hooks.iter() {
        hook.on_face(info);
    }
}

fn post_order(tree: &QuadTree, id: NodeId, out: &mut Vec<NodeId>) {
    if let Some(children) = tree[id].children {
        for child in children {
            post_order(tree, child, out);
        }
    }
    out.push(id);
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;
    use terra_config::ModifierConfig;
    use terra_cubesphere::CubeFace;

    use super::*;
    use crate::LevelMaterial;

    fn settings(distances: Vec<f64>) -> TerrainSettings {
        TerrainSettings {
            thresholds: LodThresholds::new(distances).unwrap(),
            ..Default::default()
        }
    }

    fn count_events(events: &[TerrainEvent], pred: impl Fn(&TerrainEvent) -> bool) -> usize {
        events.iter().filter(|e| pred(e)).count()
    }

    #[test]
    fn test_first_update_meshes_the_six_roots() {
        let mut terrain = Terrain::new(TerrainSettings::default()).unwrap();
        terrain.update();
        let events = terrain.drain_events();
        assert_eq!(
            count_events(&events, |e| matches!(e, TerrainEvent::MeshUpdated { .. })),
            6
        );
        for root in terrain.tree().roots() {
            assert!(terrain.node_mesh(root).is_some());
            assert_eq!(terrain.material(root), Some(MaterialId(0)));
        }
        assert!(terrain.drain_events().is_empty());
    }

    #[test]
    fn test_flat_unit_sphere_height_is_exactly_one() {
        let terrain = Terrain::new(TerrainSettings::default()).unwrap();
        assert_eq!(terrain.local_height(DVec3::new(0.0, 1.0, 0.0)), 1.0);
        let p = terrain.local_point(DVec3::new(1.0, 1.0, -1.0));
        assert!((p.length() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_local_normal_on_sphere_points_outward() {
        let terrain = Terrain::new(TerrainSettings::default()).unwrap();
        let n = terrain.local_normal(DVec3::Y, DVec3::X * 1e-4, DVec3::Z * 1e-4);
        assert!(n.dot(DVec3::Y) > 0.999, "{n}");
    }

    #[test]
    fn test_invalid_radius_is_rejected() {
        let bad = TerrainSettings {
            radius: -1.0,
            ..Default::default()
        };
        assert!(matches!(
            Terrain::new(bad),
            Err(TerrainError::InvalidRadius(_))
        ));
        let mut terrain = Terrain::new(TerrainSettings::default()).unwrap();
        assert!(terrain.set_radius(f64::INFINITY).is_err());
        assert!(terrain.set_radius(2.0).is_ok());
        assert_eq!(terrain.local_height(DVec3::X), 2.0);
    }

    #[test]
    fn test_several_height_changes_cause_one_rebuild() {
        let mut terrain = Terrain::new(TerrainSettings::default()).unwrap();
        terrain.update();
        terrain.drain_events();
        let before = terrain.stats();

        let a = terrain.subscribe_height(Box::new(|_p: DVec3, h: &mut f64| *h += 0.1));
        terrain.subscribe_height(Box::new(|_p: DVec3, h: &mut f64| *h *= 1.5));
        assert!(terrain.unsubscribe_height(a));
        terrain.set_subdivisions(2);
        terrain.update();

        let after = terrain.stats();
        assert_eq!(after.rebuilds, before.rebuilds + 1);
        assert_eq!(after.meshes_built, before.meshes_built + 6);
        assert!((terrain.local_height(DVec3::Z) - 1.5).abs() < 1e-12);

        terrain.update();
        assert_eq!(terrain.stats().rebuilds, after.rebuilds);
        assert_eq!(terrain.stats().meshes_built, after.meshes_built);
    }

    #[test]
    fn test_merge_releases_precede_parent_mesh_update() {
        let mut terrain = Terrain::new(settings(vec![0.5, 0.25, 0.1])).unwrap();
        terrain.set_targets(&[DVec3::new(0.0, 1.05, 0.0)]);
        terrain.update();
        let top = terrain.tree().root(CubeFace::PosY);
        assert!(!terrain.tree()[top].is_leaf());
        terrain.drain_events();

        terrain.set_targets(&[DVec3::new(0.0, 50.0, 0.0)]);
        let report = terrain.update();
        assert!(report.merged.contains(&top));
        assert!(terrain.tree()[top].is_leaf());

        let events = terrain.drain_events();
        let parent_update = events
            .iter()
            .position(|e| *e == TerrainEvent::MeshUpdated {
                node: top,
                address: terrain.tree()[top].address,
            })
            .unwrap();
        let released: Vec<usize> = events
            .iter()
            .enumerate()
            .filter(|(_, e)| matches!(e, TerrainEvent::MeshReleased { .. }))
            .map(|(i, _)| i)
            .collect();
        assert!(!released.is_empty());
        assert!(released.iter().all(|&i| i < parent_update));
        assert!(terrain.node_mesh(top).is_some());
    }

    #[test]
    fn test_split_drops_parent_mesh_and_meshes_children() {
        let mut terrain = Terrain::new(settings(vec![0.5])).unwrap();
        terrain.update();
        terrain.drain_events();
        terrain.set_targets(&[DVec3::new(0.0, 1.2, 0.0)]);
        let report = terrain.update();
        let top = terrain.tree().root(CubeFace::PosY);
        assert_eq!(report.split, vec![top]);
        assert!(terrain.node_mesh(top).is_none());
        for child in terrain.tree()[top].children.unwrap() {
            assert!(terrain.node_mesh(child).is_some());
        }
        let events = terrain.drain_events();
        assert_eq!(events[0].node(), top);
        assert!(matches!(events[0], TerrainEvent::MeshReleased { .. }));
    }

    #[test]
    fn test_spawn_and_despawn_hooks_balance() {
        let spawned = Arc::new(AtomicUsize::new(0));
        let despawned = Arc::new(AtomicUsize::new(0));
        let mut terrain = Terrain::new(settings(vec![2.0, 1.0, 0.5])).unwrap();
        let s = Arc::clone(&spawned);
        terrain.subscribe_spawn(Box::new(move |_: &FaceInfo| {
            s.fetch_add(1, Ordering::Relaxed);
        }));
        let d = Arc::clone(&despawned);
        terrain.subscribe_despawn(Box::new(move |_: &FaceInfo| {
            d.fetch_add(1, Ordering::Relaxed);
        }));

        terrain.set_targets(&[DVec3::new(0.3, 1.1, 0.2)]);
        terrain.update();
        let live = terrain.tree().len();
        assert_eq!(spawned.load(Ordering::Relaxed), live);

        terrain.set_targets(&[DVec3::new(-0.9, -0.5, 0.1)]);
        terrain.update();
        let live = terrain.tree().len();
        assert_eq!(
            spawned.load(Ordering::Relaxed) - despawned.load(Ordering::Relaxed),
            live
        );

        terrain.drain_events();
        let events = terrain.destroy();
        assert!(!events.is_empty());
        assert_eq!(
            spawned.load(Ordering::Relaxed),
            despawned.load(Ordering::Relaxed)
        );
        assert!(
            events
                .iter()
                .all(|e| matches!(e, TerrainEvent::MeshReleased { .. }))
        );
    }

    #[test]
    fn test_material_hooks_follow_depth() {
        let mut terrain = Terrain::new(settings(vec![0.5, 0.25])).unwrap();
        terrain.set_base_material(MaterialId(1));
        terrain.subscribe_material(Box::new(LevelMaterial {
            material: MaterialId(9),
            side: None,
            level_min: 1,
            level_max: 2,
        }));
        terrain.set_targets(&[DVec3::new(0.0, 0.0, 1.2)]);
        terrain.update();
        for leaf in terrain.tree().leaves() {
            let expected = if terrain.tree()[leaf].depth() >= 1 { 9 } else { 1 };
            assert_eq!(terrain.material(leaf), Some(MaterialId(expected)));
        }
    }

    #[test]
    fn test_color_and_post_process_hooks_reach_the_mesh() {
        let mut terrain = Terrain::new(TerrainSettings::default()).unwrap();
        terrain.subscribe_color(Box::new(|_p: DVec3, _h: f64, c: &mut Vec4| {
            *c = Vec4::new(0.5, 0.25, 0.0, 1.0);
        }));
        terrain.subscribe_post_process(Box::new(|_f: &FaceInfo, mesh: &mut NodeMesh| {
            mesh.origin += DVec3::X;
        }));
        terrain.update();
        let mesh = terrain.node_mesh(terrain.tree().root(CubeFace::PosZ)).unwrap();
        assert!(mesh.colors.iter().all(|c| *c == Vec4::new(0.5, 0.25, 0.0, 1.0)));
        assert!(mesh.origin.x > 0.5);
    }

    fn collider_cover_count(terrain: &Terrain, face: CubeFace, u: f64, v: f64) -> usize {
        terrain
            .collider_nodes()
            .filter(|&id| {
                let a = terrain.tree()[id].address;
                let (u0, v0, u1, v1) = a.uv_bounds();
                a.face == face && u0 <= u && u < u1 && v0 <= v && v < v1
            })
            .count()
    }

    #[test]
    fn test_colliders_cover_the_sphere_exactly_once() {
        let mut rng = ChaCha8Rng::seed_from_u64(2024);
        let mut terrain = Terrain::new(settings(vec![2.0, 1.0, 0.5, 0.25])).unwrap();
        terrain.set_max_collider_depth(3);
        for _ in 0..6 {
            let dir = DVec3::new(
                rng.random_range(-1.0..1.0),
                rng.random_range(-1.0..1.0),
                rng.random_range(-1.0..1.0),
            )
            .try_normalize()
            .unwrap_or(DVec3::Y);
            terrain.set_targets(&[dir * rng.random_range(1.01..1.6)]);
            terrain.update();

            for id in terrain.collider_nodes() {
                assert!(terrain.tree()[id].depth() < 3);
            }
            for _ in 0..200 {
                let face = CubeFace::ALL[rng.random_range(0..6)];
                let u = rng.random_range(0.0..1.0);
                let v = rng.random_range(0.0..1.0);
                assert_eq!(collider_cover_count(&terrain, face, u, v), 1);
            }
        }

        terrain.set_max_collider_depth(0);
        terrain.update();
        assert_eq!(terrain.collider_nodes().count(), 0);
        assert!(
            terrain
                .drain_events()
                .iter()
                .any(|e| matches!(e, TerrainEvent::ColliderReleased { .. }))
        );
    }

    fn assert_colliders_match_tree(terrain: &Terrain) {
        for id in terrain.collider_nodes() {
            let fresh = ColliderMesh::from_mesh(&terrain.build_mesh(id));
            assert_eq!(
                terrain.collider(id),
                Some(&fresh),
                "stale collider at {:?}",
                terrain.tree()[id].address
            );
        }
    }

    #[test]
    fn test_capped_collider_follows_neighbour_merge() {
        let mut terrain = Terrain::new(settings(vec![3.0, 0.3, 0.1])).unwrap();
        terrain.set_max_collider_depth(3);
        let corner = NodeAddress::new(CubeFace::PosZ, 2, 1, 1).cube_corners()[2];
        let near = terrain.local_point(corner);
        let [bl, _, _, tr] = NodeAddress::new(CubeFace::PosZ, 2, 1, 0).cube_corners();
        let other = terrain.local_point((bl + tr) * 0.5);

        terrain.set_targets(&[near, other]);
        terrain.update();
        assert_colliders_match_tree(&terrain);

        terrain.set_targets(&[near]);
        let report = terrain.update();
        assert!(!report.merged.is_empty());
        assert_colliders_match_tree(&terrain);
    }

    #[test]
    fn test_colliders_stay_current_while_viewers_move() {
        let mut rng = ChaCha8Rng::seed_from_u64(77);
        let mut terrain = Terrain::new(settings(vec![3.0, 0.6, 0.1, 0.05])).unwrap();
        terrain.set_max_collider_depth(3);
        for _ in 0..12 {
            let targets: Vec<DVec3> = (0..rng.random_range(1..3))
                .map(|_| {
                    let dir = DVec3::new(
                        rng.random_range(-0.3..0.3),
                        rng.random_range(-0.3..0.3),
                        1.0,
                    );
                    terrain.local_point(dir) * rng.random_range(1.0..1.05)
                })
                .collect();
            terrain.set_targets(&targets);
            terrain.update();
            assert_colliders_match_tree(&terrain);
        }
    }

    #[test]
    fn test_update_states_before_update_fires_root_spawns_first() {
        let log = Arc::new(std::sync::Mutex::new(Vec::new()));
        let despawned = Arc::new(AtomicUsize::new(0));
        let mut terrain = Terrain::new(settings(vec![0.5])).unwrap();
        let l = Arc::clone(&log);
        terrain.subscribe_spawn(Box::new(move |f: &FaceInfo| {
            l.lock().unwrap().push(f.depth());
        }));
        let d = Arc::clone(&despawned);
        terrain.subscribe_despawn(Box::new(move |_: &FaceInfo| {
            d.fetch_add(1, Ordering::Relaxed);
        }));

        terrain.set_targets(&[DVec3::new(0.0, 1.2, 0.0)]);
        terrain.update_states();
        let depths = log.lock().unwrap().clone();
        assert_eq!(depths.len(), 10);
        assert!(depths[..6].iter().all(|&d| d == 0));
        assert!(depths[6..].iter().all(|&d| d == 1));

        terrain.set_targets(&[]);
        terrain.update_states();
        assert_eq!(despawned.load(Ordering::Relaxed), 4);
        terrain.update();
        assert_eq!(log.lock().unwrap().len(), 10);
    }

    #[test]
    fn test_from_config_loads_heightmap_next_to_config() {
        let dir = tempfile::tempdir().unwrap();
        let img = image::RgbaImage::from_pixel(16, 8, image::Rgba([0, 0, 0, 128]));
        img.save(dir.path().join("height.png")).unwrap();

        let mut config = Config::default();
        config.terrain.radius = 2.0;
        config.modifiers.push(ModifierConfig::Heightmap {
            path: "height.png".into(),
            encoding: Default::default(),
            displacement_min: 0.0,
            displacement_max: 1.0,
        });
        let terrain = Terrain::from_config(&config, dir.path()).unwrap();
        let h = terrain.local_height(DVec3::new(0.2, 0.4, 0.7));
        assert!((h - (2.0 + 128.0 / 255.0)).abs() < 1e-9, "{h}");

        config.modifiers.push(ModifierConfig::Heightmap {
            path: "missing.png".into(),
            encoding: Default::default(),
            displacement_min: 0.0,
            displacement_max: 1.0,
        });
        let terrain = Terrain::from_config(&config, dir.path()).unwrap();
        let h = terrain.local_height(DVec3::new(0.2, 0.4, 0.7));
        assert!((h - (2.0 + 128.0 / 255.0)).abs() < 1e-9, "{h}");
    }

    #[test]
    fn test_missing_heightmap_leaves_base_radius() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.terrain.radius = 2.0;
        config.modifiers.push(ModifierConfig::Heightmap {
            path: "missing.png".into(),
            encoding: Default::default(),
            displacement_min: 0.5,
            displacement_max: 1.0,
        });
        let terrain = Terrain::from_config(&config, dir.path()).unwrap();
        assert_eq!(terrain.local_height(DVec3::new(-0.3, 0.8, 0.1)), 2.0);
    }
}

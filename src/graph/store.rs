//! SceneStore - owner of every node, edge and marker in the scene.
//!
//! The store keeps topology in petgraph's StableGraph so identifiers survive
//! removals, and it is the only component that allocates or releases render
//! handles. Every add/remove/update is forwarded to the render backend at the
//! moment it happens.

use std::collections::{HashMap, HashSet};

use glam::Vec3;
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableGraph};
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use petgraph::{Directed, Direction};

use super::edge::{EdgeId, EdgeKind, EdgeShape, EdgeSpec, EdgeState, SceneEdge};
use super::node::{NodeId, NodeSpec, SceneNode};
use crate::color::{self, Color};
use crate::camera::Ray;
use crate::config::{DisplaySettings, NodeFilter};
use crate::data::CommitData;
use crate::error::{GraphError, Result};
use crate::render::{
    EdgeGeometry, EdgeVisual, HandleArena, MarkerVisual, NodeVisual, RenderBackend, RenderHandle,
};
use crate::spatial::{NodePoint, SpatialIndex};

/// The scene graph store.
///
/// This struct manages:
/// - Scene topology via petgraph
/// - Render handles and their release
/// - Node state (pinned, hidden, hovered, highlighted)
/// - Spatial index for ray picking
/// - ID mapping between node keys, stable IDs and internal indices
pub struct SceneStore<B: RenderBackend> {
    graph: StableGraph<SceneNode, SceneEdge, Directed>,

    /// Map from node key to stable NodeId
    key_to_id: HashMap<String, NodeId>,

    node_id_to_index: HashMap<NodeId, NodeIndex>,
    node_index_to_id: HashMap<NodeIndex, NodeId>,
    edge_id_to_index: HashMap<EdgeId, EdgeIndex>,
    edge_index_to_id: HashMap<EdgeIndex, EdgeId>,

    next_node_id: u32,
    next_edge_id: u32,

    markers: Vec<RenderHandle>,
    handles: HandleArena,
    backend: B,

    display: DisplaySettings,
    filter: NodeFilter,

    spatial: SpatialIndex,
    spatial_dirty: bool,
}

impl<B: RenderBackend> SceneStore<B> {
    /// Create an empty store drawing through `backend`.
    pub fn new(backend: B) -> Self {
        Self {
            graph: StableGraph::new(),
            key_to_id: HashMap::new(),
            node_id_to_index: HashMap::new(),
            node_index_to_id: HashMap::new(),
            edge_id_to_index: HashMap::new(),
            edge_index_to_id: HashMap::new(),
            next_node_id: 0,
            next_edge_id: 0,
            markers: Vec::new(),
            handles: HandleArena::new(),
            backend,
            display: DisplaySettings::default(),
            filter: NodeFilter::default(),
            spatial: SpatialIndex::new(),
            spatial_dirty: false,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Number of render handles currently owned by the store.
    pub fn live_handles(&self) -> usize {
        self.handles.live_count()
    }

    // =========================================================================
    // Node Operations
    // =========================================================================

    /// Add a node and create its render object.
    ///
    /// A duplicate key keeps the existing node and returns its id.
    pub fn add_node(&mut self, spec: NodeSpec) -> NodeId {
        if let Some(&existing) = self.key_to_id.get(&spec.key) {
            log::warn!("node {} already in scene, keeping the existing one", spec.key);
            return existing;
        }

        let hidden = !self.passes_filter(spec.commit.as_ref());
        let handle = self.handles.allocate();
        let visual = NodeVisual {
            position: spec.position.to_array(),
            color: spec.color.to_hex(),
            radius: spec.radius,
            label: spec.label.clone(),
            label_visible: self.display.show_labels,
            visible: !hidden,
        };
        self.backend.create_node(handle, &visual);
        if (self.display.node_scale - 1.0).abs() > f32::EPSILON {
            self.backend.set_scale(handle, self.display.node_scale);
        }

        let id = NodeId(self.next_node_id);
        self.next_node_id += 1;

        let mut node = SceneNode::from_spec(spec, handle);
        node.state.set_hidden(hidden);
        self.key_to_id.insert(node.key.clone(), id);
        let index = self.graph.add_node(node);
        self.node_id_to_index.insert(id, index);
        self.node_index_to_id.insert(index, id);

        self.spatial_dirty = true;
        id
    }

    /// Remove a node that no longer has any edges.
    ///
    /// The store never cascades: callers detach or reroute edges first.
    pub fn remove_node(&mut self, key: &str) -> Result<()> {
        let id = self
            .key_to_id
            .get(key)
            .copied()
            .ok_or_else(|| GraphError::UnknownNode(key.to_string()))?;
        let index = self.node_id_to_index[&id];

        let connected = self.graph.edges_directed(index, Direction::Outgoing).next().is_some()
            || self.graph.edges_directed(index, Direction::Incoming).next().is_some();
        if connected {
            return Err(GraphError::NodeStillConnected(key.to_string()));
        }

        if let Some(node) = self.graph.remove_node(index) {
            self.release(node.handle);
        }
        self.key_to_id.remove(key);
        self.node_id_to_index.remove(&id);
        self.node_index_to_id.remove(&index);
        self.spatial_dirty = true;
        Ok(())
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn node_id(&self, key: &str) -> Option<NodeId> {
        self.key_to_id.get(key).copied()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.key_to_id.contains_key(key)
    }

    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.node_id_to_index.get(&id).and_then(|&index| self.graph.node_weight(index))
    }

    pub fn node_by_key(&self, key: &str) -> Option<&SceneNode> {
        self.node_id(key).and_then(|id| self.node(id))
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        let index = *self.node_id_to_index.get(&id)?;
        self.graph.node_weight_mut(index)
    }

    /// All nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &SceneNode)> + '_ {
        self.graph
            .node_indices()
            .filter_map(move |index| {
                Some((*self.node_index_to_id.get(&index)?, &self.graph[index]))
            })
    }

    pub fn position(&self, key: &str) -> Option<Vec3> {
        self.node_by_key(key).map(|n| n.position)
    }

    /// Move a node's render object. Edges are brought up to date by [`Self::sync_edges`].
    pub fn set_position(&mut self, id: NodeId, position: Vec3) -> bool {
        let Some(node) = self.node_mut(id) else {
            return false;
        };
        node.position = position;
        let handle = node.handle;
        self.backend.move_node(handle, position);
        self.spatial_dirty = true;
        true
    }

    /// Recolour a node without touching its base colour.
    pub fn set_node_color(&mut self, id: NodeId, color: Color) {
        if let Some(node) = self.node_mut(id) {
            node.color = color;
            let handle = node.handle;
            self.backend.set_color(handle, color);
        }
    }

    /// Direct neighbours, in either direction, without duplicates.
    pub fn neighbors(&self, id: NodeId) -> Vec<NodeId> {
        let Some(&index) = self.node_id_to_index.get(&id) else {
            return Vec::new();
        };
        let mut neighbors: Vec<NodeId> = self
            .graph
            .neighbors_undirected(index)
            .filter_map(|n| self.node_index_to_id.get(&n).copied())
            .filter(|&n| n != id)
            .collect();
        neighbors.sort();
        neighbors.dedup();
        neighbors
    }

    // =========================================================================
    // Edge Operations
    // =========================================================================

    /// Add an edge between two existing nodes.
    ///
    /// An edge naming a node that is not in the scene is dropped.
    pub fn add_edge(&mut self, spec: EdgeSpec) -> Option<EdgeId> {
        let (Some(&source), Some(&target)) =
            (self.key_to_id.get(&spec.source), self.key_to_id.get(&spec.target))
        else {
            log::debug!(
                "dropping edge {} -> {}: endpoint not in scene",
                spec.source,
                spec.target
            );
            return None;
        };
        let source_index = self.node_id_to_index[&source];
        let target_index = self.node_id_to_index[&target];
        let from = &self.graph[source_index];
        let to = &self.graph[target_index];

        let geometry = self.geometry_for(spec.shape, from.position, to.position);
        let visible = !from.state.is_hidden() && !to.state.is_hidden();
        let color = color::edge_color(spec.kind == EdgeKind::BranchConnection);

        let handle = self.handles.allocate();
        self.backend.create_edge(
            handle,
            &EdgeVisual {
                geometry,
                color: color.to_hex(),
                visible,
            },
        );

        let mut state = EdgeState::new();
        state.set_hidden(!visible);
        let edge = SceneEdge {
            source,
            target,
            kind: spec.kind,
            shape: spec.shape,
            base_color: color,
            color,
            original_color: None,
            handle,
            state,
        };

        let id = EdgeId(self.next_edge_id);
        self.next_edge_id += 1;
        let index = self.graph.add_edge(source_index, target_index, edge);
        self.edge_id_to_index.insert(id, index);
        self.edge_index_to_id.insert(index, id);
        Some(id)
    }

    /// Remove an edge and release its render object.
    pub fn remove_edge(&mut self, id: EdgeId) -> bool {
        let Some(index) = self.edge_id_to_index.remove(&id) else {
            return false;
        };
        self.edge_index_to_id.remove(&index);
        match self.graph.remove_edge(index) {
            Some(edge) => {
                self.release(edge.handle);
                true
            }
            None => false,
        }
    }

    /// Remove every edge in the scene. Returns the number removed.
    pub fn remove_all_edges(&mut self) -> usize {
        let ids: Vec<EdgeId> = self.edges().map(|(id, _)| id).collect();
        ids.into_iter().filter(|&edge| self.remove_edge(edge)).count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn edge(&self, id: EdgeId) -> Option<&SceneEdge> {
        self.edge_id_to_index.get(&id).and_then(|&index| self.graph.edge_weight(index))
    }

    pub(crate) fn edge_mut(&mut self, id: EdgeId) -> Option<&mut SceneEdge> {
        let index = *self.edge_id_to_index.get(&id)?;
        self.graph.edge_weight_mut(index)
    }

    /// All edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &SceneEdge)> + '_ {
        self.graph
            .edge_indices()
            .filter_map(move |index| {
                Some((*self.edge_index_to_id.get(&index)?, &self.graph[index]))
            })
    }

    /// Edge endpoints as node keys.
    pub fn edge_keys(&self) -> Vec<(String, String)> {
        self.graph
            .edge_references()
            .map(|e| (self.graph[e.source()].key.clone(), self.graph[e.target()].key.clone()))
            .collect()
    }

    pub fn set_edge_color(&mut self, id: EdgeId, color: Color) {
        if let Some(edge) = self.edge_mut(id) {
            edge.color = color;
            let handle = edge.handle;
            self.backend.set_color(handle, color);
        }
    }

    /// Bring edge geometry up to date after `moved` nodes changed position.
    ///
    /// An edge whose endpoints both moved gets a fresh render object; an edge
    /// with one moved endpoint is reshaped in place.
    pub fn sync_edges(&mut self, moved: &HashSet<NodeId>) {
        if moved.is_empty() {
            return;
        }
        let indices: Vec<EdgeIndex> = self.graph.edge_indices().collect();
        for index in indices {
            let Some((source_index, target_index)) = self.graph.edge_endpoints(index) else {
                continue;
            };
            let edge = &self.graph[index];
            let source_moved = moved.contains(&edge.source);
            let target_moved = moved.contains(&edge.target);
            if !source_moved && !target_moved {
                continue;
            }

            let from = self.graph[source_index].position;
            let to = self.graph[target_index].position;
            let geometry = self.geometry_for(edge.shape, from, to);

            if source_moved && target_moved {
                let old = edge.handle;
                let visual = EdgeVisual {
                    geometry,
                    color: edge.color.to_hex(),
                    visible: !edge.state.is_hidden(),
                };
                self.release(old);
                let handle = self.handles.allocate();
                self.backend.create_edge(handle, &visual);
                self.graph[index].handle = handle;
            } else {
                let handle = edge.handle;
                self.backend.update_edge(handle, &geometry);
            }
        }
    }

    fn geometry_for(&self, shape: EdgeShape, from: Vec3, to: Vec3) -> EdgeGeometry {
        match shape {
            EdgeShape::Line => EdgeGeometry::line(from, to),
            EdgeShape::Tube => EdgeGeometry::tube(from, to, self.display.edge_thickness),
        }
    }

    // =========================================================================
    // Markers
    // =========================================================================

    /// Add a labelled axis marker.
    pub fn add_marker(&mut self, position: Vec3, label: impl Into<String>) {
        let handle = self.handles.allocate();
        self.backend.create_marker(
            handle,
            &MarkerVisual {
                position: position.to_array(),
                label: label.into(),
                color: color::MARKER.to_hex(),
            },
        );
        self.markers.push(handle);
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    // =========================================================================
    // Display settings and filters
    // =========================================================================

    pub fn display(&self) -> &DisplaySettings {
        &self.display
    }

    pub fn filter(&self) -> &NodeFilter {
        &self.filter
    }

    /// Apply display settings to every object already in the scene.
    pub fn apply_display(&mut self, display: DisplaySettings) {
        let thickness_changed =
            (display.edge_thickness - self.display.edge_thickness).abs() > f32::EPSILON;
        self.display = display;

        for node in self.graph.node_weights() {
            self.backend.set_scale(node.handle, self.display.node_scale);
            self.backend.set_label_visible(node.handle, self.display.show_labels);
        }

        if thickness_changed {
            for index in self.graph.edge_indices().collect::<Vec<_>>() {
                let Some((s, t)) = self.graph.edge_endpoints(index) else {
                    continue;
                };
                let edge = &self.graph[index];
                if edge.shape != EdgeShape::Tube {
                    continue;
                }
                let (from, to) = (self.graph[s].position, self.graph[t].position);
                let geometry = self.geometry_for(edge.shape, from, to);
                self.backend.update_edge(edge.handle, &geometry);
            }
        }
        self.spatial_dirty = true;
    }

    /// Show or hide commit nodes according to `filter`.
    ///
    /// Cluster nodes carry no commit and are never filtered. An edge is visible
    /// only when both of its endpoints are.
    pub fn apply_filter(&mut self, filter: NodeFilter) {
        self.filter = filter;

        for index in self.graph.node_indices().collect::<Vec<_>>() {
            let hidden = !self.passes_filter(self.graph[index].commit.as_ref());
            let node = &mut self.graph[index];
            if node.state.is_hidden() != hidden {
                node.state.set_hidden(hidden);
                self.backend.set_visible(node.handle, !hidden);
            }
        }

        for index in self.graph.edge_indices().collect::<Vec<_>>() {
            let Some((s, t)) = self.graph.edge_endpoints(index) else {
                continue;
            };
            let hidden = self.graph[s].state.is_hidden() || self.graph[t].state.is_hidden();
            let edge = &mut self.graph[index];
            if edge.state.is_hidden() != hidden {
                edge.state.set_hidden(hidden);
                self.backend.set_visible(edge.handle, !hidden);
            }
        }
        self.spatial_dirty = true;
    }

    fn passes_filter(&self, commit: Option<&CommitData>) -> bool {
        commit.is_none_or(|c| self.filter.matches(c))
    }

    // =========================================================================
    // Spatial Queries
    // =========================================================================

    /// Nearest visible node hit by `ray`.
    pub fn pick(&mut self, ray: &Ray) -> Option<NodeId> {
        self.ensure_spatial_index();
        self.spatial.pick(ray)
    }

    /// Bounding box of every visible node.
    pub fn bounds(&mut self) -> Option<(Vec3, Vec3)> {
        self.ensure_spatial_index();
        self.spatial.bounds()
    }

    /// Rebuild the spatial index from visible nodes.
    pub fn rebuild_spatial_index(&mut self) {
        let scale = self.display.node_scale;
        let points: Vec<NodePoint> = self
            .nodes()
            .filter(|(_, node)| !node.state.is_hidden())
            .map(|(id, node)| NodePoint::new(id, node.position, node.radius * scale))
            .collect();
        self.spatial.rebuild(points);
        self.spatial_dirty = false;
    }

    fn ensure_spatial_index(&mut self) {
        if self.spatial_dirty {
            self.rebuild_spatial_index();
        }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Release every render object and empty the store.
    ///
    /// Edges go first, then nodes, then markers; anything still in the arena
    /// afterwards is released as well so no handle outlives the scene.
    pub fn clear(&mut self) {
        let edges = self.graph.edge_count();
        let nodes = self.graph.node_count();

        for edge in self.graph.edge_weights() {
            self.backend.release(edge.handle);
            self.handles.free(edge.handle);
        }
        for node in self.graph.node_weights() {
            self.backend.release(node.handle);
            self.handles.free(node.handle);
        }
        for handle in std::mem::take(&mut self.markers) {
            self.backend.release(handle);
            self.handles.free(handle);
        }
        for handle in self.handles.drain() {
            log::warn!("releasing orphaned {handle}");
            self.backend.release(handle);
        }

        self.graph.clear();
        self.key_to_id.clear();
        self.node_id_to_index.clear();
        self.node_index_to_id.clear();
        self.edge_id_to_index.clear();
        self.edge_index_to_id.clear();
        self.spatial.clear();
        self.spatial_dirty = false;
        log::debug!("scene cleared ({nodes} nodes, {edges} edges)");
    }

    fn release(&mut self, handle: RenderHandle) {
        if self.handles.free(handle) {
            self.backend.release(handle);
        } else {
            log::warn!("release of unowned {handle}");
        }
    }
}

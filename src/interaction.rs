//! Interaction Controller: hover, selection, click dispatch and dragging.
//!
//! The controller never owns scene objects. It remembers which node ids it
//! recoloured and restores them through the store, skipping any that have
//! disappeared in the meantime.

use std::collections::HashSet;

use glam::Vec3;

use crate::camera::Ray;
use crate::color::{self, Color};
use crate::graph::{EdgeId, NodeId, NodeKind, SceneStore};
use crate::render::{Cursor, RenderBackend};

/// What a primary click asks the rest of the engine to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickAction {
    /// Nothing under the pointer.
    None,
    /// Flip a branch cluster.
    ToggleCluster { branch: String },
    /// Show commit detail and fetch its diff.
    ShowCommit { key: String },
}

#[derive(Debug, Clone, Copy)]
struct DragState {
    node: NodeId,
    plane_point: Vec3,
    plane_normal: Vec3,
}

/// Hover and selection state for the current scene.
#[derive(Debug, Default)]
pub struct InteractionController {
    hovered: Option<NodeId>,
    selected: Option<NodeId>,
    highlighted_nodes: Vec<NodeId>,
    highlighted_edges: Vec<EdgeId>,
    drag: Option<DragState>,
}

impl InteractionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hovered(&self) -> Option<NodeId> {
        self.hovered
    }

    pub fn selected(&self) -> Option<NodeId> {
        self.selected
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Nodes currently lit, hovered node first.
    pub fn highlighted_nodes(&self) -> &[NodeId] {
        &self.highlighted_nodes
    }

    /// Move hover to `hit`. Returns true when the hovered node changed.
    ///
    /// The old highlight is fully restored before the new one is applied.
    pub fn hover<B: RenderBackend>(
        &mut self,
        hit: Option<NodeId>,
        store: &mut SceneStore<B>,
    ) -> bool {
        if hit == self.hovered {
            return false;
        }
        let was_hovering = self.hovered.is_some();
        self.clear_highlight(store);

        if let Some(id) = hit {
            self.highlight(id, store);
        }

        if !self.is_dragging() && was_hovering != self.hovered.is_some() {
            let cursor = if self.hovered.is_some() { Cursor::Pointer } else { Cursor::Default };
            store.backend_mut().set_cursor(cursor);
        }
        true
    }

    fn highlight<B: RenderBackend>(&mut self, id: NodeId, store: &mut SceneStore<B>) {
        let Some(node) = store.node(id) else {
            return;
        };
        let hovered_color = color::hover_variant(node.color);

        let neighbors = store.neighbors(id);
        let lit: HashSet<NodeId> = neighbors.iter().copied().chain([id]).collect();

        self.remember_node(id, hovered_color, store);
        if let Some(node) = store.node_mut(id) {
            node.state.set_hovered(true);
        }
        for &neighbor in &neighbors {
            let Some(current) = store.node(neighbor).map(|n| n.color) else {
                continue;
            };
            self.remember_node(neighbor, color::neighbor_variant(current), store);
            if let Some(node) = store.node_mut(neighbor) {
                node.state.set_highlighted(true);
            }
        }

        let edges: Vec<EdgeId> = store
            .edges()
            .filter(|(_, e)| lit.contains(&e.source) && lit.contains(&e.target))
            .map(|(edge_id, _)| edge_id)
            .collect();
        for edge_id in edges {
            if let Some(edge) = store.edge_mut(edge_id) {
                edge.original_color = Some(edge.color);
                edge.state.set_highlighted(true);
            }
            store.set_edge_color(edge_id, color::HIGHLIGHT_EDGE);
            self.highlighted_edges.push(edge_id);
        }
        self.hovered = Some(id);
    }

    fn remember_node<B: RenderBackend>(
        &mut self,
        id: NodeId,
        lit: Color,
        store: &mut SceneStore<B>,
    ) {
        if let Some(node) = store.node_mut(id) {
            node.original_color = Some(node.color);
        }
        store.set_node_color(id, lit);
        self.highlighted_nodes.push(id);
    }

    /// Restore every colour changed by the current hover.
    pub fn clear_highlight<B: RenderBackend>(&mut self, store: &mut SceneStore<B>) {
        for id in std::mem::take(&mut self.highlighted_nodes) {
            let Some(node) = store.node_mut(id) else {
                continue;
            };
            node.state.set_hovered(false);
            node.state.set_highlighted(false);
            if let Some(original) = node.original_color.take() {
                store.set_node_color(id, original);
            }
        }
        for edge_id in std::mem::take(&mut self.highlighted_edges) {
            let Some(edge) = store.edge_mut(edge_id) else {
                continue;
            };
            edge.state.set_highlighted(false);
            if let Some(original) = edge.original_color.take() {
                store.set_edge_color(edge_id, original);
            }
        }
        self.hovered = None;
    }

    /// Resolve a primary click on whatever is hovered.
    pub fn click<B: RenderBackend>(&mut self, store: &mut SceneStore<B>) -> ClickAction {
        let Some(id) = self.hovered else {
            return ClickAction::None;
        };
        let Some(node) = store.node(id) else {
            return ClickAction::None;
        };
        let key = match &node.kind {
            NodeKind::Cluster { branch } => {
                return ClickAction::ToggleCluster {
                    branch: branch.clone(),
                };
            }
            NodeKind::Commit | NodeKind::Expanded { .. } => node.key.clone(),
        };
        self.select(Some(id), store);
        ClickAction::ShowCommit { key }
    }

    /// Commit key under the pointer for a secondary or double activation.
    pub fn double_click<B: RenderBackend>(&self, store: &SceneStore<B>) -> Option<String> {
        let node = store.node(self.hovered?)?;
        (!node.kind.is_cluster()).then(|| node.key.clone())
    }

    /// Mark one node as selected, unmarking the previous one.
    pub fn select<B: RenderBackend>(&mut self, id: Option<NodeId>, store: &mut SceneStore<B>) {
        if id == self.selected {
            return;
        }
        if let Some(previous) = self.selected.take() {
            self.paint_selection(previous, false, store);
        }
        if let Some(id) = id {
            self.paint_selection(id, true, store);
            self.selected = store.node(id).map(|_| id);
        }
    }

    // A lit node shows its highlight colour; the selection change lands in the
    // colour it will be restored to.
    fn paint_selection<B: RenderBackend>(
        &self,
        id: NodeId,
        selected: bool,
        store: &mut SceneStore<B>,
    ) {
        let Some(node) = store.node_mut(id) else {
            return;
        };
        node.state.set_selected(selected);
        let color = if selected {
            color::selected_variant(node.base_color)
        } else {
            node.base_color
        };
        if node.original_color.is_some() {
            node.original_color = Some(color);
        } else {
            store.set_node_color(id, color);
        }
    }

    /// Start dragging `id` across the camera-facing plane through it.
    pub fn begin_drag<B: RenderBackend>(
        &mut self,
        id: NodeId,
        camera_forward: Vec3,
        store: &mut SceneStore<B>,
    ) -> bool {
        let Some(node) = store.node(id) else {
            return false;
        };
        self.drag = Some(DragState {
            node: id,
            plane_point: node.position,
            plane_normal: -camera_forward,
        });
        store.backend_mut().set_cursor(Cursor::Grabbing);
        true
    }

    /// Where the dragged node should go for a pointer ray.
    pub fn drag_to(&mut self, ray: &Ray) -> Option<(NodeId, Vec3)> {
        let drag = self.drag.as_mut()?;
        let point = ray.intersect_plane(drag.plane_point, drag.plane_normal)?;
        drag.plane_point = point;
        Some((drag.node, point))
    }

    /// Finish a drag. Returns the node that was being dragged.
    pub fn end_drag<B: RenderBackend>(&mut self, store: &mut SceneStore<B>) -> Option<NodeId> {
        let drag = self.drag.take()?;
        let cursor = if self.hovered.is_some() { Cursor::Pointer } else { Cursor::Default };
        store.backend_mut().set_cursor(cursor);
        Some(drag.node)
    }

    /// Forget all state without touching the store; used once the scene is cleared.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

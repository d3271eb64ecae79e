//! Layout strategies for the commit graph.
//!
//! Each discrete strategy is a pure function from a [`Dataset`] to a
//! [`ScenePlan`]: the full list of nodes, edges and markers to show. The plan is
//! computed before the store is touched, so a failing layout leaves the current
//! scene alone, and populating the store from a plan is a straight insert.
//!
//! The force layout is the odd one out: it is a continuous simulation that moves
//! nodes already in the store (see [`force`]).

pub mod branch_tree;
pub mod force;
pub mod radial;
pub mod spiral;
pub mod timeline;

use std::collections::HashSet;

use glam::Vec3;

use crate::color;
use crate::data::{Dataset, NodeRecord};
use crate::graph::{EdgeKind, EdgeShape, EdgeSpec, NodeKind, NodeSpec, SceneStore, COMMIT_RADIUS};
use crate::render::RenderBackend;

pub use force::{ForceLayout, ForceNode};

/// Everything a layout wants on screen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScenePlan {
    pub nodes: Vec<NodeSpec>,
    pub edges: Vec<EdgeSpec>,
    /// Axis markers: position and label.
    pub markers: Vec<(Vec3, String)>,
}

impl ScenePlan {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.markers.is_empty()
    }

    /// Insert the plan into `store`. Nodes go in before the edges that reference them.
    pub fn populate<B: RenderBackend>(self, store: &mut SceneStore<B>) {
        let planned_edges = self.edges.len();
        for node in self.nodes {
            store.add_node(node);
        }
        let added = self.edges.into_iter().filter_map(|edge| store.add_edge(edge)).count();
        for (position, label) in self.markers {
            store.add_marker(position, label);
        }
        if added < planned_edges {
            log::debug!("{} planned edges dropped", planned_edges - added);
        }
    }
}

/// Node spec for a commit drawn directly by a layout.
pub(crate) fn commit_spec(record: &NodeRecord, position: Vec3) -> NodeSpec {
    NodeSpec {
        key: record.id.clone(),
        kind: NodeKind::Commit,
        commit: Some(record.data.clone()),
        position,
        color: color::commit_color(record.data.is_initial, record.data.is_merge()),
        radius: COMMIT_RADIUS,
        label: record.data.summary(),
    }
}

/// Dataset edges whose endpoints are both commits in the dataset.
pub(crate) fn data_edges(dataset: &Dataset, shape: EdgeShape) -> Vec<EdgeSpec> {
    let ids: HashSet<&str> = dataset.nodes.iter().map(|n| n.id.as_str()).collect();
    dataset
        .edges
        .iter()
        .filter(|e| ids.contains(e.source.as_str()) && ids.contains(e.target.as_str()))
        .map(|e| EdgeSpec::new(e.source.clone(), e.target.clone(), EdgeKind::Data, shape))
        .collect()
}

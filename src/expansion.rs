//! Branch Expansion Controller.
//!
//! Each branch cluster in the tree view is either collapsed (one representative
//! node) or expanded (its commits shown on a small ring above the
//! representative). Toggling mutates the store in place: the tree's edges are
//! detached, the cluster's commit nodes are added or removed, and the edges are
//! re-derived from the new state.

use std::f32::consts::TAU;

use glam::Vec3;

use crate::color;
use crate::data::{EdgeRecord, NodeRecord};
use crate::error::{GraphError, Result};
use crate::graph::{NodeKind, NodeSpec, SceneStore, EXPANDED_RADIUS};
use crate::layout::branch_tree::tree_edges;
use crate::render::RenderBackend;

/// Radius of the ring an expanded branch's commits sit on.
pub const EXPANSION_RADIUS: f32 = 20.0;

/// Height added per commit on the expansion ring.
pub const EXPANSION_HEIGHT_STEP: f32 = 5.0;

/// Scene key of a branch representative.
pub fn cluster_key(branch: &str) -> String {
    format!("branch:{branch}")
}

/// All commits sharing a branch, shown as one collapsible group.
#[derive(Debug, Clone, PartialEq)]
pub struct BranchCluster {
    pub branch: String,
    /// Commits in dataset order.
    pub commits: Vec<NodeRecord>,
    /// Where the representative sits.
    pub position: Vec3,
    pub expanded: bool,
    /// Cached natural-language summary of the branch.
    pub summary: Option<String>,
}

impl BranchCluster {
    pub fn new(branch: String, commits: Vec<NodeRecord>, position: Vec3) -> Self {
        Self {
            branch,
            commits,
            position,
            expanded: false,
            summary: None,
        }
    }

    pub fn key(&self) -> String {
        cluster_key(&self.branch)
    }

    /// Position of the k-th commit when expanded.
    pub fn commit_position(&self, k: usize) -> Vec3 {
        let count = self.commits.len().max(1);
        let angle = TAU * k as f32 / count as f32;
        self.position
            + Vec3::new(
                EXPANSION_RADIUS * angle.cos(),
                (k + 1) as f32 * EXPANSION_HEIGHT_STEP,
                EXPANSION_RADIUS * angle.sin(),
            )
    }
}

/// Expand/collapse state for every branch of the current tree view.
#[derive(Debug, Default)]
pub struct ExpansionController {
    clusters: Vec<BranchCluster>,
    links: Vec<EdgeRecord>,
}

impl ExpansionController {
    pub fn new(clusters: Vec<BranchCluster>, links: Vec<EdgeRecord>) -> Self {
        Self { clusters, links }
    }

    pub fn clusters(&self) -> &[BranchCluster] {
        &self.clusters
    }

    pub fn cluster(&self, branch: &str) -> Option<&BranchCluster> {
        self.clusters.iter().find(|c| c.branch == branch)
    }

    pub fn is_expanded(&self, branch: &str) -> bool {
        self.cluster(branch).is_some_and(|c| c.expanded)
    }

    pub fn set_summary(&mut self, branch: &str, summary: String) {
        if let Some(cluster) = self.clusters.iter_mut().find(|c| c.branch == branch) {
            cluster.summary = Some(summary);
        }
    }

    /// Flip a branch between collapsed and expanded. Returns the new state.
    ///
    /// Only the toggled branch's commit nodes are created or destroyed; every
    /// other node is left where it is.
    pub fn toggle<B: RenderBackend>(
        &mut self,
        branch: &str,
        store: &mut SceneStore<B>,
    ) -> Result<bool> {
        let index = self
            .clusters
            .iter()
            .position(|c| c.branch == branch)
            .ok_or_else(|| GraphError::UnknownNode(cluster_key(branch)))?;

        // Edges first: no node may be removed while something still points at it.
        store.remove_all_edges();

        let cluster = &mut self.clusters[index];
        if cluster.expanded {
            for commit in &cluster.commits {
                match store.node_by_key(&commit.id).map(|n| n.kind.clone()) {
                    Some(NodeKind::Expanded { .. }) => store.remove_node(&commit.id)?,
                    Some(_) => log::warn!("{} is not an expanded commit, leaving it", commit.id),
                    None => {}
                }
            }
            cluster.expanded = false;
        } else {
            for (k, commit) in cluster.commits.iter().enumerate() {
                store.add_node(NodeSpec {
                    key: commit.id.clone(),
                    kind: NodeKind::Expanded {
                        branch: cluster.branch.clone(),
                    },
                    commit: Some(commit.data.clone()),
                    position: cluster.commit_position(k),
                    color: color::commit_color(commit.data.is_initial, commit.data.is_merge()),
                    radius: EXPANDED_RADIUS,
                    label: commit.data.summary(),
                });
            }
            cluster.expanded = true;
        }
        let expanded = cluster.expanded;

        for edge in tree_edges(&self.links, &self.clusters) {
            store.add_edge(edge);
        }
        log::debug!(
            "branch {branch} {} ({} nodes, {} edges)",
            if expanded { "expanded" } else { "collapsed" },
            store.node_count(),
            store.edge_count()
        );
        Ok(expanded)
    }
}

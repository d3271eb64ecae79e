//! Branch-clustered tree layout.
//!
//! One representative node per branch, evenly spaced on a circle. Commit links
//! are drawn between whatever currently stands for each endpoint: the commit
//! itself when its branch is expanded, the branch representative otherwise.

use std::collections::{HashMap, HashSet};
use std::f32::consts::TAU;

use glam::Vec3;

use super::ScenePlan;
use crate::color;
use crate::data::{Dataset, EdgeRecord};
use crate::expansion::{cluster_key, BranchCluster};
use crate::graph::{EdgeKind, EdgeShape, EdgeSpec, NodeKind, NodeSpec, CLUSTER_RADIUS};

/// Configuration for the branch tree layout.
#[derive(Debug, Clone, Copy)]
pub struct BranchTreeConfig {
    /// Radius of the circle carrying the branch representatives.
    pub radius: f32,
}

impl Default for BranchTreeConfig {
    fn default() -> Self {
        Self { radius: 100.0 }
    }
}

/// Group commits by branch, in first-seen branch order, all collapsed.
pub fn clusters(dataset: &Dataset, config: &BranchTreeConfig) -> Vec<BranchCluster> {
    let branches = dataset.branches();
    let count = branches.len();
    branches
        .into_iter()
        .enumerate()
        .map(|(i, branch)| {
            let angle = TAU * i as f32 / count as f32;
            let position = Vec3::new(config.radius * angle.cos(), 0.0, config.radius * angle.sin());
            let commits = dataset
                .nodes
                .iter()
                .filter(|n| n.data.branch() == branch)
                .cloned()
                .collect();
            BranchCluster::new(branch, commits, position)
        })
        .collect()
}

/// Scene node standing for a whole branch.
pub fn cluster_spec(cluster: &BranchCluster) -> NodeSpec {
    NodeSpec {
        key: cluster.key(),
        kind: NodeKind::Cluster {
            branch: cluster.branch.clone(),
        },
        commit: None,
        position: cluster.position,
        color: color::branch_color(&cluster.branch),
        radius: CLUSTER_RADIUS,
        label: format!("{} ({})", cluster.branch, cluster.commits.len()),
    }
}

/// Tube edges for the current expansion state.
///
/// Links inside one collapsed branch are not drawn. Links between two collapsed
/// branches become a single branch-connection edge per branch pair.
pub fn tree_edges(links: &[EdgeRecord], clusters: &[BranchCluster]) -> Vec<EdgeSpec> {
    let mut owner: HashMap<&str, usize> = HashMap::new();
    for (index, cluster) in clusters.iter().enumerate() {
        for commit in &cluster.commits {
            owner.insert(commit.id.as_str(), index);
        }
    }
    let stand_in = |id: &str| -> Option<(String, bool)> {
        let cluster = &clusters[*owner.get(id)?];
        if cluster.expanded {
            Some((id.to_string(), false))
        } else {
            Some((cluster.key(), true))
        }
    };

    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut edges = Vec::new();
    for link in links {
        let (Some((source, source_is_cluster)), Some((target, target_is_cluster))) =
            (stand_in(&link.source), stand_in(&link.target))
        else {
            continue;
        };
        if source == target {
            continue;
        }
        let kind = if source_is_cluster && target_is_cluster {
            EdgeKind::BranchConnection
        } else {
            EdgeKind::Data
        };
        let pair = if kind == EdgeKind::BranchConnection && target < source {
            (target.clone(), source.clone())
        } else {
            (source.clone(), target.clone())
        };
        if seen.insert(pair) {
            edges.push(EdgeSpec::new(source, target, kind, EdgeShape::Tube));
        }
    }
    edges
}

/// Representatives plus branch connections, with every branch collapsed.
pub fn plan(dataset: &Dataset, config: &BranchTreeConfig) -> (ScenePlan, Vec<BranchCluster>) {
    let clusters = clusters(dataset, config);
    let plan = ScenePlan {
        nodes: clusters.iter().map(cluster_spec).collect(),
        edges: tree_edges(&dataset.edges, &clusters),
        markers: Vec::new(),
    };
    (plan, clusters)
}

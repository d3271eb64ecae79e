//! Summary statistics over the commit DAG.

use std::collections::{BTreeMap, HashMap, HashSet};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{Bfs, Topo};
use petgraph::Direction;
use serde::Serialize;

use crate::data::Dataset;

/// Author name used when a commit has none.
pub const UNKNOWN_AUTHOR: &str = "Unknown";

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GraphMetrics {
    pub total_commits: usize,
    /// Largest shortest-path distance from any root.
    pub max_depth: usize,
    /// `total / max(1, total - merges)`.
    pub branching_factor: f64,
    /// Commits with no children.
    pub leaf_commits: usize,
    /// Commits with more than one parent.
    pub merge_commits: usize,
    /// Mean number of commits on a root-to-leaf path.
    pub average_branch_length: f64,
    pub commit_frequency: BTreeMap<String, usize>,
}

/// Compute metrics for a dataset. Links to unknown commits are ignored and
/// repeated links count once.
pub fn compute(dataset: &Dataset) -> GraphMetrics {
    if dataset.is_empty() {
        return GraphMetrics::default();
    }

    let mut graph: DiGraph<(), ()> =
        DiGraph::with_capacity(dataset.nodes.len(), dataset.edges.len());
    let mut index: HashMap<&str, NodeIndex> = HashMap::new();
    for node in &dataset.nodes {
        index.entry(node.id.as_str()).or_insert_with(|| graph.add_node(()));
    }
    let mut seen = HashSet::new();
    for edge in &dataset.edges {
        let (Some(&s), Some(&t)) =
            (index.get(edge.source.as_str()), index.get(edge.target.as_str()))
        else {
            continue;
        };
        if seen.insert((s, t)) {
            graph.add_edge(s, t, ());
        }
    }

    let in_degree = |n: NodeIndex| graph.neighbors_directed(n, Direction::Incoming).count();
    let out_degree = |n: NodeIndex| graph.neighbors_directed(n, Direction::Outgoing).count();

    let total_commits = graph.node_count();
    let merge_commits = graph.node_indices().filter(|&n| in_degree(n) > 1).count();
    let leaf_commits = graph.node_indices().filter(|&n| out_degree(n) == 0).count();
    let roots: Vec<NodeIndex> = graph.node_indices().filter(|&n| in_degree(n) == 0).collect();

    let max_depth = roots
        .iter()
        .map(|&root| {
            let mut depth: HashMap<NodeIndex, usize> = HashMap::from([(root, 0)]);
            let mut bfs = Bfs::new(&graph, root);
            while let Some(n) = bfs.next(&graph) {
                let next = depth[&n] + 1;
                for child in graph.neighbors_directed(n, Direction::Outgoing) {
                    depth.entry(child).or_insert(next);
                }
            }
            depth.into_values().max().unwrap_or(0)
        })
        .max()
        .unwrap_or(0);

    // Paths to a leaf, and their summed lengths, counted from each node.
    let mut order = Vec::with_capacity(total_commits);
    let mut topo = Topo::new(&graph);
    while let Some(n) = topo.next(&graph) {
        order.push(n);
    }
    let mut paths: HashMap<NodeIndex, (f64, f64)> = HashMap::new();
    for &n in order.iter().rev() {
        let entry = if out_degree(n) == 0 {
            (1.0, 1.0)
        } else {
            let (count, length) = graph
                .neighbors_directed(n, Direction::Outgoing)
                .filter_map(|c| paths.get(&c))
                .fold((0.0, 0.0), |(c, l), &(pc, pl)| (c + pc, l + pl));
            (count, length + count)
        };
        paths.insert(n, entry);
    }
    // A lone commit is not a path.
    let (path_count, path_length) = roots
        .iter()
        .filter(|&&r| out_degree(r) > 0)
        .filter_map(|r| paths.get(r))
        .fold((0.0, 0.0), |(c, l), &(pc, pl)| (c + pc, l + pl));

    let mut commit_frequency = BTreeMap::new();
    for node in &dataset.nodes {
        let author = node.data.author.trim();
        let author = if author.is_empty() { UNKNOWN_AUTHOR } else { author };
        *commit_frequency.entry(author.to_string()).or_insert(0) += 1;
    }

    GraphMetrics {
        total_commits,
        max_depth,
        branching_factor: total_commits as f64 / (total_commits - merge_commits).max(1) as f64,
        leaf_commits,
        merge_commits,
        average_branch_length: path_length / path_count.max(1.0),
        commit_frequency,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures;

    #[test]
    fn test_empty_graph_all_zero() {
        assert_eq!(compute(&Dataset::default()), GraphMetrics::default());
    }

    #[test]
    fn test_merge_triangle() {
        let metrics = compute(&fixtures::merge_triangle());
        assert_eq!(metrics.total_commits, 3);
        assert_eq!(metrics.merge_commits, 1);
        assert_eq!(metrics.leaf_commits, 1);
        assert_eq!(metrics.max_depth, 1);
        assert!((metrics.branching_factor - 1.5).abs() < 1e-9);
        // init-a-m and init-m
        assert!((metrics.average_branch_length - 2.5).abs() < 1e-9);
        assert_eq!(metrics.commit_frequency.get("alice"), Some(&3));
    }

    #[test]
    fn test_two_branches() {
        let metrics = compute(&fixtures::two_branches());
        assert_eq!(metrics.total_commits, 6);
        assert_eq!(metrics.merge_commits, 1);
        assert_eq!(metrics.max_depth, 3);
        // c0-c1-f1-f2-c3 and c0-c1-c2-c3
        assert!((metrics.average_branch_length - 4.5).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_author_and_duplicate_links() {
        let mut dataset = fixtures::merge_triangle();
        dataset.nodes[0].data.author = String::new();
        dataset.edges.push(fixtures::edge("init", "a"));
        dataset.edges.push(fixtures::edge("a", "ghost"));
        let metrics = compute(&dataset);
        assert_eq!(metrics.commit_frequency.get(UNKNOWN_AUTHOR), Some(&1));
        assert_eq!(metrics.merge_commits, 1);
    }
}

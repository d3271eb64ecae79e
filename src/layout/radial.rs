//! Radial layout: every commit on one circle in the XZ plane.

use std::f32::consts::TAU;

use glam::Vec3;

use super::{commit_spec, data_edges, ScenePlan};
use crate::data::Dataset;
use crate::graph::EdgeShape;

/// Configuration for the radial layout.
#[derive(Debug, Clone, Copy)]
pub struct RadialConfig {
    /// Circle radius in world units.
    pub radius: f32,
}

impl Default for RadialConfig {
    fn default() -> Self {
        Self { radius: 50.0 }
    }
}

/// Position of slot `i` of `n` on the circle.
pub fn position(i: usize, n: usize, radius: f32) -> Vec3 {
    if n == 0 {
        return Vec3::ZERO;
    }
    let angle = TAU * i as f32 / n as f32;
    Vec3::new(radius * angle.cos(), 0.0, radius * angle.sin())
}

/// Place the i-th of N commits at angle `2π·i/N`, in dataset order.
pub fn plan(dataset: &Dataset, config: &RadialConfig) -> ScenePlan {
    let n = dataset.nodes.len();
    let nodes = dataset
        .nodes
        .iter()
        .enumerate()
        .map(|(i, record)| commit_spec(record, position(i, n, config.radius)))
        .collect();

    ScenePlan {
        nodes,
        edges: data_edges(dataset, EdgeShape::Line),
        markers: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures;

    fn angle_of(p: Vec3) -> f32 {
        p.z.atan2(p.x).rem_euclid(TAU)
    }

    #[test]
    fn test_empty_is_noop() {
        let plan = plan(&Dataset::default(), &RadialConfig::default());
        assert!(plan.is_empty());
        assert!(plan.edges.is_empty());
    }

    #[test]
    fn test_consecutive_nodes_evenly_spaced() {
        for n in [1usize, 2, 3, 7, 12] {
            let step = TAU / n as f32;
            for i in 0..n {
                let a = angle_of(position(i, n, 50.0));
                let b = angle_of(position((i + 1) % n, n, 50.0));
                let delta = (b - a).rem_euclid(TAU);
                // A single node is its own successor: a full turn.
                let delta = if n == 1 { TAU } else { delta };
                assert!((delta - step).abs() < 1e-3, "n={n} i={i} delta={delta}");
            }
        }
    }

    #[test]
    fn test_all_on_circle() {
        let dataset = fixtures::two_branches();
        let plan = plan(&dataset, &RadialConfig::default());
        assert_eq!(plan.nodes.len(), 6);
        for node in &plan.nodes {
            assert!((node.position.length() - 50.0).abs() < 1e-3);
            assert_eq!(node.position.y, 0.0);
        }
        assert_eq!(plan.edges.len(), 6);
        assert!(plan.edges.iter().all(|e| e.shape == EdgeShape::Line));
    }

    #[test]
    fn test_idempotent() {
        let dataset = fixtures::two_branches();
        assert_eq!(
            plan(&dataset, &RadialConfig::default()),
            plan(&dataset, &RadialConfig::default())
        );
    }
}

//! Chronological spiral ("linear" view).
//!
//! Commits are sorted by timestamp; angle, radius and height all grow with
//! the commit's rank, so both the winding and the altitude read as time.

use glam::Vec3;

use super::{commit_spec, data_edges, ScenePlan};
use crate::data::Dataset;
use crate::error::Result;
use crate::graph::EdgeShape;

/// Configuration for the spiral layout.
#[derive(Debug, Clone, Copy)]
pub struct SpiralConfig {
    /// Radians between consecutive commits.
    pub angle_step: f32,
    pub base_radius: f32,
    /// Radius added per commit.
    pub radius_step: f32,
    /// Height added per commit.
    pub height_step: f32,
}

impl Default for SpiralConfig {
    fn default() -> Self {
        Self {
            angle_step: 0.5,
            base_radius: 10.0,
            radius_step: 2.0,
            height_step: 3.0,
        }
    }
}

impl SpiralConfig {
    /// Position of the commit with chronological rank `rank`.
    pub fn position(&self, rank: usize) -> Vec3 {
        let k = rank as f32;
        let angle = k * self.angle_step;
        let radius = self.base_radius + k * self.radius_step;
        Vec3::new(radius * angle.cos(), k * self.height_step, radius * angle.sin())
    }
}

/// Lay commits out along the spiral, oldest first.
///
/// Fails when any commit date cannot be parsed.
pub fn plan(dataset: &Dataset, config: &SpiralConfig) -> Result<ScenePlan> {
    let order = dataset.chronological()?;
    let nodes = order
        .iter()
        .enumerate()
        .map(|(rank, &(index, _))| commit_spec(&dataset.nodes[index], config.position(rank)))
        .collect();

    Ok(ScenePlan {
        nodes,
        edges: data_edges(dataset, EdgeShape::Line),
        markers: Vec::new(),
    })
}

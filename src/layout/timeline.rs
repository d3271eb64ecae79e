//! Timeline layout: time on X, branch lanes on Y.

use std::collections::HashMap;

use glam::Vec3;

use super::{commit_spec, data_edges, ScenePlan};
use crate::data::{format_date, Dataset};
use crate::error::{GraphError, Result};
use crate::graph::EdgeShape;

/// Configuration for the timeline layout.
#[derive(Debug, Clone, Copy)]
pub struct TimelineConfig {
    /// World units of x-extent per commit.
    pub scale_per_commit: f32,
    /// Vertical distance between branch lanes.
    pub lane_spacing: f32,
    /// Number of date markers, including both endpoints.
    pub marker_count: usize,
    /// Vertical offset of the marker row below lane 0.
    pub marker_offset: f32,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            scale_per_commit: 10.0,
            lane_spacing: 20.0,
            marker_count: 5,
            marker_offset: -10.0,
        }
    }
}

/// Lay commits out left to right by time, one lane per branch.
///
/// `x = (t - t0) / (t1 - t0) * scale_per_commit * N`; when every commit shares a
/// timestamp all of them sit at `x = 0`. Lanes follow first appearance of each
/// branch in the dataset.
pub fn plan(dataset: &Dataset, config: &TimelineConfig) -> Result<ScenePlan> {
    if dataset.is_empty() {
        return Err(GraphError::EmptyDataset { layout: "timeline" });
    }

    let order = dataset.chronological()?;
    let (Some(&(_, first)), Some(&(_, last))) = (order.first(), order.last()) else {
        return Err(GraphError::EmptyDataset { layout: "timeline" });
    };
    let range = (last - first) as f64;
    let width = config.scale_per_commit * dataset.nodes.len() as f32;
    let x_at = |t: i64| -> f32 {
        if range <= 0.0 {
            0.0
        } else {
            (((t - first) as f64 / range) as f32) * width
        }
    };

    let lanes: HashMap<String, usize> = dataset
        .branches()
        .into_iter()
        .enumerate()
        .map(|(lane, branch)| (branch, lane))
        .collect();

    let nodes = order
        .iter()
        .map(|&(index, t)| {
            let record = &dataset.nodes[index];
            let lane = lanes.get(record.data.branch()).copied().unwrap_or(0);
            let position = Vec3::new(x_at(t), lane as f32 * config.lane_spacing, 0.0);
            commit_spec(record, position)
        })
        .collect();

    let steps = config.marker_count.saturating_sub(1).max(1);
    let markers = (0..config.marker_count)
        .map(|k| {
            let fraction = k as f64 / steps as f64;
            let t = first + (range * fraction).round() as i64;
            let x = fraction as f32 * width;
            (Vec3::new(x, config.marker_offset, 0.0), format_date(t))
        })
        .collect();

    Ok(ScenePlan {
        nodes,
        edges: data_edges(dataset, EdgeShape::Line),
        markers,
    })
}

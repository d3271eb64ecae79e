//! Edge geometry: straight segments and curved tubes.

use glam::Vec3;
use serde::Serialize;

/// Upward displacement of a tube's control point.
pub const TUBE_OFFSET: f32 = 20.0;

/// Number of straight pieces a tube curve is sampled into.
pub const TUBE_SEGMENTS: usize = 20;

/// Shape of a rendered edge.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EdgeGeometry {
    /// Straight segment.
    Line { from: [f32; 3], to: [f32; 3] },
    /// Tube following a quadratic Bézier from source to target.
    Tube { points: Vec<[f32; 3]>, radius: f32 },
}

impl EdgeGeometry {
    pub fn line(from: Vec3, to: Vec3) -> Self {
        EdgeGeometry::Line {
            from: from.to_array(),
            to: to.to_array(),
        }
    }

    /// Tube whose control point is the endpoints' midpoint raised by [`TUBE_OFFSET`].
    pub fn tube(from: Vec3, to: Vec3, radius: f32) -> Self {
        let control = tube_control_point(from, to);
        let points = (0..=TUBE_SEGMENTS)
            .map(|i| {
                let t = i as f32 / TUBE_SEGMENTS as f32;
                quadratic_bezier(from, control, to, t).to_array()
            })
            .collect();
        EdgeGeometry::Tube { points, radius }
    }

    /// First and last point of the geometry.
    pub fn endpoints(&self) -> (Vec3, Vec3) {
        match self {
            EdgeGeometry::Line { from, to } => (Vec3::from_array(*from), Vec3::from_array(*to)),
            EdgeGeometry::Tube { points, .. } => {
                let first = points.first().copied().unwrap_or_default();
                let last = points.last().copied().unwrap_or_default();
                (Vec3::from_array(first), Vec3::from_array(last))
            }
        }
    }
}

pub fn tube_control_point(from: Vec3, to: Vec3) -> Vec3 {
    (from + to) * 0.5 + Vec3::Y * TUBE_OFFSET
}

fn quadratic_bezier(p0: Vec3, p1: Vec3, p2: Vec3, t: f32) -> Vec3 {
    let u = 1.0 - t;
    p0 * (u * u) + p1 * (2.0 * u * t) + p2 * (t * t)
}

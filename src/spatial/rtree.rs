//! R-tree based spatial index using the rstar crate.
//!
//! Provides O(log n) spatial queries for:
//! - Ray picking (pointer hover and click)
//! - Nearest neighbor
//! - Point-in-radius

use glam::Vec3;
use rstar::{Envelope, PointDistance, RTree, RTreeObject, SelectionFunction, AABB};

use crate::camera::Ray;
use crate::graph::NodeId;

/// A sphere in the spatial index with associated node ID.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodePoint {
    /// The node identifier.
    pub id: NodeId,
    pub position: [f32; 3],
    /// Pick radius.
    pub radius: f32,
}

impl NodePoint {
    pub fn new(id: NodeId, position: Vec3, radius: f32) -> Self {
        Self {
            id,
            position: position.to_array(),
            radius,
        }
    }

    fn center(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }
}

impl RTreeObject for NodePoint {
    type Envelope = AABB<[f32; 3]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.position)
    }
}

impl PointDistance for NodePoint {
    fn distance_2(&self, point: &[f32; 3]) -> f32 {
        self.center().distance_squared(Vec3::from_array(*point))
    }
}

/// Walks only the subtrees a ray can reach.
///
/// Envelopes hold sphere centres, so parents are widened by the largest pick
/// radius before the slab test.
struct RaySelection {
    ray: Ray,
    max_radius: f32,
}

impl SelectionFunction<NodePoint> for RaySelection {
    fn should_unpack_parent(&self, envelope: &AABB<[f32; 3]>) -> bool {
        let pad = Vec3::splat(self.max_radius);
        let lower = Vec3::from_array(envelope.lower()) - pad;
        let upper = Vec3::from_array(envelope.upper()) + pad;
        self.ray.intersects_aabb(lower, upper)
    }

    fn should_unpack_leaf(&self, leaf: &NodePoint) -> bool {
        self.ray.intersect_sphere(leaf.center(), leaf.radius).is_some()
    }
}

/// Spatial index for scene nodes.
///
/// Uses an R*-tree for efficient spatial queries.
#[derive(Debug)]
pub struct SpatialIndex {
    tree: RTree<NodePoint>,
    max_radius: f32,
}

impl SpatialIndex {
    /// Create a new empty spatial index.
    pub fn new() -> Self {
        Self {
            tree: RTree::new(),
            max_radius: 0.0,
        }
    }

    /// Closest node whose sphere the ray passes through.
    pub fn pick(&self, ray: &Ray) -> Option<NodeId> {
        let selection = RaySelection {
            ray: *ray,
            max_radius: self.max_radius,
        };
        self.tree
            .locate_with_selection_function(selection)
            .filter_map(|point| {
                let t = ray.intersect_sphere(point.center(), point.radius)?;
                Some((t, point.id))
            })
            .min_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)))
            .map(|(_, id)| id)
    }

    /// Rebuild the index from scratch.
    ///
    /// This is more efficient than incremental inserts for bulk updates.
    pub fn rebuild(&mut self, points: Vec<NodePoint>) {
        self.max_radius = points.iter().map(|p| p.radius).fold(0.0, f32::max);
        self.tree = RTree::bulk_load(points);
    }

    /// Clear all nodes from the index.
    pub fn clear(&mut self) {
        self.tree = RTree::new();
        self.max_radius = 0.0;
    }

    /// Check if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Bounding box of every indexed centre.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        if self.is_empty() {
            return None;
        }
        let envelope = self.tree.root().envelope();
        Some((Vec3::from_array(envelope.lower()), Vec3::from_array(envelope.upper())))
    }
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> SpatialIndex {
        let mut index = SpatialIndex::new();
        index.rebuild(vec![
            NodePoint::new(NodeId(0), Vec3::ZERO, 2.0),
            NodePoint::new(NodeId(1), Vec3::new(10.0, 0.0, 0.0), 2.0),
            NodePoint::new(NodeId(2), Vec3::new(0.0, 0.0, -20.0), 2.0),
        ]);
        index
    }

    #[test]
    fn test_pick_front_most() {
        let index = index();
        // Looking down -Z through node 0 and node 2; node 0 is closer.
        let ray = Ray::new(Vec3::new(0.0, 0.0, 50.0), Vec3::NEG_Z);
        assert_eq!(index.pick(&ray), Some(NodeId(0)));

        // Looking down +Z from behind hits node 2 first.
        let ray = Ray::new(Vec3::new(0.0, 0.0, -50.0), Vec3::Z);
        assert_eq!(index.pick(&ray), Some(NodeId(2)));
    }

    #[test]
    fn test_pick_miss() {
        let index = index();
        let ray = Ray::new(Vec3::new(5.0, 30.0, 50.0), Vec3::NEG_Z);
        assert_eq!(index.pick(&ray), None);
    }

    #[test]
    fn test_pick_respects_radius() {
        let mut index = SpatialIndex::new();
        index.rebuild(vec![NodePoint::new(NodeId(4), Vec3::ZERO, 0.5)]);
        let grazing = Ray::new(Vec3::new(1.0, 0.0, 10.0), Vec3::NEG_Z);
        assert_eq!(index.pick(&grazing), None);

        index.rebuild(vec![
            NodePoint::new(NodeId(4), Vec3::ZERO, 0.5),
            NodePoint::new(NodeId(5), Vec3::ZERO, 3.0),
        ]);
        assert_eq!(index.pick(&grazing), Some(NodeId(5)));
    }

    #[test]
    fn test_bounds_and_clear() {
        let mut index = index();
        assert!(!index.is_empty());
        let (min, max) = index.bounds().unwrap();
        assert_eq!(min, Vec3::new(0.0, 0.0, -20.0));
        assert_eq!(max, Vec3::new(10.0, 0.0, 0.0));

        index.clear();
        assert!(index.is_empty());
        assert!(index.bounds().is_none());
    }
}

//! Spatial indexing for O(log n) hit testing.
//!
//! This module provides an R-tree based spatial index for ray picking and
//! range queries on scene nodes.

mod rtree;

pub use rtree::{NodePoint, SpatialIndex};

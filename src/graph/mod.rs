//! Scene graph data structures and operations.
//!
//! This module provides the scene store built on petgraph's StableGraph for
//! stable node/edge indices. The store owns every render handle and keeps the
//! backend in step with each mutation.

mod edge;
mod node;
mod store;

pub use edge::{EdgeId, EdgeKind, EdgeShape, EdgeSpec, EdgeState, SceneEdge};
pub use node::{
    NodeId, NodeKind, NodeSpec, NodeState, SceneNode, CLUSTER_RADIUS, COMMIT_RADIUS,
    EXPANDED_RADIUS,
};
pub use store::SceneStore;

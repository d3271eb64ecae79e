//! Node type and related structures.
//!
//! Every node in the scene has:
//! - A stable identifier (survives removal of other nodes)
//! - A string key unique within the scene (commit id, or a derived key for
//!   cluster and expanded nodes)
//! - A position in 3D world space
//! - A render handle owned by the scene store
//! - Transient UI state (pre-highlight colour, hover/selection flags)

use std::fmt;

use glam::Vec3;

use crate::color::Color;
use crate::data::CommitData;
use crate::render::RenderHandle;

/// Stable node identifier.
///
/// This ID remains valid even after other nodes are removed from the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({})", self.0)
    }
}

/// Node state flags packed into a single byte.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeState {
    flags: u8,
}

impl NodeState {
    const HIDDEN: u8 = 0b0000_0001;
    const SELECTED: u8 = 0b0000_0010;
    const HOVERED: u8 = 0b0000_0100;
    const HIGHLIGHTED: u8 = 0b0000_1000;

    /// Create a new default node state.
    #[inline]
    pub fn new() -> Self {
        Self { flags: 0 }
    }

    #[inline]
    fn set(&mut self, flag: u8, on: bool) {
        if on {
            self.flags |= flag;
        } else {
            self.flags &= !flag;
        }
    }

    /// Check if the node is hidden by the active filter.
    #[inline]
    pub fn is_hidden(self) -> bool {
        self.flags & Self::HIDDEN != 0
    }

    #[inline]
    pub fn set_hidden(&mut self, hidden: bool) {
        self.set(Self::HIDDEN, hidden);
    }

    #[inline]
    pub fn is_selected(self) -> bool {
        self.flags & Self::SELECTED != 0
    }

    #[inline]
    pub fn set_selected(&mut self, selected: bool) {
        self.set(Self::SELECTED, selected);
    }

    #[inline]
    pub fn is_hovered(self) -> bool {
        self.flags & Self::HOVERED != 0
    }

    #[inline]
    pub fn set_hovered(&mut self, hovered: bool) {
        self.set(Self::HOVERED, hovered);
    }

    /// Check if the node is lit as a neighbour of the hovered node.
    #[inline]
    pub fn is_highlighted(self) -> bool {
        self.flags & Self::HIGHLIGHTED != 0
    }

    #[inline]
    pub fn set_highlighted(&mut self, highlighted: bool) {
        self.set(Self::HIGHLIGHTED, highlighted);
    }
}

/// What a scene node stands for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// A commit placed directly by a layout.
    Commit,
    /// Representative of a whole branch in the tree view.
    Cluster { branch: String },
    /// A commit created by expanding a branch cluster.
    Expanded { branch: String },
}

impl NodeKind {
    pub fn is_cluster(&self) -> bool {
        matches!(self, NodeKind::Cluster { .. })
    }
}

/// Radius of a plain commit sphere.
pub const COMMIT_RADIUS: f32 = 3.0;
/// Radius of a branch cluster sphere.
pub const CLUSTER_RADIUS: f32 = 6.0;
/// Radius of a commit shown inside an expanded cluster.
pub const EXPANDED_RADIUS: f32 = 2.0;

/// Everything needed to put a node into the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeSpec {
    pub key: String,
    pub kind: NodeKind,
    /// Commit payload; absent for cluster nodes.
    pub commit: Option<CommitData>,
    pub position: Vec3,
    pub color: Color,
    pub radius: f32,
    pub label: String,
}

/// A node living in the scene store.
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub key: String,
    pub kind: NodeKind,
    pub commit: Option<CommitData>,
    pub position: Vec3,
    /// Colour assigned by the colour policy.
    pub base_color: Color,
    /// Colour currently shown.
    pub color: Color,
    /// Colour to restore when hover highlighting ends.
    pub original_color: Option<Color>,
    pub radius: f32,
    pub label: String,
    pub handle: RenderHandle,
    pub state: NodeState,
}

impl SceneNode {
    pub(crate) fn from_spec(spec: NodeSpec, handle: RenderHandle) -> Self {
        Self {
            key: spec.key,
            kind: spec.kind,
            commit: spec.commit,
            position: spec.position,
            base_color: spec.color,
            color: spec.color,
            original_color: None,
            radius: spec.radius,
            label: spec.label,
            handle,
            state: NodeState::new(),
        }
    }

    /// Branch this node belongs to, if it carries one.
    pub fn branch(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Cluster { branch } | NodeKind::Expanded { branch } => Some(branch),
            NodeKind::Commit => self.commit.as_ref().map(|c| c.branch()),
        }
    }
}

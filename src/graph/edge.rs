//! Edge type and related structures.
//!
//! Edges connect two scene nodes. Each edge has:
//! - A stable unique identifier
//! - Source and target node IDs
//! - A kind: commit parent link, or synthetic link between branch clusters
//! - A shape: straight line or curved tube

use std::fmt;

use crate::color::Color;
use crate::render::RenderHandle;

use super::node::NodeId;

/// Stable edge identifier.
///
/// This ID remains valid even after other edges are removed from the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(pub u32);

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Edge({})", self.0)
    }
}

/// Edge state flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EdgeState {
    flags: u8,
}

impl EdgeState {
    const HIDDEN: u8 = 0b0000_0001;
    const HIGHLIGHTED: u8 = 0b0000_0010;

    /// Create a new default edge state.
    #[inline]
    pub fn new() -> Self {
        Self { flags: 0 }
    }

    /// Check if the edge is hidden.
    #[inline]
    pub fn is_hidden(self) -> bool {
        self.flags & Self::HIDDEN != 0
    }

    /// Set the hidden state.
    #[inline]
    pub fn set_hidden(&mut self, hidden: bool) {
        if hidden {
            self.flags |= Self::HIDDEN;
        } else {
            self.flags &= !Self::HIDDEN;
        }
    }

    /// Check if the edge is part of the hover highlight.
    #[inline]
    pub fn is_highlighted(self) -> bool {
        self.flags & Self::HIGHLIGHTED != 0
    }

    /// Set the highlighted state.
    #[inline]
    pub fn set_highlighted(&mut self, highlighted: bool) {
        if highlighted {
            self.flags |= Self::HIGHLIGHTED;
        } else {
            self.flags &= !Self::HIGHLIGHTED;
        }
    }
}

/// Origin of an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    /// Commit parent link from the dataset.
    Data,
    /// Synthetic link between two branch cluster representatives.
    BranchConnection,
}

/// Rendered form of an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeShape {
    Line,
    Tube,
}

/// Everything needed to put an edge into the scene. Endpoints are node keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeSpec {
    pub source: String,
    pub target: String,
    pub kind: EdgeKind,
    pub shape: EdgeShape,
}

impl EdgeSpec {
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        kind: EdgeKind,
        shape: EdgeShape,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            kind,
            shape,
        }
    }
}

/// An edge living in the scene store.
#[derive(Debug, Clone)]
pub struct SceneEdge {
    pub source: NodeId,
    pub target: NodeId,
    pub kind: EdgeKind,
    pub shape: EdgeShape,
    pub base_color: Color,
    pub color: Color,
    /// Colour to restore when hover highlighting ends.
    pub original_color: Option<Color>,
    pub handle: RenderHandle,
    pub state: EdgeState,
}

//! Render handles and the backend trait.

use std::collections::HashSet;
use std::fmt;

use glam::Vec3;
use serde::Serialize;

use super::geometry::EdgeGeometry;
use crate::camera::CameraView;
use crate::color::Color;

/// Identifier of one graphical object owned by the scene store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RenderHandle(pub u32);

impl RenderHandle {
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for RenderHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({})", self.0)
    }
}

/// Allocator for render handles.
///
/// Tracks every live handle so that releasing the arena releases everything
/// it ever handed out. Handle numbers are never reused within an arena.
#[derive(Debug, Default)]
pub struct HandleArena {
    next: u32,
    live: HashSet<RenderHandle>,
}

impl HandleArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self) -> RenderHandle {
        let handle = RenderHandle(self.next);
        self.next += 1;
        self.live.insert(handle);
        handle
    }

    /// Mark a handle as freed. Returns false if it was not live.
    pub fn free(&mut self, handle: RenderHandle) -> bool {
        self.live.remove(&handle)
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Remove and return every live handle, sorted for deterministic release.
    pub fn drain(&mut self) -> Vec<RenderHandle> {
        let mut handles: Vec<_> = self.live.drain().collect();
        handles.sort();
        handles
    }
}

/// Pointer cursor affordance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Cursor {
    Default,
    Pointer,
    Grabbing,
}

impl Cursor {
    pub fn as_css(self) -> &'static str {
        match self {
            Cursor::Default => "default",
            Cursor::Pointer => "pointer",
            Cursor::Grabbing => "grabbing",
        }
    }
}

/// Creation payload for a node sphere.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeVisual {
    pub position: [f32; 3],
    pub color: u32,
    pub radius: f32,
    pub label: String,
    pub label_visible: bool,
    pub visible: bool,
}

/// Creation payload for an edge.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeVisual {
    pub geometry: EdgeGeometry,
    pub color: u32,
    pub visible: bool,
}

/// Creation payload for a timeline axis marker.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerVisual {
    pub position: [f32; 3],
    pub label: String,
    pub color: u32,
}

/// Receiver of scene mutations.
///
/// Only the scene store calls `create_*` and `release`; every handle passed to
/// the other methods is live.
pub trait RenderBackend {
    fn create_node(&mut self, handle: RenderHandle, visual: &NodeVisual);
    fn create_edge(&mut self, handle: RenderHandle, visual: &EdgeVisual);
    fn create_marker(&mut self, handle: RenderHandle, visual: &MarkerVisual);

    fn move_node(&mut self, handle: RenderHandle, position: Vec3);
    fn update_edge(&mut self, handle: RenderHandle, geometry: &EdgeGeometry);

    fn set_color(&mut self, handle: RenderHandle, color: Color);
    fn set_visible(&mut self, handle: RenderHandle, visible: bool);
    fn set_scale(&mut self, handle: RenderHandle, scale: f32);
    fn set_label_visible(&mut self, handle: RenderHandle, visible: bool);

    /// Free the object's geometry and material.
    fn release(&mut self, handle: RenderHandle);

    /// Draw one frame from the given camera.
    fn present(&mut self, camera: &CameraView);

    fn set_cursor(&mut self, cursor: Cursor);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arena_allocate_free() {
        let mut arena = HandleArena::new();
        let a = arena.allocate();
        let b = arena.allocate();
        assert_ne!(a, b);
        assert_eq!(arena.live_count(), 2);

        assert!(arena.free(a));
        assert!(!arena.free(a));
        assert_eq!(arena.live_count(), 1);
        assert_eq!(arena.drain(), vec![b]);
    }

    #[test]
    fn test_arena_never_reuses() {
        let mut arena = HandleArena::new();
        let a = arena.allocate();
        arena.free(a);
        let b = arena.allocate();
        assert_ne!(a, b);
    }

    #[test]
    fn test_arena_drain_sorted() {
        let mut arena = HandleArena::new();
        for _ in 0..5 {
            arena.allocate();
        }
        let drained = arena.drain();
        assert_eq!(drained.len(), 5);
        assert!(drained.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(arena.live_count(), 0);
    }

    #[test]
    fn test_cursor_css() {
        assert_eq!(Cursor::Pointer.as_css(), "pointer");
        assert_eq!(Cursor::Default.as_css(), "default");
    }
}

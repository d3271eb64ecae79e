//! Rendering seam.
//!
//! The engine never draws anything itself. Every visible object is a
//! [`RenderHandle`] allocated by the scene store and realised by a
//! [`RenderBackend`]: three.js objects in the browser, or the in-memory
//! [`HeadlessBackend`] in tests and native builds.

mod backend;
mod geometry;
mod headless;

pub use backend::{
    Cursor, EdgeVisual, HandleArena, MarkerVisual, NodeVisual, RenderBackend, RenderHandle,
};
pub use geometry::{EdgeGeometry, TUBE_OFFSET, TUBE_SEGMENTS};
pub use headless::{HeadlessBackend, HeadlessObject};

//! In-memory backend that records the scene instead of drawing it.

use std::collections::HashMap;

use glam::Vec3;

use super::backend::{Cursor, EdgeVisual, MarkerVisual, NodeVisual, RenderBackend, RenderHandle};
use super::geometry::EdgeGeometry;
use crate::camera::CameraView;
use crate::color::Color;

/// What the headless backend knows about one live object.
#[derive(Debug, Clone, PartialEq)]
pub enum HeadlessObject {
    Node {
        position: Vec3,
        color: Color,
        scale: f32,
        visible: bool,
        label_visible: bool,
    },
    Edge {
        geometry: EdgeGeometry,
        color: Color,
        visible: bool,
    },
    Marker {
        position: Vec3,
        label: String,
    },
}

/// Backend used natively and in tests.
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    objects: HashMap<RenderHandle, HeadlessObject>,
    created: usize,
    released: usize,
    frames: usize,
    cursor: Option<Cursor>,
    last_camera: Option<CameraView>,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live_objects(&self) -> usize {
        self.objects.len()
    }

    pub fn created(&self) -> usize {
        self.created
    }

    pub fn released(&self) -> usize {
        self.released
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor.unwrap_or(Cursor::Default)
    }

    pub fn last_camera(&self) -> Option<&CameraView> {
        self.last_camera.as_ref()
    }

    pub fn object(&self, handle: RenderHandle) -> Option<&HeadlessObject> {
        self.objects.get(&handle)
    }

    pub fn color_of(&self, handle: RenderHandle) -> Option<Color> {
        match self.objects.get(&handle)? {
            HeadlessObject::Node { color, .. } | HeadlessObject::Edge { color, .. } => Some(*color),
            HeadlessObject::Marker { .. } => None,
        }
    }

    pub fn markers(&self) -> Vec<(Vec3, String)> {
        let mut markers: Vec<_> = self
            .objects
            .values()
            .filter_map(|o| match o {
                HeadlessObject::Marker { position, label } => Some((*position, label.clone())),
                _ => None,
            })
            .collect();
        markers.sort_by(|a, b| a.0.x.total_cmp(&b.0.x));
        markers
    }

    fn insert(&mut self, handle: RenderHandle, object: HeadlessObject) {
        if self.objects.insert(handle, object).is_some() {
            log::warn!("headless backend: {handle} created twice");
        }
        self.created += 1;
    }
}

impl RenderBackend for HeadlessBackend {
    fn create_node(&mut self, handle: RenderHandle, visual: &NodeVisual) {
        self.insert(
            handle,
            HeadlessObject::Node {
                position: Vec3::from_array(visual.position),
                color: Color::from_hex(visual.color),
                scale: 1.0,
                visible: visual.visible,
                label_visible: visual.label_visible,
            },
        );
    }

    fn create_edge(&mut self, handle: RenderHandle, visual: &EdgeVisual) {
        self.insert(
            handle,
            HeadlessObject::Edge {
                geometry: visual.geometry.clone(),
                color: Color::from_hex(visual.color),
                visible: visual.visible,
            },
        );
    }

    fn create_marker(&mut self, handle: RenderHandle, visual: &MarkerVisual) {
        self.insert(
            handle,
            HeadlessObject::Marker {
                position: Vec3::from_array(visual.position),
                label: visual.label.clone(),
            },
        );
    }

    fn move_node(&mut self, handle: RenderHandle, to: Vec3) {
        if let Some(HeadlessObject::Node { position, .. }) = self.objects.get_mut(&handle) {
            *position = to;
        }
    }

    fn update_edge(&mut self, handle: RenderHandle, new_geometry: &EdgeGeometry) {
        if let Some(HeadlessObject::Edge { geometry, .. }) = self.objects.get_mut(&handle) {
            *geometry = new_geometry.clone();
        }
    }

    fn set_color(&mut self, handle: RenderHandle, new_color: Color) {
        match self.objects.get_mut(&handle) {
            Some(HeadlessObject::Node { color, .. }) | Some(HeadlessObject::Edge { color, .. }) => {
                *color = new_color;
            }
            _ => {}
        }
    }

    fn set_visible(&mut self, handle: RenderHandle, is_visible: bool) {
        match self.objects.get_mut(&handle) {
            Some(HeadlessObject::Node { visible, .. })
            | Some(HeadlessObject::Edge { visible, .. }) => {
                *visible = is_visible;
            }
            _ => {}
        }
    }

    fn set_scale(&mut self, handle: RenderHandle, new_scale: f32) {
        if let Some(HeadlessObject::Node { scale, .. }) = self.objects.get_mut(&handle) {
            *scale = new_scale;
        }
    }

    fn set_label_visible(&mut self, handle: RenderHandle, is_visible: bool) {
        if let Some(HeadlessObject::Node { label_visible, .. }) = self.objects.get_mut(&handle) {
            *label_visible = is_visible;
        }
    }

    fn release(&mut self, handle: RenderHandle) {
        if self.objects.remove(&handle).is_some() {
            self.released += 1;
        } else {
            log::warn!("headless backend: release of unknown {handle}");
        }
    }

    fn present(&mut self, camera: &CameraView) {
        self.frames += 1;
        self.last_camera = Some(camera.clone());
    }

    fn set_cursor(&mut self, cursor: Cursor) {
        self.cursor = Some(cursor);
    }
}

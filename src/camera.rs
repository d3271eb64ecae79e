//! Perspective camera, pointer rays and reframing.

use glam::{Mat4, Quat, Vec2, Vec3};
use serde::Serialize;

/// Multiplier applied to the fitted camera distance so nodes are not flush
/// with the viewport edge.
pub const FRAME_PADDING: f32 = 1.5;

/// Closest the camera is placed to a framed scene.
pub const MIN_FRAME_DISTANCE: f32 = 20.0;

/// Snapshot of the camera handed to the render backend each frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraView {
    pub position: [f32; 3],
    pub target: [f32; 3],
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

/// A half-line in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit length.
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Distance along the ray to the first intersection with a sphere, if any.
    pub fn intersect_sphere(&self, center: Vec3, radius: f32) -> Option<f32> {
        let oc = self.origin - center;
        let b = oc.dot(self.direction);
        let c = oc.length_squared() - radius * radius;
        let discriminant = b * b - c;
        if discriminant < 0.0 {
            return None;
        }
        let sqrt_d = discriminant.sqrt();
        let near = -b - sqrt_d;
        if near >= 0.0 {
            return Some(near);
        }
        // Origin inside the sphere.
        let far = -b + sqrt_d;
        (far >= 0.0).then_some(far)
    }

    /// Slab test against an axis-aligned box.
    pub fn intersects_aabb(&self, min: Vec3, max: Vec3) -> bool {
        let mut t_min = 0.0f32;
        let mut t_max = f32::INFINITY;
        for axis in 0..3 {
            let origin = self.origin[axis];
            let direction = self.direction[axis];
            if direction.abs() < f32::EPSILON {
                if origin < min[axis] || origin > max[axis] {
                    return false;
                }
                continue;
            }
            let inv = 1.0 / direction;
            let mut t0 = (min[axis] - origin) * inv;
            let mut t1 = (max[axis] - origin) * inv;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_min > t_max {
                return false;
            }
        }
        true
    }

    /// Intersection with the plane through `point` with normal `normal`.
    pub fn intersect_plane(&self, point: Vec3, normal: Vec3) -> Option<Vec3> {
        let denom = normal.dot(self.direction);
        if denom.abs() < 1e-6 {
            return None;
        }
        let t = (point - self.origin).dot(normal) / denom;
        (t >= 0.0).then(|| self.at(t))
    }
}

/// Perspective camera looking at a target.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 50.0, 200.0),
            target: Vec3::ZERO,
            fov_y: 75f32.to_radians(),
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 5000.0,
        }
    }
}

impl Camera {
    pub fn set_viewport(&mut self, width: f32, height: f32) {
        if width > 0.0 && height > 0.0 {
            self.aspect = width / height;
        }
    }

    pub fn view_projection(&self) -> Mat4 {
        let projection = Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far);
        let view = Mat4::look_at_rh(self.position, self.target, Vec3::Y);
        projection * view
    }

    /// Unit vector from the camera toward its target.
    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize_or_zero()
    }

    /// Ray through a point in normalized device coordinates (`-1..=1`, y up).
    pub fn ray_from_ndc(&self, ndc: Vec2) -> Ray {
        let inverse = self.view_projection().inverse();
        // glam's right-handed projection maps depth to 0..=1.
        let near = inverse.project_point3(Vec3::new(ndc.x, ndc.y, 0.0));
        let far = inverse.project_point3(Vec3::new(ndc.x, ndc.y, 1.0));
        Ray::new(near, far - near)
    }

    /// Fit the camera to an axis-aligned bounding volume.
    ///
    /// The camera targets the volume's centroid at a distance derived from the
    /// field of view and the volume's largest dimension, times [`FRAME_PADDING`].
    pub fn frame_bounds(&mut self, min: Vec3, max: Vec3) {
        let center = (min + max) * 0.5;
        let max_dim = (max - min).max_element();
        let fit = (max_dim * 0.5) / (self.fov_y * 0.5).tan();
        let distance = (fit * FRAME_PADDING).max(MIN_FRAME_DISTANCE);
        let direction = Vec3::new(0.0, 0.4, 1.0).normalize();

        self.target = center;
        self.position = center + direction * distance;
        self.far = self.far.max(distance * 4.0);
        log::debug!("camera framed at distance {distance:.1} around {center:?}");
    }

    /// Rotate the camera about the vertical axis through its target.
    pub fn orbit(&mut self, angle: f32) {
        let offset = self.position - self.target;
        self.position = self.target + Quat::from_rotation_y(angle) * offset;
    }

    pub fn view(&self) -> CameraView {
        CameraView {
            position: self.position.to_array(),
            target: self.target.to_array(),
            fov_degrees: self.fov_y.to_degrees(),
            near: self.near,
            far: self.far,
        }
    }
}

/// Convert a pixel position inside a viewport to normalized device coordinates.
pub fn ndc_from_pixels(x: f32, y: f32, width: f32, height: f32) -> Vec2 {
    if width <= 0.0 || height <= 0.0 {
        return Vec2::ZERO;
    }
    Vec2::new((x / width) * 2.0 - 1.0, -((y / height) * 2.0 - 1.0))
}

//! Camera view
//!
//! The per-frame viewpoint the shadow core culls and fits against.

use super::culling::Frustum;
use super::geometry::Aabb;
use glam::{Mat4, Vec3};

/// Viewport information.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Get the aspect ratio.
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280, 720)
    }
}

/// Projection mode for a camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    Perspective {
        /// Vertical field of view in radians.
        fov: f32,
        near: f32,
        far: f32,
    },
    Orthographic {
        /// Height of the view volume in world units.
        height: f32,
        near: f32,
        far: f32,
    },
}

impl Projection {
    /// Create a perspective projection.
    pub fn perspective(fov_degrees: f32, near: f32, far: f32) -> Self {
        Self::Perspective {
            fov: fov_degrees.to_radians(),
            near,
            far,
        }
    }

    /// Create an orthographic projection.
    pub fn orthographic(height: f32, near: f32, far: f32) -> Self {
        Self::Orthographic { height, near, far }
    }

    /// Get the projection matrix for an aspect ratio.
    pub fn matrix(&self, aspect: f32) -> Mat4 {
        match *self {
            Projection::Perspective { fov, near, far } => {
                Mat4::perspective_rh(fov, aspect, near, far)
            }
            Projection::Orthographic { height, near, far } => {
                let half_h = height / 2.0;
                let half_w = half_h * aspect;
                Mat4::orthographic_rh(-half_w, half_w, -half_h, half_h, near, far)
            }
        }
    }
}

/// Camera state for one frame.
#[derive(Debug, Clone)]
pub struct View {
    pub position: Vec3,
    pub view: Mat4,
    pub projection: Projection,
    pub view_projection: Mat4,
    pub frustum: Frustum,
    pub viewport: Viewport,
}

impl View {
    /// Camera at `position` looking at `target`.
    pub fn look_at(position: Vec3, target: Vec3, up: Vec3, projection: Projection, viewport: Viewport) -> Self {
        let view = Mat4::look_at_rh(position, target, up);
        let view_projection = projection.matrix(viewport.aspect()) * view;
        Self {
            position,
            view,
            projection,
            view_projection,
            frustum: Frustum::from_view_projection(view_projection),
            viewport,
        }
    }

    /// World-space AABB of the view frustum.
    pub fn frustum_aabb(&self) -> Aabb {
        self.frustum.aabb()
    }

    /// Approximate on-screen radius in pixels of a sphere.
    ///
    /// Returns `f32::INFINITY` when the camera is inside the sphere.
    pub fn projected_radius_px(&self, center: Vec3, radius: f32) -> f32 {
        let half_height_px = self.viewport.height as f32 * 0.5;
        match self.projection {
            Projection::Perspective { fov, .. } => {
                let distance = self.position.distance(center);
                if distance <= radius {
                    return f32::INFINITY;
                }
                let focal = half_height_px / (fov * 0.5).tan();
                radius / distance * focal
            }
            Projection::Orthographic { height, .. } => radius / (height * 0.5) * half_height_px,
        }
    }
}

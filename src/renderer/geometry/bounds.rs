//! Object bounding shapes

use super::Aabb;
use glam::{Mat3, Quat, Vec3};

/// Bounding sphere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f32,
}

impl Sphere {
    /// Create a new sphere.
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Whether the sphere touches an AABB.
    pub fn intersects_aabb(&self, aabb: &Aabb) -> bool {
        !aabb.is_empty() && aabb.distance_squared(self.center) <= self.radius * self.radius
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::from_center_half_extents(self.center, Vec3::splat(self.radius))
    }
}

/// The bounding volume attached to a scene object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bounds {
    /// World-space axis-aligned box.
    Aabb(Aabb),
    /// World-space sphere.
    Sphere(Sphere),
    /// Oriented box.
    Box {
        center: Vec3,
        half_extents: Vec3,
        rotation: Quat,
    },
}

impl Bounds {
    /// World-space AABB enclosing the shape.
    pub fn aabb(&self) -> Aabb {
        match *self {
            Bounds::Aabb(aabb) => aabb,
            Bounds::Sphere(sphere) => sphere.aabb(),
            Bounds::Box {
                center,
                half_extents,
                rotation,
            } => {
                // Extent of a rotated box along each world axis is |R| * h.
                let m = Mat3::from_quat(rotation);
                let abs = Mat3::from_cols(m.x_axis.abs(), m.y_axis.abs(), m.z_axis.abs());
                Aabb::from_center_half_extents(center, abs * half_extents)
            }
        }
    }

    /// Shape center.
    pub fn center(&self) -> Vec3 {
        match *self {
            Bounds::Aabb(aabb) => aabb.center(),
            Bounds::Sphere(sphere) => sphere.center,
            Bounds::Box { center, .. } => center,
        }
    }
}

impl From<Aabb> for Bounds {
    fn from(aabb: Aabb) -> Self {
        Bounds::Aabb(aabb)
    }
}

impl From<Sphere> for Bounds {
    fn from(sphere: Sphere) -> Self {
        Bounds::Sphere(sphere)
    }
}

//! Bounding-volume math
//!
//! Axis-aligned boxes with an explicit empty value, plus the object
//! bounding shapes that reduce to them.

mod bounds;

pub use bounds::{Bounds, Sphere};

use glam::Vec3;

/// Axis-aligned bounding box.
///
/// A box is either valid (`min <= max` componentwise) or the empty
/// sentinel, recognised by `min.x == +inf`. Accumulators start empty and
/// must be checked with [`Aabb::is_empty`] before use.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// The empty box. Union with it is the identity.
    pub const EMPTY: Self = Self {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    /// Create a new AABB.
    pub fn new(min: Vec3, max: Vec3) -> Self {
        debug_assert!(min.cmple(max).all(), "inverted AABB {min:?} {max:?}");
        Self { min, max }
    }

    /// Create an AABB from a center and half extents.
    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
        Self::new(center - half_extents, center + half_extents)
    }

    /// Create an AABB from a set of points. Returns the empty box for no points.
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        points.into_iter().fold(Self::EMPTY, |acc, p| acc.include(p))
    }

    /// Whether this is the empty sentinel.
    pub fn is_empty(&self) -> bool {
        self.min.x == f32::INFINITY
    }

    /// Get the center of the AABB.
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the size of the AABB.
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Get all 8 corners of the AABB.
    pub fn corners(&self) -> [Vec3; 8] {
        [
            Vec3::new(self.min.x, self.min.y, self.min.z),
            Vec3::new(self.max.x, self.min.y, self.min.z),
            Vec3::new(self.min.x, self.max.y, self.min.z),
            Vec3::new(self.max.x, self.max.y, self.min.z),
            Vec3::new(self.min.x, self.min.y, self.max.z),
            Vec3::new(self.max.x, self.min.y, self.max.z),
            Vec3::new(self.min.x, self.max.y, self.max.z),
            Vec3::new(self.max.x, self.max.y, self.max.z),
        ]
    }

    /// Check if a point is inside the AABB.
    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// Grow the box to include a point.
    pub fn include(&self, point: Vec3) -> Self {
        Self {
            min: self.min.min(point),
            max: self.max.max(point),
        }
    }

    /// Union of two boxes.
    pub fn union(&self, other: &Aabb) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Intersection of two boxes, or the empty box if they are disjoint.
    pub fn intersection(&self, other: &Aabb) -> Self {
        let min = self.min.max(other.min);
        let max = self.max.min(other.max);
        if min.cmple(max).all() {
            Self { min, max }
        } else {
            Self::EMPTY
        }
    }

    /// Whether two boxes overlap (touching counts).
    pub fn intersects(&self, other: &Aabb) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.min.cmple(other.max).all()
            && other.min.cmple(self.max).all()
    }

    /// Squared distance from a point to the box (zero inside).
    pub fn distance_squared(&self, point: Vec3) -> f32 {
        let clamped = point.clamp(self.min, self.max);
        point.distance_squared(clamped)
    }

    /// Radius of the sphere around [`Aabb::center`] enclosing the box.
    pub fn bounding_radius(&self) -> f32 {
        self.size().length() * 0.5
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::EMPTY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_sentinel() {
        let empty = Aabb::default();
        assert!(empty.is_empty());
        assert_eq!(empty.min.x, f32::INFINITY);

        let b = Aabb::new(Vec3::ZERO, Vec3::ONE);
        assert_eq!(empty.union(&b), b);
        assert!(!empty.intersects(&b));
    }

    #[test]
    fn test_intersection_disjoint_is_empty() {
        let a = Aabb::new(Vec3::ZERO, Vec3::ONE);
        let b = Aabb::new(Vec3::splat(2.0), Vec3::splat(3.0));
        assert!(a.intersection(&b).is_empty());

        let c = Aabb::new(Vec3::splat(0.5), Vec3::splat(3.0));
        let i = a.intersection(&c);
        assert_eq!(i.min, Vec3::splat(0.5));
        assert_eq!(i.max, Vec3::ONE);
    }

    #[test]
    fn test_from_points_and_distance() {
        let aabb = Aabb::from_points([Vec3::new(-1.0, 2.0, 0.0), Vec3::new(1.0, -2.0, 3.0)]);
        assert_eq!(aabb.min, Vec3::new(-1.0, -2.0, 0.0));
        assert_eq!(aabb.max, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(aabb.distance_squared(Vec3::ZERO), 0.0);
        assert!((aabb.distance_squared(Vec3::new(3.0, 0.0, 0.0)) - 4.0).abs() < 1e-6);
        assert!(Aabb::from_points([]).is_empty());
    }
}

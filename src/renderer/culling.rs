//! Frustum and convex-hull culling
//!
//! Provides frustum extraction from view-projection matrices, convex hulls
//! built from plane subsets (shadow-caster volumes, cube segments) and
//! intersection tests against axis-aligned bounding boxes.

use super::geometry::Aabb;
use glam::{Mat4, Vec3, Vec4};

/// A plane in 3D space defined by the equation ax + by + cz + d = 0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Normal vector (a, b, c) - not necessarily normalized.
    pub normal: Vec3,
    /// Distance from origin (d).
    pub distance: f32,
}

impl Plane {
    /// Create a new plane from normal and distance.
    pub fn new(normal: Vec3, distance: f32) -> Self {
        Self { normal, distance }
    }

    /// Plane through `point` whose positive side faces `normal`.
    pub fn from_point_normal(point: Vec3, normal: Vec3) -> Self {
        Self {
            normal,
            distance: -normal.dot(point),
        }
    }

    /// Create a plane from a Vec4 (xyz = normal, w = distance).
    pub fn from_vec4(v: Vec4) -> Self {
        Self {
            normal: Vec3::new(v.x, v.y, v.z),
            distance: v.w,
        }
    }

    /// Normalize the plane equation.
    pub fn normalize(&self) -> Self {
        let len = self.normal.length();
        if len > 0.0 {
            Self {
                normal: self.normal / len,
                distance: self.distance / len,
            }
        } else {
            *self
        }
    }

    /// Get the signed distance from a point to the plane.
    /// Positive = in front (same side as normal), Negative = behind.
    pub fn signed_distance(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.distance
    }

    /// Classify an AABB against the half-space on the positive side.
    fn test_aabb(&self, aabb: &Aabb) -> Intersection {
        // Positive vertex: the corner furthest along the normal.
        let p_vertex = Vec3::select(self.normal.cmpge(Vec3::ZERO), aabb.max, aabb.min);
        if self.signed_distance(p_vertex) < 0.0 {
            return Intersection::Outside;
        }
        let n_vertex = Vec3::select(self.normal.cmpge(Vec3::ZERO), aabb.min, aabb.max);
        if self.signed_distance(n_vertex) < 0.0 {
            Intersection::Intersecting
        } else {
            Intersection::Inside
        }
    }
}

/// Result of a volume intersection test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intersection {
    /// Completely outside the volume.
    Outside,
    /// Completely inside the volume.
    Inside,
    /// Partially inside (intersecting a plane).
    Intersecting,
}

/// Convex volume bounded by inward-facing planes.
///
/// The volume may be unbounded; an empty plane list contains everything.
/// The AABB test is conservative: it never reports `Outside` for a box that
/// touches the volume.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConvexHull {
    pub planes: Vec<Plane>,
}

impl ConvexHull {
    pub fn new(planes: Vec<Plane>) -> Self {
        Self { planes }
    }

    /// Test an AABB against every plane.
    pub fn test_aabb(&self, aabb: &Aabb) -> Intersection {
        if aabb.is_empty() {
            return Intersection::Outside;
        }
        let mut result = Intersection::Inside;
        for plane in &self.planes {
            match plane.test_aabb(aabb) {
                Intersection::Outside => return Intersection::Outside,
                Intersection::Intersecting => result = Intersection::Intersecting,
                Intersection::Inside => {}
            }
        }
        result
    }

    /// Test if an AABB is at least partially inside the hull.
    pub fn intersects_aabb(&self, aabb: &Aabb) -> bool {
        self.test_aabb(aabb) != Intersection::Outside
    }

    /// Test if a point is inside the hull.
    pub fn contains_point(&self, point: Vec3) -> bool {
        self.planes.iter().all(|p| p.signed_distance(point) >= 0.0)
    }
}

/// View frustum defined by 6 planes.
///
/// The planes are oriented so that their normals point inward. Clip-space
/// depth is `[0, 1]`, matching glam's `*_rh` projections.
#[derive(Debug, Clone, Copy)]
pub struct Frustum {
    /// Left, Right, Bottom, Top, Near, Far planes.
    pub planes: [Plane; 6],
    /// World-space corners, near face first.
    pub corners: [Vec3; 8],
}

impl Frustum {
    /// Extract frustum planes from a view-projection matrix.
    ///
    /// Uses the Gribb/Hartmann method on the rows of the combined matrix.
    pub fn from_view_projection(vp: Mat4) -> Self {
        let row0 = vp.row(0);
        let row1 = vp.row(1);
        let row2 = vp.row(2);
        let row3 = vp.row(3);

        let planes = [
            // Left
            Plane::from_vec4(row3 + row0).normalize(),
            // Right
            Plane::from_vec4(row3 - row0).normalize(),
            // Bottom
            Plane::from_vec4(row3 + row1).normalize(),
            // Top
            Plane::from_vec4(row3 - row1).normalize(),
            // Near (z >= 0)
            Plane::from_vec4(row2).normalize(),
            // Far
            Plane::from_vec4(row3 - row2).normalize(),
        ];

        let inverse = vp.inverse();
        let mut corners = [Vec3::ZERO; 8];
        let mut i = 0;
        for z in [0.0, 1.0] {
            for y in [-1.0, 1.0] {
                for x in [-1.0, 1.0] {
                    corners[i] = inverse.project_point3(Vec3::new(x, y, z));
                    i += 1;
                }
            }
        }

        Self { planes, corners }
    }

    /// Test if a point is inside the frustum.
    pub fn contains_point(&self, point: Vec3) -> bool {
        self.planes.iter().all(|p| p.signed_distance(point) >= 0.0)
    }

    /// Test if an AABB intersects or is inside the frustum.
    pub fn test_aabb(&self, aabb: &Aabb) -> Intersection {
        if aabb.is_empty() {
            return Intersection::Outside;
        }
        let mut result = Intersection::Inside;
        for plane in &self.planes {
            match plane.test_aabb(aabb) {
                Intersection::Outside => return Intersection::Outside,
                Intersection::Intersecting => result = Intersection::Intersecting,
                Intersection::Inside => {}
            }
        }
        result
    }

    /// Test if an AABB is at least partially inside the frustum.
    pub fn contains_aabb(&self, aabb: &Aabb) -> bool {
        self.test_aabb(aabb) != Intersection::Outside
    }

    /// Test if a sphere is at least partially inside the frustum.
    pub fn contains_sphere(&self, center: Vec3, radius: f32) -> bool {
        self.planes
            .iter()
            .all(|p| p.signed_distance(center) >= -radius)
    }

    /// World-space AABB of the frustum corners.
    pub fn aabb(&self) -> Aabb {
        Aabb::from_points(self.corners)
    }

    /// Volume of points whose shadow, cast along `direction`, can land
    /// inside the frustum.
    ///
    /// Keeps the planes that a point moving along `direction` can only
    /// leave, which is the frustum swept backward toward the light.
    pub fn directional_caster_hull(&self, direction: Vec3) -> ConvexHull {
        ConvexHull::new(
            self.planes
                .iter()
                .filter(|p| p.normal.dot(direction) <= 0.0)
                .copied()
                .collect(),
        )
    }

    /// Volume of points that can shadow the frustum from a point light.
    ///
    /// Keeps the planes whose inside contains the light position; any point
    /// on a segment from the light into the frustum satisfies them.
    pub fn point_caster_hull(&self, light_position: Vec3) -> ConvexHull {
        ConvexHull::new(
            self.planes
                .iter()
                .filter(|p| p.signed_distance(light_position) >= 0.0)
                .copied()
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn ortho_frustum() -> Frustum {
        Frustum::from_view_projection(Mat4::orthographic_rh(-10.0, 10.0, -10.0, 10.0, 0.1, 100.0))
    }

    #[test]
    fn test_plane_signed_distance() {
        // Plane at z=0, normal pointing in +Z direction
        let plane = Plane::new(Vec3::Z, 0.0);

        assert!(plane.signed_distance(Vec3::new(0.0, 0.0, 1.0)) > 0.0);
        assert!(plane.signed_distance(Vec3::new(0.0, 0.0, -1.0)) < 0.0);
        assert!((plane.signed_distance(Vec3::ZERO)).abs() < 0.0001);
    }

    #[test]
    fn test_frustum_contains_point() {
        let frustum = ortho_frustum();

        assert!(frustum.contains_point(Vec3::new(0.0, 0.0, -50.0)));
        // Beyond far plane
        assert!(!frustum.contains_point(Vec3::new(0.0, 0.0, -150.0)));
        // In front of near plane
        assert!(!frustum.contains_point(Vec3::new(0.0, 0.0, 1.0)));
    }

    #[test]
    fn test_aabb_inside_frustum() {
        let frustum = ortho_frustum();

        let aabb = Aabb::new(Vec3::new(-5.0, -5.0, -50.0), Vec3::new(5.0, 5.0, -40.0));
        assert_eq!(frustum.test_aabb(&aabb), Intersection::Inside);

        let aabb_outside = Aabb::new(Vec3::new(20.0, 20.0, -50.0), Vec3::new(30.0, 30.0, -40.0));
        assert!(!frustum.contains_aabb(&aabb_outside));

        let straddling = Aabb::new(Vec3::new(5.0, -1.0, -50.0), Vec3::new(15.0, 1.0, -40.0));
        assert_eq!(frustum.test_aabb(&straddling), Intersection::Intersecting);
    }

    #[test]
    fn test_frustum_corners_aabb() {
        let aabb = ortho_frustum().aabb();
        let eps = 1e-3;
        assert!((aabb.min.x + 10.0).abs() < eps);
        assert!((aabb.max.y - 10.0).abs() < eps);
        assert!((aabb.max.z + 0.1).abs() < eps);
        assert!((aabb.min.z + 100.0).abs() < eps);
    }

    #[test]
    fn test_directional_caster_hull_extends_toward_light() {
        let frustum = ortho_frustum();
        // Light travels straight down; casters above the frustum still count.
        let hull = frustum.directional_caster_hull(Vec3::NEG_Y);
        let above = Aabb::new(Vec3::new(-1.0, 50.0, -50.0), Vec3::new(1.0, 51.0, -49.0));
        let below = Aabb::new(Vec3::new(-1.0, -51.0, -50.0), Vec3::new(1.0, -50.0, -49.0));
        assert!(hull.intersects_aabb(&above));
        assert!(!hull.intersects_aabb(&below));
        assert!(!frustum.contains_aabb(&above));
    }

    #[test]
    fn test_point_caster_hull_keeps_planes_containing_light() {
        let frustum = ortho_frustum();
        let light = Vec3::new(0.0, 40.0, -50.0);
        let hull = frustum.point_caster_hull(light);
        // Only the top plane is dropped.
        assert_eq!(hull.planes.len(), 5);
        assert!(hull.contains_point(Vec3::new(0.0, 30.0, -50.0)));
    }
}

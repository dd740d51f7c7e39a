//! Light-space projection fitting
//!
//! Turns a [`CasterSet`] into the transform(s) a shadow map is rendered
//! with and picks the map's resolution level.

use super::{CasterSet, CubeFace, SegmentMask, ShadowConfig, ShadowTransform};
use crate::renderer::geometry::Aabb;
use crate::renderer::light::{Light, LightKind};
use crate::renderer::viewer::View;
use glam::{Mat4, Vec3};
use std::f32::consts::FRAC_PI_2;

const AXIS_EPSILON: f32 = 1e-6;

/// A fitted shadow projection.
#[derive(Debug, Clone, PartialEq)]
pub struct ShadowProjection {
    /// Index into [`ShadowConfig::resolutions`].
    pub level: usize,
    pub resolution: u32,
    pub transform: ShadowTransform,
    /// Cube faces to render; empty for single maps.
    pub faces: SegmentMask,
    /// Near plane distance.
    pub segment_depth: f32,
    /// Far plane distance.
    pub far: f32,
    /// Receiver region the projection was fitted to.
    pub fitted_bounds: Aabb,
}

/// Fits shadow projections to caster sets.
#[derive(Debug, Clone)]
pub struct ShadowProjector<'a> {
    config: &'a ShadowConfig,
}

impl<'a> ShadowProjector<'a> {
    pub fn new(config: &'a ShadowConfig) -> Self {
        Self { config }
    }

    /// Fit a projection for `light`.
    ///
    /// Returns `None` when no receiver can actually be shadowed, which the
    /// caller treats like a light without casters.
    pub fn project(&self, light: &Light, set: &CasterSet, view: &View) -> Option<ShadowProjection> {
        let projection = match light.kind {
            LightKind::Directional { direction } => self.project_directional(direction, set, view),
            LightKind::Point { position } => self.project_point(light, position, set, view),
            LightKind::Spot {
                position,
                axis,
                half_angle,
            } => self.project_spot(light, position, axis, half_angle, set, view),
            LightKind::Beam {
                position,
                axis,
                radius,
            } => self.project_beam(light, position, axis, radius, set, view),
        };
        match &projection {
            Some(p) => tracing::trace!(
                light = light.id.0,
                level = p.level,
                faces = ?p.faces,
                "fitted shadow projection"
            ),
            None => tracing::trace!(light = light.id.0, "nothing to shadow after fitting"),
        }
        projection
    }

    /// Resolution level for a local light from its on-screen size.
    ///
    /// A viewer inside the light volume always gets the top level.
    pub fn local_level(&self, light: &Light, view: &View) -> usize {
        let volume = light.volume();
        if volume.contains_point(view.position) {
            return self.config.max_level();
        }
        let Some(bounds) = volume.aabb() else {
            return self.config.max_level();
        };
        let radius_px = view.projected_radius_px(bounds.center(), bounds.bounding_radius());
        let scale = view.viewport.height as f32 / self.config.reference_height.max(1) as f32;
        let level = self
            .config
            .platform
            .size_thresholds()
            .iter()
            .filter(|&&t| radius_px >= t * scale)
            .count();
        level.min(self.config.max_level())
    }

    fn project_directional(&self, direction: Vec3, set: &CasterSet, view: &View) -> Option<ShadowProjection> {
        let fitted = fit_directional_box(direction, set, view)?;

        let up = perpendicular_up(direction);
        let center = fitted.center();
        let casters = set.caster_bounds.corners();
        let receivers = fitted.corners();
        let pull_back = receivers
            .iter()
            .chain(casters.iter())
            .map(|p| (center - *p).dot(direction))
            .fold(0.0f32, f32::max);
        let eye = center - direction * pull_back;
        let light_view = Mat4::look_to_rh(eye, direction, up);

        let depth = |p: &Vec3| -light_view.transform_point3(*p).z;
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        for p in receivers.iter() {
            let v = light_view.transform_point3(*p);
            min = min.min(v);
            max = max.max(v);
        }
        let far = receivers.iter().map(depth).fold(0.0f32, f32::max);
        let near = receivers
            .iter()
            .chain(casters.iter())
            .map(depth)
            .fold(f32::INFINITY, f32::min)
            .max(0.0);
        let far = far.max(near + AXIS_EPSILON);
        let projection = Mat4::orthographic_rh(min.x, max.x, min.y, max.y, near, far);

        let level = self.config.max_level();
        Some(ShadowProjection {
            level,
            resolution: self.config.resolution(level),
            transform: ShadowTransform::Single(projection * light_view),
            faces: SegmentMask::empty(),
            segment_depth: near,
            far,
            fitted_bounds: fitted,
        })
    }

    fn project_point(&self, light: &Light, position: Vec3, set: &CasterSet, view: &View) -> Option<ShadowProjection> {
        if set.receiver_bounds.is_empty() {
            return None;
        }
        let near = set.segment_depth;
        let far = light.attenuation.far.max(near + AXIS_EPSILON);
        let projection = Mat4::perspective_rh(FRAC_PI_2, 1.0, near, far);

        let mut transforms = [None; 6];
        let mut faces = SegmentMask::empty();
        for face in set.segments.faces() {
            let in_range = |aabb: &Aabb| {
                let (lo, hi) = face.depth_range(position, aabb);
                hi >= near && lo <= far
            };
            if !in_range(&set.receiver_bounds) || !in_range(&set.caster_bounds) {
                continue;
            }
            let face_view = Mat4::look_to_rh(position, face.direction(), face.up());
            transforms[face.index()] = Some(projection * face_view);
            faces |= face.mask();
        }
        if faces.is_empty() {
            return None;
        }

        let level = self.local_level(light, view);
        Some(ShadowProjection {
            level,
            resolution: self.config.resolution(level),
            transform: ShadowTransform::Cube(transforms),
            faces,
            segment_depth: near,
            far,
            fitted_bounds: set.receiver_bounds,
        })
    }

    fn project_spot(
        &self,
        light: &Light,
        position: Vec3,
        axis: Vec3,
        half_angle: f32,
        set: &CasterSet,
        view: &View,
    ) -> Option<ShadowProjection> {
        if set.receiver_bounds.is_empty() {
            return None;
        }
        let half_angle = half_angle.clamp(AXIS_EPSILON, FRAC_PI_2 - 0.01);
        // Casters inside the cone are at least this far along the axis.
        let near = (set.nearest_caster * half_angle.cos()).max(self.config.min_segment_depth);
        let far = light.attenuation.far.max(near + AXIS_EPSILON);
        let light_view = Mat4::look_to_rh(position, axis, perpendicular_up(axis));
        let projection = Mat4::perspective_rh(2.0 * half_angle, 1.0, near, far);

        let level = self.local_level(light, view);
        Some(ShadowProjection {
            level,
            resolution: self.config.resolution(level),
            transform: ShadowTransform::Single(projection * light_view),
            faces: SegmentMask::empty(),
            segment_depth: near,
            far,
            fitted_bounds: set.receiver_bounds,
        })
    }

    fn project_beam(
        &self,
        light: &Light,
        position: Vec3,
        axis: Vec3,
        radius: f32,
        set: &CasterSet,
        view: &View,
    ) -> Option<ShadowProjection> {
        if set.receiver_bounds.is_empty() {
            return None;
        }
        let light_view = Mat4::look_to_rh(position, axis, perpendicular_up(axis));

        // Off-axis fit of the receivers across the beam, inside its radius.
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        for p in set.receiver_bounds.corners() {
            let v = light_view.transform_point3(p);
            min = min.min(v);
            max = max.max(v);
        }
        let left = min.x.max(-radius);
        let right = max.x.min(radius);
        let bottom = min.y.max(-radius);
        let top = max.y.min(radius);
        if left >= right || bottom >= top {
            return None;
        }

        let near = set
            .caster_bounds
            .corners()
            .iter()
            .map(|p| (*p - position).dot(axis))
            .fold(f32::INFINITY, f32::min)
            .max(0.0);
        let far = light.attenuation.far.max(near + AXIS_EPSILON);
        let projection = Mat4::orthographic_rh(left, right, bottom, top, near, far);

        let level = self.local_level(light, view);
        Some(ShadowProjection {
            level,
            resolution: self.config.resolution(level),
            transform: ShadowTransform::Single(projection * light_view),
            faces: SegmentMask::empty(),
            segment_depth: near,
            far,
            fitted_bounds: set.receiver_bounds,
        })
    }
}

/// Receiver region that a directional light's casters can darken.
///
/// Starts from the receivers inside the view frustum's bounds and clips
/// each axis by the casters' sweep along `direction`: receivers on the
/// near side of every caster cannot be in shadow.
pub fn fit_directional_box(direction: Vec3, set: &CasterSet, view: &View) -> Option<Aabb> {
    let mut fitted = set.receiver_bounds.intersection(&view.frustum_aabb());
    if fitted.is_empty() || set.caster_bounds.is_empty() {
        return None;
    }
    let casters = set.caster_bounds;
    for axis in 0..3 {
        let d = direction[axis];
        if d > AXIS_EPSILON {
            fitted.min[axis] = fitted.min[axis].max(casters.min[axis]);
        } else if d < -AXIS_EPSILON {
            fitted.max[axis] = fitted.max[axis].min(casters.max[axis]);
        } else {
            fitted.min[axis] = fitted.min[axis].max(casters.min[axis]);
            fitted.max[axis] = fitted.max[axis].min(casters.max[axis]);
        }
        if fitted.min[axis] > fitted.max[axis] {
            return None;
        }
    }
    Some(fitted)
}

/// Up vector for looking along `direction`, built from the world axis
/// least aligned with it.
fn perpendicular_up(direction: Vec3) -> Vec3 {
    let a = direction.abs();
    let hint = if a.x <= a.y && a.x <= a.z {
        Vec3::X
    } else if a.y <= a.z {
        Vec3::Y
    } else {
        Vec3::Z
    };
    (hint - direction * direction.dot(hint)).normalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::light::{Attenuation, LightId};
    use crate::renderer::shadow::CasterEntry;
    use crate::renderer::object::ObjectId;
    use crate::renderer::viewer::{Projection, Viewport};

    fn view() -> View {
        View::look_at(
            Vec3::new(0.0, 10.0, 20.0),
            Vec3::ZERO,
            Vec3::Y,
            Projection::perspective(60.0, 0.1, 200.0),
            Viewport::new(1280, 720),
        )
    }

    fn caster_set(casters: Aabb, receivers: Aabb) -> CasterSet {
        CasterSet {
            casters: vec![CasterEntry {
                object: ObjectId(1),
                segments: SegmentMask::empty(),
            }],
            caster_bounds: casters,
            receiver_bounds: receivers,
            segments: SegmentMask::empty(),
            segment_depth: 0.05,
            nearest_caster: 0.05,
        }
    }

    fn assert_in_clip(m: Mat4, p: Vec3) {
        let eps = 1e-4;
        let c = m.project_point3(p);
        assert!(c.x.abs() <= 1.0 + eps && c.y.abs() <= 1.0 + eps, "{p} -> {c}");
        assert!(c.z >= -eps && c.z <= 1.0 + eps, "{p} -> {c}");
    }

    #[test]
    fn test_fit_clips_to_caster_sweep() {
        let casters = Aabb::new(Vec3::new(-1.0, 0.0, -1.0), Vec3::new(1.0, 2.0, 1.0));
        let floor = Aabb::new(Vec3::new(-10.0, -0.1, -10.0), Vec3::new(10.0, 2.0, 10.0));
        let set = caster_set(casters, floor);
        let fitted = fit_directional_box(Vec3::NEG_Y, &set, &view()).unwrap();
        assert_eq!(fitted.min.x, -1.0);
        assert_eq!(fitted.max.z, 1.0);
        assert_eq!(fitted.min.y, -0.1);
        assert_eq!(fitted.max.y, 2.0);
    }

    #[test]
    fn test_fit_empty_when_light_points_away() {
        let casters = Aabb::new(Vec3::new(-1.0, 5.0, -1.0), Vec3::new(1.0, 6.0, 1.0));
        let floor = Aabb::new(Vec3::new(-10.0, -0.1, -10.0), Vec3::new(10.0, 0.0, 10.0));
        let set = caster_set(casters, floor);
        // Light travels upward: the floor lies before the casters.
        assert!(fit_directional_box(Vec3::Y, &set, &view()).is_none());
    }

    #[test]
    fn test_directional_projection_contains_fitted_box() {
        let casters = Aabb::new(Vec3::new(-1.0, 0.0, -1.0), Vec3::new(1.0, 2.0, 1.0));
        let floor = Aabb::new(Vec3::new(-10.0, -0.1, -10.0), Vec3::new(10.0, 0.0, 10.0));
        let set = caster_set(casters, floor.union(&casters));
        let config = ShadowConfig::default();
        let direction = Vec3::new(0.3, -1.0, 0.2).normalize();
        let projection = ShadowProjector::new(&config)
            .project(&Light::directional(LightId(0), direction), &set, &view())
            .unwrap();
        let ShadowTransform::Single(m) = projection.transform else {
            panic!("directional lights use a single map");
        };
        for p in projection.fitted_bounds.corners() {
            assert_in_clip(m, p);
        }
        assert_eq!(projection.level, config.max_level());
        assert_eq!(projection.resolution, 2048);
    }

    #[test]
    fn test_point_faces_follow_segments() {
        let light = Light::point(LightId(0), Vec3::new(0.0, 5.0, 0.0), Attenuation::linear(1.0, 20.0));
        let casters = Aabb::from_center_half_extents(Vec3::new(0.0, 2.0, 0.0), Vec3::splat(0.5));
        let floor = Aabb::new(Vec3::new(-10.0, -1.0, -10.0), Vec3::new(10.0, 0.0, 10.0));
        let mut set = caster_set(casters, floor);
        set.segments = SegmentMask::NEG_Y;
        set.segment_depth = 2.5;

        let config = ShadowConfig::default();
        let projection = ShadowProjector::new(&config).project(&light, &set, &view()).unwrap();
        assert_eq!(projection.faces, SegmentMask::NEG_Y);
        let ShadowTransform::Cube(faces) = projection.transform else {
            panic!("point lights use cube maps");
        };
        assert!(faces[CubeFace::PosY.index()].is_none());
        let m = faces[CubeFace::NegY.index()].unwrap();
        assert_in_clip(m, Vec3::new(0.0, 2.5, 0.0));
        assert_in_clip(m, Vec3::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn test_viewer_inside_light_gets_top_level() {
        let config = ShadowConfig::default();
        let projector = ShadowProjector::new(&config);
        let near = Light::point(LightId(0), Vec3::new(0.0, 10.0, 18.0), Attenuation::linear(1.0, 5.0));
        assert_eq!(projector.local_level(&near, &view()), config.max_level());

        let far = Light::point(LightId(1), Vec3::new(0.0, 0.0, -150.0), Attenuation::linear(0.5, 1.0));
        assert_eq!(projector.local_level(&far, &view()), 0);
    }

    #[test]
    fn test_spot_projection_contains_cone_axis() {
        let light = Light::spot(
            LightId(0),
            Vec3::new(0.0, 8.0, 0.0),
            Vec3::NEG_Y,
            0.5,
            Attenuation::linear(1.0, 20.0),
        );
        let casters = Aabb::from_center_half_extents(Vec3::new(0.0, 3.0, 0.0), Vec3::splat(0.5));
        let floor = Aabb::new(Vec3::new(-4.0, -1.0, -4.0), Vec3::new(4.0, 0.0, 4.0));
        let mut set = caster_set(casters, floor);
        set.nearest_caster = 4.5;

        let config = ShadowConfig::default();
        let projection = ShadowProjector::new(&config).project(&light, &set, &view()).unwrap();
        let ShadowTransform::Single(m) = projection.transform else {
            panic!("spot lights use a single map");
        };
        assert_in_clip(m, Vec3::new(0.0, 3.5, 0.0));
        assert_in_clip(m, Vec3::new(0.0, 0.0, 0.0));
    }
}

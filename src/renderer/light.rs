//! Light types
//!
//! Lights, their bounding volumes and the light-type slots used to key
//! cached shader choices.

use super::culling::{ConvexHull, Plane};
use super::geometry::{Aabb, Sphere};
use glam::Vec3;

/// Index of a light in the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LightId(pub u32);

/// Light geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightKind {
    /// Infinitely distant light. `direction` is the direction light travels.
    Directional { direction: Vec3 },
    /// Omni-directional light.
    Point { position: Vec3 },
    /// Cone of light; `half_angle` in radians.
    Spot {
        position: Vec3,
        axis: Vec3,
        half_angle: f32,
    },
    /// Cylinder of parallel light starting at `position`.
    Beam {
        position: Vec3,
        axis: Vec3,
        radius: f32,
    },
}

/// Distance attenuation for local lights.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attenuation {
    /// Distance where falloff starts.
    pub near: f32,
    /// Reach of the light; nothing beyond it is lit.
    pub far: f32,
    /// Whether intensity falls off linearly between `near` and `far`.
    pub linear: bool,
}

impl Attenuation {
    /// Create a new attenuation.
    pub fn new(near: f32, far: f32, linear: bool) -> Self {
        Self { near, far, linear }
    }

    /// Constant intensity up to `far`.
    pub fn constant(far: f32) -> Self {
        Self::new(0.0, far, false)
    }

    /// Linear falloff from `near` to `far`.
    pub fn linear(near: f32, far: f32) -> Self {
        Self::new(near, far, true)
    }

    /// Convert to array (near, far, 1/(far-near), linear flag).
    pub fn to_array(&self) -> [f32; 4] {
        let span = (self.far - self.near).max(f32::EPSILON);
        [self.near, self.far, 1.0 / span, if self.linear { 1.0 } else { 0.0 }]
    }
}

impl Default for Attenuation {
    fn default() -> Self {
        Self::linear(1.0, 50.0)
    }
}

/// Region a light can illuminate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightVolume {
    /// Directional lights reach everything.
    Unbounded,
    Sphere(Sphere),
    Cylinder {
        base: Vec3,
        axis: Vec3,
        length: f32,
        radius: f32,
    },
    SphericalSector {
        apex: Vec3,
        axis: Vec3,
        half_angle: f32,
        radius: f32,
    },
}

impl LightVolume {
    /// Conservative test of an AABB against the volume.
    pub fn intersects_aabb(&self, aabb: &Aabb) -> bool {
        if aabb.is_empty() {
            return false;
        }
        match *self {
            LightVolume::Unbounded => true,
            LightVolume::Sphere(sphere) => sphere.intersects_aabb(aabb),
            LightVolume::Cylinder {
                base,
                axis,
                length,
                radius,
            } => cylinder_hull(base, axis, length, radius).intersects_aabb(aabb),
            LightVolume::SphericalSector {
                apex,
                axis,
                half_angle,
                radius,
            } => {
                if !Sphere::new(apex, radius).intersects_aabb(aabb) {
                    return false;
                }
                // Bounding sphere of the box against the cone.
                let center = aabb.center();
                let r = aabb.bounding_radius();
                let v = center - apex;
                let along = v.dot(axis);
                let perp = (v.length_squared() - along * along).max(0.0).sqrt();
                let (sin, cos) = half_angle.sin_cos();
                perp * cos - along * sin <= r
            }
        }
    }

    /// World-space AABB of the volume, or `None` if unbounded.
    pub fn aabb(&self) -> Option<Aabb> {
        match *self {
            LightVolume::Unbounded => None,
            LightVolume::Sphere(sphere) => Some(sphere.aabb()),
            LightVolume::Cylinder {
                base,
                axis,
                length,
                radius,
            } => {
                let end = base + axis * length;
                // Disc extent along each world axis is r * sqrt(1 - a_i^2).
                let e = (Vec3::ONE - axis * axis).max(Vec3::ZERO);
                let e = Vec3::new(e.x.sqrt(), e.y.sqrt(), e.z.sqrt()) * radius;
                Some(Aabb::new(base.min(end) - e, base.max(end) + e))
            }
            LightVolume::SphericalSector { apex, radius, .. } => {
                Some(Sphere::new(apex, radius).aabb())
            }
        }
    }

    /// Whether a point lies inside the volume.
    pub fn contains_point(&self, point: Vec3) -> bool {
        match *self {
            LightVolume::Unbounded => true,
            LightVolume::Sphere(sphere) => {
                point.distance_squared(sphere.center) <= sphere.radius * sphere.radius
            }
            LightVolume::Cylinder {
                base,
                axis,
                length,
                radius,
            } => {
                let v = point - base;
                let along = v.dot(axis);
                along >= 0.0 && along <= length && (v - axis * along).length() <= radius
            }
            LightVolume::SphericalSector {
                apex,
                axis,
                half_angle,
                radius,
            } => {
                let v = point - apex;
                let len = v.length();
                len <= radius && (len == 0.0 || v.dot(axis) >= len * half_angle.cos())
            }
        }
    }
}

/// Square prism enclosing a cylinder, as six inward planes.
fn cylinder_hull(base: Vec3, axis: Vec3, length: f32, radius: f32) -> ConvexHull {
    let (t1, t2) = axis.any_orthonormal_pair();
    let end = base + axis * length;
    ConvexHull::new(vec![
        Plane::from_point_normal(base, axis),
        Plane::from_point_normal(end, -axis),
        Plane::from_point_normal(base - t1 * radius, t1),
        Plane::from_point_normal(base + t1 * radius, -t1),
        Plane::from_point_normal(base - t2 * radius, t2),
        Plane::from_point_normal(base + t2 * radius, -t2),
    ])
}

/// Per-light-type key for cached shader choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LightSlot {
    Directional,
    Point,
    PointAttenuated,
    Spot,
    SpotAttenuated,
    Beam,
    BeamAttenuated,
}

impl LightSlot {
    pub const COUNT: usize = 7;

    pub const ALL: [LightSlot; Self::COUNT] = [
        LightSlot::Directional,
        LightSlot::Point,
        LightSlot::PointAttenuated,
        LightSlot::Spot,
        LightSlot::SpotAttenuated,
        LightSlot::Beam,
        LightSlot::BeamAttenuated,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn is_directional(self) -> bool {
        self == LightSlot::Directional
    }

    pub fn is_attenuated(self) -> bool {
        matches!(
            self,
            LightSlot::PointAttenuated | LightSlot::SpotAttenuated | LightSlot::BeamAttenuated
        )
    }
}

/// A scene light.
#[derive(Debug, Clone)]
pub struct Light {
    pub id: LightId,
    pub kind: LightKind,
    /// Light color (RGB).
    pub color: [f32; 3],
    /// Light intensity.
    pub intensity: f32,
    /// Ignored for directional lights.
    pub attenuation: Attenuation,
    /// Whether this light is allowed to produce shadows at all.
    pub casts_shadows: bool,
    /// Recomputed every frame by the frame driver.
    pub shadow_map_required: bool,
}

impl Light {
    /// Create a new light. Directions and axes are normalized.
    pub fn new(id: LightId, kind: LightKind) -> Self {
        let kind = match kind {
            LightKind::Directional { direction } => LightKind::Directional {
                direction: direction.normalize(),
            },
            LightKind::Spot {
                position,
                axis,
                half_angle,
            } => LightKind::Spot {
                position,
                axis: axis.normalize(),
                half_angle,
            },
            LightKind::Beam {
                position,
                axis,
                radius,
            } => LightKind::Beam {
                position,
                axis: axis.normalize(),
                radius,
            },
            point @ LightKind::Point { .. } => point,
        };
        Self {
            id,
            kind,
            color: [1.0, 1.0, 1.0],
            intensity: 1.0,
            attenuation: Attenuation::default(),
            casts_shadows: true,
            shadow_map_required: false,
        }
    }

    /// Create a white directional light.
    pub fn directional(id: LightId, direction: Vec3) -> Self {
        Self::new(id, LightKind::Directional { direction })
    }

    /// Create a white point light.
    pub fn point(id: LightId, position: Vec3, attenuation: Attenuation) -> Self {
        Self::new(id, LightKind::Point { position }).with_attenuation(attenuation)
    }

    /// Create a white spot light.
    pub fn spot(
        id: LightId,
        position: Vec3,
        axis: Vec3,
        half_angle: f32,
        attenuation: Attenuation,
    ) -> Self {
        Self::new(
            id,
            LightKind::Spot {
                position,
                axis,
                half_angle,
            },
        )
        .with_attenuation(attenuation)
    }

    /// Create a white beam light.
    pub fn beam(id: LightId, position: Vec3, axis: Vec3, radius: f32, attenuation: Attenuation) -> Self {
        Self::new(
            id,
            LightKind::Beam {
                position,
                axis,
                radius,
            },
        )
        .with_attenuation(attenuation)
    }

    pub fn with_attenuation(mut self, attenuation: Attenuation) -> Self {
        self.attenuation = attenuation;
        self
    }

    pub fn with_color(mut self, color: [f32; 3], intensity: f32) -> Self {
        self.color = color;
        self.intensity = intensity;
        self
    }

    pub fn with_shadows(mut self, casts_shadows: bool) -> Self {
        self.casts_shadows = casts_shadows;
        self
    }

    pub fn is_directional(&self) -> bool {
        matches!(self.kind, LightKind::Directional { .. })
    }

    /// Position of a local light, `None` for directional lights.
    pub fn position(&self) -> Option<Vec3> {
        match self.kind {
            LightKind::Directional { .. } => None,
            LightKind::Point { position }
            | LightKind::Spot { position, .. }
            | LightKind::Beam { position, .. } => Some(position),
        }
    }

    /// Travel direction for directional lights, axis for spot and beam lights.
    pub fn direction(&self) -> Option<Vec3> {
        match self.kind {
            LightKind::Directional { direction } => Some(direction),
            LightKind::Spot { axis, .. } | LightKind::Beam { axis, .. } => Some(axis),
            LightKind::Point { .. } => None,
        }
    }

    /// The region this light can reach.
    pub fn volume(&self) -> LightVolume {
        let far = self.attenuation.far;
        match self.kind {
            LightKind::Directional { .. } => LightVolume::Unbounded,
            LightKind::Point { position } => LightVolume::Sphere(Sphere::new(position, far)),
            LightKind::Spot {
                position,
                axis,
                half_angle,
            } => LightVolume::SphericalSector {
                apex: position,
                axis,
                half_angle,
                radius: far,
            },
            LightKind::Beam {
                position,
                axis,
                radius,
            } => LightVolume::Cylinder {
                base: position,
                axis,
                length: far,
                radius,
            },
        }
    }

    /// Cache slot for this light. Attenuated slots are only used when the
    /// light has a linear range and attenuation is enabled globally.
    pub fn slot(&self, attenuation_enabled: bool) -> LightSlot {
        let attenuated = attenuation_enabled && self.attenuation.linear;
        match (self.kind, attenuated) {
            (LightKind::Directional { .. }, _) => LightSlot::Directional,
            (LightKind::Point { .. }, false) => LightSlot::Point,
            (LightKind::Point { .. }, true) => LightSlot::PointAttenuated,
            (LightKind::Spot { .. }, false) => LightSlot::Spot,
            (LightKind::Spot { .. }, true) => LightSlot::SpotAttenuated,
            (LightKind::Beam { .. }, false) => LightSlot::Beam,
            (LightKind::Beam { .. }, true) => LightSlot::BeamAttenuated,
        }
    }

    /// Packed uniform block for UBO-based sinks.
    pub fn uniforms(&self) -> LightUniforms {
        let (direction_or_position, axis) = match self.kind {
            LightKind::Directional { direction } => {
                ([direction.x, direction.y, direction.z, 0.0], [0.0; 4])
            }
            LightKind::Point { position } => ([position.x, position.y, position.z, 1.0], [0.0; 4]),
            LightKind::Spot {
                position,
                axis,
                half_angle,
            } => (
                [position.x, position.y, position.z, 1.0],
                [axis.x, axis.y, axis.z, half_angle.cos()],
            ),
            LightKind::Beam {
                position,
                axis,
                radius,
            } => (
                [position.x, position.y, position.z, 1.0],
                [axis.x, axis.y, axis.z, radius],
            ),
        };
        LightUniforms {
            direction_or_position,
            color_intensity: [self.color[0], self.color[1], self.color[2], self.intensity],
            attenuation: self.attenuation.to_array(),
            axis,
        }
    }
}

/// Light uniform data for GPU.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniforms {
    /// Light direction or position (w = 0 for directional, 1 for local).
    pub direction_or_position: [f32; 4],
    /// Light color and intensity (rgb = color, a = intensity).
    pub color_intensity: [f32; 4],
    /// Near, far, inverse span, linear flag.
    pub attenuation: [f32; 4],
    /// Spot/beam axis; w = cos(half angle) for spots, radius for beams.
    pub axis: [f32; 4],
}

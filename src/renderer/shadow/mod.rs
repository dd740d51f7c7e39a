//! Shadow mapping module
//!
//! Per light and per frame: find shadow casters and receivers, fit a
//! light-space projection around them and render the casters into depth
//! targets.
//!
//! ```text
//! Scene + View + Light
//!   -> ShadowFinder     caster list, caster/receiver AABBs, cube segments
//!   -> ShadowProjector  light-space transform(s), resolution level
//!   -> ShadowMapRenderer depth-only draws into the allocated target(s)
//! ```

mod finder;
mod projector;
mod renderer;

pub use finder::{CasterEntry, CasterSet, FinderOutcome, ShadowFinder};
pub use projector::{ShadowProjection, ShadowProjector};
pub use renderer::{
    BackendCommand, DepthDraw, DepthPassBackend, DepthVariant, RecordingBackend,
    ShadowMapRenderer, ShadowRenderReport,
};

use super::culling::{ConvexHull, Plane};
use super::light::LightId;
use crate::error::Result;
use glam::{Mat4, Vec3};

/// Platform class, selecting the screen-size threshold ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Platform {
    #[default]
    Desktop,
    Mobile,
}

impl Platform {
    /// Projected light radius (pixels at the reference height) needed to
    /// step up each resolution level.
    pub fn size_thresholds(self) -> [f32; 3] {
        match self {
            Platform::Desktop => [48.0, 128.0, 320.0],
            Platform::Mobile => [96.0, 256.0, 640.0],
        }
    }
}

/// When casters with open geometry get the biased depth variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NonClosedBiasPolicy {
    /// Never bias; open geometry is drawn like closed geometry.
    Never,
    /// Bias unless the open side is hidden from both the light and the view.
    #[default]
    OpenSideVisible,
    /// Bias every non-closed caster.
    Always,
}

/// Shadow map configuration.
#[derive(Debug, Clone)]
pub struct ShadowConfig {
    /// Shadow map sizes per resolution level, smallest first.
    pub resolutions: [u32; 4],
    pub platform: Platform,
    /// Window height the platform thresholds are tuned for.
    pub reference_height: u32,
    /// Lower clamp of the caster depth used as near plane.
    pub min_segment_depth: f32,
    /// Constant depth bias used by the lighting shaders.
    pub depth_bias: f32,
    /// Slope-scaled depth bias for open geometry.
    pub non_closed_bias: f32,
    /// Cutout discard threshold for transparent textures.
    pub alpha_threshold: f32,
    pub non_closed_policy: NonClosedBiasPolicy,
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            resolutions: [256, 512, 1024, 2048],
            platform: Platform::Desktop,
            reference_height: 1080,
            min_segment_depth: 0.05,
            depth_bias: 0.005,
            non_closed_bias: 2.0,
            alpha_threshold: 0.5,
            non_closed_policy: NonClosedBiasPolicy::OpenSideVisible,
        }
    }
}

impl ShadowConfig {
    /// Highest resolution level.
    pub fn max_level(&self) -> usize {
        self.resolutions.len() - 1
    }

    /// Size of a resolution level, clamped to the ladder.
    pub fn resolution(&self, level: usize) -> u32 {
        self.resolutions[level.min(self.max_level())]
    }
}

/// One face of a cube shadow map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CubeFace {
    PosX,
    NegX,
    PosY,
    NegY,
    PosZ,
    NegZ,
}

impl CubeFace {
    /// Face order: +X, -X, +Y, -Y, +Z, -Z (indices 0-5).
    pub const ALL: [CubeFace; 6] = [
        CubeFace::PosX,
        CubeFace::NegX,
        CubeFace::PosY,
        CubeFace::NegY,
        CubeFace::PosZ,
        CubeFace::NegZ,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn mask(self) -> SegmentMask {
        SegmentMask::from_bits_truncate(1 << self as u8)
    }

    /// Direction the face looks along.
    pub fn direction(self) -> Vec3 {
        match self {
            CubeFace::PosX => Vec3::X,
            CubeFace::NegX => Vec3::NEG_X,
            CubeFace::PosY => Vec3::Y,
            CubeFace::NegY => Vec3::NEG_Y,
            CubeFace::PosZ => Vec3::Z,
            CubeFace::NegZ => Vec3::NEG_Z,
        }
    }

    /// Up vector of the face, following the usual cube-map convention.
    pub fn up(self) -> Vec3 {
        match self {
            CubeFace::PosX | CubeFace::NegX | CubeFace::PosZ | CubeFace::NegZ => Vec3::NEG_Y,
            CubeFace::PosY => Vec3::Z,
            CubeFace::NegY => Vec3::NEG_Z,
        }
    }

    /// The pyramid of space this face covers around `center`: points whose
    /// coordinate along the face direction dominates the other two.
    pub fn segment_hull(self, center: Vec3) -> ConvexHull {
        let a = self.direction();
        let (b, c) = match self {
            CubeFace::PosX | CubeFace::NegX => (Vec3::Y, Vec3::Z),
            CubeFace::PosY | CubeFace::NegY => (Vec3::X, Vec3::Z),
            CubeFace::PosZ | CubeFace::NegZ => (Vec3::X, Vec3::Y),
        };
        ConvexHull::new(
            [a - b, a + b, a - c, a + c]
                .into_iter()
                .map(|n| Plane::from_point_normal(center, n.normalize()))
                .collect(),
        )
    }

    /// Signed depth range of a box along this face's direction, relative
    /// to `center`.
    pub fn depth_range(self, center: Vec3, aabb: &super::geometry::Aabb) -> (f32, f32) {
        let axis = self.direction();
        let a = (aabb.min - center).dot(axis);
        let b = (aabb.max - center).dot(axis);
        (a.min(b), a.max(b))
    }
}

bitflags::bitflags! {
    /// Set of cube-map segments, one bit per [`CubeFace`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SegmentMask: u8 {
        const POS_X = 1 << 0;
        const NEG_X = 1 << 1;
        const POS_Y = 1 << 2;
        const NEG_Y = 1 << 3;
        const POS_Z = 1 << 4;
        const NEG_Z = 1 << 5;
    }
}

impl SegmentMask {
    /// Faces in the set, in face order.
    pub fn faces(self) -> impl Iterator<Item = CubeFace> {
        CubeFace::ALL.into_iter().filter(move |f| self.contains(f.mask()))
    }
}

/// Handle of a depth render target owned by a [`ShadowTargetPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetHandle(pub u32);

/// Depth target(s) of one light's shadow map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShadowTargets {
    Single(TargetHandle),
    /// One target per cube face, in face order.
    Cube([TargetHandle; 6]),
}

/// Light-space transform(s) of one shadow map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShadowTransform {
    Single(Mat4),
    /// Per face; `None` for faces skipped this frame.
    Cube([Option<Mat4>; 6]),
}

/// Allocator of depth targets, reset every frame.
pub trait ShadowTargetPool {
    /// A square 2D depth target.
    fn single(&mut self, level: usize, resolution: u32) -> Result<TargetHandle>;

    /// Six square depth targets forming a cube.
    fn cube(&mut self, level: usize, resolution: u32) -> Result<[TargetHandle; 6]>;

    /// Make every target available again.
    fn reset(&mut self);
}

/// Pool that only hands out handles, for backends that own their storage.
#[derive(Debug, Default)]
pub struct HandlePool {
    next: u32,
}

impl ShadowTargetPool for HandlePool {
    fn single(&mut self, _level: usize, _resolution: u32) -> Result<TargetHandle> {
        let handle = TargetHandle(self.next);
        self.next += 1;
        Ok(handle)
    }

    fn cube(&mut self, _level: usize, _resolution: u32) -> Result<[TargetHandle; 6]> {
        let base = self.next;
        self.next += 6;
        Ok(std::array::from_fn(|i| TargetHandle(base + i as u32)))
    }

    fn reset(&mut self) {
        self.next = 0;
    }
}

/// A light's shadow map for the current frame.
#[derive(Debug, Clone)]
pub struct ShadowMapTarget {
    pub light: LightId,
    /// Index into [`ShadowConfig::resolutions`].
    pub level: usize,
    pub resolution: u32,
    pub transform: ShadowTransform,
    pub targets: ShadowTargets,
    /// Cube faces actually rendered; empty for single maps.
    pub faces: SegmentMask,
    /// Near plane distance used for the projection.
    pub segment_depth: f32,
    /// Far plane distance used for the projection.
    pub far: f32,
    pub depth_bias: f32,
}

impl ShadowMapTarget {
    /// Clip space to `[0, 1]` texture space, with y pointing down.
    pub const CLIP_TO_TEXTURE: Mat4 = Mat4::from_cols_array(&[
        0.5, 0.0, 0.0, 0.0, //
        0.0, -0.5, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0, //
        0.5, 0.5, 0.0, 1.0,
    ]);

    /// World to shadow-texture transform for a single map or a cube face.
    pub fn texture_matrix(&self, face: Option<CubeFace>) -> Option<Mat4> {
        let clip = match (self.transform, face) {
            (ShadowTransform::Single(m), None) => Some(m),
            (ShadowTransform::Cube(faces), Some(face)) => faces[face.index()],
            _ => None,
        }?;
        Some(Self::CLIP_TO_TEXTURE * clip)
    }

    /// Light view-projection for a draw into a target.
    pub fn view_projection(&self, face: Option<CubeFace>) -> Option<Mat4> {
        match (self.transform, face) {
            (ShadowTransform::Single(m), None) => Some(m),
            (ShadowTransform::Cube(faces), Some(face)) => faces[face.index()],
            _ => None,
        }
    }

    pub fn is_cube(&self) -> bool {
        matches!(self.targets, ShadowTargets::Cube(_))
    }

    /// Get the shadow uniform data for shaders.
    pub fn uniform(&self) -> ShadowUniform {
        let matrix = self.texture_matrix(None).unwrap_or(Mat4::IDENTITY);
        ShadowUniform {
            light_matrix: matrix.to_cols_array_2d(),
            bias: self.depth_bias,
            segment_depth: self.segment_depth,
            far: self.far,
            shadow_map_size: self.resolution as f32,
        }
    }
}

/// Shadow uniform data for GPU.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ShadowUniform {
    /// World to shadow texture space (identity for cube maps).
    pub light_matrix: [[f32; 4]; 4],
    pub bias: f32,
    /// Near plane of cube faces, for depth linearization.
    pub segment_depth: f32,
    pub far: f32,
    /// Shadow map size (for texel size calculation).
    pub shadow_map_size: f32,
}

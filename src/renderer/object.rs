//! Scene objects
//!
//! Renderable object records: feature flags, bounds, mesh handle and the
//! cached shader-variant choices.

use super::geometry::{Aabb, Bounds};
use super::light::LightId;
use super::shader::ShaderCache;

/// Index of an object in the scene arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(pub u32);

/// Handle to a mesh owned by the external mesh provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshHandle(pub u32);

bitflags::bitflags! {
    /// Render-feature and structural flags of a scene object.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ObjectFlags: u32 {
        const USE_TEXTURE                 = 1 << 0;
        const USE_NORMAL_MAP              = 1 << 1;
        const USE_SPECULAR_MAP            = 1 << 2;
        const USE_EMISSION_MAP            = 1 << 3;
        /// Per-vertex colors.
        const MULTI_COLOR                 = 1 << 4;
        const ANISOTROPIC                 = 1 << 5;
        /// Texture alpha is a cutout mask.
        const TRANSPARENT                 = 1 << 6;
        /// Object moves; it lives in the unbounded dynamic index.
        const DYNAMIC_POSITION            = 1 << 7;
        /// Only drawn with a constant emission color; never lit, never a receiver.
        const EMISSION_ONLY               = 1 << 8;
        /// Emission-only objects add their diffuse color to the emission.
        const EMISSION_ADDS_DIFFUSE       = 1 << 9;
        const CASTS_SHADOWS               = 1 << 10;
        const HIDDEN                      = 1 << 11;
        /// Geometry is a closed surface.
        const CLOSED                      = 1 << 12;
        const OPEN_SIDE_HIDDEN_FROM_LIGHT = 1 << 13;
        const OPEN_SIDE_HIDDEN_FROM_VIEW  = 1 << 14;

        /// Flags that feed shader selection and may be masked globally.
        const FEATURES = Self::USE_TEXTURE.bits()
            | Self::USE_NORMAL_MAP.bits()
            | Self::USE_SPECULAR_MAP.bits()
            | Self::USE_EMISSION_MAP.bits()
            | Self::MULTI_COLOR.bits()
            | Self::ANISOTROPIC.bits()
            | Self::TRANSPARENT.bits();

        /// Any texture-like input.
        const MAPS = Self::USE_TEXTURE.bits()
            | Self::USE_NORMAL_MAP.bits()
            | Self::USE_SPECULAR_MAP.bits()
            | Self::USE_EMISSION_MAP.bits();
    }
}

impl ObjectFlags {
    /// Transparent cutout texture: both the texture and transparency are on.
    pub fn has_transparent_texture(self) -> bool {
        self.contains(Self::USE_TEXTURE | Self::TRANSPARENT)
    }

    /// No maps, vertex colors or anisotropy.
    pub fn is_plain(self) -> bool {
        !self.intersects(Self::MAPS | Self::MULTI_COLOR | Self::ANISOTROPIC)
    }

    /// Normal, specular or emission map in addition to the base texture.
    pub fn has_detail_maps(self) -> bool {
        self.intersects(Self::USE_NORMAL_MAP | Self::USE_SPECULAR_MAP | Self::USE_EMISSION_MAP)
    }

    /// Apply the global feature mask; structural flags are untouched.
    pub fn masked(self, mask: ObjectFlags) -> ObjectFlags {
        (self & !Self::FEATURES) | (self & Self::FEATURES & mask)
    }
}

/// Surface parameters pushed as material uniforms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub diffuse: [f32; 4],
    pub specular: [f32; 3],
    pub shininess: f32,
    pub emission: [f32; 3],
    pub roughness: f32,
    pub anisotropy: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            diffuse: [0.8, 0.8, 0.8, 1.0],
            specular: [0.5, 0.5, 0.5],
            shininess: 32.0,
            emission: [0.0, 0.0, 0.0],
            roughness: 0.5,
            anisotropy: 0.0,
        }
    }
}

/// A renderable object.
#[derive(Debug, Clone)]
pub struct SceneObject {
    pub id: ObjectId,
    pub flags: ObjectFlags,
    pub bounds: Bounds,
    pub mesh: MeshHandle,
    pub material: Material,
    /// Model-to-world transform.
    pub transform: glam::Mat4,
    /// Objects attached to a light never shadow that light.
    pub attached_light: Option<LightId>,
    /// Cached shader choices, one slot per pass and light type.
    pub shader_cache: ShaderCache,
}

impl SceneObject {
    /// Create a new object with default material and identity transform.
    pub fn new(id: ObjectId, mesh: MeshHandle, bounds: impl Into<Bounds>, flags: ObjectFlags) -> Self {
        Self {
            id,
            flags,
            bounds: bounds.into(),
            mesh,
            material: Material::default(),
            transform: glam::Mat4::IDENTITY,
            attached_light: None,
            shader_cache: ShaderCache::default(),
        }
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.material = material;
        self
    }

    pub fn with_transform(mut self, transform: glam::Mat4) -> Self {
        self.transform = transform;
        self
    }

    pub fn attached_to(mut self, light: LightId) -> Self {
        self.attached_light = Some(light);
        self
    }

    /// World-space AABB.
    pub fn aabb(&self) -> Aabb {
        self.bounds.aabb()
    }

    pub fn is_live(&self) -> bool {
        !self.flags.contains(ObjectFlags::HIDDEN)
    }

    pub fn casts_shadows(&self) -> bool {
        self.flags.contains(ObjectFlags::CASTS_SHADOWS)
    }

    pub fn is_dynamic(&self) -> bool {
        self.flags.contains(ObjectFlags::DYNAMIC_POSITION)
    }

    pub fn is_emission_only(&self) -> bool {
        self.flags.contains(ObjectFlags::EMISSION_ONLY)
    }
}

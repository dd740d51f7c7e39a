//! Render settings
//!
//! Process-wide rendering choices that feed shader selection.

use crate::renderer::object::ObjectFlags;

/// Shadow technique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ShadowTechnique {
    #[default]
    None,
    /// Stencil shadow volumes. Selection only; volumes are rendered elsewhere.
    Volumes,
    /// Depth shadow maps.
    Mapping,
}

/// Lighting model used by multi-pass lighting variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ReflectionModel {
    #[default]
    Standard,
    Microfacet,
}

/// Settings that, when changed, force shader reselection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderSettings {
    pub shadow_technique: ShadowTechnique,
    pub reflection_model: ReflectionModel,
    /// Ambient pass, one lighting pass per light, final pass.
    pub multi_pass: bool,
    /// ANDed into every object's feature flags before selection.
    pub object_flags_mask: ObjectFlags,
    pub light_attenuation: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            shadow_technique: ShadowTechnique::None,
            reflection_model: ReflectionModel::Standard,
            multi_pass: false,
            object_flags_mask: ObjectFlags::all(),
            light_attenuation: true,
        }
    }
}

impl RenderSettings {
    /// Create new settings with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the shadow technique.
    pub fn shadow_technique(mut self, technique: ShadowTechnique) -> Self {
        self.shadow_technique = technique;
        self
    }

    /// Set the reflection model.
    pub fn reflection_model(mut self, model: ReflectionModel) -> Self {
        self.reflection_model = model;
        self
    }

    /// Set whether rendering is multi-pass.
    pub fn multi_pass(mut self, multi_pass: bool) -> Self {
        self.multi_pass = multi_pass;
        self
    }

    /// Set the global object feature mask.
    pub fn object_flags_mask(mut self, mask: ObjectFlags) -> Self {
        self.object_flags_mask = mask;
        self
    }

    /// Set whether light attenuation is applied.
    pub fn light_attenuation(mut self, enabled: bool) -> Self {
        self.light_attenuation = enabled;
        self
    }

    /// Whether lights need shadow maps under these settings.
    pub fn shadow_mapping(&self) -> bool {
        self.shadow_technique == ShadowTechnique::Mapping
    }
}

/// Features of the active graphics device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphicsCapabilities {
    pub depth_textures: bool,
    pub cube_depth_textures: bool,
    pub stencil_buffer: bool,
}

impl GraphicsCapabilities {
    /// Whether a shadow technique can run on this device.
    pub fn supports(&self, technique: ShadowTechnique) -> bool {
        match technique {
            ShadowTechnique::None => true,
            ShadowTechnique::Volumes => self.stencil_buffer,
            ShadowTechnique::Mapping => self.depth_textures,
        }
    }
}

impl Default for GraphicsCapabilities {
    fn default() -> Self {
        Self {
            depth_textures: true,
            cube_depth_textures: true,
            stencil_buffer: true,
        }
    }
}

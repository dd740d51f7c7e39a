//! RenderContext - explicit engine state
//!
//! Holds everything the shadow and shader dispatch core would otherwise
//! read from process-wide variables: the render settings, device
//! capabilities, the current light and shader, and the reselect
//! generation that invalidates cached shader choices.

mod settings;

pub use settings::{GraphicsCapabilities, ReflectionModel, RenderSettings, ShadowTechnique};

use crate::renderer::light::LightId;
use crate::renderer::object::ObjectFlags;
use crate::renderer::shader::ShaderVariant;
use std::collections::HashSet;

/// Outcome of a settings write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingChange {
    /// The value changed and shader choices will be reselected.
    Applied,
    /// The value was already set; nothing is invalidated.
    Unchanged,
    /// The device cannot honor the value; the previous one is kept.
    Rejected,
}

/// Engine state threaded through every call in this crate.
#[derive(Debug, Clone)]
pub struct RenderContext {
    settings: RenderSettings,
    capabilities: GraphicsCapabilities,
    /// Bumped on every settings change. Cached shader choices made under an
    /// older generation are stale.
    generation: u64,
    frame: u64,
    warned: HashSet<ShadowTechnique>,
    /// Light whose pass is being prepared or drawn.
    pub current_light: Option<LightId>,
    /// Shader bound by the last draw command.
    pub current_shader: Option<ShaderVariant>,
}

impl RenderContext {
    /// Create a context for a device.
    ///
    /// Unsupported initial settings are downgraded the same way a later
    /// change would be rejected.
    pub fn new(settings: RenderSettings, capabilities: GraphicsCapabilities) -> Self {
        let mut ctx = Self {
            settings: RenderSettings {
                shadow_technique: ShadowTechnique::None,
                ..settings
            },
            capabilities,
            generation: 0,
            frame: 0,
            warned: HashSet::new(),
            current_light: None,
            current_shader: None,
        };
        ctx.set_shadow_technique(settings.shadow_technique);
        ctx.generation = 0;
        ctx
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    pub fn capabilities(&self) -> &GraphicsCapabilities {
        &self.capabilities
    }

    /// Current reselect generation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Index of the frame being rendered.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Force every cached shader choice to be re-derived on next use.
    pub fn request_reselect(&mut self) {
        self.generation += 1;
        tracing::trace!(generation = self.generation, "shader reselect requested");
    }

    /// Start a new frame. Clears the current light and shader.
    pub fn begin_frame(&mut self) {
        self.frame += 1;
        self.current_light = None;
        self.current_shader = None;
    }

    /// Change the shadow technique if the device supports it.
    pub fn set_shadow_technique(&mut self, technique: ShadowTechnique) -> SettingChange {
        if !self.capabilities.supports(technique) {
            if self.warned.insert(technique) {
                tracing::warn!(
                    requested = ?technique,
                    kept = ?self.settings.shadow_technique,
                    "shadow technique not supported by the graphics device"
                );
            }
            return SettingChange::Rejected;
        }
        let current = self.settings.shadow_technique;
        self.apply(current != technique, |s| s.shadow_technique = technique)
    }

    pub fn set_reflection_model(&mut self, model: ReflectionModel) -> SettingChange {
        let changed = self.settings.reflection_model != model;
        self.apply(changed, |s| s.reflection_model = model)
    }

    pub fn set_multi_pass(&mut self, multi_pass: bool) -> SettingChange {
        let changed = self.settings.multi_pass != multi_pass;
        self.apply(changed, |s| s.multi_pass = multi_pass)
    }

    pub fn set_object_flags_mask(&mut self, mask: ObjectFlags) -> SettingChange {
        let changed = self.settings.object_flags_mask != mask;
        self.apply(changed, |s| s.object_flags_mask = mask)
    }

    pub fn set_light_attenuation(&mut self, enabled: bool) -> SettingChange {
        let changed = self.settings.light_attenuation != enabled;
        self.apply(changed, |s| s.light_attenuation = enabled)
    }

    fn apply(&mut self, changed: bool, write: impl FnOnce(&mut RenderSettings)) -> SettingChange {
        if !changed {
            return SettingChange::Unchanged;
        }
        write(&mut self.settings);
        self.request_reselect();
        SettingChange::Applied
    }
}

impl Default for RenderContext {
    fn default() -> Self {
        Self::new(RenderSettings::default(), GraphicsCapabilities::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_changes_bump_generation() {
        let mut ctx = RenderContext::default();
        assert_eq!(ctx.generation(), 0);

        assert_eq!(ctx.set_multi_pass(true), SettingChange::Applied);
        assert_eq!(ctx.generation(), 1);

        assert_eq!(ctx.set_multi_pass(true), SettingChange::Unchanged);
        assert_eq!(ctx.generation(), 1);

        ctx.request_reselect();
        assert_eq!(ctx.generation(), 2);
    }

    #[test]
    fn test_unsupported_technique_is_rejected() {
        let caps = GraphicsCapabilities {
            depth_textures: false,
            ..Default::default()
        };
        let mut ctx = RenderContext::new(RenderSettings::default(), caps);
        assert_eq!(ctx.set_shadow_technique(ShadowTechnique::Volumes), SettingChange::Applied);
        assert_eq!(ctx.set_shadow_technique(ShadowTechnique::Mapping), SettingChange::Rejected);
        assert_eq!(ctx.settings().shadow_technique, ShadowTechnique::Volumes);
        // Rejection does not invalidate cached shaders.
        assert_eq!(ctx.generation(), 1);
    }

    #[test]
    fn test_initial_unsupported_setting_is_downgraded() {
        let caps = GraphicsCapabilities {
            depth_textures: false,
            ..Default::default()
        };
        let settings = RenderSettings::new().shadow_technique(ShadowTechnique::Mapping);
        let ctx = RenderContext::new(settings, caps);
        assert_eq!(ctx.settings().shadow_technique, ShadowTechnique::None);
        assert_eq!(ctx.generation(), 0);
    }
}

//! Shader variant selection
//!
//! [`select`] is a pure function of the pass, the light slot, the masked
//! object flags and the render settings. [`ShaderSelector`] puts the
//! per-object cache in front of it.

use super::cache::{ShaderCache, VariantSlot};
use super::variant::ShaderVariant;
use crate::context::{ReflectionModel, RenderContext, RenderSettings};
use crate::renderer::light::LightSlot;
use crate::renderer::object::{ObjectFlags, SceneObject};

/// The pass a draw belongs to, with the light slot for lit passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderPass {
    /// Ambient, one light and emission in one draw.
    SinglePass(LightSlot),
    Ambient,
    /// Additive lighting pass for one light.
    Lighting(LightSlot),
    /// Emission and emission maps, after all lights.
    Final,
}

impl RenderPass {
    /// Cache slot this pass's choice is stored in.
    pub fn cache_slot(self, shadow_mapped: bool) -> VariantSlot {
        match self {
            RenderPass::Ambient => VariantSlot::Ambient,
            RenderPass::Final => VariantSlot::Final,
            RenderPass::SinglePass(slot) => VariantSlot::Lit(slot),
            RenderPass::Lighting(slot) if shadow_mapped => VariantSlot::Shadowed(slot),
            RenderPass::Lighting(slot) => VariantSlot::Lit(slot),
        }
    }
}

/// Choose the variant for an object in a pass.
///
/// `flags` are the object's flags; the settings' global mask is applied
/// here. `shadow_mapped` only matters for lighting passes under shadow
/// mapping.
pub fn select(pass: RenderPass, flags: ObjectFlags, settings: &RenderSettings, shadow_mapped: bool) -> ShaderVariant {
    let flags = flags.masked(settings.object_flags_mask);
    match pass {
        RenderPass::Ambient => ShaderVariant::MpAmbient,
        RenderPass::Final => select_final(flags),
        RenderPass::SinglePass(slot) => {
            if flags.contains(ObjectFlags::EMISSION_ONLY) {
                select_final(flags)
            } else {
                select_single_pass(slot, flags)
            }
        }
        RenderPass::Lighting(slot) => {
            if flags.contains(ObjectFlags::EMISSION_ONLY) {
                select_final(flags)
            } else if shadow_mapped && settings.shadow_mapping() {
                select_shadowed(slot, flags, settings.reflection_model)
            } else {
                select_lighting(slot, flags, settings.reflection_model)
            }
        }
    }
}

fn select_final(flags: ObjectFlags) -> ShaderVariant {
    if flags.contains(ObjectFlags::EMISSION_ONLY | ObjectFlags::EMISSION_ADDS_DIFFUSE) {
        ShaderVariant::MpFinalEmissionDiffuseAdd
    } else if flags.contains(ObjectFlags::EMISSION_ONLY) {
        ShaderVariant::MpFinalEmission
    } else if flags.contains(ObjectFlags::USE_EMISSION_MAP) {
        ShaderVariant::MpFinalEmissionMap
    } else {
        ShaderVariant::MpFinalEmission
    }
}

fn select_single_pass(slot: LightSlot, flags: ObjectFlags) -> ShaderVariant {
    let directional = slot.is_directional();
    if flags.has_transparent_texture() {
        return if directional {
            ShaderVariant::SpTransparentTextureDirectional
        } else {
            ShaderVariant::SpTransparentTexturePoint
        };
    }
    let complete = flags.has_detail_maps();
    match (complete, directional, slot.is_attenuated()) {
        (false, true, _) => ShaderVariant::SpPlainTextureDirectional,
        (false, false, false) => ShaderVariant::SpPlainTexturePoint,
        (false, false, true) => ShaderVariant::SpPlainTexturePointAttenuated,
        (true, true, _) => ShaderVariant::SpCompleteDirectional,
        (true, false, false) => ShaderVariant::SpCompletePoint,
        (true, false, true) => ShaderVariant::SpCompletePointAttenuated,
    }
}

fn select_lighting(slot: LightSlot, flags: ObjectFlags, model: ReflectionModel) -> ShaderVariant {
    if flags.has_transparent_texture() {
        return ShaderVariant::MpTransparentTexture;
    }
    if model == ReflectionModel::Microfacet {
        return match slot {
            LightSlot::Directional => ShaderVariant::MpDirectionalMicrofacet,
            LightSlot::Point | LightSlot::PointAttenuated => ShaderVariant::MpPointMicrofacet,
            LightSlot::Spot | LightSlot::SpotAttenuated => ShaderVariant::MpSpotMicrofacet,
            LightSlot::Beam | LightSlot::BeamAttenuated => ShaderVariant::MpBeamMicrofacet,
        };
    }
    if flags.is_plain() {
        return if slot.is_directional() {
            ShaderVariant::MpPlainDirectional
        } else {
            ShaderVariant::MpPlainLocal
        };
    }
    match slot {
        LightSlot::Directional => ShaderVariant::MpDirectionalStandard,
        LightSlot::Point => ShaderVariant::MpPointStandard,
        LightSlot::PointAttenuated => ShaderVariant::MpPointLinearStandard,
        LightSlot::Spot | LightSlot::SpotAttenuated => ShaderVariant::MpSpotStandard,
        LightSlot::Beam | LightSlot::BeamAttenuated => ShaderVariant::MpBeamStandard,
    }
}

fn select_shadowed(slot: LightSlot, flags: ObjectFlags, model: ReflectionModel) -> ShaderVariant {
    if flags.has_transparent_texture() {
        return ShaderVariant::MpShadowTransparentTexture;
    }
    match (model, slot) {
        (ReflectionModel::Standard, LightSlot::Directional) => ShaderVariant::MpShadowDirectionalStandard,
        (ReflectionModel::Standard, LightSlot::Point | LightSlot::PointAttenuated) => {
            ShaderVariant::MpShadowPointStandard
        }
        (ReflectionModel::Standard, LightSlot::Spot | LightSlot::SpotAttenuated) => {
            ShaderVariant::MpShadowSpotStandard
        }
        (ReflectionModel::Standard, LightSlot::Beam | LightSlot::BeamAttenuated) => {
            ShaderVariant::MpShadowBeamStandard
        }
        (ReflectionModel::Microfacet, LightSlot::Directional) => ShaderVariant::MpShadowDirectionalMicrofacet,
        (ReflectionModel::Microfacet, LightSlot::Point | LightSlot::PointAttenuated) => {
            ShaderVariant::MpShadowPointMicrofacet
        }
        (ReflectionModel::Microfacet, LightSlot::Spot | LightSlot::SpotAttenuated) => {
            ShaderVariant::MpShadowSpotMicrofacet
        }
        (ReflectionModel::Microfacet, LightSlot::Beam | LightSlot::BeamAttenuated) => {
            ShaderVariant::MpShadowBeamMicrofacet
        }
    }
}

/// Cached selection with an evaluation counter.
#[derive(Debug, Default)]
pub struct ShaderSelector {
    evaluations: u64,
}

impl ShaderSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Variant for `object` in `pass`, from its cache when still valid.
    pub fn resolve(
        &mut self,
        ctx: &RenderContext,
        object: &mut SceneObject,
        pass: RenderPass,
        shadow_mapped: bool,
    ) -> ShaderVariant {
        self.resolve_cached(ctx, object.flags, &mut object.shader_cache, pass, shadow_mapped)
    }

    /// Like [`ShaderSelector::resolve`], on an object's flags and cache.
    pub fn resolve_cached(
        &mut self,
        ctx: &RenderContext,
        flags: ObjectFlags,
        cache: &mut ShaderCache,
        pass: RenderPass,
        shadow_mapped: bool,
    ) -> ShaderVariant {
        let shadow_mapped = shadow_mapped && ctx.settings().shadow_mapping();
        let slot = pass.cache_slot(shadow_mapped);
        let evaluations = &mut self.evaluations;
        cache.resolve(slot, ctx.generation(), || {
            *evaluations += 1;
            select(pass, flags, ctx.settings(), shadow_mapped)
        })
    }

    /// How many times [`select`] actually ran.
    pub fn evaluations(&self) -> u64 {
        self.evaluations
    }
}

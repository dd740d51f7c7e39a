//! Shader variant table
//!
//! Every precompiled program variant, with the uniforms and vertex
//! attributes its program consumes.

/// Uniforms a program can consume, in binding order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u32)]
pub enum UniformKind {
    ModelViewProjection,
    ModelMatrix,
    NormalMatrix,
    ViewPosition,
    AmbientColor,
    LightPosition,
    LightDirection,
    LightColor,
    LightAttenuation,
    SpotParameters,
    BeamParameters,
    DiffuseColor,
    SpecularColor,
    EmissionColor,
    Roughness,
    Anisotropy,
    DiffuseSampler,
    NormalSampler,
    SpecularSampler,
    EmissionSampler,
    ShadowMapTransform,
    ShadowMapSampler,
    ShadowMapParameters,
    AlphaThreshold,
}

impl UniformKind {
    pub const COUNT: usize = 24;

    /// All kinds in binding order.
    pub const ALL: [UniformKind; Self::COUNT] = [
        UniformKind::ModelViewProjection,
        UniformKind::ModelMatrix,
        UniformKind::NormalMatrix,
        UniformKind::ViewPosition,
        UniformKind::AmbientColor,
        UniformKind::LightPosition,
        UniformKind::LightDirection,
        UniformKind::LightColor,
        UniformKind::LightAttenuation,
        UniformKind::SpotParameters,
        UniformKind::BeamParameters,
        UniformKind::DiffuseColor,
        UniformKind::SpecularColor,
        UniformKind::EmissionColor,
        UniformKind::Roughness,
        UniformKind::Anisotropy,
        UniformKind::DiffuseSampler,
        UniformKind::NormalSampler,
        UniformKind::SpecularSampler,
        UniformKind::EmissionSampler,
        UniformKind::ShadowMapTransform,
        UniformKind::ShadowMapSampler,
        UniformKind::ShadowMapParameters,
        UniformKind::AlphaThreshold,
    ];

    /// Name of the uniform in shader source.
    pub fn name(self) -> &'static str {
        match self {
            UniformKind::ModelViewProjection => "u_model_view_projection",
            UniformKind::ModelMatrix => "u_model",
            UniformKind::NormalMatrix => "u_normal_matrix",
            UniformKind::ViewPosition => "u_view_position",
            UniformKind::AmbientColor => "u_ambient",
            UniformKind::LightPosition => "u_light_position",
            UniformKind::LightDirection => "u_light_direction",
            UniformKind::LightColor => "u_light_color",
            UniformKind::LightAttenuation => "u_light_attenuation",
            UniformKind::SpotParameters => "u_spot",
            UniformKind::BeamParameters => "u_beam",
            UniformKind::DiffuseColor => "u_diffuse",
            UniformKind::SpecularColor => "u_specular",
            UniformKind::EmissionColor => "u_emission",
            UniformKind::Roughness => "u_roughness",
            UniformKind::Anisotropy => "u_anisotropy",
            UniformKind::DiffuseSampler => "t_diffuse",
            UniformKind::NormalSampler => "t_normal",
            UniformKind::SpecularSampler => "t_specular",
            UniformKind::EmissionSampler => "t_emission",
            UniformKind::ShadowMapTransform => "u_shadow_matrix",
            UniformKind::ShadowMapSampler => "t_shadow",
            UniformKind::ShadowMapParameters => "u_shadow",
            UniformKind::AlphaThreshold => "u_alpha_threshold",
        }
    }

    pub fn flag(self) -> UniformSet {
        UniformSet::from_bits_retain(1 << self as u32)
    }
}

bitflags::bitflags! {
    /// Set of [`UniformKind`]s; bit `i` is the kind with discriminant `i`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct UniformSet: u32 {
        const MODEL_VIEW_PROJECTION = 1 << 0;
        const MODEL_MATRIX          = 1 << 1;
        const NORMAL_MATRIX         = 1 << 2;
        const VIEW_POSITION         = 1 << 3;
        const AMBIENT_COLOR         = 1 << 4;
        const LIGHT_POSITION        = 1 << 5;
        const LIGHT_DIRECTION       = 1 << 6;
        const LIGHT_COLOR           = 1 << 7;
        const LIGHT_ATTENUATION     = 1 << 8;
        const SPOT_PARAMETERS       = 1 << 9;
        const BEAM_PARAMETERS       = 1 << 10;
        const DIFFUSE_COLOR         = 1 << 11;
        const SPECULAR_COLOR        = 1 << 12;
        const EMISSION_COLOR        = 1 << 13;
        const ROUGHNESS             = 1 << 14;
        const ANISOTROPY            = 1 << 15;
        const DIFFUSE_SAMPLER       = 1 << 16;
        const NORMAL_SAMPLER        = 1 << 17;
        const SPECULAR_SAMPLER      = 1 << 18;
        const EMISSION_SAMPLER      = 1 << 19;
        const SHADOW_MAP_TRANSFORM  = 1 << 20;
        const SHADOW_MAP_SAMPLER    = 1 << 21;
        const SHADOW_MAP_PARAMETERS = 1 << 22;
        const ALPHA_THRESHOLD       = 1 << 23;
    }
}

impl UniformSet {
    /// Kinds in the set, in binding order.
    pub fn kinds(self) -> impl Iterator<Item = UniformKind> {
        UniformKind::ALL.into_iter().filter(move |k| self.contains(k.flag()))
    }
}

/// Vertex attributes a program can consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum VertexAttribute {
    Position,
    Normal,
    TexCoord,
    Tangent,
    Color,
}

impl VertexAttribute {
    pub const ALL: [VertexAttribute; 5] = [
        VertexAttribute::Position,
        VertexAttribute::Normal,
        VertexAttribute::TexCoord,
        VertexAttribute::Tangent,
        VertexAttribute::Color,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn flag(self) -> AttributeSet {
        AttributeSet::from_bits_retain(1 << self as u8)
    }
}

bitflags::bitflags! {
    /// Set of [`VertexAttribute`]s.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct AttributeSet: u8 {
        const POSITION = 1 << 0;
        const NORMAL   = 1 << 1;
        const TEXCOORD = 1 << 2;
        const TANGENT  = 1 << 3;
        const COLOR    = 1 << 4;
    }
}

impl AttributeSet {
    pub fn attributes(self) -> impl Iterator<Item = VertexAttribute> {
        VertexAttribute::ALL.into_iter().filter(move |a| self.contains(a.flag()))
    }
}

/// A precompiled shader program variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShaderVariant {
    // Single pass: ambient, one light and emission in one draw.
    SpPlainTextureDirectional,
    SpPlainTexturePoint,
    SpPlainTexturePointAttenuated,
    SpCompleteDirectional,
    SpCompletePoint,
    SpCompletePointAttenuated,
    SpTransparentTextureDirectional,
    SpTransparentTexturePoint,
    // Multi-pass ambient.
    MpAmbient,
    // Multi-pass lighting.
    MpDirectionalStandard,
    MpPointStandard,
    MpPointLinearStandard,
    MpSpotStandard,
    MpBeamStandard,
    MpDirectionalMicrofacet,
    MpPointMicrofacet,
    MpSpotMicrofacet,
    MpBeamMicrofacet,
    MpPlainDirectional,
    MpPlainLocal,
    MpTransparentTexture,
    // Multi-pass lighting with a shadow map.
    MpShadowDirectionalStandard,
    MpShadowPointStandard,
    MpShadowSpotStandard,
    MpShadowBeamStandard,
    MpShadowDirectionalMicrofacet,
    MpShadowPointMicrofacet,
    MpShadowSpotMicrofacet,
    MpShadowBeamMicrofacet,
    MpShadowTransparentTexture,
    // Multi-pass final.
    MpFinalEmission,
    MpFinalEmissionDiffuseAdd,
    MpFinalEmissionMap,
}

/// Static description of a variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariantInfo {
    pub variant: ShaderVariant,
    /// Program resource name.
    pub name: &'static str,
    pub uniforms: UniformSet,
    pub attributes: AttributeSet,
}

const TRANSFORMS: UniformSet = UniformSet::MODEL_VIEW_PROJECTION
    .union(UniformSet::MODEL_MATRIX)
    .union(UniformSet::NORMAL_MATRIX)
    .union(UniformSet::VIEW_POSITION);
const DIRECTIONAL: UniformSet = UniformSet::LIGHT_DIRECTION.union(UniformSet::LIGHT_COLOR);
const POINT: UniformSet = UniformSet::LIGHT_POSITION.union(UniformSet::LIGHT_COLOR);
const POINT_ATTENUATED: UniformSet = POINT.union(UniformSet::LIGHT_ATTENUATION);
const SPOT: UniformSet = POINT_ATTENUATED
    .union(UniformSet::LIGHT_DIRECTION)
    .union(UniformSet::SPOT_PARAMETERS);
const BEAM: UniformSet = POINT_ATTENUATED
    .union(UniformSet::LIGHT_DIRECTION)
    .union(UniformSet::BEAM_PARAMETERS);
const PHONG: UniformSet = UniformSet::DIFFUSE_COLOR.union(UniformSet::SPECULAR_COLOR);
const MICROFACET: UniformSet = UniformSet::DIFFUSE_COLOR
    .union(UniformSet::ROUGHNESS)
    .union(UniformSet::ANISOTROPY);
const DETAIL_MAPS: UniformSet = UniformSet::NORMAL_SAMPLER.union(UniformSet::SPECULAR_SAMPLER);
const SINGLE_PASS: UniformSet = TRANSFORMS
    .union(UniformSet::AMBIENT_COLOR)
    .union(PHONG)
    .union(UniformSet::DIFFUSE_SAMPLER);
const SINGLE_PASS_COMPLETE: UniformSet = SINGLE_PASS
    .union(DETAIL_MAPS)
    .union(UniformSet::EMISSION_SAMPLER)
    .union(UniformSet::EMISSION_COLOR);
const LIGHTING: UniformSet = TRANSFORMS.union(UniformSet::DIFFUSE_SAMPLER).union(DETAIL_MAPS);
const SHADOW: UniformSet = UniformSet::SHADOW_MAP_TRANSFORM
    .union(UniformSet::SHADOW_MAP_SAMPLER)
    .union(UniformSet::SHADOW_MAP_PARAMETERS);
const TRANSPARENT: UniformSet = TRANSFORMS
    .union(POINT_ATTENUATED)
    .union(UniformSet::LIGHT_DIRECTION)
    .union(PHONG)
    .union(UniformSet::DIFFUSE_SAMPLER)
    .union(UniformSet::ALPHA_THRESHOLD);

const A_LIT: AttributeSet = AttributeSet::POSITION.union(AttributeSet::NORMAL);
const A_TEXTURED: AttributeSet = A_LIT.union(AttributeSet::TEXCOORD).union(AttributeSet::COLOR);
const A_COMPLETE: AttributeSet = A_TEXTURED.union(AttributeSet::TANGENT);

const fn info(
    variant: ShaderVariant,
    name: &'static str,
    uniforms: UniformSet,
    attributes: AttributeSet,
) -> VariantInfo {
    VariantInfo {
        variant,
        name,
        uniforms,
        attributes,
    }
}

use ShaderVariant::*;

/// Indexed by variant discriminant.
static VARIANTS: [VariantInfo; ShaderVariant::COUNT] = [
    info(SpPlainTextureDirectional, "sp_plain_texture_directional", SINGLE_PASS.union(DIRECTIONAL), A_TEXTURED),
    info(SpPlainTexturePoint, "sp_plain_texture_point", SINGLE_PASS.union(POINT), A_TEXTURED),
    info(
        SpPlainTexturePointAttenuated,
        "sp_plain_texture_point_attenuated",
        SINGLE_PASS.union(POINT_ATTENUATED),
        A_TEXTURED,
    ),
    info(SpCompleteDirectional, "sp_complete_directional", SINGLE_PASS_COMPLETE.union(DIRECTIONAL), A_COMPLETE),
    info(SpCompletePoint, "sp_complete_point", SINGLE_PASS_COMPLETE.union(POINT), A_COMPLETE),
    info(
        SpCompletePointAttenuated,
        "sp_complete_point_attenuated",
        SINGLE_PASS_COMPLETE.union(POINT_ATTENUATED),
        A_COMPLETE,
    ),
    info(
        SpTransparentTextureDirectional,
        "sp_transparent_texture_directional",
        SINGLE_PASS.union(DIRECTIONAL).union(UniformSet::ALPHA_THRESHOLD),
        A_TEXTURED,
    ),
    info(
        SpTransparentTexturePoint,
        "sp_transparent_texture_point",
        SINGLE_PASS.union(POINT_ATTENUATED).union(UniformSet::ALPHA_THRESHOLD),
        A_TEXTURED,
    ),
    info(
        MpAmbient,
        "mp_ambient",
        UniformSet::MODEL_VIEW_PROJECTION
            .union(UniformSet::AMBIENT_COLOR)
            .union(UniformSet::DIFFUSE_COLOR)
            .union(UniformSet::DIFFUSE_SAMPLER),
        AttributeSet::POSITION.union(AttributeSet::TEXCOORD).union(AttributeSet::COLOR),
    ),
    info(MpDirectionalStandard, "mp_directional_standard", LIGHTING.union(DIRECTIONAL).union(PHONG), A_COMPLETE),
    info(MpPointStandard, "mp_point_standard", LIGHTING.union(POINT).union(PHONG), A_COMPLETE),
    info(MpPointLinearStandard, "mp_point_linear_standard", LIGHTING.union(POINT_ATTENUATED).union(PHONG), A_COMPLETE),
    info(MpSpotStandard, "mp_spot_standard", LIGHTING.union(SPOT).union(PHONG), A_COMPLETE),
    info(MpBeamStandard, "mp_beam_standard", LIGHTING.union(BEAM).union(PHONG), A_COMPLETE),
    info(
        MpDirectionalMicrofacet,
        "mp_directional_microfacet",
        LIGHTING.union(DIRECTIONAL).union(MICROFACET),
        A_COMPLETE,
    ),
    info(MpPointMicrofacet, "mp_point_microfacet", LIGHTING.union(POINT_ATTENUATED).union(MICROFACET), A_COMPLETE),
    info(MpSpotMicrofacet, "mp_spot_microfacet", LIGHTING.union(SPOT).union(MICROFACET), A_COMPLETE),
    info(MpBeamMicrofacet, "mp_beam_microfacet", LIGHTING.union(BEAM).union(MICROFACET), A_COMPLETE),
    info(MpPlainDirectional, "mp_plain_directional", TRANSFORMS.union(DIRECTIONAL).union(PHONG), A_LIT),
    info(
        MpPlainLocal,
        "mp_plain_local",
        TRANSFORMS
            .union(POINT_ATTENUATED)
            .union(UniformSet::LIGHT_DIRECTION)
            .union(UniformSet::SPOT_PARAMETERS)
            .union(UniformSet::BEAM_PARAMETERS)
            .union(PHONG),
        A_LIT,
    ),
    info(MpTransparentTexture, "mp_transparent_texture", TRANSPARENT, A_TEXTURED),
    info(
        MpShadowDirectionalStandard,
        "mp_shadow_directional_standard",
        LIGHTING.union(DIRECTIONAL).union(PHONG).union(SHADOW),
        A_COMPLETE,
    ),
    info(
        MpShadowPointStandard,
        "mp_shadow_point_standard",
        LIGHTING.union(POINT_ATTENUATED).union(PHONG).union(SHADOW),
        A_COMPLETE,
    ),
    info(MpShadowSpotStandard, "mp_shadow_spot_standard", LIGHTING.union(SPOT).union(PHONG).union(SHADOW), A_COMPLETE),
    info(MpShadowBeamStandard, "mp_shadow_beam_standard", LIGHTING.union(BEAM).union(PHONG).union(SHADOW), A_COMPLETE),
    info(
        MpShadowDirectionalMicrofacet,
        "mp_shadow_directional_microfacet",
        LIGHTING.union(DIRECTIONAL).union(MICROFACET).union(SHADOW),
        A_COMPLETE,
    ),
    info(
        MpShadowPointMicrofacet,
        "mp_shadow_point_microfacet",
        LIGHTING.union(POINT_ATTENUATED).union(MICROFACET).union(SHADOW),
        A_COMPLETE,
    ),
    info(
        MpShadowSpotMicrofacet,
        "mp_shadow_spot_microfacet",
        LIGHTING.union(SPOT).union(MICROFACET).union(SHADOW),
        A_COMPLETE,
    ),
    info(
        MpShadowBeamMicrofacet,
        "mp_shadow_beam_microfacet",
        LIGHTING.union(BEAM).union(MICROFACET).union(SHADOW),
        A_COMPLETE,
    ),
    info(MpShadowTransparentTexture, "mp_shadow_transparent_texture", TRANSPARENT.union(SHADOW), A_TEXTURED),
    info(
        MpFinalEmission,
        "mp_final_emission",
        UniformSet::MODEL_VIEW_PROJECTION.union(UniformSet::EMISSION_COLOR),
        AttributeSet::POSITION,
    ),
    info(
        MpFinalEmissionDiffuseAdd,
        "mp_final_emission_diffuse_add",
        UniformSet::MODEL_VIEW_PROJECTION
            .union(UniformSet::EMISSION_COLOR)
            .union(UniformSet::DIFFUSE_COLOR)
            .union(UniformSet::DIFFUSE_SAMPLER),
        AttributeSet::POSITION.union(AttributeSet::TEXCOORD).union(AttributeSet::COLOR),
    ),
    info(
        MpFinalEmissionMap,
        "mp_final_emission_map",
        UniformSet::MODEL_VIEW_PROJECTION
            .union(UniformSet::EMISSION_COLOR)
            .union(UniformSet::EMISSION_SAMPLER),
        AttributeSet::POSITION.union(AttributeSet::TEXCOORD),
    ),
];

impl ShaderVariant {
    pub const COUNT: usize = 33;

    /// Every variant in id order.
    pub fn all() -> impl Iterator<Item = ShaderVariant> {
        VARIANTS.iter().map(|i| i.variant)
    }

    /// Dense id, usable as a table index.
    pub fn id(self) -> usize {
        self as usize
    }

    pub fn info(self) -> &'static VariantInfo {
        &VARIANTS[self.id()]
    }

    pub fn name(self) -> &'static str {
        self.info().name
    }

    pub fn required_uniforms(self) -> UniformSet {
        self.info().uniforms
    }

    pub fn required_attributes(self) -> AttributeSet {
        self.info().attributes
    }

    /// Whether the variant samples a shadow map.
    pub fn is_shadow_mapped(self) -> bool {
        self.required_uniforms().contains(UniformSet::SHADOW_MAP_SAMPLER)
    }

    /// Whether the variant needs light uniforms bound.
    pub fn is_lit(self) -> bool {
        self.required_uniforms().intersects(UniformSet::LIGHT_COLOR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_table_is_indexed_by_id() {
        for (i, info) in VARIANTS.iter().enumerate() {
            assert_eq!(info.variant.id(), i, "{:?}", info.variant);
        }
        let names: HashSet<_> = ShaderVariant::all().map(|v| v.name()).collect();
        assert_eq!(names.len(), ShaderVariant::COUNT);
    }

    #[test]
    fn test_uniform_bits_follow_kind_order() {
        assert_eq!(UniformKind::ALL.len(), UniformKind::COUNT);
        for (i, kind) in UniformKind::ALL.into_iter().enumerate() {
            assert_eq!(kind as usize, i);
        }
        assert_eq!(UniformKind::AlphaThreshold.flag(), UniformSet::ALPHA_THRESHOLD);
        assert_eq!(UniformSet::all().kinds().count(), UniformKind::COUNT);
        assert_eq!(VertexAttribute::Tangent.flag(), AttributeSet::TANGENT);
    }

    #[test]
    fn test_variant_requirements() {
        assert!(ShaderVariant::MpShadowSpotStandard.is_shadow_mapped());
        assert!(!ShaderVariant::MpSpotStandard.is_shadow_mapped());
        assert!(!ShaderVariant::MpAmbient.is_lit());
        assert!(!ShaderVariant::MpFinalEmission.is_lit());
        assert!(ShaderVariant::SpCompletePoint.is_lit());
        assert!(ShaderVariant::MpPointLinearStandard
            .required_uniforms()
            .contains(UniformSet::LIGHT_ATTENUATION));
        assert!(!ShaderVariant::MpPointStandard
            .required_uniforms()
            .contains(UniformSet::LIGHT_ATTENUATION));
        assert_eq!(ShaderVariant::MpFinalEmission.required_attributes(), AttributeSet::POSITION);
        for variant in ShaderVariant::all().filter(|v| v.is_shadow_mapped()) {
            assert!(variant.is_lit(), "{variant:?}");
        }
    }
}

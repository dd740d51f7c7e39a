//! Uniform binding
//!
//! One loop walks a variant's required uniforms in [`UniformKind`] order,
//! computes each value from the draw's inputs and pushes it to a
//! [`UniformSink`] at the program's location.

use super::registry::{Program, UniformLocation};
use super::variant::{ShaderVariant, UniformKind};
use crate::error::{Error, Result};
use crate::renderer::light::{Light, LightKind};
use crate::renderer::object::SceneObject;
use crate::renderer::shadow::ShadowMapTarget;
use crate::renderer::viewer::View;
use glam::{Mat3, Mat4, Vec3, Vec4};

/// Texture units, fixed per sampler kind.
pub const DIFFUSE_UNIT: u32 = 0;
pub const NORMAL_UNIT: u32 = 1;
pub const SPECULAR_UNIT: u32 = 2;
pub const EMISSION_UNIT: u32 = 3;
pub const SHADOW_UNIT: u32 = 4;

/// A value pushed to a uniform location.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Mat4(Mat4),
    Mat3(Mat3),
    Vec4(Vec4),
    Vec3(Vec3),
    Float(f32),
    /// Texture unit index.
    Sampler(u32),
}

/// Receiver of uniform writes, e.g. a GL program or a recording.
pub trait UniformSink {
    fn set_uniform(&mut self, location: UniformLocation, value: UniformValue);
}

/// Uniform writes of one draw, in binding order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordedUniforms {
    pub writes: Vec<(UniformKind, UniformLocation, UniformValue)>,
}

impl RecordedUniforms {
    pub fn value(&self, kind: UniformKind) -> Option<UniformValue> {
        self.writes.iter().find(|(k, _, _)| *k == kind).map(|(_, _, v)| *v)
    }

    pub fn kinds(&self) -> Vec<UniformKind> {
        self.writes.iter().map(|(k, _, _)| *k).collect()
    }

    /// Replay the writes into a sink.
    pub fn replay(&self, sink: &mut dyn UniformSink) {
        for (_, location, value) in &self.writes {
            sink.set_uniform(*location, *value);
        }
    }
}

/// Everything uniform values are computed from.
#[derive(Debug, Clone, Copy)]
pub struct UniformInputs<'a> {
    pub view: &'a View,
    pub object: &'a SceneObject,
    /// Required for lit variants.
    pub light: Option<&'a Light>,
    /// Required for shadow-mapped variants.
    pub shadow: Option<&'a ShadowMapTarget>,
    pub ambient: [f32; 3],
    pub alpha_threshold: f32,
}

/// Compute one uniform's value.
pub fn uniform_value(kind: UniformKind, inputs: &UniformInputs) -> Result<UniformValue> {
    let object = inputs.object;
    let material = &object.material;
    let light = || inputs.light.ok_or(Error::Invariant("lit shader variant bound without a light"));
    let shadow = || {
        inputs
            .shadow
            .ok_or(Error::Invariant("shadow-mapped variant bound without a shadow map"))
    };

    let value = match kind {
        UniformKind::ModelViewProjection => UniformValue::Mat4(inputs.view.view_projection * object.transform),
        UniformKind::ModelMatrix => UniformValue::Mat4(object.transform),
        UniformKind::NormalMatrix => {
            UniformValue::Mat3(Mat3::from_mat4(object.transform).inverse().transpose())
        }
        UniformKind::ViewPosition => UniformValue::Vec3(inputs.view.position),
        UniformKind::AmbientColor => UniformValue::Vec3(Vec3::from(inputs.ambient)),
        UniformKind::LightPosition => UniformValue::Vec3(light()?.position().unwrap_or(Vec3::ZERO)),
        UniformKind::LightDirection => UniformValue::Vec3(light()?.direction().unwrap_or(Vec3::ZERO)),
        UniformKind::LightColor => {
            let l = light()?;
            UniformValue::Vec4(Vec3::from(l.color).extend(l.intensity))
        }
        UniformKind::LightAttenuation => UniformValue::Vec4(Vec4::from(light()?.attenuation.to_array())),
        UniformKind::SpotParameters => match light()?.kind {
            LightKind::Spot { axis, half_angle, .. } => UniformValue::Vec4(axis.extend(half_angle.cos())),
            _ => UniformValue::Vec4(Vec4::ZERO),
        },
        UniformKind::BeamParameters => match light()?.kind {
            LightKind::Beam { axis, radius, .. } => UniformValue::Vec4(axis.extend(radius)),
            _ => UniformValue::Vec4(Vec4::ZERO),
        },
        UniformKind::DiffuseColor => UniformValue::Vec4(Vec4::from(material.diffuse)),
        UniformKind::SpecularColor => UniformValue::Vec4(Vec3::from(material.specular).extend(material.shininess)),
        UniformKind::EmissionColor => UniformValue::Vec3(Vec3::from(material.emission)),
        UniformKind::Roughness => UniformValue::Float(material.roughness),
        UniformKind::Anisotropy => UniformValue::Float(material.anisotropy),
        UniformKind::DiffuseSampler => UniformValue::Sampler(DIFFUSE_UNIT),
        UniformKind::NormalSampler => UniformValue::Sampler(NORMAL_UNIT),
        UniformKind::SpecularSampler => UniformValue::Sampler(SPECULAR_UNIT),
        UniformKind::EmissionSampler => UniformValue::Sampler(EMISSION_UNIT),
        UniformKind::ShadowMapTransform => {
            let target = shadow()?;
            let matrix = match target.texture_matrix(None) {
                Some(m) => m,
                // Cube maps are looked up by direction from the light.
                None => Mat4::from_translation(-light()?.position().unwrap_or(Vec3::ZERO)),
            };
            UniformValue::Mat4(matrix)
        }
        UniformKind::ShadowMapSampler => {
            shadow()?;
            UniformValue::Sampler(SHADOW_UNIT)
        }
        UniformKind::ShadowMapParameters => {
            let target = shadow()?;
            UniformValue::Vec4(Vec4::new(
                target.depth_bias,
                target.segment_depth,
                target.far,
                target.resolution as f32,
            ))
        }
        UniformKind::AlphaThreshold => UniformValue::Float(inputs.alpha_threshold),
    };
    Ok(value)
}

/// Bind every uniform `variant` requires, in kind order.
///
/// Returns the number of uniforms written.
pub fn bind_uniforms(
    variant: ShaderVariant,
    program: &Program,
    inputs: &UniformInputs,
    sink: &mut dyn UniformSink,
) -> Result<usize> {
    for_each_uniform(variant, program, inputs, |_, location, value| {
        sink.set_uniform(location, value)
    })
}

/// Like [`bind_uniforms`], keeping the writes for later replay.
pub fn record_uniforms(variant: ShaderVariant, program: &Program, inputs: &UniformInputs) -> Result<RecordedUniforms> {
    let mut recorded = RecordedUniforms::default();
    for_each_uniform(variant, program, inputs, |kind, location, value| {
        recorded.writes.push((kind, location, value))
    })?;
    Ok(recorded)
}

fn for_each_uniform(
    variant: ShaderVariant,
    program: &Program,
    inputs: &UniformInputs,
    mut write: impl FnMut(UniformKind, UniformLocation, UniformValue),
) -> Result<usize> {
    let mut written = 0;
    for kind in variant.required_uniforms().kinds() {
        let location = program
            .location(kind)
            .ok_or(Error::MissingUniform { variant, uniform: kind })?;
        write(kind, location, uniform_value(kind, inputs)?);
        written += 1;
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::geometry::Aabb;
    use crate::renderer::light::{Attenuation, LightId};
    use crate::renderer::object::{MeshHandle, ObjectFlags, ObjectId};
    use crate::renderer::shader::{ProgramTable, ShaderLoader};
    use crate::renderer::viewer::{Projection, Viewport};

    struct CountingSink(Vec<UniformLocation>);

    impl UniformSink for CountingSink {
        fn set_uniform(&mut self, location: UniformLocation, _value: UniformValue) {
            self.0.push(location);
        }
    }

    fn view() -> View {
        View::look_at(
            Vec3::new(0.0, 2.0, 5.0),
            Vec3::ZERO,
            Vec3::Y,
            Projection::perspective(60.0, 0.1, 100.0),
            Viewport::default(),
        )
    }

    fn object() -> SceneObject {
        SceneObject::new(ObjectId(0), MeshHandle(0), Aabb::new(Vec3::ZERO, Vec3::ONE), ObjectFlags::empty())
            .with_transform(Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0)))
    }

    #[test]
    fn test_binds_in_kind_order() {
        let variant = ShaderVariant::MpSpotStandard;
        let program = ProgramTable::new().load(variant).unwrap();
        let light = Light::spot(LightId(0), Vec3::Y * 4.0, Vec3::NEG_Y, 0.4, Attenuation::linear(1.0, 10.0));
        let (view, object) = (view(), object());
        let inputs = UniformInputs {
            view: &view,
            object: &object,
            light: Some(&light),
            shadow: None,
            ambient: [0.1; 3],
            alpha_threshold: 0.5,
        };

        let mut sink = CountingSink(Vec::new());
        let written = bind_uniforms(variant, &program, &inputs, &mut sink).unwrap();
        assert_eq!(written, variant.required_uniforms().kinds().count());
        // ProgramTable hands out locations in kind order.
        assert!(sink.0.windows(2).all(|w| w[0].0 < w[1].0));

        let recorded = record_uniforms(variant, &program, &inputs).unwrap();
        assert_eq!(
            recorded.value(UniformKind::SpotParameters),
            Some(UniformValue::Vec4(Vec4::new(0.0, -1.0, 0.0, 0.4f32.cos())))
        );
        assert_eq!(
            recorded.value(UniformKind::ModelMatrix),
            Some(UniformValue::Mat4(object.transform))
        );
    }

    #[test]
    fn test_lit_variant_without_light_fails() {
        let variant = ShaderVariant::MpPointStandard;
        let program = ProgramTable::new().load(variant).unwrap();
        let (view, object) = (view(), object());
        let inputs = UniformInputs {
            view: &view,
            object: &object,
            light: None,
            shadow: None,
            ambient: [0.0; 3],
            alpha_threshold: 0.5,
        };
        let mut sink = CountingSink(Vec::new());
        let err = bind_uniforms(variant, &program, &inputs, &mut sink).unwrap_err();
        assert!(matches!(err, Error::Invariant(_)));

        // Unlit variants bind without one.
        let ambient = ProgramTable::new().load(ShaderVariant::MpAmbient).unwrap();
        assert!(bind_uniforms(ShaderVariant::MpAmbient, &ambient, &inputs, &mut sink).is_ok());
    }
}

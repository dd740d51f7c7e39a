//! Shader variant dispatch
//!
//! Chooses one of the precompiled program variants per object, pass and
//! light type, loads programs on demand and feeds them their uniforms and
//! vertex attributes.

mod attributes;
mod binder;
mod cache;
mod registry;
mod selector;
mod variant;

pub use attributes::{
    attribute_bindings, bound_attributes, AttributeBinding, BufferHandle, MeshLayout, MeshProvider, MeshRegistry,
};
pub use binder::{
    bind_uniforms, record_uniforms, uniform_value, RecordedUniforms, UniformInputs, UniformSink, UniformValue,
    DIFFUSE_UNIT, EMISSION_UNIT, NORMAL_UNIT, SHADOW_UNIT, SPECULAR_UNIT,
};
pub use cache::{CachedVariant, ShaderCache, VariantSlot};
pub use registry::{Program, ProgramHandle, ProgramTable, ShaderLoader, ShaderRegistry, UniformLocation};
pub use selector::{select, RenderPass, ShaderSelector};
pub use variant::{AttributeSet, ShaderVariant, UniformKind, UniformSet, VariantInfo, VertexAttribute};

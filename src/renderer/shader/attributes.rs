//! Vertex attribute binding
//!
//! Works out which attributes a draw binds and where each one lives in
//! the mesh's buffers.

use super::variant::{AttributeSet, ShaderVariant, VertexAttribute};
use crate::error::{Error, Result};
use crate::renderer::object::{MeshHandle, ObjectFlags};
use std::collections::HashMap;

/// Handle of a vertex buffer owned by the mesh provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub u32);

/// Where one attribute is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeBinding {
    pub buffer: BufferHandle,
    /// Byte offset of the attribute within a vertex.
    pub offset: u64,
    /// Byte distance between consecutive vertices.
    pub stride: u64,
}

/// Source of mesh vertex layouts.
pub trait MeshProvider {
    /// Attributes the mesh has data for.
    fn available_attributes(&self, mesh: MeshHandle) -> AttributeSet;

    fn attribute_binding(&self, mesh: MeshHandle, attribute: VertexAttribute) -> Option<AttributeBinding>;
}

/// Vertex layout of one mesh.
///
/// Attributes can share one interleaved buffer or be split over several
/// buffers, each of which may itself interleave a subset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MeshLayout {
    bindings: [Option<AttributeBinding>; 5],
}

impl MeshLayout {
    pub fn new() -> Self {
        Self::default()
    }

    /// All attributes interleaved in one buffer.
    pub fn interleaved(buffer: BufferHandle, stride: u64, attributes: &[(VertexAttribute, u64)]) -> Self {
        Self::new().with_buffer(buffer, stride, attributes)
    }

    /// Add a buffer holding some of the attributes.
    pub fn with_buffer(mut self, buffer: BufferHandle, stride: u64, attributes: &[(VertexAttribute, u64)]) -> Self {
        for &(attribute, offset) in attributes {
            self.bindings[attribute.index()] = Some(AttributeBinding {
                buffer,
                offset,
                stride,
            });
        }
        self
    }

    pub fn available(&self) -> AttributeSet {
        VertexAttribute::ALL
            .into_iter()
            .filter(|a| self.bindings[a.index()].is_some())
            .fold(AttributeSet::empty(), |set, a| set | a.flag())
    }

    pub fn binding(&self, attribute: VertexAttribute) -> Option<AttributeBinding> {
        self.bindings[attribute.index()]
    }
}

/// Mesh layouts by handle.
#[derive(Debug, Clone, Default)]
pub struct MeshRegistry {
    layouts: HashMap<MeshHandle, MeshLayout>,
}

impl MeshRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, mesh: MeshHandle, layout: MeshLayout) {
        self.layouts.insert(mesh, layout);
    }
}

impl MeshProvider for MeshRegistry {
    fn available_attributes(&self, mesh: MeshHandle) -> AttributeSet {
        self.layouts
            .get(&mesh)
            .map(MeshLayout::available)
            .unwrap_or_default()
    }

    fn attribute_binding(&self, mesh: MeshHandle, attribute: VertexAttribute) -> Option<AttributeBinding> {
        self.layouts.get(&mesh)?.binding(attribute)
    }
}

/// Attributes a draw binds: what the variant consumes, what the mesh has
/// and what the object's features actually use.
pub fn bound_attributes(variant: ShaderVariant, flags: ObjectFlags, available: AttributeSet) -> AttributeSet {
    let mut enabled = AttributeSet::POSITION | AttributeSet::NORMAL;
    if flags.intersects(ObjectFlags::MAPS) {
        enabled |= AttributeSet::TEXCOORD;
    }
    if flags.contains(ObjectFlags::USE_NORMAL_MAP) {
        enabled |= AttributeSet::TANGENT;
    }
    if flags.contains(ObjectFlags::MULTI_COLOR) {
        enabled |= AttributeSet::COLOR;
    }
    variant.required_attributes() & available & enabled
}

/// Resolve the bindings of every attribute a draw binds.
///
/// `flags` should already have the global feature mask applied.
pub fn attribute_bindings(
    variant: ShaderVariant,
    flags: ObjectFlags,
    meshes: &dyn MeshProvider,
    mesh: MeshHandle,
) -> Result<Vec<(VertexAttribute, AttributeBinding)>> {
    let available = meshes.available_attributes(mesh);
    if !available.contains(AttributeSet::POSITION) {
        return Err(Error::Invariant("mesh has no position attribute"));
    }
    bound_attributes(variant, flags, available)
        .attributes()
        .map(|attribute| {
            meshes
                .attribute_binding(mesh, attribute)
                .map(|binding| (attribute, binding))
                .ok_or(Error::Invariant("mesh reports an attribute it cannot bind"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_features_gate_attributes() {
        let all = AttributeSet::all();
        let variant = ShaderVariant::MpDirectionalStandard;
        assert_eq!(
            bound_attributes(variant, ObjectFlags::empty(), all),
            AttributeSet::POSITION | AttributeSet::NORMAL
        );
        assert_eq!(
            bound_attributes(variant, ObjectFlags::USE_NORMAL_MAP | ObjectFlags::MULTI_COLOR, all),
            all
        );
        // Mesh without colors.
        let no_color = all - AttributeSet::COLOR;
        assert!(!bound_attributes(variant, ObjectFlags::MULTI_COLOR, no_color).contains(AttributeSet::COLOR));
        // Variant that reads positions only.
        assert_eq!(
            bound_attributes(ShaderVariant::MpFinalEmission, ObjectFlags::USE_TEXTURE, all),
            AttributeSet::POSITION
        );
    }

    #[test]
    fn test_partially_interleaved_layout() {
        let layout = MeshLayout::interleaved(
            BufferHandle(0),
            24,
            &[(VertexAttribute::Position, 0), (VertexAttribute::Normal, 12)],
        )
        .with_buffer(BufferHandle(1), 8, &[(VertexAttribute::TexCoord, 0)]);
        let mut meshes = MeshRegistry::new();
        meshes.insert(MeshHandle(3), layout);

        let bindings = attribute_bindings(
            ShaderVariant::MpDirectionalStandard,
            ObjectFlags::USE_TEXTURE,
            &meshes,
            MeshHandle(3),
        )
        .unwrap();
        assert_eq!(bindings.len(), 3);
        assert_eq!(
            bindings[2],
            (
                VertexAttribute::TexCoord,
                AttributeBinding {
                    buffer: BufferHandle(1),
                    offset: 0,
                    stride: 8
                }
            )
        );

        assert!(attribute_bindings(ShaderVariant::MpAmbient, ObjectFlags::empty(), &meshes, MeshHandle(9)).is_err());
    }
}

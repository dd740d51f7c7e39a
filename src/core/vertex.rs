//! Vertex types
//!
//! Interleaved vertex formats and how their attributes map onto a
//! [`MeshLayout`].

use crate::renderer::shader::{BufferHandle, MeshLayout, VertexAttribute};
use bytemuck::{Pod, Zeroable};

/// An interleaved vertex format.
pub trait VertexFormat: Pod {
    /// Attributes with their byte offsets.
    const ATTRIBUTES: &'static [(VertexAttribute, u64)];

    /// Get the vertex buffer layout for this vertex type.
    fn layout() -> wgpu::VertexBufferLayout<'static>;

    /// Layout of a mesh whose vertices all live in `buffer`.
    fn mesh_layout(buffer: BufferHandle) -> MeshLayout {
        MeshLayout::interleaved(buffer, std::mem::size_of::<Self>() as u64, Self::ATTRIBUTES)
    }
}

/// Vertex with position only.
/// Used for shadow map rendering and depth-only passes.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct VertexP {
    pub position: [f32; 3],
}

impl VertexP {
    pub const fn new(position: [f32; 3]) -> Self {
        Self { position }
    }
}

impl VertexFormat for VertexP {
    const ATTRIBUTES: &'static [(VertexAttribute, u64)] = &[(VertexAttribute::Position, 0)];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<VertexP>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            }],
        }
    }
}

/// Vertex with position and normal only.
/// Used for plain meshes without maps or vertex colors.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct VertexPN {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl VertexPN {
    pub const fn new(position: [f32; 3], normal: [f32; 3]) -> Self {
        Self { position, normal }
    }
}

impl VertexFormat for VertexPN {
    const ATTRIBUTES: &'static [(VertexAttribute, u64)] =
        &[(VertexAttribute::Position, 0), (VertexAttribute::Normal, 12)];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<VertexPN>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                // position
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                // normal
                wgpu::VertexAttribute {
                    offset: 12,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// Vertex with position, normal, UV, and color.
/// Used for textured meshes without normal maps.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct VertexPNUC {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    pub color: [f32; 4],
}

impl VertexPNUC {
    pub const fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2], color: [f32; 4]) -> Self {
        Self {
            position,
            normal,
            uv,
            color,
        }
    }
}

impl VertexFormat for VertexPNUC {
    const ATTRIBUTES: &'static [(VertexAttribute, u64)] = &[
        (VertexAttribute::Position, 0),
        (VertexAttribute::Normal, 12),
        (VertexAttribute::TexCoord, 24),
        (VertexAttribute::Color, 32),
    ];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<VertexPNUC>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                // position
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                // normal
                wgpu::VertexAttribute {
                    offset: 12,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
                // uv
                wgpu::VertexAttribute {
                    offset: 24,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x2,
                },
                // color
                wgpu::VertexAttribute {
                    offset: 32,
                    shader_location: 4,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

const PNUTC_ATTRIBUTES: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
    0 => Float32x3,
    1 => Float32x3,
    2 => Float32x2,
    3 => Float32x4,
    4 => Float32x4
];

/// Vertex with position, normal, UV, tangent and color.
/// Used for normal-mapped meshes.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct VertexPNUTC {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    /// xyz tangent, w handedness.
    pub tangent: [f32; 4],
    pub color: [f32; 4],
}

impl VertexFormat for VertexPNUTC {
    const ATTRIBUTES: &'static [(VertexAttribute, u64)] = &[
        (VertexAttribute::Position, 0),
        (VertexAttribute::Normal, 12),
        (VertexAttribute::TexCoord, 24),
        (VertexAttribute::Tangent, 32),
        (VertexAttribute::Color, 48),
    ];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<VertexPNUTC>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &PNUTC_ATTRIBUTES,
        }
    }
}

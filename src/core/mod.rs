//! Core rendering abstractions
//!
//! Render states, vertex formats and shadow map textures over wgpu.

pub mod render_states;
pub mod texture;
pub mod vertex;

pub use render_states::{CullState, DepthState, RenderStateSnapshot};
pub use texture::{create_comparison_sampler, GpuShadowTargets, ShadowDepthTexture, SHADOW_DEPTH_FORMAT};
pub use vertex::{VertexFormat, VertexP, VertexPN, VertexPNUC, VertexPNUTC};

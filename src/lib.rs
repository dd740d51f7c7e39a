//! Umbra shadow and shader dispatch core
//!
//! Per frame and per light, finds the objects that can cast or receive
//! shadows, fits a light-space projection around them and renders their
//! depth into shadow maps. Per object and pass, picks one of the
//! precompiled shader variants, caching the choice until a render setting
//! changes, and resolves the uniforms and vertex attributes it needs.
//!
//! # Architecture
//!
//! 1. **context** - Explicit engine state (settings, device capabilities)
//! 2. **core** - Render states, vertex formats, GPU shadow targets (wgpu)
//! 3. **renderer** - Scene, lights, spatial indices, shadows, shader dispatch
//! 4. **error** - Crate error type
//!
//! # Example
//!
//! ```no_run
//! use umbra::{
//!     FrameRenderer, HandlePool, ProgramTable, RecordingBackend, RenderContext, Scene, ShadowConfig,
//! };
//! # fn run(scene: &mut Scene, view: &umbra::View, meshes: &umbra::MeshRegistry) -> umbra::Result<()> {
//! let mut ctx = RenderContext::default();
//! let mut frame = FrameRenderer::new(ShadowConfig::default(), ProgramTable::new(), HandlePool::default());
//! let mut backend = RecordingBackend::new();
//!
//! frame.begin_frame(&mut ctx, scene)?;
//! frame.prepare_lights(&mut ctx, scene, view, &mut backend)?;
//! let commands = frame.draw_commands(&mut ctx, scene, view, meshes, [0.1, 0.1, 0.1])?;
//! # let _ = commands;
//! # Ok(())
//! # }
//! ```

pub mod context;
pub mod core;
pub mod error;
pub mod renderer;

pub use context::{GraphicsCapabilities, ReflectionModel, RenderContext, RenderSettings, SettingChange, ShadowTechnique};

pub use core::{
    CullState, DepthState, GpuShadowTargets, RenderStateSnapshot, VertexFormat, VertexP, VertexPN, VertexPNUC,
    VertexPNUTC,
};

pub use error::{Error, Result};

pub use renderer::{
    Aabb, Attenuation, Bounds, CubeFace, DrawCommand, FinderOutcome, FrameRenderer, Frustum, HandlePool, Light,
    LightId, LightKind, LightPreparation, LightSlot, Material, MeshHandle, MeshLayout, MeshProvider, MeshRegistry,
    ObjectFlags, ObjectId, Platform, ProgramTable, Projection, RecordingBackend, RenderPass, Scene, SceneObject,
    SegmentMask, ShaderLoader, ShaderRegistry, ShaderSelector, ShaderVariant, ShadowConfig, ShadowFinder,
    ShadowMapRenderer, ShadowMapTarget, ShadowProjector, ShadowTargetPool, Sphere, UniformKind, View, Viewport,
};

// Re-export glam for convenience
pub use glam;

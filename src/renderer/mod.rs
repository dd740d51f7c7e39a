//! Scene-side rendering logic
//!
//! Scene data (objects, lights, views and their spatial indices), shadow
//! map generation and shader variant dispatch.

pub mod culling;
pub mod frame;
pub mod geometry;
pub mod light;
pub mod object;
pub mod scene;
pub mod shader;
pub mod shadow;
pub mod spatial;
pub mod viewer;

pub use culling::{ConvexHull, Frustum, Intersection, Plane};
pub use frame::{DrawCommand, FrameRenderer, LightPreparation};
pub use geometry::{Aabb, Bounds, Sphere};
pub use light::{Attenuation, Light, LightId, LightKind, LightSlot, LightUniforms, LightVolume};
pub use object::{Material, MeshHandle, ObjectFlags, ObjectId, SceneObject};
pub use scene::Scene;
pub use shader::{
    MeshLayout, MeshProvider, MeshRegistry, Program, ProgramTable, RenderPass, ShaderLoader, ShaderRegistry,
    ShaderSelector, ShaderVariant, UniformKind, VariantSlot,
};
pub use shadow::{
    CasterSet, CubeFace, FinderOutcome, HandlePool, NonClosedBiasPolicy, Platform, RecordingBackend, SegmentMask,
    ShadowConfig, ShadowFinder, ShadowMapRenderer, ShadowMapTarget, ShadowProjector, ShadowTargetPool, ShadowUniform,
};
pub use spatial::{BoundsTree, SpatialIndex, TraversalMode};
pub use viewer::{Projection, View, Viewport};

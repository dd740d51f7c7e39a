//! Per-frame driver
//!
//! Runs shadow generation for each light, then turns visible objects into
//! draw commands with their shader variant, vertex attributes and uniform
//! values resolved.
//!
//! ```text
//! begin_frame
//!   prepare_light (per light)   finder -> projector -> pool -> shadow renderer
//!   draw_commands               ambient, lighting per light, final
//! ```

use super::light::{Light, LightId, LightKind};
use super::object::{MeshHandle, ObjectId};
use super::scene::Scene;
use super::shader::{
    attribute_bindings, record_uniforms, AttributeBinding, MeshProvider, ProgramHandle, RecordedUniforms, RenderPass,
    ShaderLoader, ShaderRegistry, ShaderSelector, ShaderVariant, UniformInputs, VertexAttribute,
};
use super::shadow::{
    DepthPassBackend, FinderOutcome, ShadowConfig, ShadowFinder, ShadowMapRenderer, ShadowMapTarget, ShadowProjector,
    ShadowRenderReport, ShadowTargetPool, ShadowTargets, ShadowTransform,
};
use super::viewer::View;
use crate::context::RenderContext;
use crate::error::Result;
use std::collections::HashMap;

/// What shadow preparation produced for one light.
#[derive(Debug, Clone)]
pub enum LightPreparation {
    /// Nothing visible is lit. The light gets no lighting pass.
    Skipped,
    /// Lit without a shadow map.
    Unshadowed,
    /// A shadow map was rendered.
    Shadowed {
        target: ShadowMapTarget,
        report: ShadowRenderReport,
    },
}

impl LightPreparation {
    pub fn shadow_map(&self) -> Option<&ShadowMapTarget> {
        match self {
            LightPreparation::Shadowed { target, .. } => Some(target),
            _ => None,
        }
    }
}

/// One draw with everything the backend needs to issue it.
#[derive(Debug, Clone)]
pub struct DrawCommand {
    pub pass: RenderPass,
    pub object: ObjectId,
    pub mesh: MeshHandle,
    /// Light of lighting and single passes.
    pub light: Option<LightId>,
    pub variant: ShaderVariant,
    pub program: ProgramHandle,
    pub attributes: Vec<(VertexAttribute, AttributeBinding)>,
    pub uniforms: RecordedUniforms,
}

/// Frame renderer owning the shader registry and shadow target pool.
pub struct FrameRenderer<L, P> {
    config: ShadowConfig,
    selector: ShaderSelector,
    registry: ShaderRegistry<L>,
    pool: P,
    prepared: HashMap<LightId, LightPreparation>,
}

impl<L: ShaderLoader, P: ShadowTargetPool> FrameRenderer<L, P> {
    pub fn new(config: ShadowConfig, loader: L, pool: P) -> Self {
        Self {
            config,
            selector: ShaderSelector::new(),
            registry: ShaderRegistry::new(loader),
            pool,
            prepared: HashMap::new(),
        }
    }

    pub fn config(&self) -> &ShadowConfig {
        &self.config
    }

    pub fn selector(&self) -> &ShaderSelector {
        &self.selector
    }

    pub fn registry(&self) -> &ShaderRegistry<L> {
        &self.registry
    }

    pub fn pool(&self) -> &P {
        &self.pool
    }

    /// Preparation result of a light this frame.
    pub fn prepared(&self, light: LightId) -> Option<&LightPreparation> {
        self.prepared.get(&light)
    }

    /// Start a frame: release shadow targets, forget last frame's lights
    /// and bring the spatial indices up to date.
    pub fn begin_frame(&mut self, ctx: &mut RenderContext, scene: &mut Scene) -> Result<()> {
        ctx.begin_frame();
        self.pool.reset();
        self.prepared.clear();
        scene.rebuild_indices();
        let ids: Vec<LightId> = scene.lights().iter().map(|l| l.id).collect();
        for id in ids {
            scene.light_mut(id)?.shadow_map_required = false;
        }
        Ok(())
    }

    /// Find casters for one light and render its shadow map if needed.
    pub fn prepare_light(
        &mut self,
        ctx: &mut RenderContext,
        scene: &mut Scene,
        light_id: LightId,
        view: &View,
        backend: &mut dyn DepthPassBackend,
    ) -> Result<LightPreparation> {
        ctx.current_light = Some(light_id);
        let light = scene.light(light_id)?.clone();

        let preparation = match ShadowFinder::new(&self.config).find(scene, &light, view)? {
            FinderOutcome::NoReceivers => {
                tracing::debug!(light = light_id.0, "no receivers, skipping light");
                LightPreparation::Skipped
            }
            FinderOutcome::NoCasters { .. } => {
                tracing::debug!(light = light_id.0, "no shadow casters");
                LightPreparation::Unshadowed
            }
            FinderOutcome::Casters(set) => {
                if !self.wants_shadow_map(ctx, &light) {
                    LightPreparation::Unshadowed
                } else if let Some(projection) = ShadowProjector::new(&self.config).project(&light, &set, view) {
                    let targets = match projection.transform {
                        ShadowTransform::Cube(_) => {
                            ShadowTargets::Cube(self.pool.cube(projection.level, projection.resolution)?)
                        }
                        ShadowTransform::Single(_) => {
                            ShadowTargets::Single(self.pool.single(projection.level, projection.resolution)?)
                        }
                    };
                    let target = ShadowMapTarget {
                        light: light_id,
                        level: projection.level,
                        resolution: projection.resolution,
                        transform: projection.transform,
                        targets,
                        faces: projection.faces,
                        segment_depth: projection.segment_depth,
                        far: projection.far,
                        depth_bias: self.config.depth_bias,
                    };
                    let report = ShadowMapRenderer::new(&self.config).render(scene, &set, &target, backend)?;
                    LightPreparation::Shadowed { target, report }
                } else {
                    tracing::debug!(light = light_id.0, "no visible shadow after fitting");
                    LightPreparation::Unshadowed
                }
            }
        };

        scene.light_mut(light_id)?.shadow_map_required = preparation.shadow_map().is_some();
        self.prepared.insert(light_id, preparation.clone());
        Ok(preparation)
    }

    /// Prepare every light of the scene in order.
    pub fn prepare_lights(
        &mut self,
        ctx: &mut RenderContext,
        scene: &mut Scene,
        view: &View,
        backend: &mut dyn DepthPassBackend,
    ) -> Result<Vec<(LightId, LightPreparation)>> {
        let ids: Vec<LightId> = scene.lights().iter().map(|l| l.id).collect();
        let mut prepared = Vec::with_capacity(ids.len());
        for id in ids {
            prepared.push((id, self.prepare_light(ctx, scene, id, view, backend)?));
        }
        Ok(prepared)
    }

    fn wants_shadow_map(&self, ctx: &RenderContext, light: &Light) -> bool {
        if !ctx.settings().shadow_mapping() || !light.casts_shadows {
            return false;
        }
        if matches!(light.kind, LightKind::Point { .. }) && !ctx.capabilities().cube_depth_textures {
            tracing::debug!(light = light.id.0, "device has no cube depth textures");
            return false;
        }
        true
    }

    /// Draw commands for every visible object.
    ///
    /// Lights that were not prepared this frame are lit without shadows;
    /// skipped lights get no pass. Emission-only objects are drawn once
    /// with a final variant.
    pub fn draw_commands(
        &mut self,
        ctx: &mut RenderContext,
        scene: &mut Scene,
        view: &View,
        meshes: &dyn MeshProvider,
        ambient: [f32; 3],
    ) -> Result<Vec<DrawCommand>> {
        let visible: Vec<ObjectId> = scene
            .objects()
            .iter()
            .filter(|o| o.is_live() && view.frustum.contains_aabb(&o.aabb()))
            .map(|o| o.id)
            .collect();
        let lights: Vec<(Light, Option<ShadowMapTarget>)> = scene
            .lights()
            .iter()
            .filter_map(|light| match self.prepared.get(&light.id) {
                Some(LightPreparation::Skipped) => None,
                Some(prep) => Some((light.clone(), prep.shadow_map().cloned())),
                None => Some((light.clone(), None)),
            })
            .collect();
        let (emissive, lit): (Vec<ObjectId>, Vec<ObjectId>) = visible
            .iter()
            .copied()
            .partition(|&id| scene.object(id).map(|o| o.is_emission_only()).unwrap_or(false));

        let mut commands = Vec::new();
        let attenuation = ctx.settings().light_attenuation;

        if ctx.settings().multi_pass {
            for &id in &lit {
                commands.push(self.command(ctx, scene, id, RenderPass::Ambient, None, None, view, meshes, ambient)?);
            }
            for (light, shadow) in &lights {
                ctx.current_light = Some(light.id);
                let pass = RenderPass::Lighting(light.slot(attenuation));
                for &id in &lit {
                    if !light.volume().intersects_aabb(&scene.object(id)?.aabb()) {
                        continue;
                    }
                    commands.push(self.command(
                        ctx,
                        scene,
                        id,
                        pass,
                        Some(light),
                        shadow.as_ref(),
                        view,
                        meshes,
                        ambient,
                    )?);
                }
            }
            ctx.current_light = None;
            for &id in lit.iter().chain(&emissive) {
                commands.push(self.command(ctx, scene, id, RenderPass::Final, None, None, view, meshes, ambient)?);
            }
        } else {
            for &id in &emissive {
                commands.push(self.command(ctx, scene, id, RenderPass::Final, None, None, view, meshes, ambient)?);
            }
            for (light, _) in &lights {
                ctx.current_light = Some(light.id);
                let pass = RenderPass::SinglePass(light.slot(attenuation));
                for &id in &lit {
                    if !light.volume().intersects_aabb(&scene.object(id)?.aabb()) {
                        continue;
                    }
                    commands.push(self.command(ctx, scene, id, pass, Some(light), None, view, meshes, ambient)?);
                }
            }
        }

        tracing::debug!(
            frame = ctx.frame(),
            objects = visible.len(),
            lights = lights.len(),
            draws = commands.len(),
            "built draw commands"
        );
        Ok(commands)
    }

    #[allow(clippy::too_many_arguments)]
    fn command(
        &mut self,
        ctx: &mut RenderContext,
        scene: &mut Scene,
        id: ObjectId,
        pass: RenderPass,
        light: Option<&Light>,
        shadow: Option<&ShadowMapTarget>,
        view: &View,
        meshes: &dyn MeshProvider,
        ambient: [f32; 3],
    ) -> Result<DrawCommand> {
        let (flags, cache) = scene.shader_cache_mut(id)?;
        let variant = self.selector.resolve_cached(ctx, flags, cache, pass, shadow.is_some());
        ctx.current_shader = Some(variant);

        let object = scene.object(id)?;
        let program = self.registry.get_or_load(variant)?;
        let flags = object.flags.masked(ctx.settings().object_flags_mask);
        let attributes = attribute_bindings(variant, flags, meshes, object.mesh)?;
        let inputs = UniformInputs {
            view,
            object,
            light,
            shadow: shadow.filter(|_| variant.is_shadow_mapped()),
            ambient,
            alpha_threshold: self.config.alpha_threshold,
        };
        let uniforms = record_uniforms(variant, program, &inputs)?;

        Ok(DrawCommand {
            pass,
            object: id,
            mesh: object.mesh,
            light: light.map(|l| l.id),
            variant,
            program: program.handle,
            attributes,
            uniforms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{GraphicsCapabilities, RenderSettings, ShadowTechnique};
    use crate::core::VertexFormat;
    use crate::core::VertexPN;
    use crate::renderer::geometry::Aabb;
    use crate::renderer::light::Attenuation;
    use crate::renderer::object::ObjectFlags;
    use crate::renderer::shader::{BufferHandle, MeshRegistry, ProgramTable, UniformKind};
    use crate::renderer::shadow::{HandlePool, RecordingBackend};
    use crate::renderer::viewer::{Projection, Viewport};
    use glam::Vec3;

    fn view() -> View {
        View::look_at(
            Vec3::new(0.0, 6.0, 12.0),
            Vec3::ZERO,
            Vec3::Y,
            Projection::perspective(60.0, 0.1, 100.0),
            Viewport::new(1920, 1080),
        )
    }

    fn meshes() -> MeshRegistry {
        let mut meshes = MeshRegistry::new();
        meshes.insert(MeshHandle(0), VertexPN::mesh_layout(BufferHandle(0)));
        meshes
    }

    fn scene_with_point_light() -> (Scene, LightId) {
        let mut scene = Scene::new();
        let floor = Aabb::new(Vec3::new(-5.0, -0.1, -5.0), Vec3::new(5.0, 0.0, 5.0));
        scene.add_object(MeshHandle(0), floor, ObjectFlags::CLOSED);
        let cube = Aabb::from_center_half_extents(Vec3::new(0.0, 0.5, 0.0), Vec3::splat(0.5));
        scene.add_object(MeshHandle(0), cube, ObjectFlags::CASTS_SHADOWS | ObjectFlags::CLOSED);
        let light = scene.insert_light(Light::point(
            LightId(0),
            Vec3::new(0.0, 3.0, 0.0),
            Attenuation::linear(0.5, 20.0),
        ));
        (scene, light)
    }

    fn context(technique: ShadowTechnique, multi_pass: bool) -> RenderContext {
        let settings = RenderSettings::new().shadow_technique(technique).multi_pass(multi_pass);
        RenderContext::new(settings, GraphicsCapabilities::default())
    }

    #[test]
    fn test_prepare_point_light_renders_shadow() {
        let (mut scene, light) = scene_with_point_light();
        let mut ctx = context(ShadowTechnique::Mapping, true);
        let mut frame = FrameRenderer::new(ShadowConfig::default(), ProgramTable::new(), HandlePool::default());
        let mut backend = RecordingBackend::new();
        let view = view();

        frame.begin_frame(&mut ctx, &mut scene).unwrap();
        let prep = frame.prepare_light(&mut ctx, &mut scene, light, &view, &mut backend).unwrap();
        let target = prep.shadow_map().unwrap();
        assert!(target.is_cube());
        assert!(scene.light(light).unwrap().shadow_map_required);
        assert_eq!(ctx.current_light, Some(light));
        assert!(backend.draws().count() > 0);
    }

    #[test]
    fn test_no_cube_textures_falls_back_to_unshadowed() {
        let (mut scene, light) = scene_with_point_light();
        let caps = GraphicsCapabilities {
            cube_depth_textures: false,
            ..Default::default()
        };
        let settings = RenderSettings::new().shadow_technique(ShadowTechnique::Mapping);
        let mut ctx = RenderContext::new(settings, caps);
        let mut frame = FrameRenderer::new(ShadowConfig::default(), ProgramTable::new(), HandlePool::default());
        let mut backend = RecordingBackend::new();

        frame.begin_frame(&mut ctx, &mut scene).unwrap();
        let prep = frame.prepare_light(&mut ctx, &mut scene, light, &view(), &mut backend).unwrap();
        assert!(matches!(prep, LightPreparation::Unshadowed));
        assert!(!scene.light(light).unwrap().shadow_map_required);
        assert_eq!(backend.draws().count(), 0);
    }

    #[test]
    fn test_multi_pass_order() {
        let (mut scene, light) = scene_with_point_light();
        let mut ctx = context(ShadowTechnique::Mapping, true);
        let mut frame = FrameRenderer::new(ShadowConfig::default(), ProgramTable::new(), HandlePool::default());
        let mut backend = RecordingBackend::new();
        let view = view();

        frame.begin_frame(&mut ctx, &mut scene).unwrap();
        frame.prepare_lights(&mut ctx, &mut scene, &view, &mut backend).unwrap();
        let commands = frame.draw_commands(&mut ctx, &mut scene, &view, &meshes(), [0.1; 3]).unwrap();

        let passes: Vec<RenderPass> = commands.iter().map(|c| c.pass).collect();
        assert_eq!(passes.len(), 6);
        assert_eq!(&passes[..2], &[RenderPass::Ambient; 2]);
        assert!(matches!(passes[2], RenderPass::Lighting(_)));
        assert_eq!(&passes[4..], &[RenderPass::Final; 2]);

        let lit = &commands[2];
        assert!(lit.variant.is_shadow_mapped());
        assert_eq!(lit.light, Some(light));
        assert!(lit.uniforms.value(UniformKind::ShadowMapParameters).is_some());
        assert_eq!(ctx.current_shader, Some(commands[5].variant));
        // Caching shader choices does not invalidate the spatial indices.
        assert!(!scene.indices_dirty());
    }

    #[test]
    fn test_single_pass_without_shadows() {
        let (mut scene, _) = scene_with_point_light();
        let mut ctx = context(ShadowTechnique::None, false);
        let mut frame = FrameRenderer::new(ShadowConfig::default(), ProgramTable::new(), HandlePool::default());
        let mut backend = RecordingBackend::new();
        let view = view();

        frame.begin_frame(&mut ctx, &mut scene).unwrap();
        frame.prepare_lights(&mut ctx, &mut scene, &view, &mut backend).unwrap();
        let commands = frame.draw_commands(&mut ctx, &mut scene, &view, &meshes(), [0.0; 3]).unwrap();

        assert_eq!(commands.len(), 2);
        assert!(commands.iter().all(|c| matches!(c.pass, RenderPass::SinglePass(_))));
        assert!(commands.iter().all(|c| !c.variant.is_shadow_mapped()));
        assert_eq!(backend.draws().count(), 0);
    }
}

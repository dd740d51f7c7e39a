//! Depth-only shadow pass
//!
//! Draws a light's casters into its shadow target(s) through a
//! [`DepthPassBackend`]. The caller's render state is saved before the
//! first pass and restored after the last, whatever happens in between.

use super::{
    CasterSet, CubeFace, NonClosedBiasPolicy, SegmentMask, ShadowConfig, ShadowMapTarget, ShadowTargets,
    TargetHandle,
};
use crate::core::render_states::{CullState, DepthState, RenderStateSnapshot};
use crate::error::{Error, Result};
use crate::renderer::object::{MeshHandle, ObjectFlags, ObjectId};
use crate::renderer::scene::Scene;
use glam::Mat4;

/// Depth shader used for a caster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DepthVariant {
    Plain,
    /// Discards fragments below the alpha threshold.
    AlphaCutout,
    /// Open geometry, drawn double-sided with extra bias.
    NonClosedBias,
}

impl DepthVariant {
    /// Pick the depth variant for a caster's flags.
    pub fn for_flags(flags: ObjectFlags, policy: NonClosedBiasPolicy) -> Self {
        if flags.has_transparent_texture() {
            return DepthVariant::AlphaCutout;
        }
        let open = !flags.contains(ObjectFlags::CLOSED);
        let hidden = flags.contains(
            ObjectFlags::OPEN_SIDE_HIDDEN_FROM_LIGHT | ObjectFlags::OPEN_SIDE_HIDDEN_FROM_VIEW,
        );
        let biased = match policy {
            NonClosedBiasPolicy::Never => false,
            NonClosedBiasPolicy::OpenSideVisible => open && !hidden,
            NonClosedBiasPolicy::Always => open,
        };
        if biased {
            DepthVariant::NonClosedBias
        } else {
            DepthVariant::Plain
        }
    }
}

/// One depth draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthDraw {
    pub object: ObjectId,
    pub mesh: MeshHandle,
    pub variant: DepthVariant,
    /// Light view-projection times model transform.
    pub transform: Mat4,
    /// Set for [`DepthVariant::AlphaCutout`].
    pub alpha_threshold: Option<f32>,
}

/// Graphics backend of the depth pass.
pub trait DepthPassBackend {
    /// Capture the state the pass is going to change.
    fn save_state(&mut self) -> RenderStateSnapshot;

    /// Put back a captured state.
    fn restore_state(&mut self, state: RenderStateSnapshot);

    /// Bind `target` with a square viewport, clear depth and prepare for
    /// depth-only draws.
    fn begin_pass(&mut self, target: TargetHandle, resolution: u32, face: Option<CubeFace>);

    fn set_cull(&mut self, cull: CullState);

    fn set_depth(&mut self, depth: DepthState);

    /// Draw and return the number of depth samples written.
    fn draw(&mut self, draw: &DepthDraw) -> u64;

    fn end_pass(&mut self);
}

/// Summary of a shadow map render.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShadowRenderReport {
    /// Cube faces rendered; empty for single maps.
    pub faces_rendered: SegmentMask,
    /// Draws issued per pass, indexed by face (index 0 for single maps).
    pub draws_per_face: [u32; 6],
    pub depth_samples: u64,
}

impl ShadowRenderReport {
    pub fn total_draws(&self) -> u32 {
        self.draws_per_face.iter().sum()
    }

    /// Whether any pass wrote depth.
    pub fn wrote_pixels(&self) -> bool {
        self.depth_samples > 0
    }
}

/// Renders casters into shadow maps.
#[derive(Debug, Clone)]
pub struct ShadowMapRenderer<'a> {
    config: &'a ShadowConfig,
}

impl<'a> ShadowMapRenderer<'a> {
    pub fn new(config: &'a ShadowConfig) -> Self {
        Self { config }
    }

    /// Render all casters of `set` into `target`.
    ///
    /// Cube maps get one pass per rendered face, containing only the
    /// casters touching that face's segment.
    pub fn render(
        &self,
        scene: &Scene,
        set: &CasterSet,
        target: &ShadowMapTarget,
        backend: &mut dyn DepthPassBackend,
    ) -> Result<ShadowRenderReport> {
        let saved = backend.save_state();
        let result = self.render_passes(scene, set, target, backend);
        backend.restore_state(saved);

        if let Ok(report) = &result {
            tracing::debug!(
                light = target.light.0,
                resolution = target.resolution,
                faces = ?report.faces_rendered,
                draws = report.total_draws(),
                "rendered shadow map"
            );
        }
        result
    }

    fn render_passes(
        &self,
        scene: &Scene,
        set: &CasterSet,
        target: &ShadowMapTarget,
        backend: &mut dyn DepthPassBackend,
    ) -> Result<ShadowRenderReport> {
        let mut report = ShadowRenderReport::default();
        match target.targets {
            ShadowTargets::Single(handle) => {
                let view_projection = target
                    .view_projection(None)
                    .ok_or(Error::Invariant("single shadow target without a single transform"))?;
                backend.begin_pass(handle, target.resolution, None);
                let pass = self.draw_casters(scene, set, None, view_projection, backend);
                backend.end_pass();
                let (draws, samples) = pass?;
                report.draws_per_face[0] = draws;
                report.depth_samples += samples;
            }
            ShadowTargets::Cube(handles) => {
                for face in target.faces.faces() {
                    let view_projection = target
                        .view_projection(Some(face))
                        .ok_or(Error::Invariant("rendered cube face without a transform"))?;
                    backend.begin_pass(handles[face.index()], target.resolution, Some(face));
                    let pass = self.draw_casters(scene, set, Some(face), view_projection, backend);
                    backend.end_pass();
                    let (draws, samples) = pass?;
                    report.faces_rendered |= face.mask();
                    report.draws_per_face[face.index()] = draws;
                    report.depth_samples += samples;
                }
            }
        }
        Ok(report)
    }

    fn draw_casters(
        &self,
        scene: &Scene,
        set: &CasterSet,
        face: Option<CubeFace>,
        view_projection: Mat4,
        backend: &mut dyn DepthPassBackend,
    ) -> Result<(u32, u64)> {
        backend.set_cull(CullState::Back);
        backend.set_depth(DepthState::read_write());

        let mut draws = 0;
        let mut samples = 0;
        for entry in &set.casters {
            if let Some(face) = face {
                if !entry.segments.contains(face.mask()) {
                    continue;
                }
            }
            let object = scene.object(entry.object)?;
            let variant = DepthVariant::for_flags(object.flags, self.config.non_closed_policy);

            // Double-sided biased draws must not leak their state into the
            // next caster.
            if variant == DepthVariant::NonClosedBias {
                backend.set_cull(CullState::None);
                backend.set_depth(DepthState::biased(self.config.non_closed_bias));
            }
            samples += backend.draw(&DepthDraw {
                object: object.id,
                mesh: object.mesh,
                variant,
                transform: view_projection * object.transform,
                alpha_threshold: (variant == DepthVariant::AlphaCutout).then_some(self.config.alpha_threshold),
            });
            if variant == DepthVariant::NonClosedBias {
                backend.set_cull(CullState::Back);
                backend.set_depth(DepthState::read_write());
            }
            draws += 1;
        }
        Ok((draws, samples))
    }
}

/// Command recorded by [`RecordingBackend`].
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCommand {
    SaveState,
    RestoreState(RenderStateSnapshot),
    BeginPass {
        target: TargetHandle,
        resolution: u32,
        face: Option<CubeFace>,
    },
    SetCull(CullState),
    SetDepth(DepthState),
    Draw(DepthDraw),
    EndPass,
}

/// Backend that records commands instead of touching a device.
///
/// Used for headless runs and tests.
#[derive(Debug, Clone, Default)]
pub struct RecordingBackend {
    pub commands: Vec<BackendCommand>,
    pub state: RenderStateSnapshot,
    /// Samples reported per draw.
    pub samples_per_draw: u64,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self {
            samples_per_draw: 1,
            ..Default::default()
        }
    }

    /// Draws recorded so far.
    pub fn draws(&self) -> impl Iterator<Item = &DepthDraw> {
        self.commands.iter().filter_map(|c| match c {
            BackendCommand::Draw(draw) => Some(draw),
            _ => None,
        })
    }

    /// Cube faces passes were begun for.
    pub fn faces(&self) -> Vec<Option<CubeFace>> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                BackendCommand::BeginPass { face, .. } => Some(*face),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

impl DepthPassBackend for RecordingBackend {
    fn save_state(&mut self) -> RenderStateSnapshot {
        self.commands.push(BackendCommand::SaveState);
        self.state
    }

    fn restore_state(&mut self, state: RenderStateSnapshot) {
        self.commands.push(BackendCommand::RestoreState(state));
        self.state = state;
    }

    fn begin_pass(&mut self, target: TargetHandle, resolution: u32, face: Option<CubeFace>) {
        self.commands.push(BackendCommand::BeginPass {
            target,
            resolution,
            face,
        });
        self.state.target = Some(target);
        self.state.viewport = (resolution, resolution);
    }

    fn set_cull(&mut self, cull: CullState) {
        self.commands.push(BackendCommand::SetCull(cull));
        self.state.cull = cull;
    }

    fn set_depth(&mut self, depth: DepthState) {
        self.commands.push(BackendCommand::SetDepth(depth));
        self.state.depth = depth;
    }

    fn draw(&mut self, draw: &DepthDraw) -> u64 {
        self.commands.push(BackendCommand::Draw(*draw));
        self.samples_per_draw
    }

    fn end_pass(&mut self) {
        self.commands.push(BackendCommand::EndPass);
    }
}

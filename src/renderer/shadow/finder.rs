//! Caster and receiver search
//!
//! Walks the scene's spatial indices once per light and collects the
//! objects that can throw a visible shadow, the bounds of everything that
//! can receive one and, for point lights, which cube segments need
//! rendering.

use super::{CubeFace, SegmentMask, ShadowConfig};
use crate::error::Result;
use crate::renderer::culling::{ConvexHull, Intersection};
use crate::renderer::geometry::Aabb;
use crate::renderer::light::{Light, LightKind};
use crate::renderer::object::ObjectId;
use crate::renderer::scene::Scene;
use crate::renderer::viewer::View;
use glam::Vec3;

/// A shadow caster and the cube segments it touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CasterEntry {
    pub object: ObjectId,
    /// Always empty for non-point lights.
    pub segments: SegmentMask,
}

/// Everything the projector and depth renderer need for one light.
#[derive(Debug, Clone, PartialEq)]
pub struct CasterSet {
    /// Casters in traversal order: static index first, then dynamic.
    pub casters: Vec<CasterEntry>,
    pub caster_bounds: Aabb,
    /// For local lights, clipped to the light volume's bounds.
    pub receiver_bounds: Aabb,
    /// Union of the casters' segment masks.
    pub segments: SegmentMask,
    /// Smallest per-axis (Chebyshev) distance from a point light to a
    /// caster box, clamped to the configured minimum. Cube faces use it as
    /// their near plane.
    pub segment_depth: f32,
    /// Smallest Euclidean distance from a local light to a caster box.
    pub nearest_caster: f32,
}

impl CasterSet {
    pub fn is_empty(&self) -> bool {
        self.casters.is_empty()
    }

    pub fn caster_ids(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.casters.iter().map(|c| c.object)
    }
}

/// Result of a search.
#[derive(Debug, Clone, PartialEq)]
pub enum FinderOutcome {
    /// Nothing visible is lit; the light can be skipped.
    NoReceivers,
    /// Receivers exist but nothing shadows them.
    NoCasters { receiver_bounds: Aabb },
    /// Shadow casters and receivers were found.
    Casters(CasterSet),
}

impl From<CasterSet> for FinderOutcome {
    fn from(set: CasterSet) -> Self {
        if set.receiver_bounds.is_empty() {
            FinderOutcome::NoReceivers
        } else if set.casters.is_empty() {
            FinderOutcome::NoCasters {
                receiver_bounds: set.receiver_bounds,
            }
        } else {
            FinderOutcome::Casters(set)
        }
    }
}

/// Caster/receiver search over a scene.
#[derive(Debug, Clone)]
pub struct ShadowFinder<'a> {
    config: &'a ShadowConfig,
}

impl<'a> ShadowFinder<'a> {
    pub fn new(config: &'a ShadowConfig) -> Self {
        Self { config }
    }

    /// Classify the scene for `light` as seen from `view`.
    pub fn find(&self, scene: &Scene, light: &Light, view: &View) -> Result<FinderOutcome> {
        self.collect(scene, light, view).map(FinderOutcome::from)
    }

    /// Collect casters and receivers without classifying the result.
    ///
    /// Calling this twice on an unchanged scene yields identical sets.
    pub fn collect(&self, scene: &Scene, light: &Light, view: &View) -> Result<CasterSet> {
        let mut set = CasterSet {
            casters: Vec::new(),
            caster_bounds: Aabb::EMPTY,
            receiver_bounds: Aabb::EMPTY,
            segments: SegmentMask::empty(),
            segment_depth: light.attenuation.far,
            nearest_caster: light.attenuation.far,
        };

        match light.kind {
            LightKind::Directional { direction } => {
                let hull = view.frustum.directional_caster_hull(direction);
                let node_test = |aabb: &Aabb| hull.test_aabb(aabb);
                let object_test = |aabb: &Aabb| hull.intersects_aabb(aabb);
                self.walk(scene, &node_test, light, object_test, |id, aabb, casts, receives| {
                    if casts {
                        set.caster_bounds = set.caster_bounds.union(aabb);
                        set.casters.push(CasterEntry {
                            object: id,
                            segments: SegmentMask::empty(),
                        });
                    }
                    if receives && view.frustum.contains_aabb(aabb) {
                        set.receiver_bounds = set.receiver_bounds.union(aabb);
                    }
                })?;
            }
            LightKind::Point { position }
            | LightKind::Spot { position, .. }
            | LightKind::Beam { position, .. } => {
                let volume = light.volume();
                let hull = view.frustum.point_caster_hull(position);
                let segment_hulls: Option<[ConvexHull; 6]> = matches!(light.kind, LightKind::Point { .. })
                    .then(|| CubeFace::ALL.map(|face| face.segment_hull(position)));
                let node_test = |aabb: &Aabb| {
                    if volume.intersects_aabb(aabb) {
                        hull.test_aabb(aabb)
                    } else {
                        Intersection::Outside
                    }
                };

                let object_test = |aabb: &Aabb| volume.intersects_aabb(aabb);
                self.walk(scene, &node_test, light, object_test, |id, aabb, casts, receives| {
                    if casts && hull.intersects_aabb(aabb) {
                        let segments = segment_hulls
                            .as_ref()
                            .map(|hulls| {
                                CubeFace::ALL
                                    .into_iter()
                                    .filter(|face| hulls[face.index()].intersects_aabb(aabb))
                                    .fold(SegmentMask::empty(), |mask, face| mask | face.mask())
                            })
                            .unwrap_or_default();
                        set.segments |= segments;
                        set.segment_depth = set.segment_depth.min(chebyshev_distance(aabb, position));
                        set.nearest_caster = set.nearest_caster.min(aabb.distance_squared(position).sqrt());
                        set.caster_bounds = set.caster_bounds.union(aabb);
                        set.casters.push(CasterEntry { object: id, segments });
                    }
                    if receives && view.frustum.contains_aabb(aabb) {
                        set.receiver_bounds = set.receiver_bounds.union(aabb);
                    }
                })?;

                if let Some(bounds) = volume.aabb() {
                    set.receiver_bounds = set.receiver_bounds.intersection(&bounds);
                }
                set.segment_depth = set.segment_depth.max(self.config.min_segment_depth);
                set.nearest_caster = set.nearest_caster.max(self.config.min_segment_depth);
            }
        }

        tracing::trace!(
            light = light.id.0,
            casters = set.casters.len(),
            segments = ?set.segments,
            "collected shadow casters"
        );
        Ok(set)
    }

    /// Visit every live object passing `object_test` in both indices,
    /// skipping objects attached to a local `light`.
    ///
    /// The visitor gets the object id, its AABB, whether it may cast and
    /// whether it may receive.
    fn walk(
        &self,
        scene: &Scene,
        node_test: &dyn Fn(&Aabb) -> Intersection,
        light: &Light,
        object_test: impl Fn(&Aabb) -> bool,
        mut visit: impl FnMut(ObjectId, &Aabb, bool, bool),
    ) -> Result<()> {
        let local = !matches!(light.kind, LightKind::Directional { .. });
        for (index, mode) in scene.indices() {
            for id in index.traverse(mode, node_test) {
                let object = scene.object(id)?;
                if !object.is_live() || (local && object.attached_light == Some(light.id)) {
                    continue;
                }
                let aabb = object.aabb();
                if !object_test(&aabb) {
                    continue;
                }
                visit(id, &aabb, object.casts_shadows(), !object.is_emission_only());
            }
        }
        Ok(())
    }
}

/// Largest per-axis gap between a point and a box; zero inside.
fn chebyshev_distance(aabb: &Aabb, point: Vec3) -> f32 {
    let gap = (aabb.min - point).max(point - aabb.max).max(Vec3::ZERO);
    gap.max_element()
}

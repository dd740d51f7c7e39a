//! Scene arena
//!
//! Owns objects and lights by index, plus one spatial index for static
//! objects and one for moving objects.

use super::light::{Light, LightId, LightKind};
use super::object::{MeshHandle, ObjectFlags, ObjectId, SceneObject};
use super::geometry::Bounds;
use super::shader::ShaderCache;
use super::spatial::{BoundsTree, SpatialIndex, TraversalMode};
use crate::error::{Error, Result};

/// Objects, lights and their spatial indices.
#[derive(Debug, Default)]
pub struct Scene {
    objects: Vec<SceneObject>,
    lights: Vec<Light>,
    static_index: BoundsTree,
    dynamic_index: BoundsTree,
    indices_dirty: bool,
}

impl Scene {
    /// Create an empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an object and return its id.
    pub fn add_object(&mut self, mesh: MeshHandle, bounds: impl Into<Bounds>, flags: ObjectFlags) -> ObjectId {
        let id = ObjectId(self.objects.len() as u32);
        self.objects.push(SceneObject::new(id, mesh, bounds, flags));
        self.indices_dirty = true;
        id
    }

    /// Add a light built from `kind` and return its id.
    pub fn add_light(&mut self, kind: LightKind) -> LightId {
        let id = LightId(self.lights.len() as u32);
        self.lights.push(Light::new(id, kind));
        id
    }

    /// Insert a fully built light, reassigning its id.
    pub fn insert_light(&mut self, mut light: Light) -> LightId {
        let id = LightId(self.lights.len() as u32);
        light.id = id;
        self.lights.push(light);
        id
    }

    pub fn object(&self, id: ObjectId) -> Result<&SceneObject> {
        self.objects
            .get(id.0 as usize)
            .ok_or(Error::UnknownObject(id))
    }

    /// Mutable access. Marks the spatial indices stale.
    pub fn object_mut(&mut self, id: ObjectId) -> Result<&mut SceneObject> {
        let object = self
            .objects
            .get_mut(id.0 as usize)
            .ok_or(Error::UnknownObject(id))?;
        self.indices_dirty = true;
        Ok(object)
    }

    /// An object's flags and its shader cache, for variant selection.
    /// Leaves the spatial indices alone.
    pub fn shader_cache_mut(&mut self, id: ObjectId) -> Result<(ObjectFlags, &mut ShaderCache)> {
        let object = self
            .objects
            .get_mut(id.0 as usize)
            .ok_or(Error::UnknownObject(id))?;
        Ok((object.flags, &mut object.shader_cache))
    }

    pub fn light(&self, id: LightId) -> Result<&Light> {
        self.lights.get(id.0 as usize).ok_or(Error::UnknownLight(id))
    }

    pub fn light_mut(&mut self, id: LightId) -> Result<&mut Light> {
        self.lights
            .get_mut(id.0 as usize)
            .ok_or(Error::UnknownLight(id))
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    /// Mutable access to every object. Marks the spatial indices stale.
    pub fn objects_mut(&mut self) -> &mut [SceneObject] {
        self.indices_dirty = true;
        &mut self.objects
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    /// Mark the spatial indices stale after moving objects.
    pub fn mark_moved(&mut self) {
        self.indices_dirty = true;
    }

    /// Rebuild both spatial indices if anything changed.
    pub fn rebuild_indices(&mut self) {
        if !self.indices_dirty {
            return;
        }
        let (dynamic, fixed): (Vec<_>, Vec<_>) = self
            .objects
            .iter()
            .map(|o| (o.id, o.aabb(), o.is_dynamic()))
            .partition(|(_, _, dynamic)| *dynamic);
        self.static_index = BoundsTree::build(fixed.into_iter().map(|(id, aabb, _)| (id, aabb)));
        self.dynamic_index = BoundsTree::build(dynamic.into_iter().map(|(id, aabb, _)| (id, aabb)));
        self.indices_dirty = false;
        tracing::debug!(
            static_objects = self.static_index.len(),
            dynamic_objects = self.dynamic_index.len(),
            "rebuilt spatial indices"
        );
    }

    /// The indices to traverse, with the mode each requires.
    ///
    /// The dynamic tree's node bounds go stale between rebuilds, so it is
    /// always walked without bounds checks.
    pub fn indices(&self) -> [(&dyn SpatialIndex, TraversalMode); 2] {
        [
            (&self.static_index, TraversalMode::BoundsChecked),
            (&self.dynamic_index, TraversalMode::Unbounded),
        ]
    }

    pub fn indices_dirty(&self) -> bool {
        self.indices_dirty
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::geometry::Aabb;
    use glam::Vec3;

    #[test]
    fn test_dynamic_objects_use_unbounded_index() {
        let mut scene = Scene::new();
        let bounds = Aabb::new(Vec3::ZERO, Vec3::ONE);
        scene.add_object(MeshHandle(0), bounds, ObjectFlags::empty());
        let moving = scene.add_object(MeshHandle(0), bounds, ObjectFlags::DYNAMIC_POSITION);
        scene.rebuild_indices();
        assert!(!scene.indices_dirty());

        let reject = |_: &Aabb| crate::renderer::culling::Intersection::Outside;
        let [(fixed, fixed_mode), (dynamic, dynamic_mode)] = scene.indices();
        assert_eq!(fixed.traverse(fixed_mode, &reject).count(), 0);
        let found: Vec<_> = dynamic.traverse(dynamic_mode, &reject).collect();
        assert_eq!(found, vec![moving]);
    }

    #[test]
    fn test_moving_through_object_mut_rebuilds_static_index() {
        let mut scene = Scene::new();
        let id = scene.add_object(MeshHandle(0), Aabb::new(Vec3::ZERO, Vec3::ONE), ObjectFlags::empty());
        scene.rebuild_indices();

        scene.shader_cache_mut(id).unwrap();
        assert!(!scene.indices_dirty());

        let moved = Aabb::new(Vec3::splat(10.0), Vec3::splat(11.0));
        scene.object_mut(id).unwrap().bounds = moved.into();
        assert!(scene.indices_dirty());
        scene.rebuild_indices();

        let [(fixed, mode), _] = scene.indices();
        let near_moved = |aabb: &Aabb| {
            if aabb.intersects(&moved) {
                crate::renderer::culling::Intersection::Inside
            } else {
                crate::renderer::culling::Intersection::Outside
            }
        };
        assert_eq!(fixed.traverse(mode, &near_moved).collect::<Vec<_>>(), vec![id]);

        scene.objects_mut();
        assert!(scene.indices_dirty());
    }

    #[test]
    fn test_unknown_ids() {
        let scene = Scene::new();
        assert!(matches!(scene.object(ObjectId(3)), Err(Error::UnknownObject(ObjectId(3)))));
        assert!(matches!(scene.light(LightId(0)), Err(Error::UnknownLight(_))));
    }
}

//! Caster/receiver search checked against brute force.

use glam::Vec3;
use umbra::renderer::light::LightVolume;
use umbra::{
    Aabb, Attenuation, FinderOutcome, Light, LightId, LightKind, MeshHandle, ObjectFlags, Projection, Scene,
    ShadowConfig, ShadowFinder, View, Viewport,
};

fn view() -> View {
    View::look_at(
        Vec3::new(0.0, 12.0, 30.0),
        Vec3::new(0.0, 0.0, -5.0),
        Vec3::Y,
        Projection::perspective(60.0, 0.5, 80.0),
        Viewport::new(1280, 720),
    )
}

/// Objects spread over and beyond the view, with a mix of flags.
fn grid_scene() -> Scene {
    let mut scene = Scene::new();
    let mut i = 0u32;
    for x in (-36..=36).step_by(6) {
        for y in [0, 8, 20] {
            for z in (-60..=36).step_by(8) {
                let half = 0.5 + (i % 4) as f32 * 0.5;
                let mut flags = ObjectFlags::CLOSED;
                if i % 3 != 0 {
                    flags |= ObjectFlags::CASTS_SHADOWS;
                }
                if i % 4 == 0 {
                    flags |= ObjectFlags::DYNAMIC_POSITION;
                }
                if i % 7 == 0 {
                    flags |= ObjectFlags::HIDDEN;
                }
                if i % 11 == 0 {
                    flags |= ObjectFlags::EMISSION_ONLY;
                }
                let center = Vec3::new(x as f32, y as f32, z as f32);
                let id = scene.add_object(
                    MeshHandle(0),
                    Aabb::from_center_half_extents(center, Vec3::splat(half)),
                    flags,
                );
                // Spread attachments over every light, directional ones included.
                if i % 5 == 2 {
                    scene.object_mut(id).unwrap().attached_light = Some(LightId((i / 5) % 5));
                }
                i += 1;
            }
        }
    }
    // A fixture sitting inside each local light, attached to it.
    for light in lights() {
        let Some(position) = light.position() else {
            continue;
        };
        let center = match light.kind {
            LightKind::Spot { axis, .. } | LightKind::Beam { axis, .. } => position + axis.normalize() * 3.0,
            _ => position,
        };
        let id = scene.add_object(
            MeshHandle(1),
            Aabb::from_center_half_extents(center, Vec3::splat(0.5)),
            ObjectFlags::CASTS_SHADOWS | ObjectFlags::CLOSED,
        );
        scene.object_mut(id).unwrap().attached_light = Some(light.id);
    }
    scene.rebuild_indices();
    scene
}

fn lights() -> Vec<Light> {
    vec![
        Light::directional(LightId(0), Vec3::new(0.3, -1.0, 0.2)),
        Light::directional(LightId(1), Vec3::new(1.0, -0.2, 0.0)),
        Light::point(LightId(2), Vec3::new(0.0, 5.0, 0.0), Attenuation::linear(1.0, 25.0)),
        Light::spot(
            LightId(3),
            Vec3::new(-10.0, 15.0, 5.0),
            Vec3::new(0.5, -1.0, -0.3),
            0.6,
            Attenuation::linear(1.0, 40.0),
        ),
        Light::beam(
            LightId(4),
            Vec3::new(20.0, 4.0, -10.0),
            Vec3::new(-1.0, 0.0, 0.1),
            6.0,
            Attenuation::constant(50.0),
        ),
    ]
}

/// Expected casters and receiver bounds, by testing every object.
fn brute_force(scene: &Scene, light: &Light, view: &View) -> (Vec<u32>, Aabb, Aabb) {
    let mut casters = Vec::new();
    let mut caster_bounds = Aabb::EMPTY;
    let mut receiver_bounds = Aabb::EMPTY;
    let volume = light.volume();

    let local = !matches!(light.kind, LightKind::Directional { .. });

    for object in scene.objects() {
        if !object.is_live() || (local && object.attached_light == Some(light.id)) {
            continue;
        }
        let aabb = object.aabb();
        let (relevant, may_cast) = match light.kind {
            LightKind::Directional { direction } => {
                let hull = view.frustum.directional_caster_hull(direction);
                let inside = hull.intersects_aabb(&aabb);
                (inside, inside)
            }
            LightKind::Point { position } | LightKind::Spot { position, .. } | LightKind::Beam { position, .. } => {
                let hull = view.frustum.point_caster_hull(position);
                let inside = volume.intersects_aabb(&aabb);
                (inside, inside && hull.intersects_aabb(&aabb))
            }
        };
        if !relevant {
            continue;
        }
        if may_cast && object.casts_shadows() {
            casters.push(object.id.0);
            caster_bounds = caster_bounds.union(&aabb);
        }
        if !object.is_emission_only() && view.frustum.contains_aabb(&aabb) {
            receiver_bounds = receiver_bounds.union(&aabb);
        }
    }
    if let Some(bounds) = volume.aabb() {
        receiver_bounds = receiver_bounds.intersection(&bounds);
    }
    casters.sort_unstable();
    (casters, caster_bounds, receiver_bounds)
}

#[test]
fn test_no_false_negatives() {
    let scene = grid_scene();
    let view = view();
    let config = ShadowConfig::default();
    let finder = ShadowFinder::new(&config);

    for light in lights() {
        let set = finder.collect(&scene, &light, &view).unwrap();
        let (expected, caster_bounds, receiver_bounds) = brute_force(&scene, &light, &view);

        let mut found: Vec<u32> = set.caster_ids().map(|id| id.0).collect();
        found.sort_unstable();
        assert!(!expected.is_empty(), "light {:?} has no casters to check", light.id);
        assert_eq!(found, expected, "casters of light {:?}", light.id);
        assert_eq!(set.caster_bounds, caster_bounds, "caster bounds of light {:?}", light.id);
        assert_eq!(set.receiver_bounds, receiver_bounds, "receiver bounds of light {:?}", light.id);
    }
}

#[test]
fn test_collection_is_idempotent() {
    let scene = grid_scene();
    let view = view();
    let config = ShadowConfig::default();
    let finder = ShadowFinder::new(&config);

    for light in lights() {
        let first = finder.collect(&scene, &light, &view).unwrap();
        let second = finder.collect(&scene, &light, &view).unwrap();
        assert_eq!(first, second);
    }
}

#[test]
fn test_hidden_objects_never_cast() {
    let scene = grid_scene();
    let view = view();
    let config = ShadowConfig::default();
    let finder = ShadowFinder::new(&config);

    for light in lights() {
        let set = finder.collect(&scene, &light, &view).unwrap();
        for id in set.caster_ids() {
            let object = scene.object(id).unwrap();
            assert!(object.is_live());
            assert!(object.casts_shadows());
        }
    }
}

#[test]
fn test_light_without_visible_receivers_is_skipped() {
    let scene = grid_scene();
    let view = view();
    let config = ShadowConfig::default();
    // Far below every object and outside the view.
    let light = Light::point(LightId(9), Vec3::new(0.0, -500.0, 0.0), Attenuation::linear(1.0, 10.0));
    assert!(matches!(light.volume(), LightVolume::Sphere(_)));

    let outcome = ShadowFinder::new(&config).find(&scene, &light, &view).unwrap();
    assert_eq!(outcome, FinderOutcome::NoReceivers);
}

#[test]
fn test_grid_has_attached_objects_in_range() {
    let scene = grid_scene();
    let view = view();
    for light in lights().into_iter().filter(|l| l.position().is_some()) {
        let volume = light.volume();
        let attached_in_range = scene.objects().iter().any(|o| {
            o.is_live()
                && o.attached_light == Some(light.id)
                && volume.intersects_aabb(&o.aabb())
                && view.frustum.contains_aabb(&o.aabb())
        });
        assert!(attached_in_range, "light {:?} has no attached object to skip", light.id);
    }
}

#[test]
fn test_object_attached_to_local_light_is_skipped() {
    let mut scene = Scene::new();
    let bulb = scene.add_object(
        MeshHandle(0),
        Aabb::from_center_half_extents(Vec3::ZERO, Vec3::splat(0.5)),
        ObjectFlags::CASTS_SHADOWS | ObjectFlags::CLOSED,
    );
    scene.object_mut(bulb).unwrap().attached_light = Some(LightId(0));
    scene.rebuild_indices();
    let config = ShadowConfig::default();
    let view = View::look_at(
        Vec3::new(0.0, 2.0, 10.0),
        Vec3::ZERO,
        Vec3::Y,
        Projection::perspective(60.0, 0.1, 100.0),
        Viewport::new(1280, 720),
    );

    let point = Light::point(LightId(0), Vec3::new(0.0, 2.0, 0.0), Attenuation::linear(0.5, 20.0));
    let outcome = ShadowFinder::new(&config).find(&scene, &point, &view).unwrap();
    assert_eq!(outcome, FinderOutcome::NoReceivers);

    // Another light still sees it.
    let other = Light::point(LightId(1), Vec3::new(0.0, 2.0, 0.0), Attenuation::linear(0.5, 20.0));
    let outcome = ShadowFinder::new(&config).find(&scene, &other, &view).unwrap();
    assert!(matches!(outcome, FinderOutcome::Casters(_)), "{outcome:?}");
}

#[test]
fn test_receivers_without_casters() {
    let mut scene = Scene::new();
    let floor = Aabb::new(Vec3::new(-10.0, -0.1, -10.0), Vec3::new(10.0, 0.0, 10.0));
    scene.add_object(MeshHandle(0), floor, ObjectFlags::CLOSED);
    scene.rebuild_indices();
    let config = ShadowConfig::default();
    let light = Light::directional(LightId(0), Vec3::new(0.0, -1.0, 0.0));

    let outcome = ShadowFinder::new(&config).find(&scene, &light, &view()).unwrap();
    match outcome {
        FinderOutcome::NoCasters { receiver_bounds } => assert_eq!(receiver_bounds, floor),
        other => panic!("expected no casters, got {other:?}"),
    }
}

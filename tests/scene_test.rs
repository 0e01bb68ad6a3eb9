use std::time::Duration;

use cgmath::{Deg, Vector3};
use flow_cube::{
    Primitive, Scene,
    data_structures::scene::CUBE_POSITIONS,
    resources::texture::TEXTURE_SLOTS,
};

use crate::common::test_utils::approx_eq;
mod common;

#[test]
fn added_items_start_at_identity_and_are_opaque() {
    let mut scene = Scene::with_seed(Deg(50.0), 7);
    for i in 0..9 {
        let primitive = Primitive::ALL[i % 3];
        let item = scene.add_item(primitive);
        assert_eq!(item.primitive, primitive);
        assert!(item.instance.is_identity());
        assert_eq!(item.material.color[3], 1.0);
        assert!(item.material.color[..3].iter().all(|c| (0.0..=1.0).contains(c)));
    }
    assert_eq!(scene.len(), 9);
}

#[test]
fn texture_slots_are_handed_out_round_robin() {
    let mut scene = Scene::with_seed(Deg(0.0), 1);
    for _ in 0..10 {
        scene.add_item(Primitive::Cube);
    }
    for (i, item) in scene.items().iter().enumerate() {
        assert_eq!(item.material.texture_slot, Some(i as u32 % TEXTURE_SLOTS));
    }
}

#[test]
fn equal_seeds_give_equal_colours() {
    let mut a = Scene::with_seed(Deg(0.0), 42);
    let mut b = Scene::with_seed(Deg(0.0), 42);
    for _ in 0..5 {
        assert_eq!(
            a.add_item(Primitive::Quad).material.color,
            b.add_item(Primitive::Quad).material.color
        );
    }
}

#[test]
fn update_advances_the_angle_and_places_items() {
    let mut scene = Scene::with_seed(Deg(50.0), 3);
    scene.add_item(Primitive::Cube);
    scene.add_item(Primitive::Triangle);

    scene.update(Duration::from_millis(500));
    scene.update(Duration::from_millis(500));
    assert!(approx_eq(scene.angle().0, 50.0));

    let second = &scene.items()[1];
    assert_eq!(second.instance.position, Vector3::from(CUBE_POSITIONS[1]));
    assert!(!second.instance.is_identity());
    assert_eq!(second.instance.scale, Vector3::new(1.0, 1.0, 1.0));
}

#[test]
fn offsets_continue_past_the_classic_positions() {
    assert_eq!(Scene::slot_offset(9), Vector3::from(CUBE_POSITIONS[9]));

    let first_ring = Scene::slot_offset(10);
    assert!(approx_eq(first_ring.x, 4.0));
    assert!(approx_eq(first_ring.y, 0.0));
    assert!(approx_eq(first_ring.z, -6.0));

    let second_ring = Scene::slot_offset(22);
    assert!(approx_eq(second_ring.x, 6.0));
    assert!(approx_eq(second_ring.z, -9.0));
}

#[test]
fn empty_scene_updates() {
    let mut scene = Scene::with_seed(Deg(90.0), 0);
    scene.update(Duration::from_secs(1));
    assert!(scene.is_empty());
    assert!(approx_eq(scene.angle().0, 90.0));
}

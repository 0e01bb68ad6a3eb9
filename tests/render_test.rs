use cgmath::Deg;
use flow_cube::{
    Primitive, Scene,
    data_structures::instance::Instance,
    render::{Batch, geometry_of, plan_batches},
};

#[test]
fn batches_group_items_by_primitive() {
    let mut scene = Scene::with_seed(Deg(0.0), 5);
    for primitive in [
        Primitive::Cube,
        Primitive::Triangle,
        Primitive::Cube,
        Primitive::Quad,
    ] {
        scene.add_item(primitive);
    }

    let (raw, batches) = plan_batches(scene.items());
    assert_eq!(raw.len(), 4);
    assert_eq!(
        batches,
        vec![
            Batch {
                primitive: Primitive::Triangle,
                instances: 0..1
            },
            Batch {
                primitive: Primitive::Quad,
                instances: 1..2
            },
            Batch {
                primitive: Primitive::Cube,
                instances: 2..4
            },
        ]
    );
    // cubes keep their insertion order
    assert_eq!(raw[2].color, scene.items()[0].material.color);
    assert_eq!(raw[3].color, scene.items()[2].material.color);
    assert_eq!(raw[1].texture_slot, 3);
}

#[test]
fn empty_scene_plans_nothing() {
    let (raw, batches) = plan_batches(&[]);
    assert!(raw.is_empty());
    assert!(batches.is_empty());
}

#[test]
fn untextured_instances_use_negative_slot() {
    let raw = Instance::new().to_raw([1.0; 4], None);
    assert_eq!(raw.texture_slot, -1);
    let identity: [[f32; 4]; 4] = cgmath::Matrix4::from_scale(1.0).into();
    assert_eq!(raw.model, identity);
}

#[test]
fn every_primitive_has_geometry() {
    for primitive in Primitive::ALL {
        assert!(!geometry_of(primitive).is_empty());
    }
}

use cgmath::InnerSpace;
use flow_cube::data_structures::geometry::{Geometry, VertexLayout};

#[test]
fn builtin_primitives() {
    let triangle = Geometry::triangle();
    assert_eq!(triangle.vertex_count(), 3);
    assert_eq!(triangle.indices, None);
    assert_eq!(triangle.triangle_count(), 1);

    let quad = Geometry::quad();
    assert_eq!(quad.vertex_count(), 4);
    assert_eq!(quad.indices, Some(vec![0, 1, 3, 1, 2, 3]));
    assert_eq!(quad.triangle_count(), 2);

    let cube = Geometry::cube();
    assert_eq!(cube.vertex_count(), 36);
    assert_eq!(cube.index_count(), 0);
    assert_eq!(cube.triangle_count(), 12);
}

#[test]
fn absent_attributes_get_defaults() {
    let geometry = Geometry::from_floats(
        &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
        VertexLayout::Position,
        None,
    );
    for vertex in &geometry.vertices {
        assert_eq!(vertex.color, [1.0; 3]);
        assert_eq!(vertex.tex_coords, [0.0; 2]);
        assert_eq!(vertex.normal, [0.0, 0.0, 1.0]);
    }
}

#[test]
fn trailing_floats_are_dropped() {
    let geometry = Geometry::from_floats(&[0.0; 12], VertexLayout::PositionTexCoord, None);
    assert_eq!(geometry.vertex_count(), 2);
}

#[test]
fn empty_input_gives_empty_geometry() {
    let geometry = Geometry::from_floats(&[], VertexLayout::PositionColorTexCoord, None);
    assert!(geometry.is_empty());
    assert_eq!(geometry.triangle_count(), 0);
}

#[test]
fn out_of_range_indices_are_skipped() {
    let geometry = Geometry::from_floats(
        &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
        VertexLayout::Position,
        Some(vec![0, 1, 9]),
    );
    assert!(geometry.vertices.iter().all(|v| v.normal == [0.0; 3]));
}

#[test]
fn cube_normals_are_unit_length() {
    for vertex in Geometry::cube().vertices {
        let normal: cgmath::Vector3<f32> = vertex.normal.into();
        assert!((normal.magnitude() - 1.0).abs() < 1e-5);
    }
}

use flow_cube::resources::{
    shader::{Stage, compile_stage},
    uniform::{UniformBlock, UniformKind, UniformLayout},
};

const UNIFORMS: &str = r#"
struct Params {
    scale: f32,
    enabled: u32,
    tint: vec3<f32>,
    transform: mat4x4<f32>,
    mode: i32,
};
@group(0) @binding(0)
var<uniform> params: Params;
"#;

fn block() -> UniformBlock {
    let module = compile_stage(Stage::Vertex, UNIFORMS).unwrap();
    UniformBlock::new(UniformLayout::reflect(&module, 0, 0).unwrap())
}

#[test]
fn reflects_member_offsets() {
    let block = block();
    let layout = block.layout();
    let offsets: Vec<(&str, UniformKind, u32)> = layout
        .fields()
        .iter()
        .map(|f| (f.name.as_str(), f.kind, f.offset))
        .collect();
    assert_eq!(
        offsets,
        [
            ("scale", UniformKind::Float, 0),
            ("enabled", UniformKind::Uint, 4),
            ("tint", UniformKind::Vec3, 16),
            ("transform", UniformKind::Mat4, 32),
            ("mode", UniformKind::Int, 96),
        ]
    );
    assert_eq!(block.bytes().len() % 16, 0);
    assert!(block.bytes().len() >= layout.size() as usize);
}

#[test]
fn setters_write_by_name() {
    let mut block = block();
    assert!(block.set_float("scale", 2.5));
    assert!(block.set_vec3("tint", [0.1, 0.2, 0.3]));
    assert!(block.set_int("mode", -3));

    assert_eq!(block.field_bytes("scale"), Some(&2.5f32.to_ne_bytes()[..]));
    assert_eq!(
        block.field_bytes("tint"),
        Some(bytemuck::cast_slice::<f32, u8>(&[0.1, 0.2, 0.3]))
    );
    assert_eq!(block.field_bytes("mode"), Some(&(-3i32).to_ne_bytes()[..]));
}

#[test]
fn bools_are_stored_as_integers() {
    let mut block = block();
    assert!(block.set_bool("enabled", true));
    assert_eq!(block.field_bytes("enabled"), Some(&1u32.to_ne_bytes()[..]));
    assert!(block.set_bool("mode", true));
    assert!(block.set_bool("enabled", false));
    assert_eq!(block.field_bytes("enabled"), Some(&0u32.to_ne_bytes()[..]));
    assert!(!block.set_bool("scale", true));
}

#[test]
fn unknown_names_and_wrong_kinds_are_no_ops() {
    let mut block = block();
    let before = block.bytes().to_vec();

    assert!(!block.set_float("missing", 1.0));
    assert!(!block.set_float("tint", 1.0));
    assert!(!block.set_mat4("scale", [[1.0; 4]; 4]));
    assert!(!block.set_uint("mode", 1));

    assert_eq!(block.bytes(), &before[..]);
}

#[test]
fn bare_uniform_is_a_single_field() {
    let module = compile_stage(
        Stage::Fragment,
        "@group(0) @binding(0) var<uniform> strength: f32;",
    )
    .unwrap();
    let layout = UniformLayout::reflect(&module, 0, 0).unwrap();
    assert_eq!(layout.fields().len(), 1);
    assert_eq!(layout.field("strength").map(|f| f.kind), Some(UniformKind::Float));
    assert_eq!(UniformBlock::new(layout).bytes().len(), 16);
}

#[test]
fn missing_block_reflects_to_none() {
    let module = compile_stage(Stage::Fragment, UNIFORMS).unwrap();
    assert!(UniformLayout::reflect(&module, 0, 1).is_none());
}

#![allow(dead_code)]

use std::path::PathBuf;

use flow_cube::{
    data_structures::{
        geometry::{ModelVertex, Vertex},
        instance::InstanceRaw,
    },
    input::{InputState, LookButton},
    resources::shader::ProgramBuild,
};

pub fn assets_dir() -> PathBuf {
    PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/assets"))
}

pub fn read_asset(name: &str) -> String {
    std::fs::read_to_string(assets_dir().join(name)).unwrap()
}

pub fn scene_vertex_layouts() -> [wgpu::VertexBufferLayout<'static>; 2] {
    [ModelVertex::desc(), InstanceRaw::desc()]
}

/// Builds a program from the shipped vertex shader and `fragment`.
pub fn build_with_fragment(fragment: &str) -> ProgramBuild {
    let vertex = read_asset("shaders/scene.vert.wgsl");
    ProgramBuild::from_sources("test", &vertex, fragment, None, &scene_vertex_layouts())
}

/// Input with the look button held and `delta` of pointer motion this frame.
pub fn looking(dx: f32, dy: f32) -> InputState {
    let mut input = InputState::new(LookButton::Right);
    input.look_held = true;
    input.pointer_delta = (dx, dy);
    input
}

pub fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-4
}

#![cfg(feature = "integration-tests")]

use std::path::{Path, PathBuf};

use flow_cube::{
    CubeError, Primitive,
    config::FailurePolicy,
    data_structures::{drawable::Drawable, texture::Texture},
    pipelines::{basic::mk_scene_layouts, mipmap::mip_level_count},
    render::{TextureUnits, geometry_of},
    resources::{
        handle::{ResourceKind, ResourceLedger},
        shader::{ProgramBuild, ShaderProgram},
        texture::{TexelData, load_texture, load_texture_slot},
    },
};
use futures::executor::block_on;

use crate::common::test_utils::{assets_dir, build_with_fragment, read_asset, scene_vertex_layouts};
mod common;

/// A headless device, or `None` when the machine has no usable adapter.
async fn headless() -> Option<(wgpu::Device, wgpu::Queue)> {
    let instance = wgpu::Instance::default();
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::LowPower,
            compatible_surface: None,
            force_fallback_adapter: false,
        })
        .await
        .ok()?;
    adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: Some("test device"),
            ..Default::default()
        })
        .await
        .ok()
}

/// A scratch asset directory holding `files`.
fn scratch_assets(name: &str, files: &[(&str, &[u8])]) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("flow-cube-{}-{}", name, std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    for (file, bytes) in files {
        std::fs::write(dir.join(file), bytes).unwrap();
    }
    dir
}

#[test]
fn resources_are_released_on_drop() {
    let Some((device, queue)) = block_on(headless()) else {
        eprintln!("no adapter available; skipping");
        return;
    };
    let ledger = ResourceLedger::new();
    let layouts = mk_scene_layouts(&device);

    {
        let drawables: Vec<Drawable> = Primitive::ALL
            .iter()
            .filter_map(|p| Drawable::new(&device, &ledger, &format!("{:?}", p), &geometry_of(*p)))
            .collect();
        assert_eq!(drawables.len(), 3);
        // the quad carries an index buffer
        assert_eq!(ledger.live(ResourceKind::Buffer), 4);

        let bytes = std::fs::read(assets_dir().join("textures/grid.png")).unwrap();
        let texels = TexelData::decode(&bytes, true).unwrap();
        let grid = Texture::from_texels(&device, &queue, &ledger, &texels, "grid");
        let units = TextureUnits::new(&device, &queue, &ledger, &layouts.textures, vec![Some(grid)]);
        assert_eq!(units.loaded(), 1);

        let depth = Texture::create_depth_texture(&device, &ledger, [64, 64], "depth");
        assert!(depth.sampler.is_none());

        let build = ProgramBuild::from_sources(
            "scene",
            &read_asset("shaders/scene.vert.wgsl"),
            &read_asset("shaders/scene.frag.wgsl"),
            None,
            &scene_vertex_layouts(),
        );
        let program = block_on(ShaderProgram::link(
            &device,
            &ledger,
            build,
            &layouts.pipeline,
            wgpu::TextureFormat::Rgba8UnormSrgb,
            &scene_vertex_layouts(),
        ));
        assert!(program.is_valid());
        assert_eq!(ledger.live(ResourceKind::Program), 1);
        assert!(ledger.total_live() > 0);
    }

    assert_eq!(ledger.total_live(), 0);
    assert!(ledger.report());
}

#[test]
fn invalid_program_creates_no_pipeline() {
    let Some((device, _queue)) = block_on(headless()) else {
        eprintln!("no adapter available; skipping");
        return;
    };
    let ledger = ResourceLedger::new();
    let layouts = mk_scene_layouts(&device);
    let build = ProgramBuild::from_sources(
        "broken",
        &read_asset("shaders/scene.vert.wgsl"),
        "",
        None,
        &scene_vertex_layouts(),
    );
    let program = block_on(ShaderProgram::link(
        &device,
        &ledger,
        build,
        &layouts.pipeline,
        wgpu::TextureFormat::Rgba8UnormSrgb,
        &scene_vertex_layouts(),
    ));
    assert!(!program.is_valid());
    assert_eq!(ledger.created(ResourceKind::Program), 0);
}

#[test]
fn mismatched_interpolation_is_reported_instead_of_panicking() {
    let Some((device, _queue)) = block_on(headless()) else {
        eprintln!("no adapter available; skipping");
        return;
    };
    let ledger = ResourceLedger::new();
    let layouts = mk_scene_layouts(&device);
    let build = build_with_fragment(
        r#"
struct FragmentInput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) @interpolate(flat) color: vec4<f32>,
};

@fragment
fn fs_main(in: FragmentInput) -> @location(0) vec4<f32> {
    return in.color;
}
"#,
    );
    let program = block_on(ShaderProgram::link(
        &device,
        &ledger,
        build,
        &layouts.pipeline,
        wgpu::TextureFormat::Rgba8UnormSrgb,
        &scene_vertex_layouts(),
    ));
    assert!(!program.is_valid());
    assert!(!program.diagnostics().is_empty());
    assert_eq!(ledger.created(ResourceKind::Program), 0);
}

#[test]
fn pipeline_rejected_by_the_device_becomes_a_diagnostic() {
    let Some((device, _queue)) = block_on(headless()) else {
        eprintln!("no adapter available; skipping");
        return;
    };
    let ledger = ResourceLedger::new();
    let layouts = mk_scene_layouts(&device);
    let build = ProgramBuild::from_sources(
        "depth-target",
        &read_asset("shaders/scene.vert.wgsl"),
        &read_asset("shaders/scene.frag.wgsl"),
        None,
        &scene_vertex_layouts(),
    );
    assert!(!build.has_errors(), "{}", build.report());

    let program = block_on(ShaderProgram::link(
        &device,
        &ledger,
        build,
        &layouts.pipeline,
        Texture::DEPTH_FORMAT,
        &scene_vertex_layouts(),
    ));
    assert!(!program.is_valid());
    assert!(program.diagnostics().iter().any(|d| d.is_error() && d.stage.is_none()));
    assert_eq!(ledger.live(ResourceKind::Program), 0);
}

#[tokio::test]
async fn lenient_slot_stays_empty_and_strict_slot_fails() {
    let Some((device, queue)) = headless().await else {
        eprintln!("no adapter available; skipping");
        return;
    };
    let ledger = ResourceLedger::new();
    let assets = scratch_assets("slots", &[("garbage.png", &b"definitely not an image"[..])]);

    for file in ["missing.png", "garbage.png"] {
        let lenient = load_texture_slot(
            &assets,
            Path::new(file),
            &device,
            &queue,
            &ledger,
            FailurePolicy::Lenient,
        )
        .await;
        assert!(matches!(lenient, Ok(None)), "{}", file);

        let strict = load_texture_slot(
            &assets,
            Path::new(file),
            &device,
            &queue,
            &ledger,
            FailurePolicy::Strict,
        )
        .await;
        match strict {
            Err(CubeError::Texture { path, .. }) => assert_eq!(path, file),
            other => panic!("expected a texture error for {}, got {:?}", file, other),
        }
    }
    assert_eq!(ledger.created(ResourceKind::Texture), 0);

    let loaded = load_texture_slot(
        &assets_dir(),
        Path::new("textures/wall.png"),
        &device,
        &queue,
        &ledger,
        FailurePolicy::Strict,
    )
    .await;
    assert!(matches!(loaded, Ok(Some(_))));
}

#[tokio::test]
async fn oversized_image_is_rejected_before_upload() {
    let Some((device, queue)) = headless().await else {
        eprintln!("no adapter available; skipping");
        return;
    };
    let ledger = ResourceLedger::new();
    let too_wide = device.limits().max_texture_dimension_2d + 1;
    let mut png = Vec::new();
    image::DynamicImage::ImageRgba8(image::RgbaImage::new(too_wide, 1))
        .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
        .unwrap();
    let assets = scratch_assets("oversized", &[("wide.png", png.as_slice())]);

    let err = load_texture(&assets, Path::new("wide.png"), true, &device, &queue, &ledger)
        .await
        .unwrap_err();
    assert!(format!("{:#}", err).contains("at most"), "{:#}", err);
    assert_eq!(ledger.created(ResourceKind::Texture), 0);
}

#[test]
fn empty_slots_sample_the_placeholder() {
    let Some((device, queue)) = block_on(headless()) else {
        eprintln!("no adapter available; skipping");
        return;
    };
    let ledger = ResourceLedger::new();
    let layouts = mk_scene_layouts(&device);
    let units = TextureUnits::new(&device, &queue, &ledger, &layouts.textures, vec![None]);

    assert_eq!(units.loaded(), 0);
    assert!(std::ptr::eq(units.bound(0), units.placeholder()));
    assert!(std::ptr::eq(units.bound(1), units.placeholder()));
    let placeholder = &units.placeholder().texture;
    assert_eq!((placeholder.width(), placeholder.height()), (1, 1));
}

#[test]
fn uploaded_textures_carry_a_full_mip_chain() {
    let Some((device, queue)) = block_on(headless()) else {
        eprintln!("no adapter available; skipping");
        return;
    };
    let ledger = ResourceLedger::new();
    let bytes = std::fs::read(assets_dir().join("textures/wall.png")).unwrap();
    let texels = TexelData::decode(&bytes, true).unwrap();
    let wall = Texture::from_texels(&device, &queue, &ledger, &texels, "wall");

    let expected = mip_level_count(texels.width, texels.height);
    assert!(expected > 1);
    assert_eq!(wall.texture.mip_level_count(), expected);
    device.poll(wgpu::PollType::wait_indefinitely()).unwrap();
}

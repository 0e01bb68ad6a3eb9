use std::time::Duration;

use cgmath::{Deg, InnerSpace};
use flow_cube::{
    camera::{Camera, CameraController, PITCH_LIMIT, Projection},
    config::CameraConfig,
    input::{InputState, LookButton},
};
use winit::{dpi::PhysicalPosition, event::MouseScrollDelta};

use crate::common::test_utils::{approx_eq, looking};
mod common;

fn start() -> (Camera, CameraController) {
    let config = CameraConfig::default();
    (config.camera(), config.controller())
}

#[test]
fn yaw_accumulates_pointer_motion() {
    let (mut camera, controller) = start();
    let input = looking(10.0, 0.0);
    for _ in 0..50 {
        controller.update(&mut camera, &input, Duration::ZERO);
    }
    // 50 frames * 10 units * 0.1 degrees per unit
    assert!(approx_eq(camera.yaw.0, -90.0 + 50.0));
    assert!(approx_eq(camera.pitch.0, 0.0));
}

#[test]
fn yaw_is_never_wrapped() {
    let (mut camera, controller) = start();
    let input = looking(1000.0, 0.0);
    for _ in 0..10 {
        controller.update(&mut camera, &input, Duration::ZERO);
    }
    assert!(approx_eq(camera.yaw.0, -90.0 + 1000.0));
}

#[test]
fn pitch_is_clamped() {
    let (mut camera, controller) = start();
    controller.update(&mut camera, &looking(0.0, -10_000.0), Duration::ZERO);
    assert_eq!(camera.pitch, PITCH_LIMIT);

    controller.update(&mut camera, &looking(0.0, 10_000.0), Duration::ZERO);
    assert_eq!(camera.pitch, -PITCH_LIMIT);
}

#[test]
fn constructed_pitch_is_clamped() {
    let camera = Camera::new((0.0, 0.0, 0.0), Deg(-90.0), Deg(-200.0), Deg(45.0));
    assert_eq!(camera.pitch, -PITCH_LIMIT);
    assert!(camera.forward().y > -1.0);
}

#[test]
fn pointer_motion_without_look_button_is_ignored() {
    let (mut camera, controller) = start();
    let mut input = InputState::new(LookButton::Right);
    input.handle_mouse_motion(30.0, 30.0);
    assert_eq!(input.pointer_delta, (0.0, 0.0));

    input.pointer_delta = (30.0, 30.0);
    controller.update(&mut camera, &input, Duration::ZERO);
    assert_eq!(camera.yaw, Deg(-90.0));
}

#[test]
fn scroll_zooms_within_limits() {
    let (mut camera, controller) = start();
    let mut input = InputState::new(LookButton::Right);

    input.scroll = 10.0;
    controller.update(&mut camera, &input, Duration::ZERO);
    assert!(approx_eq(camera.fovy.0, 35.0));

    input.scroll = 100.0;
    controller.update(&mut camera, &input, Duration::ZERO);
    assert_eq!(camera.fovy, controller.fov_min);

    input.scroll = -100.0;
    controller.update(&mut camera, &input, Duration::ZERO);
    assert_eq!(camera.fovy, controller.fov_max);
}

#[test]
fn pixel_scroll_is_converted_to_lines() {
    let mut input = InputState::new(LookButton::Right);
    input.handle_scroll(&MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, 40.0)));
    assert!(approx_eq(input.scroll, 2.0));
    input.handle_scroll(&MouseScrollDelta::LineDelta(0.0, -1.0));
    assert!(approx_eq(input.scroll, 1.0));
}

#[test]
fn movement_scales_with_delta_time() {
    let (mut camera, controller) = start();
    let mut input = InputState::new(LookButton::Right);
    input.forward = true;

    controller.update(&mut camera, &input, Duration::from_secs(1));
    // default camera sits at z = 3 looking down -z at 2.5 units per second
    assert!(approx_eq(camera.position.x, 0.0));
    assert!(approx_eq(camera.position.y, 0.0));
    assert!(approx_eq(camera.position.z, 0.5));

    input.forward = false;
    input.up = true;
    controller.update(&mut camera, &input, Duration::from_millis(400));
    assert!(approx_eq(camera.position.y, 1.0));
}

#[test]
fn default_camera_looks_down_negative_z() {
    let (camera, _) = start();
    let forward = camera.forward();
    assert!(approx_eq(forward.z, -1.0));
    assert!(approx_eq(camera.right().x, 1.0));
    assert!(approx_eq(camera.up().magnitude(), 1.0));
}

#[test]
fn projection_ignores_zero_size() {
    let mut projection = Projection::new(800, 600, 0.1, 100.0);
    projection.resize(0, 0);
    assert!(approx_eq(projection.aspect(), 800.0 / 600.0));
    projection.resize(1000, 500);
    assert!(approx_eq(projection.aspect(), 2.0));
}

//! Fly camera: state, projection and the controller that applies input.

use cgmath::{Deg, InnerSpace, Matrix4, Point3, Vector3, Vector4, perspective};
use instant::Duration;

use crate::input::InputState;

/// cgmath builds OpenGL clip space (z in [-1, 1]); wgpu expects z in [0, 1].
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::from_cols(
    Vector4::new(1.0, 0.0, 0.0, 0.0),
    Vector4::new(0.0, 1.0, 0.0, 0.0),
    Vector4::new(0.0, 0.0, 0.5, 0.0),
    Vector4::new(0.0, 0.0, 0.5, 1.0),
);

/// Pitch never reaches straight up or down, where the view flips.
pub const PITCH_LIMIT: Deg<f32> = Deg(89.0);

pub fn world_up() -> Vector3<f32> {
    Vector3::unit_y()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Point3<f32>,
    /// Rotation around the world up axis. `-90°` looks down `-z`. Never wrapped.
    pub yaw: Deg<f32>,
    pub pitch: Deg<f32>,
    /// Vertical field of view.
    pub fovy: Deg<f32>,
}

impl Camera {
    /// `pitch` is limited to [`PITCH_LIMIT`].
    pub fn new<P: Into<Point3<f32>>>(position: P, yaw: Deg<f32>, pitch: Deg<f32>, fovy: Deg<f32>) -> Self {
        Self {
            position: position.into(),
            yaw,
            pitch: Deg(pitch.0.clamp(-PITCH_LIMIT.0, PITCH_LIMIT.0)),
            fovy,
        }
    }

    pub fn forward(&self) -> Vector3<f32> {
        let (sin_yaw, cos_yaw) = cgmath::Rad::from(self.yaw).0.sin_cos();
        let (sin_pitch, cos_pitch) = cgmath::Rad::from(self.pitch).0.sin_cos();
        Vector3::new(cos_yaw * cos_pitch, sin_pitch, sin_yaw * cos_pitch).normalize()
    }

    pub fn right(&self) -> Vector3<f32> {
        self.forward().cross(world_up()).normalize()
    }

    pub fn up(&self) -> Vector3<f32> {
        self.right().cross(self.forward()).normalize()
    }

    pub fn calc_view(&self) -> Matrix4<f32> {
        Matrix4::look_to_rh(self.position, self.forward(), world_up())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    aspect: f32,
    znear: f32,
    zfar: f32,
}

impl Projection {
    pub fn new(width: u32, height: u32, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width.max(1) as f32 / height.max(1) as f32,
            znear,
            zfar,
        }
    }

    /// Ignores zero sizes (minimized window).
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn calc_matrix(&self, fovy: Deg<f32>) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * perspective(fovy, self.aspect, self.znear, self.zfar)
    }
}

/// Applies an [`InputState`] to a [`Camera`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraController {
    /// Units per second.
    pub speed: f32,
    /// Degrees per pointer unit.
    pub sensitivity: f32,
    /// World units per pointer unit when panning.
    pub pan_speed: f32,
    pub fov_min: Deg<f32>,
    pub fov_max: Deg<f32>,
}

impl CameraController {
    pub fn new(speed: f32, sensitivity: f32) -> Self {
        Self {
            speed,
            sensitivity,
            pan_speed: 0.01,
            fov_min: Deg(1.0),
            fov_max: Deg(45.0),
        }
    }

    pub fn update(&self, camera: &mut Camera, input: &InputState, dt: Duration) {
        if input.scroll != 0.0 {
            camera.fovy = Deg((camera.fovy.0 - input.scroll).max(self.fov_min.0).min(self.fov_max.0));
        }

        let (dx, dy) = input.pointer_delta;
        if input.look_held && (dx != 0.0 || dy != 0.0) {
            if input.pan_modifier {
                let offset = camera.right() * (-dx * self.pan_speed) + camera.up() * (dy * self.pan_speed);
                camera.position += offset;
            } else {
                camera.yaw += Deg(dx * self.sensitivity);
                // screen y grows downwards
                let pitch = camera.pitch.0 - dy * self.sensitivity;
                camera.pitch = Deg(pitch.clamp(-PITCH_LIMIT.0, PITCH_LIMIT.0));
            }
        }

        let step = self.speed * dt.as_secs_f32();
        let forward = camera.forward();
        let right = camera.right();
        let mut direction = Vector3::new(0.0, 0.0, 0.0);
        if input.forward {
            direction += forward;
        }
        if input.backward {
            direction -= forward;
        }
        if input.right {
            direction += right;
        }
        if input.left {
            direction -= right;
        }
        if input.up {
            direction += world_up();
        }
        if input.down {
            direction -= world_up();
        }
        camera.position += direction * step;
    }
}

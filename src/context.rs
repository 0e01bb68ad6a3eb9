use std::sync::Arc;

use winit::window::Window;

use crate::{
    camera::{Camera, CameraController, Projection},
    config::EngineConfig,
    data_structures::texture,
    errors::{CubeError, Result},
    input::InputState,
    resources::handle::ResourceLedger,
};

/// The window, the GPU objects that render into it and the camera looking
/// through it.
///
/// Field order is drop order: the depth texture goes before the device.
#[derive(Debug)]
pub struct Context {
    pub depth_texture: texture::Texture,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub adapter_info: wgpu::AdapterInfo,
    pub camera: Camera,
    pub projection: Projection,
    pub controller: CameraController,
    pub input: InputState,
    pub clear_colour: wgpu::Color,
    pub ledger: ResourceLedger,
    pub(crate) window: Arc<Window>,
}

impl Context {
    pub async fn new(window: Arc<Window>, engine: &EngineConfig) -> Result<Self> {
        let size = window.inner_size();

        log::info!("WGPU setup");
        let instance = wgpu::Instance::default();
        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;
        let adapter_info = adapter.get_info();
        log::info!(
            "Renderer: {} ({:?}, driver {} {})",
            adapter_info.name,
            adapter_info.backend,
            adapter_info.driver,
            adapter_info.driver_info
        );

        log::info!("device and queue");
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("flow-cube device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
                ..Default::default()
            })
            .await?;

        log::info!("Surface");
        let surface_caps = surface.get_capabilities(&adapter);
        // The shaders output linear colour and rely on an sRGB surface for the encode.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or(CubeError::UnsupportedSurface)?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: if engine.window.vsync {
                wgpu::PresentMode::AutoVsync
            } else {
                wgpu::PresentMode::AutoNoVsync
            },
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let ledger = ResourceLedger::new();
        let depth_texture = texture::Texture::create_depth_texture(
            &device,
            &ledger,
            [config.width, config.height],
            "depth_texture",
        );

        let camera = engine.camera.camera();
        let projection = Projection::new(
            config.width,
            config.height,
            engine.camera.znear,
            engine.camera.zfar,
        );

        Ok(Self {
            depth_texture,
            surface,
            device,
            queue,
            config,
            adapter_info,
            camera,
            projection,
            controller: engine.camera.controller(),
            input: InputState::new(engine.camera.look_button),
            clear_colour: engine.wgpu_clear_colour(),
            ledger,
            window,
        })
    }

    /// Reconfigures the surface and depth buffer. Zero sizes (minimized) are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.config.width = width;
            self.config.height = height;
            self.projection.resize(width, height);
            self.surface.configure(&self.device, &self.config);
            self.depth_texture = texture::Texture::create_depth_texture(
                &self.device,
                &self.ledger,
                [width, height],
                "depth_texture",
            );
            log::debug!("resized to {}x{}", width, height);
        }
    }

    pub fn window(&self) -> &Window {
        &self.window
    }
}

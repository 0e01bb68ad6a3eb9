//! GPU textures and texture creation utilities.
//!
//! [`Texture`] owns its GPU texture and (optional) sampler through
//! [`GpuHandle`]s: it can be moved but never cloned, and dropping it frees both
//! exactly once.

use crate::{
    pipelines::mipmap,
    resources::{
        handle::{GpuHandle, ResourceLedger},
        texture::{TexelData, TexelFormat},
    },
};

/// A GPU texture with a view and optional sampler.
#[derive(Debug)]
pub struct Texture {
    pub view: wgpu::TextureView,
    pub sampler: Option<GpuHandle<wgpu::Sampler>>,
    // Declared after the view so the view is dropped first.
    pub texture: GpuHandle<wgpu::Texture>,
}

impl Texture {
    /// Standard depth buffer texture format (32-bit float).
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    /// Create a depth texture for depth-testing during rendering.
    ///
    /// * `size` is [width, height] of the texture in pixels; zero is clamped to one
    /// * `label` is used as a debug label for the GPU resource
    pub fn create_depth_texture(
        device: &wgpu::Device,
        ledger: &ResourceLedger,
        size: [u32; 2],
        label: &str,
    ) -> Self {
        let size = wgpu::Extent3d {
            width: size[0].max(1),
            height: size[1].max(1),
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[Self::DEPTH_FORMAT],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            view,
            sampler: None,
            texture: ledger.track(texture),
        }
    }

    /// Uploads decoded texels into a new sampled texture with a full mip chain.
    pub fn from_texels(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        ledger: &ResourceLedger,
        texels: &TexelData,
        label: &str,
    ) -> Self {
        let size = wgpu::Extent3d {
            width: texels.width,
            height: texels.height,
            depth_or_array_layers: 1,
        };
        let format = texels.format.wgpu_format();
        let mip_count = mipmap::mip_level_count(texels.width, texels.height);
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: mip_count,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_DST
                | wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                aspect: wgpu::TextureAspect::All,
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
            },
            &texels.pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(texels.format.bytes_per_pixel() * texels.width),
                rows_per_image: Some(texels.height),
            },
            size,
        );
        mipmap::generate_mipmaps(device, queue, &texture, format, mip_count);

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = create_default_sampler(device, ledger);
        Self {
            view,
            sampler: Some(sampler),
            texture: ledger.track(texture),
        }
    }

    /// 1×1 opaque white, bound in slots whose image failed to load.
    pub fn placeholder(device: &wgpu::Device, queue: &wgpu::Queue, ledger: &ResourceLedger) -> Self {
        let texels = TexelData {
            width: 1,
            height: 1,
            format: TexelFormat::Rgba8Srgb,
            pixels: vec![255, 255, 255, 255],
        };
        Self::from_texels(device, queue, ledger, &texels, "placeholder texture")
    }
}

pub fn create_default_sampler(
    device: &wgpu::Device,
    ledger: &ResourceLedger,
) -> GpuHandle<wgpu::Sampler> {
    ledger.track(device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("default sampler"),
        address_mode_u: wgpu::AddressMode::Repeat,
        address_mode_v: wgpu::AddressMode::Repeat,
        address_mode_w: wgpu::AddressMode::Repeat,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::MipmapFilterMode::Linear,
        ..Default::default()
    }))
}

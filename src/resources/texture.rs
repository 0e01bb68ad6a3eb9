use std::path::Path;

use image::DynamicImage;

use crate::{
    config::FailurePolicy,
    data_structures::texture::Texture,
    errors::{CubeError, Result},
    resources::{handle::ResourceLedger, load_binary},
};

/// Number of texture slots every object can sample from.
pub const TEXTURE_SLOTS: u32 = 4;

/// GPU pixel format chosen from the decoded channel count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TexelFormat {
    /// Single channel.
    R8,
    /// Four channels, sRGB colour.
    Rgba8Srgb,
}

impl TexelFormat {
    pub fn wgpu_format(self) -> wgpu::TextureFormat {
        match self {
            TexelFormat::R8 => wgpu::TextureFormat::R8Unorm,
            TexelFormat::Rgba8Srgb => wgpu::TextureFormat::Rgba8UnormSrgb,
        }
    }

    pub fn bytes_per_pixel(self) -> u32 {
        match self {
            TexelFormat::R8 => 1,
            TexelFormat::Rgba8Srgb => 4,
        }
    }
}

/// Decoded pixels ready for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TexelData {
    pub width: u32,
    pub height: u32,
    pub format: TexelFormat,
    pub pixels: Vec<u8>,
}

impl TexelData {
    /// Picks the format by channel count: 1 is kept as a single channel, 3 and
    /// 4 become RGBA, anything else falls back to RGBA with a warning.
    pub fn from_image(img: &DynamicImage, flip_vertically: bool) -> Self {
        let flipped;
        let img = if flip_vertically {
            flipped = img.flipv();
            &flipped
        } else {
            img
        };
        let (width, height) = (img.width(), img.height());
        match img.color().channel_count() {
            1 => Self {
                width,
                height,
                format: TexelFormat::R8,
                pixels: img.to_luma8().into_raw(),
            },
            3 | 4 => Self {
                width,
                height,
                format: TexelFormat::Rgba8Srgb,
                pixels: img.to_rgba8().into_raw(),
            },
            channels => {
                log::warn!(
                    "texture has {} channels, which has no matching format; falling back to RGBA",
                    channels
                );
                Self {
                    width,
                    height,
                    format: TexelFormat::Rgba8Srgb,
                    pixels: img.to_rgba8().into_raw(),
                }
            }
        }
    }

    /// Fails unless both sides are within `1..=max_dimension`.
    pub fn check_size(&self, max_dimension: u32) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.width > 0 && self.height > 0,
            "image is empty ({}x{})",
            self.width,
            self.height
        );
        anyhow::ensure!(
            self.width <= max_dimension && self.height <= max_dimension,
            "image is {}x{}, the device allows at most {} pixels per side",
            self.width,
            self.height,
            max_dimension
        );
        Ok(())
    }

    /// Decodes JPEG or PNG file contents.
    pub fn decode(bytes: &[u8], flip_vertically: bool) -> anyhow::Result<Self> {
        let img = image::load_from_memory(bytes)?;
        Ok(Self::from_image(&img, flip_vertically))
    }
}

/// Layout of the texture group: one 2D texture per slot, then the sampler.
pub fn texture_set_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    let mut entries: Vec<wgpu::BindGroupLayoutEntry> = (0..TEXTURE_SLOTS)
        .map(|binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                multisampled: false,
                view_dimension: wgpu::TextureViewDimension::D2,
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
            },
            count: None,
        })
        .collect();
    entries.push(wgpu::BindGroupLayoutEntry {
        binding: TEXTURE_SLOTS,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    });
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &entries,
        label: Some("texture_set_layout"),
    })
}

pub async fn load_texture(
    assets_dir: &Path,
    file_name: &Path,
    flip_vertically: bool,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    ledger: &ResourceLedger,
) -> anyhow::Result<Texture> {
    let data = load_binary(assets_dir, file_name).await?;
    let texels = TexelData::decode(&data, flip_vertically)?;
    texels.check_size(device.limits().max_texture_dimension_2d)?;
    log::info!(
        "loaded texture {} ({}x{}, {:?})",
        file_name.display(),
        texels.width,
        texels.height,
        texels.format
    );
    Ok(Texture::from_texels(
        device,
        queue,
        ledger,
        &texels,
        &file_name.to_string_lossy(),
    ))
}

/// Loads one texture slot under `policy`.
///
/// A failure leaves the slot empty (`Ok(None)`) when lenient, and is an error
/// when strict.
pub async fn load_texture_slot(
    assets_dir: &Path,
    file_name: &Path,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    ledger: &ResourceLedger,
    policy: FailurePolicy,
) -> Result<Option<Texture>> {
    match load_texture(assets_dir, file_name, true, device, queue, ledger).await {
        Ok(texture) => Ok(Some(texture)),
        Err(e) => match policy {
            FailurePolicy::Lenient => {
                log::error!(
                    "Failed to load texture {}: {:#}. The slot stays blank.",
                    file_name.display(),
                    e
                );
                Ok(None)
            }
            FailurePolicy::Strict => Err(CubeError::Texture {
                path: file_name.display().to_string(),
                reason: format!("{:#}", e),
            }),
        },
    }
}

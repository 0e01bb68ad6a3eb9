use flow_cube::{
    pipelines::mipmap::mip_level_count,
    resources::texture::{TexelData, TexelFormat},
};
use image::{DynamicImage, GrayAlphaImage, GrayImage, Rgba, RgbaImage};

use crate::common::test_utils::assets_dir;
mod common;

#[test]
fn single_channel_images_stay_single_channel() {
    let img = DynamicImage::ImageLuma8(GrayImage::from_raw(2, 1, vec![10, 200]).unwrap());
    let texels = TexelData::from_image(&img, false);
    assert_eq!(texels.format, TexelFormat::R8);
    assert_eq!(texels.pixels, vec![10, 200]);
    assert_eq!(texels.format.bytes_per_pixel(), 1);
}

#[test]
fn two_channel_images_fall_back_to_rgba() {
    let img = DynamicImage::ImageLumaA8(GrayAlphaImage::new(3, 2));
    let texels = TexelData::from_image(&img, false);
    assert_eq!(texels.format, TexelFormat::Rgba8Srgb);
    assert_eq!(texels.pixels.len(), 3 * 2 * 4);
}

#[test]
fn flipping_swaps_rows() {
    let mut img = RgbaImage::new(1, 2);
    img.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
    img.put_pixel(0, 1, Rgba([0, 0, 255, 255]));
    let img = DynamicImage::ImageRgba8(img);

    let upright = TexelData::from_image(&img, false);
    assert_eq!(&upright.pixels[..4], &[255, 0, 0, 255]);

    let flipped = TexelData::from_image(&img, true);
    assert_eq!(&flipped.pixels[..4], &[0, 0, 255, 255]);
    assert_eq!((flipped.width, flipped.height), (1, 2));
}

#[test]
fn shipped_textures_decode() {
    for (name, format) in [
        ("textures/wall.png", TexelFormat::Rgba8Srgb),
        ("textures/balls.png", TexelFormat::Rgba8Srgb),
        ("textures/face.png", TexelFormat::Rgba8Srgb),
        ("textures/grid.png", TexelFormat::R8),
    ] {
        let bytes = std::fs::read(assets_dir().join(name)).unwrap();
        let texels = TexelData::decode(&bytes, true).unwrap();
        assert_eq!(texels.format, format, "{}", name);
        assert_eq!(
            texels.pixels.len() as u32,
            texels.width * texels.height * format.bytes_per_pixel()
        );
    }
}

#[test]
fn garbage_does_not_decode() {
    assert!(TexelData::decode(b"definitely not an image", false).is_err());
}

#[test]
fn size_check_rejects_empty_and_oversized_images() {
    let texels = |width, height| TexelData {
        width,
        height,
        format: TexelFormat::Rgba8Srgb,
        pixels: vec![0; (width * height * 4) as usize],
    };
    assert!(texels(64, 64).check_size(8192).is_ok());
    assert!(texels(8192, 1).check_size(8192).is_ok());

    let err = texels(8193, 1).check_size(8192).unwrap_err();
    assert!(err.to_string().contains("at most 8192"), "{}", err);
    assert!(texels(1, 9000).check_size(8192).is_err());

    let err = texels(0, 0).check_size(8192).unwrap_err();
    assert!(err.to_string().contains("empty"), "{}", err);
    assert!(texels(16, 0).check_size(8192).is_err());
}

#[test]
fn mip_chains_run_down_to_one_pixel() {
    assert_eq!(mip_level_count(1, 1), 1);
    assert_eq!(mip_level_count(2, 1), 2);
    assert_eq!(mip_level_count(64, 64), 7);
    assert_eq!(mip_level_count(640, 480), 10);
    assert_eq!(mip_level_count(8193, 1), 14);
    assert_eq!(mip_level_count(0, 0), 1);
}

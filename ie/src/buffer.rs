//! Image primitives and utilities.
//!
//! A scan receives one [`PixelBuffer`] per call and never keeps it afterwards.
//! Internally the buffer is a plain `image::RgbImage` so it can be handed to
//! `imageproc` without copying; RGBA and grayscale captures are converted on
//! construction.

use anyhow::{Context, Result};
use image::{GrayImage, Luma, RgbImage};

use crate::ScanError;

/// Owned RGB camera frame (no alpha).
#[derive(Clone, Debug)]
pub struct PixelBuffer {
    rgb: RgbImage,
}

impl PixelBuffer {
    /// Build a buffer from tightly packed RGB bytes (`width * height * 3`).
    pub fn from_rgb(width: u32, height: u32, bytes: &[u8]) -> Result<Self, ScanError> {
        check_len(width, height, 3, bytes)?;
        let rgb = RgbImage::from_raw(width, height, bytes.to_vec())
            .ok_or_else(|| invalid(width, height, 3, bytes))?;
        Ok(Self { rgb })
    }

    /// Build a buffer from tightly packed RGBA bytes (alpha is discarded).
    pub fn from_rgba(width: u32, height: u32, bytes: &[u8]) -> Result<Self, ScanError> {
        check_len(width, height, 4, bytes)?;
        let data = bytes
            .chunks_exact(4)
            .flat_map(|v| [v[0], v[1], v[2]])
            .collect::<Vec<_>>();
        let rgb = RgbImage::from_raw(width, height, data)
            .ok_or_else(|| invalid(width, height, 4, bytes))?;
        Ok(Self { rgb })
    }

    /// Build a buffer from single-channel bytes (each sample repeated into RGB).
    pub fn from_luma(width: u32, height: u32, bytes: &[u8]) -> Result<Self, ScanError> {
        check_len(width, height, 1, bytes)?;
        let data = bytes.iter().flat_map(|&v| [v, v, v]).collect::<Vec<_>>();
        let rgb = RgbImage::from_raw(width, height, data)
            .ok_or_else(|| invalid(width, height, 1, bytes))?;
        Ok(Self { rgb })
    }

    pub fn from_dynamic(image: image::DynamicImage) -> Self {
        Self { rgb: image.into_rgb8() }
    }

    #[inline(always)]
    pub fn width(&self) -> u32 {
        self.rgb.width()
    }

    #[inline(always)]
    pub fn height(&self) -> u32 {
        self.rgb.height()
    }

    pub fn as_rgb(&self) -> &RgbImage {
        &self.rgb
    }

    /// Rotate 90 degrees clockwise (for cameras mounted on their side).
    pub fn rotated_90(&self) -> Self {
        Self {
            rgb: image::imageops::rotate90(&self.rgb),
        }
    }

    /// Convert to a grayscale `GrayImage` (luma).
    pub fn to_gray_image(&self) -> GrayImage {
        to_gray(&self.rgb)
    }
}

impl From<RgbImage> for PixelBuffer {
    fn from(rgb: RgbImage) -> Self {
        Self { rgb }
    }
}

fn check_len(width: u32, height: u32, channels: u32, bytes: &[u8]) -> Result<(), ScanError> {
    let expected = width as usize * height as usize * channels as usize;
    if width == 0 || height == 0 || bytes.len() != expected {
        return Err(invalid(width, height, channels, bytes));
    }
    Ok(())
}

fn invalid(width: u32, height: u32, channels: u32, bytes: &[u8]) -> ScanError {
    ScanError::InvalidBuffer {
        width,
        height,
        channels,
        len: bytes.len(),
    }
}

/// Luma conversion shared by the detector and the region extractor.
pub fn to_gray(rgb: &RgbImage) -> GrayImage {
    let (w, h) = rgb.dimensions();
    let mut out = GrayImage::new(w, h);
    for (x, y, p) in rgb.enumerate_pixels() {
        let [r, g, b] = p.0;
        out.put_pixel(x, y, Luma([Color::new(r, g, b).luma()]));
    }
    out
}

/// Upscale a grayscale crop so it is at least `min_height` tall (preserving aspect ratio).
///
/// OCR generally performs better on larger glyphs. Crops that are already tall
/// enough are returned unchanged. Uses `fast_image_resize` (SIMD-optimized).
pub fn upscale_to_height(gray: &GrayImage, min_height: u32) -> Result<GrayImage> {
    let (src_w, src_h) = gray.dimensions();
    if src_h >= min_height || src_w == 0 || src_h == 0 {
        return Ok(gray.clone());
    }

    let height = min_height.max(1);
    let width = ((src_w as u64 * height as u64) / src_h as u64).max(1) as u32;

    let src = fast_image_resize::images::ImageRef::new(
        src_w,
        src_h,
        gray.as_raw(),
        fast_image_resize::PixelType::U8,
    )
    .context("fast_image_resize: ImageRef::new failed")?;

    let mut dst = fast_image_resize::images::Image::new(width, height, fast_image_resize::PixelType::U8);

    let mut resizer = fast_image_resize::Resizer::new();
    let options = fast_image_resize::ResizeOptions::new().resize_alg(
        fast_image_resize::ResizeAlg::Interpolation(fast_image_resize::FilterType::CatmullRom),
    );

    resizer
        .resize(&src, &mut dst, Some(&options))
        .context("fast_image_resize: resize failed")?;

    GrayImage::from_raw(width, height, dst.into_vec()).context("GrayImage::from_raw failed")
}

// ----------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[repr(C)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Compute luma (grayscale intensity, Rec.601 weights).
    pub fn luma(&self) -> u8 {
        let r = self.r as u32;
        let g = self.g as u32;
        let b = self.b as u32;
        ((299 * r + 587 * g + 114 * b) / 1000) as u8
    }
}

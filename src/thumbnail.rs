//! Framebuffer preview thumbnails.

use anyhow::{bail, Context, Result};
use image::imageops::{self, FilterType};
use image::RgbaImage;

use crate::record::FrameBufferPayload;

/// Scales a framebuffer snapshot to a preview image.
pub trait ThumbnailScaler {
    fn scale(&self, payload: &FrameBufferPayload, width: u32, height: u32) -> Result<RgbaImage>;
}

/// Scales RGBA8 framebuffers with the `image` crate.
///
/// The result fits inside the requested box with the source aspect ratio
/// kept, and is flipped so the top row comes first.
#[derive(Clone, Copy, Debug)]
pub struct ImageThumbnailer {
    filter: FilterType,
}

impl Default for ImageThumbnailer {
    fn default() -> Self {
        Self {
            filter: FilterType::Triangle,
        }
    }
}

impl ImageThumbnailer {
    pub fn with_filter(filter: FilterType) -> Self {
        Self { filter }
    }
}

impl ThumbnailScaler for ImageThumbnailer {
    fn scale(&self, payload: &FrameBufferPayload, width: u32, height: u32) -> Result<RgbaImage> {
        if payload.width == 0 || payload.height == 0 {
            bail!("empty framebuffer");
        }
        if width == 0 || height == 0 {
            bail!("thumbnail size must be non-zero, got {width}x{height}");
        }
        if payload.pixels.len() as u64 != payload.expected_len() {
            bail!(
                "framebuffer {}x{} needs {} bytes, payload has {}",
                payload.width,
                payload.height,
                payload.expected_len(),
                payload.pixels.len()
            );
        }

        let image = RgbaImage::from_raw(payload.width, payload.height, payload.pixels.clone())
            .context("framebuffer does not form an RGBA image")?;
        let image = imageops::flip_vertical(&image);

        let (w, h) = fit_within(payload.width, payload.height, width, height);
        Ok(imageops::resize(&image, w, h, self.filter))
    }
}

/// Largest size with the aspect ratio of `src_w`x`src_h` that fits in
/// `max_w`x`max_h`, never smaller than 1x1.
fn fit_within(src_w: u32, src_h: u32, max_w: u32, max_h: u32) -> (u32, u32) {
    let scale = f64::min(max_w as f64 / src_w as f64, max_h as f64 / src_h as f64);
    let w = ((src_w as f64 * scale).round() as u32).clamp(1, max_w);
    let h = ((src_h as f64 * scale).round() as u32).clamp(1, max_h);
    (w, h)
}

use std::sync::Arc;

use anyhow::Context as _;

use crate::foundation::error::{CardError, CardResult};
use crate::foundation::math::Fnv1a64;

/// Identity of one uploaded portrait. Every upload gets a fresh id, even for identical bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PortraitId(pub(crate) u64);

impl PortraitId {
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// Largest portrait edge the CPU backend can turn into a pixmap.
pub const MAX_PORTRAIT_EDGE: u32 = u16::MAX as u32;

/// Decoded portrait bitmap in straight (non-premultiplied) RGBA8.
#[derive(Clone, Debug)]
pub struct PortraitImage {
    pub id: PortraitId,
    pub width: u32,
    pub height: u32,
    pub pixels: Arc<image::RgbaImage>,
}

impl PortraitImage {
    /// Wrap an already decoded bitmap. `sequence` distinguishes repeated uploads.
    pub fn from_rgba(pixels: image::RgbaImage, sequence: u64) -> CardResult<Self> {
        let (width, height) = pixels.dimensions();
        if width == 0 || height == 0 {
            return Err(CardError::decode("image has zero width or height"));
        }
        if width > MAX_PORTRAIT_EDGE || height > MAX_PORTRAIT_EDGE {
            return Err(CardError::decode(format!(
                "image {width}x{height} exceeds {MAX_PORTRAIT_EDGE} px per edge"
            )));
        }

        let mut h = Fnv1a64::new_default();
        h.write_u64(sequence);
        h.write_u64(u64::from(width));
        h.write_u64(u64::from(height));
        h.write_bytes(pixels.as_raw());

        Ok(Self {
            id: PortraitId(h.finish()),
            width,
            height,
            pixels: Arc::new(pixels),
        })
    }

    /// Pixel bytes converted to premultiplied RGBA8, row-major.
    pub fn rgba8_premul(&self) -> Vec<u8> {
        let mut bytes = self.pixels.as_raw().clone();
        premultiply_rgba8_in_place(&mut bytes);
        bytes
    }
}

/// Decode encoded image bytes (any format the `image` crate understands).
pub fn decode_portrait(bytes: &[u8], sequence: u64) -> CardResult<PortraitImage> {
    let dyn_img = image::load_from_memory(bytes)
        .context("decode image from memory")
        .map_err(|e| CardError::decode(format!("{e:#}")))?;
    PortraitImage::from_rgba(dyn_img.to_rgba8(), sequence)
}

pub(crate) fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;

pub mod blur;
pub mod compile;
pub mod composite;
pub mod cpu;
pub mod noise;
pub mod passes;
pub mod plan;
pub mod renderer;

use crate::foundation::error::{CardError, CardResult};

/// Read-back pixels of a rendered surface.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRgba {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub premultiplied: bool,
}

impl FrameRgba {
    /// RGBA8 at `(x, y)` in the stored representation.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y * self.width + x) as usize) * 4;
        self.data.get(i..i + 4).map(|p| [p[0], p[1], p[2], p[3]])
    }

    pub fn is_blank(&self) -> bool {
        self.data.chunks_exact(4).all(|p| p[3] == 0)
    }

    /// Straight-alpha copy, as image encoders expect.
    pub fn to_rgba_image(&self) -> CardResult<image::RgbaImage> {
        let mut data = self.data.clone();
        if self.premultiplied {
            unpremultiply_rgba8_in_place(&mut data);
        }
        image::RgbaImage::from_raw(self.width, self.height, data)
            .ok_or_else(|| CardError::render("frame buffer does not match its dimensions"))
    }
}

fn unpremultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 0 || a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = ((u16::from(*c) * 255 + a / 2) / a).min(255) as u8;
        }
    }
}

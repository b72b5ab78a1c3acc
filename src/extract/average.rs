use image::imageops::FilterType;

use crate::color::model::{ColorRgb, NEUTRAL_GRAY};

/// Side of the square thumbnail the average is taken from.
pub const SAMPLE_SIZE: u32 = 100;
/// Only every n-th thumbnail pixel contributes.
pub const PIXEL_STRIDE: usize = 4;

/// Approximate dominant color: floor of the channel means over every 4th pixel of a
/// 100x100 stretched thumbnail. Cost does not depend on the source resolution beyond the
/// single resize.
pub fn average_color(img: &image::RgbaImage) -> ColorRgb {
    if img.width() == 0 || img.height() == 0 {
        return NEUTRAL_GRAY;
    }
    let thumb = image::imageops::resize(img, SAMPLE_SIZE, SAMPLE_SIZE, FilterType::Triangle);

    let (mut r, mut g, mut b, mut n) = (0u64, 0u64, 0u64, 0u64);
    for px in thumb.pixels().step_by(PIXEL_STRIDE) {
        r += u64::from(px[0]);
        g += u64::from(px[1]);
        b += u64::from(px[2]);
        n += 1;
    }
    if n == 0 {
        return NEUTRAL_GRAY;
    }
    ColorRgb::new((r / n) as u8, (g / n) as u8, (b / n) as u8)
}

#[cfg(test)]
#[path = "../../tests/unit/extract/average.rs"]
mod tests;

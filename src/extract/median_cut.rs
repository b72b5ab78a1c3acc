use crate::color::model::ColorRgb;
use crate::foundation::error::{CardError, CardResult};

/// Clustering capability producing a small, roughly dominance-ranked palette.
pub trait PaletteExtractor {
    fn extract(&self, img: &image::RgbaImage, max_colors: usize) -> CardResult<Vec<ColorRgb>>;
}

/// Pixels with lower alpha are ignored.
pub const MIN_ALPHA: u8 = 125;
/// Pixels with all channels above this are treated as background white.
pub const WHITE_CUTOFF: u8 = 250;
/// Upper bound on sampled pixels, whatever the source resolution.
pub const MAX_SAMPLES: usize = 65_536;

/// Median-cut quantizer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MedianCut {
    /// Sample every `quality`-th pixel (1 = every pixel).
    pub quality: usize,
}

impl Default for MedianCut {
    fn default() -> Self {
        Self { quality: 10 }
    }
}

impl PaletteExtractor for MedianCut {
    fn extract(&self, img: &image::RgbaImage, max_colors: usize) -> CardResult<Vec<ColorRgb>> {
        if max_colors == 0 {
            return Ok(Vec::new());
        }
        let samples = self.sample(img);
        if samples.is_empty() {
            return Err(CardError::extraction("image has no usable opaque pixels"));
        }

        let mut boxes = vec![ColorBox::new(samples)];
        while boxes.len() < max_colors {
            let Some(idx) = boxes
                .iter()
                .enumerate()
                .filter(|(_, b)| b.splittable())
                .max_by_key(|(i, b)| (b.pixels.len(), std::cmp::Reverse(*i)))
                .map(|(i, _)| i)
            else {
                break;
            };
            let (a, b) = boxes.swap_remove(idx).split();
            boxes.push(a);
            boxes.push(b);
        }

        boxes.sort_by(|a, b| b.pixels.len().cmp(&a.pixels.len()));
        let mut palette: Vec<ColorRgb> = Vec::with_capacity(boxes.len());
        for b in &boxes {
            let c = b.mean();
            if !palette.contains(&c) {
                palette.push(c);
            }
        }
        Ok(palette)
    }
}

impl MedianCut {
    fn sample(&self, img: &image::RgbaImage) -> Vec<[u8; 3]> {
        let total = (img.width() as usize) * (img.height() as usize);
        let step = self.quality.max(1).max(total.div_ceil(MAX_SAMPLES));
        img.pixels()
            .step_by(step)
            .filter(|px| px[3] >= MIN_ALPHA)
            .filter(|px| !(px[0] > WHITE_CUTOFF && px[1] > WHITE_CUTOFF && px[2] > WHITE_CUTOFF))
            .map(|px| [px[0], px[1], px[2]])
            .collect()
    }
}

struct ColorBox {
    pixels: Vec<[u8; 3]>,
}

impl ColorBox {
    fn new(pixels: Vec<[u8; 3]>) -> Self {
        Self { pixels }
    }

    /// `(channel, range)` of the widest channel.
    fn widest(&self) -> (usize, u8) {
        let mut best = (0, 0);
        for c in 0..3 {
            let (lo, hi) = self
                .pixels
                .iter()
                .fold((u8::MAX, u8::MIN), |(lo, hi), p| (lo.min(p[c]), hi.max(p[c])));
            let range = hi.saturating_sub(lo);
            if range > best.1 {
                best = (c, range);
            }
        }
        best
    }

    fn splittable(&self) -> bool {
        self.pixels.len() > 1 && self.widest().1 > 0
    }

    /// Split at the median of the widest channel.
    fn split(mut self) -> (ColorBox, ColorBox) {
        let (channel, _) = self.widest();
        self.pixels.sort_unstable_by_key(|p| p[channel]);
        let mid = self.pixels.len() / 2;
        let upper = self.pixels.split_off(mid);
        (self, ColorBox::new(upper))
    }

    fn mean(&self) -> ColorRgb {
        let n = self.pixels.len().max(1) as u64;
        let mut sum = [0u64; 3];
        for p in &self.pixels {
            for c in 0..3 {
                sum[c] += u64::from(p[c]);
            }
        }
        ColorRgb::new((sum[0] / n) as u8, (sum[1] / n) as u8, (sum[2] / n) as u8)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/extract/median_cut.rs"]
mod tests;

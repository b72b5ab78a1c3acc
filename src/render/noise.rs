use crate::foundation::math::SplitMix64;

pub const NOISE_TILE_SIZE: u32 = 256;
pub const NOISE_ALPHA: u8 = 10;
pub const NOISE_MIN_LUMA: u8 = 240;

/// Seed used when the configuration does not override it.
pub const DEFAULT_NOISE_SEED: u64 = 0x6361_7264_6672_616d;

/// Square grain texture: one gray value per texel, uniform alpha.
///
/// Built once per renderer and never mutated afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NoiseTile {
    size: u32,
    luma: Vec<u8>,
    alpha: u8,
}

impl NoiseTile {
    pub fn generate(seed: u64) -> Self {
        let size = NOISE_TILE_SIZE;
        let mut rng = SplitMix64::new(seed);
        let span = u32::from(u8::MAX - NOISE_MIN_LUMA) + 1;
        let luma = (0..size * size)
            .map(|_| NOISE_MIN_LUMA + rng.below(span) as u8)
            .collect();
        Self {
            size,
            luma,
            alpha: NOISE_ALPHA,
        }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn alpha(&self) -> u8 {
        self.alpha
    }

    /// Texel for device pixel `(x, y)`; the tile repeats in both directions.
    pub fn luma_at(&self, x: u32, y: u32) -> u8 {
        let (tx, ty) = (x % self.size, y % self.size);
        self.luma[(ty * self.size + tx) as usize]
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/noise.rs"]
mod tests;

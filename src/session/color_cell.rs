use crate::color::model::{ColorRgb, NEUTRAL_GRAY};

/// Who wrote the current dominant color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColorSource {
    #[default]
    Default,
    Extracted,
    Swatch,
    Custom,
    Restored,
}

/// Single owner of the dominant color. Writers race freely; the last `set` wins.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DominantColorCell {
    color: ColorRgb,
    source: ColorSource,
    writes: u64,
}

impl Default for DominantColorCell {
    fn default() -> Self {
        Self {
            color: NEUTRAL_GRAY,
            source: ColorSource::Default,
            writes: 0,
        }
    }
}

impl DominantColorCell {
    pub fn get(&self) -> ColorRgb {
        self.color
    }

    pub fn source(&self) -> ColorSource {
        self.source
    }

    /// Number of writes so far, including resets.
    pub fn writes(&self) -> u64 {
        self.writes
    }

    pub fn set(&mut self, color: ColorRgb, source: ColorSource) {
        tracing::trace!(color = %color.to_hex(), ?source, "dominant color set");
        self.color = color;
        self.source = source;
        self.writes += 1;
    }

    /// Back to neutral gray.
    pub fn reset(&mut self) {
        self.set(NEUTRAL_GRAY, ColorSource::Default);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/color_cell.rs"]
mod tests;

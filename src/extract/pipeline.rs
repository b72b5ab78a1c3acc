use crate::assets::decode::{PortraitId, PortraitImage};
use crate::color::model::{ColorRgb, NEUTRAL_GRAY};
use crate::extract::average::average_color;
use crate::extract::median_cut::PaletteExtractor;
use crate::foundation::error::CardError;

/// Default number of palette entries.
pub const DEFAULT_PALETTE_SIZE: usize = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExtractionStage {
    /// Clustering; its first entry becomes the dominant color.
    Palette,
    /// Thumbnail average; runs after a successful palette stage.
    Average,
}

/// One deferred unit of color analysis for a specific portrait.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExtractionJob {
    pub portrait: PortraitId,
    pub stage: ExtractionStage,
}

#[derive(Debug)]
pub enum StageOutcome {
    /// Palette found. `dominant` is entry 0 (gray for an empty palette).
    Palette {
        palette: Vec<ColorRgb>,
        dominant: ColorRgb,
    },
    /// Clustering failed; the average was computed in its place.
    PaletteFailed { error: CardError, average: ColorRgb },
    Average { color: ColorRgb },
}

impl StageOutcome {
    /// Color the stage wants to make dominant.
    pub fn dominant(&self) -> ColorRgb {
        match self {
            StageOutcome::Palette { dominant, .. } => *dominant,
            StageOutcome::PaletteFailed { average, .. } => *average,
            StageOutcome::Average { color } => *color,
        }
    }

    /// Whether the averaging stage still has to be queued.
    pub fn needs_average(&self) -> bool {
        matches!(self, StageOutcome::Palette { .. })
    }
}

/// Run one stage against `portrait`.
pub fn run_stage(
    stage: ExtractionStage,
    portrait: &PortraitImage,
    extractor: &dyn PaletteExtractor,
    palette_size: usize,
) -> StageOutcome {
    let palette_size = palette_size.min(DEFAULT_PALETTE_SIZE);
    match stage {
        ExtractionStage::Palette => match extractor.extract(&portrait.pixels, palette_size) {
            Ok(mut palette) => {
                palette.truncate(palette_size);
                let dominant = palette.first().copied().unwrap_or(NEUTRAL_GRAY);
                StageOutcome::Palette { palette, dominant }
            }
            Err(error) => {
                tracing::warn!(error = %error, "palette extraction failed, falling back to average");
                StageOutcome::PaletteFailed {
                    error,
                    average: average_color(&portrait.pixels),
                }
            }
        },
        ExtractionStage::Average => StageOutcome::Average {
            color: average_color(&portrait.pixels),
        },
    }
}

#[cfg(test)]
#[path = "../../tests/unit/extract/pipeline.rs"]
mod tests;

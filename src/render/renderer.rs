use std::cell::OnceCell;

use crate::assets::decode::PortraitImage;
use crate::assets::fonts::FontSet;
use crate::card::inputs::CardInputs;
use crate::color::model::ColorRgb;
use crate::foundation::core::RenderScale;
use crate::foundation::error::CardResult;
use crate::render::FrameRgba;
use crate::render::compile::{CardScene, PortraitRef, compile_card};
use crate::render::cpu::CpuBackend;
use crate::render::noise::NoiseTile;
use crate::render::passes::{RenderResources, execute_plan};

/// Renderer context: owns the CPU backend and the lazily generated noise tile.
pub struct CardRenderer {
    backend: CpuBackend,
    noise_seed: u64,
    noise: OnceCell<NoiseTile>,
}

impl CardRenderer {
    pub fn new(fonts: FontSet, noise_seed: u64) -> Self {
        Self {
            backend: CpuBackend::new(fonts),
            noise_seed,
            noise: OnceCell::new(),
        }
    }

    /// The grain texture, generated on first use.
    pub fn noise(&self) -> &NoiseTile {
        self.noise
            .get_or_init(|| NoiseTile::generate(self.noise_seed))
    }

    pub fn noise_ready(&self) -> bool {
        self.noise.get().is_some()
    }

    pub fn fonts(&self) -> &FontSet {
        self.backend.fonts()
    }

    /// Draw the card at `scale`. `phase` is the animation time in seconds.
    pub fn render(
        &mut self,
        inputs: &CardInputs,
        base_color: ColorRgb,
        portrait: Option<&PortraitImage>,
        scale: RenderScale,
        phase: f64,
    ) -> CardResult<FrameRgba> {
        let scene = CardScene {
            inputs,
            base_color,
            portrait: portrait.map(|p| PortraitRef {
                id: p.id,
                width: p.width,
                height: p.height,
            }),
        };
        let plan = compile_card(&scene, scale, phase);

        let seed = self.noise_seed;
        let noise = self.noise.get_or_init(|| NoiseTile::generate(seed));
        let res = RenderResources { noise, portrait };
        let frame = execute_plan(&mut self.backend, &plan, &res)?;
        tracing::debug!(
            width = frame.width,
            height = frame.height,
            passes = plan.passes.len(),
            "card rendered"
        );
        Ok(frame)
    }
}

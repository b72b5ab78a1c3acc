use std::time::Instant;

use crate::assets::decode::{PortraitId, PortraitImage, decode_portrait};
use crate::assets::fonts::FontSet;
use crate::card::inputs::{CardInputs, LengthWarnings};
use crate::color::model::ColorRgb;
use crate::config::CardConfig;
use crate::export::ExportArtifact;
use crate::extract::idle::IdleQueue;
use crate::extract::median_cut::{MedianCut, PaletteExtractor};
use crate::extract::pipeline::{ExtractionJob, ExtractionStage, StageOutcome, run_stage};
use crate::foundation::core::RenderScale;
use crate::foundation::error::{CardError, CardResult};
use crate::persist::{PersistedState, StateStore};
use crate::render::FrameRgba;
use crate::render::renderer::CardRenderer;
use crate::schedule::scheduler::{RedrawTicket, RenderScheduler, Urgency};
use crate::session::color_cell::{ColorSource, DominantColorCell};

pub const STATUS_ANALYZING: &str = "Analyzing image...";
pub const STATUS_PICK_FROM_PALETTE: &str = "Pick a dominant color from the palette below.";
pub const STATUS_PALETTE_FAILED: &str = "Palette analysis failed, using average color.";
pub const STATUS_DECODE_FAILED: &str = "Error loading image.";
pub const STATUS_NO_IMAGE: &str = "No image uploaded. Default color will be used.";

/// What one [`CardSession::pump`] call did.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PumpReport {
    /// The preview redraw that ran, if any.
    pub redraw: Option<RedrawTicket>,
    /// The extraction stage that ran, if any.
    pub extraction: Option<ExtractionStage>,
    /// Queued jobs discarded because their portrait is gone.
    pub stale_dropped: usize,
}

impl PumpReport {
    pub fn is_noop(&self) -> bool {
        self.redraw.is_none() && self.extraction.is_none() && self.stale_dropped == 0
    }
}

/// One editable card: inputs, portrait, color state, redraw scheduling and background color
/// analysis. Single-threaded; the host drives it by calling [`CardSession::pump`] at or after
/// [`CardSession::next_wake`].
pub struct CardSession {
    config: CardConfig,
    inputs: CardInputs,
    portrait: Option<PortraitImage>,
    uploads: u64,
    palette: Vec<ColorRgb>,
    selected: usize,
    dominant: DominantColorCell,
    custom_hex: String,
    status: String,
    host_busy: bool,

    scheduler: RenderScheduler,
    idle: IdleQueue<ExtractionJob>,
    extractor: Box<dyn PaletteExtractor>,
    renderer: CardRenderer,
    preview: Option<FrameRgba>,
    store: Option<Box<dyn StateStore>>,
}

impl std::fmt::Debug for CardSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardSession")
            .field("inputs", &self.inputs)
            .field("portrait", &self.portrait.as_ref().map(|p| p.id))
            .field("palette", &self.palette)
            .field("dominant", &self.dominant)
            .field("status", &self.status)
            .field("scheduler", &self.scheduler.state())
            .field("pending_extractions", &self.idle.len())
            .finish_non_exhaustive()
    }
}

impl CardSession {
    /// Build a session. The first preview redraw is scheduled right away.
    pub fn new(config: CardConfig, fonts: FontSet, now: Instant) -> CardResult<Self> {
        config.validate()?;
        let mut scheduler = RenderScheduler::with_timings(
            now,
            config.preview_scale()?,
            config.policy(),
            config.timings(),
        );
        scheduler.invalidate(now, Urgency::Immediate);
        let dominant = DominantColorCell::default();
        Ok(Self {
            inputs: CardInputs::default(),
            portrait: None,
            uploads: 0,
            palette: Vec::new(),
            selected: 0,
            custom_hex: dominant.get().to_hex(),
            dominant,
            status: String::new(),
            host_busy: false,
            scheduler,
            idle: IdleQueue::new(config.idle_deadline()),
            extractor: Box::new(MedianCut::default()),
            renderer: CardRenderer::new(fonts, config.noise_seed),
            preview: None,
            store: None,
            config,
        })
    }

    /// [`CardSession::new`] with fonts resolved from the config.
    pub fn from_config(config: CardConfig, now: Instant) -> CardResult<Self> {
        let fonts = FontSet::resolve(&config.fonts);
        Self::new(config, fonts, now)
    }

    pub fn with_extractor(mut self, extractor: Box<dyn PaletteExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Save to `store` after every change that the user would expect to survive a reload.
    pub fn with_store(mut self, store: Box<dyn StateStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn config(&self) -> &CardConfig {
        &self.config
    }

    pub fn inputs(&self) -> &CardInputs {
        &self.inputs
    }

    pub fn portrait(&self) -> Option<&PortraitImage> {
        self.portrait.as_ref()
    }

    pub fn palette(&self) -> &[ColorRgb] {
        &self.palette
    }

    pub fn selected_swatch(&self) -> usize {
        self.selected
    }

    pub fn dominant(&self) -> ColorRgb {
        self.dominant.get()
    }

    pub fn color_source(&self) -> ColorSource {
        self.dominant.source()
    }

    /// Mirror of the custom-color text field.
    pub fn custom_color_hex(&self) -> &str {
        &self.custom_hex
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn scheduler(&self) -> &RenderScheduler {
        &self.scheduler
    }

    pub fn pending_extractions(&self) -> usize {
        self.idle.len()
    }

    /// Last preview frame drawn by [`CardSession::pump`].
    pub fn preview(&self) -> Option<&FrameRgba> {
        self.preview.as_ref()
    }

    pub fn renderer(&self) -> &CardRenderer {
        &self.renderer
    }

    pub fn length_warnings(&self) -> LengthWarnings {
        self.inputs.length_warnings()
    }

    /// While busy, queued extraction waits for its deadline.
    pub fn set_host_busy(&mut self, busy: bool) {
        self.host_busy = busy;
    }

    pub fn set_character_name(&mut self, name: impl Into<String>, now: Instant) {
        self.inputs.character_name = name.into();
        self.changed(now, Urgency::Coalesce);
    }

    pub fn set_series_title(&mut self, title: impl Into<String>, now: Instant) {
        self.inputs.series_title = title.into();
        self.changed(now, Urgency::Coalesce);
    }

    pub fn set_print_number(&mut self, number: impl Into<String>, now: Instant) {
        self.inputs.print_number = number.into();
        self.changed(now, Urgency::Coalesce);
    }

    pub fn set_show_image(&mut self, show: bool, now: Instant) {
        self.inputs.show_image = show;
        self.changed(now, Urgency::Immediate);
    }

    /// Decode and install a new portrait, then queue color analysis for it.
    ///
    /// Decode failures are absorbed: the portrait is cleared, the color goes back to gray and
    /// the status says so. Returns the new portrait's id on success.
    #[tracing::instrument(level = "debug", skip(self, bytes), fields(len = bytes.len()))]
    pub fn upload_image(&mut self, bytes: &[u8], now: Instant) -> Option<PortraitId> {
        self.uploads += 1;
        self.status = STATUS_ANALYZING.to_string();
        self.palette.clear();
        self.selected = 0;

        match decode_portrait(bytes, self.uploads) {
            Ok(portrait) => {
                let id = portrait.id;
                tracing::info!(
                    width = portrait.width,
                    height = portrait.height,
                    "portrait decoded"
                );
                self.portrait = Some(portrait);
                self.idle.push(
                    ExtractionJob {
                        portrait: id,
                        stage: ExtractionStage::Palette,
                    },
                    now,
                );
                self.scheduler.invalidate(now, Urgency::Immediate);
                Some(id)
            }
            Err(error) => {
                tracing::warn!(error = %error, "portrait decode failed");
                self.portrait = None;
                self.dominant.reset();
                self.status = STATUS_DECODE_FAILED.to_string();
                self.scheduler.invalidate(now, Urgency::Immediate);
                None
            }
        }
    }

    /// The upload field was emptied: no portrait, default color.
    pub fn clear_portrait(&mut self, now: Instant) {
        self.portrait = None;
        self.palette.clear();
        self.selected = 0;
        self.dominant.reset();
        self.status = STATUS_NO_IMAGE.to_string();
        self.scheduler.invalidate(now, Urgency::Immediate);
    }

    pub fn select_swatch(&mut self, index: usize, now: Instant) -> CardResult<()> {
        let color = *self.palette.get(index).ok_or_else(|| {
            CardError::validation(format!(
                "swatch index {index} out of range (palette has {})",
                self.palette.len()
            ))
        })?;
        self.selected = index;
        self.dominant.set(color, ColorSource::Swatch);
        self.status = format!("Selected color: {}", color.describe());
        self.custom_hex = color.to_hex();
        self.changed(now, Urgency::Immediate);
        Ok(())
    }

    /// Apply a typed hex color. Malformed input fails soft to neutral gray.
    pub fn set_custom_color(&mut self, hex: &str, now: Instant) {
        let color = ColorRgb::from_hex(hex);
        self.dominant.set(color, ColorSource::Custom);
        self.status = format!("Custom color: {}", color.describe());
        self.custom_hex = hex.to_string();
        self.changed(now, Urgency::Immediate);
    }

    /// Reset text, portrait, palette, color and status.
    pub fn clear_card(&mut self, now: Instant) {
        let show_image = self.inputs.show_image;
        self.inputs = CardInputs {
            show_image,
            ..CardInputs::default()
        };
        self.portrait = None;
        self.palette.clear();
        self.selected = 0;
        self.dominant.reset();
        self.status.clear();
        self.changed(now, Urgency::Immediate);
    }

    /// Change the preview scale.
    pub fn resize(&mut self, scale: f64, now: Instant) -> CardResult<()> {
        let scale = RenderScale::new(scale)?;
        self.scheduler.set_scale(scale);
        self.scheduler.invalidate(now, Urgency::Immediate);
        Ok(())
    }

    /// Run a due preview redraw, then at most one queued extraction stage.
    ///
    /// The host counts as idle for extraction purposes when this call did not redraw and
    /// [`CardSession::set_host_busy`] is off.
    pub fn pump(&mut self, now: Instant) -> CardResult<PumpReport> {
        let mut report = PumpReport::default();

        if let Some(ticket) = self.scheduler.poll(now) {
            let drawn = self.redraw(ticket);
            self.scheduler.complete(now);
            self.preview = Some(drawn?);
            report.redraw = Some(ticket);
        }

        let host_idle = report.redraw.is_none() && !self.host_busy;
        while let Some(task) = self.idle.take_ready(now, host_idle) {
            let job = task.job;
            let Some(portrait) = self
                .portrait
                .as_ref()
                .filter(|p| p.id == job.portrait)
            else {
                report.stale_dropped += 1;
                continue;
            };
            let outcome = run_stage(
                job.stage,
                portrait,
                self.extractor.as_ref(),
                self.config.palette_size,
            );
            self.apply_outcome(job, outcome, now);
            report.extraction = Some(job.stage);
            break;
        }

        Ok(report)
    }

    /// Earliest instant at which [`CardSession::pump`] has work to do.
    pub fn next_wake(&self, now: Instant) -> Option<Instant> {
        let idle = if self.idle.is_empty() {
            None
        } else if self.host_busy {
            self.idle.next_deadline()
        } else {
            Some(now)
        };
        match (self.scheduler.next_deadline(), idle) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Draw the current state at `scale`, outside the preview cadence.
    pub fn render_card(&mut self, scale: RenderScale) -> CardResult<FrameRgba> {
        self.render_at(scale, 0.0)
    }

    /// Render at the export scale, encode, and schedule the preview restore.
    #[tracing::instrument(level = "debug", skip(self, now))]
    pub fn export(&mut self, now: Instant) -> CardResult<ExportArtifact> {
        let scale = self.config.export_scale()?;
        let phase = self.scheduler.phase_at(now);
        let frame = self.render_at(scale, phase);
        // The preview must come back even when the export failed.
        self.scheduler.schedule_restore(now);
        let artifact = ExportArtifact::encode(&frame?, &self.inputs.character_name, scale)?;
        tracing::info!(
            filename = %artifact.filename,
            width = artifact.width,
            height = artifact.height,
            "export ready"
        );
        Ok(artifact)
    }

    pub fn snapshot(&self) -> PersistedState {
        PersistedState::capture(&self.inputs, &self.custom_hex, self.dominant.get())
    }

    /// Apply a persisted record.
    ///
    /// A restored dominant color wins over the stored custom hex. Both are ignored while a
    /// portrait is live, so a reload never clobbers an upload.
    pub fn restore(&mut self, state: &PersistedState, now: Instant) {
        state.apply_inputs(&mut self.inputs);
        if self.portrait.is_some() {
            if state.dominant_color.is_some() || state.custom_color.is_some() {
                tracing::debug!("restored color skipped, upload in progress");
            }
            self.custom_hex = self.dominant.get().to_hex();
        } else {
            if let Some(hex) = &state.custom_color {
                self.custom_hex.clone_from(hex);
            }
            if let Some(color) = state.dominant_color {
                self.dominant.set(color, ColorSource::Restored);
                self.custom_hex = color.to_hex();
                self.status = format!("Restored previous color: {}", color.describe());
            }
        }
        self.scheduler.invalidate(now, Urgency::Immediate);
    }

    /// Restore from `store`. Failures are logged and leave the session untouched.
    pub fn load_from(&mut self, store: &dyn StateStore, now: Instant) -> bool {
        match store.load() {
            Ok(Some(state)) => {
                self.restore(&state, now);
                true
            }
            Ok(None) => false,
            Err(error) => {
                tracing::warn!(error = %error, "could not load saved state");
                false
            }
        }
    }

    pub fn save_to(&self, store: &mut dyn StateStore) -> CardResult<()> {
        store.save(&self.snapshot())
    }

    #[tracing::instrument(level = "debug", skip(self), fields(scale = %ticket.scale))]
    fn redraw(&mut self, ticket: RedrawTicket) -> CardResult<FrameRgba> {
        self.render_at(ticket.scale, ticket.phase)
    }

    fn render_at(&mut self, scale: RenderScale, phase: f64) -> CardResult<FrameRgba> {
        self.renderer.render(
            &self.inputs,
            self.dominant.get(),
            self.portrait.as_ref(),
            scale,
            phase,
        )
    }

    fn apply_outcome(&mut self, job: ExtractionJob, outcome: StageOutcome, now: Instant) {
        let dominant = outcome.dominant();
        self.dominant.set(dominant, ColorSource::Extracted);
        match outcome {
            StageOutcome::Palette { palette, .. } => {
                tracing::debug!(colors = palette.len(), "palette extracted");
                self.palette = palette;
                self.selected = 0;
                self.status = STATUS_PICK_FROM_PALETTE.to_string();
                self.idle.push(
                    ExtractionJob {
                        portrait: job.portrait,
                        stage: ExtractionStage::Average,
                    },
                    now,
                );
                self.scheduler.invalidate(now, Urgency::Immediate);
            }
            StageOutcome::PaletteFailed { .. } => {
                self.palette.clear();
                self.status = STATUS_PALETTE_FAILED.to_string();
                self.custom_hex = dominant.to_hex();
                self.changed(now, Urgency::Immediate);
            }
            StageOutcome::Average { .. } => {
                self.status = format!("Dominant color: {}", dominant.describe());
                self.custom_hex = dominant.to_hex();
                self.changed(now, Urgency::Immediate);
            }
        }
    }

    fn changed(&mut self, now: Instant, urgency: Urgency) {
        self.scheduler.invalidate(now, urgency);
        self.autosave();
    }

    fn autosave(&mut self) {
        let state = self.snapshot();
        if let Some(store) = self.store.as_mut()
            && let Err(error) = store.save(&state)
        {
            tracing::warn!(error = %error, "could not save state");
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/card_session.rs"]
mod tests;

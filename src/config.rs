use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use crate::assets::fonts::FontConfig;
use crate::extract::pipeline::DEFAULT_PALETTE_SIZE;
use crate::foundation::core::{MAX_SCALE, RenderScale};
use crate::foundation::error::{CardError, CardResult};
use crate::render::noise::DEFAULT_NOISE_SEED;
use crate::schedule::scheduler::{RedrawPolicy, SchedulerTimings};

/// Session configuration, loadable from JSON. Every field has a default.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CardConfig {
    /// Scale of live preview redraws.
    pub preview_scale: f64,
    /// Scale of the exported PNG. Values below 1 are raised to 1.
    pub export_scale: f64,
    pub debounce_ms: u64,
    pub immediate_ms: u64,
    pub restore_ms: u64,
    /// `Some` switches the scheduler to the animated policy.
    pub animation_interval_ms: Option<u64>,
    pub idle_deadline_ms: u64,
    pub palette_size: usize,
    pub noise_seed: u64,
    pub fonts: FontConfig,
}

impl Default for CardConfig {
    fn default() -> Self {
        Self {
            preview_scale: 1.0,
            export_scale: 2.5,
            debounce_ms: 80,
            immediate_ms: 8,
            restore_ms: 16,
            animation_interval_ms: None,
            idle_deadline_ms: 500,
            palette_size: DEFAULT_PALETTE_SIZE,
            noise_seed: DEFAULT_NOISE_SEED,
            fonts: FontConfig::default(),
        }
    }
}

impl CardConfig {
    pub fn from_reader<R: std::io::Read>(r: R) -> CardResult<Self> {
        let cfg: Self = serde_json::from_reader(r)
            .map_err(|e| CardError::validation(format!("parse config JSON: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> CardResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            CardError::validation(format!("open config JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    pub fn validate(&self) -> CardResult<()> {
        RenderScale::new(self.preview_scale)
            .map_err(|e| CardError::validation(format!("preview_scale: {e}")))?;
        if !self.export_scale.is_finite() || self.export_scale <= 0.0 {
            return Err(CardError::validation("export_scale must be finite and > 0"));
        }
        if self.export_scale > MAX_SCALE {
            return Err(CardError::validation(format!(
                "export_scale must be <= {MAX_SCALE}"
            )));
        }
        if self.debounce_ms == 0 || self.immediate_ms == 0 || self.restore_ms == 0 {
            return Err(CardError::validation("scheduler delays must be > 0"));
        }
        if self.animation_interval_ms == Some(0) {
            return Err(CardError::validation("animation_interval_ms must be > 0"));
        }
        if self.idle_deadline_ms == 0 {
            return Err(CardError::validation("idle_deadline_ms must be > 0"));
        }
        if self.palette_size == 0 || self.palette_size > DEFAULT_PALETTE_SIZE {
            return Err(CardError::validation(format!(
                "palette_size must be in 1..={DEFAULT_PALETTE_SIZE}"
            )));
        }
        Ok(())
    }

    pub fn preview_scale(&self) -> CardResult<RenderScale> {
        RenderScale::new(self.preview_scale)
    }

    pub fn export_scale(&self) -> CardResult<RenderScale> {
        RenderScale::new(self.export_scale.max(1.0))
    }

    pub fn timings(&self) -> SchedulerTimings {
        SchedulerTimings {
            debounce: Duration::from_millis(self.debounce_ms),
            immediate: Duration::from_millis(self.immediate_ms),
            restore: Duration::from_millis(self.restore_ms),
        }
    }

    pub fn policy(&self) -> RedrawPolicy {
        match self.animation_interval_ms {
            Some(ms) => RedrawPolicy::Animated {
                interval: Duration::from_millis(ms),
            },
            None => RedrawPolicy::Debounced,
        }
    }

    pub fn idle_deadline(&self) -> Duration {
        Duration::from_millis(self.idle_deadline_ms)
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;

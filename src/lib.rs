//! cardframe procedurally renders a decorative trading-card frame around an uploaded
//! portrait.
//!
//! The public API is session-oriented:
//!
//! - Build a [`CardSession`] from a [`CardConfig`]
//! - Feed it edits and uploads, then call [`CardSession::pump`] whenever
//!   [`CardSession::next_wake`] says so
//! - Export a high-resolution PNG with [`CardSession::export`]
//!
//! Lower layers (render plan compilation, CPU backend, palette extraction, redraw
//! scheduling) are public for hosts that want to drive them directly.
#![forbid(unsafe_code)]

pub mod assets;
pub mod card;
pub mod color;
pub mod config;
pub mod export;
pub mod extract;
pub mod foundation;
pub mod layout;
pub mod persist;
pub mod render;
pub mod schedule;
pub mod session;
pub mod submit;

pub use crate::assets::decode::{PortraitId, PortraitImage, decode_portrait};
pub use crate::assets::fonts::{FontConfig, FontFace, FontRole, FontSet};
pub use crate::card::inputs::{CardInputs, LengthWarnings, truncate_for_display};
pub use crate::color::model::{ColorRgb, NEUTRAL_GRAY, translucent_background};
pub use crate::config::CardConfig;
pub use crate::export::{ExportArtifact, ExportPayload, export_filename};
pub use crate::extract::average::average_color;
pub use crate::extract::idle::IdleQueue;
pub use crate::extract::median_cut::{MedianCut, PaletteExtractor};
pub use crate::extract::pipeline::{ExtractionJob, ExtractionStage, StageOutcome, run_stage};
pub use crate::foundation::core::{
    Affine, BezPath, CARD_H, CARD_W, Canvas, Point, Rect, RenderScale, Rgba, Rgba8Premul, Vec2,
};
pub use crate::foundation::error::{CardError, CardResult};
pub use crate::layout::fit::CoverFit;
pub use crate::layout::geometry::{CardGeometry, RoundRect};
pub use crate::persist::{JsonFileStore, MemoryStore, PersistedState, StateStore};
pub use crate::render::FrameRgba;
pub use crate::render::renderer::CardRenderer;
pub use crate::schedule::scheduler::{
    RedrawPolicy, RedrawTicket, RenderScheduler, SchedulerState, Urgency,
};
pub use crate::session::card_session::{CardSession, PumpReport};
pub use crate::session::color_cell::{ColorSource, DominantColorCell};
pub use crate::submit::{OriginalUpload, Submission, SubmissionPayload, prepare_submission};

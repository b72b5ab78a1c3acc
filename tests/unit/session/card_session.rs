use std::cell::RefCell;
use std::io::Cursor;
use std::rc::Rc;
use std::time::Duration;

use super::*;
use crate::card::inputs::CUT_WARNING;
use crate::color::model::NEUTRAL_GRAY;
use crate::persist::MemoryStore;

const MS: Duration = Duration::from_millis(1);
const TEAL: ColorRgb = ColorRgb::new(0, 128, 128);

fn png(w: u32, h: u32, rgba: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba(rgba));
    let mut c = Cursor::new(Vec::new());
    img.write_to(&mut c, image::ImageFormat::Png).unwrap();
    c.into_inner()
}

fn session(t0: Instant) -> CardSession {
    CardSession::new(CardConfig::default(), FontSet::empty(), t0).unwrap()
}

struct Failing;

impl PaletteExtractor for Failing {
    fn extract(&self, _img: &image::RgbaImage, _n: usize) -> CardResult<Vec<ColorRgb>> {
        Err(CardError::extraction("unavailable"))
    }
}

#[derive(Clone, Default)]
struct SharedStore(Rc<RefCell<Option<PersistedState>>>);

impl StateStore for SharedStore {
    fn load(&self) -> CardResult<Option<PersistedState>> {
        Ok(self.0.borrow().clone())
    }

    fn save(&mut self, state: &PersistedState) -> CardResult<()> {
        *self.0.borrow_mut() = Some(state.clone());
        Ok(())
    }
}

struct BrokenStore;

impl StateStore for BrokenStore {
    fn load(&self) -> CardResult<Option<PersistedState>> {
        Err(CardError::persistence("quota exceeded"))
    }

    fn save(&mut self, _state: &PersistedState) -> CardResult<()> {
        Err(CardError::persistence("quota exceeded"))
    }
}

#[test]
fn first_frame_is_drawn_shortly_after_start() {
    let t0 = Instant::now();
    let mut s = session(t0);
    assert_eq!(s.next_wake(t0), Some(t0 + 8 * MS));
    assert!(s.pump(t0).unwrap().is_noop());

    let report = s.pump(t0 + 8 * MS).unwrap();
    assert!(report.redraw.is_some());
    let frame = s.preview().unwrap();
    assert_eq!((frame.width, frame.height), (290, 416));
    assert!(!frame.is_blank());
    assert!(s.renderer().noise_ready());
}

#[test]
fn upload_runs_palette_then_average() {
    let t0 = Instant::now();
    let mut s = session(t0);
    let id = s.upload_image(&png(40, 60, [0, 128, 128, 255]), t0).unwrap();
    assert_eq!(s.status(), STATUS_ANALYZING);
    assert_eq!(s.portrait().map(|p| p.id), Some(id));
    assert_eq!(s.pending_extractions(), 1);

    let report = s.pump(t0).unwrap();
    assert_eq!(report.extraction, Some(ExtractionStage::Palette));
    assert_eq!(s.status(), STATUS_PICK_FROM_PALETTE);
    assert_eq!(s.palette(), &[TEAL]);
    assert_eq!(s.dominant(), TEAL);
    assert_eq!(s.pending_extractions(), 1);

    let report = s.pump(t0 + MS).unwrap();
    assert_eq!(report.extraction, Some(ExtractionStage::Average));
    assert_eq!(s.status(), "Dominant color: RGB(0, 128, 128) • #008080");
    assert_eq!(s.custom_color_hex(), "#008080");
    assert_eq!(s.color_source(), ColorSource::Extracted);
    assert_eq!(s.pending_extractions(), 0);
}

#[test]
fn failed_palette_falls_back_to_average_within_deadline() {
    let t0 = Instant::now();
    let mut s = session(t0).with_extractor(Box::new(Failing));
    s.set_host_busy(true);
    s.upload_image(&png(40, 60, [0, 128, 128, 255]), t0).unwrap();

    let report = s.pump(t0 + 8 * MS).unwrap();
    assert!(report.redraw.is_some());
    assert_eq!(report.extraction, None);
    assert_eq!(s.next_wake(t0 + 9 * MS), Some(t0 + 500 * MS));
    assert!(s.pump(t0 + 499 * MS).unwrap().is_noop());

    let report = s.pump(t0 + 500 * MS).unwrap();
    assert_eq!(report.extraction, Some(ExtractionStage::Palette));
    assert_eq!(s.status(), STATUS_PALETTE_FAILED);
    assert_ne!(s.dominant(), NEUTRAL_GRAY);
    assert_eq!(s.dominant(), TEAL);
    assert_eq!(s.custom_color_hex(), "#008080");
    assert_eq!(s.pending_extractions(), 0);
    assert_eq!(s.scheduler().next_deadline(), Some(t0 + 508 * MS));
}

#[test]
fn undecodable_upload_resets_to_gray() {
    let t0 = Instant::now();
    let mut s = session(t0);
    s.set_custom_color("#123456", t0);
    assert!(s.upload_image(b"definitely not an image", t0 + MS).is_none());
    assert_eq!(s.status(), STATUS_DECODE_FAILED);
    assert!(s.portrait().is_none());
    assert_eq!(s.dominant(), NEUTRAL_GRAY);
    assert_eq!(s.pending_extractions(), 0);
    assert!(s.pump(t0 + 9 * MS).unwrap().redraw.is_some());
}

#[test]
fn clearing_the_upload_uses_default_color() {
    let t0 = Instant::now();
    let mut s = session(t0);
    s.upload_image(&png(8, 8, [200, 10, 10, 255]), t0).unwrap();
    s.pump(t0).unwrap();
    s.clear_portrait(t0 + MS);
    assert_eq!(s.status(), STATUS_NO_IMAGE);
    assert!(s.palette().is_empty());
    assert_eq!(s.dominant(), NEUTRAL_GRAY);

    // the queued average for the removed portrait is discarded
    let report = s.pump(t0 + 2 * MS).unwrap();
    assert_eq!(report.stale_dropped, 1);
    assert_eq!(report.extraction, None);
    assert_eq!(s.pending_extractions(), 0);
}

#[test]
fn swatch_selection_updates_status_and_mirror() {
    let t0 = Instant::now();
    let mut s = session(t0);
    s.upload_image(&png(20, 20, [0, 128, 128, 255]), t0).unwrap();
    s.pump(t0).unwrap();

    let err = s.select_swatch(3, t0 + MS).unwrap_err();
    assert!(matches!(err, CardError::Validation(_)));

    s.select_swatch(0, t0 + MS).unwrap();
    assert_eq!(s.selected_swatch(), 0);
    assert_eq!(s.color_source(), ColorSource::Swatch);
    assert_eq!(s.status(), "Selected color: RGB(0, 128, 128) • #008080");
    assert_eq!(s.custom_color_hex(), "#008080");
    assert_eq!(s.scheduler().next_deadline(), Some(t0 + 9 * MS));
}

#[test]
fn late_extraction_overrides_manual_pick() {
    let t0 = Instant::now();
    let mut s = session(t0);
    s.upload_image(&png(20, 20, [0, 128, 128, 255]), t0).unwrap();
    s.pump(t0).unwrap();
    s.set_custom_color("#FF0000", t0 + MS);
    assert_eq!(s.color_source(), ColorSource::Custom);

    let report = s.pump(t0 + 2 * MS).unwrap();
    assert_eq!(report.extraction, Some(ExtractionStage::Average));
    assert_eq!(s.dominant(), TEAL);
    assert_eq!(s.color_source(), ColorSource::Extracted);
}

#[test]
fn malformed_custom_color_is_gray() {
    let t0 = Instant::now();
    let mut s = session(t0);
    s.set_custom_color("#12zz56", t0);
    assert_eq!(s.dominant(), NEUTRAL_GRAY);
    assert_eq!(s.status(), "Custom color: RGB(150, 150, 150) • #969696");
    assert_eq!(s.custom_color_hex(), "#12zz56");
}

#[test]
fn text_edit_burst_renders_once() {
    let t0 = Instant::now();
    let mut s = session(t0);
    s.pump(t0 + 8 * MS).unwrap();
    assert_eq!(s.scheduler().renders(), 1);

    let base = t0 + 100 * MS;
    for i in 0..5u32 {
        let at = base + i * 10 * MS;
        s.set_character_name(format!("Aria {i}"), at);
        assert!(s.pump(at).unwrap().redraw.is_none());
    }
    let mut at = base;
    while at <= base + 400 * MS {
        s.pump(at).unwrap();
        at += MS;
    }
    assert_eq!(s.scheduler().renders(), 2);
    assert_eq!(s.inputs().character_name, "Aria 4");
}

#[test]
fn length_warnings_flag_long_fields() {
    let t0 = Instant::now();
    let mut s = session(t0);
    s.set_series_title("Starbound Chronicles", t0);
    s.set_character_name("Aria Nightshade", t0);
    let w = s.length_warnings();
    assert_eq!(w.series_title, Some(CUT_WARNING));
    assert_eq!(w.character_name, None);
}

#[test]
fn resize_changes_preview_size() {
    let t0 = Instant::now();
    let mut s = session(t0);
    assert!(s.resize(0.0, t0).is_err());
    s.resize(2.0, t0).unwrap();
    s.pump(t0 + 8 * MS).unwrap();
    let frame = s.preview().unwrap();
    assert_eq!((frame.width, frame.height), (580, 832));
}

#[test]
fn export_renders_at_export_scale_and_restores_preview() {
    let t0 = Instant::now();
    let mut s = session(t0);
    s.set_character_name("Hanako Sato", t0);
    let art = s.export(t0 + MS).unwrap();
    assert_eq!(art.filename, "hanakoSato.png");
    assert_eq!((art.width, art.height), (725, 1040));
    assert_eq!(s.scheduler().next_deadline(), Some(t0 + 17 * MS));

    let report = s.pump(t0 + 17 * MS).unwrap();
    assert_eq!(report.redraw.map(|t| t.scale), Some(RenderScale::ONE));
}

#[test]
fn clear_card_resets_everything() {
    let t0 = Instant::now();
    let store = SharedStore::default();
    let mut s = session(t0).with_store(Box::new(store.clone()));
    s.set_character_name("Aria", t0);
    s.set_print_number("007/150", t0);
    s.upload_image(&png(10, 10, [0, 128, 128, 255]), t0).unwrap();
    s.pump(t0).unwrap();

    s.clear_card(t0 + MS);
    assert_eq!(s.inputs().character_name, "");
    assert_eq!(s.inputs().print_number, "");
    assert!(s.portrait().is_none());
    assert!(s.palette().is_empty());
    assert_eq!(s.dominant(), NEUTRAL_GRAY);
    assert_eq!(s.status(), "");

    let saved = store.0.borrow().clone().unwrap();
    assert_eq!(saved.character_name.as_deref(), Some(""));
    assert_eq!(saved.dominant_color, Some(NEUTRAL_GRAY));
}

#[test]
fn restore_makes_dominant_color_authoritative() {
    let t0 = Instant::now();
    let mut store = MemoryStore::new();
    store.insert_raw(
        r##"{"version":1,"charName1":"Aria","customColor1":"#000000","dominantColor1":{"R":10,"G":20,"B":30}}"##,
    );
    let mut s = session(t0);
    assert!(s.load_from(&store, t0));
    assert_eq!(s.inputs().character_name, "Aria");
    assert_eq!(s.dominant(), ColorRgb::new(10, 20, 30));
    assert_eq!(s.color_source(), ColorSource::Restored);
    assert_eq!(s.custom_color_hex(), "#0A141E");
    assert_eq!(s.status(), "Restored previous color: RGB(10, 20, 30) • #0A141E");

    let snap = s.snapshot();
    assert_eq!(snap.dominant_color, Some(ColorRgb::new(10, 20, 30)));
    let mut other = MemoryStore::new();
    s.save_to(&mut other).unwrap();
    assert_eq!(other.load().unwrap(), Some(snap));
}

#[test]
fn restore_does_not_clobber_upload() {
    let t0 = Instant::now();
    let mut s = session(t0);
    s.upload_image(&png(10, 10, [0, 128, 128, 255]), t0).unwrap();
    let state = PersistedState::from_json(
        r#"{"seriesTitle1":"Saga","dominantColor1":{"R":1,"G":2,"B":3}}"#,
    )
    .unwrap();
    s.restore(&state, t0 + MS);
    assert_eq!(s.inputs().series_title, "Saga");
    assert_eq!(s.dominant(), NEUTRAL_GRAY);
    assert_eq!(s.status(), STATUS_ANALYZING);

    let stale_hex = PersistedState::from_json(
        r##"{"customColor1":"#FF0000","dominantColor1":{"R":10,"G":20,"B":30}}"##,
    )
    .unwrap();
    s.restore(&stale_hex, t0 + 2 * MS);
    assert_eq!(s.dominant(), NEUTRAL_GRAY);
    assert_eq!(s.custom_color_hex(), NEUTRAL_GRAY.to_hex());
    assert_eq!(
        s.snapshot().custom_color.as_deref(),
        Some(NEUTRAL_GRAY.to_hex().as_str())
    );
}

#[test]
fn oversized_portrait_is_refused_and_card_keeps_rendering() {
    let t0 = Instant::now();
    let mut s = session(t0);
    s.set_custom_color("#336699", t0);
    assert!(s.upload_image(&png(70_000, 2, [200, 10, 10, 255]), t0).is_none());
    assert!(s.portrait().is_none());
    assert_eq!(s.dominant(), NEUTRAL_GRAY);
    assert_eq!(s.status(), STATUS_DECODE_FAILED);

    let report = s.pump(t0 + 20 * MS).unwrap();
    assert!(report.redraw.is_some());
    assert!(s.preview().is_some());
    let artifact = s.export(t0 + 30 * MS).unwrap();
    assert_eq!((artifact.width, artifact.height), (725, 1040));
}

#[test]
fn storage_failures_are_not_fatal() {
    let t0 = Instant::now();
    let mut s = session(t0).with_store(Box::new(BrokenStore));
    s.set_character_name("Aria", t0);
    s.set_custom_color("#336699", t0);
    assert!(!s.load_from(&BrokenStore, t0));
    assert_eq!(s.dominant(), ColorRgb::new(0x33, 0x66, 0x99));

    let mut corrupt = MemoryStore::new();
    corrupt.insert_raw("{");
    assert!(!s.load_from(&corrupt, t0));
    assert_eq!(s.inputs().character_name, "Aria");
}

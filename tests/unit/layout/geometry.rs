use super::*;
use kurbo::{PathEl, Shape};

#[test]
fn card_layout_matches_fixed_insets() {
    let g = CardGeometry::card();
    assert_eq!(g.outer, RoundRect::new(5.0, 5.0, 280.0, 406.0, 20.0));
    assert_eq!(g.inner, RoundRect::new(17.0, 17.0, 256.0, 382.0, 14.0));
    assert_eq!(g.top_band, Rect::new(17.0, 17.0, 273.0, 47.0));
    assert_eq!(g.bottom_band, Rect::new(17.0, 369.0, 273.0, 399.0));
    assert_eq!(g.art, Rect::new(17.0, 47.0, 273.0, 369.0));
}

#[test]
fn art_and_bands_tile_the_inner_rect() {
    let g = CardGeometry::layout(500.0, 700.0);
    let inner = g.inner.rect();
    assert_eq!(g.top_band.height() + g.art.height() + g.bottom_band.height(), inner.height());
    assert_eq!(g.art.width(), inner.width());
    assert_eq!(g.top_band.y1, g.art.y0);
    assert_eq!(g.art.y1, g.bottom_band.y0);
}

#[test]
fn round_rect_path_uses_quadratic_corners() {
    let path = RoundRect::new(0.0, 0.0, 100.0, 50.0, 10.0).to_path();
    let quads = path
        .elements()
        .iter()
        .filter(|el| matches!(el, PathEl::QuadTo(..)))
        .count();
    assert_eq!(quads, 4);
    assert!(matches!(path.elements().last(), Some(PathEl::ClosePath)));
    let bbox = path.bounding_box();
    assert!((bbox.x0 - 0.0).abs() < 1e-9 && (bbox.y0 - 0.0).abs() < 1e-9);
    assert!((bbox.x1 - 100.0).abs() < 1e-9 && (bbox.y1 - 50.0).abs() < 1e-9);
}

#[test]
fn negative_radius_is_treated_as_square() {
    let path = RoundRect::new(0.0, 0.0, 10.0, 10.0, -3.0).to_path();
    assert!(matches!(path.elements()[0], PathEl::MoveTo(p) if p.x == 0.0 && p.y == 0.0));
}

#[test]
fn inset_keeps_radius_and_center() {
    let r = RoundRect::new(10.0, 10.0, 100.0, 60.0, 8.0);
    let i = r.inset(2.0);
    assert_eq!(i, RoundRect::new(12.0, 12.0, 96.0, 56.0, 8.0));
    assert_eq!(r.rect().center(), i.rect().center());
    assert_eq!(CardGeometry::card().inner_clip().r, 18.0);
}

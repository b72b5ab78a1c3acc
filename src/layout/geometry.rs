use crate::foundation::core::{BezPath, CARD_H, CARD_W, Rect};

pub const OUTER_INSET: f64 = 5.0;
pub const OUTER_RADIUS: f64 = 20.0;
pub const FRAME_THICKNESS: f64 = 12.0;
pub const BAND_HEIGHT: f64 = 30.0;

/// Axis-aligned rectangle with uniform corner radius, in logical card units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RoundRect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    pub r: f64,
}

impl RoundRect {
    pub const fn new(x: f64, y: f64, w: f64, h: f64, r: f64) -> Self {
        Self { x, y, w, h, r }
    }

    /// Shrink by `d` on every side, keeping the radius.
    pub fn inset(self, d: f64) -> Self {
        Self {
            x: self.x + d,
            y: self.y + d,
            w: self.w - 2.0 * d,
            h: self.h - 2.0 * d,
            r: self.r,
        }
    }

    pub fn with_radius(self, r: f64) -> Self {
        Self { r, ..self }
    }

    pub fn rect(self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.w, self.y + self.h)
    }

    /// Outline with quadratic corners whose control points sit on the sharp corners.
    pub fn to_path(self) -> BezPath {
        let Self { x, y, w, h, r } = self;
        let r = r.max(0.0);
        let mut p = BezPath::new();
        p.move_to((x + r, y));
        p.line_to((x + w - r, y));
        p.quad_to((x + w, y), (x + w, y + r));
        p.line_to((x + w, y + h - r));
        p.quad_to((x + w, y + h), (x + w - r, y + h));
        p.line_to((x + r, y + h));
        p.quad_to((x, y + h), (x, y + h - r));
        p.line_to((x, y + r));
        p.quad_to((x, y), (x + r, y));
        p.close_path();
        p
    }
}

/// Nested card layout derived from the card size. Recomputed per draw.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CardGeometry {
    pub outer: RoundRect,
    pub inner: RoundRect,
    pub art: Rect,
    pub top_band: Rect,
    pub bottom_band: Rect,
}

impl CardGeometry {
    pub fn layout(card_w: f64, card_h: f64) -> Self {
        let outer = RoundRect::new(
            OUTER_INSET,
            OUTER_INSET,
            card_w - 2.0 * OUTER_INSET,
            card_h - 2.0 * OUTER_INSET,
            OUTER_RADIUS,
        );
        let inner = RoundRect::new(
            outer.x + FRAME_THICKNESS,
            outer.y + FRAME_THICKNESS,
            outer.w - 2.0 * FRAME_THICKNESS,
            outer.h - 2.0 * FRAME_THICKNESS,
            outer.r - FRAME_THICKNESS + 6.0,
        );

        let inner_rect = inner.rect();
        let top_band = Rect::new(
            inner_rect.x0,
            inner_rect.y0,
            inner_rect.x1,
            inner_rect.y0 + BAND_HEIGHT,
        );
        let bottom_band = Rect::new(
            inner_rect.x0,
            inner_rect.y1 - BAND_HEIGHT,
            inner_rect.x1,
            inner_rect.y1,
        );
        let art = Rect::new(inner_rect.x0, top_band.y1, inner_rect.x1, bottom_band.y0);

        Self {
            outer,
            inner,
            art,
            top_band,
            bottom_band,
        }
    }

    /// Layout for the fixed 290x416 card.
    pub fn card() -> Self {
        Self::layout(CARD_W, CARD_H)
    }

    /// Clip/bezel outline of the inner frame.
    pub fn inner_clip(&self) -> RoundRect {
        self.inner.with_radius(self.inner.r + 4.0)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layout/geometry.rs"]
mod tests;

use crate::foundation::core::Rect;
use crate::foundation::error::{CardError, CardResult};

/// Cover-fit placement of an image inside a target region.
///
/// Offsets are relative to the target origin and are never positive: the scaled image
/// always overflows (or exactly matches) the target on both axes and is centered.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CoverFit {
    pub scale: f64,
    pub draw_w: f64,
    pub draw_h: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl CoverFit {
    pub fn compute(image_w: f64, image_h: f64, target_w: f64, target_h: f64) -> CardResult<Self> {
        for (name, v) in [
            ("image width", image_w),
            ("image height", image_h),
            ("target width", target_w),
            ("target height", target_h),
        ] {
            if !v.is_finite() || v <= 0.0 {
                return Err(CardError::validation(format!(
                    "cover fit {name} must be finite and > 0"
                )));
            }
        }

        let scale = (target_w / image_w).max(target_h / image_h);
        let draw_w = image_w * scale;
        let draw_h = image_h * scale;
        Ok(Self {
            scale,
            draw_w,
            draw_h,
            offset_x: (target_w - draw_w) / 2.0,
            offset_y: (target_h - draw_h) / 2.0,
        })
    }

    /// Fit `image_w x image_h` into `target`, returning the placement in target space.
    pub fn place_in(image_w: f64, image_h: f64, target: Rect) -> CardResult<(Self, Rect)> {
        let fit = Self::compute(image_w, image_h, target.width(), target.height())?;
        let x0 = target.x0 + fit.offset_x;
        let y0 = target.y0 + fit.offset_y;
        Ok((fit, Rect::new(x0, y0, x0 + fit.draw_w, y0 + fit.draw_h)))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layout/fit.rs"]
mod tests;

use crate::assets::fonts::FontFace;
use crate::foundation::core::Rgba;
use crate::foundation::error::{CardError, CardResult};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// RGBA8 brush color used by Parley text layout.
pub struct TextBrushRgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl From<Rgba> for TextBrushRgba8 {
    fn from(c: Rgba) -> Self {
        Self {
            r: c.r,
            g: c.g,
            b: c.b,
            a: c.alpha_u8(),
        }
    }
}

/// Single-line measurements needed to anchor a layout on a baseline.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineMetrics {
    pub width: f32,
    pub baseline: f32,
}

/// Parley contexts bound to exactly one registered face.
///
/// One engine per face keeps glyph ids unambiguous when the backend later draws them with
/// the same bytes.
pub struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
    family_name: String,
}

impl TextLayoutEngine {
    pub fn for_face(face: &FontFace) -> CardResult<Self> {
        let mut font_ctx = parley::FontContext::default();
        let families = font_ctx.collection.register_fonts(
            parley::fontique::Blob::from(face.bytes.as_ref().clone()),
            None,
        );
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            CardError::validation("no font families registered from font bytes")
        })?;
        let family_name = font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| CardError::validation("registered font family has no name"))?
            .to_string();

        Ok(Self {
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            family_name,
        })
    }

    pub fn family_name(&self) -> &str {
        &self.family_name
    }

    /// Shape `text` as one unbroken line.
    pub fn layout_line(
        &mut self,
        text: &str,
        size_px: f32,
        brush: TextBrushRgba8,
    ) -> CardResult<parley::Layout<TextBrushRgba8>> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(CardError::validation("text size must be finite and > 0"));
        }

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(self.family_name.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(None);
        Ok(layout)
    }
}

/// Width and first-line baseline of a laid out line.
pub fn line_metrics(layout: &parley::Layout<TextBrushRgba8>) -> LineMetrics {
    let baseline = layout
        .lines()
        .next()
        .map(|line| line.metrics().baseline)
        .unwrap_or(0.0);
    LineMetrics {
        width: layout.width(),
        baseline,
    }
}

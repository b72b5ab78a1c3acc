use crate::assets::decode::PortraitId;
use crate::assets::fonts::FontRole;
use crate::card::inputs::CardInputs;
use crate::color::model::{ColorRgb, translucent_background};
use crate::foundation::core::{Affine, BezPath, Point, Rect, RenderScale, Rgba, Vec2};
use crate::layout::fit::CoverFit;
use crate::layout::geometry::{CardGeometry, RoundRect};
use crate::render::blur::shadow_blur_fx;
use crate::render::plan::{
    CompositeOp, CompositePass, DrawOp, GradientStop, OffscreenPass, Paint, Pass, PixelFormat,
    RenderPlan, ScenePass, SurfaceDesc, SurfaceId, TextAlign, TextRun,
};

pub const TARGET: SurfaceId = SurfaceId(0);
/// Layer for blurred shadows, glows and the halo.
pub const SCRATCH: SurfaceId = SurfaceId(1);
pub const OUTER_MASK: SurfaceId = SurfaceId(2);
pub const INNER_MASK: SurfaceId = SurfaceId(3);
/// Art window (art rect inside the inner clip).
pub const WINDOW_MASK: SurfaceId = SurfaceId(4);
const SURFACE_COUNT: usize = 5;

const FRAME_STOP_OFFSETS: [f32; 5] = [0.0, 0.15, 0.5, 0.85, 1.0];
const SCANLINE_STEP: f64 = 6.0;
const TEXT_GLOW_BLUR: f64 = 6.0;
const PRINT_SHADOW_OFFSET: f64 = 0.5;

/// Portrait identity and size, enough to place it without touching pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PortraitRef {
    pub id: PortraitId,
    pub width: u32,
    pub height: u32,
}

/// Everything the card drawing depends on.
#[derive(Clone, Copy, Debug)]
pub struct CardScene<'a> {
    pub inputs: &'a CardInputs,
    pub base_color: ColorRgb,
    pub portrait: Option<PortraitRef>,
}

/// Compile the layered card drawing into a render plan.
///
/// Pure: the same scene, scale and phase always produce the same plan.
pub fn compile_card(scene: &CardScene<'_>, scale: RenderScale, phase: f64) -> RenderPlan {
    let geo = CardGeometry::card();
    let canvas = scale.canvas();
    let mut b = PlanBuilder {
        transform: scale.to_affine(),
        scale: scale.get(),
        passes: Vec::new(),
    };

    let outer = geo.outer;
    let outer_path = outer.to_path();
    let clip_path = geo.inner_clip().to_path();

    b.scene(OUTER_MASK, true, vec![b.fill(outer_path.clone(), white(1.0))]);
    b.scene(INNER_MASK, true, vec![b.fill(clip_path.clone(), white(1.0))]);
    b.scene(
        WINDOW_MASK,
        true,
        b.clipped(&clip_path, vec![b.fill_rect(geo.art, white(1.0))]),
    );

    // 1. Frame gradient.
    let tints = scene.base_color.gradient_tints();
    let frame_paint = diagonal(
        outer.rect(),
        FRAME_STOP_OFFSETS
            .iter()
            .zip(tints)
            .map(|(&offset, c)| GradientStop {
                offset,
                color: c.with_alpha(1.0),
            })
            .collect(),
    );
    b.scene(
        TARGET,
        true,
        vec![DrawOp::FillPath {
            path: outer_path.clone(),
            transform: b.transform,
            paint: frame_paint,
        }],
    );

    // 2. Scan-lines.
    b.scene(TARGET, false, scanlines(&b, outer, phase));

    // 3. Grain.
    b.composite(CompositeOp::OverlayNoise { mask: OUTER_MASK });

    // 4. Border glow, then the colored halo.
    let glow = b.stroke(outer_path.clone(), white(0.15), 1.5);
    if let Some(shadow) = glow.shadow(white(0.2), Vec2::ZERO) {
        b.blurred(vec![shadow], 8.0, None);
    }
    b.scene(TARGET, false, vec![glow]);
    b.blurred(
        vec![b.stroke(outer_path, scene.base_color.with_alpha(0.12), 10.0)],
        18.0,
        None,
    );

    // 5. Rim light.
    let rim = diagonal(
        outer.rect(),
        vec![
            GradientStop {
                offset: 0.0,
                color: white(0.28),
            },
            GradientStop {
                offset: 0.25,
                color: white(0.08),
            },
            GradientStop {
                offset: 1.0,
                color: white(0.0),
            },
        ],
    );
    let rim_op = DrawOp::StrokePath {
        path: outer.inset(0.8).to_path(),
        transform: b.transform,
        paint: rim,
        width: 1.0,
    };

    // 6. Inner bevel.
    let bezel_r = geo.inner.r + 4.0;
    let bevel = vec![
        rim_op,
        b.stroke(
            geo.inner.inset(1.0).with_radius(bezel_r).to_path(),
            Rgba::black(0.3),
            2.0,
        ),
        b.stroke(
            geo.inner.inset(0.5).with_radius(bezel_r).to_path(),
            white(0.15),
            0.5,
        ),
    ];
    b.scene(TARGET, false, bevel);

    // 7-8. Text bands.
    text_bands(&mut b, &geo, &clip_path, scene);

    // 9. Art window.
    b.composite(CompositeOp::Erase { mask: WINDOW_MASK });

    // 10. Portrait.
    if scene.inputs.show_image
        && let Some(p) = scene.portrait
    {
        let inner_rect = geo.inner.rect();
        match CoverFit::place_in(f64::from(p.width), f64::from(p.height), inner_rect) {
            Ok((_, dest)) => {
                let ops = b.clipped(
                    &clip_path,
                    vec![DrawOp::Portrait {
                        id: p.id,
                        dest,
                        transform: b.transform,
                    }],
                );
                b.scene(TARGET, false, ops);
            }
            Err(e) => tracing::warn!(error = %e, "portrait skipped"),
        }
    }

    // 11. Re-stroke the inner border and the iridescent rim.
    let iridescent = diagonal(
        geo.inner.rect(),
        vec![
            GradientStop {
                offset: 0.0,
                color: Rgba::new(220, 255, 255, 0.25),
            },
            GradientStop {
                offset: 0.5,
                color: Rgba::new(255, 220, 255, 0.18),
            },
            GradientStop {
                offset: 1.0,
                color: Rgba::new(220, 255, 220, 0.12),
            },
        ],
    );
    let restroke = vec![
        b.stroke(
            geo.inner.inset(1.0).with_radius(bezel_r).to_path(),
            Rgba::black(0.28),
            2.0,
        ),
        DrawOp::StrokePath {
            path: geo.inner.inset(2.0).with_radius(geo.inner.r + 6.0).to_path(),
            transform: b.transform,
            paint: iridescent,
            width: 1.2,
        },
    ];
    b.scene(TARGET, false, restroke);

    // 12. Bands again, above the portrait.
    text_bands(&mut b, &geo, &clip_path, scene);

    let desc = SurfaceDesc {
        width: canvas.width,
        height: canvas.height,
        format: PixelFormat::Rgba8Premul,
    };
    RenderPlan {
        canvas,
        surfaces: vec![desc; SURFACE_COUNT],
        passes: b.passes,
        final_surface: TARGET,
    }
}

fn text_bands(b: &mut PlanBuilder, geo: &CardGeometry, clip_path: &BezPath, scene: &CardScene<'_>) {
    let top = geo.top_band;
    let bottom = geo.bottom_band;
    let top_bg = translucent_background(scene.base_color, 0.6, 0.5);
    let bottom_bg = translucent_background(scene.base_color, 0.1, 0.5);

    let name = b.text(
        scene.inputs.display_name(),
        FontRole::Bold,
        14.0,
        white(1.0),
        Point::new(top.x0 + 10.0, top.y0 + 14.0),
        TextAlign::Left,
    );
    let series = b.text(
        scene.inputs.display_series(),
        FontRole::Regular,
        12.0,
        white(0.8),
        Point::new(top.x0 + 10.0, top.y0 + 27.0),
        TextAlign::Left,
    );
    let print = b.text(
        scene.inputs.print_number.clone(),
        FontRole::Bold,
        18.0,
        white(1.0),
        Point::new(bottom.x1 - 10.0, bottom.y0 + 21.0),
        TextAlign::Right,
    );

    let mut ops = vec![b.fill_rect(top, top_bg)];
    ops.extend(name);
    let ops = b.clipped(clip_path, ops);
    b.scene(TARGET, false, ops);

    if let Some(glow) = series.as_ref().and_then(|s| s.shadow(white(0.9), Vec2::ZERO)) {
        b.blurred(vec![glow], TEXT_GLOW_BLUR, Some(INNER_MASK));
    }
    let mut ops: Vec<DrawOp> = series.into_iter().collect();
    ops.push(b.fill_rect(bottom, bottom_bg));
    let ops = b.clipped(clip_path, ops);
    b.scene(TARGET, false, ops);

    if let Some(print) = print {
        let offset = Vec2::new(PRINT_SHADOW_OFFSET, PRINT_SHADOW_OFFSET);
        if let Some(shadow) = print.shadow(Rgba::black(0.6), offset) {
            b.blurred(vec![shadow], 1.0, Some(INNER_MASK));
        }
        let ops = b.clipped(clip_path, vec![print]);
        b.scene(TARGET, false, ops);
    }
}

fn scanlines(b: &PlanBuilder, outer: RoundRect, phase: f64) -> Vec<DrawOp> {
    let mut ops = vec![DrawOp::PushOpacity { opacity: 0.06 }];
    let x0 = outer.x + 6.0;
    let x1 = outer.x + outer.w - 6.0;
    let end = outer.y + outer.h - 6.0;
    let mut k = 1.0;
    loop {
        let y = outer.y + SCANLINE_STEP * k;
        if y >= end {
            break;
        }
        let dy = ((y + phase * 30.0) * 0.02).sin() * 0.6;
        let mut line = BezPath::new();
        line.move_to((x0, y + dy));
        line.line_to((x1, y + dy));
        ops.push(b.stroke(line, white(0.06), 0.6));
        k += 1.0;
    }
    ops.push(DrawOp::PopLayer);
    ops
}

/// Corner-to-corner gradient across `r`.
fn diagonal(r: Rect, stops: Vec<GradientStop>) -> Paint {
    Paint::Linear {
        start: Point::new(r.x0, r.y0),
        end: Point::new(r.x1, r.y1),
        stops,
    }
}

const fn white(a: f32) -> Rgba {
    Rgba::white(a)
}

struct PlanBuilder {
    transform: Affine,
    scale: f64,
    passes: Vec<Pass>,
}

impl PlanBuilder {
    /// Append draw ops to `target`. Consecutive non-clearing scenes on the same target
    /// are merged into one pass.
    fn scene(&mut self, target: SurfaceId, clear: bool, ops: Vec<DrawOp>) {
        if ops.is_empty() && !clear {
            return;
        }
        if !clear
            && let Some(Pass::Scene(prev)) = self.passes.last_mut()
            && prev.target == target
        {
            prev.ops.extend(ops);
            return;
        }
        self.passes.push(Pass::Scene(ScenePass {
            target,
            ops,
            clear_to_transparent: clear,
        }));
    }

    fn composite(&mut self, op: CompositeOp) {
        self.passes.push(Pass::Composite(CompositePass {
            target: TARGET,
            ops: vec![op],
        }));
    }

    /// Draw `ops` on the scratch layer, blur it, and composite it over the target.
    fn blurred(&mut self, ops: Vec<DrawOp>, blur: f64, mask: Option<SurfaceId>) {
        self.scene(SCRATCH, true, ops);
        self.passes.push(Pass::Offscreen(OffscreenPass {
            input: SCRATCH,
            output: SCRATCH,
            fx: shadow_blur_fx(blur, self.scale),
        }));
        self.passes.push(Pass::Composite(CompositePass {
            target: TARGET,
            ops: vec![CompositeOp::Over {
                src: SCRATCH,
                opacity: 1.0,
                mask,
            }],
        }));
    }

    fn clipped(&self, clip: &BezPath, ops: Vec<DrawOp>) -> Vec<DrawOp> {
        let mut out = Vec::with_capacity(ops.len() + 2);
        out.push(DrawOp::PushClip {
            path: clip.clone(),
            transform: self.transform,
        });
        out.extend(ops);
        out.push(DrawOp::PopLayer);
        out
    }

    fn fill(&self, path: BezPath, color: Rgba) -> DrawOp {
        DrawOp::FillPath {
            path,
            transform: self.transform,
            paint: Paint::Solid(color),
        }
    }

    fn fill_rect(&self, rect: Rect, color: Rgba) -> DrawOp {
        let mut path = BezPath::new();
        path.move_to((rect.x0, rect.y0));
        path.line_to((rect.x1, rect.y0));
        path.line_to((rect.x1, rect.y1));
        path.line_to((rect.x0, rect.y1));
        path.close_path();
        self.fill(path, color)
    }

    fn stroke(&self, path: BezPath, color: Rgba, width: f64) -> DrawOp {
        DrawOp::StrokePath {
            path,
            transform: self.transform,
            paint: Paint::Solid(color),
            width,
        }
    }

    /// Text op, or nothing for an empty string.
    fn text(
        &self,
        text: String,
        role: FontRole,
        size: f32,
        color: Rgba,
        anchor: Point,
        align: TextAlign,
    ) -> Option<DrawOp> {
        if text.is_empty() {
            return None;
        }
        Some(DrawOp::Text {
            run: TextRun {
                text,
                role,
                size,
                color,
                anchor,
                align,
            },
            transform: self.transform,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/compile.rs"]
mod tests;

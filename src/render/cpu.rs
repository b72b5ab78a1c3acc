use std::collections::HashMap;
use std::sync::Arc;

use crate::assets::decode::PortraitId;
use crate::assets::fonts::{FontRole, FontSet};
use crate::assets::text::{TextBrushRgba8, TextLayoutEngine, line_metrics};
use crate::foundation::core::{Affine, BezPath, Point};
use crate::foundation::error::{CardError, CardResult};
use crate::render::FrameRgba;
use crate::render::composite;
use crate::render::passes::{PassBackend, RenderResources};
use crate::render::plan::{
    CompositeOp, CompositePass, DrawOp, OffscreenPass, Paint, PassFx, RenderPlan, ScenePass,
    SurfaceDesc, SurfaceId, TextAlign, TextRun,
};

/// CPU pass backend on top of `vello_cpu`.
///
/// Each scene pass is rasterized on a fresh layer and composited over its target surface;
/// blur, overlay and erase work on the premultiplied bytes directly.
pub struct CpuBackend {
    fonts: FontSet,
    shapers: HashMap<FontRole, TextLayoutEngine>,
    font_data: HashMap<FontRole, vello_cpu::peniko::FontData>,
    portrait_cache: Option<(PortraitId, vello_cpu::Image)>,
    surfaces: HashMap<SurfaceId, CpuSurface>,
    ctx: Option<vello_cpu::RenderContext>,
    warned_no_fonts: bool,
}

struct CpuSurface {
    width: u16,
    height: u16,
    pixmap: vello_cpu::Pixmap,
}

impl CpuBackend {
    pub fn new(fonts: FontSet) -> Self {
        Self {
            fonts,
            shapers: HashMap::new(),
            font_data: HashMap::new(),
            portrait_cache: None,
            surfaces: HashMap::new(),
            ctx: None,
            warned_no_fonts: false,
        }
    }

    pub fn fonts(&self) -> &FontSet {
        &self.fonts
    }

    fn with_ctx_mut<R>(
        &mut self,
        width: u16,
        height: u16,
        f: impl FnOnce(&mut Self, &mut vello_cpu::RenderContext) -> CardResult<R>,
    ) -> CardResult<R> {
        let mut ctx = match self.ctx.take() {
            Some(ctx) if ctx.width() == width && ctx.height() == height => ctx,
            _ => vello_cpu::RenderContext::new(width, height),
        };
        ctx.reset();
        let out = f(self, &mut ctx);
        self.ctx = Some(ctx);
        out
    }

    fn surface(&self, id: SurfaceId) -> CardResult<&CpuSurface> {
        self.surfaces
            .get(&id)
            .ok_or_else(|| CardError::render(format!("surface {id:?} was not initialized")))
    }

    fn draw_op(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        op: &DrawOp,
        res: &RenderResources<'_>,
    ) -> CardResult<()> {
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);

        match op {
            DrawOp::FillPath {
                path,
                transform,
                paint,
            } => {
                ctx.set_transform(affine_to_cpu(*transform));
                set_paint(ctx, paint);
                ctx.fill_path(&bezpath_to_cpu(path));
            }
            DrawOp::StrokePath {
                path,
                transform,
                paint,
                width,
            } => {
                ctx.set_transform(affine_to_cpu(*transform));
                set_paint(ctx, paint);
                ctx.set_stroke(vello_cpu::kurbo::Stroke::new(*width));
                ctx.stroke_path(&bezpath_to_cpu(path));
            }
            DrawOp::Text { run, transform } => self.draw_text(ctx, run, *transform)?,
            DrawOp::Portrait {
                id,
                dest,
                transform,
            } => {
                let Some(portrait) = res.portrait.filter(|p| p.id == *id) else {
                    tracing::warn!(portrait = id.as_u64(), "portrait op without live portrait");
                    return Ok(());
                };
                let (w, h) = (f64::from(portrait.width), f64::from(portrait.height));
                let paint = self.portrait_paint(portrait)?;
                let place = Affine::translate((dest.x0, dest.y0))
                    * Affine::scale_non_uniform(dest.width() / w, dest.height() / h);
                ctx.set_transform(affine_to_cpu(*transform * place));
                ctx.set_paint(paint);
                ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, w, h));
            }
            DrawOp::PushClip { path, transform } => {
                ctx.set_transform(affine_to_cpu(*transform));
                ctx.push_clip_layer(&bezpath_to_cpu(path));
            }
            DrawOp::PushOpacity { opacity } => ctx.push_opacity_layer(*opacity),
            DrawOp::PopLayer => ctx.pop_layer(),
        }
        Ok(())
    }

    fn draw_text(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        run: &TextRun,
        transform: Affine,
    ) -> CardResult<()> {
        let Some(face) = self.fonts.face(run.role).cloned() else {
            if !self.warned_no_fonts {
                tracing::warn!("no fonts resolved, card text is not drawn");
                self.warned_no_fonts = true;
            }
            return Ok(());
        };

        if !self.shapers.contains_key(&run.role) {
            self.shapers
                .insert(run.role, TextLayoutEngine::for_face(&face)?);
        }
        let font = self
            .font_data
            .entry(run.role)
            .or_insert_with(|| {
                vello_cpu::peniko::FontData::new(
                    vello_cpu::peniko::Blob::from(face.bytes.as_ref().clone()),
                    face.index,
                )
            })
            .clone();
        let shaper = self
            .shapers
            .get_mut(&run.role)
            .ok_or_else(|| CardError::render("text shaper missing"))?;

        let layout = shaper.layout_line(&run.text, run.size, TextBrushRgba8::from(run.color))?;
        let metrics = line_metrics(&layout);
        let x = match run.align {
            TextAlign::Left => run.anchor.x,
            TextAlign::Right => run.anchor.x - f64::from(metrics.width),
        };
        let origin = Point::new(x, run.anchor.y - f64::from(metrics.baseline));
        ctx.set_transform(affine_to_cpu(transform * Affine::translate(origin.to_vec2())));

        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(glyph_run) = item else {
                    continue;
                };
                let brush = glyph_run.style().brush;
                ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                    brush.r, brush.g, brush.b, brush.a,
                ));
                let glyphs = glyph_run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                });
                ctx.glyph_run(&font)
                    .font_size(glyph_run.run().font_size())
                    .fill_glyphs(glyphs);
            }
        }
        Ok(())
    }

    fn portrait_paint(
        &mut self,
        portrait: &crate::assets::decode::PortraitImage,
    ) -> CardResult<vello_cpu::Image> {
        if let Some((id, paint)) = &self.portrait_cache
            && *id == portrait.id
        {
            return Ok(paint.clone());
        }

        let pixmap = image_premul_bytes_to_pixmap(
            &portrait.rgba8_premul(),
            portrait.width,
            portrait.height,
        )?;
        let paint = vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        };
        // Only one portrait is ever live, so one slot is enough.
        self.portrait_cache = Some((portrait.id, paint.clone()));
        Ok(paint)
    }
}

impl PassBackend for CpuBackend {
    fn ensure_surface(&mut self, id: SurfaceId, desc: &SurfaceDesc) -> CardResult<()> {
        let width: u16 = desc
            .width
            .try_into()
            .map_err(|_| CardError::render("surface width exceeds u16"))?;
        let height: u16 = desc
            .height
            .try_into()
            .map_err(|_| CardError::render("surface height exceeds u16"))?;

        match self.surfaces.get_mut(&id) {
            Some(s) if s.width == width && s.height == height => {
                s.pixmap.data_as_u8_slice_mut().fill(0);
            }
            _ => {
                self.surfaces.insert(
                    id,
                    CpuSurface {
                        width,
                        height,
                        pixmap: vello_cpu::Pixmap::new(width, height),
                    },
                );
            }
        }
        Ok(())
    }

    fn exec_scene(&mut self, pass: &ScenePass, res: &RenderResources<'_>) -> CardResult<()> {
        let (width, height) = {
            let s = self.surface(pass.target)?;
            (s.width, s.height)
        };

        let layer = self.with_ctx_mut(width, height, |this, ctx| {
            for op in &pass.ops {
                this.draw_op(ctx, op, res)?;
            }
            ctx.flush();
            let mut pixmap = vello_cpu::Pixmap::new(width, height);
            ctx.render_to_pixmap(&mut pixmap);
            Ok(pixmap)
        })?;

        let target = self
            .surfaces
            .get_mut(&pass.target)
            .ok_or_else(|| CardError::render("scene target vanished"))?;
        let dst = target.pixmap.data_as_u8_slice_mut();
        if pass.clear_to_transparent {
            dst.copy_from_slice(layer.data_as_u8_slice());
            Ok(())
        } else {
            composite::over_in_place(dst, layer.data_as_u8_slice(), 1.0, None)
        }
    }

    fn exec_offscreen(&mut self, pass: &OffscreenPass) -> CardResult<()> {
        let input = self.surface(pass.input)?;
        let (w, h) = (u32::from(input.width), u32::from(input.height));
        let input_bytes = input.pixmap.data_as_u8_slice();

        let out = match pass.fx {
            PassFx::Blur { radius_px, sigma } => {
                crate::render::blur::blur_rgba8_premul(input_bytes, w, h, radius_px, sigma)?
            }
        };

        let output = self
            .surfaces
            .get_mut(&pass.output)
            .ok_or_else(|| CardError::render("offscreen output was not initialized"))?;
        let dst = output.pixmap.data_as_u8_slice_mut();
        if dst.len() != out.len() {
            return Err(CardError::render(
                "offscreen input/output surface size mismatch",
            ));
        }
        dst.copy_from_slice(&out);
        Ok(())
    }

    fn exec_composite(&mut self, pass: &CompositePass, res: &RenderResources<'_>) -> CardResult<()> {
        let mut dst = self
            .surfaces
            .remove(&pass.target)
            .ok_or_else(|| CardError::render("composite target was not initialized"))?;
        let result = self.composite_into(&mut dst, pass, res);
        self.surfaces.insert(pass.target, dst);
        result
    }

    fn readback_rgba8(&mut self, surface: SurfaceId, plan: &RenderPlan) -> CardResult<FrameRgba> {
        let s = self.surface(surface)?;
        Ok(FrameRgba {
            width: plan.canvas.width,
            height: plan.canvas.height,
            data: s.pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        })
    }
}

impl CpuBackend {
    fn composite_into(
        &self,
        dst: &mut CpuSurface,
        pass: &CompositePass,
        res: &RenderResources<'_>,
    ) -> CardResult<()> {
        let (w, h) = (u32::from(dst.width), u32::from(dst.height));
        for op in &pass.ops {
            match *op {
                CompositeOp::Over { src, opacity, mask } => {
                    let src = self.surface(src)?.pixmap.data_as_u8_slice();
                    let mask = match mask {
                        Some(m) => Some(self.surface(m)?.pixmap.data_as_u8_slice()),
                        None => None,
                    };
                    composite::over_in_place(
                        dst.pixmap.data_as_u8_slice_mut(),
                        src,
                        opacity,
                        mask,
                    )?;
                }
                CompositeOp::OverlayNoise { mask } => {
                    let mask = self.surface(mask)?.pixmap.data_as_u8_slice();
                    composite::overlay_noise_in_place(
                        dst.pixmap.data_as_u8_slice_mut(),
                        w,
                        h,
                        res.noise,
                        mask,
                    )?;
                }
                CompositeOp::Erase { mask } => {
                    let mask = self.surface(mask)?.pixmap.data_as_u8_slice();
                    composite::erase_in_place(dst.pixmap.data_as_u8_slice_mut(), mask)?;
                }
            }
        }
        Ok(())
    }
}

fn set_paint(ctx: &mut vello_cpu::RenderContext, paint: &Paint) {
    match paint {
        Paint::Solid(c) => ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
            c.r,
            c.g,
            c.b,
            c.alpha_u8(),
        )),
        Paint::Linear { start, end, stops } => {
            let stops: Vec<vello_cpu::peniko::ColorStop> = stops
                .iter()
                .map(|s| {
                    let color = vello_cpu::peniko::Color::from_rgba8(
                        s.color.r,
                        s.color.g,
                        s.color.b,
                        s.color.alpha_u8(),
                    );
                    vello_cpu::peniko::ColorStop::from((s.offset, color))
                })
                .collect();
            let gradient = vello_cpu::peniko::Gradient::new_linear(
                point_to_cpu(*start),
                point_to_cpu(*end),
            )
            .with_stops(stops.as_slice());
            ctx.set_paint(gradient);
        }
    }
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn point_to_cpu(p: Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(point_to_cpu(p)),
            PathEl::LineTo(p) => out.line_to(point_to_cpu(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(point_to_cpu(p1), point_to_cpu(p2)),
            PathEl::CurveTo(p1, p2, p3) => {
                out.curve_to(point_to_cpu(p1), point_to_cpu(p2), point_to_cpu(p3));
            }
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

fn image_premul_bytes_to_pixmap(
    rgba8_premul: &[u8],
    width: u32,
    height: u32,
) -> CardResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| CardError::render("image width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| CardError::render("image height exceeds u16"))?;
    if rgba8_premul.len() != width as usize * height as usize * 4 {
        return Err(CardError::render("portrait byte length mismatch"));
    }

    let mut may_have_opacities = false;
    let pixels = rgba8_premul
        .chunks_exact(4)
        .map(|px| {
            may_have_opacities |= px[3] != 255;
            vello_cpu::peniko::color::PremulRgba8 {
                r: px[0],
                g: px[1],
                b: px[2],
                a: px[3],
            }
        })
        .collect();

    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}

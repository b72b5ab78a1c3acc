use crate::assets::decode::PortraitId;
use crate::assets::fonts::FontRole;
use crate::foundation::core::{Affine, BezPath, Canvas, Point, Rect, Rgba, Vec2};

#[derive(Clone, Debug)]
/// Backend-agnostic render plan for one card frame.
///
/// A plan consists of:
/// - surface declarations (`surfaces`)
/// - a sequence of passes (`passes`)
/// - a declared final surface (`final_surface`)
///
/// Every scene pass is rendered on its own layer and composited over its target, so the
/// order of passes is the paint order.
pub struct RenderPlan {
    pub canvas: Canvas,
    pub surfaces: Vec<SurfaceDesc>,
    pub passes: Vec<Pass>,
    pub final_surface: SurfaceId,
}

impl RenderPlan {
    /// All draw ops of all scene passes, in order.
    pub fn draw_ops(&self) -> impl Iterator<Item = &DrawOp> {
        self.passes.iter().flat_map(|p| match p {
            Pass::Scene(s) => s.ops.as_slice(),
            _ => &[][..],
        })
    }

    /// Text runs in paint order.
    pub fn text_runs(&self) -> impl Iterator<Item = &TextRun> {
        self.draw_ops().filter_map(|op| match op {
            DrawOp::Text { run, .. } => Some(run),
            _ => None,
        })
    }
}

#[derive(Clone, Debug)]
/// A single pass in a [`RenderPlan`].
pub enum Pass {
    Scene(ScenePass),
    Offscreen(OffscreenPass),
    Composite(CompositePass),
}

#[derive(Clone, Debug)]
/// Draw operations into a surface.
pub struct ScenePass {
    pub target: SurfaceId,
    pub ops: Vec<DrawOp>,
    /// Replace the target instead of compositing over it.
    pub clear_to_transparent: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
/// Identifier for a render surface declared in [`RenderPlan::surfaces`].
pub struct SurfaceId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelFormat {
    Rgba8Premul,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SurfaceDesc {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PassFx {
    /// Separable gaussian blur, in device pixels.
    Blur { radius_px: u32, sigma: f32 },
}

#[derive(Clone, Debug)]
/// Run a post-processing effect producing a new surface from an input surface.
pub struct OffscreenPass {
    pub input: SurfaceId,
    pub output: SurfaceId,
    pub fx: PassFx,
}

#[derive(Clone, Debug)]
pub struct CompositePass {
    pub target: SurfaceId,
    pub ops: Vec<CompositeOp>,
}

#[derive(Clone, Debug, PartialEq)]
/// A compositing operation between surfaces.
pub enum CompositeOp {
    /// Source-over, optionally restricted by the alpha of `mask`.
    Over {
        src: SurfaceId,
        opacity: f32,
        mask: Option<SurfaceId>,
    },
    /// Overlay-blend the tiled noise texture, restricted by `mask`.
    OverlayNoise { mask: SurfaceId },
    /// Destination-out: erase the target where `mask` is opaque.
    Erase { mask: SurfaceId },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GradientStop {
    pub offset: f32,
    pub color: Rgba,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Paint {
    Solid(Rgba),
    /// Linear gradient between two points in path space.
    Linear {
        start: Point,
        end: Point,
        stops: Vec<GradientStop>,
    },
}

impl Paint {
    /// Largest alpha the paint can produce.
    pub fn max_alpha(&self) -> f32 {
        match self {
            Paint::Solid(c) => c.a,
            Paint::Linear { stops, .. } => stops.iter().map(|s| s.color.a).fold(0.0, f32::max),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Right,
}

#[derive(Clone, Debug, PartialEq)]
/// One line of text anchored on its baseline, in logical units.
pub struct TextRun {
    pub text: String,
    pub role: FontRole,
    pub size: f32,
    pub color: Rgba,
    pub anchor: Point,
    pub align: TextAlign,
}

#[derive(Clone, Debug)]
/// Draw operation emitted by the card compiler.
pub enum DrawOp {
    FillPath {
        path: BezPath,
        transform: Affine,
        paint: Paint,
    },
    StrokePath {
        path: BezPath,
        transform: Affine,
        paint: Paint,
        width: f64,
    },
    Text {
        run: TextRun,
        transform: Affine,
    },
    /// The live portrait stretched onto `dest`.
    Portrait {
        id: PortraitId,
        dest: Rect,
        transform: Affine,
    },
    PushClip {
        path: BezPath,
        transform: Affine,
    },
    PushOpacity {
        opacity: f32,
    },
    PopLayer,
}

impl DrawOp {
    /// Shadow copy of a shape or text op: same coverage, painted in `color` scaled by the
    /// op's own alpha, shifted by `offset` logical units.
    pub fn shadow(&self, color: Rgba, offset: Vec2) -> Option<DrawOp> {
        let tint = |alpha: f32| Paint::Solid(Rgba { a: color.a * alpha, ..color });
        let shift = |t: &Affine| *t * Affine::translate(offset);
        match self {
            DrawOp::FillPath {
                path,
                transform,
                paint,
            } => Some(DrawOp::FillPath {
                path: path.clone(),
                transform: shift(transform),
                paint: tint(paint.max_alpha()),
            }),
            DrawOp::StrokePath {
                path,
                transform,
                paint,
                width,
            } => Some(DrawOp::StrokePath {
                path: path.clone(),
                transform: shift(transform),
                paint: tint(paint.max_alpha()),
                width: *width,
            }),
            DrawOp::Text { run, transform } => Some(DrawOp::Text {
                run: TextRun {
                    color: Rgba {
                        a: color.a * run.color.a,
                        ..color
                    },
                    ..run.clone()
                },
                transform: shift(transform),
            }),
            _ => None,
        }
    }
}

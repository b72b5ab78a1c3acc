use crate::assets::decode::PortraitImage;
use crate::foundation::error::{CardError, CardResult};
use crate::render::FrameRgba;
use crate::render::noise::NoiseTile;
use crate::render::plan::{
    CompositePass, OffscreenPass, Pass, RenderPlan, ScenePass, SurfaceDesc, SurfaceId,
};

/// Read-only inputs a backend may need while executing a plan.
#[derive(Clone, Copy, Debug)]
pub struct RenderResources<'a> {
    pub noise: &'a NoiseTile,
    pub portrait: Option<&'a PortraitImage>,
}

pub trait PassBackend {
    fn ensure_surface(&mut self, id: SurfaceId, desc: &SurfaceDesc) -> CardResult<()>;

    fn exec_scene(&mut self, pass: &ScenePass, res: &RenderResources<'_>) -> CardResult<()>;

    fn exec_offscreen(&mut self, pass: &OffscreenPass) -> CardResult<()>;

    fn exec_composite(&mut self, pass: &CompositePass, res: &RenderResources<'_>)
    -> CardResult<()>;

    fn readback_rgba8(&mut self, surface: SurfaceId, plan: &RenderPlan) -> CardResult<FrameRgba>;
}

pub fn execute_plan<B: PassBackend + ?Sized>(
    backend: &mut B,
    plan: &RenderPlan,
    res: &RenderResources<'_>,
) -> CardResult<FrameRgba> {
    for (idx, desc) in plan.surfaces.iter().enumerate() {
        let id = SurfaceId(
            idx.try_into()
                .map_err(|_| CardError::render("surface id overflow"))?,
        );
        backend.ensure_surface(id, desc)?;
    }

    for pass in &plan.passes {
        match pass {
            Pass::Scene(p) => backend.exec_scene(p, res)?,
            Pass::Offscreen(p) => backend.exec_offscreen(p)?,
            Pass::Composite(p) => backend.exec_composite(p, res)?,
        }
    }

    backend.readback_rgba8(plan.final_surface, plan)
}

#[cfg(test)]
#[path = "../../tests/unit/render/passes.rs"]
mod tests;

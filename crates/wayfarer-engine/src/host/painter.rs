use std::time::Duration;

use crate::coords::{Extent, PixelRect, Rect, Vec2};
use crate::device::kernel::SolidUniforms;
use crate::device::{FrameEncoder, Kernel, Output, Pass, TargetId};
use crate::paint::Color;
use crate::post::{FLAT_NORMAL, Geometry};

/// Default depth of viewport content; in front of nothing but the cleared far plane.
pub const DEFAULT_DEPTH: f32 = 0.5;

/// Per-frame facts handed to every renderable.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameInfo {
    pub frame_index: u64,
    /// Quantized frame id the depth clear was keyed on.
    pub frame_id: u64,
    /// Clamped seconds since the previous rendered frame.
    pub dt: f32,
    pub elapsed: Duration,
    pub canvas: Extent,
    pub scale_factor: f32,
}

/// Records one viewport's draws, confined to its rect.
///
/// Everything goes into a private encoder; the host appends it to the frame
/// only if the renderable's `draw` returned `Ok`.
#[derive(Debug)]
pub struct ViewportPainter {
    commands: FrameEncoder,
    geometry: Vec<Geometry>,
    rect: Rect,
    scissor: PixelRect,
    canvas: Extent,
    scale: f32,
    field: TargetId,
    depth: f32,
}

impl ViewportPainter {
    pub(crate) fn new(
        rect: Rect,
        scissor: PixelRect,
        canvas: Extent,
        scale: f32,
        field: TargetId,
    ) -> Self {
        Self {
            commands: FrameEncoder::new(),
            geometry: Vec::new(),
            rect,
            scissor,
            canvas,
            scale,
            field,
            depth: DEFAULT_DEPTH,
        }
    }

    /// Viewport rect in logical canvas pixels.
    #[inline]
    pub fn rect(&self) -> Rect {
        self.rect
    }

    /// Viewport rect in physical canvas pixels.
    #[inline]
    pub fn scissor(&self) -> PixelRect {
        self.scissor
    }

    /// The current distortion field (fluid dye, flowmap, or a neutral zero texel).
    #[inline]
    pub fn field(&self) -> TargetId {
        self.field
    }

    /// Depth for subsequent fills; smaller is closer.
    pub fn set_depth(&mut self, depth: f32) {
        self.depth = if depth.is_finite() { depth.clamp(0.0, 1.0) } else { DEFAULT_DEPTH };
    }

    pub fn fill(&mut self, color: Color) {
        self.fill_rect(Rect::from_origin_size(Vec2::zero(), self.rect.size), color);
    }

    /// Fills `local` (relative to the viewport's top-left), clipped to the viewport.
    pub fn fill_rect(&mut self, local: Rect, color: Color) {
        let uniforms = SolidUniforms {
            color: color.to_array(),
            params: [self.depth, 0.0, 0.0, 0.0],
        };
        self.push_content(local, Kernel::Solid(uniforms));
    }

    /// Fills the viewport with `color` displaced by the distortion field.
    pub fn fill_distorted(&mut self, color: Color, strength: f32) {
        self.fill_rect_distorted(Rect::from_origin_size(Vec2::zero(), self.rect.size), color, strength);
    }

    pub fn fill_rect_distorted(&mut self, local: Rect, color: Color, strength: f32) {
        let uniforms = SolidUniforms {
            color: color.to_array(),
            params: [self.depth, strength, 0.0, 0.0],
        };
        self.push_content(local, Kernel::FieldTint(uniforms));
    }

    /// Records an arbitrary pass. Canvas output is scissored to the viewport;
    /// passes writing the renderable's own targets are recorded as given.
    pub fn draw(&mut self, mut pass: Pass) {
        if pass.output == Output::Canvas {
            let scissor = match pass.scissor {
                Some(s) => s.intersect(self.scissor),
                None => Some(self.scissor),
            };
            let Some(scissor) = scissor else {
                return;
            };
            pass.scissor = Some(scissor);
        }
        self.commands.draw(pass);
    }

    /// Number of commands recorded so far.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    fn push_content(&mut self, local: Rect, kernel: Kernel) {
        let absolute = Rect::from_origin_size(self.rect.origin + local.origin, local.size);
        let Some(clipped) = absolute.intersect(self.rect) else {
            return;
        };
        let Some(scissor) = clipped
            .to_pixels(self.scale, self.canvas)
            .and_then(|px| px.intersect(self.scissor))
        else {
            return;
        };

        self.commands.draw(Pass::to_canvas(kernel).sample(0, self.field).scissor(scissor));
        self.geometry.push(Geometry {
            scissor,
            depth: self.depth,
            normal: FLAT_NORMAL,
        });
    }

    pub(crate) fn finish(self) -> (FrameEncoder, Vec<Geometry>) {
        (self.commands, self.geometry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{Command, GpuService, SoftService};
    use crate::render::RenderTarget;

    fn painter(gpu: &mut SoftService) -> ViewportPainter {
        let field = RenderTarget::create(gpu, "field", Extent::new(1, 1)).unwrap();
        ViewportPainter::new(
            Rect::new(10.0, 10.0, 20.0, 20.0),
            PixelRect::new(20, 20, 40, 40),
            Extent::new(100, 100),
            2.0,
            field.id,
        )
    }

    #[test]
    fn fill_is_scissored_to_viewport() {
        let mut gpu = SoftService::new(Extent::new(100, 100));
        let mut p = painter(&mut gpu);
        p.fill(Color::rgb(1.0, 0.0, 0.0));
        let (enc, geometry) = p.finish();
        match &enc.commands()[0] {
            Command::Draw(pass) => assert_eq!(pass.scissor, Some(PixelRect::new(20, 20, 40, 40))),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(geometry.len(), 1);
    }

    #[test]
    fn fill_rect_outside_viewport_records_nothing() {
        let mut gpu = SoftService::new(Extent::new(100, 100));
        let mut p = painter(&mut gpu);
        p.fill_rect(Rect::new(50.0, 50.0, 5.0, 5.0), Color::rgb(1.0, 1.0, 1.0));
        assert!(p.is_empty());
    }

    #[test]
    fn fill_rect_is_clipped() {
        let mut gpu = SoftService::new(Extent::new(100, 100));
        let mut p = painter(&mut gpu);
        p.fill_rect(Rect::new(15.0, 0.0, 20.0, 5.0), Color::rgb(1.0, 1.0, 1.0));
        let (enc, _) = p.finish();
        match &enc.commands()[0] {
            Command::Draw(pass) => assert_eq!(pass.scissor, Some(PixelRect::new(50, 20, 10, 10))),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn custom_canvas_pass_cannot_escape() {
        let mut gpu = SoftService::new(Extent::new(100, 100));
        let mut p = painter(&mut gpu);
        p.draw(Pass::to_canvas(Kernel::Copy).scissor(PixelRect::new(0, 0, 10, 10)));
        assert!(p.is_empty());
        p.draw(Pass::to_canvas(Kernel::Copy));
        assert_eq!(p.len(), 1);
        assert_eq!(gpu.live_targets(), 1);
    }
}

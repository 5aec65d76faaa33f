use crate::coords::Rect;
use crate::device::GpuService;
use crate::host::{FrameInfo, ViewportPainter};

/// Content a producer injects into the shared canvas.
///
/// Any resource allocated in [`attach`](Self::attach) must be freed in
/// [`release`](Self::release); the tunnel calls it exactly once on
/// unregistration.
pub trait Renderable {
    fn attach(&mut self, gpu: &mut dyn GpuService) -> anyhow::Result<()> {
        let _ = gpu;
        Ok(())
    }

    /// Records this viewport's draws. An error discards everything recorded
    /// by this call; other viewports are unaffected.
    fn draw(&mut self, painter: &mut ViewportPainter, frame: &FrameInfo) -> anyhow::Result<()>;

    fn release(&mut self, gpu: &mut dyn GpuService) {
        let _ = gpu;
    }
}

/// Non-GPU content that follows an anchor (a text label, a native widget).
pub trait Overlay {
    /// Anchor rect relative to the canvas origin, in logical pixels.
    fn place(&mut self, rect: Rect);

    /// The anchor is detached, hidden or has zero area.
    fn hide(&mut self) {}
}

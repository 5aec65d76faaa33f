//! Canvas host: owns the GPU service and runs one frame per tick on demand.
//!
//! Frame order, fixed:
//! background → depth clear → viewport content (registration order) →
//! flowmap/fluid update (once) → post chain → submit.
//!
//! Nothing here propagates a per-frame error; [`CanvasHost::tick`] reports a
//! [`TickOutcome`] instead.

mod painter;
mod scheduler;

use std::time::{Duration, Instant};

use anyhow::{Context, Result};

use crate::background::{BackgroundMesh, PreservationPolicy};
use crate::config::{EngineConfig, FrameLoop};
use crate::coords::{Extent, Vec2};
use crate::device::{DeviceError, FrameEncoder, GpuService, TargetId};
use crate::input::{DEFAULT_SPLAT_FORCE, InputEvent, PointerTracker};
use crate::paint::Color;
use crate::post::{Geometry, PostChain};
use crate::render::RenderTarget;
use crate::sim::{Flowmap, FluidSimulation};
use crate::time::{Debouncer, FrameClock};
use crate::tunnel::{
    AnchorId, LayoutProvider, Overlay, OverlayHandle, Renderable, Tunnel, ViewportHandle,
};

pub use painter::{DEFAULT_DEPTH, FrameInfo, ViewportPainter};
pub use scheduler::{RenderRequester, RenderScheduler};

/// Rendered frames the simulations keep animating after the last pointer input.
const SIM_SETTLE_FRAMES: u32 = 180;

/// What one tick did.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TickOutcome {
    /// Nothing requested a render.
    Idle,
    /// One frame was submitted.
    Rendered,
    /// A render was due but could not be submitted (empty canvas, transient error).
    Skipped,
    /// The context is gone; the canvas stays static until [`CanvasHost::remount`].
    ContextLost,
}

/// A physical canvas size waiting for the resize debounce.
#[derive(Debug, Copy, Clone)]
struct PendingResize {
    extent: Extent,
}

pub struct CanvasHost<G: GpuService> {
    gpu: G,
    config: EngineConfig,
    scheduler: RenderScheduler,
    clock: FrameClock,
    policy: PreservationPolicy,
    background: BackgroundMesh,
    tunnel: Tunnel,
    pointer: PointerTracker,
    flowmap: Option<Flowmap>,
    fluid: Option<FluidSimulation>,
    neutral: RenderTarget,
    post: PostChain,
    scale_factor: f32,
    resize: Debouncer,
    pending_resize: Option<PendingResize>,
    /// Commands recorded outside a tick (resets) that run at the start of the next frame.
    deferred: FrameEncoder,
    sim_activity: u32,
    context_lost: bool,
}

impl<G: GpuService> CanvasHost<G> {
    pub fn new(gpu: G, config: EngineConfig, scale_factor: f32) -> Result<Self> {
        Self::starting_at(gpu, config, scale_factor, Instant::now())
    }

    /// Creates a host whose clock starts at `start`. Tests drive ticks with
    /// instants derived from it.
    pub fn starting_at(
        mut gpu: G,
        config: EngineConfig,
        scale_factor: f32,
        start: Instant,
    ) -> Result<Self> {
        gpu.apply_global_state(&PreservationPolicy::global_state());

        let canvas = gpu.canvas_extent();
        let scale_factor = if scale_factor > 0.0 && scale_factor.is_finite() { scale_factor } else { 1.0 };

        let background = BackgroundMesh::new(&mut gpu, config.background.clone());

        let flowmap = if config.field.runs_flowmap() {
            Some(
                Flowmap::new(&mut gpu, config.flowmap.clone(), canvas)
                    .context("failed to allocate the flowmap")?,
            )
        } else {
            None
        };

        let fluid = if config.field.runs_fluid() {
            Some(
                FluidSimulation::new(&mut gpu, config.fluid.clone(), canvas)
                    .context("failed to allocate the fluid simulation")?,
            )
        } else {
            None
        };

        let neutral = RenderTarget::create(&mut gpu, "neutral field", Extent::new(1, 1))
            .context("failed to allocate the neutral field")?;

        let post = PostChain::new(&mut gpu, config.post.clone(), canvas)
            .context("failed to allocate post targets")?;

        let scheduler = RenderScheduler::new(config.scheduler.frameloop);
        let tunnel = Tunnel::new(Duration::from_millis(config.scheduler.layout_debounce_ms));
        let resize = Debouncer::new(Duration::from_millis(config.scheduler.resize_debounce_ms));
        let policy = PreservationPolicy::new(f64::from(config.scheduler.depth_clear_rate));
        let pointer = PointerTracker::new(logical_size(canvas, scale_factor), DEFAULT_SPLAT_FORCE);

        log::info!(
            "canvas host mounted: {}x{} @{scale_factor}, field {:?}",
            canvas.width,
            canvas.height,
            config.field
        );

        let host = Self {
            gpu,
            config,
            scheduler,
            clock: FrameClock::starting_at(start),
            policy,
            background,
            tunnel,
            pointer,
            flowmap,
            fluid,
            neutral,
            post,
            scale_factor,
            resize,
            pending_resize: None,
            deferred: FrameEncoder::new(),
            sim_activity: 0,
            context_lost: false,
        };
        host.request_render();
        Ok(host)
    }

    // ── accessors ──────────────────────────────────────────────────────────

    pub fn gpu(&self) -> &G {
        &self.gpu
    }

    pub fn gpu_mut(&mut self) -> &mut G {
        &mut self.gpu
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn scheduler(&self) -> &RenderScheduler {
        &self.scheduler
    }

    pub fn tunnel(&self) -> &Tunnel {
        &self.tunnel
    }

    pub fn background(&self) -> &BackgroundMesh {
        &self.background
    }

    /// Swaps the gradient's control colors and repaints. Only uniforms change.
    pub fn set_background_colors(&mut self, colors: [Color; 4]) {
        self.background.set_colors(colors);
        self.request_render();
    }

    pub fn set_background_amplitude(&mut self, amplitude: f32) {
        self.background.set_amplitude(amplitude);
        self.request_render();
    }

    pub fn flowmap(&self) -> Option<&Flowmap> {
        self.flowmap.as_ref()
    }

    pub fn fluid(&self) -> Option<&FluidSimulation> {
        self.fluid.as_ref()
    }

    pub fn pointer(&self) -> &PointerTracker {
        &self.pointer
    }

    pub fn scale_factor(&self) -> f32 {
        self.scale_factor
    }

    pub fn is_context_lost(&self) -> bool {
        self.context_lost
    }

    /// The distortion field consumers should sample: fluid dye if the fluid
    /// runs, else the flowmap, else a neutral zero texel.
    pub fn field(&self) -> TargetId {
        if let Some(fluid) = &self.fluid {
            fluid.output().id
        } else if let Some(flowmap) = &self.flowmap {
            flowmap.texture().id
        } else {
            self.neutral.id
        }
    }

    // ── invalidation ───────────────────────────────────────────────────────

    pub fn requester(&self) -> RenderRequester {
        self.scheduler.requester()
    }

    #[inline]
    pub fn request_render(&self) {
        self.scheduler.request_render();
    }

    pub fn force_render(&mut self) {
        self.scheduler.force_render();
    }

    pub fn set_frameloop(&mut self, frameloop: FrameLoop) {
        self.scheduler.set_frameloop(frameloop);
        self.request_render();
    }

    /// Whether the next tick would render (or has deferred work to do).
    pub fn needs_tick(&self) -> bool {
        !self.context_lost
            && (self.scheduler.is_pending()
                || self.pending_resize.is_some()
                || self.tunnel.is_refresh_pending())
    }

    // ── registry ───────────────────────────────────────────────────────────

    pub fn register_viewport(
        &mut self,
        anchor: AnchorId,
        renderable: Box<dyn Renderable>,
        layout: &dyn LayoutProvider,
    ) -> Result<ViewportHandle> {
        let handle = self.tunnel.register(&mut self.gpu, anchor, renderable, layout)?;
        self.request_render();
        Ok(handle)
    }

    pub fn unregister_viewport(&mut self, handle: ViewportHandle) -> bool {
        let removed = self.tunnel.unregister(&mut self.gpu, handle);
        if removed {
            self.request_render();
        }
        removed
    }

    pub fn register_overlay(
        &mut self,
        anchor: AnchorId,
        overlay: Box<dyn Overlay>,
        layout: &dyn LayoutProvider,
    ) -> OverlayHandle {
        let handle = self.tunnel.register_overlay(anchor, overlay, layout);
        self.request_render();
        handle
    }

    pub fn unregister_overlay(&mut self, handle: OverlayHandle) -> bool {
        self.tunnel.unregister_overlay(handle)
    }

    pub fn set_canvas_origin(&mut self, origin: Vec2) {
        self.tunnel.set_canvas_origin(origin);
        self.tunnel.invalidate_layout();
        self.request_render();
    }

    pub fn notify_scroll(&mut self, now: Instant) {
        self.tunnel.notify_scroll(now);
    }

    pub fn notify_element_resized(&mut self, handle: ViewportHandle) {
        self.tunnel.notify_element_resized(handle);
    }

    // ── input and resize ───────────────────────────────────────────────────

    /// Feeds one input event to the pointer tracker.
    pub fn handle_input(&mut self, event: &InputEvent, now: Instant) {
        let at = self.clock.elapsed(now);
        if self.pointer.handle(event, at) && (self.flowmap.is_some() || self.fluid.is_some()) {
            self.sim_activity = SIM_SETTLE_FRAMES;
            self.request_render();
        }
    }

    /// Resizes the canvas now and schedules the debounced reallocation of
    /// simulation and post targets.
    pub fn resize(&mut self, extent: Extent, scale_factor: f32, now: Instant) {
        if scale_factor > 0.0 && scale_factor.is_finite() {
            self.scale_factor = scale_factor;
        }
        if extent != self.gpu.canvas_extent() {
            self.gpu.resize_canvas(extent);
        }
        self.pointer.set_canvas_size(logical_size(extent, self.scale_factor));
        self.pending_resize = Some(PendingResize { extent });
        self.resize.poke(now);
        self.tunnel.notify_resize(now);
        self.request_render();
    }

    fn apply_pending_resize(&mut self) {
        let Some(PendingResize { extent }) = self.pending_resize.take() else {
            return;
        };
        log::debug!("reallocating targets for {}x{}", extent.width, extent.height);

        // Deferred resets name the released targets; the new ones start zeroed.
        self.deferred = FrameEncoder::new();
        if let Err(err) = self.reallocate(extent) {
            log::error!("target reallocation failed: {err}");
            if matches!(err, DeviceError::ContextLost) {
                self.context_lost = true;
            }
        }
    }

    fn reallocate(&mut self, extent: Extent) -> Result<(), DeviceError> {
        if let Some(flowmap) = &mut self.flowmap {
            flowmap.resize(&mut self.gpu, extent)?;
        }
        if let Some(fluid) = &mut self.fluid {
            fluid.resize(&mut self.gpu, extent)?;
        }
        self.post.resize(&mut self.gpu, extent)
    }

    /// Zeroes the simulations at the start of the next frame.
    pub fn reset_simulations(&mut self) {
        if let Some(fluid) = &self.fluid {
            fluid.reset(&mut self.deferred);
        }
        if let Some(flowmap) = &mut self.flowmap {
            flowmap.reset(&mut self.deferred);
        }
        self.pointer.queue_mut().drain();
        self.request_render();
    }

    // ── frame ──────────────────────────────────────────────────────────────

    /// Runs due debounced work (target reallocation, anchor refresh) without
    /// rendering. Returns whether the next tick would render.
    pub fn poll(&mut self, now: Instant, layout: &dyn LayoutProvider) -> bool {
        if self.context_lost {
            return false;
        }
        if self.resize.fire(now) {
            self.apply_pending_resize();
            self.request_render();
        }
        if self.tunnel.refresh(layout, now) {
            self.request_render();
        }
        !self.context_lost && self.scheduler.is_pending()
    }

    /// Runs at most one frame. Call once per animation-frame tick.
    pub fn tick(&mut self, now: Instant, layout: &dyn LayoutProvider) -> TickOutcome {
        self.poll(now, layout);
        if self.context_lost {
            return TickOutcome::ContextLost;
        }

        if !self.scheduler.take() {
            return TickOutcome::Idle;
        }

        let canvas = self.gpu.canvas_extent();
        if canvas.is_empty() {
            return TickOutcome::Skipped;
        }

        let time = self.clock.tick_at(now);
        if self.background.is_animated() {
            self.background.advance(time.dt_ms());
        }

        let mut frame = FrameEncoder::new();
        let frame_id = self
            .policy
            .begin_frame(&mut frame, self.background.pass(canvas), time.elapsed);
        frame.append(&mut self.deferred);

        let info = FrameInfo {
            frame_index: time.frame_index,
            frame_id,
            dt: time.dt,
            elapsed: time.elapsed,
            canvas,
            scale_factor: self.scale_factor,
        };
        let geometry = self.draw_viewports(&mut frame, &info);

        if let Some(flowmap) = &mut self.flowmap {
            flowmap.update(&mut frame, time.dt, self.pointer.position());
        }
        let splats = self.pointer.queue_mut().drain();
        if let Some(fluid) = &mut self.fluid {
            fluid.step(&mut frame, time.dt, &splats);
        }

        let field = self.field();
        self.post
            .record(&mut frame, canvas, &geometry, field, time.elapsed.as_secs_f32());

        self.tunnel.place_overlays();

        match self.gpu.submit(frame) {
            Ok(()) => {
                self.after_submit();
                TickOutcome::Rendered
            }
            Err(DeviceError::ContextLost) => {
                log::error!("GPU context lost; canvas is static until remount");
                self.context_lost = true;
                TickOutcome::ContextLost
            }
            Err(err) => {
                log::warn!("frame skipped: {err}");
                self.request_render();
                TickOutcome::Skipped
            }
        }
    }

    fn draw_viewports(&mut self, frame: &mut FrameEncoder, info: &FrameInfo) -> Vec<Geometry> {
        let field = self.field();
        let mut geometry = Vec::new();

        for (handle, entry) in self.tunnel.entries_mut() {
            if !entry.placement.is_drawable() {
                continue;
            }
            let rect = entry.placement.rect;
            let Some(scissor) = rect.to_pixels(info.scale_factor, info.canvas) else {
                continue;
            };

            let mut painter = ViewportPainter::new(rect, scissor, info.canvas, info.scale_factor, field);
            if let Err(err) = entry.renderable.draw(&mut painter, info) {
                log::warn!("viewport {handle:?} skipped this frame: {err:#}");
                continue;
            }
            let (mut commands, drawn) = painter.finish();
            // A bad pass from one viewport must not sink the whole submission.
            if let Err(err) = self.gpu.validate(&commands) {
                log::warn!("viewport {handle:?} recorded an invalid pass, skipped: {err}");
                continue;
            }
            frame.append(&mut commands);
            geometry.extend(drawn);
        }
        geometry
    }

    fn after_submit(&mut self) {
        if self.sim_activity > 0 {
            self.sim_activity -= 1;
        }
        if self.background.is_animated() || self.sim_activity > 0 {
            self.request_render();
        }
    }

    /// Re-creates the context after a loss: restores the service, applies
    /// global state once for the new context, resets the simulations and
    /// requests a frame.
    pub fn remount(&mut self, now: Instant) -> Result<()> {
        self.gpu.restore().context("failed to restore the GPU context")?;
        self.gpu.apply_global_state(&PreservationPolicy::global_state());
        self.background.restore(&mut self.gpu);

        self.deferred = FrameEncoder::new();
        self.context_lost = false;
        self.clock.reset(now);
        // A resize that arrived while the context was gone is applied before
        // the resets are recorded, so they name the surviving targets.
        if self.pending_resize.is_some() {
            self.resize.cancel();
            self.apply_pending_resize();
        }
        self.reset_simulations();
        log::info!("canvas remounted");
        Ok(())
    }

    /// Unregisters everything and frees every target the host owns.
    pub fn unmount(mut self) -> G {
        self.tunnel.clear(&mut self.gpu);
        if let Some(flowmap) = self.flowmap.take() {
            flowmap.release(&mut self.gpu);
        }
        if let Some(fluid) = self.fluid.take() {
            fluid.release(&mut self.gpu);
        }
        self.neutral.release(&mut self.gpu);
        self.post.release(&mut self.gpu);
        self.background.release(&mut self.gpu);
        self.gpu
    }
}

fn logical_size(extent: Extent, scale: f32) -> Vec2 {
    Vec2::new(extent.width as f32 / scale, extent.height as f32 / scale)
}

use crate::config::FlowmapConfig;
use crate::coords::{Extent, Vec2};
use crate::device::kernel::FlowmapUniforms;
use crate::device::{DeviceError, FrameEncoder, GpuService, Kernel, Pass};
use crate::render::{DoubleTarget, RenderTarget, grid_size};

/// Pointer-driven velocity field.
///
/// Texel layout: `rg` = smoothed pointer velocity (normalized units per
/// second, +Y down), `b` = stamp intensity. One update = one kernel pass plus
/// a swap; the field decays by `dissipation` per update and converges to zero
/// when the pointer stays put.
#[derive(Debug)]
pub struct Flowmap {
    config: FlowmapConfig,
    field: DoubleTarget,
    last_pointer: Option<Vec2>,
    velocity: Vec2,
}

impl Flowmap {
    pub fn new(
        gpu: &mut dyn GpuService,
        config: FlowmapConfig,
        canvas: Extent,
    ) -> Result<Self, DeviceError> {
        for msg in config.degeneracies() {
            log::warn!("flowmap: {msg}");
        }

        let field = DoubleTarget::create(gpu, "flowmap", grid_size(config.resolution, canvas))?;
        log::debug!("flowmap field {:?}", field.extent());

        Ok(Self {
            config,
            field,
            last_pointer: None,
            velocity: Vec2::zero(),
        })
    }

    pub fn config(&self) -> &FlowmapConfig {
        &self.config
    }

    /// The current field. Valid until the next [`update`](Self::update).
    #[inline]
    pub fn texture(&self) -> RenderTarget {
        self.field.read()
    }

    /// Smoothed pointer velocity fed into the last update.
    #[inline]
    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    /// Records one decay/stamp pass. `pointer` is the normalized pointer
    /// position, `None` when the pointer is off the canvas.
    pub fn update(&mut self, frame: &mut FrameEncoder, dt: f32, pointer: Option<Vec2>) {
        let smoothing = self.config.velocity_smoothing.clamp(0.0, 1.0);

        match (pointer, self.last_pointer) {
            (Some(p), Some(last)) if dt > 0.0 => {
                let raw = (p - last) / dt;
                self.velocity = raw.lerp(self.velocity, smoothing);
            }
            _ => self.velocity = self.velocity * smoothing,
        }
        if !self.velocity.is_finite() {
            self.velocity = Vec2::zero();
        }
        self.last_pointer = pointer;

        let extent = self.field.extent();
        let [tx, ty] = extent.texel();
        let p = pointer.unwrap_or_default();
        let uniforms = FlowmapUniforms {
            texel_aspect: [tx, ty, extent.aspect(), self.config.dissipation],
            pointer: [p.x, p.y, self.velocity.x, self.velocity.y],
            params: [
                self.config.falloff,
                self.config.alpha,
                if pointer.is_some() { 1.0 } else { 0.0 },
                0.0,
            ],
        };

        frame.draw(
            Pass::to_target(Kernel::Flowmap(uniforms), self.field.write().id)
                .sample(0, self.field.read().id),
        );
        self.field.swap();
    }

    /// Zeroes the field and forgets pointer history.
    pub fn reset(&mut self, frame: &mut FrameEncoder) {
        self.field.clear(frame);
        self.last_pointer = None;
        self.velocity = Vec2::zero();
    }

    /// Reallocates the field for a new canvas size. Contents start at zero.
    /// Returns `false` when the grid size is unchanged.
    pub fn resize(&mut self, gpu: &mut dyn GpuService, canvas: Extent) -> Result<bool, DeviceError> {
        let extent = grid_size(self.config.resolution, canvas);
        if extent == self.field.extent() {
            return Ok(false);
        }

        let field = DoubleTarget::create(gpu, "flowmap", extent)?;
        std::mem::replace(&mut self.field, field).release(gpu);
        self.last_pointer = None;
        Ok(true)
    }

    pub fn release(self, gpu: &mut dyn GpuService) {
        self.field.release(gpu);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::SoftService;

    fn setup() -> (SoftService, Flowmap) {
        let mut gpu = SoftService::new(Extent::new(64, 64));
        let config = FlowmapConfig {
            resolution: 16,
            ..FlowmapConfig::default()
        };
        let flowmap = Flowmap::new(&mut gpu, config, Extent::new(64, 64)).unwrap();
        (gpu, flowmap)
    }

    fn peak(gpu: &SoftService, target: RenderTarget) -> f32 {
        gpu.target_pixels(target.id)
            .unwrap()
            .iter()
            .map(|p| p[0].abs().max(p[1].abs()).max(p[2].abs()))
            .fold(0.0, f32::max)
    }

    #[test]
    fn moving_pointer_stamps_velocity() {
        let (mut gpu, mut flowmap) = setup();

        for i in 0..4 {
            let mut frame = FrameEncoder::new();
            let x = 0.3 + i as f32 * 0.05;
            flowmap.update(&mut frame, 1.0 / 60.0, Some(Vec2::new(x, 0.5)));
            gpu.submit(frame).unwrap();
        }

        assert!(flowmap.velocity().x > 0.0);
        let center = gpu.sample_target(flowmap.texture().id, Vec2::new(0.45, 0.5)).unwrap();
        assert!(center[0] > 0.0, "{center:?}");
        assert!(center[2] > 0.0);
    }

    #[test]
    fn stationary_pointer_converges_to_zero() {
        let (mut gpu, mut flowmap) = setup();

        let mut frame = FrameEncoder::new();
        flowmap.update(&mut frame, 0.016, Some(Vec2::new(0.2, 0.2)));
        flowmap.update(&mut frame, 0.016, Some(Vec2::new(0.6, 0.6)));
        gpu.submit(frame).unwrap();
        let start = peak(&gpu, flowmap.texture());
        assert!(start > 0.0);

        for _ in 0..600 {
            let mut frame = FrameEncoder::new();
            flowmap.update(&mut frame, 0.016, Some(Vec2::new(0.6, 0.6)));
            gpu.submit(frame).unwrap();
        }
        assert!(peak(&gpu, flowmap.texture()) < start * 1e-3);
    }

    #[test]
    fn update_swaps_sides() {
        let (_gpu, mut flowmap) = setup();
        let before = flowmap.texture();
        let mut frame = FrameEncoder::new();
        flowmap.update(&mut frame, 0.016, None);
        assert_ne!(flowmap.texture(), before);
        assert_eq!(frame.len(), 1);
    }

    #[test]
    fn resize_reallocates_only_on_change() {
        let (mut gpu, mut flowmap) = setup();
        assert!(!flowmap.resize(&mut gpu, Extent::new(64, 64)).unwrap());
        assert!(flowmap.resize(&mut gpu, Extent::new(128, 64)).unwrap());
        assert_eq!(flowmap.texture().extent, Extent::new(32, 16));
        assert_eq!(gpu.live_targets(), 2);
    }
}

use crate::config::FluidConfig;
use crate::coords::Extent;
use crate::device::kernel::{
    AdvectUniforms, GridUniforms, ScaleUniforms, SplatUniforms, VorticityUniforms,
};
use crate::device::{DeviceError, FrameEncoder, GpuService, Kernel, Pass};
use crate::input::SplatEvent;
use crate::render::{DoubleTarget, RenderTarget, grid_size};

/// Grid sizes derived from a config and a canvas.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct FluidGrids {
    /// Velocity, pressure, curl and divergence.
    pub sim: Extent,
    pub dye: Extent,
}

impl FluidGrids {
    /// The simulation grid never exceeds half the dye grid.
    pub fn new(config: &FluidConfig, canvas: Extent) -> Self {
        let dye_res = config.dye_resolution.max(2);
        let sim_res = config.sim_resolution.clamp(1, dye_res / 2);
        Self {
            sim: grid_size(sim_res, canvas),
            dye: grid_size(dye_res, canvas),
        }
    }
}

#[derive(Debug)]
struct Fields {
    velocity: DoubleTarget,
    dye: DoubleTarget,
    pressure: DoubleTarget,
    divergence: RenderTarget,
    curl: RenderTarget,
}

impl Fields {
    fn create(gpu: &mut dyn GpuService, grids: FluidGrids) -> Result<Self, DeviceError> {
        let mut made = Vec::with_capacity(8);
        let result = Self::try_create(gpu, grids, &mut made);
        if result.is_err() {
            for target in made {
                target.release(gpu);
            }
        }
        result
    }

    /// Records every allocation in `made` so a failure can release them.
    fn try_create(
        gpu: &mut dyn GpuService,
        grids: FluidGrids,
        made: &mut Vec<RenderTarget>,
    ) -> Result<Self, DeviceError> {
        let velocity = DoubleTarget::create(gpu, "fluid velocity", grids.sim)?;
        made.extend([velocity.read(), velocity.write()]);
        let dye = DoubleTarget::create(gpu, "fluid dye", grids.dye)?;
        made.extend([dye.read(), dye.write()]);
        let pressure = DoubleTarget::create(gpu, "fluid pressure", grids.sim)?;
        made.extend([pressure.read(), pressure.write()]);
        let divergence = RenderTarget::create(gpu, "fluid divergence", grids.sim)?;
        made.push(divergence);
        let curl = RenderTarget::create(gpu, "fluid curl", grids.sim)?;
        Ok(Fields {
            velocity,
            dye,
            pressure,
            divergence,
            curl,
        })
    }

    fn clear(&self, frame: &mut FrameEncoder) {
        self.velocity.clear(frame);
        self.dye.clear(frame);
        self.pressure.clear(frame);
        frame.clear_target(self.divergence.id, [0.0; 4]);
        frame.clear_target(self.curl.id, [0.0; 4]);
    }

    fn release(self, gpu: &mut dyn GpuService) {
        self.velocity.release(gpu);
        self.dye.release(gpu);
        self.pressure.release(gpu);
        self.divergence.release(gpu);
        self.curl.release(gpu);
    }
}

/// Stable-fluids solver on ping-pong float targets.
///
/// Velocity is stored in simulation texels per second. Boundaries are
/// implicit: every sample clamps to the edge texel.
///
/// One [`step`](Self::step) records, in order: pending splats, velocity
/// self-advection, dye advection, curl, vorticity confinement, divergence,
/// pressure decay, `pressure_iterations` Jacobi sweeps and the gradient
/// subtraction.
#[derive(Debug)]
pub struct FluidSimulation {
    config: FluidConfig,
    canvas: Extent,
    grids: FluidGrids,
    fields: Fields,
}

impl FluidSimulation {
    pub fn new(
        gpu: &mut dyn GpuService,
        config: FluidConfig,
        canvas: Extent,
    ) -> Result<Self, DeviceError> {
        for msg in config.degeneracies() {
            log::warn!("fluid: {msg}");
        }

        let grids = FluidGrids::new(&config, canvas);
        let fields = Fields::create(gpu, grids)?;
        log::debug!("fluid grids: sim {:?}, dye {:?}", grids.sim, grids.dye);

        Ok(Self {
            config,
            canvas,
            grids,
            fields,
        })
    }

    pub fn config(&self) -> &FluidConfig {
        &self.config
    }

    pub fn grids(&self) -> FluidGrids {
        self.grids
    }

    /// The dye field; the distortion consumers sample this.
    #[inline]
    pub fn output(&self) -> RenderTarget {
        self.fields.dye.read()
    }

    #[inline]
    pub fn velocity(&self) -> RenderTarget {
        self.fields.velocity.read()
    }

    #[inline]
    pub fn pressure(&self) -> RenderTarget {
        self.fields.pressure.read()
    }

    /// Effective time step for a real delta: clamped to `[0, max_step_ms]`.
    pub fn step_dt(&self, dt: f32) -> f32 {
        let max = (self.config.max_step_ms / 1000.0).max(0.0);
        if dt.is_finite() { dt.clamp(0.0, max) } else { 0.0 }
    }

    /// Records one simulation step. `splats` are applied first, in order.
    pub fn step(&mut self, frame: &mut FrameEncoder, dt: f32, splats: &[SplatEvent]) {
        let dt = self.step_dt(dt);

        for splat in splats {
            self.splat(frame, splat);
        }

        let sim = self.grids.sim;
        let [tx, ty] = sim.texel();
        let f = &mut self.fields;

        frame.draw(
            Pass::to_target(
                Kernel::Advect(AdvectUniforms {
                    texel_dt: [tx, ty, dt, self.config.velocity_dissipation],
                }),
                f.velocity.write().id,
            )
            .sample(0, f.velocity.read().id)
            .sample(1, f.velocity.read().id),
        );
        f.velocity.swap();

        frame.draw(
            Pass::to_target(
                Kernel::Advect(AdvectUniforms {
                    texel_dt: [tx, ty, dt, self.config.density_dissipation],
                }),
                f.dye.write().id,
            )
            .sample(0, f.velocity.read().id)
            .sample(1, f.dye.read().id),
        );
        f.dye.swap();

        let grid = GridUniforms {
            texel: [tx, ty, 0.0, 0.0],
        };

        frame.draw(Pass::to_target(Kernel::Curl(grid), f.curl.id).sample(0, f.velocity.read().id));

        frame.draw(
            Pass::to_target(
                Kernel::Vorticity(VorticityUniforms {
                    texel_dt: [tx, ty, dt, self.config.curl_strength],
                }),
                f.velocity.write().id,
            )
            .sample(0, f.velocity.read().id)
            .sample(1, f.curl.id),
        );
        f.velocity.swap();

        frame.draw(
            Pass::to_target(Kernel::Divergence(grid), f.divergence.id)
                .sample(0, f.velocity.read().id),
        );

        frame.draw(
            Pass::to_target(
                Kernel::Scale(ScaleUniforms {
                    factor: [self.config.pressure_dissipation, 0.0, 0.0, 0.0],
                }),
                f.pressure.write().id,
            )
            .sample(0, f.pressure.read().id),
        );
        f.pressure.swap();

        for _ in 0..self.config.pressure_iterations {
            frame.draw(
                Pass::to_target(Kernel::Jacobi(grid), f.pressure.write().id)
                    .sample(0, f.pressure.read().id)
                    .sample(1, f.divergence.id),
            );
            f.pressure.swap();
        }

        frame.draw(
            Pass::to_target(Kernel::GradientSubtract(grid), f.velocity.write().id)
                .sample(0, f.pressure.read().id)
                .sample(1, f.velocity.read().id),
        );
        f.velocity.swap();
    }

    /// Injects one Gaussian impulse into velocity and dye.
    fn splat(&mut self, frame: &mut FrameEncoder, splat: &SplatEvent) {
        if self.config.splat_radius <= 0.0 || !splat.position.is_finite() || !splat.delta.is_finite() {
            return;
        }

        let aspect = self.canvas.aspect();
        let point = [splat.position.x, splat.position.y, 0.0, 0.0];
        let scale = self.config.dye_color_scale;
        let (dx, dy) = (splat.delta.x, splat.delta.y);

        let f = &mut self.fields;

        let [tx, ty] = f.velocity.texel();
        frame.draw(
            Pass::to_target(
                Kernel::Splat(SplatUniforms {
                    texel_aspect: [tx, ty, aspect, self.config.splat_radius],
                    point,
                    value: [dx, dy, 0.0, 0.0],
                }),
                f.velocity.write().id,
            )
            .sample(0, f.velocity.read().id),
        );
        f.velocity.swap();

        let [tx, ty] = f.dye.texel();
        frame.draw(
            Pass::to_target(
                Kernel::Splat(SplatUniforms {
                    texel_aspect: [tx, ty, aspect, self.config.splat_radius],
                    point,
                    value: [dx.abs() * scale, dy.abs() * scale, 0.0, 0.0],
                }),
                f.dye.write().id,
            )
            .sample(0, f.dye.read().id),
        );
        f.dye.swap();
    }

    /// Records a constant fill of the current velocity field, in simulation
    /// texels per second.
    pub fn fill_velocity(&self, frame: &mut FrameEncoder, vx: f32, vy: f32) {
        frame.clear_target(self.fields.velocity.read().id, [vx, vy, 0.0, 1.0]);
    }

    /// Zeroes every field.
    pub fn reset(&self, frame: &mut FrameEncoder) {
        self.fields.clear(frame);
    }

    /// Reallocates the grids for a new canvas size; fields restart at zero.
    /// Returns `false` when neither grid changes.
    pub fn resize(&mut self, gpu: &mut dyn GpuService, canvas: Extent) -> Result<bool, DeviceError> {
        let grids = FluidGrids::new(&self.config, canvas);
        self.canvas = canvas;
        if grids == self.grids {
            return Ok(false);
        }

        let fields = Fields::create(gpu, grids)?;
        std::mem::replace(&mut self.fields, fields).release(gpu);
        self.grids = grids;
        Ok(true)
    }

    pub fn release(self, gpu: &mut dyn GpuService) {
        self.fields.release(gpu);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Vec2;
    use crate::device::SoftService;

    fn small() -> FluidConfig {
        FluidConfig {
            sim_resolution: 16,
            dye_resolution: 32,
            ..FluidConfig::default()
        }
    }

    #[test]
    fn sim_grid_is_clamped_to_half_dye() {
        let config = FluidConfig {
            sim_resolution: 400,
            dye_resolution: 256,
            ..FluidConfig::default()
        };
        let grids = FluidGrids::new(&config, Extent::new(100, 100));
        assert_eq!(grids.sim, Extent::new(128, 128));
        assert_eq!(grids.dye, Extent::new(256, 256));
    }

    #[test]
    fn allocates_eight_targets() {
        let mut gpu = SoftService::new(Extent::new(32, 32));
        let sim = FluidSimulation::new(&mut gpu, small(), Extent::new(32, 32)).unwrap();
        assert_eq!(gpu.live_targets(), 8);
        sim.release(&mut gpu);
        assert_eq!(gpu.live_targets(), 0);
    }

    #[test]
    fn step_dt_is_clamped() {
        let mut gpu = SoftService::new(Extent::new(32, 32));
        let sim = FluidSimulation::new(&mut gpu, small(), Extent::new(32, 32)).unwrap();
        assert!((sim.step_dt(1.0) - 0.033).abs() < 1e-6);
        assert_eq!(sim.step_dt(-1.0), 0.0);
        assert_eq!(sim.step_dt(f32::NAN), 0.0);
    }

    #[test]
    fn step_records_passes_in_order() {
        let mut gpu = SoftService::new(Extent::new(32, 32));
        let mut sim = FluidSimulation::new(&mut gpu, small(), Extent::new(32, 32)).unwrap();
        let mut frame = FrameEncoder::new();
        let splat = SplatEvent::new(Vec2::new(0.5, 0.5), Vec2::new(1.0, 0.0));
        sim.step(&mut frame, 0.016, &[splat]);

        use crate::device::{Command, KernelKind};
        let kinds: Vec<KernelKind> = frame
            .commands()
            .iter()
            .filter_map(|c| match c {
                Command::Draw(p) => Some(p.kernel.kind()),
                _ => None,
            })
            .collect();
        assert_eq!(
            kinds,
            vec![
                KernelKind::Splat,
                KernelKind::Splat,
                KernelKind::Advect,
                KernelKind::Advect,
                KernelKind::Curl,
                KernelKind::Vorticity,
                KernelKind::Divergence,
                KernelKind::Scale,
                KernelKind::Jacobi,
                KernelKind::Jacobi,
                KernelKind::Jacobi,
                KernelKind::GradientSubtract,
            ]
        );
        gpu.submit(frame).unwrap();
    }

    #[test]
    fn splat_pushes_dye_and_velocity() {
        let mut gpu = SoftService::new(Extent::new(32, 32));
        let mut sim = FluidSimulation::new(&mut gpu, small(), Extent::new(32, 32)).unwrap();
        let mut frame = FrameEncoder::new();
        sim.step(
            &mut frame,
            0.016,
            &[SplatEvent::new(Vec2::new(0.5, 0.5), Vec2::new(10.0, 0.0))],
        );
        gpu.submit(frame).unwrap();

        let v = gpu.sample_target(sim.velocity().id, Vec2::new(0.5, 0.5)).unwrap();
        assert!(v[0] > 0.0, "{v:?}");
        let d = gpu.sample_target(sim.output().id, Vec2::new(0.5, 0.5)).unwrap();
        assert!(d[0] > 0.0);
        assert!(d[1].abs() < 1e-3);
    }

    #[test]
    fn zero_radius_ignores_splats() {
        let mut gpu = SoftService::new(Extent::new(32, 32));
        let config = FluidConfig {
            splat_radius: 0.0,
            ..small()
        };
        let mut sim = FluidSimulation::new(&mut gpu, config, Extent::new(32, 32)).unwrap();
        let mut frame = FrameEncoder::new();
        sim.step(
            &mut frame,
            0.016,
            &[SplatEvent::new(Vec2::new(0.5, 0.5), Vec2::new(10.0, 0.0))],
        );
        gpu.submit(frame).unwrap();

        let pixels = gpu.target_pixels(sim.output().id).unwrap();
        assert!(pixels.iter().all(|p| p[0] == 0.0));
    }

    #[test]
    fn resize_keeps_target_count() {
        let mut gpu = SoftService::new(Extent::new(32, 32));
        let mut sim = FluidSimulation::new(&mut gpu, small(), Extent::new(32, 32)).unwrap();
        assert!(!sim.resize(&mut gpu, Extent::new(32, 32)).unwrap());
        assert!(sim.resize(&mut gpu, Extent::new(64, 32)).unwrap());
        assert_eq!(sim.grids().sim, Extent::new(32, 16));
        assert_eq!(gpu.live_targets(), 8);
    }
}

use std::path::Path;

use anyhow::{Context, Result};

use crate::config::BackgroundConfig;
use crate::coords::Extent;
use crate::device::kernel::BackgroundUniforms;
use crate::device::{GpuService, Kernel, Pass};
use crate::paint::Color;
use crate::render::RenderTarget;

/// Scale from simulated milliseconds to noise time.
const NOISE_SPEED: f32 = 5e-6;

/// Displacement layer: freq x, freq y, speed, flow.
const DEFORM: [f32; 4] = [3.0, 4.0, 10.0, 3.0];

/// How the background fills the canvas.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BackgroundMode {
    Gradient,
    /// Flat control color 0; used when the grain texture failed to load.
    Solid,
}

/// Decoded grain texels, kept so the texture can be re-uploaded after a
/// context loss.
#[derive(Debug)]
struct Grain {
    extent: Extent,
    rgba: Vec<f32>,
    target: Option<RenderTarget>,
}

/// Full-canvas gradient mesh displaced by simplex noise.
///
/// Owns only its simulated clock and shader parameters; geometry is
/// generated in the vertex stage from the segment counts, so changing colors
/// or amplitude never reallocates anything.
#[derive(Debug)]
pub struct BackgroundMesh {
    config: BackgroundConfig,
    colors: [Color; 4],
    time_ms: f64,
    mode: BackgroundMode,
    grain: Option<Grain>,
}

impl BackgroundMesh {
    pub fn new(gpu: &mut dyn GpuService, config: BackgroundConfig) -> Self {
        let colors = config.resolved_colors();
        let mut mesh = Self {
            config,
            colors,
            time_ms: 0.0,
            mode: BackgroundMode::Gradient,
            grain: None,
        };

        if let Some(path) = mesh.config.grain_texture.clone() {
            match load_grain(&path) {
                Ok((extent, rgba)) => {
                    mesh.grain = Some(Grain {
                        extent,
                        rgba,
                        target: None,
                    });
                    mesh.upload_grain(gpu);
                }
                Err(err) => {
                    log::warn!("background grain unavailable, using solid fill: {err:#}");
                    mesh.mode = BackgroundMode::Solid;
                }
            }
        }

        mesh
    }

    pub fn config(&self) -> &BackgroundConfig {
        &self.config
    }

    #[inline]
    pub fn mode(&self) -> BackgroundMode {
        self.mode
    }

    /// Simulated time in milliseconds.
    #[inline]
    pub fn time_ms(&self) -> f64 {
        self.time_ms
    }

    /// Whether the host should keep requesting frames for this mesh.
    pub fn is_animated(&self) -> bool {
        self.config.animate && self.mode == BackgroundMode::Gradient && self.config.speed != 0.0
    }

    /// Folds a wall-clock delta into simulated time and returns the new time.
    ///
    /// The delta is clamped to `[0, max_delta_ms]` before scaling by `speed`.
    pub fn advance(&mut self, real_dt_ms: f32) -> f64 {
        let max = self.config.max_delta_ms.max(0.0);
        let dt = if real_dt_ms.is_finite() { real_dt_ms.clamp(0.0, max) } else { 0.0 };
        self.time_ms += f64::from(dt) * f64::from(self.config.speed);
        self.time_ms
    }

    pub fn colors(&self) -> [Color; 4] {
        self.colors
    }

    pub fn set_colors(&mut self, colors: [Color; 4]) {
        self.colors = colors;
    }

    pub fn set_amplitude(&mut self, amplitude: f32) {
        self.config.amplitude = amplitude;
    }

    /// Grid segments for `canvas`: `ceil(size * density)`, at least one each way.
    pub fn segments(&self, canvas: Extent) -> (u32, u32) {
        let [dx, dy] = self.config.density;
        let seg = |size: u32, density: f32| ((size as f32 * density.max(0.0)).ceil() as u32).max(1);
        (seg(canvas.width, dx), seg(canvas.height, dy))
    }

    pub fn uniforms(&self, canvas: Extent) -> BackgroundUniforms {
        let (sx, sy) = self.segments(canvas);
        let seed = self.config.seed;
        let time = (self.time_ms as f32) * NOISE_SPEED;
        let rgb = |c: Color| {
            let [r, g, b, _] = c.to_array();
            [r, g, b, 1.0]
        };

        let waves_a = std::array::from_fn(|i| {
            let k = (i + 1) as f32;
            [2.0 + k / 3.0, 3.0 + k / 3.0, 11.0 + 0.3 * k, 6.5 + 0.3 * k]
        });
        let waves_b = std::array::from_fn(|i| {
            let k = (i + 1) as f32;
            [seed + 10.0 * k, 0.1, 0.63 + 0.07 * k, 0.0]
        });

        let grain_bound = self.grain_target().is_some();

        BackgroundUniforms {
            resolution: [canvas.width as f32, canvas.height as f32, sx as f32, sy as f32],
            global: [time, self.config.freq_x, self.config.freq_y, self.config.amplitude],
            deform: DEFORM,
            shade: [
                seed,
                if self.config.darken_top { 1.0 } else { 0.0 },
                self.config.shadow_power,
                match self.mode {
                    BackgroundMode::Gradient => 0.0,
                    BackgroundMode::Solid => 1.0,
                },
            ],
            grain: [
                self.config.grain_strength,
                if grain_bound { 1.0 } else { 0.0 },
                0.0,
                0.0,
            ],
            colors: self.colors.map(rgb),
            waves_a,
            waves_b,
        }
    }

    /// The canvas pass that repaints every pixel.
    pub fn pass(&self, canvas: Extent) -> Pass {
        let pass = Pass::to_canvas(Kernel::Background(self.uniforms(canvas)));
        match self.grain_target() {
            Some(target) => pass.sample(0, target.id),
            None => pass,
        }
    }

    fn grain_target(&self) -> Option<RenderTarget> {
        self.grain.as_ref().and_then(|g| g.target)
    }

    fn upload_grain(&mut self, gpu: &mut dyn GpuService) {
        let Some(grain) = self.grain.as_mut() else {
            return;
        };
        if let Some(old) = grain.target.take() {
            old.release(gpu);
        }
        match RenderTarget::with_data(gpu, "background grain", grain.extent, &grain.rgba) {
            Ok(target) => grain.target = Some(target),
            Err(err) => {
                log::warn!("background grain upload failed, using solid fill: {err}");
                self.mode = BackgroundMode::Solid;
            }
        }
    }

    /// Re-uploads GPU-side state after the context was restored.
    pub fn restore(&mut self, gpu: &mut dyn GpuService) {
        if self.grain.is_some() && self.mode == BackgroundMode::Gradient {
            self.upload_grain(gpu);
        }
    }

    pub fn release(self, gpu: &mut dyn GpuService) {
        if let Some(target) = self.grain.and_then(|g| g.target) {
            target.release(gpu);
        }
    }
}

fn load_grain(path: &Path) -> Result<(Extent, Vec<f32>)> {
    let image = image::open(path)
        .with_context(|| format!("failed to decode {}", path.display()))?
        .into_rgba32f();
    let extent = Extent::new(image.width(), image.height());
    Ok((extent, image.into_raw()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::SoftService;

    fn mesh(config: BackgroundConfig) -> BackgroundMesh {
        let mut gpu = SoftService::new(Extent::new(8, 8));
        BackgroundMesh::new(&mut gpu, config)
    }

    #[test]
    fn long_stall_advances_by_at_most_max_delta() {
        let mut bg = mesh(BackgroundConfig {
            speed: 2.0,
            ..BackgroundConfig::default()
        });
        assert_eq!(bg.advance(5000.0), 132.0);
        assert_eq!(bg.advance(10.0), 152.0);
        assert_eq!(bg.advance(-5.0), 152.0);
        assert_eq!(bg.advance(f32::INFINITY), 152.0);
    }

    #[test]
    fn segments_scale_with_canvas() {
        let bg = mesh(BackgroundConfig::default());
        assert_eq!(bg.segments(Extent::new(1000, 500)), (60, 80));
        assert_eq!(bg.segments(Extent::new(1, 1)), (1, 1));
        assert_eq!(bg.segments(Extent::new(0, 0)), (1, 1));
    }

    #[test]
    fn color_and_amplitude_only_touch_uniforms() {
        let mut bg = mesh(BackgroundConfig::default());
        let canvas = Extent::new(200, 100);
        let before = bg.uniforms(canvas);

        bg.set_amplitude(10.0);
        bg.set_colors([Color::rgb(1.0, 0.0, 0.0); 4]);
        let after = bg.uniforms(canvas);

        assert_eq!(after.resolution, before.resolution);
        assert_eq!(after.global[3], 10.0);
        assert_eq!(after.colors[2], [1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn missing_grain_falls_back_to_solid() {
        let bg = mesh(BackgroundConfig {
            grain_texture: Some("/nonexistent/grain.png".into()),
            ..BackgroundConfig::default()
        });
        assert_eq!(bg.mode(), BackgroundMode::Solid);
        assert!(!bg.is_animated());
        assert_eq!(bg.uniforms(Extent::new(4, 4)).shade[3], 1.0);
    }

    #[test]
    fn wave_layers_follow_seed() {
        let bg = mesh(BackgroundConfig {
            seed: 2.0,
            ..BackgroundConfig::default()
        });
        let u = bg.uniforms(Extent::new(4, 4));
        assert_eq!(u.waves_b[0][0], 12.0);
        assert_eq!(u.waves_b[2][0], 32.0);
        assert!((u.waves_b[2][2] - 0.84).abs() < 1e-6);
    }
}

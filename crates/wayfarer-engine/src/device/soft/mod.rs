//! CPU reference implementation of [`GpuService`].
//!
//! Executes recorded frames exactly as the wgpu backend would, with float
//! storage and bilinear clamp-to-edge sampling. Used to test the host, the
//! simulations and the preservation policy without a GPU, and as a reference
//! for the WGSL kernels.

mod image;
mod kernels;
mod noise;

use std::collections::HashMap;

use crate::coords::{Extent, PixelRect, Vec2};
use crate::paint::Color;

use super::kernel::{BlendMode, DepthMode};
use super::{
    Command, DeviceError, FrameEncoder, GlobalState, GpuService, Output, Pass, Source, TargetDesc,
    TargetId,
};

use image::SoftImage;
use kernels::{Inputs, shade};

#[derive(Debug)]
struct SoftTarget {
    desc: TargetDesc,
    image: SoftImage,
}

/// Software canvas and render targets.
#[derive(Debug)]
pub struct SoftService {
    canvas: SoftImage,
    depth: Vec<f32>,
    targets: HashMap<TargetId, SoftTarget>,
    next_id: u32,
    global: Option<GlobalState>,
    global_applications: u32,
    submissions: u64,
    lost: bool,
}

impl SoftService {
    pub fn new(extent: Extent) -> Self {
        Self {
            canvas: SoftImage::new(extent),
            depth: vec![1.0; extent.pixel_count()],
            targets: HashMap::new(),
            next_id: 0,
            global: None,
            global_applications: 0,
            submissions: 0,
            lost: false,
        }
    }

    /// Canvas pixel (premultiplied, linear). Out-of-range reads clamp to the edge.
    pub fn read_canvas(&self, x: u32, y: u32) -> Color {
        Color::from(self.canvas.fetch(x as i64, y as i64))
    }

    pub fn read_depth(&self, x: u32, y: u32) -> Option<f32> {
        if x >= self.canvas.extent.width || y >= self.canvas.extent.height {
            return None;
        }
        self.depth.get(self.canvas.index(x, y)).copied()
    }

    pub fn read_target(&self, id: TargetId, x: u32, y: u32) -> Option<[f32; 4]> {
        let t = self.targets.get(&id)?;
        if x >= t.image.extent.width || y >= t.image.extent.height {
            return None;
        }
        Some(t.image.pixels[t.image.index(x, y)])
    }

    /// Bilinear sample of a target at normalized coordinates.
    pub fn sample_target(&self, id: TargetId, uv: Vec2) -> Option<[f32; 4]> {
        self.targets.get(&id).map(|t| t.image.sample(uv.to_array()))
    }

    /// Row-major texels of a target.
    pub fn target_pixels(&self, id: TargetId) -> Option<&[[f32; 4]]> {
        self.targets.get(&id).map(|t| t.image.pixels.as_slice())
    }

    pub fn global_state(&self) -> Option<&GlobalState> {
        self.global.as_ref()
    }

    /// How many times global state was applied over the service's lifetime.
    pub fn global_state_applications(&self) -> u32 {
        self.global_applications
    }

    /// Simulates a lost context: every submit fails until [`GpuService::restore`].
    pub fn lose_context(&mut self) {
        log::warn!("soft service: context lost");
        self.lost = true;
    }

    pub fn is_lost(&self) -> bool {
        self.lost
    }

    fn run_pass(&mut self, pass: &Pass) {
        match pass.output {
            Output::Canvas => {
                let Self {
                    canvas,
                    depth,
                    targets,
                    ..
                } = self;
                let inputs = resolve(&pass.inputs, targets, None);
                rasterize(canvas, Some(depth), pass, &inputs);
            }
            Output::Target(id) => {
                let Some(mut out) = self.targets.remove(&id) else {
                    return;
                };
                {
                    let inputs = resolve(&pass.inputs, &self.targets, Some(&self.canvas));
                    rasterize(&mut out.image, None, pass, &inputs);
                }
                self.targets.insert(id, out);
            }
        }
    }
}

fn resolve<'a>(
    sources: &[Source; 3],
    targets: &'a HashMap<TargetId, SoftTarget>,
    canvas: Option<&'a SoftImage>,
) -> Inputs<'a> {
    let slots = sources.map(|src| match src {
        Source::None => None,
        Source::Canvas => canvas,
        Source::Target(id) => targets.get(&id).map(|t| &t.image),
    });
    Inputs { slots }
}

fn rasterize(out: &mut SoftImage, mut depth: Option<&mut Vec<f32>>, pass: &Pass, inputs: &Inputs<'_>) {
    let extent = out.extent;
    let rect = match pass.scissor {
        Some(s) => match s.clamped(extent) {
            Some(r) => r,
            None => return,
        },
        None => PixelRect::full(extent),
    };

    let kind = pass.kernel.kind();
    let depth_test = kind.depth_mode() == DepthMode::TestWrite;
    let blend = kind.blend_mode();
    let (w, h) = (extent.width as f32, extent.height as f32);

    for y in rect.y..rect.y + rect.height {
        for x in rect.x..rect.x + rect.width {
            let uv = [(x as f32 + 0.5) / w, (y as f32 + 0.5) / h];
            let frag = shade(&pass.kernel, uv, [x, y], extent, inputs);
            let idx = out.index(x, y);

            if depth_test {
                if let Some(d) = depth.as_deref_mut() {
                    if !(frag.depth < d[idx]) {
                        continue;
                    }
                    d[idx] = frag.depth;
                }
            }

            let dst = &mut out.pixels[idx];
            match blend {
                BlendMode::Replace => *dst = frag.color,
                BlendMode::PremultipliedOver => {
                    let inv = 1.0 - frag.color[3];
                    for i in 0..4 {
                        dst[i] = frag.color[i] + dst[i] * inv;
                    }
                }
            }
        }
    }
}

impl GpuService for SoftService {
    fn apply_global_state(&mut self, state: &GlobalState) {
        self.global = Some(*state);
        self.global_applications += 1;
        self.canvas.fill(state.clear_color.to_array());
        self.depth.fill(1.0);
    }

    fn canvas_extent(&self) -> Extent {
        self.canvas.extent
    }

    fn resize_canvas(&mut self, extent: Extent) {
        if extent == self.canvas.extent {
            return;
        }
        let fill = self
            .global
            .map(|g| g.clear_color.to_array())
            .unwrap_or([0.0; 4]);
        self.canvas = SoftImage::filled(extent, fill);
        self.depth = vec![1.0; extent.pixel_count()];
    }

    fn create_target(&mut self, desc: TargetDesc) -> Result<TargetId, DeviceError> {
        if self.lost {
            return Err(DeviceError::ContextLost);
        }
        let id = TargetId(self.next_id);
        self.next_id += 1;
        let image = SoftImage::new(desc.extent);
        self.targets.insert(id, SoftTarget { desc, image });
        Ok(id)
    }

    fn create_target_with_data(
        &mut self,
        desc: TargetDesc,
        rgba: &[f32],
    ) -> Result<TargetId, DeviceError> {
        let expected = desc.extent.pixel_count() * 4;
        if rgba.len() != expected {
            return Err(DeviceError::InvalidData {
                expected,
                actual: rgba.len(),
            });
        }
        let id = self.create_target(desc)?;
        if let Some(t) = self.targets.get_mut(&id) {
            for (px, chunk) in t.image.pixels.iter_mut().zip(rgba.chunks_exact(4)) {
                *px = [chunk[0], chunk[1], chunk[2], chunk[3]];
            }
        }
        Ok(id)
    }

    fn release_target(&mut self, id: TargetId) {
        self.targets.remove(&id);
    }

    fn target_extent(&self, id: TargetId) -> Option<Extent> {
        self.targets.get(&id).map(|t| t.desc.extent)
    }

    fn live_targets(&self) -> usize {
        self.targets.len()
    }

    fn submit(&mut self, frame: FrameEncoder) -> Result<(), DeviceError> {
        if self.lost {
            return Err(DeviceError::ContextLost);
        }
        self.validate(&frame)?;

        if let Some(g) = self.global {
            if g.auto_clear.color {
                self.canvas.fill(g.clear_color.to_array());
            }
            if g.auto_clear.depth {
                self.depth.fill(1.0);
            }
        }

        for cmd in frame.into_commands() {
            match cmd {
                Command::Draw(pass) => self.run_pass(&pass),
                Command::ClearDepth => self.depth.fill(1.0),
                Command::ClearTarget { target, value } => {
                    if let Some(t) = self.targets.get_mut(&target) {
                        t.image.fill(value);
                    }
                }
            }
        }

        self.submissions += 1;
        Ok(())
    }

    fn restore(&mut self) -> Result<(), DeviceError> {
        log::info!("soft service: restoring context ({} targets)", self.targets.len());
        self.lost = false;
        self.global = None;
        self.canvas.fill([0.0; 4]);
        self.depth.fill(1.0);
        for t in self.targets.values_mut() {
            t.image.fill([0.0; 4]);
        }
        Ok(())
    }

    fn submissions(&self) -> u64 {
        self.submissions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::kernel::{Kernel, ScaleUniforms, SolidUniforms};

    fn solid(color: [f32; 4], depth: f32) -> Kernel {
        Kernel::Solid(SolidUniforms {
            color,
            params: [depth, 0.0, 0.0, 0.0],
        })
    }

    #[test]
    fn scissored_solid_only_touches_its_rect() {
        let mut svc = SoftService::new(Extent::new(8, 8));
        let mut enc = FrameEncoder::new();
        enc.draw(Pass::to_canvas(solid([1.0, 0.0, 0.0, 1.0], 0.5)).scissor(PixelRect::new(2, 2, 2, 2)));
        svc.submit(enc).unwrap();

        assert_eq!(svc.read_canvas(2, 2).r, 1.0);
        assert_eq!(svc.read_canvas(0, 0).a, 0.0);
        assert_eq!(svc.read_depth(3, 3), Some(0.5));
        assert_eq!(svc.read_depth(5, 5), Some(1.0));
    }

    #[test]
    fn depth_test_rejects_farther_fragments_until_cleared() {
        let mut svc = SoftService::new(Extent::new(2, 2));
        let mut enc = FrameEncoder::new();
        enc.draw(Pass::to_canvas(solid([0.0, 1.0, 0.0, 1.0], 0.2)));
        enc.draw(Pass::to_canvas(solid([1.0, 0.0, 0.0, 1.0], 0.5)));
        svc.submit(enc).unwrap();
        assert_eq!(svc.read_canvas(0, 0).g, 1.0);

        let mut enc = FrameEncoder::new();
        enc.clear_depth();
        enc.draw(Pass::to_canvas(solid([1.0, 0.0, 0.0, 1.0], 0.5)));
        svc.submit(enc).unwrap();
        assert_eq!(svc.read_canvas(0, 0).r, 1.0);
    }

    #[test]
    fn sampling_own_output_is_rejected() {
        let mut svc = SoftService::new(Extent::new(2, 2));
        let t = svc.create_target(TargetDesc::new("t", Extent::new(2, 2))).unwrap();
        let mut enc = FrameEncoder::new();
        enc.draw(Pass::to_target(Kernel::Copy, t).sample(0, t));
        assert_eq!(svc.submit(enc), Err(DeviceError::FeedbackLoop(Output::Target(t))));
        assert_eq!(svc.submissions(), 0);
    }

    #[test]
    fn released_targets_fail_validation_without_submitting() {
        let mut svc = SoftService::new(Extent::new(2, 2));
        let t = svc.create_target(TargetDesc::new("t", Extent::new(2, 2))).unwrap();
        let mut enc = FrameEncoder::new();
        enc.draw(Pass::to_canvas(Kernel::Copy).sample(0, t));
        assert!(svc.is_live(t));
        assert_eq!(svc.validate(&enc), Ok(()));

        svc.release_target(t);
        assert!(!svc.is_live(t));
        assert_eq!(svc.validate(&enc), Err(DeviceError::UnknownTarget(t)));
        assert_eq!(svc.submissions(), 0);
    }

    #[test]
    fn scale_pass_reads_other_target() {
        let mut svc = SoftService::new(Extent::new(2, 2));
        let desc = TargetDesc::new("src", Extent::new(2, 2));
        let src = svc.create_target_with_data(desc, &[1.0; 16]).unwrap();
        let dst = svc.create_target(TargetDesc::new("dst", Extent::new(2, 2))).unwrap();

        let mut enc = FrameEncoder::new();
        enc.draw(
            Pass::to_target(
                Kernel::Scale(ScaleUniforms {
                    factor: [0.5, 0.0, 0.0, 0.0],
                }),
                dst,
            )
            .sample(0, src),
        );
        svc.submit(enc).unwrap();
        assert_eq!(svc.read_target(dst, 1, 1), Some([0.5; 4]));
    }

    #[test]
    fn lost_context_fails_until_restored() {
        let mut svc = SoftService::new(Extent::new(2, 2));
        let t = svc.create_target(TargetDesc::new("t", Extent::new(1, 1))).unwrap();
        svc.apply_global_state(&GlobalState::default());
        svc.lose_context();
        assert_eq!(svc.submit(FrameEncoder::new()), Err(DeviceError::ContextLost));

        svc.restore().unwrap();
        assert!(svc.global_state().is_none());
        assert_eq!(svc.target_extent(t), Some(Extent::new(1, 1)));
        assert!(svc.submit(FrameEncoder::new()).is_ok());
    }

    #[test]
    fn upload_length_is_checked() {
        let mut svc = SoftService::new(Extent::new(2, 2));
        let err = svc
            .create_target_with_data(TargetDesc::new("t", Extent::new(2, 2)), &[0.0; 3])
            .unwrap_err();
        assert_eq!(err, DeviceError::InvalidData { expected: 16, actual: 3 });
    }
}

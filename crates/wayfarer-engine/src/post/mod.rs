//! Post-processing chain over the composited canvas.
//!
//! Fixed order inside a frame, after all content and simulation passes:
//! 1. copy the canvas into a scene target (the effect pass cannot sample its output)
//! 2. normal pre-pass over every drawn viewport, only when an effect needs normals
//! 3. one merged effect pass back onto the canvas
//!
//! With every effect disabled the chain records nothing.

use crate::config::PostConfig;
use crate::coords::{Extent, PixelRect};
use crate::device::kernel::{PostUniforms, SolidUniforms};
use crate::device::{DeviceError, FrameEncoder, GpuService, Kernel, Pass, Source, TargetId};
use crate::render::RenderTarget;

/// Encoded normal of flat viewport geometry facing the camera.
pub const FLAT_NORMAL: [f32; 4] = [0.5, 0.5, 1.0, 1.0];

/// Screen footprint of one drawn piece of viewport geometry.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Geometry {
    pub scissor: PixelRect,
    pub depth: f32,
    /// Encoded normal (`xyz * 0.5 + 0.5`).
    pub normal: [f32; 4],
}

/// Stages a frame's post work runs through, in order.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PostStage {
    SceneCopy,
    NormalPrePass,
    Effects,
}

#[derive(Debug)]
pub struct PostChain {
    config: PostConfig,
    scene: Option<RenderTarget>,
    normals: Option<RenderTarget>,
}

impl PostChain {
    pub fn new(
        gpu: &mut dyn GpuService,
        config: PostConfig,
        canvas: Extent,
    ) -> Result<Self, DeviceError> {
        let mut chain = Self {
            config,
            scene: None,
            normals: None,
        };
        chain.allocate(gpu, canvas)?;
        Ok(chain)
    }

    fn allocate(&mut self, gpu: &mut dyn GpuService, canvas: Extent) -> Result<(), DeviceError> {
        if self.config.any_enabled() {
            self.scene = Some(RenderTarget::create(gpu, "post scene", canvas)?);
        }
        if self.needs_normals() {
            match RenderTarget::create(gpu, "post normals", canvas) {
                Ok(t) => self.normals = Some(t),
                Err(err) => {
                    if let Some(scene) = self.scene.take() {
                        scene.release(gpu);
                    }
                    return Err(err);
                }
            }
        }
        Ok(())
    }

    pub fn config(&self) -> &PostConfig {
        &self.config
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.config.any_enabled()
    }

    #[inline]
    pub fn needs_normals(&self) -> bool {
        self.config.normal_edges.is_some()
    }

    /// The stages [`record`](Self::record) emits, in order.
    pub fn stages(&self) -> Vec<PostStage> {
        let mut stages = Vec::new();
        if self.is_enabled() {
            stages.push(PostStage::SceneCopy);
            if self.needs_normals() {
                stages.push(PostStage::NormalPrePass);
            }
            stages.push(PostStage::Effects);
        }
        stages
    }

    pub fn uniforms(&self, canvas: Extent, time_s: f32) -> PostUniforms {
        let on = |b: bool| if b { 1.0 } else { 0.0 };
        let c = &self.config;
        let [tx, ty] = canvas.texel();

        let bloom = c.bloom.as_ref();
        let noise = c.noise.as_ref();
        let vignette = c.vignette.as_ref();
        let chroma = c.chromatic_aberration.as_ref();
        let distortion = c.distortion.as_ref();
        let edges = c.normal_edges.as_ref();

        PostUniforms {
            texel_time: [tx, ty, time_s, 0.0],
            bloom: [
                bloom.map_or(0.0, |b| b.intensity),
                bloom.map_or(0.0, |b| b.threshold),
                on(bloom.is_some()),
                0.0,
            ],
            noise: [noise.map_or(0.0, |n| n.amount), on(noise.is_some()), 0.0, 0.0],
            vignette: [
                vignette.map_or(0.0, |v| v.offset),
                vignette.map_or(0.0, |v| v.darkness),
                on(vignette.is_some()),
                0.0,
            ],
            chroma: [chroma.map_or(0.0, |x| x.offset), on(chroma.is_some()), 0.0, 0.0],
            distortion: [
                distortion.map_or(0.0, |d| d.strength),
                on(distortion.is_some()),
                0.0,
                0.0,
            ],
            edges: [edges.map_or(0.0, |e| e.strength), on(edges.is_some()), 0.0, 0.0],
        }
    }

    /// Records the chain. `geometry` lists the viewport draws committed this
    /// frame; `field` is the distortion field after this frame's update.
    pub fn record(
        &self,
        frame: &mut FrameEncoder,
        canvas: Extent,
        geometry: &[Geometry],
        field: TargetId,
        time_s: f32,
    ) {
        let Some(scene) = self.scene else {
            return;
        };

        frame.draw(Pass::to_target(Kernel::Copy, scene.id).input(0, Source::Canvas));

        let normals = self.normals.map(|normals| {
            frame.clear_target(normals.id, [0.0; 4]);
            for g in geometry {
                let Some(scissor) = g.scissor.clamped(normals.extent) else {
                    continue;
                };
                frame.draw(
                    Pass::to_target(
                        Kernel::Normals(SolidUniforms {
                            color: g.normal,
                            params: [g.depth, 0.0, 0.0, 0.0],
                        }),
                        normals.id,
                    )
                    .scissor(scissor),
                );
            }
            normals
        });

        let mut pass = Pass::to_canvas(Kernel::Post(self.uniforms(canvas, time_s)))
            .sample(0, scene.id)
            .sample(2, field);
        if let Some(normals) = normals {
            pass = pass.sample(1, normals.id);
        }
        frame.draw(pass);
    }

    /// Reallocates the scene/normal targets for a new canvas size.
    pub fn resize(&mut self, gpu: &mut dyn GpuService, canvas: Extent) -> Result<(), DeviceError> {
        let current = self.scene.map(|s| s.extent);
        if current.is_none() || current == Some(canvas) {
            return Ok(());
        }
        self.release_targets(gpu);
        self.allocate(gpu, canvas)
    }

    fn release_targets(&mut self, gpu: &mut dyn GpuService) {
        if let Some(t) = self.scene.take() {
            t.release(gpu);
        }
        if let Some(t) = self.normals.take() {
            t.release(gpu);
        }
    }

    pub fn release(mut self, gpu: &mut dyn GpuService) {
        self.release_targets(gpu);
    }
}

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use winit::window::Window;

use crate::coords::Extent;

use super::kernel::{Kernel, PresentUniforms, UNIFORM_SLOT};
use super::pipelines::{CANVAS_FORMAT, DEPTH_FORMAT, PipelineKey, Pipelines};
use super::surface::{apply_resize, choose_alpha_mode, choose_surface_format, map_surface_error};
use super::{
    ColorSpace, Command, DeviceError, FrameEncoder, GlobalState, GpuInit, GpuService, Output,
    Source, SurfaceErrorAction, TargetDesc, TargetId, ToneMapping,
};

struct GpuTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

struct GpuTarget {
    desc: TargetDesc,
    tex: GpuTexture,
}

/// Persistent offscreen canvas. Color is never cleared by the service unless
/// auto-clear asks for it; the surface only ever receives a copy.
struct Canvas {
    extent: Extent,
    color: GpuTexture,
    depth: GpuTexture,
}

/// Device-bound objects that must be rebuilt after a context loss.
struct DeviceState {
    device: wgpu::Device,
    queue: wgpu::Queue,
    lost: Arc<AtomicBool>,
    pipelines: Pipelines,
    sampler: wgpu::Sampler,
    dummy: GpuTexture,
    uniforms: wgpu::Buffer,
    uniform_slots: usize,
}

/// [`GpuService`] on top of wgpu, bound to a window surface.
///
/// Owns Adapter/Device/Queue, the surface configuration, the persistent
/// canvas and every render target. The surface lifetime is tied to the window
/// via `'w`; the window must outlive the service.
pub struct WgpuService<'w> {
    surface: wgpu::Surface<'w>,
    adapter: wgpu::Adapter,
    init: GpuInit,
    config: wgpu::SurfaceConfiguration,
    state: DeviceState,
    canvas: Canvas,
    targets: HashMap<TargetId, GpuTarget>,
    next_id: u32,
    global: GlobalState,
    submissions: u64,
}

impl<'w> WgpuService<'w> {
    /// Creates the service for `window`.
    ///
    /// Adapter/device acquisition is asynchronous under wgpu.
    pub async fn new(window: &'w Window, init: GpuInit) -> Result<Self> {
        let size = window.inner_size();
        anyhow::ensure!(size.width > 0 && size.height > 0, "window has zero size");
        let extent = Extent::new(size.width, size.height);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window)
            .context("failed to create wgpu surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        let info = adapter.get_info();
        log::info!("GPU adapter: {} ({:?})", info.name, info.backend);

        let state = DeviceState::new(&adapter, &init).await?;

        let caps = surface.get_capabilities(&adapter);
        let format = choose_surface_format(&caps, ColorSpace::Srgb)
            .context("no supported surface formats")?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: extent.width,
            height: extent.height,
            present_mode: init.present_mode,
            alpha_mode: choose_alpha_mode(&caps, init.alpha_mode),
            view_formats: vec![],
            desired_maximum_frame_latency: init.desired_maximum_frame_latency,
        };
        surface.configure(&state.device, &config);

        let canvas = Canvas::new(&state.device, extent);

        Ok(Self {
            surface,
            adapter,
            init,
            config,
            state,
            canvas,
            targets: HashMap::new(),
            next_id: 0,
            global: GlobalState::default(),
            submissions: 0,
        })
    }

    fn mark_lost(&self) {
        self.state.lost.store(true, Ordering::SeqCst);
    }

    fn is_lost(&self) -> bool {
        self.state.lost.load(Ordering::SeqCst)
    }

    fn source_view<'a>(&'a self, src: Source) -> &'a wgpu::TextureView {
        match src {
            Source::None => &self.state.dummy.view,
            Source::Canvas => &self.canvas.color.view,
            Source::Target(id) => self
                .targets
                .get(&id)
                .map_or(&self.state.dummy.view, |t| &t.tex.view),
        }
    }

    fn ensure_uniform_capacity(&mut self, slots: usize) {
        if slots <= self.state.uniform_slots {
            return;
        }
        let cap = slots.next_power_of_two().max(64);
        self.state.uniforms = create_uniform_buffer(&self.state.device, cap);
        self.state.uniform_slots = cap;
    }

    fn bind_group(&self, inputs: &[Source; 3]) -> wgpu::BindGroup {
        self.state.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("wayfarer kernel bind group"),
            layout: self.state.pipelines.bind_group_layout(),
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                        buffer: &self.state.uniforms,
                        offset: 0,
                        size: wgpu::BufferSize::new(UNIFORM_SLOT as u64),
                    }),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(self.source_view(inputs[0])),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(self.source_view(inputs[1])),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(self.source_view(inputs[2])),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::Sampler(&self.state.sampler),
                },
            ],
        })
    }

    fn clear_canvas_color(&self, encoder: &mut wgpu::CommandEncoder) {
        let c = self.global.clear_color;
        let _ = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("wayfarer canvas clear"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &self.canvas.color.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color {
                        r: c.r as f64,
                        g: c.g as f64,
                        b: c.b as f64,
                        a: c.a as f64,
                    }),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
    }

    fn clear_depth(&self, encoder: &mut wgpu::CommandEncoder) {
        let _ = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("wayfarer depth clear"),
            color_attachments: &[],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.canvas.depth.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
    }

    fn reconfigure_surface(&mut self) {
        let caps = self.surface.get_capabilities(&self.adapter);
        if let Some(format) = choose_surface_format(&caps, self.global.color_space) {
            self.config.format = format;
        }
        if self.config.width > 0 && self.config.height > 0 {
            self.surface.configure(&self.state.device, &self.config);
        }
    }
}

impl DeviceState {
    async fn new(adapter: &wgpu::Adapter, init: &GpuInit) -> Result<Self> {
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("wayfarer device"),
                required_features: init.required_features,
                required_limits: init.required_limits.clone(),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        let lost = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&lost);
        device.set_device_lost_callback(move |reason, message| {
            log::warn!("GPU device lost ({reason:?}): {message}");
            flag.store(true, Ordering::SeqCst);
        });

        let pipelines = Pipelines::new(&device);

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("wayfarer linear clamp sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let dummy = create_texture(
            &device,
            "wayfarer unbound input",
            Extent::new(1, 1),
            CANVAS_FORMAT,
            wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        );
        write_texels(&queue, &dummy.texture, Extent::new(1, 1), &[0.0; 4]);

        let uniform_slots = 64;
        let uniforms = create_uniform_buffer(&device, uniform_slots);

        Ok(Self {
            device,
            queue,
            lost,
            pipelines,
            sampler,
            dummy,
            uniforms,
            uniform_slots,
        })
    }
}

impl Canvas {
    fn new(device: &wgpu::Device, extent: Extent) -> Self {
        let color = create_texture(
            device,
            "wayfarer canvas color",
            extent,
            CANVAS_FORMAT,
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        );
        let depth = create_texture(
            device,
            "wayfarer canvas depth",
            extent,
            DEPTH_FORMAT,
            wgpu::TextureUsages::RENDER_ATTACHMENT,
        );
        Self { extent, color, depth }
    }
}

fn create_texture(
    device: &wgpu::Device,
    label: &str,
    extent: Extent,
    format: wgpu::TextureFormat,
    usage: wgpu::TextureUsages,
) -> GpuTexture {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: extent.width.max(1),
            height: extent.height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    GpuTexture { texture, view }
}

fn create_target_texture(device: &wgpu::Device, desc: &TargetDesc) -> GpuTexture {
    create_texture(
        device,
        &desc.label,
        desc.extent,
        CANVAS_FORMAT,
        wgpu::TextureUsages::RENDER_ATTACHMENT
            | wgpu::TextureUsages::TEXTURE_BINDING
            | wgpu::TextureUsages::COPY_DST,
    )
}

fn create_uniform_buffer(device: &wgpu::Device, slots: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("wayfarer uniform slots"),
        size: (slots * UNIFORM_SLOT) as u64,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

/// Uploads row-major RGBA floats into an `Rgba16Float` texture.
fn write_texels(queue: &wgpu::Queue, texture: &wgpu::Texture, extent: Extent, rgba: &[f32]) {
    let halves: Vec<u16> = rgba.iter().map(|&v| f32_to_f16_bits(v)).collect();
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        bytemuck::cast_slice(&halves),
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(extent.width * 8),
            rows_per_image: Some(extent.height),
        },
        wgpu::Extent3d {
            width: extent.width,
            height: extent.height,
            depth_or_array_layers: 1,
        },
    );
}

/// IEEE 754 binary32 to binary16, round-to-nearest.
fn f32_to_f16_bits(v: f32) -> u16 {
    let bits = v.to_bits();
    let sign = ((bits >> 16) & 0x8000) as u16;
    let exp = ((bits >> 23) & 0xff) as i32;
    let mant = bits & 0x007f_ffff;

    if exp == 0xff {
        let nan = if mant != 0 { 0x0200 } else { 0 };
        return sign | 0x7c00 | nan;
    }

    let e = exp - 127 + 15;
    if e >= 0x1f {
        return sign | 0x7c00;
    }
    if e <= 0 {
        if e < -10 {
            return sign;
        }
        let m = mant | 0x0080_0000;
        let shift = (14 - e) as u32;
        let half = (m >> shift) as u16;
        let round = ((m >> (shift - 1)) & 1) as u16;
        return sign | (half + round);
    }

    let half = sign | ((e as u16) << 10) | ((mant >> 13) as u16);
    if mant & 0x1000 != 0 { half + 1 } else { half }
}

impl GpuService for WgpuService<'_> {
    fn apply_global_state(&mut self, state: &GlobalState) {
        let color_space_changed = state.color_space != self.global.color_space;
        self.global = *state;
        if color_space_changed {
            self.reconfigure_surface();
        }

        let mut encoder = self
            .state
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("wayfarer global state"),
            });
        self.clear_canvas_color(&mut encoder);
        self.clear_depth(&mut encoder);
        self.state.queue.submit(std::iter::once(encoder.finish()));
        log::debug!("global state applied: {state:?}");
    }

    fn canvas_extent(&self) -> Extent {
        self.canvas.extent
    }

    fn resize_canvas(&mut self, extent: Extent) {
        if extent == self.canvas.extent {
            return;
        }
        // wgpu rejects 0x0 surfaces; keep the previous canvas until a real size arrives.
        if !apply_resize(&self.surface, &self.state.device, &mut self.config, extent) {
            return;
        }
        self.canvas = Canvas::new(&self.state.device, extent);

        let mut encoder = self
            .state
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("wayfarer canvas resize"),
            });
        self.clear_canvas_color(&mut encoder);
        self.clear_depth(&mut encoder);
        self.state.queue.submit(std::iter::once(encoder.finish()));
    }

    fn create_target(&mut self, desc: TargetDesc) -> Result<TargetId, DeviceError> {
        if self.is_lost() {
            return Err(DeviceError::ContextLost);
        }
        let id = TargetId(self.next_id);
        self.next_id += 1;
        let tex = create_target_texture(&self.state.device, &desc);
        self.targets.insert(id, GpuTarget { desc, tex });
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
        let extent = desc.extent;
        let id = self.create_target(desc)?;
        if let Some(t) = self.targets.get(&id) {
            write_texels(&self.state.queue, &t.tex.texture, extent, rgba);
        }
        Ok(id)
    }

    fn release_target(&mut self, id: TargetId) {
        if let Some(t) = self.targets.remove(&id) {
            t.tex.texture.destroy();
        }
    }

    fn target_extent(&self, id: TargetId) -> Option<Extent> {
        self.targets.get(&id).map(|t| t.desc.extent)
    }

    fn live_targets(&self) -> usize {
        self.targets.len()
    }

    fn submit(&mut self, frame: FrameEncoder) -> Result<(), DeviceError> {
        if self.is_lost() {
            return Err(DeviceError::ContextLost);
        }
        self.validate(&frame)?;

        // Mutating work (pipelines, uniform capacity) happens before any
        // immutable borrow of views and bind groups.
        let present_key = PipelineKey {
            kind: super::KernelKind::Present,
            format: self.config.format,
            depth: false,
        };
        let mut draws = 0usize;
        for cmd in frame.commands() {
            if let Command::Draw(pass) = cmd {
                let key = PipelineKey {
                    kind: pass.kernel.kind(),
                    format: CANVAS_FORMAT,
                    depth: pass.output == Output::Canvas,
                };
                self.state.pipelines.ensure(&self.state.device, key);
                draws += 1;
            }
        }
        self.state.pipelines.ensure(&self.state.device, present_key);
        self.ensure_uniform_capacity(draws + 1);

        let present = Kernel::Present(PresentUniforms {
            params: [
                match self.global.tone_mapping {
                    ToneMapping::None => 0.0,
                    ToneMapping::Aces => 1.0,
                },
                0.0,
                0.0,
                0.0,
            ],
        });

        let mut slots = vec![0u8; (draws + 1) * UNIFORM_SLOT];
        let draw_kernels = frame.commands().iter().filter_map(|cmd| match cmd {
            Command::Draw(pass) => Some(&pass.kernel),
            _ => None,
        });
        for (i, kernel) in draw_kernels.chain(std::iter::once(&present)).enumerate() {
            let bytes = kernel.uniform_bytes();
            slots[i * UNIFORM_SLOT..i * UNIFORM_SLOT + bytes.len()].copy_from_slice(bytes);
        }
        self.state.queue.write_buffer(&self.state.uniforms, 0, &slots);

        let surface_texture = match self.surface.get_current_texture() {
            Ok(t) => Some(t),
            Err(err) => {
                match map_surface_error(&self.surface, &self.state.device, &self.config, err) {
                    SurfaceErrorAction::Fatal => {
                        log::error!("surface error is fatal; marking context lost");
                        self.mark_lost();
                        return Err(DeviceError::ContextLost);
                    }
                    action => {
                        log::debug!("surface unavailable ({action:?}); rendering offscreen only");
                        None
                    }
                }
            }
        };

        let mut encoder = self
            .state
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("wayfarer frame encoder"),
            });

        if self.global.auto_clear.color {
            self.clear_canvas_color(&mut encoder);
        }
        if self.global.auto_clear.depth || self.global.auto_clear.stencil {
            self.clear_depth(&mut encoder);
        }

        let mut slot = 0u32;
        for cmd in frame.commands() {
            match cmd {
                Command::ClearDepth => self.clear_depth(&mut encoder),
                Command::ClearTarget { target, value } => {
                    let Some(t) = self.targets.get(target) else { continue };
                    let _ = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                        label: Some("wayfarer target clear"),
                        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                            view: &t.tex.view,
                            resolve_target: None,
                            ops: wgpu::Operations {
                                load: wgpu::LoadOp::Clear(wgpu::Color {
                                    r: value[0] as f64,
                                    g: value[1] as f64,
                                    b: value[2] as f64,
                                    a: value[3] as f64,
                                }),
                                store: wgpu::StoreOp::Store,
                            },
                            depth_slice: None,
                        })],
                        depth_stencil_attachment: None,
                        timestamp_writes: None,
                        occlusion_query_set: None,
                        multiview_mask: None,
                    });
                }
                Command::Draw(pass) => {
                    let offset = slot * UNIFORM_SLOT as u32;
                    slot += 1;

                    let (view, depth_view, extent) = match pass.output {
                        Output::Canvas => (
                            &self.canvas.color.view,
                            Some(&self.canvas.depth.view),
                            self.canvas.extent,
                        ),
                        Output::Target(id) => {
                            let Some(t) = self.targets.get(&id) else { continue };
                            (&t.tex.view, None, t.desc.extent)
                        }
                    };
                    let scissor = match pass.scissor {
                        Some(s) => match s.clamped(extent) {
                            Some(r) => Some(r),
                            None => continue,
                        },
                        None => None,
                    };

                    let key = PipelineKey {
                        kind: pass.kernel.kind(),
                        format: CANVAS_FORMAT,
                        depth: depth_view.is_some(),
                    };
                    let Some(pipeline) = self.state.pipelines.get(key) else { continue };
                    let bind_group = self.bind_group(&pass.inputs);

                    let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                        label: Some(pass.kernel.kind().label()),
                        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                            view,
                            resolve_target: None,
                            ops: wgpu::Operations {
                                load: wgpu::LoadOp::Load,
                                store: wgpu::StoreOp::Store,
                            },
                            depth_slice: None,
                        })],
                        depth_stencil_attachment: depth_view.map(|view| {
                            wgpu::RenderPassDepthStencilAttachment {
                                view,
                                depth_ops: Some(wgpu::Operations {
                                    load: wgpu::LoadOp::Load,
                                    store: wgpu::StoreOp::Store,
                                }),
                                stencil_ops: None,
                            }
                        }),
                        timestamp_writes: None,
                        occlusion_query_set: None,
                        multiview_mask: None,
                    });

                    rpass.set_pipeline(pipeline);
                    rpass.set_bind_group(0, &bind_group, &[offset]);
                    if let Some(r) = scissor {
                        rpass.set_scissor_rect(r.x, r.y, r.width, r.height);
                    }
                    rpass.draw(0..pass.kernel.vertex_count(), 0..1);
                }
            }
        }

        if let Some(surface_texture) = surface_texture.as_ref() {
            let view = surface_texture
                .texture
                .create_view(&wgpu::TextureViewDescriptor::default());
            let bind_group = self.bind_group(&[Source::Canvas, Source::None, Source::None]);
            if let Some(pipeline) = self.state.pipelines.get(present_key) {
                let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("wayfarer present"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                            store: wgpu::StoreOp::Store,
                        },
                        depth_slice: None,
                    })],
                    depth_stencil_attachment: None,
                    timestamp_writes: None,
                    occlusion_query_set: None,
                    multiview_mask: None,
                });
                rpass.set_pipeline(pipeline);
                rpass.set_bind_group(0, &bind_group, &[slot * UNIFORM_SLOT as u32]);
                rpass.draw(0..3, 0..1);
            }
        }

        self.state.queue.submit(std::iter::once(encoder.finish()));
        if let Some(surface_texture) = surface_texture {
            surface_texture.present();
        }

        self.submissions += 1;
        Ok(())
    }

    fn restore(&mut self) -> Result<(), DeviceError> {
        log::info!("restoring GPU context ({} targets)", self.targets.len());

        let state = pollster::block_on(DeviceState::new(&self.adapter, &self.init))
            .map_err(|e| DeviceError::Backend(format!("{e:#}")))?;
        self.state = state;
        self.global = GlobalState::default();
        self.reconfigure_surface();

        self.canvas = Canvas::new(&self.state.device, self.canvas.extent);
        for t in self.targets.values_mut() {
            t.tex = create_target_texture(&self.state.device, &t.desc);
        }
        Ok(())
    }

    fn submissions(&self) -> u64 {
        self.submissions
    }
}

#[cfg(test)]
mod tests {
    use super::f32_to_f16_bits;

    #[test]
    fn half_conversion_matches_known_values() {
        assert_eq!(f32_to_f16_bits(0.0), 0x0000);
        assert_eq!(f32_to_f16_bits(1.0), 0x3c00);
        assert_eq!(f32_to_f16_bits(0.5), 0x3800);
        assert_eq!(f32_to_f16_bits(-2.0), 0xc000);
        assert_eq!(f32_to_f16_bits(65504.0), 0x7bff);
        assert_eq!(f32_to_f16_bits(1.0e6), 0x7c00);
        assert_eq!(f32_to_f16_bits(f32::NAN) & 0x7c00, 0x7c00);
    }

    #[test]
    fn half_conversion_handles_subnormals() {
        // 2^-24 is the smallest positive half subnormal.
        assert_eq!(f32_to_f16_bits(2.0f32.powi(-24)), 0x0001);
        assert_eq!(f32_to_f16_bits(2.0f32.powi(-30)), 0x0000);
    }
}

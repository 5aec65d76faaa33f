//! Full-screen programs the canvas can run, with their uniform blocks.
//!
//! Every uniform block is `#[repr(C)]`, made only of `[f32; 4]` rows (so the
//! WGSL struct layout matches without padding rules) and at most
//! [`UNIFORM_SLOT`] bytes. Row meanings are documented on each field and mirrored
//! in `shaders/*.wgsl` and the CPU reference kernels.

use bytemuck::{Pod, Zeroable};

/// Size of one dynamic-offset uniform slot.
pub const UNIFORM_SLOT: usize = 256;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct BackgroundUniforms {
    /// canvas width, canvas height, segments x, segments y
    pub resolution: [f32; 4],
    /// scaled time, global noise freq x, global noise freq y, amplitude
    pub global: [f32; 4],
    /// displacement noise freq x, freq y, speed, flow
    pub deform: [f32; 4],
    /// seed, darken top (0/1), shadow power, mode (0 gradient, 1 solid)
    pub shade: [f32; 4],
    /// grain strength, grain present (0/1), -, -
    pub grain: [f32; 4],
    /// base color followed by the three wave colors
    pub colors: [[f32; 4]; 4],
    /// per wave: freq x, freq y, speed, flow
    pub waves_a: [[f32; 4]; 3],
    /// per wave: seed, floor, ceiling, -
    pub waves_b: [[f32; 4]; 3],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct SolidUniforms {
    /// premultiplied color
    pub color: [f32; 4],
    /// depth, field strength (tint only), -, -
    pub params: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct FlowmapUniforms {
    /// texel x, texel y, aspect, dissipation
    pub texel_aspect: [f32; 4],
    /// pointer x, pointer y, velocity x, velocity y
    pub pointer: [f32; 4],
    /// falloff, alpha, pointer present (0/1), -
    pub params: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct SplatUniforms {
    /// texel x, texel y, aspect, radius
    pub texel_aspect: [f32; 4],
    /// point x, point y, -, -
    pub point: [f32; 4],
    /// additive value
    pub value: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct AdvectUniforms {
    /// velocity texel x, texel y, dt (s), dissipation
    pub texel_dt: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct GridUniforms {
    /// texel x, texel y, -, -
    pub texel: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct VorticityUniforms {
    /// texel x, texel y, dt (s), curl strength
    pub texel_dt: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct ScaleUniforms {
    /// factor, -, -, -
    pub factor: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct PostUniforms {
    /// texel x, texel y, time (s), -
    pub texel_time: [f32; 4],
    /// intensity, threshold, enabled, -
    pub bloom: [f32; 4],
    /// amount, enabled, -, -
    pub noise: [f32; 4],
    /// offset, darkness, enabled, -
    pub vignette: [f32; 4],
    /// offset, enabled, -, -
    pub chroma: [f32; 4],
    /// strength, enabled, -, -
    pub distortion: [f32; 4],
    /// strength, enabled, -, -
    pub edges: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct PresentUniforms {
    /// tone mapping (0 none, 1 aces), -, -, -
    pub params: [f32; 4],
}

/// How a kernel interacts with the canvas depth buffer.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum DepthMode {
    /// No depth test, no depth write.
    Ignore,
    /// `Less` test and write.
    TestWrite,
}

/// How a kernel's output combines with the destination.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BlendMode {
    Replace,
    PremultipliedOver,
}

/// Kernel identity without its uniforms; used as a pipeline cache key.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum KernelKind {
    Background,
    Solid,
    FieldTint,
    Normals,
    Flowmap,
    Splat,
    Advect,
    Curl,
    Vorticity,
    Divergence,
    Scale,
    Jacobi,
    GradientSubtract,
    Copy,
    Post,
    Present,
}

/// A program plus its uniforms.
///
/// Input slot conventions (`Pass::inputs`):
/// - `FieldTint`: 0 = distortion field
/// - `Background`: 0 = optional grain texture
/// - `Flowmap`, `Splat`, `Scale`, `Copy`: 0 = previous/base field
/// - `Advect`: 0 = velocity, 1 = advected source
/// - `Curl`, `Divergence`: 0 = velocity
/// - `Vorticity`: 0 = velocity, 1 = curl
/// - `Jacobi`: 0 = pressure, 1 = divergence
/// - `GradientSubtract`: 0 = pressure, 1 = velocity
/// - `Post`: 0 = scene, 1 = normals, 2 = distortion field
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Kernel {
    Background(BackgroundUniforms),
    Solid(SolidUniforms),
    FieldTint(SolidUniforms),
    Normals(SolidUniforms),
    Flowmap(FlowmapUniforms),
    Splat(SplatUniforms),
    Advect(AdvectUniforms),
    Curl(GridUniforms),
    Vorticity(VorticityUniforms),
    Divergence(GridUniforms),
    Scale(ScaleUniforms),
    Jacobi(GridUniforms),
    GradientSubtract(GridUniforms),
    Copy,
    Post(PostUniforms),
    Present(PresentUniforms),
}

impl Kernel {
    pub fn kind(&self) -> KernelKind {
        match self {
            Kernel::Background(_) => KernelKind::Background,
            Kernel::Solid(_) => KernelKind::Solid,
            Kernel::FieldTint(_) => KernelKind::FieldTint,
            Kernel::Normals(_) => KernelKind::Normals,
            Kernel::Flowmap(_) => KernelKind::Flowmap,
            Kernel::Splat(_) => KernelKind::Splat,
            Kernel::Advect(_) => KernelKind::Advect,
            Kernel::Curl(_) => KernelKind::Curl,
            Kernel::Vorticity(_) => KernelKind::Vorticity,
            Kernel::Divergence(_) => KernelKind::Divergence,
            Kernel::Scale(_) => KernelKind::Scale,
            Kernel::Jacobi(_) => KernelKind::Jacobi,
            Kernel::GradientSubtract(_) => KernelKind::GradientSubtract,
            Kernel::Copy => KernelKind::Copy,
            Kernel::Post(_) => KernelKind::Post,
            Kernel::Present(_) => KernelKind::Present,
        }
    }

    /// Raw uniform bytes; empty for kernels without uniforms.
    pub fn uniform_bytes(&self) -> &[u8] {
        match self {
            Kernel::Background(u) => bytemuck::bytes_of(u),
            Kernel::Solid(u) | Kernel::FieldTint(u) | Kernel::Normals(u) => bytemuck::bytes_of(u),
            Kernel::Flowmap(u) => bytemuck::bytes_of(u),
            Kernel::Splat(u) => bytemuck::bytes_of(u),
            Kernel::Advect(u) => bytemuck::bytes_of(u),
            Kernel::Curl(u) | Kernel::Divergence(u) | Kernel::Jacobi(u) | Kernel::GradientSubtract(u) => {
                bytemuck::bytes_of(u)
            }
            Kernel::Vorticity(u) => bytemuck::bytes_of(u),
            Kernel::Scale(u) => bytemuck::bytes_of(u),
            Kernel::Copy => &[],
            Kernel::Post(u) => bytemuck::bytes_of(u),
            Kernel::Present(u) => bytemuck::bytes_of(u),
        }
    }

    /// Vertices to draw: a tessellated grid for the background, one
    /// full-screen triangle otherwise.
    pub fn vertex_count(&self) -> u32 {
        match self {
            Kernel::Background(u) => {
                let sx = u.resolution[2].max(1.0) as u32;
                let sy = u.resolution[3].max(1.0) as u32;
                sx * sy * 6
            }
            _ => 3,
        }
    }
}

impl KernelKind {
    pub fn depth_mode(self) -> DepthMode {
        match self {
            KernelKind::Solid | KernelKind::FieldTint => DepthMode::TestWrite,
            _ => DepthMode::Ignore,
        }
    }

    pub fn blend_mode(self) -> BlendMode {
        match self {
            KernelKind::Solid | KernelKind::FieldTint => BlendMode::PremultipliedOver,
            _ => BlendMode::Replace,
        }
    }

    /// WGSL source for the kernel's fragment (and, for the background, vertex) stage.
    pub(crate) fn shader_source(self) -> &'static str {
        match self {
            KernelKind::Background => include_str!("shaders/background.wgsl"),
            KernelKind::Solid => include_str!("shaders/solid.wgsl"),
            KernelKind::FieldTint => include_str!("shaders/field_tint.wgsl"),
            KernelKind::Normals => include_str!("shaders/normals.wgsl"),
            KernelKind::Flowmap => include_str!("shaders/flowmap.wgsl"),
            KernelKind::Splat => include_str!("shaders/splat.wgsl"),
            KernelKind::Advect => include_str!("shaders/advect.wgsl"),
            KernelKind::Curl => include_str!("shaders/curl.wgsl"),
            KernelKind::Vorticity => include_str!("shaders/vorticity.wgsl"),
            KernelKind::Divergence => include_str!("shaders/divergence.wgsl"),
            KernelKind::Scale => include_str!("shaders/scale.wgsl"),
            KernelKind::Jacobi => include_str!("shaders/jacobi.wgsl"),
            KernelKind::GradientSubtract => include_str!("shaders/gradient_subtract.wgsl"),
            KernelKind::Copy => include_str!("shaders/copy.wgsl"),
            KernelKind::Post => include_str!("shaders/post.wgsl"),
            KernelKind::Present => include_str!("shaders/present.wgsl"),
        }
    }

    pub(crate) fn label(self) -> &'static str {
        match self {
            KernelKind::Background => "wayfarer background",
            KernelKind::Solid => "wayfarer solid",
            KernelKind::FieldTint => "wayfarer field tint",
            KernelKind::Normals => "wayfarer normals",
            KernelKind::Flowmap => "wayfarer flowmap",
            KernelKind::Splat => "wayfarer splat",
            KernelKind::Advect => "wayfarer advect",
            KernelKind::Curl => "wayfarer curl",
            KernelKind::Vorticity => "wayfarer vorticity",
            KernelKind::Divergence => "wayfarer divergence",
            KernelKind::Scale => "wayfarer scale",
            KernelKind::Jacobi => "wayfarer jacobi",
            KernelKind::GradientSubtract => "wayfarer gradient subtract",
            KernelKind::Copy => "wayfarer copy",
            KernelKind::Post => "wayfarer post",
            KernelKind::Present => "wayfarer present",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_blocks_fit_one_slot() {
        assert!(std::mem::size_of::<BackgroundUniforms>() <= UNIFORM_SLOT);
        assert!(std::mem::size_of::<PostUniforms>() <= UNIFORM_SLOT);
        assert_eq!(std::mem::size_of::<BackgroundUniforms>() % 16, 0);
    }

    #[test]
    fn background_vertex_count_follows_segments() {
        let mut u = BackgroundUniforms::zeroed();
        u.resolution = [800.0, 600.0, 48.0, 96.0];
        assert_eq!(Kernel::Background(u).vertex_count(), 48 * 96 * 6);
        assert_eq!(Kernel::Copy.vertex_count(), 3);
    }

    #[test]
    fn only_content_kernels_touch_depth() {
        assert_eq!(KernelKind::Solid.depth_mode(), DepthMode::TestWrite);
        assert_eq!(KernelKind::Background.depth_mode(), DepthMode::Ignore);
        assert_eq!(KernelKind::Post.blend_mode(), BlendMode::Replace);
    }
}

//! CPU evaluation of every [`Kernel`], one fragment at a time.
//!
//! Each function here is the reference for the matching `shaders/*.wgsl`.

use crate::coords::Extent;

use super::image::SoftImage;
use super::noise::{hash12, smoothstep, snoise};
use crate::device::kernel::{
    AdvectUniforms, BackgroundUniforms, FlowmapUniforms, GridUniforms, Kernel, PostUniforms,
    SolidUniforms, SplatUniforms, VorticityUniforms,
};

/// Resolved pass inputs. Unbound slots sample as zero.
pub(super) struct Inputs<'a> {
    pub slots: [Option<&'a SoftImage>; 3],
}

impl Inputs<'_> {
    #[inline]
    fn sample(&self, slot: usize, uv: [f32; 2]) -> [f32; 4] {
        match self.slots[slot] {
            Some(img) => img.sample(uv),
            None => [0.0; 4],
        }
    }

    #[inline]
    fn bound(&self, slot: usize) -> bool {
        self.slots[slot].is_some()
    }
}

/// Output of one fragment evaluation.
pub(super) struct Fragment {
    pub color: [f32; 4],
    pub depth: f32,
}

impl Fragment {
    #[inline]
    fn color(color: [f32; 4]) -> Self {
        Self { color, depth: 0.0 }
    }
}

const LUMA: [f32; 3] = [0.2126, 0.7152, 0.0722];

#[inline]
fn offset(uv: [f32; 2], dx: f32, dy: f32) -> [f32; 2] {
    [uv[0] + dx, uv[1] + dy]
}

#[inline]
fn mix(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Evaluates `kernel` at the texel center `uv` of pixel `px` on an output of `extent`.
pub(super) fn shade(
    kernel: &Kernel,
    uv: [f32; 2],
    px: [u32; 2],
    extent: Extent,
    inputs: &Inputs<'_>,
) -> Fragment {
    match kernel {
        Kernel::Background(u) => Fragment::color(background(u, uv, extent, inputs)),
        Kernel::Solid(u) | Kernel::Normals(u) => Fragment {
            color: u.color,
            depth: u.params[0],
        },
        Kernel::FieldTint(u) => field_tint(u, uv, inputs),
        Kernel::Flowmap(u) => Fragment::color(flowmap(u, uv, inputs)),
        Kernel::Splat(u) => Fragment::color(splat(u, uv, inputs)),
        Kernel::Advect(u) => Fragment::color(advect(u, uv, inputs)),
        Kernel::Curl(u) => Fragment::color(curl(u, uv, inputs)),
        Kernel::Vorticity(u) => Fragment::color(vorticity(u, uv, inputs)),
        Kernel::Divergence(u) => Fragment::color(divergence(u, uv, inputs)),
        Kernel::Scale(u) => Fragment::color(inputs.sample(0, uv).map(|c| c * u.factor[0])),
        Kernel::Jacobi(u) => Fragment::color(jacobi(u, uv, inputs)),
        Kernel::GradientSubtract(u) => Fragment::color(gradient_subtract(u, uv, inputs)),
        Kernel::Copy => Fragment::color(inputs.sample(0, uv)),
        Kernel::Post(u) => Fragment::color(post(u, uv, px, inputs)),
        Kernel::Present(u) => {
            let c = inputs.sample(0, uv);
            let c = if u.params[0] >= 0.5 { aces(c) } else { c };
            Fragment::color(c)
        }
    }
}

// ── content ────────────────────────────────────────────────────────────────

fn field_tint(u: &SolidUniforms, uv: [f32; 2], inputs: &Inputs<'_>) -> Fragment {
    let field = inputs.sample(0, uv);
    let strength = u.params[1];
    let a = u.color[3];
    let mut color = u.color;
    for i in 0..3 {
        color[i] = (color[i] + strength * field[i] * a).clamp(0.0, a.max(0.0));
    }
    Fragment {
        color,
        depth: u.params[0],
    }
}

// ── background ─────────────────────────────────────────────────────────────

fn background(u: &BackgroundUniforms, uv: [f32; 2], extent: Extent, inputs: &Inputs<'_>) -> [f32; 4] {
    if u.shade[3] >= 0.5 {
        let c = u.colors[0];
        return [c[0], c[1], c[2], 1.0];
    }

    let res = [extent.width as f32, extent.height as f32];
    let uv_norm = [uv[0] * 2.0 - 1.0, 1.0 - uv[1] * 2.0];
    let noise_coord = [
        res[0] * uv_norm[0] * u.global[1],
        res[1] * uv_norm[1] * u.global[2],
    ];
    let time = u.global[0];

    let mut rgb = [u.colors[0][0], u.colors[0][1], u.colors[0][2]];
    for i in 0..3 {
        let a = u.waves_a[i];
        let b = u.waves_b[i];
        let n = snoise([
            noise_coord[0] * a[0] + time * a[3],
            noise_coord[1] * a[1],
            time * a[2] + b[0],
        ]);
        let t = smoothstep(b[1], b[2], n / 2.0 + 0.5).powi(4);
        let layer = u.colors[i + 1];
        for c in 0..3 {
            rgb[c] = mix(rgb[c], layer[c], t);
        }
    }

    if u.shade[1] >= 0.5 {
        let st_y = 1.0 - uv[1];
        let s = (st_y + (-12.0f32).sin() * uv[0]).max(0.0);
        rgb[1] -= s.powf(u.shade[2]) * 0.4;
    }

    if u.grain[1] >= 0.5 && inputs.bound(0) {
        let g = inputs.sample(0, uv)[0];
        let k = mix(1.0, g, u.grain[0]);
        for c in rgb.iter_mut() {
            *c *= k;
        }
    }

    [rgb[0].max(0.0), rgb[1].max(0.0), rgb[2].max(0.0), 1.0]
}

// ── flowmap ────────────────────────────────────────────────────────────────

fn flowmap(u: &FlowmapUniforms, uv: [f32; 2], inputs: &Inputs<'_>) -> [f32; 4] {
    let prev = inputs.sample(0, uv);
    let dissipation = u.texel_aspect[3];
    let mut out = [prev[0] * dissipation, prev[1] * dissipation, prev[2] * dissipation, 1.0];

    let falloff = u.params[0];
    if u.params[2] >= 0.5 && falloff > 0.0 {
        let aspect = u.texel_aspect[2];
        let cx = (uv[0] - u.pointer[0]) * aspect;
        let cy = uv[1] - u.pointer[1];
        let vx = u.pointer[2];
        let vy = u.pointer[3];
        let speed = (vx * vx + vy * vy).sqrt().min(1.0);
        let stamp = [vx, vy, 1.0 - (1.0 - speed).powi(3)];
        let f = (1.0 - smoothstep(0.0, falloff, (cx * cx + cy * cy).sqrt())) * u.params[1];
        for i in 0..3 {
            out[i] += stamp[i] * f;
        }
    }
    out
}

// ── fluid ──────────────────────────────────────────────────────────────────

fn splat(u: &SplatUniforms, uv: [f32; 2], inputs: &Inputs<'_>) -> [f32; 4] {
    let base = inputs.sample(0, uv);
    let radius = u.texel_aspect[3];
    if radius <= 0.0 {
        return base;
    }
    let px = (uv[0] - u.point[0]) * u.texel_aspect[2];
    let py = uv[1] - u.point[1];
    let w = (-(px * px + py * py) / (radius * radius)).exp();
    [
        base[0] + u.value[0] * w,
        base[1] + u.value[1] * w,
        base[2] + u.value[2] * w,
        base[3] + u.value[3] * w,
    ]
}

fn advect(u: &AdvectUniforms, uv: [f32; 2], inputs: &Inputs<'_>) -> [f32; 4] {
    let [tx, ty, dt, dissipation] = u.texel_dt;
    let vel = inputs.sample(0, uv);
    let coord = [uv[0] - dt * vel[0] * tx, uv[1] - dt * vel[1] * ty];
    let decay = 1.0 / (1.0 + dissipation * dt);
    inputs.sample(1, coord).map(|c| c * decay)
}

struct Neighbors {
    l: [f32; 4],
    r: [f32; 4],
    u: [f32; 4],
    d: [f32; 4],
}

/// Left/right/up/down taps; `up` is toward smaller `v`.
#[inline]
fn neighbors(inputs: &Inputs<'_>, slot: usize, uv: [f32; 2], tx: f32, ty: f32) -> Neighbors {
    Neighbors {
        l: inputs.sample(slot, offset(uv, -tx, 0.0)),
        r: inputs.sample(slot, offset(uv, tx, 0.0)),
        u: inputs.sample(slot, offset(uv, 0.0, -ty)),
        d: inputs.sample(slot, offset(uv, 0.0, ty)),
    }
}

fn curl(u: &GridUniforms, uv: [f32; 2], inputs: &Inputs<'_>) -> [f32; 4] {
    let n = neighbors(inputs, 0, uv, u.texel[0], u.texel[1]);
    let w = 0.5 * ((n.r[1] - n.l[1]) - (n.d[0] - n.u[0]));
    [w, 0.0, 0.0, 1.0]
}

/// Velocity component bound for the confinement pass.
const VELOCITY_LIMIT: f32 = 1000.0;

fn vorticity(u: &VorticityUniforms, uv: [f32; 2], inputs: &Inputs<'_>) -> [f32; 4] {
    let [tx, ty, dt, strength] = u.texel_dt;
    let n = neighbors(inputs, 1, uv, tx, ty);
    let c = inputs.sample(1, uv)[0];

    let gx = 0.5 * (n.r[0].abs() - n.l[0].abs());
    let gy = 0.5 * (n.d[0].abs() - n.u[0].abs());
    let len = (gx * gx + gy * gy).sqrt() + 1e-4;
    let (nx, ny) = (gx / len, gy / len);
    let fx = strength * c * ny;
    let fy = -strength * c * nx;

    let vel = inputs.sample(0, uv);
    [
        (vel[0] + fx * dt).clamp(-VELOCITY_LIMIT, VELOCITY_LIMIT),
        (vel[1] + fy * dt).clamp(-VELOCITY_LIMIT, VELOCITY_LIMIT),
        0.0,
        1.0,
    ]
}

fn divergence(u: &GridUniforms, uv: [f32; 2], inputs: &Inputs<'_>) -> [f32; 4] {
    let n = neighbors(inputs, 0, uv, u.texel[0], u.texel[1]);
    let div = 0.5 * (n.r[0] - n.l[0] + n.d[1] - n.u[1]);
    [div, 0.0, 0.0, 1.0]
}

fn jacobi(u: &GridUniforms, uv: [f32; 2], inputs: &Inputs<'_>) -> [f32; 4] {
    let n = neighbors(inputs, 0, uv, u.texel[0], u.texel[1]);
    let div = inputs.sample(1, uv)[0];
    let p = (n.l[0] + n.r[0] + n.u[0] + n.d[0] - div) * 0.25;
    [p, 0.0, 0.0, 1.0]
}

fn gradient_subtract(u: &GridUniforms, uv: [f32; 2], inputs: &Inputs<'_>) -> [f32; 4] {
    let n = neighbors(inputs, 0, uv, u.texel[0], u.texel[1]);
    let vel = inputs.sample(1, uv);
    [
        vel[0] - 0.5 * (n.r[0] - n.l[0]),
        vel[1] - 0.5 * (n.d[0] - n.u[0]),
        0.0,
        1.0,
    ]
}

// ── post ───────────────────────────────────────────────────────────────────

fn post(u: &PostUniforms, uv: [f32; 2], px: [u32; 2], inputs: &Inputs<'_>) -> [f32; 4] {
    let [tx, ty, time, _] = u.texel_time;

    let mut coord = uv;
    if u.distortion[1] >= 0.5 && inputs.bound(2) {
        let f = inputs.sample(2, uv);
        coord = offset(uv, f[0] * u.distortion[0], f[1] * u.distortion[0]);
    }

    let mut c = inputs.sample(0, coord);

    if u.chroma[1] >= 0.5 {
        let o = u.chroma[0];
        c[0] = inputs.sample(0, offset(coord, o, 0.0))[0];
        c[2] = inputs.sample(0, offset(coord, -o, 0.0))[2];
    }

    if u.bloom[2] >= 0.5 {
        let threshold = u.bloom[1];
        let mut acc = [0.0f32; 3];
        for dy in -1..=1 {
            for dx in -1..=1 {
                let s = inputs.sample(0, offset(coord, dx as f32 * 2.0 * tx, dy as f32 * 2.0 * ty));
                let l = s[0] * LUMA[0] + s[1] * LUMA[1] + s[2] * LUMA[2];
                let w = (l - threshold).max(0.0) / l.max(1e-4);
                for i in 0..3 {
                    acc[i] += s[i] * w;
                }
            }
        }
        for i in 0..3 {
            c[i] += acc[i] / 9.0 * u.bloom[0];
        }
    }

    if u.edges[1] >= 0.5 && inputs.bound(1) {
        let n = inputs.sample(1, uv);
        let nr = inputs.sample(1, offset(uv, tx, 0.0));
        let nd = inputs.sample(1, offset(uv, 0.0, ty));
        let e: f32 = (0..3).map(|i| (n[i] - nr[i]).abs() + (n[i] - nd[i]).abs()).sum();
        let k = 1.0 - (e * u.edges[0]).clamp(0.0, 1.0);
        for ch in c.iter_mut().take(3) {
            *ch *= k;
        }
    }

    if u.vignette[2] >= 0.5 {
        let vx = (uv[0] - 0.5) * u.vignette[0];
        let vy = (uv[1] - 0.5) * u.vignette[0];
        let t = (vx * vx + vy * vy).clamp(0.0, 1.0);
        let target = (1.0 - u.vignette[1]) * c[3];
        for ch in c.iter_mut().take(3) {
            *ch = mix(*ch, target.min(*ch), t);
        }
    }

    if u.noise[1] >= 0.5 {
        let n = hash12([px[0] as f32 + time * 61.0, px[1] as f32 + time * 17.0]) - 0.5;
        for i in 0..3 {
            c[i] += n * u.noise[0] * c[3];
        }
    }

    [c[0].max(0.0), c[1].max(0.0), c[2].max(0.0), c[3]]
}

fn aces(c: [f32; 4]) -> [f32; 4] {
    let f = |x: f32| ((x * (2.51 * x + 0.03)) / (x * (2.43 * x + 0.59) + 0.14)).clamp(0.0, 1.0);
    [f(c[0]), f(c[1]), f(c[2]), c[3]]
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytemuck::Zeroable;

    fn none() -> Inputs<'static> {
        Inputs { slots: [None; 3] }
    }

    #[test]
    fn splat_peaks_at_point() {
        let u = SplatUniforms {
            texel_aspect: [0.0, 0.0, 1.0, 0.1],
            point: [0.5, 0.5, 0.0, 0.0],
            value: [2.0, 0.0, 0.0, 0.0],
        };
        let at = splat(&u, [0.5, 0.5], &none());
        let off = splat(&u, [0.6, 0.5], &none());
        assert!((at[0] - 2.0).abs() < 1e-6);
        assert!((off[0] - 2.0 * (-1.0f32).exp()).abs() < 1e-4);
    }

    #[test]
    fn splat_with_zero_radius_is_identity() {
        let mut u = SplatUniforms::zeroed();
        u.value = [5.0; 4];
        assert_eq!(splat(&u, [0.5, 0.5], &none()), [0.0; 4]);
    }

    #[test]
    fn background_solid_mode_uses_base_color() {
        let mut u = BackgroundUniforms::zeroed();
        u.shade[3] = 1.0;
        u.colors[0] = [0.2, 0.3, 0.4, 1.0];
        let c = background(&u, [0.5, 0.5], Extent::new(4, 4), &none());
        assert_eq!(c, [0.2, 0.3, 0.4, 1.0]);
    }

    #[test]
    fn flowmap_without_pointer_only_dissipates() {
        let mut u = FlowmapUniforms::zeroed();
        u.texel_aspect = [0.0, 0.0, 1.0, 0.5];
        u.params = [0.15, 1.0, 0.0, 0.0];
        assert_eq!(flowmap(&u, [0.5, 0.5], &none()), [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn aces_maps_into_unit_range() {
        let c = aces([10.0, 0.0, 0.5, 1.0]);
        assert!(c[0] <= 1.0 && c[0] > 0.9);
        assert_eq!(c[1], 0.0);
    }
}

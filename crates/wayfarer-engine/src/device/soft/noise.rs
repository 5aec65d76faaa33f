//! 3D simplex noise (Ashima Arts / Ian McEwan formulation).
//!
//! Mirrors `snoise` in `shaders/background.wgsl` so the reference
//! rasterizer produces the same gradient as the GPU.

type V3 = [f32; 3];
type V4 = [f32; 4];

#[inline]
fn mod289(x: f32) -> f32 {
    x - (x * (1.0 / 289.0)).floor() * 289.0
}

#[inline]
fn permute(x: f32) -> f32 {
    mod289(((x * 34.0) + 1.0) * x)
}

#[inline]
fn taylor_inv_sqrt(r: f32) -> f32 {
    1.792_842_9 - 0.853_734_73 * r
}

#[inline]
fn step(edge: f32, x: f32) -> f32 {
    if x < edge { 0.0 } else { 1.0 }
}

#[inline]
fn dot3(a: V3, b: V3) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

/// Returns noise in roughly `[-1, 1]`.
pub(crate) fn snoise(v: V3) -> f32 {
    const CX: f32 = 1.0 / 6.0;
    const CY: f32 = 1.0 / 3.0;

    // First corner
    let s = (v[0] + v[1] + v[2]) * CY;
    let i: V3 = [(v[0] + s).floor(), (v[1] + s).floor(), (v[2] + s).floor()];
    let t = (i[0] + i[1] + i[2]) * CX;
    let x0: V3 = [v[0] - i[0] + t, v[1] - i[1] + t, v[2] - i[2] + t];

    // Other corners
    let g: V3 = [step(x0[1], x0[0]), step(x0[2], x0[1]), step(x0[0], x0[2])];
    let l: V3 = [1.0 - g[0], 1.0 - g[1], 1.0 - g[2]];
    let i1: V3 = [g[0].min(l[2]), g[1].min(l[0]), g[2].min(l[1])];
    let i2: V3 = [g[0].max(l[2]), g[1].max(l[0]), g[2].max(l[1])];

    let x1: V3 = [x0[0] - i1[0] + CX, x0[1] - i1[1] + CX, x0[2] - i1[2] + CX];
    let x2: V3 = [x0[0] - i2[0] + CY, x0[1] - i2[1] + CY, x0[2] - i2[2] + CY];
    let x3: V3 = [x0[0] - 0.5, x0[1] - 0.5, x0[2] - 0.5];

    // Permutations
    let i: V3 = [mod289(i[0]), mod289(i[1]), mod289(i[2])];
    let mut p: V4 = [0.0; 4];
    let oz = [0.0, i1[2], i2[2], 1.0];
    let oy = [0.0, i1[1], i2[1], 1.0];
    let ox = [0.0, i1[0], i2[0], 1.0];
    for k in 0..4 {
        let a = permute(i[2] + oz[k]);
        let b = permute(a + i[1] + oy[k]);
        p[k] = permute(b + i[0] + ox[k]);
    }

    // Gradients: 7x7 points over a square, mapped onto an octahedron.
    let n_ = 1.0 / 7.0;
    let ns: V3 = [n_ * 2.0, n_ * 0.5 - 1.0, n_];

    let mut x: V4 = [0.0; 4];
    let mut y: V4 = [0.0; 4];
    let mut h: V4 = [0.0; 4];
    for k in 0..4 {
        let j = p[k] - 49.0 * (p[k] * ns[2] * ns[2]).floor();
        let x_ = (j * ns[2]).floor();
        let y_ = (j - 7.0 * x_).floor();
        x[k] = x_ * ns[0] + ns[1];
        y[k] = y_ * ns[0] + ns[1];
        h[k] = 1.0 - x[k].abs() - y[k].abs();
    }

    let b0: V4 = [x[0], x[1], y[0], y[1]];
    let b1: V4 = [x[2], x[3], y[2], y[3]];
    let s0: V4 = b0.map(|c| c.floor() * 2.0 + 1.0);
    let s1: V4 = b1.map(|c| c.floor() * 2.0 + 1.0);
    let sh: V4 = h.map(|c| -step(c, 0.0));

    // a0 = b0.xzyw + s0.xzyw * sh.xxyy ; a1 = b1.xzyw + s1.xzyw * sh.zzww
    let a0: V4 = [
        b0[0] + s0[0] * sh[0],
        b0[2] + s0[2] * sh[0],
        b0[1] + s0[1] * sh[1],
        b0[3] + s0[3] * sh[1],
    ];
    let a1: V4 = [
        b1[0] + s1[0] * sh[2],
        b1[2] + s1[2] * sh[2],
        b1[1] + s1[1] * sh[3],
        b1[3] + s1[3] * sh[3],
    ];

    let mut p0: V3 = [a0[0], a0[1], h[0]];
    let mut p1: V3 = [a0[2], a0[3], h[1]];
    let mut p2: V3 = [a1[0], a1[1], h[2]];
    let mut p3: V3 = [a1[2], a1[3], h[3]];

    // Normalise gradients
    let norm = [
        taylor_inv_sqrt(dot3(p0, p0)),
        taylor_inv_sqrt(dot3(p1, p1)),
        taylor_inv_sqrt(dot3(p2, p2)),
        taylor_inv_sqrt(dot3(p3, p3)),
    ];
    p0 = p0.map(|c| c * norm[0]);
    p1 = p1.map(|c| c * norm[1]);
    p2 = p2.map(|c| c * norm[2]);
    p3 = p3.map(|c| c * norm[3]);

    // Mix final noise value
    let m: V4 = [
        (0.6 - dot3(x0, x0)).max(0.0),
        (0.6 - dot3(x1, x1)).max(0.0),
        (0.6 - dot3(x2, x2)).max(0.0),
        (0.6 - dot3(x3, x3)).max(0.0),
    ];
    let m2 = m.map(|c| c * c);
    let weights = [dot3(p0, x0), dot3(p1, x1), dot3(p2, x2), dot3(p3, x3)];

    42.0 * (0..4).map(|k| m2[k] * m2[k] * weights[k]).sum::<f32>()
}

/// Hermite smoothstep; `edge0 >= edge1` yields a hard step at `edge0`.
#[inline]
pub(crate) fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    if edge1 <= edge0 {
        return step(edge0, x);
    }
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Cheap per-pixel hash in `[0, 1)`.
#[inline]
pub(crate) fn hash12(p: [f32; 2]) -> f32 {
    let d = p[0] * 12.9898 + p[1] * 78.233;
    let s = d.sin() * 43_758.547;
    s - s.floor()
}

use crate::coords::Extent;

/// RGBA float image with GPU-style sampling (bilinear, clamp-to-edge).
#[derive(Debug, Clone)]
pub(crate) struct SoftImage {
    pub extent: Extent,
    pub pixels: Vec<[f32; 4]>,
}

impl SoftImage {
    pub fn new(extent: Extent) -> Self {
        Self::filled(extent, [0.0; 4])
    }

    pub fn filled(extent: Extent, value: [f32; 4]) -> Self {
        Self {
            extent,
            pixels: vec![value; extent.pixel_count()],
        }
    }

    pub fn fill(&mut self, value: [f32; 4]) {
        self.pixels.fill(value);
    }

    #[inline]
    pub fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.extent.width as usize + x as usize
    }

    /// Texel fetch with coordinates clamped to the edge.
    #[inline]
    pub fn fetch(&self, x: i64, y: i64) -> [f32; 4] {
        if self.pixels.is_empty() {
            return [0.0; 4];
        }
        let x = x.clamp(0, self.extent.width as i64 - 1) as u32;
        let y = y.clamp(0, self.extent.height as i64 - 1) as u32;
        self.pixels[self.index(x, y)]
    }

    /// Bilinear sample at normalized `uv` (texel centers at `(i + 0.5) / size`).
    pub fn sample(&self, uv: [f32; 2]) -> [f32; 4] {
        let fx = uv[0] * self.extent.width as f32 - 0.5;
        let fy = uv[1] * self.extent.height as f32 - 0.5;
        if !fx.is_finite() || !fy.is_finite() {
            return self.fetch(0, 0);
        }

        let x0 = fx.floor();
        let y0 = fy.floor();
        let tx = fx - x0;
        let ty = fy - y0;
        let (x0, y0) = (x0 as i64, y0 as i64);

        let a = self.fetch(x0, y0);
        let b = self.fetch(x0 + 1, y0);
        let c = self.fetch(x0, y0 + 1);
        let d = self.fetch(x0 + 1, y0 + 1);

        let mut out = [0.0; 4];
        for i in 0..4 {
            let top = a[i] + (b[i] - a[i]) * tx;
            let bottom = c[i] + (d[i] - c[i]) * tx;
            out[i] = top + (bottom - top) * ty;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp() -> SoftImage {
        let mut img = SoftImage::new(Extent::new(2, 1));
        img.pixels[0] = [0.0, 0.0, 0.0, 1.0];
        img.pixels[1] = [1.0, 0.0, 0.0, 1.0];
        img
    }

    #[test]
    fn sample_at_texel_center_is_exact() {
        let img = ramp();
        assert_eq!(img.sample([0.25, 0.5])[0], 0.0);
        assert_eq!(img.sample([0.75, 0.5])[0], 1.0);
    }

    #[test]
    fn sample_between_centers_interpolates() {
        assert!((ramp().sample([0.5, 0.5])[0] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn sample_outside_clamps_to_edge() {
        let img = ramp();
        assert_eq!(img.sample([-3.0, 0.5])[0], 0.0);
        assert_eq!(img.sample([7.0, 9.0])[0], 1.0);
    }
}

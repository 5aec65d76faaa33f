/// Size of a physical-pixel surface: the canvas or a render target.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct Extent {
    pub width: u32,
    pub height: u32,
}

impl Extent {
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Width over height. Degenerate extents report `1.0`.
    #[inline]
    pub fn aspect(self) -> f32 {
        if self.is_empty() {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }

    /// Size of one texel in normalized coordinates.
    #[inline]
    pub fn texel(self) -> [f32; 2] {
        [1.0 / self.width.max(1) as f32, 1.0 / self.height.max(1) as f32]
    }

    #[inline]
    pub fn pixel_count(self) -> usize {
        self.width as usize * self.height as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aspect_of_landscape_and_degenerate() {
        assert_eq!(Extent::new(200, 100).aspect(), 2.0);
        assert_eq!(Extent::new(0, 100).aspect(), 1.0);
    }

    #[test]
    fn texel_is_reciprocal() {
        assert_eq!(Extent::new(4, 8).texel(), [0.25, 0.125]);
    }
}

use super::{Extent, Vec2};

/// Axis-aligned rectangle in logical pixels (top-left origin).
///
/// Anchor rects reported by the layout provider use this type.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Rect {
    pub origin: Vec2,
    pub size: Vec2,
}

impl Rect {
    #[inline]
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            origin: Vec2::new(x, y),
            size: Vec2::new(w, h),
        }
    }

    #[inline]
    pub fn max(self) -> Vec2 {
        Vec2::new(self.origin.x + self.size.x, self.origin.y + self.size.y)
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.size.x <= 0.0 || self.size.y <= 0.0
    }

    #[inline]
    pub fn area(self) -> f32 {
        if self.is_empty() { 0.0 } else { self.size.x * self.size.y }
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.origin.is_finite() && self.size.is_finite()
    }

    /// Shifts the rect by `-origin`, making it relative to another frame
    /// (e.g. the canvas' fixed position on the page).
    #[inline]
    pub fn relative_to(self, origin: Vec2) -> Self {
        Self::from_origin_size(self.origin - origin, self.size)
    }

    #[inline]
    pub const fn from_origin_size(origin: Vec2, size: Vec2) -> Self {
        Self { origin, size }
    }

    /// Normalizes the rectangle so width/height are non-negative.
    #[inline]
    pub fn normalized(self) -> Self {
        let mut x = self.origin.x;
        let mut y = self.origin.y;
        let mut w = self.size.x;
        let mut h = self.size.y;

        if w < 0.0 {
            x += w;
            w = -w;
        }
        if h < 0.0 {
            y += h;
            h = -h;
        }

        Rect::new(x, y, w, h)
    }

    /// Half-open containment: [min, max).
    #[inline]
    pub fn contains(self, p: Vec2) -> bool {
        let r = self.normalized();
        p.x >= r.origin.x
            && p.y >= r.origin.y
            && p.x < (r.origin.x + r.size.x)
            && p.y < (r.origin.y + r.size.y)
    }

    #[inline]
    pub fn intersect(self, other: Rect) -> Option<Rect> {
        let a = self.normalized();
        let b = other.normalized();

        let x0 = a.origin.x.max(b.origin.x);
        let y0 = a.origin.y.max(b.origin.y);
        let x1 = (a.origin.x + a.size.x).min(b.origin.x + b.size.x);
        let y1 = (a.origin.y + a.size.y).min(b.origin.y + b.size.y);

        let w = x1 - x0;
        let h = y1 - y0;

        if w <= 0.0 || h <= 0.0 {
            None
        } else {
            Some(Rect::new(x0, y0, w, h))
        }
    }

    /// Converts to a physical scissor clamped to `canvas`.
    ///
    /// Returns `None` when nothing of the rect lands on the canvas; callers skip
    /// the draw in that case.
    pub fn to_pixels(self, scale: f32, canvas: Extent) -> Option<PixelRect> {
        if !self.is_finite() {
            return None;
        }
        let r = self.normalized();
        let x0 = ((r.origin.x * scale).round().max(0.0) as u32).min(canvas.width);
        let y0 = ((r.origin.y * scale).round().max(0.0) as u32).min(canvas.height);
        let x1 = (((r.origin.x + r.size.x) * scale).round().max(0.0) as u32).min(canvas.width);
        let y1 = (((r.origin.y + r.size.y) * scale).round().max(0.0) as u32).min(canvas.height);

        let rect = PixelRect::new(x0, y0, x1.saturating_sub(x0), y1.saturating_sub(y0));
        if rect.is_empty() { None } else { Some(rect) }
    }
}

/// Rectangle in physical canvas pixels. Used as a scissor.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    #[inline]
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    #[inline]
    pub const fn full(extent: Extent) -> Self {
        Self::new(0, 0, extent.width, extent.height)
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    #[inline]
    pub fn contains(self, x: u32, y: u32) -> bool {
        x >= self.x && y >= self.y && x < self.x + self.width && y < self.y + self.height
    }

    pub fn intersect(self, other: PixelRect) -> Option<PixelRect> {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = (self.x + self.width).min(other.x + other.width);
        let y1 = (self.y + self.height).min(other.y + other.height);
        if x1 <= x0 || y1 <= y0 {
            None
        } else {
            Some(PixelRect::new(x0, y0, x1 - x0, y1 - y0))
        }
    }

    /// Clips the rect to `extent`; `None` if nothing remains.
    pub fn clamped(self, extent: Extent) -> Option<PixelRect> {
        let x0 = self.x.min(extent.width);
        let y0 = self.y.min(extent.height);
        let x1 = self.x.saturating_add(self.width).min(extent.width);
        let y1 = self.y.saturating_add(self.height).min(extent.height);
        let r = PixelRect::new(x0, y0, x1 - x0, y1 - y0);
        if r.is_empty() { None } else { Some(r) }
    }
}

//! Coordinate and geometry types shared across the host, tunnel and kernels.
//!
//! Two spaces are in play:
//! - logical pixels (DPI-aware, origin top-left, +Y down) for anchor rects
//! - physical pixels (`Extent`, `PixelRect`) for canvas scissors and targets
//!
//! Normalized canvas coordinates (`0..1`, +Y down) are carried in `Vec2`.

mod extent;
mod rect;
mod vec2;

pub use extent::Extent;
pub use rect::{PixelRect, Rect};
pub use vec2::Vec2;

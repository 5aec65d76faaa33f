//! Color model shared by the background, viewport content and kernels.
//!
//! Colors are linear and premultiplied, matching the blend state every
//! canvas pipeline uses.

pub mod color;

pub use color::{Color, HexColorError};

//! Render target primitives shared by the simulations and the post chain.
//!
//! Convention:
//! - every target is RGBA floating point, sampled bilinear + clamp-to-edge
//! - texture space has its origin top-left, +Y down

mod target;

pub use target::{DoubleTarget, RenderTarget, grid_size};

//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and Window and drives a [`CanvasHost`](crate::host::CanvasHost)
//! bound to the window's surface.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig};

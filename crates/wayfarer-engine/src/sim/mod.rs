//! GPU simulations producing the shared distortion field.
//!
//! Both write into service-owned ping-pong targets and expose their current
//! result as a [`RenderTarget`](crate::render::RenderTarget) that any number
//! of later passes in the same frame may sample.

mod flowmap;
mod fluid;

pub use flowmap::Flowmap;
pub use fluid::{FluidGrids, FluidSimulation};

//! Input subsystem.
//!
//! Public API is platform-agnostic and does not expose winit types.
//! Runtime code is responsible for translating platform events into `InputEvent`s.

pub mod platform;
mod pointer;
mod queue;
mod types;

pub use pointer::{DEFAULT_SPLAT_FORCE, PointerTracker};
pub use queue::SplatQueue;
pub use types::{InputEvent, Key, SplatEvent};

//! Time subsystem.
//!
//! Provides stable, testable frame timing utilities without coupling to the runtime:
//! - `FrameClock`: clamped per-tick delta time
//! - `FrameCounter`: elapsed time quantized into fixed-rate frame ids
//! - `Debouncer`: trailing-edge debounce for resize/scroll storms

mod counter;
mod debounce;
mod frame_clock;

pub use counter::FrameCounter;
pub use debounce::Debouncer;
pub use frame_clock::{FrameClock, FrameTime};

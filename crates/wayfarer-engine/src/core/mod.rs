//! Core engine-facing contracts.
//!
//! This module defines the stable interface between the runtime (platform loop)
//! and the binaries that mount viewports into the canvas.

mod app;

pub use app::{App, AppControl, WindowHost};

//! Wayfarer engine crate.
//!
//! One shared canvas, many viewports: a host that renders on demand, a
//! preserved animated background, GPU fluid/flowmap distortion fields and a
//! post chain, all driven through a single GPU context.

pub mod background;
pub mod config;
pub mod coords;
pub mod core;
pub mod device;
pub mod host;
pub mod input;
pub mod logging;
pub mod paint;
pub mod post;
pub mod render;
pub mod sim;
pub mod time;
pub mod tunnel;
pub mod window;

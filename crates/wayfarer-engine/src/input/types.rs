use std::time::Duration;

use crate::coords::Vec2;

/// Keys the runtime forwards. Everything else is `Other`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Key {
    Escape,
    Space,
    R,
    Other,
}

/// Platform-agnostic input event. Positions are logical pixels relative to
/// the canvas' top-left corner.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    PointerMoved { x: f32, y: f32 },
    PointerLeft,
    KeyPressed(Key),
}

/// A localized additive impulse.
///
/// `position` is normalized (0..1, +Y down); `delta` is the velocity injected
/// at that point in simulation texels per second.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SplatEvent {
    pub position: Vec2,
    pub delta: Vec2,
    pub timestamp: Duration,
}

impl SplatEvent {
    pub fn new(position: Vec2, delta: Vec2) -> Self {
        Self {
            position,
            delta,
            timestamp: Duration::ZERO,
        }
    }
}

use std::time::Duration;

use crate::coords::Vec2;

use super::queue::SplatQueue;
use super::types::{InputEvent, SplatEvent};

/// Default scale from normalized pointer displacement to splat velocity.
pub const DEFAULT_SPLAT_FORCE: f32 = 6000.0;

/// Turns cursor motion into normalized pointer state and queued splats.
#[derive(Debug)]
pub struct PointerTracker {
    /// Canvas size in logical pixels.
    canvas: Vec2,
    force: f32,
    position: Option<Vec2>,
    queue: SplatQueue,
}

impl PointerTracker {
    pub fn new(canvas: Vec2, force: f32) -> Self {
        Self {
            canvas,
            force,
            position: None,
            queue: SplatQueue::new(),
        }
    }

    pub fn set_canvas_size(&mut self, canvas: Vec2) {
        self.canvas = canvas;
    }

    /// Current pointer position, normalized. `None` when outside the canvas.
    pub fn position(&self) -> Option<Vec2> {
        self.position
    }

    pub fn queue(&self) -> &SplatQueue {
        &self.queue
    }

    pub fn queue_mut(&mut self) -> &mut SplatQueue {
        &mut self.queue
    }

    /// Applies `event`. Returns `true` when it changed visible state
    /// (pointer moved or a splat was queued).
    pub fn handle(&mut self, event: &InputEvent, now: Duration) -> bool {
        match *event {
            InputEvent::PointerMoved { x, y } => {
                if self.canvas.x <= 0.0 || self.canvas.y <= 0.0 {
                    return false;
                }
                let next = Vec2::new(x / self.canvas.x, y / self.canvas.y);
                if !next.is_finite() {
                    return false;
                }

                if let Some(prev) = self.position {
                    let delta = self.correct_aspect(next - prev) * self.force;
                    if delta.length() > 0.0 {
                        self.queue.push(SplatEvent {
                            position: next,
                            delta,
                            timestamp: now,
                        });
                    }
                }
                self.position = Some(next);
                true
            }
            InputEvent::PointerLeft => {
                self.position = None;
                true
            }
            InputEvent::KeyPressed(_) => false,
        }
    }

    /// Keeps splat direction consistent on non-square canvases.
    fn correct_aspect(&self, mut delta: Vec2) -> Vec2 {
        let aspect = self.canvas.x / self.canvas.y;
        if aspect < 1.0 {
            delta.x *= aspect;
        }
        if aspect > 1.0 {
            delta.y /= aspect;
        }
        delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn moved(x: f32, y: f32) -> InputEvent {
        InputEvent::PointerMoved { x, y }
    }

    #[test]
    fn first_move_only_sets_position() {
        let mut p = PointerTracker::new(Vec2::new(200.0, 100.0), 1.0);
        assert!(p.handle(&moved(100.0, 50.0), Duration::ZERO));
        assert_eq!(p.position(), Some(Vec2::new(0.5, 0.5)));
        assert!(p.queue().is_empty());
    }

    #[test]
    fn motion_queues_aspect_corrected_splat() {
        let mut p = PointerTracker::new(Vec2::new(200.0, 100.0), 10.0);
        p.handle(&moved(100.0, 50.0), Duration::ZERO);
        p.handle(&moved(120.0, 60.0), Duration::from_millis(16));

        let splats = p.queue_mut().drain();
        assert_eq!(splats.len(), 1);
        let s = splats[0];
        assert_eq!(s.position, Vec2::new(0.6, 0.6));
        assert!((s.delta.x - 1.0).abs() < 1e-5);
        // y is divided by the 2:1 aspect
        assert!((s.delta.y - 0.5).abs() < 1e-5);
        assert_eq!(s.timestamp, Duration::from_millis(16));
    }

    #[test]
    fn leaving_clears_position() {
        let mut p = PointerTracker::new(Vec2::new(100.0, 100.0), 1.0);
        p.handle(&moved(10.0, 10.0), Duration::ZERO);
        p.handle(&InputEvent::PointerLeft, Duration::ZERO);
        assert_eq!(p.position(), None);
        // Re-entering does not produce a splat across the gap.
        p.handle(&moved(90.0, 90.0), Duration::ZERO);
        assert!(p.queue().is_empty());
    }
}

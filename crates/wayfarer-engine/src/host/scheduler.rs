use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::config::FrameLoop;

/// Cheap, cloneable handle for invalidating the canvas from anywhere.
///
/// Every site that mutates visible GPU state outside the host (an animation
/// timeline writing uniforms, a renderable changing its content) must call
/// [`request_render`](Self::request_render); the scheduler never polls for
/// dirtiness.
#[derive(Debug, Clone)]
pub struct RenderRequester {
    token: Arc<AtomicU64>,
}

impl RenderRequester {
    /// Idempotent within a tick; never blocks.
    #[inline]
    pub fn request_render(&self) {
        self.token.fetch_add(1, Ordering::Relaxed);
    }
}

/// Decides once per tick whether a frame is submitted.
///
/// The invalidation token only ever increments. A tick renders when the
/// token moved since the last drained value; draining records the current
/// value, so any number of requests between two ticks yield one frame.
#[derive(Debug)]
pub struct RenderScheduler {
    token: Arc<AtomicU64>,
    drained: u64,
    frameloop: FrameLoop,
    forced: bool,
}

impl RenderScheduler {
    pub fn new(frameloop: FrameLoop) -> Self {
        Self {
            token: Arc::new(AtomicU64::new(0)),
            drained: 0,
            frameloop,
            forced: false,
        }
    }

    pub fn requester(&self) -> RenderRequester {
        RenderRequester {
            token: Arc::clone(&self.token),
        }
    }

    #[inline]
    pub fn request_render(&self) {
        self.token.fetch_add(1, Ordering::Relaxed);
    }

    /// Renders on the next tick in every frame loop mode, including `never`.
    pub fn force_render(&mut self) {
        self.forced = true;
    }

    pub fn frameloop(&self) -> FrameLoop {
        self.frameloop
    }

    pub fn set_frameloop(&mut self, frameloop: FrameLoop) {
        self.frameloop = frameloop;
    }

    /// Whether the next [`take`](Self::take) would render.
    pub fn is_pending(&self) -> bool {
        if self.forced {
            return true;
        }
        match self.frameloop {
            FrameLoop::Always => true,
            FrameLoop::Never => false,
            FrameLoop::Demand => self.token.load(Ordering::Relaxed) != self.drained,
        }
    }

    /// Drains pending requests. Returns `true` when this tick should render.
    pub fn take(&mut self) -> bool {
        let pending = self.is_pending();
        self.drained = self.token.load(Ordering::Relaxed);
        self.forced = false;
        pending
    }
}

impl Default for RenderScheduler {
    fn default() -> Self {
        Self::new(FrameLoop::Demand)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn many_requests_drain_into_one_render() {
        let mut s = RenderScheduler::default();
        let r = s.requester();
        for _ in 0..5 {
            r.request_render();
        }
        s.request_render();
        assert!(s.take());
        assert!(!s.take());
    }

    #[test]
    fn no_request_no_render() {
        let mut s = RenderScheduler::default();
        assert!(!s.is_pending());
        assert!(!s.take());
    }

    #[test]
    fn never_mode_only_honours_force() {
        let mut s = RenderScheduler::new(FrameLoop::Never);
        s.request_render();
        assert!(!s.take());
        s.force_render();
        assert!(s.take());
        assert!(!s.take());
    }

    #[test]
    fn always_mode_renders_every_tick() {
        let mut s = RenderScheduler::new(FrameLoop::Always);
        assert!(s.take());
        assert!(s.take());
    }

    #[test]
    fn requester_works_across_threads() {
        let mut s = RenderScheduler::default();
        let r = s.requester();
        std::thread::spawn(move || r.request_render()).join().unwrap();
        assert!(s.take());
    }
}

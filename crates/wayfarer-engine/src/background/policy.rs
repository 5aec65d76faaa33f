use std::time::Duration;

use crate::device::{AutoClear, FrameEncoder, GlobalState, Pass};
use crate::time::FrameCounter;

/// Clear discipline that keeps the background alive under viewport draws.
///
/// The service never clears on its own. Every submission starts with the
/// background pass, which writes every canvas pixel, followed by exactly one
/// depth clear per frame id. Color is never cleared.
#[derive(Debug, Clone)]
pub struct PreservationPolicy {
    counter: FrameCounter,
    last_cleared: Option<u64>,
}

impl PreservationPolicy {
    pub fn new(depth_clear_rate: f64) -> Self {
        Self {
            counter: FrameCounter::new(depth_clear_rate),
            last_cleared: None,
        }
    }

    /// The context-wide state this policy relies on.
    pub fn global_state() -> GlobalState {
        GlobalState {
            auto_clear: AutoClear {
                color: false,
                depth: false,
                stencil: false,
            },
            ..GlobalState::default()
        }
    }

    /// Records the head of a frame: `background` then the depth clear.
    /// Returns the frame id.
    pub fn begin_frame(
        &mut self,
        frame: &mut FrameEncoder,
        background: Pass,
        elapsed: Duration,
    ) -> u64 {
        debug_assert!(frame.is_empty(), "background must be the first command");
        frame.draw(background);
        let id = self.counter.next(elapsed);
        self.clear_depth_once(frame, id);
        id
    }

    /// Records a depth clear unless one was already recorded for `frame_id`.
    pub fn clear_depth_once(&mut self, frame: &mut FrameEncoder, frame_id: u64) -> bool {
        if self.last_cleared == Some(frame_id) {
            return false;
        }
        frame.clear_depth();
        self.last_cleared = Some(frame_id);
        true
    }

    pub fn last_cleared(&self) -> Option<u64> {
        self.last_cleared
    }
}

impl Default for PreservationPolicy {
    fn default() -> Self {
        Self::new(60.0)
    }
}

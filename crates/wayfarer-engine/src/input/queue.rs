use super::types::SplatEvent;

/// Pending splats, drained exactly once per simulation step.
///
/// Splats are additive, so drain order does not affect the result.
#[derive(Debug, Default)]
pub struct SplatQueue {
    events: Vec<SplatEvent>,
}

impl SplatQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: SplatEvent) {
        self.events.push(event);
    }

    /// Takes every pending splat, leaving the queue empty.
    pub fn drain(&mut self) -> Vec<SplatEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Vec2;

    #[test]
    fn drain_empties_queue() {
        let mut q = SplatQueue::new();
        q.push(SplatEvent::new(Vec2::new(0.5, 0.5), Vec2::new(1.0, 0.0)));
        q.push(SplatEvent::new(Vec2::new(0.1, 0.1), Vec2::new(0.0, 1.0)));
        assert_eq!(q.drain().len(), 2);
        assert!(q.is_empty());
        assert!(q.drain().is_empty());
    }
}

use std::time::{Duration, Instant};

/// Trailing-edge debouncer.
///
/// Every [`poke`](Self::poke) pushes the deadline out by `delay`; [`fire`](Self::fire)
/// returns `true` once, after the input has been quiet for `delay`.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self { delay, deadline: None }
    }

    pub fn poke(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    /// Drops the pending event without firing it.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Consumes the pending event if its deadline has passed.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storm_collapses_into_one_fire() {
        let t0 = Instant::now();
        let ms = Duration::from_millis;
        let mut d = Debouncer::new(ms(150));

        let mut fired = 0;
        for i in 0..20 {
            let now = t0 + ms(i * 10);
            d.poke(now);
            if d.fire(now) {
                fired += 1;
            }
        }
        assert_eq!(fired, 0);
        assert!(!d.fire(t0 + ms(190 + 149)));
        assert!(d.fire(t0 + ms(190 + 150)));
        assert!(!d.fire(t0 + ms(1000)));
        assert_eq!(fired, 0);
    }

    #[test]
    fn cancel_drops_the_pending_event() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(Duration::from_millis(100));
        d.poke(t0);
        d.cancel();
        assert!(!d.is_pending());
        assert!(!d.fire(t0 + Duration::from_secs(1)));
    }
}

use std::time::Duration;

/// Quantizes elapsed time into frame ids at a fixed rate (60/s by default).
///
/// Several clear requests inside one tick map to the same id and collapse
/// into one clear. Ids handed out by [`next`](Self::next) are strictly
/// increasing, so two ticks that land in the same quantum still get distinct
/// ids.
#[derive(Debug, Clone)]
pub struct FrameCounter {
    rate: f64,
    last: Option<u64>,
}

impl FrameCounter {
    pub fn new(rate: f64) -> Self {
        Self {
            rate: if rate > 0.0 { rate } else { 60.0 },
            last: None,
        }
    }

    /// The raw quantized id for `elapsed`.
    #[inline]
    pub fn quantize(&self, elapsed: Duration) -> u64 {
        (elapsed.as_secs_f64() * self.rate).floor() as u64
    }

    /// Returns the frame id for a new tick at `elapsed`.
    pub fn next(&mut self, elapsed: Duration) -> u64 {
        let q = self.quantize(elapsed);
        let id = match self.last {
            Some(last) if q <= last => last + 1,
            _ => q,
        };
        self.last = Some(id);
        id
    }
}

impl Default for FrameCounter {
    fn default() -> Self {
        Self::new(60.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantizes_at_sixty_per_second() {
        let c = FrameCounter::default();
        assert_eq!(c.quantize(Duration::from_millis(0)), 0);
        assert_eq!(c.quantize(Duration::from_millis(16)), 0);
        assert_eq!(c.quantize(Duration::from_millis(17)), 1);
        assert_eq!(c.quantize(Duration::from_secs(1)), 60);
    }

    #[test]
    fn ids_are_strictly_increasing_per_tick() {
        let mut c = FrameCounter::default();
        let a = c.next(Duration::from_millis(100));
        let b = c.next(Duration::from_millis(104));
        let d = c.next(Duration::from_millis(500));
        assert!(b > a);
        assert_eq!(d, 30);
    }
}

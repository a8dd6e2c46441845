//! Dispatch clock: enforces a minimum spacing between attempt starts.

use tokio::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct DispatchClock {
    interval: Duration,
    last_dispatch: Option<Instant>,
}

impl DispatchClock {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_dispatch: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn last_dispatch(&self) -> Option<Instant> {
        self.last_dispatch
    }

    /// Wait required before the next dispatch may start, never negative.
    pub fn wait_before_next(&self, now: Instant) -> Duration {
        match self.last_dispatch {
            Some(last) => (last + self.interval).saturating_duration_since(now),
            None => Duration::ZERO,
        }
    }

    /// Reserve the next dispatch slot and return how long to wait for it.
    ///
    /// The reserved instant (`now + wait`) becomes the new reference point, so
    /// several dispatches admitted at once are spaced out one interval apart.
    pub fn reserve(&mut self, now: Instant) -> Duration {
        let wait = self.wait_before_next(now);
        self.last_dispatch = Some(now + wait);
        wait
    }
}

impl Default for DispatchClock {
    fn default() -> Self {
        Self::new(Duration::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_dispatch_is_immediate() {
        let clock = DispatchClock::new(Duration::from_millis(50));
        assert_eq!(clock.wait_before_next(Instant::now()), Duration::ZERO);
        assert!(clock.last_dispatch().is_none());
    }

    #[test]
    fn test_zero_interval_never_waits() {
        let mut clock = DispatchClock::default();
        let now = Instant::now();
        for _ in 0..5 {
            assert_eq!(clock.reserve(now), Duration::ZERO);
        }
    }

    #[test]
    fn test_back_to_back_reservations_are_spaced() {
        let mut clock = DispatchClock::new(Duration::from_millis(10));
        let now = Instant::now();
        assert_eq!(clock.reserve(now), Duration::ZERO);
        assert_eq!(clock.reserve(now), Duration::from_millis(10));
        assert_eq!(clock.reserve(now), Duration::from_millis(20));
        assert_eq!(clock.last_dispatch(), Some(now + Duration::from_millis(20)));
    }

    #[test]
    fn test_elapsed_interval_clears_wait() {
        let mut clock = DispatchClock::new(Duration::from_millis(10));
        let start = Instant::now();
        clock.reserve(start);
        let later = start + Duration::from_millis(25);
        assert_eq!(clock.wait_before_next(later), Duration::ZERO);
        let partial = start + Duration::from_millis(4);
        assert_eq!(clock.wait_before_next(partial), Duration::from_millis(6));
    }
}

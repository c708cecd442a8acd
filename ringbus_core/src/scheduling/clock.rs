use std::time::{Duration, Instant};

/// Monotonic stopwatch used to pace the component loop
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    start: Instant,
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn reset(&mut self) {
        self.start = Instant::now();
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn sleep_for(duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }

    /// Sleep out the rest of `period` measured from the last reset.
    ///
    /// Returns `false` when the period was already used up (an overrun). The
    /// sleep is a single uninterruptible wait; stop requests are seen by the
    /// caller on its next iteration.
    pub fn pace(&self, period: Duration) -> bool {
        match period.checked_sub(self.elapsed()) {
            Some(remaining) if !remaining.is_zero() => {
                Self::sleep_for(remaining);
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
    fn test_pace_sleeps_remaining_period() {
        let clock = Clock::new();
        assert!(clock.pace(Duration::from_millis(30)));
        assert!(clock.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn test_pace_reports_overrun() {
        let clock = Clock::new();
        std::thread::sleep(Duration::from_millis(5));
        assert!(!clock.pace(Duration::from_millis(1)));
    }

    #[test]
    fn test_pace_after_reset_measures_from_reset() {
        let mut clock = Clock::new();
        std::thread::sleep(Duration::from_millis(20));
        clock.reset();
        assert!(clock.pace(Duration::from_millis(10)));
        assert!(clock.elapsed() >= Duration::from_millis(10));
    }
}

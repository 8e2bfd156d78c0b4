//! Cancellable repeating timer for the refresh loop.

use std::time::{Duration, Instant};

/// A fixed-period timer polled by the event loop.
///
/// Starting a running timer is refused and cancelling is idempotent, so the
/// refresh loop can never be scheduled twice.
#[derive(Debug, Clone)]
pub struct RepeatingTimer {
    period: Duration,
    next_due: Option<Instant>,
}

impl RepeatingTimer {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            next_due: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.next_due.is_some()
    }

    /// Schedule the first firing one period from `now`. Returns `false` if
    /// the timer was already running.
    pub fn start(&mut self, now: Instant) -> bool {
        if self.is_running() {
            return false;
        }
        self.next_due = Some(now + self.period);
        true
    }

    /// Stop firing. Safe to call any number of times.
    pub fn cancel(&mut self) {
        self.next_due = None;
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.next_due
    }

    /// Whether the timer fired at or before `now`. Missed periods collapse
    /// into a single firing.
    pub fn poll(&mut self, now: Instant) -> bool {
        let Some(mut due) = self.next_due else {
            return false;
        };
        if due > now {
            return false;
        }
        while due <= now {
            due += self.period;
        }
        self.next_due = Some(due);
        true
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_once_per_period() {
        let t0 = Instant::now();
        let mut timer = RepeatingTimer::new(Duration::from_secs(1));
        assert!(!timer.poll(t0));
        assert!(timer.start(t0));
        assert!(!timer.poll(t0 + Duration::from_millis(999)));
        assert!(timer.poll(t0 + Duration::from_secs(1)));
        assert!(!timer.poll(t0 + Duration::from_millis(1500)));
        assert!(timer.poll(t0 + Duration::from_secs(2)));
    }

    #[test]
    fn missed_periods_collapse() {
        let t0 = Instant::now();
        let mut timer = RepeatingTimer::new(Duration::from_secs(1));
        timer.start(t0);
        assert!(timer.poll(t0 + Duration::from_millis(4500)));
        assert!(!timer.poll(t0 + Duration::from_millis(4900)));
        assert_eq!(timer.deadline(), Some(t0 + Duration::from_secs(5)));
    }

    #[test]
    fn double_start_refused_and_cancel_idempotent() {
        let t0 = Instant::now();
        let mut timer = RepeatingTimer::new(Duration::from_secs(1));
        assert!(timer.start(t0));
        assert!(!timer.start(t0 + Duration::from_millis(10)));
        timer.cancel();
        timer.cancel();
        assert!(!timer.is_running());
        assert!(!timer.poll(t0 + Duration::from_secs(10)));
    }
}

// src/timer.rs
//
// Wall-clock timers owned by whoever mutates gesture state. Nothing here
// schedules work on its own: the owner calls `fire_if_due(now)` and the session
// driver sleeps until `deadline()`.
use std::time::{Duration, Instant};

/// A single pending deadline. Re-arming replaces (cancels) the previous one.
#[derive(Debug, Clone, Default)]
pub struct DwellTimer {
    deadline: Option<Instant>,
}

impl DwellTimer {
    pub fn new() -> Self {
        Self { deadline: None }
    }

    pub fn arm(&mut self, now: Instant, after: Duration) {
        self.deadline = Some(now + after);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Consumes the deadline if it has passed.
    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(d) if now >= d => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

/// Rate limiter keyed off the last *granted* call.
#[derive(Debug, Clone)]
pub struct Throttle {
    interval: Duration,
    last: Option<Instant>,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Self { interval, last: None }
    }

    pub fn try_acquire(&mut self, now: Instant) -> bool {
        let ready = match self.last {
            Some(last) => now.saturating_duration_since(last) >= self.interval,
            None => true,
        };
        if ready {
            self.last = Some(now);
        }
        ready
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dwell_timer_fires_once_after_deadline() {
        let t0 = Instant::now();
        let mut timer = DwellTimer::new();
        timer.arm(t0, Duration::from_millis(800));

        assert!(!timer.fire_if_due(t0 + Duration::from_millis(799)));
        assert!(timer.fire_if_due(t0 + Duration::from_millis(800)));
        assert!(!timer.fire_if_due(t0 + Duration::from_millis(900)));
        assert!(!timer.is_pending());
    }

    #[test]
    fn rearming_replaces_pending_deadline() {
        let t0 = Instant::now();
        let mut timer = DwellTimer::new();
        timer.arm(t0, Duration::from_millis(800));
        timer.arm(t0 + Duration::from_millis(500), Duration::from_millis(800));

        assert!(!timer.fire_if_due(t0 + Duration::from_millis(900)));
        assert_eq!(timer.deadline(), Some(t0 + Duration::from_millis(1300)));
    }

    #[test]
    fn throttle_only_counts_granted_calls() {
        let t0 = Instant::now();
        let mut throttle = Throttle::new(Duration::from_millis(400));

        assert!(throttle.try_acquire(t0));
        assert!(!throttle.try_acquire(t0 + Duration::from_millis(300)));
        // the rejected call above must not push the window forward
        assert!(throttle.try_acquire(t0 + Duration::from_millis(400)));
    }
}

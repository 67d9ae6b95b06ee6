//! Periodic send timer.
//!
//! The firmware loop polls [`SendTimer::just_finished`] between receive
//! polls; it never sleeps on the timer itself.

use std::time::{Duration, Instant};

/// Fires once per interval when polled.
#[derive(Debug, Clone)]
pub struct SendTimer {
    interval: Duration,
    deadline: Option<Instant>,
    fired: u64,
}

impl SendTimer {
    /// Create a stopped timer.
    pub fn new(interval: Duration) -> Self {
        SendTimer {
            interval,
            deadline: None,
            fired: 0,
        }
    }

    /// Arm the timer one interval from now.
    pub fn start(&mut self) {
        self.start_at(Instant::now());
    }

    /// Arm the timer one interval after `now`.
    pub fn start_at(&mut self, now: Instant) {
        self.deadline = Some(now + self.interval);
    }

    /// Stop the timer. `just_finished` returns false until restarted.
    pub fn stop(&mut self) {
        self.deadline = None;
    }

    /// Returns true if the timer is armed.
    pub fn is_running(&self) -> bool {
        self.deadline.is_some()
    }

    /// Check the timer against the current time.
    pub fn just_finished(&mut self) -> bool {
        self.just_finished_at(Instant::now())
    }

    /// Returns true once per elapsed interval and re-arms the timer.
    ///
    /// The next deadline follows the previous one, so the period does not
    /// drift with poll latency. If more than a whole interval was missed the
    /// timer restarts from `now` instead of firing a burst.
    pub fn just_finished_at(&mut self, now: Instant) -> bool {
        let Some(deadline) = self.deadline else {
            return false;
        };
        if now < deadline {
            return false;
        }

        let next = deadline + self.interval;
        self.deadline = Some(if next <= now { now + self.interval } else { next });
        self.fired += 1;
        true
    }

    /// Time left until the next deadline. `None` when stopped.
    pub fn remaining_at(&self, now: Instant) -> Option<Duration> {
        self.deadline.map(|deadline| deadline.saturating_duration_since(now))
    }

    /// Time left until the next deadline. `None` when stopped.
    pub fn remaining(&self) -> Option<Duration> {
        self.remaining_at(Instant::now())
    }

    /// Number of times the timer has fired.
    pub fn fired(&self) -> u64 {
        self.fired
    }

    /// Configured interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECOND: Duration = Duration::from_secs(1);

    #[test]
    fn test_stopped_timer_never_fires() {
        let mut timer = SendTimer::new(SECOND);
        let now = Instant::now();
        assert!(!timer.is_running());
        assert!(!timer.just_finished_at(now + SECOND * 10));
        assert_eq!(timer.remaining_at(now), None);
    }

    #[test]
    fn test_fires_once_per_interval() {
        let mut timer = SendTimer::new(SECOND);
        let t0 = Instant::now();
        timer.start_at(t0);

        assert!(!timer.just_finished_at(t0 + Duration::from_millis(999)));
        assert!(timer.just_finished_at(t0 + SECOND));
        assert!(!timer.just_finished_at(t0 + SECOND));
        assert_eq!(timer.remaining_at(t0 + SECOND), Some(SECOND));
        assert_eq!(timer.fired(), 1);
    }

    #[test]
    fn test_rearms_from_previous_deadline() {
        let mut timer = SendTimer::new(SECOND);
        let t0 = Instant::now();
        timer.start_at(t0);

        // Polled late, the next deadline still lands on t0 + 2s
        assert!(timer.just_finished_at(t0 + Duration::from_millis(1300)));
        assert_eq!(
            timer.remaining_at(t0 + Duration::from_millis(1300)),
            Some(Duration::from_millis(700))
        );
        assert!(timer.just_finished_at(t0 + SECOND * 2));
    }

    #[test]
    fn test_missed_intervals_do_not_burst() {
        let mut timer = SendTimer::new(SECOND);
        let t0 = Instant::now();
        timer.start_at(t0);

        let late = t0 + SECOND * 5;
        assert!(timer.just_finished_at(late));
        assert!(!timer.just_finished_at(late));
        assert_eq!(timer.remaining_at(late), Some(SECOND));
    }

    #[test]
    fn test_stop() {
        let mut timer = SendTimer::new(SECOND);
        let t0 = Instant::now();
        timer.start_at(t0);
        timer.stop();
        assert!(!timer.just_finished_at(t0 + SECOND));
        assert_eq!(timer.interval(), SECOND);
    }
}

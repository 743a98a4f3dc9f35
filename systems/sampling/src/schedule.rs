//! Timer deciding when the next sampling refresh is due.

use std::time::Duration;

/// Countdown that fires a refresh once per configured interval.
///
/// A fresh schedule is due immediately. After firing, the countdown restarts
/// from the full interval; time in excess of the interval is not carried
/// over, so a long stall produces a single refresh rather than a burst.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RefreshSchedule {
    interval: Option<Duration>,
    remaining: Duration,
}

impl RefreshSchedule {
    /// Creates a schedule firing every `interval`.
    #[must_use]
    pub const fn every(interval: Duration) -> Self {
        Self {
            interval: Some(interval),
            remaining: Duration::ZERO,
        }
    }

    /// Creates a schedule that never fires.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            interval: None,
            remaining: Duration::ZERO,
        }
    }

    /// Configured interval, if refreshing is enabled.
    #[must_use]
    pub const fn interval(&self) -> Option<Duration> {
        self.interval
    }

    /// Advances the countdown by `dt`, reporting whether a refresh is due.
    pub fn advance(&mut self, dt: Duration) -> bool {
        let Some(interval) = self.interval else {
            return false;
        };

        self.remaining = self.remaining.saturating_sub(dt);
        if !self.remaining.is_zero() {
            return false;
        }

        self.remaining = interval;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_immediately_then_once_per_interval() {
        let mut schedule = RefreshSchedule::every(Duration::from_millis(300));
        assert!(schedule.advance(Duration::ZERO));
        assert!(!schedule.advance(Duration::from_millis(100)));
        assert!(!schedule.advance(Duration::from_millis(100)));
        assert!(schedule.advance(Duration::from_millis(100)));
        assert!(!schedule.advance(Duration::from_millis(299)));
        assert!(schedule.advance(Duration::from_millis(1)));
    }

    #[test]
    fn long_stall_fires_once() {
        let mut schedule = RefreshSchedule::every(Duration::from_millis(100));
        assert!(schedule.advance(Duration::ZERO));
        assert!(schedule.advance(Duration::from_secs(5)));
        assert!(!schedule.advance(Duration::from_millis(50)));
    }

    #[test]
    fn disabled_schedule_never_fires() {
        let mut schedule = RefreshSchedule::disabled();
        assert!(!schedule.advance(Duration::from_secs(60)));
        assert_eq!(schedule.interval(), None);
    }
}

//! Wall-clock time source.
//!
//! Scheduling needs the local date and time of day, while the wake timer
//! and poll loop run on tokio's monotonic clock. [`SimulatedClock`] ties
//! the two together so a paused tokio runtime also pauses the wall clock.

use time::OffsetDateTime;
use tokio::time::Instant;

pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;
}

/// The host clock in the local UTC offset.
///
/// Falls back to UTC when the local offset cannot be determined (for
/// example in a multi-threaded process on some Unix platforms).
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
    }
}

/// Wall clock that advances with tokio's clock from a fixed start.
///
/// Under `tokio::time::pause()` the reported time only moves when tokio
/// time is advanced.
#[derive(Debug, Clone, Copy)]
pub struct SimulatedClock {
    start_wall: OffsetDateTime,
    start_instant: Instant,
}

impl SimulatedClock {
    /// Start the simulated wall clock at `start`, as of now on tokio's
    /// clock. Must be called from within a tokio runtime when time is
    /// paused.
    pub fn starting_at(start: OffsetDateTime) -> Self {
        Self {
            start_wall: start,
            start_instant: Instant::now(),
        }
    }
}

impl Clock for SimulatedClock {
    fn now(&self) -> OffsetDateTime {
        self.start_wall + self.start_instant.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use time::macros::datetime;

    #[tokio::test(start_paused = true)]
    async fn simulated_clock_follows_tokio_time() {
        let clock = SimulatedClock::starting_at(datetime!(2026-10-17 6:30 UTC));
        assert_eq!(clock.now(), datetime!(2026-10-17 6:30 UTC));

        tokio::time::advance(Duration::from_secs(90)).await;
        assert_eq!(clock.now(), datetime!(2026-10-17 6:31:30 UTC));
    }

    #[test]
    fn system_clock_is_near_utc_now() {
        let now = SystemClock.now();
        let utc = OffsetDateTime::now_utc();
        assert!((utc - now).abs() < time::Duration::seconds(5));
    }
}

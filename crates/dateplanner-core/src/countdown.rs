//! Deadline countdowns.
//!
//! Like the rest of the core this is wall-clock based and has no internal
//! thread: the caller invokes [`CountdownScheduler::tick`] once per
//! [`period`](CountdownScheduler::period). Remaining time is recomputed from
//! the clock on every tick, so a host that was suspended for an hour simply
//! sees the deadline as passed on its next tick.
//!
//! The completion action is an arbitrary payload handed back, exactly once,
//! by the tick that observes the deadline. Callers that want a callback use
//! a closure as the payload and invoke it.

use std::sync::Arc;
use std::time::Duration;

use crate::clock::Clock;

#[derive(Debug)]
struct ActiveCountdown<T> {
    target_ms: u64,
    on_complete: T,
}

/// Outcome of one tick.
#[derive(Debug, PartialEq, Eq)]
pub enum CountdownTick<T> {
    /// No countdown is active.
    Idle,
    /// Deadline not reached yet.
    Running { remaining_ms: u64, target_ms: u64 },
    /// Deadline reached; the countdown is now stopped.
    Completed(T),
}

/// At most one active countdown toward a deadline.
pub struct CountdownScheduler<T> {
    clock: Arc<dyn Clock>,
    period: Duration,
    active: Option<ActiveCountdown<T>>,
}

impl<T> CountdownScheduler<T> {
    pub fn new(clock: Arc<dyn Clock>, period: Duration) -> Self {
        Self {
            clock,
            period,
            active: None,
        }
    }

    /// How often the caller should tick.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Start counting down to `target_ms`, replacing any active countdown.
    ///
    /// A target already in the past completes on the first tick.
    pub fn start(&mut self, target_ms: u64, on_complete: T) {
        self.active = Some(ActiveCountdown {
            target_ms,
            on_complete,
        });
    }

    /// Cancel the active countdown without completing it. Returns whether one
    /// was active.
    pub fn stop(&mut self) -> bool {
        self.active.take().is_some()
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn target_ms(&self) -> Option<u64> {
        self.active.as_ref().map(|a| a.target_ms)
    }

    /// The payload the active countdown will complete with.
    pub fn pending(&self) -> Option<&T> {
        self.active.as_ref().map(|a| &a.on_complete)
    }

    pub fn remaining_ms(&self) -> Option<u64> {
        let now = self.clock.now_ms();
        self.target_ms().map(|target| target.saturating_sub(now))
    }

    pub fn tick(&mut self) -> CountdownTick<T> {
        let Some(target_ms) = self.target_ms() else {
            return CountdownTick::Idle;
        };

        let now = self.clock.now_ms();
        if now >= target_ms {
            match self.active.take() {
                Some(active) => CountdownTick::Completed(active.on_complete),
                None => CountdownTick::Idle,
            }
        } else {
            CountdownTick::Running {
                remaining_ms: target_ms - now,
                target_ms,
            }
        }
    }
}

/// Format a remaining duration as `MM:SS`, flooring to whole seconds.
///
/// Minutes are not wrapped into hours: 90 minutes render as `90:00`.
pub fn format_remaining(remaining_ms: u64) -> String {
    let total_secs = remaining_ms / 1000;
    format!("{:02}:{:02}", total_secs / 60, total_secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn scheduler<T>(clock: &ManualClock) -> CountdownScheduler<T> {
        CountdownScheduler::new(Arc::new(clock.clone()), Duration::from_secs(1))
    }

    #[test]
    fn past_target_completes_on_first_tick() {
        let clock = ManualClock::new(100_000);
        let mut countdown = scheduler(&clock);
        let mut fired = 0;
        countdown.start(100_000 - 5_000, ());
        if let CountdownTick::Completed(()) = countdown.tick() {
            fired += 1;
        }
        assert_eq!(fired, 1);
        assert!(!countdown.is_active());
    }

    #[test]
    fn completes_exactly_once() {
        let clock = ManualClock::new(0);
        let mut countdown = scheduler(&clock);
        countdown.start(3_000, "done");

        assert_eq!(
            countdown.tick(),
            CountdownTick::Running {
                remaining_ms: 3_000,
                target_ms: 3_000
            }
        );
        clock.advance_ms(3_000);
        assert_eq!(countdown.tick(), CountdownTick::Completed("done"));
        clock.advance_ms(3_000);
        assert_eq!(countdown.tick(), CountdownTick::Idle);
    }

    #[test]
    fn remaining_follows_clock_not_tick_count() {
        let clock = ManualClock::new(0);
        let mut countdown = scheduler(&clock);
        countdown.start(60_000, ());
        countdown.tick();
        // Host suspended for 45s between ticks.
        clock.advance_ms(45_000);
        assert_eq!(
            countdown.tick(),
            CountdownTick::Running {
                remaining_ms: 15_000,
                target_ms: 60_000
            }
        );
    }

    #[test]
    fn stop_cancels_without_completion() {
        let clock = ManualClock::new(0);
        let mut countdown = scheduler(&clock);
        countdown.start(1_000, ());
        assert!(countdown.stop());
        clock.advance_ms(5_000);
        assert_eq!(countdown.tick(), CountdownTick::Idle);
        assert!(!countdown.stop());
    }

    #[test]
    fn restarting_replaces_previous_countdown() {
        let clock = ManualClock::new(0);
        let mut countdown = scheduler(&clock);
        countdown.start(1_000, 1);
        countdown.start(10_000, 2);
        clock.advance_ms(2_000);
        assert!(matches!(countdown.tick(), CountdownTick::Running { .. }));
        clock.advance_ms(8_000);
        assert_eq!(countdown.tick(), CountdownTick::Completed(2));
    }

    #[test]
    fn closure_payload_acts_as_callback() {
        let clock = ManualClock::new(10);
        let mut countdown: CountdownScheduler<Box<dyn FnOnce() -> u32>> = scheduler(&clock);
        countdown.start(5, Box::new(|| 7));
        match countdown.tick() {
            CountdownTick::Completed(callback) => assert_eq!(callback(), 7),
            _ => panic!("expected completion"),
        }
    }

    #[test]
    fn format_remaining_floors_and_pads() {
        assert_eq!(format_remaining(0), "00:00");
        assert_eq!(format_remaining(999), "00:00");
        assert_eq!(format_remaining(30_000), "00:30");
        assert_eq!(format_remaining(61_500), "01:01");
        assert_eq!(format_remaining(15 * 60 * 1000), "15:00");
        assert_eq!(format_remaining(90 * 60 * 1000), "90:00");
    }
}

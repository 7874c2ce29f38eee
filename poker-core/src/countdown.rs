//! Auto-reveal countdown.
//!
//! A decrementing clock that only measures time. It never reveals anything
//! itself: when it reaches zero while running it reports [`Expired`] once and
//! stops, and the session decides what that means.
//!
//! ```text
//!   reset(n)            start()              tick() × n
//! ──────────► Stopped(n) ──────► Running(n) ────────────► Stopped(0) + Expired
//!                 ▲                  │
//!                 └──── stop() ──────┘
//! ```
//!
//! The clock is driven externally (one `tick()` per second) so the state
//! machine stays deterministic and testable without real time.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default and reset value: two minutes.
pub const DEFAULT_COUNTDOWN_SECS: u32 = 120;

/// One-shot signal emitted when a running countdown reaches zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expired;

/// Countdown state: remaining seconds plus a running flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Countdown {
    remaining: u32,
    running: bool,
}

impl Default for Countdown {
    fn default() -> Self {
        Self::new(DEFAULT_COUNTDOWN_SECS)
    }
}

impl Countdown {
    /// Create a stopped countdown at `secs`.
    pub fn new(secs: u32) -> Self {
        Self {
            remaining: secs,
            running: false,
        }
    }

    /// Begin decrementing from the current value.
    ///
    /// Starting an already-zero countdown expires immediately instead of
    /// running into negative territory.
    pub fn start(&mut self) -> Option<Expired> {
        if self.remaining == 0 {
            self.running = false;
            return Some(Expired);
        }
        self.running = true;
        None
    }

    /// Halt decrementing without touching the value.
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Set the value and stop.
    pub fn reset(&mut self, secs: u32) {
        self.remaining = secs;
        self.running = false;
    }

    /// Advance one second.
    ///
    /// Returns `Some(Expired)` exactly once, on the tick that reaches zero.
    /// Ticks while stopped are ignored.
    pub fn tick(&mut self) -> Option<Expired> {
        if !self.running {
            return None;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.running = false;
            return Some(Expired);
        }
        None
    }

    /// Seconds left.
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Whether ticks currently count down.
    pub fn is_running(&self) -> bool {
        self.running
    }
}

impl fmt::Display for Countdown {
    /// `m:ss`, e.g. `2:00` or `0:07`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:02}", self.remaining / 60, self.remaining % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_stopped_at_two_minutes() {
        let countdown = Countdown::default();
        assert_eq!(countdown.remaining(), DEFAULT_COUNTDOWN_SECS);
        assert!(!countdown.is_running());
    }

    #[test]
    fn test_expires_exactly_once() {
        let mut countdown = Countdown::new(3);
        assert_eq!(countdown.start(), None);

        assert_eq!(countdown.tick(), None);
        assert_eq!(countdown.tick(), None);
        assert_eq!(countdown.tick(), Some(Expired));
        assert_eq!(countdown.remaining(), 0);
        assert!(!countdown.is_running());

        // Further ticks after expiry are no-ops
        assert_eq!(countdown.tick(), None);
        assert_eq!(countdown.remaining(), 0);
    }

    #[test]
    fn test_reset_after_expiry_stays_stopped() {
        let mut countdown = Countdown::new(3);
        countdown.start();
        for _ in 0..3 {
            countdown.tick();
        }

        countdown.reset(DEFAULT_COUNTDOWN_SECS);
        assert_eq!(countdown.remaining(), 120);
        assert!(!countdown.is_running());
        assert_eq!(countdown.tick(), None);
        assert_eq!(countdown.remaining(), 120);
    }

    #[test]
    fn test_start_at_zero_expires_immediately() {
        let mut countdown = Countdown::new(0);
        assert_eq!(countdown.start(), Some(Expired));
        assert!(!countdown.is_running());
        assert_eq!(countdown.remaining(), 0);
    }

    #[test]
    fn test_stop_keeps_value() {
        let mut countdown = Countdown::new(10);
        countdown.start();
        countdown.tick();
        countdown.stop();

        assert_eq!(countdown.remaining(), 9);
        assert_eq!(countdown.tick(), None);
        assert_eq!(countdown.remaining(), 9);
    }

    #[test]
    fn test_ticks_ignored_before_start() {
        let mut countdown = Countdown::new(5);
        assert_eq!(countdown.tick(), None);
        assert_eq!(countdown.remaining(), 5);
    }

    #[test]
    fn test_display_format() {
        assert_eq!(Countdown::new(120).to_string(), "2:00");
        assert_eq!(Countdown::new(7).to_string(), "0:07");
        assert_eq!(Countdown::new(95).to_string(), "1:35");
    }
}

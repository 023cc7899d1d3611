//! One-second tick clocks used by a matching session.
//!
//! Neither clock reads the wall clock; the owner calls `tick` once per
//! elapsed second.

use serde::Serialize;

/// Format seconds as `MM:SS`.
pub fn format_clock(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Count-up clock.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stopwatch {
    elapsed: u32,
    running: bool,
}

impl Stopwatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restart from zero.
    pub fn start(&mut self) {
        self.stop();
        self.running = true;
    }

    /// Halt and reset to zero.
    pub fn stop(&mut self) {
        self.running = false;
        self.elapsed = 0;
    }

    /// Halt, keeping the current reading.
    pub fn freeze(&mut self) {
        self.running = false;
    }

    pub fn tick(&mut self) {
        if self.running {
            self.elapsed += 1;
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn elapsed_secs(&self) -> u32 {
        self.elapsed
    }

    pub fn label(&self) -> String {
        format_clock(self.elapsed)
    }
}

/// What a countdown tick produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownTick {
    Idle,
    Running,
    Expired,
}

/// Count-down clock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    limit: u32,
    remaining: u32,
    running: bool,
}

impl Countdown {
    pub fn new(limit_secs: u32) -> Self {
        Self {
            limit: limit_secs,
            remaining: 0,
            running: false,
        }
    }

    /// Restart from the configured limit. A zero limit never starts.
    pub fn start(&mut self) {
        self.stop();
        self.remaining = self.limit;
        self.running = self.limit > 0;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Advance one second. Reports `Expired` on the tick that reaches zero.
    pub fn tick(&mut self) -> CountdownTick {
        if !self.running {
            return CountdownTick::Idle;
        }

        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.stop();
            return CountdownTick::Expired;
        }
        CountdownTick::Running
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining
    }

    pub fn label(&self) -> String {
        format_clock(self.remaining)
    }
}

/// Read-only snapshot of a clock for views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClockView {
    pub counts_down: bool,
    pub running: bool,
    pub seconds: u32,
    pub label: String,
}

impl From<&Stopwatch> for ClockView {
    fn from(watch: &Stopwatch) -> Self {
        Self {
            counts_down: false,
            running: watch.is_running(),
            seconds: watch.elapsed_secs(),
            label: watch.label(),
        }
    }
}

impl From<&Countdown> for ClockView {
    fn from(countdown: &Countdown) -> Self {
        Self {
            counts_down: true,
            running: countdown.is_running(),
            seconds: countdown.remaining_secs(),
            label: countdown.label(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn clock_label_is_zero_padded() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(65), "01:05");
        assert_eq!(format_clock(3599), "59:59");
    }

    #[test]
    fn stopwatch_counts_only_while_running() {
        let mut watch = Stopwatch::new();
        watch.tick();
        assert_eq!(watch.elapsed_secs(), 0);

        watch.start();
        watch.tick();
        watch.tick();
        assert_eq!(watch.label(), "00:02");
    }

    #[test]
    fn stopwatch_restart_and_stop_reset_to_zero() {
        let mut watch = Stopwatch::new();
        watch.start();
        watch.tick();
        watch.start();
        assert_eq!(watch.elapsed_secs(), 0);
        watch.tick();
        watch.stop();
        assert_eq!(watch.elapsed_secs(), 0);
        assert!(!watch.is_running());
    }

    #[test]
    fn frozen_stopwatch_keeps_its_reading() {
        let mut watch = Stopwatch::new();
        watch.start();
        watch.tick();
        watch.freeze();
        watch.tick();
        assert_eq!(watch.elapsed_secs(), 1);
        assert!(!watch.is_running());
    }

    #[test]
    fn countdown_expires_exactly_once() {
        let mut countdown = Countdown::new(2);
        countdown.start();
        assert_eq!(countdown.label(), "00:02");
        assert_eq!(countdown.tick(), CountdownTick::Running);
        assert_eq!(countdown.tick(), CountdownTick::Expired);
        assert_eq!(countdown.tick(), CountdownTick::Idle);
        assert_eq!(countdown.label(), "00:00");
    }

    #[test]
    fn countdown_with_zero_limit_never_runs() {
        let mut countdown = Countdown::new(0);
        countdown.start();
        assert!(!countdown.is_running());
        assert_eq!(countdown.tick(), CountdownTick::Idle);
    }

    #[test]
    fn countdown_restart_refills() {
        let mut countdown = Countdown::new(3);
        countdown.start();
        countdown.tick();
        countdown.start();
        assert_eq!(countdown.remaining_secs(), 3);
    }
}

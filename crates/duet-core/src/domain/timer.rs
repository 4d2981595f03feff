//! Countdown timer state machine.
//!
//! Every transition returns the `WorkspacePatch` that has to be written for
//! other sessions to see it (or `None` when nothing changed). The machine
//! itself never does I/O.

use serde::{Deserialize, Serialize};

use super::state::TimerState;
use super::workspace::WorkspacePatch;

/// The three persisted timer columns, with nulls already resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerFields {
    pub duration: u32,
    pub remaining: u32,
    pub running: bool,
}

impl TimerFields {
    /// Fraction of the duration still left, clamped to `[0, 1]`.
    pub fn progress(&self) -> f64 {
        if self.duration == 0 {
            return 0.0;
        }
        (f64::from(self.remaining) / f64::from(self.duration)).clamp(0.0, 1.0)
    }
}

/// Countdown timer.
///
/// State transitions:
/// - Stopped -> Running (start)
/// - Running -> Stopped (pause, or tick reaching 0)
/// - any -> Stopped (reset)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timer {
    duration: u32,
    remaining: u32,
    state: TimerState,
}

impl Timer {
    /// A stopped timer with `remaining == duration`.
    pub fn new(duration: u32) -> Self {
        Self {
            duration,
            remaining: duration,
            state: TimerState::Stopped,
        }
    }

    pub fn from_fields(fields: TimerFields) -> Self {
        Self {
            duration: fields.duration,
            remaining: fields.remaining,
            state: TimerState::from_running(fields.running),
        }
    }

    pub fn fields(&self) -> TimerFields {
        TimerFields {
            duration: self.duration,
            remaining: self.remaining,
            running: self.state.is_running(),
        }
    }

    pub fn duration(&self) -> u32 {
        self.duration
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    /// Stopped -> Running. No-op when already running.
    pub fn start(&mut self) -> Option<WorkspacePatch> {
        if self.is_running() {
            return None;
        }
        self.state = TimerState::Running;
        Some(WorkspacePatch::timer(self.fields()))
    }

    /// Running -> Stopped. No-op when already stopped.
    pub fn pause(&mut self) -> Option<WorkspacePatch> {
        if !self.is_running() {
            return None;
        }
        self.state = TimerState::Stopped;
        Some(WorkspacePatch::timer(self.fields()))
    }

    /// Any -> Stopped with `remaining := duration`. Always persists.
    pub fn reset(&mut self) -> WorkspacePatch {
        self.state = TimerState::Stopped;
        self.remaining = self.duration;
        WorkspacePatch::timer(self.fields())
    }

    /// One second elapsed. Only acts while running.
    ///
    /// Persists `remaining` only; reaching 0 stops the timer locally.
    /// A running timer already at 0 (e.g. restored from a row still flagged
    /// running) is stopped without a write.
    pub fn tick(&mut self) -> Option<WorkspacePatch> {
        if !self.is_running() {
            return None;
        }
        if self.remaining == 0 {
            self.state = TimerState::Stopped;
            return None;
        }
        self.remaining -= 1;
        if self.remaining == 0 {
            self.state = TimerState::Stopped;
        }
        Some(WorkspacePatch::timer_value(self.remaining))
    }

    /// New length from the inline editor. Seconds are clamped to `0..=59`.
    ///
    /// `remaining` restarts from the new duration; the running flag is kept.
    pub fn set_duration(&mut self, minutes: u32, seconds: u32) -> WorkspacePatch {
        let total = minutes.saturating_mul(60).saturating_add(seconds.min(59));
        self.duration = total;
        self.remaining = total;
        WorkspacePatch::timer_length(self.duration, self.remaining)
    }

    /// Overwrite everything with values received from another session.
    ///
    /// Last writer wins; nothing is merged.
    pub fn overwrite(&mut self, fields: TimerFields) {
        *self = Self::from_fields(fields);
    }

}

/// Format seconds as `m:ss`.
pub fn format_clock(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Inline minutes/seconds editor state.
///
/// Raw text from the input boxes goes through `set_minutes_input` /
/// `set_seconds_input`; anything unparseable counts as 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerEdit {
    minutes: u32,
    seconds: u32,
}

impl TimerEdit {
    /// Seed both fields from the current duration.
    pub fn from_duration(duration: u32) -> Self {
        Self {
            minutes: duration / 60,
            seconds: duration % 60,
        }
    }

    pub fn minutes(&self) -> u32 {
        self.minutes
    }

    pub fn seconds(&self) -> u32 {
        self.seconds
    }

    pub fn set_minutes_input(&mut self, raw: &str) {
        self.minutes = parse_clamped(raw, u32::MAX);
    }

    pub fn set_seconds_input(&mut self, raw: &str) {
        self.seconds = parse_clamped(raw, 59);
    }

    /// Apply the edit to a timer and return what must be persisted.
    pub fn commit(&self, timer: &mut Timer) -> WorkspacePatch {
        timer.set_duration(self.minutes, self.seconds)
    }
}

fn parse_clamped(raw: &str, max: u32) -> u32 {
    let value = raw.trim().parse::<i64>().unwrap_or(0);
    value.clamp(0, i64::from(max)) as u32
}

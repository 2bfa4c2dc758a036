//! Round timer - logical countdown and cycle tracking.
//!
//! The timer is driven entirely by explicit tick commands carrying elapsed
//! milliseconds, so replaying a command log reproduces every timer-derived
//! transition exactly. Pausing simply stops consuming ticks; the remaining
//! duration is preserved to the millisecond with no drift.
//!
//! The timer never decides a loser. It reports warnings, the inactivity
//! violation, and expiry; the follow-up is always an officiating command.

use serde::{Deserialize, Serialize};

use crate::models::snapshot::TimerReading;

/// Head-to-head round length.
pub const ROUND_DURATION_MS: u64 = 60_000;

/// Expected tick resolution from the ticker thread.
pub const TICK_INTERVAL_MS: u64 = 100;

/// No bout activity for this long is a pause violation.
pub const PAUSE_LIMIT_MS: u64 = 10_000;

/// Countdown warnings, in seconds remaining, emitted once each.
pub const WARNING_THRESHOLDS_S: [u32; 3] = [30, 10, 5];

/// Timer-derived facts produced by a tick or a bout notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerSignal {
    Warning(u32),
    PauseViolation,
    Expired,
}

/// Fixed 60-second countdown for head-to-head rounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedDurationTimer {
    duration_ms: u64,
    remaining_ms: u64,
    since_last_bout_ms: u64,
    paused: bool,
    expired: bool,
    violation_reported: bool,
    warnings_sent: [bool; WARNING_THRESHOLDS_S.len()],
}

impl FixedDurationTimer {
    pub fn new(duration_ms: u64) -> Self {
        Self {
            duration_ms,
            remaining_ms: duration_ms,
            since_last_bout_ms: 0,
            paused: false,
            expired: false,
            violation_reported: false,
            warnings_sent: [false; WARNING_THRESHOLDS_S.len()],
        }
    }

    fn advance(&mut self, elapsed_ms: u64) -> Vec<TimerSignal> {
        let mut signals = Vec::new();
        if self.paused || self.expired {
            return signals;
        }

        self.remaining_ms = self.remaining_ms.saturating_sub(elapsed_ms);
        self.since_last_bout_ms += elapsed_ms;

        let remaining_s = (self.remaining_ms / 1000) as u32;
        for (i, &threshold) in WARNING_THRESHOLDS_S.iter().enumerate() {
            if remaining_s <= threshold && !self.warnings_sent[i] {
                self.warnings_sent[i] = true;
                signals.push(TimerSignal::Warning(threshold));
            }
        }

        if self.since_last_bout_ms >= PAUSE_LIMIT_MS && !self.violation_reported {
            self.violation_reported = true;
            signals.push(TimerSignal::PauseViolation);
        }

        if self.remaining_ms == 0 {
            self.expired = true;
            signals.push(TimerSignal::Expired);
        }
        signals
    }

    fn note_bout(&mut self) {
        self.since_last_bout_ms = 0;
        self.violation_reported = false;
    }
}

/// Team-mode rounds end when every active player has passed through the
/// Red Zone once. No wall-clock deadline; progress is bouts over roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueCycleTimer {
    target: u32,
    completed: u32,
}

impl QueueCycleTimer {
    pub fn new(active_roster_size: u32) -> Self {
        Self { target: active_roster_size.max(1), completed: 0 }
    }

    pub fn is_cycle_complete(&self) -> bool {
        self.completed >= self.target
    }
}

/// Round-completion strategy, selected by game mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundTimer {
    FixedDuration(FixedDurationTimer),
    QueueCycle(QueueCycleTimer),
}

impl RoundTimer {
    pub fn fixed() -> Self {
        RoundTimer::FixedDuration(FixedDurationTimer::new(ROUND_DURATION_MS))
    }

    pub fn queue_cycle(active_roster_size: u32) -> Self {
        RoundTimer::QueueCycle(QueueCycleTimer::new(active_roster_size))
    }

    /// Consume elapsed wall time. Only meaningful for the countdown; cycle
    /// rounds have no deadline and ignore ticks.
    pub fn advance(&mut self, elapsed_ms: u64) -> Vec<TimerSignal> {
        match self {
            RoundTimer::FixedDuration(t) => t.advance(elapsed_ms),
            RoundTimer::QueueCycle(_) => Vec::new(),
        }
    }

    /// A bout was recorded: reset the inactivity clock, or advance the cycle.
    pub fn note_bout(&mut self) {
        match self {
            RoundTimer::FixedDuration(t) => t.note_bout(),
            RoundTimer::QueueCycle(t) => t.completed += 1,
        }
    }

    /// Inverse of `note_bout` for the cycle counter; the countdown keeps its
    /// inactivity reset (the undone bout was still activity on the court).
    pub fn unnote_bout(&mut self) {
        if let RoundTimer::QueueCycle(t) = self {
            t.completed = t.completed.saturating_sub(1);
        }
    }

    pub fn pause(&mut self) {
        if let RoundTimer::FixedDuration(t) = self {
            t.paused = true;
        }
    }

    pub fn resume(&mut self) {
        if let RoundTimer::FixedDuration(t) = self {
            t.paused = false;
        }
    }

    pub fn is_expired(&self) -> bool {
        match self {
            RoundTimer::FixedDuration(t) => t.expired,
            RoundTimer::QueueCycle(t) => t.is_cycle_complete(),
        }
    }

    pub fn reading(&self) -> TimerReading {
        match self {
            RoundTimer::FixedDuration(t) => TimerReading::Countdown {
                remaining_ms: t.remaining_ms,
            },
            RoundTimer::QueueCycle(t) => TimerReading::CycleProgress {
                completed: t.completed,
                target: t.target,
            },
        }
    }
}

//! Timer entity and its wall-clock reconciliation

use std::fmt;

use chrono::{DateTime, Utc};

/// Registry-issued identifier, stable for the lifetime of a timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

impl TimerId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a timer is in its lifecycle.
///
/// `paused_seconds` is the countdown already consumed before the current
/// run segment. A completed timer has consumed its whole duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Stopped {
        paused_seconds: u64,
    },
    Running {
        started_at: DateTime<Utc>,
        paused_seconds: u64,
    },
    Completed,
}

/// Emitted by reconciliation when a running timer reaches zero
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedTimer {
    pub id: TimerId,
    pub name: String,
}

/// A single countdown
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timer {
    id: TimerId,
    name: String,
    notes: String,
    duration: u64,
    time_left: u64,
    state: RunState,
    created_at: DateTime<Utc>,
}

impl Timer {
    /// Create a fresh, stopped timer. Callers validate `name` and `duration`.
    pub(crate) fn new(
        id: TimerId,
        name: String,
        notes: String,
        duration: u64,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            notes,
            duration,
            time_left: duration,
            state: RunState::Stopped { paused_seconds: 0 },
            created_at,
        }
    }

    pub fn id(&self) -> TimerId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    /// Total configured seconds
    pub fn duration(&self) -> u64 {
        self.duration
    }

    /// Remaining seconds as of the last reconciliation
    pub fn time_left(&self) -> u64 {
        self.time_left
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, RunState::Running { .. })
    }

    pub fn is_completed(&self) -> bool {
        matches!(self.state, RunState::Completed)
    }

    /// Start of the current run segment, only while running
    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        match self.state {
            RunState::Running { started_at, .. } => Some(started_at),
            _ => None,
        }
    }

    /// Seconds consumed before the current run segment
    pub fn paused_seconds(&self) -> u64 {
        match self.state {
            RunState::Stopped { paused_seconds } | RunState::Running { paused_seconds, .. } => {
                paused_seconds
            }
            RunState::Completed => self.duration,
        }
    }

    /// Percentage of the duration already counted down
    pub fn progress(&self) -> f64 {
        if self.duration == 0 {
            return 0.0;
        }
        (self.duration - self.time_left) as f64 / self.duration as f64 * 100.0
    }

    /// Remaining time as `MM:SS`
    pub fn display(&self) -> String {
        format_clock(self.time_left)
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub(crate) fn set_notes(&mut self, notes: String) {
        self.notes = notes;
    }

    /// Enter the running state. Returns false when nothing changed
    /// (already running, or completed).
    pub(crate) fn start(&mut self, now: DateTime<Utc>) -> bool {
        match self.state {
            RunState::Stopped { .. } if self.time_left > 0 => {
                self.state = RunState::Running {
                    started_at: now,
                    paused_seconds: self.duration - self.time_left,
                };
                true
            }
            _ => false,
        }
    }

    /// Leave the running state, first bringing `time_left` up to `now`.
    ///
    /// If the countdown ran out before the pause landed the timer completes
    /// instead, and the completion is returned so the caller can alert.
    pub(crate) fn pause(&mut self, now: DateTime<Utc>) -> Option<CompletedTimer> {
        if !self.is_running() {
            return None;
        }
        if let Some(completed) = self.reconcile(now) {
            return Some(completed);
        }
        self.state = RunState::Stopped {
            paused_seconds: self.duration - self.time_left,
        };
        None
    }

    pub(crate) fn reset(&mut self) {
        self.time_left = self.duration;
        self.state = RunState::Stopped { paused_seconds: 0 };
    }

    /// Recompute `time_left` from the wall clock.
    ///
    /// Only the absolute start of the run segment matters, so missed or late
    /// polls never skew the result.
    pub(crate) fn reconcile(&mut self, now: DateTime<Utc>) -> Option<CompletedTimer> {
        let RunState::Running {
            started_at,
            paused_seconds,
        } = self.state
        else {
            return None;
        };

        let elapsed = elapsed_seconds(started_at, now);
        let consumed = paused_seconds.saturating_add(elapsed);
        let remaining = self.duration.saturating_sub(consumed);

        if remaining == 0 {
            self.time_left = 0;
            self.state = RunState::Completed;
            Some(CompletedTimer {
                id: self.id,
                name: self.name.clone(),
            })
        } else {
            self.time_left = remaining;
            None
        }
    }
}

/// Whole seconds between two instants; a clock stepping backwards counts as zero
fn elapsed_seconds(since: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    let millis = (now - since).num_milliseconds().max(0);
    millis as u64 / 1000
}

/// Format seconds as `MM:SS`, zero-padded
pub fn format_clock(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

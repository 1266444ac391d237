//! Ordered collection of timers and the operations that mutate them

use chrono::{DateTime, Utc};
use tracing::debug;

use super::{CompletedTimer, Timer, TimerError, TimerId};

/// Owns every live timer. Insertion order is display order.
#[derive(Debug, Default)]
pub struct TimerRegistry {
    timers: Vec<Timer>,
    next_id: u64,
}

impl TimerRegistry {
    pub fn new() -> Self {
        Self {
            timers: Vec::new(),
            next_id: 1,
        }
    }

    /// Create a timer from a name and a minutes/seconds duration.
    ///
    /// Seconds above 59 are folded into the total.
    pub fn create(
        &mut self,
        name: &str,
        notes: &str,
        minutes: u64,
        seconds: u64,
        now: DateTime<Utc>,
    ) -> Result<&Timer, TimerError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(TimerError::EmptyName);
        }
        let duration = minutes.saturating_mul(60).saturating_add(seconds);
        if duration == 0 {
            return Err(TimerError::ZeroDuration);
        }

        let id = TimerId::new(self.next_id.max(1));
        self.next_id = id.get() + 1;

        debug!("Creating timer {} ({}s)", id, duration);
        self.timers.push(Timer::new(
            id,
            name.to_string(),
            notes.trim().to_string(),
            duration,
            now,
        ));
        Ok(&self.timers[self.timers.len() - 1])
    }

    /// Start or pause a timer.
    ///
    /// Starting a completed timer and repeating the current state are no-ops.
    /// Pausing reconciles first, so a pause that lands after the deadline
    /// completes the timer and returns the completion.
    pub fn set_running(
        &mut self,
        id: TimerId,
        running: bool,
        now: DateTime<Utc>,
    ) -> Result<Option<CompletedTimer>, TimerError> {
        let timer = self.get_mut(id)?;
        if running {
            if timer.start(now) {
                debug!("Timer {} started", id);
            }
            Ok(None)
        } else {
            let completed = timer.pause(now);
            debug!("Timer {} paused", id);
            Ok(completed)
        }
    }

    /// Flip between running and paused
    pub fn toggle(
        &mut self,
        id: TimerId,
        now: DateTime<Utc>,
    ) -> Result<Option<CompletedTimer>, TimerError> {
        let running = self.get(id).ok_or(TimerError::NotFound(id))?.is_running();
        self.set_running(id, !running, now)
    }

    pub fn reset(&mut self, id: TimerId) -> Result<(), TimerError> {
        self.get_mut(id)?.reset();
        Ok(())
    }

    /// Update display fields only; timing state is left alone
    pub fn edit(
        &mut self,
        id: TimerId,
        name: Option<&str>,
        notes: Option<&str>,
    ) -> Result<(), TimerError> {
        let name = match name.map(str::trim) {
            Some("") => return Err(TimerError::EmptyName),
            other => other,
        };
        let timer = self.get_mut(id)?;
        if let Some(name) = name {
            timer.set_name(name.to_string());
        }
        if let Some(notes) = notes {
            timer.set_notes(notes.trim().to_string());
        }
        Ok(())
    }

    /// Remove a timer, handing it back to the caller
    pub fn delete(&mut self, id: TimerId) -> Result<Timer, TimerError> {
        let index = self
            .timers
            .iter()
            .position(|timer| timer.id() == id)
            .ok_or(TimerError::NotFound(id))?;
        Ok(self.timers.remove(index))
    }

    /// Bring every running timer up to `now`, returning those that finished
    pub fn reconcile(&mut self, now: DateTime<Utc>) -> Vec<CompletedTimer> {
        self.timers
            .iter_mut()
            .filter_map(|timer| timer.reconcile(now))
            .collect()
    }

    pub fn get(&self, id: TimerId) -> Option<&Timer> {
        self.timers.iter().find(|timer| timer.id() == id)
    }

    fn get_mut(&mut self, id: TimerId) -> Result<&mut Timer, TimerError> {
        self.timers
            .iter_mut()
            .find(|timer| timer.id() == id)
            .ok_or(TimerError::NotFound(id))
    }

    pub fn list(&self) -> &[Timer] {
        &self.timers
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    pub fn running_count(&self) -> usize {
        self.timers.iter().filter(|timer| timer.is_running()).count()
    }

    pub fn completed_count(&self) -> usize {
        self.timers.iter().filter(|timer| timer.is_completed()).count()
    }
}

//! Main application state management

use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::Instant,
};
use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use super::{AppError, Notification};
use crate::{
    services::{AlertRequest, KeyValueStore, NewPreset, Preset, PresetStore, Settings},
    timers::{Clock, CompletedTimer, Timer, TimerError, TimerId, TimerRegistry},
};

/// Capacity of the toast broadcast channel
const NOTIFICATION_CAPACITY: usize = 100;

/// Shared state: the timer registry plus its collaborators
pub struct AppState {
    /// Every live timer, reconciled against `clock`
    registry: Mutex<TimerRegistry>,
    clock: Arc<dyn Clock>,
    /// Injected user settings (alarm volume)
    pub settings: Settings,
    pub presets: PresetStore,
    /// Toast fan-out to SSE subscribers
    notification_tx: broadcast::Sender<Notification>,
    /// Queue into the alert player task
    alert_tx: mpsc::Sender<AlertRequest>,
    pub start_time: Instant,
}

impl AppState {
    /// Create the state, loading settings and presets from `store`
    pub fn new(
        clock: Arc<dyn Clock>,
        store: Arc<dyn KeyValueStore>,
        alert_tx: mpsc::Sender<AlertRequest>,
    ) -> Self {
        let (notification_tx, _) = broadcast::channel(NOTIFICATION_CAPACITY);

        Self {
            registry: Mutex::new(TimerRegistry::new()),
            clock,
            settings: Settings::load(Arc::clone(&store)),
            presets: PresetStore::load(store),
            notification_tx,
            alert_tx,
            start_time: Instant::now(),
        }
    }

    fn lock_registry(&self) -> Result<MutexGuard<'_, TimerRegistry>, AppError> {
        self.registry
            .lock()
            .map_err(|_| AppError::Lock("timer registry"))
    }

    /// Run `op` against a freshly reconciled registry.
    ///
    /// `op` may add to the completions found by reconciliation; all of them
    /// are announced after the lock is released.
    fn with_registry<T, F>(&self, op: F) -> Result<T, AppError>
    where
        F: FnOnce(
            &mut TimerRegistry,
            DateTime<Utc>,
            &mut Vec<CompletedTimer>,
        ) -> Result<T, AppError>,
    {
        let now = self.clock.now();
        let mut registry = self.lock_registry()?;
        let mut completed = registry.reconcile(now);
        let result = op(&mut registry, now, &mut completed);
        drop(registry);

        for timer in &completed {
            self.announce_completion(timer);
        }
        result
    }

    fn mutate_running<F>(&self, id: TimerId, op: F) -> Result<Timer, AppError>
    where
        F: FnOnce(&mut TimerRegistry, DateTime<Utc>) -> Result<Option<CompletedTimer>, TimerError>,
    {
        self.with_registry(|registry, now, completed| {
            completed.extend(op(registry, now)?);
            Ok(lookup(registry, id)?)
        })
    }

    /// Reconcile every running timer. Returns how many completed.
    pub fn reconcile(&self) -> Result<usize, AppError> {
        self.with_registry(|_, _, completed| Ok(completed.len()))
    }

    pub fn list_timers(&self) -> Result<Vec<Timer>, AppError> {
        self.with_registry(|registry, _, _| Ok(registry.list().to_vec()))
    }

    pub fn get_timer(&self, id: TimerId) -> Result<Timer, AppError> {
        self.with_registry(|registry, _, _| Ok(lookup(registry, id)?))
    }

    pub fn create_timer(
        &self,
        name: &str,
        notes: &str,
        minutes: u64,
        seconds: u64,
    ) -> Result<Timer, AppError> {
        let timer = self.with_registry(|registry, now, _| {
            Ok(registry.create(name, notes, minutes, seconds, now)?.clone())
        })?;
        info!("Created timer {} '{}' ({}s)", timer.id(), timer.name(), timer.duration());
        self.notify(Notification::created(timer.name(), timer.created_at()));
        Ok(timer)
    }

    pub fn set_running(&self, id: TimerId, running: bool) -> Result<Timer, AppError> {
        self.mutate_running(id, |registry, now| registry.set_running(id, running, now))
    }

    pub fn toggle_timer(&self, id: TimerId) -> Result<Timer, AppError> {
        self.mutate_running(id, |registry, now| registry.toggle(id, now))
    }

    pub fn reset_timer(&self, id: TimerId) -> Result<Timer, AppError> {
        self.with_registry(|registry, _, _| {
            registry.reset(id)?;
            debug!("Timer {} reset", id);
            Ok(lookup(registry, id)?)
        })
    }

    pub fn edit_timer(
        &self,
        id: TimerId,
        name: Option<&str>,
        notes: Option<&str>,
    ) -> Result<Timer, AppError> {
        self.with_registry(|registry, _, _| {
            registry.edit(id, name, notes)?;
            Ok(lookup(registry, id)?)
        })
    }

    pub fn delete_timer(&self, id: TimerId) -> Result<Timer, AppError> {
        let removed = self.with_registry(|registry, _, _| Ok(registry.delete(id)?))?;
        info!("Deleted timer {} '{}'", removed.id(), removed.name());
        self.notify(Notification::deleted(removed.name(), self.clock.now()));
        Ok(removed)
    }

    /// Counts of (total, running, completed) timers
    pub fn timer_counts(&self) -> Result<(usize, usize, usize), AppError> {
        self.with_registry(|registry, _, _| {
            Ok((
                registry.len(),
                registry.running_count(),
                registry.completed_count(),
            ))
        })
    }

    pub fn list_presets(&self) -> Result<Vec<Preset>, AppError> {
        Ok(self.presets.list()?)
    }

    pub fn add_preset(&self, preset: NewPreset) -> Result<Preset, AppError> {
        let preset = self.presets.add(preset, self.clock.now())?;
        info!("Saved preset '{}'", preset.label);
        Ok(preset)
    }

    pub fn remove_preset(&self, id: &str) -> Result<Preset, AppError> {
        let preset = self.presets.remove(id)?;
        info!("Removed preset '{}'", preset.label);
        Ok(preset)
    }

    pub fn set_alarm_volume(&self, volume: f32) -> Result<f32, AppError> {
        Ok(self.settings.set_alarm_volume(volume)?)
    }

    /// Subscribe to toast notifications
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.notification_tx.subscribe()
    }

    /// Publish a toast; nobody listening is not an error
    pub fn notify(&self, notification: Notification) {
        info!("{}: {}", notification.title, notification.description);
        if self.notification_tx.send(notification).is_err() {
            debug!("No notification subscribers");
        }
    }

    /// Queue the alert sound and toast for a finished timer.
    ///
    /// Never blocks: a full or closed alert queue drops the sound, not the toast.
    fn announce_completion(&self, timer: &CompletedTimer) {
        self.queue_alert(&timer.name);
        self.notify(Notification::completed(&timer.name, self.clock.now()));
    }

    /// Sound the alert once at the current volume, as a preview.
    ///
    /// Returns whether the request was queued; a refusal is only logged.
    pub fn test_alarm(&self) -> bool {
        self.queue_alert("Test alarm")
    }

    fn queue_alert(&self, timer_name: &str) -> bool {
        let request = AlertRequest {
            timer_name: timer_name.to_string(),
            volume: self.settings.alarm_volume(),
        };
        match self.alert_tx.try_send(request) {
            Ok(()) => true,
            Err(e) => {
                warn!("Could not queue alert for '{}': {}", timer_name, e);
                false
            }
        }
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }
}

fn lookup(registry: &TimerRegistry, id: TimerId) -> Result<Timer, TimerError> {
    registry.get(id).cloned().ok_or(TimerError::NotFound(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        services::MemoryStore,
        state::NotificationKind,
        timers::ManualClock,
    };
    use chrono::{Duration, TimeZone};

    fn setup() -> (AppState, Arc<ManualClock>, mpsc::Receiver<AlertRequest>) {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        ));
        let (alert_tx, alert_rx) = mpsc::channel(8);
        let state = AppState::new(clock.clone(), Arc::new(MemoryStore::new()), alert_tx);
        (state, clock, alert_rx)
    }

    #[test]
    fn create_and_delete_emit_toasts() {
        let (state, _clock, _alerts) = setup();
        let mut toasts = state.subscribe();

        let timer = state.create_timer("Tea", "", 3, 0).unwrap();
        let created = toasts.try_recv().unwrap();
        assert_eq!(created.kind, NotificationKind::Created);
        assert_eq!(created.description, "Tea timer has been created.");

        state.delete_timer(timer.id()).unwrap();
        let deleted = toasts.try_recv().unwrap();
        assert_eq!(deleted.kind, NotificationKind::Deleted);
        assert_eq!(deleted.description, "Tea has been deleted.");
    }

    #[test]
    fn rejected_create_adds_nothing_and_stays_quiet() {
        let (state, _clock, _alerts) = setup();
        let mut toasts = state.subscribe();
        assert!(matches!(
            state.create_timer("", "", 1, 0),
            Err(AppError::Timer(TimerError::EmptyName))
        ));
        assert!(matches!(
            state.create_timer("Nap", "", 0, 0),
            Err(AppError::Timer(TimerError::ZeroDuration))
        ));
        assert!(state.list_timers().unwrap().is_empty());
        assert!(toasts.try_recv().is_err());
    }

    #[test]
    fn deleting_unknown_timer_is_quiet() {
        let (state, _clock, _alerts) = setup();
        state.create_timer("Keep", "", 1, 0).unwrap();
        let mut toasts = state.subscribe();

        assert!(state.delete_timer(TimerId::new(42)).is_err());
        assert_eq!(state.list_timers().unwrap().len(), 1);
        assert!(toasts.try_recv().is_err());
    }

    #[test]
    fn completion_alerts_exactly_once() {
        let (state, clock, mut alerts) = setup();
        state.settings.set_alarm_volume(0.8).unwrap();
        let timer = state.create_timer("Oven", "", 5, 0).unwrap();
        state.set_running(timer.id(), true).unwrap();
        let mut toasts = state.subscribe();

        clock.advance(Duration::seconds(301));
        assert_eq!(state.reconcile().unwrap(), 1);
        assert_eq!(state.reconcile().unwrap(), 0);
        let listed = state.list_timers().unwrap();
        assert_eq!(listed[0].time_left(), 0);
        assert!(listed[0].is_completed());

        let alert = alerts.try_recv().unwrap();
        assert_eq!(alert.timer_name, "Oven");
        assert_eq!(alert.volume, 0.8);
        assert!(alerts.try_recv().is_err());

        let toast = toasts.try_recv().unwrap();
        assert_eq!(toast.kind, NotificationKind::Completed);
        assert_eq!(toast.title, "Timer Completed!");
        assert!(toasts.try_recv().is_err());
    }

    #[test]
    fn reads_see_reconciled_time() {
        let (state, clock, _alerts) = setup();
        let timer = state.create_timer("Run", "", 2, 0).unwrap();
        state.set_running(timer.id(), true).unwrap();

        clock.advance(Duration::seconds(30));
        let paused = state.set_running(timer.id(), false).unwrap();
        assert_eq!(paused.time_left(), 90);

        clock.advance(Duration::minutes(10));
        state.toggle_timer(timer.id()).unwrap();
        clock.advance(Duration::seconds(30));
        assert_eq!(state.get_timer(timer.id()).unwrap().time_left(), 60);
    }

    #[test]
    fn full_alert_queue_still_completes_timers() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let (alert_tx, _alert_rx) = mpsc::channel(1);
        let state = AppState::new(clock.clone(), Arc::new(MemoryStore::new()), alert_tx);
        for name in ["A", "B", "C"] {
            let timer = state.create_timer(name, "", 0, 1).unwrap();
            state.set_running(timer.id(), true).unwrap();
        }

        clock.advance(Duration::seconds(2));
        assert_eq!(state.reconcile().unwrap(), 3);
        assert_eq!(state.timer_counts().unwrap(), (3, 0, 3));
    }

    #[test]
    fn edit_and_reset_return_updated_timer() {
        let (state, clock, _alerts) = setup();
        let timer = state.create_timer("Bread", "", 0, 30).unwrap();
        state.set_running(timer.id(), true).unwrap();
        clock.advance(Duration::seconds(40));

        let edited = state
            .edit_timer(timer.id(), Some("Sourdough"), Some("fold"))
            .unwrap();
        assert_eq!(edited.name(), "Sourdough");
        assert!(edited.is_completed());

        let reset = state.reset_timer(timer.id()).unwrap();
        assert_eq!(reset.time_left(), 30);
        assert!(!reset.is_completed());
    }

    #[test]
    fn test_alarm_queues_at_current_volume() {
        let (state, _clock, mut alerts) = setup();
        state.settings.set_alarm_volume(0.5).unwrap();

        assert!(state.test_alarm());
        let alert = alerts.try_recv().unwrap();
        assert_eq!(alert.volume, 0.5);
        assert!(state.list_timers().unwrap().is_empty());

        drop(alerts);
        assert!(!state.test_alarm());
    }
}

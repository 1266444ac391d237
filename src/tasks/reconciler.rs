//! Periodic timer reconciliation task

use std::{sync::Arc, time::Duration};
use tokio::{
    sync::oneshot,
    task::JoinHandle,
    time::{interval, MissedTickBehavior},
};
use tracing::{debug, error, info, warn};

use crate::state::AppState;

/// Owns the running reconciliation loop.
///
/// `shutdown` stops it cleanly; dropping the handle aborts it.
pub struct ReconcilerHandle {
    stop_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl ReconcilerHandle {
    /// Stop the loop and wait for it to exit
    pub async fn shutdown(mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!("Reconciler task ended abnormally: {}", e);
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }
}

impl Drop for ReconcilerHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Spawn the loop that reconciles every timer once per `period`
pub fn spawn_reconciler(state: Arc<AppState>, period: Duration) -> ReconcilerHandle {
    let (stop_tx, stop_rx) = oneshot::channel();
    let task = tokio::spawn(reconcile_loop(state, period, stop_rx));
    ReconcilerHandle {
        stop_tx: Some(stop_tx),
        task: Some(task),
    }
}

async fn reconcile_loop(
    state: Arc<AppState>,
    period: Duration,
    mut stop_rx: oneshot::Receiver<()>,
) {
    info!("Starting timer reconciler ({}ms period)", period.as_millis());

    // Remaining time is derived from timestamps, so skipped ticks lose nothing.
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match state.reconcile() {
                    Ok(0) => {}
                    Ok(completed) => debug!("{} timer(s) completed", completed),
                    Err(e) => error!("Failed to reconcile timers: {}", e),
                }
            }
            _ = &mut stop_rx => {
                break;
            }
        }
    }

    info!("Timer reconciler stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        services::{AlertRequest, MemoryStore},
        timers::ManualClock,
    };
    use chrono::{Duration as ChronoDuration, Utc};
    use tokio::sync::mpsc;

    fn setup() -> (Arc<AppState>, Arc<ManualClock>, mpsc::Receiver<AlertRequest>) {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let (alert_tx, alert_rx) = mpsc::channel(8);
        let state = Arc::new(AppState::new(
            clock.clone(),
            Arc::new(MemoryStore::new()),
            alert_tx,
        ));
        (state, clock, alert_rx)
    }

    #[tokio::test]
    async fn loop_completes_timers_and_queues_alert() {
        let (state, clock, mut alerts) = setup();
        let timer = state.create_timer("Eggs", "", 0, 5).unwrap();
        state.set_running(timer.id(), true).unwrap();

        let handle = spawn_reconciler(Arc::clone(&state), Duration::from_millis(10));
        clock.advance(ChronoDuration::seconds(6));

        let alert = tokio::time::timeout(Duration::from_secs(2), alerts.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(alert.timer_name, "Eggs");
        assert!(state.get_timer(timer.id()).unwrap().is_completed());

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn shutdown_stops_the_loop() {
        let (state, _clock, _alerts) = setup();
        let handle = spawn_reconciler(state, Duration::from_millis(10));
        assert!(!handle.is_finished());
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn dropping_handle_releases_state() {
        let (state, _clock, _alerts) = setup();
        let handle = spawn_reconciler(Arc::clone(&state), Duration::from_millis(10));
        drop(handle);

        // The aborted task drops its clone of the state.
        for _ in 0..100 {
            if Arc::strong_count(&state) == 1 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("reconciler kept running after its handle was dropped");
    }
}

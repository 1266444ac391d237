//! Background alert playback

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::services::{AlertPlayer, AlertRequest};

/// Queue depth between the reconciler and the player
pub const ALERT_QUEUE_CAPACITY: usize = 16;

/// Play queued alerts one at a time.
///
/// Playback failures are logged and dropped. Without a player the requests
/// are drained so the queue never fills.
pub async fn alert_player_task(
    mut alert_rx: mpsc::Receiver<AlertRequest>,
    player: Option<AlertPlayer>,
) {
    match &player {
        Some(_) => info!("Starting alert player on the default audio output"),
        None => info!("Starting alert player with local sound disabled"),
    }

    while let Some(request) = alert_rx.recv().await {
        let Some(player) = &player else {
            debug!("Sound disabled, skipping alert for '{}'", request.timer_name);
            continue;
        };

        if let Err(e) = player.play(request.volume).await {
            warn!("Could not play alarm sound for '{}': {}", request.timer_name, e);
        }
    }

    debug!("Alert queue closed, alert player exiting");
}

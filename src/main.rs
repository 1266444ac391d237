//! Multi Timer - A local server for running several named countdowns at once
//!
//! This is the main entry point for the multi-timer application.

use std::sync::Arc;
use anyhow::Context;
use tokio::{net::TcpListener, sync::mpsc};
use tracing::info;

use multi_timer::{
    api::create_router,
    config::Config,
    services::{FileStore, KeyValueStore},
    state::AppState,
    tasks::{alert_player_task, spawn_reconciler, ALERT_QUEUE_CAPACITY},
    timers::SystemClock,
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("multi_timer={},tower_http=info", config.log_level()))
        .init();

    info!("Starting multi-timer server v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration: host={}, port={}, poll={}ms",
        config.host,
        config.port,
        config.poll_interval().as_millis()
    );

    let store_path = config.store_path()?;
    info!("Using store at {}", store_path.display());
    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(store_path));

    // Alerts play on their own task so reconciliation never waits on audio
    let (alert_tx, alert_rx) = mpsc::channel(ALERT_QUEUE_CAPACITY);
    tokio::spawn(alert_player_task(alert_rx, config.alert_player()));

    let state = Arc::new(AppState::new(Arc::new(SystemClock), store, alert_tx));
    let reconciler = spawn_reconciler(Arc::clone(&state), config.poll_interval());

    let app = create_router(state);

    let addr = config.address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  GET/POST          /timers           - List or create timers");
    info!("  GET/PATCH/DELETE  /timers/:id       - Inspect, edit or delete a timer");
    info!("  POST              /timers/:id/start - Start (also pause, toggle, reset)");
    info!("  GET/POST          /presets          - List or save presets");
    info!("  GET               /presets/quick    - Built-in quick presets");
    info!("  DELETE            /presets/:id      - Remove a preset");
    info!("  GET/PUT           /settings         - Alarm volume");
    info!("  GET               /alert.wav        - Alert sound");
    info!("  POST              /alert/test       - Play a test alarm");
    info!("  GET               /events           - Notification stream");
    info!("  GET               /status, /health  - Status and health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    reconciler.shutdown().await;
    info!("Server shutdown complete");
    Ok(())
}

//! HTTP API module
//!
//! This module contains all HTTP endpoint handlers and response structures.

pub mod handlers;
pub mod responses;

use std::sync::Arc;
use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use handlers::*;

/// Create the HTTP router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/timers", get(list_timers_handler).post(create_timer_handler))
        .route(
            "/timers/:id",
            get(get_timer_handler)
                .patch(edit_timer_handler)
                .delete(delete_timer_handler),
        )
        .route("/timers/:id/start", post(start_timer_handler))
        .route("/timers/:id/pause", post(pause_timer_handler))
        .route("/timers/:id/toggle", post(toggle_timer_handler))
        .route("/timers/:id/reset", post(reset_timer_handler))
        .route("/presets", get(list_presets_handler).post(add_preset_handler))
        .route("/presets/quick", get(quick_presets_handler))
        .route("/presets/:id", delete(remove_preset_handler))
        .route("/settings", get(get_settings_handler).put(update_settings_handler))
        .route("/alert.wav", get(alert_sound_handler))
        .route("/alert/test", post(test_alarm_handler))
        .route("/events", get(events_handler))
        .route("/status", get(status_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

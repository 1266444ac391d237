//! HTTP endpoint handlers

use std::{convert::Infallible, sync::Arc};
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
    Json,
};
use futures::stream::{self, Stream};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use super::responses::{
    ApiError, CreateTimerRequest, EditTimerRequest, HealthResponse, SettingsRequest,
    SettingsResponse, StatusResponse, TimerResponse,
};
use crate::{
    services::{alert_wav, NewPreset, Preset, QuickPreset, QUICK_PRESETS},
    state::AppState,
    timers::TimerId,
};

type ApiResult<T> = Result<T, ApiError>;

/// Handle GET /timers - List timers in display order
pub async fn list_timers_handler(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<TimerResponse>>> {
    let timers = state.list_timers()?;
    Ok(Json(timers.iter().map(TimerResponse::from).collect()))
}

/// Handle POST /timers - Create a stopped timer
pub async fn create_timer_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateTimerRequest>,
) -> ApiResult<(StatusCode, Json<TimerResponse>)> {
    let timer = state.create_timer(
        &request.name,
        &request.notes,
        request.minutes,
        request.seconds,
    )?;
    Ok((StatusCode::CREATED, Json(TimerResponse::from(&timer))))
}

/// Handle GET /timers/:id
pub async fn get_timer_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> ApiResult<Json<TimerResponse>> {
    let timer = state.get_timer(TimerId::new(id))?;
    Ok(Json(TimerResponse::from(&timer)))
}

/// Handle PATCH /timers/:id - Rename or re-annotate
pub async fn edit_timer_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Json(request): Json<EditTimerRequest>,
) -> ApiResult<Json<TimerResponse>> {
    let timer = state.edit_timer(
        TimerId::new(id),
        request.name.as_deref(),
        request.notes.as_deref(),
    )?;
    Ok(Json(TimerResponse::from(&timer)))
}

/// Handle DELETE /timers/:id
pub async fn delete_timer_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> ApiResult<StatusCode> {
    state.delete_timer(TimerId::new(id))?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handle POST /timers/:id/start
pub async fn start_timer_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> ApiResult<Json<TimerResponse>> {
    let timer = state.set_running(TimerId::new(id), true)?;
    Ok(Json(TimerResponse::from(&timer)))
}

/// Handle POST /timers/:id/pause
pub async fn pause_timer_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> ApiResult<Json<TimerResponse>> {
    let timer = state.set_running(TimerId::new(id), false)?;
    Ok(Json(TimerResponse::from(&timer)))
}

/// Handle POST /timers/:id/toggle - Play/pause in one control
pub async fn toggle_timer_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> ApiResult<Json<TimerResponse>> {
    let timer = state.toggle_timer(TimerId::new(id))?;
    Ok(Json(TimerResponse::from(&timer)))
}

/// Handle POST /timers/:id/reset
pub async fn reset_timer_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> ApiResult<Json<TimerResponse>> {
    let timer = state.reset_timer(TimerId::new(id))?;
    Ok(Json(TimerResponse::from(&timer)))
}

/// Handle GET /presets
pub async fn list_presets_handler(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<Preset>>> {
    Ok(Json(state.list_presets()?))
}

/// Handle GET /presets/quick - The built-in durations
pub async fn quick_presets_handler() -> Json<&'static [QuickPreset]> {
    Json(&QUICK_PRESETS)
}

/// Handle POST /presets
pub async fn add_preset_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<NewPreset>,
) -> ApiResult<(StatusCode, Json<Preset>)> {
    let preset = state.add_preset(request)?;
    Ok((StatusCode::CREATED, Json(preset)))
}

/// Handle DELETE /presets/:id
pub async fn remove_preset_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.remove_preset(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handle GET /settings
pub async fn get_settings_handler(State(state): State<Arc<AppState>>) -> Json<SettingsResponse> {
    Json(SettingsResponse {
        alarm_volume: state.settings.alarm_volume(),
    })
}

/// Handle PUT /settings
pub async fn update_settings_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SettingsRequest>,
) -> ApiResult<Json<SettingsResponse>> {
    let alarm_volume = state.set_alarm_volume(request.alarm_volume)?;
    Ok(Json(SettingsResponse { alarm_volume }))
}

/// Handle GET /alert.wav - The alert sound at the configured volume
pub async fn alert_sound_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let wav = alert_wav(state.settings.alarm_volume());
    ([(header::CONTENT_TYPE, "audio/wav")], wav)
}

/// Handle POST /alert/test - Sound the alert locally at the configured volume
pub async fn test_alarm_handler(State(state): State<Arc<AppState>>) -> StatusCode {
    if !state.test_alarm() {
        debug!("Test alarm was not queued");
    }
    StatusCode::ACCEPTED
}

/// Handle GET /events - Toast notifications as server-sent events
pub async fn events_handler(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let notifications = state.subscribe();

    let events = stream::unfold(notifications, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(notification) => {
                    match Event::default()
                        .event(notification.kind.as_str())
                        .json_data(&notification)
                    {
                        Ok(event) => return Some((Ok(event), rx)),
                        Err(e) => warn!("Failed to encode notification event: {}", e),
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    debug!("Event subscriber lagged, skipped {} notifications", skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}

/// Handle GET /status - Timer counts and server uptime
pub async fn status_handler(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<StatusResponse>> {
    let (timers_total, timers_running, timers_completed) = state.timer_counts()?;
    Ok(Json(StatusResponse {
        timers_total,
        timers_running,
        timers_completed,
        alarm_volume: state.settings.alarm_volume(),
        uptime: state.get_uptime(),
    }))
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

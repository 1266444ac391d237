//! API request and response structures

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::{
    services::{PresetError, SettingsError},
    state::AppError,
    timers::{Timer, TimerError},
};

/// Body of `POST /timers`
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTimerRequest {
    pub name: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub minutes: u64,
    #[serde(default)]
    pub seconds: u64,
}

/// Body of `PATCH /timers/:id`; absent fields are left alone
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EditTimerRequest {
    pub name: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsRequest {
    pub alarm_volume: f32,
}

/// Serialized view of a timer, including derived display fields
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerResponse {
    pub id: String,
    pub name: String,
    pub notes: String,
    pub duration: u64,
    pub time_left: u64,
    pub is_running: bool,
    pub is_completed: bool,
    pub start_time: Option<DateTime<Utc>>,
    pub paused_time: u64,
    pub created_at: DateTime<Utc>,
    pub progress: f64,
    pub display: String,
}

impl From<&Timer> for TimerResponse {
    fn from(timer: &Timer) -> Self {
        Self {
            id: timer.id().to_string(),
            name: timer.name().to_string(),
            notes: timer.notes().to_string(),
            duration: timer.duration(),
            time_left: timer.time_left(),
            is_running: timer.is_running(),
            is_completed: timer.is_completed(),
            start_time: timer.start_time(),
            paused_time: timer.paused_seconds(),
            created_at: timer.created_at(),
            progress: timer.progress(),
            display: timer.display(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsResponse {
    pub alarm_volume: f32,
}

/// Status response with timer counts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub timers_total: usize,
    pub timers_running: usize,
    pub timers_completed: usize,
    pub alarm_volume: f32,
    pub uptime: String,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    /// Create a new health response
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Error body returned on any failed request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// An `AppError` mapped onto an HTTP status
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        let status = match &err {
            AppError::Timer(TimerError::NotFound(_))
            | AppError::Preset(PresetError::NotFound(_)) => StatusCode::NOT_FOUND,
            AppError::Timer(_)
            | AppError::Preset(PresetError::EmptyLabel | PresetError::ZeroDuration)
            | AppError::Settings(SettingsError::InvalidVolume(_)) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::Preset(_) | AppError::Settings(_) | AppError::Lock(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        if status.is_server_error() {
            error!("Request failed: {}", err);
        } else {
            warn!("Request rejected: {}", err);
        }

        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            status: "error".to_string(),
            message: self.message,
            timestamp: Utc::now(),
        };
        (self.status, Json(body)).into_response()
    }
}

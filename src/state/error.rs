//! Errors surfaced by `AppState` operations

use thiserror::Error;

use crate::{
    services::{PresetError, SettingsError},
    timers::TimerError,
};

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Timer(#[from] TimerError),
    #[error(transparent)]
    Preset(#[from] PresetError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error("failed to lock {0}")]
    Lock(&'static str),
}

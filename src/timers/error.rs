//! Timer registry errors

use thiserror::Error;

use super::TimerId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimerError {
    #[error("timer {0} not found")]
    NotFound(TimerId),
    #[error("timer name must not be empty")]
    EmptyName,
    #[error("timer duration must be greater than zero")]
    ZeroDuration,
}

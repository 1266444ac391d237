//! Background tasks module
//!
//! This module contains background tasks that run alongside the HTTP server.

pub mod alert_player;
pub mod reconciler;

// Re-export main functions
pub use alert_player::{alert_player_task, ALERT_QUEUE_CAPACITY};
pub use reconciler::{spawn_reconciler, ReconcilerHandle};

//! Multi Timer - A local server for running several named countdowns at once
//!
//! Timers are tracked against wall-clock timestamps, so they stay accurate
//! no matter how irregularly the reconciliation loop gets to run. Presets
//! and the alarm volume persist in a small key-value file.

pub mod api;
pub mod config;
pub mod services;
pub mod state;
pub mod tasks;
pub mod timers;
pub mod utils;

// Re-export commonly used types
pub use api::create_router;
pub use config::Config;
pub use state::AppState;
pub use timers::{Timer, TimerId, TimerRegistry};
pub use utils::signals::shutdown_signal;

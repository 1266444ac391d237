//! State management module
//!
//! Shared application state handed to the HTTP layer and background tasks.

pub mod app_state;
pub mod error;
pub mod notification;

// Re-export main types
pub use app_state::AppState;
pub use error::AppError;
pub use notification::{Notification, NotificationKind};

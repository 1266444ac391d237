//! Timer registry and clock reconciliation
//!
//! Timers are advanced by comparing wall-clock timestamps rather than
//! counting poll ticks.

pub mod clock;
pub mod error;
pub mod registry;
pub mod timer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::TimerError;
pub use registry::TimerRegistry;
pub use timer::{format_clock, CompletedTimer, RunState, Timer, TimerId};

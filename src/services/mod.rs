//! Collaborator services module
//!
//! Persistence for presets and settings, and the completion alert sound.

pub mod alert;
pub mod presets;
pub mod settings;
pub mod store;

// Re-export main types
pub use alert::{alert_source, alert_wav, AlertError, AlertPlayer, AlertRequest};
pub use presets::{NewPreset, Preset, PresetError, PresetStore, QuickPreset, QUICK_PRESETS};
pub use settings::{Settings, SettingsError};
pub use store::{FileStore, KeyValueStore, MemoryStore, StoreError};

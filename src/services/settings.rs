//! Alarm settings service

use std::sync::{Arc, Mutex};

use thiserror::Error;
use tracing::{info, warn};

use super::store::{KeyValueStore, StoreError};

/// Store key holding the alarm volume
pub const ALARM_VOLUME_KEY: &str = "alarmVolume";
pub const DEFAULT_ALARM_VOLUME: f32 = 0.3;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("alarm volume must be a finite number, got {0}")]
    InvalidVolume(f32),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// User settings, created once at startup and shared through `AppState`
pub struct Settings {
    store: Arc<dyn KeyValueStore>,
    alarm_volume: Mutex<f32>,
}

impl Settings {
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let alarm_volume = match store.get(ALARM_VOLUME_KEY) {
            Some(raw) => match raw.trim().parse::<f32>() {
                Ok(volume) if volume.is_finite() => volume.clamp(0.0, 1.0),
                _ => {
                    warn!("Ignoring stored alarm volume {:?}, using default", raw);
                    DEFAULT_ALARM_VOLUME
                }
            },
            None => DEFAULT_ALARM_VOLUME,
        };

        Self {
            store,
            alarm_volume: Mutex::new(alarm_volume),
        }
    }

    pub fn alarm_volume(&self) -> f32 {
        *self
            .alarm_volume
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Set the volume, clamped to `0.0..=1.0`, and persist it
    pub fn set_alarm_volume(&self, volume: f32) -> Result<f32, SettingsError> {
        if !volume.is_finite() {
            return Err(SettingsError::InvalidVolume(volume));
        }
        let volume = volume.clamp(0.0, 1.0);
        *self
            .alarm_volume
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = volume;
        info!("Alarm volume set to {:.2}", volume);
        self.store.set(ALARM_VOLUME_KEY, volume.to_string())?;
        Ok(volume)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::store::MemoryStore;

    #[test]
    fn defaults_when_absent() {
        let settings = Settings::load(Arc::new(MemoryStore::new()));
        assert_eq!(settings.alarm_volume(), DEFAULT_ALARM_VOLUME);
    }

    #[test]
    fn volume_persists_and_clamps() {
        let store = Arc::new(MemoryStore::new());
        let settings = Settings::load(store.clone());
        assert_eq!(settings.set_alarm_volume(0.75).unwrap(), 0.75);
        assert_eq!(Settings::load(store.clone()).alarm_volume(), 0.75);

        assert_eq!(settings.set_alarm_volume(3.0).unwrap(), 1.0);
        assert_eq!(settings.set_alarm_volume(-1.0).unwrap(), 0.0);
        assert_eq!(Settings::load(store).alarm_volume(), 0.0);
    }

    #[test]
    fn rejects_non_finite_volume() {
        let settings = Settings::load(Arc::new(MemoryStore::new()));
        assert!(matches!(
            settings.set_alarm_volume(f32::NAN),
            Err(SettingsError::InvalidVolume(_))
        ));
        assert_eq!(settings.alarm_volume(), DEFAULT_ALARM_VOLUME);
    }

    #[test]
    fn corrupt_or_out_of_range_values_recover() {
        let garbage = MemoryStore::with_entry(ALARM_VOLUME_KEY, "loud");
        assert_eq!(Settings::load(Arc::new(garbage)).alarm_volume(), DEFAULT_ALARM_VOLUME);

        let too_high = MemoryStore::with_entry(ALARM_VOLUME_KEY, "4");
        assert_eq!(Settings::load(Arc::new(too_high)).alarm_volume(), 1.0);
    }
}

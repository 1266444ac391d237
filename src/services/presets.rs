//! Custom timer presets persisted under a single store key

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::store::{KeyValueStore, StoreError};

/// Store key holding the serialized preset list
pub const PRESETS_KEY: &str = "timerCustomPresets";

/// A saved duration, optionally carrying a timer name and notes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preset {
    pub id: String,
    pub label: String,
    pub minutes: u64,
    pub seconds: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Preset {
    pub fn duration_seconds(&self) -> u64 {
        self.minutes.saturating_mul(60).saturating_add(self.seconds)
    }
}

/// A built-in duration offered alongside the custom presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuickPreset {
    pub label: &'static str,
    pub minutes: u64,
    pub seconds: u64,
}

impl QuickPreset {
    const fn minutes(label: &'static str, minutes: u64) -> Self {
        Self {
            label,
            minutes,
            seconds: 0,
        }
    }
}

/// Fixed quick-pick durations, shortest first
pub const QUICK_PRESETS: [QuickPreset; 6] = [
    QuickPreset::minutes("1 min", 1),
    QuickPreset::minutes("5 min", 5),
    QuickPreset::minutes("10 min", 10),
    QuickPreset::minutes("15 min", 15),
    QuickPreset::minutes("25 min", 25),
    QuickPreset::minutes("30 min", 30),
];

/// Fields supplied when saving a new preset
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewPreset {
    pub label: String,
    #[serde(default)]
    pub minutes: u64,
    #[serde(default)]
    pub seconds: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Error)]
pub enum PresetError {
    #[error("preset label must not be empty")]
    EmptyLabel,
    #[error("preset duration must be greater than zero")]
    ZeroDuration,
    #[error("preset {0} not found")]
    NotFound(String),
    #[error("preset list lock poisoned")]
    Poisoned,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Ordered preset collection, loaded once and written through on change
pub struct PresetStore {
    store: Arc<dyn KeyValueStore>,
    presets: Mutex<Vec<Preset>>,
}

impl PresetStore {
    /// Load presets from `store`. Absent or corrupt data yields an empty list.
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let presets = match store.get(PRESETS_KEY) {
            Some(raw) => match serde_json::from_str::<Vec<Preset>>(&raw) {
                Ok(presets) => {
                    info!("Loaded {} custom presets", presets.len());
                    presets
                }
                Err(e) => {
                    warn!("Discarding unreadable custom presets: {}", e);
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        Self {
            store,
            presets: Mutex::new(presets),
        }
    }

    pub fn list(&self) -> Result<Vec<Preset>, PresetError> {
        self.presets
            .lock()
            .map(|presets| presets.clone())
            .map_err(|_| PresetError::Poisoned)
    }

    /// Validate and append a preset, then persist the list.
    ///
    /// Ids are creation-time millisecond stamps, bumped past any collision.
    pub fn add(&self, new: NewPreset, now: DateTime<Utc>) -> Result<Preset, PresetError> {
        let label = new.label.trim();
        if label.is_empty() {
            return Err(PresetError::EmptyLabel);
        }
        if new.minutes == 0 && new.seconds == 0 {
            return Err(PresetError::ZeroDuration);
        }

        let mut presets = self.presets.lock().map_err(|_| PresetError::Poisoned)?;

        let mut stamp = now.timestamp_millis();
        while presets.iter().any(|p| p.id == stamp.to_string()) {
            stamp += 1;
        }

        let preset = Preset {
            id: stamp.to_string(),
            label: label.to_string(),
            minutes: new.minutes,
            seconds: new.seconds,
            name: non_empty(new.name),
            notes: non_empty(new.notes),
        };
        debug!("Adding preset {} ({})", preset.id, preset.label);
        presets.push(preset.clone());
        self.persist(&presets)?;
        Ok(preset)
    }

    /// Remove a preset by id; removing the last one deletes the store entry
    pub fn remove(&self, id: &str) -> Result<Preset, PresetError> {
        let mut presets = self.presets.lock().map_err(|_| PresetError::Poisoned)?;
        let index = presets
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| PresetError::NotFound(id.to_string()))?;
        let removed = presets.remove(index);
        debug!("Removed preset {} ({})", removed.id, removed.label);
        self.persist(&presets)?;
        Ok(removed)
    }

    fn persist(&self, presets: &[Preset]) -> Result<(), StoreError> {
        if presets.is_empty() {
            self.store.remove(PRESETS_KEY)
        } else {
            self.store.set(PRESETS_KEY, serde_json::to_string(presets)?)
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::store::MemoryStore;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn break_preset() -> NewPreset {
        NewPreset {
            label: "Break".into(),
            minutes: 5,
            ..Default::default()
        }
    }

    #[test]
    fn quick_presets_are_whole_minutes_in_order() {
        let minutes: Vec<u64> = QUICK_PRESETS.iter().map(|p| p.minutes).collect();
        assert_eq!(minutes, [1, 5, 10, 15, 25, 30]);
        assert!(QUICK_PRESETS.iter().all(|p| p.seconds == 0));
        assert_eq!(QUICK_PRESETS[4].label, "25 min");
    }

    #[test]
    fn saved_preset_survives_reload() {
        let store = Arc::new(MemoryStore::new());
        let presets = PresetStore::load(store.clone());
        let saved = presets.add(break_preset(), now()).unwrap();

        let reloaded = PresetStore::load(store).list().unwrap();
        assert_eq!(reloaded, vec![saved.clone()]);
        assert_eq!(saved.label, "Break");
        assert_eq!(saved.minutes, 5);
        assert_eq!(saved.seconds, 0);
        assert_eq!(saved.name, None);
        assert_eq!(saved.notes, None);
    }

    #[test]
    fn name_and_notes_are_trimmed_and_kept() {
        let presets = PresetStore::load(Arc::new(MemoryStore::new()));
        let saved = presets
            .add(
                NewPreset {
                    label: "  Tea ".into(),
                    minutes: 0,
                    seconds: 240,
                    name: Some(" Green tea ".into()),
                    notes: Some("   ".into()),
                },
                now(),
            )
            .unwrap();
        assert_eq!(saved.label, "Tea");
        assert_eq!(saved.name.as_deref(), Some("Green tea"));
        assert_eq!(saved.notes, None);
        assert_eq!(saved.duration_seconds(), 240);
    }

    #[test]
    fn invalid_presets_are_rejected() {
        let presets = PresetStore::load(Arc::new(MemoryStore::new()));
        let blank = NewPreset {
            label: " ".into(),
            minutes: 1,
            ..Default::default()
        };
        assert!(matches!(presets.add(blank, now()), Err(PresetError::EmptyLabel)));
        let zero = NewPreset {
            label: "Zero".into(),
            ..Default::default()
        };
        assert!(matches!(presets.add(zero, now()), Err(PresetError::ZeroDuration)));
        assert!(presets.list().unwrap().is_empty());
    }

    #[test]
    fn ids_stay_unique_within_one_millisecond() {
        let presets = PresetStore::load(Arc::new(MemoryStore::new()));
        let a = presets.add(break_preset(), now()).unwrap();
        let b = presets.add(break_preset(), now()).unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn removing_last_preset_deletes_entry() {
        let store = Arc::new(MemoryStore::new());
        let presets = PresetStore::load(store.clone());
        let a = presets.add(break_preset(), now()).unwrap();
        let b = presets.add(break_preset(), now()).unwrap();

        presets.remove(&a.id).unwrap();
        assert!(store.contains(PRESETS_KEY));
        presets.remove(&b.id).unwrap();
        assert!(!store.contains(PRESETS_KEY));

        assert!(matches!(presets.remove(&a.id), Err(PresetError::NotFound(_))));
    }

    #[test]
    fn corrupt_entry_loads_empty() {
        let store = Arc::new(MemoryStore::with_entry(PRESETS_KEY, "[{\"id\":"));
        assert!(PresetStore::load(store).list().unwrap().is_empty());
    }

    #[test]
    fn reads_entries_with_empty_strings() {
        let raw = r#"[{"id":"1714564800000","label":"Pomodoro","name":"","notes":"","minutes":25,"seconds":0}]"#;
        let store = Arc::new(MemoryStore::with_entry(PRESETS_KEY, raw));
        let loaded = PresetStore::load(store).list().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].label, "Pomodoro");
        assert_eq!(loaded[0].duration_seconds(), 25 * 60);
    }
}

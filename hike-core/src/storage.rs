//! Local key-value persistence for the hiking days and the view mode.
//!
//! The adapter never fails outward: I/O errors become notifications,
//! corrupted values fall back to an empty collection or the `list` view.

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fmt::Debug,
    fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{
    error::StorageError,
    model::{HikingDay, ViewMode},
    notify::{Notification, Notifier},
};

pub const HIKING_DAYS_KEY: &str = "hiking-trip-planner-data";
pub const VIEW_MODE_KEY: &str = "hiking-trip-planner-view-mode";

/// Stored weather older than this is refreshed on startup.
pub fn freshness_window() -> Duration {
    Duration::hours(24)
}

pub fn is_weather_data_valid(last_updated: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now - last_updated < freshness_window()
}

pub trait KeyValueStore: Send + Sync + Debug {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// One file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let io_err = |source| StorageError::Io {
            key: key.to_string(),
            source,
        };
        fs::create_dir_all(&self.dir).map_err(io_err)?;
        fs::write(self.path_for(key), value).map_err(io_err)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

/// Persisted envelope of the collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredData {
    pub hiking_days: Vec<HikingDay>,
    /// Milliseconds since the Unix epoch.
    pub last_updated: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StoredDataRef<'a> {
    hiking_days: &'a [HikingDay],
    last_updated: i64,
}

#[derive(Debug, Clone)]
pub struct Storage {
    store: Arc<dyn KeyValueStore>,
    notifier: Arc<dyn Notifier>,
}

impl Storage {
    pub fn new(store: Arc<dyn KeyValueStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self { store, notifier }
    }

    pub fn save_hiking_days(&self, days: &[HikingDay]) {
        self.save_hiking_days_at(days, Utc::now());
    }

    /// Save with an explicit `lastUpdated` stamp.
    pub fn save_hiking_days_at(&self, days: &[HikingDay], stamp: DateTime<Utc>) {
        let data = StoredDataRef {
            hiking_days: days,
            last_updated: stamp.timestamp_millis(),
        };

        let result = serde_json::to_string(&data)
            .map_err(StorageError::from)
            .and_then(|json| self.store.set(HIKING_DAYS_KEY, &json));

        match result {
            Ok(()) => tracing::debug!(count = days.len(), "hiking days saved"),
            Err(e) => self.report("Failed to save hiking days", &e),
        }
    }

    /// Load the collection and its `lastUpdated` stamp in one read.
    pub fn load(&self) -> (Vec<HikingDay>, Option<DateTime<Utc>>) {
        match self.read_stored() {
            Some(data) => {
                let stamp = DateTime::from_timestamp_millis(data.last_updated);
                tracing::info!(count = data.hiking_days.len(), "hiking days loaded");
                (data.hiking_days, stamp)
            }
            None => (Vec::new(), None),
        }
    }

    pub fn load_hiking_days(&self) -> Vec<HikingDay> {
        self.load().0
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.load().1
    }

    pub fn clear_hiking_days(&self) {
        match self.store.remove(HIKING_DAYS_KEY) {
            Ok(()) => tracing::info!("stored hiking days removed"),
            Err(e) => self.report("Failed to clear stored hiking days", &e),
        }
    }

    pub fn load_view_mode(&self) -> ViewMode {
        match self.store.get(VIEW_MODE_KEY) {
            Ok(Some(raw)) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!(value = %raw, "unrecognized stored view mode, using list");
                ViewMode::default()
            }),
            Ok(None) => ViewMode::default(),
            Err(e) => {
                self.report("Failed to load view mode", &e);
                ViewMode::default()
            }
        }
    }

    pub fn save_view_mode(&self, mode: ViewMode) {
        if let Err(e) = self.store.set(VIEW_MODE_KEY, mode.as_str()) {
            self.report("Failed to save view mode", &e);
        }
    }

    fn read_stored(&self) -> Option<StoredData> {
        let raw = match self.store.get(HIKING_DAYS_KEY) {
            Ok(raw) => raw?,
            Err(e) => {
                self.report("Failed to load hiking days", &e);
                return None;
            }
        };

        match serde_json::from_str::<StoredData>(&raw) {
            Ok(data) => Some(data),
            Err(e) => {
                tracing::warn!("stored hiking days are corrupted, starting empty: {e}");
                None
            }
        }
    }

    fn report(&self, title: &str, err: &StorageError) {
        tracing::error!("{title}: {err}");
        self.notifier
            .notify(Notification::error(title).with_description(err.to_string()));
    }
}

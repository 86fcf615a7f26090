//! Durable snapshot of an in-progress application.
//!
//! A snapshot lives in a key-value slot so a reloaded wizard can pick up where
//! the candidate left off. Only one key is used.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::state::{FormData, WizardState, FIRST_STEP, SUCCESS_STEP};

pub const SNAPSHOT_KEY: &str = "jobApplication";

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("snapshot is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// A string key-value slot.
pub trait SnapshotStore: Send + Sync {
    fn load(&self, key: &str) -> Result<Option<String>, SnapshotError>;
    fn save(&self, key: &str, value: &str) -> Result<(), SnapshotError>;
    fn remove(&self, key: &str) -> Result<(), SnapshotError>;
}

/// One `<key>.json` file per key inside a directory.
pub struct FileSnapshotStore {
    dir: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, SnapshotError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn load(&self, key: &str) -> Result<Option<String>, SnapshotError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, key: &str, value: &str) -> Result<(), SnapshotError> {
        fs::write(self.path_for(key), value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), SnapshotError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[derive(Default)]
pub struct MemorySnapshotStore {
    slots: Mutex<HashMap<String, String>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn slots(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // A poisoned map still holds plain strings.
        self.slots.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn load(&self, key: &str) -> Result<Option<String>, SnapshotError> {
        Ok(self.slots().get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<(), SnapshotError> {
        self.slots().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), SnapshotError> {
        self.slots().remove(key);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardSnapshot {
    pub application_id: Option<Uuid>,
    pub form_data: FormData,
    #[serde(default)]
    pub step: Option<u8>,
    #[serde(default)]
    pub submitted: bool,
}

impl WizardSnapshot {
    pub fn capture(state: &WizardState) -> Self {
        Self {
            application_id: state.application_id,
            form_data: state.form_data.clone(),
            step: Some(state.step),
            submitted: state.submitted,
        }
    }

    /// Rebuilds wizard state. A submitted application always lands on the
    /// success step.
    pub fn into_state(self) -> WizardState {
        let mut state = WizardState {
            application_id: self.application_id,
            form_data: self.form_data,
            step: self.step.filter(|s| *s != 0).unwrap_or(FIRST_STEP),
            ..WizardState::default()
        };
        if self.submitted {
            state.step = SUCCESS_STEP;
            state.submitted = true;
        }
        state
    }
}

/// Reads the stored snapshot. Anything unreadable is logged and treated as
/// absent.
pub fn load_snapshot(store: &dyn SnapshotStore) -> Option<WizardSnapshot> {
    let raw = match store.load(SNAPSHOT_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            warn!("Could not read saved application: {e}");
            return None;
        }
    };
    match serde_json::from_str::<WizardSnapshot>(&raw) {
        Ok(snapshot) => {
            debug!("Restored saved application {:?}", snapshot.application_id);
            Some(snapshot)
        }
        Err(e) => {
            warn!("Ignoring malformed saved application: {e}");
            None
        }
    }
}

pub fn save_snapshot(
    store: &dyn SnapshotStore,
    snapshot: &WizardSnapshot,
) -> Result<(), SnapshotError> {
    let json = serde_json::to_string(snapshot)?;
    store.save(SNAPSHOT_KEY, &json)
}

pub fn clear_snapshot(store: &dyn SnapshotStore) -> Result<(), SnapshotError> {
    store.remove(SNAPSHOT_KEY)
}

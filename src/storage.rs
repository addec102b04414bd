//! Single-slot plan persistence over a key-value store.
//!
//! A plan is stored as JSON under [`LAST_PLAN_KEY`]. Saving overwrites the
//! slot; loading a value that no longer parses deletes it so the failure is
//! reported once.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::PlannerError;
use crate::model::Plan;
use crate::traits::KeyValueStore;

pub const LAST_PLAN_KEY: &str = "lastPlan";

/// Persistence adapter for the current plan.
#[derive(Debug)]
pub struct PlanStorage<K> {
    store: K,
}

impl<K: KeyValueStore> PlanStorage<K> {
    pub fn new(store: K) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &K {
        &self.store
    }

    /// Serialize the plan and overwrite the slot.
    pub fn save(&mut self, plan: &Plan) -> Result<(), PlannerError> {
        let json = serde_json::to_string(plan)
            .map_err(|err| PlannerError::StorageWrite(err.to_string()))?;
        self.store.set(LAST_PLAN_KEY, &json)?;
        tracing::info!(routes = plan.routes.len(), bytes = json.len(), "saved plan");
        Ok(())
    }

    /// Read the slot. `Ok(None)` when nothing was saved.
    ///
    /// Only a value that is present but does not parse is deleted; a failed
    /// read is returned as is.
    pub fn load(&mut self) -> Result<Option<Plan>, PlannerError> {
        let Some(raw) = self.store.get(LAST_PLAN_KEY)? else {
            return Ok(None);
        };

        let plan: Plan = match serde_json::from_str(&raw) {
            Ok(plan) => plan,
            Err(err) => return Err(self.discard(err.to_string())),
        };

        tracing::info!(routes = plan.routes.len(), "loaded saved plan");
        Ok(Some(plan))
    }

    fn discard(&mut self, reason: String) -> PlannerError {
        tracing::warn!(reason = %reason, "saved plan is unreadable, removing it");
        if let Err(err) = self.store.remove(LAST_PLAN_KEY) {
            tracing::error!(error = %err, "failed to remove corrupted plan");
        }
        PlannerError::CorruptedStorage(reason)
    }
}

/// One JSON file per key inside a directory.
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

    fn path_for(&self, key: &str) -> Result<PathBuf, PlannerError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(PlannerError::StorageWrite(format!("invalid storage key {key:?}")));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, PlannerError> {
        let path = self.path_for(key)?;
        match fs::read(&path) {
            // Invalid UTF-8 surfaces as a parse failure in the caller.
            Ok(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(PlannerError::StorageRead(format!(
                "failed to read {}: {err}",
                path.display()
            ))),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PlannerError> {
        let path = self.path_for(key)?;
        let write = || -> io::Result<()> {
            fs::create_dir_all(&self.dir)?;
            let tmp_path = path.with_extension("tmp");
            fs::write(&tmp_path, value)?;
            fs::rename(&tmp_path, &path)
        };
        write().map_err(|err| {
            PlannerError::StorageWrite(format!("failed to write {}: {err}", path.display()))
        })
    }

    fn remove(&mut self, key: &str) -> Result<(), PlannerError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(PlannerError::StorageWrite(format!(
                "failed to remove {}: {err}",
                path.display()
            ))),
        }
    }
}

/// Volatile store, used in tests and dry runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, PlannerError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PlannerError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), PlannerError> {
        self.entries.remove(key);
        Ok(())
    }
}

// Persistence of planner state as whole JSON blobs keyed by name.
//
// Every save overwrites the previous value; there are no partial updates.
// A blob that fails to deserialize is logged and treated as missing.
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use thiserror::Error;
use tokio::fs;
use tracing::{debug, warn};

use crate::calendar::MealCalendar;
use crate::pantry::Pantry;
use crate::planner::{MealPlan, PlannerCriteria};
use crate::shopping::ShoppingList;

pub const CALENDAR_KEY: &str = "monthlyMealPlan";
pub const DRAFT_PLAN_KEY: &str = "draftPlan";
pub const LAST_CRITERIA_KEY: &str = "lastCriteria";
pub const PANTRY_KEY: &str = "pantryItems";
pub const SHOPPING_LIST_KEY: &str = "shoppingList";
pub const EXCLUDE_PANTRY_KEY: &str = "excludePantryItems";
pub const SHOPPING_LIST_TITLE_KEY: &str = "shoppingListTitle";

pub const DEFAULT_SHOPPING_LIST_TITLE: &str = "Shopping List";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O failed for {path}: {source}")]
    Io {
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("failed to serialize '{key}': {source}")]
    Serialization {
        source: serde_json::Error,
        key: String,
    },
}

/// Opaque key-value store for JSON blobs.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn load(&self, key: &str) -> Result<Option<String>, StorageError>;
    async fn save(&self, key: &str, blob: &str) -> Result<(), StorageError>;
    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}

/// Stores each key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key);
        match fs::read_to_string(&path).await {
            Ok(blob) => Ok(Some(blob)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io { source, path }),
        }
    }

    /// Atomic write: write to a .tmp file then rename over the target.
    async fn save(&self, key: &str, blob: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| StorageError::Io { source, path: self.dir.clone() })?;
        let path = self.path_for(key);
        let tmp_path = path.with_extension("tmp");
        fs::write(&tmp_path, blob)
            .await
            .map_err(|source| StorageError::Io { source, path: tmp_path.clone() })?;
        fs::rename(&tmp_path, &path)
            .await
            .map_err(|source| StorageError::Io { source, path: path.clone() })?;
        debug!(key, path = %path.display(), "saved state");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Io { source, path }),
        }
    }
}

/// In-process store, used by tests and short-lived sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    blobs: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn blobs(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // a poisoned map is still usable: every write is a whole value
        self.blobs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.blobs().get(key).cloned())
    }

    async fn save(&self, key: &str, blob: &str) -> Result<(), StorageError> {
        self.blobs().insert(key.to_string(), blob.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.blobs().remove(key);
        Ok(())
    }
}

/// Typed access to the planner's persisted state.
pub struct AppStore<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> AppStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn inner(&self) -> &S {
        &self.store
    }

    /// Loads and decodes `key`. Missing or malformed values yield `None`.
    pub async fn load_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        let Some(blob) = self.store.load(key).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&blob) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!(key, error = %e, "stored state is malformed, starting fresh");
                Ok(None)
            }
        }
    }

    pub async fn save_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let blob = serde_json::to_string(value)
            .map_err(|source| StorageError::Serialization { source, key: key.to_string() })?;
        self.store.save(key, &blob).await
    }

    pub async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.store.delete(key).await
    }

    pub async fn calendar(&self) -> Result<MealCalendar, StorageError> {
        Ok(self.load_json(CALENDAR_KEY).await?.unwrap_or_default())
    }

    pub async fn save_calendar(&self, calendar: &MealCalendar) -> Result<(), StorageError> {
        self.save_json(CALENDAR_KEY, calendar).await
    }

    pub async fn clear_calendar(&self) -> Result<(), StorageError> {
        self.delete(CALENDAR_KEY).await
    }

    pub async fn draft_plan(&self) -> Result<MealPlan, StorageError> {
        Ok(self.load_json(DRAFT_PLAN_KEY).await?.unwrap_or_default())
    }

    pub async fn save_draft_plan(&self, plan: &MealPlan) -> Result<(), StorageError> {
        if plan.is_empty() {
            return self.delete(DRAFT_PLAN_KEY).await;
        }
        self.save_json(DRAFT_PLAN_KEY, plan).await
    }

    pub async fn last_criteria(&self) -> Result<Option<PlannerCriteria>, StorageError> {
        self.load_json(LAST_CRITERIA_KEY).await
    }

    pub async fn save_last_criteria(&self, criteria: &PlannerCriteria) -> Result<(), StorageError> {
        self.save_json(LAST_CRITERIA_KEY, criteria).await
    }

    pub async fn pantry(&self) -> Result<Pantry, StorageError> {
        Ok(self.load_json(PANTRY_KEY).await?.unwrap_or_default())
    }

    pub async fn save_pantry(&self, pantry: &Pantry) -> Result<(), StorageError> {
        self.save_json(PANTRY_KEY, pantry).await
    }

    pub async fn shopping_list(&self) -> Result<ShoppingList, StorageError> {
        Ok(self.load_json(SHOPPING_LIST_KEY).await?.unwrap_or_default())
    }

    pub async fn save_shopping_list(&self, list: &ShoppingList) -> Result<(), StorageError> {
        self.save_json(SHOPPING_LIST_KEY, list).await
    }

    pub async fn clear_shopping_list(&self) -> Result<(), StorageError> {
        self.delete(SHOPPING_LIST_KEY).await
    }

    /// Defaults to true when never set.
    pub async fn exclude_pantry(&self) -> Result<bool, StorageError> {
        Ok(self.load_json(EXCLUDE_PANTRY_KEY).await?.unwrap_or(true))
    }

    pub async fn save_exclude_pantry(&self, exclude: bool) -> Result<(), StorageError> {
        self.save_json(EXCLUDE_PANTRY_KEY, &exclude).await
    }

    pub async fn shopping_list_title(&self) -> Result<String, StorageError> {
        Ok(self
            .load_json(SHOPPING_LIST_TITLE_KEY)
            .await?
            .unwrap_or_else(|| DEFAULT_SHOPPING_LIST_TITLE.to_string()))
    }

    pub async fn save_shopping_list_title(&self, title: &str) -> Result<(), StorageError> {
        self.save_json(SHOPPING_LIST_TITLE_KEY, title).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_file_store_round_trip_and_delete() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("state"));

        assert_eq!(store.load("pantryItems").await.unwrap(), None);
        store.save("pantryItems", "[]").await.unwrap();
        assert_eq!(store.load("pantryItems").await.unwrap(), Some("[]".to_string()));
        assert!(!dir.path().join("state/pantryItems.tmp").exists());

        store.delete("pantryItems").await.unwrap();
        store.delete("pantryItems").await.unwrap();
        assert_eq!(store.load("pantryItems").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_malformed_state_loads_as_default() {
        let store = AppStore::new(MemoryStore::new());
        store.inner().save(CALENDAR_KEY, "{ corrupted").await.unwrap();
        store.inner().save(EXCLUDE_PANTRY_KEY, "\"yes\"").await.unwrap();

        assert!(store.calendar().await.unwrap().is_empty());
        assert!(store.exclude_pantry().await.unwrap());
    }

    #[tokio::test]
    async fn test_preferences_defaults_and_overwrites() {
        let store = AppStore::new(MemoryStore::new());
        assert_eq!(store.shopping_list_title().await.unwrap(), DEFAULT_SHOPPING_LIST_TITLE);
        assert!(store.exclude_pantry().await.unwrap());

        store.save_shopping_list_title("Saturday market").await.unwrap();
        store.save_exclude_pantry(false).await.unwrap();
        assert_eq!(store.shopping_list_title().await.unwrap(), "Saturday market");
        assert!(!store.exclude_pantry().await.unwrap());
    }

    #[tokio::test]
    async fn test_empty_draft_plan_is_deleted() {
        let store = AppStore::new(MemoryStore::new());
        store.save_draft_plan(&MealPlan::new()).await.unwrap();
        assert_eq!(store.inner().load(DRAFT_PLAN_KEY).await.unwrap(), None);
    }
}

//! Local Storage
//!
//! A small JSON key/value file standing in for the browser's local
//! storage. The only key the application uses is [`TIMELINE_ID_KEY`].

use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Key under which the last-known timeline id is stored
pub const TIMELINE_ID_KEY: &str = "mjtimeline_timeline_id";

/// File name inside the data directory
pub const STORE_FILE_NAME: &str = "local_storage.json";

/// Errors that can occur reading or writing the store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt store file {path:?}: {error}")]
    Corrupt { path: PathBuf, error: String },
}

/// File-backed key/value store
#[derive(Debug, Clone)]
pub struct TimelineStore {
    path: PathBuf,
}

impl TimelineStore {
    /// Store living at `<data_dir>/local_storage.json`
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            path: data_dir.as_ref().join(STORE_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Last-known timeline id, if any
    pub async fn load(&self) -> Result<Option<String>, StoreError> {
        self.get(TIMELINE_ID_KEY).await
    }

    /// Remember `timeline_id` for the next session
    pub async fn save(&self, timeline_id: &str) -> Result<(), StoreError> {
        self.set(TIMELINE_ID_KEY, timeline_id).await
    }

    /// Forget the persisted timeline id
    pub async fn clear(&self) -> Result<(), StoreError> {
        self.remove(TIMELINE_ID_KEY).await
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let map = self.read_map().await?;
        Ok(map
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string))
    }

    pub async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut map = self.read_map().await?;
        map.insert(key.to_string(), Value::String(value.to_string()));
        self.write_map(&map).await
    }

    pub async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut map = self.read_map().await?;
        if map.remove(key).is_some() {
            self.write_map(&map).await?;
        }
        Ok(())
    }

    async fn read_map(&self) -> Result<Map<String, Value>, StoreError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(e.into()),
        };

        if content.trim().is_empty() {
            return Ok(Map::new());
        }

        serde_json::from_str(&content).map_err(|e| StoreError::Corrupt {
            path: self.path.clone(),
            error: e.to_string(),
        })
    }

    async fn write_map(&self, map: &Map<String, Value>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(map).map_err(|e| StoreError::Corrupt {
            path: self.path.clone(),
            error: e.to_string(),
        })?;

        // Write-then-rename so a crash never leaves a half-written file
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, content).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        Ok(())
    }
}

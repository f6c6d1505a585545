use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::{AppError, AppResult};
use crate::models::Mode;

/// The bundle handed from the upload flow to the results view.
///
/// Every field is optional on read so a partially written or older record
/// still renders.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedRecord {
    #[serde(default)]
    pub doc_name: Option<String>,
    #[serde(default)]
    pub doc_size: Option<String>,
    #[serde(default)]
    pub doc_text: Option<String>,
    #[serde(default)]
    pub doc_summary: Option<String>,
    #[serde(default)]
    pub summary_mode: Option<Mode>,
    /// `data:<mime>;base64,<payload>` of the original bytes.
    #[serde(default)]
    pub doc_file: Option<String>,
    #[serde(default)]
    pub saved_at: Option<DateTime<Utc>>,
}

/// Durable client-side storage holding at most one record.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Replaces any previous record in full.
    async fn save(&self, record: &PersistedRecord) -> AppResult<()>;

    async fn load(&self) -> AppResult<Option<PersistedRecord>>;

    async fn clear(&self) -> AppResult<()>;
}

#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    record: RwLock<Option<PersistedRecord>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn save(&self, record: &PersistedRecord) -> AppResult<()> {
        *self.record.write().await = Some(record.clone());
        Ok(())
    }

    async fn load(&self) -> AppResult<Option<PersistedRecord>> {
        Ok(self.record.read().await.clone())
    }

    async fn clear(&self) -> AppResult<()> {
        *self.record.write().await = None;
        Ok(())
    }
}

/// Stores the record as one JSON file. Writes go to a sibling temp file that
/// is then renamed over the target.
#[derive(Debug, Clone)]
pub struct JsonFileRecordStore {
    path: PathBuf,
}

impl JsonFileRecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "record.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl RecordStore for JsonFileRecordStore {
    async fn save(&self, record: &PersistedRecord) -> AppResult<()> {
        let json = serde_json::to_vec_pretty(record)
            .map_err(|e| AppError::storage(format!("Failed to encode record: {}", e)))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let temp = self.temp_path();
        tokio::fs::write(&temp, &json).await?;
        tokio::fs::rename(&temp, &self.path).await?;

        debug!(path = %self.path.display(), bytes = json.len(), "Record persisted");
        Ok(())
    }

    async fn load(&self) -> AppResult<Option<PersistedRecord>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_slice(&bytes) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Persisted record is unreadable");
                Err(AppError::storage(format!("Corrupt record: {}", e)))
            }
        }
    }

    async fn clear(&self) -> AppResult<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

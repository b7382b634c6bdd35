use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::storage::CaseStore;

/// File-based JSON store. Each record is stored as a separate JSON file
/// named after its key.
pub struct JsonCaseStore {
    base_dir: PathBuf,
    lock: RwLock<()>,
}

impl JsonCaseStore {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
            lock: RwLock::new(()),
        }
    }

    fn record_path(&self, key: &str) -> PathBuf {
        self.base_dir.join(format!("{}.json", key))
    }

    async fn write_record(&self, key: &str, doc: &Value) -> Result<()> {
        tokio::fs::create_dir_all(&self.base_dir).await?;

        let path = self.record_path(key);
        let tmp_path = path.with_extension("json.tmp");

        let data = serde_json::to_string_pretty(doc)?;
        tokio::fs::write(&tmp_path, &data).await?;
        tokio::fs::rename(&tmp_path, &path).await?;

        Ok(())
    }

    async fn read_record(&self, key: &str) -> Result<Option<Value>> {
        let path = self.record_path(key);
        if !path.exists() {
            return Ok(None);
        }
        let data = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("failed to read record file: {}", path.display()))?;
        let doc = serde_json::from_str(&data)
            .with_context(|| format!("failed to parse record: {}", key))?;
        Ok(Some(doc))
    }
}

#[async_trait]
impl CaseStore for JsonCaseStore {
    async fn read(&self, key: &str) -> Result<Option<Value>> {
        let _lock = self.lock.read().await;
        self.read_record(key).await
    }

    async fn write(&self, key: &str, doc: &Value) -> Result<()> {
        let _lock = self.lock.write().await;
        self.write_record(key, doc).await
    }

    async fn incr_counter(&self, key: &str) -> Result<u64> {
        let _lock = self.lock.write().await;

        let next = match self.read_record(key).await? {
            Some(doc) => doc.get("value").and_then(Value::as_u64).unwrap_or(0) + 1,
            None => 1,
        };
        self.write_record(key, &serde_json::json!({ "value": next }))
            .await?;
        Ok(next)
    }
}

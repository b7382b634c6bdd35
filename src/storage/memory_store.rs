use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use crate::storage::CaseStore;

/// In-memory store. Holds records only for the lifetime of the store
/// instance; useful for tests and embedded runs.
pub struct MemoryCaseStore {
    records: Mutex<HashMap<String, Value>>,
    counters: Mutex<HashMap<String, u64>>,
}

impl MemoryCaseStore {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            counters: Mutex::new(HashMap::new()),
        }
    }

    /// Snapshot of all record keys, in sorted order.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.records.lock().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl Default for MemoryCaseStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CaseStore for MemoryCaseStore {
    async fn read(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.records.lock().unwrap().get(key).cloned())
    }

    async fn write(&self, key: &str, doc: &Value) -> Result<()> {
        self.records
            .lock()
            .unwrap()
            .insert(key.to_string(), doc.clone());
        Ok(())
    }

    async fn incr_counter(&self, key: &str) -> Result<u64> {
        let mut counters = self.counters.lock().unwrap();
        let counter = counters.entry(key.to_string()).or_insert(0);
        *counter += 1;
        Ok(*counter)
    }
}

pub mod json_store;
pub mod memory_store;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Trait for the document store case state is persisted through.
///
/// Keys are namespaced strings built by [`keys`]; records are JSON
/// documents. Counters back the append-only audit log sequence.
#[async_trait]
pub trait CaseStore: Send + Sync {
    /// Read a record, `None` when absent.
    async fn read(&self, key: &str) -> Result<Option<Value>>;

    /// Write (create or replace) a record.
    async fn write(&self, key: &str, doc: &Value) -> Result<()>;

    /// Increment and return a monotonically increasing counter.
    async fn incr_counter(&self, key: &str) -> Result<u64>;
}

/// Key scheme: a record-kind prefix, a separator, and the case id. Audit
/// records additionally carry a zero-padded sequence and the component
/// name.
pub mod keys {
    pub const SEP: &str = "-";

    pub fn journey(case_id: &str) -> String {
        format!("caseflow_journey{}{}", SEP, case_id)
    }

    pub fn journey_sla(case_id: &str) -> String {
        format!("caseflow_journey_sla{}{}", SEP, case_id)
    }

    pub fn process_info(case_id: &str) -> String {
        format!("caseflow_process_info{}{}", SEP, case_id)
    }

    pub fn audit_log(case_id: &str, seq: u64, comp_name: &str) -> String {
        format!(
            "caseflow_audit_log{}{}_{:05}_{}",
            SEP, case_id, seq, comp_name
        )
    }

    pub fn audit_counter(case_id: &str) -> String {
        format!("caseflow_audit_log_counter{}{}", SEP, case_id)
    }
}

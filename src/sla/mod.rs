use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::engine::error::FlowError;
use crate::engine::types::ProcessContext;

/// When a milestone obligation is set up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetupOn {
    CaseStart,
    WorkBasketEntry,
    WorkBasketExit,
}

impl std::fmt::Display for SetupOn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SetupOn::CaseStart => "case_start",
            SetupOn::WorkBasketEntry => "work_basket_entry",
            SetupOn::WorkBasketExit => "work_basket_exit",
        };
        write!(f, "{}", s)
    }
}

/// One time-bound obligation declared in a case's SLA schedule. Fields
/// beyond the ones the engine routes on are carried through to the queue
/// manager unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Milestone {
    pub name: String,
    pub setup_on: SetupOn,
    #[serde(default)]
    pub work_basket_name: String,
    #[serde(flatten)]
    pub userdata: serde_json::Map<String, serde_json::Value>,
}

/// Case-scoped SLA schedule, independent of the process definition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlaSchedule {
    #[serde(default)]
    pub milestones: Vec<Milestone>,
}

impl SlaSchedule {
    pub fn from_value(doc: &serde_json::Value) -> Result<Self, FlowError> {
        serde_json::from_value(doc.clone())
            .map_err(|e| FlowError::Definition(format!("malformed sla schedule: {}", e)))
    }

    /// Milestones set up when the case starts.
    pub fn case_start_milestones(&self) -> Vec<Milestone> {
        self.milestones
            .iter()
            .filter(|m| m.setup_on == SetupOn::CaseStart)
            .cloned()
            .collect()
    }

    /// Milestones set up on the given transition of the given work basket.
    pub fn work_basket_milestones(&self, setup_on: SetupOn, work_basket: &str) -> Vec<Milestone> {
        self.milestones
            .iter()
            .filter(|m| m.setup_on == setup_on && m.work_basket_name == work_basket)
            .cloned()
            .collect()
    }
}

/// External queue backend holding milestone obligations for a case.
#[async_trait]
pub trait SlaQueueManager: Send + Sync {
    /// Enqueue a set of milestones for the case.
    async fn enqueue(&self, pc: &ProcessContext, milestones: &[Milestone]) -> Result<()>;

    /// Dequeue all milestones tied to the given work basket.
    async fn dequeue(&self, pc: &ProcessContext, work_basket: &str) -> Result<()>;

    /// Dequeue every outstanding milestone for the case.
    async fn dequeue_all(&self, pc: &ProcessContext) -> Result<()>;
}

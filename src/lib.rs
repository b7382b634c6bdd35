//! caseflow — durable case orchestration.
//!
//! Executes long-running, branching, pausable workflows ("cases") defined
//! declaratively as a graph of steps, routes, joins and pauses. Progress
//! is persisted through a narrow document-store interface so execution
//! can suspend and resume across process restarts, including recovery
//! from abrupt crashes. Business logic, event handling and the SLA queue
//! backend are supplied by the host application through the traits in
//! [`components`], [`engine::events`], [`sla`] and [`storage`].

pub mod components;
pub mod engine;
pub mod sla;
pub mod storage;

pub use engine::definition::ProcessDefinition;
pub use engine::error::FlowError;
pub use engine::events::EventHandler;
pub use engine::executor::CaseEngine;
pub use engine::types::{
    ErrorTuple, EventType, ExecPath, ExecPathStatus, ProcessContext, ProcessInfo, ProcessVariable,
    ProcessVariableValue, UnitResponseType,
};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::engine::definition::UnitKind;
use crate::engine::error::FlowError;

/// Name of the root execution path of every case.
pub const ROOT_EXEC_PATH: &str = ".";

/// Status of one execution path within a case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecPathStatus {
    Started,
    Completed,
}

impl std::fmt::Display for ExecPathStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecPathStatus::Started => write!(f, "started"),
            ExecPathStatus::Completed => write!(f, "completed"),
        }
    }
}

/// Outcome class a unit execution reports back to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitResponseType {
    /// Advance immediately to the next unit.
    OkProceed,
    /// Stop and wait in a work basket.
    OkPend,
    /// Stop and wait, with the pend attributable to route-exit bookkeeping.
    /// SLA commitment for the work basket is deferred until the outcome is
    /// no longer provisional.
    OkPendEor,
    /// Stopped on an unrecoverable step error, parked in a work basket.
    ErrorPend,
}

impl std::fmt::Display for UnitResponseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnitResponseType::OkProceed => write!(f, "ok_proceed"),
            UnitResponseType::OkPend => write!(f, "ok_pend"),
            UnitResponseType::OkPendEor => write!(f, "ok_pend_eor"),
            UnitResponseType::ErrorPend => write!(f, "error_pend"),
        }
    }
}

/// Lifecycle events raised toward the host application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    OnProcessStart,
    OnProcessResume,
    OnProcessPend,
    OnProcessComplete,
    OnPersist,
    OnTicketRaised,
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EventType::OnProcessStart => "ON_PROCESS_START",
            EventType::OnProcessResume => "ON_PROCESS_RESUME",
            EventType::OnProcessPend => "ON_PROCESS_PEND",
            EventType::OnProcessComplete => "ON_PROCESS_COMPLETE",
            EventType::OnPersist => "ON_PERSIST",
            EventType::OnTicketRaised => "ON_TICKET_RAISED",
        };
        write!(f, "{}", s)
    }
}

/// Error reported by a business component, parked on an execution path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorTuple {
    pub code: String,
    pub message: String,
    #[serde(default)]
    pub details: String,
    #[serde(default)]
    pub is_retryable: bool,
}

/// Typed value of a case-wide process variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessVariableValue {
    Boolean(bool),
    Long(i64),
    Integer(i32),
    Text(String),
}

impl ProcessVariableValue {
    /// Type tag used in persisted documents.
    pub fn kind(&self) -> &'static str {
        match self {
            ProcessVariableValue::Boolean(_) => "boolean",
            ProcessVariableValue::Long(_) => "long",
            ProcessVariableValue::Integer(_) => "integer",
            ProcessVariableValue::Text(_) => "string",
        }
    }

    /// Parse a persisted `{type, value}` pair back into a typed value.
    pub fn parse(kind: &str, raw: &str) -> Result<Self, FlowError> {
        let v = match kind.to_ascii_lowercase().as_str() {
            "boolean" => ProcessVariableValue::Boolean(raw.parse().map_err(|_| {
                FlowError::Definition(format!("invalid boolean variable value '{}'", raw))
            })?),
            "long" => ProcessVariableValue::Long(raw.parse().map_err(|_| {
                FlowError::Definition(format!("invalid long variable value '{}'", raw))
            })?),
            "integer" => ProcessVariableValue::Integer(raw.parse().map_err(|_| {
                FlowError::Definition(format!("invalid integer variable value '{}'", raw))
            })?),
            "string" => ProcessVariableValue::Text(raw.to_string()),
            other => {
                return Err(FlowError::Definition(format!(
                    "unknown process variable type '{}'",
                    other
                )));
            }
        };
        Ok(v)
    }

    /// String form used in persisted documents.
    pub fn to_raw(&self) -> String {
        match self {
            ProcessVariableValue::Boolean(b) => b.to_string(),
            ProcessVariableValue::Long(n) => n.to_string(),
            ProcessVariableValue::Integer(n) => n.to_string(),
            ProcessVariableValue::Text(s) => s.clone(),
        }
    }
}

/// A named, typed value shared by all execution paths of a case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessVariable {
    pub name: String,
    pub value: ProcessVariableValue,
}

impl ProcessVariable {
    pub fn new(name: impl Into<String>, value: ProcessVariableValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// One thread of control within a case's execution graph.
///
/// The identifier is hierarchical: the root path is `"."` and a child
/// created for branch `b` of path `p` is named `p` + `b` + `"."`. Fork
/// depth is therefore the count of `'.'` separators, strictly increasing
/// with nesting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecPath {
    pub name: String,
    pub status: ExecPathStatus,
    /// Name of the unit this path is currently at.
    pub step: String,
    /// Outcome of the last unit executed on this path. `None` means not
    /// yet observed (fresh path, or a partial persisted record awaiting
    /// recovery).
    pub unit_response_type: Option<UnitResponseType>,
    pub pend_work_basket: String,
    pub prev_pend_work_basket: String,
    /// Work basket whose SLA milestones are not yet committed because the
    /// path's outcome was still `OK_PEND_EOR` and could change.
    pub tbc_sla_work_basket: String,
    pub error: Option<ErrorTuple>,
}

impl ExecPath {
    pub fn new(name: impl Into<String>, step: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: ExecPathStatus::Started,
            step: step.into(),
            unit_response_type: None,
            pend_work_basket: String::new(),
            prev_pend_work_basket: String::new(),
            tbc_sla_work_basket: String::new(),
            error: None,
        }
    }

    /// Fork nesting depth of this path.
    pub fn depth(&self) -> usize {
        exec_path_depth(&self.name)
    }

    /// Identifier of a child path forked from this one for `branch`.
    pub fn child_name(&self, branch: &str) -> String {
        format!("{}{}.", self.name, branch)
    }

    /// Identifier of the path this one was forked from, if any.
    pub fn parent_name(&self) -> Option<String> {
        parent_exec_path(&self.name)
    }
}

/// Fork nesting depth of an execution path identifier.
pub fn exec_path_depth(name: &str) -> usize {
    name.matches('.').count()
}

/// Parent identifier of an execution path, `None` for the root.
pub fn parent_exec_path(name: &str) -> Option<String> {
    let trimmed = name.strip_suffix('.')?;
    let cut = trimmed.rfind('.')?;
    Some(trimmed[..=cut].to_string())
}

/// Unit recorded as the last one executed, for forensics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LastUnit {
    pub name: String,
    pub kind: UnitKind,
}

/// The full mutable state of one case, owned by the engine for the
/// duration of one start/resume call and serialized out between calls.
#[derive(Debug)]
pub struct ProcessInfo {
    pub case_id: String,
    pub exec_paths: BTreeMap<String, ExecPath>,
    /// The execution path the next resume call will act on. Empty until
    /// the case first pends.
    pub pend_exec_path: String,
    /// True while a resumed case is still at the step it pended on,
    /// false once any path advances.
    pub is_pend_at_same_step: bool,
    pub is_complete: bool,
    /// Name of the currently raised ticket, empty when none.
    pub ticket: String,
    pub process_variables: BTreeMap<String, ProcessVariable>,
    pub last_unit: Option<LastUnit>,
    /// Held around `ON_PERSIST` / `ON_TICKET_RAISED` handler calls; the
    /// external handler must not observe case state mid-write.
    pub lock: Mutex<()>,
}

impl ProcessInfo {
    pub fn new(case_id: impl Into<String>) -> Self {
        Self {
            case_id: case_id.into(),
            exec_paths: BTreeMap::new(),
            pend_exec_path: String::new(),
            is_pend_at_same_step: false,
            is_complete: false,
            ticket: String::new(),
            process_variables: BTreeMap::new(),
            last_unit: None,
            lock: Mutex::new(()),
        }
    }

    pub fn exec_path(&self, name: &str) -> Option<&ExecPath> {
        self.exec_paths.get(name)
    }

    /// Insert or replace an execution path under its own identifier.
    pub fn set_exec_path(&mut self, ep: ExecPath) {
        self.exec_paths.insert(ep.name.clone(), ep);
    }

    pub fn set_process_variable(&mut self, pv: ProcessVariable) {
        self.process_variables.insert(pv.name.clone(), pv);
    }

    pub fn process_variable(&self, name: &str) -> Option<&ProcessVariable> {
        self.process_variables.get(name)
    }

    /// Snapshot of the process variables, for handler contexts.
    pub fn variables_snapshot(&self) -> Vec<ProcessVariable> {
        self.process_variables.values().cloned().collect()
    }

    /// Serialize to the persisted process-info document.
    pub fn to_document(&self) -> serde_json::Value {
        let body = ProcessInfoBody {
            pend_exec_path: self.pend_exec_path.clone(),
            is_complete: self.is_complete,
            ticket: self.ticket.clone(),
            last_unit: self.last_unit.clone(),
            exec_paths: self
                .exec_paths
                .values()
                .map(|ep| ExecPathDoc {
                    name: ep.name.clone(),
                    status: ep.status,
                    step: ep.step.clone(),
                    unit_response_type: ep.unit_response_type,
                    pend_workbasket: ep.pend_work_basket.clone(),
                    prev_pend_workbasket: ep.prev_pend_work_basket.clone(),
                    tbc_sla_workbasket: ep.tbc_sla_work_basket.clone(),
                    error: ep.error.clone(),
                })
                .collect(),
            process_variables: self
                .process_variables
                .values()
                .map(|pv| ProcessVariableDoc {
                    name: pv.name.clone(),
                    kind: pv.value.kind().to_string(),
                    value: pv.value.to_raw(),
                })
                .collect(),
        };
        serde_json::to_value(ProcessInfoDoc { process_info: body })
            .unwrap_or(serde_json::Value::Null)
    }

    /// Rebuild case state from a persisted process-info document.
    ///
    /// A missing `unit_response_type` on an execution path is tolerated
    /// (legacy or partial record); it is repaired by recovery.
    pub fn from_document(case_id: &str, doc: &serde_json::Value) -> Result<Self, FlowError> {
        let parsed: ProcessInfoDoc = serde_json::from_value(doc.clone()).map_err(|e| {
            FlowError::Internal(format!(
                "malformed process info document for case '{}': {}",
                case_id, e
            ))
        })?;
        let body = parsed.process_info;

        let mut pi = ProcessInfo::new(case_id);
        pi.pend_exec_path = body.pend_exec_path;
        pi.is_complete = body.is_complete;
        pi.ticket = body.ticket;
        pi.last_unit = body.last_unit;
        for doc in body.exec_paths {
            let mut ep = ExecPath::new(doc.name, doc.step);
            ep.status = doc.status;
            ep.unit_response_type = doc.unit_response_type;
            ep.pend_work_basket = doc.pend_workbasket;
            ep.prev_pend_work_basket = doc.prev_pend_workbasket;
            ep.tbc_sla_work_basket = doc.tbc_sla_workbasket;
            ep.error = doc.error;
            pi.set_exec_path(ep);
        }
        for doc in body.process_variables {
            let value = ProcessVariableValue::parse(&doc.kind, &doc.value)?;
            pi.set_process_variable(ProcessVariable::new(doc.name, value));
        }
        Ok(pi)
    }
}

#[derive(Serialize, Deserialize)]
struct ProcessInfoDoc {
    process_info: ProcessInfoBody,
}

#[derive(Serialize, Deserialize)]
struct ProcessInfoBody {
    #[serde(default)]
    pend_exec_path: String,
    #[serde(default)]
    is_complete: bool,
    #[serde(default)]
    ticket: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_unit: Option<LastUnit>,
    #[serde(default)]
    exec_paths: Vec<ExecPathDoc>,
    #[serde(default)]
    process_variables: Vec<ProcessVariableDoc>,
}

#[derive(Serialize, Deserialize)]
struct ExecPathDoc {
    name: String,
    status: ExecPathStatus,
    step: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    unit_response_type: Option<UnitResponseType>,
    #[serde(default)]
    pend_workbasket: String,
    #[serde(default)]
    prev_pend_workbasket: String,
    #[serde(default)]
    tbc_sla_workbasket: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<ErrorTuple>,
}

#[derive(Serialize, Deserialize)]
struct ProcessVariableDoc {
    name: String,
    #[serde(rename = "type")]
    kind: String,
    value: String,
}

/// Immutable snapshot handed to event handlers, SLA queue managers and
/// business components.
#[derive(Debug, Clone)]
pub struct ProcessContext {
    pub case_id: String,
    pub process_name: String,
    pub exec_path_name: String,
    /// Name of the unit the context was captured at, empty for
    /// process-level events.
    pub unit_name: String,
    pub unit_kind: Option<UnitKind>,
    pub comp_name: String,
    pub user_data: String,
    pub pend_work_basket: String,
    pub error: Option<ErrorTuple>,
    pub ticket: String,
    pub process_variables: Vec<ProcessVariable>,
}

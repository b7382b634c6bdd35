//! Shared scripted fakes for the collaborator interfaces.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use anyhow::{Result, bail};
use async_trait::async_trait;

use caseflow::components::{
    InvocationContext, RouteHandler, RouteResponse, StepHandler, StepResponse,
};
use caseflow::engine::events::EventHandler;
use caseflow::engine::types::{EventType, ProcessContext};
use caseflow::sla::{Milestone, SlaQueueManager};

/// Step handler replaying a scripted sequence of responses, one per
/// invocation, across start/resume calls.
pub struct ScriptedStep {
    responses: Mutex<VecDeque<StepResponse>>,
}

impl ScriptedStep {
    pub fn new(responses: Vec<StepResponse>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
        })
    }
}

#[async_trait]
impl StepHandler for ScriptedStep {
    async fn execute(&self, ctx: &InvocationContext) -> Result<StepResponse> {
        match self.responses.lock().unwrap().pop_front() {
            Some(resp) => Ok(resp),
            None => bail!("script exhausted for component '{}'", ctx.component),
        }
    }
}

/// Step handler that always proceeds.
pub struct AlwaysProceed;

#[async_trait]
impl StepHandler for AlwaysProceed {
    async fn execute(&self, _ctx: &InvocationContext) -> Result<StepResponse> {
        Ok(StepResponse::proceed())
    }
}

/// Step handler that always fails.
pub struct AlwaysFails;

#[async_trait]
impl StepHandler for AlwaysFails {
    async fn execute(&self, _ctx: &InvocationContext) -> Result<StepResponse> {
        bail!("downstream system unavailable")
    }
}

/// Route handler replaying a scripted sequence of responses.
pub struct ScriptedRoute {
    responses: Mutex<VecDeque<RouteResponse>>,
}

impl ScriptedRoute {
    pub fn new(responses: Vec<RouteResponse>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
        })
    }
}

#[async_trait]
impl RouteHandler for ScriptedRoute {
    async fn choose(&self, ctx: &InvocationContext) -> Result<RouteResponse> {
        match self.responses.lock().unwrap().pop_front() {
            Some(resp) => Ok(resp),
            None => bail!("script exhausted for component '{}'", ctx.component),
        }
    }
}

/// Event handler recording every event it sees, optionally failing on one
/// event type.
pub struct RecordingHandler {
    pub events: Mutex<Vec<EventType>>,
    fail_on: Option<EventType>,
}

impl RecordingHandler {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            events: Mutex::new(Vec::new()),
            fail_on: None,
        })
    }

    pub fn failing_on(event: EventType) -> Arc<Self> {
        Arc::new(Self {
            events: Mutex::new(Vec::new()),
            fail_on: Some(event),
        })
    }

    pub fn seen(&self) -> Vec<EventType> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventHandler for RecordingHandler {
    async fn invoke(&self, event: EventType, _pc: &ProcessContext) -> Result<()> {
        self.events.lock().unwrap().push(event);
        if self.fail_on == Some(event) {
            bail!("handler rejected {}", event);
        }
        Ok(())
    }
}

/// One observed SLA queue operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlaOp {
    /// Milestone names enqueued, in order.
    Enqueue(Vec<String>),
    Dequeue(String),
    DequeueAll,
}

/// SLA queue manager recording operations instead of queueing.
pub struct RecordingSlaQueue {
    pub ops: Mutex<Vec<SlaOp>>,
}

impl RecordingSlaQueue {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            ops: Mutex::new(Vec::new()),
        })
    }

    pub fn seen(&self) -> Vec<SlaOp> {
        self.ops.lock().unwrap().clone()
    }
}

#[async_trait]
impl SlaQueueManager for RecordingSlaQueue {
    async fn enqueue(&self, _pc: &ProcessContext, milestones: &[Milestone]) -> Result<()> {
        let names = milestones.iter().map(|m| m.name.clone()).collect();
        self.ops.lock().unwrap().push(SlaOp::Enqueue(names));
        Ok(())
    }

    async fn dequeue(&self, _pc: &ProcessContext, work_basket: &str) -> Result<()> {
        self.ops
            .lock()
            .unwrap()
            .push(SlaOp::Dequeue(work_basket.to_string()));
        Ok(())
    }

    async fn dequeue_all(&self, _pc: &ProcessContext) -> Result<()> {
        self.ops.lock().unwrap().push(SlaOp::DequeueAll);
        Ok(())
    }
}

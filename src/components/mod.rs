use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::engine::types::{ErrorTuple, ProcessVariable, UnitResponseType};

/// Execution context handed to a business component.
#[derive(Debug, Clone)]
pub struct InvocationContext {
    pub case_id: String,
    pub process_name: String,
    pub unit_name: String,
    pub component: String,
    pub user_data: String,
    pub exec_path_name: String,
    pub process_variables: Vec<ProcessVariable>,
}

/// What a step component tells the engine after running.
#[derive(Debug, Clone)]
pub struct StepResponse {
    pub response_type: UnitResponseType,
    pub work_basket: String,
    pub error: Option<ErrorTuple>,
    /// Ticket raised by the component, empty when none.
    pub ticket: String,
}

impl StepResponse {
    pub fn proceed() -> Self {
        Self {
            response_type: UnitResponseType::OkProceed,
            work_basket: String::new(),
            error: None,
            ticket: String::new(),
        }
    }

    pub fn pend(work_basket: impl Into<String>) -> Self {
        Self {
            response_type: UnitResponseType::OkPend,
            work_basket: work_basket.into(),
            error: None,
            ticket: String::new(),
        }
    }

    pub fn pend_eor(work_basket: impl Into<String>) -> Self {
        Self {
            response_type: UnitResponseType::OkPendEor,
            work_basket: work_basket.into(),
            error: None,
            ticket: String::new(),
        }
    }

    pub fn error_pend(work_basket: impl Into<String>, error: ErrorTuple) -> Self {
        Self {
            response_type: UnitResponseType::ErrorPend,
            work_basket: work_basket.into(),
            error: Some(error),
            ticket: String::new(),
        }
    }

    pub fn with_ticket(mut self, ticket: impl Into<String>) -> Self {
        self.ticket = ticket.into();
        self
    }
}

/// What a route component tells the engine after choosing.
#[derive(Debug, Clone)]
pub struct RouteResponse {
    pub response_type: UnitResponseType,
    /// Branches to follow: exactly one for a sequential route, one or
    /// more for a parallel route.
    pub branches: Vec<String>,
    pub work_basket: String,
    pub error: Option<ErrorTuple>,
}

impl RouteResponse {
    pub fn take(branches: Vec<String>) -> Self {
        Self {
            response_type: UnitResponseType::OkProceed,
            branches,
            work_basket: String::new(),
            error: None,
        }
    }

    pub fn pend(work_basket: impl Into<String>) -> Self {
        Self {
            response_type: UnitResponseType::OkPend,
            branches: Vec::new(),
            work_basket: work_basket.into(),
            error: None,
        }
    }

    pub fn pend_eor(work_basket: impl Into<String>) -> Self {
        Self {
            response_type: UnitResponseType::OkPendEor,
            branches: Vec::new(),
            work_basket: work_basket.into(),
            error: None,
        }
    }

    pub fn error_pend(work_basket: impl Into<String>, error: ErrorTuple) -> Self {
        Self {
            response_type: UnitResponseType::ErrorPend,
            branches: Vec::new(),
            work_basket: work_basket.into(),
            error: Some(error),
        }
    }
}

/// Business logic behind a step unit.
#[async_trait]
pub trait StepHandler: Send + Sync {
    async fn execute(&self, ctx: &InvocationContext) -> Result<StepResponse>;
}

/// Business logic behind a route unit.
#[async_trait]
pub trait RouteHandler: Send + Sync {
    async fn choose(&self, ctx: &InvocationContext) -> Result<RouteResponse>;
}

/// Registry of business components, keyed by the component identifier
/// referenced from the journey definition.
pub struct ComponentRegistry {
    steps: HashMap<String, Arc<dyn StepHandler>>,
    routes: HashMap<String, Arc<dyn RouteHandler>>,
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self {
            steps: HashMap::new(),
            routes: HashMap::new(),
        }
    }

    pub fn register_step(&mut self, component: impl Into<String>, handler: Arc<dyn StepHandler>) {
        self.steps.insert(component.into(), handler);
    }

    pub fn register_route(&mut self, component: impl Into<String>, handler: Arc<dyn RouteHandler>) {
        self.routes.insert(component.into(), handler);
    }

    pub fn step(&self, component: &str) -> Option<Arc<dyn StepHandler>> {
        self.steps.get(component).cloned()
    }

    pub fn route(&self, component: &str) -> Option<Arc<dyn RouteHandler>> {
        self.routes.get(component).cloned()
    }
}

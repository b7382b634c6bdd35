use std::collections::VecDeque;
use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use crate::components::{ComponentRegistry, InvocationContext, RouteResponse, StepResponse};
use crate::engine::definition::{
    END_UNIT, ProcessDefinition, RouteKind, RouteTarget, Unit, UnitKind,
};
use crate::engine::error::FlowError;
use crate::engine::events::{Dispatcher, EventHandler};
use crate::engine::recovery;
use crate::engine::types::{
    ErrorTuple, EventType, ExecPath, ExecPathStatus, LastUnit, ProcessContext, ProcessInfo,
    ProcessVariable, ROOT_EXEC_PATH, UnitResponseType, parent_exec_path,
};
use crate::sla::{SlaQueueManager, SlaSchedule};
use crate::storage::{CaseStore, keys};

/// The orchestration engine: drives cases through their process graphs,
/// one start/resume invocation at a time.
///
/// A single case is driven synchronously by one logical task per
/// invocation; parallel-route fan-out is logical branching within that
/// invocation's step loop. Callers must serialize invocations per case id.
pub struct CaseEngine {
    store: Arc<dyn CaseStore>,
    components: Arc<ComponentRegistry>,
    event_handler: Option<Arc<dyn EventHandler>>,
    sla_queue: Option<Arc<dyn SlaQueueManager>>,
}

impl CaseEngine {
    pub fn new(store: Arc<dyn CaseStore>, components: Arc<ComponentRegistry>) -> Self {
        Self {
            store,
            components,
            event_handler: None,
            sla_queue: None,
        }
    }

    pub fn with_event_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.event_handler = Some(handler);
        self
    }

    pub fn with_sla_queue(mut self, queue: Arc<dyn SlaQueueManager>) -> Self {
        self.sla_queue = Some(queue);
        self
    }

    /// Create a new case and run it until it pends or completes.
    ///
    /// Writes the journey document (and the SLA schedule, when given)
    /// before the first unit executes. Fails with
    /// [`FlowError::DuplicateCase`] when a journey record already exists
    /// for `case_id`.
    pub async fn start_case(
        &self,
        case_id: &str,
        journey: &Value,
        variables: Vec<ProcessVariable>,
        sla: Option<&Value>,
    ) -> Result<ProcessContext, FlowError> {
        let journey_key = keys::journey(case_id);
        if self.store.read(&journey_key).await?.is_some() {
            return Err(FlowError::DuplicateCase(case_id.to_string()));
        }

        let pd = ProcessDefinition::from_value(journey)?;
        let schedule = sla.map(SlaSchedule::from_value).transpose()?;

        self.store.write(&journey_key, journey).await?;
        if let Some(doc) = sla {
            self.store.write(&keys::journey_sla(case_id), doc).await?;
        }

        let mut pi = ProcessInfo::new(case_id);
        for pv in pd.process_variables() {
            pi.set_process_variable(pv.clone());
        }
        for pv in variables {
            pi.set_process_variable(pv);
        }

        info!(case_id = %case_id, journey = %pd.name(), "successfully created case");

        let mut run = CaseRun {
            engine: self,
            pd,
            schedule,
            pi,
            resuming: false,
        };
        let pc = run.lifecycle_context(ROOT_EXEC_PATH);
        run.raise(EventType::OnProcessStart, &pc).await?;
        run.execute().await
    }

    /// Resume a pended case and run it until it pends again or completes.
    ///
    /// Reconciles persisted state first: crash repairs are applied and a
    /// pend execution path is selected if none was recorded.
    pub async fn resume_case(&self, case_id: &str) -> Result<ProcessContext, FlowError> {
        let journey = self
            .store
            .read(&keys::journey(case_id))
            .await?
            .ok_or_else(|| FlowError::CaseNotFound(case_id.to_string()))?;
        let pd = ProcessDefinition::from_value(&journey)?;

        let schedule = match self.store.read(&keys::journey_sla(case_id)).await? {
            Some(doc) => Some(SlaSchedule::from_value(&doc)?),
            None => None,
        };

        let mut pi = match self.store.read(&keys::process_info(case_id)).await? {
            Some(doc) => ProcessInfo::from_document(case_id, &doc)?,
            None => {
                // crashed before the first checkpoint; start over from the top
                let mut pi = ProcessInfo::new(case_id);
                for pv in pd.process_variables() {
                    pi.set_process_variable(pv.clone());
                }
                pi
            }
        };

        if pi.is_complete {
            return Err(FlowError::AlreadyCompleted(case_id.to_string()));
        }

        pi.is_pend_at_same_step = true;
        recovery::reconcile(&mut pi, &pd);

        let resuming = !pi.exec_paths.is_empty();
        let mut run = CaseRun {
            engine: self,
            pd,
            schedule,
            pi,
            resuming,
        };
        let pend_path = run.pi.pend_exec_path.clone();
        let pc = run.lifecycle_context(if pend_path.is_empty() {
            ROOT_EXEC_PATH
        } else {
            &pend_path
        });
        run.raise(EventType::OnProcessResume, &pc).await?;
        run.execute().await
    }
}

/// One start/resume invocation over one case: owns the definition, the
/// schedule and the mutable case state for its duration.
struct CaseRun<'a> {
    engine: &'a CaseEngine,
    pd: ProcessDefinition,
    schedule: Option<SlaSchedule>,
    pi: ProcessInfo,
    /// True until the first unit of an externally resumed case has been
    /// looked at; a pended `Pause` is moved past rather than re-pended.
    resuming: bool,
}

impl CaseRun<'_> {
    /// Run execution paths until every one of them is blocked or done.
    async fn execute(mut self) -> Result<ProcessContext, FlowError> {
        let mut queue: VecDeque<String> = VecDeque::new();

        if self.pi.exec_paths.is_empty() {
            let mut root = ExecPath::new(ROOT_EXEC_PATH, self.pd.first_unit());
            root.unit_response_type = Some(UnitResponseType::OkProceed);
            self.pi.set_exec_path(root);
            queue.push_back(ROOT_EXEC_PATH.to_string());
        } else if !self.pi.pend_exec_path.is_empty() {
            queue.push_back(self.pi.pend_exec_path.clone());
        }

        let mut last_pend: Option<ProcessContext> = None;
        while let Some(name) = queue.pop_front() {
            if let Some(pc) = self.run_path(name, &mut queue).await? {
                last_pend = Some(pc);
            }
        }

        if self
            .pi
            .exec_paths
            .values()
            .all(|ep| ep.status == ExecPathStatus::Completed)
        {
            self.pi.is_complete = true;
            self.pi.pend_exec_path.clear();
            self.write_process_info().await?;
            let pc = self.lifecycle_context(ROOT_EXEC_PATH);
            self.raise(EventType::OnProcessComplete, &pc).await?;
            info!(case_id = %self.pi.case_id, "case completed");
            return Ok(pc);
        }

        // still pended: leave the pend pointer at the deepest blocked path
        if let Some(deepest) = recovery::deepest_pended_path(&self.pi) {
            self.pi.pend_exec_path = deepest;
        }
        self.write_process_info().await?;

        Ok(match last_pend {
            Some(pc) => pc,
            None => {
                let path = self.pi.pend_exec_path.clone();
                self.lifecycle_context(&path)
            }
        })
    }

    /// Drive one execution path until it pends, completes, forks, or
    /// parks at a join. Returns the pend context when the path pended.
    async fn run_path(
        &mut self,
        mut name: String,
        queue: &mut VecDeque<String>,
    ) -> Result<Option<ProcessContext>, FlowError> {
        loop {
            let (step_name, status) = {
                let ep = self.pi.exec_path(&name).ok_or_else(|| {
                    FlowError::Internal(format!("unknown exec path '{}'", name))
                })?;
                (ep.step.clone(), ep.status)
            };
            if status == ExecPathStatus::Completed {
                return Ok(None);
            }

            let unit = self
                .pd
                .unit(&step_name)
                .ok_or_else(|| {
                    FlowError::Definition(format!(
                        "unit '{}' referenced but not defined",
                        step_name
                    ))
                })?
                .clone();

            match unit {
                Unit::Step {
                    name: unit_name,
                    component,
                    next,
                    user_data,
                } => {
                    self.resuming = false;
                    let resp = self.invoke_step(&name, &unit_name, &component, &user_data).await;
                    self.record_response(&name, resp.response_type, resp.error.clone());
                    self.write_audit(&unit_name, UnitKind::Step, &component, None)
                        .await?;

                    if !resp.ticket.is_empty() {
                        self.raise_ticket(&name, &resp.ticket, &unit_name, &component, &user_data)
                            .await?;
                        continue;
                    }

                    match resp.response_type {
                        UnitResponseType::OkProceed => {
                            if self.advance(&name, &next)? {
                                return Ok(None);
                            }
                        }
                        urt => {
                            let pc = self
                                .apply_pend(
                                    &name,
                                    urt,
                                    resp.work_basket,
                                    resp.error,
                                    &unit_name,
                                    UnitKind::Step,
                                    &component,
                                    &user_data,
                                )
                                .await?;
                            return Ok(Some(pc));
                        }
                    }
                }

                Unit::Route {
                    name: unit_name,
                    kind,
                    component,
                    user_data,
                    target,
                } => {
                    self.resuming = false;
                    let resp = self.invoke_route(&name, &unit_name, &component, &user_data).await;
                    self.record_response(&name, resp.response_type, resp.error.clone());
                    self.write_audit(&unit_name, kind.unit_kind(), &component, Some(&resp.branches))
                        .await?;

                    match resp.response_type {
                        UnitResponseType::OkProceed => match kind {
                            RouteKind::Sequential => {
                                let next =
                                    self.sequential_next(&unit_name, &target, &resp.branches)?;
                                if self.advance(&name, &next)? {
                                    return Ok(None);
                                }
                            }
                            RouteKind::ParallelStatic | RouteKind::ParallelDynamic => {
                                self.fork(&name, &unit_name, &target, resp.branches, queue)?;
                                return Ok(None);
                            }
                        },
                        urt => {
                            let pc = self
                                .apply_pend(
                                    &name,
                                    urt,
                                    resp.work_basket,
                                    resp.error,
                                    &unit_name,
                                    kind.unit_kind(),
                                    &component,
                                    &user_data,
                                )
                                .await?;
                            return Ok(Some(pc));
                        }
                    }
                }

                Unit::Pause {
                    name: unit_name,
                    next,
                } => {
                    if self.resuming {
                        // the pause was taken before the suspend; resuming
                        // moves past it
                        self.resuming = false;
                        self.record_response(&name, UnitResponseType::OkProceed, None);
                        if self.advance(&name, &next)? {
                            return Ok(None);
                        }
                        continue;
                    }
                    self.record_response(&name, UnitResponseType::OkPend, None);
                    self.write_audit(&unit_name, UnitKind::Pause, &unit_name, None)
                        .await?;
                    let pc = self
                        .apply_pend(
                            &name,
                            UnitResponseType::OkPend,
                            String::new(),
                            None,
                            &unit_name,
                            UnitKind::Pause,
                            "",
                            "",
                        )
                        .await?;
                    return Ok(Some(pc));
                }

                Unit::Persist {
                    name: unit_name,
                    next,
                } => {
                    self.resuming = false;
                    self.record_response(&name, UnitResponseType::OkProceed, None);
                    self.write_process_info().await?;
                    self.write_audit(&unit_name, UnitKind::Persist, &unit_name, None)
                        .await?;
                    let pc =
                        self.unit_context(&name, &unit_name, Some(UnitKind::Persist), "", "");
                    self.raise(EventType::OnPersist, &pc).await?;
                    if self.advance(&name, &next)? {
                        return Ok(None);
                    }
                }

                Unit::Join {
                    name: join_name,
                    next,
                } => {
                    self.resuming = false;
                    let parent = parent_exec_path(&name).ok_or_else(|| {
                        FlowError::Internal(format!(
                            "join '{}' reached by unforked path '{}'",
                            join_name, name
                        ))
                    })?;

                    {
                        let ep = self.pi.exec_paths.get_mut(&name).ok_or_else(|| {
                            FlowError::Internal(format!("unknown exec path '{}'", name))
                        })?;
                        ep.unit_response_type = Some(UnitResponseType::OkProceed);
                        ep.status = ExecPathStatus::Completed;
                    }

                    let all_arrived = self
                        .pi
                        .exec_paths
                        .values()
                        .filter(|sib| sib.parent_name().as_deref() == Some(parent.as_str()))
                        .all(|sib| {
                            sib.status == ExecPathStatus::Completed && sib.step == join_name
                        });

                    if !all_arrived {
                        self.write_audit(&join_name, UnitKind::PJoin, &join_name, None)
                            .await?;
                        info!(
                            case_id = %self.pi.case_id,
                            exec_path = %name,
                            join = %join_name,
                            "waiting at join for sibling paths"
                        );
                        return Ok(None);
                    }

                    // last sibling in: continue on a single merged path
                    // reoccupying the parent identifier; the merge and the
                    // arrival become durable in the same write
                    info!(
                        case_id = %self.pi.case_id,
                        exec_path = %parent,
                        join = %join_name,
                        "join released, merging into parent path"
                    );
                    let mut merged = ExecPath::new(parent.clone(), join_name.clone());
                    merged.unit_response_type = Some(UnitResponseType::OkProceed);
                    self.pi.set_exec_path(merged);
                    let done = self.advance(&parent, &next)?;
                    self.write_audit(&join_name, UnitKind::PJoin, &join_name, None)
                        .await?;
                    if done {
                        return Ok(None);
                    }
                    name = parent;
                }
            }
        }
    }

    async fn invoke_step(
        &self,
        path: &str,
        unit_name: &str,
        component: &str,
        user_data: &str,
    ) -> StepResponse {
        let ctx = self.invocation_context(path, unit_name, component, user_data);
        let Some(handler) = self.engine.components.step(component) else {
            warn!(
                case_id = %self.pi.case_id,
                component = %component,
                "no step handler registered"
            );
            return StepResponse::error_pend(
                String::new(),
                ErrorTuple {
                    code: "component_not_registered".to_string(),
                    message: format!("no step handler registered for component '{}'", component),
                    details: String::new(),
                    is_retryable: false,
                },
            );
        };
        match handler.execute(&ctx).await {
            Ok(resp) => resp,
            Err(e) => {
                warn!(
                    case_id = %self.pi.case_id,
                    component = %component,
                    error = %format!("{:#}", e),
                    "step component failed"
                );
                StepResponse::error_pend(
                    String::new(),
                    ErrorTuple {
                        code: "component_failure".to_string(),
                        message: format!("{:#}", e),
                        details: String::new(),
                        is_retryable: true,
                    },
                )
            }
        }
    }

    async fn invoke_route(
        &self,
        path: &str,
        unit_name: &str,
        component: &str,
        user_data: &str,
    ) -> RouteResponse {
        let ctx = self.invocation_context(path, unit_name, component, user_data);
        let Some(handler) = self.engine.components.route(component) else {
            warn!(
                case_id = %self.pi.case_id,
                component = %component,
                "no route handler registered"
            );
            return RouteResponse::error_pend(
                String::new(),
                ErrorTuple {
                    code: "component_not_registered".to_string(),
                    message: format!("no route handler registered for component '{}'", component),
                    details: String::new(),
                    is_retryable: false,
                },
            );
        };
        match handler.choose(&ctx).await {
            Ok(resp) => resp,
            Err(e) => {
                warn!(
                    case_id = %self.pi.case_id,
                    component = %component,
                    error = %format!("{:#}", e),
                    "route component failed"
                );
                RouteResponse::error_pend(
                    String::new(),
                    ErrorTuple {
                        code: "component_failure".to_string(),
                        message: format!("{:#}", e),
                        details: String::new(),
                        is_retryable: true,
                    },
                )
            }
        }
    }

    /// Record the observed outcome on the path before any advance; a
    /// crash from here on replays at most this one unit.
    fn record_response(
        &mut self,
        path: &str,
        urt: UnitResponseType,
        error: Option<ErrorTuple>,
    ) {
        if let Some(ep) = self.pi.exec_paths.get_mut(path) {
            ep.unit_response_type = Some(urt);
            if urt == UnitResponseType::OkProceed {
                ep.error = None;
            } else if error.is_some() {
                ep.error = error;
            }
        }
    }

    /// Move the path pointer to `next`; completes the path at the
    /// terminal marker. Returns true when the path completed.
    fn advance(&mut self, path: &str, next: &str) -> Result<bool, FlowError> {
        let ep = self
            .pi
            .exec_paths
            .get_mut(path)
            .ok_or_else(|| FlowError::Internal(format!("unknown exec path '{}'", path)))?;
        if next == END_UNIT {
            ep.status = ExecPathStatus::Completed;
            info!(
                case_id = %self.pi.case_id,
                exec_path = %path,
                "execution path completed"
            );
            return Ok(true);
        }
        ep.step = next.to_string();
        self.pi.is_pend_at_same_step = false;
        Ok(false)
    }

    /// Park the path in a work basket and raise `ON_PROCESS_PEND`.
    #[allow(clippy::too_many_arguments)]
    async fn apply_pend(
        &mut self,
        path: &str,
        urt: UnitResponseType,
        work_basket: String,
        error: Option<ErrorTuple>,
        unit_name: &str,
        unit_kind: UnitKind,
        comp_name: &str,
        user_data: &str,
    ) -> Result<ProcessContext, FlowError> {
        {
            let ep = self
                .pi
                .exec_paths
                .get_mut(path)
                .ok_or_else(|| FlowError::Internal(format!("unknown exec path '{}'", path)))?;
            ep.prev_pend_work_basket = std::mem::take(&mut ep.pend_work_basket);
            ep.pend_work_basket = work_basket;
            ep.unit_response_type = Some(urt);
            ep.error = error;
        }
        self.pi.pend_exec_path = path.to_string();
        self.write_process_info().await?;

        let pc = self.unit_context(path, unit_name, Some(unit_kind), comp_name, user_data);
        self.raise(EventType::OnProcessPend, &pc).await?;
        Ok(pc)
    }

    /// Resolve the single way forward out of a sequential route.
    fn sequential_next(
        &self,
        route_name: &str,
        target: &RouteTarget,
        branches: &[String],
    ) -> Result<String, FlowError> {
        match target {
            RouteTarget::Next(next) => Ok(next.clone()),
            RouteTarget::Branches(declared) => {
                if branches.len() != 1 {
                    return Err(FlowError::Internal(format!(
                        "sequential route '{}' must choose exactly one branch, got {}",
                        route_name,
                        branches.len()
                    )));
                }
                let chosen = &branches[0];
                declared
                    .get(chosen)
                    .map(|b| b.next.clone())
                    .ok_or_else(|| {
                        FlowError::Internal(format!(
                            "route '{}' chose undeclared branch '{}'",
                            route_name, chosen
                        ))
                    })
            }
        }
    }

    /// Fan out over the taken branches: one child execution path per
    /// branch, the parent path ends with the fork.
    fn fork(
        &mut self,
        parent: &str,
        route_name: &str,
        target: &RouteTarget,
        branches: Vec<String>,
        queue: &mut VecDeque<String>,
    ) -> Result<(), FlowError> {
        if branches.is_empty() {
            return Err(FlowError::Internal(format!(
                "parallel route '{}' returned no branches",
                route_name
            )));
        }

        let parent_ep = self
            .pi
            .exec_path(parent)
            .ok_or_else(|| FlowError::Internal(format!("unknown exec path '{}'", parent)))?
            .clone();

        let mut children = Vec::with_capacity(branches.len());
        for branch in &branches {
            if branch.contains('.') {
                return Err(FlowError::Internal(format!(
                    "branch name '{}' on route '{}' must not contain '.'",
                    branch, route_name
                )));
            }
            let next = match target {
                RouteTarget::Branches(declared) => declared
                    .get(branch)
                    .map(|b| b.next.clone())
                    .ok_or_else(|| {
                        FlowError::Internal(format!(
                            "route '{}' chose undeclared branch '{}'",
                            route_name, branch
                        ))
                    })?,
                // dynamic fan-out: every child starts at the route's next
                RouteTarget::Next(next) => next.clone(),
            };
            let child_name = parent_ep.child_name(branch);
            if self.pi.exec_paths.contains_key(&child_name) {
                return Err(FlowError::Internal(format!(
                    "route '{}' produced duplicate child path '{}'",
                    route_name, child_name
                )));
            }
            let mut child = ExecPath::new(child_name, next);
            child.unit_response_type = Some(UnitResponseType::OkProceed);
            children.push(child);
        }

        info!(
            case_id = %self.pi.case_id,
            exec_path = %parent,
            route = %route_name,
            branches = children.len(),
            "forking parallel branches"
        );

        for child in children {
            queue.push_back(child.name.clone());
            self.pi.set_exec_path(child);
        }
        if let Some(ep) = self.pi.exec_paths.get_mut(parent) {
            ep.status = ExecPathStatus::Completed;
        }
        Ok(())
    }

    /// Record a raised ticket and redirect the path to the ticketed step.
    async fn raise_ticket(
        &mut self,
        path: &str,
        ticket: &str,
        unit_name: &str,
        comp_name: &str,
        user_data: &str,
    ) -> Result<(), FlowError> {
        let target_step = self
            .pd
            .ticket(ticket)
            .map(|t| t.step.clone())
            .ok_or_else(|| {
                FlowError::Internal(format!("ticket '{}' not declared in definition", ticket))
            })?;

        self.pi.ticket = ticket.to_string();
        let pc = self.unit_context(path, unit_name, Some(UnitKind::Step), comp_name, user_data);
        self.raise(EventType::OnTicketRaised, &pc).await?;

        info!(
            case_id = %self.pi.case_id,
            exec_path = %path,
            ticket = %ticket,
            step = %target_step,
            "ticket raised, redirecting execution path"
        );
        if let Some(ep) = self.pi.exec_paths.get_mut(path) {
            ep.step = target_step;
        }
        self.pi.is_pend_at_same_step = false;
        Ok(())
    }

    async fn raise(&mut self, event: EventType, pc: &ProcessContext) -> Result<(), FlowError> {
        let dispatcher = Dispatcher::new(
            self.engine.event_handler.as_deref(),
            self.engine.sla_queue.as_deref(),
            self.schedule.as_ref(),
        );
        dispatcher.raise(event, &mut self.pi, pc).await
    }

    async fn write_process_info(&self) -> Result<(), FlowError> {
        let doc = self.pi.to_document();
        self.engine
            .store
            .write(&keys::process_info(&self.pi.case_id), &doc)
            .await
            .map_err(FlowError::Store)
    }

    /// Checkpoint the case and append one audit record: the full state
    /// at this unit boundary, plus the branches taken for route units.
    /// The checkpoint is what bounds crash replay to one unit per path.
    async fn write_audit(
        &mut self,
        unit_name: &str,
        unit_kind: UnitKind,
        comp_name: &str,
        branches: Option<&[String]>,
    ) -> Result<(), FlowError> {
        self.pi.last_unit = Some(LastUnit {
            name: unit_name.to_string(),
            kind: unit_kind,
        });
        self.write_process_info().await?;

        let seq = self
            .engine
            .store
            .incr_counter(&keys::audit_counter(&self.pi.case_id))
            .await
            .map_err(FlowError::Store)?;

        let mut doc = self.pi.to_document();
        doc["process_info"]["written_at"] =
            serde_json::json!(chrono::Utc::now().to_rfc3339());
        if let Some(branches) = branches {
            doc["process_info"]["branches"] = serde_json::json!(branches);
        }

        let key = keys::audit_log(&self.pi.case_id, seq, comp_name);
        self.engine
            .store
            .write(&key, &doc)
            .await
            .map_err(FlowError::Store)
    }

    fn invocation_context(
        &self,
        path: &str,
        unit_name: &str,
        component: &str,
        user_data: &str,
    ) -> InvocationContext {
        InvocationContext {
            case_id: self.pi.case_id.clone(),
            process_name: self.pd.name().to_string(),
            unit_name: unit_name.to_string(),
            component: component.to_string(),
            user_data: user_data.to_string(),
            exec_path_name: path.to_string(),
            process_variables: self.pi.variables_snapshot(),
        }
    }

    fn unit_context(
        &self,
        path: &str,
        unit_name: &str,
        unit_kind: Option<UnitKind>,
        comp_name: &str,
        user_data: &str,
    ) -> ProcessContext {
        let ep = self.pi.exec_path(path);
        ProcessContext {
            case_id: self.pi.case_id.clone(),
            process_name: self.pd.name().to_string(),
            exec_path_name: path.to_string(),
            unit_name: unit_name.to_string(),
            unit_kind,
            comp_name: comp_name.to_string(),
            user_data: user_data.to_string(),
            pend_work_basket: ep.map(|e| e.pend_work_basket.clone()).unwrap_or_default(),
            error: ep.and_then(|e| e.error.clone()),
            ticket: self.pi.ticket.clone(),
            process_variables: self.pi.variables_snapshot(),
        }
    }

    fn lifecycle_context(&self, path: &str) -> ProcessContext {
        self.unit_context(path, "", None, "", "")
    }
}

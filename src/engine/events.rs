use anyhow::Result;
use async_trait::async_trait;
use tracing::{error, info};

use crate::engine::error::FlowError;
use crate::engine::types::{EventType, ProcessContext, ProcessInfo, UnitResponseType};
use crate::sla::{SetupOn, SlaQueueManager, SlaSchedule};

/// Host-application hook notified at every lifecycle transition.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn invoke(&self, event: EventType, pc: &ProcessContext) -> Result<()>;
}

/// Dispatches lifecycle events to the host application and applies the
/// SLA milestone transitions that follow them.
///
/// `ON_PERSIST` and `ON_TICKET_RAISED` notifications run under the
/// case-wide lock and never trigger SLA transitions; all other events are
/// notified without the lock, and a handler failure there is logged and
/// swallowed — except for `ON_PROCESS_START` / `ON_PROCESS_RESUME`, whose
/// failure gates continuation.
pub struct Dispatcher<'a> {
    handler: Option<&'a dyn EventHandler>,
    sla_queue: Option<&'a dyn SlaQueueManager>,
    schedule: Option<&'a SlaSchedule>,
}

impl<'a> Dispatcher<'a> {
    pub fn new(
        handler: Option<&'a dyn EventHandler>,
        sla_queue: Option<&'a dyn SlaQueueManager>,
        schedule: Option<&'a SlaSchedule>,
    ) -> Self {
        Self {
            handler,
            sla_queue,
            schedule,
        }
    }

    /// Raise one lifecycle event for the case.
    pub async fn raise(
        &self,
        event: EventType,
        pi: &mut ProcessInfo,
        pc: &ProcessContext,
    ) -> Result<(), FlowError> {
        let Some(handler) = self.handler else {
            return Ok(());
        };

        info!(
            case_id = %pi.case_id,
            event = %event,
            unit = %pc.unit_name,
            work_basket = %pc.pend_work_basket,
            "raising event"
        );

        if matches!(event, EventType::OnPersist | EventType::OnTicketRaised) {
            // the handler must not observe case state mid-write
            let _held = pi.lock.lock().await;
            if let Err(e) = handler.invoke(event, pc).await {
                error!(
                    case_id = %pi.case_id,
                    event = %event,
                    error = %format!("{:#}", e),
                    "event handler failed"
                );
            }
            return Ok(());
        }

        if let Err(e) = handler.invoke(event, pc).await {
            if matches!(event, EventType::OnProcessStart | EventType::OnProcessResume) {
                return Err(FlowError::Handler {
                    event,
                    case_id: pi.case_id.clone(),
                    message: format!("{:#}", e),
                });
            }
            error!(
                case_id = %pi.case_id,
                event = %event,
                error = %format!("{:#}", e),
                "event handler failed"
            );
            return Ok(());
        }

        // SLA transitions run only after a successful notification
        if let (Some(queue), Some(schedule)) = (self.sla_queue, self.schedule) {
            if let Err(e) = self.apply_sla(event, pi, pc, queue, schedule).await {
                if matches!(e, FlowError::Internal(_)) {
                    return Err(e);
                }
                error!(
                    case_id = %pi.case_id,
                    event = %event,
                    error = %e,
                    "sla transition failed"
                );
            }
        }
        Ok(())
    }

    async fn apply_sla(
        &self,
        event: EventType,
        pi: &mut ProcessInfo,
        pc: &ProcessContext,
        queue: &dyn SlaQueueManager,
        schedule: &SlaSchedule,
    ) -> Result<(), FlowError> {
        match event {
            EventType::OnProcessStart => {
                let milestones = schedule.case_start_milestones();
                if !milestones.is_empty() {
                    info!(
                        case_id = %pi.case_id,
                        count = milestones.len(),
                        "enqueueing case start milestones"
                    );
                    queue
                        .enqueue(pc, &milestones)
                        .await
                        .map_err(FlowError::Store)?;
                }
            }

            EventType::OnProcessPend => {
                let path_name = pi.pend_exec_path.clone();
                let ep = pi.exec_path(&path_name).ok_or_else(|| {
                    FlowError::Internal(format!(
                        "pend event without exec path '{}' on case '{}'",
                        path_name, pi.case_id
                    ))
                })?;
                let prev = ep.prev_pend_work_basket.clone();
                let pend = ep.pend_work_basket.clone();
                let tbc = ep.tbc_sla_work_basket.clone();
                let urt = ep.unit_response_type;

                let mut new_tbc = None;
                if !pi.is_pend_at_same_step {
                    // pending at a genuinely new step: retire the previous
                    // basket (and any uncommitted one), then commit the new
                    self.dequeue_work_basket(queue, pc, &prev).await?;
                    if tbc != prev {
                        self.dequeue_work_basket(queue, pc, &tbc).await?;
                    }
                    self.enqueue_work_basket(queue, pc, schedule, SetupOn::WorkBasketExit, &prev)
                        .await?;
                    self.enqueue_work_basket(queue, pc, schedule, SetupOn::WorkBasketEntry, &pend)
                        .await?;
                    new_tbc = Some(String::new());
                } else if prev != pend {
                    // re-pending at the same step into a different basket
                    // means the first pend there was provisional
                    match urt {
                        Some(UnitResponseType::ErrorPend) => {
                            if prev == tbc {
                                self.enqueue_work_basket(
                                    queue,
                                    pc,
                                    schedule,
                                    SetupOn::WorkBasketEntry,
                                    &pend,
                                )
                                .await?;
                            } else {
                                self.dequeue_work_basket(queue, pc, &prev).await?;
                                self.enqueue_work_basket(
                                    queue,
                                    pc,
                                    schedule,
                                    SetupOn::WorkBasketExit,
                                    &prev,
                                )
                                .await?;
                                self.enqueue_work_basket(
                                    queue,
                                    pc,
                                    schedule,
                                    SetupOn::WorkBasketEntry,
                                    &pend,
                                )
                                .await?;
                            }
                        }
                        Some(UnitResponseType::OkPendEor) => {
                            if prev == tbc {
                                self.dequeue_work_basket(queue, pc, &prev).await?;
                                self.enqueue_work_basket(
                                    queue,
                                    pc,
                                    schedule,
                                    SetupOn::WorkBasketExit,
                                    &prev,
                                )
                                .await?;
                                self.enqueue_work_basket(
                                    queue,
                                    pc,
                                    schedule,
                                    SetupOn::WorkBasketEntry,
                                    &pend,
                                )
                                .await?;
                                new_tbc = Some(pend.clone());
                            } else {
                                self.dequeue_work_basket(queue, pc, &prev).await?;
                                self.enqueue_work_basket(
                                    queue,
                                    pc,
                                    schedule,
                                    SetupOn::WorkBasketExit,
                                    &prev,
                                )
                                .await?;
                                if pend != tbc {
                                    self.dequeue_work_basket(queue, pc, &tbc).await?;
                                    self.enqueue_work_basket(
                                        queue,
                                        pc,
                                        schedule,
                                        SetupOn::WorkBasketExit,
                                        &tbc,
                                    )
                                    .await?;
                                    self.enqueue_work_basket(
                                        queue,
                                        pc,
                                        schedule,
                                        SetupOn::WorkBasketEntry,
                                        &pend,
                                    )
                                    .await?;
                                    new_tbc = Some(pend.clone());
                                }
                            }
                        }
                        Some(UnitResponseType::OkPend) => {
                            return Err(FlowError::Internal(format!(
                                "ok_pend re-pend with changed work basket on path '{}' of case '{}'",
                                path_name, pi.case_id
                            )));
                        }
                        _ => {}
                    }
                }

                if let Some(tbc) = new_tbc {
                    if let Some(ep) = pi.exec_paths.get_mut(&path_name) {
                        ep.tbc_sla_work_basket = tbc;
                    }
                }
            }

            EventType::OnProcessResume => {
                let path_name = pi.pend_exec_path.clone();
                if let Some(ep) = pi.exec_paths.get_mut(&path_name) {
                    if ep.unit_response_type == Some(UnitResponseType::OkPendEor) {
                        // deferred commit, resolved on the next pend or
                        // process completion
                        ep.tbc_sla_work_basket = ep.pend_work_basket.clone();
                    }
                }
            }

            EventType::OnProcessComplete => {
                queue.dequeue_all(pc).await.map_err(FlowError::Store)?;
            }

            // locked events never reach SLA transitions
            EventType::OnPersist | EventType::OnTicketRaised => {}
        }
        Ok(())
    }

    async fn dequeue_work_basket(
        &self,
        queue: &dyn SlaQueueManager,
        pc: &ProcessContext,
        work_basket: &str,
    ) -> Result<(), FlowError> {
        if work_basket.is_empty() {
            return Ok(());
        }
        info!(
            case_id = %pc.case_id,
            work_basket = %work_basket,
            "dequeueing milestones on work basket exit"
        );
        queue
            .dequeue(pc, work_basket)
            .await
            .map_err(FlowError::Store)
    }

    async fn enqueue_work_basket(
        &self,
        queue: &dyn SlaQueueManager,
        pc: &ProcessContext,
        schedule: &SlaSchedule,
        setup_on: SetupOn,
        work_basket: &str,
    ) -> Result<(), FlowError> {
        if work_basket.is_empty() {
            return Ok(());
        }
        let milestones = schedule.work_basket_milestones(setup_on, work_basket);
        if milestones.is_empty() {
            return Ok(());
        }
        info!(
            case_id = %pc.case_id,
            setup_on = %setup_on,
            work_basket = %work_basket,
            count = milestones.len(),
            "enqueueing work basket milestones"
        );
        queue
            .enqueue(pc, &milestones)
            .await
            .map_err(FlowError::Store)
    }
}

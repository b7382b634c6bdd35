//! Integration tests for the orchestration engine.

mod common;

use std::sync::Arc;

use caseflow::components::{ComponentRegistry, RouteResponse, StepResponse};
use caseflow::engine::executor::CaseEngine;
use caseflow::engine::types::{
    ErrorTuple, EventType, ExecPathStatus, ProcessInfo, ProcessVariable, ProcessVariableValue,
    UnitResponseType,
};
use caseflow::engine::error::FlowError;
use caseflow::storage::memory_store::MemoryCaseStore;
use caseflow::storage::{CaseStore, keys};
use serde_json::json;

use common::{AlwaysFails, AlwaysProceed, RecordingHandler, ScriptedRoute, ScriptedStep};

fn engine_with(
    registry: ComponentRegistry,
    handler: Arc<RecordingHandler>,
) -> (CaseEngine, Arc<MemoryCaseStore>) {
    let store = Arc::new(MemoryCaseStore::new());
    let engine =
        CaseEngine::new(store.clone(), Arc::new(registry)).with_event_handler(handler);
    (engine, store)
}

async fn load_pi(store: &MemoryCaseStore, case_id: &str) -> ProcessInfo {
    let doc = store
        .read(&keys::process_info(case_id))
        .await
        .unwrap()
        .expect("process info should be persisted");
    ProcessInfo::from_document(case_id, &doc).unwrap()
}

fn linear_journey() -> serde_json::Value {
    json!({
        "journey": {
            "name": "linear",
            "flow": [
                {"name": "collect", "component": "collector", "next": "verify"},
                {"name": "verify", "component": "verifier", "next": "end"}
            ]
        }
    })
}

fn fork_journey() -> serde_json::Value {
    json!({
        "journey": {
            "name": "forked",
            "flow": [
                {
                    "name": "split",
                    "type": "p_route",
                    "component": "splitter",
                    "branches": [
                        {"name": "b1", "next": "s1"},
                        {"name": "b2", "next": "s2"}
                    ]
                },
                {"name": "s1", "component": "worker1", "next": "meet"},
                {"name": "s2", "component": "worker2", "next": "meet"},
                {"name": "meet", "type": "p_join", "next": "done"},
                {"name": "done", "component": "finisher", "next": "end"}
            ]
        }
    })
}

// --- Linear execution ---

#[tokio::test]
async fn linear_flow_runs_to_completion() {
    let mut registry = ComponentRegistry::new();
    registry.register_step("collector", Arc::new(AlwaysProceed));
    registry.register_step("verifier", Arc::new(AlwaysProceed));
    let handler = RecordingHandler::new();
    let (engine, store) = engine_with(registry, handler.clone());

    engine
        .start_case("c1", &linear_journey(), Vec::new(), None)
        .await
        .unwrap();

    let pi = load_pi(&store, "c1").await;
    assert!(pi.is_complete);
    assert_eq!(pi.exec_path(".").unwrap().status, ExecPathStatus::Completed);
    assert_eq!(
        handler.seen(),
        vec![EventType::OnProcessStart, EventType::OnProcessComplete]
    );
}

#[tokio::test]
async fn journey_and_audit_records_are_written() {
    let mut registry = ComponentRegistry::new();
    registry.register_step("collector", Arc::new(AlwaysProceed));
    registry.register_step("verifier", Arc::new(AlwaysProceed));
    let (engine, store) = engine_with(registry, RecordingHandler::new());

    engine
        .start_case("c1", &linear_journey(), Vec::new(), None)
        .await
        .unwrap();

    assert!(store.read(&keys::journey("c1")).await.unwrap().is_some());
    // one audit record per unit boundary, sequenced from 1
    let audit1 = store
        .read(&keys::audit_log("c1", 1, "collector"))
        .await
        .unwrap()
        .expect("first audit record");
    assert!(audit1["process_info"]["written_at"].is_string());
    assert!(
        store
            .read(&keys::audit_log("c1", 2, "verifier"))
            .await
            .unwrap()
            .is_some()
    );
}

#[tokio::test]
async fn caller_variables_overlay_definition_defaults() {
    let journey = json!({
        "journey": {
            "name": "vars",
            "process_variables": [
                {"name": "region", "type": "string", "value": "emea"},
                {"name": "attempts", "type": "integer", "value": "0"}
            ],
            "flow": [
                {"name": "only", "component": "collector", "next": "end"}
            ]
        }
    });
    let mut registry = ComponentRegistry::new();
    registry.register_step("collector", Arc::new(AlwaysProceed));
    let (engine, store) = engine_with(registry, RecordingHandler::new());

    engine
        .start_case(
            "c1",
            &journey,
            vec![ProcessVariable::new(
                "region",
                ProcessVariableValue::Text("apac".to_string()),
            )],
            None,
        )
        .await
        .unwrap();

    let pi = load_pi(&store, "c1").await;
    assert_eq!(
        pi.process_variable("region").unwrap().value,
        ProcessVariableValue::Text("apac".to_string())
    );
    assert_eq!(
        pi.process_variable("attempts").unwrap().value,
        ProcessVariableValue::Integer(0)
    );
}

// --- Start/resume guards ---

#[tokio::test]
async fn starting_a_duplicate_case_fails() {
    let mut registry = ComponentRegistry::new();
    registry.register_step("collector", Arc::new(AlwaysProceed));
    registry.register_step("verifier", Arc::new(AlwaysProceed));
    let (engine, _store) = engine_with(registry, RecordingHandler::new());

    engine
        .start_case("c1", &linear_journey(), Vec::new(), None)
        .await
        .unwrap();
    let err = engine
        .start_case("c1", &linear_journey(), Vec::new(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, FlowError::DuplicateCase(id) if id == "c1"));
}

#[tokio::test]
async fn resuming_an_unknown_case_fails() {
    let (engine, _store) = engine_with(ComponentRegistry::new(), RecordingHandler::new());
    let err = engine.resume_case("nope").await.unwrap_err();
    assert!(matches!(err, FlowError::CaseNotFound(_)));
}

#[tokio::test]
async fn resuming_a_completed_case_fails() {
    let mut registry = ComponentRegistry::new();
    registry.register_step("collector", Arc::new(AlwaysProceed));
    registry.register_step("verifier", Arc::new(AlwaysProceed));
    let (engine, _store) = engine_with(registry, RecordingHandler::new());

    engine
        .start_case("c1", &linear_journey(), Vec::new(), None)
        .await
        .unwrap();
    let err = engine.resume_case("c1").await.unwrap_err();
    assert!(matches!(err, FlowError::AlreadyCompleted(id) if id == "c1"));
}

// --- Pend and resume ---

#[tokio::test]
async fn pended_step_is_reinvoked_on_resume() {
    let journey = json!({
        "journey": {
            "name": "pending",
            "flow": [
                {"name": "review", "component": "reviewer", "next": "end"}
            ]
        }
    });
    let mut registry = ComponentRegistry::new();
    registry.register_step(
        "reviewer",
        ScriptedStep::new(vec![
            StepResponse::pend("review_wb"),
            StepResponse::proceed(),
        ]),
    );
    let handler = RecordingHandler::new();
    let (engine, store) = engine_with(registry, handler.clone());

    let pc = engine
        .start_case("c1", &journey, Vec::new(), None)
        .await
        .unwrap();
    assert_eq!(pc.pend_work_basket, "review_wb");

    let pi = load_pi(&store, "c1").await;
    assert!(!pi.is_complete);
    assert_eq!(pi.pend_exec_path, ".");
    let ep = pi.exec_path(".").unwrap();
    assert_eq!(ep.status, ExecPathStatus::Started);
    assert_eq!(ep.unit_response_type, Some(UnitResponseType::OkPend));
    assert_eq!(ep.pend_work_basket, "review_wb");

    engine.resume_case("c1").await.unwrap();
    let pi = load_pi(&store, "c1").await;
    assert!(pi.is_complete);
    assert_eq!(
        handler.seen(),
        vec![
            EventType::OnProcessStart,
            EventType::OnProcessPend,
            EventType::OnProcessResume,
            EventType::OnProcessComplete,
        ]
    );
}

#[tokio::test]
async fn error_pend_records_the_error_tuple() {
    let journey = json!({
        "journey": {
            "name": "errors",
            "flow": [
                {"name": "fetch", "component": "fetcher", "next": "end"}
            ]
        }
    });
    let mut registry = ComponentRegistry::new();
    registry.register_step("fetcher", Arc::new(AlwaysFails));
    let (engine, store) = engine_with(registry, RecordingHandler::new());

    // a failing component pends the case, it does not error the call
    engine
        .start_case("c1", &journey, Vec::new(), None)
        .await
        .unwrap();

    let pi = load_pi(&store, "c1").await;
    assert!(!pi.is_complete);
    let ep = pi.exec_path(".").unwrap();
    assert_eq!(ep.unit_response_type, Some(UnitResponseType::ErrorPend));
    let error = ep.error.as_ref().unwrap();
    assert_eq!(error.code, "component_failure");
    assert!(error.is_retryable);
    assert!(error.message.contains("downstream system unavailable"));
}

#[tokio::test]
async fn explicit_error_pend_is_retried_via_resume() {
    let journey = json!({
        "journey": {
            "name": "retry",
            "flow": [
                {"name": "push", "component": "pusher", "next": "end"}
            ]
        }
    });
    let mut registry = ComponentRegistry::new();
    registry.register_step(
        "pusher",
        ScriptedStep::new(vec![
            StepResponse::error_pend(
                "errors_wb",
                ErrorTuple {
                    code: "gw_timeout".to_string(),
                    message: "gateway timed out".to_string(),
                    details: String::new(),
                    is_retryable: true,
                },
            ),
            StepResponse::proceed(),
        ]),
    );
    let (engine, store) = engine_with(registry, RecordingHandler::new());

    engine
        .start_case("c1", &journey, Vec::new(), None)
        .await
        .unwrap();
    let pi = load_pi(&store, "c1").await;
    assert_eq!(
        pi.exec_path(".").unwrap().unit_response_type,
        Some(UnitResponseType::ErrorPend)
    );
    assert_eq!(pi.exec_path(".").unwrap().pend_work_basket, "errors_wb");

    engine.resume_case("c1").await.unwrap();
    assert!(load_pi(&store, "c1").await.is_complete);
}

// --- Sequential routes ---

#[tokio::test]
async fn sequential_route_follows_the_chosen_branch() {
    let journey = json!({
        "journey": {
            "name": "choice",
            "flow": [
                {
                    "name": "choose",
                    "type": "s_route",
                    "component": "chooser",
                    "branches": [
                        {"name": "left", "next": "left_step"},
                        {"name": "right", "next": "right_step"}
                    ]
                },
                {"name": "left_step", "component": "left_worker", "next": "end"},
                {"name": "right_step", "component": "right_worker", "next": "end"}
            ]
        }
    });
    let mut registry = ComponentRegistry::new();
    registry.register_route(
        "chooser",
        ScriptedRoute::new(vec![RouteResponse::take(vec!["right".to_string()])]),
    );
    // the untaken branch has an empty script; invoking it would error-pend
    registry.register_step("left_worker", ScriptedStep::new(Vec::new()));
    registry.register_step("right_worker", ScriptedStep::new(vec![StepResponse::proceed()]));
    let (engine, store) = engine_with(registry, RecordingHandler::new());

    engine
        .start_case("c1", &journey, Vec::new(), None)
        .await
        .unwrap();
    assert!(load_pi(&store, "c1").await.is_complete);
}

// --- Parallel fan-out and join ---

#[tokio::test]
async fn fork_creates_one_child_per_branch_and_completes_the_parent() {
    let mut registry = ComponentRegistry::new();
    registry.register_route(
        "splitter",
        ScriptedRoute::new(vec![RouteResponse::take(vec![
            "b1".to_string(),
            "b2".to_string(),
        ])]),
    );
    registry.register_step(
        "worker1",
        ScriptedStep::new(vec![StepResponse::pend("wb1"), StepResponse::proceed()]),
    );
    registry.register_step(
        "worker2",
        ScriptedStep::new(vec![StepResponse::pend("wb2"), StepResponse::proceed()]),
    );
    registry.register_step("finisher", ScriptedStep::new(vec![StepResponse::proceed()]));
    let (engine, store) = engine_with(registry, RecordingHandler::new());

    engine
        .start_case("c1", &fork_journey(), Vec::new(), None)
        .await
        .unwrap();

    let pi = load_pi(&store, "c1").await;
    assert_eq!(pi.exec_paths.len(), 3);
    // the fork ends the parent path
    let parent = pi.exec_path(".").unwrap();
    assert_eq!(parent.status, ExecPathStatus::Completed);
    assert_eq!(parent.step, "split");
    // each child is a distinctly suffixed, started path at its branch
    let b1 = pi.exec_path(".b1.").unwrap();
    let b2 = pi.exec_path(".b2.").unwrap();
    assert_eq!(b1.status, ExecPathStatus::Started);
    assert_eq!(b2.status, ExecPathStatus::Started);
    assert_eq!(b1.pend_work_basket, "wb1");
    assert_eq!(b2.pend_work_basket, "wb2");
    // ties on depth keep the first found
    assert_eq!(pi.pend_exec_path, ".b1.");
}

#[tokio::test]
async fn join_releases_only_after_all_siblings_arrive() {
    let mut registry = ComponentRegistry::new();
    registry.register_route(
        "splitter",
        ScriptedRoute::new(vec![RouteResponse::take(vec![
            "b1".to_string(),
            "b2".to_string(),
        ])]),
    );
    registry.register_step(
        "worker1",
        ScriptedStep::new(vec![StepResponse::pend("wb1"), StepResponse::proceed()]),
    );
    registry.register_step("worker2", ScriptedStep::new(vec![StepResponse::proceed()]));
    registry.register_step("finisher", ScriptedStep::new(vec![StepResponse::proceed()]));
    let (engine, store) = engine_with(registry, RecordingHandler::new());

    engine
        .start_case("c1", &fork_journey(), Vec::new(), None)
        .await
        .unwrap();

    // b2 reached the join but b1 is still pended: the join must hold
    let pi = load_pi(&store, "c1").await;
    assert!(!pi.is_complete);
    let b2 = pi.exec_path(".b2.").unwrap();
    assert_eq!(b2.status, ExecPathStatus::Completed);
    assert_eq!(b2.step, "meet");
    // the merged continuation has not run: the parent still sits at the fork
    assert_eq!(pi.exec_path(".").unwrap().step, "split");
    assert_eq!(pi.pend_exec_path, ".b1.");

    // releasing the last sibling completes the case through the join
    engine.resume_case("c1").await.unwrap();
    let pi = load_pi(&store, "c1").await;
    assert!(pi.is_complete);
    assert_eq!(pi.exec_path(".").unwrap().status, ExecPathStatus::Completed);
}

#[tokio::test]
async fn each_pended_branch_needs_its_own_resume() {
    let mut registry = ComponentRegistry::new();
    registry.register_route(
        "splitter",
        ScriptedRoute::new(vec![RouteResponse::take(vec![
            "b1".to_string(),
            "b2".to_string(),
        ])]),
    );
    registry.register_step(
        "worker1",
        ScriptedStep::new(vec![StepResponse::pend("wb1"), StepResponse::proceed()]),
    );
    registry.register_step(
        "worker2",
        ScriptedStep::new(vec![StepResponse::pend("wb2"), StepResponse::proceed()]),
    );
    registry.register_step("finisher", ScriptedStep::new(vec![StepResponse::proceed()]));
    let (engine, store) = engine_with(registry, RecordingHandler::new());

    engine
        .start_case("c1", &fork_journey(), Vec::new(), None)
        .await
        .unwrap();

    // first resume releases b1, which then waits at the join for b2
    engine.resume_case("c1").await.unwrap();
    let pi = load_pi(&store, "c1").await;
    assert!(!pi.is_complete);
    assert_eq!(pi.pend_exec_path, ".b2.");

    engine.resume_case("c1").await.unwrap();
    assert!(load_pi(&store, "c1").await.is_complete);
}

#[tokio::test]
async fn dynamic_route_fans_out_over_computed_branches() {
    let journey = json!({
        "journey": {
            "name": "dynamic",
            "flow": [
                {"name": "fan", "type": "p_route_dynamic", "component": "fanner", "next": "work"},
                {"name": "work", "component": "worker", "next": "meet"},
                {"name": "meet", "type": "p_join", "next": "end"}
            ]
        }
    });
    let mut registry = ComponentRegistry::new();
    registry.register_route(
        "fanner",
        ScriptedRoute::new(vec![RouteResponse::take(vec![
            "x".to_string(),
            "y".to_string(),
        ])]),
    );
    registry.register_step(
        "worker",
        ScriptedStep::new(vec![StepResponse::proceed(), StepResponse::proceed()]),
    );
    let (engine, store) = engine_with(registry, RecordingHandler::new());

    engine
        .start_case("c1", &journey, Vec::new(), None)
        .await
        .unwrap();

    let pi = load_pi(&store, "c1").await;
    assert!(pi.is_complete);
    // every computed branch starts at the route's next unit
    assert_eq!(pi.exec_path(".x.").unwrap().step, "meet");
    assert_eq!(pi.exec_path(".y.").unwrap().step, "meet");
}

// --- Pause and persist units ---

#[tokio::test]
async fn pause_pends_without_a_work_basket_and_resumes_past() {
    let journey = json!({
        "journey": {
            "name": "paused",
            "flow": [
                {"name": "intake", "component": "collector", "next": "hold"},
                {"name": "hold", "type": "pause", "next": "finish"},
                {"name": "finish", "component": "finisher", "next": "end"}
            ]
        }
    });
    let mut registry = ComponentRegistry::new();
    registry.register_step("collector", ScriptedStep::new(vec![StepResponse::proceed()]));
    registry.register_step("finisher", ScriptedStep::new(vec![StepResponse::proceed()]));
    let handler = RecordingHandler::new();
    let (engine, store) = engine_with(registry, handler.clone());

    engine
        .start_case("c1", &journey, Vec::new(), None)
        .await
        .unwrap();

    let pi = load_pi(&store, "c1").await;
    assert!(!pi.is_complete);
    let ep = pi.exec_path(".").unwrap();
    assert_eq!(ep.step, "hold");
    assert_eq!(ep.unit_response_type, Some(UnitResponseType::OkPend));
    assert_eq!(ep.pend_work_basket, "");
    assert!(handler.seen().contains(&EventType::OnProcessPend));

    // resuming moves past the pause instead of re-pending on it
    engine.resume_case("c1").await.unwrap();
    assert!(load_pi(&store, "c1").await.is_complete);
}

#[tokio::test]
async fn persist_unit_checkpoints_and_raises_on_persist() {
    let journey = json!({
        "journey": {
            "name": "persisted",
            "flow": [
                {"name": "intake", "component": "collector", "next": "save"},
                {"name": "save", "type": "persist", "next": "finish"},
                {"name": "finish", "component": "finisher", "next": "end"}
            ]
        }
    });
    let mut registry = ComponentRegistry::new();
    registry.register_step("collector", ScriptedStep::new(vec![StepResponse::proceed()]));
    registry.register_step("finisher", ScriptedStep::new(vec![StepResponse::proceed()]));
    let handler = RecordingHandler::new();
    let (engine, store) = engine_with(registry, handler.clone());

    engine
        .start_case("c1", &journey, Vec::new(), None)
        .await
        .unwrap();

    assert!(load_pi(&store, "c1").await.is_complete);
    assert_eq!(
        handler.seen(),
        vec![
            EventType::OnProcessStart,
            EventType::OnPersist,
            EventType::OnProcessComplete,
        ]
    );
}

// --- Tickets ---

#[tokio::test]
async fn raised_ticket_redirects_to_the_ticketed_step() {
    let journey = json!({
        "journey": {
            "name": "ticketed",
            "tickets": [
                {"name": "redo_checks", "step": "checks"}
            ],
            "flow": [
                {"name": "checks", "component": "checker", "next": "decide"},
                {"name": "decide", "component": "decider", "next": "end"}
            ]
        }
    });
    let mut registry = ComponentRegistry::new();
    registry.register_step(
        "checker",
        ScriptedStep::new(vec![StepResponse::proceed(), StepResponse::proceed()]),
    );
    registry.register_step(
        "decider",
        ScriptedStep::new(vec![
            StepResponse::proceed().with_ticket("redo_checks"),
            StepResponse::proceed(),
        ]),
    );
    let handler = RecordingHandler::new();
    let (engine, store) = engine_with(registry, handler.clone());

    engine
        .start_case("c1", &journey, Vec::new(), None)
        .await
        .unwrap();

    let pi = load_pi(&store, "c1").await;
    assert!(pi.is_complete);
    assert_eq!(pi.ticket, "redo_checks");
    assert!(handler.seen().contains(&EventType::OnTicketRaised));
}

// --- Event-handler failure policy ---

#[tokio::test]
async fn handler_failure_on_start_aborts_before_any_unit_runs() {
    let mut registry = ComponentRegistry::new();
    registry.register_step("collector", Arc::new(AlwaysProceed));
    registry.register_step("verifier", Arc::new(AlwaysProceed));
    let handler = RecordingHandler::failing_on(EventType::OnProcessStart);
    let (engine, store) = engine_with(registry, handler);

    let err = engine
        .start_case("c1", &linear_journey(), Vec::new(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, FlowError::Handler { .. }));

    // the journey record exists, but no unit executed and nothing pended
    assert!(store.read(&keys::journey("c1")).await.unwrap().is_some());
    assert!(
        store
            .read(&keys::process_info("c1"))
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn handler_failure_on_resume_leaves_the_case_as_persisted() {
    let journey = json!({
        "journey": {
            "name": "pending",
            "flow": [
                {"name": "review", "component": "reviewer", "next": "end"}
            ]
        }
    });
    let mut registry = ComponentRegistry::new();
    registry.register_step(
        "reviewer",
        ScriptedStep::new(vec![
            StepResponse::pend("review_wb"),
            StepResponse::proceed(),
        ]),
    );
    let handler = RecordingHandler::failing_on(EventType::OnProcessResume);
    let (engine, store) = engine_with(registry, handler);

    engine
        .start_case("c1", &journey, Vec::new(), None)
        .await
        .unwrap();
    let before = store
        .read(&keys::process_info("c1"))
        .await
        .unwrap()
        .unwrap();

    let err = engine.resume_case("c1").await.unwrap_err();
    assert!(matches!(err, FlowError::Handler { .. }));

    let after = store
        .read(&keys::process_info("c1"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
async fn handler_failure_on_pend_is_swallowed() {
    let journey = json!({
        "journey": {
            "name": "pending",
            "flow": [
                {"name": "review", "component": "reviewer", "next": "end"}
            ]
        }
    });

    // control run: handler succeeds
    let mut registry = ComponentRegistry::new();
    registry.register_step(
        "reviewer",
        ScriptedStep::new(vec![StepResponse::pend("review_wb")]),
    );
    let (engine, control_store) = engine_with(registry, RecordingHandler::new());
    engine
        .start_case("c1", &journey, Vec::new(), None)
        .await
        .unwrap();

    // failing run: handler rejects the pend event
    let mut registry = ComponentRegistry::new();
    registry.register_step(
        "reviewer",
        ScriptedStep::new(vec![StepResponse::pend("review_wb")]),
    );
    let handler = RecordingHandler::failing_on(EventType::OnProcessPend);
    let (engine, failing_store) = engine_with(registry, handler);
    engine
        .start_case("c1", &journey, Vec::new(), None)
        .await
        .unwrap();

    // orchestration state is unaffected by the handler failure
    let control = control_store
        .read(&keys::process_info("c1"))
        .await
        .unwrap()
        .unwrap();
    let failing = failing_store
        .read(&keys::process_info("c1"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(control, failing);
}

#[tokio::test]
async fn handler_failure_on_complete_is_swallowed() {
    let mut registry = ComponentRegistry::new();
    registry.register_step("collector", Arc::new(AlwaysProceed));
    registry.register_step("verifier", Arc::new(AlwaysProceed));
    let handler = RecordingHandler::failing_on(EventType::OnProcessComplete);
    let (engine, store) = engine_with(registry, handler);

    engine
        .start_case("c1", &linear_journey(), Vec::new(), None)
        .await
        .unwrap();
    assert!(load_pi(&store, "c1").await.is_complete);
}

// --- Unregistered components ---

#[tokio::test]
async fn unregistered_component_error_pends_the_path() {
    let (engine, store) = engine_with(ComponentRegistry::new(), RecordingHandler::new());

    engine
        .start_case("c1", &linear_journey(), Vec::new(), None)
        .await
        .unwrap();

    let pi = load_pi(&store, "c1").await;
    assert!(!pi.is_complete);
    let ep = pi.exec_path(".").unwrap();
    assert_eq!(ep.unit_response_type, Some(UnitResponseType::ErrorPend));
    let error = ep.error.as_ref().unwrap();
    assert_eq!(error.code, "component_not_registered");
    assert!(!error.is_retryable);
}

// --- Crash recovery through the engine ---

#[tokio::test]
async fn crashed_in_flight_step_is_reexecuted_once_on_resume() {
    let journey = json!({
        "journey": {
            "name": "crashy",
            "flow": [
                {"name": "collect", "component": "collector", "next": "verify"},
                {"name": "verify", "component": "verifier", "next": "end"}
            ]
        }
    });
    let mut registry = ComponentRegistry::new();
    registry.register_step("collector", ScriptedStep::new(vec![StepResponse::proceed()]));
    registry.register_step("verifier", ScriptedStep::new(vec![StepResponse::proceed()]));
    let (engine, store) = engine_with(registry, RecordingHandler::new());

    // simulate a worker that died mid-advance: the decision was recorded
    // but the advance never happened
    engine
        .start_case("c1", &journey, Vec::new(), None)
        .await
        .unwrap();
    let mut pi = load_pi(&store, "c1").await;
    pi.is_complete = false;
    pi.pend_exec_path.clear();
    let mut ep = pi.exec_path(".").unwrap().clone();
    ep.status = ExecPathStatus::Started;
    ep.step = "verify".to_string();
    ep.unit_response_type = Some(UnitResponseType::OkProceed);
    pi.set_exec_path(ep);
    store
        .write(&keys::process_info("c1"), &pi.to_document())
        .await
        .unwrap();

    // resume repairs the record to ok_pend and re-executes exactly the
    // interrupted unit
    let mut registry = ComponentRegistry::new();
    registry.register_step("collector", ScriptedStep::new(Vec::new()));
    registry.register_step("verifier", ScriptedStep::new(vec![StepResponse::proceed()]));
    let engine2 = CaseEngine::new(store.clone(), Arc::new(registry))
        .with_event_handler(RecordingHandler::new());
    engine2.resume_case("c1").await.unwrap();

    assert!(load_pi(&store, "c1").await.is_complete);
}

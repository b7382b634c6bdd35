use tracing::info;

use crate::engine::definition::{ProcessDefinition, Unit, UnitKind};
use crate::engine::types::{ExecPathStatus, ProcessInfo, UnitResponseType};

/// Repair persisted case state left inconsistent by an abrupt crash.
///
/// A crash can leave an execution path with the "advance" decision
/// recorded (`OK_PROCEED`) but the advance itself never performed. The
/// repair guarantees at most one unit re-executes per execution path; it
/// never attempts partial rollback. Re-executed units must be idempotent
/// on the application side.
///
/// Deterministic and re-runnable: a worker may itself crash mid-recovery,
/// so running this twice yields the same state as running it once.
pub fn reconcile(pi: &mut ProcessInfo, pd: &ProcessDefinition) {
    let case_id = pi.case_id.clone();

    for ep in pi.exec_paths.values_mut() {
        // a path persisted before its first outcome was observed is
        // treated as if it had pended at route exit
        if ep.unit_response_type.is_none() {
            ep.unit_response_type = Some(UnitResponseType::OkPendEor);
            info!(
                case_id = %case_id,
                exec_path = %ep.name,
                "found missing unit response type, replacing with ok_pend_eor"
            );
        }

        if ep.status == ExecPathStatus::Started
            && ep.unit_response_type == Some(UnitResponseType::OkProceed)
        {
            match pd.unit(&ep.step).map(Unit::kind) {
                Some(UnitKind::PRoute) | Some(UnitKind::PRouteDynamic) => {
                    // a fork's own path ends once it has forked; an
                    // un-forked fork is unrecoverable mid-fork and is
                    // treated as already forked-and-done
                    ep.status = ExecPathStatus::Completed;
                    info!(
                        case_id = %case_id,
                        exec_path = %ep.name,
                        "found parallel route in flight, marking path completed"
                    );
                }
                Some(UnitKind::SRoute) => {
                    ep.unit_response_type = Some(UnitResponseType::OkPendEor);
                    info!(
                        case_id = %case_id,
                        exec_path = %ep.name,
                        "found sequential route in flight, replacing with ok_pend_eor"
                    );
                }
                _ => {
                    ep.unit_response_type = Some(UnitResponseType::OkPend);
                    info!(
                        case_id = %case_id,
                        exec_path = %ep.name,
                        "found step in flight, replacing with ok_pend"
                    );
                }
            }
        }
    }

    // a pointer at a path the crash already finished (e.g. absorbed by a
    // join) is as good as no pointer
    if !pi.pend_exec_path.is_empty() {
        let live = pi
            .exec_paths
            .get(&pi.pend_exec_path)
            .is_some_and(|ep| ep.status == ExecPathStatus::Started);
        if !live {
            info!(
                case_id = %case_id,
                exec_path = %pi.pend_exec_path,
                "recorded pend exec path is no longer active, reselecting"
            );
            pi.pend_exec_path.clear();
        }
    }

    if pi.pend_exec_path.is_empty() {
        if let Some(deepest) = deepest_pended_path(pi) {
            info!(
                case_id = %case_id,
                exec_path = %deepest,
                "no pend exec path recorded, selecting deepest pended path"
            );
            pi.pend_exec_path = deepest;
        }
    }
}

/// The started, non-advancing execution path with the greatest fork
/// depth; ties keep the first found in identifier order.
pub fn deepest_pended_path(pi: &ProcessInfo) -> Option<String> {
    let mut selected: Option<(&str, usize)> = None;
    for ep in pi.exec_paths.values() {
        if ep.status != ExecPathStatus::Started
            || ep.unit_response_type == Some(UnitResponseType::OkProceed)
        {
            continue;
        }
        let depth = ep.depth();
        if selected.map_or(true, |(_, best)| depth > best) {
            selected = Some((ep.name.as_str(), depth));
        }
    }
    selected.map(|(name, _)| name.to_string())
}

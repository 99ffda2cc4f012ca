// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Mutator applying one `Change` to a `MaterializedState`, shared by the
//! StateStore's live apply path and by WAL replay during recovery — the
//! same function must produce the same result either way (§ Crash-recovery
//! contract).

use crate::state::{MaterializedState, PendingPr};
use nf_core::{Change, ChangeKind, ChangeTarget, CompartmentKind, CompartmentStatus, Host, LogEntry, Metrics, Op};

/// Applies `change` to `state` in place and advances `state.version` to
/// match it. Unrecognized (kind, target) combinations, or payloads that
/// fail to decode, are ignored rather than panicking: a corrupt or
/// forward-incompatible record must not take recovery down with it.
pub fn apply_change(state: &mut MaterializedState, change: Change) {
    state.version = change.version;

    match (&change.kind, &change.target) {
        (ChangeKind::HostRegistered, ChangeTarget::Host(_)) => {
            if let Ok(host) = serde_json::from_value::<Host>(change.data) {
                state.hosts.insert(host.id.clone(), host);
            }
        }
        (ChangeKind::HostUnregistered, ChangeTarget::Host(id)) => {
            if let Some(host) = state.hosts.get_mut(id.as_str()) {
                host.removed_at_ms = Some(change.ts_ms);
            }
        }
        (ChangeKind::HostStatusUpdated, ChangeTarget::Host(id)) => {
            if let Some(host) = state.hosts.get_mut(id.as_str()) {
                if let Ok(status) = serde_json::from_value(change.data) {
                    host.status = status;
                    host.last_seen_ms = change.ts_ms;
                }
            }
        }
        (ChangeKind::HostMetricsUpdated, ChangeTarget::Host(id)) => {
            if let Some(host) = state.hosts.get_mut(id.as_str()) {
                if let Ok(metrics) = serde_json::from_value::<Metrics>(change.data) {
                    host.metrics = metrics;
                }
            }
        }
        (ChangeKind::CompartmentUpdated, ChangeTarget::Host(id)) => {
            if let Some(host) = state.hosts.get_mut(id.as_str()) {
                if let Ok((kind, status)) =
                    serde_json::from_value::<(CompartmentKind, CompartmentStatus)>(change.data)
                {
                    host.update_status.insert(kind, status);
                }
            }
        }
        (ChangeKind::OpCreated, ChangeTarget::Op(_)) => {
            if let Ok(op) = serde_json::from_value::<Op>(change.data) {
                if let Some(host) = state.hosts.get_mut(op.host_id.as_str()) {
                    host.pending_command = Some(op.op_id);
                }
                state.ops.insert(op.op_id, op);
            }
        }
        (ChangeKind::OpStateChanged, ChangeTarget::Op(_)) => {
            if let Ok(updated) = serde_json::from_value::<Op>(change.data) {
                if let Some(host) = state.hosts.get_mut(updated.host_id.as_str()) {
                    host.pending_command =
                        if updated.state.holds_pending_command() { Some(updated.op_id) } else { None };
                }
                state.ops.insert(updated.op_id, updated);
            }
        }
        // `op_output_appended` never reaches the durable log (§4.4); a
        // record of this kind can only arrive here from a stale or
        // hand-edited WAL file, so it is a no-op rather than an error.
        (ChangeKind::OpOutputAppended, _) => {}
        (ChangeKind::PendingPrUpdated, ChangeTarget::System) => {
            if let Ok(pr) = serde_json::from_value::<PendingPr>(change.data) {
                state.pending_prs.insert(pr.project.clone(), pr);
            }
        }
        (ChangeKind::LogEntryAppended, ChangeTarget::Host(id)) => {
            if let Ok(entry) = serde_json::from_value::<LogEntry>(change.data) {
                state.push_host_log(state_host_id(state, id), entry);
            }
        }
        (ChangeKind::LogEntryAppended, ChangeTarget::System) => {
            if let Ok(entry) = serde_json::from_value::<LogEntry>(change.data) {
                state.push_system_log(entry);
            }
        }
        _ => {}
    }
}

/// `push_host_log` takes an owned `HostId`; this clones the key already
/// registered in `state.hosts` instead of re-validating the raw string.
fn state_host_id(state: &MaterializedState, id: &str) -> nf_core::HostId {
    state
        .hosts
        .get(id)
        .map(|h| h.id.clone())
        .unwrap_or_else(|| nf_core::HostId::parse(id).expect("change target id was already validated on write"))
}

#[cfg(test)]
#[path = "apply_tests.rs"]
mod tests;

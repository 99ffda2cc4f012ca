// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Change: one entry in the StateStore's append-only apply log, and the
//! closed set of change kinds.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The closed set of change kinds a `Change` may carry (§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    HostRegistered,
    HostUnregistered,
    HostStatusUpdated,
    HostMetricsUpdated,
    CompartmentUpdated,
    OpCreated,
    OpStateChanged,
    OpOutputAppended,
    PendingPrUpdated,
    LogEntryAppended,
}

crate::simple_display! {
    ChangeKind {
        HostRegistered => "host_registered",
        HostUnregistered => "host_unregistered",
        HostStatusUpdated => "host_status_updated",
        HostMetricsUpdated => "host_metrics_updated",
        CompartmentUpdated => "compartment_updated",
        OpCreated => "op_created",
        OpStateChanged => "op_state_changed",
        OpOutputAppended => "op_output_appended",
        PendingPrUpdated => "pending_pr_updated",
        LogEntryAppended => "log_entry_appended",
    }
}

/// Target of a change: either a host or an op, carried as a string so the
/// log and wire format don't need to know about both ID types in one enum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeTarget {
    Host(String),
    Op(String),
    /// `op_output_appended` is elided from the durable change log (§4.4);
    /// this variant exists so the type remains total, but the StateStore
    /// never persists it as a `Change`.
    System,
}

/// One entry in the apply log. `version` is the global, monotonically
/// increasing `StateVersion` counter, incremented by exactly one per change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Change {
    pub version: u64,
    pub ts_ms: u64,
    pub kind: ChangeKind,
    pub target: ChangeTarget,
    pub data: Value,
}

impl Change {
    pub fn new(version: u64, ts_ms: u64, kind: ChangeKind, target: ChangeTarget, data: Value) -> Self {
        Self { version, ts_ms, kind, target, data }
    }
}

#[cfg(test)]
#[path = "change_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `MaterializedState`: the in-memory maps StateStore mutates, and the
//! concrete realization of §6's persisted "tables" — no SQL engine is
//! introduced; these fields plus the WAL/snapshot pair are the embedded-KV
//! layout.

use nf_core::{Host, HostId, LogEntry, Op, OpId, MAX_IN_MEMORY_LOG_ENTRIES};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

/// Per-host "pending recovery" marker set when a reboot aborts a running op
/// (§4.2 Reboot integration), cleared on the host's next registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RecoveryMarkers(pub std::collections::BTreeSet<HostId>);

/// A single pending dependency-update PR, reported by `PRSource` (§4.6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingPr {
    pub project: String,
    pub url: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MaterializedState {
    pub hosts: BTreeMap<HostId, Host>,
    pub ops: BTreeMap<OpId, Op>,
    pub version: u64,
    pub recovery_markers: RecoveryMarkers,
    pub pending_prs: BTreeMap<String, PendingPr>,
    /// Bounded; spills to the WAL tail rather than growing without bound.
    pub system_log: VecDeque<LogEntry>,
    /// Bounded per-host log, keyed by host id.
    pub host_logs: BTreeMap<HostId, VecDeque<LogEntry>>,
}

impl MaterializedState {
    pub fn push_system_log(&mut self, entry: LogEntry) {
        push_bounded(&mut self.system_log, entry);
    }

    pub fn push_host_log(&mut self, host_id: HostId, entry: LogEntry) {
        push_bounded(self.host_logs.entry(host_id).or_default(), entry);
    }
}

fn push_bounded(log: &mut VecDeque<LogEntry>, entry: LogEntry) {
    log.push_back(entry);
    while log.len() > MAX_IN_MEMORY_LOG_ENTRIES {
        log.pop_front();
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;

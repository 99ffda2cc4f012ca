// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Self-healing sweeper (§4.2): runs every 30s, detects but never
//! auto-clears three anomaly shapes. Findings are returned as `LogEntry`
//! rows for the caller to append to the system log; this module never
//! mutates `Op`/`Host` state itself.

use nf_core::{LogEntry, LogLevel, Op, OpState};
use nf_storage::MaterializedState;

const ORPHANED_SNAPSHOT_GRACE_MS: u64 = 5 * 60_000;
const STUCK_RUNNING_AFTER_MS: u64 = 15 * 60_000;
const STUCK_QUEUED_AFTER_MS: u64 = 60_000;

/// One pass over every op in `state`, returning a log entry per anomaly
/// found. Pure with respect to `state` — callers decide whether/how to
/// persist the findings.
pub fn sweep(state: &MaterializedState, now_ms: u64) -> Vec<LogEntry> {
    let mut findings = Vec::new();
    for op in state.ops.values() {
        if let Some(entry) = check_orphaned_snapshot(op, now_ms) {
            findings.push(entry);
        }
        if let Some(entry) = check_stuck_running(op, now_ms) {
            findings.push(entry);
        }
        if let Some(entry) = check_stuck_queued(op, now_ms) {
            findings.push(entry);
        }
    }
    findings
}

fn check_orphaned_snapshot(op: &Op, now_ms: u64) -> Option<LogEntry> {
    if op.snapshot.is_none() || op.state.is_non_terminal() {
        return None;
    }
    let threshold = op.timeout_policy.hard_at_ms + ORPHANED_SNAPSHOT_GRACE_MS;
    let age = now_ms.saturating_sub(op.queued_at_ms);
    if age > threshold {
        Some(
            LogEntry::for_host(now_ms, LogLevel::Warning, op.host_id.to_string(), "orphaned snapshot detected")
                .with_code("orphaned_snapshot")
                .with_state(op.state.to_string()),
        )
    } else {
        None
    }
}

fn check_stuck_running(op: &Op, now_ms: u64) -> Option<LogEntry> {
    if op.state != OpState::Running {
        return None;
    }
    let started_at = op.started_at_ms?;
    if now_ms.saturating_sub(started_at) >= STUCK_RUNNING_AFTER_MS {
        Some(
            LogEntry::for_host(now_ms, LogLevel::Warning, op.host_id.to_string(), "op has been running a long time with no progress")
                .with_code("stuck_running"),
        )
    } else {
        None
    }
}

fn check_stuck_queued(op: &Op, now_ms: u64) -> Option<LogEntry> {
    if op.state != OpState::Queued {
        return None;
    }
    if now_ms.saturating_sub(op.queued_at_ms) >= STUCK_QUEUED_AFTER_MS {
        Some(
            LogEntry::for_host(now_ms, LogLevel::Warning, op.host_id.to_string(), "op has been queued without transitioning")
                .with_code("stuck_queued"),
        )
    } else {
        None
    }
}

#[cfg(test)]
#[path = "sweeper_tests.rs"]
mod tests;

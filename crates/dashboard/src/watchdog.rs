// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Watchdog: the 1 Hz per-op timeout tick, plus the 30 s self-healing
//! sweeper pass (§4.2, §4.6).

use crate::gateway::agent::AgentRegistry;
use crate::store::StateStore;
use nf_engine::WatchdogOutcome;
use nf_protocol::{DashboardToAgent, KillSignal};
use std::time::Duration;

pub const TICK_INTERVAL: Duration = Duration::from_secs(1);
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(30);

/// Runs one watchdog tick over every currently non-terminal op, escalating
/// `KILLING` ops to `SIGKILL` when the engine reports the 5 s step elapsed
/// (§4.2 "Kill escalation"). Callers drive the interval (see `main.rs`'s
/// background task).
pub fn tick_once(store: &StateStore, agents: &AgentRegistry, now_ms: u64) {
    for op_id in store.active_op_ids() {
        match store.watchdog_tick(op_id, now_ms) {
            Ok(Some(WatchdogOutcome::KillEscalated)) => {
                if let Some(op) = store.op(op_id) {
                    agents.send(&op.host_id, DashboardToAgent::Kill { op_id, signal: KillSignal::Sigkill, target_pid: None });
                }
            }
            Ok(_) => {}
            Err(err) => tracing::warn!(%err, %op_id, "watchdog tick failed"),
        }
    }
}

/// Runs one sweep pass and appends every finding to the system log.
pub fn sweep_once(store: &StateStore, now_ms: u64) {
    for entry in store.sweep(now_ms) {
        if let Err(err) = store.append_system_log(entry, now_ms) {
            tracing::warn!(%err, "failed to record sweep finding");
        }
    }
}

#[cfg(test)]
#[path = "watchdog_tests.rs"]
mod tests;

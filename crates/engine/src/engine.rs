// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! OpEngine: owns every `Op.state` transition in the single canonical DAG
//! (§4.2), and is the sole writer of `Host.pending_command` (§4.6 — heartbeat
//! code paths must never touch it).

use crate::error::OpEngineError;
use crate::freshness::{self, Freshness};
use crate::lifecycle::PendingCommandStore;
use crate::validation::{post_validate, pre_validate};
use nf_core::{CompartmentMap, Host, HostId, HostSnapshot, Op, OpId, OpKind, OpState};
use nf_storage::MaterializedState;

/// Non-terminal states in which the watchdog has a running clock against
/// `Op.phase_started_at_ms` (Running/RunningWarning share `timeout_policy`;
/// AwaitingReconnect uses the fixed reconnect policy instead; Killing uses
/// the fixed kill-escalation step below).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchdogOutcome {
    Warned,
    HardTimedOut,
    ReconnectTimedOut,
    /// 5 s elapsed in `KILLING` without an ack — the caller must now send
    /// `kill{SIGKILL}`.
    KillEscalated,
    /// A further 5 s elapsed without an ack to the `SIGKILL` — the op is
    /// now `KILL_FAILED`.
    KillTimedOut,
}

/// Kill escalation step (§4.2 "Kill escalation"): 5 s from `SIGTERM` to
/// `SIGKILL`, another 5 s from `SIGKILL` to `KILL_FAILED`.
const KILL_ESCALATION_STEP_MS: u64 = 5_000;

pub struct OpEngine;

impl OpEngine {
    pub fn new() -> Self {
        Self
    }

    fn host_mut<'s>(state: &'s mut MaterializedState, host_id: &HostId) -> Result<&'s mut Host, OpEngineError> {
        state.hosts.get_mut(host_id).ok_or_else(|| OpEngineError::UnknownHost(host_id.clone()))
    }

    /// `IDLE -> VALIDATING_PRE -> {BLOCKED | QUEUED}`. Always creates and
    /// stores an `Op` so a blocked attempt is visible in history; only a
    /// `Queued` op claims `Host.pending_command`.
    pub fn dispatch(
        &self,
        state: &mut MaterializedState,
        host_id: HostId,
        kind: OpKind,
        now_ms: u64,
    ) -> Result<Op, OpEngineError> {
        let host = Self::host_mut(state, &host_id)?;
        let pre_check = pre_validate(host, kind);
        let op_id = OpId::new();
        let mut op = Op::new(op_id, host_id.clone(), kind, now_ms);
        op.pre_check = Some(pre_check.clone());

        if pre_check.valid {
            op.snapshot = Some(HostSnapshot::capture(host));
            op.state = OpState::Queued;
            op.phase_started_at_ms = now_ms;
            PendingCommandStore::claim(host, op_id);
        } else {
            op.state = OpState::Blocked;
            op.completed_at_ms = Some(now_ms);
        }

        state.ops.insert(op_id, op.clone());
        Ok(op)
    }

    /// `QUEUED -> RUNNING`, called once the agent has accepted dispatch.
    pub fn mark_running(&self, state: &mut MaterializedState, op_id: OpId, now_ms: u64) -> Result<(), OpEngineError> {
        let op = state.ops.get_mut(&op_id).ok_or(OpEngineError::UnknownOp(op_id))?;
        if op.state != OpState::Queued {
            return Err(OpEngineError::InvalidTransition { op: op_id, current: op.state, attempted: "mark_running" });
        }
        op.state = OpState::Running;
        op.started_at_ms = Some(now_ms);
        op.phase_started_at_ms = now_ms;
        Ok(())
    }

    /// `RUNNING | RUNNING_WARNING -> VALIDATING_POST -> {SUCCESS|PARTIAL|FAILED}`
    /// for every kind except `switch`, which is deferred to
    /// `handle_disconnect`/`handle_reconnect`.
    pub fn handle_command_complete(
        &self,
        state: &mut MaterializedState,
        op_id: OpId,
        exit_code: i32,
        fresh_status: CompartmentMap,
        now_ms: u64,
    ) -> Result<OpState, OpEngineError> {
        let op = state.ops.get(&op_id).ok_or(OpEngineError::UnknownOp(op_id))?.clone();
        if !matches!(op.state, OpState::Running | OpState::RunningWarning) {
            return Err(OpEngineError::InvalidTransition {
                op: op_id,
                current: op.state,
                attempted: "handle_command_complete",
            });
        }
        let snapshot = op.snapshot.clone().unwrap_or_else(|| HostSnapshot {
            identity: Default::default(),
            generation: 0,
            update_status: Default::default(),
            pending_command: None,
        });

        let host = Self::host_mut(state, &op.host_id)?;
        host.update_status = fresh_status;
        let post_check = post_validate(&snapshot, host, exit_code, op.kind);
        let final_state = outcome_for(&post_check, op.kind);

        PendingCommandStore::release(host);

        let op = state.ops.get_mut(&op_id).expect("op present, checked above");
        op.exit_code = Some(exit_code);
        op.post_check = Some(post_check);
        op.state = final_state;
        op.completed_at_ms = Some(now_ms);
        Ok(final_state)
    }

    /// `RUNNING | RUNNING_WARNING -> AWAITING_RECONNECT`, for a `switch` op
    /// whose agent connection drops after a successful exit.
    pub fn handle_disconnect(
        &self,
        state: &mut MaterializedState,
        host_id: &HostId,
        now_ms: u64,
    ) -> Result<Option<OpId>, OpEngineError> {
        let host = Self::host_mut(state, host_id)?;
        let Some(op_id) = host.pending_command else { return Ok(None) };
        let Some(op) = state.ops.get_mut(&op_id) else { return Ok(None) };
        if op.kind != OpKind::Switch || !matches!(op.state, OpState::Running | OpState::RunningWarning) {
            return Ok(None);
        }
        op.state = OpState::AwaitingReconnect;
        op.phase_started_at_ms = now_ms;
        Ok(Some(op_id))
    }

    /// `AWAITING_RECONNECT -> {SUCCESS | STALE_BINARY | SUSPICIOUS}`, driven
    /// by the FreshnessVerifier 3-layer diff (§4.3) on agent reregistration.
    pub fn handle_reconnect(
        &self,
        state: &mut MaterializedState,
        host_id: &HostId,
        new_identity: nf_core::AgentIdentity,
        now_ms: u64,
    ) -> Result<Option<OpState>, OpEngineError> {
        let host = Self::host_mut(state, host_id)?;
        let Some(op_id) = host.pending_command else { return Ok(None) };
        let Some(op) = state.ops.get(&op_id).cloned() else { return Ok(None) };
        if op.state != OpState::AwaitingReconnect {
            return Ok(None);
        }
        let before = op.snapshot.as_ref().map(|s| s.identity.clone()).unwrap_or_default();
        let fresh = freshness::verify(&before, &new_identity);

        let final_state = match fresh {
            Freshness::Fresh => OpState::Success,
            Freshness::Suspicious => OpState::Suspicious,
            Freshness::Stale => OpState::StaleBinary,
        };

        let host = Self::host_mut(state, host_id)?;
        host.identity = new_identity;
        if final_state == OpState::Success {
            host.generation += 1;
        }
        if final_state == OpState::StaleBinary {
            if let Some(agent) = host.update_status.get_mut(&nf_core::CompartmentKind::Agent) {
                agent.value = nf_core::CompartmentValue::Outdated;
            }
        }
        PendingCommandStore::release(host);

        let op = state.ops.get_mut(&op_id).expect("op present, checked above");
        op.state = final_state;
        op.completed_at_ms = Some(now_ms);
        Ok(Some(final_state))
    }

    /// One watchdog tick (intended to run at 1 Hz) for a single op. Returns
    /// the transition taken, if any.
    pub fn watchdog_tick(&self, state: &mut MaterializedState, op_id: OpId, now_ms: u64) -> Option<WatchdogOutcome> {
        let op = state.ops.get_mut(&op_id)?;
        let elapsed = |since: u64| now_ms.saturating_sub(since);

        match op.state {
            OpState::Running => {
                let policy = op.timeout_policy;
                let since = op.started_at_ms.unwrap_or(op.queued_at_ms);
                if elapsed(since) >= policy.hard_at_ms {
                    op.state = OpState::TimeoutPending;
                    op.phase_started_at_ms = now_ms;
                    Some(WatchdogOutcome::HardTimedOut)
                } else if elapsed(since) >= policy.warn_at_ms {
                    op.state = OpState::RunningWarning;
                    Some(WatchdogOutcome::Warned)
                } else {
                    None
                }
            }
            OpState::RunningWarning => {
                let policy = op.timeout_policy;
                let since = op.started_at_ms.unwrap_or(op.queued_at_ms);
                if elapsed(since) >= policy.hard_at_ms {
                    op.state = OpState::TimeoutPending;
                    op.phase_started_at_ms = now_ms;
                    Some(WatchdogOutcome::HardTimedOut)
                } else {
                    None
                }
            }
            OpState::AwaitingReconnect => {
                let policy = nf_core::TimeoutPolicy::reconnect();
                if elapsed(op.phase_started_at_ms) >= policy.hard_at_ms {
                    op.state = OpState::TimedOut;
                    op.completed_at_ms = Some(now_ms);
                    Some(WatchdogOutcome::ReconnectTimedOut)
                } else {
                    None
                }
            }
            OpState::Killing => {
                let since = elapsed(op.phase_started_at_ms);
                if since >= KILL_ESCALATION_STEP_MS * 2 {
                    op.state = OpState::KillFailed;
                    op.completed_at_ms = Some(now_ms);
                    Some(WatchdogOutcome::KillTimedOut)
                } else if since >= KILL_ESCALATION_STEP_MS && !op.kill_escalated {
                    op.kill_escalated = true;
                    Some(WatchdogOutcome::KillEscalated)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// `TIMEOUT_PENDING -> RUNNING`, issued on operator action: the op is
    /// still making progress, so give it a fresh `running` clock instead of
    /// killing it.
    pub fn extend_timeout(&self, state: &mut MaterializedState, op_id: OpId, now_ms: u64) -> Result<(), OpEngineError> {
        let op = state.ops.get_mut(&op_id).ok_or(OpEngineError::UnknownOp(op_id))?;
        if op.state != OpState::TimeoutPending {
            return Err(OpEngineError::InvalidTransition { op: op_id, current: op.state, attempted: "extend_timeout" });
        }
        op.state = OpState::Running;
        op.phase_started_at_ms = now_ms;
        Ok(())
    }

    /// `TIMEOUT_PENDING -> IGNORED`, issued on operator action: the operator
    /// accepts the op is hung but declines to kill it.
    pub fn ignore_timeout(&self, state: &mut MaterializedState, op_id: OpId, now_ms: u64) -> Result<(), OpEngineError> {
        let op = state.ops.get_mut(&op_id).ok_or(OpEngineError::UnknownOp(op_id))?;
        if op.state != OpState::TimeoutPending {
            return Err(OpEngineError::InvalidTransition { op: op_id, current: op.state, attempted: "ignore_timeout" });
        }
        op.state = OpState::Ignored;
        op.completed_at_ms = Some(now_ms);
        let host_id = op.host_id.clone();
        if let Some(host) = state.hosts.get_mut(&host_id) {
            PendingCommandStore::release(host);
        }
        Ok(())
    }

    /// `TIMEOUT_PENDING -> KILLING`, issued on operator action.
    pub fn begin_kill(&self, state: &mut MaterializedState, op_id: OpId, now_ms: u64) -> Result<(), OpEngineError> {
        let op = state.ops.get_mut(&op_id).ok_or(OpEngineError::UnknownOp(op_id))?;
        if op.state != OpState::TimeoutPending {
            return Err(OpEngineError::InvalidTransition { op: op_id, current: op.state, attempted: "begin_kill" });
        }
        op.state = OpState::Killing;
        op.phase_started_at_ms = now_ms;
        Ok(())
    }

    /// `KILLING -> {KILLED | KILL_FAILED}` once escalation resolves.
    pub fn resolve_kill(
        &self,
        state: &mut MaterializedState,
        op_id: OpId,
        killed: bool,
        now_ms: u64,
    ) -> Result<(), OpEngineError> {
        let op = state.ops.get_mut(&op_id).ok_or(OpEngineError::UnknownOp(op_id))?;
        if op.state != OpState::Killing {
            return Err(OpEngineError::InvalidTransition { op: op_id, current: op.state, attempted: "resolve_kill" });
        }
        op.state = if killed { OpState::Killed } else { OpState::KillFailed };
        op.completed_at_ms = Some(now_ms);
        if !killed {
            // host.pending_command stays set; KILL_FAILED is still
            // non-terminal per P2, awaiting the reboot escape hatch.
            return Ok(());
        }
        let host_id = op.host_id.clone();
        if let Some(host) = state.hosts.get_mut(&host_id) {
            PendingCommandStore::release(host);
        }
        Ok(())
    }

    /// Reboot integration (§4.6): aborts whatever op is active on `host_id`
    /// and leaves a recovery marker so the next registration surfaces it.
    pub fn initiate_reboot(&self, state: &mut MaterializedState, host_id: &HostId, now_ms: u64) -> Result<(), OpEngineError> {
        let host = Self::host_mut(state, host_id)?;
        if let Some(op_id) = host.pending_command.take() {
            if let Some(op) = state.ops.get_mut(&op_id) {
                if op.state.is_non_terminal() {
                    op.state = OpState::AbortedByReboot;
                    op.snapshot = None;
                    op.completed_at_ms = Some(now_ms);
                }
            }
            state.recovery_markers.0.insert(host_id.clone());
        }
        Ok(())
    }

    /// `ABORTED_BY_REBOOT -> POST_REBOOT_RECOVERY -> IDLE`, driven by the
    /// host's first successful re-registration after a reboot.
    pub fn recover_after_reboot(&self, state: &mut MaterializedState, host_id: &HostId) -> bool {
        if !state.recovery_markers.0.remove(host_id) {
            return false;
        }
        if let Some(op) = state.ops.values_mut().find(|op| {
            &op.host_id == host_id && op.state == OpState::AbortedByReboot
        }) {
            op.state = OpState::PostRebootRecovery;
        }
        true
    }
}

impl Default for OpEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn outcome_for(result: &nf_core::ValidationResult, kind: OpKind) -> OpState {
    match (kind, result.valid, result.code.as_str()) {
        (_, true, _) => OpState::Success,
        (OpKind::PullSwitch, false, "partial_git_only" | "partial_system_only") => OpState::Partial,
        (OpKind::Pull, false, "partial") => OpState::Partial,
        _ => OpState::Failed,
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;

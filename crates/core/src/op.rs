// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Op: a scheduled or running command on a host, and the closed DAG of
//! states it moves through.

use crate::host::{Host, HostId};
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Identifier for a scheduled or running operation on a host.
    pub struct OpId("op-");
}

/// The kind of command an Op carries out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpKind {
    Pull,
    Switch,
    Test,
    PullSwitch,
    Kill,
    Reboot,
    RefreshLock,
}

crate::simple_display! {
    OpKind {
        Pull => "pull",
        Switch => "switch",
        Test => "test",
        PullSwitch => "pull-switch",
        Kill => "kill",
        Reboot => "reboot",
        RefreshLock => "refresh-lock",
    }
}

/// A node of the single canonical state-machine DAG (§4.2). Terminal states
/// are documented per-variant; [`OpState::is_terminal`] is authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpState {
    Idle,
    ValidatingPre,
    Blocked,
    Queued,
    Running,
    RunningWarning,
    TimeoutPending,
    Killing,
    Killed,
    KillFailed,
    AbortedByReboot,
    PostRebootRecovery,
    ValidatingPost,
    AwaitingReconnect,
    Success,
    Partial,
    Failed,
    StaleBinary,
    Suspicious,
    TimedOut,
    Ignored,
}

crate::simple_display! {
    OpState {
        Idle => "idle",
        ValidatingPre => "validating_pre",
        Blocked => "blocked",
        Queued => "queued",
        Running => "running",
        RunningWarning => "running_warning",
        TimeoutPending => "timeout_pending",
        Killing => "killing",
        Killed => "killed",
        KillFailed => "kill_failed",
        AbortedByReboot => "aborted_by_reboot",
        PostRebootRecovery => "post_reboot_recovery",
        ValidatingPost => "validating_post",
        AwaitingReconnect => "awaiting_reconnect",
        Success => "success",
        Partial => "partial",
        Failed => "failed",
        StaleBinary => "stale_binary",
        Suspicious => "suspicious",
        TimedOut => "timed_out",
        Ignored => "ignored",
    }
}

impl OpState {
    /// States in which `H.pending_command` must be non-empty (P2) and at
    /// most one such Op may exist per host (P1).
    pub fn is_non_terminal(self) -> bool {
        matches!(
            self,
            Self::Idle
                | Self::ValidatingPre
                | Self::Queued
                | Self::Running
                | Self::RunningWarning
                | Self::TimeoutPending
                | Self::Killing
                | Self::AwaitingReconnect
                | Self::ValidatingPost
                | Self::KillFailed
                | Self::AbortedByReboot
                | Self::PostRebootRecovery
        )
    }

    pub fn is_terminal(self) -> bool {
        !self.is_non_terminal()
    }

    /// Whether this state keeps `pending_command` set, per P2's exact list:
    /// `{QUEUED, RUNNING, RUNNING_WARNING, TIMEOUT_PENDING, KILLING,
    /// AWAITING_RECONNECT}`.
    pub fn holds_pending_command(self) -> bool {
        matches!(
            self,
            Self::Queued
                | Self::Running
                | Self::RunningWarning
                | Self::TimeoutPending
                | Self::Killing
                | Self::AwaitingReconnect
        )
    }
}

/// Result of a pre- or post-validator: `(Host) -> ValidationResult` (pre) or
/// `(before, after, exit_code) -> ValidationResult` (post). Pure, atomic,
/// idempotent, side-effect-free per §4.2.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub code: String,
    pub message: String,
}

impl ValidationResult {
    pub fn ok(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self { valid: true, code: code.into(), message: message.into() }
    }

    pub fn fail(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self { valid: false, code: code.into(), message: message.into() }
    }
}

/// Timeout policy for an Op kind: warn-at / hard-at, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutPolicy {
    pub warn_at_ms: u64,
    pub hard_at_ms: u64,
}

impl TimeoutPolicy {
    const fn minutes(m: u64) -> u64 {
        m * 60_000
    }
    const fn seconds(s: u64) -> u64 {
        s * 1_000
    }

    /// Default warn-at/hard-at table from §4.2.
    pub fn for_kind(kind: OpKind) -> Self {
        match kind {
            OpKind::Pull => Self { warn_at_ms: Self::minutes(2), hard_at_ms: Self::minutes(5) },
            OpKind::Switch => Self { warn_at_ms: Self::minutes(10), hard_at_ms: Self::minutes(30) },
            OpKind::PullSwitch => {
                Self { warn_at_ms: Self::minutes(12), hard_at_ms: Self::minutes(35) }
            }
            OpKind::Test => Self { warn_at_ms: Self::minutes(5), hard_at_ms: Self::minutes(10) },
            // Kill/Reboot/RefreshLock are not watchdog-timed ops in their own
            // right; use a conservative default matching `test`.
            OpKind::Kill | OpKind::Reboot | OpKind::RefreshLock => {
                Self { warn_at_ms: Self::minutes(5), hard_at_ms: Self::minutes(10) }
            }
        }
    }

    /// The AWAITING_RECONNECT tail timeout for a `switch`/`pull-switch` op.
    pub fn reconnect() -> Self {
        Self { warn_at_ms: Self::seconds(30), hard_at_ms: Self::seconds(90) }
    }
}

/// Deep copy of the Host fields needed for post-validation, taken on
/// `VALIDATING_PRE -> QUEUED`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostSnapshot {
    pub identity: crate::identity::AgentIdentity,
    pub generation: u64,
    pub update_status: crate::compartment::CompartmentMap,
    pub pending_command: Option<OpId>,
}

impl HostSnapshot {
    pub fn capture(host: &Host) -> Self {
        Self {
            identity: host.identity.clone(),
            generation: host.generation,
            update_status: host.update_status.clone(),
            pending_command: host.pending_command,
        }
    }
}

/// A scheduled or running command on a host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Op {
    pub op_id: OpId,
    pub host_id: HostId,
    pub kind: OpKind,
    pub state: OpState,
    pub queued_at_ms: u64,
    pub started_at_ms: Option<u64>,
    pub completed_at_ms: Option<u64>,
    pub exit_code: Option<i32>,
    pub pre_check: Option<ValidationResult>,
    pub post_check: Option<ValidationResult>,
    pub timeout_policy: TimeoutPolicy,
    pub snapshot: Option<HostSnapshot>,
    pub output_ref: String,
    /// Timestamp of the most recent phase entry (queued/running/killing/
    /// awaiting-reconnect); the watchdog measures elapsed time against this
    /// rather than against `queued_at_ms`, so each phase gets its own clock.
    pub phase_started_at_ms: u64,
    /// Set once the watchdog has sent the escalation `SIGKILL` for a
    /// `KILLING` op, so the 1 Hz tick doesn't resend it every second.
    pub kill_escalated: bool,
}

impl Op {
    pub fn new(op_id: OpId, host_id: HostId, kind: OpKind, queued_at_ms: u64) -> Self {
        let output_ref = op_id.to_string();
        Self {
            op_id,
            host_id,
            kind,
            state: OpState::ValidatingPre,
            queued_at_ms,
            started_at_ms: None,
            completed_at_ms: None,
            exit_code: None,
            pre_check: None,
            post_check: None,
            timeout_policy: TimeoutPolicy::for_kind(kind),
            snapshot: None,
            output_ref,
            phase_started_at_ms: queued_at_ms,
            kill_escalated: false,
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
crate::builder! {
    pub struct OpBuilder => Op {
        set { op_id: OpId = OpId::new() }
        set { host_id: HostId = HostId::parse("host0").expect("literal id") }
        set { kind: OpKind = OpKind::Switch }
        set { state: OpState = OpState::ValidatingPre }
        set { queued_at_ms: u64 = 0 }
        option { started_at_ms: u64 = None }
        option { completed_at_ms: u64 = None }
        option { exit_code: i32 = None }
        option { pre_check: ValidationResult = None }
        option { post_check: ValidationResult = None }
        set { timeout_policy: TimeoutPolicy = TimeoutPolicy::for_kind(OpKind::Switch) }
        option { snapshot: HostSnapshot = None }
        into { output_ref: String = "" }
        set { phase_started_at_ms: u64 = 0 }
        set { kill_escalated: bool = false }
    }
}

#[cfg(test)]
#[path = "op_tests.rs"]
mod tests;

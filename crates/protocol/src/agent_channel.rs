// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Message types exchanged on the agent WebSocket channel (§4.1).

use nf_core::{AgentIdentity, CompartmentKind, CompartmentStatus, HostId, Metrics, OpId, OpKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// agent -> dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentMessage {
    Register {
        host_id: HostId,
        hostname: String,
        platform: nf_core::Platform,
        identity: AgentIdentity,
        update_status: BTreeMap<CompartmentKind, CompartmentStatus>,
    },
    Heartbeat {
        metrics: Metrics,
        update_status: BTreeMap<CompartmentKind, CompartmentStatus>,
        identity: AgentIdentity,
    },
    Status {
        update_status: BTreeMap<CompartmentKind, CompartmentStatus>,
    },
    Output {
        op_id: OpId,
        stream: OutputStream,
        line: String,
    },
    CommandComplete {
        op_id: OpId,
        exit_code: i32,
        fresh_status: BTreeMap<CompartmentKind, CompartmentStatus>,
    },
    KillAck {
        op_id: OpId,
        signal: KillSignal,
        success: bool,
    },
    KillNack {
        op_id: OpId,
        signal: KillSignal,
        success: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputStream {
    Stdout,
    Stderr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KillSignal {
    Sigterm,
    Sigkill,
}

/// dashboard -> agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DashboardToAgent {
    Dispatch {
        op_id: OpId,
        kind: OpKind,
        args: Vec<String>,
        timeout_ms: u64,
    },
    Kill {
        op_id: OpId,
        signal: KillSignal,
        target_pid: Option<u32>,
    },
    Reboot {
        reason: String,
    },
}

#[cfg(test)]
#[path = "agent_channel_tests.rs"]
mod tests;

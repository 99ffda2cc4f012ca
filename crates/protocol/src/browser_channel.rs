// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Message types exchanged on the browser WebSocket channel (§4.4) — the
//! incremental-sync protocol.

use crate::agent_channel::OutputStream;
use nf_core::{Change, Host, HostId, Op, OpId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A full snapshot of everything StateStore knows, sent on `init` and as the
/// response to `get_state`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FullState {
    pub hosts: BTreeMap<HostId, Host>,
    pub ops: BTreeMap<OpId, Op>,
}

/// dashboard -> browser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DashboardToBrowser {
    Init {
        version: u64,
        full_state: FullState,
    },
    Delta {
        version: u64,
        change: Change,
    },
    /// Beacon emitted every 30s so clients can detect silent drift.
    Sync {
        version: u64,
    },
    FullState {
        version: u64,
        full_state: FullState,
    },
    /// High-volume, at-most-once op output; not bound to `version` and not
    /// recorded in the change log (§4.4's "log output stream" special
    /// case). Dropped silently on a subscriber reconnect — the full
    /// transcript stays retrievable via `output_ref`.
    Output {
        op_id: OpId,
        stream: OutputStream,
        line: String,
    },
}

/// browser -> dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BrowserToDashboard {
    GetState,
}

#[cfg(test)]
#[path = "browser_channel_tests.rs"]
mod tests;
